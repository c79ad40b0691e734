//! GeoStore - In-memory coordinate store with a quadtree point index
//!
//! This module stands in for the host triple store: it keeps numeric properties of
//! subjects (latitude, longitude and anything else inserted) and maintains the spatial
//! index used for the bounding-box phase. Points can be loaded from GPX files.

use crate::{
    BoundingBox, CoordinateSource, IndexHit, Quadtree, Result, SpatialError, SpatialIndex, vocab,
};
use rayon::prelude::*;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

/// Configuration for the store and its index
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Config {
    /// Leaf capacity of the quadtree before subdivision (default 64)
    pub max_points_per_node: usize,
    /// Maximum quadtree depth (default 20)
    pub max_depth: u32,
    /// Prefix for subject IRIs minted when loading GPX data
    pub base_iri: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_points_per_node: 64,
            max_depth: 20,
            base_iri: "urn:gpx:".to_string(),
        }
    }
}

/// Information about the store
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StoreInfo {
    /// Number of subjects with at least one property
    pub subject_count: usize,
    /// Number of points in the spatial index
    pub indexed_points: usize,
}

/// A point extracted from a GPX document, ready for insertion
#[derive(Debug, Clone)]
struct GpxPoint {
    subject: Arc<str>,
    lat: f64,
    lon: f64,
}

/// Coordinate store and spatial index
#[derive(Debug, Clone)]
pub struct GeoStore {
    /// subject -> predicate -> value
    properties: HashMap<Arc<str>, HashMap<String, f64>>,
    /// Spatial index over subjects inserted with [`GeoStore::insert_point`]
    quadtree: Quadtree,
    /// Configuration settings
    config: Config,
    /// Number of GPX documents loaded so far (used to mint distinct IRIs)
    sources_loaded: usize,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl GeoStore {
    /// Create a new empty store with the given configuration
    pub fn new(config: Config) -> Self {
        let quadtree = Quadtree::new(config.max_points_per_node, config.max_depth);
        Self {
            properties: HashMap::new(),
            quadtree,
            config,
            sources_loaded: 0,
        }
    }

    /// Store latitude and longitude of a subject and index it
    ///
    /// A subject that already has a point is moved: its previous index entry is replaced.
    pub fn insert_point(&mut self, subject: impl Into<String>, lat: f64, lon: f64) -> Result<()> {
        let subject: Arc<str> = subject.into().into();
        self.quadtree.insert(subject.clone(), lat, lon)?;
        self.unindex(&subject);
        self.set_point_properties(subject, lat, lon);
        Ok(())
    }

    /// Store a single numeric property without touching the index
    pub fn insert_property(
        &mut self,
        subject: impl Into<String>,
        predicate: impl Into<String>,
        value: f64,
    ) {
        let subject: Arc<str> = subject.into().into();
        self.properties
            .entry(subject)
            .or_default()
            .insert(predicate.into(), value);
    }

    /// `(latitude, longitude)` of a subject, if both are stored
    pub fn point_of(&self, subject: &str) -> Option<(f64, f64)> {
        let properties = self.properties.get(subject)?;
        Some((
            *properties.get(vocab::WGS84_LAT)?,
            *properties.get(vocab::WGS84_LONG)?,
        ))
    }

    /// Add all waypoints, route points and track points of a GPX document
    ///
    /// Returns the number of points indexed. Points outside the WGS84 range are skipped.
    pub fn add_gpx(&mut self, gpx_data: gpx::Gpx) -> Result<usize> {
        let source_index = self.sources_loaded;
        let (points, quadtree) = self.build_source(gpx_data, source_index)?;
        self.sources_loaded += 1;
        self.absorb(points, quadtree)
    }

    /// Add multiple GPX documents in parallel
    ///
    /// Point extraction and per-document index construction run in parallel; the
    /// resulting indices are then merged sequentially.
    pub fn add_gpx_parallel(&mut self, gpx_data_vec: Vec<gpx::Gpx>) -> Result<usize> {
        #[cfg(feature = "profiling")]
        profiling::scope!("store::add_gpx_parallel");

        let start_index = self.sources_loaded;
        let results: Result<Vec<(Vec<GpxPoint>, Quadtree)>> = gpx_data_vec
            .into_par_iter()
            .enumerate()
            .map(|(i, gpx_data)| self.build_source(gpx_data, start_index + i))
            .collect();
        let sources = results?;

        self.sources_loaded += sources.len();
        let mut total = 0;
        for (points, quadtree) in sources {
            total += self.absorb(points, quadtree)?;
        }
        Ok(total)
    }

    /// Load GPX files in parallel
    pub fn load_from_files<P: AsRef<Path> + Send + Sync>(&mut self, paths: Vec<P>) -> Result<usize> {
        #[cfg(feature = "profiling")]
        profiling::scope!("store::load_from_files");

        let gpx_data_vec: Result<Vec<gpx::Gpx>> = paths
            .into_par_iter()
            .map(|path| -> Result<gpx::Gpx> {
                let file = std::fs::File::open(path.as_ref())?;
                let reader = std::io::BufReader::new(file);
                Ok(gpx::read(reader)?)
            })
            .collect();

        let total = self.add_gpx_parallel(gpx_data_vec?)?;
        tracing::info!("Loaded {total} points from GPX files");
        Ok(total)
    }

    /// Get store information
    #[inline]
    pub fn get_info(&self) -> StoreInfo {
        StoreInfo {
            subject_count: self.properties.len(),
            indexed_points: self.quadtree.len(),
        }
    }

    /// Get a reference to the configuration
    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get a reference to the spatial index
    #[inline]
    pub fn quadtree(&self) -> &Quadtree {
        &self.quadtree
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Remove all subjects and reset the index
    pub fn clear(&mut self) {
        self.properties.clear();
        self.quadtree = Quadtree::new(self.config.max_points_per_node, self.config.max_depth);
        self.sources_loaded = 0;
    }

    /// Drop the index entry at the subject's currently stored point, if any
    fn unindex(&mut self, subject: &str) {
        if let Some((lat, lon)) = self.point_of(subject)
            && !self.quadtree.remove(subject, lat, lon)
        {
            tracing::debug!("No index entry for <{subject}> at ({lat}, {lon})");
        }
    }

    fn set_point_properties(&mut self, subject: Arc<str>, lat: f64, lon: f64) {
        let properties = self.properties.entry(subject).or_default();
        properties.insert(vocab::WGS84_LAT.to_string(), lat);
        properties.insert(vocab::WGS84_LONG.to_string(), lon);
    }

    /// Extract the points of one document and index them in a standalone quadtree
    fn build_source(
        &self,
        gpx_data: gpx::Gpx,
        source_index: usize,
    ) -> Result<(Vec<GpxPoint>, Quadtree)> {
        let points = gpx_points(&gpx_data, &self.config.base_iri, source_index);
        let mut quadtree = Quadtree::new(self.config.max_points_per_node, self.config.max_depth);
        let mut accepted = Vec::with_capacity(points.len());

        for point in points {
            match quadtree.insert(point.subject.clone(), point.lat, point.lon) {
                Ok(()) => accepted.push(point),
                Err(SpatialError::OutOfBounds { lat, lon }) => {
                    tracing::warn!(
                        "Skipping point outside WGS84 bounds: {} ({lat}, {lon})",
                        point.subject
                    );
                }
                Err(e) => return Err(e),
            }
        }

        Ok((accepted, quadtree))
    }

    /// Merge a standalone quadtree and record the properties of its points
    fn absorb(&mut self, points: Vec<GpxPoint>, quadtree: Quadtree) -> Result<usize> {
        for point in &points {
            self.unindex(&point.subject);
        }
        self.quadtree.merge(quadtree)?;
        let count = points.len();
        for point in points {
            self.set_point_properties(point.subject, point.lat, point.lon);
        }
        Ok(count)
    }
}

impl CoordinateSource for GeoStore {
    fn coordinate(&self, subject: &str, predicate: &str) -> Option<f64> {
        self.properties.get(subject)?.get(predicate).copied()
    }
}

impl SpatialIndex for GeoStore {
    fn range_query<'a>(&'a self, bbox: &BoundingBox) -> Box<dyn Iterator<Item = IndexHit> + 'a> {
        self.quadtree.range_query(bbox)
    }
}

/// Mint subject IRIs for every point of a GPX document
///
/// Waypoints use their name when present, other points their position in the document.
/// A waypoint whose name is already taken falls back to its position, then to a
/// numbered suffix, so every minted IRI is unique within the document.
fn gpx_points(gpx_data: &gpx::Gpx, base_iri: &str, source_index: usize) -> Vec<GpxPoint> {
    let prefix = format!("{base_iri}{source_index}/");
    let mut points = Vec::new();
    let mut waypoint_ids = HashSet::new();

    let mut push = |subject: String, waypoint: &gpx::Waypoint| {
        let point = waypoint.point();
        points.push(GpxPoint {
            subject: subject.into(),
            lat: point.y(),
            lon: point.x(),
        });
    };

    for (i, waypoint) in gpx_data.waypoints.iter().enumerate() {
        let mut id = match waypoint.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => iri_segment(name),
            _ => i.to_string(),
        };
        if waypoint_ids.contains(&id) {
            id = i.to_string();
            let mut suffix = 1;
            while waypoint_ids.contains(&id) {
                id = format!("{i}_{suffix}");
                suffix += 1;
            }
        }
        waypoint_ids.insert(id.clone());
        push(format!("{prefix}waypoint/{id}"), waypoint);
    }

    for (r, route) in gpx_data.routes.iter().enumerate() {
        for (p, waypoint) in route.points.iter().enumerate() {
            push(format!("{prefix}route/{r}/{p}"), waypoint);
        }
    }

    for (t, track) in gpx_data.tracks.iter().enumerate() {
        for (s, segment) in track.segments.iter().enumerate() {
            for (p, waypoint) in segment.points.iter().enumerate() {
                push(format!("{prefix}track/{t}/{s}/{p}"), waypoint);
            }
        }
    }

    points
}

/// Replace characters that are not allowed in an IRI path segment
fn iri_segment(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '<' | '>' | '"' | '{' | '}' | '|' | '\\' | '^' | '`' | '#' | '?' => '_',
            c if c.is_whitespace() => '_',
            c => c,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use gpx::{Gpx, Track, TrackSegment, Waypoint};

    fn create_test_waypoint(lat: f64, lon: f64) -> Waypoint {
        Waypoint::new(geo::Point::new(lon, lat))
    }

    fn create_test_gpx() -> Gpx {
        let mut gpx = Gpx::default();

        let mut named = create_test_waypoint(60.17, 24.94);
        named.name = Some("Senate Square".to_string());
        gpx.waypoints.push(named);
        gpx.waypoints.push(create_test_waypoint(60.20, 24.66));

        let mut track = Track::default();
        let mut segment = TrackSegment::default();
        // Add test points (around Helsinki)
        for i in 0..100 {
            segment.points.push(create_test_waypoint(
                60.1 + i as f64 * 0.001,
                24.9 + i as f64 * 0.001,
            ));
        }
        track.segments.push(segment);
        gpx.tracks.push(track);
        gpx
    }

    #[test]
    fn test_store_creation() {
        let store = GeoStore::new(Config::default());
        assert!(store.is_empty());
        assert_eq!(store.get_info(), StoreInfo::default());
    }

    #[test]
    fn test_insert_point_and_lookup() {
        let mut store = GeoStore::new(Config::default());
        store.insert_point("http://example.org/a", 60.0, 25.0).unwrap();

        assert_eq!(store.point_of("http://example.org/a"), Some((60.0, 25.0)));
        assert_eq!(
            store.coordinate("http://example.org/a", vocab::WGS84_LONG),
            Some(25.0)
        );
        assert_eq!(store.coordinate("http://example.org/a", "http://example.org/alt"), None);
        assert_eq!(store.point_of("http://example.org/b"), None);
        assert_eq!(store.get_info().indexed_points, 1);
    }

    #[test]
    fn test_insert_point_out_of_bounds() {
        let mut store = GeoStore::new(Config::default());
        assert!(store.insert_point("http://example.org/a", 100.0, 0.0).is_err());
        assert!(store.is_empty());
    }

    #[test]
    fn test_insert_property_is_not_indexed() {
        let mut store = GeoStore::new(Config::default());
        store.insert_property("http://example.org/a", vocab::WGS84_LAT, 60.0);
        assert_eq!(store.point_of("http://example.org/a"), None);
        assert_eq!(store.get_info().subject_count, 1);
        assert_eq!(store.get_info().indexed_points, 0);
    }

    #[test]
    fn test_add_gpx() {
        let mut store = GeoStore::new(Config::default());
        let added = store.add_gpx(create_test_gpx()).unwrap();

        assert_eq!(added, 102);
        assert_eq!(store.get_info().indexed_points, 102);
        assert_eq!(
            store.point_of("urn:gpx:0/waypoint/Senate_Square"),
            Some((60.17, 24.94))
        );
        assert_eq!(store.point_of("urn:gpx:0/waypoint/1"), Some((60.20, 24.66)));
        assert!(store.point_of("urn:gpx:0/track/0/0/99").is_some());
    }

    #[test]
    fn test_reinsert_point_moves_index_entry() {
        let mut store = GeoStore::new(Config::default());
        store.insert_point("http://example.org/a", 61.0, 25.0).unwrap();
        store.insert_point("http://example.org/a", 61.0, 25.0).unwrap();
        assert_eq!(
            store.get_info(),
            StoreInfo {
                subject_count: 1,
                indexed_points: 1
            }
        );

        store.insert_point("http://example.org/a", 10.0, 10.0).unwrap();
        assert_eq!(store.get_info().indexed_points, 1);
        let old: Vec<IndexHit> = store
            .range_query(&BoundingBox::new(24.0, 60.0, 26.0, 62.0))
            .collect();
        assert!(old.is_empty());
        let new: Vec<IndexHit> = store
            .range_query(&BoundingBox::new(9.0, 9.0, 11.0, 11.0))
            .collect();
        assert_eq!(new.len(), 1);
    }

    #[test]
    fn test_failed_reinsert_keeps_previous_point() {
        let mut store = GeoStore::new(Config::default());
        store.insert_point("http://example.org/a", 61.0, 25.0).unwrap();
        assert!(store.insert_point("http://example.org/a", 95.0, 25.0).is_err());
        assert_eq!(store.point_of("http://example.org/a"), Some((61.0, 25.0)));
        assert_eq!(store.get_info().indexed_points, 1);
    }

    #[test]
    fn test_unbound_query_yields_reinserted_subject_once() {
        use crate::{Binding, ExecutionContext, Node, PropFuncArg, PropertyFunction, WithinPolygon};

        let mut store = GeoStore::new(Config::default());
        store.insert_point("http://example.org/a", 61.0, 25.0).unwrap();
        store.insert_point("http://example.org/a", 61.0, 25.0).unwrap();

        let node = WithinPolygon::new()
            .build(
                &PropFuncArg::Node(Node::variable("s")),
                &Node::iri(vocab::WITHIN_POLYGON),
                &PropFuncArg::Node(Node::literal("60 24, 60 26, 62 26, 62 24")),
            )
            .unwrap();
        let results = node.execute(Binding::new(), ExecutionContext::new(&store, &store));
        assert_eq!(results.count(), 1);
    }

    #[test]
    fn test_duplicate_waypoint_names_get_distinct_subjects() {
        let mut gpx = Gpx::default();
        for (lat, name) in [(60.0, Some("Cafe")), (60.1, Some("Cafe")), (60.2, None), (60.3, Some("2"))] {
            let mut waypoint = create_test_waypoint(lat, 25.0);
            waypoint.name = name.map(str::to_string);
            gpx.waypoints.push(waypoint);
        }

        let mut store = GeoStore::new(Config::default());
        assert_eq!(store.add_gpx(gpx).unwrap(), 4);
        assert_eq!(
            store.get_info(),
            StoreInfo {
                subject_count: 4,
                indexed_points: 4
            }
        );
        assert_eq!(store.point_of("urn:gpx:0/waypoint/Cafe"), Some((60.0, 25.0)));
        assert_eq!(store.point_of("urn:gpx:0/waypoint/1"), Some((60.1, 25.0)));
        assert_eq!(store.point_of("urn:gpx:0/waypoint/2"), Some((60.2, 25.0)));
        assert_eq!(store.point_of("urn:gpx:0/waypoint/3"), Some((60.3, 25.0)));
    }

    #[test]
    fn test_add_gpx_replaces_existing_subject() {
        let mut store = GeoStore::new(Config::default());
        store.insert_point("urn:gpx:0/waypoint/0", 10.0, 10.0).unwrap();

        let mut gpx = Gpx::default();
        gpx.waypoints.push(create_test_waypoint(60.0, 25.0));
        store.add_gpx(gpx).unwrap();

        assert_eq!(store.get_info().indexed_points, 1);
        assert_eq!(store.point_of("urn:gpx:0/waypoint/0"), Some((60.0, 25.0)));
    }

    #[test]
    fn test_add_gpx_skips_out_of_bounds_points() {
        let mut gpx = Gpx::default();
        gpx.waypoints.push(create_test_waypoint(60.0, 25.0));
        gpx.waypoints.push(create_test_waypoint(60.0, 250.0));

        let mut store = GeoStore::new(Config::default());
        assert_eq!(store.add_gpx(gpx).unwrap(), 1);
        assert!(store.point_of("urn:gpx:0/waypoint/1").is_none());
    }

    #[test]
    fn test_add_gpx_parallel_mints_distinct_subjects() {
        let mut store = GeoStore::new(Config::default());
        let added = store
            .add_gpx_parallel(vec![create_test_gpx(), create_test_gpx(), create_test_gpx()])
            .unwrap();

        assert_eq!(added, 306);
        assert_eq!(store.get_info().indexed_points, 306);
        assert_eq!(store.get_info().subject_count, 306);
        assert!(store.point_of("urn:gpx:2/waypoint/Senate_Square").is_some());

        // Sequential loads continue numbering after the parallel batch
        store.add_gpx(create_test_gpx()).unwrap();
        assert!(store.point_of("urn:gpx:3/waypoint/Senate_Square").is_some());
    }

    #[test]
    fn test_range_query() {
        let mut store = GeoStore::new(Config::default());
        store.add_gpx(create_test_gpx()).unwrap();

        let hits: Vec<IndexHit> = store
            .range_query(&BoundingBox::new(24.8995, 60.0995, 24.9505, 60.1505))
            .collect();
        // Track points 0..=50, none of the waypoints
        assert_eq!(hits.len(), 51);
        for hit in &hits {
            assert!(hit.subject.starts_with("urn:gpx:0/track/0/0/"));
        }
    }

    #[test]
    fn test_clear() {
        let mut store = GeoStore::new(Config::default());
        store.add_gpx(create_test_gpx()).unwrap();
        store.clear();
        assert!(store.is_empty());
        assert!(store.quadtree().is_empty());

        store.add_gpx(create_test_gpx()).unwrap();
        assert!(store.point_of("urn:gpx:0/waypoint/Senate_Square").is_some());
    }

    #[test]
    fn test_load_missing_file() {
        let mut store = GeoStore::new(Config::default());
        let err = store
            .load_from_files(vec!["/nonexistent/within-polygon/test.gpx"])
            .unwrap_err();
        assert!(matches!(err, SpatialError::Io(_)), "{err}");
    }

    #[test]
    fn test_iri_segment() {
        assert_eq!(iri_segment("Senate Square"), "Senate_Square");
        assert_eq!(iri_segment("a/b#c"), "a_b_c");
        assert_eq!(iri_segment("Kauppatori"), "Kauppatori");
    }
}
