//! Parsed polygon with cached bounding box and exact containment

use crate::{BoundingBox, ParseOptions, Result, SpatialError};
use geo::algorithm::Validation;
use geo::{Area, BoundingRect, Coord, Intersects, LineString, Point, Polygon};
use std::collections::HashSet;
use std::fmt::Write;

/// Minimum number of distinct vertices in a ring
const MIN_DISTINCT_VERTICES: usize = 3;

/// An immutable, validated polygon ring
///
/// Coordinates are stored with `x` = longitude and `y` = latitude. The ring is always
/// closed: its first and last vertex are equal.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedPolygon {
    polygon: Polygon<f64>,
    /// Precomputed bounding box (computed once during construction)
    bounding_box: BoundingBox,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl ParsedPolygon {
    /// Build a polygon from a closed ring, validating it
    pub(crate) fn from_ring(ring: Vec<Coord<f64>>) -> Result<Self> {
        let distinct = ring
            .iter()
            .map(|c| (c.x.to_bits(), c.y.to_bits()))
            .collect::<HashSet<_>>()
            .len();
        if distinct < MIN_DISTINCT_VERTICES {
            return Err(SpatialError::TooFewVertices { found: distinct });
        }

        let polygon = Polygon::new(LineString::from(ring), Vec::new());
        polygon
            .check_validation()
            .map_err(|e| SpatialError::InvalidGeometry(e.to_string()))?;
        // Collinear rings pass validation but enclose nothing
        if polygon.unsigned_area() == 0.0 {
            return Err(SpatialError::InvalidGeometry(
                "Ring has zero area".to_string(),
            ));
        }

        let bounding_box = polygon
            .bounding_rect()
            .map(BoundingBox::from)
            .ok_or_else(|| SpatialError::InvalidGeometry("Empty ring".to_string()))?;

        Ok(Self {
            polygon,
            bounding_box,
        })
    }

    /// The underlying geometry
    #[inline]
    pub fn polygon(&self) -> &Polygon<f64> {
        &self.polygon
    }

    /// Axis-aligned bounding box of all vertices
    #[inline]
    pub fn bounding_box(&self) -> BoundingBox {
        self.bounding_box
    }

    /// Vertices of the closed ring as `(latitude, longitude)`
    pub fn vertices(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.polygon.exterior().coords().map(|c| (c.y, c.x))
    }

    /// Number of vertices in the closed ring (including the closing vertex)
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.polygon.exterior().0.len()
    }

    /// Exact point-in-polygon test; points on the boundary are contained
    #[inline]
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        self.contains_point(Point::new(lon, lat))
    }

    /// Same as [`ParsedPolygon::contains`] for a point with `x` = longitude, `y` = latitude
    pub fn contains_point(&self, point: Point<f64>) -> bool {
        // `Intersects` counts the boundary, unlike `Contains`
        self.bounding_box.contains_point(point) && self.polygon.intersects(&point)
    }

    /// Serialise the ring back into the micro-grammar using the given delimiters and order
    pub fn to_polygon_string(&self, options: &ParseOptions) -> String {
        let mut out = String::new();
        for (i, (lat, lon)) in self.vertices().enumerate() {
            if i > 0 {
                out.push_str(&options.point_delimiter);
            }
            let (first, second) = options.coordinate_order.written(lat, lon);
            let _ = write!(out, "{first}{}{second}", options.coordinate_delimiter);
        }
        out
    }

    /// `POLYGON ((...))` form with latitude first, as accepted by the parser defaults
    pub fn to_wkt(&self) -> String {
        format!(
            "POLYGON (({}))",
            self.to_polygon_string(&ParseOptions::default())
        )
    }
}
