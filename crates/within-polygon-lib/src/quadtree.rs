//! Quadtree point index for bounding-box range queries
//!
//! This module provides an adaptive quadtree over WGS84 degrees. Leaves hold up to a
//! configured number of points and split into four children when they overflow, so
//! range queries only visit nodes whose bounds overlap the query box.

use crate::{BoundingBox, IndexHit, Result, SpatialError, SpatialIndex};
use geo::{Coord, Point, Rect};
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Longitude range covered by the root node
const MIN_LON: f64 = -180.0;
const MAX_LON: f64 = 180.0;

/// Latitude range covered by the root node
const MIN_LAT: f64 = -90.0;
const MAX_LAT: f64 = 90.0;

/// A subject stored in the quadtree
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
struct IndexedPoint {
    /// Subject IRI (shared between the store and the index)
    subject: Arc<str>,
    /// Location (`x` = longitude, `y` = latitude)
    point: Point<f64>,
}

/// Root container for the quadtree spatial index
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Quadtree {
    /// Root node covering the whole globe
    root: QuadtreeNode,
    /// Leaf capacity before subdivision
    max_points_per_node: usize,
    /// Maximum depth of the tree to bound recursion on clustered points
    max_depth: u32,
    /// Number of stored points
    len: usize,
}

/// A single node in the quadtree
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
struct QuadtreeNode {
    /// Bounds in degrees
    bounding_box: Rect<f64>,
    /// Depth level in the tree (0 = root)
    level: u32,
    /// Points stored at this node (only leaves hold points)
    points: Vec<IndexedPoint>,
    /// Child nodes (NW, NE, SW, SE) if subdivided
    children: Option<Box<[QuadtreeNode; 4]>>,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl Quadtree {
    /// Create a new empty quadtree covering the globe
    ///
    /// # Arguments
    /// * `max_points_per_node` - Leaf capacity before a node is split (at least 1)
    /// * `max_depth` - Depth at which leaves stop splitting
    pub fn new(max_points_per_node: usize, max_depth: u32) -> Self {
        Self {
            root: QuadtreeNode::new_root(),
            max_points_per_node: max_points_per_node.max(1),
            max_depth,
            len: 0,
        }
    }

    /// Insert a subject at `(lat, lon)`
    ///
    /// Fails with [`SpatialError::OutOfBounds`] for coordinates outside the WGS84 range
    /// (including NaN).
    pub fn insert(&mut self, subject: Arc<str>, lat: f64, lon: f64) -> Result<()> {
        if !(MIN_LAT..=MAX_LAT).contains(&lat) || !(MIN_LON..=MAX_LON).contains(&lon) {
            return Err(SpatialError::OutOfBounds { lat, lon });
        }

        let entry = IndexedPoint {
            subject,
            point: Point::new(lon, lat),
        };
        self.root
            .insert(entry, self.max_points_per_node, self.max_depth);
        self.len += 1;
        Ok(())
    }

    /// Merge another quadtree into this one
    ///
    /// Both quadtrees must have the same configuration (capacity and depth).
    pub fn merge(&mut self, other: Quadtree) -> Result<()> {
        // Verify compatibility
        if self.max_points_per_node != other.max_points_per_node {
            return Err(SpatialError::MergeMismatch {
                reason: "Node capacities do not match".to_string(),
            });
        }
        if self.max_depth != other.max_depth {
            return Err(SpatialError::MergeMismatch {
                reason: "Maximum depths do not match".to_string(),
            });
        }

        let mut points = Vec::with_capacity(other.len);
        other.root.drain_into(&mut points);
        for entry in points {
            self.root
                .insert(entry, self.max_points_per_node, self.max_depth);
            self.len += 1;
        }
        Ok(())
    }

    /// Remove the entry of `subject` stored at `(lat, lon)`
    ///
    /// Returns `false` if no such entry exists.
    pub fn remove(&mut self, subject: &str, lat: f64, lon: f64) -> bool {
        let removed = self.root.remove(subject, Point::new(lon, lat));
        if removed {
            self.len -= 1;
        }
        removed
    }

    /// Query for points inside the box (edges included)
    pub fn query(&self, bbox: &BoundingBox) -> Vec<IndexHit> {
        let mut results = Vec::new();
        self.root.query_points(bbox, &mut results);
        results
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Depth of the deepest node
    pub fn depth(&self) -> u32 {
        self.root.depth()
    }
}

impl SpatialIndex for Quadtree {
    fn range_query<'a>(&'a self, bbox: &BoundingBox) -> Box<dyn Iterator<Item = IndexHit> + 'a> {
        Box::new(self.query(bbox).into_iter())
    }
}

impl QuadtreeNode {
    /// Create a root node covering all valid WGS84 coordinates
    fn new_root() -> Self {
        let bounding_box = Rect::new(
            Coord {
                x: MIN_LON,
                y: MIN_LAT,
            },
            Coord {
                x: MAX_LON,
                y: MAX_LAT,
            },
        );
        Self::new_child(bounding_box, 0)
    }

    /// Create a child node with the given bounding box and level
    fn new_child(bounding_box: Rect<f64>, level: u32) -> Self {
        Self {
            bounding_box,
            level,
            points: Vec::new(),
            children: None,
        }
    }

    /// Subdivide this node into 4 children and move its points down
    fn subdivide(&mut self, max_points_per_node: usize, max_depth: u32) {
        if self.children.is_some() {
            return; // Already subdivided
        }

        let min = self.bounding_box.min();
        let max = self.bounding_box.max();
        let mid_x = (min.x + max.x) / 2.0;
        let mid_y = (min.y + max.y) / 2.0;

        let child_level = self.level + 1;

        // Create 4 children: NW, NE, SW, SE
        let nw = QuadtreeNode::new_child(
            Rect::new(Coord { x: min.x, y: mid_y }, Coord { x: mid_x, y: max.y }),
            child_level,
        );
        let ne = QuadtreeNode::new_child(
            Rect::new(Coord { x: mid_x, y: mid_y }, Coord { x: max.x, y: max.y }),
            child_level,
        );
        let sw = QuadtreeNode::new_child(
            Rect::new(Coord { x: min.x, y: min.y }, Coord { x: mid_x, y: mid_y }),
            child_level,
        );
        let se = QuadtreeNode::new_child(
            Rect::new(Coord { x: mid_x, y: min.y }, Coord { x: max.x, y: mid_y }),
            child_level,
        );

        self.children = Some(Box::new([nw, ne, sw, se]));

        for entry in std::mem::take(&mut self.points) {
            self.insert(entry, max_points_per_node, max_depth);
        }
    }

    /// Index of the child quadrant a point falls into
    fn quadrant(&self, point: Point<f64>) -> usize {
        let min = self.bounding_box.min();
        let max = self.bounding_box.max();
        let is_east = point.x() >= (min.x + max.x) / 2.0;
        let is_north = point.y() >= (min.y + max.y) / 2.0;

        match (is_east, is_north) {
            (false, true) => 0,  // NW
            (true, true) => 1,   // NE
            (false, false) => 2, // SW
            (true, false) => 3,  // SE
        }
    }

    /// Insert a point into the leaf that covers it, splitting overflowing leaves
    fn insert(&mut self, entry: IndexedPoint, max_points_per_node: usize, max_depth: u32) {
        let quadrant = self.quadrant(entry.point);
        if let Some(children) = &mut self.children {
            children[quadrant].insert(entry, max_points_per_node, max_depth);
            return;
        }

        self.points.push(entry);
        if self.points.len() > max_points_per_node && self.level < max_depth {
            self.subdivide(max_points_per_node, max_depth);
        }
    }

    /// Remove one entry from the leaf that covers `point`
    fn remove(&mut self, subject: &str, point: Point<f64>) -> bool {
        let quadrant = self.quadrant(point);
        if let Some(children) = &mut self.children {
            return children[quadrant].remove(subject, point);
        }

        match self
            .points
            .iter()
            .position(|entry| entry.point == point && &*entry.subject == subject)
        {
            Some(index) => {
                self.points.swap_remove(index);
                true
            }
            None => false,
        }
    }

    /// Move all points of this subtree into `out`
    fn drain_into(self, out: &mut Vec<IndexedPoint>) {
        out.extend(self.points);
        if let Some(children) = self.children {
            for child in *children {
                child.drain_into(out);
            }
        }
    }

    /// Query this node and its children for points inside the box
    fn query_points(&self, bbox: &BoundingBox, results: &mut Vec<IndexHit>) {
        // Culling - skip nodes that do not overlap the query box
        if !bbox.intersects(&BoundingBox::from(self.bounding_box)) {
            return;
        }

        for entry in &self.points {
            if bbox.contains_point(entry.point) {
                results.push(IndexHit {
                    subject: entry.subject.to_string(),
                    point: entry.point,
                });
            }
        }

        // Recurse into children
        if let Some(children) = &self.children {
            for child in children.iter() {
                child.query_points(bbox, results);
            }
        }
    }

    fn depth(&self) -> u32 {
        match &self.children {
            Some(children) => children.iter().map(QuadtreeNode::depth).max().unwrap_or(self.level),
            None => self.level,
        }
    }
}
