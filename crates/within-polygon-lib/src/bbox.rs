//! Axis-aligned bounding box handed to the spatial index as a range filter

use geo::{Coord, Point, Rect};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in degrees (`x` = longitude, `y` = latitude)
///
/// All comparisons are inclusive, so points on the edges are inside the box.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    /// Create a bounding box from two opposite corners (normalised so that min <= max)
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            min_x: x1.min(x2),
            min_y: y1.min(y2),
            max_x: x1.max(x2),
            max_y: y1.max(y2),
        }
    }

    #[inline]
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    #[inline]
    pub fn contains_point(&self, point: Point<f64>) -> bool {
        self.contains(point.x(), point.y())
    }

    /// Check if two boxes overlap (touching edges count as overlap)
    #[inline]
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        !(self.max_x < other.min_x
            || self.min_x > other.max_x
            || self.max_y < other.min_y
            || self.min_y > other.max_y)
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}

impl From<Rect<f64>> for BoundingBox {
    fn from(rect: Rect<f64>) -> Self {
        Self {
            min_x: rect.min().x,
            min_y: rect.min().y,
            max_x: rect.max().x,
            max_y: rect.max().y,
        }
    }
}

impl From<BoundingBox> for Rect<f64> {
    fn from(bbox: BoundingBox) -> Self {
        Rect::new(
            Coord {
                x: bbox.min_x,
                y: bbox.min_y,
            },
            Coord {
                x: bbox.max_x,
                y: bbox.max_y,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_normalises_corners() {
        let bbox = BoundingBox::new(10.0, 5.0, -10.0, -5.0);
        assert_eq!(bbox.min_x, -10.0);
        assert_eq!(bbox.min_y, -5.0);
        assert_eq!(bbox.max_x, 10.0);
        assert_eq!(bbox.max_y, 5.0);
    }

    #[test]
    fn test_contains_is_inclusive() {
        let bbox = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        assert!(bbox.contains(5.0, 5.0));
        assert!(bbox.contains(0.0, 0.0));
        assert!(bbox.contains(10.0, 3.0));
        assert!(!bbox.contains(10.0001, 3.0));
        assert!(!bbox.contains_point(Point::new(-1.0, 5.0)));
    }

    #[test]
    fn test_intersects() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        assert!(a.intersects(&BoundingBox::new(5.0, 5.0, 15.0, 15.0)));
        assert!(a.intersects(&BoundingBox::new(10.0, 10.0, 20.0, 20.0)));
        assert!(!a.intersects(&BoundingBox::new(11.0, 0.0, 20.0, 10.0)));
    }

    #[test]
    fn test_rect_conversion() {
        let bbox = BoundingBox::new(-1.0, -2.0, 3.0, 4.0);
        let rect: Rect<f64> = bbox.into();
        assert_eq!(rect.width(), bbox.width());
        assert_eq!(rect.height(), bbox.height());
        assert_eq!(BoundingBox::from(rect), bbox);
    }
}
