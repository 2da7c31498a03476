use crate::core::geo::Point;
use serde::{Deserialize, Serialize};

/// Represents a bounding box in screen/pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: Point,
    pub max: Point,
}

impl Bounds {
    /// Creates new bounds from two points
    pub fn new(min: Point, max: Point) -> Self {
        Self { min, max }
    }

    /// Creates bounds spanning two arbitrary corner points
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self::new(
            Point::new(a.x.min(b.x), a.y.min(b.y)),
            Point::new(a.x.max(b.x), a.y.max(b.y)),
        )
    }

    /// Creates bounds from a center point and size
    pub fn from_center_and_size(center: Point, width: f64, height: f64) -> Self {
        let half = Point::new(width / 2.0, height / 2.0);
        Self::new(center.subtract(&half), center.add(&half))
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn size(&self) -> Point {
        Point::new(self.width(), self.height())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_center_and_size() {
        let bounds = Bounds::from_center_and_size(Point::new(20.0, 30.0), 20.0, 10.0);
        assert_eq!(bounds.min, Point::new(10.0, 25.0));
        assert_eq!(bounds.max, Point::new(30.0, 35.0));
        assert_eq!(bounds.size(), Point::new(20.0, 10.0));
    }

    #[test]
    fn test_from_corners_orders_points() {
        let bounds = Bounds::from_corners(Point::new(30.0, 5.0), Point::new(10.0, 25.0));
        assert_eq!(bounds.min, Point::new(10.0, 5.0));
        assert_eq!(bounds.max, Point::new(30.0, 25.0));
    }
}
