//! Geometric primitives for street polylines.

use cgmath::Point2;
pub use earth::*;
pub use segment::segments_intersect;

mod earth;
mod segment;

/// A 2D point in planar `(lon, lat)` degree space.
pub type Point2d = Point2<f64>;
