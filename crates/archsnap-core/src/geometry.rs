//! Geometric primitives for scene layout and framing.
//!
//! This module provides the fundamental geometric types used throughout
//! archsnap for calculating positions, sizes, and bounding volumes of scene
//! elements.
//!
//! # Overview
//!
//! - [`Point`] - A 3D coordinate (also used as a displacement vector)
//! - [`Size`] - Width, height and depth extents
//! - [`Bounds`] - An axis-aligned bounding box
//! - [`Rotation`] - Euler rotation in degrees
//!
//! # Coordinate System
//!
//! archsnap uses a right-handed coordinate system with Y pointing up:
//!
//! ```text
//!        +Y
//!         │
//!         │
//!         └──────► +X
//!        ╱
//!       ╱
//!     +Z
//! ```
//!
//! - **Ground plane**: X–Z, nodes rest on `y = 0`
//! - **X-axis**: dependency depth (layers advance along +X)
//! - **Z-axis**: spread of the nodes within a layer
//!
//! Width is measured along X, height along Y and depth along Z.

use serde::{Deserialize, Serialize, Serializer, ser::SerializeStruct};

/// A 3D point representing a position in scene space.
///
/// Points use `f32` coordinates and double as displacement vectors for
/// basic vector math.
///
/// # Examples
///
/// ```
/// # use archsnap_core::geometry::Point;
/// let p1 = Point::new(10.0, 20.0, 4.0);
/// let p2 = Point::new(5.0, 5.0, 2.0);
///
/// let sum = p1.add_point(p2);
/// assert_eq!(sum, Point::new(15.0, 25.0, 6.0));
///
/// let mid = p1.midpoint(p2);
/// assert_eq!(mid, Point::new(7.5, 12.5, 3.0));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Point {
    x: f32,
    y: f32,
    z: f32,
}

impl Point {
    /// Creates a new point with the specified coordinates
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Returns the x-coordinate of the point
    pub fn x(self) -> f32 {
        self.x
    }

    /// Returns the y-coordinate of the point
    pub fn y(self) -> f32 {
        self.y
    }

    /// Returns the z-coordinate of the point
    pub fn z(self) -> f32 {
        self.z
    }

    /// Creates a new point with the specified y-coordinate
    pub fn with_y(mut self, y: f32) -> Self {
        self.y = y;
        self
    }

    /// Creates a new point with the specified z-coordinate
    pub fn with_z(mut self, z: f32) -> Self {
        self.z = z;
        self
    }

    /// Adds another point to this point, returning a new point.
    pub fn add_point(self, other: Point) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
            z: self.z + other.z,
        }
    }

    /// Subtracts another point from this point, returning a new point
    pub fn sub_point(self, other: Point) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
            z: self.z - other.z,
        }
    }

    /// Calculates the midpoint between this point and another point
    pub fn midpoint(self, other: Point) -> Self {
        Self {
            x: (self.x + other.x) / 2.0,
            y: (self.y + other.y) / 2.0,
            z: (self.z + other.z) / 2.0,
        }
    }

    /// Multiplies all coordinates by the given factor.
    pub fn scale(self, factor: f32) -> Self {
        Self {
            x: self.x * factor,
            y: self.y * factor,
            z: self.z * factor,
        }
    }

    /// Euclidean length of the point seen as a vector from the origin
    pub fn length(self) -> f32 {
        self.dot(self).sqrt()
    }

    /// Dot product with another vector
    pub fn dot(self, other: Point) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Cross product with another vector
    pub fn cross(self, other: Point) -> Self {
        Self {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }

    /// Returns the unit vector in the same direction, or `None` for a
    /// zero-length vector.
    pub fn normalize(self) -> Option<Self> {
        let length = self.length();
        if length <= f32::EPSILON {
            None
        } else {
            Some(self.scale(1.0 / length))
        }
    }

    /// Converts a point and size into a bounding box centered on the point.
    pub fn to_bounds(self, size: Size) -> Bounds {
        Bounds::new_from_center(self, size)
    }
}

/// Extents of an element along the three axes
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    width: f32,
    height: f32,
    depth: f32,
}

impl Size {
    pub fn new(width: f32, height: f32, depth: f32) -> Self {
        Self {
            width,
            height,
            depth,
        }
    }

    /// Creates a size with the same extent on every axis
    pub fn uniform(extent: f32) -> Self {
        Self::new(extent, extent, extent)
    }

    /// Returns the extent along X
    pub fn width(self) -> f32 {
        self.width
    }

    /// Returns the extent along Y
    pub fn height(self) -> f32 {
        self.height
    }

    /// Returns the extent along Z
    pub fn depth(self) -> f32 {
        self.depth
    }

    /// Multiplies every extent by the given factor
    pub fn scale(self, factor: f32) -> Self {
        Self {
            width: self.width * factor,
            height: self.height * factor,
            depth: self.depth * factor,
        }
    }

    /// Grows every extent by `padding` on both sides
    pub fn add_padding(self, padding: f32) -> Self {
        Self {
            width: self.width + 2.0 * padding,
            height: self.height + 2.0 * padding,
            depth: self.depth + 2.0 * padding,
        }
    }

    /// Half extents as a vector
    pub fn half_extents(self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0, self.depth / 2.0)
    }

    /// Length of the box diagonal
    pub fn diagonal(self) -> f32 {
        Point::new(self.width, self.height, self.depth).length()
    }
}

/// Euler rotation in degrees, applied in X, Y, Z order
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Rotation {
    x: f32,
    y: f32,
    z: f32,
}

impl Rotation {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// The identity rotation
    pub fn identity() -> Self {
        Self::default()
    }

    pub fn x(self) -> f32 {
        self.x
    }

    pub fn y(self) -> f32 {
        self.y
    }

    pub fn z(self) -> f32 {
        self.z
    }
}

/// An axis-aligned bounding box with minimum and maximum coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Bounds {
    min: Point,
    max: Point,
}

impl Bounds {
    /// Creates bounds from two opposite corners in any order
    pub fn new(a: Point, b: Point) -> Self {
        Self {
            min: Point::new(a.x.min(b.x), a.y.min(b.y), a.z.min(b.z)),
            max: Point::new(a.x.max(b.x), a.y.max(b.y), a.z.max(b.z)),
        }
    }

    /// Creates a new bounds from a center point and a size
    pub fn new_from_center(center: Point, size: Size) -> Self {
        let half = size.half_extents();
        Self {
            min: center.sub_point(half),
            max: center.add_point(half),
        }
    }

    /// Smallest bounds containing every point, or `None` for no points
    pub fn from_points(points: impl IntoIterator<Item = Point>) -> Option<Self> {
        points
            .into_iter()
            .map(|point| Self {
                min: point,
                max: point,
            })
            .reduce(|acc, bounds| acc.merge(&bounds))
    }

    /// Returns the minimum corner
    pub fn min_point(self) -> Point {
        self.min
    }

    /// Returns the maximum corner
    pub fn max_point(self) -> Point {
        self.max
    }

    pub fn min_x(self) -> f32 {
        self.min.x
    }

    pub fn min_y(self) -> f32 {
        self.min.y
    }

    pub fn min_z(self) -> f32 {
        self.min.z
    }

    pub fn max_x(self) -> f32 {
        self.max.x
    }

    pub fn max_y(self) -> f32 {
        self.max.y
    }

    pub fn max_z(self) -> f32 {
        self.max.z
    }

    /// Returns the center point of the bounds
    pub fn center(self) -> Point {
        self.min.midpoint(self.max)
    }

    /// Converts bounds to a Size object
    pub fn to_size(self) -> Size {
        let extent = self.max.sub_point(self.min);
        Size::new(extent.x, extent.y, extent.z)
    }

    /// Radius of the sphere centered on the bounds that encloses them
    pub fn bounding_radius(self) -> f32 {
        self.to_size().diagonal() / 2.0
    }

    /// Merges two bounds into the smallest bounds containing both.
    ///
    /// # Examples
    ///
    /// ```
    /// # use archsnap_core::geometry::{Bounds, Point, Size};
    /// let a = Bounds::new_from_center(Point::default(), Size::uniform(2.0));
    /// let b = Bounds::new_from_center(Point::new(4.0, 0.0, 0.0), Size::uniform(2.0));
    ///
    /// let merged = a.merge(&b);
    /// assert_eq!(merged.min_x(), -1.0);
    /// assert_eq!(merged.max_x(), 5.0);
    /// assert_eq!(merged.to_size(), Size::new(6.0, 2.0, 2.0));
    /// ```
    pub fn merge(&self, other: &Self) -> Self {
        Self {
            min: Point::new(
                self.min.x.min(other.min.x),
                self.min.y.min(other.min.y),
                self.min.z.min(other.min.z),
            ),
            max: Point::new(
                self.max.x.max(other.max.x),
                self.max.y.max(other.max.y),
                self.max.z.max(other.max.z),
            ),
        }
    }

    /// Expands the bounds by `padding` on every side.
    pub fn add_padding(&self, padding: f32) -> Self {
        let pad = Point::new(padding, padding, padding);
        Self {
            min: self.min.sub_point(pad),
            max: self.max.add_point(pad),
        }
    }

    /// Returns true if the point lies inside or on the boundary
    pub fn contains_point(&self, point: Point) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
            && point.z >= self.min.z
            && point.z <= self.max.z
    }

    /// Returns true if the point lies strictly inside the bounds
    pub fn strictly_contains_point(&self, point: Point) -> bool {
        point.x > self.min.x
            && point.x < self.max.x
            && point.y > self.min.y
            && point.y < self.max.y
            && point.z > self.min.z
            && point.z < self.max.z
    }

    /// Returns true if `other` lies strictly inside these bounds on every side
    pub fn strictly_contains(&self, other: &Bounds) -> bool {
        self.min.x < other.min.x
            && self.min.y < other.min.y
            && self.min.z < other.min.z
            && self.max.x > other.max.x
            && self.max.y > other.max.y
            && self.max.z > other.max.z
    }

    /// Per-axis penetration depth with another box.
    ///
    /// Returns `None` unless the open interiors overlap on all three axes;
    /// boxes that merely touch do not overlap.
    pub fn overlap(&self, other: &Bounds) -> Option<Point> {
        let dx = self.max.x.min(other.max.x) - self.min.x.max(other.min.x);
        let dy = self.max.y.min(other.max.y) - self.min.y.max(other.min.y);
        let dz = self.max.z.min(other.max.z) - self.min.z.max(other.min.z);
        (dx > 0.0 && dy > 0.0 && dz > 0.0).then(|| Point::new(dx, dy, dz))
    }

    /// Returns true if the open interiors of the two boxes intersect
    pub fn intersects(&self, other: &Bounds) -> bool {
        self.overlap(other).is_some()
    }

    /// Returns true if the segment `start..end` passes through the interior.
    ///
    /// Uses the slab method; a segment that only grazes a face does not count.
    pub fn intersects_segment(&self, start: Point, end: Point) -> bool {
        let direction = end.sub_point(start);
        let mut t_enter = 0.0f32;
        let mut t_exit = 1.0f32;

        let axes = [
            (start.x, direction.x, self.min.x, self.max.x),
            (start.y, direction.y, self.min.y, self.max.y),
            (start.z, direction.z, self.min.z, self.max.z),
        ];

        for (origin, delta, lo, hi) in axes {
            if delta.abs() <= f32::EPSILON {
                if origin <= lo || origin >= hi {
                    return false;
                }
                continue;
            }
            let t1 = (lo - origin) / delta;
            let t2 = (hi - origin) / delta;
            t_enter = t_enter.max(t1.min(t2));
            t_exit = t_exit.min(t1.max(t2));
            if t_enter >= t_exit {
                return false;
            }
        }

        true
    }
}

impl Serialize for Bounds {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Bounds", 2)?;
        state.serialize_field("min", &self.min)?;
        state.serialize_field("max", &self.max)?;
        state.end()
    }
}


#[cfg(test)]
mod proptest_tests {
    use float_cmp::approx_eq;
    use proptest::prelude::*;

    use super::*;

    // ===================
    // Strategies
    // ===================

    fn point_strategy() -> impl Strategy<Value = Point> {
        (-1000.0f32..1000.0, -1000.0f32..1000.0, -1000.0f32..1000.0)
            .prop_map(|(x, y, z)| Point::new(x, y, z))
    }

    fn bounds_strategy() -> impl Strategy<Value = Bounds> {
        (
            point_strategy(),
            1.0f32..500.0,
            1.0f32..500.0,
            1.0f32..500.0,
        )
            .prop_map(|(center, w, h, d)| Bounds::new_from_center(center, Size::new(w, h, d)))
    }

    // ===================
    // Property Test Functions
    // ===================

    /// Point addition should be commutative: p1 + p2 == p2 + p1.
    fn check_point_add_is_commutative(p1: Point, p2: Point) -> Result<(), TestCaseError> {
        let result1 = p1.add_point(p2);
        let result2 = p2.add_point(p1);

        prop_assert!(approx_eq!(f32, result1.x(), result2.x()));
        prop_assert!(approx_eq!(f32, result1.y(), result2.y()));
        prop_assert!(approx_eq!(f32, result1.z(), result2.z()));
        Ok(())
    }

    /// The cross product is perpendicular to both operands.
    fn check_cross_is_perpendicular(p1: Point, p2: Point) -> Result<(), TestCaseError> {
        let (Some(a), Some(b)) = (p1.normalize(), p2.normalize()) else {
            return Ok(());
        };
        let c = a.cross(b);

        prop_assert!(c.dot(a).abs() < 1e-3);
        prop_assert!(c.dot(b).abs() < 1e-3);
        Ok(())
    }

    /// Merged bounds should contain both original bounds.
    fn check_bounds_merge_contains_both(b1: Bounds, b2: Bounds) -> Result<(), TestCaseError> {
        let merged = b1.merge(&b2);

        for bounds in [b1, b2] {
            prop_assert!(merged.contains_point(bounds.min_point()));
            prop_assert!(merged.contains_point(bounds.max_point()));
        }
        Ok(())
    }

    /// Overlap is symmetric.
    fn check_overlap_is_symmetric(b1: Bounds, b2: Bounds) -> Result<(), TestCaseError> {
        prop_assert_eq!(b1.overlap(&b2), b2.overlap(&b1));
        Ok(())
    }

    /// Padding by a positive amount strictly contains the original.
    fn check_padding_strictly_contains(bounds: Bounds, padding: f32) -> Result<(), TestCaseError> {
        prop_assert!(bounds.add_padding(padding).strictly_contains(&bounds));
        Ok(())
    }

    /// A segment between two interior points always intersects the box.
    fn check_interior_segment_intersects(bounds: Bounds, t: f32) -> Result<(), TestCaseError> {
        let center = bounds.center();
        let inner = center.add_point(bounds.max_point().sub_point(center).scale(t));
        prop_assert!(bounds.intersects_segment(center, inner) || inner == center);
        Ok(())
    }

    // ===================
    // Proptest Wrappers
    // ===================

    proptest! {
        #[test]
        fn point_add_is_commutative(p1 in point_strategy(), p2 in point_strategy()) {
            check_point_add_is_commutative(p1, p2)?;
        }

        #[test]
        fn cross_is_perpendicular(p1 in point_strategy(), p2 in point_strategy()) {
            check_cross_is_perpendicular(p1, p2)?;
        }

        #[test]
        fn bounds_merge_contains_both(b1 in bounds_strategy(), b2 in bounds_strategy()) {
            check_bounds_merge_contains_both(b1, b2)?;
        }

        #[test]
        fn overlap_is_symmetric(b1 in bounds_strategy(), b2 in bounds_strategy()) {
            check_overlap_is_symmetric(b1, b2)?;
        }

        #[test]
        fn padding_strictly_contains(bounds in bounds_strategy(), padding in 0.01f32..50.0) {
            check_padding_strictly_contains(bounds, padding)?;
        }

        #[test]
        fn interior_segment_intersects(bounds in bounds_strategy(), t in 0.01f32..0.99) {
            check_interior_segment_intersects(bounds, t)?;
        }
    }
}
