#![forbid(unsafe_code)]

//! Geometric primitives.
//!
//! All coordinates are panel coordinates: origin at the panel's top-left
//! corner, x grows right, y grows down. Units are whatever the host lays out
//! in (pixels, points, cells); the engine never assumes a density.

use std::ops::{Add, AddAssign, Neg, Sub};

use serde::{Deserialize, Serialize};

/// Linear interpolation between `a` and `b`.
///
/// `t` is not clamped; callers that need an envelope guarantee clamp first.
#[inline]
#[must_use]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// A position in panel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    /// The panel origin.
    pub const ORIGIN: Self = Self::new(0.0, 0.0);

    /// Create a new point.
    #[inline]
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Manhattan distance to `other`.
    #[inline]
    #[must_use]
    pub fn manhattan_distance(self, other: Self) -> f32 {
        (self - other).manhattan()
    }
}

/// Difference between two points.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Displacement {
    pub dx: f32,
    pub dy: f32,
}

impl Displacement {
    /// No movement.
    pub const ZERO: Self = Self::new(0.0, 0.0);

    /// Create a new displacement.
    #[inline]
    #[must_use]
    pub const fn new(dx: f32, dy: f32) -> Self {
        Self { dx, dy }
    }

    /// `|dx| + |dy|`.
    #[inline]
    #[must_use]
    pub fn manhattan(self) -> f32 {
        self.dx.abs() + self.dy.abs()
    }
}

impl Sub for Point {
    type Output = Displacement;

    #[inline]
    fn sub(self, rhs: Self) -> Displacement {
        Displacement::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Add<Displacement> for Point {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Displacement) -> Self {
        Self::new(self.x + rhs.dx, self.y + rhs.dy)
    }
}

impl Sub<Displacement> for Point {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Displacement) -> Self {
        Self::new(self.x - rhs.dx, self.y - rhs.dy)
    }
}

impl Add for Displacement {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::new(self.dx + rhs.dx, self.dy + rhs.dy)
    }
}

impl AddAssign for Displacement {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        self.dx += rhs.dx;
        self.dy += rhs.dy;
    }
}

impl Neg for Displacement {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Self::new(-self.dx, -self.dy)
    }
}

/// Pointer velocity at release, in units per second.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Velocity {
    pub vx: f32,
    pub vy: f32,
}

impl Velocity {
    /// At rest.
    pub const ZERO: Self = Self::new(0.0, 0.0);

    /// Create a new velocity.
    #[inline]
    #[must_use]
    pub const fn new(vx: f32, vy: f32) -> Self {
        Self { vx, vy }
    }
}

/// An axis-aligned rectangle for hit testing.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge (inclusive).
    pub x: f32,
    /// Top edge (inclusive).
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    /// Create a new rectangle.
    #[inline]
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle with its top-left corner at `origin`.
    #[inline]
    #[must_use]
    pub const fn from_origin(origin: Point, width: f32, height: f32) -> Self {
        Self::new(origin.x, origin.y, width, height)
    }

    /// Right edge (exclusive).
    #[inline]
    #[must_use]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Bottom edge (exclusive).
    #[inline]
    #[must_use]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Check if the rectangle has zero (or negative) area.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Check if a point is inside the rectangle (half-open on right/bottom).
    #[inline]
    #[must_use]
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x && point.x < self.right() && point.y >= self.y && point.y < self.bottom()
    }

    /// The same rectangle moved by `by`.
    #[inline]
    #[must_use]
    pub fn translate(&self, by: Displacement) -> Self {
        Self::new(self.x + by.dx, self.y + by.dy, self.width, self.height)
    }
}

/// Visual transform of one card relative to the stack's rest origin.
///
/// `offset_x`/`offset_y` are measured from the top card's resting top-left
/// corner; scale is applied around the card's bottom-center pivot by the
/// renderer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CardTransform {
    pub offset_x: f32,
    pub offset_y: f32,
    pub scale_x: f32,
    pub scale_y: f32,
    pub opacity: f32,
}

impl Default for CardTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl CardTransform {
    /// Resting top card: no offset, full scale, fully opaque.
    pub const IDENTITY: Self = Self {
        offset_x: 0.0,
        offset_y: 0.0,
        scale_x: 1.0,
        scale_y: 1.0,
        opacity: 1.0,
    };

    /// Offset as a displacement.
    #[inline]
    #[must_use]
    pub fn offset(&self) -> Displacement {
        Displacement::new(self.offset_x, self.offset_y)
    }

    /// Copy with a replaced offset.
    #[inline]
    #[must_use]
    pub fn with_offset(mut self, offset: Displacement) -> Self {
        self.offset_x = offset.dx;
        self.offset_y = offset.dy;
        self
    }

    /// Copy with the same scale on both axes.
    #[inline]
    #[must_use]
    pub fn with_uniform_scale(mut self, scale: f32) -> Self {
        self.scale_x = scale;
        self.scale_y = scale;
        self
    }

    /// Copy with a replaced opacity, clamped to `[0, 1]`.
    #[inline]
    #[must_use]
    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity.clamp(0.0, 1.0);
        self
    }

    /// Component-wise interpolation from `self` toward `to`.
    #[must_use]
    pub fn lerp(&self, to: &Self, t: f32) -> Self {
        Self {
            offset_x: lerp(self.offset_x, to.offset_x, t),
            offset_y: lerp(self.offset_y, to.offset_y, t),
            scale_x: lerp(self.scale_x, to.scale_x, t),
            scale_y: lerp(self.scale_y, to.scale_y, t),
            opacity: lerp(self.opacity, to.opacity, t),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_difference_is_displacement() {
        let d = Point::new(10.0, 5.0) - Point::new(4.0, 8.0);
        assert_eq!(d, Displacement::new(6.0, -3.0));
        assert!((d.manhattan() - 9.0).abs() < f32::EPSILON);
    }

    #[test]
    fn point_plus_displacement_roundtrips() {
        let origin = Point::new(60.0, 10.0);
        let moved = origin + Displacement::new(350.0, 20.0);
        assert_eq!(moved - origin, Displacement::new(350.0, 20.0));
        assert_eq!(moved - Displacement::new(350.0, 20.0), origin);
    }

    #[test]
    fn rect_contains_is_half_open() {
        let r = Rect::new(10.0, 10.0, 100.0, 50.0);
        assert!(r.contains(Point::new(10.0, 10.0)));
        assert!(r.contains(Point::new(109.9, 59.9)));
        assert!(!r.contains(Point::new(110.0, 30.0)));
        assert!(!r.contains(Point::new(50.0, 60.0)));
        assert!(!r.contains(Point::new(9.9, 30.0)));
    }

    #[test]
    fn rect_translate_keeps_size() {
        let r = Rect::new(0.0, 0.0, 20.0, 30.0).translate(Displacement::new(5.0, -5.0));
        assert_eq!(r, Rect::new(5.0, -5.0, 20.0, 30.0));
        assert!(!r.is_empty());
        assert!(Rect::new(0.0, 0.0, 0.0, 5.0).is_empty());
    }

    #[test]
    fn transform_lerp_endpoints() {
        let a = CardTransform::IDENTITY;
        let b = CardTransform::IDENTITY
            .with_offset(Displacement::new(0.0, 40.0))
            .with_uniform_scale(0.92);
        assert_eq!(a.lerp(&b, 0.0), a);
        let end = a.lerp(&b, 1.0);
        assert!((end.offset_y - 40.0).abs() < 1e-5);
        assert!((end.scale_x - 0.92).abs() < 1e-5);
        let mid = a.lerp(&b, 0.5);
        assert!((mid.offset_y - 20.0).abs() < 1e-5);
        assert!((mid.scale_y - 0.96).abs() < 1e-5);
    }

    #[test]
    fn opacity_is_clamped() {
        assert_eq!(CardTransform::IDENTITY.with_opacity(1.7).opacity, 1.0);
        assert_eq!(CardTransform::IDENTITY.with_opacity(-0.2).opacity, 0.0);
    }

    #[test]
    fn transform_serializes_with_field_names() {
        let json = serde_json::to_string(&CardTransform::IDENTITY).expect("serialize");
        assert!(json.contains("\"offset_x\":0.0"), "{json}");
        assert!(json.contains("\"opacity\":1.0"), "{json}");
    }
}
