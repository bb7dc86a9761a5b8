//! Core geometry types: Vector2, Spacing, Axis.
//!
//! Layout values are `f64` throughout. [`Vector2`] is the result of a 2-D layout
//! (position or size), [`Spacing`] is container padding and [`Axis`] selects the
//! component a 1-D layout feeds.

use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

// ---------------------------------------------------------------------------
// Axis
// ---------------------------------------------------------------------------

/// The axis a 1-D layout belongs to.
///
/// A binding to a 2-D property (`b1.size`, `&.innersize`) reads the component
/// matching the axis of the layout that contains it.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Horizontal: left, width.
    #[default]
    X,
    /// Vertical: top, height.
    Y,
}

// ---------------------------------------------------------------------------
// Vector2
// ---------------------------------------------------------------------------

/// A 2D position or size.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Vector2 {
    pub x: f64,
    pub y: f64,
}

impl Vector2 {
    /// The zero vector.
    pub const ZERO: Vector2 = Vector2 { x: 0.0, y: 0.0 };

    /// Create a new vector.
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<(f64, f64)> for Vector2 {
    #[inline]
    fn from((x, y): (f64, f64)) -> Self {
        Vector2 { x, y }
    }
}

impl Add for Vector2 {
    type Output = Vector2;
    #[inline]
    fn add(self, rhs: Vector2) -> Vector2 {
        Vector2 { x: self.x + rhs.x, y: self.y + rhs.y }
    }
}

impl AddAssign for Vector2 {
    #[inline]
    fn add_assign(&mut self, rhs: Vector2) {
        *self = *self + rhs;
    }
}

impl Sub for Vector2 {
    type Output = Vector2;
    #[inline]
    fn sub(self, rhs: Vector2) -> Vector2 {
        Vector2 { x: self.x - rhs.x, y: self.y - rhs.y }
    }
}

impl SubAssign for Vector2 {
    #[inline]
    fn sub_assign(&mut self, rhs: Vector2) {
        *self = *self - rhs;
    }
}

impl Neg for Vector2 {
    type Output = Vector2;
    #[inline]
    fn neg(self) -> Vector2 {
        Vector2 { x: -self.x, y: -self.y }
    }
}

impl Mul<f64> for Vector2 {
    type Output = Vector2;
    #[inline]
    fn mul(self, rhs: f64) -> Vector2 {
        Vector2 { x: self.x * rhs, y: self.y * rhs }
    }
}

impl Div<f64> for Vector2 {
    type Output = Vector2;
    #[inline]
    fn div(self, rhs: f64) -> Vector2 {
        Vector2 { x: self.x / rhs, y: self.y / rhs }
    }
}

// ---------------------------------------------------------------------------
// Spacing
// ---------------------------------------------------------------------------

/// Spacing around the four sides of a rectangle, used for container padding.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Spacing {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Spacing {
    /// Zero spacing on all sides.
    pub const ZERO: Spacing = Spacing { top: 0.0, right: 0.0, bottom: 0.0, left: 0.0 };

    /// Create spacing with explicit values for each side.
    #[inline]
    pub const fn new(top: f64, right: f64, bottom: f64, left: f64) -> Self {
        Self { top, right, bottom, left }
    }

    /// All four sides set to the same value.
    #[inline]
    pub const fn all(value: f64) -> Self {
        Self { top: value, right: value, bottom: value, left: value }
    }

    /// Symmetric spacing: `vertical` for top/bottom, `horizontal` for left/right.
    #[inline]
    pub const fn symmetric(vertical: f64, horizontal: f64) -> Self {
        Self { top: vertical, right: horizontal, bottom: vertical, left: horizontal }
    }

    /// Total horizontal extent: `left + right`.
    #[inline]
    pub fn width(self) -> f64 {
        self.left + self.right
    }

    /// Total vertical extent: `top + bottom`.
    #[inline]
    pub fn height(self) -> f64 {
        self.top + self.bottom
    }

    /// Shrink `size` by this spacing. The result may be negative.
    #[inline]
    pub fn shrink(self, size: Vector2) -> Vector2 {
        Vector2::new(size.x - self.width(), size.y - self.height())
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vector_new_and_default() {
        assert_eq!(Vector2::new(3.0, -7.5), Vector2 { x: 3.0, y: -7.5 });
        assert_eq!(Vector2::default(), Vector2::ZERO);
    }

    #[test]
    fn vector_arithmetic() {
        let a = Vector2::new(1.0, 2.0);
        let b = Vector2::new(3.0, 4.0);
        assert_eq!(a + b, Vector2::new(4.0, 6.0));
        assert_eq!(b - a, Vector2::new(2.0, 2.0));
        assert_eq!(-a, Vector2::new(-1.0, -2.0));
        assert_eq!(a * 2.5, Vector2::new(2.5, 5.0));
        assert_eq!(b / 2.0, Vector2::new(1.5, 2.0));
    }

    #[test]
    fn vector_assign_ops() {
        let mut v = Vector2::new(1.0, 1.0);
        v += Vector2::new(2.0, 3.0);
        assert_eq!(v, Vector2::new(3.0, 4.0));
        v -= Vector2::new(1.0, 1.0);
        assert_eq!(v, Vector2::new(2.0, 3.0));
    }

    #[test]
    fn axis_default() {
        assert_eq!(Axis::default(), Axis::X);
    }

    #[test]
    fn spacing_extents() {
        let s = Spacing::new(1.0, 2.0, 3.0, 4.0);
        assert_eq!(s.width(), 6.0);
        assert_eq!(s.height(), 4.0);
        assert_eq!(Spacing::all(2.0), Spacing::symmetric(2.0, 2.0));
    }

    #[test]
    fn spacing_shrink_allows_negative() {
        let s = Spacing::all(5.0);
        assert_eq!(s.shrink(Vector2::new(100.0, 8.0)), Vector2::new(90.0, -2.0));
        assert_eq!(Spacing::ZERO.shrink(Vector2::new(3.0, 4.0)), Vector2::new(3.0, 4.0));
    }
}
