#![warn(missing_docs)]

//! Math types for nozzle wipe planning.
//!
//! Thin wrappers around nalgebra for the planar (XY) geometry a wipe
//! works in, plus the tolerance used for every floating-point comparison
//! the wipe engine makes.

use nalgebra::Vector2;

/// A point in the XY plane of the printer.
pub type Point2 = nalgebra::Point2<f64>;

/// A vector in the XY plane.
pub type Vec2 = Vector2<f64>;

/// Euclidean distance between two XY coordinates.
pub fn xy_distance(x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
    nalgebra::distance(&Point2::new(x1, y1), &Point2::new(x2, y2))
}

/// Point on the segment `from → to` at parameter `t` (0 = `from`, 1 = `to`).
pub fn lerp(from: &Point2, to: &Point2, t: f64) -> Point2 {
    from + (to - from) * t
}

/// Tolerance for comparing lengths and extrusion amounts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerance {
    /// Absolute tolerance in mm (applies to both XY lengths and E).
    pub linear: f64,
}

impl Tolerance {
    /// Default tolerance (1e-6 mm).
    pub const DEFAULT: Self = Self { linear: 1e-6 };

    /// Check if a value is effectively zero.
    pub fn is_zero(&self, d: f64) -> bool {
        d.abs() < self.linear
    }

    /// Check if two values are equal within tolerance.
    pub fn equal(&self, a: f64, b: f64) -> bool {
        (a - b).abs() < self.linear
    }

    /// `a < b` by more than the tolerance.
    pub fn less_than(&self, a: f64, b: f64) -> bool {
        a < b - self.linear
    }

    /// `a > b` by more than the tolerance.
    pub fn greater_than(&self, a: f64, b: f64) -> bool {
        a > b + self.linear
    }

    /// `a >= b`, treating values within tolerance as equal.
    pub fn greater_than_or_equal(&self, a: f64, b: f64) -> bool {
        !self.less_than(a, b)
    }

    /// Check if two points are coincident within tolerance.
    pub fn points_equal(&self, a: &Point2, b: &Point2) -> bool {
        (a - b).norm() < self.linear
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_xy_distance() {
        assert_relative_eq!(xy_distance(0.0, 0.0, 3.0, 4.0), 5.0);
        assert_relative_eq!(xy_distance(1.0, 1.0, 1.0, 1.0), 0.0);
    }

    #[test]
    fn test_lerp() {
        let a = Point2::new(0.0, 0.0);
        let b = Point2::new(10.0, -4.0);
        let mid = lerp(&a, &b, 0.5);
        assert_relative_eq!(mid.x, 5.0);
        assert_relative_eq!(mid.y, -2.0);
        assert!(Tolerance::DEFAULT.points_equal(&lerp(&a, &b, 1.0), &b));
    }

    #[test]
    fn test_tolerance_comparisons() {
        let tol = Tolerance::DEFAULT;
        assert!(tol.is_zero(1e-7));
        assert!(!tol.is_zero(1e-3));
        assert!(tol.equal(1.0, 1.0 + 1e-8));
        assert!(tol.less_than(1.0, 1.1));
        assert!(!tol.less_than(1.0, 1.0 + 1e-8));
        assert!(tol.greater_than(1.1, 1.0));
        assert!(!tol.greater_than(1.0 + 1e-8, 1.0));
        assert!(tol.greater_than_or_equal(1.0 - 1e-8, 1.0));
        assert!(!tol.greater_than_or_equal(0.9, 1.0));
    }
}
