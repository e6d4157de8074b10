//! 2D geometry helpers for pose math.
//!
//! All positions are in frame pixel space.

use serde::{Deserialize, Serialize};

/// A 2D point or vector in pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance(&self, other: &Point) -> f64 {
        (*self - *other).norm()
    }

    /// Vector magnitude.
    pub fn norm(&self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    /// Dot product.
    pub fn dot(&self, other: &Point) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// Scale by a scalar.
    pub fn scale(&self, factor: f64) -> Point {
        Point::new(self.x * factor, self.y * factor)
    }

    /// Unit vector in this direction, or `None` for the zero vector.
    pub fn normalized(&self) -> Option<Point> {
        let n = self.norm();
        if n > f64::EPSILON {
            Some(self.scale(1.0 / n))
        } else {
            None
        }
    }

    /// Mean of a non-empty set of points.
    pub fn mean(points: &[Point]) -> Option<Point> {
        if points.is_empty() {
            return None;
        }
        let n = points.len() as f64;
        let sum = points
            .iter()
            .fold(Point::ZERO, |acc, p| Point::new(acc.x + p.x, acc.y + p.y));
        Some(Point::new(sum.x / n, sum.y / n))
    }
}

impl std::ops::Add for Point {
    type Output = Point;
    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::Sub for Point {
    type Output = Point;
    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// Angle at vertex `b` of the triangle `a-b-c`, in degrees.
///
/// Standard law-of-cosines vector formula:
/// `acos(dot(v1, v2) / (|v1| * |v2|))` with `v1 = a - b`, `v2 = c - b`.
/// Returns `None` when either limb has zero length.
pub fn angle_deg(a: Point, b: Point, c: Point) -> Option<f64> {
    let v1 = a - b;
    let v2 = c - b;
    let n1 = v1.norm();
    let n2 = v2.norm();
    if n1 < f64::EPSILON || n2 < f64::EPSILON {
        return None;
    }
    let cos = (v1.dot(&v2) / (n1 * n2)).clamp(-1.0, 1.0);
    Some(cos.acos().to_degrees())
}
