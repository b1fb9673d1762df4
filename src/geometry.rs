//! Planar geometry on the board: points, distances and segment projection.
//!
//! Relative comparisons use squared distances; anything compared against a
//! radius uses the true Euclidean distance.

use std::fmt;
use std::ops::{Add, Mul, Sub};

use crate::constants::{BOARD_DIAMETER, GEOMETRY_EPSILON};

/// A point in board space (or normalised space, depending on context).
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared distance to `other`. Use for ordering only.
    #[inline]
    pub fn distance_sq(self, other: Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Euclidean distance to `other`.
    #[inline]
    pub fn distance(self, other: Point) -> f64 {
        self.distance_sq(other).sqrt()
    }

    /// Map a board-space point into `[0, 1]²`.
    pub fn normalize(self) -> Point {
        Point::new(self.x / BOARD_DIAMETER, self.y / BOARD_DIAMETER)
    }

    /// Map a normalised point back into board space.
    pub fn unnormalize(self) -> Point {
        Point::new(self.x * BOARD_DIAMETER, self.y * BOARD_DIAMETER)
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Point {
    type Output = Point;

    fn mul(self, rhs: f64) -> Point {
        Point::new(self.x * rhs, self.y * rhs)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.3}, {:.3})", self.x, self.y)
    }
}

/// Closest point to `p` on the segment `[a, b]`.
///
/// The projection parameter is clamped to `[0, 1]`. A degenerate segment
/// (`a == b`) projects everything onto `a`.
pub fn point_on_segment(a: Point, b: Point, p: Point) -> Point {
    let d = b - a;
    let len_sq = d.x * d.x + d.y * d.y;
    if len_sq == 0.0 {
        return a;
    }
    let u = ((p.x - a.x) * d.x + (p.y - a.y) * d.y) / len_sq;
    a + d * u.clamp(0.0, 1.0)
}

/// Point at parameter `t` along `[a, b]`.
#[inline]
pub fn lerp(a: Point, b: Point, t: f64) -> Point {
    a + (b - a) * t
}

/// True if two circles overlap. Touching circles do not overlap.
#[inline]
pub fn circles_overlap(c1: Point, r1: f64, c2: Point, r2: f64) -> bool {
    c1.distance(c2) < r1 + r2 - GEOMETRY_EPSILON
}

/// `n` evenly spaced parameters over `[0, 1]`, both ends included.
pub fn linspace(n: usize) -> impl Iterator<Item = f64> {
    let denom = n.saturating_sub(1).max(1) as f64;
    (0..n).map(move |i| i as f64 / denom)
}
