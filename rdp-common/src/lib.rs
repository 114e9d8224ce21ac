//! Common geometry types shared by the input engine crates.
//!
//! - [`Point`] - 2D point with i32 coordinates (remote-surface pixels)
//! - [`PointF`] - 2D point with f32 coordinates (view pixels)
//! - [`RectF`] - axis-aligned rectangle in view pixels

use serde::{Deserialize, Serialize};
use std::ops::{Add, Sub};

/// A 2D point with integer coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    /// Create a new point.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// A 2D point with floating point coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PointF {
    pub x: f32,
    pub y: f32,
}

impl PointF {
    /// Create a new point.
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Squared euclidean distance to `other`.
    pub fn distance_squared(&self, other: &PointF) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Euclidean distance to `other`.
    pub fn distance(&self, other: &PointF) -> f32 {
        self.distance_squared(other).sqrt()
    }

    /// Midpoint between `self` and `other`.
    pub fn midpoint(&self, other: &PointF) -> PointF {
        PointF::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }

    /// Truncate towards zero, the way pixel coordinates are handed to the session.
    pub fn to_point(self) -> Point {
        Point::new(self.x as i32, self.y as i32)
    }
}

impl Add for PointF {
    type Output = PointF;

    fn add(self, rhs: PointF) -> PointF {
        PointF::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for PointF {
    type Output = PointF;

    fn sub(self, rhs: PointF) -> PointF {
        PointF::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// A rectangle defined by its left/top and right/bottom edges.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RectF {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl RectF {
    /// Create a new rectangle from its edges.
    pub const fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Create a rectangle from an origin and a size.
    pub fn from_origin_size(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self::new(x, y, x + width, y + height)
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    /// Center of the rectangle.
    pub fn center(&self) -> PointF {
        PointF::new(
            (self.left + self.right) / 2.0,
            (self.top + self.bottom) / 2.0,
        )
    }

    /// Check if a point is contained within this rectangle (right/bottom exclusive).
    pub fn contains(&self, p: PointF) -> bool {
        self.left < self.right
            && self.top < self.bottom
            && p.x >= self.left
            && p.x < self.right
            && p.y >= self.top
            && p.y < self.bottom
    }

    /// Return this rectangle moved by `offset`.
    pub fn translated(&self, offset: PointF) -> RectF {
        RectF::new(
            self.left + offset.x,
            self.top + offset.y,
            self.right + offset.x,
            self.bottom + offset.y,
        )
    }
}
