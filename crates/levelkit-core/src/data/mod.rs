//! Data models for coordinates, bounding boxes and machine state
//!
//! This module provides:
//! - Planar and spatial points used by the planner and the height mesh
//! - The XY bounding box of a program, with an explicit empty state
//! - The positional/modal snapshot reported by the controller

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::units::Units;

/// A point in the XY plane
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2 {
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
}

impl Point2 {
    /// Create a new planar point
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Point2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.3}, {:.3})", self.x, self.y)
    }
}

/// A point in machine or work space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point3 {
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
    /// Z coordinate
    pub z: f64,
}

impl Point3 {
    /// Create a new spatial point
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Component-wise difference `self - other`
    pub fn sub(&self, other: &Point3) -> Point3 {
        Point3::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }

    /// Component-wise sum `self + other`
    pub fn add(&self, other: &Point3) -> Point3 {
        Point3::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }

    /// Scale every component by `factor`
    pub fn scale(&self, factor: f64) -> Point3 {
        Point3::new(self.x * factor, self.y * factor, self.z * factor)
    }

    /// Cross product `self x other`
    pub fn cross(&self, other: &Point3) -> Point3 {
        Point3::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    /// Euclidean length
    pub fn length(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Squared distance to another point in the XY plane only
    pub fn planar_distance_squared(&self, x: f64, y: f64) -> f64 {
        let dx = self.x - x;
        let dy = self.y - y;
        dx * dx + dy * dy
    }

    /// Convert all components between unit systems
    pub fn convert(&self, from: Units, to: Units) -> Point3 {
        Point3::new(
            Units::convert(self.x, from, to),
            Units::convert(self.y, from, to),
            Units::convert(self.z, from, to),
        )
    }

    /// Drop the Z component
    pub fn xy(&self) -> Point2 {
        Point2::new(self.x, self.y)
    }
}

impl fmt::Display for Point3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.3}, {:.3}, {:.3})", self.x, self.y, self.z)
    }
}

/// Axis-aligned XY bounding box
///
/// Invariant: `min.x <= max.x` and `min.y <= max.y`. A program without any
/// motion has no box at all; callers hold an `Option<BoundingBox>` rather than
/// a zero-size box at the origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Lower-left corner
    pub min: Point2,
    /// Upper-right corner
    pub max: Point2,
}

impl BoundingBox {
    /// Create a box from two corners, normalizing their order
    pub fn new(a: Point2, b: Point2) -> Self {
        Self {
            min: Point2::new(a.x.min(b.x), a.y.min(b.y)),
            max: Point2::new(a.x.max(b.x), a.y.max(b.y)),
        }
    }

    /// Width along X
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    /// Height along Y
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    /// Grow the box outward by `margin` on every side
    pub fn expand(&self, margin: f64) -> Self {
        Self {
            min: Point2::new(self.min.x - margin, self.min.y - margin),
            max: Point2::new(self.max.x + margin, self.max.y + margin),
        }
    }

    /// Whether a point lies inside or on the border
    pub fn contains(&self, p: Point2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "min {} max {}", self.min, self.max)
    }
}

/// Snapshot of controller state relevant to leveling
///
/// Every field is optional: controllers report them piecemeal and a missing
/// field means "unchanged", not zero.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MachineState {
    /// Active modal units (G20/G21)
    pub units: Option<Units>,
    /// Machine position (MPos)
    pub machine_position: Option<Point3>,
    /// Work position (WPos)
    pub work_position: Option<Point3>,
    /// Work coordinate offset (WCO)
    pub work_offset: Option<Point3>,
}
