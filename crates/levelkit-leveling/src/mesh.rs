//! Height mesh compensation
//!
//! The mesh is the unordered set of probed points, each holding the surface
//! height relative to the zero reference (the first probed point). A
//! correction at `(x, y)` comes from the plane through the three nearest
//! points that are not collinear in XY. Points are stored in millimeters;
//! callers working in inches pass their units and get inches back.

use levelkit_core::{BoundingBox, Point2, Point3, Units};
use serde::{Deserialize, Serialize};

use crate::error::MeshError;

/// Smallest XY cross product for three points to count as a triangle
const COLLINEAR_EPSILON: f64 = 1e-5;

fn cross_xy(a: &Point3, b: &Point3, c: &Point3) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

/// Scattered probe heights, millimeters
///
/// X and Y are work coordinates; Z is the height above the zero reference.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HeightMesh {
    points: Vec<Point3>,
}

impl HeightMesh {
    /// Create a mesh from probed points (millimeters)
    pub fn new(points: Vec<Point3>) -> Self {
        Self { points }
    }

    /// The probed points in the order they were collected
    pub fn points(&self) -> &[Point3] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// XY extent of the probed points
    pub fn bounds(&self) -> Option<BoundingBox> {
        let first = self.points.first()?;
        let mut bounds = BoundingBox::new(first.xy(), first.xy());
        for p in &self.points[1..] {
            bounds = BoundingBox::new(
                Point2::new(bounds.min.x.min(p.x), bounds.min.y.min(p.y)),
                Point2::new(bounds.max.x.max(p.x), bounds.max.y.max(p.y)),
            );
        }
        Some(bounds)
    }

    /// The three points used to interpolate at `(x, y)`
    ///
    /// The two nearest points are always taken; the third is the nearest
    /// remaining point not collinear with them.
    pub fn nearest_triangle(&self, x: f64, y: f64) -> Result<[Point3; 3], MeshError> {
        let insufficient = MeshError::InsufficientMesh {
            points: self.points.len(),
        };
        if self.points.len() < 3 {
            return Err(insufficient);
        }

        let mut order: Vec<(f64, usize)> = self
            .points
            .iter()
            .enumerate()
            .map(|(i, p)| (p.planar_distance_squared(x, y), i))
            .collect();
        order.sort_by(|a, b| a.0.total_cmp(&b.0));

        let a = self.points[order[0].1];
        let b = self.points[order[1].1];
        order[2..]
            .iter()
            .map(|&(_, i)| self.points[i])
            .find(|c| cross_xy(&a, &b, c).abs() > COLLINEAR_EPSILON)
            .map(|c| [a, b, c])
            .ok_or(insufficient)
    }

    /// Surface height above the zero reference at `(x, y)`, millimeters
    pub fn height_at(&self, x: f64, y: f64) -> Result<f64, MeshError> {
        let [a, b, c] = self.nearest_triangle(x, y)?;
        let normal = b.sub(&a).cross(&c.sub(&a));
        if normal.z == 0.0 {
            return Err(MeshError::DegeneratePlane);
        }
        Ok(a.z - (normal.x * (x - a.x) + normal.y * (y - a.y)) / normal.z)
    }

    /// Shift `point` by the surface height beneath it
    ///
    /// `point` is in `units` and so is the result.
    pub fn compensate(&self, point: Point3, units: Units) -> Result<Point3, MeshError> {
        let mm = point.convert(units, Units::MM);
        let height = self.height_at(mm.x, mm.y)?;
        Ok(Point3::new(mm.x, mm.y, mm.z + height).convert(Units::MM, units))
    }
}

impl From<Vec<Point3>> for HeightMesh {
    fn from(points: Vec<Point3>) -> Self {
        Self::new(points)
    }
}
