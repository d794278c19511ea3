//! Canonical curve description stored in a library record.

use std::fmt;

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::scene::CurveSource;

/// Everything needed to rebuild a NURBS curve: degree, form, control points and
/// knot vector. Field order matches the sorted key order of the record file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CurveData {
    pub degree: u32,
    #[serde(rename = "knot")]
    pub knots: Vec<f64>,
    pub periodic: bool,
    /// Control points in curve order.
    #[serde(rename = "point")]
    pub points: Vec<DVec3>,
}

impl CurveData {
    pub fn new(degree: u32, periodic: bool, points: Vec<DVec3>, knots: Vec<f64>) -> Self {
        Self {
            degree,
            knots,
            periodic,
            points,
        }
    }

    /// Open curve through `points` with a uniform knot vector clamped at both
    /// ends (the host's default when no knots are supplied).
    pub fn open_uniform(degree: u32, points: Vec<DVec3>) -> Self {
        let spans = points.len().saturating_sub(degree as usize);
        let mut knots = Vec::with_capacity((points.len() + degree as usize).saturating_sub(1));
        for _ in 1..degree {
            knots.push(0.0);
        }
        for k in 0..=spans {
            knots.push(k as f64);
        }
        for _ in 1..degree {
            knots.push(spans as f64);
        }
        Self::new(degree, false, points, knots)
    }

    /// Point-in-time copy of a live curve. Reads degree, form, control points
    /// and knots in that order.
    pub fn snapshot(source: &dyn CurveSource) -> Self {
        let degree = source.degree();
        let periodic = source.is_periodic();
        let points = source.control_points();
        let knots = source.knots();
        Self::new(degree, periodic, points, knots)
    }

    /// Structural checks mirroring the host's curve-construction rules.
    pub fn validate(&self) -> Result<(), String> {
        if self.degree == 0 {
            return Err("degree must be at least 1".to_string());
        }
        let degree = self.degree as usize;
        if self.points.is_empty() {
            return Err("curve has no control points".to_string());
        }
        if self.points.len() < degree + 1 {
            return Err(format!(
                "degree {} needs at least {} control points, found {}",
                degree,
                degree + 1,
                self.points.len()
            ));
        }
        let expected = self.points.len() + degree - 1;
        if self.knots.len() != expected {
            return Err(format!(
                "expected {} knots for {} points of degree {}, found {}",
                expected,
                self.points.len(),
                degree,
                self.knots.len()
            ));
        }
        if let Some(i) = self.points.iter().position(|p| !p.is_finite()) {
            return Err(format!("control point {i} is not finite"));
        }
        if self.knots.iter().any(|k| !k.is_finite()) {
            return Err("knot vector contains a non-finite value".to_string());
        }
        if let Some(i) = self.knots.windows(2).position(|w| w[1] < w[0]) {
            return Err(format!("knot vector decreases at index {}", i + 1));
        }
        Ok(())
    }
}

impl CurveSource for CurveData {
    fn degree(&self) -> u32 {
        self.degree
    }

    fn is_periodic(&self) -> bool {
        self.periodic
    }

    fn control_points(&self) -> Vec<DVec3> {
        self.points.clone()
    }

    fn knots(&self) -> Vec<f64> {
        self.knots.clone()
    }
}

/// One-line construction summary, e.g. `curve(d=1, periodic=false, p=[(0, 0, 0), (1, 0, 0)], k=[0, 1])`.
impl fmt::Display for CurveData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "curve(d={}, periodic={}, p=[", self.degree, self.periodic)?;
        for (i, p) in self.points.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "({}, {}, {})", p.x, p.y, p.z)?;
        }
        f.write_str("], k=[")?;
        for (i, k) in self.knots.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{k}")?;
        }
        f.write_str("])")
    }
}
