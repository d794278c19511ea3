//! Object-space centering of control points.

use glam::DVec3;

/// Arithmetic mean of `points`, or `None` for an empty slice.
pub fn centroid(points: &[DVec3]) -> Option<DVec3> {
    if points.is_empty() {
        return None;
    }
    let sum = points.iter().fold(DVec3::ZERO, |acc, p| acc + *p);
    Some(sum / points.len() as f64)
}

/// Translate `points` so their mean sits on the origin.
pub fn center_points(points: &[DVec3]) -> Vec<DVec3> {
    match centroid(points) {
        Some(mean) => points.iter().map(|p| *p - mean).collect(),
        None => Vec::new(),
    }
}
