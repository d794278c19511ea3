use bevy::prelude::*;
use control_library::{CurveData, CurveSource};
use glam::DVec3;

/// Curve shape. Lives on a child entity of the curve's transform entity.
#[derive(Component, Debug, Clone, PartialEq)]
pub struct ControlCurve(pub CurveData);

impl CurveSource for ControlCurve {
    fn degree(&self) -> u32 {
        self.0.degree
    }

    fn is_periodic(&self) -> bool {
        self.0.periodic
    }

    fn control_points(&self) -> Vec<DVec3> {
        self.0.points.clone()
    }

    fn knots(&self) -> Vec<f64> {
        self.0.knots.clone()
    }
}

/// Any shape the library cannot store (meshes, surfaces, ...).
#[derive(Component, Debug, Clone)]
pub struct OtherShape {
    pub kind: String,
}

/// Marks an entity as selected; lower `order` was selected first.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Selected {
    pub order: u32,
}

/// Offset group created when instantiating with `offset_group` enabled.
#[derive(Component, Debug, Default)]
pub struct ControlGroup;
