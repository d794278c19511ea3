//! Host capability traits.
//!
//! The core never talks to a host application directly. Adapters implement:
//!  - [`SceneRead`]: selection, naming, transform/shape structure, world transforms
//!  - [`SceneEdit`]: curve and group construction, transforms, renaming, parenting
//!  - [`FrameCapture`]: visibility and view control plus frame capture for thumbnails
//!
//! A scene object is either a transform (which may own a shape child) or a
//! shape. Shapes are either curves, exposed through [`CurveSource`], or
//! something else the core refuses to serialize.

use std::fmt;
use std::path::Path;

use glam::{DAffine3, DQuat, DVec3, EulerRot};
use serde::{Deserialize, Serialize};

use crate::curve::CurveData;
use crate::error::{CaptureError, SceneError};

/// Read-only view of a live curve shape.
pub trait CurveSource {
    fn degree(&self) -> u32;
    fn is_periodic(&self) -> bool;
    fn control_points(&self) -> Vec<DVec3>;
    fn knots(&self) -> Vec<f64>;
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Transform,
    Shape,
}

/// What a shape node holds.
pub enum ShapeView<'a> {
    Curve(&'a dyn CurveSource),
    /// Any non-curve shape; carries the host's type name for error messages.
    Other(String),
}

impl fmt::Debug for ShapeView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShapeView::Curve(c) => f
                .debug_struct("Curve")
                .field("degree", &c.degree())
                .field("periodic", &c.is_periodic())
                .finish(),
            ShapeView::Other(kind) => f.debug_tuple("Other").field(kind).finish(),
        }
    }
}

/// World-space translation, rotation and scale of a scene object.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorldTransform {
    pub translation: DVec3,
    pub rotation: DQuat,
    pub scale: DVec3,
}

impl WorldTransform {
    pub const IDENTITY: Self = Self {
        translation: DVec3::ZERO,
        rotation: DQuat::IDENTITY,
        scale: DVec3::ONE,
    };

    pub fn from_translation(translation: DVec3) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }

    /// Translation plus Euler angles in degrees, xyz rotate order (X applied
    /// first, the host's default).
    pub fn from_translation_euler_deg(translation: DVec3, euler_deg: DVec3) -> Self {
        Self {
            translation,
            rotation: DQuat::from_euler(
                EulerRot::ZYX,
                euler_deg.z.to_radians(),
                euler_deg.y.to_radians(),
                euler_deg.x.to_radians(),
            ),
            scale: DVec3::ONE,
        }
    }

    pub fn euler_deg(&self) -> DVec3 {
        let (z, y, x) = self.rotation.to_euler(EulerRot::ZYX);
        DVec3::new(x.to_degrees(), y.to_degrees(), z.to_degrees())
    }

    /// Same translation and rotation, unit scale.
    pub fn without_scale(self) -> Self {
        Self {
            scale: DVec3::ONE,
            ..self
        }
    }

    pub fn to_affine(&self) -> DAffine3 {
        DAffine3::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    pub fn from_affine(affine: &DAffine3) -> Self {
        let (scale, rotation, translation) = affine.to_scale_rotation_translation();
        Self {
            translation,
            rotation,
            scale,
        }
    }

    /// `self` applied after `local`, i.e. the world transform of a child whose
    /// parent sits at `self`.
    pub fn mul(&self, local: &WorldTransform) -> WorldTransform {
        Self::from_affine(&(self.to_affine() * local.to_affine()))
    }

    /// Local transform a child of `parent` needs to sit at `self` in world space.
    pub fn relative_to(&self, parent: &WorldTransform) -> WorldTransform {
        Self::from_affine(&(parent.to_affine().inverse() * self.to_affine()))
    }

    pub fn transform_point(&self, p: DVec3) -> DVec3 {
        self.to_affine().transform_point3(p)
    }

    /// Translation and rotation agree within `eps` (rotation compared up to
    /// quaternion sign).
    pub fn abs_diff_eq(&self, other: &WorldTransform, eps: f64) -> bool {
        self.translation.abs_diff_eq(other.translation, eps)
            && self.scale.abs_diff_eq(other.scale, eps)
            && (1.0 - self.rotation.dot(other.rotation).abs()) <= eps
    }
}

impl Default for WorldTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Scene introspection.
pub trait SceneRead {
    type Handle: Clone + PartialEq + fmt::Debug;

    /// Currently selected objects in selection order.
    fn selection(&self) -> Vec<Self::Handle>;

    fn lookup(&self, name: &str) -> Option<Self::Handle>;

    fn name_of(&self, node: &Self::Handle) -> Result<String, SceneError>;

    fn kind(&self, node: &Self::Handle) -> Result<NodeKind, SceneError>;

    /// First shape owned by a transform, if any.
    fn shape_child(&self, node: &Self::Handle) -> Result<Option<Self::Handle>, SceneError>;

    /// Contents of a shape node. Errors when `node` is not a shape.
    fn shape(&self, node: &Self::Handle) -> Result<ShapeView<'_>, SceneError>;

    fn parent(&self, node: &Self::Handle) -> Result<Option<Self::Handle>, SceneError>;

    fn world_transform(&self, node: &Self::Handle) -> Result<WorldTransform, SceneError>;
}

/// Scene mutation.
pub trait SceneEdit: SceneRead {
    /// Build a curve named `name` at the origin and return its transform.
    fn create_curve(&mut self, name: &str, curve: &CurveData) -> Result<Self::Handle, SceneError>;

    /// Build an empty transform at the origin.
    fn create_group(&mut self, name: &str) -> Result<Self::Handle, SceneError>;

    fn set_world_transform(
        &mut self,
        node: &Self::Handle,
        transform: &WorldTransform,
    ) -> Result<(), SceneError>;

    /// Zero the local translation and rotation, unit local scale.
    fn reset_local_transform(&mut self, node: &Self::Handle) -> Result<(), SceneError>;

    /// Rename `node`. Hosts may adjust the name to keep it unique; the name
    /// actually applied is returned.
    fn rename(&mut self, node: &Self::Handle, name: &str) -> Result<String, SceneError>;

    /// Reparent `node` keeping its local transform values. `None` moves it to
    /// the scene root.
    fn set_parent(
        &mut self,
        node: &Self::Handle,
        parent: Option<&Self::Handle>,
    ) -> Result<(), SceneError>;
}

/// Visibility/view control and frame capture used for thumbnails.
pub trait FrameCapture: SceneRead {
    /// Host visibility of one object, exact enough to put back unchanged.
    type Visibility: Clone + fmt::Debug;

    fn visibility(&self, node: &Self::Handle) -> Result<Self::Visibility, CaptureError>;

    fn set_visibility(
        &mut self,
        node: &Self::Handle,
        state: Self::Visibility,
    ) -> Result<(), CaptureError>;

    /// Hide everything that would show up in a capture. Returns each object
    /// that was changed together with its prior visibility.
    fn hide_all(&mut self) -> Result<Vec<(Self::Handle, Self::Visibility)>, CaptureError>;

    fn show(&mut self, nodes: &[Self::Handle]) -> Result<(), CaptureError>;

    fn hide(&mut self, nodes: &[Self::Handle]) -> Result<(), CaptureError>;

    /// Frame the view on `node`, remembering the previous view.
    fn fit_view(&mut self, node: &Self::Handle) -> Result<(), CaptureError>;

    /// Return to the view saved by the last [`FrameCapture::fit_view`].
    fn restore_view(&mut self) -> Result<(), CaptureError>;

    /// Render one square frame of `size` pixels to `path`.
    fn capture_frame(&mut self, path: &Path, size: u32) -> Result<(), CaptureError>;
}
