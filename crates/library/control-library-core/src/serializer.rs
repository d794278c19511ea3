//! Curve serializer: scene object -> library entry.

use log::{info, warn};

use crate::capture::capture_thumbnail;
use crate::centering::center_points;
use crate::curve::CurveData;
use crate::error::{LibraryError, Result};
use crate::record::LibraryEntry;
use crate::scene::{FrameCapture, NodeKind, SceneRead, ShapeView};
use crate::store::{discard, validate_name, Library};

/// Which scene object to read.
#[derive(Clone, Debug, PartialEq)]
pub enum SourceObject<'a, H> {
    /// First object of the current selection.
    Selection,
    Named(&'a str),
    Handle(H),
}

impl<'a, H> SourceObject<'a, H> {
    /// Interpret a free-text field: blank means "use the selection".
    pub fn from_field(text: &'a str) -> Self {
        let text = text.trim();
        if text.is_empty() {
            SourceObject::Selection
        } else {
            SourceObject::Named(text)
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SaveOptions {
    /// Center points on their mean. `None` defers to
    /// [`crate::LibraryConfig::center_on_save`].
    pub center: Option<bool>,
}

impl SaveOptions {
    pub fn centered(center: bool) -> Self {
        Self {
            center: Some(center),
        }
    }
}

/// Resolve `source` to a curve shape and copy its parameters.
///
/// Returns the object to photograph (the shape's transform when it has one)
/// together with the curve data.
pub fn snapshot_curve<S: SceneRead>(
    scene: &S,
    source: &SourceObject<'_, S::Handle>,
) -> Result<(S::Handle, CurveData)> {
    let object = match source {
        SourceObject::Selection => scene
            .selection()
            .into_iter()
            .next()
            .ok_or(LibraryError::NoSelection)?,
        SourceObject::Named(name) => scene
            .lookup(name)
            .ok_or_else(|| LibraryError::ObjectNotFound(name.to_string()))?,
        SourceObject::Handle(h) => h.clone(),
    };

    let (subject, shape) = match scene.kind(&object)? {
        NodeKind::Transform => match scene.shape_child(&object)? {
            Some(shape) => (object, shape),
            None => {
                return Err(LibraryError::WrongType {
                    object: scene.name_of(&object)?,
                    found: "transform without a shape".to_string(),
                })
            }
        },
        NodeKind::Shape => {
            let subject = scene.parent(&object)?.unwrap_or_else(|| object.clone());
            (subject, object)
        }
    };

    match scene.shape(&shape)? {
        ShapeView::Curve(curve) => Ok((subject, CurveData::snapshot(curve))),
        ShapeView::Other(kind) => Err(LibraryError::WrongType {
            object: scene.name_of(&shape)?,
            found: kind,
        }),
    }
}

/// Snapshot a curve from the scene and store it under `name` with a thumbnail.
///
/// Record and thumbnail are staged under hidden names and only moved into
/// place once both exist, so a failed capture leaves any previous entry of
/// the same name untouched.
pub fn save_curve<S: FrameCapture>(
    library: &Library,
    scene: &mut S,
    name: &str,
    source: SourceObject<'_, S::Handle>,
    options: SaveOptions,
) -> Result<LibraryEntry> {
    validate_name(name)?;
    let (subject, mut curve) = snapshot_curve(scene, &source)?;

    if options.center.unwrap_or(library.config().center_on_save) {
        curve.points = center_points(&curve.points);
    }

    let entry = LibraryEntry::new(name, curve);
    let staged_record = library.stage_record(&entry)?;
    let staged_thumbnail = library.staged_thumbnail_path(name);

    let size = library.config().thumbnail_size;
    if let Err(e) = capture_thumbnail(scene, &subject, &staged_thumbnail, size) {
        warn!("thumbnail capture for '{name}' failed, discarding staged entry: {e}");
        discard(&staged_record);
        discard(&staged_thumbnail);
        return Err(e.into());
    }

    library.commit(name, &staged_record, &staged_thumbnail)?;
    info!(
        "saved '{}' ({} points, degree {})",
        name,
        entry.curve().points.len(),
        entry.curve().degree
    );
    Ok(entry)
}
