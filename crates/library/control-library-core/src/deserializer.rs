//! Curve deserializer: library entry -> scene objects.

use log::{debug, info};

use crate::config::InstantiateOptions;
use crate::error::{LibraryError, Result};
use crate::record::LibraryEntry;
use crate::scene::SceneEdit;

/// One curve built by [`instantiate`].
#[derive(Clone, Debug, PartialEq)]
pub struct Instantiated<H> {
    /// Transform of the new curve.
    pub curve: H,
    /// Offset group wrapping the curve, when requested.
    pub group: Option<H>,
    /// Name the host actually gave the curve.
    pub name: String,
}

/// Build `entry` in the scene.
///
/// Without targets a single curve is created at the origin and named after the
/// entry. Otherwise one curve is created per target and placed at the target's
/// world translation and rotation, so the result does not depend on the
/// target's parent chain. With [`InstantiateOptions::offset_group`] the world
/// placement goes on an empty group instead and the curve sits under it with a
/// cleared local transform.
pub fn instantiate<S: SceneEdit>(
    scene: &mut S,
    entry: &LibraryEntry,
    targets: &[S::Handle],
    options: &InstantiateOptions,
) -> Result<Vec<Instantiated<S::Handle>>> {
    entry
        .curve()
        .validate()
        .map_err(LibraryError::InvalidCurve)?;

    if targets.is_empty() {
        let curve = scene.create_curve(entry.name(), entry.curve())?;
        let name = scene.name_of(&curve)?;
        info!("created '{}' from library entry '{}'", name, entry.name());
        return Ok(vec![Instantiated {
            curve,
            group: None,
            name,
        }]);
    }

    let mut created = Vec::with_capacity(targets.len());
    for target in targets {
        let target_name = scene.name_of(target)?;
        let placement = scene.world_transform(target)?.without_scale();
        let curve_name = format!("{}{}", target_name, options.curve_suffix);

        let curve = scene.create_curve(entry.name(), entry.curve())?;
        let group = if options.offset_group {
            let group_name = format!("{}{}", curve_name, options.group_suffix);
            let group = scene.create_group(&group_name)?;
            scene.set_world_transform(&group, &placement)?;
            scene.set_parent(&curve, Some(&group))?;
            scene.reset_local_transform(&curve)?;
            Some(group)
        } else {
            scene.set_world_transform(&curve, &placement)?;
            None
        };
        let name = scene.rename(&curve, &curve_name)?;
        debug!(
            "matched '{}' to '{}' at {:?}",
            name, target_name, placement.translation
        );
        created.push(Instantiated { curve, group, name });
    }
    info!(
        "created {} curve(s) from library entry '{}'",
        created.len(),
        entry.name()
    );
    Ok(created)
}

/// [`instantiate`] against the scene's current selection.
pub fn instantiate_from_selection<S: SceneEdit>(
    scene: &mut S,
    entry: &LibraryEntry,
    options: &InstantiateOptions,
) -> Result<Vec<Instantiated<S::Handle>>> {
    let targets = scene.selection();
    instantiate(scene, entry, &targets, options)
}
