use bevy::log::{debug, error, warn};
use bevy::prelude::*;
use control_library::{
    instantiate_from_selection, save_curve, InstantiateOptions, Library, SaveOptions, SourceObject,
};

use crate::resources::{ControlLibrary, InstantiateSettings, LibraryEvent, LibraryRequest};
use crate::scene::WorldScene;

/// Drains pending [`LibraryRequest`]s, runs them against the world, and
/// answers each with one [`LibraryEvent`].
pub fn process_library_requests(world: &mut World) {
    let requests: Vec<LibraryRequest> = match world.get_resource_mut::<Events<LibraryRequest>>() {
        Some(mut events) => events.drain().collect(),
        None => return,
    };
    if requests.is_empty() {
        return;
    }
    let Some(library) = world.get_resource::<ControlLibrary>().map(|l| l.0.clone()) else {
        warn!(
            "control library not open; dropping {} request(s)",
            requests.len()
        );
        return;
    };
    let options = world
        .get_resource::<InstantiateSettings>()
        .map(|s| s.0.clone())
        .unwrap_or_default();

    let mut answers = Vec::with_capacity(requests.len());
    for request in requests {
        debug!("control library request: {request:?}");
        let answer = match handle_request(world, &library, &options, &request) {
            Ok(event) => event,
            Err(e) => {
                error!("control library request {request:?} failed: {e}");
                LibraryEvent::Failed {
                    request,
                    message: e.to_string(),
                }
            }
        };
        answers.push(answer);
    }

    if let Some(mut events) = world.get_resource_mut::<Events<LibraryEvent>>() {
        for answer in answers {
            events.send(answer);
        }
    }
}

fn handle_request(
    world: &mut World,
    library: &Library,
    options: &InstantiateOptions,
    request: &LibraryRequest,
) -> control_library::Result<LibraryEvent> {
    Ok(match request {
        LibraryRequest::Save {
            name,
            source,
            center,
        } => {
            let source = match source {
                Some(field) => SourceObject::from_field(field),
                None => SourceObject::Selection,
            };
            let mut scene = WorldScene::new(world);
            save_curve(library, &mut scene, name, source, SaveOptions { center: *center })?;
            LibraryEvent::Saved { name: name.clone() }
        }
        LibraryRequest::Spawn { name } => {
            let entry = library.load(name)?;
            let mut scene = WorldScene::new(world);
            let made = instantiate_from_selection(&mut scene, &entry, options)?;
            LibraryEvent::Spawned {
                name: name.clone(),
                curves: made.into_iter().map(|m| m.curve).collect(),
            }
        }
        LibraryRequest::Delete { name } => {
            library.delete(name)?;
            LibraryEvent::Deleted { name: name.clone() }
        }
        LibraryRequest::Refresh => LibraryEvent::Listed(library.list()?),
    })
}
