//! Bevy front end for the control curve library.
//!
//! Add [`ControlLibraryPlugin`], mark entities with [`Selected`], and send
//! [`LibraryRequest`]s; results come back as [`LibraryEvent`]s. For direct
//! use, [`WorldScene`] implements the core capability traits over a `World`.

pub mod components;
pub mod resources;
pub mod scene;
pub mod systems;

use bevy::log::{error, info};
use bevy::prelude::*;
use control_library::{Library, LibraryConfig};

pub use components::{ControlCurve, ControlGroup, OtherShape, Selected};
pub use resources::{ControlLibrary, InstantiateSettings, LibraryEvent, LibraryRequest};
pub use scene::{from_bevy_transform, to_bevy_transform, WorldScene};

#[derive(Default)]
pub struct ControlLibraryPlugin {
    pub config: LibraryConfig,
}

impl ControlLibraryPlugin {
    pub fn new(config: LibraryConfig) -> Self {
        Self { config }
    }
}

impl Plugin for ControlLibraryPlugin {
    fn build(&self, app: &mut App) {
        match Library::open(self.config.clone()) {
            Ok(library) => {
                info!("control library at {}", library.root().display());
                app.insert_resource(ControlLibrary(library));
            }
            // Without the resource, `process_library_requests` drops requests.
            Err(e) => error!("control library unavailable: {e}"),
        }
        app.init_resource::<InstantiateSettings>()
            .add_event::<LibraryRequest>()
            .add_event::<LibraryEvent>()
            .add_systems(Update, systems::process_library_requests);
    }
}
