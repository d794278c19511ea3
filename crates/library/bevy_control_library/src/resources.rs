use bevy::prelude::*;
use control_library::{EntrySummary, InstantiateOptions, Library};

/// The open library requests are served from.
#[derive(Resource, Clone)]
pub struct ControlLibrary(pub Library);

/// Naming and nesting used by [`LibraryRequest::Spawn`].
#[derive(Resource, Clone, Default)]
pub struct InstantiateSettings(pub InstantiateOptions);

/// Front-end actions against the library. Handled once per frame in `Update`.
#[derive(Event, Clone, Debug, PartialEq)]
pub enum LibraryRequest {
    /// Store a curve. `source` is a scene object name; `None` or blank uses
    /// the selection. `center` overrides the configured default.
    Save {
        name: String,
        source: Option<String>,
        center: Option<bool>,
    },
    /// Build the named entry, once per selected entity or once at the origin.
    Spawn { name: String },
    Delete { name: String },
    Refresh,
}

#[derive(Event, Clone, Debug)]
pub enum LibraryEvent {
    Saved { name: String },
    Spawned { name: String, curves: Vec<Entity> },
    Deleted { name: String },
    Listed(Vec<EntrySummary>),
    Failed { request: LibraryRequest, message: String },
}
