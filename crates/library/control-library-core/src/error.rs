use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T, E = LibraryError> = std::result::Result<T, E>;

/// Failures reported by scene adapters (introspection and mutation).
#[derive(Debug, Error)]
pub enum SceneError {
    #[error("scene object {0} no longer exists")]
    StaleHandle(String),
    #[error("cannot build curve: {0}")]
    CurveConstruction(String),
    #[error("host error: {0}")]
    Host(String),
}

/// Failures reported by the thumbnail capture collaborator.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("image capture is not available: {0}")]
    Unavailable(String),
    #[error("capture of {path} failed: {reason}")]
    Failed { path: PathBuf, reason: String },
    #[error(transparent)]
    Scene(#[from] SceneError),
}

/// Errors surfaced by library, serializer and deserializer operations.
#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("nothing is selected and no source object was given")]
    NoSelection,
    #[error("no scene object named '{0}'")]
    ObjectNotFound(String),
    #[error("'{object}' is not a curve (found {found})")]
    WrongType { object: String, found: String },
    #[error("no library entry named '{0}'")]
    NotFound(String),
    #[error("malformed record {path}: {reason}")]
    MalformedRecord { path: PathBuf, reason: String },
    #[error("invalid entry name '{name}': {reason}")]
    InvalidName { name: String, reason: &'static str },
    #[error("invalid curve: {0}")]
    InvalidCurve(String),
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Scene(#[from] SceneError),
    #[error("thumbnail capture failed: {0}")]
    Capture(#[from] CaptureError),
    #[error("entry '{name}' partially deleted; {remaining} could not be removed: {source}")]
    PartialDelete {
        name: String,
        remaining: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("entry '{name}' is incomplete; {missing} was not written: {source}")]
    IncompleteEntry {
        name: String,
        missing: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl LibraryError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        LibraryError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn malformed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        LibraryError::MalformedRecord {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
