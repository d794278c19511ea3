//! control-library-core: curve-control library (host-agnostic)
//!
//! Snapshots curve-shaped control objects into a flat on-disk library (one JSON
//! record plus one thumbnail per entry) and rebuilds them on demand, optionally
//! matched to target objects' world transforms.
//!
//! The host application is only reached through the capability traits in
//! [`scene`]; [`MemoryScene`] is a headless implementation of all of them.

pub mod capture;
pub mod centering;
pub mod config;
pub mod curve;
pub mod deserializer;
pub mod error;
pub mod memory_scene;
pub mod record;
pub mod scene;
pub mod serializer;
pub mod store;
pub mod thumbnail;

// Re-exports for consumers (adapters)
pub use capture::{capture_thumbnail, IsolationScope};
pub use centering::{center_points, centroid};
pub use config::{InstantiateOptions, LibraryConfig};
pub use curve::CurveData;
pub use deserializer::{instantiate, instantiate_from_selection, Instantiated};
pub use error::{CaptureError, LibraryError, Result, SceneError};
pub use memory_scene::{MemoryScene, NodeData, NodeId};
pub use record::{decode_record, encode_record, LibraryEntry};
pub use scene::{CurveSource, FrameCapture, NodeKind, SceneEdit, SceneRead, ShapeView, WorldTransform};
pub use serializer::{save_curve, snapshot_curve, SaveOptions, SourceObject};
pub use store::{validate_name, EntrySummary, Library};
pub use thumbnail::{Polyline, View};
