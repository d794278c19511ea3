//! Library and instantiation configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Folder name used under the user's data directory.
pub const DEFAULT_LIBRARY_DIR: &str = "ccLibrary";

/// Configuration for a [`crate::Library`]. Passed explicitly at construction;
/// nothing here is process-wide.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    /// Flat directory holding `<name>.<record_extension>` and
    /// `<name>.<thumbnail_extension>` pairs.
    pub root: PathBuf,
    pub record_extension: String,
    pub thumbnail_extension: String,

    /// Edge length in pixels of the square thumbnail.
    pub thumbnail_size: u32,

    /// Center control points on the origin when a save does not say otherwise.
    pub center_on_save: bool,
}

impl LibraryConfig {
    /// Default settings rooted at `root` instead of the user data directory.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Default for LibraryConfig {
    fn default() -> Self {
        let base = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
        Self {
            root: base.join(DEFAULT_LIBRARY_DIR),
            record_extension: "json".to_string(),
            thumbnail_extension: "png".to_string(),
            thumbnail_size: 200,
            center_on_save: false,
        }
    }
}

/// How [`crate::instantiate`] names and nests the curves it builds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstantiateOptions {
    /// Wrap each matched curve in an empty transform placed at the target.
    pub offset_group: bool,
    /// Appended to the target's name to name the new curve.
    pub curve_suffix: String,
    /// Appended to the curve's name to name its offset group.
    pub group_suffix: String,
}

impl InstantiateOptions {
    pub fn with_offset_group(mut self, enabled: bool) -> Self {
        self.offset_group = enabled;
        self
    }
}

impl Default for InstantiateOptions {
    fn default() -> Self {
        Self {
            offset_group: false,
            curve_suffix: "_ctl".to_string(),
            group_suffix: "_grp".to_string(),
        }
    }
}
