//! Library store: a flat directory of `<name>.<record_ext>` records, each
//! paired by file stem with a `<name>.<thumbnail_ext>` image.
//!
//! There is no index file. Membership is whatever the directory listing shows,
//! filtered by the record extension. Files whose names start with `.` are
//! in-flight temporaries and never listed.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::config::LibraryConfig;
use crate::error::{LibraryError, Result};
use crate::record::{decode_record, encode_record, LibraryEntry};

/// Listing row: an entry name and where its files live.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntrySummary {
    pub name: String,
    pub record_path: PathBuf,
    /// `None` when the thumbnail file is missing.
    pub thumbnail_path: Option<PathBuf>,
}

/// Check that `name` can be used verbatim as a file stem.
pub fn validate_name(name: &str) -> Result<()> {
    let reason = if name.is_empty() {
        Some("name is empty")
    } else if name == "." || name == ".." {
        Some("name is a relative path component")
    } else if name.starts_with('.') {
        Some("names starting with '.' are reserved")
    } else if name.contains(['/', '\\']) {
        Some("name contains a path separator")
    } else if name.chars().any(char::is_control) {
        Some("name contains a control character")
    } else if name.contains([':', '*', '?', '"', '<', '>', '|']) {
        Some("name contains a character reserved by the filesystem")
    } else {
        None
    };
    match reason {
        Some(reason) => Err(LibraryError::InvalidName {
            name: name.to_string(),
            reason,
        }),
        None => Ok(()),
    }
}

#[derive(Clone, Debug)]
pub struct Library {
    config: LibraryConfig,
}

impl Library {
    /// Open the library described by `config`, creating its directory if needed.
    pub fn open(config: LibraryConfig) -> Result<Self> {
        fs::create_dir_all(&config.root).map_err(|e| LibraryError::io(&config.root, e))?;
        debug!("library opened at {}", config.root.display());
        Ok(Self { config })
    }

    pub fn config(&self) -> &LibraryConfig {
        &self.config
    }

    pub fn root(&self) -> &Path {
        &self.config.root
    }

    pub fn record_path(&self, name: &str) -> PathBuf {
        self.config
            .root
            .join(format!("{}.{}", name, self.config.record_extension))
    }

    pub fn thumbnail_path(&self, name: &str) -> PathBuf {
        self.config
            .root
            .join(format!("{}.{}", name, self.config.thumbnail_extension))
    }

    pub(crate) fn staged_record_path(&self, name: &str) -> PathBuf {
        self.config
            .root
            .join(format!(".{}.{}.tmp", name, self.config.record_extension))
    }

    pub(crate) fn staged_thumbnail_path(&self, name: &str) -> PathBuf {
        // Keeps the image extension last; capture backends pick the format from it.
        self.config
            .root
            .join(format!(".{}.tmp.{}", name, self.config.thumbnail_extension))
    }

    /// Whether a record exists for `name`. Invalid names never exist.
    pub fn exists(&self, name: &str) -> bool {
        validate_name(name).is_ok() && self.record_path(name).is_file()
    }

    /// All entries, sorted by name.
    pub fn list(&self) -> Result<Vec<EntrySummary>> {
        let root = self.root();
        let dir = fs::read_dir(root).map_err(|e| LibraryError::io(root, e))?;

        let mut out = Vec::new();
        for item in dir {
            let item = item.map_err(|e| LibraryError::io(root, e))?;
            let path = item.path();
            if !path.is_file() {
                continue;
            }
            let ext_matches = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e == self.config.record_extension);
            if !ext_matches {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if validate_name(name).is_err() {
                continue;
            }
            let thumbnail = self.thumbnail_path(name);
            out.push(EntrySummary {
                name: name.to_string(),
                record_path: path.clone(),
                thumbnail_path: thumbnail.is_file().then_some(thumbnail),
            });
        }
        out.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(out)
    }

    /// Read and validate the record stored under `name`.
    pub fn load(&self, name: &str) -> Result<LibraryEntry> {
        validate_name(name)?;
        let path = self.record_path(name);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(LibraryError::NotFound(name.to_string()))
            }
            Err(e) => return Err(LibraryError::io(path, e)),
        };
        let entry = decode_record(&text).map_err(|reason| LibraryError::malformed(&path, reason))?;
        if entry.name() != name {
            return Err(LibraryError::malformed(
                &path,
                format!("record is named '{}' but stored as '{}'", entry.name(), name),
            ));
        }
        Ok(entry)
    }

    /// Write the record for `entry`, replacing any previous one. The thumbnail
    /// is left untouched. Returns the record path.
    pub fn write(&self, entry: &LibraryEntry) -> Result<PathBuf> {
        let staged = self.stage_record(entry)?;
        let path = self.record_path(entry.name());
        if let Err(e) = fs::rename(&staged, &path) {
            discard(&staged);
            return Err(LibraryError::io(path, e));
        }
        info!("wrote record {}", path.display());
        Ok(path)
    }

    /// Remove the record and thumbnail for `name`.
    ///
    /// The record goes first; if the thumbnail then cannot be removed the
    /// entry is gone from listings but the failure is reported as
    /// [`LibraryError::PartialDelete`].
    pub fn delete(&self, name: &str) -> Result<()> {
        validate_name(name)?;
        let record = self.record_path(name);
        let thumbnail = self.thumbnail_path(name);
        let has_record = record.is_file();
        let has_thumbnail = thumbnail.is_file();
        if !has_record && !has_thumbnail {
            return Err(LibraryError::NotFound(name.to_string()));
        }

        if has_record {
            fs::remove_file(&record).map_err(|e| LibraryError::io(&record, e))?;
        }
        if has_thumbnail {
            if let Err(source) = fs::remove_file(&thumbnail) {
                return Err(LibraryError::PartialDelete {
                    name: name.to_string(),
                    remaining: thumbnail,
                    source,
                });
            }
        }
        info!("deleted library entry '{name}'");
        Ok(())
    }

    /// Validate and write `entry` to its hidden staging path.
    pub(crate) fn stage_record(&self, entry: &LibraryEntry) -> Result<PathBuf> {
        validate_name(entry.name())?;
        entry.curve().validate().map_err(LibraryError::InvalidCurve)?;
        let text = encode_record(entry).map_err(LibraryError::InvalidCurve)?;
        let staged = self.staged_record_path(entry.name());
        fs::write(&staged, text).map_err(|e| LibraryError::io(&staged, e))?;
        debug!("staged record {}", staged.display());
        Ok(staged)
    }

    /// Move a staged record and thumbnail into place, record first.
    pub(crate) fn commit(&self, name: &str, staged_record: &Path, staged_thumbnail: &Path) -> Result<()> {
        let record = self.record_path(name);
        if let Err(e) = fs::rename(staged_record, &record) {
            discard(staged_record);
            discard(staged_thumbnail);
            return Err(LibraryError::io(record, e));
        }
        let thumbnail = self.thumbnail_path(name);
        if let Err(source) = fs::rename(staged_thumbnail, &thumbnail) {
            discard(staged_thumbnail);
            return Err(LibraryError::IncompleteEntry {
                name: name.to_string(),
                missing: thumbnail,
                source,
            });
        }
        Ok(())
    }
}

/// Best-effort removal of a temporary file.
pub(crate) fn discard(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => debug!("discarded {}", path.display()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!("could not remove temporary {}: {e}", path.display()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unsafe_names() {
        for bad in ["", ".", "..", ".hidden", "a/b", "a\\b", "tab\there", "what?"] {
            assert!(
                matches!(validate_name(bad), Err(LibraryError::InvalidName { .. })),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn accepts_ordinary_names() {
        for good in ["circle", "arrow_4way", "Ctrl-Main 01", "ü-kreis"] {
            assert!(validate_name(good).is_ok(), "{good:?} should be accepted");
        }
    }
}
