//! Shared curve records for tests, resolved through `fixtures/manifest.json`.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use once_cell::sync::Lazy;
use serde::Deserialize;

static MANIFEST: Lazy<Manifest> = Lazy::new(|| {
    let raw = include_str!("../../../../fixtures/manifest.json");
    serde_json::from_str(raw).expect("fixtures manifest should parse")
});

#[derive(Debug, Deserialize)]
struct Manifest {
    curves: HashMap<String, String>,
    malformed: HashMap<String, String>,
}

fn fixtures_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../../fixtures")
}

fn resolve_path(rel: &str) -> PathBuf {
    fixtures_root().join(rel)
}

fn read_to_string(rel: &str) -> Result<String> {
    let path = resolve_path(rel);
    fs::read_to_string(&path)
        .with_context(|| format!("failed to read fixture at {}", path.display()))
}

fn lookup<'a>(map: &'a HashMap<String, String>, kind: &str, name: &str) -> Result<&'a str> {
    map.get(name)
        .map(String::as_str)
        .ok_or_else(|| anyhow!("unknown {kind} fixture '{name}'"))
}

/// Copy `rel` into `dir`, keeping its file name. Returns the new path.
fn copy_into(rel: &str, dir: &Path) -> Result<PathBuf> {
    let src = resolve_path(rel);
    let file_name = src
        .file_name()
        .ok_or_else(|| anyhow!("fixture path {rel} has no file name"))?;
    let dst = dir.join(file_name);
    fs::copy(&src, &dst)
        .with_context(|| format!("failed to copy {} to {}", src.display(), dst.display()))?;
    Ok(dst)
}

/// Well-formed library records. Each file stem matches the record's name.
pub mod curves {
    use super::*;

    pub fn keys() -> Vec<String> {
        let mut keys: Vec<String> = MANIFEST.curves.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn json(name: &str) -> Result<String> {
        let rel = lookup(&MANIFEST.curves, "curve", name)?;
        read_to_string(rel)
    }

    /// Drop the record for `name` into a library directory.
    pub fn install(name: &str, library_dir: &Path) -> Result<PathBuf> {
        let rel = lookup(&MANIFEST.curves, "curve", name)?;
        copy_into(rel, library_dir)
    }
}

/// Records that must be rejected on load.
pub mod malformed {
    use super::*;

    pub fn keys() -> Vec<String> {
        let mut keys: Vec<String> = MANIFEST.malformed.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn install(name: &str, library_dir: &Path) -> Result<PathBuf> {
        let rel = lookup(&MANIFEST.malformed, "malformed", name)?;
        copy_into(rel, library_dir)
    }
}
