use std::fs;

use control_library::{CurveData, Library, LibraryConfig, LibraryEntry, LibraryError};
use glam::DVec3;
use tempfile::TempDir;

fn open_temp() -> (TempDir, Library) {
    let dir = tempfile::tempdir().expect("tempdir");
    let lib = Library::open(LibraryConfig::with_root(dir.path())).expect("open library");
    (dir, lib)
}

fn triangle(scale: f64) -> CurveData {
    CurveData::new(
        1,
        false,
        vec![
            DVec3::new(0.0, 0.0, 0.0),
            DVec3::new(scale, 0.0, 0.0),
            DVec3::new(0.0, scale, 0.0),
            DVec3::new(0.0, 0.0, 0.0),
        ],
        vec![0.0, 1.0, 2.0, 3.0],
    )
}

#[test]
fn open_creates_missing_directory() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("nested").join("ccLibrary");
    let lib = Library::open(LibraryConfig::with_root(&root)).unwrap();
    assert!(root.is_dir());
    assert!(lib.list().unwrap().is_empty());
}

#[test]
fn written_entry_loads_field_for_field() {
    let (_dir, lib) = open_temp();
    let entry = LibraryEntry::new("tri", triangle(2.5));
    let path = lib.write(&entry).unwrap();
    assert_eq!(path, lib.record_path("tri"));
    assert!(lib.exists("tri"));

    let loaded = lib.load("tri").unwrap();
    assert_eq!(loaded, entry);
}

#[test]
fn second_write_replaces_first() {
    let (_dir, lib) = open_temp();
    lib.write(&LibraryEntry::new("tri", triangle(1.0))).unwrap();
    lib.write(&LibraryEntry::new("tri", triangle(4.0))).unwrap();

    let listed = lib.list().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].name, "tri");
    assert_eq!(lib.load("tri").unwrap().curve(), &triangle(4.0));
}

#[test]
fn delete_removes_record_and_thumbnail() {
    let (_dir, lib) = open_temp();
    lib.write(&LibraryEntry::new("tri", triangle(1.0))).unwrap();
    fs::write(lib.thumbnail_path("tri"), b"png").unwrap();

    lib.delete("tri").unwrap();

    assert!(!lib.exists("tri"));
    assert!(!lib.record_path("tri").exists());
    assert!(!lib.thumbnail_path("tri").exists());
    assert_eq!(fs::read_dir(lib.root()).unwrap().count(), 0);
}

#[test]
fn delete_removes_orphaned_thumbnail() {
    let (_dir, lib) = open_temp();
    fs::write(lib.thumbnail_path("ghost"), b"png").unwrap();
    lib.delete("ghost").unwrap();
    assert!(!lib.thumbnail_path("ghost").exists());
}

#[test]
fn unknown_names_report_not_found() {
    let (_dir, lib) = open_temp();
    assert!(matches!(lib.load("nonexistent"), Err(LibraryError::NotFound(n)) if n == "nonexistent"));
    assert!(matches!(lib.delete("nonexistent"), Err(LibraryError::NotFound(_))));
    assert!(!lib.exists("nonexistent"));
}

#[test]
fn invalid_names_are_rejected_before_touching_disk() {
    let (_dir, lib) = open_temp();
    let err = lib
        .write(&LibraryEntry::new("../escape", triangle(1.0)))
        .unwrap_err();
    assert!(matches!(err, LibraryError::InvalidName { .. }));
    assert!(matches!(lib.load(""), Err(LibraryError::InvalidName { .. })));
    assert!(!lib.exists("../escape"));
}

#[test]
fn invalid_curves_are_not_written() {
    let (_dir, lib) = open_temp();
    let mut bad = triangle(1.0);
    bad.knots.push(9.0);
    let err = lib.write(&LibraryEntry::new("bad", bad)).unwrap_err();
    assert!(matches!(err, LibraryError::InvalidCurve(_)));
    assert_eq!(fs::read_dir(lib.root()).unwrap().count(), 0);
}

#[test]
fn list_pairs_thumbnails_and_skips_foreign_files() {
    let (_dir, lib) = open_temp();
    lib.write(&LibraryEntry::new("b_tri", triangle(1.0))).unwrap();
    lib.write(&LibraryEntry::new("a_tri", triangle(1.0))).unwrap();
    fs::write(lib.thumbnail_path("a_tri"), b"png").unwrap();
    fs::write(lib.root().join("notes.txt"), b"x").unwrap();
    fs::write(lib.root().join(".a_tri.json.tmp"), b"[]").unwrap();
    fs::write(lib.root().join(".hidden.json"), b"[]").unwrap();
    fs::create_dir(lib.root().join("dir.json")).unwrap();

    let listed = lib.list().unwrap();
    let names: Vec<&str> = listed.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, ["a_tri", "b_tri"]);
    assert_eq!(listed[0].thumbnail_path.as_deref(), Some(lib.thumbnail_path("a_tri").as_path()));
    assert_eq!(listed[1].thumbnail_path, None);
    assert_eq!(listed[1].record_path, lib.record_path("b_tri"));
}

#[test]
fn custom_extensions_are_honoured() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = LibraryConfig {
        record_extension: "ctl".into(),
        thumbnail_extension: "jpg".into(),
        ..LibraryConfig::with_root(dir.path())
    };
    let lib = Library::open(cfg).unwrap();
    lib.write(&LibraryEntry::new("tri", triangle(1.0))).unwrap();
    assert!(dir.path().join("tri.ctl").is_file());
    assert_eq!(lib.thumbnail_path("tri"), dir.path().join("tri.jpg"));
    assert_eq!(lib.list().unwrap().len(), 1);
}

#[test]
fn shared_fixtures_load_through_library() {
    let (dir, lib) = open_temp();
    for key in control_test_fixtures::curves::keys() {
        control_test_fixtures::curves::install(&key, dir.path()).unwrap();
    }
    let listed = lib.list().unwrap();
    assert_eq!(listed.len(), control_test_fixtures::curves::keys().len());

    let circle = lib.load("circle").unwrap();
    assert!(circle.curve().periodic);
    assert_eq!(circle.curve().degree, 3);
    assert_eq!(circle.curve().points.len(), 11);
    assert_eq!(circle.curve().knots.len(), 13);

    let square = lib.load("square").unwrap();
    assert!(!square.curve().periodic);
    assert_eq!(square.curve().points.first(), square.curve().points.last());
}

#[test]
fn malformed_fixtures_report_malformed_record() {
    let (dir, lib) = open_temp();
    for key in control_test_fixtures::malformed::keys() {
        control_test_fixtures::malformed::install(&key, dir.path()).unwrap();
        match lib.load(&key) {
            Err(LibraryError::MalformedRecord { path, .. }) => {
                assert_eq!(path, lib.record_path(&key));
            }
            other => panic!("{key}: expected MalformedRecord, got {other:?}"),
        }
    }
}

#[test]
fn record_renamed_on_disk_is_malformed() {
    let (dir, lib) = open_temp();
    let src = control_test_fixtures::curves::install("square", dir.path()).unwrap();
    fs::rename(src, lib.record_path("box")).unwrap();
    let err = lib.load("box").unwrap_err();
    assert!(err.to_string().contains("named 'square'"), "{err}");
}
