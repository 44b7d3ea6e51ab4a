//! Integration tests for hardlink tree materialization and rollback.

use std::fs;
use std::path::{Path, PathBuf};

use linktree::{LinkMode, LinkTreeError, TreePlan, hardlink, materialize};
use tempfile::TempDir;

fn write_sources(dir: &Path, names: &[&str]) -> Vec<PathBuf> {
    let sources = dir.join("sources");
    fs::create_dir_all(&sources).expect("create sources dir");
    names
        .iter()
        .map(|name| {
            let path = sources.join(name);
            fs::write(&path, format!("payload of {name}")).expect("write source");
            path
        })
        .collect()
}

#[cfg(unix)]
fn same_inode(a: &Path, b: &Path) -> bool {
    use std::os::unix::fs::MetadataExt;
    let a = fs::metadata(a).expect("stat a");
    let b = fs::metadata(b).expect("stat b");
    a.dev() == b.dev() && a.ino() == b.ino()
}

#[test]
fn creates_nested_tree_of_links() {
    let temp = TempDir::new().expect("create temp dir");
    let sources = write_sources(temp.path(), &["e01.mkv", "e02.mkv", "poster.jpg"]);
    let root = temp.path().join("library");
    let plan = TreePlan::new(&root)
        .with_file(&sources[0], "Show/Season 01/e01.mkv")
        .with_file(&sources[1], "Show/Season 01/e02.mkv")
        .with_file(&sources[2], "Show/poster.jpg");

    hardlink::create(&plan).expect("create tree");

    for file in &plan.files {
        assert_eq!(
            fs::read(&file.target_path).expect("read target"),
            fs::read(&file.source_path).expect("read source")
        );
        #[cfg(unix)]
        assert!(same_inode(&file.source_path, &file.target_path));
    }
}

#[test]
fn creating_the_same_plan_twice_is_idempotent() {
    let temp = TempDir::new().expect("create temp dir");
    let sources = write_sources(temp.path(), &["a", "b"]);
    let plan = TreePlan::new(temp.path().join("tree"))
        .with_file(&sources[0], "x/a")
        .with_file(&sources[1], "b");

    hardlink::create(&plan).expect("first create");
    hardlink::create(&plan).expect("second create");

    assert!(plan.files.iter().all(|file| file.target_path.is_file()));
}

#[test]
fn conflicting_target_rolls_back_everything_created() {
    let temp = TempDir::new().expect("create temp dir");
    let sources = write_sources(temp.path(), &["one", "two", "three"]);
    let root = temp.path().join("tree");
    fs::create_dir_all(root.join("taken")).expect("create conflict dir");
    fs::write(root.join("taken/three"), b"someone else").expect("write conflicting file");

    let plan = TreePlan::new(&root)
        .with_file(&sources[0], "fresh/one")
        .with_file(&sources[1], "fresh/deeper/two")
        .with_file(&sources[2], "taken/three");

    let err = hardlink::create(&plan).unwrap_err();
    assert!(
        matches!(err, LinkTreeError::TargetExists { .. }),
        "unexpected error: {err}"
    );

    assert!(!root.join("fresh").exists(), "created directories are removed");
    assert_eq!(
        fs::read(root.join("taken/three")).expect("read conflicting file"),
        b"someone else"
    );
    assert!(sources.iter().all(|source| source.exists()));
}

#[test]
fn missing_source_fails_and_leaves_no_root_behind() {
    let temp = TempDir::new().expect("create temp dir");
    let sources = write_sources(temp.path(), &["present"]);
    let root = temp.path().join("tree");
    let plan = TreePlan::new(&root)
        .with_file(&sources[0], "present")
        .with_file(temp.path().join("sources/absent"), "absent");

    let err = hardlink::create(&plan).unwrap_err();
    assert!(matches!(err, LinkTreeError::Link { .. }), "unexpected error: {err}");
    assert!(!root.exists());
    assert!(sources[0].exists());
}

#[test]
fn invalid_plans_are_rejected_before_touching_disk() {
    let temp = TempDir::new().expect("create temp dir");
    let root = temp.path().join("tree");

    let err = hardlink::create(&TreePlan::new(&root)).unwrap_err();
    assert!(matches!(err, LinkTreeError::NoFiles));
    assert!(err.is_invalid_plan());

    let err = hardlink::create(&TreePlan::new("").with_file("/src", "/dst")).unwrap_err();
    assert!(matches!(err, LinkTreeError::EmptyRoot));

    let escaping = TreePlan::new(&root).with_file("/src", "../escape");
    let err = hardlink::create(&escaping).unwrap_err();
    assert!(matches!(err, LinkTreeError::OutsideRoot { .. }));

    assert!(!root.exists());
}

#[test]
fn rollback_after_create_removes_links_and_plan_directories() {
    let temp = TempDir::new().expect("create temp dir");
    let sources = write_sources(temp.path(), &["a", "b"]);
    let root = temp.path().join("tree");
    let plan = TreePlan::new(&root)
        .with_file(&sources[0], "d1/d2/a")
        .with_file(&sources[1], "d1/b");

    hardlink::create(&plan).expect("create tree");
    hardlink::rollback(&plan).expect("rollback tree");

    assert!(!root.join("d1").exists());
    assert!(root.is_dir(), "the root itself is kept");
    assert!(sources.iter().all(|source| source.exists()));
}

#[test]
fn rollback_of_a_plan_never_created_is_ok() {
    let temp = TempDir::new().expect("create temp dir");
    let plan = TreePlan::new(temp.path().join("tree")).with_file("/nowhere/a", "x/a");

    hardlink::rollback(&plan).expect("rollback of absent tree");
    hardlink::rollback(&plan).expect("rollback is repeatable");
}

#[test]
fn materialize_with_hardlink_mode_matches_hardlink_create() {
    let temp = TempDir::new().expect("create temp dir");
    let sources = write_sources(temp.path(), &["a"]);
    let plan = TreePlan::new(temp.path().join("tree")).with_file(&sources[0], "a");

    materialize(&plan, LinkMode::Hardlink).expect("materialize tree");
    hardlink::create(&plan).expect("create over materialized tree");
}
