//! Integration tests for hardlink detection.

use std::fs;

use linktree::is_any_hardlinked;
use tempfile::TempDir;

#[test]
fn empty_list_is_never_hardlinked() {
    let temp = TempDir::new().expect("create temp dir");
    let none: &[&str] = &[];
    assert!(!is_any_hardlinked(temp.path(), none));
}

#[test]
fn single_link_file_is_not_hardlinked() {
    let temp = TempDir::new().expect("create temp dir");
    fs::write(temp.path().join("solo.mkv"), b"data").expect("write file");

    assert!(!is_any_hardlinked(temp.path(), &["solo.mkv"]));
}

#[test]
fn either_name_of_a_hardlinked_pair_is_detected() {
    let temp = TempDir::new().expect("create temp dir");
    fs::create_dir(temp.path().join("downloads")).expect("create dir");
    fs::write(temp.path().join("downloads/a.mkv"), b"data").expect("write file");
    fs::hard_link(
        temp.path().join("downloads/a.mkv"),
        temp.path().join("b.mkv"),
    )
    .expect("create hard link");

    assert!(is_any_hardlinked(temp.path(), &["downloads/a.mkv"]));
    assert!(is_any_hardlinked(temp.path(), &["b.mkv"]));
    assert!(is_any_hardlinked(temp.path(), &["missing.mkv", "b.mkv"]));
}

#[test]
fn backslash_separated_paths_are_resolved() {
    let temp = TempDir::new().expect("create temp dir");
    fs::create_dir_all(temp.path().join("Show/S01")).expect("create dirs");
    fs::write(temp.path().join("Show/S01/e01.mkv"), b"data").expect("write file");
    fs::hard_link(
        temp.path().join("Show/S01/e01.mkv"),
        temp.path().join("e01.mkv"),
    )
    .expect("create hard link");

    assert!(is_any_hardlinked(temp.path(), &[String::from("Show\\S01\\e01.mkv")]));
}

#[test]
fn missing_paths_and_directories_are_skipped() {
    let temp = TempDir::new().expect("create temp dir");
    fs::create_dir(temp.path().join("dir")).expect("create dir");

    assert!(!is_any_hardlinked(temp.path(), &["dir", "absent", "."]));
}

#[cfg(unix)]
#[test]
fn symlinks_are_not_followed() {
    let temp = TempDir::new().expect("create temp dir");
    fs::write(temp.path().join("a"), b"data").expect("write file");
    fs::hard_link(temp.path().join("a"), temp.path().join("b")).expect("create hard link");
    std::os::unix::fs::symlink(temp.path().join("a"), temp.path().join("link"))
        .expect("create symlink");

    assert!(!is_any_hardlinked(temp.path(), &["link"]));
}

#[test]
fn absolute_paths_ignore_the_base() {
    let temp = TempDir::new().expect("create temp dir");
    let file = temp.path().join("a");
    fs::write(&file, b"data").expect("write file");
    fs::hard_link(&file, temp.path().join("b")).expect("create hard link");

    let absolute = file.to_string_lossy().into_owned();
    assert!(is_any_hardlinked(std::path::Path::new("/unrelated"), &[absolute]));
}
