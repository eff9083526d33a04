use super::*;
use std::fs;
use std::path::{Path, PathBuf};

fn suffixes(list: &PathList) -> Vec<(PathBuf, bool)> {
    list.entries()
        .iter()
        .map(|entry| (list.suffix(entry).to_path_buf(), entry.is_dir()))
        .collect()
}

#[test]
fn enumerate_errors_when_root_missing() {
    let error = enumerate("/nonexistent/path/for/walker").expect_err("missing root should fail");
    assert!(matches!(error.kind(), WalkErrorKind::RootMetadata { .. }));
    assert_eq!(error.path(), Path::new("/nonexistent/path/for/walker"));
}

#[test]
fn enumerate_single_file_lists_only_the_file() {
    let temp = tempfile::tempdir().expect("tempdir");
    let file = temp.path().join("file.txt");
    fs::write(&file, b"contents").expect("write");

    let list = enumerate(&file).expect("enumerate");
    assert_eq!(list.len(), 1);
    assert_eq!(list.entries()[0], PathEntry::new(file, false));
}

#[test]
fn enumerate_lists_parents_before_children_in_name_order() {
    let temp = tempfile::tempdir().expect("tempdir");
    let root = temp.path().join("root");
    fs::create_dir_all(root.join("b/nested")).expect("dirs");
    fs::create_dir(root.join("a")).expect("dir a");
    fs::write(root.join("a/inner.txt"), b"data").expect("write inner");
    fs::write(root.join("b/nested/deep.txt"), b"data").expect("write deep");
    fs::write(root.join("c.txt"), b"data").expect("write file");

    let list = enumerate(&root).expect("enumerate");
    assert_eq!(list.root(), root.as_path());
    assert_eq!(
        suffixes(&list),
        vec![
            (PathBuf::new(), true),
            (PathBuf::from("a"), true),
            (PathBuf::from("a/inner.txt"), false),
            (PathBuf::from("b"), true),
            (PathBuf::from("b/nested"), true),
            (PathBuf::from("b/nested/deep.txt"), false),
            (PathBuf::from("c.txt"), false),
        ]
    );
}

#[test]
fn every_entry_path_is_absolute_under_the_root() {
    let temp = tempfile::tempdir().expect("tempdir");
    let root = temp.path().join("root");
    fs::create_dir_all(root.join("x/y")).expect("dirs");
    fs::write(root.join("x/y/z.bin"), [0_u8; 4]).expect("write");

    let list = enumerate(&root).expect("enumerate");
    for entry in list.entries() {
        assert!(entry.path().is_absolute());
        assert!(entry.path().starts_with(list.root()));
    }
}

#[test]
fn empty_directory_yields_only_the_root() {
    let temp = tempfile::tempdir().expect("tempdir");
    let list = enumerate(temp.path()).expect("enumerate");
    assert_eq!(suffixes(&list), vec![(PathBuf::new(), true)]);
}

#[test]
fn builder_can_skip_the_root() {
    let temp = tempfile::tempdir().expect("tempdir");
    fs::write(temp.path().join("only.txt"), b"x").expect("write");

    let paths: Vec<PathBuf> = WalkBuilder::new(temp.path())
        .include_root(false)
        .build()
        .expect("build walker")
        .map(|entry| entry.expect("entry").into_path())
        .collect();
    assert_eq!(paths, vec![temp.path().join("only.txt")]);
}

#[cfg(unix)]
#[test]
fn symlinked_directories_are_listed_but_not_descended() {
    use std::os::unix::fs::symlink;

    let temp = tempfile::tempdir().expect("tempdir");
    let root = temp.path().join("root");
    let target = temp.path().join("target");
    fs::create_dir(&root).expect("create root");
    fs::create_dir(&target).expect("create target");
    fs::write(target.join("inner.txt"), b"data").expect("write inner");
    symlink(&target, root.join("link")).expect("create symlink");
    symlink(&root, root.join("self")).expect("create loop");

    let list = enumerate(&root).expect("enumerate");
    assert_eq!(
        suffixes(&list),
        vec![
            (PathBuf::new(), true),
            (PathBuf::from("link"), false),
            (PathBuf::from("self"), false),
        ]
    );
}

#[cfg(unix)]
#[test]
fn unreadable_subdirectory_stops_enumeration() {
    use std::os::unix::fs::PermissionsExt;

    let temp = tempfile::tempdir().expect("tempdir");
    let root = temp.path().join("root");
    let locked = root.join("locked");
    fs::create_dir_all(&locked).expect("dirs");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).expect("chmod");

    // Privileged users can read the directory anyway; nothing to assert then.
    if fs::read_dir(&locked).is_ok() {
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).expect("restore");
        return;
    }

    let error = enumerate(&root).expect_err("locked directory");
    assert!(matches!(error.kind(), WalkErrorKind::ReadDir { .. }));
    assert_eq!(error.path(), locked.as_path());
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).expect("restore");
}
