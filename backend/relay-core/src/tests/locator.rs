// Unit tests for the ancestor project locator

use crate::locator::{AncestorLocator, ProjectLocator};

use std::fs::{create_dir_all, write};
use std::path::Path;

use tempfile::TempDir;

/// **VALUE**: Verifies the nearest descriptor above a file is found.
///
/// **WHY THIS MATTERS**: The project decides which running host receives the file.
///
/// **BUG THIS CATCHES**: Would catch a walk that starts above the file's own directory or
/// stops after the first level.
#[test]
fn given_descriptor_two_levels_up_when_locating_then_it_is_found() {
    // GIVEN: repo/App.sln and repo/src/deep/file.cs
    let temp = TempDir::new().expect("tempdir");
    let deep = temp.path().join("src").join("deep");
    create_dir_all(&deep).expect("create dirs");
    write(temp.path().join("App.sln"), "").expect("write sln");
    let file = deep.join("file.cs");
    write(&file, "").expect("write file");

    // WHEN: Locating
    let locator = AncestorLocator::new([".SLN"]);
    let found = locator.find_project_for(&file);

    // THEN: The descriptor at the repo root
    assert_eq!(found.as_deref(), Some(temp.path().join("App.sln").as_path()));
}

/// **VALUE**: Verifies a directory with several descriptors picks the first by name.
#[test]
fn given_several_descriptors_when_locating_then_first_by_name_wins() {
    // GIVEN: Two descriptors next to the file
    let temp = TempDir::new().expect("tempdir");
    write(temp.path().join("b.sln"), "").expect("write b");
    write(temp.path().join("a.sln"), "").expect("write a");
    let file = temp.path().join("file.cs");
    write(&file, "").expect("write file");

    // WHEN: Locating
    let found = AncestorLocator::new(["sln"]).find_project_for(&file);

    // THEN: a.sln
    assert_eq!(found.as_deref(), Some(temp.path().join("a.sln").as_path()));
}

/// **VALUE**: Verifies extension matching ignores case and a leading dot.
#[test]
fn given_mixed_case_extension_when_checking_descriptor_then_matches() {
    let locator = AncestorLocator::new([".sln", "csproj"]);

    assert!(locator.is_descriptor(Path::new("/x/App.SLN")));
    assert!(locator.is_descriptor(Path::new("/x/a.csproj")));
    assert!(!locator.is_descriptor(Path::new("/x/a.cs")));
    assert!(!locator.is_descriptor(Path::new("/x/sln")));
}

/// **VALUE**: Verifies unrelated extensions are not treated as projects.
#[test]
fn given_no_matching_descriptor_in_tree_when_locating_then_none_below_temp() {
    // GIVEN: Only source files in the tree
    let temp = TempDir::new().expect("tempdir");
    let file = temp.path().join("file.cs");
    write(&file, "").expect("write file");

    // WHEN: Locating with an extension nobody uses
    let found = AncestorLocator::new(["editor-relay-test-descriptor"]).find_project_for(&file);

    // THEN: Nothing
    assert!(found.is_none());
}
