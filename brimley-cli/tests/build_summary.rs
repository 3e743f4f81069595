//! `build` reports a clean discover + reload cycle and fails when a domain
//! is blocked.

use std::fs;

use brimley_cli::commands::build;

#[test]
fn clean_project_builds_successfully() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("hello.md"), "---\nname: hello\ntype: template_function\nreturn_shape: string\n---\nHi").unwrap();

    assert!(build::run(dir.path()).unwrap());
}

#[test]
fn a_broken_function_blocks_the_build() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("hello.md"), "---\nname: hello\ntype: template_function\n---\nHi").unwrap();

    assert!(!build::run(dir.path()).unwrap());
}
