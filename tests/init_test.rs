//! Integration tests for `makelove --init`

mod common;

use common::{stderr, stdout, TestProject};
use predicates::prelude::*;

#[test]
fn test_init_writes_config_from_answers() {
    let project = TestProject::new();
    project.create_file("main.lua", "");

    let output = project.run_with_input(&["--init"], "My Game\nbuild\n");
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(predicate::str::contains("Configuration written to").eval(&stdout(&output)));

    let content = project.read_file("makelove.toml");
    let config: toml::Table = toml::from_str(&content).expect("generated config is TOML");
    assert_eq!(config["name"].as_str(), Some("My Game"));
    assert_eq!(config["build_directory"].as_str(), Some("build"));
    assert!(config["love_files"]
        .as_array()
        .unwrap()
        .iter()
        .any(|rule| rule.as_str() == Some("-./build/*")));
}

#[test]
fn test_init_defaults_on_empty_answers() {
    let project = TestProject::new();

    let output = project.run_with_input(&["--init"], "\n\n");
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let content = project.read_file("makelove.toml");
    assert!(predicate::str::contains("build_directory = \"makelove-build\"").eval(&content));
}

#[test]
fn test_generated_config_passes_check() {
    let project = TestProject::new();
    project.create_file("main.lua", "");
    assert!(project
        .run_with_input(&["--init"], "Checked\n\n")
        .status
        .success());

    let output = project.run(&["--check"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
}

#[test]
fn test_init_refuses_to_overwrite() {
    let project = TestProject::new();
    project.create_file("makelove.toml", "name = \"keep me\"\n");

    let output = project.run_with_input(&["--init"], "Other\n\n");
    assert!(!output.status.success());
    assert!(predicate::str::contains("already exists").eval(&stderr(&output)));
    assert_eq!(project.read_file("makelove.toml"), "name = \"keep me\"\n");
}
