//! Common test utilities and helpers
//!
//! This module provides shared utilities for integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use assert_fs::prelude::*;
use assert_fs::TempDir;

/// A game project in a temporary directory
///
/// Runs the `makelove` binary with `-C` pointing at the project and a
/// private cache directory so nothing is downloaded.
pub struct TestProject {
    /// Temporary directory for the test project
    pub dir: TempDir,
    cache: TempDir,
}

impl TestProject {
    /// Create an empty project
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp directory"),
            cache: TempDir::new().expect("Failed to create cache directory"),
        }
    }

    /// A project with a `main.lua`, a fake Windows runtime and a config
    /// building `win64` from `config`
    pub fn game(config: &str) -> Self {
        let project = Self::new();
        project.create_file("main.lua", "function love.draw() end\n");
        project.create_file("assets/player.png", "png");
        project.create_file("runtime/love.exe", "MZ-love");
        project.create_file("runtime/SDL2.dll", "sdl");
        project.create_file("runtime/lua51.dll", "lua");
        project.create_file("runtime/license.txt", "zlib");
        project.create_file("makelove.toml", config);
        project
    }

    /// Get the path to the test project directory
    pub fn path(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }

    /// Create a file in the test project
    pub fn create_file(&self, name: &str, content: &str) {
        self.dir
            .child(name)
            .write_str(content)
            .expect("Failed to write file");
    }

    /// Check if a file exists in the test project
    pub fn file_exists(&self, name: &str) -> bool {
        self.dir.path().join(name).exists()
    }

    /// Read a file from the test project
    pub fn read_file(&self, name: &str) -> String {
        std::fs::read_to_string(self.dir.path().join(name)).expect("Failed to read file")
    }

    /// Base command with the project directory and cache set
    pub fn command(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_makelove"));
        cmd.arg("-C")
            .arg(self.dir.path())
            .env("MAKELOVE_CACHE_DIR", self.cache.path())
            .env_remove("RUST_LOG")
            // keep rcedit and wine out of the picture
            .env("PATH", empty_path(self.cache.path()));
        cmd
    }

    /// Run makelove with `args`
    pub fn run(&self, args: &[&str]) -> Output {
        self.command()
            .args(args)
            .output()
            .expect("Failed to execute makelove")
    }

    /// Run makelove from the project's parent directory with a relative `-C`
    pub fn run_from_parent(&self, args: &[&str]) -> Output {
        let dir = self.dir.path();
        let parent = dir.parent().expect("temp dir has a parent");
        let name = dir.file_name().expect("temp dir has a name");
        Command::new(env!("CARGO_BIN_EXE_makelove"))
            .current_dir(parent)
            .arg("-C")
            .arg(name)
            .args(args)
            .env("MAKELOVE_CACHE_DIR", self.cache.path())
            .env_remove("RUST_LOG")
            .env("PATH", empty_path(self.cache.path()))
            .output()
            .expect("Failed to execute makelove")
    }

    /// Run git in the project, panicking on failure
    pub fn git(&self, args: &[&str]) {
        let status = Command::new("git")
            .args(args)
            .current_dir(self.dir.path())
            .status()
            .expect("Failed to run git");
        assert!(status.success(), "git {args:?} failed");
    }

    /// Run makelove with `args`, feeding `input` on stdin
    pub fn run_with_input(&self, args: &[&str], input: &str) -> Output {
        use std::io::Write;

        let mut child = self
            .command()
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .expect("Failed to spawn makelove");
        child
            .stdin
            .take()
            .expect("stdin is piped")
            .write_all(input.as_bytes())
            .expect("Failed to write stdin");
        child.wait_with_output().expect("Failed to wait for makelove")
    }
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

/// A PATH with only the shell utilities hooks need
#[cfg(unix)]
fn empty_path(_cache: &Path) -> String {
    "/usr/bin:/bin".to_string()
}

#[cfg(not(unix))]
fn empty_path(cache: &Path) -> String {
    std::env::var("PATH").unwrap_or_else(|_| cache.display().to_string())
}

/// Stdout of a finished command
pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

/// Stderr of a finished command
pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

/// Entry names of a zip archive, in archive order
pub fn zip_entries(path: &Path) -> Vec<String> {
    let file = std::fs::File::open(path).expect("Failed to open zip");
    let archive = zip::ZipArchive::new(file).expect("Failed to read zip");
    archive.file_names().map(str::to_string).collect()
}

/// A config building only `win64` from the fake runtime
pub const WIN64_CONFIG: &str = r#"
name = "Space Game"
love_version = "11.5"
default_targets = ["win64"]
build_directory = "out"
love_files = ["+*", "-*/.*", "-./out/*", "-./runtime/*", "-./makelove.toml"]

[win64]
love_binaries = "runtime"
"#;
