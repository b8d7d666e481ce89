//! Test utilities for property-based testing
//!
//! This module provides generators and helpers for proptest.

#[cfg(test)]
pub mod generators {
    use proptest::prelude::*;

    use crate::core::target::Target;

    /// Generate a bumpable version name as `(prefix, trailing number)`
    ///
    /// The prefix never ends in a digit.
    pub fn version_name() -> impl Strategy<Value = (String, u64)> {
        (
            prop_oneof![Just(String::new()), "[a-z][a-z0-9.-]{0,5}[a-z.-]"],
            0u64..1_000_000,
        )
    }

    /// Generate a project name
    pub fn project_name() -> impl Strategy<Value = String> {
        "[A-Za-z][A-Za-z0-9 _-]{0,20}"
    }

    /// Generate a non-empty list of targets, possibly with duplicates
    pub fn target_list() -> impl Strategy<Value = Vec<Target>> {
        proptest::collection::vec(proptest::sample::select(Target::ALL.to_vec()), 1..8)
    }
}

/// Throwaway git repositories for tests of tracked-file selection
#[cfg(test)]
pub mod git_repo {
    use std::path::Path;
    use std::process::Command;

    /// Whether a git executable is on PATH
    pub fn available() -> bool {
        which::which("git").is_ok()
    }

    /// Run git in `dir`, panicking on failure
    pub fn git(dir: &Path, args: &[&str]) {
        let status = Command::new("git")
            .args(args)
            .current_dir(dir)
            .status()
            .expect("git runs");
        assert!(status.success(), "git {args:?} failed");
    }

    /// Initialize a repository with a local identity
    pub fn init(dir: &Path) {
        git(dir, &["init", "-q"]);
        git(dir, &["config", "user.email", "test@example.com"]);
        git(dir, &["config", "user.name", "Test"]);
        git(dir, &["config", "commit.gpgsign", "false"]);
    }

    /// Write `files` (contents are their names), then add and commit them
    pub fn commit_files(dir: &Path, files: &[&str]) {
        for file in files {
            let path = dir.join(file);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).unwrap();
            }
            if !path.exists() {
                std::fs::write(&path, file.as_bytes()).unwrap();
            }
        }
        let mut args = vec!["add", "--"];
        args.extend_from_slice(files);
        git(dir, &args);
        git(dir, &["commit", "-q", "-m", "files"]);
    }
}

#[cfg(test)]
mod tests {
    use super::generators::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn test_version_name_generator((prefix, _number) in version_name()) {
            prop_assert!(!prefix.ends_with(|c: char| c.is_ascii_digit()));
        }

        #[test]
        fn test_project_name_generator(name in project_name()) {
            prop_assert!(!name.is_empty());
            prop_assert!(!name.contains('/'));
        }

        #[test]
        fn test_target_list_generator(targets in target_list()) {
            prop_assert!(!targets.is_empty());
        }
    }
}
