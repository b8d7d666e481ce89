//! Build directory lifecycle
//!
//! An unversioned build writes straight into the build directory, a
//! versioned build into `<build_directory>/<version>`. Each target gets its
//! own subdirectory named after the target.

use std::path::{Path, PathBuf};

use crate::core::target::Target;
use crate::error::BuildDirError;
use crate::infra::filesystem;

/// What to do with a target's output directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetDirState {
    /// Freshly created and empty
    Ready,
    /// Left over from a previous build and kept because of `--resume`
    Resumed,
}

/// Directory a build writes into
pub fn resolve(build_root: &Path, version: Option<&str>) -> PathBuf {
    match version {
        Some(version) => build_root.join(version),
        None => build_root.to_path_buf(),
    }
}

/// Prepare the directory of a build
///
/// Rebuilding a target of an existing versioned build needs `force`. The
/// conflicting target directories are not removed here; every target
/// directory is cleared right before its target is built.
pub fn prepare(
    build_root: &Path,
    version: Option<&str>,
    targets: &[Target],
    force: bool,
) -> Result<PathBuf, BuildDirError> {
    let dir = resolve(build_root, version);

    if dir.is_dir() {
        let built: Vec<String> = targets
            .iter()
            .filter(|t| dir.join(t.as_str()).exists())
            .map(|t| t.as_str().to_string())
            .collect();

        if let (Some(version), false) = (version, built.is_empty()) {
            if !force {
                return Err(BuildDirError::Conflict {
                    version: version.to_string(),
                    targets: built,
                });
            }
            tracing::info!(
                "Overwriting already built targets of version '{version}': {}",
                built.join(", ")
            );
        }
    } else if dir.symlink_metadata().is_ok() {
        return Err(BuildDirError::NotADirectory { path: dir });
    } else {
        filesystem::create_dir_all(&dir)?;
    }

    Ok(dir)
}

/// Prepare the output directory of one target
///
/// With `resume` an existing directory is kept as is. Otherwise anything
/// already there is removed first.
pub fn prepare_target(
    build_dir: &Path,
    target: Target,
    resume: bool,
) -> Result<(PathBuf, TargetDirState), BuildDirError> {
    let target_dir = build_dir.join(target.as_str());

    if resume && target_dir.is_dir() {
        return Ok((target_dir, TargetDirState::Resumed));
    }

    filesystem::remove_path(&target_dir)?;
    filesystem::create_dir_all(&target_dir)?;
    Ok((target_dir, TargetDirState::Ready))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_resolve() {
        let root = Path::new("build");
        assert_eq!(resolve(root, None), PathBuf::from("build"));
        assert_eq!(resolve(root, Some("v1")), PathBuf::from("build/v1"));
    }

    #[test]
    fn test_prepare_creates_directory() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("makelove-build");
        let dir = prepare(&root, Some("v1"), &[Target::Win64], false).unwrap();
        assert_eq!(dir, root.join("v1"));
        assert!(dir.is_dir());
    }

    #[test]
    fn test_versioned_rebuild_conflicts_without_force() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("build");

        let dir = prepare(&root, Some("v1"), &[Target::Win64], false).unwrap();
        prepare_target(&dir, Target::Win64, false).unwrap();
        std::fs::write(dir.join("win64/old.zip"), "old").unwrap();

        let err = prepare(&root, Some("v1"), &[Target::Win64], false).unwrap_err();
        match err {
            BuildDirError::Conflict { version, targets } => {
                assert_eq!(version, "v1");
                assert_eq!(targets, vec!["win64"]);
            }
            other => panic!("expected conflict, got {other:?}"),
        }

        let dir = prepare(&root, Some("v1"), &[Target::Win64], true).unwrap();
        let (target_dir, state) = prepare_target(&dir, Target::Win64, false).unwrap();
        assert_eq!(state, TargetDirState::Ready);
        assert!(!target_dir.join("old.zip").exists());
    }

    #[test]
    fn test_versioned_build_of_other_target_is_fine() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("build");
        let dir = prepare(&root, Some("v1"), &[Target::Win64], false).unwrap();
        prepare_target(&dir, Target::Win64, false).unwrap();

        assert!(prepare(&root, Some("v1"), &[Target::Win32], false).is_ok());
    }

    #[test]
    fn test_unversioned_rebuild_never_conflicts() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("build");
        let dir = prepare(&root, None, &[Target::Win64], false).unwrap();
        prepare_target(&dir, Target::Win64, false).unwrap();

        assert!(prepare(&root, None, &[Target::Win64], false).is_ok());
    }

    #[test]
    fn test_file_in_the_way() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("build");
        std::fs::write(&root, "not a directory").unwrap();
        assert!(matches!(
            prepare(&root, None, &[Target::Win64], false),
            Err(BuildDirError::NotADirectory { .. })
        ));
    }

    #[test]
    fn test_resume_keeps_target_directory() {
        let temp = TempDir::new().unwrap();
        let (dir, _) = prepare_target(temp.path(), Target::LoveJs, false).unwrap();
        std::fs::write(dir.join("game.zip"), "built").unwrap();

        let (dir, state) = prepare_target(temp.path(), Target::LoveJs, true).unwrap();
        assert_eq!(state, TargetDirState::Resumed);
        assert!(dir.join("game.zip").exists());
    }
}
