//! Git operations
//!
//! Repository discovery uses the gix crate. Listing tracked files shells out
//! to the git executable so the result is exactly what `git` reports,
//! submodules and symlinks included.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{GitError, SelectionError};

/// Which git listing a tracked-files rule expands to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackedListing {
    /// `git ls-tree -r --name-only HEAD`, following tracked symlinked directories
    Tree,
    /// `git ls-files --recurse-submodules`
    Files,
}

/// Root of the work tree containing `path`, if any
pub fn discover_work_dir(path: &Path) -> Option<PathBuf> {
    match gix::discover(path) {
        Ok(repo) => repo.work_dir().map(Path::to_path_buf),
        Err(e) => {
            tracing::debug!("No git repository at {}: {e}", path.display());
            None
        }
    }
}

/// Whether `path` is inside a git work tree
pub fn is_inside_work_tree(path: &Path) -> bool {
    discover_work_dir(path).is_some()
}

/// Files tracked by git below `root`, relative to `root`
pub fn tracked_files(root: &Path, listing: TrackedListing) -> Result<Vec<String>, SelectionError> {
    match listing {
        TrackedListing::Tree => {
            let mut visited = HashSet::new();
            ls_tree(root, root, &mut visited)
        }
        TrackedListing::Files => Ok(run_git(
            root,
            &["ls-files", "--recurse-submodules", "--abbrev=0"],
        )?),
    }
}

fn ls_tree(
    root: &Path,
    dir: &Path,
    visited: &mut HashSet<PathBuf>,
) -> Result<Vec<String>, SelectionError> {
    let real = dir.canonicalize().map_err(|e| SelectionError::Walk {
        path: dir.to_path_buf(),
        error: e.to_string(),
    })?;
    if !visited.insert(real) {
        return Err(SelectionError::SymlinkCycle {
            path: dir.to_path_buf(),
        });
    }

    let prefix = dir.strip_prefix(root).unwrap_or(Path::new(""));
    let mut files = Vec::new();
    for item in run_git(dir, &["ls-tree", "-r", "--name-only", "HEAD"])? {
        let item_path = dir.join(&item);
        let is_symlink = item_path
            .symlink_metadata()
            .map(|m| m.file_type().is_symlink())
            .unwrap_or(false);
        if is_symlink && item_path.is_dir() {
            files.extend(ls_tree(root, &item_path, visited)?);
        } else {
            files.push(relative_string(&prefix.join(&item)));
        }
    }
    Ok(files)
}

/// Run git in `dir` and return its stdout lines
fn run_git(dir: &Path, args: &[&str]) -> Result<Vec<String>, GitError> {
    tracing::debug!("Running git {} in {}", args.join(" "), dir.display());
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .map_err(|e| GitError::Spawn {
            path: dir.to_path_buf(),
            error: e.to_string(),
        })?;

    if !output.status.success() {
        return Err(GitError::CommandFailed {
            command: args.join(" "),
            path: dir.to_path_buf(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout)
        .lines()
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect())
}

/// Forward-slash form of a relative path
pub fn relative_string(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::git_repo::{self, commit_files, git};
    use tempfile::TempDir;

    fn sorted(mut files: Vec<String>) -> Vec<String> {
        files.sort();
        files
    }

    #[test]
    fn test_relative_string_uses_forward_slashes() {
        assert_eq!(relative_string(Path::new("a/b/c.lua")), "a/b/c.lua");
    }

    #[test]
    fn test_plain_directory_is_not_a_work_tree() {
        let temp = TempDir::new().unwrap();
        assert!(discover_work_dir(temp.path()).is_none());
    }

    #[test]
    fn test_ls_tree_lists_committed_files() {
        if !git_repo::available() {
            return;
        }
        let temp = TempDir::new().unwrap();
        git_repo::init(temp.path());
        commit_files(temp.path(), &["main.lua", "lib/util.lua"]);
        std::fs::write(temp.path().join("untracked.lua"), "").unwrap();

        assert!(is_inside_work_tree(temp.path()));
        assert!(is_inside_work_tree(&temp.path().join("lib")));
        let files = tracked_files(temp.path(), TrackedListing::Tree).unwrap();
        assert_eq!(sorted(files), vec!["lib/util.lua", "main.lua"]);
    }

    #[test]
    fn test_ls_tree_ignores_staged_but_uncommitted_files() {
        if !git_repo::available() {
            return;
        }
        let temp = TempDir::new().unwrap();
        git_repo::init(temp.path());
        commit_files(temp.path(), &["main.lua"]);
        std::fs::write(temp.path().join("staged.lua"), "").unwrap();
        git(temp.path(), &["add", "staged.lua"]);

        let tree = tracked_files(temp.path(), TrackedListing::Tree).unwrap();
        assert_eq!(tree, vec!["main.lua"]);
        let index = tracked_files(temp.path(), TrackedListing::Files).unwrap();
        assert_eq!(sorted(index), vec!["main.lua", "staged.lua"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_ls_tree_follows_tracked_symlinked_directory() {
        if !git_repo::available() {
            return;
        }
        let temp = TempDir::new().unwrap();
        git_repo::init(temp.path());
        std::fs::create_dir(temp.path().join("shared")).unwrap();
        std::os::unix::fs::symlink("shared", temp.path().join("lib")).unwrap();
        commit_files(temp.path(), &["main.lua", "shared/util.lua", "lib"]);

        let files = tracked_files(temp.path(), TrackedListing::Tree).unwrap();
        assert_eq!(
            sorted(files),
            vec!["lib/util.lua", "main.lua", "shared/util.lua"]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_ls_tree_symlink_cycle_is_an_error() {
        if !git_repo::available() {
            return;
        }
        let temp = TempDir::new().unwrap();
        git_repo::init(temp.path());
        std::os::unix::fs::symlink(".", temp.path().join("loop")).unwrap();
        commit_files(temp.path(), &["main.lua", "loop"]);

        let err = tracked_files(temp.path(), TrackedListing::Tree).unwrap_err();
        assert!(matches!(err, SelectionError::SymlinkCycle { .. }));
    }

    #[test]
    fn test_git_failure_is_reported() {
        if !git_repo::available() {
            return;
        }
        let temp = TempDir::new().unwrap();
        let err = tracked_files(temp.path(), TrackedListing::Tree).unwrap_err();
        assert!(matches!(err, SelectionError::Git(GitError::CommandFailed { .. })));
    }
}
