//! File selection
//!
//! A [`FileList`] enumerates every file below the project directory once and
//! then folds an ordered list of selection rules over it:
//!
//! - `+pattern` or `pattern` adds every enumerated file matching the glob
//! - `-pattern` removes every selected file matching the glob
//! - `::vcs-tracked::` / `::git-ls-tree::` adds the files git tracks at `HEAD`
//! - `::git-ls-files::` adds the files in the git index, submodules included
//!
//! Globs have fnmatch semantics (`*` also matches `/`) and are matched
//! against `./`-prefixed relative paths, so `-./build/*` and `-*/.*` work as
//! written. Later rules win over earlier ones.

use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

use glob::{MatchOptions, Pattern};
use walkdir::WalkDir;

use crate::config::defaults::VCS_TRACKED_RULE;
use crate::error::SelectionError;
use crate::infra::git::{self, TrackedListing};

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// One entry of `love_files`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionRule {
    /// Add enumerated files matching the glob
    Include(String),
    /// Remove selected files matching the glob
    Exclude(String),
    /// Add the files git reports as tracked
    Tracked(TrackedListing),
}

impl FromStr for SelectionRule {
    type Err = SelectionError;

    fn from_str(rule: &str) -> Result<Self, Self::Err> {
        if let Some(pattern) = rule.strip_prefix('-') {
            if pattern.is_empty() {
                return Err(SelectionError::EmptyRule);
            }
            return Ok(Self::Exclude(pattern.to_string()));
        }

        let rule = rule.strip_prefix('+').unwrap_or(rule);
        match rule {
            "" => Err(SelectionError::EmptyRule),
            VCS_TRACKED_RULE | "::git-ls-tree::" => Ok(Self::Tracked(TrackedListing::Tree)),
            "::git-ls-files::" => Ok(Self::Tracked(TrackedListing::Files)),
            pattern => Ok(Self::Include(pattern.to_string())),
        }
    }
}

impl fmt::Display for SelectionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Include(pattern) => write!(f, "+{pattern}"),
            Self::Exclude(pattern) => write!(f, "-{pattern}"),
            Self::Tracked(TrackedListing::Tree) => f.write_str(VCS_TRACKED_RULE),
            Self::Tracked(TrackedListing::Files) => f.write_str("::git-ls-files::"),
        }
    }
}

/// Selected project files
#[derive(Debug, Clone)]
pub struct FileList {
    root: PathBuf,
    /// Every file below the root, relative and `/`-separated
    all_files: Vec<String>,
    selected: BTreeSet<String>,
}

impl FileList {
    /// Enumerate every file below `root`
    ///
    /// Symlinked directories are followed. Reaching the same real directory
    /// twice is a cycle and aborts the enumeration.
    pub fn new(root: &Path) -> Result<Self, SelectionError> {
        let walk_err = |path: &Path, error: String| SelectionError::Walk {
            path: path.to_path_buf(),
            error,
        };

        let mut seen_dirs = HashSet::new();
        seen_dirs.insert(
            root.canonicalize()
                .map_err(|e| walk_err(root, e.to_string()))?,
        );

        let mut all_files = Vec::new();
        for entry in WalkDir::new(root).follow_links(true).min_depth(1) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf());
                    if e.loop_ancestor().is_some() {
                        return Err(SelectionError::SymlinkCycle { path });
                    }
                    if path.symlink_metadata().is_ok() && !path.exists() {
                        tracing::warn!("Skipping broken symlink '{}'", path.display());
                        continue;
                    }
                    return Err(walk_err(&path, e.to_string()));
                }
            };

            if entry.file_type().is_dir() {
                let real = entry
                    .path()
                    .canonicalize()
                    .map_err(|e| walk_err(entry.path(), e.to_string()))?;
                if !seen_dirs.insert(real) {
                    return Err(SelectionError::SymlinkCycle {
                        path: entry.path().to_path_buf(),
                    });
                }
                continue;
            }

            if let Ok(relative) = entry.path().strip_prefix(root) {
                all_files.push(git::relative_string(relative));
            }
        }

        tracing::debug!("Found {} files below {}", all_files.len(), root.display());
        Ok(Self {
            root: root.to_path_buf(),
            all_files,
            selected: BTreeSet::new(),
        })
    }

    /// Enumerate `root` and apply `rules` in order
    pub fn from_rules<S: AsRef<str>>(root: &Path, rules: &[S]) -> Result<Self, SelectionError> {
        let mut list = Self::new(root)?;
        list.apply_rules(rules)?;
        Ok(list)
    }

    /// Project directory the paths are relative to
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Apply rules in order
    pub fn apply_rules<S: AsRef<str>>(&mut self, rules: &[S]) -> Result<(), SelectionError> {
        for rule in rules {
            let rule: SelectionRule = rule.as_ref().parse()?;
            self.apply(&rule)?;
        }
        Ok(())
    }

    /// Apply a single rule
    pub fn apply(&mut self, rule: &SelectionRule) -> Result<(), SelectionError> {
        match rule {
            SelectionRule::Include(pattern) => self.include(pattern).map(|_| ()),
            SelectionRule::Exclude(pattern) => self.exclude(pattern).map(|_| ()),
            SelectionRule::Tracked(listing) => {
                for item in git::tracked_files(&self.root, *listing)? {
                    self.include_raw(&item)?;
                }
                Ok(())
            }
        }
    }

    /// Add every enumerated file matching `pattern`; returns the match count
    pub fn include(&mut self, pattern: &str) -> Result<usize, SelectionError> {
        let compiled = compile(pattern)?;
        let matches: Vec<String> = self
            .all_files
            .iter()
            .filter(|path| matches(&compiled, path))
            .cloned()
            .collect();
        warn_if_empty(pattern, matches.len());
        let count = matches.len();
        self.selected.extend(matches);
        Ok(count)
    }

    /// Remove every selected file matching `pattern`; returns the match count
    pub fn exclude(&mut self, pattern: &str) -> Result<usize, SelectionError> {
        let compiled = compile(pattern)?;
        let before = self.selected.len();
        self.selected.retain(|path| !matches(&compiled, path));
        let count = before - self.selected.len();
        warn_if_empty(pattern, count);
        Ok(count)
    }

    /// Add exactly one path, relative to the root
    ///
    /// Directories are skipped since git never tracks them as such. A path
    /// that does not exist, including a broken symlink, is an error.
    pub fn include_raw(&mut self, item: &str) -> Result<(), SelectionError> {
        let normalized = normalize(item).ok_or_else(|| SelectionError::NotFound {
            path: item.to_string(),
        })?;
        let path = self.root.join(&normalized);

        if path.is_file() {
            self.selected.insert(normalized);
        } else if path.exists() {
            tracing::debug!("'{normalized}' is not a file, skipping");
        } else {
            return Err(SelectionError::NotFound { path: normalized });
        }
        Ok(())
    }

    /// Selected paths in lexicographic order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.selected.iter().map(String::as_str)
    }

    /// Number of selected files
    pub fn len(&self) -> usize {
        self.selected.len()
    }

    /// Whether nothing is selected
    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Whether a relative path is selected
    pub fn contains(&self, path: &str) -> bool {
        self.selected.contains(path)
    }
}

fn compile(pattern: &str) -> Result<Pattern, SelectionError> {
    Pattern::new(pattern).map_err(|e| SelectionError::InvalidPattern {
        pattern: pattern.to_string(),
        error: e.to_string(),
    })
}

fn matches(pattern: &Pattern, path: &str) -> bool {
    pattern.matches_with(&format!("./{path}"), MATCH_OPTIONS)
        || pattern.matches_with(path, MATCH_OPTIONS)
}

fn warn_if_empty(pattern: &str, count: usize) {
    if count == 0 {
        tracing::warn!("Pattern '{pattern}' does not match any files");
    }
}

/// Lexically normalize a relative path to `/`-separated form
///
/// Returns `None` for paths escaping the root or naming the root itself.
fn normalize(item: &str) -> Option<String> {
    let mut parts: Vec<String> = Vec::new();
    for component in Path::new(item).components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::CurDir => {}
            Component::ParentDir => {
                parts.pop()?;
            }
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::resolver;
    use crate::test_utils::git_repo::{self, commit_files};
    use proptest::prelude::*;
    use tempfile::TempDir;

    fn project(files: &[&str]) -> TempDir {
        let temp = TempDir::new().unwrap();
        for file in files {
            let path = temp.path().join(file);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(&path, file.as_bytes()).unwrap();
        }
        temp
    }

    fn selected(list: &FileList) -> Vec<&str> {
        list.iter().collect()
    }

    #[test]
    fn test_parse_rules() {
        assert_eq!(
            "+*.lua".parse::<SelectionRule>().unwrap(),
            SelectionRule::Include("*.lua".to_string())
        );
        assert_eq!(
            "*.lua".parse::<SelectionRule>().unwrap(),
            SelectionRule::Include("*.lua".to_string())
        );
        assert_eq!(
            "-*/.*".parse::<SelectionRule>().unwrap(),
            SelectionRule::Exclude("*/.*".to_string())
        );
        assert_eq!(
            "::vcs-tracked::".parse::<SelectionRule>().unwrap(),
            SelectionRule::Tracked(TrackedListing::Tree)
        );
        assert_eq!(
            "+::git-ls-files::".parse::<SelectionRule>().unwrap(),
            SelectionRule::Tracked(TrackedListing::Files)
        );
        assert!(matches!(
            "".parse::<SelectionRule>(),
            Err(SelectionError::EmptyRule)
        ));
        assert!(matches!(
            "-".parse::<SelectionRule>(),
            Err(SelectionError::EmptyRule)
        ));
    }

    #[test]
    fn test_default_rules_outside_vcs() {
        let temp = project(&[
            "main.lua",
            "conf.lua",
            "assets/player.png",
            ".gitignore",
            "assets/.hidden",
            "makelove-build/love/game.love",
        ]);
        let list =
            FileList::from_rules(temp.path(), &["+*", "-*/.*", "-./makelove-build/*"]).unwrap();
        assert_eq!(
            selected(&list),
            vec!["assets/player.png", "conf.lua", "main.lua"]
        );
    }

    #[test]
    fn test_default_rules_inside_git_repo() {
        if !git_repo::available() {
            return;
        }
        let temp = project(&["untracked.lua", "makelove-build/love/game.love"]);
        std::fs::write(temp.path().join(".gitignore"), "makelove-build/\n").unwrap();
        git_repo::init(temp.path());
        commit_files(
            temp.path(),
            &["main.lua", "assets/player.png", ".gitignore", "assets/.hidden"],
        );

        let rules = resolver::default_love_files(temp.path(), "makelove-build");
        let list = FileList::from_rules(temp.path(), &rules).unwrap();
        assert_eq!(selected(&list), vec!["assets/player.png", "main.lua"]);
    }

    #[test]
    fn test_git_ls_files_includes_staged_files() {
        if !git_repo::available() {
            return;
        }
        let temp = project(&[]);
        git_repo::init(temp.path());
        commit_files(temp.path(), &["main.lua"]);
        std::fs::write(temp.path().join("new.lua"), "").unwrap();
        git_repo::git(temp.path(), &["add", "new.lua"]);

        let list = FileList::from_rules(temp.path(), &["::vcs-tracked::"]).unwrap();
        assert_eq!(selected(&list), vec!["main.lua"]);
        let list = FileList::from_rules(temp.path(), &["+::git-ls-files::", "-*.lua", "+./new.lua"])
            .unwrap();
        assert_eq!(selected(&list), vec!["new.lua"]);
    }

    #[test]
    fn test_tracked_file_deleted_from_disk_is_fatal() {
        if !git_repo::available() {
            return;
        }
        let temp = project(&[]);
        git_repo::init(temp.path());
        commit_files(temp.path(), &["main.lua", "gone.lua"]);
        std::fs::remove_file(temp.path().join("gone.lua")).unwrap();

        assert!(matches!(
            FileList::from_rules(temp.path(), &["::git-ls-tree::"]),
            Err(SelectionError::NotFound { .. })
        ));
    }

    #[test]
    fn test_later_rules_win() {
        let temp = project(&["a.lua", "b.lua", "c.txt"]);

        let list = FileList::from_rules(temp.path(), &["+*", "-*.lua", "+./a.lua"]).unwrap();
        assert_eq!(selected(&list), vec!["a.lua", "c.txt"]);

        let list = FileList::from_rules(temp.path(), &["+./a.lua", "+*", "-*.lua"]).unwrap();
        assert_eq!(selected(&list), vec!["c.txt"]);
    }

    #[test]
    fn test_empty_match_is_not_an_error() {
        let temp = project(&["main.lua"]);
        let mut list = FileList::new(temp.path()).unwrap();
        assert_eq!(list.include("*.png").unwrap(), 0);
        assert_eq!(list.exclude("*.lua").unwrap(), 0);
        assert!(list.is_empty());
    }

    #[test]
    fn test_star_crosses_directories() {
        let temp = project(&["src/deep/nested/file.lua", "top.lua"]);
        let list = FileList::from_rules(temp.path(), &["./src/*"]).unwrap();
        assert_eq!(selected(&list), vec!["src/deep/nested/file.lua"]);
    }

    #[test]
    fn test_invalid_pattern() {
        let temp = project(&["main.lua"]);
        let mut list = FileList::new(temp.path()).unwrap();
        assert!(matches!(
            list.include("[unclosed"),
            Err(SelectionError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_include_raw() {
        let temp = project(&["main.lua", "lib/util.lua"]);
        let mut list = FileList::new(temp.path()).unwrap();
        list.include_raw("./lib/../main.lua").unwrap();
        list.include_raw("lib").unwrap();
        assert_eq!(selected(&list), vec!["main.lua"]);

        assert!(matches!(
            list.include_raw("missing.lua"),
            Err(SelectionError::NotFound { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_include_raw_rejects_broken_symlink() {
        let temp = project(&["main.lua"]);
        std::os::unix::fs::symlink(temp.path().join("gone.lua"), temp.path().join("link.lua"))
            .unwrap();
        let mut list = FileList::new(temp.path()).unwrap();
        assert!(matches!(
            list.include_raw("link.lua"),
            Err(SelectionError::NotFound { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_directories_are_followed() {
        let temp = project(&["main.lua"]);
        let shared = TempDir::new().unwrap();
        std::fs::write(shared.path().join("shared.lua"), "").unwrap();
        std::os::unix::fs::symlink(shared.path(), temp.path().join("lib")).unwrap();

        let list = FileList::from_rules(temp.path(), &["*"]).unwrap();
        assert_eq!(selected(&list), vec!["lib/shared.lua", "main.lua"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_cycle_is_fatal() {
        let temp = project(&["main.lua", "sub/file.lua"]);
        std::os::unix::fs::symlink(temp.path(), temp.path().join("sub/loop")).unwrap();
        assert!(matches!(
            FileList::new(temp.path()),
            Err(SelectionError::SymlinkCycle { .. })
        ));
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("./a/./b/../c.lua").as_deref(), Some("a/c.lua"));
        assert_eq!(normalize("../outside"), None);
        assert_eq!(normalize("."), None);
    }

    #[test]
    fn test_rule_display() {
        for rule in ["+*.lua", "-*/.*", "::vcs-tracked::", "::git-ls-files::"] {
            assert_eq!(rule.parse::<SelectionRule>().unwrap().to_string(), rule);
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_selection_is_sorted_and_idempotent(
            names in proptest::collection::btree_set("[a-z]{1,4}(/[a-z]{1,4})?\\.(lua|png)", 1..8),
            rules in proptest::collection::vec(
                prop_oneof![
                    Just("+*".to_string()),
                    Just("-*.png".to_string()),
                    Just("+*.png".to_string()),
                    Just("-*/*".to_string()),
                ],
                0..5,
            ),
        ) {
            let names: Vec<&str> = names.iter().map(String::as_str).collect();
            let temp = project(&names);

            let first = FileList::from_rules(temp.path(), &rules).unwrap();
            let second = FileList::from_rules(temp.path(), &rules).unwrap();
            let first: Vec<&str> = first.iter().collect();
            let second: Vec<&str> = second.iter().collect();

            let mut sorted = first.clone();
            sorted.sort_unstable();
            prop_assert_eq!(&first, &sorted);
            prop_assert_eq!(first, second);
        }
    }
}
