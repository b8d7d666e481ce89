//! Build log
//!
//! `.makelove-buildlog` in the root build directory is a JSON array with one
//! entry per versioned build. Entries are appended before any target is
//! built and only the last entry's `completed` flag is ever changed.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::defaults::BUILD_LOG_FILE_NAME;
use crate::core::target::Target;
use crate::error::BuildLogError;
use crate::infra::filesystem;

/// One versioned build
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildLogEntry {
    /// Version name
    pub version: String,
    /// Local time the build started, RFC 2822
    pub build_time: String,
    /// Targets requested for the build
    pub targets: Vec<String>,
    /// Whether every target and the post-build hooks succeeded
    pub completed: bool,
}

impl BuildLogEntry {
    /// A fresh, incomplete entry stamped with the current time
    pub fn started(version: &str, targets: &[Target]) -> Self {
        Self {
            version: version.to_string(),
            build_time: chrono::Local::now().to_rfc2822(),
            targets: targets.iter().map(|t| t.as_str().to_string()).collect(),
            completed: false,
        }
    }
}

/// Handle on the build log of a build directory
#[derive(Debug, Clone)]
pub struct BuildLog {
    path: PathBuf,
}

impl BuildLog {
    /// The log of the root build directory
    pub fn new(build_directory: &Path) -> Self {
        Self {
            path: build_directory.join(BUILD_LOG_FILE_NAME),
        }
    }

    /// Location of the log file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether any versioned build was recorded
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// All entries, oldest first; empty when there is no log
    pub fn entries(&self) -> Result<Vec<BuildLogEntry>, BuildLogError> {
        if !self.exists() {
            return Ok(Vec::new());
        }
        let content = filesystem::read_file(&self.path)?;
        serde_json::from_str(&content).map_err(|e| BuildLogError::Corrupt {
            path: self.path.clone(),
            error: e.to_string(),
        })
    }

    /// The most recent entry
    pub fn last(&self) -> Result<Option<BuildLogEntry>, BuildLogError> {
        Ok(self.entries()?.pop())
    }

    /// Append an entry
    pub fn append(&self, entry: BuildLogEntry) -> Result<(), BuildLogError> {
        let mut entries = self.entries()?;
        entries.push(entry);
        self.write(&entries)
    }

    /// Mark the most recent entry as completed
    pub fn mark_completed(&self) -> Result<(), BuildLogError> {
        let mut entries = self.entries()?;
        let last = entries.last_mut().ok_or_else(|| BuildLogError::Empty {
            path: self.path.clone(),
        })?;
        last.completed = true;
        self.write(&entries)
    }

    /// Replace the file atomically
    fn write(&self, entries: &[BuildLogEntry]) -> Result<(), BuildLogError> {
        let mut content = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut content, formatter);
        entries
            .serialize(&mut serializer)
            .map_err(|e| BuildLogError::Serialize {
                path: self.path.clone(),
                error: e.to_string(),
            })?;
        content.push(b'\n');

        let tmp = self.path.with_extension("tmp");
        filesystem::write_file(&tmp, &content)?;
        filesystem::rename(&tmp, &self.path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_log_is_empty() {
        let temp = TempDir::new().unwrap();
        let log = BuildLog::new(temp.path());
        assert!(!log.exists());
        assert!(log.entries().unwrap().is_empty());
        assert!(log.last().unwrap().is_none());
    }

    #[test]
    fn test_append_then_complete() {
        let temp = TempDir::new().unwrap();
        let log = BuildLog::new(temp.path());

        log.append(BuildLogEntry::started("v1", &[Target::Win64]))
            .unwrap();
        log.mark_completed().unwrap();
        log.append(BuildLogEntry::started("v2", &[Target::Win32, Target::LoveJs]))
            .unwrap();

        let entries = log.entries().unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries[0].completed);
        assert_eq!(entries[0].targets, vec!["win64"]);
        assert!(!entries[1].completed);
        assert_eq!(log.last().unwrap().unwrap().version, "v2");
    }

    #[test]
    fn test_completing_empty_log_fails() {
        let temp = TempDir::new().unwrap();
        let log = BuildLog::new(temp.path());
        assert!(matches!(
            log.mark_completed(),
            Err(BuildLogError::Empty { .. })
        ));
    }

    #[test]
    fn test_corrupt_log() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join(BUILD_LOG_FILE_NAME), "{ not json").unwrap();
        let log = BuildLog::new(temp.path());
        assert!(matches!(log.entries(), Err(BuildLogError::Corrupt { .. })));
    }

    #[test]
    fn test_log_is_json_array() {
        let temp = TempDir::new().unwrap();
        let log = BuildLog::new(temp.path());
        log.append(BuildLogEntry::started("1.0", &[Target::MacOs]))
            .unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(log.path()).unwrap()).unwrap();
        let entry = &raw.as_array().unwrap()[0];
        assert_eq!(entry["version"], "1.0");
        assert_eq!(entry["completed"], false);
        assert!(entry["build_time"].as_str().is_some());
    }

    #[test]
    fn test_unwritable_log_reports_filesystem_error() {
        let temp = TempDir::new().unwrap();
        // the build directory is a file
        let blocked = temp.path().join("build");
        std::fs::write(&blocked, "").unwrap();
        let log = BuildLog::new(&blocked);

        let err = log
            .append(BuildLogEntry::started("1.0", &[Target::Win32]))
            .unwrap_err();
        assert!(matches!(err, BuildLogError::Filesystem(_)));
    }
}
