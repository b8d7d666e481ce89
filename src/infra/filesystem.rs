//! Filesystem operations
//!
//! Thin wrappers over `std::fs` that attach the offending path to errors.

use std::path::Path;

use crate::error::FilesystemError;

/// Create a directory and all parent directories
pub fn create_dir_all(path: &Path) -> Result<(), FilesystemError> {
    std::fs::create_dir_all(path).map_err(|e| FilesystemError::CreateDir {
        path: path.to_path_buf(),
        error: e.to_string(),
    })
}

/// Remove a directory and all its contents
pub fn remove_dir_all(path: &Path) -> Result<(), FilesystemError> {
    if path.exists() {
        std::fs::remove_dir_all(path).map_err(|e| FilesystemError::RemoveDir {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;
    }
    Ok(())
}

/// Remove whatever is at `path`, file or directory
pub fn remove_path(path: &Path) -> Result<(), FilesystemError> {
    if path.is_dir() {
        remove_dir_all(path)
    } else if path.symlink_metadata().is_ok() {
        std::fs::remove_file(path).map_err(|e| FilesystemError::RemoveDir {
            path: path.to_path_buf(),
            error: e.to_string(),
        })
    } else {
        Ok(())
    }
}

/// Write content to a file
pub fn write_file(path: &Path, content: impl AsRef<[u8]>) -> Result<(), FilesystemError> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }
    std::fs::write(path, content).map_err(|e| FilesystemError::WriteFile {
        path: path.to_path_buf(),
        error: e.to_string(),
    })
}

/// Read content from a file
pub fn read_file(path: &Path) -> Result<String, FilesystemError> {
    std::fs::read_to_string(path).map_err(|e| FilesystemError::ReadFile {
        path: path.to_path_buf(),
        error: e.to_string(),
    })
}

/// Read binary content from a file
pub fn read_bytes(path: &Path) -> Result<Vec<u8>, FilesystemError> {
    std::fs::read(path).map_err(|e| FilesystemError::ReadFile {
        path: path.to_path_buf(),
        error: e.to_string(),
    })
}

/// Copy a single file, creating the destination's parent directories
pub fn copy_file(from: &Path, to: &Path) -> Result<(), FilesystemError> {
    if let Some(parent) = to.parent() {
        create_dir_all(parent)?;
    }
    std::fs::copy(from, to)
        .map(|_| ())
        .map_err(|e| FilesystemError::Copy {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
            error: e.to_string(),
        })
}

/// Move a file or directory
pub fn rename(from: &Path, to: &Path) -> Result<(), FilesystemError> {
    std::fs::rename(from, to).map_err(|e| FilesystemError::Copy {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        error: e.to_string(),
    })
}

/// Recursively copy a directory
pub fn copy_dir_all(from: &Path, to: &Path) -> Result<(), FilesystemError> {
    for entry in walkdir::WalkDir::new(from) {
        let entry = entry.map_err(|e| FilesystemError::Copy {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
            error: e.to_string(),
        })?;
        let relative = entry.path().strip_prefix(from).unwrap_or(entry.path());
        let dest = to.join(relative);
        if entry.file_type().is_dir() {
            create_dir_all(&dest)?;
        } else {
            copy_file(entry.path(), &dest)?;
        }
    }
    Ok(())
}

/// Concatenate files into `dest` (used to fuse a runtime with a game archive)
pub fn concat_files(dest: &Path, parts: &[&Path]) -> Result<(), FilesystemError> {
    let mut content = Vec::new();
    for part in parts {
        content.extend(read_bytes(part)?);
    }
    write_file(dest, content)
}

/// Mark a file as executable (no-op outside Unix)
pub fn set_executable(path: &Path) -> Result<(), FilesystemError> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).map_err(|e| {
            FilesystemError::WriteFile {
                path: path.to_path_buf(),
                error: e.to_string(),
            }
        })?;
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}
