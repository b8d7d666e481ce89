//! Asset archive (`.love` file)
//!
//! Selected files are staged in `<build>/love/game_directory` and zipped
//! into `<build>/love/<name>.love`. Entries are written in sorted order with
//! a fixed timestamp, so the same tree always gives the same archive.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::config::defaults::MAIN_LUA;
use crate::core::filelist::FileList;
use crate::error::ArchiveError;
use crate::infra::{filesystem, git};

/// Subdirectory of a build holding the asset archive
pub const LOVE_SUBDIR: &str = "love";

/// Staging directory inside [`LOVE_SUBDIR`]
pub const GAME_DIRECTORY: &str = "game_directory";

/// Path of the asset archive of a build
pub fn love_file_path(build_dir: &Path, name: &str) -> PathBuf {
    build_dir.join(LOVE_SUBDIR).join(format!("{name}.love"))
}

/// Path of the staging directory of a build
pub fn game_directory(build_dir: &Path) -> PathBuf {
    build_dir.join(LOVE_SUBDIR).join(GAME_DIRECTORY)
}

/// Build the asset archive from the selected files
///
/// The staging directory is removed afterwards unless `keep_game_directory`
/// is set. Fails when the staged game has no `main.lua`.
pub fn create_love_file(
    files: &FileList,
    build_dir: &Path,
    name: &str,
    keep_game_directory: bool,
) -> Result<PathBuf, ArchiveError> {
    let game_dir = game_directory(build_dir);
    stage_game_directory(files, &game_dir)?;

    if !game_dir.join(MAIN_LUA).is_file() {
        return Err(ArchiveError::MissingMainLua);
    }

    let love_file = love_file_path(build_dir, name);
    let count = zip_directory(&game_dir, &love_file)?;
    tracing::info!("Created {} ({count} files)", love_file.display());

    if keep_game_directory {
        tracing::info!("Keeping game directory because 'keep_game_directory' is true");
    } else {
        filesystem::remove_dir_all(&game_dir)?;
    }
    Ok(love_file)
}

/// Copy the selected files into a fresh staging directory
pub fn stage_game_directory(files: &FileList, game_dir: &Path) -> Result<(), ArchiveError> {
    filesystem::remove_dir_all(game_dir)?;
    filesystem::create_dir_all(game_dir)?;

    tracing::debug!(".love files:");
    for path in files.iter() {
        tracing::debug!("{path}");
        filesystem::copy_file(&files.root().join(path), &game_dir.join(path))?;
    }
    Ok(())
}

/// Zip every file below `src_dir` into `dest`; returns the entry count
pub fn zip_directory(src_dir: &Path, dest: &Path) -> Result<usize, ArchiveError> {
    let zip_err = |error: String| ArchiveError::Zip {
        path: dest.to_path_buf(),
        error,
    };

    let mut entries = Vec::new();
    for entry in WalkDir::new(src_dir).min_depth(1) {
        let entry = entry.map_err(|e| zip_err(e.to_string()))?;
        if entry.file_type().is_dir() {
            continue;
        }
        let relative = entry.path().strip_prefix(src_dir).unwrap_or(entry.path());
        entries.push((git::relative_string(relative), entry.path().to_path_buf()));
    }
    entries.sort();

    if let Some(parent) = dest.parent() {
        filesystem::create_dir_all(parent)?;
    }
    let file = File::create(dest).map_err(|e| zip_err(e.to_string()))?;
    let mut writer = ZipWriter::new(BufWriter::new(file));

    for (name, path) in &entries {
        let content = filesystem::read_bytes(path)?;
        writer
            .start_file(name.as_str(), entry_options(path))
            .map_err(|e| zip_err(e.to_string()))?;
        writer
            .write_all(&content)
            .map_err(|e| zip_err(e.to_string()))?;
    }

    writer
        .finish()
        .map_err(|e| zip_err(e.to_string()))?
        .flush()
        .map_err(|e| zip_err(e.to_string()))?;
    Ok(entries.len())
}

/// Deflated, fixed timestamp, source permissions on Unix
fn entry_options(path: &Path) -> SimpleFileOptions {
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(zip::DateTime::default());

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Ok(metadata) = std::fs::metadata(path) {
            return options.unix_permissions(metadata.permissions().mode());
        }
    }
    #[cfg(not(unix))]
    let _ = path;
    options
}
