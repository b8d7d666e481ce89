//! Windows targets (win32, win64)
//!
//! The game executable is `love.exe` with the asset archive appended. It is
//! shipped together with the runtime DLLs, the license and any extra files,
//! as a zip archive and/or a plain directory.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

use futures::future::BoxFuture;
use futures::FutureExt;

use crate::config::urls;
use crate::core::archive::zip_directory;
use crate::error::TargetError;
use crate::error::FilesystemError;
use crate::infra::{filesystem, process};
use crate::platforms::{BuildContext, TargetBuilder};

/// Staging directory inside the target directory
const ARCHIVE_TEMP: &str = "archive_temp";

/// Builder for `win32` and `win64`
#[derive(Debug, Clone, Copy, Default)]
pub struct WindowsBuilder;

impl TargetBuilder for WindowsBuilder {
    fn build<'a>(&'a self, ctx: &'a BuildContext<'a>) -> BoxFuture<'a, Result<(), TargetError>> {
        build_windows(ctx).boxed()
    }
}

async fn build_windows(ctx: &BuildContext<'_>) -> Result<(), TargetError> {
    let love_binaries = love_binaries(ctx).await?;
    let love_exe = ctx.require_file(love_binaries.join("love.exe"))?;

    let staging = ctx.target_dir.join(ARCHIVE_TEMP);
    filesystem::create_dir_all(&staging)?;

    let exe_name = format!("{}.exe", ctx.name);
    let runtime_exe = match rcedit_command() {
        Some(rcedit) => {
            let patched = ctx.target_dir.join("love-metadata.exe");
            filesystem::copy_file(&love_exe, &patched)?;
            set_exe_metadata(ctx, &rcedit, &patched, &exe_name).await?;
            patched
        }
        None => {
            tracing::warn!(
                "Cannot set exe metadata: rcedit ({}) was not found on PATH{}",
                urls::RCEDIT,
                if cfg!(windows) { "" } else { " or wine is not installed" }
            );
            love_exe
        }
    };

    tracing::info!("Fusing {} and {}", runtime_exe.display(), ctx.love_file.display());
    filesystem::concat_files(&staging.join(&exe_name), &[&runtime_exe, ctx.love_file])?;
    if runtime_exe.starts_with(ctx.target_dir) {
        filesystem::remove_path(&runtime_exe)?;
    }

    let license = match ctx.config.get_str("license") {
        Some(license) => ctx.require_file(ctx.project_path(license))?,
        None => ctx.require_file(love_binaries.join("license.txt"))?,
    };
    filesystem::copy_file(&license, &staging.join("license.txt"))?;

    for dll in dlls(&love_binaries)? {
        if let Some(file_name) = dll.file_name() {
            filesystem::copy_file(&dll, &staging.join(file_name))?;
        }
    }

    for (src, dest) in archive_files(ctx) {
        let src_path = ctx.project_path(&src);
        let dest_path = staging.join(&dest);
        if src_path.is_file() {
            filesystem::copy_file(&src_path, &dest_path)?;
        } else if src_path.is_dir() {
            filesystem::copy_dir_all(&src_path, &dest_path)?;
        } else {
            return Err(TargetError::MissingFile {
                target: ctx.target.to_string(),
                path: src_path,
            });
        }
    }

    for library in ctx.config.section_list(ctx.target.as_str(), "shared_libraries") {
        let library = ctx.require_file(ctx.project_path(library))?;
        if let Some(file_name) = library.file_name() {
            filesystem::copy_file(&library, &staging.join(file_name))?;
        }
    }

    if ctx.config.should_build_artifact(ctx.target, "archive", true) {
        let archive = ctx
            .target_dir
            .join(format!("{}-{}.zip", ctx.name, ctx.target));
        zip_directory(&staging, &archive).map_err(|e| ctx.zip_err(&archive, e))?;
        tracing::info!("Created {}", archive.display());
    }

    if ctx.config.should_build_artifact(ctx.target, "directory", false) {
        let directory = ctx.target_dir.join(ctx.name);
        filesystem::rename(&staging, &directory)?;
    } else {
        filesystem::remove_dir_all(&staging)?;
    }

    Ok(())
}

/// Configured runtime directory, or the cached download
async fn love_binaries(ctx: &BuildContext<'_>) -> Result<PathBuf, TargetError> {
    if let Some(dir) = ctx.configured_binaries() {
        return Ok(dir);
    }

    let dir = ctx.runtime_cache_dir();
    if dir.join("love.exe").is_file() {
        tracing::info!("LÖVE binaries already present in '{}'", dir.display());
        return Ok(dir);
    }

    tracing::info!("Downloading LÖVE binaries to '{}'", dir.display());
    let url = urls::love_zip(ctx.love_version, ctx.target.as_str());
    ctx.downloads
        .download_and_unpack(&url, &dir)
        .await
        .map_err(|source| TargetError::Download {
            target: ctx.target.to_string(),
            source,
        })?;
    Ok(dir)
}

/// DLLs shipped with the runtime, sorted by name
fn dlls(love_binaries: &Path) -> Result<Vec<PathBuf>, TargetError> {
    let entries = std::fs::read_dir(love_binaries).map_err(|e| {
        TargetError::Filesystem(FilesystemError::ReadFile {
            path: love_binaries.to_path_buf(),
            error: e.to_string(),
        })
    })?;

    let mut dlls: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| {
            p.is_file()
                && p.extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("dll"))
        })
        .collect();
    dlls.sort();
    Ok(dlls)
}

/// Top-level `archive_files` overridden by `windows.archive_files`
fn archive_files(ctx: &BuildContext<'_>) -> Vec<(String, String)> {
    let mut files = ctx.config.archive_files();
    for (src, dest) in ctx.config.section_map("windows", "archive_files") {
        match files.iter_mut().find(|(s, _)| *s == src) {
            Some(entry) => entry.1 = dest,
            None => files.push((src, dest)),
        }
    }
    files
}

/// Version strings written into the executable
///
/// Unset fields default to the project name and version.
pub fn exe_metadata(ctx: &BuildContext<'_>, exe_name: &str) -> Vec<(String, String)> {
    let mut metadata = ctx.config.section_map("windows", "exe_metadata");
    let mut set_default = |key: &str, value: String| {
        if !metadata.iter().any(|(k, _)| k == key) {
            metadata.push((key.to_string(), value));
        }
    };

    let file_version = ctx.version.unwrap_or("").to_string();
    set_default(
        "FileDescription",
        match ctx.version {
            Some(version) => format!("{} {version}", ctx.name),
            None => ctx.name.to_string(),
        },
    );
    set_default("FileVersion", file_version.clone());
    set_default("CompanyName", String::new());
    set_default("LegalCopyright", String::new());
    set_default("ProductName", ctx.name.to_string());
    set_default("OriginalFilename", exe_name.to_string());

    let product_version = metadata
        .iter()
        .find(|(k, _)| k == "FileVersion")
        .map_or(file_version, |(_, v)| v.clone());
    if !metadata.iter().any(|(k, _)| k == "ProductVersion") {
        metadata.push(("ProductVersion".to_string(), product_version));
    }
    metadata
}

/// rcedit invocation prefix, if rcedit can run on this host
fn rcedit_command() -> Option<Vec<OsString>> {
    let rcedit = which::which("rcedit-x64.exe")
        .or_else(|_| which::which("rcedit"))
        .ok()?;
    if cfg!(windows) {
        return Some(vec![rcedit.into_os_string()]);
    }
    let wine = which::which("wine").ok()?;
    Some(vec![wine.into_os_string(), rcedit.into_os_string()])
}

async fn set_exe_metadata(
    ctx: &BuildContext<'_>,
    rcedit: &[OsString],
    exe: &Path,
    exe_name: &str,
) -> Result<(), TargetError> {
    let Some((program, prefix)) = rcedit.split_first() else {
        return Ok(());
    };

    let mut args: Vec<OsString> = prefix.to_vec();
    args.push(exe.as_os_str().to_owned());
    for (key, value) in exe_metadata(ctx, exe_name) {
        args.push("--set-version-string".into());
        args.push(key.into());
        args.push(value.into());
    }

    if let Some(icon) = ctx.config.get_str("icon_file") {
        let icon = ctx.require_file(ctx.project_path(icon))?;
        if icon
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case(OsStr::new("ico")))
        {
            args.push("--set-icon".into());
            args.push(icon.into_os_string());
        } else {
            tracing::warn!(
                "Icon '{}' is not an .ico file and is not embedded in the executable",
                icon.display()
            );
        }
    }

    process::run_tool(program, &args, None)
        .await
        .map(|_| ())
        .map_err(|e| ctx.tool_err("rcedit", e))
}
