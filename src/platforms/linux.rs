//! Linux AppImage target
//!
//! A LÖVE AppImage is extracted, the game is fused into (or copied next to)
//! the runtime, the desktop entry and icon are replaced, and the AppDir is
//! repacked with `appimagetool`.

use std::path::{Path, PathBuf};

use futures::future::BoxFuture;
use futures::FutureExt;

use crate::config::urls;
use crate::core::version::parse_love_version;
use crate::error::TargetError;
use crate::infra::{filesystem, process};
use crate::platforms::{cached_download, BuildContext, TargetBuilder};

/// Directory created by `--appimage-extract`
const EXTRACTED_DIR: &str = "squashfs-root";

/// Icon formats the desktop entry can reference directly
const ICON_EXTENSIONS: &[&str] = &["png", "svg", "svgz", "xpm"];

/// Oldest LÖVE release with an official AppImage
const FIRST_OFFICIAL_APPIMAGE: (u32, u32) = (11, 4);

/// Builder for `appimage`
#[derive(Debug, Clone, Copy, Default)]
pub struct AppImageBuilder;

impl TargetBuilder for AppImageBuilder {
    fn build<'a>(&'a self, ctx: &'a BuildContext<'a>) -> BoxFuture<'a, Result<(), TargetError>> {
        build_appimage(ctx).boxed()
    }
}

/// How the runtime inside the AppDir starts the game
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AppDirLayout {
    /// Legacy images: `usr/bin/wrapper-love` picks up a `.love` next to it
    Wrapper,
    /// Official images: `bin/love` is fused with the game
    Fused,
}

async fn build_appimage(ctx: &BuildContext<'_>) -> Result<(), TargetError> {
    ctx.target.check_host()?;

    let source = source_appimage(ctx).await?;
    filesystem::set_executable(&source)?;

    tracing::info!("Extracting source AppImage '{}'", source.display());
    process::run_tool(source.as_os_str(), ["--appimage-extract"], Some(ctx.target_dir))
        .await
        .map_err(|e| ctx.tool_err("appimage-extract", e))?;

    let appdir = ctx.target_dir.join(EXTRACTED_DIR);
    let game_name = game_name(ctx.name);

    let desktop_exec = match detect_layout(&appdir) {
        Some(AppDirLayout::Wrapper) => {
            let bin = appdir.join("usr/bin");
            tracing::info!("Copying {} to {}", ctx.love_file.display(), bin.display());
            let file_name = ctx.love_file.file_name().unwrap_or_default();
            filesystem::copy_file(ctx.love_file, &bin.join(file_name))?;
            "wrapper-love %F".to_string()
        }
        Some(AppDirLayout::Fused) => {
            let love = appdir.join("bin/love");
            let fused = appdir.join("bin").join(&game_name);
            tracing::info!("Fusing {} and {} into {}", love.display(), ctx.love_file.display(), fused.display());
            filesystem::concat_files(&fused, &[&love, ctx.love_file])?;
            filesystem::set_executable(&fused)?;
            filesystem::remove_path(&love)?;
            format!("{game_name} %f")
        }
        None => {
            return Err(ctx.bad_runtime(
                "Could not find love executable in AppDir. The AppImage has an unknown format.",
            ))
        }
    };

    let icon = install_icon(ctx, &appdir, &game_name)?;
    // appimagetool links the icon to .DirIcon itself
    filesystem::remove_path(&appdir.join(".DirIcon"))?;

    filesystem::remove_path(&appdir.join("love.desktop"))?;
    let desktop_entry = desktop_entry(ctx, &desktop_exec, icon.as_deref().unwrap_or("love"));
    filesystem::write_file(&appdir.join(format!("{game_name}.desktop")), desktop_entry)?;

    let libraries = ctx.config.section_list(ctx.target.as_str(), "shared_libraries");
    if !libraries.is_empty() {
        let lib_dir = ["usr/lib", "lib"]
            .iter()
            .map(|dir| appdir.join(dir))
            .find(|dir| dir.join("liblove.so").is_file())
            .ok_or_else(|| {
                ctx.bad_runtime(
                    "Could not find liblove.so in AppDir. The AppImage has an unknown format.",
                )
            })?;
        for library in libraries {
            let library = ctx.require_file(ctx.project_path(library))?;
            if let Some(file_name) = library.file_name() {
                filesystem::copy_file(&library, &lib_dir.join(file_name))?;
            }
        }
    }

    if ctx.config.should_build_artifact(ctx.target, "appimage", true) {
        let appimagetool = appimagetool(ctx).await?;
        let output = ctx.target_dir.join(format!("{game_name}.AppImage"));
        tracing::info!("Creating new AppImage");
        process::run_tool(
            appimagetool.as_os_str(),
            [appdir.as_os_str(), output.as_os_str()],
            None,
        )
        .await
        .map_err(|e| ctx.tool_err("appimagetool", e))?;
        tracing::info!("Created {}", output.display());
    }

    if ctx.config.should_build_artifact(ctx.target, "appdir", false) {
        let dest = ctx.target_dir.join("AppDir");
        filesystem::rename(&appdir, &dest)?;
    } else {
        tracing::info!("Removing AppDir");
        filesystem::remove_dir_all(&appdir)?;
    }

    Ok(())
}

/// Configured `source_appimage`, or the official AppImage from the cache
async fn source_appimage(ctx: &BuildContext<'_>) -> Result<PathBuf, TargetError> {
    if let Some(source) = ctx.config.section_str(ctx.target.as_str(), "source_appimage") {
        return ctx.require_file(ctx.project_path(source));
    }

    let parsed = parse_love_version(ctx.love_version).map_err(|e| ctx.bad_runtime(e.to_string()))?;
    if parsed < FIRST_OFFICIAL_APPIMAGE {
        return Err(ctx.bad_runtime(format!(
            "There is no official AppImage for LÖVE {}. Set 'appimage.source_appimage' to build this version",
            ctx.love_version
        )));
    }

    let dest = ctx.runtime_cache_dir().join("love.AppImage");
    cached_download(ctx, &urls::love_appimage(ctx.love_version), &dest).await?;
    Ok(dest)
}

fn detect_layout(appdir: &Path) -> Option<AppDirLayout> {
    if appdir.join("usr/bin/wrapper-love").is_file() {
        Some(AppDirLayout::Wrapper)
    } else if appdir.join("bin/love").is_file() {
        Some(AppDirLayout::Fused)
    } else {
        None
    }
}

/// Project name without whitespace
///
/// Spaces break the AppImage runtime and the `Exec`/`Icon` desktop fields.
pub fn game_name(name: &str) -> String {
    if !name.contains(' ') {
        return name.to_string();
    }
    tracing::warn!("Stripping whitespace from game name '{name}' for the AppImage");
    name.replace(' ', "")
}

/// Copy `icon_file` into the AppDir; returns the icon name for the desktop entry
fn install_icon(
    ctx: &BuildContext<'_>,
    appdir: &Path,
    game_name: &str,
) -> Result<Option<String>, TargetError> {
    let Some(icon_file) = ctx.config.get_str("icon_file") else {
        return Ok(None);
    };
    let icon = ctx.require_file(ctx.project_path(icon_file))?;
    let extension = icon
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    if !ICON_EXTENSIONS.contains(&extension.as_str()) {
        tracing::warn!(
            "Icon '{}' must be one of {} for AppImages. Keeping the default icon",
            icon.display(),
            ICON_EXTENSIONS.join(", ")
        );
        return Ok(None);
    }

    filesystem::remove_path(&appdir.join("love.svg"))?;
    let dest = appdir.join(format!("{game_name}.{extension}"));
    tracing::info!("Copying {} to {}", icon.display(), dest.display());
    filesystem::copy_file(&icon, &dest)?;
    Ok(Some(game_name.to_string()))
}

/// `[Desktop Entry]` contents, with `linux.desktop_file_metadata` applied
pub fn desktop_entry(ctx: &BuildContext<'_>, exec: &str, icon: &str) -> String {
    let mut fields: Vec<(String, String)> = [
        ("Type", "Application"),
        ("Name", ctx.name),
        ("Exec", exec),
        ("Categories", "Game;"),
        ("Terminal", "false"),
        ("Icon", icon),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();

    for (key, value) in ctx.config.section_map("linux", "desktop_file_metadata") {
        match fields.iter_mut().find(|(k, _)| *k == key) {
            Some(field) => field.1 = value,
            None => fields.push((key, value)),
        }
    }

    let mut entry = String::from("[Desktop Entry]\n");
    for (key, value) in fields {
        entry.push_str(&format!("{key}={value}\n"));
    }
    entry
}

/// appimagetool from PATH, the cache, or a fresh download
async fn appimagetool(ctx: &BuildContext<'_>) -> Result<PathBuf, TargetError> {
    if let Ok(path) = which::which("appimagetool") {
        return Ok(path);
    }
    let path = ctx.cache.tools_dir().join("appimagetool");
    cached_download(ctx, urls::APPIMAGETOOL, &path).await?;
    filesystem::set_executable(&path)?;
    Ok(path)
}
