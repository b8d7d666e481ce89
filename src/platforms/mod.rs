//! Target builders
//!
//! Every target turns the asset archive into distributable artifacts inside
//! its own output directory. Builders only see a [`BuildContext`]; they never
//! touch the build log or other targets' directories.

pub mod linux;
pub mod lovejs;
pub mod macos;
pub mod windows;

use std::path::{Path, PathBuf};

use futures::future::BoxFuture;

use crate::core::config::Config;
use crate::core::target::Target;
use crate::error::TargetError;
use crate::infra::dirs::CacheDirs;
use crate::infra::download::DownloadManager;

/// Everything a target builder gets to work with
#[derive(Debug, Clone, Copy)]
pub struct BuildContext<'a> {
    /// Resolved configuration
    pub config: &'a Config,
    /// Project name
    pub name: &'a str,
    /// LÖVE runtime version
    pub love_version: &'a str,
    /// Version name of a versioned build
    pub version: Option<&'a str>,
    /// Target being built
    pub target: Target,
    /// Empty output directory of the target
    pub target_dir: &'a Path,
    /// The asset archive
    pub love_file: &'a Path,
    /// Relative config paths are resolved against this directory
    pub project_dir: &'a Path,
    /// Runtime cache
    pub cache: &'a CacheDirs,
    /// Runtime downloads
    pub downloads: &'a DownloadManager,
}

impl BuildContext<'_> {
    /// A config path resolved against the project directory
    pub fn project_path(&self, path: &str) -> PathBuf {
        self.project_dir.join(path)
    }

    /// `love_binaries` configured for this target, resolved
    pub fn configured_binaries(&self) -> Option<PathBuf> {
        self.config
            .section_str(self.target.as_str(), "love_binaries")
            .map(|p| self.project_path(p))
    }

    /// Cache directory for this target's runtime
    pub fn runtime_cache_dir(&self) -> PathBuf {
        self.cache.runtime_dir(self.love_version, self.target.as_str())
    }

    /// A required input file, or [`TargetError::MissingFile`]
    pub fn require_file(&self, path: PathBuf) -> Result<PathBuf, TargetError> {
        if path.is_file() {
            Ok(path)
        } else {
            Err(TargetError::MissingFile {
                target: self.target.to_string(),
                path,
            })
        }
    }

    /// Failure of an external tool
    pub fn tool_err(&self, tool: &str, error: impl ToString) -> TargetError {
        TargetError::Tool {
            target: self.target.to_string(),
            tool: tool.to_string(),
            error: error.to_string(),
        }
    }

    /// Failure reading or writing a zip archive
    pub fn zip_err(&self, path: &Path, error: impl ToString) -> TargetError {
        TargetError::Zip {
            target: self.target.to_string(),
            path: path.to_path_buf(),
            error: error.to_string(),
        }
    }

    /// Runtime with an unexpected layout
    pub fn bad_runtime(&self, message: impl Into<String>) -> TargetError {
        TargetError::BadRuntime {
            target: self.target.to_string(),
            message: message.into(),
        }
    }
}

/// Builds one target
///
/// Returns a boxed future so builders can be picked at runtime.
pub trait TargetBuilder: Send + Sync {
    /// Produce the target's artifacts in `ctx.target_dir`
    fn build<'a>(&'a self, ctx: &'a BuildContext<'a>) -> BoxFuture<'a, Result<(), TargetError>>;
}

/// Picks the builder of a target
pub type BuilderFactory = fn(Target) -> Box<dyn TargetBuilder>;

/// The builder shipped for each target
pub fn builder_for(target: Target) -> Box<dyn TargetBuilder> {
    match target {
        Target::Win32 | Target::Win64 => Box::new(windows::WindowsBuilder),
        Target::AppImage => Box::new(linux::AppImageBuilder),
        Target::MacOs => Box::new(macos::MacOsBuilder),
        Target::LoveJs => Box::new(lovejs::LoveJsBuilder),
    }
}

/// Fetch a single runtime file into the cache unless it is already there
pub(crate) async fn cached_download(
    ctx: &BuildContext<'_>,
    url: &str,
    dest: &Path,
) -> Result<(), TargetError> {
    if dest.is_file() {
        tracing::info!("LÖVE binaries already present in '{}'", dest.display());
        return Ok(());
    }
    tracing::info!("Downloading LÖVE binaries to '{}'", dest.display());
    ctx.downloads
        .download(url, dest)
        .await
        .map(|_| ())
        .map_err(|source| TargetError::Download {
            target: ctx.target.to_string(),
            source,
        })
}

/// `love.zip` of the configured runtime, or the cached download of `url`
pub(crate) async fn runtime_zip(ctx: &BuildContext<'_>, url: &str) -> Result<PathBuf, TargetError> {
    if let Some(dir) = ctx.configured_binaries() {
        return ctx.require_file(dir.join("love.zip"));
    }
    let dest = ctx.runtime_cache_dir().join("love.zip");
    cached_download(ctx, url, &dest).await?;
    Ok(dest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_paths() {
        let config = Config::from_toml(
            "[win64]\nlove_binaries = \"bin/love-win64\"",
            Path::new("makelove.toml"),
        )
        .unwrap();
        let cache = CacheDirs::with_root(PathBuf::from("/cache"));
        let downloads = DownloadManager::new();
        let ctx = BuildContext {
            config: &config,
            name: "game",
            love_version: "11.5",
            version: None,
            target: Target::Win64,
            target_dir: Path::new("/build/win64"),
            love_file: Path::new("/build/love/game.love"),
            project_dir: Path::new("/project"),
            cache: &cache,
            downloads: &downloads,
        };

        assert_eq!(
            ctx.configured_binaries(),
            Some(PathBuf::from("/project/bin/love-win64"))
        );
        assert_eq!(ctx.runtime_cache_dir(), PathBuf::from("/cache/11.5/win64"));
        assert!(matches!(
            ctx.require_file(PathBuf::from("/does/not/exist")),
            Err(TargetError::MissingFile { .. })
        ));
    }
}
