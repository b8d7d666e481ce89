//! Cache directory management
//!
//! Downloaded LÖVE runtimes and helper tools live in the platform cache
//! directory (`$XDG_CACHE_HOME/makelove`, `~/Library/Caches/makelove`, ...).
//! The `MAKELOVE_CACHE_DIR` environment variable overrides the location.

use std::env;
use std::path::PathBuf;

use crate::config::defaults::ENV_CACHE_DIR;

/// Application name used in directory paths
const APP_NAME: &str = "makelove";

/// Subdirectory for downloaded helper tools
const TOOLS_SUBDIR: &str = "tools";

/// Cache directory provider
#[derive(Debug, Clone)]
pub struct CacheDirs {
    cache_dir: PathBuf,
}

impl CacheDirs {
    /// Resolve the cache directory from the environment or platform default
    #[must_use]
    pub fn new() -> Self {
        Self {
            cache_dir: Self::resolve_cache_dir(),
        }
    }

    /// Use an explicit cache directory
    #[must_use]
    pub fn with_root(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    /// Root of the cache
    #[must_use]
    pub fn cache_dir(&self) -> PathBuf {
        self.cache_dir.clone()
    }

    /// Where the runtime of a LÖVE version for one platform is unpacked
    ///
    /// `<cache>/<love_version>/<platform>`
    #[must_use]
    pub fn runtime_dir(&self, love_version: &str, platform: &str) -> PathBuf {
        self.cache_dir.join(love_version).join(platform)
    }

    /// Where downloaded helper tools (appimagetool, rcedit) are kept
    #[must_use]
    pub fn tools_dir(&self) -> PathBuf {
        self.cache_dir.join(TOOLS_SUBDIR)
    }

    fn resolve_cache_dir() -> PathBuf {
        if let Ok(path) = env::var(ENV_CACHE_DIR) {
            return PathBuf::from(path);
        }

        dirs::cache_dir()
            .map(|p| p.join(APP_NAME))
            .unwrap_or_else(|| {
                dirs::home_dir()
                    .map(|h| h.join(".cache").join(APP_NAME))
                    .unwrap_or_else(|| PathBuf::from(".").join(".cache").join(APP_NAME))
            })
    }
}

impl Default for CacheDirs {
    fn default() -> Self {
        Self::new()
    }
}
