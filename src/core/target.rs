//! Build targets
//!
//! The fixed set of platforms makelove can package for.

use std::fmt;
use std::str::FromStr;

use crate::error::TargetError;

/// A packaging target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Target {
    /// 32-bit Windows zip/directory
    Win32,
    /// 64-bit Windows zip/directory
    Win64,
    /// Linux AppImage
    AppImage,
    /// macOS application bundle
    MacOs,
    /// Web build using love.js
    LoveJs,
}

impl Target {
    /// Every target, in canonical order
    pub const ALL: [Target; 5] = [
        Self::Win32,
        Self::Win64,
        Self::AppImage,
        Self::MacOs,
        Self::LoveJs,
    ];

    /// Name used on the command line, in the config and for output directories
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Win32 => "win32",
            Self::Win64 => "win64",
            Self::AppImage => "appimage",
            Self::MacOs => "macos",
            Self::LoveJs => "lovejs",
        }
    }

    /// All target names
    pub fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(|t| t.as_str()).collect()
    }

    /// Targets built when the config does not name any
    ///
    /// AppImages can only be assembled on Linux hosts.
    pub fn defaults() -> Vec<Target> {
        let mut targets = vec![Self::Win32, Self::Win64];
        if cfg!(target_os = "linux") {
            targets.push(Self::AppImage);
        }
        targets
    }

    /// Check whether this target can be built on the current host
    pub fn check_host(self) -> Result<(), TargetError> {
        if self == Self::AppImage && !cfg!(target_os = "linux") {
            return Err(TargetError::UnsupportedHost(
                "Currently AppImages can only be built on Linux and WSL2!".to_string(),
            ));
        }
        Ok(())
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Target {
    type Err = TargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| TargetError::Unknown {
                name: s.to_string(),
            })
    }
}

/// Remove duplicate targets, keeping the first occurrence of each
pub fn unique_targets(targets: &[Target]) -> Vec<Target> {
    let mut unique = Vec::with_capacity(targets.len());
    for target in targets {
        if !unique.contains(target) {
            unique.push(*target);
        }
    }
    unique
}

/// Comma-joined target names
pub fn join_targets(targets: &[Target]) -> String {
    targets
        .iter()
        .map(|t| t.as_str())
        .collect::<Vec<_>>()
        .join(",")
}
