//! Lifecycle hooks
//!
//! A hook is a shell command run before (`prebuild`) or after (`postbuild`)
//! the build. It receives the current configuration in a temporary TOML file
//! and may rewrite that file; whatever it leaves there becomes the new
//! configuration once it exits successfully.
//!
//! Hooks see these environment variables:
//!
//! - `MAKELOVE_TEMP_CONFIG`: path of the temporary config file
//! - `MAKELOVE_VERSION`: version name, empty for unversioned builds
//! - `MAKELOVE_TARGETS`: comma-separated targets
//! - `MAKELOVE_BUILD_DIRECTORY`: directory of this build
//!
//! `{version}` and `{build_directory}` in the command are replaced as well.

use std::path::Path;

use crate::config::defaults::{
    ENV_BUILD_DIRECTORY, ENV_TARGETS, ENV_TEMP_CONFIG, ENV_VERSION, HOOK_NAMES,
};
use crate::core::config::Config;
use crate::core::resolver;
use crate::core::target::{join_targets, Target};
use crate::error::HookError;
use crate::infra::process;

/// Build metadata handed to hooks
#[derive(Debug, Clone, Copy)]
pub struct HookContext<'a> {
    /// Working directory of hook commands
    pub project_dir: &'a Path,
    /// Version name of a versioned build
    pub version: Option<&'a str>,
    /// Targets being built
    pub targets: &'a [Target],
    /// Directory of this build
    pub build_directory: &'a Path,
}

/// Hooks disabled on the command line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisabledHooks(Vec<String>);

impl DisabledHooks {
    /// From `--disable-hook` values; `all` disables every hook
    pub fn new<S: AsRef<str>>(names: &[S]) -> Self {
        if names.iter().any(|n| n.as_ref() == "all") {
            return Self(HOOK_NAMES.iter().map(|h| (*h).to_string()).collect());
        }
        Self(names.iter().map(|n| n.as_ref().to_string()).collect())
    }

    /// Whether the named hook is disabled
    pub fn contains(&self, hook: &str) -> bool {
        self.0.iter().any(|h| h == hook)
    }
}

/// Replace `{version}` and `{build_directory}` in a command
pub fn expand_placeholders(command: &str, version: Option<&str>, build_directory: &Path) -> String {
    command
        .replace("{version}", version.unwrap_or(""))
        .replace("{build_directory}", &build_directory.display().to_string())
}

/// Run every command registered for `hook`, threading the config through
///
/// Each command sees the configuration produced by the previous one.
pub async fn run_hooks(
    hook: &str,
    mut config: Config,
    ctx: &HookContext<'_>,
) -> Result<Config, HookError> {
    for command in config.hook_commands(hook) {
        tracing::info!("Running {hook} hook '{command}'");
        config = run_hook(&command, &config, ctx).await?;
    }
    Ok(config)
}

/// Run a single hook command and return the configuration it leaves behind
///
/// The temporary config file is removed on every path.
pub async fn run_hook(
    command: &str,
    config: &Config,
    ctx: &HookContext<'_>,
) -> Result<Config, HookError> {
    let temp_err = |error: String| HookError::TempFile {
        command: command.to_string(),
        error,
    };

    let content = config.to_toml().map_err(|e| temp_err(e.to_string()))?;
    let temp_config = tempfile::Builder::new()
        .prefix("makelove-")
        .suffix(".toml")
        .tempfile()
        .map_err(|e| temp_err(e.to_string()))?
        .into_temp_path();
    std::fs::write(&temp_config, content).map_err(|e| temp_err(e.to_string()))?;

    let expanded = expand_placeholders(command, ctx.version, ctx.build_directory);
    let status = process::shell(&expanded)
        .current_dir(ctx.project_dir)
        .env(ENV_TEMP_CONFIG, temp_config.as_os_str())
        .env(ENV_VERSION, ctx.version.unwrap_or(""))
        .env(ENV_TARGETS, join_targets(ctx.targets))
        .env(ENV_BUILD_DIRECTORY, ctx.build_directory.as_os_str())
        .status()
        .await
        .map_err(|e| HookError::Spawn {
            command: expanded.clone(),
            error: e.to_string(),
        })?;

    if !status.success() {
        return Err(HookError::Failed {
            command: expanded,
            status: status.to_string(),
        });
    }

    resolver::reload(&temp_config, ctx.project_dir).map_err(|source| HookError::InvalidConfig {
        command: expanded,
        source,
    })
}
