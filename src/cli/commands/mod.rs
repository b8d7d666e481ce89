//! CLI command implementations
//!
//! Each action is implemented in its own submodule.

pub mod build;
pub mod check;
pub mod init;

use crate::cli::Cli;
use crate::core::builder::BuildOptions;
use crate::core::hooks::DisabledHooks;

/// Build options from the command line
pub fn build_options(cli: &Cli) -> BuildOptions {
    let disabled: Vec<&str> = cli.disabled_hooks.iter().map(|h| h.as_str()).collect();
    BuildOptions {
        project_dir: cli.directory.clone(),
        config_path: cli.config.clone(),
        targets: cli.targets.clone(),
        version_name: cli.version_name.clone(),
        force: cli.force,
        resume: cli.resume,
        disabled_hooks: DisabledHooks::new(&disabled),
        jobs: cli.jobs(),
        check: cli.check,
    }
}
