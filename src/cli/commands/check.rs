//! Check command implementation
//!
//! `makelove --check` loads and validates the configuration, then exits.

use anyhow::{Context, Result};

use crate::cli::commands::build_options;
use crate::cli::output::{create_spinner, print_detail, print_success};
use crate::cli::Cli;
use crate::core::builder::{BuildOutcome, Builder};

/// Execute the check
pub async fn execute(cli: &Cli) -> Result<()> {
    let options = build_options(cli);

    let spinner = create_spinner("Checking configuration...");
    let outcome = Builder::new().run(&options).await;
    spinner.finish_and_clear();

    if let BuildOutcome::Checked { config, version } =
        outcome.with_context(|| "Configuration check failed")?
    {
        print_success("Configuration is valid");
        if let Ok(name) = config.name() {
            print_detail(&format!("Project: {name}"));
        }
        if let Ok(love_version) = config.love_version() {
            print_detail(&format!("LÖVE version: {love_version}"));
        }
        if let Some(version) = version {
            print_detail(&format!("Version: {version}"));
        }
        print_detail("Exiting because --check was passed");
    }
    Ok(())
}
