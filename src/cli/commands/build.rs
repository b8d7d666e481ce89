//! Build command implementation
//!
//! The default action: `makelove [TARGETS]...`

use anyhow::{Context, Result};

use crate::cli::commands::build_options;
use crate::cli::output::{print_detail, print_success};
use crate::cli::Cli;
use crate::core::builder::{BuildOutcome, Builder};
use crate::core::target::join_targets;

/// Execute a build
pub async fn execute(cli: &Cli) -> Result<()> {
    let options = build_options(cli);

    let outcome = Builder::new()
        .run(&options)
        .await
        .with_context(|| format!("Build in '{}' failed", options.project_dir.display()))?;

    if let BuildOutcome::Built(report) = outcome {
        match &report.version {
            Some(version) => print_success(&format!("Built version '{version}'")),
            None => print_success("Build complete"),
        }
        print_detail(&format!("Targets: {}", join_targets(&report.targets)));
        print_detail(&format!("Output: {}", report.build_dir.display()));
        print_detail(&format!("Game archive: {}", report.love_file.display()));
    }
    Ok(())
}
