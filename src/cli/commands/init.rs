//! Init command implementation
//!
//! `makelove --init` asks a few questions and writes `makelove.toml`.

use std::path::Path;

use anyhow::{Context, Result};

use crate::cli::output::{print_detail, print_success};
use crate::core::init::{ask, validate_init, write_config};

/// Execute the configuration assistant
pub async fn execute(project_dir: &Path) -> Result<()> {
    validate_init(project_dir)?;

    let stdin = std::io::stdin();
    let answers = ask(project_dir, &mut stdin.lock(), &mut std::io::stdout())
        .with_context(|| "Failed to read answers")?;

    let path = write_config(project_dir, &answers)?;
    print_success(&format!("Configuration written to {}", path.display()));
    print_detail("You should probably adjust love_files before you build.");
    Ok(())
}
