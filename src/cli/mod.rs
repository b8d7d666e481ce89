//! Command-line interface
//!
//! Argument parsing and output formatting only. The work happens in
//! [`crate::core`].

pub mod commands;
pub mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgAction, Parser, ValueEnum};

use crate::core::target::Target;

/// Version string shown by `--version`
const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("VERGEN_GIT_SHA"),
    ", built ",
    env!("VERGEN_BUILD_DATE"),
    ")"
);

/// makelove - package LÖVE games for Windows, Linux, macOS and the web
#[derive(Parser, Debug)]
#[command(name = "makelove")]
#[command(author, version, long_version = LONG_VERSION, about, long_about = None)]
pub struct Cli {
    /// Start an assistant to create a new configuration
    #[arg(long)]
    pub init: bool,

    /// Config file to use instead of 'makelove.toml' in the project directory
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Do not run a hook (repeatable)
    #[arg(short = 'd', long = "disable-hook", value_enum, action = ArgAction::Append)]
    pub disabled_hooks: Vec<HookName>,

    /// Overwrite targets of an already built version
    #[arg(long, visible_alias = "stomp")]
    pub force: bool,

    /// Keep targets of a previous unversioned build instead of rebuilding them
    #[arg(long)]
    pub resume: bool,

    /// Display more information (files included in the .love archive)
    #[arg(short, long)]
    pub verbose: bool,

    /// Name of the version to build
    #[arg(short = 'n', long = "version-name", value_name = "NAME")]
    pub version_name: Option<String>,

    /// Only load and check the configuration, then exit
    #[arg(long)]
    pub check: bool,

    /// Number of targets built at the same time (0 = number of CPUs)
    #[arg(short, long, default_value_t = 1)]
    pub jobs: usize,

    /// Project directory
    #[arg(short = 'C', long = "directory", value_name = "DIR", default_value = ".")]
    pub directory: PathBuf,

    /// Targets to build (default: 'default_targets' from the config)
    #[arg(value_parser = parse_target)]
    pub targets: Vec<Target>,
}

/// Hook names accepted by `--disable-hook`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum HookName {
    /// Hooks run before the asset archive is built
    Prebuild,
    /// Hooks run after every target was built
    Postbuild,
    /// Every hook
    All,
}

impl HookName {
    /// Name as used in the config
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Prebuild => "prebuild",
            Self::Postbuild => "postbuild",
            Self::All => "all",
        }
    }
}

fn parse_target(value: &str) -> Result<Target, String> {
    value.parse().map_err(|e: crate::error::TargetError| e.to_string())
}

impl Cli {
    /// Number of parallel target builds, resolving `0`
    pub fn jobs(&self) -> usize {
        if self.jobs == 0 {
            num_cpus::get()
        } else {
            self.jobs
        }
    }

    /// Execute the requested action
    pub async fn run(self) -> Result<()> {
        if self.init {
            commands::init::execute(&self.directory).await
        } else if self.check {
            commands::check::execute(&self).await
        } else {
            commands::build::execute(&self).await
        }
    }
}
