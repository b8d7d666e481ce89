//! Core business logic
//!
//! # Submodules
//!
//! - [`schema`] - Schema nodes and validation
//! - [`config`] - The configuration model and its schema
//! - [`resolver`] - Loading, defaulting and validating the configuration
//! - [`filelist`] - Selecting the files of the asset archive
//! - [`archive`] - Building the asset archive
//! - [`build_dir`] - Build directory lifecycle
//! - [`build_log`] - The build log
//! - [`version`] - Version bumping and LÖVE version parsing
//! - [`hooks`] - Prebuild and postbuild hooks
//! - [`target`] - Build targets
//! - [`builder`] - Build orchestration
//! - [`init`] - Configuration assistant

pub mod archive;
pub mod build_dir;
pub mod build_log;
pub mod builder;
pub mod config;
pub mod filelist;
pub mod hooks;
pub mod init;
pub mod resolver;
pub mod schema;
pub mod target;
pub mod version;
