//! makelove - package LÖVE games for several platforms
//!
//! Turns a game directory into a `.love` archive and per-platform
//! distributables from a single `makelove.toml`.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line parsing and output formatting
//! - [`core`] - Configuration, file selection, build lifecycle and hooks
//! - [`platforms`] - Target builders (Windows, AppImage, macOS, love.js)
//! - [`infra`] - Filesystem, git, downloads and external processes
//! - [`config`] - Constants and download URLs
//! - [`error`] - Error types

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod infra;
pub mod platforms;

#[cfg(test)]
pub mod test_utils;
