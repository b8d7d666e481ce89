//! Compile-time configuration and constants
//!
//! - [`defaults`] - Default values and well-known names
//! - [`urls`] - Download locations for LÖVE runtimes and tools

pub mod defaults;
pub mod urls;
