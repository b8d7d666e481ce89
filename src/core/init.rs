//! Configuration assistant (`--init`)
//!
//! Asks for the project name and build directory and writes a starter
//! `makelove.toml` using the same defaults a build without a config would use.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use toml::Value;

use crate::config::defaults::{CONFIG_FILE_NAME, DEFAULT_BUILD_DIRECTORY};
use crate::core::resolver;
use crate::core::target::Target;
use crate::error::{ConfigError, MakeloveError};
use crate::infra::{filesystem, git};

/// Answers given to the assistant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitAnswers {
    /// Project name
    pub name: String,
    /// Build directory
    pub build_directory: String,
}

/// Fail if the project already has a config file
pub fn validate_init(project_dir: &Path) -> Result<(), ConfigError> {
    let path = project_dir.join(CONFIG_FILE_NAME);
    if path.exists() {
        return Err(ConfigError::AlreadyExists {
            path: PathBuf::from(CONFIG_FILE_NAME),
        });
    }
    Ok(())
}

/// Ask a question; an empty answer picks `default`
pub fn prompt<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    question: &str,
    default: &str,
) -> io::Result<String> {
    if default.is_empty() {
        write!(output, "{question}: ")?;
    } else {
        write!(output, "{question} [{default}]: ")?;
    }
    output.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;
    let answer = answer.trim();
    Ok(if answer.is_empty() {
        default.to_string()
    } else {
        answer.to_string()
    })
}

/// Collect the answers interactively
pub fn ask<R: BufRead, W: Write>(
    project_dir: &Path,
    input: &mut R,
    output: &mut W,
) -> io::Result<InitAnswers> {
    let name = prompt(input, output, "Project name", &resolver::guess_name(project_dir))?;
    let build_directory = prompt(input, output, "Build directory", DEFAULT_BUILD_DIRECTORY)?;
    Ok(InitAnswers {
        name,
        build_directory,
    })
}

/// TOML-quoted string
fn quote(value: &str) -> String {
    Value::String(value.to_string()).to_string()
}

/// Contents of the generated config file
pub fn generate_config_content(answers: &InitAnswers, love_files: &[String]) -> String {
    let targets: Vec<String> = Target::defaults()
        .iter()
        .map(|t| quote(t.as_str()))
        .collect();
    let rules: String = love_files
        .iter()
        .map(|rule| format!("    {},\n", quote(rule)))
        .collect();

    format!(
        "name = {}\ndefault_targets = [{}]\nbuild_directory = {}\n\nlove_files = [\n{rules}]\n",
        quote(&answers.name),
        targets.join(", "),
        quote(&answers.build_directory),
    )
}

/// Write `makelove.toml` for the given answers
pub fn write_config(project_dir: &Path, answers: &InitAnswers) -> Result<PathBuf, MakeloveError> {
    validate_init(project_dir)?;
    if !git::is_inside_work_tree(project_dir) {
        tracing::warn!("If you plan on using git, please initialize the repository first!");
    }

    let love_files = resolver::default_love_files(project_dir, &answers.build_directory);
    let path = project_dir.join(CONFIG_FILE_NAME);
    filesystem::write_file(&path, generate_config_content(answers, &love_files))?;
    Ok(path)
}
