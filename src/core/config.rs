//! Project configuration (makelove.toml)
//!
//! The configuration is kept as a raw TOML table so hooks can add, remove or
//! change any key and the rest of the build sees exactly what they wrote.
//! Typed access goes through the accessors on [`Config`].

use std::path::Path;

use toml::{Table, Value};

use crate::config::defaults::LOVE_VERSIONS;
use crate::core::schema::Schema;
use crate::core::target::Target;
use crate::error::{ConfigError, SchemaError};

/// The full configuration schema
pub fn config_schema() -> Schema {
    let windows_target = || {
        Schema::section([
            ("love_binaries", Schema::Path),
            ("shared_libraries", Schema::list(Schema::Path)),
            (
                "artifacts",
                Schema::value_or_list(Schema::choice(["directory", "archive"])),
            ),
        ])
    };
    let string_map = || Schema::dict(Schema::String, Schema::String);

    Schema::section([
        ("name", Schema::String),
        ("love_version", Schema::choice(LOVE_VERSIONS.iter().copied())),
        ("default_targets", Schema::list(Schema::choice(Target::names()))),
        ("build_directory", Schema::Path),
        ("license", Schema::Path),
        ("icon_file", Schema::Path),
        ("love_files", Schema::list(Schema::Path)),
        ("keep_game_directory", Schema::Bool),
        ("archive_files", Schema::dict(Schema::Path, Schema::Path)),
        (
            "hooks",
            Schema::section([
                ("prebuild", Schema::list(Schema::Command)),
                ("postbuild", Schema::list(Schema::Command)),
                ("parameters", Schema::dict(Schema::Any, Schema::Any)),
            ]),
        ),
        (
            "windows",
            Schema::section([
                ("exe_metadata", string_map()),
                ("archive_files", Schema::dict(Schema::Path, Schema::Path)),
            ]),
        ),
        ("win32", windows_target()),
        ("win64", windows_target()),
        (
            "linux",
            Schema::section([("desktop_file_metadata", string_map())]),
        ),
        (
            "appimage",
            Schema::section([
                ("source_appimage", Schema::Path),
                ("shared_libraries", Schema::list(Schema::Path)),
                (
                    "artifacts",
                    Schema::value_or_list(Schema::choice(["appdir", "appimage"])),
                ),
            ]),
        ),
        (
            "macos",
            Schema::section([
                ("love_binaries", Schema::Path),
                ("icon_file", Schema::Path),
                ("app_metadata", string_map()),
            ]),
        ),
        (
            "lovejs",
            Schema::section([
                ("love_binaries", Schema::Path),
                ("title", Schema::String),
                ("memory", Schema::String),
            ]),
        ),
    ])
}

/// A loaded configuration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    table: Table,
}

impl Config {
    /// Parse TOML text without validating it
    pub fn from_toml(content: &str, origin: &Path) -> Result<Self, ConfigError> {
        let table: Table = toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: origin.to_path_buf(),
            error: e.to_string(),
        })?;
        Ok(Self { table })
    }

    /// Read and parse a TOML file without validating it
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;
        Self::from_toml(&content, path)
    }

    /// Serialize to TOML text
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string(&self.table).map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    /// Validate against [`config_schema`]
    pub fn validate(&self) -> Result<(), ConfigError> {
        let value = Value::Table(self.table.clone());
        config_schema().validate(&value)?;
        Ok(())
    }

    /// Whether a top-level key is set
    pub fn contains(&self, key: &str) -> bool {
        self.table.contains_key(key)
    }

    /// Set a top-level key
    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.table.insert(key.to_string(), value.into());
    }

    /// Raw value of a top-level key
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.table.get(key)
    }

    /// String value of a top-level key
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.table.get(key).and_then(Value::as_str)
    }

    fn require_str(&self, key: &str) -> Result<&str, ConfigError> {
        self.get_str(key).ok_or_else(|| ConfigError::MissingKey {
            key: key.to_string(),
        })
    }

    /// Project name
    pub fn name(&self) -> Result<&str, ConfigError> {
        self.require_str("name")
    }

    /// LÖVE runtime version
    pub fn love_version(&self) -> Result<&str, ConfigError> {
        self.require_str("love_version")
    }

    /// Build directory, relative to the project directory unless absolute
    pub fn build_directory(&self) -> Result<&str, ConfigError> {
        self.require_str("build_directory")
    }

    /// Targets built when none are given on the command line
    pub fn default_targets(&self) -> Result<Vec<Target>, ConfigError> {
        self.string_list("default_targets")
            .into_iter()
            .map(|name| {
                name.parse::<Target>().map_err(|_| {
                    ConfigError::Invalid(SchemaError::InvalidValue {
                        path: "default_targets".to_string(),
                        expected: format!("List(One of [{}])", Target::names().join(", ")),
                    })
                })
            })
            .collect()
    }

    /// Ordered file selection rules
    pub fn love_files(&self) -> Vec<&str> {
        self.string_list("love_files")
    }

    /// Whether to keep the staged game directory after zipping it
    pub fn keep_game_directory(&self) -> bool {
        self.table
            .get("keep_game_directory")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Commands registered for a lifecycle hook
    pub fn hook_commands(&self, hook: &str) -> Vec<String> {
        self.section_value("hooks", hook)
            .and_then(Value::as_array)
            .map(|cmds| {
                cmds.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Value of `key` inside the top-level `section` table
    pub fn section_value(&self, section: &str, key: &str) -> Option<&Value> {
        self.table
            .get(section)
            .and_then(Value::as_table)
            .and_then(|t| t.get(key))
    }

    /// String value inside a section
    pub fn section_str(&self, section: &str, key: &str) -> Option<&str> {
        self.section_value(section, key).and_then(Value::as_str)
    }

    /// List of strings inside a section (empty if unset)
    pub fn section_list(&self, section: &str, key: &str) -> Vec<&str> {
        self.section_value(section, key)
            .map(string_items)
            .unwrap_or_default()
    }

    /// String-to-string map inside a section, in file order
    pub fn section_map(&self, section: &str, key: &str) -> Vec<(String, String)> {
        self.section_value(section, key)
            .map(string_pairs)
            .unwrap_or_default()
    }

    /// Top-level `archive_files` map, in file order
    pub fn archive_files(&self) -> Vec<(String, String)> {
        self.table
            .get("archive_files")
            .map(string_pairs)
            .unwrap_or_default()
    }

    /// Whether a target should produce the named artifact
    ///
    /// Without an `artifacts` entry for the target, `default` decides.
    pub fn should_build_artifact(&self, target: Target, artifact: &str, default: bool) -> bool {
        match self.section_value(target.as_str(), "artifacts") {
            None => default,
            Some(value) => string_items(value).contains(&artifact),
        }
    }

    fn string_list(&self, key: &str) -> Vec<&str> {
        self.table.get(key).map(string_items).unwrap_or_default()
    }
}

/// A string or a list of strings, as a list
fn string_items(value: &Value) -> Vec<&str> {
    match value {
        Value::String(s) => vec![s.as_str()],
        Value::Array(items) => items.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    }
}

fn string_pairs(value: &Value) -> Vec<(String, String)> {
    value
        .as_table()
        .map(|t| {
            t.iter()
                .filter_map(|(k, v)| v.as_str().map(|v| (k.clone(), v.to_string())))
                .collect()
        })
        .unwrap_or_default()
}
