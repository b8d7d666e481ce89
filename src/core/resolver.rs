//! Configuration resolution
//!
//! Loads `makelove.toml` (or the file given with `--config`), fills in every
//! top-level key the file leaves unset and validates the result. Defaults are
//! computed in a fixed order since later ones depend on earlier ones:
//! name, love_version, default_targets, build_directory, love_files.

use std::path::{Path, PathBuf};

use regex::Regex;
use toml::Value;

use crate::config::defaults::{
    CONFIG_FILE_NAME, DEFAULT_BUILD_DIRECTORY, LATEST_LOVE_VERSION, LOVE_CONF_FILES,
    VCS_TRACKED_RULE,
};
use crate::core::config::Config;
use crate::core::target::Target;
use crate::error::ConfigError;
use crate::infra::git;

/// Load, default and validate the configuration of a project
pub fn resolve(project_dir: &Path, explicit: Option<&Path>) -> Result<Config, ConfigError> {
    let mut config = load_raw(project_dir, explicit)?;
    apply_defaults(&mut config, project_dir);
    config.validate()?;
    Ok(config)
}

/// Load a configuration file written by a hook
///
/// The file is treated like an explicit `--config`: defaults are applied
/// again and the result is validated.
pub fn reload(path: &Path, project_dir: &Path) -> Result<Config, ConfigError> {
    resolve(project_dir, Some(path))
}

/// Path of the config file that [`resolve`] would read, if any
pub fn config_path(project_dir: &Path, explicit: Option<&Path>) -> Option<PathBuf> {
    match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => {
            let default = project_dir.join(CONFIG_FILE_NAME);
            default.is_file().then_some(default)
        }
    }
}

/// Load the raw configuration without defaults
///
/// An explicitly named file must exist. Without one, `makelove.toml` in the
/// project directory is used if present, an empty configuration otherwise.
pub fn load_raw(project_dir: &Path, explicit: Option<&Path>) -> Result<Config, ConfigError> {
    if let Some(path) = explicit {
        if !path.is_file() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }
        tracing::info!("Loading config file '{}'", path.display());
        return Config::load(path);
    }

    match config_path(project_dir, None) {
        Some(path) => {
            tracing::info!("Loading config from default path '{}'", path.display());
            Config::load(&path)
        }
        None => {
            tracing::info!("No config file found. Using default config.");
            Ok(Config::default())
        }
    }
}

/// Fill in every unset top-level key
pub fn apply_defaults(config: &mut Config, project_dir: &Path) {
    if !config.contains("name") {
        let name = guess_name(project_dir);
        tracing::info!("Guessing project name as '{name}'");
        config.set("name", name);
    }

    if !config.contains("love_version") {
        let version = match guess_love_version(project_dir) {
            Some(version) => {
                tracing::info!("Guessed LÖVE version from LÖVE config file: {version}");
                version
            }
            None => {
                tracing::warn!("Assuming default LÖVE version '{LATEST_LOVE_VERSION}'");
                LATEST_LOVE_VERSION.to_string()
            }
        };
        config.set("love_version", version);
    }

    if !config.contains("default_targets") {
        let targets: Vec<&str> = Target::defaults().iter().map(|t| t.as_str()).collect();
        config.set("default_targets", targets);
    }

    if !config.contains("build_directory") {
        tracing::info!("Using default build directory '{DEFAULT_BUILD_DIRECTORY}'");
        config.set("build_directory", DEFAULT_BUILD_DIRECTORY);
    }

    if !config.contains("love_files") {
        let build_directory = config
            .get_str("build_directory")
            .unwrap_or(DEFAULT_BUILD_DIRECTORY)
            .to_string();
        let rules = default_love_files(project_dir, &build_directory);
        tracing::info!("Using default love_files patterns: {rules:?}");
        config.set("love_files", Value::from(rules));
    }
}

/// Name of the enclosing git work tree, or of the project directory
pub fn guess_name(project_dir: &Path) -> String {
    let dir = git::discover_work_dir(project_dir)
        .or_else(|| project_dir.canonicalize().ok())
        .unwrap_or_else(|| project_dir.to_path_buf());
    dir.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "game".to_string())
}

/// LÖVE version assigned in the project's conf file
///
/// Looks for a single `t.version = "..."` style assignment outside of
/// comments. No match or several different matches give `None`.
pub fn guess_love_version(project_dir: &Path) -> Option<String> {
    let conf = LOVE_CONF_FILES
        .iter()
        .map(|name| project_dir.join(name))
        .find(|path| path.is_file());
    let Some(conf) = conf else {
        tracing::debug!("Could not find LÖVE config file");
        return None;
    };
    tracing::debug!("Found {}", conf.display());

    let content = std::fs::read_to_string(&conf).ok()?;
    let mut candidates = find_version_assignments(&content)?;
    candidates.dedup();
    match candidates.as_slice() {
        [] => None,
        [version] => Some(version.clone()),
        _ => {
            tracing::warn!(
                "Could not determine LÖVE version unambiguously. Candidates: {candidates:?}"
            );
            None
        }
    }
}

/// Every `.version = "..."` assignment not inside a `--` comment
fn find_version_assignments(content: &str) -> Option<Vec<String>> {
    let re = Regex::new(r#"\.version\s*=\s*"([^"]*)""#).ok()?;
    Some(
        content
            .lines()
            .filter_map(|line| line.split("--").next())
            .flat_map(|code| {
                re.captures_iter(code)
                    .map(|c| c[1].to_string())
                    .collect::<Vec<_>>()
            })
            .collect(),
    )
}

/// Selection rules used when the config has no `love_files`
pub fn default_love_files(project_dir: &Path, build_directory: &str) -> Vec<String> {
    if git::is_inside_work_tree(project_dir) {
        vec![VCS_TRACKED_RULE.to_string(), "-*/.*".to_string()]
    } else {
        vec![
            "+*".to_string(),
            "-*/.*".to_string(),
            format!("-./{build_directory}/*"),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::git_repo;
    use tempfile::TempDir;

    #[test]
    fn test_default_love_files_depend_on_git() {
        let temp = TempDir::new().unwrap();
        assert_eq!(
            default_love_files(temp.path(), "dist"),
            vec!["+*", "-*/.*", "-./dist/*"]
        );

        if !git_repo::available() {
            return;
        }
        git_repo::init(temp.path());
        assert_eq!(
            default_love_files(temp.path(), "dist"),
            vec!["::vcs-tracked::", "-*/.*"]
        );
    }

    #[test]
    fn test_explicit_missing_config_is_fatal() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("nope.toml");
        assert!(matches!(
            resolve(temp.path(), Some(&missing)),
            Err(ConfigError::NotFound { .. })
        ));
    }

    #[test]
    fn test_defaults_without_config_file() {
        let temp = TempDir::new().unwrap();
        let project = temp.path().join("my-game");
        std::fs::create_dir(&project).unwrap();

        let config = resolve(&project, None).unwrap();
        assert_eq!(config.name().unwrap(), "my-game");
        assert_eq!(config.love_version().unwrap(), LATEST_LOVE_VERSION);
        assert_eq!(config.build_directory().unwrap(), DEFAULT_BUILD_DIRECTORY);
        assert_eq!(config.default_targets().unwrap(), Target::defaults());
        assert_eq!(
            config.love_files(),
            vec!["+*", "-*/.*", "-./makelove-build/*"]
        );
    }

    #[test]
    fn test_config_values_win_over_defaults() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join(CONFIG_FILE_NAME),
            "name = \"Named\"\nbuild_directory = \"out\"\ndefault_targets = [\"lovejs\"]",
        )
        .unwrap();

        let config = resolve(temp.path(), None).unwrap();
        assert_eq!(config.name().unwrap(), "Named");
        assert_eq!(config.default_targets().unwrap(), vec![Target::LoveJs]);
        assert_eq!(config.love_files(), vec!["+*", "-*/.*", "-./out/*"]);
    }

    #[test]
    fn test_invalid_config_is_rejected_after_defaults() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join(CONFIG_FILE_NAME), "keep_game_directory = \"yes\"")
            .unwrap();
        let err = resolve(temp.path(), None).unwrap_err();
        assert!(err.to_string().contains("keep_game_directory"));
    }

    #[test]
    fn test_love_version_from_conf_lua() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("conf.lua"),
            "function love.conf(t)\n    -- t.version = \"0.10.2\"\n    t.version = \"11.4\"\nend\n",
        )
        .unwrap();
        assert_eq!(guess_love_version(temp.path()).as_deref(), Some("11.4"));

        let config = resolve(temp.path(), None).unwrap();
        assert_eq!(config.love_version().unwrap(), "11.4");
    }

    #[test]
    fn test_ambiguous_love_version() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("conf.lua"),
            "t.version = \"11.4\"\nt.version = \"11.3\"\n",
        )
        .unwrap();
        assert_eq!(guess_love_version(temp.path()), None);
    }

    #[test]
    fn test_no_conf_file() {
        let temp = TempDir::new().unwrap();
        assert_eq!(guess_love_version(temp.path()), None);
    }

    #[test]
    fn test_config_path() {
        let temp = TempDir::new().unwrap();
        assert_eq!(config_path(temp.path(), None), None);
        std::fs::write(temp.path().join(CONFIG_FILE_NAME), "").unwrap();
        assert_eq!(
            config_path(temp.path(), None),
            Some(temp.path().join(CONFIG_FILE_NAME))
        );
    }
}
