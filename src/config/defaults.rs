//! Default configuration values

/// Config file looked up in the project directory when `--config` is not given
pub const CONFIG_FILE_NAME: &str = "makelove.toml";

/// Default build directory, relative to the project directory
pub const DEFAULT_BUILD_DIRECTORY: &str = "makelove-build";

/// Build log file name inside the build directory
pub const BUILD_LOG_FILE_NAME: &str = ".makelove-buildlog";

/// LÖVE version assumed when none is configured or found in conf.lua
pub const LATEST_LOVE_VERSION: &str = "11.5";

/// Every LÖVE release the schema accepts, newest first
pub const LOVE_VERSIONS: &[&str] = &[
    "11.5", "11.4", "11.3", "11.2", "11.1", "11.0", "0.10.2", "0.10.1", "0.10.0", "0.9.2",
    "0.9.1", "0.9.0", "0.8.0", "0.7.2", "0.7.1", "0.7.0", "0.6.2", "0.6.1", "0.6.0", "0.5.0",
    "0.4.0", "0.3.2", "0.3.1", "0.3.0", "0.2.1", "0.2.0", "0.1.1",
];

/// LÖVE config files searched for the runtime version, in order
pub const LOVE_CONF_FILES: &[&str] = &["conf.lua", "conf.moon", "conf.ts"];

/// Entry point every game directory must contain
pub const MAIN_LUA: &str = "main.lua";

/// Lifecycle points that run hooks
pub const HOOK_NAMES: &[&str] = &["prebuild", "postbuild"];

/// Selection rule expanding to the files tracked by version control
pub const VCS_TRACKED_RULE: &str = "::vcs-tracked::";

/// Maximum number of download retry attempts
pub const MAX_DOWNLOAD_RETRIES: u32 = 3;

/// Environment variable overriding the runtime cache directory
pub const ENV_CACHE_DIR: &str = "MAKELOVE_CACHE_DIR";

/// Environment variables exported to hook processes
pub const ENV_TEMP_CONFIG: &str = "MAKELOVE_TEMP_CONFIG";
pub const ENV_VERSION: &str = "MAKELOVE_VERSION";
pub const ENV_TARGETS: &str = "MAKELOVE_TARGETS";
pub const ENV_BUILD_DIRECTORY: &str = "MAKELOVE_BUILD_DIRECTORY";

/// Minimum proptest iterations
pub const MIN_PROPTEST_ITERATIONS: u32 = 100;
