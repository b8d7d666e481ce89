//! Error types for makelove
//!
//! Domain-specific error types using thiserror. Every fatal condition of a
//! build is one of these; only `main` turns them into an exit code.

use std::path::PathBuf;
use thiserror::Error;

/// Schema validation failure
///
/// `path` is the dotted key path of the offending value (empty for the root),
/// `expected` the human-readable shape the schema wanted there.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// Key not declared by the enclosing section
    #[error("Unknown parameter '{path}'")]
    UnknownKey { path: String },

    /// Value has the wrong shape
    #[error("Invalid value for parameter '{path}'. Expected: {expected}")]
    InvalidValue { path: String, expected: String },
}

impl SchemaError {
    /// Dotted path of the offending value
    pub fn path(&self) -> &str {
        match self {
            Self::UnknownKey { path } | Self::InvalidValue { path, .. } => path,
        }
    }
}

/// Configuration loading and resolution errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Explicitly named config file is missing
    #[error("Config file '{path}' does not exist")]
    NotFound { path: PathBuf },

    /// Config file could not be read
    #[error("Failed to read config file '{path}': {error}")]
    Read { path: PathBuf, error: String },

    /// Config file is not valid TOML
    #[error("Failed to parse config file '{path}': {error}")]
    Parse { path: PathBuf, error: String },

    /// Config could not be serialized
    #[error("Failed to serialize config: {0}")]
    Serialize(String),

    /// Config does not match the schema
    #[error("Could not parse config:\n{0}")]
    Invalid(#[from] SchemaError),

    /// A required key is missing after defaulting
    #[error("Config is missing required key '{key}'")]
    MissingKey { key: String },

    /// A config file already exists where `--init` would write one
    #[error("{path} already exists in this directory")]
    AlreadyExists { path: PathBuf },
}

/// File selection errors
#[derive(Error, Debug)]
pub enum SelectionError {
    /// Symlinked directories form a loop
    #[error("Detected infinite recursion while walking directory at '{path}'")]
    SymlinkCycle { path: PathBuf },

    /// Directory enumeration failed
    #[error("Failed to enumerate '{path}': {error}")]
    Walk { path: PathBuf, error: String },

    /// Invalid glob pattern
    #[error("Invalid pattern '{pattern}': {error}")]
    InvalidPattern { pattern: String, error: String },

    /// A raw path does not exist (or is a broken symlink)
    #[error("Could not find file '{path}'")]
    NotFound { path: String },

    /// Empty selection rule
    #[error("Empty file selection rule")]
    EmptyRule,

    /// Listing tracked files failed
    #[error(transparent)]
    Git(#[from] GitError),
}

/// Git errors
#[derive(Error, Debug)]
pub enum GitError {
    /// The git executable could not be spawned
    #[error("Failed to run git in '{path}': {error}")]
    Spawn { path: PathBuf, error: String },

    /// git exited with a non-zero status
    #[error("'git {command}' failed in '{path}': {stderr}")]
    CommandFailed {
        command: String,
        path: PathBuf,
        stderr: String,
    },
}

/// Build directory lifecycle errors
#[derive(Error, Debug)]
pub enum BuildDirError {
    /// Versioned target already built
    #[error("Cannot rebuild an already built version + target combination ({version}: {}). Remove it manually first or pass --force to overwrite it", targets.join(", "))]
    Conflict {
        version: String,
        targets: Vec<String>,
    },

    /// The last versioned build never completed
    #[error("The last build (version '{version}') did not complete. Pass --version-name to build a new version or --force to rebuild '{version}'")]
    IncompleteBuild { version: String },

    /// Something that is not a directory is in the way
    #[error("Build directory '{path}' exists and is not a directory")]
    NotADirectory { path: PathBuf },

    /// Filesystem error
    #[error(transparent)]
    Filesystem(#[from] FilesystemError),
}

/// Build log errors
#[derive(Error, Debug)]
pub enum BuildLogError {
    /// Entries could not be serialized
    #[error("Failed to serialize build log '{path}': {error}")]
    Serialize { path: PathBuf, error: String },

    /// Log file is not a JSON array of entries
    #[error("Build log '{path}' is corrupt: {error}")]
    Corrupt { path: PathBuf, error: String },

    /// Log file exists but holds no entries
    #[error("Build log '{path}' is empty")]
    Empty { path: PathBuf },

    /// Log file could not be read or written
    #[error(transparent)]
    Filesystem(#[from] FilesystemError),
}

/// Version computation errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum VersionError {
    /// No trailing number to increment
    #[error("Could not bump version '{version}': cannot bump a non-numeric version")]
    NotBumpable { version: String },

    /// LÖVE version string could not be parsed
    #[error("Could not parse LÖVE version '{version}'")]
    InvalidLoveVersion { version: String },
}

/// Hook execution errors
#[derive(Error, Debug)]
pub enum HookError {
    /// Temporary config file handling failed
    #[error("Failed to prepare config for hook '{command}': {error}")]
    TempFile { command: String, error: String },

    /// The hook process could not be spawned
    #[error("Hook '{command}' could not be started: {error}")]
    Spawn { command: String, error: String },

    /// The hook exited unsuccessfully
    #[error("Hook '{command}' failed: {status}")]
    Failed { command: String, status: String },

    /// The config written back by the hook is invalid
    #[error("Hook '{command}' produced an invalid config: {source}")]
    InvalidConfig {
        command: String,
        #[source]
        source: ConfigError,
    },
}

/// Asset archive errors
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// Game directory has no entry point
    #[error("Your game directory does not contain a main.lua. This will result in a game that can not be run.")]
    MissingMainLua,

    /// Zip writing failed
    #[error("Failed to write archive '{path}': {error}")]
    Zip { path: PathBuf, error: String },

    /// Filesystem error
    #[error(transparent)]
    Filesystem(#[from] FilesystemError),
}

/// Target builder errors
#[derive(Error, Debug)]
pub enum TargetError {
    /// Unknown target name
    #[error("Invalid target '{name}'. Options: {}", crate::core::target::Target::names().join(", "))]
    Unknown { name: String },

    /// Target cannot be built on this host
    #[error("{0}")]
    UnsupportedHost(String),

    /// A file the builder needs is missing
    #[error("Target {target}: could not find '{path}'")]
    MissingFile { target: String, path: PathBuf },

    /// Runtime binaries have an unexpected layout
    #[error("Target {target}: {message}")]
    BadRuntime { target: String, message: String },

    /// A target setting has an unusable value
    #[error("Target {target}: invalid value for '{key}': {message}")]
    InvalidSetting {
        target: String,
        key: String,
        message: String,
    },

    /// An external tool failed
    #[error("Target {target}: '{tool}' failed: {error}")]
    Tool {
        target: String,
        tool: String,
        error: String,
    },

    /// Zip reading/writing failed
    #[error("Target {target}: archive error in '{path}': {error}")]
    Zip {
        target: String,
        path: PathBuf,
        error: String,
    },

    /// Runtime download failed
    #[error("Target {target}: {source}. If there is in fact no download for this version, specify 'love_binaries' manually")]
    Download {
        target: String,
        #[source]
        source: DownloadError,
    },

    /// Filesystem error
    #[error(transparent)]
    Filesystem(#[from] FilesystemError),
}

/// Download errors
#[derive(Error, Debug)]
pub enum DownloadError {
    /// Network error
    #[error("Network error downloading '{url}': {error}")]
    NetworkError { url: String, error: String },

    /// IO error
    #[error("IO error for '{path}': {error}")]
    IoError { path: PathBuf, error: String },

    /// Max retries exceeded
    #[error("Download failed after {retries} retries: {url}")]
    MaxRetriesExceeded { url: String, retries: u32 },

    /// Downloaded archive could not be unpacked
    #[error("Failed to extract '{path}': {error}")]
    ExtractFailed { path: PathBuf, error: String },
}

/// Filesystem errors
#[derive(Error, Debug)]
pub enum FilesystemError {
    /// Failed to create directory
    #[error("Failed to create directory '{path}': {error}")]
    CreateDir { path: PathBuf, error: String },

    /// Failed to remove directory
    #[error("Failed to remove directory '{path}': {error}")]
    RemoveDir { path: PathBuf, error: String },

    /// Failed to write file
    #[error("Failed to write file '{path}': {error}")]
    WriteFile { path: PathBuf, error: String },

    /// Failed to read file
    #[error("Failed to read file '{path}': {error}")]
    ReadFile { path: PathBuf, error: String },

    /// Failed to copy a file or directory
    #[error("Failed to copy '{from}' to '{to}': {error}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        error: String,
    },
}

/// Top-level makelove error type
#[derive(Error, Debug)]
pub enum MakeloveError {
    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// File selection error
    #[error(transparent)]
    Selection(#[from] SelectionError),

    /// Build directory error
    #[error(transparent)]
    BuildDir(#[from] BuildDirError),

    /// Build log error
    #[error(transparent)]
    BuildLog(#[from] BuildLogError),

    /// Version error
    #[error(transparent)]
    Version(#[from] VersionError),

    /// Hook error
    #[error(transparent)]
    Hook(#[from] HookError),

    /// Asset archive error
    #[error(transparent)]
    Archive(#[from] ArchiveError),

    /// Target build error
    #[error(transparent)]
    Target(#[from] TargetError),

    /// Filesystem error
    #[error(transparent)]
    Filesystem(#[from] FilesystemError),
}
