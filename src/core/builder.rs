//! Build orchestration
//!
//! Runs one build from start to finish:
//!
//! 1. resolve the configuration
//! 2. compute the version from `--version-name` or the build log
//! 3. prepare the build directory and record the build in the log
//! 4. run the prebuild hooks
//! 5. assemble the asset archive
//! 6. build every target
//! 7. run the postbuild hooks and mark the build completed
//!
//! Any failure aborts the run and leaves the log entry incomplete.

use std::path::{Path, PathBuf};

use futures::stream::{self, StreamExt};

use crate::config::defaults::MAIN_LUA;
use crate::core::archive;
use crate::core::build_dir::{self, TargetDirState};
use crate::core::build_log::{BuildLog, BuildLogEntry};
use crate::core::config::Config;
use crate::core::filelist::FileList;
use crate::core::hooks::{self, DisabledHooks, HookContext};
use crate::core::resolver;
use crate::core::target::{unique_targets, Target};
use crate::core::version::bump_version;
use crate::error::{BuildDirError, FilesystemError, MakeloveError};
use crate::infra::dirs::CacheDirs;
use crate::infra::download::DownloadManager;
use crate::platforms::{self, BuildContext, BuilderFactory};

/// Build options
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Project directory
    pub project_dir: PathBuf,
    /// Explicit config file
    pub config_path: Option<PathBuf>,
    /// Targets to build; empty means `default_targets`
    pub targets: Vec<Target>,
    /// Version name of a versioned build
    pub version_name: Option<String>,
    /// Overwrite already built versions
    pub force: bool,
    /// Reuse the outputs of a previous unversioned build
    pub resume: bool,
    /// Hooks not to run
    pub disabled_hooks: DisabledHooks,
    /// Number of targets built at the same time
    pub jobs: usize,
    /// Only load and validate the configuration
    pub check: bool,
}

/// Result of a successful run
#[derive(Debug)]
pub enum BuildOutcome {
    /// `--check`: the configuration is valid
    Checked {
        /// The resolved configuration
        config: Config,
        /// Version a build would produce
        version: Option<String>,
    },
    /// Every target was built
    Built(BuildReport),
}

/// What a build produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildReport {
    /// Directory of this build
    pub build_dir: PathBuf,
    /// Version name of a versioned build
    pub version: Option<String>,
    /// Targets that were built (or resumed)
    pub targets: Vec<Target>,
    /// The asset archive
    pub love_file: PathBuf,
}

/// Version of the next build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedVersion {
    /// Version name, `None` for unversioned builds
    pub name: Option<String>,
    /// Rebuilding the incomplete last log entry instead of adding one
    pub reuses_log_entry: bool,
}

/// Pick the version of the next build
///
/// An explicit name always wins. Otherwise the last logged version is
/// bumped; an incomplete last build must be rebuilt with `force`.
pub fn plan_version(
    log: &BuildLog,
    explicit: Option<&str>,
    force: bool,
) -> Result<PlannedVersion, MakeloveError> {
    if let Some(name) = explicit {
        return Ok(PlannedVersion {
            name: Some(name.to_string()),
            reuses_log_entry: false,
        });
    }

    let Some(last) = log.last()? else {
        return Ok(PlannedVersion {
            name: None,
            reuses_log_entry: false,
        });
    };

    if !last.completed {
        if !force {
            return Err(BuildDirError::IncompleteBuild {
                version: last.version,
            }
            .into());
        }
        tracing::warn!("Rebuilding incomplete version '{}'", last.version);
        return Ok(PlannedVersion {
            name: Some(last.version),
            reuses_log_entry: true,
        });
    }

    let name = bump_version(&last.version)?;
    tracing::info!("Bumping version '{}' to '{name}'", last.version);
    Ok(PlannedVersion {
        name: Some(name),
        reuses_log_entry: false,
    })
}

/// Everything targets share during one build
struct TargetPlan<'a> {
    config: &'a Config,
    name: &'a str,
    love_version: &'a str,
    version: Option<&'a str>,
    build_dir: &'a Path,
    love_file: &'a Path,
    project_dir: &'a Path,
    resume: bool,
}

/// Build orchestrator
pub struct Builder {
    cache: CacheDirs,
    downloads: DownloadManager,
    factory: BuilderFactory,
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Builder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Builder")
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl Builder {
    /// Orchestrator using the shipped target builders
    pub fn new() -> Self {
        Self {
            cache: CacheDirs::new(),
            downloads: DownloadManager::new(),
            factory: platforms::builder_for,
        }
    }

    /// Use a different runtime cache
    #[must_use]
    pub fn with_cache(mut self, cache: CacheDirs) -> Self {
        self.cache = cache;
        self
    }

    /// Use different target builders
    #[must_use]
    pub fn with_factory(mut self, factory: BuilderFactory) -> Self {
        self.factory = factory;
        self
    }

    /// Run a build
    pub async fn run(&self, options: &BuildOptions) -> Result<BuildOutcome, MakeloveError> {
        // hooks run inside the project directory; paths handed to them are absolute
        let project_dir = std::path::absolute(&options.project_dir).map_err(|e| {
            FilesystemError::ReadFile {
                path: options.project_dir.clone(),
                error: e.to_string(),
            }
        })?;
        let project_dir = project_dir.as_path();
        let mut config = resolver::resolve(project_dir, options.config_path.as_deref())?;

        let requested = if options.targets.is_empty() {
            config.default_targets()?
        } else {
            options.targets.clone()
        };
        let targets = unique_targets(&requested);
        for target in &targets {
            target.check_host()?;
        }

        let build_root = project_dir.join(config.build_directory()?);
        let log = BuildLog::new(&build_root);
        let planned = plan_version(&log, options.version_name.as_deref(), options.force)?;
        let version = planned.name.as_deref();
        if let Some(version) = version {
            tracing::info!("Building version '{version}'");
        }

        if options.check {
            tracing::info!("Configuration is valid");
            return Ok(BuildOutcome::Checked {
                config,
                version: planned.name,
            });
        }

        if !project_dir.join(MAIN_LUA).is_file() {
            tracing::warn!(
                "No {MAIN_LUA} in '{}'. Make sure this is the root of your game",
                project_dir.display()
            );
        }

        let resume = options.resume && version.is_none();
        if options.resume && version.is_some() {
            tracing::warn!("--resume only applies to unversioned builds and is ignored");
        }

        let build_dir = build_dir::prepare(&build_root, version, &targets, options.force)?;
        tracing::info!("Building into '{}'", build_dir.display());

        if let (Some(version), false) = (version, planned.reuses_log_entry) {
            log.append(BuildLogEntry::started(version, &targets))?;
        }

        let hook_ctx = HookContext {
            project_dir,
            version,
            targets: &targets,
            build_directory: &build_dir,
        };

        if options.disabled_hooks.contains("prebuild") {
            tracing::info!("Prebuild hooks disabled");
        } else {
            config = hooks::run_hooks("prebuild", config, &hook_ctx).await?;
        }

        let name = config.name()?.to_string();
        let love_version = config.love_version()?.to_string();

        let love_file = archive::love_file_path(&build_dir, &name);
        if resume && love_file.is_file() {
            tracing::info!("Reusing asset archive '{}'", love_file.display());
        } else {
            let files = FileList::from_rules(project_dir, &config.love_files())?;
            archive::create_love_file(&files, &build_dir, &name, config.keep_game_directory())?;
        }

        let plan = TargetPlan {
            config: &config,
            name: &name,
            love_version: &love_version,
            version,
            build_dir: &build_dir,
            love_file: &love_file,
            project_dir,
            resume,
        };
        self.build_targets(&plan, &targets, options.jobs).await?;

        if options.disabled_hooks.contains("postbuild") {
            tracing::info!("Postbuild hooks disabled");
        } else {
            config = hooks::run_hooks("postbuild", config, &hook_ctx).await?;
        }
        drop(config);

        if version.is_some() {
            log.mark_completed()?;
        }

        tracing::info!("Build completed");
        Ok(BuildOutcome::Built(BuildReport {
            build_dir,
            version: planned.name,
            targets,
            love_file,
        }))
    }

    /// Build targets one after another, or `jobs` at a time
    ///
    /// Sequential builds stop at the first failure. Parallel builds let every
    /// started target finish, log all failures and return the first one in
    /// target order.
    async fn build_targets(
        &self,
        plan: &TargetPlan<'_>,
        targets: &[Target],
        jobs: usize,
    ) -> Result<(), MakeloveError> {
        if jobs <= 1 || targets.len() <= 1 {
            for target in targets {
                self.build_target(plan, *target).await?;
            }
            return Ok(());
        }

        tracing::info!("Building {} targets with {jobs} jobs", targets.len());
        let mut results: Vec<(usize, Target, Result<(), MakeloveError>)> =
            stream::iter(targets.iter().copied().enumerate())
                .map(|(index, target)| async move {
                    (index, target, self.build_target(plan, target).await)
                })
                .buffer_unordered(jobs)
                .collect()
                .await;
        results.sort_by_key(|(index, _, _)| *index);

        let mut first_failure = None;
        for (_, target, result) in results {
            if let Err(err) = result {
                tracing::error!("Target {target} failed: {err}");
                first_failure.get_or_insert(err);
            }
        }
        first_failure.map_or(Ok(()), Err)
    }

    async fn build_target(&self, plan: &TargetPlan<'_>, target: Target) -> Result<(), MakeloveError> {
        let (target_dir, state) = build_dir::prepare_target(plan.build_dir, target, plan.resume)?;
        if state == TargetDirState::Resumed {
            tracing::info!("Skipping target {target}: '{}' already exists", target_dir.display());
            return Ok(());
        }

        tracing::info!("Building target {target}");
        let ctx = BuildContext {
            config: plan.config,
            name: plan.name,
            love_version: plan.love_version,
            version: plan.version,
            target,
            target_dir: &target_dir,
            love_file: plan.love_file,
            project_dir: plan.project_dir,
            cache: &self.cache,
            downloads: &self.downloads,
        };
        let builder = (self.factory)(target);
        builder.build(&ctx).await?;
        tracing::info!("Target {target} complete");
        Ok(())
    }
}
