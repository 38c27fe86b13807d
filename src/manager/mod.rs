//! Package install pipeline.
//!
//! [`PackageManager`] drives one package through
//! acquire → normalize → analyze → build → install. Each stage returns a
//! [`Result`] and the first failure ends the run; nothing is installed
//! unless the build stage succeeded.
//!
//! # Example
//!
//! ```no_run
//! use kodegen_bundler_install::InstallConfig;
//! use kodegen_bundler_install::manager::{PackageManager, PackageRequest, PlatformProfile};
//!
//! # async fn example() -> kodegen_bundler_install::manager::Result<()> {
//! let profile = PlatformProfile::detect(None)?;
//! let manager = PackageManager::new(&InstallConfig::default(), profile)?;
//!
//! let request = PackageRequest::new("zlib")
//!     .source_url("https://zlib.net/zlib-1.3.1.tar.gz")
//!     .install_env("dev");
//! let report = manager.install_package(&request).await?;
//! println!("installed into {}", report.record.install_path.display());
//! # Ok(())
//! # }
//! ```

pub mod analysis;
pub mod build;
pub mod bundle;
pub mod error;
pub mod install;
pub mod lock;
pub mod platform;
pub mod request;
pub mod source;
pub mod utils;
pub mod workspace;

pub use analysis::{AllowAll, AnalysisStatus, HeuristicPolicy, SuitabilityAnalyzer, SuitabilityPolicy, Verdict};
pub use build::{BuildDispatcher, BuildOutcome, BuildTarget, TemplateTranslator, Translator};
pub use bundle::{BundleNormalizer, SourceBundle};
pub use error::{Context, Error, ErrorExt, Result};
pub use install::{InstallRecord, Installer, ShellProfile};
pub use lock::PackageLocks;
pub use platform::{OsFamily, PlatformProfile};
pub use request::PackageRequest;
pub use source::{NativeSourceTool, SourceAcquirer, SourceLocation};
pub use workspace::Workspace;

use crate::InstallConfig;
use std::fmt;
use std::sync::Arc;

/// Pipeline stage, reported to the observer as each one starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Obtaining the package source
    Fetching,
    /// Packing and re-extracting the source
    Normalizing,
    /// Running the suitability gate
    Analyzing,
    /// Running the build backend
    Building,
    /// Copying into the install root
    Installing,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Stage::Fetching => "Fetching source",
            Stage::Normalizing => "Normalizing bundle",
            Stage::Analyzing => "Analyzing suitability",
            Stage::Building => "Building",
            Stage::Installing => "Installing",
        };
        f.write_str(label)
    }
}

/// Callback invoked when a stage starts.
pub type StageObserver = Arc<dyn Fn(Stage) + Send + Sync>;

/// Everything one successful install produced.
#[derive(Debug, Clone)]
pub struct InstallReport {
    /// Normalized source
    pub bundle: SourceBundle,
    /// Backend that handled the package
    pub target: BuildTarget,
    /// Whether the suitability gate ran
    pub analysis: AnalysisStatus,
    /// Build stage result
    pub build: BuildOutcome,
    /// Written install record
    pub record: InstallRecord,
}

/// Drives packages through the install pipeline.
#[derive(Clone)]
pub struct PackageManager {
    workspace: Workspace,
    profile: PlatformProfile,
    acquirer: SourceAcquirer,
    normalizer: BundleNormalizer,
    analyzer: SuitabilityAnalyzer,
    dispatcher: BuildDispatcher,
    installer: Installer,
    locks: PackageLocks,
    strict_target: bool,
    assistant_configured: bool,
    observer: Option<StageObserver>,
}

impl fmt::Debug for PackageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PackageManager")
            .field("workspace", &self.workspace)
            .field("os_family", &self.profile.os_family())
            .field("dispatcher", &self.dispatcher)
            .field("strict_target", &self.strict_target)
            .finish_non_exhaustive()
    }
}

impl PackageManager {
    /// Wires up every stage from `config` and the host `profile`.
    ///
    /// Explicit config values win over platform config keys, which win
    /// over built-in defaults.
    pub fn new(config: &InstallConfig, profile: PlatformProfile) -> Result<Self> {
        let workspace = Workspace::new(&config.workspace_root);
        let assistant_configured = config.assistant_configured();

        let native_tool = if config.native_source {
            NativeSourceTool::detect(&profile)
        } else {
            None
        };
        let acquirer = SourceAcquirer::new(workspace.clone()).with_native_tool(native_tool);

        let build_command = config
            .build_command
            .clone()
            .or_else(|| profile.config_value(platform::KEY_BUILD_COMMAND).map(str::to_string))
            .unwrap_or_else(|| build::DEFAULT_BUILD_COMMAND.to_string());
        let mobile_destination = profile
            .config_value(platform::KEY_MOBILE_DESTINATION)
            .unwrap_or(build::DEFAULT_MOBILE_DESTINATION)
            .to_string();
        let dispatcher = BuildDispatcher::new(profile.os_family())
            .with_build_command(build_command)
            .with_mobile_destination(mobile_destination)
            .with_assistant(assistant_configured);

        let install_root = config
            .install_root
            .clone()
            .or_else(|| profile.config_path(platform::KEY_INSTALL_ROOT));
        let shell_profile = if config.shell_update && profile.os_family() == OsFamily::Linux {
            let path = config
                .shell_profile
                .clone()
                .or_else(|| profile.config_path(platform::KEY_SHELL_PROFILE));
            let shell = match path {
                Some(path) => ShellProfile::new(path),
                None => ShellProfile::bashrc(profile.home_dir()),
            };
            // Kept apart from `<name>.lock` so no package name can collide with it.
            Some(shell.with_lock_dir(workspace.shared_locks_dir()))
        } else {
            None
        };
        let installer = Installer::new(profile.os_family(), workspace.envs_dir())
            .with_root_override(install_root)
            .with_shell_profile(shell_profile);

        let analyzer = SuitabilityAnalyzer::new(Arc::new(HeuristicPolicy::new()?), assistant_configured);

        Ok(Self {
            normalizer: BundleNormalizer::new(workspace.clone()),
            workspace,
            profile,
            acquirer,
            analyzer,
            dispatcher,
            installer,
            locks: PackageLocks::new(),
            strict_target: config.strict_target,
            assistant_configured,
            observer: None,
        })
    }

    /// Replaces the suitability policy.
    pub fn with_policy(mut self, policy: Arc<dyn SuitabilityPolicy>) -> Self {
        self.analyzer = SuitabilityAnalyzer::new(policy, self.assistant_configured);
        self
    }

    /// Replaces the translation collaborator.
    pub fn with_translator(mut self, translator: Arc<dyn Translator>) -> Self {
        self.dispatcher = self.dispatcher.with_translator(translator);
        self
    }

    /// Replaces the source acquirer.
    pub fn with_acquirer(mut self, acquirer: SourceAcquirer) -> Self {
        self.acquirer = acquirer;
        self
    }

    /// Registers a callback for stage progress.
    pub fn with_observer(mut self, observer: StageObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Workspace in use.
    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    /// Host profile in use.
    pub fn profile(&self) -> &PlatformProfile {
        &self.profile
    }

    /// Installer in use.
    pub fn installer(&self) -> &Installer {
        &self.installer
    }

    fn notify(&self, stage: Stage) {
        log::debug!("Stage: {}", stage);
        if let Some(observer) = &self.observer {
            observer(stage);
        }
    }

    /// Runs the full pipeline for `request`.
    ///
    /// Runs for the same package name are serialized; different names may
    /// proceed concurrently.
    pub async fn install_package(&self, request: &PackageRequest) -> Result<InstallReport> {
        request.validate()?;
        let name = request.name.as_str();
        let target = BuildTarget::resolve(
            &request.target_platform,
            request.language.as_deref(),
            self.strict_target,
        )?;
        self.acquirer.require_source(name, request.source_url.as_deref())?;

        let _guard = self.locks.acquire(name, &self.workspace.locks_dir()).await?;
        log::info!("Installing package {} ({})", name, target);

        self.notify(Stage::Fetching);
        let source_dir = self
            .acquirer
            .fetch(name, request.source_url.as_deref())
            .await
            .with_context(|| format!("fetching {}", name))?;

        self.notify(Stage::Normalizing);
        let bundle = self
            .normalizer
            .bundle(&source_dir, name)
            .await
            .with_context(|| format!("normalizing {}", name))?;

        self.notify(Stage::Analyzing);
        let analysis = self.analyzer.analyze(&bundle.extracted_dir, name, &target).await?;

        self.notify(Stage::Building);
        let build = self
            .dispatcher
            .build(&bundle.extracted_dir, name, &target)
            .await
            .with_context(|| format!("building {}", name))?;

        self.notify(Stage::Installing);
        let record = self
            .installer
            .install(&bundle.extracted_dir, name, request.install_env.as_deref())
            .await
            .with_context(|| format!("installing {}", name))?;

        log::info!("Installed {} into {}", name, record.install_path.display());
        Ok(InstallReport {
            bundle,
            target,
            analysis,
            build,
            record,
        })
    }

    /// Install records for `install_env` (or the default root).
    pub async fn records(&self, install_env: Option<&str>) -> Result<Vec<InstallRecord>> {
        self.installer.list_records(install_env).await
    }
}
