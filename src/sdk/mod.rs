//! The Emscripten SDK collaborator surface.
//!
//! The SDK is an opaque service: it can be updated, a version can be
//! installed and activated, and commands can be run inside its
//! environment. [`SdkSession`] is the per-invocation context that
//! memoizes what the old process-global caches used to: the currently
//! active version, which versions were installed this session, whether
//! an update check already ran, and the probed tool paths.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::config::settings::SdkSettings;
use crate::error::BuildError;
use crate::toolchain::ToolCache;
use crate::util::ProcessBuilder;

/// Options for running a command inside the SDK environment.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub cwd: Option<PathBuf>,
    /// Route through the platform shell (needed for the SDK's batch
    /// wrappers on Windows).
    pub shell: bool,
}

impl RunOptions {
    /// The conventional options for a build step: run in `cwd`, shell
    /// on Windows.
    pub fn in_dir(cwd: impl Into<PathBuf>) -> Self {
        RunOptions {
            cwd: Some(cwd.into()),
            shell: cfg!(windows),
        }
    }
}

/// The operations the SDK exposes. Implementations are thin; all
/// decision logic lives in [`SdkSession`].
pub trait SdkActivator {
    /// Pull the latest SDK release tags.
    fn update(&self) -> Result<()>;

    /// Install a version. Implementations skip work when the version
    /// is already on disk.
    fn install(&self, version: &str) -> Result<()>;

    /// Make a version the system-wide active one.
    fn activate(&self, version: &str) -> Result<()>;

    /// Run a command inside the SDK environment. Fails when the
    /// process exits non-zero.
    fn run(&self, command: &str, args: &[String], options: &RunOptions) -> Result<()>;
}

/// When to check the SDK server for updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpdatePolicy {
    /// Check once per session, before the first install.
    #[default]
    Auto,
    /// Check before every install.
    Always,
    /// Never check.
    Never,
}

/// Per-invocation SDK state threaded through every operation.
pub struct SdkSession {
    activator: Box<dyn SdkActivator>,
    tools: ToolCache,
    update_policy: UpdatePolicy,
    has_updated: bool,
    installed: Vec<String>,
    active: Option<String>,
}

impl SdkSession {
    pub fn new(activator: Box<dyn SdkActivator>, update_policy: UpdatePolicy) -> Self {
        SdkSession {
            activator,
            tools: ToolCache::new(),
            update_policy,
            has_updated: false,
            installed: Vec::new(),
            active: None,
        }
    }

    /// Build a session for a resolved config, honoring its `emsdk`
    /// install root when set.
    pub fn for_config(sdk: &SdkSettings, update_policy: UpdatePolicy) -> Result<Self> {
        let root = match sdk.emsdk {
            Some(ref root) => root.clone(),
            None => Emsdk::default_root()?,
        };
        Ok(SdkSession::new(Box::new(Emsdk::new(root)), update_policy))
    }

    /// The probed-tool cache for this invocation.
    pub fn tools(&mut self) -> &mut ToolCache {
        &mut self.tools
    }

    /// Install a version, updating first when the policy calls for it.
    pub fn install(&mut self, version: &str) -> Result<()> {
        let should_update = match self.update_policy {
            UpdatePolicy::Always => true,
            UpdatePolicy::Auto => !self.has_updated,
            UpdatePolicy::Never => false,
        };
        if should_update {
            self.has_updated = true;
            self.activator.update()?;
        }

        if !self.installed.iter().any(|v| v == version) {
            self.activator.install(version)?;
            self.installed.push(version.to_string());
        }
        Ok(())
    }

    /// Activate a version, installing it first if needed. Activating
    /// the already-active version is a no-op; switching versions is an
    /// ordinary transition, but only one version is active at a time
    /// system-wide.
    pub fn activate(&mut self, version: &str) -> Result<()> {
        if self.active.as_deref() == Some(version) {
            return Ok(());
        }

        self.install(version)?;
        self.activator.activate(version)?;
        tracing::debug!(version, "activated emsdk");
        self.active = Some(version.to_string());
        Ok(())
    }

    /// Run a command inside the SDK environment.
    pub fn run(&mut self, command: &str, args: &[String], options: &RunOptions) -> Result<()> {
        tracing::debug!(command, ?args, "running in SDK environment");
        self.activator.run(command, args, options)
    }
}

/// The real `emsdk` checkout: a directory containing the `emsdk`
/// management script and, once installed, the toolchain wrappers
/// (`emcmake`, `emconfigure`, `emmake`, …).
pub struct Emsdk {
    root: PathBuf,
}

impl Emsdk {
    pub fn new(root: PathBuf) -> Self {
        Emsdk { root }
    }

    /// Default install root when the config does not pin one.
    pub fn default_root() -> Result<PathBuf> {
        let dirs = directories::BaseDirs::new()
            .context("could not determine a home directory for the default emsdk root")?;
        Ok(dirs.home_dir().join(".embark").join("emsdk"))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn script(&self) -> PathBuf {
        let name = if cfg!(windows) { "emsdk.bat" } else { "emsdk" };
        self.root.join(name)
    }

    /// A builder for the management script, verified present.
    fn script_command(&self) -> Result<ProcessBuilder> {
        let script = self.script();
        if !script.is_file() {
            return Err(BuildError::ToolNotFound {
                tool: "emsdk".to_string(),
                hint: Some(format!(
                    "clone https://github.com/emscripten-core/emsdk to {} (or set `emsdk` in embark.toml)",
                    self.root.display()
                )),
            }
            .into());
        }
        Ok(ProcessBuilder::new(script).shell(cfg!(windows)))
    }

    /// PATH for commands run inside the SDK environment: the SDK root
    /// (wrapper scripts) and the emscripten tools, ahead of the
    /// caller's PATH.
    fn environment_path(&self) -> String {
        let mut paths = vec![
            self.root.clone(),
            self.root.join("upstream").join("emscripten"),
        ];
        if let Some(existing) = std::env::var_os("PATH") {
            paths.extend(std::env::split_paths(&existing));
        }

        std::env::join_paths(paths)
            .map(|joined| joined.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

impl SdkActivator for Emsdk {
    fn update(&self) -> Result<()> {
        self.script_command()?.arg("update").status_and_check()
    }

    fn install(&self, version: &str) -> Result<()> {
        self.script_command()?
            .args(["install", version])
            .status_and_check()
    }

    fn activate(&self, version: &str) -> Result<()> {
        self.script_command()?
            .args(["activate", version])
            .status_and_check()
    }

    fn run(&self, command: &str, args: &[String], options: &RunOptions) -> Result<()> {
        let mut builder = ProcessBuilder::new(command)
            .args(args)
            .env("EMSDK", self.root.display().to_string())
            .env("PATH", self.environment_path())
            .shell(options.shell);

        if let Some(ref cwd) = options.cwd {
            builder = builder.cwd(cwd);
        }

        builder.status_and_check()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MockSdk, SdkCall};

    #[test]
    fn test_activate_is_idempotent_per_version() {
        let mock = MockSdk::new();
        let calls = mock.calls();
        let mut session = SdkSession::new(Box::new(mock), UpdatePolicy::Never);

        session.activate("latest").unwrap();
        session.activate("latest").unwrap();

        let calls = calls.lock().unwrap();
        assert_eq!(
            *calls,
            vec![
                SdkCall::Install("latest".into()),
                SdkCall::Activate("latest".into()),
            ]
        );
    }

    #[test]
    fn test_activate_switches_versions() {
        let mock = MockSdk::new();
        let calls = mock.calls();
        let mut session = SdkSession::new(Box::new(mock), UpdatePolicy::Never);

        session.activate("3.1.0").unwrap();
        session.activate("latest").unwrap();

        let calls = calls.lock().unwrap();
        assert_eq!(
            *calls,
            vec![
                SdkCall::Install("3.1.0".into()),
                SdkCall::Activate("3.1.0".into()),
                SdkCall::Install("latest".into()),
                SdkCall::Activate("latest".into()),
            ]
        );
    }

    #[test]
    fn test_auto_update_runs_once_per_session() {
        let mock = MockSdk::new();
        let calls = mock.calls();
        let mut session = SdkSession::new(Box::new(mock), UpdatePolicy::Auto);

        session.install("a").unwrap();
        session.install("b").unwrap();

        let calls = calls.lock().unwrap();
        assert_eq!(
            *calls,
            vec![
                SdkCall::Update,
                SdkCall::Install("a".into()),
                SdkCall::Install("b".into()),
            ]
        );
    }

    #[test]
    fn test_always_update_runs_every_install() {
        let mock = MockSdk::new();
        let calls = mock.calls();
        let mut session = SdkSession::new(Box::new(mock), UpdatePolicy::Always);

        session.install("a").unwrap();
        session.install("a").unwrap();

        let calls = calls.lock().unwrap();
        // The version is cached but the update still runs.
        assert_eq!(
            *calls,
            vec![SdkCall::Update, SdkCall::Install("a".into()), SdkCall::Update]
        );
    }

    #[test]
    fn test_missing_emsdk_script_is_tool_not_found() {
        let tmp = tempfile::TempDir::new().unwrap();
        let emsdk = Emsdk::new(tmp.path().join("emsdk"));

        let err = emsdk.install("latest").unwrap_err();
        let build_err = err.downcast_ref::<crate::error::BuildError>().unwrap();
        assert!(matches!(build_err, crate::error::BuildError::ToolNotFound { .. }));
    }
}
