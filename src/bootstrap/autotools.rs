//! The Autotools toolchain.
//!
//! Configure runs the project's `./configure` script through the
//! SDK's wrapper (`emconfigure`) with prefix flags derived from the
//! install settings. Make-driven steps guarantee a Makefile exists in
//! the build directory first: building never fails merely because
//! configure was skipped.

use anyhow::Result;

use crate::config::settings::{AutotoolsConfig, SdkSettings, ToolStep};
use crate::sdk::{RunOptions, SdkSession};
use crate::util::fs::ensure_dir;

use super::Backend;

const CONFIGURE_WRAPPER: &str = "emconfigure";
const MAKE_WRAPPER: &str = "emmake";

pub(crate) struct Autotools {
    config: AutotoolsConfig,
}

impl Autotools {
    pub(crate) fn new(config: AutotoolsConfig) -> Self {
        Autotools { config }
    }

    /// Flags for the configure script: install prefix, the optional
    /// directory overrides, then the caller's extra arguments.
    fn configure_arguments(&self) -> Vec<String> {
        let install = &self.config.install;
        let mut args = vec![format!("--prefix={}", install.path.display())];

        if let Some(ref binary) = install.binary_path {
            args.push(format!("--bindir={}", binary.display()));
        }
        if let Some(ref library) = install.library_path {
            args.push(format!("--libdir={}", library.display()));
        }
        if let Some(ref include) = install.include_path {
            args.push(format!("--includedir={}", include.display()));
        }

        args.extend(self.config.configure.arguments.iter().cloned());
        args
    }

    /// Configure if the build directory has no Makefile yet.
    fn ensure_configured(&mut self, session: &mut SdkSession) -> Result<()> {
        if self.config.build.path.join("Makefile").is_file() {
            return Ok(());
        }

        self.bind_configure(session)?;
        self.run_configure(session)
    }

    fn run_configure(&mut self, session: &mut SdkSession) -> Result<()> {
        let script = self.config.configure.path.join("configure");

        let mut args = vec![script.display().to_string()];
        args.extend(self.configure_arguments());

        session.run(
            CONFIGURE_WRAPPER,
            &args,
            &RunOptions::in_dir(&self.config.build.path),
        )
    }

    /// Run one make step in the build directory.
    fn run_make(
        &mut self,
        session: &mut SdkSession,
        target: Option<String>,
        arguments: Vec<String>,
    ) -> Result<()> {
        self.ensure_configured(session)?;

        let make = session.tools().make()?.display().to_string();

        let mut args = vec![make];
        if let Some(target) = target {
            args.push(target);
        }
        args.extend(arguments);

        session.run(
            MAKE_WRAPPER,
            &args,
            &RunOptions::in_dir(&self.config.build.path),
        )
    }

    fn step_parts(step: &ToolStep) -> (Option<String>, Vec<String>) {
        (step.target.clone(), step.arguments.clone())
    }
}

impl Backend for Autotools {
    fn name(&self) -> &'static str {
        "autotools"
    }

    fn sdk(&self) -> &SdkSettings {
        &self.config.sdk
    }

    fn bind_configure(&mut self, _session: &mut SdkSession) -> Result<()> {
        ensure_dir(&self.config.build.path)?;
        Ok(())
    }

    fn bind_make(&mut self, session: &mut SdkSession) -> Result<()> {
        session.tools().make()?;
        ensure_dir(&self.config.build.path)?;
        Ok(())
    }

    fn configure_step(&mut self, session: &mut SdkSession) -> Result<()> {
        self.run_configure(session)
    }

    fn build_step(&mut self, session: &mut SdkSession) -> Result<()> {
        let target = self.config.build.target.clone();
        let arguments = self.config.build.arguments.clone();
        self.run_make(session, target, arguments)
    }

    fn clean_step(&mut self, session: &mut SdkSession) -> Result<()> {
        let (target, arguments) = Self::step_parts(&self.config.clean);
        self.run_make(session, target, arguments)
    }

    fn install_step(&mut self, session: &mut SdkSession) -> Result<()> {
        let target = self.config.install.target.clone();
        let arguments = self.config.install.arguments.clone();
        self.run_make(session, target, arguments)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use tempfile::TempDir;

    use super::*;
    use crate::bootstrap::Bootstrap;
    use crate::config::{resolve_config, WorkingConfig};
    use crate::test_support::{mock_session, run_commands, MockSdk, SdkCall};

    fn autotools_config(source: &TempDir, build: &std::path::Path) -> WorkingConfig {
        let toml_str = format!(
            r#"
type = "autotools"
configure = {{ path = '{}', arguments = ["--disable-shared"] }}
build = {{ path = '{}' }}
install = {{ path = '/stage', binaryPath = '/stage/bin' }}
"#,
            source.path().display(),
            build.display(),
        );
        let table: toml::Table = toml_str.parse().unwrap();
        resolve_config(None, Some(toml::Value::Table(table))).unwrap()
    }

    fn runs(calls: &std::sync::Arc<std::sync::Mutex<Vec<SdkCall>>>) -> Vec<(String, Vec<String>)> {
        calls
            .lock()
            .unwrap()
            .iter()
            .filter_map(|call| match call {
                SdkCall::Run { command, args, .. } => Some((command.clone(), args.clone())),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_configure_invokes_wrapper_with_prefix_flags() {
        let source = TempDir::new().unwrap();
        let build = TempDir::new().unwrap();
        let config = autotools_config(&source, build.path());

        let mock = MockSdk::new();
        let calls = mock.calls();

        Bootstrap::new(config, mock_session(mock)).configure().unwrap();

        let runs = runs(&calls);
        assert_eq!(runs.len(), 1);
        let (command, args) = &runs[0];
        assert_eq!(command, "emconfigure");
        assert_eq!(
            args[0],
            source.path().join("configure").display().to_string()
        );
        assert_eq!(args[1], "--prefix=/stage");
        assert_eq!(args[2], "--bindir=/stage/bin");
        assert_eq!(args[3], "--disable-shared");
    }

    #[test]
    fn test_build_configures_first_when_no_makefile() {
        let source = TempDir::new().unwrap();
        let build = TempDir::new().unwrap();
        let config = autotools_config(&source, build.path());

        let mock = MockSdk::new();
        let calls = mock.calls();

        Bootstrap::new(config, mock_session(mock)).build().unwrap();

        assert_eq!(run_commands(&calls), vec!["emconfigure", "emmake"]);
    }

    #[test]
    fn test_build_skips_configure_when_makefile_exists() {
        let source = TempDir::new().unwrap();
        let build = TempDir::new().unwrap();
        fs::write(build.path().join("Makefile"), "all:\n").unwrap();
        let config = autotools_config(&source, build.path());

        let mock = MockSdk::new();
        let calls = mock.calls();

        Bootstrap::new(config, mock_session(mock)).build().unwrap();

        assert_eq!(run_commands(&calls), vec!["emmake"]);
    }

    #[test]
    fn test_clean_passes_target_through_make_wrapper() {
        let source = TempDir::new().unwrap();
        let build = TempDir::new().unwrap();
        fs::write(build.path().join("Makefile"), "all:\n").unwrap();
        let config = autotools_config(&source, build.path());

        let mock = MockSdk::new();
        let calls = mock.calls();

        Bootstrap::new(config, mock_session(mock)).clean().unwrap();

        let runs = runs(&calls);
        assert_eq!(runs[0].1, vec!["/mock/bin/make", "clean"]);
    }

    #[test]
    fn test_bind_creates_build_directory() {
        let source = TempDir::new().unwrap();
        let staging = TempDir::new().unwrap();
        let build = staging.path().join("nested/build");
        let config = autotools_config(&source, &build);

        let mock = MockSdk::new();
        Bootstrap::new(config, mock_session(mock)).configure().unwrap();

        assert!(build.is_dir());
    }

    #[test]
    fn test_reconfigure_cleans_then_configures() {
        let source = TempDir::new().unwrap();
        let build = TempDir::new().unwrap();
        fs::write(build.path().join("Makefile"), "all:\n").unwrap();
        let config = autotools_config(&source, build.path());

        let mock = MockSdk::new();
        let calls = mock.calls();

        Bootstrap::new(config, mock_session(mock)).reconfigure().unwrap();

        // clean (emmake) then configure (emconfigure).
        assert_eq!(run_commands(&calls), vec!["emmake", "emconfigure"]);
    }

    #[test]
    fn test_chaining_build_then_install() {
        let source = TempDir::new().unwrap();
        let build = TempDir::new().unwrap();
        fs::write(build.path().join("Makefile"), "all:\n").unwrap();
        let config = autotools_config(&source, build.path());

        let mock = MockSdk::new();
        let calls = mock.calls();

        let mut bootstrap = Bootstrap::new(config, mock_session(mock));
        bootstrap.build().unwrap().install().unwrap();

        let runs = runs(&calls);
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[1].1[1], "install");
        // The SDK was activated once for the whole chain.
        let activations = calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| matches!(call, SdkCall::Activate(_)))
            .count();
        assert_eq!(activations, 1);
    }

    #[test]
    fn test_run_in_dir_points_at_build_path() {
        let source = TempDir::new().unwrap();
        let build = TempDir::new().unwrap();
        fs::write(build.path().join("Makefile"), "all:\n").unwrap();
        let config = autotools_config(&source, build.path());

        let mock = MockSdk::new();
        let calls = mock.calls();

        Bootstrap::new(config, mock_session(mock)).build().unwrap();

        let calls = calls.lock().unwrap();
        let cwd = calls
            .iter()
            .find_map(|call| match call {
                SdkCall::Run { cwd, .. } => cwd.clone(),
                _ => None,
            })
            .unwrap();
        assert_eq!(cwd, PathBuf::from(build.path()));
    }
}
