//! The Make toolchain.
//!
//! Plain Makefiles have no separate configure phase; every step runs
//! the SDK's make wrapper (`emmake`) against the resolved make
//! executable in the configured source directory.

use anyhow::Result;

use crate::config::definitions::render_make;
use crate::config::settings::{MakeConfig, MakeStep, SdkSettings};
use crate::sdk::{RunOptions, SdkSession};

use super::Backend;

/// The SDK wrapper every make invocation goes through.
const MAKE_WRAPPER: &str = "emmake";

pub(crate) struct Make {
    config: MakeConfig,
}

impl Make {
    pub(crate) fn new(config: MakeConfig) -> Self {
        Make { config }
    }

    /// Run one make step: `emmake <make> [target] [args..] [defs..]`
    /// in the source directory.
    fn run_make(&self, session: &mut SdkSession, step: &MakeStep) -> Result<()> {
        let make = session.tools().make()?.display().to_string();

        let mut args = vec![make];
        if let Some(ref target) = step.target {
            args.push(target.clone());
        }
        args.extend(step.arguments.iter().cloned());
        args.extend(render_make(&step.definitions));

        session.run(MAKE_WRAPPER, &args, &RunOptions::in_dir(&self.config.path))
    }
}

impl Backend for Make {
    fn name(&self) -> &'static str {
        "make"
    }

    fn sdk(&self) -> &SdkSettings {
        &self.config.sdk
    }

    fn bind_configure(&mut self, _session: &mut SdkSession) -> Result<()> {
        // Nothing to probe and nothing to create; the source
        // directory carries the Makefile.
        Ok(())
    }

    fn bind_make(&mut self, session: &mut SdkSession) -> Result<()> {
        session.tools().make()?;
        Ok(())
    }

    fn configure_step(&mut self, _session: &mut SdkSession) -> Result<()> {
        // Nothing to do, make is not configurable.
        Ok(())
    }

    fn build_step(&mut self, session: &mut SdkSession) -> Result<()> {
        self.run_make(session, &self.config.build)
    }

    fn clean_step(&mut self, session: &mut SdkSession) -> Result<()> {
        self.run_make(session, &self.config.clean)
    }

    fn install_step(&mut self, session: &mut SdkSession) -> Result<()> {
        self.run_make(session, &self.config.install)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::bootstrap::Bootstrap;
    use crate::config::{resolve_config, WorkingConfig};
    use crate::test_support::{mock_session, MockSdk, SdkCall};

    fn make_config(toml_str: &str) -> WorkingConfig {
        let table: toml::Table = toml_str.parse().unwrap();
        resolve_config(None, Some(toml::Value::Table(table))).unwrap()
    }

    fn run_args(call: &SdkCall) -> (String, Vec<String>, Option<PathBuf>) {
        match call {
            SdkCall::Run { command, args, cwd } => {
                (command.clone(), args.clone(), cwd.clone())
            }
            other => panic!("expected a run call, got {other:?}"),
        }
    }

    #[test]
    fn test_build_has_no_target_and_runs_in_source_dir() {
        let config = make_config(
            r#"
type = "make"
build = { path = "/src/proj", arguments = ["-j4"] }
"#,
        );
        let mock = MockSdk::new();
        let calls = mock.calls();

        Bootstrap::new(config, mock_session(mock)).build().unwrap();

        let calls = calls.lock().unwrap();
        // install + activate for "latest", then the make run.
        let (command, args, cwd) = run_args(&calls[2]);
        assert_eq!(command, "emmake");
        assert_eq!(args, vec!["/mock/bin/make", "-j4"]);
        assert_eq!(cwd, Some(PathBuf::from("/src/proj")));
    }

    #[test]
    fn test_clean_and_install_lead_with_their_targets() {
        let config = make_config(
            r#"
type = "make"
build = { path = "/src/proj" }
clean = { arguments = ["-s"] }
"#,
        );
        let mock = MockSdk::new();
        let calls = mock.calls();

        let mut bootstrap = Bootstrap::new(config, mock_session(mock));
        bootstrap.clean().unwrap().install().unwrap();

        let calls = calls.lock().unwrap();
        let (_, clean_args, _) = run_args(&calls[2]);
        assert_eq!(clean_args, vec!["/mock/bin/make", "clean", "-s"]);
        let (_, install_args, _) = run_args(&calls[3]);
        assert_eq!(install_args, vec!["/mock/bin/make", "install"]);
    }

    #[test]
    fn test_definitions_append_after_arguments() {
        let config = make_config(
            r#"
type = "make"
build = { path = "/src", arguments = ["-j2"], definitions = [["DEBUG", true], ["VERBOSE"]] }
"#,
        );
        let mock = MockSdk::new();
        let calls = mock.calls();

        Bootstrap::new(config, mock_session(mock)).build().unwrap();

        let calls = calls.lock().unwrap();
        let (_, args, _) = run_args(&calls[2]);
        assert_eq!(args, vec!["/mock/bin/make", "-j2", "DEBUG=1", "VERBOSE"]);
    }

    #[test]
    fn test_configure_is_a_noop() {
        let config = make_config(
            r#"
type = "make"
build = { path = "/src" }
"#,
        );
        let mock = MockSdk::new();
        let calls = mock.calls();

        Bootstrap::new(config, mock_session(mock)).configure().unwrap();

        let calls = calls.lock().unwrap();
        // SDK activation happens, but no subprocess runs.
        assert!(calls.iter().all(|call| call.run_command().is_none()));
    }

    #[test]
    fn test_compile_retries_once_with_clean_configure_build() {
        let config = make_config(
            r#"
type = "make"
build = { path = "/src" }
"#,
        );
        // Fail every build invocation (a make run without a target).
        let mock = MockSdk::new().fail_when(|call| match call {
            SdkCall::Run { args, .. } => !args.iter().any(|a| a == "clean"),
            _ => false,
        });
        let calls = mock.calls();

        let err = Bootstrap::new(config, mock_session(mock))
            .compile()
            .unwrap_err();

        // The rejection is the retry's, and the sequence is exactly
        // build, clean, build (configure is make's no-op).
        let build_err = err.downcast_ref::<crate::error::BuildError>().unwrap();
        assert!(matches!(
            build_err,
            crate::error::BuildError::Subprocess { .. }
        ));

        let calls = calls.lock().unwrap();
        let runs: Vec<Vec<String>> = calls
            .iter()
            .filter_map(|call| match call {
                SdkCall::Run { args, .. } => Some(args.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(runs.len(), 3);
        assert_eq!(runs[0], vec!["/mock/bin/make"]);
        assert_eq!(runs[1], vec!["/mock/bin/make", "clean"]);
        assert_eq!(runs[2], vec!["/mock/bin/make"]);
    }

    #[test]
    fn test_compile_succeeds_without_retry_when_build_passes() {
        let config = make_config(
            r#"
type = "make"
build = { path = "/src" }
"#,
        );
        let mock = MockSdk::new();
        let calls = mock.calls();

        Bootstrap::new(config, mock_session(mock)).compile().unwrap();

        let calls = calls.lock().unwrap();
        let runs: Vec<_> = calls
            .iter()
            .filter(|call| call.run_command().is_some())
            .collect();
        assert_eq!(runs.len(), 1);
    }
}
