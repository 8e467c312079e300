//! Test utilities and mocks for embark unit tests.
//!
//! The interesting seams in this crate are the SDK activator (every
//! subprocess goes through it) and the probed-tool cache. The mock
//! here records every SDK call in order and can be told to fail
//! selected calls, which is how the bootstrap tests observe binding
//! order, configure-if-needed behavior, and the compile() retry.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::Result;

use crate::error::BuildError;
use crate::sdk::{RunOptions, SdkActivator, SdkSession, UpdatePolicy};

/// One recorded SDK interaction.
#[derive(Debug, Clone, PartialEq)]
pub enum SdkCall {
    Update,
    Install(String),
    Activate(String),
    Run {
        command: String,
        args: Vec<String>,
        cwd: Option<PathBuf>,
    },
}

impl SdkCall {
    /// The command of a `Run` call, if this is one.
    pub fn run_command(&self) -> Option<&str> {
        match self {
            SdkCall::Run { command, .. } => Some(command),
            _ => None,
        }
    }
}

type FailPredicate = dyn Fn(&SdkCall) -> bool + Send + Sync;

/// A recording SDK activator.
#[derive(Clone, Default)]
pub struct MockSdk {
    calls: Arc<Mutex<Vec<SdkCall>>>,
    fail_when: Option<Arc<FailPredicate>>,
}

impl MockSdk {
    pub fn new() -> Self {
        MockSdk::default()
    }

    /// Shared handle to the recorded calls; keep a clone before moving
    /// the mock into a session.
    pub fn calls(&self) -> Arc<Mutex<Vec<SdkCall>>> {
        Arc::clone(&self.calls)
    }

    /// Fail any call matching the predicate with a subprocess error.
    pub fn fail_when<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&SdkCall) -> bool + Send + Sync + 'static,
    {
        self.fail_when = Some(Arc::new(predicate));
        self
    }

    fn record(&self, call: SdkCall) -> Result<()> {
        let failed = self
            .fail_when
            .as_ref()
            .map(|predicate| predicate(&call))
            .unwrap_or(false);

        let label = match &call {
            SdkCall::Update => "emsdk update".to_string(),
            SdkCall::Install(v) => format!("emsdk install {v}"),
            SdkCall::Activate(v) => format!("emsdk activate {v}"),
            SdkCall::Run { command, args, .. } => {
                let mut parts = vec![command.clone()];
                parts.extend(args.iter().cloned());
                parts.join(" ")
            }
        };

        self.calls.lock().unwrap().push(call);

        if failed {
            return Err(BuildError::Subprocess {
                command: label,
                code: Some(1),
            }
            .into());
        }
        Ok(())
    }
}

impl SdkActivator for MockSdk {
    fn update(&self) -> Result<()> {
        self.record(SdkCall::Update)
    }

    fn install(&self, version: &str) -> Result<()> {
        self.record(SdkCall::Install(version.to_string()))
    }

    fn activate(&self, version: &str) -> Result<()> {
        self.record(SdkCall::Activate(version.to_string()))
    }

    fn run(&self, command: &str, args: &[String], options: &RunOptions) -> Result<()> {
        self.record(SdkCall::Run {
            command: command.to_string(),
            args: args.to_vec(),
            cwd: options.cwd.clone(),
        })
    }
}

/// A session over a mock SDK with every tool probe pre-resolved, so
/// tests never touch the host PATH.
pub fn mock_session(mock: MockSdk) -> SdkSession {
    let mut session = SdkSession::new(Box::new(mock), UpdatePolicy::Never);
    session.tools().preload(
        Some(PathBuf::from("/mock/bin/cmake")),
        Some(PathBuf::from("/mock/bin/make")),
        Some(PathBuf::from("/mock/bin/ninja")),
        Some(PathBuf::from("/mock/bin/msbuild")),
    );
    session
}

/// Shorthand for the `Run` commands observed, in order.
pub fn run_commands(calls: &Arc<Mutex<Vec<SdkCall>>>) -> Vec<String> {
    calls
        .lock()
        .unwrap()
        .iter()
        .filter_map(|call| call.run_command().map(str::to_string))
        .collect()
}
