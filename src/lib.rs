//! Embark - an Emscripten SDK build orchestrator
//!
//! Embark resolves a declarative build configuration for a C/C++
//! project, selects the native toolchain that governs it (Make,
//! Autotools, or CMake), and drives that toolchain inside an activated
//! Emscripten SDK environment.

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod ops;
pub mod sdk;
pub mod toolchain;
pub mod util;

/// Test utilities and mocks for embark unit tests.
///
/// This module is only available when compiling tests. It provides a
/// recording mock for the SDK activator and a pre-probed session so
/// bootstrap tests never touch the host toolchain.
#[cfg(test)]
pub mod test_support;

pub use bootstrap::Bootstrap;
pub use config::{resolve_config, ToolchainKind, WorkingConfig};
pub use error::{BuildError, ConfigError};
pub use sdk::{Emsdk, RunOptions, SdkActivator, SdkSession, UpdatePolicy};
pub use toolchain::ToolCache;
