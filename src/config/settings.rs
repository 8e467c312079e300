//! Raw-to-typed settings validation.
//!
//! A settings object arrives as loose TOML (already merged with any
//! caller fragment). Each toolchain has a validating constructor here
//! that resolves paths against the config base, applies per-step
//! defaults, and coerces list fields through one shared combinator.
//! After construction every field a backend reads is guaranteed
//! present: failures happen here, before any subprocess is attempted.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use toml::Value;

use crate::config::definitions::{normalize_definitions, Define};
use crate::error::ConfigError;
use crate::util::fs::try_resolve;

/// Directory (relative to the config base) builds are staged in when
/// the settings do not say otherwise.
const DEFAULT_BUILD_DIR: &str = "build";

/// Default install prefix, relative to the config base.
const DEFAULT_DIST_DIR: &str = "dist";

/// Loose shape of one settings object, straight out of serde.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct RawConfig {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub emsdk: Option<PathBuf>,
    pub emsdk_version: Option<String>,
    /// Base directory for relative-path resolution; injected by the
    /// resolver, but an explicit local value wins.
    pub config_path: Option<PathBuf>,
    pub configure: Option<RawStep>,
    pub build: Option<RawStep>,
    pub clean: Option<RawStep>,
    pub install: Option<RawStep>,
}

/// Loose shape of one step sub-object.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct RawStep {
    pub path: Option<PathBuf>,
    pub target: Option<String>,
    pub arguments: Option<Value>,
    pub definitions: Option<Value>,
    pub macros: Option<Value>,
    /// CMake only: generator name for the configure step.
    pub generator: Option<String>,
    /// CMake only: CMAKE_BUILD_TYPE for the configure step.
    #[serde(rename = "type")]
    pub build_type: Option<String>,
    /// Install step only.
    pub binary_path: Option<PathBuf>,
    pub library_path: Option<PathBuf>,
    pub include_path: Option<PathBuf>,
}

/// SDK selection shared by every toolchain.
#[derive(Debug, Clone, PartialEq)]
pub struct SdkSettings {
    /// Explicit SDK install root; resolved lazily to a per-user
    /// default when unset.
    pub emsdk: Option<PathBuf>,
    /// Version to activate before any command runs. Defaulted here so
    /// it is guaranteed present for the rest of the bootstrap's life.
    pub emsdk_version: String,
}

impl SdkSettings {
    fn from_raw(raw: &RawConfig) -> Self {
        let emsdk_version = match raw.emsdk_version.as_deref() {
            Some(version) if !version.is_empty() => version.to_string(),
            _ => "latest".to_string(),
        };

        SdkSettings {
            emsdk: raw.emsdk.clone(),
            emsdk_version,
        }
    }
}

/// A configure step with a mandatory source path.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigureStep {
    pub path: PathBuf,
    pub arguments: Vec<String>,
}

/// The CMake configure step, with generator intent and cache
/// definitions.
#[derive(Debug, Clone, PartialEq)]
pub struct CmakeConfigure {
    pub path: PathBuf,
    pub generator: String,
    pub build_type: String,
    pub arguments: Vec<String>,
    pub definitions: Vec<Define>,
}

/// The build step of the staged toolchains; `path` is the build
/// (cache) directory and is always present after validation.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildStep {
    pub path: PathBuf,
    pub target: Option<String>,
    pub arguments: Vec<String>,
}

/// A make-driven step without a path of its own (it runs in the build
/// directory).
#[derive(Debug, Clone, PartialEq)]
pub struct ToolStep {
    pub path: Option<PathBuf>,
    pub target: Option<String>,
    pub arguments: Vec<String>,
}

/// The install step: a make target plus the install prefix and its
/// optional subdirectory overrides.
#[derive(Debug, Clone, PartialEq)]
pub struct InstallStep {
    pub path: PathBuf,
    pub target: Option<String>,
    pub arguments: Vec<String>,
    pub binary_path: Option<PathBuf>,
    pub library_path: Option<PathBuf>,
    pub include_path: Option<PathBuf>,
}

/// A Make step: target, extra arguments, and command-line macro
/// definitions.
#[derive(Debug, Clone, PartialEq)]
pub struct MakeStep {
    pub target: Option<String>,
    pub arguments: Vec<String>,
    pub definitions: Vec<Define>,
}

/// Settings for a plain-Makefile project.
#[derive(Debug, Clone, PartialEq)]
pub struct MakeConfig {
    pub sdk: SdkSettings,
    /// Source directory containing the Makefile; every step runs here.
    pub path: PathBuf,
    pub build: MakeStep,
    pub clean: MakeStep,
    pub install: MakeStep,
}

/// Settings for an Autotools (`./configure`) project.
#[derive(Debug, Clone, PartialEq)]
pub struct AutotoolsConfig {
    pub sdk: SdkSettings,
    pub configure: ConfigureStep,
    pub build: BuildStep,
    pub clean: ToolStep,
    pub install: InstallStep,
}

/// Settings for a CMake project.
#[derive(Debug, Clone, PartialEq)]
pub struct CmakeConfig {
    pub sdk: SdkSettings,
    pub configure: CmakeConfigure,
    pub build: BuildStep,
    pub clean: ToolStep,
    pub install: InstallStep,
}

impl MakeConfig {
    pub(crate) fn from_raw(raw: RawConfig, base: Option<&Path>) -> Result<Self, ConfigError> {
        let sdk = SdkSettings::from_raw(&raw);

        let build_raw = raw.build.unwrap_or_default();
        let path = match build_raw.path {
            Some(ref path) => try_resolve(path, base),
            None => {
                return Err(ConfigError::MissingPath {
                    step: "build",
                    expects: "your source directory (which contains Makefile)",
                })
            }
        };

        Ok(MakeConfig {
            sdk,
            path,
            build: make_step(build_raw, None)?,
            clean: make_step(raw.clean.unwrap_or_default(), Some("clean"))?,
            install: make_step(raw.install.unwrap_or_default(), Some("install"))?,
        })
    }
}

impl AutotoolsConfig {
    pub(crate) fn from_raw(raw: RawConfig, base: Option<&Path>) -> Result<Self, ConfigError> {
        let sdk = SdkSettings::from_raw(&raw);

        let configure_raw = raw.configure.ok_or(ConfigError::MissingPath {
            step: "configure",
            expects: "your source directory (which contains ./configure)",
        })?;
        let configure = ConfigureStep {
            path: require_path(
                configure_raw.path.as_deref(),
                base,
                "configure",
                "your source directory (which contains ./configure)",
            )?,
            arguments: coerce_string_list("arguments", configure_raw.arguments)?,
        };

        Ok(AutotoolsConfig {
            sdk,
            configure,
            build: build_step(raw.build.unwrap_or_default(), base)?,
            clean: tool_step(raw.clean.unwrap_or_default(), Some("clean"), base)?,
            install: install_step(raw.install.unwrap_or_default(), base)?,
        })
    }
}

impl CmakeConfig {
    pub(crate) fn from_raw(raw: RawConfig, base: Option<&Path>) -> Result<Self, ConfigError> {
        let sdk = SdkSettings::from_raw(&raw);

        let configure_raw = raw.configure.ok_or(ConfigError::MissingPath {
            step: "configure",
            expects: "your source directory (which contains CMakeLists.txt)",
        })?;
        let configure = CmakeConfigure {
            path: require_path(
                configure_raw.path.as_deref(),
                base,
                "configure",
                "your source directory (which contains CMakeLists.txt)",
            )?,
            generator: configure_raw
                .generator
                .filter(|g| !g.is_empty())
                .unwrap_or_else(|| "Ninja".to_string()),
            build_type: configure_raw
                .build_type
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| "Release".to_string()),
            arguments: coerce_string_list("arguments", configure_raw.arguments)?,
            definitions: normalize_definitions(
                configure_raw.definitions,
                configure_raw.macros,
            )?,
        };

        Ok(CmakeConfig {
            sdk,
            configure,
            build: build_step(raw.build.unwrap_or_default(), base)?,
            clean: tool_step(raw.clean.unwrap_or_default(), Some("clean"), base)?,
            install: install_step(raw.install.unwrap_or_default(), base)?,
        })
    }
}

fn make_step(raw: RawStep, default_target: Option<&str>) -> Result<MakeStep, ConfigError> {
    Ok(MakeStep {
        target: raw
            .target
            .filter(|t| !t.is_empty())
            .or_else(|| default_target.map(str::to_string)),
        arguments: coerce_string_list("arguments", raw.arguments)?,
        definitions: normalize_definitions(raw.definitions, raw.macros)?,
    })
}

fn build_step(raw: RawStep, base: Option<&Path>) -> Result<BuildStep, ConfigError> {
    let path = raw
        .path
        .unwrap_or_else(|| PathBuf::from(DEFAULT_BUILD_DIR));

    Ok(BuildStep {
        path: try_resolve(&path, base),
        target: raw.target,
        arguments: coerce_string_list("arguments", raw.arguments)?,
    })
}

fn tool_step(
    raw: RawStep,
    default_target: Option<&str>,
    base: Option<&Path>,
) -> Result<ToolStep, ConfigError> {
    Ok(ToolStep {
        path: raw.path.map(|path| try_resolve(&path, base)),
        target: raw
            .target
            .filter(|t| !t.is_empty())
            .or_else(|| default_target.map(str::to_string)),
        arguments: coerce_string_list("arguments", raw.arguments)?,
    })
}

fn install_step(raw: RawStep, base: Option<&Path>) -> Result<InstallStep, ConfigError> {
    let path = raw
        .path
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DIST_DIR));

    Ok(InstallStep {
        path: try_resolve(&path, base),
        target: raw
            .target
            .filter(|t| !t.is_empty())
            .or_else(|| Some("install".to_string())),
        arguments: coerce_string_list("arguments", raw.arguments)?,
        binary_path: raw.binary_path.map(|p| try_resolve(&p, base)),
        library_path: raw.library_path.map(|p| try_resolve(&p, base)),
        include_path: raw.include_path.map(|p| try_resolve(&p, base)),
    })
}

fn require_path(
    path: Option<&Path>,
    base: Option<&Path>,
    step: &'static str,
    expects: &'static str,
) -> Result<PathBuf, ConfigError> {
    match path {
        Some(path) => Ok(try_resolve(path, base)),
        None => Err(ConfigError::MissingPath { step, expects }),
    }
}

/// Coerce a list-typed settings field.
///
/// Every list field in a config goes through here: missing becomes
/// empty, a scalar is wrapped into a one-element list, and array
/// elements are stringified where they are unambiguous scalars.
pub(crate) fn coerce_string_list(
    field: &'static str,
    value: Option<Value>,
) -> Result<Vec<String>, ConfigError> {
    let Some(value) = value else {
        return Ok(Vec::new());
    };

    match value {
        Value::Array(elements) => elements
            .into_iter()
            .map(|element| scalar_to_string(field, element))
            .collect(),
        scalar => Ok(vec![scalar_to_string(field, scalar)?]),
    }
}

fn scalar_to_string(field: &'static str, value: Value) -> Result<String, ConfigError> {
    match value {
        Value::String(s) => Ok(s),
        Value::Integer(i) => Ok(i.to_string()),
        Value::Float(f) => Ok(f.to_string()),
        Value::Boolean(b) => Ok(b.to_string()),
        Value::Array(_) | Value::Table(_) | Value::Datetime(_) => {
            Err(ConfigError::ListField { field })
        }
    }
}
