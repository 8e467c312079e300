//! Configuration resolution.
//!
//! [`resolve_config`] turns a locator (directory, file path, or the
//! name of a settings object) plus an optional caller-supplied
//! fragment into one validated [`WorkingConfig`]: discovery finds a
//! master config, selection picks the named settings object, the
//! fragment deep-merges on top, and the result is validated into the
//! typed config for its toolchain.

pub mod definitions;
pub mod locate;
pub mod merge;
pub mod settings;

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use anyhow::Result;
use toml::Value;

use crate::error::ConfigError;

use self::locate::MasterConfig;
use self::merge::deep_merge;
use self::settings::{AutotoolsConfig, CmakeConfig, MakeConfig, RawConfig, SdkSettings};

/// The toolchain discriminant every settings object must declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolchainKind {
    Make,
    Autotools,
    Cmake,
}

impl ToolchainKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolchainKind::Make => "make",
            ToolchainKind::Autotools => "autotools",
            ToolchainKind::Cmake => "cmake",
        }
    }
}

impl fmt::Display for ToolchainKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolchainKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "make" => Ok(ToolchainKind::Make),
            "autotools" => Ok(ToolchainKind::Autotools),
            "cmake" => Ok(ToolchainKind::Cmake),
            other => Err(ConfigError::UnknownType {
                found: other.to_string(),
            }),
        }
    }
}

/// A resolved, validated settings object, ready to drive a bootstrap.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkingConfig {
    Make(MakeConfig),
    Autotools(AutotoolsConfig),
    Cmake(CmakeConfig),
}

impl WorkingConfig {
    pub fn kind(&self) -> ToolchainKind {
        match self {
            WorkingConfig::Make(_) => ToolchainKind::Make,
            WorkingConfig::Autotools(_) => ToolchainKind::Autotools,
            WorkingConfig::Cmake(_) => ToolchainKind::Cmake,
        }
    }

    pub fn sdk(&self) -> &SdkSettings {
        match self {
            WorkingConfig::Make(c) => &c.sdk,
            WorkingConfig::Autotools(c) => &c.sdk,
            WorkingConfig::Cmake(c) => &c.sdk,
        }
    }

    /// Validate a merged settings value into the typed config for its
    /// declared toolchain.
    fn from_value(name: &str, value: Value, base: Option<&Path>) -> Result<Self, ConfigError> {
        if !matches!(value, Value::Table(_)) {
            return Err(ConfigError::Shape {
                name: name.to_string(),
                reason: format!("expected a table, got {}", value.type_str()),
            });
        }

        let raw: RawConfig = value.try_into().map_err(|e: toml::de::Error| {
            ConfigError::Shape {
                name: name.to_string(),
                reason: e.message().to_string(),
            }
        })?;

        let kind = match raw.kind.as_deref() {
            None => {
                return Err(ConfigError::MissingType {
                    name: name.to_string(),
                })
            }
            Some(kind) => kind.parse::<ToolchainKind>()?,
        };

        // A locally declared configPath wins over the discovered one.
        let local_base = raw.config_path.clone();
        let base = local_base.as_deref().or(base);

        match kind {
            ToolchainKind::Make => Ok(WorkingConfig::Make(MakeConfig::from_raw(raw, base)?)),
            ToolchainKind::Autotools => Ok(WorkingConfig::Autotools(
                AutotoolsConfig::from_raw(raw, base)?,
            )),
            ToolchainKind::Cmake => Ok(WorkingConfig::Cmake(CmakeConfig::from_raw(raw, base)?)),
        }
    }
}

/// Resolve a working config from a locator and/or a config fragment.
///
/// With neither, the current working directory is searched. A fragment
/// without a locator skips discovery entirely: the fragment is the
/// sole settings source. With both, the fragment deep-merges onto the
/// selected settings object, arrays replacing rather than
/// concatenating.
pub fn resolve_config(locator: Option<&str>, fragment: Option<Value>) -> Result<WorkingConfig> {
    // An unset locator only defaults to the cwd when there is no
    // fragment to act as the sole source.
    let cwd_locator;
    let locator = match (locator, &fragment) {
        (Some(locator), _) if !locator.is_empty() => Some(locator),
        (None, Some(_)) => None,
        _ => {
            cwd_locator = std::env::current_dir()?.display().to_string();
            Some(cwd_locator.as_str())
        }
    };

    let master = match locator {
        Some(locator) => locate::find_master_config(locator)?,
        None => MasterConfig::empty(),
    };

    let MasterConfig {
        mut table,
        config_path,
        default,
        origin,
    } = master;

    // Reserved top-level keys come out of the table before selection.
    let emsdk = table.remove("emsdk");
    let emsdk_version = table.remove("emsdkVersion");
    table.remove("default");

    let locator_label = locator.unwrap_or("<fragment>").to_string();

    let mut working = match default {
        Some(name) => match table.remove(&name) {
            Some(value) => Some((name, value)),
            None => {
                return Err(ConfigError::UnknownBase {
                    name,
                    path: origin.unwrap_or_default(),
                }
                .into())
            }
        },
        None => None,
    };

    // An empty master config with a caller fragment means the fragment
    // is the working config outright.
    let mut fragment = fragment;
    if working.is_none() && table.is_empty() {
        if let Some(value) = fragment.take() {
            working = Some(("<fragment>".to_string(), value));
        }
    }

    let (name, mut value) = match working {
        Some((name, value)) if !is_empty_table(&value) => (name, value),
        _ => {
            return Err(ConfigError::Ambiguous {
                locator: locator_label,
            }
            .into())
        }
    };

    if let Some(fragment) = fragment {
        deep_merge(&mut value, fragment);
    }

    // Reinject the reserved keys unless the selected object already
    // defines them locally.
    if let (Some(emsdk), Value::Table(table)) = (emsdk, &mut value) {
        table.entry("emsdk").or_insert(emsdk);
    }
    if let (Some(version), Value::Table(table)) = (emsdk_version, &mut value) {
        table.entry("emsdkVersion").or_insert(version);
    }

    let config = WorkingConfig::from_value(&name, value, config_path.as_deref())?;
    tracing::debug!(
        toolchain = config.kind().as_str(),
        config = name.as_str(),
        "resolved working config"
    );

    Ok(config)
}

fn is_empty_table(value: &Value) -> bool {
    matches!(value, Value::Table(table) if table.is_empty())
}
