//! Master-config discovery.
//!
//! A locator is the name of a settings object, a path to a settings or
//! build file, or a path to a directory containing either. Discovery
//! probes a small fixed set of directories and conventional filenames
//! and produces a [`MasterConfig`]: the named settings objects, the
//! directory relative paths resolve against, and (when determinable)
//! which named object is selected.

use std::path::{Path, PathBuf};

use anyhow::Result;
use toml::Value;

use crate::error::ConfigError;
use crate::util::fs::{is_dir, is_file, main_module_dir, try_resolve};

/// The dedicated settings file name.
pub const SETTINGS_FILE: &str = "embark.toml";

/// Conventional filenames probed in order when the locator is not
/// itself a file. The settings file always wins over raw build files.
const FILE_SEARCH_SET: &[&str] = &[
    SETTINGS_FILE,
    "CMakeLists.txt",
    "configure",
    "Makefile",
    "makefile",
];

/// Key under which a config synthesized from a bare build file is
/// stored, with `default` pointing at it.
const DETECTED_KEY: &str = "detected";

/// A discovered master config, not yet reduced to a working config.
#[derive(Debug, Clone, Default)]
pub(crate) struct MasterConfig {
    /// Top-level table: named settings objects plus reserved scalar
    /// keys (`emsdk`, `emsdkVersion`).
    pub table: toml::Table,
    /// Directory relative paths in the selected config resolve
    /// against: the settings file's directory, or the invocation cwd
    /// for synthesized configs.
    pub config_path: Option<PathBuf>,
    /// The named settings object to use, when determinable.
    pub default: Option<String>,
    /// Where the master config came from, for error messages.
    pub origin: Option<PathBuf>,
}

impl MasterConfig {
    /// The empty master config used when discovery is skipped.
    pub fn empty() -> Self {
        MasterConfig::default()
    }
}

/// Discover the master config for a locator.
///
/// If the locator resolves to an existing directory, only that
/// directory is searched. Otherwise two approximated roots are probed:
/// the running executable's directory and the current working
/// directory, in that order.
pub(crate) fn find_master_config(locator: &str) -> Result<MasterConfig> {
    let direct = try_resolve(Path::new(locator), None);
    let dir_search_set: Vec<PathBuf> = if is_dir(&direct) {
        vec![direct]
    } else {
        let cwd = std::env::current_dir()?;
        vec![main_module_dir(), cwd]
    };

    for dir in &dir_search_set {
        let locator_test = try_resolve(Path::new(locator), Some(dir));

        let file_search_set: Vec<PathBuf> = if is_file(&locator_test) {
            vec![locator_test]
        } else {
            FILE_SEARCH_SET.iter().map(|name| dir.join(name)).collect()
        };

        for file in file_search_set {
            if !is_file(&file) {
                continue;
            }

            let is_settings = file
                .file_name()
                .map(|name| name.to_string_lossy().contains(SETTINGS_FILE))
                .unwrap_or(false);

            return if is_settings {
                load_settings_file(&file, locator)
            } else {
                synthesize_from_build_file(&file)
            };
        }
    }

    Err(ConfigError::NotFound {
        locator: locator.to_string(),
    }
    .into())
}

/// Load a settings file and work out which named object it selects.
///
/// Selection precedence: the locator itself naming an object, then the
/// file's own `default` key, then a single object being the only
/// candidate. Anything else is left unselected and surfaces later as
/// an ambiguity error.
fn load_settings_file(path: &Path, locator: &str) -> Result<MasterConfig> {
    let table = read_settings_table(path)?;

    let default = if matches!(table.get(locator), Some(Value::Table(_))) {
        Some(locator.to_string())
    } else if let Some(Value::String(name)) = table.get("default") {
        Some(name.clone())
    } else {
        let mut object_keys = table
            .iter()
            .filter(|(_, value)| matches!(value, Value::Table(_)))
            .map(|(key, _)| key.clone());
        let first = object_keys.next();
        match (first, object_keys.next()) {
            (Some(only), None) => Some(only),
            _ => None,
        }
    };

    Ok(MasterConfig {
        table,
        config_path: path.parent().map(Path::to_path_buf),
        default,
        origin: Some(path.to_path_buf()),
    })
}

fn read_settings_table(path: &Path) -> Result<toml::Table> {
    let load_err = |reason: String| ConfigError::Load {
        path: path.to_path_buf(),
        reason,
    };

    let contents =
        std::fs::read_to_string(path).map_err(|e| load_err(e.to_string()))?;

    let table = contents
        .parse::<toml::Table>()
        .map_err(|e| load_err(e.message().to_string()))?;

    Ok(table)
}

/// Build a single-entry master config from a located build file.
///
/// The toolchain is inferred from the filename; the matching step's
/// path points at the file's directory, and relative paths resolve
/// against the invocation cwd the way traditional build tools treat
/// their staging area.
fn synthesize_from_build_file(build_file: &Path) -> Result<MasterConfig> {
    let name = build_file
        .file_name()
        .map(|name| name.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    let kind = if name.contains("cmake") {
        "cmake"
    } else if name.contains("configure") {
        "autotools"
    } else if name.contains("makefile") {
        "make"
    } else {
        return Err(ConfigError::UnknownBuildFile {
            path: build_file.to_path_buf(),
        }
        .into());
    };

    let source_dir = build_file
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf();

    let mut step = toml::Table::new();
    step.insert(
        "path".into(),
        Value::String(source_dir.display().to_string()),
    );

    let mut config = toml::Table::new();
    config.insert("type".into(), Value::String(kind.to_string()));
    // Make has no configure step; its source path lives on `build`.
    let step_key = if kind == "make" { "build" } else { "configure" };
    config.insert(step_key.into(), Value::Table(step));

    let mut table = toml::Table::new();
    table.insert(DETECTED_KEY.into(), Value::Table(config));

    Ok(MasterConfig {
        table,
        config_path: Some(std::env::current_dir()?),
        default: Some(DETECTED_KEY.to_string()),
        origin: Some(build_file.to_path_buf()),
    })
}
