//! Build-tool discovery.
//!
//! Each probe resolves an executable once and memoizes the result for
//! the lifetime of the [`ToolCache`], which belongs to the
//! per-invocation SDK session rather than to process globals.

use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::Result;

use crate::error::BuildError;

/// CMake releases older than this predate the features the SDK's
/// CMake wrapper relies on.
const CMAKE_MIN_VERSION: semver::Version = semver::Version::new(3, 13, 0);

/// Memoized executable paths for the tools a build may need.
#[derive(Debug, Clone, Default)]
pub struct ToolCache {
    cmake: Option<PathBuf>,
    make: Option<PathBuf>,
    ninja: Option<PathBuf>,
    msbuild: Option<PathBuf>,
}

impl ToolCache {
    pub fn new() -> Self {
        ToolCache::default()
    }

    /// Seed the cache so unit tests never probe the host PATH.
    #[cfg(test)]
    pub(crate) fn preload(
        &mut self,
        cmake: Option<PathBuf>,
        make: Option<PathBuf>,
        ninja: Option<PathBuf>,
        msbuild: Option<PathBuf>,
    ) {
        self.cmake = cmake;
        self.make = make;
        self.ninja = ninja;
        self.msbuild = msbuild;
    }

    /// Resolve CMake, warning once when the installed version is too
    /// old for the SDK wrapper.
    pub fn cmake(&mut self) -> Result<&Path> {
        if self.cmake.is_none() {
            let path = find_tool("cmake", &[]).ok_or_else(|| BuildError::ToolNotFound {
                tool: "CMake".to_string(),
                hint: Some("install cmake and make sure it is in PATH".to_string()),
            })?;

            if let Some(version) = detect_tool_version(&path, parse_cmake_version) {
                if version < CMAKE_MIN_VERSION {
                    tracing::warn!(
                        "cmake {version} found, but the SDK wrapper expects at least {CMAKE_MIN_VERSION}"
                    );
                }
            }

            self.cmake = Some(path);
        }
        Ok(self.cmake.as_deref().expect("just populated"))
    }

    /// Resolve GNU Make, falling back to `mingw32-make` on Windows.
    pub fn make(&mut self) -> Result<&Path> {
        if self.make.is_none() {
            let fallbacks: &[&str] = if cfg!(windows) { &["mingw32-make"] } else { &[] };
            let path =
                find_tool("make", fallbacks).ok_or_else(|| BuildError::ToolNotFound {
                    tool: "Make".to_string(),
                    hint: Some("install GNU make and make sure it is in PATH".to_string()),
                })?;
            self.make = Some(path);
        }
        Ok(self.make.as_deref().expect("just populated"))
    }

    /// Resolve Ninja.
    pub fn ninja(&mut self) -> Result<&Path> {
        if self.ninja.is_none() {
            let path = find_tool("ninja", &[]).ok_or_else(|| BuildError::ToolNotFound {
                tool: "ninja".to_string(),
                hint: Some("install ninja and make sure it is in PATH".to_string()),
            })?;
            self.ninja = Some(path);
        }
        Ok(self.ninja.as_deref().expect("just populated"))
    }

    /// Resolve MSBuild.
    pub fn msbuild(&mut self) -> Result<&Path> {
        if self.msbuild.is_none() {
            let path = find_tool("msbuild", &[]).ok_or_else(|| BuildError::ToolNotFound {
                tool: "MSBuild".to_string(),
                hint: Some(
                    "run from a Visual Studio developer prompt so msbuild is in PATH"
                        .to_string(),
                ),
            })?;
            self.msbuild = Some(path);
        }
        Ok(self.msbuild.as_deref().expect("just populated"))
    }
}

/// Find an executable in PATH, trying fallback names in order.
fn find_tool(name: &str, fallbacks: &[&str]) -> Option<PathBuf> {
    std::iter::once(name)
        .chain(fallbacks.iter().copied())
        .find_map(|candidate| which::which(candidate).ok())
}

/// Run `<tool> --version` and parse the output. Probe failures are not
/// fatal here; the caller decides what a missing version means.
fn detect_tool_version<F>(tool: &Path, version_parser: F) -> Option<semver::Version>
where
    F: FnOnce(&str) -> Option<semver::Version>,
{
    let output = Command::new(tool).arg("--version").output().ok()?;
    if !output.status.success() {
        return None;
    }

    version_parser(&String::from_utf8_lossy(&output.stdout))
}

/// Parse "cmake version 3.20.5" (optionally with a suffix).
fn parse_cmake_version(stdout: &str) -> Option<semver::Version> {
    for line in stdout.lines() {
        if let Some(version_str) = line.strip_prefix("cmake version ") {
            let clean = version_str.trim().split('-').next().unwrap_or(version_str);
            return parse_version_flexible(clean);
        }
    }
    None
}

/// Parse a possibly-incomplete version string like "3.20" or "3.20.5".
fn parse_version_flexible(version_str: &str) -> Option<semver::Version> {
    if let Ok(version) = version_str.parse() {
        return Some(version);
    }

    let mut parts = version_str.split('.');
    let major = parts.next()?.parse().ok()?;
    let minor = parts.next().and_then(|s| s.parse().ok()).unwrap_or(0);
    let patch = parts.next().and_then(|s| s.parse().ok()).unwrap_or(0);

    Some(semver::Version::new(major, minor, patch))
}
