//! The CMake toolchain.
//!
//! Configure goes through the SDK's CMake wrapper (`emcmake`). The
//! make-equivalent that drives the generated build system (ninja,
//! make, or msbuild) is determined from the declared generator on a
//! fresh configure, or from the artifacts in the build directory when
//! a cache already exists. It is invoked directly, never through the
//! SDK's generic make wrapper, because CMake-generated build systems
//! are driven by their own native tool.

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::config::definitions::render_cmake;
use crate::config::settings::{CmakeConfig, SdkSettings};
use crate::error::BuildError;
use crate::sdk::{RunOptions, SdkSession};
use crate::util::fs::{ensure_dir, is_dir};

use super::Backend;

const CONFIGURE_WRAPPER: &str = "emcmake";

/// The CMake cache file whose presence means "already configured".
const CACHE_FILE: &str = "CMakeCache.txt";

pub(crate) struct Cmake {
    config: CmakeConfig,
    /// The resolved make-equivalent, recomputed whenever a binding
    /// precondition needs fresh detection (for example right after the
    /// cache directory is first populated).
    make_program: Option<PathBuf>,
}

impl Cmake {
    pub(crate) fn new(config: CmakeConfig) -> Self {
        Cmake {
            config,
            make_program: None,
        }
    }

    /// Resolve the make-equivalent for this build.
    ///
    /// With `from_cache`, the build directory's artifacts decide:
    /// `build.ninja`, a `Makefile`, or a Visual Studio solution.
    /// Otherwise the declared generator decides. Either way the chosen
    /// tool must be independently discoverable. A generator matching
    /// none of the known classes leaves the program undetermined;
    /// make-bearing steps turn that into a hard error before assembling
    /// any arguments.
    fn determine_make(&mut self, session: &mut SdkSession, from_cache: bool) -> Result<()> {
        let build_path = &self.config.build.path;
        if from_cache && !is_dir(build_path) {
            // Nothing to inspect yet.
            return Ok(());
        }

        let generator = self.config.configure.generator.to_lowercase();

        let has_ninja = if from_cache {
            build_path.join("build.ninja").is_file()
        } else {
            generator == "ninja"
        };
        if has_ninja {
            self.make_program = Some(session.tools().ninja()?.to_path_buf());
            return Ok(());
        }

        // 'Unix Makefiles', 'MinGW Makefiles', and friends.
        let has_make = if from_cache {
            build_path.join("Makefile").is_file()
        } else {
            generator.contains("makefiles")
        };
        if has_make {
            self.make_program = Some(session.tools().make()?.to_path_buf());
            return Ok(());
        }

        // 'Visual Studio 16 2019' and friends.
        let has_msbuild = if from_cache {
            has_solution(build_path)
        } else {
            generator.contains("visual studio ")
        };
        if has_msbuild {
            self.make_program = Some(session.tools().msbuild()?.to_path_buf());
            return Ok(());
        }

        Ok(())
    }

    /// Configure if the build directory has no CMake cache yet, then
    /// re-resolve the make program from the fresh cache.
    fn ensure_configured(&mut self, session: &mut SdkSession) -> Result<()> {
        if self.config.build.path.join(CACHE_FILE).is_file() {
            return Ok(());
        }

        self.bind_configure(session)?;
        self.run_configure(session)?;
        self.determine_make(session, true)
    }

    fn configure_arguments(&self) -> Vec<String> {
        let configure = &self.config.configure;
        let install = &self.config.install;

        let mut args = vec![
            configure.path.display().to_string(),
            "-G".to_string(),
            configure.generator.clone(),
            format!("-DCMAKE_BUILD_TYPE={}", configure.build_type),
            format!("-DCMAKE_INSTALL_PREFIX={}", install.path.display()),
        ];

        if let Some(ref binary) = install.binary_path {
            args.push(format!("-DCMAKE_INSTALL_BINDIR={}", binary.display()));
        }
        if let Some(ref library) = install.library_path {
            args.push(format!("-DCMAKE_INSTALL_LIBDIR={}", library.display()));
        }
        if let Some(ref include) = install.include_path {
            args.push(format!("-DCMAKE_INSTALL_INCLUDEDIR={}", include.display()));
        }

        args.extend(configure.arguments.iter().cloned());
        args
    }

    fn run_configure(&mut self, session: &mut SdkSession) -> Result<()> {
        // Resolve the make program from declared intent so the cache
        // is generated against the tool we will actually invoke.
        self.determine_make(session, false)?;

        let cmake = session.tools().cmake()?.display().to_string();

        let mut args = vec![cmake];
        args.extend(self.configure_arguments());
        if let Some(ref make_program) = self.make_program {
            args.push(format!("-DCMAKE_MAKE_PROGRAM={}", make_program.display()));
        }
        args.extend(render_cmake(&self.config.configure.definitions));

        session.run(
            CONFIGURE_WRAPPER,
            &args,
            &RunOptions::in_dir(&self.config.build.path),
        )
    }

    /// Run one step of the generated build system, configuring first
    /// if needed.
    fn run_make(
        &mut self,
        session: &mut SdkSession,
        target: Option<String>,
        arguments: Vec<String>,
    ) -> Result<()> {
        self.ensure_configured(session)?;

        if self.make_program.is_none() {
            self.determine_make(session, true)?;
        }
        let program = self.make_program.clone().ok_or_else(|| {
            BuildError::ToolNotFound {
                tool: format!(
                    "a build tool for generator `{}`",
                    self.config.configure.generator
                ),
                hint: Some("configure the project first, or declare a Ninja/Makefiles/Visual Studio generator".to_string()),
            }
        })?;

        let mut args = Vec::new();
        if let Some(target) = target {
            args.push(target);
        }
        args.extend(arguments);

        session.run(
            &program.display().to_string(),
            &args,
            &RunOptions::in_dir(&self.config.build.path),
        )
    }
}

fn has_solution(dir: &Path) -> bool {
    let pattern = dir.join("*.sln");
    glob::glob(&pattern.to_string_lossy())
        .map(|mut matches| matches.any(|entry| entry.is_ok()))
        .unwrap_or(false)
}

impl Backend for Cmake {
    fn name(&self) -> &'static str {
        "cmake"
    }

    fn sdk(&self) -> &SdkSettings {
        &self.config.sdk
    }

    fn bind_configure(&mut self, session: &mut SdkSession) -> Result<()> {
        session.tools().cmake()?;
        ensure_dir(&self.config.build.path)?;
        Ok(())
    }

    fn bind_make(&mut self, session: &mut SdkSession) -> Result<()> {
        self.determine_make(session, true)?;
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
        let target = self.config.clean.target.clone();
        let arguments = self.config.clean.arguments.clone();
        self.run_make(session, target, arguments)
    }

    fn install_step(&mut self, session: &mut SdkSession) -> Result<()> {
        let target = self.config.install.target.clone();
        let arguments = self.config.install.arguments.clone();
        self.run_make(session, target, arguments)
    }
}
