//! The build lifecycle driver.
//!
//! A [`Bootstrap`] owns one validated working config (as its toolchain
//! backend) and one [`SdkSession`]. Every lifecycle verb runs the same
//! protocol: bind the preconditions for the step class (probe the
//! tools it needs, make sure the build directory exists), activate the
//! configured SDK version, then execute the backend's step. Verbs
//! return the bootstrap so callers can chain
//! `bootstrap.build()?.install()?` against one resolved config.

pub mod autotools;
pub mod cmake;
pub mod make;

use anyhow::Result;

use crate::config::settings::SdkSettings;
use crate::config::WorkingConfig;
use crate::error::BuildError;
use crate::sdk::{RunOptions, SdkSession};

pub(crate) use self::autotools::Autotools;
pub(crate) use self::cmake::Cmake;
pub(crate) use self::make::Make;

/// The step implementations and binding preconditions of one
/// toolchain.
///
/// The driver guarantees a step never runs before its preconditions
/// pass. A lifecycle step a toolchain genuinely has no counterpart for
/// stays unimplemented here and reports as such: an intentional no-op
/// (like Make's configure) must be an explicit override.
pub(crate) trait Backend {
    fn name(&self) -> &'static str;

    fn sdk(&self) -> &SdkSettings;

    /// Preconditions for configure-bearing verbs.
    fn bind_configure(&mut self, session: &mut SdkSession) -> Result<()>;

    /// Preconditions for make-bearing verbs.
    fn bind_make(&mut self, session: &mut SdkSession) -> Result<()>;

    fn configure_step(&mut self, _session: &mut SdkSession) -> Result<()> {
        Err(BuildError::NotImplemented {
            step: "configure",
            backend: self.name(),
        }
        .into())
    }

    fn build_step(&mut self, _session: &mut SdkSession) -> Result<()> {
        Err(BuildError::NotImplemented {
            step: "build",
            backend: self.name(),
        }
        .into())
    }

    fn clean_step(&mut self, _session: &mut SdkSession) -> Result<()> {
        Err(BuildError::NotImplemented {
            step: "clean",
            backend: self.name(),
        }
        .into())
    }

    fn install_step(&mut self, _session: &mut SdkSession) -> Result<()> {
        Err(BuildError::NotImplemented {
            step: "install",
            backend: self.name(),
        }
        .into())
    }
}

/// A configured build, scoped to one command chain.
pub struct Bootstrap {
    session: SdkSession,
    backend: Box<dyn Backend>,
}

impl std::fmt::Debug for Bootstrap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bootstrap")
            .field("backend", &self.backend.name())
            .finish()
    }
}

impl Bootstrap {
    /// Wrap a resolved config and session into a bootstrap for the
    /// config's toolchain.
    pub fn new(config: WorkingConfig, session: SdkSession) -> Self {
        let backend: Box<dyn Backend> = match config {
            WorkingConfig::Make(config) => Box::new(Make::new(config)),
            WorkingConfig::Autotools(config) => Box::new(Autotools::new(config)),
            WorkingConfig::Cmake(config) => Box::new(Cmake::new(config)),
        };

        Bootstrap { session, backend }
    }

    /// The toolchain driving this bootstrap.
    pub fn toolchain(&self) -> &'static str {
        self.backend.name()
    }

    /// The SDK version every step of this bootstrap activates.
    pub fn sdk_version(&self) -> &str {
        &self.backend.sdk().emsdk_version
    }

    fn activate_sdk(&mut self) -> Result<()> {
        // emsdkVersion was defaulted during validation, so it is
        // always present here.
        let version = self.backend.sdk().emsdk_version.clone();
        self.session.activate(&version)
    }

    /// Configure the project.
    pub fn configure(&mut self) -> Result<&mut Self> {
        self.backend.bind_configure(&mut self.session)?;
        self.activate_sdk()?;
        self.backend.configure_step(&mut self.session)?;
        Ok(self)
    }

    /// Build the project, configuring it first if necessary.
    pub fn build(&mut self) -> Result<&mut Self> {
        self.backend.bind_make(&mut self.session)?;
        self.activate_sdk()?;
        self.backend.build_step(&mut self.session)?;
        Ok(self)
    }

    /// Alias for [`Bootstrap::build`].
    pub fn make(&mut self) -> Result<&mut Self> {
        self.build()
    }

    /// Run the clean target.
    pub fn clean(&mut self) -> Result<&mut Self> {
        self.backend.bind_make(&mut self.session)?;
        self.activate_sdk()?;
        self.backend.clean_step(&mut self.session)?;
        Ok(self)
    }

    /// Run the install target.
    pub fn install(&mut self) -> Result<&mut Self> {
        self.backend.bind_make(&mut self.session)?;
        self.activate_sdk()?;
        self.backend.install_step(&mut self.session)?;
        Ok(self)
    }

    /// Clean, then configure.
    pub fn reconfigure(&mut self) -> Result<&mut Self> {
        self.backend.bind_configure(&mut self.session)?;
        self.activate_sdk()?;
        self.backend.clean_step(&mut self.session)?;
        self.backend.configure_step(&mut self.session)?;
        Ok(self)
    }

    /// Clean, then build.
    pub fn rebuild(&mut self) -> Result<&mut Self> {
        self.backend.bind_configure(&mut self.session)?;
        self.backend.bind_make(&mut self.session)?;
        self.activate_sdk()?;
        self.backend.clean_step(&mut self.session)?;
        self.backend.build_step(&mut self.session)?;
        Ok(self)
    }

    /// Build; on failure, fall back to one full
    /// clean-configure-build. The fallback's error, if any, is the one
    /// the caller sees.
    pub fn compile(&mut self) -> Result<&mut Self> {
        self.backend.bind_configure(&mut self.session)?;
        self.backend.bind_make(&mut self.session)?;
        self.activate_sdk()?;

        if let Err(err) = self.backend.build_step(&mut self.session) {
            tracing::warn!("build failed ({err:#}), attempting a full rebuild");
            self.backend.clean_step(&mut self.session)?;
            self.backend.configure_step(&mut self.session)?;
            self.backend.build_step(&mut self.session)?;
        }
        Ok(self)
    }

    /// Run an arbitrary command inside the configured SDK, bypassing
    /// the build preconditions entirely.
    pub fn run(&mut self, command: &str, args: &[String], options: &RunOptions) -> Result<&mut Self> {
        self.activate_sdk()?;
        self.session.run(command, args, options)?;
        Ok(self)
    }

    /// Install (and activate) the configured SDK version without
    /// running any build step.
    pub fn install_sdk(&mut self) -> Result<&mut Self> {
        self.activate_sdk()?;
        Ok(self)
    }
}
