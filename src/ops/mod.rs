//! Verb-level operations: resolve a config, stand up a bootstrap, run
//! one lifecycle verb. This is the surface the CLI (and library
//! consumers) call; every returned [`Bootstrap`] can keep chaining
//! verbs against the same resolved config.

use anyhow::Result;
use toml::Value;

use crate::bootstrap::Bootstrap;
use crate::config::resolve_config;
use crate::config::settings::SdkSettings;
use crate::sdk::{RunOptions, SdkSession, UpdatePolicy};

/// Resolve a config and wrap it in a bootstrap without running
/// anything.
pub fn bootstrap(
    locator: Option<&str>,
    fragment: Option<Value>,
    update_policy: UpdatePolicy,
) -> Result<Bootstrap> {
    let config = resolve_config(locator, fragment)?;
    let session = SdkSession::for_config(config.sdk(), update_policy)?;
    Ok(Bootstrap::new(config, session))
}

/// Configure the project.
pub fn configure(
    locator: Option<&str>,
    fragment: Option<Value>,
    update_policy: UpdatePolicy,
) -> Result<Bootstrap> {
    let mut bootstrap = bootstrap(locator, fragment, update_policy)?;
    bootstrap.configure()?;
    Ok(bootstrap)
}

/// Build the project, configuring it first if necessary.
pub fn build(
    locator: Option<&str>,
    fragment: Option<Value>,
    update_policy: UpdatePolicy,
) -> Result<Bootstrap> {
    let mut bootstrap = bootstrap(locator, fragment, update_policy)?;
    bootstrap.build()?;
    Ok(bootstrap)
}

/// Run the clean target.
pub fn clean(
    locator: Option<&str>,
    fragment: Option<Value>,
    update_policy: UpdatePolicy,
) -> Result<Bootstrap> {
    let mut bootstrap = bootstrap(locator, fragment, update_policy)?;
    bootstrap.clean()?;
    Ok(bootstrap)
}

/// Run the install target.
pub fn install(
    locator: Option<&str>,
    fragment: Option<Value>,
    update_policy: UpdatePolicy,
) -> Result<Bootstrap> {
    let mut bootstrap = bootstrap(locator, fragment, update_policy)?;
    bootstrap.install()?;
    Ok(bootstrap)
}

/// Clean, then configure.
pub fn reconfigure(
    locator: Option<&str>,
    fragment: Option<Value>,
    update_policy: UpdatePolicy,
) -> Result<Bootstrap> {
    let mut bootstrap = bootstrap(locator, fragment, update_policy)?;
    bootstrap.reconfigure()?;
    Ok(bootstrap)
}

/// Clean, configure if needed, then build.
pub fn rebuild(
    locator: Option<&str>,
    fragment: Option<Value>,
    update_policy: UpdatePolicy,
) -> Result<Bootstrap> {
    let mut bootstrap = bootstrap(locator, fragment, update_policy)?;
    bootstrap.rebuild()?;
    Ok(bootstrap)
}

/// Build; on failure, clean and rebuild from scratch.
pub fn compile(
    locator: Option<&str>,
    fragment: Option<Value>,
    update_policy: UpdatePolicy,
) -> Result<Bootstrap> {
    let mut bootstrap = bootstrap(locator, fragment, update_policy)?;
    bootstrap.compile()?;
    Ok(bootstrap)
}

/// Install and activate the configured SDK version without touching
/// the project.
pub fn install_sdk(
    locator: Option<&str>,
    fragment: Option<Value>,
    update_policy: UpdatePolicy,
) -> Result<Bootstrap> {
    let mut bootstrap = bootstrap(locator, fragment, update_policy)?;
    bootstrap.install_sdk()?;
    Ok(bootstrap)
}

/// Run an arbitrary command inside the default SDK environment.
///
/// The bare passthrough does not resolve a project config; it forces
/// the `latest` SDK the way the package-level command does.
pub fn run(command: &str, args: &[String], update_policy: UpdatePolicy) -> Result<()> {
    let sdk = SdkSettings {
        emsdk: None,
        emsdk_version: "latest".to_string(),
    };
    let mut session = SdkSession::for_config(&sdk, update_policy)?;
    session.activate("latest")?;
    session.run(
        command,
        args,
        &RunOptions {
            cwd: None,
            shell: cfg!(windows),
        },
    )
}
