//! CLI command implementations.

pub mod build;
pub mod clean;
pub mod compile;
pub mod completions;
pub mod configure;
pub mod install;
pub mod rebuild;
pub mod reconfigure;
pub mod run;
pub mod sdk;

use embark::sdk::UpdatePolicy;
use embark::util::Shell;

/// Options shared by every command.
pub struct GlobalOpts {
    pub update_policy: UpdatePolicy,
    pub shell: Shell,
}

/// Human label for the project a locator points at.
pub fn locator_label(locator: &Option<String>) -> String {
    match locator {
        Some(locator) => locator.clone(),
        None => std::env::current_dir()
            .map(|cwd| cwd.display().to_string())
            .unwrap_or_else(|_| ".".to_string()),
    }
}
