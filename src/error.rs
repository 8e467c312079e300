//! Typed errors for configuration resolution and build orchestration.
//!
//! Every failure a caller may want to distinguish gets its own variant
//! here; operation-level code wraps these in `anyhow::Error` so tests
//! and the CLI can still downcast to the concrete kind.

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// Errors raised while locating, merging, or validating a build config.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    /// The locator matched no settings file and no build file in any
    /// searched directory.
    #[error("could not find a build configuration from locator `{locator}`")]
    #[diagnostic(
        code(embark::config::not_found),
        help("pass a directory containing embark.toml, CMakeLists.txt, ./configure, or a Makefile")
    )]
    NotFound { locator: String },

    /// Multiple named settings objects and nothing selects one.
    #[error("cannot determine which settings object to use for `{locator}`")]
    #[diagnostic(
        code(embark::config::ambiguous),
        help("name a settings object on the command line, or set `default = \"<name>\"` in embark.toml")
    )]
    Ambiguous { locator: String },

    /// A `default` pointer names a settings object that does not exist.
    #[error("requested settings object `{name}` was not found in {}", .path.display())]
    #[diagnostic(code(embark::config::unknown_base))]
    UnknownBase { name: String, path: PathBuf },

    /// The merged config has no `type` discriminant.
    #[error("settings object `{name}` does not declare a build type")]
    #[diagnostic(
        code(embark::config::missing_type),
        help("set `type = \"make\"`, `\"autotools\"`, or `\"cmake\"` in the settings object")
    )]
    MissingType { name: String },

    /// The `type` discriminant is not one of the known toolchains.
    #[error("unknown build type `{found}`")]
    #[diagnostic(
        code(embark::config::unknown_type),
        help("valid build types are \"make\", \"autotools\", and \"cmake\"")
    )]
    UnknownType { found: String },

    /// A step that requires a path does not have one.
    #[error("{step} settings must have `{step}.path` set to {expects}")]
    #[diagnostic(code(embark::config::missing_path))]
    MissingPath {
        step: &'static str,
        expects: &'static str,
    },

    /// `macros` and `definitions` supplied in the same step settings.
    #[error("`macros` and `definitions` cannot both exist in one step settings object")]
    #[diagnostic(code(embark::config::macros_conflict))]
    MacrosConflict,

    /// A definitions entry violated the normalization rules.
    #[error("invalid `definitions` in step settings: {reason}")]
    #[diagnostic(code(embark::config::definitions))]
    Definitions { reason: String },

    /// A list-typed field held something that is not a string or a
    /// list of strings.
    #[error("invalid `{field}` in step settings: expected a string or an array of strings")]
    #[diagnostic(code(embark::config::list_field))]
    ListField { field: &'static str },

    /// A located build file's name maps to no known toolchain.
    #[error("unknown build file type: {}", .path.display())]
    #[diagnostic(code(embark::config::unknown_build_file))]
    UnknownBuildFile { path: PathBuf },

    /// The settings object deserialized into something structurally
    /// wrong (non-table step, non-string path, and so on).
    #[error("invalid settings object `{name}`: {reason}")]
    #[diagnostic(code(embark::config::shape))]
    Shape { name: String, reason: String },

    /// The settings file existed but could not be read or parsed.
    #[error("failed to load settings file {}: {reason}", .path.display())]
    #[diagnostic(code(embark::config::load))]
    Load { path: PathBuf, reason: String },
}

/// Errors raised while binding or executing a build lifecycle step.
#[derive(Debug, Error, Diagnostic)]
pub enum BuildError {
    /// A required toolchain executable could not be resolved.
    #[error("{tool} was not found")]
    #[diagnostic(code(embark::build::tool_not_found))]
    ToolNotFound {
        tool: String,
        #[help]
        hint: Option<String>,
    },

    /// Recursive creation of a build/cache directory failed.
    #[error("failed to create build directory {}", .path.display())]
    #[diagnostic(code(embark::build::directory_create))]
    DirectoryCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A delegated external tool exited non-zero. The tool's own
    /// output has already gone to the terminal; we do not parse it.
    #[error("`{command}` exited with {}", exit_code_label(.code))]
    #[diagnostic(code(embark::build::subprocess))]
    Subprocess {
        command: String,
        code: Option<i32>,
    },

    /// A lifecycle step was invoked on a backend that does not
    /// implement it.
    #[error("{step} is not implemented by the {backend} toolchain")]
    #[diagnostic(code(embark::build::not_implemented))]
    NotImplemented {
        step: &'static str,
        backend: &'static str,
    },
}

fn exit_code_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "no exit code (terminated by signal?)".to_string(),
    }
}
