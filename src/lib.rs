// buildgen - library module
// Translates declarative job configuration into the shell script a CI
// worker executes for one job.

pub mod addons;
pub mod cache;
pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod language;
pub mod logging;
pub mod shell;

// Re-export main types for easier access
pub use addons::{addons_for, Addon, AutoPushConfig, Transifex, TransifexConfig};
pub use cache::DirectoryCache;
pub use config::{
    deep_merge, CacheSettings, DetailedCacheSettings, JobConfig, VirtualenvConfig,
    SUPPORTED_LANGUAGES,
};
pub use core::ScriptGenerator;
pub use error::{
    exit_codes, BuildgenError, CliError, ConfigError, GenerationError, Result,
};
pub use language::{script_for, LanguageScript, PythonScript, PythonVersion};
pub use logging::{ColorConfig, LogConfig, LogFormat};
pub use shell::{AnsiColor, Branch, CmdOptions, Shell, Statement};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

// Build information (set by build script)
pub const BUILD_DATE: &str = env!("BUILD_DATE");
pub const GIT_COMMIT: &str = env!("GIT_COMMIT");
pub const GIT_BRANCH: &str = env!("GIT_BRANCH");

/// Get formatted version string with build information
pub fn version_info() -> String {
    format!("{NAME} {VERSION} (commit: {GIT_COMMIT}, branch: {GIT_BRANCH}, built: {BUILD_DATE})")
}
