// Lifecycle trait for language script drivers

use crate::cache::DirectoryCache;
use crate::error::Result;
use crate::shell::Shell;

/// Base fragment every job's cache key starts from.
pub const BASE_CACHE_SLUG: &str = "cache";

/// One driver per supported language.
///
/// The generator invokes the hooks in declaration order, each appending to
/// the shared script buffer. Hooks default to no-ops; a driver overrides
/// the ones its language needs. Only `script` is mandatory: every language
/// must either know how to run tests or fail with an explicit message.
pub trait LanguageScript {
    fn language_name(&self) -> &str;

    /// Export language-specific environment variables.
    fn export(&self, _sh: &mut Shell) -> Result<()> {
        Ok(())
    }

    /// Acquire the interpreter/runtime if it is not already present.
    fn configure(&self, _sh: &mut Shell) -> Result<()> {
        Ok(())
    }

    /// Activate the runtime for the current shell session.
    fn setup(&self, _sh: &mut Shell) -> Result<()> {
        Ok(())
    }

    /// Print resolved tool versions.
    fn announce(&self, _sh: &mut Shell) -> Result<()> {
        Ok(())
    }

    /// Register language-specific cache directories.
    fn setup_cache(&self, _sh: &mut Shell, _cache: &mut DirectoryCache) -> Result<()> {
        Ok(())
    }

    /// Install project dependencies.
    fn install(&self, _sh: &mut Shell) -> Result<()> {
        Ok(())
    }

    /// Run the default test command.
    fn script(&self, sh: &mut Shell) -> Result<()>;

    /// Cache-key fragment handed to the external caching collaborator.
    fn cache_slug(&self) -> String {
        BASE_CACHE_SLUG.to_string()
    }

    /// Whether the job uses the directory cache. `base` reflects the
    /// job-level cache configuration; drivers may widen it.
    fn use_directory_cache(&self, base: bool) -> bool {
        base
    }
}
