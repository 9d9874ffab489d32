// Script generation pipeline
// Runs the language and addon lifecycle hooks in order against one shared
// statement buffer and renders the result.

use tracing::debug;

use crate::addons::addons_for;
use crate::cache::DirectoryCache;
use crate::config::JobConfig;
use crate::error::Result;
use crate::language::script_for;
use crate::shell::Shell;

/// Generates the complete shell script for a single job. Configuration and
/// the statement buffer live only for one `generate` call.
pub struct ScriptGenerator {
    config: JobConfig,
}

impl ScriptGenerator {
    pub fn new(config: JobConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &JobConfig {
        &self.config
    }

    /// Run all lifecycle hooks and return the statement buffer. Addon
    /// install/configure hooks run after the language `setup` hook so the
    /// job's runtime is active when addon tooling installs into it.
    pub fn emit(&self) -> Result<Shell> {
        let language = script_for(&self.config)?;
        let addons = addons_for(&self.config)?;
        debug!(
            language = language.language_name(),
            addons = addons.len(),
            "generating job script"
        );

        let mut sh = Shell::new();
        let mut cache = DirectoryCache::new();

        language.export(&mut sh)?;
        language.configure(&mut sh)?;
        language.setup(&mut sh)?;
        for addon in &addons {
            addon.before_setup(&mut sh)?;
            addon.configure(&mut sh)?;
        }
        language.announce(&mut sh)?;
        language.setup_cache(&mut sh, &mut cache)?;
        if !self.config.cache.directories().is_empty() {
            sh.fold("cache.directories", |sh| {
                for dir in self.config.cache.directories() {
                    cache.add(sh, dir);
                }
            });
        }
        language.install(&mut sh)?;
        language.script(&mut sh)?;
        for addon in &addons {
            addon.after_success(&mut sh)?;
        }

        debug!(statements = sh.statements().len(), "job script emitted");
        Ok(sh)
    }

    /// Render the job script.
    pub fn generate(&self) -> Result<String> {
        Ok(self.emit()?.to_script())
    }

    /// Cache-key fragment for the external caching collaborator.
    pub fn cache_slug(&self) -> Result<String> {
        Ok(script_for(&self.config)?.cache_slug())
    }

    /// Whether this job uses the directory cache: enabled by an explicit
    /// directory list or widened by the language driver.
    pub fn use_directory_cache(&self) -> Result<bool> {
        let base = !self.config.cache.directories().is_empty();
        Ok(script_for(&self.config)?.use_directory_cache(base))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_produces_complete_script() {
        let config = JobConfig::from_yaml("language: python\npython: \"3.6\"").unwrap();
        let script = ScriptGenerator::new(config).generate().unwrap();
        assert!(script.starts_with("#!/usr/bin/env bash"));
        assert!(script.contains("export CI_PYTHON_VERSION=3.6"));
        assert!(script.contains("source ~/virtualenv/python3.6/bin/activate"));
    }

    #[test]
    fn test_cache_slug_and_directory_cache() {
        let config = JobConfig::from_yaml("language: python\npython: \"3.6\"").unwrap();
        let generator = ScriptGenerator::new(config);
        assert_eq!(generator.cache_slug().unwrap(), "cache--python-3.6");
        assert!(!generator.use_directory_cache().unwrap());

        let config = JobConfig::from_yaml("language: python\ncache: pip").unwrap();
        assert!(ScriptGenerator::new(config).use_directory_cache().unwrap());

        let config = JobConfig::from_yaml(
            "language: python\ncache:\n  directories:\n    - vendor/bundle",
        )
        .unwrap();
        assert!(ScriptGenerator::new(config).use_directory_cache().unwrap());
    }

    #[test]
    fn test_configured_directories_are_registered() {
        let config = JobConfig::from_yaml(
            "language: python\ncache:\n  directories:\n    - node_modules",
        )
        .unwrap();
        let script = ScriptGenerator::new(config).generate().unwrap();
        assert!(script.contains("buildgen_fold_start cache.directories"));
        assert!(script.contains("buildgen_cache add node_modules"));
    }
}
