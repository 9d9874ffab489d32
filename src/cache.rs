// Directory-cache registration for generated job scripts

use crate::shell::{CmdOptions, Shell};

/// Collects filesystem paths the worker should persist across builds and
/// emits the worker-side registration command for each.
#[derive(Debug, Default)]
pub struct DirectoryCache {
    paths: Vec<String>,
}

impl DirectoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `path` for caching.
    pub fn add(&mut self, sh: &mut Shell, path: &str) {
        self.paths.push(path.to_string());
        sh.cmd(
            format!("buildgen_cache add {path}"),
            CmdOptions {
                echo: false,
                ..CmdOptions::default()
            },
        );
    }

    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_records_path_and_emits_registration() {
        let mut cache = DirectoryCache::new();
        let mut sh = Shell::new();
        assert!(cache.is_empty());

        cache.add(&mut sh, "$HOME/.cache/pip");

        assert_eq!(cache.paths(), ["$HOME/.cache/pip"]);
        assert!(sh
            .to_script()
            .contains("buildgen_cache add $HOME/.cache/pip"));
    }
}
