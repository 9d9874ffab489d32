// Job configuration handling for buildgen
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{BuildgenError, ConfigError, Result};

/// Languages buildgen can generate scripts for.
pub const SUPPORTED_LANGUAGES: &[&str] = &["python"];

/// One job's declarative configuration. Addon sections stay as raw YAML
/// values; each addon deep-merges its own defaults under them.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JobConfig {
    #[serde(default = "default_language")]
    pub language: String,

    /// Requested interpreter version for python jobs.
    pub python: Option<String>,

    #[serde(default)]
    pub virtualenv: VirtualenvConfig,

    #[serde(default)]
    pub cache: CacheSettings,

    #[serde(default)]
    pub addons: BTreeMap<String, Value>,
}

fn default_language() -> String {
    "python".to_string()
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct VirtualenvConfig {
    #[serde(default)]
    pub system_site_packages: bool,
}

/// Cache configuration in the three accepted shapes: a single cache name,
/// a list of names, or the detailed mapping.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum CacheSettings {
    Single(String),
    Listed(Vec<String>),
    Detailed(DetailedCacheSettings),
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DetailedCacheSettings {
    #[serde(default)]
    pub pip: bool,
    #[serde(default)]
    pub directories: Vec<String>,
}

impl Default for CacheSettings {
    fn default() -> Self {
        CacheSettings::Detailed(DetailedCacheSettings::default())
    }
}

impl CacheSettings {
    pub fn pip(&self) -> bool {
        match self {
            CacheSettings::Single(name) => name == "pip",
            CacheSettings::Listed(names) => names.iter().any(|name| name == "pip"),
            CacheSettings::Detailed(detailed) => detailed.pip,
        }
    }

    pub fn directories(&self) -> &[String] {
        match self {
            CacheSettings::Detailed(detailed) => &detailed.directories,
            _ => &[],
        }
    }
}

impl JobConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(BuildgenError::Config(Box::new(ConfigError::NotFound {
                path: path.to_path_buf(),
                suggestion: Some("pass the job configuration path via --config".to_string()),
            })));
        }

        if !path.is_file() {
            return Err(BuildgenError::Config(Box::new(ConfigError::InvalidValue {
                message: "configuration path is not a file".to_string(),
                field: "config_path".to_string(),
                value: path.display().to_string(),
                expected: "file path".to_string(),
            })));
        }

        let content = std::fs::read_to_string(path).map_err(BuildgenError::Io)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: JobConfig = serde_yaml::from_str(yaml)
            .map_err(|e| BuildgenError::Config(Box::new(ConfigError::from(e))))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !SUPPORTED_LANGUAGES.contains(&self.language.as_str()) {
            return Err(BuildgenError::Config(Box::new(ConfigError::InvalidValue {
                message: format!("unsupported language: {}", self.language),
                field: "language".to_string(),
                value: self.language.clone(),
                expected: format!("one of: {}", SUPPORTED_LANGUAGES.join(", ")),
            })));
        }

        if let Some(version) = &self.python {
            if version.trim().is_empty() {
                return Err(BuildgenError::Config(Box::new(ConfigError::InvalidValue {
                    message: "python version must not be empty".to_string(),
                    field: "python".to_string(),
                    value: version.clone(),
                    expected: "a version string such as 3.6 or pypy2.7-5.3".to_string(),
                })));
            }
        }

        Ok(())
    }

    /// The raw configuration section for one addon, if enabled.
    pub fn addon_section(&self, name: &str) -> Option<&Value> {
        self.addons.get(name)
    }
}

/// Deep-merge `user` over `base`. Mappings merge key-by-key recursively;
/// any other user value replaces the base value wholesale.
pub fn deep_merge(base: Value, user: Value) -> Value {
    match (base, user) {
        (Value::Mapping(mut merged), Value::Mapping(user_map)) => {
            for (key, user_value) in user_map {
                match merged.get_mut(&key) {
                    Some(slot) => {
                        let base_value = std::mem::replace(slot, Value::Null);
                        *slot = deep_merge(base_value, user_value);
                    }
                    None => {
                        merged.insert(key, user_value);
                    }
                }
            }
            Value::Mapping(merged)
        }
        (_, user) => user,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yaml(input: &str) -> Value {
        serde_yaml::from_str(input).unwrap()
    }

    #[test]
    fn test_minimal_config_defaults() {
        let config = JobConfig::from_yaml("language: python").unwrap();
        assert_eq!(config.language, "python");
        assert!(config.python.is_none());
        assert!(!config.virtualenv.system_site_packages);
        assert!(!config.cache.pip());
        assert!(config.addons.is_empty());
    }

    #[test]
    fn test_unsupported_language_is_rejected() {
        let err = JobConfig::from_yaml("language: fortran").unwrap_err();
        assert!(matches!(err, BuildgenError::Config(_)));
    }

    #[test]
    fn test_empty_python_version_is_rejected() {
        let err = JobConfig::from_yaml("language: python\npython: \"  \"").unwrap_err();
        assert!(matches!(err, BuildgenError::Config(_)));
    }

    #[test]
    fn test_cache_shapes() {
        let single = JobConfig::from_yaml("language: python\ncache: pip").unwrap();
        assert!(single.cache.pip());

        let listed = JobConfig::from_yaml("language: python\ncache: [ccache, pip]").unwrap();
        assert!(listed.cache.pip());

        let detailed = JobConfig::from_yaml(
            "language: python\ncache:\n  pip: true\n  directories:\n    - vendor/bundle",
        )
        .unwrap();
        assert!(detailed.cache.pip());
        assert_eq!(detailed.cache.directories(), ["vendor/bundle"]);

        let none = JobConfig::from_yaml("language: python\ncache: ccache").unwrap();
        assert!(!none.cache.pip());
    }

    #[test]
    fn test_addon_sections_are_preserved_raw() {
        let config = JobConfig::from_yaml(
            "language: python\naddons:\n  transifex:\n    token: sekrit",
        )
        .unwrap();
        let section = config.addon_section("transifex").unwrap();
        assert_eq!(section["token"], Value::from("sekrit"));
        assert!(config.addon_section("firefox").is_none());
    }

    #[test]
    fn test_deep_merge_empty_user_reproduces_base() {
        let base = yaml("a: 1\nnested:\n  b: 2\n  c: [3, 4]");
        let merged = deep_merge(base.clone(), yaml("{}"));
        assert_eq!(merged, base);
    }

    #[test]
    fn test_deep_merge_user_wins_at_every_level() {
        let base = yaml("a: 1\nnested:\n  b: 2\n  c: 3");
        let merged = deep_merge(base, yaml("nested:\n  c: 30\nd: 4"));
        assert_eq!(merged["a"], Value::from(1));
        assert_eq!(merged["nested"]["b"], Value::from(2));
        assert_eq!(merged["nested"]["c"], Value::from(30));
        assert_eq!(merged["d"], Value::from(4));
    }

    #[test]
    fn test_deep_merge_replaces_sequences() {
        let base = yaml("branches: [master]");
        let merged = deep_merge(base, yaml("branches: [main, develop]"));
        assert_eq!(merged, yaml("branches: [main, develop]"));
    }
}
