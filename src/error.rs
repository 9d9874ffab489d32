// Error handling framework for buildgen
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, BuildgenError>;

/// Main error type for buildgen
#[derive(Debug, Error)]
pub enum BuildgenError {
    #[error("Configuration error: {0}")]
    Config(#[from] Box<ConfigError>),

    #[error("Script generation failed: {0}")]
    Generation(#[from] Box<GenerationError>),

    #[error("CLI argument error: {0}")]
    Cli(#[from] Box<CliError>),

    #[error("IO operation failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors with detailed context
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid YAML syntax: {message}")]
    InvalidYaml {
        message: String,
        line: Option<u32>,
        column: Option<u32>,
        file_path: Option<PathBuf>,
    },

    #[error("Configuration file not found: {}", path.display())]
    NotFound {
        path: PathBuf,
        suggestion: Option<String>,
    },

    #[error("Invalid configuration value: {message}")]
    InvalidValue {
        message: String,
        field: String,
        value: String,
        expected: String,
    },

    #[error("Configuration validation failed: {message}")]
    ValidationFailed { message: String, errors: Vec<String> },
}

/// Script generation errors
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Unsupported language: {language}")]
    UnsupportedLanguage {
        language: String,
        supported: Vec<String>,
    },

    #[error("Invalid {language} version \"{version}\": {reason}")]
    InvalidVersion {
        language: String,
        version: String,
        reason: String,
    },

    #[error("Unknown addon: {addon}")]
    UnknownAddon {
        addon: String,
        available: Vec<String>,
    },

    #[error("Invalid configuration for addon {addon}: {message}")]
    InvalidAddonConfig { addon: String, message: String },
}

/// CLI argument errors
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Invalid argument: {argument}")]
    InvalidArgument {
        argument: String,
        message: String,
        suggestion: Option<String>,
    },
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        let location = err.location();
        ConfigError::InvalidYaml {
            message: err.to_string(),
            line: location.as_ref().map(|l| l.line() as u32),
            column: location.as_ref().map(|l| l.column() as u32),
            file_path: None,
        }
    }
}

/// Exit codes for different error categories
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL_ERROR: i32 = 1;
    pub const CONFIG_ERROR: i32 = 2;
    pub const GENERATION_ERROR: i32 = 3;
    pub const CLI_ERROR: i32 = 4;
}

impl BuildgenError {
    /// Get the appropriate exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            BuildgenError::Config(_) => exit_codes::CONFIG_ERROR,
            BuildgenError::Generation(_) => exit_codes::GENERATION_ERROR,
            BuildgenError::Cli(_) => exit_codes::CLI_ERROR,
            BuildgenError::Io(_) => exit_codes::GENERAL_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_mapping() {
        let config_err = BuildgenError::Config(Box::new(ConfigError::NotFound {
            path: PathBuf::from("/missing/job.yml"),
            suggestion: None,
        }));
        assert_eq!(config_err.exit_code(), exit_codes::CONFIG_ERROR);

        let generation_err =
            BuildgenError::Generation(Box::new(GenerationError::UnsupportedLanguage {
                language: "fortran".to_string(),
                supported: vec!["python".to_string()],
            }));
        assert_eq!(generation_err.exit_code(), exit_codes::GENERATION_ERROR);
    }

    #[test]
    fn test_yaml_error_carries_location() {
        let err = serde_yaml::from_str::<serde_yaml::Value>("foo: [unclosed").unwrap_err();
        let config_err = ConfigError::from(err);
        match config_err {
            ConfigError::InvalidYaml { line, .. } => assert!(line.is_some()),
            other => panic!("expected InvalidYaml, got {other:?}"),
        }
    }

    #[test]
    fn test_not_found_displays_path() {
        let err = ConfigError::NotFound {
            path: PathBuf::from("/tmp/job.yml"),
            suggestion: None,
        };
        assert!(err.to_string().contains("/tmp/job.yml"));
    }
}
