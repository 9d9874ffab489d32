// Logging system for buildgen
use std::io::{self, IsTerminal};
use tracing::Level;
use tracing_subscriber::{fmt, EnvFilter};

use crate::error::Result;

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: Level,
    /// Output format (pretty for terminals, json for programmatic use)
    pub format: LogFormat,
    /// Color output configuration
    pub color: ColorConfig,
    /// Whether to show targets (module names)
    pub show_targets: bool,
}

/// Log output format options
#[derive(Debug, Clone, PartialEq)]
pub enum LogFormat {
    /// Pretty output for terminals
    Pretty,
    /// JSON output for programmatic use
    Json,
    /// Compact format for structured logging
    Compact,
}

/// Color output configuration
#[derive(Debug, Clone, PartialEq)]
pub enum ColorConfig {
    /// Automatically detect if colors should be used
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: LogFormat::Pretty,
            color: ColorConfig::Auto,
            show_targets: false,
        }
    }
}

impl LogConfig {
    /// Create logging configuration from CLI arguments
    pub fn from_cli(verbose: bool, quiet: bool, color: Option<String>) -> Self {
        let level = if quiet {
            Level::ERROR
        } else if verbose {
            Level::DEBUG
        } else {
            Level::INFO
        };

        let color_config = match color.as_deref() {
            Some("always") => ColorConfig::Always,
            Some("never") => ColorConfig::Never,
            _ => ColorConfig::Auto,
        };

        Self {
            level,
            format: LogFormat::Pretty,
            color: color_config,
            show_targets: false,
        }
    }

    /// Check if colors should be used based on configuration and terminal
    pub fn should_use_colors(&self) -> bool {
        match self.color {
            ColorConfig::Always => true,
            ColorConfig::Never => false,
            ColorConfig::Auto => {
                io::stderr().is_terminal()
                    && std::env::var("TERM").map_or(true, |term| term != "dumb")
                    && std::env::var("NO_COLOR").is_err()
            }
        }
    }
}

/// Initialize the logging system with the given configuration
pub fn init_logging(config: LogConfig) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("buildgen={}", config.level)));

    match config.format {
        LogFormat::Pretty => init_pretty_logging(config, env_filter),
        LogFormat::Json => init_json_logging(config, env_filter),
        LogFormat::Compact => init_compact_logging(config, env_filter),
    }
}

fn init_pretty_logging(config: LogConfig, env_filter: EnvFilter) -> Result<()> {
    fmt()
        .with_env_filter(env_filter)
        .with_target(config.show_targets)
        .with_ansi(config.should_use_colors())
        .with_writer(io::stderr)
        .init();

    Ok(())
}

fn init_json_logging(_config: LogConfig, env_filter: EnvFilter) -> Result<()> {
    fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .json()
        .init();

    Ok(())
}

fn init_compact_logging(config: LogConfig, env_filter: EnvFilter) -> Result<()> {
    fmt()
        .with_env_filter(env_filter)
        .compact()
        .with_target(config.show_targets)
        .with_writer(io::stderr)
        .init();

    Ok(())
}
