// CLI interface for buildgen using clap
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::path::{Path, PathBuf};

use crate::config::JobConfig;
use crate::core::ScriptGenerator;
use crate::error::{exit_codes, BuildgenError, CliError, Result};
use crate::logging::{init_logging, LogConfig};

#[derive(Parser)]
#[command(
    name = "buildgen",
    about = "buildgen - a deterministic CI build-script generator written in Rust",
    version = crate::VERSION,
    long_about = "buildgen translates a declarative job configuration into the shell script a CI worker executes for that job."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Job configuration file path
    #[arg(short, long, global = true, default_value = ".build.yml")]
    pub config: String,

    /// Control color output (auto, always, never)
    #[arg(long, global = true, value_name = "WHEN")]
    pub color: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate the job script (default command)
    Generate {
        /// Write the script to this path instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Parse the job configuration and run the generation pipeline without
    /// emitting anything
    Check,

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

impl Cli {
    pub fn run(&self) -> Result<i32> {
        let log_config = LogConfig::from_cli(self.verbose, self.quiet, self.color.clone());
        init_logging(log_config)?;

        match &self.command {
            Some(Commands::Generate { output }) => self.generate(output.as_deref()),
            None => self.generate(None),
            Some(Commands::Check) => self.check(),
            Some(Commands::Completions { shell }) => {
                let mut cmd = Cli::command();
                generate(*shell, &mut cmd, "buildgen", &mut io::stdout());
                Ok(exit_codes::SUCCESS)
            }
        }
    }

    fn load_config(&self) -> Result<JobConfig> {
        JobConfig::from_file(Path::new(&self.config))
    }

    fn generate(&self, output: Option<&Path>) -> Result<i32> {
        let config = self.load_config()?;
        let script = ScriptGenerator::new(config).generate()?;

        match output {
            Some(path) if path.is_dir() => {
                Err(BuildgenError::Cli(Box::new(CliError::InvalidArgument {
                    argument: "--output".to_string(),
                    message: format!("{} is a directory", path.display()),
                    suggestion: Some("pass a file path".to_string()),
                })))
            }
            Some(path) => {
                std::fs::write(path, script)?;
                Ok(exit_codes::SUCCESS)
            }
            None => {
                print!("{script}");
                Ok(exit_codes::SUCCESS)
            }
        }
    }

    fn check(&self) -> Result<i32> {
        let config = self.load_config()?;
        // Running the full pipeline surfaces version and addon errors, not
        // just YAML problems.
        ScriptGenerator::new(config).emit()?;
        println!("{}: configuration OK", self.config);
        Ok(exit_codes::SUCCESS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_generate_with_output() {
        let cli = Cli::parse_from(["buildgen", "generate", "--output", "job.sh"]);
        match cli.command {
            Some(Commands::Generate { output }) => {
                assert_eq!(output, Some(PathBuf::from("job.sh")));
            }
            _ => panic!("expected generate subcommand"),
        }
    }

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["buildgen"]);
        assert!(cli.command.is_none());
        assert_eq!(cli.config, ".build.yml");
        assert!(!cli.verbose);
        assert!(!cli.quiet);
    }
}
