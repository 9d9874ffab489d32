// Translation-sync addon
// Installs the transifex client, writes its credentials file, and
// optionally pushes source strings from one leader job after a successful
// build.

use serde::{Deserialize, Serialize};
use serde_yaml::Value;

use crate::config::deep_merge;
use crate::error::{BuildgenError, GenerationError, Result};
use crate::shell::{AnsiColor, CmdOptions, Shell};

use super::base::Addon;

/// Minimum client version range installed on the worker.
pub const CLIENT_VERSION: &str = ">=0.11";

const CREDENTIALS_FILE: &str = "$HOME/.transifexrc";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TransifexConfig {
    pub hostname: String,
    pub username: String,
    pub password: String,
    pub token: String,
    pub auto_push: AutoPushConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AutoPushConfig {
    pub enabled: bool,
    /// Ordinal of the matrix job that performs the push. Exactly one
    /// parallel job should push, or pushes duplicate each other.
    pub job: u32,
    pub branches: Vec<String>,
}

impl Default for TransifexConfig {
    fn default() -> Self {
        Self {
            hostname: "https://www.transifex.com".to_string(),
            username: String::new(),
            password: String::new(),
            token: String::new(),
            auto_push: AutoPushConfig::default(),
        }
    }
}

impl Default for AutoPushConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            job: 1,
            branches: vec!["master".to_string()],
        }
    }
}

impl TransifexConfig {
    /// Deep-merge a user section over the addon defaults. A null section
    /// (the addon enabled with no settings) yields the defaults.
    pub fn merged(section: &Value) -> Result<Self> {
        let defaults = serde_yaml::to_value(Self::default()).map_err(invalid_config)?;
        let merged = match section {
            Value::Null => defaults,
            section => deep_merge(defaults, section.clone()),
        };
        serde_yaml::from_value(merged).map_err(invalid_config)
    }
}

fn invalid_config(error: serde_yaml::Error) -> BuildgenError {
    BuildgenError::Generation(Box::new(GenerationError::InvalidAddonConfig {
        addon: "transifex".to_string(),
        message: error.to_string(),
    }))
}

pub struct Transifex {
    config: TransifexConfig,
}

impl Transifex {
    pub fn new(config: TransifexConfig) -> Self {
        Self { config }
    }

    pub fn from_section(section: &Value) -> Result<Self> {
        Ok(Self::new(TransifexConfig::merged(section)?))
    }

    pub fn config(&self) -> &TransifexConfig {
        &self.config
    }

    fn install(&self, sh: &mut Shell) {
        sh.echo("Installing the Transifex client", Some(AnsiColor::Yellow));
        sh.cmd(
            format!("pip install --user 'transifex-client{CLIENT_VERSION}'"),
            CmdOptions::default(),
        );
        sh.export("PATH", "$HOME/.local/bin:$PATH", true);
    }

    /// Environment variables override the configured credentials so secrets
    /// can stay out of the committed configuration.
    fn write_credentials(&self, sh: &mut Shell) {
        sh.echo("Writing ~/.transifexrc", Some(AnsiColor::Yellow));
        let config = &self.config;
        sh.cmd(
            format!(
                "echo \"[${{TX_HOSTNAME:-{hostname}}}]\n\
                 hostname = ${{TX_HOSTNAME:-{hostname}}}\n\
                 username = ${{TX_USERNAME:-{username}}}\n\
                 password = ${{TX_PASSWORD:-{password}}}\n\
                 token = ${{TX_TOKEN:-{token}}}\" > {CREDENTIALS_FILE}",
                hostname = config.hostname,
                username = config.username,
                password = config.password,
                token = config.token,
            ),
            CmdOptions {
                echo: false,
                ..CmdOptions::default()
            },
        );
    }

    /// Both guards are evaluated by the worker at run time: the job-ordinal
    /// suffix picks the leader job, the branch alternation whitelists
    /// branches. A job number without a `.N` suffix simply never matches.
    fn source_push(&self, sh: &mut Shell) {
        let push = &self.config.auto_push;
        let branches = push.branches.join("|");
        sh.if_(&format!(r"$CI_JOB_NUMBER =~ \.{}$", push.job), |sh| {
            sh.if_(&format!("$CI_BRANCH =~ ^({branches})$"), |sh| {
                sh.echo("Pushing source strings to Transifex", Some(AnsiColor::Yellow));
                sh.cmd("tx push --source --no-interactive", CmdOptions::default());
            });
        });
    }
}

impl Addon for Transifex {
    fn addon_name(&self) -> &str {
        "transifex"
    }

    fn before_setup(&self, sh: &mut Shell) -> Result<()> {
        self.install(sh);
        Ok(())
    }

    fn configure(&self, sh: &mut Shell) -> Result<()> {
        self.write_credentials(sh);
        Ok(())
    }

    fn after_success(&self, sh: &mut Shell) -> Result<()> {
        if self.config.auto_push.enabled {
            self.source_push(sh);
        }
        Ok(())
    }
}
