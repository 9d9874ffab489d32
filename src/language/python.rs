// Python build-script driver
// Emits the full job lifecycle for one python job: interpreter acquisition,
// virtualenv activation, dependency installation, and the default script
// step. CPython versions install from a prebuilt archive; pypy versions
// install from the upstream binary release when the spec pins one.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::cache::DirectoryCache;
use crate::config::{CacheSettings, JobConfig, VirtualenvConfig};
use crate::error::{BuildgenError, GenerationError, Result};
use crate::shell::{AnsiColor, CmdOptions, Shell};

use super::traits::{LanguageScript, BASE_CACHE_SLUG};

/// Version used when the job configuration does not pin one.
pub const DEFAULT_VERSION: &str = "2.7";

const REQUIREMENTS_MISSING: &str = "Could not locate requirements.txt. Override the install: key in your job configuration to install dependencies.";
const SCRIPT_MISSING: &str =
    "Please override the script: key in your job configuration to run tests.";

const PYENV_PATH_FILE: &str = "/etc/profile.d/pyenv.sh";
const TEMP_PYENV_PATH_FILE: &str = "/tmp/pyenv.sh";

const PYPY_INSTALL_DIR: &str = "/usr/local/pypy";
const PYTHON_ARCHIVE_BASE: &str = "https://s3.amazonaws.com/ci-python-archives/binaries";

static PYPY_VERSION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^pypy(?P<compat>\d+(?:\.\d+)*)?(?:-(?P<pypy>\d+(?:\.\d+)*))?$")
        .expect("pypy version pattern is valid")
});

/// A parsed python version spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PythonVersion {
    Cpython(String),
    Pypy {
        raw: String,
        compat: Option<String>,
        pypy: Option<String>,
    },
}

impl PythonVersion {
    /// Parse a configured version string. Anything mentioning pypy must
    /// match the pypy pattern; other strings are taken verbatim.
    pub fn parse(spec: &str) -> Result<Self> {
        if !spec.to_ascii_lowercase().contains("pypy") {
            return Ok(PythonVersion::Cpython(spec.to_string()));
        }

        let captures = PYPY_VERSION_RE.captures(spec).ok_or_else(|| {
            BuildgenError::Generation(Box::new(GenerationError::InvalidVersion {
                language: "python".to_string(),
                version: spec.to_string(),
                reason: "pypy versions look like pypy, pypyN.N or pypyN.N-M.M".to_string(),
            }))
        })?;

        Ok(PythonVersion::Pypy {
            raw: spec.to_string(),
            compat: captures.name("compat").map(|m| m.as_str().to_string()),
            pypy: captures.name("pypy").map(|m| m.as_str().to_string()),
        })
    }

    /// The configured version string, unchanged.
    pub fn raw(&self) -> &str {
        match self {
            PythonVersion::Cpython(version) => version,
            PythonVersion::Pypy { raw, .. } => raw,
        }
    }

    pub fn is_pypy(&self) -> bool {
        matches!(self, PythonVersion::Pypy { .. })
    }

    /// Download URL for a prebuilt pypy archive. None unless the spec pins
    /// both the compatibility version and the pypy version.
    pub fn pypy_archive_url(&self, arch: &str) -> Option<String> {
        match self {
            PythonVersion::Pypy {
                compat: Some(compat),
                pypy: Some(pypy),
                ..
            } => Some(format!(
                "https://bitbucket.org/pypy/pypy/downloads/pypy{compat}-v{pypy}-{arch}.tar.bz2"
            )),
            _ => None,
        }
    }
}

/// Script driver for python jobs.
pub struct PythonScript {
    version: PythonVersion,
    virtualenv: VirtualenvConfig,
    cache: CacheSettings,
}

impl PythonScript {
    pub fn new(config: &JobConfig) -> Result<Self> {
        let spec = config
            .python
            .clone()
            .unwrap_or_else(|| DEFAULT_VERSION.to_string());
        Ok(Self {
            version: PythonVersion::parse(&spec)?,
            virtualenv: config.virtualenv.clone(),
            cache: config.cache.clone(),
        })
    }

    fn version(&self) -> &str {
        self.version.raw()
    }

    fn virtualenv_name(&self) -> String {
        if self.version.is_pypy() {
            self.version.raw().to_string()
        } else {
            format!("python{}", self.version())
        }
    }

    fn system_site_packages_suffix(&self) -> &'static str {
        if self.virtualenv.system_site_packages {
            "_with_system_site_packages"
        } else {
            ""
        }
    }

    fn virtualenv_activate(&self) -> String {
        format!(
            "~/virtualenv/{}{}/bin/activate",
            self.virtualenv_name(),
            self.system_site_packages_suffix()
        )
    }

    /// No archive URL means no install commands at all; the worker image's
    /// preinstalled default pypy is used instead.
    fn install_pypy(&self, sh: &mut Shell) {
        let Some(archive_url) = self.version.pypy_archive_url("linux64") else {
            return;
        };
        sh.cmd(
            format!("curl -s -L -o pypy.tar.bz2 {archive_url}"),
            CmdOptions::default(),
        );
        sh.cmd(
            format!("mkdir {PYPY_INSTALL_DIR}"),
            CmdOptions {
                echo: false,
                sudo: true,
                ..CmdOptions::default()
            },
        );
        sh.cmd(
            format!("tar xjf pypy.tar.bz2 -C {PYPY_INSTALL_DIR} --strip-components=1"),
            CmdOptions {
                sudo: true,
                ..CmdOptions::default()
            },
        );
        sh.export("PATH", &format!("{PYPY_INSTALL_DIR}/bin:$PATH"), true);
        sh.cmd(
            "rm pypy.tar.bz2",
            CmdOptions {
                echo: false,
                ..CmdOptions::default()
            },
        );
        sh.cmd("rm -f $HOME/virtualenv/pypy{,3}", CmdOptions::default());
        sh.cmd(
            format!(
                "virtualenv --distribute --python={PYPY_INSTALL_DIR}/bin/python $HOME/virtualenv/{}",
                self.virtualenv_name()
            ),
            CmdOptions::default(),
        );
    }

    fn install_python_archive(&self, sh: &mut Shell) {
        let version = self.version();
        sh.raw(format!(
            "archive_url={PYTHON_ARCHIVE_BASE}/python-{version}.tar.bz2"
        ));
        sh.cmd(
            format!("curl -s -o python-{version}.tar.bz2 ${{archive_url}}"),
            CmdOptions {
                echo: false,
                assert: true,
                ..CmdOptions::default()
            },
        );
        sh.cmd(
            format!("tar xjf python-{version}.tar.bz2 --directory /"),
            CmdOptions {
                echo: false,
                sudo: true,
                assert: true,
                ..CmdOptions::default()
            },
        );
        sh.cmd(
            format!("rm python-{version}.tar.bz2"),
            CmdOptions {
                echo: false,
                ..CmdOptions::default()
            },
        );
    }

    /// Prepend the freshly installed interpreter to the system-wide PATH
    /// configuration, through a temp file so the rewrite runs unprivileged.
    fn setup_path(&self, sh: &mut Shell) {
        let version = self.version();
        sh.cmd(
            format!(
                r"sed -e 's|export PATH=\(.*\)$|export PATH=/opt/python/{version}/bin:\1|' {PYENV_PATH_FILE} > {TEMP_PYENV_PATH_FILE}"
            ),
            CmdOptions::default(),
        );
        sh.cmd(
            format!("cat {TEMP_PYENV_PATH_FILE} | sudo tee {PYENV_PATH_FILE} > /dev/null"),
            CmdOptions::default(),
        );
    }
}

impl LanguageScript for PythonScript {
    fn language_name(&self) -> &str {
        "python"
    }

    fn export(&self, sh: &mut Shell) -> Result<()> {
        sh.export("CI_PYTHON_VERSION", self.version(), false);
        Ok(())
    }

    fn configure(&self, sh: &mut Shell) -> Result<()> {
        let activate = self.virtualenv_activate();
        sh.if_(&format!("! -f {activate}"), |sh| {
            sh.echo(
                format!("{} is not installed; attempting download", self.version()),
                Some(AnsiColor::Yellow),
            );
            if self.version.is_pypy() {
                self.install_pypy(sh);
            } else {
                self.install_python_archive(sh);
                self.setup_path(sh);
            }
        });
        Ok(())
    }

    fn setup(&self, sh: &mut Shell) -> Result<()> {
        sh.cmd(
            format!("source {}", self.virtualenv_activate()),
            CmdOptions::default(),
        );
        Ok(())
    }

    fn announce(&self, sh: &mut Shell) -> Result<()> {
        sh.cmd("python --version", CmdOptions::default());
        sh.cmd("pip --version", CmdOptions::default());
        sh.export("PIP_DISABLE_PIP_VERSION_CHECK", "1", false);
        Ok(())
    }

    fn setup_cache(&self, sh: &mut Shell, cache: &mut DirectoryCache) -> Result<()> {
        if self.cache.pip() {
            sh.fold("cache.pip", |sh| {
                sh.echo("", None);
                cache.add(sh, "$HOME/.cache/pip");
            });
        }
        Ok(())
    }

    fn install(&self, sh: &mut Shell) -> Result<()> {
        sh.if_("-f Requirements.txt", |sh| {
            sh.cmd(
                "pip install -r Requirements.txt",
                CmdOptions {
                    retry: true,
                    fold: Some("install".to_string()),
                    ..CmdOptions::default()
                },
            );
        });
        sh.elif_("-f requirements.txt", |sh| {
            sh.cmd(
                "pip install -r requirements.txt",
                CmdOptions {
                    retry: true,
                    fold: Some("install".to_string()),
                    ..CmdOptions::default()
                },
            );
        });
        sh.else_(|sh| {
            sh.echo(REQUIREMENTS_MISSING, None);
        });
        Ok(())
    }

    fn script(&self, sh: &mut Shell) -> Result<()> {
        // The python ecosystem has no default test command the community
        // agrees on, so the job must configure one.
        sh.failure(SCRIPT_MISSING);
        Ok(())
    }

    fn cache_slug(&self) -> String {
        format!("{}--python-{}", BASE_CACHE_SLUG, self.version())
    }

    fn use_directory_cache(&self, base: bool) -> bool {
        base || self.cache.pip()
    }
}
