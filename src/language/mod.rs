// Language script drivers for buildgen
// One driver per supported language, looked up by the configured language
// name.

pub mod python;
pub mod traits;

pub use python::{PythonScript, PythonVersion};
pub use traits::{LanguageScript, BASE_CACHE_SLUG};

use crate::config::{JobConfig, SUPPORTED_LANGUAGES};
use crate::error::{BuildgenError, GenerationError, Result};

/// Look up the script driver for the job's configured language.
pub fn script_for(config: &JobConfig) -> Result<Box<dyn LanguageScript>> {
    match config.language.as_str() {
        "python" => Ok(Box::new(PythonScript::new(config)?)),
        other => Err(BuildgenError::Generation(Box::new(
            GenerationError::UnsupportedLanguage {
                language: other.to_string(),
                supported: SUPPORTED_LANGUAGES.iter().map(|s| s.to_string()).collect(),
            },
        ))),
    }
}
