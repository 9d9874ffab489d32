// Addon drivers for buildgen

pub mod base;
pub mod transifex;

pub use base::Addon;
pub use transifex::{AutoPushConfig, Transifex, TransifexConfig};

use crate::config::JobConfig;
use crate::error::{BuildgenError, GenerationError, Result};

/// Addons buildgen knows how to drive.
pub const AVAILABLE_ADDONS: &[&str] = &["transifex"];

/// Instantiate every addon the job configuration enables, in configuration
/// order.
pub fn addons_for(config: &JobConfig) -> Result<Vec<Box<dyn Addon>>> {
    let mut addons: Vec<Box<dyn Addon>> = Vec::new();
    for (name, section) in &config.addons {
        match name.as_str() {
            "transifex" => addons.push(Box::new(Transifex::from_section(section)?)),
            other => {
                return Err(BuildgenError::Generation(Box::new(
                    GenerationError::UnknownAddon {
                        addon: other.to_string(),
                        available: AVAILABLE_ADDONS.iter().map(|s| s.to_string()).collect(),
                    },
                )))
            }
        }
    }
    Ok(addons)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_addons_configured() {
        let config = JobConfig::from_yaml("language: python").unwrap();
        assert!(addons_for(&config).unwrap().is_empty());
    }

    #[test]
    fn test_transifex_addon_is_constructed() {
        let config =
            JobConfig::from_yaml("language: python\naddons:\n  transifex:\n    token: t").unwrap();
        let addons = addons_for(&config).unwrap();
        assert_eq!(addons.len(), 1);
        assert_eq!(addons[0].addon_name(), "transifex");
    }

    #[test]
    fn test_unknown_addon_is_rejected() {
        let config =
            JobConfig::from_yaml("language: python\naddons:\n  firefox: \"38.0\"").unwrap();
        let err = addons_for(&config).err().unwrap();
        assert!(matches!(err, BuildgenError::Generation(_)));
    }
}
