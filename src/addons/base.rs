// Addon lifecycle seam

use crate::error::Result;
use crate::shell::Shell;

/// Optional build-lifecycle extension enabled via the job's addon
/// configuration. Hooks default to no-ops; an addon overrides the ones it
/// participates in.
pub trait Addon {
    fn addon_name(&self) -> &str;

    /// Runs before dependency installation.
    fn before_setup(&self, _sh: &mut Shell) -> Result<()> {
        Ok(())
    }

    /// Writes any configuration the addon's tooling needs.
    fn configure(&self, _sh: &mut Shell) -> Result<()> {
        Ok(())
    }

    /// Runs only after the job's script phase succeeded.
    fn after_success(&self, _sh: &mut Shell) -> Result<()> {
        Ok(())
    }
}
