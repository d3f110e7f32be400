//! # Execution Mode
//!
//! Gates every command on whether costlens is disabled, enabled for the
//! active file, or enabled for the whole project.
//!
//! ## Transitions
//!
//! | From | Request | Result |
//! |------|---------|--------|
//! | Disabled | enable (either mode) | Analysis runs; mode set on success |
//! | File / Project | enable, same mode | Rejected, no change |
//! | File / Project | enable, other mode | Analysis runs; mode switches on success |
//! | File / Project | disable | Disabled; decorations and panels cleared |
//! | Disabled | disable | Rejected, no change |
//!
//! The guards here never change the mode themselves: the session only sets
//! an enabled mode once an analysis pass has succeeded.

use crate::{error::CostlensError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Current execution mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    /// No analysis, no decorations.
    #[default]
    Disabled,
    /// Enabled for single files.
    File,
    /// Enabled for the whole project.
    Project,
}

impl ExecutionMode {
    /// Returns true in `File` and `Project` mode.
    pub fn is_enabled(self) -> bool {
        !matches!(self, Self::Disabled)
    }

    /// Checks that enabling `requested` is allowed from this mode.
    ///
    /// # Errors
    ///
    /// `NotApplicable` if already enabled in `requested`; `InputInvalid` if
    /// `requested` is `Disabled`.
    pub fn check_enable(self, requested: ExecutionMode) -> Result<()> {
        if !requested.is_enabled() {
            return Err(CostlensError::InputInvalid(
                "cannot enable costlens in disabled mode".to_string(),
            ));
        }
        if self == requested {
            return Err(CostlensError::NotApplicable(format!(
                "Costlens is already enabled for the {}",
                requested
            )));
        }
        Ok(())
    }

    /// Checks that disabling is allowed from this mode.
    ///
    /// # Errors
    ///
    /// `NotApplicable` if already disabled.
    pub fn check_disable(self) -> Result<()> {
        if !self.is_enabled() {
            return Err(CostlensError::NotApplicable(
                "Costlens is not enabled".to_string(),
            ));
        }
        Ok(())
    }

    /// Checks that the mode allows commands that need analysis data.
    ///
    /// # Errors
    ///
    /// `NotApplicable` when disabled.
    pub fn require_enabled(self) -> Result<()> {
        if !self.is_enabled() {
            return Err(CostlensError::NotApplicable(
                "Costlens is not enabled; enable it for a file or the project first".to_string(),
            ));
        }
        Ok(())
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disabled => write!(f, "disabled"),
            Self::File => write!(f, "current file"),
            Self::Project => write!(f, "project"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enable_from_disabled() {
        assert!(ExecutionMode::Disabled.check_enable(ExecutionMode::File).is_ok());
        assert!(ExecutionMode::Disabled.check_enable(ExecutionMode::Project).is_ok());
    }

    #[test]
    fn test_enable_same_mode_is_rejected() {
        let err = ExecutionMode::File.check_enable(ExecutionMode::File).unwrap_err();
        assert!(matches!(err, CostlensError::NotApplicable(_)));
        assert!(ExecutionMode::Project.check_enable(ExecutionMode::Project).is_err());
    }

    #[test]
    fn test_enable_other_mode_switches() {
        assert!(ExecutionMode::File.check_enable(ExecutionMode::Project).is_ok());
        assert!(ExecutionMode::Project.check_enable(ExecutionMode::File).is_ok());
    }

    #[test]
    fn test_disable_guards() {
        assert!(ExecutionMode::File.check_disable().is_ok());
        assert!(ExecutionMode::Project.check_disable().is_ok());
        assert!(matches!(
            ExecutionMode::Disabled.check_disable(),
            Err(CostlensError::NotApplicable(_))
        ));
    }

    #[test]
    fn test_enable_disabled_is_invalid() {
        assert!(matches!(
            ExecutionMode::File.check_enable(ExecutionMode::Disabled),
            Err(CostlensError::InputInvalid(_))
        ));
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(serde_json::to_string(&ExecutionMode::Project).unwrap(), "\"project\"");
    }
}
