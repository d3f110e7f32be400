//! Error types for costlens core.
//!
//! Every error surfaces to the user as a notice; none ends the session.

use costlens_ledger::LedgerError;
use thiserror::Error;

/// Core error type for costlens operations.
#[derive(Debug, Error)]
pub enum CostlensError {
    /// Malformed user input; nothing was changed.
    #[error("Invalid input: {0}")]
    InputInvalid(String),

    /// The analyzer failed or produced an unusable report; prior costs are
    /// untouched.
    #[error("Analysis failed: {0}")]
    AnalysisFailed(String),

    /// The command does not apply in the current mode or state.
    #[error("{0}")]
    NotApplicable(String),

    /// An analysis is already running.
    #[error("An analysis is already running")]
    Busy,

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Ledger error passthrough.
    #[error("Ledger error: {0}")]
    Ledger(#[source] LedgerError),

    /// Filesystem error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<LedgerError> for CostlensError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::InvalidName(name) => {
                CostlensError::InputInvalid(format!("method name {:?} is empty", name))
            }
            LedgerError::MalformedReport(reason) => CostlensError::AnalysisFailed(reason),
            other => CostlensError::Ledger(other),
        }
    }
}
