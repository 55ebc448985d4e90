//! Replay error types.

use std::path::PathBuf;

use roster_app::RoomError;
use thiserror::Error;

/// Why a replay stopped.
#[derive(Debug, Error)]
pub enum ReplayError {
    /// The script could not be read.
    #[error("cannot read script {}: {source}", path.display())]
    Io {
        /// Script path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A line is not a valid step.
    #[error("line {line}: invalid step: {source}")]
    Parse {
        /// 1-based line number.
        line: usize,
        /// JSON error.
        source: serde_json::Error,
    },

    /// A step was rejected while running with `--fail-fast`.
    #[error("line {line}: {source}")]
    Step {
        /// 1-based line number.
        line: usize,
        /// Rejection.
        source: StepError,
    },
}

/// Why a single step was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StepError {
    /// The room rejected the event.
    #[error(transparent)]
    Room(#[from] RoomError),

    /// An `ack` step with nothing pushed to acknowledge.
    #[error("ack without a pending send")]
    NoPendingSend,
}
