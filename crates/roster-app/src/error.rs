//! Room error types.

use roster_core::{DispatchError, PresenceError};
use thiserror::Error;

/// Errors returned by [`crate::Room`] operations.
///
/// All of them are recoverable; the room keeps its last good state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoomError {
    /// A presence event was rejected.
    #[error(transparent)]
    Presence(#[from] PresenceError),

    /// A send or send callback was rejected.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}
