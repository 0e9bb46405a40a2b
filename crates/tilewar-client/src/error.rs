use thiserror::Error;

use tilewar_core::production::ProductionError;
use tilewar_protocol::RemoteError;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error(transparent)]
    Production(#[from] ProductionError),

    #[error("no snapshot loaded")]
    NotLoaded,

    #[error("game is not live")]
    NotLive,

    #[error("game has already started")]
    AlreadyStarted,

    #[error("spectators cannot act")]
    Spectator,

    #[error("another action is already in flight")]
    Busy,

    #[error("session disposed")]
    Disposed,
}

/// Last failed action, as shown to the player.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActionFailure {
    /// Action name (`join`, `move`, `recruit`, `build`, `end_turn`).
    pub action: &'static str,
    pub message: String,
    pub error: RemoteError,
}

impl ActionFailure {
    pub fn new(action: &'static str, error: RemoteError) -> Self {
        let message = match &error {
            RemoteError::ValidationRejected { reason } => reason.describe().to_string(),
            other => other.to_string(),
        };
        Self {
            action,
            message,
            error,
        }
    }
}
