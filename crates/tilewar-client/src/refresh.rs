//! How the session keeps its snapshot current.

use tilewar_protocol::GameStatus;

use crate::remote::ActiveSubscription;

/// Refresh mode without the resources behind it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RefreshMode {
    /// On-demand only, after local actions or clock expiry.
    #[default]
    Idle,
    /// Periodic fetch while a lobby fills up.
    Polling,
    /// Pushed updates from the remote program.
    Subscribed,
}

impl RefreshMode {
    pub fn for_game(status: GameStatus, is_multiplayer: bool) -> Self {
        match status {
            GameStatus::NotStarted => RefreshMode::Polling,
            GameStatus::Live if is_multiplayer => RefreshMode::Subscribed,
            GameStatus::Live | GameStatus::Completed => RefreshMode::Idle,
        }
    }
}

/// Active refresh resources. Polling and a subscription never coexist: the
/// subscription lives inside the `Subscribed` variant and is released when
/// the strategy is replaced.
#[derive(Debug, Default)]
pub enum RefreshStrategy {
    #[default]
    Idle,
    Polling,
    Subscribed(ActiveSubscription),
}

impl RefreshStrategy {
    pub fn mode(&self) -> RefreshMode {
        match self {
            RefreshStrategy::Idle => RefreshMode::Idle,
            RefreshStrategy::Polling => RefreshMode::Polling,
            RefreshStrategy::Subscribed(_) => RefreshMode::Subscribed,
        }
    }

    pub fn is_polling(&self) -> bool {
        matches!(self, RefreshStrategy::Polling)
    }

    pub fn is_subscribed(&self) -> bool {
        matches!(self, RefreshStrategy::Subscribed(_))
    }
}
