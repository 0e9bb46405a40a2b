use std::sync::Arc;

use tilewar_core::{AddressMap, Outcome, Reachable, SelectionState};
use tilewar_protocol::{Snapshot, TileAddress};

use crate::error::ActionFailure;
use crate::refresh::RefreshMode;

/// Everything a renderer needs, republished on every session change.
#[derive(Clone, Debug, Default)]
pub struct ReadModel {
    pub snapshot: Option<Arc<Snapshot>>,
    pub map: Arc<AddressMap>,
    pub selection: SelectionState,
    pub selected: Option<TileAddress>,
    pub reachable: Vec<Reachable>,
    pub remaining_seconds: Option<u64>,
    /// `None` for spectators.
    pub local_player_index: Option<usize>,
    pub balance: u64,
    pub attack_points: u64,
    pub outcome: Outcome,
    pub last_error: Option<ActionFailure>,
    pub refresh: RefreshMode,
}

impl ReadModel {
    pub fn is_spectator(&self) -> bool {
        self.local_player_index.is_none()
    }

    /// True while it is the local player's turn.
    pub fn is_my_turn(&self) -> bool {
        match (&self.snapshot, self.local_player_index) {
            (Some(snapshot), Some(index)) => snapshot.current_player_index as usize == index,
            _ => false,
        }
    }
}
