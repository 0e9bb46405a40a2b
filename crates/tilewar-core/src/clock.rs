//! Turn countdown derived from the remote ledger's clock.
//!
//! The local wall clock and the ledger clock disagree by drift plus network
//! latency. A periodically resampled offset (`remote - local`) is added to
//! local time before comparing against the turn start recorded on the
//! ledger.

use tilewar_protocol::{GameStatus, Snapshot};

/// Turn length enforced by the remote program.
pub const DEFAULT_MAX_TURN_SECS: u32 = 60;

/// `remote - local`, in seconds.
pub fn estimate_offset(remote_now: i64, local_now: i64) -> i64 {
    remote_now - local_now
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ClockPhase {
    #[default]
    NoSnapshot,
    Counting,
    /// Expiry has been signalled for the current turn.
    Expired,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClockReading {
    pub remaining_seconds: u64,
    /// True on the single tick at which the turn ran out.
    pub expired: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct TurnKey {
    started_at: i64,
    player_index: u8,
}

#[derive(Clone, Debug)]
pub struct TurnClock {
    max_turn_secs: u32,
    offset_secs: i64,
    turn: Option<TurnKey>,
    phase: ClockPhase,
}

impl Default for TurnClock {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_TURN_SECS)
    }
}

impl TurnClock {
    pub fn new(max_turn_secs: u32) -> Self {
        Self {
            max_turn_secs,
            offset_secs: 0,
            turn: None,
            phase: ClockPhase::NoSnapshot,
        }
    }

    pub fn phase(&self) -> ClockPhase {
        self.phase
    }

    pub fn offset_secs(&self) -> i64 {
        self.offset_secs
    }

    pub fn set_offset(&mut self, offset_secs: i64) {
        self.offset_secs = offset_secs;
    }

    /// Tracks the turn described by `snapshot`. A new turn start or a new
    /// active player restarts the countdown; games that are not live, or
    /// carry no turn start, stop it.
    pub fn observe(&mut self, snapshot: &Snapshot) {
        let key = match (snapshot.status, snapshot.turn_timestamp) {
            (GameStatus::Live, Some(started_at)) => TurnKey {
                started_at,
                player_index: snapshot.current_player_index,
            },
            _ => {
                self.turn = None;
                self.phase = ClockPhase::NoSnapshot;
                return;
            }
        };

        if self.turn != Some(key) {
            self.turn = Some(key);
            self.phase = ClockPhase::Counting;
        }
    }

    /// Seconds left in the current turn at local time `local_now`, without
    /// advancing the phase.
    pub fn remaining(&self, local_now: i64) -> Option<u64> {
        let turn = self.turn?;
        let elapsed = (local_now + self.offset_secs) - turn.started_at;
        let remaining = i64::from(self.max_turn_secs) - elapsed;
        Some(remaining.max(0) as u64)
    }

    /// Once-per-second update. Returns `None` while no turn is tracked.
    pub fn tick(&mut self, local_now: i64) -> Option<ClockReading> {
        let remaining_seconds = self.remaining(local_now)?;
        let expired = remaining_seconds == 0 && self.phase == ClockPhase::Counting;
        if expired {
            self.phase = ClockPhase::Expired;
        }
        Some(ClockReading {
            remaining_seconds,
            expired,
        })
    }
}
