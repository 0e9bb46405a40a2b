use serde::{Deserialize, Serialize};

use crate::{Building, TileAddress, UnitType};

/// Player actions submitted to the remote program.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Action {
    /// Take a free seat in a game that has not started.
    Join,
    /// Move (or attack with) the stack at `origin` onto `destination`.
    Move {
        origin: TileAddress,
        destination: TileAddress,
    },
    Recruit {
        unit_type: UnitType,
        quantity: u32,
        at: TileAddress,
    },
    Build {
        at: TileAddress,
        building: Building,
    },
    EndTurn,
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::Join => "join",
            Action::Move { .. } => "move",
            Action::Recruit { .. } => "recruit",
            Action::Build { .. } => "build",
            Action::EndTurn => "end_turn",
        }
    }
}
