pub mod clock;
mod diff;
mod grid;
pub mod movement;
mod outcome;
pub mod production;
pub mod selection;

pub use crate::clock::{estimate_offset, ClockPhase, ClockReading, TurnClock};
pub use crate::diff::*;
pub use crate::grid::*;
pub use crate::movement::{reachable, Reachable};
pub use crate::outcome::*;
pub use crate::selection::{
    ClickContext, ClickOutcome, MoveResolution, SelectionMachine, SelectionState,
};
