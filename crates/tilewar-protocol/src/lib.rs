mod address;
pub mod catalog;
mod command;
mod error;
mod ids;
mod snapshot;
pub mod wire;

pub use crate::address::*;
pub use crate::catalog::UnitStats;
pub use crate::command::*;
pub use crate::error::*;
pub use crate::ids::*;
pub use crate::snapshot::*;
pub use crate::wire::{snapshot_from_json, snapshot_hash, WireError};
