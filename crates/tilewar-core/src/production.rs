//! Client-side checks run before recruit and build actions are submitted.
//!
//! These mirror the rules the remote program enforces so obviously invalid
//! requests fail fast with the same reason the program would give.

use thiserror::Error;

use tilewar_protocol::{Building, Cell, PlayerKey, RejectReason, TileAddress, UnitType};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProductionError {
    #[error("no tile at {0}")]
    NoSuchTile(TileAddress),
    #[error("tile {0} is not controlled by the player")]
    NotOwned(TileAddress),
    #[error("{0:?} cannot be recruited on this tile")]
    Locked(UnitType),
    #[error("quantity must be at least 1")]
    ZeroQuantity,
    #[error("needs {needed}, balance is {available}")]
    NotEnoughFunds { needed: u64, available: u64 },
    #[error("{0:?} cannot be constructed")]
    NotConstructible(Building),
    #[error("tile {at} already has {existing:?}")]
    Occupied { at: TileAddress, existing: Building },
}

impl ProductionError {
    /// Reason the remote program would report for the same request.
    pub fn reject_reason(&self) -> RejectReason {
        match self {
            ProductionError::NoSuchTile(_) | ProductionError::NotOwned(_) => {
                RejectReason::TileNotOwned
            }
            ProductionError::Locked(_) => RejectReason::UnitTypeMismatch,
            ProductionError::NotEnoughFunds { .. } => RejectReason::NotEnoughFunds,
            ProductionError::Occupied { .. } => RejectReason::BuildingTypeConflict,
            other => RejectReason::Other(other.to_string()),
        }
    }
}

/// Unit types recruitable on `cell`: infantry anywhere the player holds,
/// tanks and planes only where the matching factory stands.
pub fn recruitable_units(cell: &Cell) -> Vec<UnitType> {
    let unlocked = cell.building.and_then(Building::unlocks);
    UnitType::ALL
        .into_iter()
        .filter(|&unit| unit == UnitType::Infantry || Some(unit) == unlocked)
        .collect()
}

/// Largest quantity of `unit` a balance pays for.
pub fn max_affordable(unit: UnitType, balance: u64) -> u64 {
    match unit.stats().cost {
        0 => 0,
        cost => balance / cost,
    }
}

/// Validates a recruit request and returns its total cost.
pub fn check_recruit(
    cell: Option<&Cell>,
    at: TileAddress,
    player: &PlayerKey,
    balance: u64,
    unit: UnitType,
    quantity: u32,
) -> Result<u64, ProductionError> {
    let cell = owned_cell(cell, at, player)?;
    if !unit.is_recruitable() || !recruitable_units(cell).contains(&unit) {
        return Err(ProductionError::Locked(unit));
    }
    if quantity == 0 {
        return Err(ProductionError::ZeroQuantity);
    }

    let needed = unit.stats().cost * u64::from(quantity);
    if needed > balance {
        return Err(ProductionError::NotEnoughFunds {
            needed,
            available: balance,
        });
    }
    Ok(needed)
}

/// Validates a build request and returns its cost.
pub fn check_build(
    cell: Option<&Cell>,
    at: TileAddress,
    player: &PlayerKey,
    balance: u64,
    building: Building,
) -> Result<u64, ProductionError> {
    let cell = owned_cell(cell, at, player)?;
    let needed = building
        .cost()
        .filter(|_| Building::CONSTRUCTIBLE.contains(&building))
        .ok_or(ProductionError::NotConstructible(building))?;
    if let Some(existing) = cell.building {
        return Err(ProductionError::Occupied { at, existing });
    }
    if needed > balance {
        return Err(ProductionError::NotEnoughFunds {
            needed,
            available: balance,
        });
    }
    Ok(needed)
}

fn owned_cell<'a>(
    cell: Option<&'a Cell>,
    at: TileAddress,
    player: &PlayerKey,
) -> Result<&'a Cell, ProductionError> {
    let cell = cell.ok_or(ProductionError::NoSuchTile(at))?;
    if !cell.is_owned_by(player) {
        return Err(ProductionError::NotOwned(at));
    }
    Ok(cell)
}
