//! Static unit and building numbers published with the game rules.
//!
//! The remote program owns combat and economy; these values only drive
//! client-side affordability checks and panel displays.

use crate::{Building, UnitType};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UnitStats {
    pub cost: u64,
    pub stamina: u32,
    pub strength: u32,
}

impl UnitType {
    pub const ALL: [UnitType; 4] = [
        UnitType::Infantry,
        UnitType::Tank,
        UnitType::Plane,
        UnitType::Mutant,
    ];

    pub const fn stats(self) -> UnitStats {
        match self {
            UnitType::Infantry => UnitStats {
                cost: 1,
                stamina: 1,
                strength: 1,
            },
            UnitType::Tank => UnitStats {
                cost: 3,
                stamina: 3,
                strength: 3,
            },
            UnitType::Plane => UnitStats {
                cost: 5,
                stamina: 5,
                strength: 4,
            },
            // Neutral, cannot be recruited or moved.
            UnitType::Mutant => UnitStats {
                cost: 0,
                stamina: 0,
                strength: 1,
            },
        }
    }

    pub const fn is_recruitable(self) -> bool {
        !matches!(self, UnitType::Mutant)
    }
}

impl Building {
    /// Buildings a player can construct from the build menu.
    pub const CONSTRUCTIBLE: [Building; 4] = [
        Building::GasPlant,
        Building::TankFactory,
        Building::PlaneFactory,
        Building::Fort,
    ];

    /// Construction cost, `None` for bases (created with the game, upgraded
    /// by the program).
    pub const fn cost(self) -> Option<u64> {
        match self {
            Building::GasPlant | Building::TankFactory | Building::PlaneFactory | Building::Fort => {
                Some(12)
            }
            Building::Base { .. } => None,
        }
    }

    /// Resources produced per turn.
    pub const fn yield_per_turn(self) -> u64 {
        match self {
            Building::Base { level: 1 } => 3,
            Building::Base { level: 2 } => 4,
            Building::Base { .. } => 6,
            Building::GasPlant => 1,
            Building::TankFactory | Building::PlaneFactory | Building::Fort => 0,
        }
    }

    /// Defensive strength, `None` for buildings that add none.
    pub const fn strength(self) -> Option<u32> {
        match self {
            Building::Base { level: 1 } => Some(12),
            Building::Base { level: 2 } => Some(16),
            Building::Base { .. } => Some(24),
            Building::Fort => Some(7),
            Building::GasPlant | Building::TankFactory | Building::PlaneFactory => None,
        }
    }

    /// Unit type this building unlocks for recruitment.
    pub const fn unlocks(self) -> Option<UnitType> {
        match self {
            Building::TankFactory => Some(UnitType::Tank),
            Building::PlaneFactory => Some(UnitType::Plane),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_numbers_scale_with_level() {
        assert_eq!(Building::Base { level: 1 }.yield_per_turn(), 3);
        assert_eq!(Building::Base { level: 3 }.yield_per_turn(), 6);
        assert_eq!(Building::Base { level: 2 }.strength(), Some(16));
        assert_eq!(Building::Base { level: 2 }.cost(), None);
    }

    #[test]
    fn factories_unlock_matching_units() {
        assert_eq!(Building::TankFactory.unlocks(), Some(UnitType::Tank));
        assert_eq!(Building::PlaneFactory.unlocks(), Some(UnitType::Plane));
        assert_eq!(Building::Fort.unlocks(), None);
    }
}
