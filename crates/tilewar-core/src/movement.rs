use serde::{Deserialize, Serialize};

use tilewar_protocol::{Step, TileAddress};

use crate::AddressMap;

/// Stamina cost of a single step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StepCost {
    pub step: Step,
    pub cost: u32,
}

impl StepCost {
    /// Orthogonal steps cost 1, diagonal steps cost 2.
    pub const fn of(step: Step) -> Self {
        let cost = if step.is_diagonal() { 2 } else { 1 };
        Self { step, cost }
    }
}

/// Neighbor evaluation order: up, down, left, right, then the diagonals.
pub const MOVE_COSTS: [StepCost; 8] = [
    StepCost::of(Step::UP),
    StepCost::of(Step::DOWN),
    StepCost::of(Step::LEFT),
    StepCost::of(Step::RIGHT),
    StepCost::of(Step::UP_LEFT),
    StepCost::of(Step::UP_RIGHT),
    StepCost::of(Step::DOWN_LEFT),
    StepCost::of(Step::DOWN_RIGHT),
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reachable {
    pub address: TileAddress,
    pub move_cost: u32,
}

/// Immediate neighbors of `origin` that exist on the board and whose step
/// cost fits in `stamina`. Single hop only: stamina above 2 admits no extra
/// tiles.
pub fn reachable(origin: TileAddress, map: &AddressMap, stamina: u32) -> Vec<Reachable> {
    MOVE_COSTS
        .iter()
        .filter(|mc| mc.cost <= stamina)
        .map(|mc| Reachable {
            address: origin.offset(mc.step),
            move_cost: mc.cost,
        })
        .filter(|r| map.contains(r.address))
        .collect()
}

/// Cost of moving from `origin` to `destination`, if it is a legal hop.
pub fn move_cost(
    origin: TileAddress,
    destination: TileAddress,
    map: &AddressMap,
    stamina: u32,
) -> Option<u32> {
    reachable(origin, map, stamina)
        .into_iter()
        .find(|r| r.address == destination)
        .map(|r| r.move_cost)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tilewar_protocol::MapSize;

    fn small_map() -> AddressMap {
        AddressMap::from_shape(MapSize::Small.row_widths())
    }

    #[test]
    fn stamina_one_reaches_orthogonals_only() {
        let origin = TileAddress::new(4, 4);
        let found: Vec<_> = reachable(origin, &small_map(), 1)
            .into_iter()
            .map(|r| r.address)
            .collect();
        assert_eq!(
            found,
            vec![
                TileAddress::new(3, 4),
                TileAddress::new(5, 4),
                TileAddress::new(4, 3),
                TileAddress::new(4, 5),
            ]
        );
    }

    #[test]
    fn zero_stamina_reaches_nothing() {
        assert!(reachable(TileAddress::new(4, 4), &small_map(), 0).is_empty());
    }

    #[test]
    fn edge_tiles_drop_missing_neighbors() {
        // Top corner of the diamond: (0, 3) has no row above and no (0, 2).
        let found = reachable(TileAddress::new(0, 3), &small_map(), 2);
        let addrs: Vec<_> = found.iter().map(|r| r.address).collect();
        assert_eq!(
            addrs,
            vec![
                TileAddress::new(1, 3),
                TileAddress::new(0, 4),
                TileAddress::new(1, 2),
                TileAddress::new(1, 4),
            ]
        );
        assert_eq!(found[2].move_cost, 2);
    }

    #[test]
    fn move_cost_matches_direction() {
        let map = small_map();
        let origin = TileAddress::new(4, 4);
        assert_eq!(move_cost(origin, TileAddress::new(5, 5), &map, 2), Some(2));
        assert_eq!(move_cost(origin, TileAddress::new(5, 5), &map, 1), None);
        assert_eq!(move_cost(origin, TileAddress::new(6, 4), &map, 5), None);
    }
}
