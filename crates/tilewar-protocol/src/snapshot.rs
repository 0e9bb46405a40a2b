use serde::{Deserialize, Deserializer, Serialize};

use crate::{PlayerKey, TileAddress};

/// Full authoritative game state as read from the remote program.
///
/// `tiles` is jagged and column-indexed: `tiles[row][col]` is `None` for a gap
/// (a position outside the playable diamond, or a tile removed after its owner
/// was eliminated).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub round: u32,
    pub current_player_index: u8,
    /// Remote-clock epoch seconds at which the current turn started.
    #[serde(default)]
    pub turn_timestamp: Option<i64>,
    pub status: GameStatus,
    #[serde(default)]
    pub winner: Option<PlayerKey>,
    pub players: Vec<PlayerRecord>,
    pub tiles: Vec<Vec<Option<Cell>>>,
    pub map_size: MapSize,
    #[serde(default = "default_max_players")]
    pub max_players: u8,
    #[serde(default)]
    pub is_multiplayer: bool,
}

fn default_max_players() -> u8 {
    2
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameStatus {
    NotStarted,
    Live,
    Completed,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MapSize {
    #[default]
    Small,
    Large,
}

impl MapSize {
    const SMALL_ROWS: [u32; 9] = [3, 5, 7, 9, 9, 9, 7, 5, 3];
    const LARGE_ROWS: [u32; 13] = [3, 5, 7, 9, 11, 13, 13, 13, 11, 9, 7, 5, 3];

    /// Row widths of the diamond layout, top to bottom.
    pub fn row_widths(self) -> &'static [u32] {
        match self {
            MapSize::Small => &Self::SMALL_ROWS,
            MapSize::Large => &Self::LARGE_ROWS,
        }
    }

    pub fn max_width(self) -> u32 {
        self.row_widths().iter().copied().max().unwrap_or(0)
    }
}

/// Per-player resources.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub key: PlayerKey,
    pub balance: u64,
    pub attack_points: u64,
    pub is_alive: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    /// Terrain level, 1..=3.
    pub level: u8,
    #[serde(default)]
    pub owner: Option<PlayerKey>,
    #[serde(default)]
    pub building: Option<Building>,
    #[serde(default, deserialize_with = "non_empty_stack")]
    pub unit_stack: Option<UnitStack>,
}

impl Cell {
    pub fn new(level: u8) -> Self {
        Self {
            level,
            owner: None,
            building: None,
            unit_stack: None,
        }
    }

    pub fn is_owned_by(&self, player: &PlayerKey) -> bool {
        self.owner.as_ref() == Some(player)
    }

    pub fn has_base(&self) -> bool {
        matches!(self.building, Some(Building::Base { .. }))
    }
}

// A zero-quantity stack on the wire means "no stack".
fn non_empty_stack<'de, D>(deserializer: D) -> Result<Option<UnitStack>, D::Error>
where
    D: Deserializer<'de>,
{
    let stack = Option::<UnitStack>::deserialize(deserializer)?;
    Ok(stack.filter(|s| s.quantity > 0))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Building {
    Base { level: u8 },
    GasPlant,
    TankFactory,
    PlaneFactory,
    Fort,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum UnitType {
    Infantry,
    Tank,
    Plane,
    Mutant,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitStack {
    pub unit_type: UnitType,
    pub quantity: u32,
    /// Stamina left this turn.
    pub stamina: u32,
}

impl UnitStack {
    /// Returns `None` for an empty stack.
    pub fn new(unit_type: UnitType, quantity: u32, stamina: u32) -> Option<Self> {
        (quantity > 0).then_some(Self {
            unit_type,
            quantity,
            stamina,
        })
    }
}

/// Invariant violations in a received snapshot.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SnapshotError {
    #[error("base at {0} has no owner")]
    OwnerlessBase(TileAddress),
    #[error("terrain level {level} at {at} outside 1..=3")]
    TerrainLevel { at: TileAddress, level: u8 },
    #[error("base level {level} at {at} outside 1..=3")]
    BaseLevel { at: TileAddress, level: u8 },
    #[error("{rows} rows do not match the {expected}-row {map_size:?} map")]
    RowCount {
        map_size: MapSize,
        rows: usize,
        expected: usize,
    },
}

impl Snapshot {
    /// A not-yet-started game with an unowned diamond board of the given size.
    pub fn blank(map_size: MapSize) -> Self {
        let max_width = map_size.max_width();
        let tiles = map_size
            .row_widths()
            .iter()
            .map(|&width| {
                let start = (max_width - width) / 2;
                (0..max_width)
                    .map(|col| (col >= start && col < start + width).then(|| Cell::new(1)))
                    .collect()
            })
            .collect();

        Self {
            round: 0,
            current_player_index: 0,
            turn_timestamp: None,
            status: GameStatus::NotStarted,
            winner: None,
            players: Vec::new(),
            tiles,
            map_size,
            max_players: default_max_players(),
            is_multiplayer: false,
        }
    }

    pub fn cell(&self, at: TileAddress) -> Option<&Cell> {
        let row = usize::try_from(at.row).ok()?;
        let col = usize::try_from(at.col).ok()?;
        self.tiles.get(row)?.get(col)?.as_ref()
    }

    /// Mutable access for assembling a snapshot before it is published.
    pub fn cell_mut(&mut self, at: TileAddress) -> Option<&mut Cell> {
        let row = usize::try_from(at.row).ok()?;
        let col = usize::try_from(at.col).ok()?;
        self.tiles.get_mut(row)?.get_mut(col)?.as_mut()
    }

    /// All playable cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (TileAddress, &Cell)> {
        self.tiles.iter().enumerate().flat_map(|(row, cols)| {
            cols.iter().enumerate().filter_map(move |(col, cell)| {
                cell.as_ref()
                    .map(|cell| (TileAddress::new(row as i32, col as i32), cell))
            })
        })
    }

    pub fn owner_at(&self, at: TileAddress) -> Option<&PlayerKey> {
        self.cell(at).and_then(|c| c.owner.as_ref())
    }

    pub fn player_index(&self, key: &PlayerKey) -> Option<usize> {
        self.players.iter().position(|p| &p.key == key)
    }

    pub fn player(&self, key: &PlayerKey) -> Option<&PlayerRecord> {
        self.players.iter().find(|p| &p.key == key)
    }

    pub fn current_player(&self) -> Option<&PlayerRecord> {
        self.players.get(self.current_player_index as usize)
    }

    /// Checks the cell invariants; reports the first violation.
    pub fn check_invariants(&self) -> Result<(), SnapshotError> {
        let expected = self.map_size.row_widths().len();
        if self.tiles.len() != expected {
            return Err(SnapshotError::RowCount {
                map_size: self.map_size,
                rows: self.tiles.len(),
                expected,
            });
        }

        for (at, cell) in self.cells() {
            if !(1..=3).contains(&cell.level) {
                return Err(SnapshotError::TerrainLevel {
                    at,
                    level: cell.level,
                });
            }
            if let Some(Building::Base { level }) = cell.building {
                if cell.owner.is_none() {
                    return Err(SnapshotError::OwnerlessBase(at));
                }
                if !(1..=3).contains(&level) {
                    return Err(SnapshotError::BaseLevel { at, level });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_small_board_has_57_cells() {
        let snapshot = Snapshot::blank(MapSize::Small);
        assert_eq!(snapshot.cells().count(), 57);
        assert!(snapshot.cell(TileAddress::new(0, 0)).is_none());
        assert!(snapshot.cell(TileAddress::new(0, 3)).is_some());
        assert!(snapshot.cell(TileAddress::new(-1, 3)).is_none());
    }

    #[test]
    fn blank_large_board_has_109_cells() {
        assert_eq!(Snapshot::blank(MapSize::Large).cells().count(), 109);
    }

    #[test]
    fn zero_quantity_stack_deserializes_as_none() {
        let json = r#"{
            "level": 2,
            "owner": "alice",
            "unit_stack": { "unit_type": "Tank", "quantity": 0, "stamina": 3 }
        }"#;
        let cell: Cell = serde_json::from_str(json).unwrap();
        assert_eq!(cell.unit_stack, None);
        assert_eq!(cell.owner, Some(PlayerKey::new("alice")));
    }

    #[test]
    fn ownerless_base_is_reported() {
        let mut snapshot = Snapshot::blank(MapSize::Small);
        let at = TileAddress::new(4, 4);
        snapshot.cell_mut(at).unwrap().building = Some(Building::Base { level: 1 });
        assert_eq!(
            snapshot.check_invariants(),
            Err(SnapshotError::OwnerlessBase(at))
        );

        snapshot.cell_mut(at).unwrap().owner = Some(PlayerKey::new("alice"));
        assert_eq!(snapshot.check_invariants(), Ok(()));
    }

    #[test]
    fn empty_stack_constructor_returns_none() {
        assert!(UnitStack::new(UnitType::Infantry, 0, 1).is_none());
        assert!(UnitStack::new(UnitType::Infantry, 3, 1).is_some());
    }
}
