use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use tilewar_protocol::{Cell, Snapshot, TileAddress};

pub const TILE_ORIGINAL_WIDTH: f32 = 590.0;
pub const TILE_ORIGINAL_HEIGHT: f32 = 371.0;
pub const TILE_DISPLAY_WIDTH: f32 = 256.0;
pub const TILE_DISPLAY_HEIGHT: f32 = TILE_DISPLAY_WIDTH * (TILE_ORIGINAL_HEIGHT / TILE_ORIGINAL_WIDTH);

/// Vertical lift applied to base sprites, which are taller than a tile.
pub const BASE_SPRITE_OFFSET_Y: f32 = -TILE_DISPLAY_HEIGHT / 2.0;

/// Isometric screen position of a tile's top-left corner.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct ScreenOffset {
    pub x: f32,
    pub y: f32,
}

impl ScreenOffset {
    pub fn of(at: TileAddress) -> Self {
        Self {
            x: (at.col - at.row) as f32 * (TILE_DISPLAY_WIDTH / 2.0),
            y: (at.col + at.row) as f32 * (TILE_DISPLAY_HEIGHT / 2.0),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CellMeta {
    pub address: TileAddress,
    pub screen: ScreenOffset,
    /// Extra vertical offset for the building sprite drawn on this tile.
    pub sprite_offset_y: f32,
    /// Cell data; `None` for a board built from a bare shape.
    pub cell: Option<Cell>,
}

/// Addressable view of the board: every playable `(row, col)` and its
/// metadata. Gaps are never present. Built once per snapshot and never
/// mutated afterwards.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AddressMap {
    cells: BTreeMap<TileAddress, CellMeta>,
}

impl AddressMap {
    /// Diamond board from row widths, used before a snapshot is available.
    /// Each row is centred against the widest one.
    pub fn from_shape(row_widths: &[u32]) -> Self {
        let max_width = row_widths.iter().copied().max().unwrap_or(0);
        let mut cells = BTreeMap::new();

        for (row, &width) in row_widths.iter().enumerate() {
            let start = (max_width - width) / 2;
            for col in start..start + width {
                let address = TileAddress::new(row as i32, col as i32);
                cells.insert(
                    address,
                    CellMeta {
                        address,
                        screen: ScreenOffset::of(address),
                        sprite_offset_y: 0.0,
                        cell: None,
                    },
                );
            }
        }

        Self { cells }
    }

    /// Board from a jagged snapshot; gap positions are skipped.
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        let cells = snapshot
            .cells()
            .map(|(address, cell)| {
                let sprite_offset_y = if cell.has_base() {
                    BASE_SPRITE_OFFSET_Y
                } else {
                    0.0
                };
                let meta = CellMeta {
                    address,
                    screen: ScreenOffset::of(address),
                    sprite_offset_y,
                    cell: Some(cell.clone()),
                };
                (address, meta)
            })
            .collect();

        Self { cells }
    }

    pub fn get(&self, at: TileAddress) -> Option<&CellMeta> {
        self.cells.get(&at)
    }

    pub fn cell(&self, at: TileAddress) -> Option<&Cell> {
        self.cells.get(&at).and_then(|meta| meta.cell.as_ref())
    }

    pub fn contains(&self, at: TileAddress) -> bool {
        self.cells.contains_key(&at)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Metadata in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = &CellMeta> {
        self.cells.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tilewar_protocol::{Building, MapSize, PlayerKey};

    #[test]
    fn small_diamond_has_57_cells() {
        let map = AddressMap::from_shape(MapSize::Small.row_widths());
        assert_eq!(map.len(), 57);
        // Row 0 holds columns 3..=5 only.
        assert!(!map.contains(TileAddress::new(0, 2)));
        assert!(map.contains(TileAddress::new(0, 3)));
        assert!(map.contains(TileAddress::new(0, 5)));
        assert!(!map.contains(TileAddress::new(0, 6)));
    }

    #[test]
    fn snapshot_map_skips_gaps() {
        let mut snapshot = Snapshot::blank(MapSize::Small);
        snapshot.tiles[4][0] = None;
        let map = AddressMap::from_snapshot(&snapshot);
        assert_eq!(map.len(), 56);
        assert!(!map.contains(TileAddress::new(4, 0)));
    }

    #[test]
    fn projection_follows_isometric_footprint() {
        let offset = ScreenOffset::of(TileAddress::new(2, 4));
        assert_eq!(offset.x, 2.0 * 128.0);
        assert!((offset.y - 3.0 * TILE_DISPLAY_HEIGHT).abs() < 1e-3);
    }

    #[test]
    fn bases_get_sprite_offset() {
        let mut snapshot = Snapshot::blank(MapSize::Small);
        let base = TileAddress::new(4, 4);
        let cell = snapshot.cell_mut(base).unwrap();
        cell.owner = Some(PlayerKey::new("alice"));
        cell.building = Some(Building::Base { level: 1 });

        let map = AddressMap::from_snapshot(&snapshot);
        assert_eq!(map.get(base).unwrap().sprite_offset_y, BASE_SPRITE_OFFSET_Y);
        assert_eq!(map.get(TileAddress::new(4, 5)).unwrap().sprite_offset_y, 0.0);
    }
}
