use serde::{Deserialize, Serialize};

/// Board coordinates of a tile: row first, then column.
///
/// Ordering is row-major so ordered maps keyed by address iterate the board
/// top to bottom, left to right.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileAddress {
    pub row: i32,
    pub col: i32,
}

impl TileAddress {
    #[inline]
    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    #[inline]
    pub fn offset(self, step: Step) -> TileAddress {
        TileAddress {
            row: self.row + step.dr,
            col: self.col + step.dc,
        }
    }

    /// Chebyshev distance; 1 for all eight immediate neighbors.
    #[inline]
    pub fn king_distance(self, other: TileAddress) -> i32 {
        (self.row - other.row).abs().max((self.col - other.col).abs())
    }
}

impl std::fmt::Display for TileAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

impl From<(i32, i32)> for TileAddress {
    fn from((row, col): (i32, i32)) -> Self {
        Self { row, col }
    }
}

/// A row/column delta.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Step {
    pub dr: i32,
    pub dc: i32,
}

impl Step {
    pub const UP: Step = Step { dr: -1, dc: 0 };
    pub const DOWN: Step = Step { dr: 1, dc: 0 };
    pub const LEFT: Step = Step { dr: 0, dc: -1 };
    pub const RIGHT: Step = Step { dr: 0, dc: 1 };
    pub const UP_LEFT: Step = Step { dr: -1, dc: -1 };
    pub const UP_RIGHT: Step = Step { dr: -1, dc: 1 };
    pub const DOWN_LEFT: Step = Step { dr: 1, dc: -1 };
    pub const DOWN_RIGHT: Step = Step { dr: 1, dc: 1 };

    #[inline]
    pub const fn is_diagonal(self) -> bool {
        self.dr != 0 && self.dc != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn addresses_order_row_major() {
        let mut addrs = vec![
            TileAddress::new(1, 0),
            TileAddress::new(0, 2),
            TileAddress::new(0, 1),
        ];
        addrs.sort();
        assert_eq!(
            addrs,
            vec![
                TileAddress::new(0, 1),
                TileAddress::new(0, 2),
                TileAddress::new(1, 0)
            ]
        );
    }

    #[test]
    fn king_distance_is_one_for_diagonals() {
        let center = TileAddress::new(4, 4);
        assert_eq!(center.king_distance(center.offset(Step::DOWN_RIGHT)), 1);
        assert_eq!(center.king_distance(TileAddress::new(6, 5)), 2);
    }

    #[test]
    fn only_corner_steps_are_diagonal() {
        assert!(Step::UP_RIGHT.is_diagonal());
        assert!(Step::DOWN_LEFT.is_diagonal());
        assert!(!Step::UP.is_diagonal());
        assert!(!Step::RIGHT.is_diagonal());
    }
}
