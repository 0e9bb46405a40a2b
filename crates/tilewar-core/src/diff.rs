use tilewar_protocol::{Snapshot, TileAddress};

/// Classification of the change between two successive snapshots.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Transition {
    /// Some tile changed hands. Used as a "combat happened" cue.
    pub ownership_changed: bool,
}

/// Compares tile owners of `prev` and `next` over every address present in
/// either snapshot. Gaps and missing positions count as unowned. Without a
/// previous snapshot nothing is considered changed.
///
/// This is a heuristic for picking feedback, not a combat log: a tile lost
/// and retaken within one transition reads as unchanged.
pub fn classify(prev: Option<&Snapshot>, next: &Snapshot) -> Transition {
    let Some(prev) = prev else {
        return Transition::default();
    };

    let rows = prev.tiles.len().max(next.tiles.len());
    let ownership_changed = (0..rows).any(|row| {
        let cols = row_len(prev, row).max(row_len(next, row));
        (0..cols).any(|col| {
            let at = TileAddress::new(row as i32, col as i32);
            prev.owner_at(at) != next.owner_at(at)
        })
    });

    Transition { ownership_changed }
}

fn row_len(snapshot: &Snapshot, row: usize) -> usize {
    snapshot.tiles.get(row).map_or(0, Vec::len)
}
