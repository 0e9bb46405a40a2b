use tilewar_protocol::{GameStatus, PlayerKey, Snapshot};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Outcome {
    #[default]
    InProgress,
    Winner(PlayerKey),
    /// Completed with no recorded winner and no single survivor.
    Undetermined,
}

impl Outcome {
    pub fn is_over(&self) -> bool {
        !matches!(self, Outcome::InProgress)
    }
}

/// Winner of a completed game: the recorded winner if present, otherwise the
/// only player still alive. Several (or no) survivors give `Undetermined`.
pub fn resolve_outcome(snapshot: &Snapshot) -> Outcome {
    if snapshot.status != GameStatus::Completed {
        return Outcome::InProgress;
    }
    if let Some(winner) = &snapshot.winner {
        return Outcome::Winner(winner.clone());
    }

    let mut alive = snapshot.players.iter().filter(|p| p.is_alive);
    match (alive.next(), alive.next()) {
        (Some(only), None) => Outcome::Winner(only.key.clone()),
        _ => Outcome::Undetermined,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tilewar_protocol::{MapSize, PlayerRecord};

    fn completed(alive: &[bool]) -> Snapshot {
        let mut snapshot = Snapshot::blank(MapSize::Small);
        snapshot.status = GameStatus::Completed;
        snapshot.players = alive
            .iter()
            .enumerate()
            .map(|(i, &is_alive)| PlayerRecord {
                key: PlayerKey::new(format!("p{i}")),
                balance: 0,
                attack_points: 0,
                is_alive,
            })
            .collect();
        snapshot
    }

    #[test]
    fn single_survivor_wins() {
        let snapshot = completed(&[false, false, true, false]);
        assert_eq!(
            resolve_outcome(&snapshot),
            Outcome::Winner(PlayerKey::new("p2"))
        );
    }

    #[test]
    fn two_survivors_are_undetermined() {
        let snapshot = completed(&[true, false, true, false]);
        assert_eq!(resolve_outcome(&snapshot), Outcome::Undetermined);
    }

    #[test]
    fn recorded_winner_takes_precedence() {
        let mut snapshot = completed(&[true, true]);
        snapshot.winner = Some(PlayerKey::new("p1"));
        assert_eq!(
            resolve_outcome(&snapshot),
            Outcome::Winner(PlayerKey::new("p1"))
        );
    }

    #[test]
    fn live_game_is_in_progress() {
        let mut snapshot = completed(&[true]);
        snapshot.status = GameStatus::Live;
        assert_eq!(resolve_outcome(&snapshot), Outcome::InProgress);
    }
}
