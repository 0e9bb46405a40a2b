//! Click-driven selection state machine.
//!
//! Turns raw tile clicks into either local selection changes or a single
//! move request. The machine never talks to the remote program itself: it
//! reports `ClickOutcome::MoveRequested` and waits in `AwaitingRemote` until
//! the caller feeds the result back through [`SelectionMachine::resolve`].

use tilewar_protocol::{PlayerKey, RemoteError, TileAddress, UnitType};

use crate::movement::{reachable, Reachable};
use crate::AddressMap;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SelectionState {
    #[default]
    Idle,
    UnitSelected {
        origin: TileAddress,
    },
    /// A move from `origin` to `destination` is in flight.
    AwaitingRemote {
        origin: TileAddress,
        destination: TileAddress,
    },
}

/// What the machine needs to know about the board to judge a click.
#[derive(Clone, Copy, Debug)]
pub struct ClickContext<'a> {
    pub map: &'a AddressMap,
    /// `None` for spectators.
    pub local_player: Option<&'a PlayerKey>,
    /// False while the game has not started or is over.
    pub interactive: bool,
}

impl ClickContext<'_> {
    /// Unit type of a stack at `at` owned by the local player.
    fn own_stack(&self, at: TileAddress) -> Option<UnitType> {
        let player = self.local_player?;
        let cell = self.map.cell(at)?;
        if !cell.is_owned_by(player) {
            return None;
        }
        cell.unit_stack.map(|stack| stack.unit_type)
    }

    /// Stamina of the local player's stack at `at`; zero for anyone else's.
    fn stamina_at(&self, at: TileAddress) -> u32 {
        let Some(player) = self.local_player else {
            return 0;
        };
        self.map
            .cell(at)
            .filter(|cell| cell.is_owned_by(player))
            .and_then(|cell| cell.unit_stack)
            .map_or(0, |stack| stack.stamina)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClickOutcome {
    /// A stack was selected from idle.
    Selected { origin: TileAddress },
    /// Selection switched to another own stack.
    Reselected { origin: TileAddress },
    /// Second click on the selected stack.
    Deselected,
    /// Click on an invalid destination cleared the selection.
    Cleared,
    /// The caller must submit this move and report back via `resolve`.
    MoveRequested {
        origin: TileAddress,
        destination: TileAddress,
        unit_type: UnitType,
    },
    /// Nothing changed.
    Ignored,
}

/// Result of a resolved move, handed back to the caller for feedback.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MoveResolution {
    pub origin: TileAddress,
    pub destination: TileAddress,
    pub result: Result<(), RemoteError>,
}

#[derive(Clone, Debug, Default)]
pub struct SelectionMachine {
    state: SelectionState,
}

impl SelectionMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SelectionState {
        self.state
    }

    /// Selected (or in-flight) origin.
    pub fn origin(&self) -> Option<TileAddress> {
        match self.state {
            SelectionState::Idle => None,
            SelectionState::UnitSelected { origin }
            | SelectionState::AwaitingRemote { origin, .. } => Some(origin),
        }
    }

    pub fn is_awaiting_remote(&self) -> bool {
        matches!(self.state, SelectionState::AwaitingRemote { .. })
    }

    /// Tiles the selected stack can move to. Empty unless a unit is selected.
    pub fn reachable(&self, ctx: &ClickContext<'_>) -> Vec<Reachable> {
        match self.state {
            SelectionState::UnitSelected { origin } => {
                reachable(origin, ctx.map, ctx.stamina_at(origin))
            }
            _ => Vec::new(),
        }
    }

    /// Drops a selection whose origin no longer holds a local stack, e.g.
    /// after a refresh moved or captured it. Returns true if it was dropped.
    pub fn revalidate(&mut self, ctx: &ClickContext<'_>) -> bool {
        match self.state {
            SelectionState::UnitSelected { origin } if ctx.own_stack(origin).is_none() => {
                self.state = SelectionState::Idle;
                true
            }
            _ => false,
        }
    }

    pub fn click(&mut self, at: TileAddress, ctx: &ClickContext<'_>) -> ClickOutcome {
        if !ctx.interactive {
            return ClickOutcome::Ignored;
        }

        match self.state {
            SelectionState::AwaitingRemote { .. } => ClickOutcome::Ignored,
            SelectionState::Idle => self.click_idle(at, ctx),
            SelectionState::UnitSelected { origin } => {
                // A refresh may have moved or removed the selected stack.
                if ctx.own_stack(origin).is_none() {
                    self.state = SelectionState::Idle;
                    return self.click_idle(at, ctx);
                }
                if at == origin {
                    self.state = SelectionState::Idle;
                    return ClickOutcome::Deselected;
                }
                if ctx.own_stack(at).is_some() {
                    self.state = SelectionState::UnitSelected { origin: at };
                    return ClickOutcome::Reselected { origin: at };
                }

                let hop = reachable(origin, ctx.map, ctx.stamina_at(origin))
                    .into_iter()
                    .any(|r| r.address == at);
                match (hop, ctx.own_stack(origin)) {
                    (true, Some(unit_type)) => {
                        self.state = SelectionState::AwaitingRemote {
                            origin,
                            destination: at,
                        };
                        ClickOutcome::MoveRequested {
                            origin,
                            destination: at,
                            unit_type,
                        }
                    }
                    _ => {
                        self.state = SelectionState::Idle;
                        ClickOutcome::Cleared
                    }
                }
            }
        }
    }

    fn click_idle(&mut self, at: TileAddress, ctx: &ClickContext<'_>) -> ClickOutcome {
        if ctx.own_stack(at).is_some() {
            self.state = SelectionState::UnitSelected { origin: at };
            ClickOutcome::Selected { origin: at }
        } else {
            ClickOutcome::Ignored
        }
    }

    /// Feeds back the outcome of the in-flight move. Both success and
    /// failure return the machine to `Idle`. Returns `None` when no move was
    /// pending.
    pub fn resolve(&mut self, result: Result<(), RemoteError>) -> Option<MoveResolution> {
        let SelectionState::AwaitingRemote {
            origin,
            destination,
        } = self.state
        else {
            return None;
        };
        self.state = SelectionState::Idle;
        Some(MoveResolution {
            origin,
            destination,
            result,
        })
    }

    /// Drops a local selection. An in-flight move is left untouched.
    pub fn clear(&mut self) {
        if let SelectionState::UnitSelected { .. } = self.state {
            self.state = SelectionState::Idle;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tilewar_protocol::{MapSize, RejectReason, Snapshot, UnitStack};

    fn board() -> (AddressMap, PlayerKey) {
        let alice = PlayerKey::new("alice");
        let mut snapshot = Snapshot::blank(MapSize::Small);
        for (at, stack) in [
            (TileAddress::new(4, 4), UnitStack::new(UnitType::Infantry, 3, 1)),
            (TileAddress::new(4, 5), UnitStack::new(UnitType::Tank, 1, 3)),
        ] {
            let cell = snapshot.cell_mut(at).unwrap();
            cell.owner = Some(alice.clone());
            cell.unit_stack = stack;
        }
        let enemy = snapshot.cell_mut(TileAddress::new(3, 4)).unwrap();
        enemy.owner = Some(PlayerKey::new("bob"));
        enemy.unit_stack = UnitStack::new(UnitType::Infantry, 1, 1);
        (AddressMap::from_snapshot(&snapshot), alice)
    }

    fn ctx<'a>(map: &'a AddressMap, player: &'a PlayerKey) -> ClickContext<'a> {
        ClickContext {
            map,
            local_player: Some(player),
            interactive: true,
        }
    }

    #[test]
    fn double_click_deselects() {
        let (map, alice) = board();
        let ctx = ctx(&map, &alice);
        let mut machine = SelectionMachine::new();
        let origin = TileAddress::new(4, 4);

        assert_eq!(machine.click(origin, &ctx), ClickOutcome::Selected { origin });
        assert_eq!(machine.click(origin, &ctx), ClickOutcome::Deselected);
        assert_eq!(machine.state(), SelectionState::Idle);
    }

    #[test]
    fn reachable_click_requests_move_and_blocks_clicks() {
        let (map, alice) = board();
        let ctx = ctx(&map, &alice);
        let mut machine = SelectionMachine::new();
        let origin = TileAddress::new(4, 4);
        let enemy = TileAddress::new(3, 4);

        machine.click(origin, &ctx);
        assert_eq!(
            machine.click(enemy, &ctx),
            ClickOutcome::MoveRequested {
                origin,
                destination: enemy,
                unit_type: UnitType::Infantry
            }
        );
        assert!(machine.is_awaiting_remote());
        assert_eq!(machine.click(origin, &ctx), ClickOutcome::Ignored);
        assert_eq!(machine.click(TileAddress::new(4, 5), &ctx), ClickOutcome::Ignored);
    }

    #[test]
    fn own_stack_reselects_instead_of_moving() {
        let (map, alice) = board();
        let ctx = ctx(&map, &alice);
        let mut machine = SelectionMachine::new();

        machine.click(TileAddress::new(4, 4), &ctx);
        let tank = TileAddress::new(4, 5);
        assert_eq!(
            machine.click(tank, &ctx),
            ClickOutcome::Reselected { origin: tank }
        );
        assert_eq!(machine.reachable(&ctx).len(), 8);
    }

    #[test]
    fn unreachable_click_clears_selection() {
        let (map, alice) = board();
        let ctx = ctx(&map, &alice);
        let mut machine = SelectionMachine::new();

        machine.click(TileAddress::new(4, 4), &ctx);
        // Diagonal costs 2, the infantry has 1 stamina.
        assert_eq!(machine.click(TileAddress::new(5, 5), &ctx), ClickOutcome::Cleared);
        assert_eq!(machine.state(), SelectionState::Idle);
    }

    #[test]
    fn failure_returns_to_idle_with_reason() {
        let (map, alice) = board();
        let ctx = ctx(&map, &alice);
        let mut machine = SelectionMachine::new();

        machine.click(TileAddress::new(4, 4), &ctx);
        machine.click(TileAddress::new(5, 4), &ctx);
        let resolution = machine
            .resolve(Err(RemoteError::rejected(RejectReason::NotEnoughStamina)))
            .unwrap();
        assert_eq!(
            resolution.result,
            Err(RemoteError::rejected(RejectReason::NotEnoughStamina))
        );
        assert_eq!(machine.state(), SelectionState::Idle);
        assert!(machine.resolve(Ok(())).is_none());
    }

    #[test]
    fn enemy_and_spectator_clicks_are_ignored() {
        let (map, alice) = board();
        let mut machine = SelectionMachine::new();
        assert_eq!(
            machine.click(TileAddress::new(3, 4), &ctx(&map, &alice)),
            ClickOutcome::Ignored
        );

        let spectator = ClickContext {
            map: &map,
            local_player: None,
            interactive: true,
        };
        assert_eq!(
            machine.click(TileAddress::new(4, 4), &spectator),
            ClickOutcome::Ignored
        );
    }

    #[test]
    fn captured_origin_drops_selection() {
        let (map, alice) = board();
        let mut machine = SelectionMachine::new();
        let origin = TileAddress::new(4, 4);
        machine.click(origin, &ctx(&map, &alice));
        assert!(!machine.revalidate(&ctx(&map, &alice)));

        let mut snapshot = Snapshot::blank(MapSize::Small);
        let cell = snapshot.cell_mut(origin).unwrap();
        cell.owner = Some(PlayerKey::new("bob"));
        cell.unit_stack = UnitStack::new(UnitType::Tank, 2, 3);
        let captured = AddressMap::from_snapshot(&snapshot);
        let ctx = ctx(&captured, &alice);

        // Bob's tank must not lend its stamina to the stale selection.
        assert!(machine.reachable(&ctx).is_empty());
        assert!(machine.revalidate(&ctx));
        assert_eq!(machine.state(), SelectionState::Idle);
        assert!(machine.reachable(&ctx).is_empty());
    }

    #[test]
    fn frozen_board_ignores_clicks() {
        let (map, alice) = board();
        let frozen = ClickContext {
            map: &map,
            local_player: Some(&alice),
            interactive: false,
        };
        let mut machine = SelectionMachine::new();
        assert_eq!(
            machine.click(TileAddress::new(4, 4), &frozen),
            ClickOutcome::Ignored
        );
    }
}
