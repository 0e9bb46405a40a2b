//! Game session: the composition root of the client.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, OptionFuture};
use tokio::sync::{mpsc, watch};
use tokio::time::{self, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use tilewar_core::production::{check_build, check_recruit, ProductionError};
use tilewar_core::{
    classify, estimate_offset, resolve_outcome, AddressMap, ClickContext, ClickOutcome, Outcome,
    SelectionMachine, SelectionState, Transition, TurnClock,
};
use tilewar_protocol::{
    snapshot_hash, Action, Building, GameAddress, GameStatus, PlayerKey, RemoteError, Snapshot,
    TileAddress, UnitType,
};

use crate::clock::WallClock;
use crate::config::ClientConfig;
use crate::error::{ActionFailure, SessionError};
use crate::feedback::{Cue, FeedbackSink};
use crate::read_model::ReadModel;
use crate::refresh::{RefreshMode, RefreshStrategy};
use crate::remote::{self, ActiveSubscription, RemoteProgram};

/// UI input accepted by [`GameSession::run`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Click(TileAddress),
    Recruit {
        unit_type: UnitType,
        quantity: u32,
        at: TileAddress,
    },
    Build {
        at: TileAddress,
        building: Building,
    },
    EndTurn,
    Refresh,
    DismissError,
}

/// An action ready for the remote program.
struct Submission {
    action: Action,
    /// Played once the action is accepted.
    cue: Option<Cue>,
    /// State the end-turn diff is measured against.
    baseline: Option<Arc<Snapshot>>,
}

impl Submission {
    fn new(action: Action) -> Self {
        Self {
            action,
            cue: None,
            baseline: None,
        }
    }
}

type PendingAction = BoxFuture<'static, (Submission, Result<(), RemoteError>)>;

pub struct GameSession {
    game: GameAddress,
    local_player: Option<PlayerKey>,
    remote: Arc<dyn RemoteProgram>,
    feedback: Box<dyn FeedbackSink>,
    clock: Arc<dyn WallClock>,
    config: ClientConfig,

    snapshot: Option<Arc<Snapshot>>,
    snapshot_hash: Option<u64>,
    map: Arc<AddressMap>,
    /// Snapshot `map` was derived from.
    map_source: Option<Arc<Snapshot>>,
    selection: SelectionMachine,
    turn_clock: TurnClock,
    remaining_seconds: Option<u64>,
    outcome: Outcome,
    last_error: Option<ActionFailure>,

    refresh: RefreshStrategy,
    updates_tx: mpsc::UnboundedSender<Snapshot>,
    updates_rx: mpsc::UnboundedReceiver<Snapshot>,

    read_model: watch::Sender<ReadModel>,
    /// Set once the remote program refused an automatic join.
    join_refused: bool,
    feedback_ready: bool,
    disposed: bool,
}

impl GameSession {
    /// `local_player` is the identity of this client; `None`, or a key that
    /// is not in the game, makes the session a spectator. Until the first
    /// load the published map is the blank board of `config.map_size`.
    pub fn new(
        game: GameAddress,
        local_player: Option<PlayerKey>,
        remote: Arc<dyn RemoteProgram>,
        feedback: Box<dyn FeedbackSink>,
        clock: Arc<dyn WallClock>,
        config: ClientConfig,
    ) -> Self {
        let (updates_tx, updates_rx) = mpsc::unbounded_channel();
        let map = Arc::new(AddressMap::from_shape(config.map_size.row_widths()));
        let (read_model, _) = watch::channel(ReadModel {
            map: Arc::clone(&map),
            ..ReadModel::default()
        });
        let turn_clock = TurnClock::new(config.clock.max_turn_duration_secs);

        Self {
            game,
            local_player,
            remote,
            feedback,
            clock,
            config,
            snapshot: None,
            snapshot_hash: None,
            map,
            map_source: None,
            selection: SelectionMachine::new(),
            turn_clock,
            remaining_seconds: None,
            outcome: Outcome::InProgress,
            last_error: None,
            refresh: RefreshStrategy::Idle,
            updates_tx,
            updates_rx,
            read_model,
            join_refused: false,
            feedback_ready: false,
            disposed: false,
        }
    }

    pub fn game(&self) -> &GameAddress {
        &self.game
    }

    pub fn snapshot(&self) -> Option<&Arc<Snapshot>> {
        self.snapshot.as_ref()
    }

    pub fn selection(&self) -> SelectionState {
        self.selection.state()
    }

    pub fn refresh_mode(&self) -> RefreshMode {
        self.refresh.mode()
    }

    pub fn read_model(&self) -> ReadModel {
        self.read_model.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<ReadModel> {
        self.read_model.subscribe()
    }

    /// Initial fetch. Estimates the clock offset first so the countdown is
    /// right from the first published model.
    pub async fn load(&mut self) -> Result<(), SessionError> {
        if self.disposed {
            return Err(SessionError::Disposed);
        }
        if !self.feedback_ready {
            self.feedback.init();
            self.feedback_ready = true;
        }

        self.resample_offset().await;
        let snapshot = self
            .remote
            .fetch_snapshot(&self.game)
            .await
            .inspect_err(|err| warn!(game = %self.game, error = %err, "failed to load game"))?;

        info!(game = %self.game, round = snapshot.round, status = ?snapshot.status, "game loaded");
        self.apply_snapshot(snapshot).await;
        self.auto_join().await;
        Ok(())
    }

    pub async fn refresh(&mut self) -> Result<(), SessionError> {
        if self.disposed {
            return Err(SessionError::Disposed);
        }
        let snapshot = self.remote.fetch_snapshot(&self.game).await?;
        self.apply_snapshot(snapshot).await;
        Ok(())
    }

    /// Applies a pushed snapshot unless it is identical to the current one.
    /// Returns whether it was applied.
    pub async fn deliver(&mut self, snapshot: Snapshot) -> bool {
        let hash = snapshot_hash(&snapshot).ok();
        if hash.is_some() && hash == self.snapshot_hash {
            debug!(game = %self.game, "skipping unchanged snapshot");
            return false;
        }
        self.apply_hashed(snapshot, hash).await;
        true
    }

    /// Replaces the current snapshot and re-derives everything from it.
    pub async fn apply_snapshot(&mut self, snapshot: Snapshot) -> Transition {
        let hash = snapshot_hash(&snapshot)
            .inspect_err(|err| debug!(error = %err, "snapshot hash unavailable"))
            .ok();
        self.apply_hashed(snapshot, hash).await
    }

    async fn apply_hashed(&mut self, snapshot: Snapshot, hash: Option<u64>) -> Transition {
        // The remote program is authoritative; report and keep going.
        if let Err(err) = snapshot.check_invariants() {
            warn!(game = %self.game, error = %err, "snapshot violates board invariants");
        }

        let transition = classify(self.snapshot.as_deref(), &snapshot);
        let snapshot = Arc::new(snapshot);
        self.snapshot = Some(Arc::clone(&snapshot));
        self.snapshot_hash = hash;
        self.sync_map();

        self.turn_clock.observe(&snapshot);
        self.remaining_seconds = self.turn_clock.remaining(self.clock.now());

        let outcome = resolve_outcome(&snapshot);
        if outcome.is_over() && outcome != self.outcome {
            info!(game = %self.game, outcome = ?outcome, "game over");
        }
        self.outcome = outcome;

        if snapshot.status != GameStatus::Live {
            self.selection.clear();
        }
        let interactive = self.is_interactive();
        let ctx = ClickContext {
            map: &self.map,
            local_player: participant(self.local_player.as_ref(), Some(&*snapshot)),
            interactive,
        };
        if self.selection.revalidate(&ctx) {
            debug!(game = %self.game, "selected stack is gone, selection cleared");
        }

        debug!(
            game = %self.game,
            round = snapshot.round,
            current_player = snapshot.current_player_index,
            ownership_changed = transition.ownership_changed,
            "snapshot applied"
        );

        if !self.disposed {
            self.update_refresh(&snapshot).await;
        }
        self.publish();
        transition
    }

    /// Rebuilds the address map when the snapshot changed identity.
    fn sync_map(&mut self) {
        let Some(snapshot) = &self.snapshot else {
            return;
        };
        let stale = self
            .map_source
            .as_ref()
            .map_or(true, |source| !Arc::ptr_eq(source, snapshot));
        if stale {
            self.map = Arc::new(AddressMap::from_snapshot(snapshot));
            self.map_source = Some(Arc::clone(snapshot));
        }
    }

    async fn update_refresh(&mut self, snapshot: &Snapshot) {
        let wanted = RefreshMode::for_game(snapshot.status, snapshot.is_multiplayer);
        let current = self.refresh.mode();
        if wanted == current {
            return;
        }

        // Release the old resources before acquiring new ones.
        self.refresh = RefreshStrategy::Idle;
        self.drain_updates();

        self.refresh = match wanted {
            RefreshMode::Idle => RefreshStrategy::Idle,
            RefreshMode::Polling => RefreshStrategy::Polling,
            RefreshMode::Subscribed => {
                let sink = self.updates_tx.clone();
                match ActiveSubscription::open(Arc::clone(&self.remote), &self.game, sink).await {
                    Ok(subscription) => RefreshStrategy::Subscribed(subscription),
                    Err(err) => {
                        warn!(game = %self.game, error = %err, "subscribe failed, polling instead");
                        RefreshStrategy::Polling
                    }
                }
            }
        };
        info!(game = %self.game, from = ?current, to = ?self.refresh.mode(), "refresh strategy changed");
    }

    fn drain_updates(&mut self) {
        while self.updates_rx.try_recv().is_ok() {}
    }

    fn is_interactive(&self) -> bool {
        !self.disposed
            && self
                .snapshot
                .as_ref()
                .is_some_and(|snapshot| snapshot.status == GameStatus::Live)
    }

    /// Runs a click through the selection machine. A `MoveRequested` outcome
    /// leaves the machine waiting; the caller submits the move.
    fn press(&mut self, at: TileAddress) -> ClickOutcome {
        let ctx = ClickContext {
            map: &self.map,
            local_player: participant(self.local_player.as_ref(), self.snapshot.as_deref()),
            interactive: self.is_interactive(),
        };
        let outcome = self.selection.click(at, &ctx);

        match &outcome {
            ClickOutcome::Selected { origin } | ClickOutcome::Reselected { origin } => {
                debug!(origin = %origin, "stack selected");
                self.feedback.play(Cue::Select);
            }
            ClickOutcome::Deselected | ClickOutcome::Cleared => debug!("selection cleared"),
            ClickOutcome::MoveRequested {
                origin,
                destination,
                ..
            } => debug!(origin = %origin, destination = %destination, "move requested"),
            ClickOutcome::Ignored => {}
        }
        self.publish();
        outcome
    }

    /// Handles a tile click. A click that requests a move submits it and
    /// waits for the result before returning.
    pub async fn click(&mut self, at: TileAddress) -> ClickOutcome {
        let outcome = self.press(at);
        if let ClickOutcome::MoveRequested {
            origin,
            destination,
            unit_type,
        } = outcome
        {
            // Failures land in the read model.
            let _ = self
                .perform(move_submission(origin, destination, unit_type))
                .await;
        }
        outcome
    }

    pub async fn recruit(
        &mut self,
        unit_type: UnitType,
        quantity: u32,
        at: TileAddress,
    ) -> Result<(), SessionError> {
        let submission = self.prepare_recruit(unit_type, quantity, at)?;
        self.perform(submission).await
    }

    pub async fn build(&mut self, at: TileAddress, building: Building) -> Result<(), SessionError> {
        let submission = self.prepare_build(at, building)?;
        self.perform(submission).await
    }

    /// Takes a seat in a game that has not started. Joining a game the local
    /// player is already in does nothing.
    pub async fn join(&mut self) -> Result<(), SessionError> {
        if self.disposed {
            return Err(SessionError::Disposed);
        }
        let snapshot = self.snapshot.as_deref().ok_or(SessionError::NotLoaded)?;
        if snapshot.status != GameStatus::NotStarted {
            return Err(SessionError::AlreadyStarted);
        }
        let Some(key) = self.local_player.as_ref() else {
            return Err(SessionError::Spectator);
        };
        if snapshot.player_index(key).is_some() {
            return Ok(());
        }
        self.perform(Submission::new(Action::Join)).await
    }

    /// True when the local player could still take a seat.
    fn wants_seat(&self) -> bool {
        match (self.snapshot.as_deref(), self.local_player.as_ref()) {
            (Some(snapshot), Some(key)) => {
                snapshot.status == GameStatus::NotStarted && snapshot.player_index(key).is_none()
            }
            _ => false,
        }
    }

    /// Joins an open lobby on the player's behalf. Transient failures are
    /// retried on the next poll; a refusal stops further attempts.
    async fn auto_join(&mut self) {
        if self.disposed || self.join_refused || !self.wants_seat() {
            return;
        }
        match self.join().await {
            Ok(()) => {}
            Err(SessionError::Remote(RemoteError::TransientIo { message })) => {
                debug!(game = %self.game, %message, "join failed, retrying on next poll");
            }
            Err(err) => {
                info!(game = %self.game, error = %err, "join refused, staying a spectator");
                self.join_refused = true;
            }
        }
    }

    /// Ends the local player's turn. Whose turn it is gets checked by the
    /// remote program.
    pub async fn end_turn(&mut self) -> Result<(), SessionError> {
        let submission = self.prepare_end_turn()?;
        self.perform(submission).await
    }

    pub fn dismiss_error(&mut self) {
        self.last_error = None;
        self.publish();
    }

    fn acting_player(&self) -> Result<(&Snapshot, &PlayerKey), SessionError> {
        if self.disposed {
            return Err(SessionError::Disposed);
        }
        let snapshot = self.snapshot.as_deref().ok_or(SessionError::NotLoaded)?;
        if snapshot.status != GameStatus::Live {
            return Err(SessionError::NotLive);
        }
        let player = participant(self.local_player.as_ref(), Some(snapshot))
            .ok_or(SessionError::Spectator)?;
        Ok((snapshot, player))
    }

    fn prepare_recruit(
        &mut self,
        unit_type: UnitType,
        quantity: u32,
        at: TileAddress,
    ) -> Result<Submission, SessionError> {
        let checked = {
            let (snapshot, player) = self.acting_player()?;
            let balance = snapshot.player(player).map_or(0, |record| record.balance);
            check_recruit(snapshot.cell(at), at, player, balance, unit_type, quantity)
        };
        if let Err(err) = checked {
            return Err(self.reject_locally("recruit", err));
        }
        Ok(Submission::new(Action::Recruit {
            unit_type,
            quantity,
            at,
        }))
    }

    fn prepare_build(
        &mut self,
        at: TileAddress,
        building: Building,
    ) -> Result<Submission, SessionError> {
        let checked = {
            let (snapshot, player) = self.acting_player()?;
            let balance = snapshot.player(player).map_or(0, |record| record.balance);
            check_build(snapshot.cell(at), at, player, balance, building)
        };
        if let Err(err) = checked {
            return Err(self.reject_locally("build", err));
        }
        Ok(Submission::new(Action::Build { at, building }))
    }

    fn prepare_end_turn(&self) -> Result<Submission, SessionError> {
        self.acting_player()?;
        Ok(Submission {
            baseline: self.snapshot.clone(),
            ..Submission::new(Action::EndTurn)
        })
    }

    fn reject_locally(&mut self, action: &'static str, err: ProductionError) -> SessionError {
        info!(action, error = %err, "action rejected before submission");
        self.last_error = Some(ActionFailure::new(
            action,
            RemoteError::rejected(err.reject_reason()),
        ));
        self.publish();
        SessionError::Production(err)
    }

    async fn perform(&mut self, submission: Submission) -> Result<(), SessionError> {
        self.begin(&submission);
        let result =
            remote::submit(self.remote.as_ref(), &self.game, &submission.action).await;
        self.complete(submission, result.clone()).await;
        result.map_err(SessionError::from)
    }

    fn begin(&mut self, submission: &Submission) {
        info!(game = %self.game, action = submission.action.name(), "submitting action");
        self.last_error = None;
        self.publish();
    }

    /// Submission as a detached future, for the event loop.
    fn dispatch(&mut self, submission: Submission) -> PendingAction {
        self.begin(&submission);
        let remote = Arc::clone(&self.remote);
        let game = self.game.clone();
        async move {
            let result = remote::submit(remote.as_ref(), &game, &submission.action).await;
            (submission, result)
        }
        .boxed()
    }

    async fn complete(&mut self, submission: Submission, result: Result<(), RemoteError>) {
        let name = submission.action.name();
        if let Action::Move { .. } = submission.action {
            self.selection.resolve(result.clone());
        }

        if let Err(err) = result {
            warn!(game = %self.game, action = name, error = %err, "action failed");
            self.last_error = Some(ActionFailure::new(name, err));
            self.publish();
            return;
        }

        info!(game = %self.game, action = name, "action accepted");
        if let Some(cue) = submission.cue {
            self.feedback.play(cue);
        }

        if let Err(err) = self.refresh().await {
            warn!(game = %self.game, action = name, error = %err, "refresh after action failed");
            self.publish();
            return;
        }

        if submission.action == Action::EndTurn {
            if let Some(current) = self.snapshot.as_deref() {
                let transition = classify(submission.baseline.as_deref(), current);
                let cue = if transition.ownership_changed {
                    Cue::Combat
                } else {
                    Cue::QuietTurn
                };
                debug!(cue = ?cue, "turn ended");
                self.feedback.play(cue);
            }
        }
    }

    /// Advances the countdown. Returns true on the tick the turn expired.
    pub fn tick_clock(&mut self) -> bool {
        let reading = self.turn_clock.tick(self.clock.now());
        self.remaining_seconds = reading.map(|reading| reading.remaining_seconds);
        let expired = reading.is_some_and(|reading| reading.expired);
        if expired {
            info!(game = %self.game, "turn clock expired");
        }
        self.publish();
        expired
    }

    /// Re-estimates the remote clock offset. Failures keep the old offset.
    pub async fn resample_offset(&mut self) {
        match self.remote.remote_clock().await {
            Ok(remote_now) => {
                let offset = estimate_offset(remote_now, self.clock.now());
                self.turn_clock.set_offset(offset);
                debug!(offset, "clock offset resampled");
            }
            Err(err) => debug!(error = %err, "clock resample failed"),
        }
    }

    async fn poll(&mut self) {
        match self.remote.fetch_snapshot(&self.game).await {
            Ok(snapshot) => {
                self.apply_snapshot(snapshot).await;
                self.auto_join().await;
            }
            Err(RemoteError::TransientIo { message }) => {
                debug!(game = %self.game, %message, "poll failed");
            }
            Err(err) => warn!(game = %self.game, error = %err, "poll failed"),
        }
    }

    /// Event loop. Loads the game if needed, then serves commands, timers,
    /// subscription deliveries and the single pending action until
    /// `shutdown` resolves or the command channel closes. The session is
    /// disposed on return.
    pub async fn run<S>(
        &mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        shutdown: S,
    ) -> Result<(), SessionError>
    where
        S: Future<Output = ()>,
    {
        if self.snapshot.is_none() {
            if let Err(err) = self.load().await {
                self.dispose();
                return Err(err);
            }
        }

        tokio::pin!(shutdown);
        let mut tick = every(self.config.clock.tick_interval());
        let mut resample = every(self.config.clock.resample_interval());
        let mut poll = every(self.config.refresh.poll_interval());
        let mut pending: Option<PendingAction> = None;

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    debug!(game = %self.game, "shutdown requested");
                    break;
                }
                command = commands.recv() => {
                    let Some(command) = command else {
                        debug!(game = %self.game, "command channel closed");
                        break;
                    };
                    if let Some(submission) = self.handle_command(command, pending.is_some()).await {
                        pending = Some(self.dispatch(submission));
                    }
                }
                Some((submission, result)) = OptionFuture::from(pending.as_mut()), if pending.is_some() => {
                    pending = None;
                    self.complete(submission, result).await;
                }
                _ = tick.tick() => {
                    if self.tick_clock() {
                        if let Err(err) = self.refresh().await {
                            warn!(game = %self.game, error = %err, "refresh after expiry failed");
                        }
                    }
                }
                _ = resample.tick() => self.resample_offset().await,
                _ = poll.tick(), if self.refresh.is_polling() => self.poll().await,
                Some(snapshot) = self.updates_rx.recv(), if self.refresh.is_subscribed() => {
                    self.deliver(snapshot).await;
                }
            }
        }

        self.dispose();
        Ok(())
    }

    async fn handle_command(&mut self, command: Command, busy: bool) -> Option<Submission> {
        let prepared = match command {
            Command::Click(_) if busy => {
                debug!("click ignored while an action is pending");
                return None;
            }
            Command::Click(at) => match self.press(at) {
                ClickOutcome::MoveRequested {
                    origin,
                    destination,
                    unit_type,
                } => Ok(move_submission(origin, destination, unit_type)),
                _ => return None,
            },
            Command::Refresh => {
                if let Err(err) = self.refresh().await {
                    warn!(game = %self.game, error = %err, "manual refresh failed");
                }
                return None;
            }
            Command::DismissError => {
                self.dismiss_error();
                return None;
            }
            _ if busy => Err(SessionError::Busy),
            Command::Recruit {
                unit_type,
                quantity,
                at,
            } => self.prepare_recruit(unit_type, quantity, at),
            Command::Build { at, building } => self.prepare_build(at, building),
            Command::EndTurn => self.prepare_end_turn(),
        };

        prepared
            .inspect_err(|err| warn!(game = %self.game, error = %err, "command rejected"))
            .ok()
    }

    /// Releases the subscription and feedback sink. Idempotent.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.refresh = RefreshStrategy::Idle;
        self.drain_updates();
        self.selection.clear();
        if self.feedback_ready {
            self.feedback.stop();
            self.feedback.dispose();
            self.feedback_ready = false;
        }
        info!(game = %self.game, "session disposed");
        self.publish();
    }

    fn publish(&self) {
        let snapshot = self.snapshot.as_deref();
        let local = participant(self.local_player.as_ref(), snapshot);
        let record = local.and_then(|key| snapshot?.player(key));
        let ctx = ClickContext {
            map: &self.map,
            local_player: local,
            interactive: self.is_interactive(),
        };

        let model = ReadModel {
            snapshot: self.snapshot.clone(),
            map: Arc::clone(&self.map),
            selection: self.selection.state(),
            selected: self.selection.origin(),
            reachable: self.selection.reachable(&ctx),
            remaining_seconds: self.remaining_seconds,
            local_player_index: local.and_then(|key| snapshot?.player_index(key)),
            balance: record.map_or(0, |record| record.balance),
            attack_points: record.map_or(0, |record| record.attack_points),
            outcome: self.outcome.clone(),
            last_error: self.last_error.clone(),
            refresh: self.refresh.mode(),
        };
        self.read_model.send_replace(model);
    }
}

impl Drop for GameSession {
    fn drop(&mut self) {
        self.dispose();
    }
}

fn move_submission(origin: TileAddress, destination: TileAddress, unit_type: UnitType) -> Submission {
    Submission {
        cue: Some(Cue::Move(unit_type)),
        ..Submission::new(Action::Move {
            origin,
            destination,
        })
    }
}

/// `key` if it belongs to a player of the game.
fn participant<'a>(key: Option<&'a PlayerKey>, snapshot: Option<&Snapshot>) -> Option<&'a PlayerKey> {
    let key = key?;
    snapshot?.player_index(key).map(|_| key)
}

fn every(period: Duration) -> Interval {
    let mut interval = time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}
