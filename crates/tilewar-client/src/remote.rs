//! Seam to the remote game program.
//!
//! Implementations wrap whatever transport reaches the ledger (RPC client,
//! wallet bridge, in-memory fake). The session only sees classified
//! [`RemoteError`]s.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::debug;

use tilewar_protocol::{
    Action, Building, GameAddress, RemoteError, Snapshot, SubscriptionId, TileAddress, UnitType,
};

#[async_trait]
pub trait RemoteProgram: Send + Sync {
    /// Reads the full game state. Unknown games yield `RemoteError::NotFound`.
    async fn fetch_snapshot(&self, game: &GameAddress) -> Result<Snapshot, RemoteError>;

    /// Adds the caller to a game that has not started.
    async fn submit_join(&self, game: &GameAddress) -> Result<(), RemoteError>;

    async fn submit_move(
        &self,
        game: &GameAddress,
        origin: TileAddress,
        destination: TileAddress,
    ) -> Result<(), RemoteError>;

    async fn submit_recruit(
        &self,
        game: &GameAddress,
        unit_type: UnitType,
        quantity: u32,
        at: TileAddress,
    ) -> Result<(), RemoteError>;

    async fn submit_build(
        &self,
        game: &GameAddress,
        at: TileAddress,
        building: Building,
    ) -> Result<(), RemoteError>;

    async fn submit_end_turn(&self, game: &GameAddress) -> Result<(), RemoteError>;

    /// Starts pushing every committed state change of `game` into `sink`.
    async fn subscribe(
        &self,
        game: &GameAddress,
        sink: mpsc::UnboundedSender<Snapshot>,
    ) -> Result<SubscriptionId, RemoteError>;

    /// Stops a subscription. Synchronous so it can run from `Drop`.
    fn unsubscribe(&self, id: SubscriptionId);

    /// Current remote clock, epoch seconds.
    async fn remote_clock(&self) -> Result<i64, RemoteError>;
}

/// Dispatches `action` to the matching submit call.
pub async fn submit(
    remote: &dyn RemoteProgram,
    game: &GameAddress,
    action: &Action,
) -> Result<(), RemoteError> {
    match *action {
        Action::Join => remote.submit_join(game).await,
        Action::Move {
            origin,
            destination,
        } => remote.submit_move(game, origin, destination).await,
        Action::Recruit {
            unit_type,
            quantity,
            at,
        } => remote.submit_recruit(game, unit_type, quantity, at).await,
        Action::Build { at, building } => remote.submit_build(game, at, building).await,
        Action::EndTurn => remote.submit_end_turn(game).await,
    }
}

/// A live subscription, released when dropped.
pub struct ActiveSubscription {
    id: SubscriptionId,
    remote: Arc<dyn RemoteProgram>,
}

impl ActiveSubscription {
    pub async fn open(
        remote: Arc<dyn RemoteProgram>,
        game: &GameAddress,
        sink: mpsc::UnboundedSender<Snapshot>,
    ) -> Result<Self, RemoteError> {
        let id = remote.subscribe(game, sink).await?;
        debug!(subscription = id.0, game = %game, "subscribed to game updates");
        Ok(Self { id, remote })
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }
}

impl Drop for ActiveSubscription {
    fn drop(&mut self) {
        debug!(subscription = self.id.0, "releasing subscription");
        self.remote.unsubscribe(self.id);
    }
}

impl std::fmt::Debug for ActiveSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActiveSubscription")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}
