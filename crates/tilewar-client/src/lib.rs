//! Session runtime for the Tilewar client.
//!
//! [`GameSession`] owns the current snapshot and drives everything that
//! changes it: refresh strategy, player actions through [`RemoteProgram`],
//! and the turn clock. Renderers observe it through a [`ReadModel`] watch
//! channel.

pub mod clock;
pub mod config;
mod error;
pub mod feedback;
mod read_model;
pub mod refresh;
pub mod remote;
mod session;

pub use crate::clock::{SystemClock, WallClock};
pub use crate::config::ClientConfig;
pub use crate::error::{ActionFailure, SessionError};
pub use crate::feedback::{Cue, FeedbackSink, NullFeedback};
pub use crate::read_model::ReadModel;
pub use crate::refresh::{RefreshMode, RefreshStrategy};
pub use crate::remote::{ActiveSubscription, RemoteProgram};
pub use crate::session::{Command, GameSession};
