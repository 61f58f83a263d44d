//! # Orchestra Core
//!
//! A small lifecycle engine for groups of concurrent workers.
//!
//! Every unit of work is a [`Player`] with three phases:
//! `setup -> play -> clean` (or `setup -> clean` when a sibling fails to set
//! up). A [`Stage`] owns a named set of players, sets them up in order, plays
//! them concurrently with a shared [`CancellationToken`], and cleans them all
//! up again. A `Stage` is itself a `Player`, so stages nest.
//!
//! ```no_run
//! use orchestra_core::{player_fn, Stage};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn demo() -> orchestra_core::Result<()> {
//! let mut stage = Stage::named("workers");
//! stage.add("heartbeat", player_fn(|ctx: CancellationToken| async move {
//!     ctx.cancelled().await;
//!     Ok(())
//! }));
//!
//! stage.setup().await?;
//! let ctx = CancellationToken::new();
//! ctx.cancel();
//! let outcome = stage.play(&ctx).await;
//! stage.clean().await;
//! outcome?;
//! # Ok(())
//! # }
//! ```
pub mod error;
pub mod player;
pub mod stage;

pub use error::{Error, Result};
pub use player::{player_fn, Player, PlayerError, PlayerResult, SimplePlayer};
pub use stage::{LifecyclePhase, PlayError, PlayerPanicked, SetupError, Stage};

// Re-exported so embedders don't need a direct tokio-util dependency.
pub use tokio_util::sync::CancellationToken;
