//! # Player capability
//!
//! A [`Player`] is any unit of concurrent work with a three phase lifecycle:
//!
//! ```text
//! setup -> play -> clean
//! setup -> clean            (play skipped, e.g. a sibling failed to set up)
//! ```
//!
//! `play` is only ever called after `setup` returned `Ok` on the same
//! instance. Implementors keep whatever they allocate in `setup` to
//! themselves and release it in `clean`.
pub mod simple;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

pub use simple::{player_fn, SimplePlayer};

/// Error returned by a player. Any error type can be boxed into it, so stages
/// forward child errors without interpreting them.
pub type PlayerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result of a single player lifecycle call.
pub type PlayerResult = std::result::Result<(), PlayerError>;

/// Core lifecycle trait for every unit of work run by a stage.
#[async_trait]
pub trait Player: Send + Sync {
    /// Initialize the player. `play` is not called unless this returns `Ok`.
    async fn setup(&self) -> PlayerResult;

    /// Do the work. Cancellation is cooperative: the player is expected to
    /// watch `ctx` and return promptly once it is cancelled. It is never
    /// force-stopped.
    async fn play(&self, ctx: &CancellationToken) -> PlayerResult;

    /// Release resources. Best effort; failures are not reported.
    ///
    /// Must tolerate being called when `play` never ran.
    async fn clean(&self);
}

#[async_trait]
impl<P: Player + ?Sized> Player for Box<P> {
    async fn setup(&self) -> PlayerResult {
        (**self).setup().await
    }

    async fn play(&self, ctx: &CancellationToken) -> PlayerResult {
        (**self).play(ctx).await
    }

    async fn clean(&self) {
        (**self).clean().await
    }
}
