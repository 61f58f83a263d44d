use std::fmt;
use std::future::Future;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::player::{Player, PlayerResult};

/// Adapter that turns a bare `Fn(CancellationToken) -> Future` into a
/// [`Player`] with no-op setup and clean.
///
/// Useful when a worker has nothing to initialize or release.
pub struct SimplePlayer<F> {
    func: F,
}

impl<F, Fut> SimplePlayer<F>
where
    F: Fn(CancellationToken) -> Fut + Send + Sync,
    Fut: Future<Output = PlayerResult> + Send + 'static,
{
    /// Wrap `func`. It is invoked once per `play` call with a clone of the
    /// play context.
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F> fmt::Debug for SimplePlayer<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimplePlayer").finish_non_exhaustive()
    }
}

#[async_trait]
impl<F, Fut> Player for SimplePlayer<F>
where
    F: Fn(CancellationToken) -> Fut + Send + Sync,
    Fut: Future<Output = PlayerResult> + Send + 'static,
{
    async fn setup(&self) -> PlayerResult {
        Ok(())
    }

    async fn play(&self, ctx: &CancellationToken) -> PlayerResult {
        (self.func)(ctx.clone()).await
    }

    async fn clean(&self) {}
}

/// Shorthand for [`SimplePlayer::new`].
pub fn player_fn<F, Fut>(func: F) -> SimplePlayer<F>
where
    F: Fn(CancellationToken) -> Fut + Send + Sync,
    Fut: Future<Output = PlayerResult> + Send + 'static,
{
    SimplePlayer::new(func)
}
