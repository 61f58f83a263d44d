//! Built-in players available to stage description files.
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info};
use tokio_util::sync::CancellationToken;

use orchestra_core::{Player, PlayerResult};

use crate::config::{PlayerConfig, PlayerKind};

/// Instantiate the player described by `config`.
pub fn build(config: &PlayerConfig) -> Box<dyn Player> {
    let name = config.name.clone();
    let player: Box<dyn Player> = match &config.kind {
        PlayerKind::Ticker { interval_ms, ticks } => Box::new(TickerPlayer {
            name: name.clone(),
            interval: Duration::from_millis(*interval_ms),
            ticks: *ticks,
        }),
        PlayerKind::Sleeper { duration_ms } => Box::new(SleeperPlayer {
            name: name.clone(),
            duration: Duration::from_millis(*duration_ms),
        }),
        PlayerKind::Failing { message, delay_ms } => Box::new(FailingPlayer {
            name: name.clone(),
            message: message.clone(),
            delay: Duration::from_millis(*delay_ms),
        }),
    };

    match &config.fail_setup {
        Some(message) => Box::new(SetupFault {
            name,
            message: message.clone(),
            inner: player,
        }),
        None => player,
    }
}

/// Logs a tick every interval until it has ticked `ticks` times or the
/// context is cancelled.
#[derive(Debug)]
pub struct TickerPlayer {
    name: String,
    interval: Duration,
    ticks: Option<u64>,
}

#[async_trait]
impl Player for TickerPlayer {
    async fn setup(&self) -> PlayerResult {
        debug!("[{}] ticker ready, interval {:?}", self.name, self.interval);
        Ok(())
    }

    async fn play(&self, ctx: &CancellationToken) -> PlayerResult {
        if self.ticks == Some(0) {
            debug!("[{}] nothing to tick", self.name);
            return Ok(());
        }
        let mut interval = tokio::time::interval(self.interval);
        let mut count: u64 = 0;
        loop {
            tokio::select! {
                _ = ctx.cancelled() => {
                    info!("[{}] cancelled after {} tick(s)", self.name, count);
                    return Ok(());
                }
                _ = interval.tick() => {
                    count += 1;
                    info!("[{}] tick {}", self.name, count);
                    if self.ticks == Some(count) {
                        return Ok(());
                    }
                }
            }
        }
    }

    async fn clean(&self) {
        debug!("[{}] ticker stopped", self.name);
    }
}

/// Waits for a fixed duration, returning early when cancelled.
#[derive(Debug)]
pub struct SleeperPlayer {
    name: String,
    duration: Duration,
}

#[async_trait]
impl Player for SleeperPlayer {
    async fn setup(&self) -> PlayerResult {
        Ok(())
    }

    async fn play(&self, ctx: &CancellationToken) -> PlayerResult {
        tokio::select! {
            _ = ctx.cancelled() => info!("[{}] woken up early", self.name),
            _ = tokio::time::sleep(self.duration) => info!("[{}] slept {:?}", self.name, self.duration),
        }
        Ok(())
    }

    async fn clean(&self) {}
}

/// Fails with a fixed message after an optional delay.
#[derive(Debug)]
pub struct FailingPlayer {
    name: String,
    message: String,
    delay: Duration,
}

#[async_trait]
impl Player for FailingPlayer {
    async fn setup(&self) -> PlayerResult {
        Ok(())
    }

    async fn play(&self, ctx: &CancellationToken) -> PlayerResult {
        if !self.delay.is_zero() {
            tokio::select! {
                _ = ctx.cancelled() => {}
                _ = tokio::time::sleep(self.delay) => {}
            }
        }
        info!("[{}] failing: {}", self.name, self.message);
        Err(self.message.clone().into())
    }

    async fn clean(&self) {}
}

/// Wraps any player and makes its setup fail. Play and clean are forwarded.
pub struct SetupFault {
    name: String,
    message: String,
    inner: Box<dyn Player>,
}

#[async_trait]
impl Player for SetupFault {
    async fn setup(&self) -> PlayerResult {
        info!("[{}] refusing to set up: {}", self.name, self.message);
        Err(self.message.clone().into())
    }

    async fn play(&self, ctx: &CancellationToken) -> PlayerResult {
        self.inner.play(ctx).await
    }

    async fn clean(&self) {
        self.inner.clean().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(kind: PlayerKind, fail_setup: Option<&str>) -> Box<dyn Player> {
        build(&PlayerConfig {
            name: "p".to_string(),
            kind,
            fail_setup: fail_setup.map(str::to_string),
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticker_stops_after_ticks() {
        let ticker = player(PlayerKind::Ticker { interval_ms: 100, ticks: Some(3) }, None);
        assert!(ticker.setup().await.is_ok());
        assert!(ticker.play(&CancellationToken::new()).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticker_with_zero_ticks_returns_immediately() {
        let ticker = player(PlayerKind::Ticker { interval_ms: 100, ticks: Some(0) }, None);
        let played = tokio::time::timeout(Duration::from_secs(1), ticker.play(&CancellationToken::new())).await;
        assert!(matches!(played, Ok(Ok(()))), "A zero tick limit must not run forever");
    }

    #[tokio::test]
    async fn test_ticker_without_limit_stops_on_cancel() {
        let ticker = player(PlayerKind::Ticker { interval_ms: 5, ticks: None }, None);
        let ctx = CancellationToken::new();
        ctx.cancel();
        assert!(ticker.play(&ctx).await.is_ok());
    }

    #[tokio::test]
    async fn test_sleeper_wakes_on_cancel() {
        let sleeper = player(PlayerKind::Sleeper { duration_ms: 60_000 }, None);
        let ctx = CancellationToken::new();
        ctx.cancel();
        assert!(sleeper.play(&ctx).await.is_ok());
    }

    #[tokio::test]
    async fn test_failing_player_returns_message() {
        let failing = player(PlayerKind::Failing { message: "X".to_string(), delay_ms: 0 }, None);
        let err = failing.play(&CancellationToken::new()).await.unwrap_err();
        assert_eq!(err.to_string(), "X");
    }

    #[tokio::test]
    async fn test_fail_setup_wraps_any_kind() {
        let faulty = player(PlayerKind::Sleeper { duration_ms: 1 }, Some("no bed"));
        let err = faulty.setup().await.unwrap_err();
        assert_eq!(err.to_string(), "no bed");
        faulty.clean().await;
    }
}
