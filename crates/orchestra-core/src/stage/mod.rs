//! # Stage
//!
//! A [`Stage`] is a named group of players that share one lifecycle:
//!
//! - **setup**: sequential, in registration order, all-or-nothing. The first
//!   failure stops the pass and cleans every player that was already set up
//!   (in reverse order) before [`SetupError`] is returned.
//! - **play**: one tokio task per player, all receiving the same
//!   [`CancellationToken`]. Waits for every task, then reports all failures
//!   at once as a [`PlayError`].
//! - **clean**: one task per player, waits for all of them. Nothing is
//!   reported.
//!
//! `Stage` implements [`Player`], so a stage can be added to another stage.
//! From the parent's point of view a nested stage is just one more player:
//! its failures are reported under the name it was registered with.
pub mod error;

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use log::{debug, error, info, warn};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::player::{Player, PlayerError, PlayerResult};

pub use error::{LifecyclePhase, PlayError, PlayerPanicked, SetupError};

const DEFAULT_STAGE_NAME: &str = "stage";

/// Composite player owning a named set of children.
///
/// Players are registered with [`add`](Stage::add) before
/// [`setup`](Stage::setup). Registration takes `&mut self`, so it can't race
/// with itself or with a running lifecycle phase.
pub struct Stage {
    name: String,
    /// Registration order. Names are unique; re-adding a name replaces the
    /// player in place.
    players: Vec<(String, Arc<dyn Player>)>,
    /// Set iff every player was set up by the last `setup` call.
    been_setup: AtomicBool,
}

impl fmt::Debug for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stage")
            .field("name", &self.name)
            .field("players", &self.names())
            .field("been_setup", &self.is_setup())
            .finish()
    }
}

impl Stage {
    /// Create a new empty stage
    pub fn new() -> Self {
        Self::named(DEFAULT_STAGE_NAME)
    }

    /// Create a new empty stage with a label used in log output.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            players: Vec::new(),
            been_setup: AtomicBool::new(false),
        }
    }

    /// Register `player` under `name`.
    ///
    /// A player already registered under the same name is replaced; no error
    /// is raised. Must be called before `setup`.
    pub fn add<P>(&mut self, name: impl Into<String>, player: P)
    where
        P: Player + 'static,
    {
        self.insert(name.into(), Arc::new(player));
    }

    /// Same as [`add`](Stage::add) for an already boxed player.
    pub fn add_boxed(&mut self, name: impl Into<String>, player: Box<dyn Player>) {
        self.insert(name.into(), Arc::from(player));
    }

    /// Builder form of [`add`](Stage::add).
    pub fn with_player<P>(mut self, name: impl Into<String>, player: P) -> Self
    where
        P: Player + 'static,
    {
        self.add(name, player);
        self
    }

    fn insert(&mut self, name: String, player: Arc<dyn Player>) {
        if self.is_setup() {
            warn!("Player '{}' added to stage '{}' after setup; it will not be set up", name, self.name);
        }
        match self.players.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => {
                debug!("Replacing player '{}' in stage '{}'", name, self.name);
                slot.1 = player;
            }
            None => self.players.push((name, player)),
        }
    }

    /// Label of this stage.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Registered player names, in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.players.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Check if a player is registered under `name`
    pub fn contains(&self, name: &str) -> bool {
        self.players.iter().any(|(existing, _)| existing == name)
    }

    /// Get the number of registered players
    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Whether the last `setup` succeeded and the stage hasn't been cleaned
    /// since.
    pub fn is_setup(&self) -> bool {
        self.been_setup.load(Ordering::Acquire)
    }

    /// Set up every player, in registration order.
    ///
    /// Stops at the first failure. Every player set up before it is cleaned,
    /// in reverse order, and the failing player is reported in the returned
    /// [`SetupError`]. The failing player itself is not cleaned, and players
    /// after it are neither set up nor cleaned.
    ///
    /// Each player is set up in its own task, one at a time, so a player that
    /// panics counts as a failure ([`PlayerPanicked`] as the source) and the
    /// players before it are still rolled back.
    ///
    /// A stage whose setup failed is already cleaned and should be discarded.
    /// Must be called from within a tokio runtime.
    pub async fn setup(&self) -> Result<(), SetupError> {
        info!("Setting up stage '{}' ({} players)", self.name, self.players.len());
        self.been_setup.store(false, Ordering::Release);

        let mut ready: Vec<&(String, Arc<dyn Player>)> = Vec::with_capacity(self.players.len());
        for entry in &self.players {
            let (name, player) = entry;
            debug!("Setting up player '{}' in stage '{}'", name, self.name);
            let player = Arc::clone(player);
            let outcome = match tokio::spawn(async move { player.setup().await }).await {
                Ok(outcome) => outcome,
                Err(join_err) => {
                    error!("Player '{}' in stage '{}' did not finish setting up: {}", name, self.name, join_err);
                    Err(Box::new(PlayerPanicked {
                        player: name.clone(),
                        phase: LifecyclePhase::Setup,
                    }) as PlayerError)
                }
            };
            if let Err(source) = outcome {
                error!("Player '{}' in stage '{}' failed to set up: {}", name, self.name, source);
                self.rollback(&ready).await;
                return Err(SetupError::new(name.clone(), source));
            }
            ready.push(entry);
        }

        self.been_setup.store(true, Ordering::Release);
        info!("Stage '{}' set up", self.name);
        Ok(())
    }

    async fn rollback(&self, ready: &[&(String, Arc<dyn Player>)]) {
        if ready.is_empty() {
            return;
        }
        warn!("Rolling back {} player(s) in stage '{}'", ready.len(), self.name);
        for (name, player) in ready.iter().rev().copied() {
            debug!("Cleaning player '{}' in stage '{}' after failed setup", name, self.name);
            player.clean().await;
        }
    }

    /// Play every player concurrently and wait for all of them.
    ///
    /// Each player runs in its own tokio task with a clone of `ctx`.
    /// Cancelling `ctx` is the only way to ask players to stop; the stage
    /// never aborts a task, so this returns only once the slowest player has
    /// returned. A player that panics is reported as [`PlayerPanicked`].
    ///
    /// # Panics
    ///
    /// If the stage hasn't been successfully set up. That is a caller bug,
    /// not a runtime condition. Must be called from within a tokio runtime.
    pub async fn play(&self, ctx: &CancellationToken) -> Result<(), PlayError> {
        if !self.is_setup() {
            panic!("Stage::play: stage '{}' hasn't been successfully set up", self.name);
        }

        info!("Playing stage '{}' ({} players)", self.name, self.players.len());
        let handles: Vec<(&str, JoinHandle<PlayerResult>)> = self
            .players
            .iter()
            .map(|(name, player)| {
                let player = Arc::clone(player);
                let ctx = ctx.clone();
                let handle = tokio::spawn(async move { player.play(&ctx).await });
                (name.as_str(), handle)
            })
            .collect();

        let mut failures = PlayError::new();
        for (name, handle) in handles {
            match handle.await {
                Ok(Ok(())) => debug!("Player '{}' in stage '{}' finished", name, self.name),
                Ok(Err(err)) => {
                    warn!("Player '{}' in stage '{}' failed: {}", name, self.name, err);
                    failures.insert(name, err);
                }
                Err(join_err) => {
                    error!("Player '{}' in stage '{}' did not finish: {}", name, self.name, join_err);
                    failures.insert(
                        name,
                        Box::new(PlayerPanicked {
                            player: name.to_string(),
                            phase: LifecyclePhase::Play,
                        }),
                    );
                }
            }
        }

        if failures.is_empty() {
            info!("Stage '{}' finished playing", self.name);
            Ok(())
        } else {
            warn!("Stage '{}' finished playing with {} failure(s)", self.name, failures.len());
            Err(failures)
        }
    }

    /// Clean every player concurrently and wait for all of them.
    ///
    /// Valid whether or not `setup` or `play` ran. Nothing is reported: a
    /// player's `clean` returns nothing, and a panicking one is only logged.
    pub async fn clean(&self) {
        info!("Cleaning stage '{}' ({} players)", self.name, self.players.len());
        self.been_setup.store(false, Ordering::Release);

        let handles: Vec<(&str, JoinHandle<()>)> = self
            .players
            .iter()
            .map(|(name, player)| {
                let player = Arc::clone(player);
                (name.as_str(), tokio::spawn(async move { player.clean().await }))
            })
            .collect();

        for (name, handle) in handles {
            if let Err(join_err) = handle.await {
                let panicked = PlayerPanicked {
                    player: name.to_string(),
                    phase: LifecyclePhase::Clean,
                };
                error!("{} in stage '{}': {}", panicked, self.name, join_err);
            }
        }
        info!("Stage '{}' cleaned", self.name);
    }
}

impl Default for Stage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Player for Stage {
    async fn setup(&self) -> PlayerResult {
        Stage::setup(self).await.map_err(Into::into)
    }

    async fn play(&self, ctx: &CancellationToken) -> PlayerResult {
        Stage::play(self, ctx).await.map_err(Into::into)
    }

    async fn clean(&self) {
        Stage::clean(self).await
    }
}

// Test module declaration
#[cfg(test)]
mod tests;
