//! # Orchestra Stage Errors
//!
//! Defines the two error kinds a [`Stage`](crate::Stage) can return.
//!
//! - [`SetupError`] names the first player that failed to set up. By the time
//!   it is returned, every player that had already been set up has been
//!   cleaned.
//! - [`PlayError`] maps every player that failed during play to its error.
//!   It is only returned after all players have finished.
//!
//! Errors from `clean` are never surfaced. `Player::clean` returns nothing, so
//! there is nothing to aggregate.
use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

use crate::player::PlayerError;

/// Returned by [`Stage::setup`](crate::Stage::setup).
#[derive(Debug, Error)]
#[error("Player '{player}' failed to set up: {source}")]
pub struct SetupError {
    /// Name the failing player was registered under.
    pub player: String,
    /// Error returned by the player's `setup`.
    #[source]
    pub source: PlayerError,
}

impl SetupError {
    pub fn new(player: impl Into<String>, source: PlayerError) -> Self {
        Self {
            player: player.into(),
            source,
        }
    }

    /// Name of the player whose setup failed.
    pub fn player(&self) -> &str {
        &self.player
    }
}

/// Returned by [`Stage::play`](crate::Stage::play) when at least one player
/// failed. Players absent from the map succeeded.
#[derive(Debug, Default)]
pub struct PlayError {
    players: HashMap<String, PlayerError>,
}

impl PlayError {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, player: impl Into<String>, err: PlayerError) {
        self.players.insert(player.into(), err);
    }

    /// Failing players keyed by registered name.
    pub fn players(&self) -> &HashMap<String, PlayerError> {
        &self.players
    }

    /// Error returned by `player`, if it failed.
    pub fn get(&self, player: &str) -> Option<&PlayerError> {
        self.players.get(player)
    }

    /// Number of failing players.
    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Names of the failing players, sorted.
    pub fn failed_players(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.players.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn into_players(self) -> HashMap<String, PlayerError> {
        self.players
    }
}

impl fmt::Display for PlayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} player(s) failed to play:", self.players.len())?;
        for name in self.failed_players() {
            write!(f, " |{}: {}|", name, self.players[name])?;
        }
        Ok(())
    }
}

impl std::error::Error for PlayError {}

/// Lifecycle phase a player was in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LifecyclePhase {
    #[error("setup")]
    Setup,
    #[error("play")]
    Play,
    #[error("clean")]
    Clean,
}

/// Recorded in place of a player's error when its task panicked instead of
/// returning: as the source of a [`SetupError`] or as an entry of a
/// [`PlayError`].
#[derive(Debug, Error)]
#[error("Player '{player}' panicked during {phase}")]
pub struct PlayerPanicked {
    pub player: String,
    pub phase: LifecyclePhase,
}
