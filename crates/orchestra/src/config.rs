//! Stage description files.
//!
//! A description is a tree: a stage has a name, a list of built-in players
//! and a list of nested stage descriptions. The file format is picked from
//! the extension.
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use orchestra_core::Stage;

use crate::players;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error while reading '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported stage description format: {0}")]
    UnsupportedFormat(PathBuf),

    #[error("Deserialization from '{format}' failed: {source}")]
    Deserialization {
        format: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    #[error("Invalid player '{player}' in stage '{stage}': {reason}")]
    InvalidPlayer { stage: String, player: String, reason: String },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Supported description file formats
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConfigFormat {
    /// JSON format (.json)
    Json,
    /// YAML format (.yaml, .yml) - requires "yaml-config" feature
    #[cfg(feature = "yaml-config")]
    Yaml,
    /// TOML format (.toml) - requires "toml-config" feature
    #[cfg(feature = "toml-config")]
    Toml,
}

impl ConfigFormat {
    /// Name used in error messages
    pub fn name(&self) -> &'static str {
        match self {
            ConfigFormat::Json => "JSON",
            #[cfg(feature = "yaml-config")]
            ConfigFormat::Yaml => "YAML",
            #[cfg(feature = "toml-config")]
            ConfigFormat::Toml => "TOML",
        }
    }

    /// Determine format from file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| match ext.to_lowercase().as_str() {
                "json" => Some(ConfigFormat::Json),
                #[cfg(feature = "yaml-config")]
                "yaml" | "yml" => Some(ConfigFormat::Yaml),
                #[cfg(feature = "toml-config")]
                "toml" => Some(ConfigFormat::Toml),
                _ => None,
            })
    }
}

/// One stage in a description file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageConfig {
    pub name: String,
    #[serde(default)]
    pub players: Vec<PlayerConfig>,
    #[serde(default)]
    pub stages: Vec<StageConfig>,
}

/// A built-in player entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerConfig {
    pub name: String,
    #[serde(flatten)]
    pub kind: PlayerKind,
    /// When set, the player's setup fails with this message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fail_setup: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlayerKind {
    /// Logs a tick every `interval_ms` until `ticks` is reached or it is cancelled.
    Ticker {
        interval_ms: u64,
        #[serde(default)]
        ticks: Option<u64>,
    },
    /// Waits `duration_ms` or until cancelled.
    Sleeper { duration_ms: u64 },
    /// Waits `delay_ms` (cancellable) then fails with `message`.
    Failing {
        #[serde(default = "default_failure_message")]
        message: String,
        #[serde(default)]
        delay_ms: u64,
    },
}

impl PlayerKind {
    pub fn label(&self) -> &'static str {
        match self {
            PlayerKind::Ticker { .. } => "ticker",
            PlayerKind::Sleeper { .. } => "sleeper",
            PlayerKind::Failing { .. } => "failing",
        }
    }
}

fn default_failure_message() -> String {
    "player failed".to_string()
}

impl StageConfig {
    /// Read and parse a description file.
    pub fn load(path: &Path) -> Result<Self> {
        let format = ConfigFormat::from_path(path)
            .ok_or_else(|| ConfigError::UnsupportedFormat(path.to_path_buf()))?;
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::parse(&content, format)?;
        config.validate()?;
        Ok(config)
    }

    /// Deserialize from string based on format
    pub fn parse(data: &str, format: ConfigFormat) -> Result<Self> {
        let deserialization = |source: Box<dyn std::error::Error + Send + Sync>| ConfigError::Deserialization {
            format: format.name(),
            source,
        };
        match format {
            ConfigFormat::Json => serde_json::from_str(data).map_err(|e| deserialization(Box::new(e))),
            #[cfg(feature = "yaml-config")]
            ConfigFormat::Yaml => serde_yaml::from_str(data).map_err(|e| deserialization(Box::new(e))),
            #[cfg(feature = "toml-config")]
            ConfigFormat::Toml => toml::from_str(data).map_err(|e| deserialization(Box::new(e))),
        }
    }

    /// Reject values the built-in players can't run with.
    pub fn validate(&self) -> Result<()> {
        for player in &self.players {
            let reason = match player.kind {
                PlayerKind::Ticker { interval_ms: 0, .. } => "interval_ms must be greater than zero",
                PlayerKind::Ticker { ticks: Some(0), .. } => "ticks must be greater than zero",
                _ => continue,
            };
            return Err(ConfigError::InvalidPlayer {
                stage: self.name.clone(),
                player: player.name.clone(),
                reason: reason.to_string(),
            });
        }
        self.stages.iter().try_for_each(StageConfig::validate)
    }

    /// Build the stage tree. Nested stages are registered under their own
    /// name; names colliding within one stage follow `Stage::add` (last wins).
    pub fn build(&self) -> Stage {
        let mut stage = Stage::named(self.name.clone());
        for player in &self.players {
            stage.add_boxed(player.name.clone(), players::build(player));
        }
        for nested in &self.stages {
            stage.add(nested.name.clone(), nested.build());
        }
        stage
    }

    /// Indented tree of the description, one line per entry.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        self.describe(0, &mut out);
        out
    }

    fn describe(&self, depth: usize, out: &mut String) {
        let indent = "  ".repeat(depth);
        let _ = writeln!(out, "{}{} (stage)", indent, self.name);
        for player in &self.players {
            let setup_note = if player.fail_setup.is_some() { ", fails setup" } else { "" };
            let _ = writeln!(out, "{}  {} ({}{})", indent, player.name, player.kind.label(), setup_note);
        }
        for nested in &self.stages {
            nested.describe(depth + 1, out);
        }
    }
}
