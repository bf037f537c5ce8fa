use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::Level;
use tractor_core::config::{GameConfig, PLAYER_COUNT};

const DEFAULT_BATCH_SIZE: usize = 3;
const DEFAULT_ROUNDS_PER_GAME: usize = 4;
const DEFAULT_LEVEL: &str = "info";

/// A simulation run as described by its YAML file.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SimConfig {
    pub run_id: String,
    pub rounds: RoundsConfig,
    #[serde(default = "default_players")]
    pub players: Vec<String>,
    #[serde(default)]
    pub rules: GameConfig,
    pub outputs: OutputsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SimConfig {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref().to_path_buf();
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(source) => return Err(ConfigError::Read { source, path }),
        };
        let mut cfg: SimConfig = match serde_yaml::from_str(&text) {
            Ok(cfg) => cfg,
            Err(source) => return Err(ConfigError::Parse { source, path }),
        };
        match cfg.validate() {
            Ok(()) => Ok(cfg),
            Err(source) => Err(ConfigError::Invalid { source, path }),
        }
    }

    /// Checks every section and fills in the logging level when blank.
    pub fn validate(&mut self) -> Result<(), ValidationError> {
        check_run_id(&self.run_id)?;
        self.rounds.validate()?;
        self.outputs.validate()?;
        self.rules
            .validate()
            .map_err(|err| invalid("rules", err.to_string()))?;
        check_players(&self.players)?;
        self.logging.validate()
    }

    /// Output paths with `{run_id}` substituted.
    pub fn resolved_outputs(&self) -> ResolvedOutputs {
        let resolve = |template: &str| PathBuf::from(template.replace("{run_id}", &self.run_id));
        ResolvedOutputs {
            jsonl: resolve(&self.outputs.jsonl),
            summary_md: resolve(&self.outputs.summary_md),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RoundsConfig {
    pub seed: Option<u64>,
    pub count: usize,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Rounds played in one session before a fresh session is seeded.
    #[serde(default = "default_rounds_per_game")]
    pub per_game: usize,
}

impl RoundsConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        let checks = [
            ("rounds.count", self.count, "at least one round must be played"),
            ("rounds.batch_size", self.batch_size, "each batch must deal at least one card"),
            ("rounds.per_game", self.per_game, "a game needs at least one round"),
        ];
        match checks.iter().find(|(_, value, _)| *value == 0) {
            Some((field, _, message)) => Err(invalid(field, *message)),
            None => Ok(()),
        }
    }
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_rounds_per_game() -> usize {
    DEFAULT_ROUNDS_PER_GAME
}

fn default_players() -> Vec<String> {
    vec!["north".into(), "east".into(), "south".into(), "west".into()]
}

/// Output path templates; `{run_id}` is substituted on resolve.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct OutputsConfig {
    pub jsonl: String,
    pub summary_md: String,
}

impl OutputsConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.jsonl.trim().is_empty() {
            return Err(invalid("outputs.jsonl", "path must not be empty"));
        }
        if self.summary_md.trim().is_empty() {
            return Err(invalid("outputs.summary_md", "path must not be empty"));
        }
        if self.jsonl == self.summary_md {
            return Err(invalid(
                "outputs.summary_md",
                "summary and round rows cannot share a file",
            ));
        }
        Ok(())
    }
}

/// Structured telemetry is off unless asked for.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default)]
    pub enable_structured: bool,
    #[serde(default = "default_tracing_level")]
    pub tracing_level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enable_structured: false,
            tracing_level: default_tracing_level(),
        }
    }
}

impl LoggingConfig {
    /// Parsed `tracing_level`; `None` when it names no level.
    pub fn level(&self) -> Option<Level> {
        self.tracing_level.trim().parse().ok()
    }

    fn validate(&mut self) -> Result<(), ValidationError> {
        if self.tracing_level.trim().is_empty() {
            self.tracing_level = default_tracing_level();
        }
        if self.level().is_none() {
            return Err(invalid(
                "logging.tracing_level",
                format!("unknown level '{}'", self.tracing_level),
            ));
        }
        Ok(())
    }
}

fn default_tracing_level() -> String {
    DEFAULT_LEVEL.to_string()
}

fn check_run_id(run_id: &str) -> Result<(), ValidationError> {
    if run_id.is_empty() {
        return Err(invalid("run_id", "run_id must not be empty"));
    }
    let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-');
    if let Some(bad) = run_id.chars().find(|c| !allowed(*c)) {
        return Err(invalid(
            "run_id",
            format!("'{bad}' is not allowed; use letters, digits, '.', '_' or '-'"),
        ));
    }
    Ok(())
}

fn check_players(players: &[String]) -> Result<(), ValidationError> {
    if players.len() != PLAYER_COUNT {
        return Err(invalid(
            "players",
            format!("{PLAYER_COUNT} seats need names, found {}", players.len()),
        ));
    }
    let mut seen = HashSet::new();
    for name in players {
        if name.trim().is_empty() {
            return Err(invalid("players", "player names must not be blank"));
        }
        if !seen.insert(name.as_str()) {
            return Err(invalid("players", format!("'{name}' is seated twice")));
        }
    }
    Ok(())
}

fn invalid(field: &str, message: impl Into<String>) -> ValidationError {
    ValidationError::InvalidField {
        field: field.to_string(),
        message: message.into(),
    }
}

/// Output locations after template substitution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOutputs {
    pub jsonl: PathBuf,
    pub summary_md: PathBuf,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path:?}: {source}")]
    Read {
        source: std::io::Error,
        path: PathBuf,
    },
    #[error("cannot parse {path:?}: {source}")]
    Parse {
        source: serde_yaml::Error,
        path: PathBuf,
    },
    #[error("{path:?} is not a usable run: {source}")]
    Invalid {
        source: ValidationError,
        path: PathBuf,
    },
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field}: {message}")]
    InvalidField { field: String, message: String },
}
