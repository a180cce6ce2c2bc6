//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use poker_dealer::{MAX_PLAYERS, TournamentSettings, entities::Chips};
use std::{net::SocketAddr, str::FromStr, time::Duration};

const DEFAULT_BIND: &str = "127.0.0.1:6969";

/// Complete server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    /// Tournament rules
    pub tournament: TournamentSettings,
}

/// Values given on the command line. Each one wins over its environment
/// variable.
#[derive(Debug, Default)]
pub struct Overrides {
    pub bind: Option<SocketAddr>,
    pub num_players: Option<usize>,
    pub starting_chips: Option<Chips>,
    pub min_raise: Option<Chips>,
    pub move_timeout_secs: Option<u64>,
    pub hand_limit: Option<u32>,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns error if a variable is set but can't be parsed
    pub fn from_env(overrides: Overrides) -> Result<Self, ConfigError> {
        Self::from_vars(overrides, |key| std::env::var(key).ok())
    }

    /// Load configuration from any variable source.
    ///
    /// `MOVE_TIMEOUT_SECS` and `HAND_LIMIT` of 0 mean no timeout and no
    /// limit.
    ///
    /// # Errors
    ///
    /// Returns error if a variable is set but can't be parsed
    pub fn from_vars<F>(overrides: Overrides, var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = TournamentSettings::default();
        let bind = match overrides.bind {
            Some(bind) => bind,
            None => parse_var(&var, "SERVER_BIND")?.unwrap_or(parse_default(DEFAULT_BIND)?),
        };
        let num_players = or_var(overrides.num_players, &var, "NUM_PLAYERS", defaults.num_players)?;
        let starting_chips = or_var(
            overrides.starting_chips,
            &var,
            "STARTING_CHIPS",
            defaults.starting_chips,
        )?;
        let min_raise = or_var(overrides.min_raise, &var, "MIN_RAISE", defaults.min_raise)?;
        let move_timeout_secs = or_var(overrides.move_timeout_secs, &var, "MOVE_TIMEOUT_SECS", 0)?;
        let hand_limit = or_var(overrides.hand_limit, &var, "HAND_LIMIT", 0)?;

        let mut tournament = TournamentSettings::new(num_players, starting_chips, min_raise);
        if move_timeout_secs > 0 {
            tournament = tournament.with_move_timeout(Duration::from_secs(move_timeout_secs));
        }
        if hand_limit > 0 {
            tournament = tournament.with_hand_limit(hand_limit);
        }

        Ok(ServerConfig { bind, tournament })
    }

    /// Validate configuration after loading
    ///
    /// # Errors
    ///
    /// Returns the first setting that can't produce a playable tournament
    pub fn validate(&self) -> Result<(), ConfigError> {
        let settings = &self.tournament;
        if settings.num_players < 2 {
            return Err(ConfigError::Invalid {
                var: "NUM_PLAYERS".to_string(),
                reason: "Must be at least 2".to_string(),
            });
        }

        if settings.num_players > MAX_PLAYERS {
            return Err(ConfigError::Invalid {
                var: "NUM_PLAYERS".to_string(),
                reason: format!("Must be at most {MAX_PLAYERS} (max players with 52-card deck)"),
            });
        }

        if settings.starting_chips == 0 {
            return Err(ConfigError::Invalid {
                var: "STARTING_CHIPS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if settings.min_raise == 0 {
            return Err(ConfigError::Invalid {
                var: "MIN_RAISE".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if settings.total_chips().is_none() {
            return Err(ConfigError::Invalid {
                var: "STARTING_CHIPS".to_string(),
                reason: format!(
                    "{} players with this many chips exceed {} chips in play",
                    settings.num_players,
                    Chips::MAX
                ),
            });
        }

        if settings.min_raise > settings.starting_chips {
            return Err(ConfigError::Invalid {
                var: "MIN_RAISE".to_string(),
                reason: format!(
                    "Cannot exceed starting chips ({})",
                    settings.starting_chips
                ),
            });
        }

        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

fn parse_default<T: FromStr>(value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::Invalid {
        var: "default".to_string(),
        reason: format!("can't parse {value:?}"),
    })
}

/// Parse a variable if it's set. A set but unparsable value is an error
/// rather than a silent fallback.
fn parse_var<T, F>(var: &F, key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = var(key) else {
        return Ok(None);
    };
    raw.trim()
        .parse()
        .map(Some)
        .map_err(|_| ConfigError::Invalid {
            var: key.to_string(),
            reason: format!("can't parse {raw:?}"),
        })
}

fn or_var<T, F>(flag: Option<T>, var: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match flag {
        Some(value) => Ok(value),
        None => Ok(parse_var(var, key)?.unwrap_or(default)),
    }
}
