//! Environment-backed runtime configuration for `partyline-smoke`.

use std::{env, error::Error, fmt, time::Duration};

use chat_runtime::RuntimeConfig;

const DEFAULT_TYPING_WINDOW_MS: u64 = 3_000;
const DEFAULT_HISTORY_MAX_ITEMS: usize = 1_200;
const DEFAULT_HOST_NICKNAME: &str = "Alice";
const DEFAULT_GUEST_NICKNAME: &str = "Bob";

/// Runtime configuration used by the smoke binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmokeConfig {
    /// Typing inactivity window in milliseconds.
    pub typing_window_ms: u64,
    /// Cap on retained room messages.
    pub history_max_items: usize,
    /// Nickname used by the room-creating participant.
    pub host_nickname: String,
    /// Nickname used by the joining participant.
    pub guest_nickname: String,
}

impl SmokeConfig {
    /// Parse configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(mut lookup: F) -> Result<Self, ConfigError>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let typing_window_ms = parse_optional_u64(
            "PARTYLINE_TYPING_WINDOW_MS",
            DEFAULT_TYPING_WINDOW_MS,
            &mut lookup,
        )?;
        let history_max_items = parse_optional_usize(
            "PARTYLINE_HISTORY_MAX_ITEMS",
            DEFAULT_HISTORY_MAX_ITEMS,
            &mut lookup,
        )?;

        if typing_window_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "PARTYLINE_TYPING_WINDOW_MS",
                value: "0".to_owned(),
                reason: "must be at least 1".to_owned(),
            });
        }
        if history_max_items == 0 {
            return Err(ConfigError::InvalidValue {
                key: "PARTYLINE_HISTORY_MAX_ITEMS",
                value: "0".to_owned(),
                reason: "must be at least 1".to_owned(),
            });
        }

        let host_nickname = optional_trimmed_env("PARTYLINE_HOST_NICKNAME", &mut lookup)
            .unwrap_or_else(|| DEFAULT_HOST_NICKNAME.to_owned());
        let guest_nickname = optional_trimmed_env("PARTYLINE_GUEST_NICKNAME", &mut lookup)
            .unwrap_or_else(|| DEFAULT_GUEST_NICKNAME.to_owned());

        Ok(Self {
            typing_window_ms,
            history_max_items,
            host_nickname,
            guest_nickname,
        })
    }

    /// Tuning values forwarded to `spawn_runtime`.
    pub fn runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig {
            typing_window: Duration::from_millis(self.typing_window_ms),
            history_max_items: self.history_max_items,
        }
    }
}

/// Errors produced while parsing runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable could not be parsed.
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidValue { key, value, reason } => {
                write!(f, "invalid {key}='{value}': {reason}")
            }
        }
    }
}

impl Error for ConfigError {}

fn optional_trimmed_env<F>(key: &'static str, lookup: &mut F) -> Option<String>
where
    F: FnMut(&str) -> Option<String>,
{
    lookup(key)
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

fn parse_optional_u64<F>(key: &'static str, default: u64, lookup: &mut F) -> Result<u64, ConfigError>
where
    F: FnMut(&str) -> Option<String>,
{
    let Some(value) = lookup(key) else {
        return Ok(default);
    };
    value
        .parse::<u64>()
        .map_err(|err| ConfigError::InvalidValue {
            key,
            value,
            reason: err.to_string(),
        })
}

fn parse_optional_usize<F>(
    key: &'static str,
    default: usize,
    lookup: &mut F,
) -> Result<usize, ConfigError>
where
    F: FnMut(&str) -> Option<String>,
{
    let Some(value) = lookup(key) else {
        return Ok(default);
    };
    value
        .parse::<usize>()
        .map_err(|err| ConfigError::InvalidValue {
            key,
            value,
            reason: err.to_string(),
        })
}
