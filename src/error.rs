//! Error types and handling for the zonewatch collector

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::models::ZoneId;

/// Main error type for the zonewatch collector
#[derive(Error, Debug)]
pub enum CollectorError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Weather API communication errors
    #[error("API error: {message}")]
    Api { message: String },

    /// The weather API answered with a payload we could not map
    #[error("Parse error: {message}")]
    Parse { message: String },

    /// Record or zone storage errors
    #[error("Storage error: {message}")]
    Storage { message: String },

    /// The active zone query itself failed
    #[error("Zone query failed: {message}")]
    ZoneQuery { message: String },

    /// No active zone is registered, so a run has nothing to do
    #[error("no active zones to collect")]
    NothingToCollect,

    /// `start` was called on a scheduler that already ran its loop
    #[error("Scheduler already started")]
    AlreadyStarted,

    /// A fetch did not finish within the configured timeout
    #[error("Request timed out after {after:?}")]
    Timeout { after: Duration },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl CollectorError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new API error
    pub fn api<S: Into<String>>(message: S) -> Self {
        Self::Api {
            message: message.into(),
        }
    }

    /// Create a new parse error
    pub fn parse<S: Into<String>>(message: S) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    /// Create a new storage error
    pub fn storage<S: Into<String>>(message: S) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Create a new zone query error
    pub fn zone_query<S: Into<String>>(message: S) -> Self {
        Self::ZoneQuery {
            message: message.into(),
        }
    }

    /// Whether this error only means there was nothing to do this run
    #[must_use]
    pub fn is_nothing_to_collect(&self) -> bool {
        matches!(self, Self::NothingToCollect)
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            CollectorError::Config { message } => {
                format!("Configuration error: {message}. Please check your config file.")
            }
            CollectorError::Api { .. } | CollectorError::Timeout { .. } => {
                "Unable to reach the weather API. Please check your internet connection."
                    .to_string()
            }
            CollectorError::Parse { .. } => {
                "The weather API returned data in an unexpected format.".to_string()
            }
            CollectorError::Storage { .. } => "Failed to store weather data.".to_string(),
            CollectorError::ZoneQuery { .. } => "Failed to load the registered zones.".to_string(),
            CollectorError::NothingToCollect => {
                "No active zones are registered. Nothing to collect.".to_string()
            }
            CollectorError::AlreadyStarted => "The collector is already running.".to_string(),
            CollectorError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
        }
    }
}

/// Pipeline stage at which a single zone's collection failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Fetch,
    Parse,
    Persist,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Fetch => "fetch",
            Stage::Parse => "parse",
            Stage::Persist => "persist",
        };
        f.write_str(name)
    }
}

/// Failure of one zone within one run. Never escapes the run that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectionError {
    pub zone_id: ZoneId,
    pub stage: Stage,
    pub reason: String,
}

impl CollectionError {
    #[must_use]
    pub fn new(zone_id: ZoneId, stage: Stage, reason: impl fmt::Display) -> Self {
        Self {
            zone_id,
            stage,
            reason: reason.to_string(),
        }
    }
}

impl fmt::Display for CollectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "zone {} failed at {} stage: {}",
            self.zone_id, self.stage, self.reason
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let config_err = CollectorError::config("worker_count must be at least 1");
        assert!(matches!(config_err, CollectorError::Config { .. }));

        let api_err = CollectorError::api("connection failed");
        assert!(matches!(api_err, CollectorError::Api { .. }));

        let storage_err = CollectorError::storage("disk full");
        assert!(matches!(storage_err, CollectorError::Storage { .. }));
    }

    #[test]
    fn test_user_messages() {
        let config_err = CollectorError::config("bad interval");
        assert!(config_err.user_message().contains("bad interval"));

        let timeout = CollectorError::Timeout {
            after: Duration::from_secs(30),
        };
        assert!(timeout.user_message().contains("Unable to reach"));

        assert!(
            CollectorError::NothingToCollect
                .user_message()
                .contains("No active zones")
        );
    }

    #[test]
    fn test_nothing_to_collect_is_distinguishable() {
        assert!(CollectorError::NothingToCollect.is_nothing_to_collect());
        assert!(!CollectorError::zone_query("db down").is_nothing_to_collect());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: CollectorError = io_err.into();
        assert!(matches!(err, CollectorError::Io { .. }));
    }

    #[test]
    fn test_collection_error_display() {
        let failure = CollectionError::new(7, Stage::Parse, "missing `current` section");
        assert_eq!(
            failure.to_string(),
            "zone 7 failed at parse stage: missing `current` section"
        );
    }
}
