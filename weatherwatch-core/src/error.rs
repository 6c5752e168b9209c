use std::fmt;

use thiserror::Error;

/// Failures of a single poll. Neither variant stops the poller.
#[derive(Debug, Error)]
pub enum WeatherError {
    /// The body was not JSON, or lacked `coord`, `weather[0]` or `main`.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Connection error, timeout or non-2xx status.
    #[error("Transport failure: {0}")]
    TransportFailure(String),
}

impl WeatherError {
    pub fn is_malformed(&self) -> bool {
        matches!(self, WeatherError::MalformedResponse(_))
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, WeatherError::TransportFailure(_))
    }
}

/// A non-fatal correction applied to a [`crate::PollerConfig`] at start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigWarning {
    /// No API key was configured; the built-in development key is used instead.
    EmptyApiKey,
    /// The refresh interval was below the minimum and got clamped.
    RefreshTooLow { requested: u32 },
    /// A zero fetch timeout would fail every fetch; the default is used instead.
    TimeoutTooLow,
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigWarning::EmptyApiKey => {
                f.write_str("No API key configured, falling back to the built-in default key")
            }
            ConfigWarning::RefreshTooLow { requested } => write!(
                f,
                "Refresh interval of {requested} minute(s) is too low, using {} minutes",
                crate::config::MIN_REFRESH_MINUTES
            ),
            ConfigWarning::TimeoutTooLow => {
                f.write_str("Fetch timeout of 0 seconds is not usable, using the default")
            }
        }
    }
}
