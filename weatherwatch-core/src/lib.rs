//! Core library for the `weatherwatch` poller.
//!
//! This crate defines:
//! - The weather snapshot model and its unit conversions
//! - Parsing of OpenWeatherMap current-weather responses
//! - A periodic poller with category change notification
//! - Configuration & credentials handling
//!
//! It is used by `weatherwatch-cli`, but can be embedded in any tokio host.

pub mod config;
pub mod error;
pub mod model;
pub mod notifier;
pub mod parser;
pub mod poller;
pub mod provider;

pub use config::{DEFAULT_API_KEY, MIN_REFRESH_MINUTES, PollerConfig};
pub use error::{ConfigWarning, WeatherError};
pub use model::{SpeedUnit, TempUnit, WeatherRecord};
pub use notifier::{ChangeNotifier, LogNotifier};
pub use parser::parse;
pub use poller::{CheckOutcome, PollerHandle, PollerState, PollerStatus, WeatherPoller};
pub use provider::{OpenWeatherSource, WeatherSource};
