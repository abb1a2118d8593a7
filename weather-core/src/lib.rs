//! Core library for the `weather` CLI.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - Location search: the geocoding client and the debounced search controller
//! - Weather reports from WeatherAPI.com
//! - Saved locations and the temperature unit preference, kept in a key-value store
//!
//! It is used by `weather-cli`, but can also be reused by other front ends.

pub mod config;
pub mod error;
pub mod geocode;
pub mod model;
pub mod provider;
pub mod saved;
pub mod search;
pub mod storage;
pub mod units;

pub use config::{Config, SearchConfig};
pub use error::{SearchError, SearchErrorKind};
pub use geocode::{Geocoder, validate};
pub use model::{CurrentConditions, ForecastDay, Location, Place, WeatherReport, WeatherRequest};
pub use provider::{WeatherProvider, provider_from_config, weatherapi::WeatherApiProvider};
pub use saved::SavedLocations;
pub use search::{SearchController, SearchSettings, SearchState};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use units::TemperatureUnit;
