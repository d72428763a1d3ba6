//! Core library for the `weather-friend` CLI.
//!
//! This crate defines:
//! - Normalisation of provider forecast documents into one canonical shape
//! - Intent extraction from free-text chat messages and templated replies
//! - Weather providers, the chat fallback, and configuration
//!
//! It is used by `weather-friend-cli`, but can also be reused by other binaries or services.

pub mod assistant;
pub mod chat;
pub mod compose;
pub mod config;
pub mod intent;
pub mod model;
pub mod normalise;
pub mod provider;
pub mod series;

pub use assistant::Assistant;
pub use chat::{ChatBackend, ChatError, ChatMessage, ChatSession, OllamaClient, Role};
pub use compose::compose;
pub use config::{ChatConfig, Config, ProviderConfig};
pub use intent::extract;
pub use model::{
    CanonicalForecast, CurrentConditions, ForecastEntry, ForecastRequest, Intent, Normalised,
};
pub use normalise::{NormaliseError, ProviderShape, normalise};
pub use provider::{ProviderId, WeatherProvider, fetch_normalised};
pub use series::{SeriesKind, SeriesPoint, series};
