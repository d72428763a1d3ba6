use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Upper bound on forecast days any provider in this crate can serve.
pub const MAX_FORECAST_DAYS: u8 = 5;

/// What the caller wants fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForecastRequest {
    pub city: String,
    pub days: u8,
}

impl ForecastRequest {
    /// Build a request, clamping `days` into `1..=MAX_FORECAST_DAYS`.
    pub fn new(city: impl Into<String>, days: u8) -> Self {
        Self {
            city: city.into(),
            days: days.clamp(1, MAX_FORECAST_DAYS),
        }
    }
}

/// Snapshot of conditions "now". Every field is optional because providers
/// disagree on what they report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feels_like: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wind_speed: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl CurrentConditions {
    pub fn is_empty(&self) -> bool {
        self.temp.is_none()
            && self.feels_like.is_none()
            && self.humidity.is_none()
            && self.wind_speed.is_none()
            && self.description.is_none()
    }
}

impl From<&ForecastEntry> for CurrentConditions {
    fn from(entry: &ForecastEntry) -> Self {
        Self {
            temp: entry.temp,
            feels_like: None,
            humidity: entry.humidity,
            wind_speed: entry.wind_speed,
            description: entry.description.clone(),
        }
    }
}

/// One reading in a forecast, as reported by the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastEntry {
    /// Provider's own timestamp text; not parsed here.
    pub time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wind_speed: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// The single shape every provider response is normalised into.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanonicalForecast {
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub current: CurrentConditions,
    /// Provider order. Not sorted.
    #[serde(default)]
    pub forecast: Vec<ForecastEntry>,
}

impl CanonicalForecast {
    /// Explicit current block if the provider sent one, otherwise a snapshot
    /// built from the first forecast entry.
    pub fn current_or_first(&self) -> Option<CurrentConditions> {
        if !self.current.is_empty() {
            return Some(self.current.clone());
        }
        self.forecast.first().map(CurrentConditions::from)
    }

    /// Use `query` as the display name when the provider gave none.
    pub fn with_city_fallback(mut self, query: &str) -> Self {
        if self.city.trim().is_empty() {
            self.city = query.trim().to_string();
        }
        self
    }
}

/// Result of a successful normalisation.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalised {
    pub forecast: CanonicalForecast,
    /// Entries dropped because they could not be read.
    pub skipped: usize,
    /// The input document, kept only when it was already canonical.
    pub passthrough: Option<Value>,
}

impl Normalised {
    /// The canonical document. Canonical input comes back exactly as given;
    /// every other shape is serialised from [`Self::forecast`].
    pub fn to_value(&self) -> serde_json::Result<Value> {
        match &self.passthrough {
            Some(raw) => Ok(raw.clone()),
            None => serde_json::to_value(&self.forecast),
        }
    }
}

/// What a free-text question asks for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intent {
    pub location: Option<String>,
    pub days: u8,
}

impl Default for Intent {
    fn default() -> Self {
        Self {
            location: None,
            days: 1,
        }
    }
}
