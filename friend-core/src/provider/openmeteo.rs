use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::debug;

use crate::{
    model::ForecastRequest,
    provider::{ProviderId, http_client, send_json},
};

use super::WeatherProvider;

const DEFAULT_GEOCODING_URL: &str = "https://geocoding-api.open-meteo.com";
const DEFAULT_FORECAST_URL: &str = "https://api.open-meteo.com";

/// Hourly rows are thinned to this step so both providers chart at the same
/// three-hour cadence.
const HOUR_STEP: usize = 3;

const VARIABLES: &str = "temperature_2m,relative_humidity_2m,wind_speed_10m,weather_code";

/// Open-Meteo: geocode the city, then fetch current + hourly columns and turn
/// them into rows. No API key.
#[derive(Debug, Clone)]
pub struct OpenMeteoProvider {
    geocoding_url: String,
    forecast_url: String,
    http: Client,
}

impl OpenMeteoProvider {
    pub fn new(timeout: Duration) -> Result<Self> {
        Ok(Self {
            geocoding_url: DEFAULT_GEOCODING_URL.to_string(),
            forecast_url: DEFAULT_FORECAST_URL.to_string(),
            http: http_client(timeout)?,
        })
    }

    pub fn with_base_urls(mut self, geocoding: impl Into<String>, forecast: impl Into<String>) -> Self {
        self.geocoding_url = geocoding.into().trim_end_matches('/').to_string();
        self.forecast_url = forecast.into().trim_end_matches('/').to_string();
        self
    }

    async fn geocode(&self, city: &str) -> Result<Place> {
        let request = self
            .http
            .get(format!("{}/v1/search", self.geocoding_url))
            .query(&[("name", city), ("count", "1"), ("language", "en"), ("format", "json")]);

        let body = send_json(request, "Open-Meteo geocoding").await?;
        let parsed: GeoResponse =
            serde_json::from_value(body).context("Failed to parse Open-Meteo geocoding JSON")?;

        let place = parsed
            .results
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("City '{city}' not found"))?;

        debug!(name = %place.name, lat = place.latitude, lon = place.longitude, "geocoded");
        Ok(place)
    }
}

#[derive(Debug, Deserialize)]
struct GeoResponse {
    #[serde(default)]
    results: Vec<Place>,
}

#[derive(Debug, Deserialize)]
struct Place {
    name: String,
    country: Option<String>,
    latitude: f64,
    longitude: f64,
}

impl Place {
    fn display_name(&self) -> String {
        match &self.country {
            Some(country) => format!("{}, {country}", self.name),
            None => self.name.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct OmCurrent {
    temperature_2m: Option<f64>,
    apparent_temperature: Option<f64>,
    relative_humidity_2m: Option<f64>,
    wind_speed_10m: Option<f64>,
    weather_code: Option<u16>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OmHourly {
    time: Vec<String>,
    temperature_2m: Vec<Option<f64>>,
    relative_humidity_2m: Vec<Option<f64>>,
    wind_speed_10m: Vec<Option<f64>>,
    weather_code: Vec<Option<u16>>,
}

#[derive(Debug, Deserialize)]
struct OmForecastResponse {
    current: Option<OmCurrent>,
    #[serde(default)]
    hourly: OmHourly,
}

fn column<T: Copy>(values: &[Option<T>], i: usize) -> Option<T> {
    values.get(i).copied().flatten()
}

/// Columns in, rows out, keeping every `HOUR_STEP`-th hour.
fn hourly_rows(hourly: &OmHourly) -> Vec<Value> {
    hourly
        .time
        .iter()
        .enumerate()
        .step_by(HOUR_STEP)
        .map(|(i, time)| {
            json!({
                "time": time,
                "temp": column(&hourly.temperature_2m, i),
                "humidity": column(&hourly.relative_humidity_2m, i),
                "wind_speed": column(&hourly.wind_speed_10m, i),
                "description": column(&hourly.weather_code, i).map(describe_code),
            })
        })
        .collect()
}

fn current_block(current: Option<&OmCurrent>) -> Value {
    let Some(c) = current else {
        return json!({});
    };

    json!({
        "temp": c.temperature_2m,
        "feels_like": c.apparent_temperature,
        "humidity": c.relative_humidity_2m,
        "wind_speed": c.wind_speed_10m,
        "description": c.weather_code.map(describe_code),
    })
}

/// WMO weather interpretation codes.
pub fn describe_code(code: u16) -> String {
    let text = match code {
        0 => "Clear sky",
        1 => "Mainly clear",
        2 => "Partly cloudy",
        3 => "Overcast",
        45 => "Fog",
        48 => "Depositing rime fog",
        51 => "Light drizzle",
        53 => "Moderate drizzle",
        55 => "Dense intensity drizzle",
        56 => "Light freezing drizzle",
        57 => "Dense intensity freezing drizzle",
        61 => "Slight rain",
        63 => "Moderate rain",
        65 => "Heavy intensity rain",
        66 => "Light freezing rain",
        67 => "Heavy intensity freezing rain",
        71 => "Slight snow fall",
        73 => "Moderate snow fall",
        75 => "Heavy intensity snow fall",
        77 => "Snow grains",
        80 => "Slight rain showers",
        81 => "Moderate rain showers",
        82 => "Violent rain showers",
        85 => "Slight snow showers",
        86 => "Heavy snow showers",
        95 => "Thunderstorm",
        96 => "Thunderstorm with slight hail",
        99 => "Thunderstorm with heavy hail",
        other => return format!("Code {other}"),
    };
    text.to_string()
}

#[async_trait]
impl WeatherProvider for OpenMeteoProvider {
    fn id(&self) -> ProviderId {
        ProviderId::OpenMeteo
    }

    async fn fetch_forecast(&self, request: &ForecastRequest) -> Result<Value> {
        let place = self.geocode(&request.city).await?;

        let latitude = place.latitude.to_string();
        let longitude = place.longitude.to_string();
        let days = request.days.to_string();

        let req = self
            .http
            .get(format!("{}/v1/forecast", self.forecast_url))
            .query(&[
                ("latitude", latitude.as_str()),
                ("longitude", longitude.as_str()),
                ("current", "temperature_2m,apparent_temperature,relative_humidity_2m,wind_speed_10m,weather_code"),
                ("hourly", VARIABLES),
                ("forecast_days", days.as_str()),
                ("wind_speed_unit", "ms"),
                ("timezone", "auto"),
            ]);

        let body = send_json(req, "Open-Meteo forecast").await?;
        let parsed: OmForecastResponse =
            serde_json::from_value(body).context("Failed to parse Open-Meteo forecast JSON")?;

        Ok(json!({
            "city": place.display_name(),
            "current": current_block(parsed.current.as_ref()),
            "hourly": hourly_rows(&parsed.hourly),
        }))
    }
}
