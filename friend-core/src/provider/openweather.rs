use anyhow::{Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::warn;

use crate::{
    model::{CurrentConditions, ForecastRequest},
    provider::{ProviderId, http_client, send_json},
    series::READINGS_PER_DAY,
};

use super::WeatherProvider;

const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";

/// OpenWeatherMap: a three-hourly `/forecast` list plus the `/weather`
/// snapshot as the current block.
#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String, timeout: Duration) -> Result<Self> {
        Ok(Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            http: http_client(timeout)?,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn fetch_current(&self, city: &str) -> Result<CurrentConditions> {
        let request = self
            .http
            .get(format!("{}/data/2.5/weather", self.base_url))
            .query(&[
                ("q", city),
                ("appid", self.api_key.as_str()),
                ("units", "metric"),
            ]);

        let body = send_json(request, "OpenWeather (current weather)").await?;
        let parsed: OwCurrentResponse = serde_json::from_value(body)
            .map_err(|e| anyhow!("Failed to parse OpenWeather current JSON: {e}"))?;

        Ok(CurrentConditions {
            temp: Some(parsed.main.temp),
            feels_like: parsed.main.feels_like,
            humidity: parsed.main.humidity,
            wind_speed: parsed.wind.and_then(|w| w.speed),
            description: parsed.weather.into_iter().next().map(|w| w.description),
        })
    }

    async fn fetch_list(&self, request: &ForecastRequest) -> Result<Value> {
        let cnt = (usize::from(request.days) * READINGS_PER_DAY).to_string();

        let req = self
            .http
            .get(format!("{}/data/2.5/forecast", self.base_url))
            .query(&[
                ("q", request.city.as_str()),
                ("appid", self.api_key.as_str()),
                ("units", "metric"),
                ("cnt", cnt.as_str()),
            ]);

        let body = send_json(req, "OpenWeather (5-day forecast)").await?;

        let has_entries = body
            .get("list")
            .and_then(Value::as_array)
            .is_some_and(|list| !list.is_empty());
        if !has_entries {
            return Err(anyhow!("No forecast data returned for city: {}", request.city));
        }

        Ok(body)
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    feels_like: Option<f64>,
    humidity: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    main: OwMain,
    #[serde(default)]
    weather: Vec<OwWeather>,
    wind: Option<OwWind>,
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    fn id(&self) -> ProviderId {
        ProviderId::OpenWeather
    }

    async fn fetch_forecast(&self, request: &ForecastRequest) -> Result<Value> {
        let (list, current) = tokio::join!(self.fetch_list(request), self.fetch_current(&request.city));
        let mut body = list?;

        // The snapshot is a nice-to-have; the first list entry stands in for it.
        let current = current.unwrap_or_else(|e| {
            warn!(error = %e, city = %request.city, "current weather unavailable");
            CurrentConditions::default()
        });

        let city = body
            .get("city")
            .cloned()
            .unwrap_or_else(|| json!({ "name": request.city }));
        let list = body
            .get_mut("list")
            .map(Value::take)
            .unwrap_or_else(|| Value::Array(Vec::new()));

        Ok(json!({
            "city": city,
            "current": serde_json::to_value(current)?,
            "list": list,
        }))
    }
}
