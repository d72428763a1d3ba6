use crate::{
    Config, ForecastRequest, Normalised,
    normalise::normalise,
    provider::{openmeteo::OpenMeteoProvider, openweather::OpenWeatherProvider},
};
use anyhow::{Context, anyhow};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use std::{convert::TryFrom, fmt::Debug, time::Duration};
use tracing::{debug, warn};

pub mod openmeteo;
pub mod openweather;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    OpenWeather,
    OpenMeteo,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::OpenWeather => "openweather",
            ProviderId::OpenMeteo => "openmeteo",
        }
    }

    pub const fn all() -> &'static [ProviderId] {
        &[ProviderId::OpenWeather, ProviderId::OpenMeteo]
    }

    pub fn requires_api_key(&self) -> bool {
        self.api_key_env().is_some()
    }

    /// Environment variable that overrides the configured key.
    pub fn api_key_env(&self) -> Option<&'static str> {
        match self {
            ProviderId::OpenWeather => Some("OPENWEATHER_API_KEY"),
            ProviderId::OpenMeteo => None,
        }
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ProviderId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "openweather" => Ok(ProviderId::OpenWeather),
            "openmeteo" | "open-meteo" => Ok(ProviderId::OpenMeteo),
            _ => Err(anyhow!(
                "Unknown provider '{value}'. Supported providers: openweather, openmeteo."
            )),
        }
    }
}

/// A weather data source. Implementations return the provider's document in
/// one of the layouts [`normalise`] understands.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    fn id(&self) -> ProviderId;

    async fn fetch_forecast(&self, request: &ForecastRequest) -> anyhow::Result<Value>;
}

/// Fetch and normalise in one go. The query doubles as the display name when
/// the provider reports none.
pub async fn fetch_normalised(
    provider: &dyn WeatherProvider,
    request: &ForecastRequest,
) -> anyhow::Result<Normalised> {
    debug!(provider = %provider.id(), city = %request.city, days = request.days, "fetching forecast");

    let raw = provider.fetch_forecast(request).await?;
    let mut out = normalise(&raw)
        .with_context(|| format!("{} returned data in an unexpected shape", provider.id()))?;

    out.forecast = out.forecast.with_city_fallback(&request.city);
    Ok(out)
}

/// Construct a provider from config and explicit ProviderId.
pub fn provider_from_config(
    id: ProviderId,
    config: &Config,
) -> anyhow::Result<Box<dyn WeatherProvider>> {
    if !config.is_provider_configured(id) {
        return Err(anyhow!(
            "No API key configured for provider '{id}'.\n\
             Hint: run `weather-friend configure {id}` or set {}.",
            id.api_key_env().unwrap_or("the provider's API key variable")
        ));
    }

    let timeout = config.timeout();

    let boxed: Box<dyn WeatherProvider> = match id {
        ProviderId::OpenWeather => {
            let api_key = config.provider_api_key(id).unwrap_or_default();
            Box::new(OpenWeatherProvider::new(api_key, timeout)?)
        }
        ProviderId::OpenMeteo => Box::new(OpenMeteoProvider::new(timeout)?),
    };

    Ok(boxed)
}

/// Construct the default provider from config, using `default_provider` field.
pub fn default_provider_from_config(config: &Config) -> anyhow::Result<Box<dyn WeatherProvider>> {
    let id = config.default_provider_id()?;
    provider_from_config(id, config)
}

pub(crate) fn http_client(timeout: Duration) -> anyhow::Result<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .context("Failed to build HTTP client")
}

/// Send `request`, insist on a success status, and decode the body as JSON.
pub(crate) async fn send_json(request: RequestBuilder, what: &str) -> anyhow::Result<Value> {
    let res = request
        .send()
        .await
        .with_context(|| format!("Failed to send request to {what}"))?;

    let status = res.status();
    let body = res
        .text()
        .await
        .with_context(|| format!("Failed to read {what} response body"))?;

    if !status.is_success() {
        warn!(%status, what, "provider request failed");
        return Err(anyhow!(
            "{what} request failed with status {status}: {}",
            truncate_body(&body),
        ));
    }

    serde_json::from_str(&body).with_context(|| format!("Failed to parse {what} JSON"))
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.chars().count() > MAX {
        format!("{}...", body.chars().take(MAX).collect::<String>())
    } else {
        body.to_string()
    }
}
