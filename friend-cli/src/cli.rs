use std::path::PathBuf;

use anyhow::Context;
use chrono::Local;
use clap::{Parser, Subcommand, ValueEnum};
use inquire::{Confirm, InquireError, Password, PasswordDisplayMode, Text};
use tracing::{debug, warn};
use weather_friend_core::{
    Assistant, ChatSession, Config, ForecastRequest, OllamaClient, ProviderId, SeriesKind,
    WeatherProvider, fetch_normalised,
    provider::{default_provider_from_config, provider_from_config},
    series,
};

use crate::render;

const CITY_NOT_FOUND: &str = "Couldn't find that city. Please check the spelling and try again.";
const GREETING: &str = "🌤 Hey there! Ask me about any city's weather today or in the next 5 days!";
const FAREWELL: &str = "👋 Goodbye from Weather Friend!";
const EXIT_WORDS: &[&str] = &["exit", "quit", "bye"];

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-friend", version, about = "Weather lookups, forecasts and a chatty weather sidekick")]
pub struct Cli {
    /// More log output (-v info, -vv debug, -vvv trace). RUST_LOG works too.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Provider to use instead of the configured default ("openweather" or "openmeteo").
    #[arg(long, global = true)]
    pub provider: Option<String>,

    /// Read API keys from this file instead of `.env` in the working directory.
    #[arg(long, global = true, value_name = "PATH")]
    pub env_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure a provider ("openweather", "openmeteo") or the chat model ("chat").
    Configure {
        target: String,
    },

    /// Show current conditions for a city.
    Current {
        /// City name, e.g. Perth or "new york".
        #[arg(required = true, num_args = 1..)]
        city: Vec<String>,
    },

    /// Chart a 1-5 day forecast.
    Forecast {
        #[arg(required = true, num_args = 1..)]
        city: Vec<String>,

        /// Number of days.
        #[arg(long, short, default_value_t = 5, value_parser = clap::value_parser!(u8).range(1..=5))]
        days: u8,

        /// What to chart.
        #[arg(long, short, value_enum, default_value_t = SeriesArg::Temperature)]
        series: SeriesArg,
    },

    /// Talk to Weather Friend interactively.
    Chat,

    /// Ask Weather Friend a single question.
    Ask {
        #[arg(required = true, num_args = 1..)]
        message: Vec<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SeriesArg {
    Temperature,
    Humidity,
}

impl From<SeriesArg> for SeriesKind {
    fn from(arg: SeriesArg) -> Self {
        match arg {
            SeriesArg::Temperature => SeriesKind::Temperature,
            SeriesArg::Humidity => SeriesKind::Humidity,
        }
    }
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let config = Config::load()?;

        match self.command {
            Command::Configure { target } => configure(config, &target),
            Command::Current { city } => {
                let provider = resolve_provider(self.provider.as_deref(), &config)?;
                show_current(provider.as_ref(), &city.join(" ")).await;
                Ok(())
            }
            Command::Forecast { city, days, series } => {
                let provider = resolve_provider(self.provider.as_deref(), &config)?;
                show_forecast(provider.as_ref(), &city.join(" "), days, series.into()).await;
                Ok(())
            }
            Command::Chat => {
                let provider = resolve_provider(self.provider.as_deref(), &config)?;
                chat_loop(provider.as_ref(), &config).await
            }
            Command::Ask { message } => {
                let provider = resolve_provider(self.provider.as_deref(), &config)?;
                let chat = chat_client(&config)?;
                let mut session = ChatSession::new();
                let reply = Assistant::new(provider.as_ref(), &chat)
                    .respond(&mut session, &message.join(" "))
                    .await;
                println!("{reply}");
                Ok(())
            }
        }
    }
}

fn resolve_provider(
    explicit: Option<&str>,
    config: &Config,
) -> anyhow::Result<Box<dyn WeatherProvider>> {
    match explicit {
        Some(name) => provider_from_config(ProviderId::try_from(name)?, config),
        None => default_provider_from_config(config),
    }
}

fn chat_client(config: &Config) -> anyhow::Result<OllamaClient> {
    OllamaClient::new(&config.chat, config.chat_api_key(), config.timeout())
        .context("Failed to set up the chat client")
}

fn configure(mut config: Config, target: &str) -> anyhow::Result<()> {
    if target.eq_ignore_ascii_case("chat") {
        config.chat.base_url = Text::new("Chat service URL:")
            .with_default(&config.chat.base_url)
            .prompt()?;
        config.chat.model = Text::new("Model:").with_default(&config.chat.model).prompt()?;

        let key = Password::new("API key (leave empty for none):")
            .without_confirmation()
            .with_display_mode(PasswordDisplayMode::Masked)
            .prompt()?;
        config.chat.api_key = (!key.trim().is_empty()).then(|| key.trim().to_string());
    } else {
        let id = ProviderId::try_from(target)?;

        if id.requires_api_key() {
            let key = Password::new(&format!("{id} API key:"))
                .without_confirmation()
                .with_display_mode(PasswordDisplayMode::Masked)
                .prompt()?;
            let key = key.trim();
            if key.is_empty() {
                anyhow::bail!("An API key is required for provider '{id}'.");
            }
            config.upsert_provider_api_key(id, key.to_string());
        }

        let make_default = Confirm::new(&format!("Use {id} as the default provider?"))
            .with_default(true)
            .prompt()?;
        if make_default {
            config.set_default_provider(id);
        }
    }

    let path = config.save()?;
    println!("✅ Saved configuration to {}", path.display());
    Ok(())
}

async fn show_current(provider: &dyn WeatherProvider, city: &str) {
    println!("Fetching weather for {city}…");

    let out = match fetch_normalised(provider, &ForecastRequest::new(city, 1)).await {
        Ok(out) => out,
        Err(e) => {
            warn!(error = %format!("{e:#}"), "current weather lookup failed");
            println!("❌ {CITY_NOT_FOUND}");
            return;
        }
    };

    match render::current_card(&out.forecast, Local::now()) {
        Some(card) => println!("{card}"),
        None => println!("❌ {CITY_NOT_FOUND}"),
    }
}

async fn show_forecast(provider: &dyn WeatherProvider, city: &str, days: u8, kind: SeriesKind) {
    println!("Loading {days}-day forecast for {city}…");

    let out = match fetch_normalised(provider, &ForecastRequest::new(city, days)).await {
        Ok(out) => out,
        Err(e) => {
            warn!(error = %format!("{e:#}"), "forecast lookup failed");
            println!("❌ Couldn't fetch forecast. Check spelling or try again.");
            return;
        }
    };

    let points = series(&out.forecast, kind, days);
    if points.is_empty() {
        println!("No forecast data to display. Try fetching again.");
        return;
    }

    println!("\n{}", out.forecast.city);
    print!("{}", render::chart(kind, &points));
    if out.skipped > 0 {
        println!("({} malformed entries skipped)", out.skipped);
    }
}

async fn chat_loop(provider: &dyn WeatherProvider, config: &Config) -> anyhow::Result<()> {
    let chat = chat_client(config)?;
    let assistant = Assistant::new(provider, &chat);
    let mut session = ChatSession::new();

    println!("{GREETING}");

    loop {
        let message = match Text::new("You:").prompt() {
            Ok(m) => m,
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => break,
            Err(e) => return Err(e.into()),
        };

        let message = message.trim();
        if message.is_empty() {
            continue;
        }
        if EXIT_WORDS.contains(&message.to_lowercase().as_str()) {
            break;
        }

        let reply = assistant.respond(&mut session, message).await;
        println!("Weather Friend: {reply}\n");
    }

    debug!(turns = session.transcript().len(), "chat finished");
    println!("{FAREWELL}");
    Ok(())
}
