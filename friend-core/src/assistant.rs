use tracing::{debug, info, warn};

use crate::{
    chat::{ChatBackend, ChatSession},
    compose::compose,
    intent::extract,
    model::ForecastRequest,
    provider::{WeatherProvider, fetch_normalised},
};

pub const LOCATION_NOT_FOUND: &str = "Couldn't find that location—check spelling and try again.";

/// Answers chat messages: weather questions go to the provider, everything
/// else to the chat model.
#[derive(Debug, Clone, Copy)]
pub struct Assistant<'a> {
    provider: &'a dyn WeatherProvider,
    chat: &'a dyn ChatBackend,
}

impl<'a> Assistant<'a> {
    pub fn new(provider: &'a dyn WeatherProvider, chat: &'a dyn ChatBackend) -> Self {
        Self { provider, chat }
    }

    pub async fn respond(&self, session: &mut ChatSession, message: &str) -> String {
        let intent = extract(message);
        debug!(?intent, "extracted intent");

        let Some(location) = intent.location.as_deref() else {
            return session.talk(self.chat, message).await;
        };

        let request = ForecastRequest::new(location, intent.days);
        match fetch_normalised(self.provider, &request).await {
            Ok(out) => {
                info!(city = %out.forecast.city, skipped = out.skipped, "answering from forecast");
                compose(&intent, &out.forecast)
            }
            Err(e) => {
                warn!(error = %e, location, "weather lookup failed");
                LOCATION_NOT_FOUND.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{chat::tests::ScriptedBackend, provider::ProviderId};
    use anyhow::anyhow;
    use async_trait::async_trait;
    use serde_json::{Value, json};
    use std::sync::Mutex;

    #[derive(Debug)]
    struct CannedProvider {
        body: Option<Value>,
        requests: Mutex<Vec<ForecastRequest>>,
    }

    impl CannedProvider {
        fn new(body: Option<Value>) -> Self {
            Self {
                body,
                requests: Mutex::default(),
            }
        }
    }

    #[async_trait]
    impl WeatherProvider for CannedProvider {
        fn id(&self) -> ProviderId {
            ProviderId::OpenWeather
        }

        async fn fetch_forecast(&self, request: &ForecastRequest) -> anyhow::Result<Value> {
            self.requests.lock().unwrap().push(request.clone());
            self.body.clone().ok_or_else(|| anyhow!("404 city not found"))
        }
    }

    fn sunny() -> Value {
        json!({
            "city": { "name": "Tokyo" },
            "current": { "temp": 24.0, "humidity": 60, "wind_speed": 2.0, "description": "clear sky" },
            "list": [{ "dt_txt": "2025-05-01 00:00:00", "main": { "temp": 24.0, "humidity": 60 } }]
        })
    }

    #[tokio::test]
    async fn weather_question_is_answered_from_provider() {
        let provider = CannedProvider::new(Some(sunny()));
        let chat = ScriptedBackend::default();
        let mut session = ChatSession::new();

        let reply = Assistant::new(&provider, &chat)
            .respond(&mut session, "what's the weather in Tokyo tomorrow")
            .await;

        assert!(reply.starts_with("Tokyo: clear sky, 24.0°C"), "got {reply}");
        assert!(reply.contains("Sounds great!"));

        let requests = provider.requests.lock().unwrap();
        assert_eq!(requests.as_slice(), [ForecastRequest::new("tokyo", 2)]);

        // The chat model was never consulted.
        assert!(chat.seen.lock().unwrap().is_empty());
        assert_eq!(session.transcript().len(), 1);
    }

    #[tokio::test]
    async fn failed_lookup_gives_friendly_message() {
        let provider = CannedProvider::new(None);
        let chat = ScriptedBackend::default();
        let mut session = ChatSession::new();

        let reply = Assistant::new(&provider, &chat)
            .respond(&mut session, "weather in atlantis")
            .await;

        assert_eq!(reply, LOCATION_NOT_FOUND);
    }

    #[tokio::test]
    async fn unrecognized_provider_shape_counts_as_not_found() {
        let provider = CannedProvider::new(Some(json!({ "cod": "404" })));
        let chat = ScriptedBackend::default();
        let mut session = ChatSession::new();

        let reply = Assistant::new(&provider, &chat)
            .respond(&mut session, "weather in nowhere")
            .await;

        assert_eq!(reply, LOCATION_NOT_FOUND);
    }

    #[tokio::test]
    async fn small_talk_goes_to_chat_model() {
        let provider = CannedProvider::new(Some(sunny()));
        let chat = ScriptedBackend::replying(vec![Ok("Hey! Umbrella optional.".into())]);
        let mut session = ChatSession::new();

        let reply = Assistant::new(&provider, &chat).respond(&mut session, "hello").await;

        assert_eq!(reply, "Hey! Umbrella optional.");
        assert!(provider.requests.lock().unwrap().is_empty());
        assert_eq!(session.transcript().len(), 3);
    }
}
