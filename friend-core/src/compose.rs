use crate::{
    model::{CanonicalForecast, Intent},
    series::{SeriesKind, series},
};

/// Reply used when there is nothing usable to talk about.
pub const APOLOGY: &str = "Sorry, I couldn't get the weather for that place right now.";

/// Above this the weather "sounds great", otherwise "chilly".
const PLEASANT_ABOVE_C: f64 = 20.0;

/// Render a one-paragraph answer for `intent` from `forecast`.
pub fn compose(intent: &Intent, forecast: &CanonicalForecast) -> String {
    let Some(current) = forecast.current_or_first() else {
        return APOLOGY.to_string();
    };
    let Some(temp) = current.temp else {
        return APOLOGY.to_string();
    };

    let city = if forecast.city.trim().is_empty() {
        intent.location.as_deref().unwrap_or("there")
    } else {
        forecast.city.as_str()
    };

    let description = current
        .description
        .as_deref()
        .unwrap_or("forecasted conditions");
    let mood = if temp > PLEASANT_ABOVE_C { "great" } else { "chilly" };

    let mut reply = format!(
        "{}: {description}, {temp:.1}°C, humidity {}%, wind {} m/s. Sounds {mood}!",
        title_case(city),
        or_dash(current.humidity, 0),
        or_dash(current.wind_speed, 1),
    );

    if intent.days > 1 {
        let temps = series(forecast, SeriesKind::Temperature, intent.days);
        let min = temps.iter().map(|p| p.value).reduce(f64::min);
        let max = temps.iter().map(|p| p.value).reduce(f64::max);
        if let (Some(min), Some(max)) = (min, max) {
            reply.push_str(&format!(
                " Over the next {} days expect {min:.1}°C to {max:.1}°C.",
                intent.days
            ));
        }
    }

    reply
}

fn or_dash(value: Option<f64>, precision: usize) -> String {
    value.map_or_else(|| "—".to_string(), |v| format!("{v:.precision$}"))
}

/// "new york" -> "New York".
pub fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CurrentConditions, ForecastEntry};

    fn intent(days: u8) -> Intent {
        Intent {
            location: Some("perth".into()),
            days,
        }
    }

    fn entry(time: &str, temp: f64) -> ForecastEntry {
        ForecastEntry {
            time: time.into(),
            temp: Some(temp),
            humidity: Some(55.0),
            wind_speed: Some(3.25),
            description: None,
        }
    }

    #[test]
    fn apology_when_nothing_to_report() {
        assert_eq!(compose(&intent(1), &CanonicalForecast::default()), APOLOGY);
    }

    #[test]
    fn apology_when_temperature_missing() {
        let fc = CanonicalForecast {
            current: CurrentConditions {
                description: Some("clear sky".into()),
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(compose(&intent(1), &fc), APOLOGY);
    }

    #[test]
    fn warm_day_sounds_great() {
        let fc = CanonicalForecast {
            city: "perth".into(),
            current: CurrentConditions {
                temp: Some(27.0),
                humidity: Some(40.0),
                wind_speed: Some(5.0),
                description: Some("clear sky".into()),
                ..Default::default()
            },
            forecast: vec![],
        };

        assert_eq!(
            compose(&intent(1), &fc),
            "Perth: clear sky, 27.0°C, humidity 40%, wind 5.0 m/s. Sounds great!"
        );
    }

    #[test]
    fn exactly_twenty_is_chilly_and_first_entry_is_used() {
        let fc = CanonicalForecast {
            forecast: vec![entry("2025-01-01 00:00:00", 20.0)],
            ..Default::default()
        };

        let reply = compose(&intent(1), &fc);
        assert!(reply.starts_with("Perth: forecasted conditions, 20.0°C"));
        assert!(reply.ends_with("Sounds chilly!"));
    }

    #[test]
    fn multi_day_intent_adds_range() {
        let fc = CanonicalForecast {
            city: "Perth".into(),
            forecast: vec![
                entry("2025-01-01 00:00:00", 18.0),
                entry("2025-01-01 03:00:00", 24.5),
                entry("2025-01-01 06:00:00", 15.0),
            ],
            ..Default::default()
        };

        let reply = compose(&intent(2), &fc);
        assert!(reply.ends_with("Over the next 2 days expect 15.0°C to 24.5°C."));
    }

    #[test]
    fn title_case_words() {
        assert_eq!(title_case("new york"), "New York");
        assert_eq!(title_case("  são   paulo "), "São Paulo");
    }
}
