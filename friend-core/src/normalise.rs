//! Turns the JSON documents weather providers return into a [`CanonicalForecast`].
//!
//! Providers are recognised by probing the top-level keys in a fixed order;
//! the first shape that matches decides which decoder runs. Entries a decoder
//! cannot read are dropped and counted in [`Normalised::skipped`].

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::model::{CanonicalForecast, CurrentConditions, ForecastEntry, Normalised};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum NormaliseError {
    /// The document is not a JSON object at all.
    #[error("Unexpected data format.")]
    UnexpectedFormat,

    /// An object, but not one any decoder knows. Carries the input untouched.
    #[error("Unrecognized forecast shape (keys: {})", keys_of(.0))]
    Unrecognized(Value),
}

fn keys_of(value: &Value) -> String {
    value
        .as_object()
        .map(|obj| obj.keys().cloned().collect::<Vec<_>>().join(", "))
        .unwrap_or_default()
}

/// The provider document layouts this crate understands.
#[derive(Debug, Clone, Copy)]
pub enum ProviderShape<'a> {
    /// Already canonical: `{ city, current, forecast: [...] }`.
    Canonical {
        root: &'a Map<String, Value>,
        entries: &'a [Value],
    },
    /// Three-hourly list: `{ city: {name}, list: [{ dt_txt, main: {temp, humidity} }] }`.
    ThreeHourly {
        root: &'a Map<String, Value>,
        list: &'a [Value],
    },
    /// Hourly rows next to a current block: `{ current, hourly: [{ time, temp, humidity }] }`.
    Hourly {
        root: &'a Map<String, Value>,
        hourly: &'a [Value],
    },
}

impl<'a> ProviderShape<'a> {
    /// Pick the first matching shape, in priority order.
    pub fn probe(root: &'a Map<String, Value>) -> Option<Self> {
        if let Some(entries) = root.get("forecast").and_then(Value::as_array) {
            return Some(Self::Canonical { root, entries });
        }

        if let Some(list) = root.get("list").and_then(Value::as_array) {
            return Some(Self::ThreeHourly { root, list });
        }

        match root.get("hourly").and_then(Value::as_array) {
            Some(hourly) if root.contains_key("current") => Some(Self::Hourly { root, hourly }),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Canonical { .. } => "canonical",
            Self::ThreeHourly { .. } => "three-hourly",
            Self::Hourly { .. } => "hourly",
        }
    }

    fn decode(self) -> Normalised {
        match self {
            Self::Canonical { root, entries } => {
                let (forecast, skipped) = decode_entries(entries, canonical_entry);
                Normalised {
                    forecast: CanonicalForecast {
                        city: text(root, &["city"]).unwrap_or_default(),
                        current: current_conditions(root.get("current")),
                        forecast,
                    },
                    skipped,
                    passthrough: Some(Value::Object(root.clone())),
                }
            }
            Self::ThreeHourly { root, list } => {
                let (forecast, skipped) = decode_entries(list, three_hourly_entry);
                Normalised {
                    forecast: CanonicalForecast {
                        city: three_hourly_city(root),
                        current: current_conditions(root.get("current")),
                        forecast,
                    },
                    skipped,
                    passthrough: None,
                }
            }
            Self::Hourly { root, hourly } => {
                let (forecast, skipped) = decode_entries(hourly, hourly_entry);
                Normalised {
                    forecast: CanonicalForecast {
                        city: text(root, &["city"]).unwrap_or_default(),
                        current: current_conditions(root.get("current")),
                        forecast,
                    },
                    skipped,
                    passthrough: None,
                }
            }
        }
    }
}

/// Normalise a raw provider document.
///
/// Never panics. A non-object input is [`NormaliseError::UnexpectedFormat`];
/// an object with no known layout comes back as
/// [`NormaliseError::Unrecognized`] holding the input unchanged.
pub fn normalise(raw: &Value) -> Result<Normalised, NormaliseError> {
    let root = raw.as_object().ok_or(NormaliseError::UnexpectedFormat)?;

    let Some(shape) = ProviderShape::probe(root) else {
        debug!("no known forecast shape matched");
        return Err(NormaliseError::Unrecognized(raw.clone()));
    };

    let name = shape.name();
    let out = shape.decode();

    if out.skipped > 0 {
        warn!(shape = name, skipped = out.skipped, "dropped malformed forecast entries");
    }
    debug!(
        shape = name,
        entries = out.forecast.forecast.len(),
        city = %out.forecast.city,
        "normalised forecast"
    );

    Ok(out)
}

fn decode_entries(
    items: &[Value],
    decode: fn(&Value) -> Option<ForecastEntry>,
) -> (Vec<ForecastEntry>, usize) {
    let entries: Vec<ForecastEntry> = items.iter().filter_map(decode).collect();
    let skipped = items.len() - entries.len();
    (entries, skipped)
}

fn canonical_entry(item: &Value) -> Option<ForecastEntry> {
    let obj = item.as_object()?;
    Some(ForecastEntry {
        time: text(obj, &["time", "dt_txt"])?,
        temp: number(obj, &["temp"]),
        humidity: number(obj, &["humidity"]),
        wind_speed: number(obj, &["wind_speed"]),
        description: text(obj, &["description"]),
    })
}

fn three_hourly_entry(item: &Value) -> Option<ForecastEntry> {
    let obj = item.as_object()?;

    let main = match obj.get("main") {
        None | Some(Value::Null) => None,
        Some(Value::Object(main)) => Some(main),
        Some(_) => return None,
    };

    let wind_speed = obj
        .get("wind")
        .and_then(Value::as_object)
        .and_then(|wind| number(wind, &["speed"]));

    let description = obj
        .get("weather")
        .and_then(Value::as_array)
        .and_then(|w| w.first())
        .and_then(Value::as_object)
        .and_then(|w| text(w, &["description"]));

    Some(ForecastEntry {
        time: text(obj, &["dt_txt"])?,
        temp: main.and_then(|m| number(m, &["temp"])),
        humidity: main.and_then(|m| number(m, &["humidity"])),
        wind_speed,
        description,
    })
}

fn hourly_entry(item: &Value) -> Option<ForecastEntry> {
    let obj = item.as_object()?;
    Some(ForecastEntry {
        time: text(obj, &["time", "dt_txt"])?,
        temp: number(obj, &["temp", "temperature"]),
        humidity: number(obj, &["humidity"]),
        wind_speed: number(obj, &["wind_speed"]),
        description: text(obj, &["description"]),
    })
}

/// `city.name`, then `city` as plain text, then top-level `name`.
fn three_hourly_city(root: &Map<String, Value>) -> String {
    let from_city = match root.get("city") {
        Some(Value::Object(city)) => text(city, &["name"]),
        Some(Value::String(name)) => Some(name.clone()),
        _ => None,
    };

    from_city
        .filter(|s| !s.is_empty())
        .or_else(|| text(root, &["name"]))
        .unwrap_or_default()
}

fn current_conditions(value: Option<&Value>) -> CurrentConditions {
    let Some(obj) = value.and_then(Value::as_object) else {
        return CurrentConditions::default();
    };

    CurrentConditions {
        temp: number(obj, &["temp", "temperature"]),
        feels_like: number(obj, &["feels_like"]),
        humidity: number(obj, &["humidity"]),
        wind_speed: number(obj, &["wind_speed"]),
        description: text(obj, &["description"]),
    }
}

fn number(obj: &Map<String, Value>, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|k| obj.get(*k).and_then(Value::as_f64))
}

fn text(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|k| obj.get(*k).and_then(Value::as_str))
        .map(str::to_string)
}
