//! Chart-ready series pulled out of a canonical forecast.

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::model::{CanonicalForecast, ForecastEntry};

/// Readings per day in a three-hourly feed.
pub const READINGS_PER_DAY: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesKind {
    Temperature,
    Humidity,
}

impl SeriesKind {
    pub fn unit(&self) -> &'static str {
        match self {
            SeriesKind::Temperature => "°C",
            SeriesKind::Humidity => "%",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            SeriesKind::Temperature => "Temperature Trend",
            SeriesKind::Humidity => "Humidity Trend",
        }
    }

    fn pick(&self, entry: &ForecastEntry) -> Option<f64> {
        match self {
            SeriesKind::Temperature => entry.temp,
            SeriesKind::Humidity => entry.humidity,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeriesPoint {
    /// Provider timestamp text.
    pub time: String,
    pub at: Option<NaiveDateTime>,
    pub value: f64,
}

/// Chronologically sorted points for the first `days` worth of readings.
/// Entries whose time cannot be parsed keep their relative order after the
/// parsed ones; entries missing the requested value are left out.
pub fn series(forecast: &CanonicalForecast, kind: SeriesKind, days: u8) -> Vec<SeriesPoint> {
    let mut timed: Vec<(Option<NaiveDateTime>, &ForecastEntry)> = forecast
        .forecast
        .iter()
        .map(|e| (parse_time(&e.time), e))
        .collect();

    // Stable sort: None sorts after every Some.
    timed.sort_by_key(|(at, _)| (at.is_none(), *at));

    timed
        .into_iter()
        .take(usize::from(days.max(1)) * READINGS_PER_DAY)
        .filter_map(|(at, entry)| {
            kind.pick(entry).map(|value| SeriesPoint {
                time: entry.time.clone(),
                at,
                value,
            })
        })
        .collect()
}

/// Accepts the timestamp flavours the supported providers emit.
pub fn parse_time(raw: &str) -> Option<NaiveDateTime> {
    const FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"];

    FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.naive_utc()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(time: &str, temp: Option<f64>, humidity: Option<f64>) -> ForecastEntry {
        ForecastEntry {
            time: time.into(),
            temp,
            humidity,
            wind_speed: None,
            description: None,
        }
    }

    fn forecast(entries: Vec<ForecastEntry>) -> CanonicalForecast {
        CanonicalForecast {
            forecast: entries,
            ..Default::default()
        }
    }

    #[test]
    fn parses_supported_formats() {
        assert!(parse_time("2025-03-01 12:00:00").is_some());
        assert!(parse_time("2024-01-15T12:00").is_some());
        assert!(parse_time("2024-01-15T12:00:00+08:00").is_some());
        assert!(parse_time("yesterday-ish").is_none());
    }

    #[test]
    fn sorts_chronologically_with_unparsable_last() {
        let fc = forecast(vec![
            entry("later", Some(1.0), None),
            entry("2025-01-01 06:00:00", Some(3.0), None),
            entry("2025-01-01 00:00:00", Some(2.0), None),
            entry("never", Some(4.0), None),
        ]);

        let times: Vec<_> = series(&fc, SeriesKind::Temperature, 1)
            .into_iter()
            .map(|p| p.time)
            .collect();

        assert_eq!(
            times,
            ["2025-01-01 00:00:00", "2025-01-01 06:00:00", "later", "never"]
        );
    }

    #[test]
    fn window_is_eight_readings_per_day() {
        let entries = (0..24u32)
            .map(|i| {
                entry(
                    &format!("2025-01-{:02} {:02}:00:00", 1 + i / 8, (i % 8) * 3),
                    Some(f64::from(i)),
                    None,
                )
            })
            .collect();
        let fc = forecast(entries);

        assert_eq!(series(&fc, SeriesKind::Temperature, 1).len(), 8);
        assert_eq!(series(&fc, SeriesKind::Temperature, 2).len(), 16);
        assert_eq!(series(&fc, SeriesKind::Temperature, 5).len(), 24);
    }

    #[test]
    fn humidity_skips_missing_values() {
        let fc = forecast(vec![
            entry("2025-01-01 00:00:00", Some(10.0), Some(70.0)),
            entry("2025-01-01 03:00:00", Some(11.0), None),
        ]);

        let points = series(&fc, SeriesKind::Humidity, 1);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].value, 70.0);
    }
}
