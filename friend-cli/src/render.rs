//! Plain-text rendering of forecasts for the terminal.

use chrono::{DateTime, Local};
use weather_friend_core::{
    CanonicalForecast, SeriesKind, SeriesPoint, compose::title_case,
};

const BAR_WIDTH: usize = 36;

pub fn icon_for(description: &str) -> &'static str {
    let d = description.to_lowercase();
    if d.contains("storm") || d.contains("thunder") {
        "⛈️"
    } else if d.contains("rain") || d.contains("drizzle") {
        "🌧️"
    } else if d.contains("snow") {
        "❄️"
    } else if d.contains("cloud") || d.contains("overcast") {
        "☁️"
    } else if d.contains("mist") || d.contains("fog") {
        "🌫️"
    } else {
        "☀️"
    }
}

fn num(value: Option<f64>, precision: usize) -> String {
    value.map_or_else(|| "—".to_string(), |v| format!("{v:.precision$}"))
}

/// Current-conditions card, or `None` when there is nothing to show.
pub fn current_card(forecast: &CanonicalForecast, fetched_at: DateTime<Local>) -> Option<String> {
    let now = forecast.current_or_first()?;
    let description = now
        .description
        .clone()
        .unwrap_or_else(|| "Forecasted conditions".to_string());

    let mut out = String::new();
    out.push_str(&format!("{}  {}\n", icon_for(&description), title_case(&forecast.city)));
    out.push_str(&format!("   {}°C", num(now.temp, 1)));
    if let Some(feels) = now.feels_like {
        out.push_str(&format!(" (feels like {feels:.1}°C)"));
    }
    out.push('\n');
    out.push_str(&format!("   Condition: {}\n", title_case(&description)));
    out.push_str(&format!(
        "   💧 {}%   🌬️ {} m/s\n",
        num(now.humidity, 0),
        num(now.wind_speed, 1)
    ));
    out.push_str(&format!("   {}", fetched_at.format("%a, %d %b %Y • %H:%M")));

    Some(out)
}

/// Horizontal bar chart, one row per point, scaled between the series min and max.
pub fn chart(kind: SeriesKind, points: &[SeriesPoint]) -> String {
    let mut out = format!("{} ({})\n", kind.title(), kind.unit());

    let min = points.iter().map(|p| p.value).fold(f64::INFINITY, f64::min);
    let max = points.iter().map(|p| p.value).fold(f64::NEG_INFINITY, f64::max);
    let span = max - min;

    for p in points {
        let label = p
            .at
            .map(|at| at.format("%d/%m %H:%M").to_string())
            .unwrap_or_else(|| p.time.clone());

        // Shortest bar is one cell so the minimum still shows up.
        let filled = if span > f64::EPSILON {
            1 + (((p.value - min) / span) * (BAR_WIDTH - 1) as f64).round() as usize
        } else {
            BAR_WIDTH
        };

        out.push_str(&format!(
            "{label:>11} │{:<width$} {:.1}{}\n",
            "█".repeat(filled),
            p.value,
            kind.unit(),
            width = BAR_WIDTH,
        ));
    }

    out
}
