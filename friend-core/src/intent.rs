//! Heuristic extraction of a place and a day count from a chat message.

use std::sync::LazyLock;

use regex::Regex;

use crate::model::Intent;

/// "in/for/at <place>", optionally followed by a time word or a day count
/// ("for 5days", "3 days") and whatever comes after it, running to the end of
/// the message.
static LOCATION_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r"\b(?:in|for|at)\s+(\p{L}[\p{L}\s'.-]*?)(?:\s+(?:(?:today|tomorrow|next|now)\b|(?:for\s+)?\d).*)?\s*[?!.]*$",
    )
    .ok()
});

/// Day-count keywords in priority order; the first rule with any hit wins.
const DAY_RULES: &[(&[&str], u8)] = &[
    (&["tomorrow"], 2),
    (&["next", "five", "5"], 5),
    (&["three", "3"], 3),
    (&["two", "2"], 2),
];

/// Extract `{location, days}` from free text. Never fails.
pub fn extract(question: &str) -> Intent {
    let lowered = question.to_lowercase();

    Intent {
        location: location(&lowered),
        days: days(&lowered),
    }
}

fn location(lowered: &str) -> Option<String> {
    let re = LOCATION_PATTERN.as_ref()?;
    let caps = re.captures(lowered.trim())?;
    let place = caps.get(1)?.as_str().trim();

    (!place.is_empty()).then(|| place.to_string())
}

fn days(lowered: &str) -> u8 {
    let words: Vec<&str> = lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    DAY_RULES
        .iter()
        .find(|(keywords, _)| {
            keywords
                .iter()
                .any(|k| words.iter().any(|w| keyword_matches(w, k)))
        })
        .map_or(1, |(_, days)| *days)
}

/// Words match whole. A digit keyword also matches when glued to a unit,
/// as in "5days" or "3d", but not inside a longer number.
fn keyword_matches(word: &str, keyword: &str) -> bool {
    if word == keyword {
        return true;
    }

    keyword.chars().all(|c| c.is_ascii_digit())
        && word
            .strip_prefix(keyword)
            .is_some_and(|rest| rest.starts_with(char::is_alphabetic))
}
