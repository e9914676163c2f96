// Field extraction for a single schedule row.
//
// Each field has an ordered list of strategies; the first one producing
// plausible text wins. Opponent falls back to a regex scan of the row text,
// and home/away is inferred from prefixes, row classes, then row text.

use crate::text::{clean_text, delimited_text, element_text};
use kickoff_model::RawGameFields;
use regex::Regex;
use scraper::{ElementRef, Selector};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// One way of pulling a text value out of a row element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Strategy {
    /// Text of the first descendant matching a CSS selector.
    Css { selector: String },
    /// An attribute of the first descendant matching a CSS selector.
    Attribute { selector: String, attribute: String },
    /// Text of the first `tag` descendant with a class containing `needle`
    /// (case-insensitive).
    ClassContains { tag: String, needle: String },
}

impl Strategy {
    pub fn css(selector: &str) -> Self {
        Self::Css { selector: selector.to_string() }
    }

    pub fn attribute(selector: &str, attribute: &str) -> Self {
        Self::Attribute {
            selector: selector.to_string(),
            attribute: attribute.to_string(),
        }
    }

    pub fn class_contains(tag: &str, needle: &str) -> Self {
        Self::ClassContains {
            tag: tag.to_string(),
            needle: needle.to_lowercase(),
        }
    }

    /// Apply to a row. Empty results count as no result.
    pub fn apply(&self, row: ElementRef<'_>) -> Option<String> {
        let text = match self {
            Self::Css { selector } => {
                let sel = Selector::parse(selector).ok()?;
                row.select(&sel).next().map(element_text)
            }
            Self::Attribute { selector, attribute } => {
                let sel = Selector::parse(selector).ok()?;
                row.select(&sel)
                    .find_map(|el| el.value().attr(attribute))
                    .map(clean_text)
            }
            Self::ClassContains { tag, needle } => row
                .descendants()
                .filter_map(ElementRef::wrap)
                .filter(|el| el.id() != row.id() && el.value().name() == tag.as_str())
                .find(|el| el.value().classes().any(|c| c.to_lowercase().contains(needle.as_str())))
                .map(element_text),
        };
        text.filter(|t| !t.is_empty())
    }
}

/// Strategy lists for every field, in priority order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldRules {
    pub date: Vec<Strategy>,
    pub time: Vec<Strategy>,
    pub opponent: Vec<Strategy>,
    pub location: Vec<Strategy>,
    pub broadcast: Vec<Strategy>,
    /// A cleaned opponent name must be longer than this.
    pub min_opponent_len: usize,
}

impl Default for FieldRules {
    fn default() -> Self {
        Self {
            date: vec![
                Strategy::css(".sidearm-schedule-game-date"),
                Strategy::css(".sidearm-schedule-game-opponent-date span:first-child"),
                Strategy::css(".sidearm-schedule-game-opponent-date"),
                Strategy::css(".event-date"),
                Strategy::css("[data-field='date']"),
                Strategy::attribute("time[datetime]", "datetime"),
                Strategy::class_contains("span", "date"),
                Strategy::class_contains("div", "date"),
            ],
            time: vec![
                Strategy::css(".sidearm-schedule-game-time"),
                Strategy::css(".sidearm-schedule-game-opponent-date span:nth-child(2)"),
                Strategy::css(".event-time"),
                Strategy::css("[data-field='time']"),
                Strategy::class_contains("span", "time"),
                Strategy::class_contains("div", "time"),
            ],
            opponent: vec![
                Strategy::css(".sidearm-schedule-game-opponent-name a"),
                Strategy::css(".sidearm-schedule-game-opponent-name"),
                Strategy::css(".event-opponent"),
                Strategy::css("[data-field='opponent']"),
                Strategy::class_contains("a", "opponent"),
                Strategy::class_contains("span", "team"),
            ],
            location: vec![
                Strategy::css(".sidearm-schedule-game-location"),
                Strategy::css(".event-location"),
                Strategy::css("[data-field='location']"),
                Strategy::class_contains("span", "location"),
                Strategy::class_contains("div", "location"),
            ],
            broadcast: vec![
                Strategy::css(".sidearm-schedule-game-network"),
                Strategy::css(".event-network"),
                Strategy::css("[data-field='network']"),
                Strategy::class_contains("span", "network"),
                Strategy::class_contains("div", "tv"),
            ],
            min_opponent_len: 2,
        }
    }
}

static DIRECTION_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:(?P<home>vs\.?|v\.|versus)|(?P<away>at\b|@))\s*").expect("valid regex")
});

static RANKING_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:No\.\s*|#)\d+\s+").expect("valid regex"));

static OPPONENT_IN_TEXT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:^|[\s|])(?P<dir>vs\b\.?|at\b|@)\s*\|?\s*(?P<name>[^|]+)").expect("valid regex")
});

static AWAY_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:^|[\s|])(?:at|@)(?:[\s|]|$)|\baway\b").expect("valid regex"));

/// Strip a leading directional token from an opponent string.
///
/// Returns the cleaned name plus the home/away hint the prefix carried:
/// `Some(true)` for "vs", `Some(false)` for "at"/"@", `None` without a prefix.
pub fn strip_direction(raw: &str) -> (String, Option<bool>) {
    let text = clean_text(raw);
    let (rest, hint) = match DIRECTION_PREFIX.captures(&text) {
        Some(caps) => {
            let hint = caps.name("home").is_some();
            (text[caps.get(0).map_or(0, |m| m.end())..].to_string(), Some(hint))
        }
        None => (text, None),
    };
    let rest = RANKING_PREFIX.replace(&rest, "");
    let name = rest.trim().trim_end_matches('*').trim().to_string();
    (name, hint)
}

/// Whether free text carries an away marker: a standalone "at"/"@" or the
/// word "away".
pub fn is_away_text(text: &str) -> bool {
    AWAY_TOKEN.is_match(text)
}

/// Extract raw fields from one row, or `None` if the row has no usable
/// date or opponent.
pub fn extract(row: ElementRef<'_>, rules: &FieldRules) -> Option<RawGameFields> {
    let Some(date_text) = first_match(&rules.date, row, |t| t.chars().any(|c| c.is_ascii_digit())) else {
        tracing::debug!("Row has no date text");
        return None;
    };
    let time_text = first_match(&rules.time, row, |_| true);
    let location = first_match(&rules.location, row, |_| true);
    let broadcast = first_match(&rules.broadcast, row, |_| true);

    let plausible_opponent = |t: &str| strip_direction(t).0.chars().count() > rules.min_opponent_len;
    let row_text = delimited_text(row);

    let raw_opponent = first_match(&rules.opponent, row, plausible_opponent).or_else(|| {
        OPPONENT_IN_TEXT
            .captures_iter(&row_text)
            .map(|caps| format!("{} {}", &caps["dir"], caps["name"].trim()))
            .find(|candidate| plausible_opponent(candidate.as_str()))
    });
    let Some(raw_opponent) = raw_opponent else {
        tracing::debug!(date = %date_text, "Row has no opponent");
        return None;
    };

    let (opponent, prefix_hint) = strip_direction(&raw_opponent);
    let is_home = prefix_hint
        .or_else(|| class_hint(row))
        .unwrap_or_else(|| !is_away_text(&row_text));

    Some(RawGameFields {
        date_text,
        time_text,
        opponent,
        is_home,
        location,
        broadcast,
    })
}

fn first_match(strategies: &[Strategy], row: ElementRef<'_>, plausible: impl Fn(&str) -> bool) -> Option<String> {
    strategies
        .iter()
        .filter_map(|s| s.apply(row))
        .find(|text| plausible(text))
}

/// Home/away from the row's own classes, e.g. `sidearm-schedule-away-game`.
fn class_hint(row: ElementRef<'_>) -> Option<bool> {
    let classes: Vec<String> = row.value().classes().map(str::to_lowercase).collect();
    if classes.iter().any(|c| c.contains("away")) {
        Some(false)
    } else if classes.iter().any(|c| c.contains("home")) {
        Some(true)
    } else {
        None
    }
}
