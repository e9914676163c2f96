use crate::config::TeamConfig;
use chrono::{DateTime, Duration, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Opponent strings that mean "nothing was extracted" rather than a team.
const PLACEHOLDER_OPPONENTS: &[&str] = &["unknown", "unknown opponent", "tba", "tbd", "opponent"];

/// One scheduled game, ready to become a calendar event.
///
/// Records live only for the duration of a refresh cycle; the calendar
/// artifact is the only thing that gets persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameRecord {
    /// "<Opponent> at <Team>" for home games, "<Team> at <Opponent>" otherwise.
    pub title: String,
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
    pub location: String,
    pub broadcast: String,
    pub is_home: bool,
    /// Cleaned opponent name, directional prefixes removed.
    pub opponent: String,
    /// Date fragment exactly as the source published it.
    pub date_str: String,
    /// Time fragment exactly as the source published it.
    pub time_str: String,
}

/// Fields pulled out of one schedule row before any normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawGameFields {
    pub date_text: String,
    pub time_text: Option<String>,
    pub opponent: String,
    pub is_home: bool,
    pub location: Option<String>,
    pub broadcast: Option<String>,
}

/// Why a candidate record was refused entry into a result set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordRejection {
    #[error("opponent is empty")]
    EmptyOpponent,

    #[error("opponent '{0}' is a placeholder")]
    PlaceholderOpponent(String),

    #[error("opponent '{0}' is the home team itself")]
    OwnTeam(String),
}

impl GameRecord {
    /// Build a record from extracted fields and a resolved kickoff.
    ///
    /// Home games without an explicit location get the team's home venue.
    pub fn assemble(
        team: &TeamConfig,
        raw: RawGameFields,
        start: DateTime<FixedOffset>,
        duration: Duration,
    ) -> Self {
        let location = match raw.location.filter(|l| !l.trim().is_empty()) {
            Some(explicit) => explicit.trim().to_string(),
            None if raw.is_home => team.home_venue.clone(),
            None => String::new(),
        };

        Self {
            title: game_title(&team.name, &raw.opponent, raw.is_home),
            start,
            end: start + duration,
            location,
            broadcast: raw.broadcast.unwrap_or_default().trim().to_string(),
            is_home: raw.is_home,
            opponent: raw.opponent,
            date_str: raw.date_text,
            time_str: raw.time_text.unwrap_or_default(),
        }
    }

    /// Calendar date of kickoff in the game's own offset.
    pub fn date(&self) -> NaiveDate {
        self.start.date_naive()
    }

    /// Check the record against the result-set acceptance rules.
    pub fn check(&self, team: &TeamConfig) -> Result<(), RecordRejection> {
        check_opponent(&self.opponent, team)
    }
}

/// Title shown in calendar clients.
pub fn game_title(team_name: &str, opponent: &str, is_home: bool) -> String {
    if is_home {
        format!("{opponent} at {team_name}")
    } else {
        format!("{team_name} at {opponent}")
    }
}

/// An opponent is usable when it is non-empty, not a placeholder, and
/// not one of the team's own names.
pub fn check_opponent(opponent: &str, team: &TeamConfig) -> Result<(), RecordRejection> {
    let trimmed = opponent.trim();
    if trimmed.is_empty() {
        return Err(RecordRejection::EmptyOpponent);
    }

    let lower = trimmed.to_lowercase();
    if PLACEHOLDER_OPPONENTS.contains(&lower.as_str()) {
        return Err(RecordRejection::PlaceholderOpponent(trimmed.to_string()));
    }
    if team.is_own_name(trimmed) {
        return Err(RecordRejection::OwnTeam(trimmed.to_string()));
    }

    Ok(())
}

/// Collapse records sharing the same `(date, opponent)` pair, keeping the
/// first occurrence and the original order.
pub fn dedupe_games(games: Vec<GameRecord>) -> Vec<GameRecord> {
    let mut seen: HashSet<(NaiveDate, String)> = HashSet::new();
    let before = games.len();

    let kept: Vec<GameRecord> = games
        .into_iter()
        .filter(|g| seen.insert((g.date(), g.opponent.to_lowercase())))
        .collect();

    if kept.len() < before {
        tracing::debug!(removed = before - kept.len(), "Collapsed duplicate games");
    }
    kept
}
