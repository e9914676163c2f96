use chrono::{Datelike, NaiveDate};
use kickoff_model::{GameRecord, ValidationConfig};
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("no games found")]
    Empty,

    #[error("found {found} games, expected at least {expected} for season {season}")]
    TooFewGames { found: usize, expected: usize, season: i32 },

    #[error("only {unique} unique dates across {total} games (need {required})")]
    LowDateDiversity { unique: usize, total: usize, required: usize },

    #[error("{count} games fall on the fallback date {date}, dates were probably not parsed")]
    RepeatedFallbackDate { date: NaiveDate, count: usize },
}

/// Summary of a schedule that passed validation.
#[derive(Debug, Clone)]
pub struct ScheduleReport {
    pub games: usize,
    pub unique_dates: usize,
    pub expected: usize,
    /// Games played outside the usual season months. Logged, never fatal.
    pub warnings: Vec<String>,
}

/// Check a candidate season, short-circuiting on the first failure.
pub fn validate_schedule(
    games: &[GameRecord],
    season: i32,
    rules: &ValidationConfig,
) -> Result<ScheduleReport, ValidationError> {
    if games.is_empty() {
        return Err(ValidationError::Empty);
    }

    let expected = rules.expected_for(season);
    if games.len() < expected {
        return Err(ValidationError::TooFewGames {
            found: games.len(),
            expected,
            season,
        });
    }

    let unique: HashSet<NaiveDate> = games.iter().map(GameRecord::date).collect();
    let required = (games.len() as f64 * rules.min_unique_date_ratio - 1e-9).ceil() as usize;
    if unique.len() < required {
        return Err(ValidationError::LowDateDiversity {
            unique: unique.len(),
            total: games.len(),
            required,
        });
    }

    if let Some(fallback) = rules.fallback_date(season) {
        let count = games.iter().filter(|g| g.date() == fallback).count();
        if count > 1 {
            return Err(ValidationError::RepeatedFallbackDate { date: fallback, count });
        }
    }

    let warnings = out_of_season(games, season, rules);
    for w in &warnings {
        tracing::warn!("{w}");
    }

    tracing::info!(
        games = games.len(),
        unique_dates = unique.len(),
        expected,
        season,
        "Schedule passed validation"
    );

    Ok(ScheduleReport {
        games: games.len(),
        unique_dates: unique.len(),
        expected,
        warnings,
    })
}

/// Boolean form of [`validate_schedule`]; the rejection reason is logged.
pub fn validate(games: &[GameRecord], season: i32, rules: &ValidationConfig) -> bool {
    match validate_schedule(games, season, rules) {
        Ok(_) => true,
        Err(e) => {
            tracing::warn!(season, error = %e, "Schedule rejected");
            false
        }
    }
}

fn out_of_season(games: &[GameRecord], season: i32, rules: &ValidationConfig) -> Vec<String> {
    games
        .iter()
        .filter(|g| {
            let date = g.date();
            let year_ok = date.year() == season || date.year() == season + 1;
            !year_ok || !rules.season_months.contains(&date.month())
        })
        .map(|g| format!("'{}' on {} is outside the expected season window", g.title, g.date()))
        .collect()
}
