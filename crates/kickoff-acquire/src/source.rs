use crate::fetch::PageFetcher;
use async_trait::async_trait;
use kickoff_model::{dedupe_games, AppConfig, GameRecord, RawGameFields};
use kickoff_parse::{normalize, StructureNotFound};
use thiserror::Error;

/// Why a source produced nothing usable. None of these abort a refresh;
/// the orchestrator moves on to the next source.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: reqwest::StatusCode },

    #[error("{url} served a bot-block page ({marker})")]
    Blocked { url: String, marker: String },

    #[error("{url}: {source}")]
    Structure {
        url: String,
        #[source]
        source: StructureNotFound,
    },

    #[error("no games at any of {tried} candidate URLs (last problem: {last})")]
    NoGames { tried: usize, last: String },
}

/// One external page family that can produce a season's games.
#[async_trait]
pub trait ScheduleSource: Send + Sync {
    /// Short name used in logs and diagnostics.
    fn name(&self) -> &str;

    /// Fetch and parse the season's games. An empty list is a valid answer
    /// the orchestrator treats like a failure.
    async fn fetch_season(&self, season: i32) -> Result<Vec<GameRecord>, SourceError>;
}

/// Turn extracted rows into accepted, de-duplicated game records.
///
/// Rows whose date cannot be resolved, or whose opponent is unusable, are
/// dropped and logged; they never stop the rest of the page.
pub fn assemble_games(rows: Vec<RawGameFields>, season: i32, config: &AppConfig) -> Vec<GameRecord> {
    let duration = config.schedule.game_duration();
    let total = rows.len();
    let mut games = Vec::with_capacity(total);

    for raw in rows {
        let start = match normalize(&raw.date_text, raw.time_text.as_deref(), season, &config.schedule) {
            Ok(start) => start,
            Err(e) => {
                tracing::debug!(date = %raw.date_text, time = ?raw.time_text, error = %e, "Dropping row");
                continue;
            }
        };

        let game = GameRecord::assemble(&config.team, raw, start, duration);
        if let Err(reason) = game.check(&config.team) {
            tracing::debug!(title = %game.title, reason = %reason, "Dropping row");
            continue;
        }

        tracing::debug!(title = %game.title, start = %game.start, "Scraped game");
        games.push(game);
    }

    let games = dedupe_games(games);
    tracing::info!(rows = total, games = games.len(), season, "Assembled games");
    games
}

/// Fetch each candidate URL in order and return the first page that parses
/// to a non-empty game list.
///
/// `parse` runs synchronously on the body so the parsed document never
/// lives across an await point.
pub(crate) async fn first_non_empty<P>(
    fetcher: &PageFetcher,
    source: &str,
    urls: &[String],
    parse: P,
) -> Result<Vec<GameRecord>, SourceError>
where
    P: Fn(&str, &str) -> Result<Vec<GameRecord>, SourceError> + Send + Sync,
{
    let mut last = "no candidate URLs configured".to_string();

    for url in urls {
        let attempt = match fetcher.fetch(url).await {
            Ok(body) => parse(url, &body),
            Err(e) => Err(e),
        };
        match attempt {
            Ok(games) if !games.is_empty() => {
                tracing::info!(source, url = %url, games = games.len(), "Source produced games");
                return Ok(games);
            }
            Ok(_) => {
                tracing::warn!(source, url = %url, "Page parsed but yielded no games");
                last = format!("{url}: no games");
            }
            Err(e) => {
                tracing::warn!(source, url = %url, error = %e, "Candidate URL failed");
                last = e.to_string();
            }
        }
    }

    Err(SourceError::NoGames { tried: urls.len(), last })
}
