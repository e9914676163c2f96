use crate::fetch::PageFetcher;
use crate::source::{assemble_games, first_non_empty, ScheduleSource, SourceError};
use async_trait::async_trait;
use kickoff_model::{AppConfig, GameRecord, RawGameFields};
use kickoff_parse::text::element_text;
use kickoff_parse::{detect, is_away_text, strip_direction, StructurePatterns};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::{Arc, LazyLock};

static CELL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("td, th").expect("valid selector"));

/// Completed or cancelled games show a result in the time column.
static RESULT_CELL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:[WLT]\s*\d+\s*-\s*\d+|final|postponed|canceled|cancelled)").expect("valid regex")
});

/// Header and section labels that head a column or a block of rows.
const LABEL_ROWS: &[&str] = &[
    "date",
    "opponent",
    "time",
    "result",
    "tv",
    "regular season",
    "postseason",
    "bowl",
];

/// Fixed-column schedule table (date | opponent | time or result | TV),
/// as published on ESPN team schedule pages.
pub struct EspnSource {
    fetcher: Arc<PageFetcher>,
    config: Arc<AppConfig>,
    patterns: StructurePatterns,
}

impl EspnSource {
    pub fn new(fetcher: Arc<PageFetcher>, config: Arc<AppConfig>) -> Self {
        let patterns = StructurePatterns {
            containers: vec!["table.Table".to_string(), "table".to_string()],
            rows: vec!["tbody tr".to_string(), "tr".to_string()],
            min_rows: 3,
        };
        Self { fetcher, config, patterns }
    }

    pub fn parse_page(&self, url: &str, html: &str, season: i32) -> Result<Vec<GameRecord>, SourceError> {
        let document = Html::parse_document(html);
        let structure = detect(&document, &self.patterns).map_err(|source| SourceError::Structure {
            url: url.to_string(),
            source,
        })?;
        tracing::info!(rows = structure.rows.len(), "Found schedule table");

        let rows = structure.rows.iter().filter_map(|row| table_row(*row)).collect();
        Ok(assemble_games(rows, season, &self.config))
    }
}

#[async_trait]
impl ScheduleSource for EspnSource {
    fn name(&self) -> &str {
        "backup"
    }

    async fn fetch_season(&self, season: i32) -> Result<Vec<GameRecord>, SourceError> {
        let urls = self.config.sources.backup.urls_for(season);
        first_non_empty(&self.fetcher, self.name(), &urls, |url, body| {
            self.parse_page(url, body, season)
        })
        .await
    }
}

/// Read one table row positionally. Header rows, section labels, bye weeks
/// and rows with too few cells yield `None`.
fn table_row(row: ElementRef<'_>) -> Option<RawGameFields> {
    let cells: Vec<String> = row.select(&CELL).map(element_text).collect();
    if cells.len() < 2 {
        return None;
    }

    let first = cells[0].to_lowercase();
    if LABEL_ROWS.contains(&first.as_str()) {
        return None;
    }
    let opponent_cell = &cells[1];
    let lowered = opponent_cell.to_lowercase();
    if lowered.is_empty() || lowered == "bye" || lowered.contains("bye week") || lowered == "open" {
        tracing::debug!(date = %cells[0], "Skipping bye row");
        return None;
    }
    if !cells[0].chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    let (opponent, hint) = strip_direction(opponent_cell);
    let is_home = hint.unwrap_or_else(|| !is_away_text(opponent_cell));

    let time_text = cells
        .get(2)
        .filter(|t| !t.is_empty() && !RESULT_CELL.is_match(t))
        .cloned();
    let broadcast = cells.get(3).filter(|t| !t.is_empty()).cloned();

    Some(RawGameFields {
        date_text: cells[0].clone(),
        time_text,
        opponent,
        is_home,
        location: None,
        broadcast,
    })
}
