use crate::calendar::write_calendar;
use crate::espn::EspnSource;
use crate::fetch::PageFetcher;
use crate::sidearm::SidearmSource;
use crate::source::ScheduleSource;
use anyhow::Result;
use kickoff_model::{AppConfig, GameRecord};
use kickoff_validate::{validate_schedule, ScheduleReport};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("no source produced a valid schedule for season {season}: {}", .attempts.join("; "))]
    NoSourceSucceeded { season: i32, attempts: Vec<String> },

    #[error("failed to write calendar to {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// The schedule that won a refresh cycle.
#[derive(Debug, Clone)]
pub struct RefreshOutcome {
    pub source: String,
    pub games: Vec<GameRecord>,
    pub report: ScheduleReport,
}

/// Runs sources in priority order and publishes the first schedule that
/// validates. The calendar on disk is only replaced on success.
pub struct Orchestrator {
    config: Arc<AppConfig>,
    sources: Vec<Box<dyn ScheduleSource>>,
}

impl Orchestrator {
    pub fn new(config: Arc<AppConfig>, sources: Vec<Box<dyn ScheduleSource>>) -> Self {
        Self { config, sources }
    }

    /// Enabled sources from configuration: primary, then backup.
    pub fn from_config(config: Arc<AppConfig>) -> Result<Self> {
        let fetcher = Arc::new(PageFetcher::new(&config.fetch)?);
        let mut sources: Vec<Box<dyn ScheduleSource>> = Vec::new();
        if config.sources.primary.enabled {
            sources.push(Box::new(SidearmSource::new(fetcher.clone(), config.clone())));
        }
        if config.sources.backup.enabled {
            sources.push(Box::new(EspnSource::new(fetcher, config.clone())));
        }
        if sources.is_empty() {
            tracing::warn!("All schedule sources are disabled");
        }
        Ok(Self::new(config, sources))
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn sources(&self) -> impl Iterator<Item = &dyn ScheduleSource> {
        self.sources.iter().map(|s| &**s)
    }

    /// Run one refresh cycle for `season`.
    ///
    /// Sources are tried strictly in order. A source error, an empty result
    /// or a failed validation moves on to the next source; the first valid
    /// schedule is written and later sources are never contacted.
    pub async fn try_refresh(&self, season: i32) -> Result<RefreshOutcome, RefreshError> {
        let mut attempts = Vec::new();

        for source in &self.sources {
            let name = source.name();
            tracing::info!(source = name, season, "Trying schedule source");

            let games = match source.fetch_season(season).await {
                Ok(games) => games,
                Err(e) => {
                    tracing::warn!(source = name, error = %e, "Source failed");
                    attempts.push(format!("{name}: {e}"));
                    continue;
                }
            };

            let report = match validate_schedule(&games, season, &self.config.validation) {
                Ok(report) => report,
                Err(e) => {
                    tracing::warn!(source = name, games = games.len(), error = %e, "Source result rejected");
                    attempts.push(format!("{name}: {e}"));
                    continue;
                }
            };

            let path = PathBuf::from(&self.config.calendar.path);
            write_calendar(&path, &games, &self.config.calendar)
                .map_err(|source| RefreshError::Write { path: path.clone(), source })?;

            tracing::info!(source = name, games = games.len(), season, "Refresh succeeded");
            return Ok(RefreshOutcome {
                source: name.to_string(),
                games,
                report,
            });
        }

        tracing::error!(season, "Every source failed, keeping the existing calendar");
        Err(RefreshError::NoSourceSucceeded { season, attempts })
    }

    /// Boolean form of [`Orchestrator::try_refresh`]; failures are logged.
    pub async fn refresh(&self, season: i32) -> bool {
        match self.try_refresh(season).await {
            Ok(_) => true,
            Err(e) => {
                tracing::error!(error = %e, "Refresh failed");
                false
            }
        }
    }
}
