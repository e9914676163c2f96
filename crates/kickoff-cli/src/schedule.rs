//! Daily refresh trigger.

use crate::server::AppState;
use chrono::{Duration, Local, NaiveDateTime, NaiveTime, TimeZone};
use kickoff_model::season_for;
use std::sync::Arc;

/// Refresh the current season now, then every day at `server.refresh_hour`
/// local time. Runs until the task is dropped.
pub async fn run_daily(state: Arc<AppState>) {
    let hour = state.config.server.refresh_hour;
    let at = NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or_else(|| {
        tracing::warn!(hour, "Invalid refresh hour, using midnight");
        NaiveTime::MIN
    });

    loop {
        let season = season_for(Local::now().date_naive());
        match state.refresh(season).await {
            Ok(outcome) => {
                tracing::info!(season, source = %outcome.source, games = outcome.games.len(), "Scheduled refresh done")
            }
            Err(e) => tracing::error!(season, error = %e, "Scheduled refresh failed"),
        }

        let now = Local::now().naive_local();
        let next = next_run(now, at);
        let wait = Local
            .from_local_datetime(&next)
            .earliest()
            .map(|t| t.signed_duration_since(Local::now()))
            .unwrap_or_else(|| next - now);
        tracing::info!(next = %next, "Next scheduled refresh");
        tokio::time::sleep(wait.to_std().unwrap_or_default()).await;
    }
}

/// The first occurrence of `at` strictly after `now`.
pub fn next_run(now: NaiveDateTime, at: NaiveTime) -> NaiveDateTime {
    let today = now.date().and_time(at);
    if today > now {
        today
    } else {
        today + Duration::days(1)
    }
}
