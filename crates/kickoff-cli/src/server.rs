//! HTTP layer in front of the calendar artifact.

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{Local, NaiveDate};
use html_escape::encode_safe;
use kickoff_acquire::{Orchestrator, RefreshError, RefreshOutcome};
use kickoff_model::{season_for, AppConfig, GameRecord};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tower_http::trace::TraceLayer;

/// Shared by every handler and the daily trigger.
pub struct AppState {
    pub config: Arc<AppConfig>,
    /// Held for the whole refresh, so at most one runs at a time.
    pub orchestrator: Mutex<Orchestrator>,
    /// Games from the last successful refresh, for the debug view.
    pub last_games: RwLock<Vec<GameRecord>>,
}

impl AppState {
    pub fn new(config: Arc<AppConfig>, orchestrator: Orchestrator) -> Self {
        Self {
            config,
            orchestrator: Mutex::new(orchestrator),
            last_games: RwLock::new(Vec::new()),
        }
    }

    /// Run one refresh and remember its games on success.
    pub async fn refresh(&self, season: i32) -> Result<RefreshOutcome, RefreshError> {
        let orchestrator = self.orchestrator.lock().await;
        let outcome = orchestrator.try_refresh(season).await?;
        *self.last_games.write().await = outcome.games.clone();
        Ok(outcome)
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/calendar.ics", get(calendar))
        .route("/debug", get(debug))
        .route("/refresh/:season", get(refresh))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse {
            error: self.status.to_string(),
            message: self.message,
        });
        (self.status, body).into_response()
    }
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub season: i32,
    pub games: usize,
    pub source: String,
}

async fn index(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Html<String> {
    let host = headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("localhost");
    let name = encode_safe(&state.config.calendar.name);
    let host = encode_safe(host);

    Html(format!(
        "<!DOCTYPE html>\n<html><head><title>{name}</title></head><body>\n\
         <h1>{name}</h1>\n\
         <p>Subscribe in your calendar app: <code>webcal://{host}/calendar.ics</code></p>\n\
         <p><a href=\"/calendar.ics\">Download the calendar</a> · <a href=\"/debug\">Scraped games</a></p>\n\
         </body></html>\n"
    ))
}

async fn calendar(State(state): State<Arc<AppState>>) -> Response {
    match tokio::fs::read_to_string(&state.config.calendar.path).await {
        Ok(body) => ([(header::CONTENT_TYPE, "text/calendar; charset=utf-8")], body).into_response(),
        Err(e) => {
            tracing::warn!(path = %state.config.calendar.path, error = %e, "Calendar requested before it exists");
            (StatusCode::SERVICE_UNAVAILABLE, "Calendar not available").into_response()
        }
    }
}

async fn debug(State(state): State<Arc<AppState>>) -> Html<String> {
    let games = state.last_games.read().await;
    Html(debug_table(&games))
}

async fn refresh(
    State(state): State<Arc<AppState>>,
    Path(season): Path<i32>,
) -> Result<Json<RefreshResponse>, ApiError> {
    let today = Local::now().date_naive();
    check_season(season, state.config.server.min_season, today)
        .map_err(|msg| ApiError::new(StatusCode::BAD_REQUEST, msg))?;

    tracing::info!(season, "Manual refresh requested");
    let outcome = state
        .refresh(season)
        .await
        .map_err(|e| ApiError::new(StatusCode::BAD_GATEWAY, e.to_string()))?;

    Ok(Json(RefreshResponse {
        season,
        games: outcome.games.len(),
        source: outcome.source,
    }))
}

/// Seasons from `min_season` through next season are accepted.
fn check_season(season: i32, min_season: i32, today: NaiveDate) -> Result<(), String> {
    let max_season = season_for(today) + 1;
    if season < min_season || season > max_season {
        return Err(format!("season must be between {min_season} and {max_season}, got {season}"));
    }
    Ok(())
}

fn debug_table(games: &[GameRecord]) -> String {
    let mut html = String::from(
        "<!DOCTYPE html>\n<html><head><title>Scraped games</title></head><body>\n<table border=\"1\">\n\
         <tr><th>Game</th><th>Date</th><th>Time</th><th>Location</th><th>Broadcast</th></tr>\n",
    );
    for g in games {
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            encode_safe(&g.title),
            encode_safe(&g.date_str),
            encode_safe(&g.time_str),
            encode_safe(&g.location),
            encode_safe(&g.broadcast),
        ));
    }
    if games.is_empty() {
        html.push_str("<tr><td colspan=\"5\">No successful refresh yet</td></tr>\n");
    }
    html.push_str("</table>\n</body></html>\n");
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, FixedOffset, TimeZone};
    use kickoff_model::{RawGameFields, TeamConfig};

    fn state(calendar_path: &str) -> Arc<AppState> {
        let mut config = AppConfig::default();
        config.calendar.path = calendar_path.to_string();
        let config = Arc::new(config);
        let orchestrator = Orchestrator::new(config.clone(), Vec::new());
        Arc::new(AppState::new(config, orchestrator))
    }

    #[test]
    fn test_check_season_bounds() {
        let today = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();
        assert!(check_season(2024, 2000, today).is_ok());
        assert!(check_season(2025, 2000, today).is_ok());
        assert!(check_season(2026, 2000, today).is_err());
        assert!(check_season(1999, 2000, today).is_err());
    }

    #[test]
    fn test_debug_table_escapes_text() {
        let start = FixedOffset::west_opt(4 * 3600)
            .unwrap()
            .with_ymd_and_hms(2024, 10, 12, 19, 0, 0)
            .unwrap();
        let raw = RawGameFields {
            date_text: "Sat, Oct 12".to_string(),
            time_text: Some("7:00 PM".to_string()),
            opponent: "William & Mary".to_string(),
            is_home: false,
            location: Some("Williamsburg, Va.".to_string()),
            broadcast: Some("FloSports <\"The Game\">".to_string()),
        };
        let game = GameRecord::assemble(&TeamConfig::default(), raw, start, Duration::minutes(210));
        let html = debug_table(&[game]);
        assert!(html.contains("<td>Yale at William &amp; Mary</td>"));
        assert!(html.contains("<td>Sat, Oct 12</td><td>7:00 PM</td>"));
        assert!(html.contains("<td>FloSports &lt;&quot;The Game&quot;&gt;</td>"));
    }

    #[tokio::test]
    async fn test_calendar_missing_is_unavailable() {
        let path = std::env::temp_dir().join("kickoff-server-missing/none.ics");
        let response = calendar(State(state(&path.to_string_lossy()))).await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_calendar_served_with_mime_type() {
        let dir = std::env::temp_dir().join(format!("kickoff-server-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("feed.ics");
        std::fs::write(&path, "BEGIN:VCALENDAR\r\nEND:VCALENDAR\r\n").unwrap();

        let response = calendar(State(state(&path.to_string_lossy()))).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/calendar; charset=utf-8"
        );
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn test_refresh_rejects_out_of_range_season() {
        let result = refresh(State(state("unused.ics")), Path(1850)).await;
        assert_eq!(result.unwrap_err().status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_refresh_without_sources_is_bad_gateway() {
        let season = season_for(Local::now().date_naive());
        let result = refresh(State(state("unused.ics")), Path(season)).await;
        assert_eq!(result.unwrap_err().status, StatusCode::BAD_GATEWAY);
    }
}
