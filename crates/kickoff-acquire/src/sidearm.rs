use crate::fetch::PageFetcher;
use crate::source::{assemble_games, first_non_empty, ScheduleSource, SourceError};
use async_trait::async_trait;
use kickoff_model::{AppConfig, GameRecord};
use kickoff_parse::{detect, extract, FieldRules, StructurePatterns};
use scraper::Html;
use std::sync::Arc;

/// The athletics site's own schedule pages (Sidearm Sports layout, with
/// generic fallbacks for redesigns).
///
/// Each candidate URL is fetched in turn; the page's repeating game rows
/// are located with [`detect`], and every row's fields are pulled with the
/// strategy cascade in [`FieldRules`].
pub struct SidearmSource {
    fetcher: Arc<PageFetcher>,
    config: Arc<AppConfig>,
    patterns: StructurePatterns,
    rules: FieldRules,
}

impl SidearmSource {
    pub fn new(fetcher: Arc<PageFetcher>, config: Arc<AppConfig>) -> Self {
        Self {
            fetcher,
            config,
            patterns: StructurePatterns::default(),
            rules: FieldRules::default(),
        }
    }

    /// Parse one schedule page into accepted games.
    pub fn parse_page(&self, url: &str, html: &str, season: i32) -> Result<Vec<GameRecord>, SourceError> {
        let document = Html::parse_document(html);
        let structure = detect(&document, &self.patterns).map_err(|source| SourceError::Structure {
            url: url.to_string(),
            source,
        })?;
        tracing::info!(
            container = %structure.container_selector,
            rows_selector = %structure.row_selector,
            rows = structure.rows.len(),
            "Found schedule rows"
        );

        let rows = structure
            .rows
            .iter()
            .filter_map(|row| extract(*row, &self.rules))
            .collect();
        Ok(assemble_games(rows, season, &self.config))
    }
}

#[async_trait]
impl ScheduleSource for SidearmSource {
    fn name(&self) -> &str {
        "primary"
    }

    async fn fetch_season(&self, season: i32) -> Result<Vec<GameRecord>, SourceError> {
        let urls = self.config.sources.primary.urls_for(season);
        first_non_empty(&self.fetcher, self.name(), &urls, |url, body| {
            self.parse_page(url, body, season)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};
    use kickoff_model::FetchConfig;

    fn source() -> SidearmSource {
        let config = Arc::new(AppConfig::default());
        let fetcher = Arc::new(PageFetcher::new(&FetchConfig::default()).unwrap());
        SidearmSource::new(fetcher, config)
    }

    fn game_li(class: &str, date: &str, time: &str, vs: &str, opponent: &str, location: &str) -> String {
        format!(
            r#"<li class="sidearm-schedule-game {class}">
                 <div class="sidearm-schedule-game-opponent-date">
                   <span>{date}</span><span>{time}</span>
                 </div>
                 <div class="sidearm-schedule-game-opponent-text">
                   <span class="sidearm-schedule-game-conference-vs"><span>{vs}</span></span>
                   <span class="sidearm-schedule-game-opponent-name"><a href="/opp">{opponent}</a></span>
                 </div>
                 <div class="sidearm-schedule-game-location"><span>{location}</span></div>
               </li>"#
        )
    }

    fn page(items: &[String]) -> String {
        format!(
            r#"<html><body><nav><ul><li>Home</li><li>Tickets</li></ul></nav>
               <div class="sidearm-schedule-games-container"><ul>{}</ul></div></body></html>"#,
            items.concat()
        )
    }

    #[test]
    fn test_parse_sidearm_page() {
        let html = page(&[
            game_li("sidearm-schedule-home-game", "Sep 21 (Sat)", "1:00 PM", "vs", "Holy Cross", "New Haven, Conn."),
            game_li("sidearm-schedule-away-game", "Sep 28 (Sat)", "3:30 PM", "at", "Cornell", "Ithaca, N.Y."),
            game_li("sidearm-schedule-home-game", "Oct 5 (Sat)", "TBA", "vs", "Morgan State", ""),
            game_li("sidearm-schedule-away-game", "Nov 23 (Sat)", "12:00 PM", "at", "Harvard", "Cambridge, Mass."),
        ]);
        let games = source().parse_page("test://schedule", &html, 2024).unwrap();
        assert_eq!(games.len(), 4);

        assert_eq!(games[0].title, "Holy Cross at Yale");
        assert!(games[0].is_home);
        assert_eq!(games[0].start.hour(), 13);

        assert_eq!(games[1].title, "Yale at Cornell");
        assert_eq!(games[1].location, "Ithaca, N.Y.");

        // TBA kickoff and no listed venue
        assert_eq!(games[2].start.hour(), 12);
        assert_eq!(games[2].location, "Yale Bowl, New Haven, CT");

        assert_eq!(games[3].date().month(), 11);
        assert_eq!(games[3].start.offset().local_minus_utc(), -5 * 3600);
    }

    #[test]
    fn test_page_without_schedule_is_structure_error() {
        let html = "<html><body><p>Schedule coming soon</p></body></html>";
        let err = source().parse_page("test://empty", html, 2024).unwrap_err();
        assert!(matches!(err, SourceError::Structure { .. }));
    }

    #[test]
    fn test_bad_rows_are_dropped_not_fatal() {
        let html = page(&[
            game_li("", "Sep 21", "1:00 PM", "vs", "Holy Cross", ""),
            game_li("", "Sep 31", "1:00 PM", "vs", "Nowhere State", ""),
            game_li("", "Oct 5", "1:00 PM", "vs", "TBA", ""),
            game_li("", "Oct 12", "7:00 PM", "at", "Dartmouth", ""),
        ]);
        let games = source().parse_page("test://schedule", &html, 2024).unwrap();
        let opponents: Vec<&str> = games.iter().map(|g| g.opponent.as_str()).collect();
        assert_eq!(opponents, vec!["Holy Cross", "Dartmouth"]);
    }

    async fn serve_locally(app: axum::Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        format!("http://{addr}")
    }

    fn local_source(base: &str, paths: &[&str]) -> SidearmSource {
        let mut config = AppConfig::default();
        config.fetch.request_delay_ms = 0;
        config.sources.primary.urls = paths.iter().map(|p| format!("{base}{p}")).collect();
        let fetcher = Arc::new(PageFetcher::new(&config.fetch).unwrap());
        SidearmSource::new(fetcher, Arc::new(config))
    }

    #[tokio::test]
    async fn test_fetch_season_falls_through_to_working_url() {
        use axum::{http::StatusCode, response::Html, routing::get};

        let schedule = page(&[
            game_li("sidearm-schedule-home-game", "Sep 21 (Sat)", "1:00 PM", "vs", "Holy Cross", ""),
            game_li("sidearm-schedule-away-game", "Sep 28 (Sat)", "3:30 PM", "at", "Cornell", ""),
            game_li("sidearm-schedule-home-game", "Oct 5 (Sat)", "1:00 PM", "vs", "Morgan State", ""),
            game_li("sidearm-schedule-away-game", "Nov 23 (Sat)", "12:00 PM", "at", "Harvard", ""),
        ]);
        let app = axum::Router::new()
            .route("/forbidden", get(|| async { StatusCode::FORBIDDEN }))
            .route(
                "/wall",
                get(|| async { Html("<html><head><title>Attention Required! | Cloudflare</title></head></html>") }),
            )
            .route(
                "/schedule",
                get(move || {
                    let body = schedule.clone();
                    async move { Html(body) }
                }),
            );
        let base = serve_locally(app).await;

        let games = local_source(&base, &["/forbidden", "/wall", "/schedule"])
            .fetch_season(2024)
            .await
            .unwrap();
        let opponents: Vec<&str> = games.iter().map(|g| g.opponent.as_str()).collect();
        assert_eq!(opponents, vec!["Holy Cross", "Cornell", "Morgan State", "Harvard"]);

        let err = local_source(&base, &["/forbidden", "/wall"])
            .fetch_season(2024)
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::NoGames { tried: 2, .. }));
    }
}
