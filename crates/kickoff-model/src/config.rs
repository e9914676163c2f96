//! Configuration for a kickoff deployment.
//!
//! Every field has a default so a bare `AppConfig::default()` describes the
//! Yale football feed. The binary layers a config file and environment
//! variables on top of these defaults.

use chrono::{Datelike, Duration, FixedOffset, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub team: TeamConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub validation: ValidationConfig,
    #[serde(default)]
    pub calendar: CalendarConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

/// The team whose schedule is being published.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamConfig {
    #[serde(default = "default_team_name")]
    pub name: String,
    /// Other spellings of the team's own name that must never be treated as an opponent.
    #[serde(default = "default_team_aliases")]
    pub aliases: Vec<String>,
    #[serde(default = "default_home_venue")]
    pub home_venue: String,
}

fn default_team_name() -> String {
    "Yale".to_string()
}

fn default_team_aliases() -> Vec<String> {
    vec!["Yale Bulldogs".to_string(), "Yale University".to_string()]
}

fn default_home_venue() -> String {
    "Yale Bowl, New Haven, CT".to_string()
}

impl Default for TeamConfig {
    fn default() -> Self {
        Self {
            name: default_team_name(),
            aliases: default_team_aliases(),
            home_venue: default_home_venue(),
        }
    }
}

impl TeamConfig {
    /// Case-insensitive match against the team name and its aliases.
    pub fn is_own_name(&self, candidate: &str) -> bool {
        let candidate = candidate.trim();
        std::iter::once(&self.name)
            .chain(self.aliases.iter())
            .any(|name| name.eq_ignore_ascii_case(candidate))
    }
}

/// Kickoff defaults and the civil-time offset rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Used when a source publishes TBA/TBD or no time at all.
    #[serde(default = "default_kickoff")]
    pub default_kickoff: NaiveTime,
    #[serde(default = "default_game_minutes")]
    pub game_minutes: i64,
    #[serde(default)]
    pub timezone: TimeZoneRule,
}

fn default_kickoff() -> NaiveTime {
    NaiveTime::from_hms_opt(12, 0, 0).unwrap_or(NaiveTime::MIN)
}

fn default_game_minutes() -> i64 {
    210
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            default_kickoff: default_kickoff(),
            game_minutes: default_game_minutes(),
            timezone: TimeZoneRule::default(),
        }
    }
}

impl ScheduleConfig {
    pub fn game_duration(&self) -> Duration {
        Duration::minutes(self.game_minutes)
    }
}

/// Month-range daylight rule. Not a timezone database: the offset is picked
/// purely from the calendar month of the game.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeZoneRule {
    /// Hours east of UTC outside the daylight months (US Eastern: -5).
    #[serde(default = "default_standard_offset")]
    pub standard_offset_hours: i32,
    #[serde(default = "default_daylight_offset")]
    pub daylight_offset_hours: i32,
    /// First month (1-12) using the daylight offset.
    #[serde(default = "default_daylight_first_month")]
    pub daylight_first_month: u32,
    /// Last month (1-12) using the daylight offset, inclusive.
    #[serde(default = "default_daylight_last_month")]
    pub daylight_last_month: u32,
}

fn default_standard_offset() -> i32 {
    -5
}

fn default_daylight_offset() -> i32 {
    -4
}

fn default_daylight_first_month() -> u32 {
    3
}

fn default_daylight_last_month() -> u32 {
    10
}

impl Default for TimeZoneRule {
    fn default() -> Self {
        Self {
            standard_offset_hours: default_standard_offset(),
            daylight_offset_hours: default_daylight_offset(),
            daylight_first_month: default_daylight_first_month(),
            daylight_last_month: default_daylight_last_month(),
        }
    }
}

impl TimeZoneRule {
    /// Offset for a game played in `month`. `None` only if the configured
    /// hours are outside what a UTC offset can express.
    pub fn offset_for_month(&self, month: u32) -> Option<FixedOffset> {
        let hours = if (self.daylight_first_month..=self.daylight_last_month).contains(&month) {
            self.daylight_offset_hours
        } else {
            self.standard_offset_hours
        };
        FixedOffset::east_opt(hours * 3600)
    }
}

/// HTTP fetch behaviour shared by all sources.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Additional request headers sent with every page fetch.
    #[serde(default = "default_headers")]
    pub headers: Vec<(String, String)>,
    /// Pause inserted before every outbound page fetch.
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Phrases in a response body that mean a bot wall was served instead of the page.
    #[serde(default = "default_block_markers")]
    pub block_markers: Vec<String>,
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/124.0.0.0 Safari/537.36"
        .to_string()
}

fn default_headers() -> Vec<(String, String)> {
    [
        ("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
        ("Accept-Language", "en-US,en;q=0.9"),
        ("Cache-Control", "no-cache"),
        ("Upgrade-Insecure-Requests", "1"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

fn default_request_delay_ms() -> u64 {
    1500
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_block_markers() -> Vec<String> {
    [
        "<title>Access Denied</title>",
        "Attention Required! | Cloudflare",
        "Checking your browser before accessing",
        "Request unsuccessful. Incapsula incident",
        "Please enable JS and disable any ad blocker",
        "Pardon Our Interruption",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            headers: default_headers(),
            request_delay_ms: default_request_delay_ms(),
            timeout_secs: default_timeout_secs(),
            block_markers: default_block_markers(),
        }
    }
}

/// Candidate URLs for each source, tried in order. `{season}` is replaced
/// with the season year.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    #[serde(default = "default_primary")]
    pub primary: SourceConfig,
    #[serde(default = "default_backup")]
    pub backup: SourceConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub urls: Vec<String>,
}

fn default_enabled() -> bool {
    true
}

fn default_primary() -> SourceConfig {
    SourceConfig {
        enabled: true,
        urls: vec![
            "https://yalebulldogs.com/sports/football/schedule/{season}".to_string(),
            "https://yalebulldogs.com/sports/football/schedule/{season}?grid=true".to_string(),
            "https://yalebulldogs.com/sports/football/schedule".to_string(),
        ],
    }
}

fn default_backup() -> SourceConfig {
    SourceConfig {
        enabled: true,
        urls: vec![
            "https://www.espn.com/college-football/team/schedule/_/id/43/season/{season}".to_string(),
        ],
    }
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            primary: default_primary(),
            backup: default_backup(),
        }
    }
}

impl SourceConfig {
    /// Candidate URLs with the season substituted in.
    pub fn urls_for(&self, season: i32) -> Vec<String> {
        self.urls
            .iter()
            .map(|u| u.replace("{season}", &season.to_string()))
            .collect()
    }
}

/// Plausibility thresholds for a scraped season.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    #[serde(default = "default_expected_games")]
    pub expected_games: Vec<SeasonExpectation>,
    /// Minimum game count for seasons missing from `expected_games`.
    #[serde(default = "default_min_games")]
    pub min_games: usize,
    /// Unique dates must be at least this share of the game count.
    #[serde(default = "default_min_date_ratio")]
    pub min_unique_date_ratio: f64,
    /// Month/day the legacy parsers used when a date could not be read.
    #[serde(default = "default_fallback_month_day")]
    pub fallback_month_day: (u32, u32),
    /// Months (1-12) in which games are normally played.
    #[serde(default = "default_season_months")]
    pub season_months: Vec<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeasonExpectation {
    pub season: i32,
    pub games: usize,
}

fn default_expected_games() -> Vec<SeasonExpectation> {
    (2022..=2026)
        .map(|season| SeasonExpectation { season, games: 10 })
        .collect()
}

fn default_min_games() -> usize {
    8
}

fn default_min_date_ratio() -> f64 {
    0.8
}

fn default_fallback_month_day() -> (u32, u32) {
    (9, 1)
}

fn default_season_months() -> Vec<u32> {
    vec![8, 9, 10, 11, 12, 1]
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            expected_games: default_expected_games(),
            min_games: default_min_games(),
            min_unique_date_ratio: default_min_date_ratio(),
            fallback_month_day: default_fallback_month_day(),
            season_months: default_season_months(),
        }
    }
}

impl ValidationConfig {
    /// Expected number of games for `season`, or the generic minimum.
    pub fn expected_for(&self, season: i32) -> usize {
        self.expected_games
            .iter()
            .find(|e| e.season == season)
            .map(|e| e.games)
            .unwrap_or(self.min_games)
    }

    /// The synthetic date a legacy parser would have produced for `season`.
    pub fn fallback_date(&self, season: i32) -> Option<NaiveDate> {
        let (month, day) = self.fallback_month_day;
        NaiveDate::from_ymd_opt(season, month, day)
    }
}

/// Where the calendar artifact lives and what it is called.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarConfig {
    #[serde(default = "default_calendar_path")]
    pub path: String,
    #[serde(default = "default_calendar_name")]
    pub name: String,
    /// Domain part of generated event UIDs.
    #[serde(default = "default_uid_domain")]
    pub uid_domain: String,
}

fn default_calendar_path() -> String {
    "yale_football.ics".to_string()
}

fn default_calendar_name() -> String {
    "Yale Football".to_string()
}

fn default_uid_domain() -> String {
    "kickoff".to_string()
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            path: default_calendar_path(),
            name: default_calendar_name(),
            uid_domain: default_uid_domain(),
        }
    }
}

/// HTTP serving layer and refresh trigger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Local hour (0-23) of the daily refresh.
    #[serde(default = "default_refresh_hour")]
    pub refresh_hour: u32,
    /// Oldest season the manual refresh endpoint accepts.
    #[serde(default = "default_min_season")]
    pub min_season: i32,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_refresh_hour() -> u32 {
    3
}

fn default_min_season() -> i32 {
    2000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            refresh_hour: default_refresh_hour(),
            min_season: default_min_season(),
        }
    }
}

/// Season a date belongs to. January games close out the previous season.
pub fn season_for(date: NaiveDate) -> i32 {
    if date.month() == 1 {
        date.year() - 1
    } else {
        date.year()
    }
}
