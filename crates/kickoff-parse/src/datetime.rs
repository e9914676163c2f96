// Date/time normalization for schedule text.
//
// Turns fragments like "Sat, Sep 20" / "9/21/24" and "1:00 PM" / "TBA" into
// an absolute kickoff timestamp. A date that cannot be resolved is an error;
// callers drop the row instead of guessing.

use chrono::{DateTime, FixedOffset, Month, NaiveDate, NaiveTime, TimeZone};
use kickoff_model::ScheduleConfig;
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateParseError {
    #[error("unrecognised date text '{0}'")]
    UnrecognizedDate(String),

    #[error("unknown month name '{0}'")]
    UnknownMonth(String),

    #[error("no such calendar date {year}-{month:02}-{day:02}")]
    InvalidDate { year: i32, month: u32, day: u32 },

    #[error("unrecognised time text '{0}'")]
    UnrecognizedTime(String),

    #[error("time {hour}:{minute:02} is out of range")]
    TimeOutOfRange { hour: u32, minute: u32 },

    #[error("no civil offset configured for month {0}")]
    NoOffset(u32),
}

static SLASH_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{1,2})/(\d{1,2})(?:/(\d{4}|\d{2}))?\b").expect("valid regex")
});

/// `2024-10-19`, or the date part of `2024-10-19T13:00` with the clock
/// time captured.
static ISO_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{4})-(\d{1,2})-(\d{1,2})(?:T(\d{1,2}):(\d{2})|\b)").expect("valid regex")
});

static MERIDIEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|[^A-Z])([AP])\.?M(?:[^A-Z]|$)").expect("valid regex"));

static WEEKDAY_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:mon|tue|wed|thu|fri|sat|sun)[a-z]*\.?(?:,\s*|\s+)").expect("valid regex")
});

static MONTH_DAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*([a-z]{3,9})\.?\s+(\d{1,2})(?:st|nd|rd|th)?\b(?:,?\s+(\d{4})\b)?")
        .expect("valid regex")
});

static TIME_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,4})(?::(\d{1,2}))?").expect("valid regex"));

/// A date rule returns `None` when its pattern does not apply, so the next
/// rule gets a turn. Once a rule matches, its result is final.
type DateRule = fn(&str, i32) -> Option<Result<NaiveDate, DateParseError>>;

/// Resolution order: first matching rule wins.
const DATE_RULES: &[(&str, DateRule)] = &[
    ("slash", slash_date),
    ("iso", iso_date),
    ("weekday-month-day", weekday_month_day),
    ("month-day", month_day),
];

/// Resolve date and time fragments into a kickoff timestamp.
///
/// `season` is the year the season started in; it supplies the year when
/// the date text has none (see [`infer_year`]).
pub fn normalize(
    date_text: &str,
    time_text: Option<&str>,
    season: i32,
    schedule: &ScheduleConfig,
) -> Result<DateTime<FixedOffset>, DateParseError> {
    let date = resolve_date(date_text, season)?;
    // An ISO timestamp carries its own 24-hour kickoff.
    let time = match (time_text, iso_clock_time(date_text)) {
        (None, Some(time)) => time,
        _ => resolve_time(time_text, schedule.default_kickoff)?,
    };

    let month = chrono::Datelike::month(&date);
    let offset = schedule
        .timezone
        .offset_for_month(month)
        .ok_or(DateParseError::NoOffset(month))?;

    offset
        .from_local_datetime(&date.and_time(time))
        .single()
        .ok_or_else(|| DateParseError::UnrecognizedDate(date_text.to_string()))
}

/// Resolve a date fragment, trying each rule in order.
pub fn resolve_date(date_text: &str, season: i32) -> Result<NaiveDate, DateParseError> {
    let text = date_text.trim();
    for (name, rule) in DATE_RULES {
        if let Some(result) = rule(text, season) {
            tracing::trace!(rule = name, text = %text, ok = result.is_ok(), "Date rule matched");
            return result;
        }
    }
    Err(DateParseError::UnrecognizedDate(text.to_string()))
}

/// Year for a date published without one. August–December belong to the
/// season's own year; January–July (bowl games, spring games) to the next.
pub fn infer_year(month: u32, season: i32) -> i32 {
    if (8..=12).contains(&month) {
        season
    } else {
        season + 1
    }
}

/// Clock time embedded in an ISO timestamp such as `2024-10-19T13:00`.
pub fn iso_clock_time(date_text: &str) -> Option<NaiveTime> {
    let caps = ISO_DATE.captures(date_text)?;
    let hour: u32 = caps.get(4)?.as_str().parse().ok()?;
    let minute: u32 = caps.get(5)?.as_str().parse().ok()?;
    NaiveTime::from_hms_opt(hour, minute, 0)
}

/// Two-digit years pivot at 50: `99` → 1999, `24` → 2024.
fn expand_two_digit_year(yy: i32) -> i32 {
    if yy > 50 {
        1900 + yy
    } else {
        2000 + yy
    }
}

fn build_date(year: i32, month: u32, day: u32) -> Result<NaiveDate, DateParseError> {
    NaiveDate::from_ymd_opt(year, month, day).ok_or(DateParseError::InvalidDate { year, month, day })
}

fn slash_date(text: &str, season: i32) -> Option<Result<NaiveDate, DateParseError>> {
    let caps = SLASH_DATE.captures(text)?;
    let month: u32 = caps[1].parse().ok()?;
    let day: u32 = caps[2].parse().ok()?;
    let year = match caps.get(3) {
        Some(y) if y.as_str().len() == 2 => expand_two_digit_year(y.as_str().parse().ok()?),
        Some(y) => y.as_str().parse().ok()?,
        None => infer_year(month, season),
    };
    Some(build_date(year, month, day))
}

fn iso_date(text: &str, _season: i32) -> Option<Result<NaiveDate, DateParseError>> {
    let caps = ISO_DATE.captures(text)?;
    let year: i32 = caps[1].parse().ok()?;
    let month: u32 = caps[2].parse().ok()?;
    let day: u32 = caps[3].parse().ok()?;
    Some(build_date(year, month, day))
}

fn weekday_month_day(text: &str, season: i32) -> Option<Result<NaiveDate, DateParseError>> {
    let prefix = WEEKDAY_PREFIX.find(text)?;
    let rest = &text[prefix.end()..];
    // A weekday with nothing date-like after it is still a weekday-prefixed
    // date; report it rather than letting a later rule guess.
    Some(month_day(rest, season).unwrap_or_else(|| Err(DateParseError::UnrecognizedDate(text.to_string()))))
}

fn month_day(text: &str, season: i32) -> Option<Result<NaiveDate, DateParseError>> {
    let caps = MONTH_DAY.captures(text)?;
    let name = &caps[1];
    let Some(month) = parse_month(name) else {
        return Some(Err(DateParseError::UnknownMonth(name.to_string())));
    };
    let day: u32 = caps[2].parse().ok()?;
    let year = match caps.get(3) {
        Some(y) => y.as_str().parse().ok()?,
        None => infer_year(month, season),
    };
    Some(build_date(year, month, day))
}

/// Month number from a full or abbreviated English name ("Sep", "Sept.", "September").
fn parse_month(name: &str) -> Option<u32> {
    let name = name.trim_end_matches('.');
    if let Ok(month) = name.parse::<Month>() {
        return Some(month.number_from_month());
    }
    // "Sept" and similar four-letter forms
    let prefix: String = name.chars().take(3).collect();
    if prefix.len() < 3 || !name.to_lowercase().starts_with(&prefix.to_lowercase()) {
        return None;
    }
    let month = prefix.parse::<Month>().ok()?;
    let full = format!("{month:?}").to_lowercase();
    full.starts_with(&name.to_lowercase()).then(|| month.number_from_month())
}

/// Resolve a time fragment. TBA/TBD/empty, and text without any digits,
/// fall back to `default_kickoff`.
pub fn resolve_time(time_text: Option<&str>, default_kickoff: NaiveTime) -> Result<NaiveTime, DateParseError> {
    let raw = time_text.unwrap_or("").trim();
    let upper = raw.to_uppercase();

    if upper.is_empty() || upper.contains("TBA") || upper.contains("TBD") {
        return Ok(default_kickoff);
    }
    if upper.contains("NOON") {
        return NaiveTime::from_hms_opt(12, 0, 0).ok_or_else(|| DateParseError::UnrecognizedTime(raw.to_string()));
    }

    let marker = MERIDIEM.captures(&upper).map(|caps| caps[1].to_string());
    let is_pm = marker.as_deref() == Some("P");
    let is_am = marker.as_deref() == Some("A");

    let Some(caps) = TIME_TOKEN.captures(&upper) else {
        tracing::debug!(text = %raw, "Time text has no digits, using default kickoff");
        return Ok(default_kickoff);
    };

    let digits = &caps[1];
    let (mut hour, minute): (u32, u32) = match caps.get(2) {
        Some(m) => (
            digits.parse().map_err(|_| DateParseError::UnrecognizedTime(raw.to_string()))?,
            m.as_str().parse().map_err(|_| DateParseError::UnrecognizedTime(raw.to_string()))?,
        ),
        None if digits.len() <= 2 => (
            digits.parse().map_err(|_| DateParseError::UnrecognizedTime(raw.to_string()))?,
            0,
        ),
        None => {
            let hhmm: u32 = digits.parse().map_err(|_| DateParseError::UnrecognizedTime(raw.to_string()))?;
            (hhmm / 100, hhmm % 100)
        }
    };

    if is_pm && hour < 12 {
        hour += 12;
    } else if is_am && hour == 12 {
        hour = 0;
    } else if !is_pm && !is_am && hour < 8 {
        // Kickoffs written without a marker are afternoon/evening games.
        hour += 12;
    }

    if hour > 23 || minute > 59 {
        return Err(DateParseError::TimeOutOfRange { hour, minute });
    }
    NaiveTime::from_hms_opt(hour, minute, 0).ok_or(DateParseError::TimeOutOfRange { hour, minute })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    fn schedule() -> ScheduleConfig {
        ScheduleConfig::default()
    }

    fn noon() -> NaiveTime {
        NaiveTime::from_hms_opt(12, 0, 0).unwrap()
    }

    #[test]
    fn test_slash_date_with_two_digit_year() {
        let ts = normalize("09/21/24", Some("1:00 PM"), 2024, &schedule()).unwrap();
        assert_eq!((ts.year(), ts.month(), ts.day(), ts.hour()), (2024, 9, 21, 13));
        assert_eq!(ts.offset().local_minus_utc(), -4 * 3600);
    }

    #[test]
    fn test_month_name_with_year_and_tba() {
        let ts = normalize("Sep 21, 2024", Some("TBA"), 2024, &schedule()).unwrap();
        assert_eq!((ts.year(), ts.month(), ts.day()), (2024, 9, 21));
        assert_eq!((ts.hour(), ts.minute()), (12, 0));
    }

    #[test]
    fn test_spring_game_rolls_to_next_year() {
        let ts = normalize("Apr 15", None, 2024, &schedule()).unwrap();
        assert_eq!((ts.year(), ts.month(), ts.day()), (2025, 4, 15));
    }

    #[test]
    fn test_weekday_prefixed_forms() {
        assert_eq!(resolve_date("Sat, Sep 20", 2025).unwrap(), NaiveDate::from_ymd_opt(2025, 9, 20).unwrap());
        assert_eq!(
            resolve_date("Saturday September 20", 2025).unwrap(),
            NaiveDate::from_ymd_opt(2025, 9, 20).unwrap()
        );
        assert_eq!(resolve_date("Fri. Nov 1st", 2024).unwrap(), NaiveDate::from_ymd_opt(2024, 11, 1).unwrap());
    }

    #[test]
    fn test_bare_month_day_variants() {
        assert_eq!(resolve_date("Sept. 28", 2024).unwrap(), NaiveDate::from_ymd_opt(2024, 9, 28).unwrap());
        assert_eq!(resolve_date("Nov 23 (Sat)", 2024).unwrap(), NaiveDate::from_ymd_opt(2024, 11, 23).unwrap());
        assert_eq!(resolve_date("Jan 4", 2024).unwrap(), NaiveDate::from_ymd_opt(2025, 1, 4).unwrap());
    }

    #[test]
    fn test_slash_without_year_infers_from_season() {
        assert_eq!(resolve_date("Sat 9/21", 2024).unwrap(), NaiveDate::from_ymd_opt(2024, 9, 21).unwrap());
        assert_eq!(resolve_date("1/2", 2024).unwrap(), NaiveDate::from_ymd_opt(2025, 1, 2).unwrap());
        assert_eq!(resolve_date("10/5/1999", 2024).unwrap(), NaiveDate::from_ymd_opt(1999, 10, 5).unwrap());
        assert_eq!(resolve_date("10/5/99", 2024).unwrap(), NaiveDate::from_ymd_opt(1999, 10, 5).unwrap());
    }

    #[test]
    fn test_iso_year_overrides_season() {
        assert_eq!(resolve_date("2023-11-18", 2024).unwrap(), NaiveDate::from_ymd_opt(2023, 11, 18).unwrap());
    }

    #[test]
    fn test_unresolvable_dates_are_errors() {
        assert!(matches!(resolve_date("TBA", 2024), Err(DateParseError::UnrecognizedDate(_))));
        assert!(matches!(resolve_date("", 2024), Err(DateParseError::UnrecognizedDate(_))));
        assert!(matches!(resolve_date("Foo 12", 2024), Err(DateParseError::UnknownMonth(_))));
        assert!(matches!(resolve_date("Sat, TBA", 2024), Err(DateParseError::UnrecognizedDate(_))));
        assert_eq!(
            resolve_date("Sep 31", 2024),
            Err(DateParseError::InvalidDate { year: 2024, month: 9, day: 31 })
        );
        assert!(matches!(resolve_date("2/30/24", 2024), Err(DateParseError::InvalidDate { .. })));
    }

    #[test]
    fn test_inferred_year_is_season_or_next() {
        let names = ["Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec"];
        for season in [1999, 2024, 2031] {
            for (i, name) in names.iter().enumerate() {
                let month = i as u32 + 1;
                for text in [format!("{name} 10"), format!("{month}/10"), format!("Sat, {name} 10")] {
                    let date = resolve_date(&text, season).unwrap();
                    let expected = if month >= 8 { season } else { season + 1 };
                    assert_eq!(date.year(), expected, "{text} in season {season}");
                }
            }
        }
    }

    #[test]
    fn test_unspecified_times_use_default() {
        let default = NaiveTime::from_hms_opt(13, 0, 0).unwrap();
        for text in [Some("TBA"), Some("TBD"), Some(""), Some("  tba "), None] {
            assert_eq!(resolve_time(text, default).unwrap(), default, "{text:?}");
        }
        assert_eq!(resolve_time(Some("Final"), default).unwrap(), default);
    }

    #[test]
    fn test_twelve_hour_conversion() {
        let t = |s: &str| resolve_time(Some(s), noon()).unwrap();
        assert_eq!(t("1:00 PM"), NaiveTime::from_hms_opt(13, 0, 0).unwrap());
        assert_eq!(t("12:30 PM"), NaiveTime::from_hms_opt(12, 30, 0).unwrap());
        assert_eq!(t("12:00 AM"), NaiveTime::from_hms_opt(0, 0, 0).unwrap());
        assert_eq!(t("11 a.m. ET"), NaiveTime::from_hms_opt(11, 0, 0).unwrap());
        assert_eq!(t("7 PM"), NaiveTime::from_hms_opt(19, 0, 0).unwrap());
        assert_eq!(t("Noon"), NaiveTime::from_hms_opt(12, 0, 0).unwrap());
    }

    #[test]
    fn test_small_hour_without_marker_is_pm() {
        let t = |s: &str| resolve_time(Some(s), noon()).unwrap();
        assert_eq!(t("7:00"), NaiveTime::from_hms_opt(19, 0, 0).unwrap());
        assert_eq!(t("1"), NaiveTime::from_hms_opt(13, 0, 0).unwrap());
        assert_eq!(t("11:30"), NaiveTime::from_hms_opt(11, 30, 0).unwrap());
        assert_eq!(t("1330"), NaiveTime::from_hms_opt(13, 30, 0).unwrap());
    }

    #[test]
    fn test_out_of_range_time_is_error() {
        assert_eq!(
            resolve_time(Some("25:00"), noon()),
            Err(DateParseError::TimeOutOfRange { hour: 25, minute: 0 })
        );
        assert!(matches!(resolve_time(Some("10:75 PM"), noon()), Err(DateParseError::TimeOutOfRange { .. })));
    }

    #[test]
    fn test_november_uses_standard_offset() {
        let ts = normalize("Nov 23", Some("12:00 PM"), 2024, &schedule()).unwrap();
        assert_eq!(ts.offset().local_minus_utc(), -5 * 3600);
        assert_eq!(ts.naive_utc().hour(), 17);
    }

    #[test]
    fn test_meridiem_must_be_a_standalone_marker() {
        let t = |s: &str| resolve_time(Some(s), noon()).unwrap();
        assert_eq!(t("1:00 Homecoming Game"), NaiveTime::from_hms_opt(13, 0, 0).unwrap());
        assert_eq!(t("3:30 ESPN/Amazon"), NaiveTime::from_hms_opt(15, 30, 0).unwrap());
        assert_eq!(t("1:00PM"), NaiveTime::from_hms_opt(13, 0, 0).unwrap());
        assert_eq!(t("11:00 a.m."), NaiveTime::from_hms_opt(11, 0, 0).unwrap());
        assert_eq!(t("12:00 AM"), NaiveTime::from_hms_opt(0, 0, 0).unwrap());
        assert_eq!(t("7:00 p.m. ET"), NaiveTime::from_hms_opt(19, 0, 0).unwrap());
    }

    #[test]
    fn test_iso_timestamp_supplies_date_and_time() {
        let ts = normalize("2024-10-19T13:00", None, 2024, &schedule()).unwrap();
        assert_eq!(ts.date_naive(), NaiveDate::from_ymd_opt(2024, 10, 19).unwrap());
        assert_eq!(ts.hour(), 13);

        // an explicit time fragment still wins
        let ts = normalize("2024-10-19T13:00", Some("7:00 PM"), 2024, &schedule()).unwrap();
        assert_eq!(ts.hour(), 19);

        assert_eq!(iso_clock_time("2024-10-19"), None);
        assert_eq!(iso_clock_time("2024-10-19T09:05:00Z"), NaiveTime::from_hms_opt(9, 5, 0));
    }
}
