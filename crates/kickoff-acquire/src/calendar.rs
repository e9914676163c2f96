use chrono::Utc;
use icalendar::{Calendar, Component, Event, EventLike};
use kickoff_model::{CalendarConfig, GameRecord};
use std::fs;
use std::io;
use std::path::Path;

/// Render games as an iCalendar document, one VEVENT per game.
pub fn build_calendar(games: &[GameRecord], config: &CalendarConfig) -> Calendar {
    let mut calendar = Calendar::new();
    calendar.name(&config.name);

    for game in games {
        let mut event = Event::new();
        event
            .uid(&event_uid(game, &config.uid_domain))
            .summary(&game.title)
            .description(&event_description(game))
            .starts(game.start.with_timezone(&Utc))
            .ends(game.end.with_timezone(&Utc));
        if !game.location.is_empty() {
            event.location(&game.location);
        }
        calendar.push(event.done());
    }

    calendar.done()
}

/// Stable per-game identifier, so a refreshed feed updates events in
/// place instead of duplicating them.
pub fn event_uid(game: &GameRecord, domain: &str) -> String {
    format!("{}-{}@{domain}", game.date().format("%Y%m%d"), slug(&game.opponent))
}

pub fn event_description(game: &GameRecord) -> String {
    let mut description = String::new();
    if !game.broadcast.is_empty() {
        description.push_str(&format!("Broadcast on: {}\n", game.broadcast));
    }
    description.push_str(if game.is_home { "Home Game" } else { "Away Game" });
    description
}

fn slug(name: &str) -> String {
    name.to_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Write the calendar for `games` to `path`, replacing any previous file.
///
/// The document goes to a sibling temp file first and is renamed into
/// place, so readers never observe a partial calendar.
pub fn write_calendar(path: &Path, games: &[GameRecord], config: &CalendarConfig) -> io::Result<usize> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let body = build_calendar(games, config).to_string();
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    if let Err(e) = fs::write(&tmp, &body).and_then(|()| fs::rename(&tmp, path)) {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }

    tracing::info!(path = %path.display(), events = games.len(), "Wrote calendar");
    Ok(games.len())
}
