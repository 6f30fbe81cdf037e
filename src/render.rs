//! Terminal rendering for events, notices and errors.

use std::fmt;

use calsh_core::event::{Event, EventTime};
use calsh_core::Notice;
use chrono_tz::Tz;
use owo_colors::OwoColorize;

/// Format an event time in `tz` (e.g. "2025-03-20 15:00" or "2025-03-20" for all-day)
fn format_time(time: &EventTime, tz: Tz) -> String {
    match time {
        EventTime::Date(d) => d.format("%Y-%m-%d").to_string(),
        EventTime::DateTime(dt) => dt.with_timezone(&tz).format("%Y-%m-%d %H:%M").to_string(),
    }
}

/// Summary, with the location in parentheses when there is one.
fn title(event: &Event) -> String {
    match &event.location {
        Some(location) => format!("{} ({})", event.summary, location),
        None => event.summary.clone(),
    }
}

/// One event on one line, unpadded.
pub fn event_row(event: &Event, tz: Tz) -> String {
    format!(
        "{} ~ {}  {}  {}",
        format_time(&event.start, tz),
        format_time(&event.end, tz),
        title(event),
        event.id.dimmed()
    )
}

/// A listing with the start and end columns aligned.
pub fn events(events: &[Event], tz: Tz) -> String {
    if events.is_empty() {
        return format!("{}\n", "No events".dimmed());
    }

    let rows: Vec<(String, String, &Event)> = events
        .iter()
        .map(|e| (format_time(&e.start, tz), format_time(&e.end, tz), e))
        .collect();

    let start_width = rows.iter().map(|(s, _, _)| s.len()).max().unwrap_or(0);
    let end_width = rows.iter().map(|(_, e, _)| e.len()).max().unwrap_or(0);

    let mut out = String::new();
    for (start, end, event) in rows {
        out.push_str(&format!(
            "{:<start_width$} ~ {:<end_width$}  {}  {}\n",
            start,
            end,
            title(event),
            event.id.dimmed()
        ));
    }
    out
}

pub fn header(path: &str) -> String {
    format!("{}:", path).bold().to_string()
}

pub fn notice(notice: &Notice) -> String {
    notice.to_string().yellow().to_string()
}

/// Messages that explain why nothing happened without being failures.
pub fn info(message: impl fmt::Display) -> String {
    message.to_string().yellow().to_string()
}

pub fn error(message: impl fmt::Display) -> String {
    format!("Error: {}", message).red().to_string()
}
