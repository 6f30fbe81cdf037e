//! Provider-neutral event types.
//!
//! Providers convert their API responses into these types, and the shell
//! works exclusively with them for listing and display.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::date_range::{to_utc, DateRange};
use crate::time_span::TimeSpan;

/// A calendar event (provider-neutral)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub summary: String,
    #[serde(default)]
    pub location: Option<String>,
    pub start: EventTime,
    pub end: EventTime,
    pub status: EventStatus,
}

impl Event {
    /// Whether any part of the event falls inside `range`. All-day dates are
    /// read in `tz`.
    pub fn overlaps(&self, range: &DateRange, tz: Tz) -> bool {
        let start = self.start.instant(tz);
        let end = self.end.instant(tz);
        range.contains(start) || (start < range.from && end > range.from)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EventTime {
    DateTime(DateTime<Utc>),
    Date(NaiveDate),
}

impl EventTime {
    /// The instant this time starts at, with all-day dates starting at
    /// midnight in `tz`.
    pub fn instant(&self, tz: Tz) -> DateTime<Utc> {
        match self {
            EventTime::DateTime(dt) => *dt,
            EventTime::Date(d) => to_utc(d.and_time(chrono::NaiveTime::MIN), tz),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EventStatus {
    Confirmed,
    Tentative,
    Cancelled,
}

/// What `add` asks a provider to create. The provider assigns the id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEvent {
    pub summary: String,
    pub start: EventTime,
    pub end: EventTime,
}

impl NewEvent {
    /// A timed event for `span` on `date`, or an all-day event without one.
    pub fn on_date(summary: impl Into<String>, date: NaiveDate, span: Option<TimeSpan>, tz: Tz) -> Self {
        let (start, end) = match span {
            Some(span) => span.on(date, tz),
            None => (EventTime::Date(date), EventTime::Date(date + Duration::days(1))),
        };

        NewEvent {
            summary: summary.into(),
            start,
            end,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn event(start: EventTime, end: EventTime) -> Event {
        Event {
            id: "abc".into(),
            summary: "Standup".into(),
            location: None,
            start,
            end,
            status: EventStatus::Confirmed,
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    #[test]
    fn all_day_new_event_spans_one_day() {
        let new = NewEvent::on_date("Holiday", day(3), None, Tz::UTC);
        assert_eq!(new.start, EventTime::Date(day(3)));
        assert_eq!(new.end, EventTime::Date(day(4)));
    }

    #[test]
    fn timed_new_event_uses_span() {
        let span: TimeSpan = "10:00-10:30".parse().unwrap();
        let new = NewEvent::on_date("Call", day(3), Some(span), Tz::UTC);
        assert_eq!(new.start, EventTime::DateTime(Utc.with_ymd_and_hms(2024, 5, 3, 10, 0, 0).unwrap()));
        assert_eq!(new.end, EventTime::DateTime(Utc.with_ymd_and_hms(2024, 5, 3, 10, 30, 0).unwrap()));
    }

    #[test]
    fn overlap_with_range() {
        let range = DateRange {
            from: Utc.with_ymd_and_hms(2024, 5, 3, 0, 0, 0).unwrap(),
            to: Utc.with_ymd_and_hms(2024, 5, 4, 0, 0, 0).unwrap(),
        };

        assert!(event(EventTime::Date(day(3)), EventTime::Date(day(4))).overlaps(&range, Tz::UTC));
        assert!(!event(EventTime::Date(day(4)), EventTime::Date(day(5))).overlaps(&range, Tz::UTC));
        assert!(!event(EventTime::Date(day(2)), EventTime::Date(day(3))).overlaps(&range, Tz::UTC));

        let spanning = event(
            EventTime::DateTime(Utc.with_ymd_and_hms(2024, 5, 2, 23, 0, 0).unwrap()),
            EventTime::DateTime(Utc.with_ymd_and_hms(2024, 5, 3, 1, 0, 0).unwrap()),
        );
        assert!(spanning.overlaps(&range, Tz::UTC));
    }

    #[test]
    fn all_day_overlap_is_read_in_timezone() {
        let tokyo = chrono_tz::Asia::Tokyo;
        let triple = crate::context::ResolvedTriple::full("2024", "05", "03");
        let range = DateRange::for_triple(&triple, tokyo).unwrap();

        assert!(event(EventTime::Date(day(3)), EventTime::Date(day(4))).overlaps(&range, tokyo));
        assert!(!event(EventTime::Date(day(2)), EventTime::Date(day(3))).overlaps(&range, tokyo));
    }

    #[test]
    fn serializes_like_the_protocol_expects() {
        let json = serde_json::to_value(EventTime::Date(day(3))).unwrap();
        assert_eq!(json, serde_json::json!({ "Date": "2024-05-03" }));
    }
}
