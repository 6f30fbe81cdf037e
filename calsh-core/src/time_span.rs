//! `HH:MM-HH:MM` spans used by `add`.

use std::str::FromStr;

use chrono::{NaiveDate, NaiveTime};
use chrono_tz::Tz;

use crate::date_range::to_utc;
use crate::error::{CalshError, CalshResult};
use crate::event::EventTime;

/// A same-day wall-clock span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSpan {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeSpan {
    /// Whether `input` looks like a span rather than a word of the summary.
    pub fn looks_like(input: &str) -> bool {
        input.contains(':') && input.contains('-') && input.bytes().all(|b| b.is_ascii_digit() || b == b':' || b == b'-')
    }

    /// Anchor the span to `date` in `tz`.
    pub fn on(&self, date: NaiveDate, tz: Tz) -> (EventTime, EventTime) {
        (
            EventTime::DateTime(to_utc(date.and_time(self.start), tz)),
            EventTime::DateTime(to_utc(date.and_time(self.end), tz)),
        )
    }
}

impl FromStr for TimeSpan {
    type Err = CalshError;

    fn from_str(input: &str) -> CalshResult<Self> {
        let invalid = |reason: &str| CalshError::InvalidTimeSpan {
            input: input.to_string(),
            reason: reason.to_string(),
        };

        let (start, end) = input.split_once('-').ok_or_else(|| invalid("expected HH:MM-HH:MM"))?;

        let start = NaiveTime::parse_from_str(start, "%H:%M").map_err(|_| invalid("bad start time"))?;
        let end = NaiveTime::parse_from_str(end, "%H:%M").map_err(|_| invalid("bad end time"))?;

        if end <= start {
            return Err(invalid("end must be after start"));
        }

        Ok(TimeSpan { start, end })
    }
}
