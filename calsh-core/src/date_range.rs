//! Date range for listing events.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::context::ResolvedTriple;
use crate::error::{CalshError, CalshResult};

/// Half-open `[from, to)` window in UTC.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateRange {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl DateRange {
    /// The window a triple addresses: a whole year, month or day in `tz`.
    ///
    /// This is where calendar validity is checked: `2023/02/30` resolves as a
    /// path but has no range.
    pub fn for_triple(triple: &ResolvedTriple, tz: Tz) -> CalshResult<Self> {
        let invalid = || CalshError::InvalidDate(triple.to_string());

        let year: i32 = triple.year().ok_or(CalshError::NoYear)?.parse().map_err(|_| invalid())?;

        let (start, end) = match (triple.month(), triple.day()) {
            (None, _) => {
                let start = NaiveDate::from_ymd_opt(year, 1, 1).ok_or_else(invalid)?;
                let end = year
                    .checked_add(1)
                    .and_then(|next| NaiveDate::from_ymd_opt(next, 1, 1))
                    .ok_or_else(invalid)?;
                (start, end)
            }
            (Some(month), None) => {
                let month: u32 = month.parse().map_err(|_| invalid())?;
                let start = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
                let end = first_of_next_month(start).ok_or_else(invalid)?;
                (start, end)
            }
            (Some(_), Some(_)) => {
                let start = date_of(triple)?;
                (start, start + Duration::days(1))
            }
        };

        Ok(DateRange {
            from: local_midnight(start, tz),
            to: local_midnight(end, tz),
        })
    }

    pub fn from_rfc3339(&self) -> String {
        self.from.to_rfc3339()
    }

    pub fn to_rfc3339(&self) -> String {
        self.to.to_rfc3339()
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.from <= instant && instant < self.to
    }
}

/// The calendar date of a full triple.
pub fn date_of(triple: &ResolvedTriple) -> CalshResult<NaiveDate> {
    let invalid = || CalshError::InvalidDate(triple.to_string());

    let (Some(year), Some(month), Some(day)) = (triple.year(), triple.month(), triple.day()) else {
        return Err(invalid());
    };

    let year: i32 = year.parse().map_err(|_| invalid())?;
    let month: u32 = month.parse().map_err(|_| invalid())?;
    let day: u32 = day.parse().map_err(|_| invalid())?;

    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid)
}

/// Convert a wall-clock time in `tz` to UTC.
///
/// Wall-clock times skipped by a DST jump are moved forward an hour.
pub fn to_utc(naive: NaiveDateTime, tz: Tz) -> DateTime<Utc> {
    tz.from_local_datetime(&naive)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(naive + Duration::hours(1))).earliest())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| naive.and_utc())
}

fn local_midnight(date: NaiveDate, tz: Tz) -> DateTime<Utc> {
    to_utc(date.and_time(NaiveTime::MIN), tz)
}

fn first_of_next_month(date: NaiveDate) -> Option<NaiveDate> {
    if date.month() == 12 {
        NaiveDate::from_ymd_opt(date.year().checked_add(1)?, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(date.year(), date.month() + 1, 1)
    }
}
