//! Where the user currently is in the year/month/day tree.

use std::fmt;

use chrono::{Datelike, NaiveDate, Utc};
use chrono_tz::Tz;

/// One tier of the hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Year,
    Month,
    Day,
}

impl Level {
    /// The level that gets filled next when `depth` levels are already set.
    pub fn at_depth(depth: usize) -> Option<Level> {
        match depth {
            0 => Some(Level::Year),
            1 => Some(Level::Month),
            2 => Some(Level::Day),
            _ => None,
        }
    }

    /// Inclusive lexical bounds. The year has none.
    pub fn bounds(self) -> Option<(u32, u32)> {
        match self {
            Level::Year => None,
            Level::Month => Some((1, 12)),
            Level::Day => Some((1, 31)),
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Level::Year => "year",
            Level::Month => "month",
            Level::Day => "day",
        };
        f.write_str(name)
    }
}

/// A (year, month, day) prefix.
///
/// Levels are stored shallowest first and can only be pushed onto or popped
/// off the deep end, so a day is never set without a month, nor a month
/// without a year.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedTriple {
    levels: Vec<String>,
}

impl ResolvedTriple {
    pub const MAX_DEPTH: usize = 3;

    pub fn root() -> Self {
        Self::default()
    }

    pub fn full(year: &str, month: &str, day: &str) -> Self {
        ResolvedTriple {
            levels: vec![year.to_string(), month.to_string(), day.to_string()],
        }
    }

    /// Build a triple from optional parts, or `None` if the parts are not a prefix.
    pub fn from_parts(year: Option<&str>, month: Option<&str>, day: Option<&str>) -> Option<Self> {
        let mut levels = Vec::new();
        let mut gap = false;

        for part in [year, month, day] {
            match (part, gap) {
                (Some(_), true) => return None,
                (Some(value), false) => levels.push(value.to_string()),
                (None, _) => gap = true,
            }
        }

        Some(ResolvedTriple { levels })
    }

    pub fn year(&self) -> Option<&str> {
        self.levels.first().map(String::as_str)
    }

    pub fn month(&self) -> Option<&str> {
        self.levels.get(1).map(String::as_str)
    }

    pub fn day(&self) -> Option<&str> {
        self.levels.get(2).map(String::as_str)
    }

    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    pub fn is_root(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.levels.len() == Self::MAX_DEPTH
    }

    /// The next level a relative segment would fill.
    pub fn next_level(&self) -> Option<Level> {
        Level::at_depth(self.depth())
    }

    /// Fill the next unset level. Callers check `next_level` first.
    pub(crate) fn push(&mut self, value: String) {
        debug_assert!(self.levels.len() < Self::MAX_DEPTH);
        self.levels.push(value);
    }

    /// Clear the deepest set level.
    pub(crate) fn pop(&mut self) -> Option<String> {
        self.levels.pop()
    }
}

impl fmt::Display for ResolvedTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.levels.join("/"))
    }
}

/// The interpreter's current location, plus the calendar it browses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    calendar_id: String,
    location: ResolvedTriple,
}

impl SessionContext {
    /// A context at the root of the hierarchy.
    pub fn new(calendar_id: impl Into<String>) -> Self {
        SessionContext {
            calendar_id: calendar_id.into(),
            location: ResolvedTriple::root(),
        }
    }

    /// A context positioned at today's date in `tz`.
    pub fn today(calendar_id: impl Into<String>, tz: Tz) -> Self {
        Self::on_date(calendar_id, Utc::now().with_timezone(&tz).date_naive())
    }

    pub fn on_date(calendar_id: impl Into<String>, date: NaiveDate) -> Self {
        let mut context = Self::new(calendar_id);
        context.reset(date.year(), date.month(), date.day());
        context
    }

    /// Set all three levels at once.
    pub fn reset(&mut self, year: i32, month: u32, day: u32) {
        self.location = ResolvedTriple::full(
            &format!("{:04}", year),
            &format!("{:02}", month),
            &format!("{:02}", day),
        );
    }

    /// The same calendar, positioned somewhere else.
    pub(crate) fn relocated(&self, location: ResolvedTriple) -> Self {
        SessionContext {
            calendar_id: self.calendar_id.clone(),
            location,
        }
    }

    pub fn calendar_id(&self) -> &str {
        &self.calendar_id
    }

    pub fn triple(&self) -> &ResolvedTriple {
        &self.location
    }

    pub fn year(&self) -> Option<&str> {
        self.location.year()
    }

    pub fn month(&self) -> Option<&str> {
        self.location.month()
    }

    pub fn day(&self) -> Option<&str> {
        self.location.day()
    }

    pub fn depth(&self) -> usize {
        self.location.depth()
    }

    pub fn prompt(&self) -> String {
        format!("{} >>> ", self)
    }
}

impl fmt::Display for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.location.is_root() {
            write!(f, "{}", self.calendar_id)
        } else {
            write!(f, "{}/{}", self.calendar_id, self.location)
        }
    }
}
