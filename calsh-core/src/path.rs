//! Path resolution for the year/month/day tree.
//!
//! A path token is split on `/` once and folded left to right. Before each
//! step the remaining segments are checked for the two literal shapes:
//!
//! - `YYYY/MM/DD` (absolute) replaces the whole triple
//! - `MM/DD` (half-absolute) replaces month and day, but only once a year is set
//!
//! Anything else is resolved one segment at a time: a run of dots walks up
//! (`.` stays, `..` goes up one level, `...` two), any other segment fills
//! the next unset level.

use std::fmt;

use crate::context::{Level, ResolvedTriple, SessionContext};
use crate::error::PathError;

/// Informational outcome that does not fail the resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    AlreadyAtTop,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::AlreadyAtTop => f.write_str("You are already at the top level"),
        }
    }
}

/// A successful resolution together with any notices raised on the way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved<T> {
    pub value: T,
    pub notices: Vec<Notice>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Segment<'a> {
    /// Number of levels to climb.
    Traversal(usize),
    Relative(&'a str),
}

fn classify(segment: &str) -> Segment<'_> {
    if !segment.is_empty() && segment.bytes().all(|b| b == b'.') {
        Segment::Traversal(segment.len() - 1)
    } else {
        Segment::Relative(segment)
    }
}

/// Resolve `token` against `context` and return the context to move to.
pub fn resolve(context: &SessionContext, token: &str) -> Result<Resolved<SessionContext>, PathError> {
    let Resolved { value, notices } = resolve_path(context, token)?;

    Ok(Resolved {
        value: context.relocated(value),
        notices,
    })
}

/// Resolve `token` against `context` without moving anywhere.
pub fn resolve_path(context: &SessionContext, token: &str) -> Result<Resolved<ResolvedTriple>, PathError> {
    if token.is_empty() {
        return Err(PathError::Empty);
    }

    let segments: Vec<&str> = token.split('/').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(PathError::EmptySegment {
            token: token.to_string(),
        });
    }

    log::debug!("resolving '{}' from '{}'", token, context);

    let mut triple = context.triple().clone();
    let mut notices = Vec::new();
    let mut rest = segments.as_slice();

    while let Some((head, tail)) = rest.split_first() {
        if let Some(absolute) = absolute(rest)? {
            triple = absolute;
            break;
        }

        if let Some((month, day)) = half_absolute_shape(rest) {
            match triple.year().map(str::to_owned) {
                Some(year) => {
                    check_range(Level::Month, month)?;
                    check_range(Level::Day, day)?;
                    triple = ResolvedTriple::full(&year, month, day);
                }
                None => {
                    // No year yet: read the same segments as plain relative ones.
                    for segment in rest {
                        step(&mut triple, segment, &mut notices).map_err(|cause| PathError::YearUnset {
                            token: rest.join("/"),
                            cause: Box::new(cause),
                        })?;
                    }
                }
            }
            break;
        }

        step(&mut triple, head, &mut notices)?;
        rest = tail;
    }

    Ok(Resolved {
        value: triple,
        notices,
    })
}

/// `YYYY/MM/DD`, range-checked.
fn absolute(segments: &[&str]) -> Result<Option<ResolvedTriple>, PathError> {
    let [year, month, day] = segments else {
        return Ok(None);
    };

    if !(is_digits(year, 4) && is_digits(month, 2) && is_digits(day, 2)) {
        return Ok(None);
    }

    check_range(Level::Month, month)?;
    check_range(Level::Day, day)?;

    Ok(Some(ResolvedTriple::full(year, month, day)))
}

/// `MM/DD` by shape only; the caller decides whether it applies.
fn half_absolute_shape<'a>(segments: &[&'a str]) -> Option<(&'a str, &'a str)> {
    match segments {
        [month, day] if is_digits(month, 2) && is_digits(day, 2) => Some((*month, *day)),
        _ => None,
    }
}

fn step(triple: &mut ResolvedTriple, segment: &str, notices: &mut Vec<Notice>) -> Result<(), PathError> {
    match classify(segment) {
        Segment::Traversal(0) => {}
        Segment::Traversal(levels) => {
            if triple.is_root() {
                notices.push(Notice::AlreadyAtTop);
            }
            for _ in 0..levels {
                if triple.pop().is_none() {
                    break;
                }
            }
        }
        Segment::Relative(value) => {
            let level = triple.next_level().ok_or_else(|| PathError::AlreadyAtBottom {
                segment: value.to_string(),
            })?;
            validate(level, value)?;
            triple.push(value.to_string());
        }
    }

    Ok(())
}

/// Month and day must be two in-range digits. The year only has to be digits.
fn validate(level: Level, value: &str) -> Result<(), PathError> {
    let well_formed = match level {
        Level::Year => !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()),
        Level::Month | Level::Day => is_digits(value, 2),
    };

    if !well_formed {
        return Err(PathError::Malformed {
            segment: value.to_string(),
            level,
        });
    }

    check_range(level, value)
}

fn check_range(level: Level, value: &str) -> Result<(), PathError> {
    let Some((min, max)) = level.bounds() else {
        return Ok(());
    };

    // Two ASCII digits always parse.
    let number: u32 = value.parse().unwrap_or(0);
    if number < min || number > max {
        return Err(PathError::OutOfRange {
            level,
            value: value.to_string(),
            min,
            max,
        });
    }

    Ok(())
}

fn is_digits(value: &str, len: usize) -> bool {
    value.len() == len && value.bytes().all(|b| b.is_ascii_digit())
}
