//! Core types for calsh.
//!
//! This crate holds everything that does not touch the terminal:
//! - `context` and `path`: the session location and the path resolver
//! - `date_range` and `time_span`: turning a resolved triple into concrete times
//! - `event`, `protocol` and `provider`: the calendar collaborator side

pub mod context;
pub mod date_range;
pub mod error;
pub mod event;
pub mod path;
pub mod protocol;
pub mod provider;
pub mod time_span;

pub use context::{Level, ResolvedTriple, SessionContext};
pub use error::{CalshError, CalshResult, ErrorKind, PathError};
pub use path::{resolve, resolve_path, Notice, Resolved};
