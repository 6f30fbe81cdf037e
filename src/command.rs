//! Turns one input line into a `Command`.

use calsh_core::error::CalshError;
use calsh_core::time_span::TimeSpan;
use calsh_core::PathError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Cd(String),
    Ls(Vec<String>),
    Add {
        path: Option<String>,
        span: Option<TimeSpan>,
        summary: String,
    },
    Rm(Vec<String>),
    Pwd,
    Clear,
    Exit,
}

#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Unknown command '{0}' (try cd, ls, add, rm, pwd, clear or exit)")]
    Unknown(String),

    #[error("{command}: missing {what}")]
    MissingArgument {
        command: &'static str,
        what: &'static str,
    },

    #[error("{0}: too many arguments")]
    TooManyArguments(&'static str),

    #[error("add: a summary is required")]
    MissingSummary,

    #[error("A year, month and day are required to {0}")]
    NotADay(&'static str),

    #[error(transparent)]
    Span(CalshError),

    #[error(transparent)]
    Path(#[from] PathError),
}

/// Parse a line. Blank lines give `None`.
pub fn parse(line: &str) -> Result<Option<Command>, CommandError> {
    let mut words = line.split_whitespace();
    let Some(keyword) = words.next() else {
        return Ok(None);
    };
    let args: Vec<String> = words.map(str::to_owned).collect();

    let command = match keyword {
        "cd" => match <[String; 1]>::try_from(args) {
            Ok([path]) => Command::Cd(path),
            Err(args) if args.is_empty() => {
                return Err(CommandError::MissingArgument {
                    command: "cd",
                    what: "path",
                })
            }
            Err(_) => return Err(CommandError::TooManyArguments("cd")),
        },
        "ls" => Command::Ls(args),
        "add" => parse_add(args)?,
        "rm" => {
            if args.is_empty() {
                return Err(CommandError::MissingArgument {
                    command: "rm",
                    what: "event id",
                });
            }
            Command::Rm(args)
        }
        "pwd" => no_args("pwd", args, Command::Pwd)?,
        "clear" => no_args("clear", args, Command::Clear)?,
        "exit" => no_args("exit", args, Command::Exit)?,
        other => return Err(CommandError::Unknown(other.to_string())),
    };

    Ok(Some(command))
}

fn no_args(name: &'static str, args: Vec<String>, command: Command) -> Result<Command, CommandError> {
    if args.is_empty() {
        Ok(command)
    } else {
        Err(CommandError::TooManyArguments(name))
    }
}

// add [<path>] [<HH:MM-HH:MM>] <summary...>
fn parse_add(args: Vec<String>) -> Result<Command, CommandError> {
    let mut rest = args.into_iter().peekable();

    let path = rest.next_if(|word| looks_like_path(word));

    let span = match rest.next_if(|word| TimeSpan::looks_like(word)) {
        Some(word) => Some(word.parse::<TimeSpan>().map_err(CommandError::Span)?),
        None => None,
    };

    let summary = rest.collect::<Vec<_>>().join(" ");
    if summary.is_empty() {
        return Err(CommandError::MissingSummary);
    }

    Ok(Command::Add { path, span, summary })
}

/// Digits, `/` and `.` only.
fn looks_like_path(word: &str) -> bool {
    !word.is_empty() && word.bytes().all(|b| b.is_ascii_digit() || b == b'/' || b == b'.')
}
