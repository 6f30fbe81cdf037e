//! calsh-provider-google - Google Calendar provider for calsh
//!
//! This binary implements the calsh provider protocol, communicating
//! with calsh via JSON over stdin/stdout. Logs go to stderr.
//!
//! The provider manages its own credentials and tokens:
//!   ~/.config/calsh/providers/google/credentials.json
//!   ~/.config/calsh/providers/google/tokens/{account}.json

mod config;
mod google;
mod types;

use anyhow::Result;
use calsh_core::event::NewEvent;
use calsh_core::protocol::{Command, Request, Response};
use log::LevelFilter;
use serde::Deserialize;
use std::io::{self, BufRead, Write};

/// Google's alias for the user's main calendar
const DEFAULT_CALENDAR_ID: &str = "primary";

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::new()
        .filter_level(LevelFilter::Warn)
        .parse_default_env()
        .init();

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                log::error!("Failed to read stdin: {}", e);
                break;
            }
        };

        if line.trim().is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<Request>(&line) {
            Ok(request) => handle_request(request).await,
            Err(e) => Response::error(&format!("Failed to parse request: {}", e)),
        };

        writeln!(stdout, "{}", response)?;
        stdout.flush()?;
    }

    Ok(())
}

async fn handle_request(request: Request) -> String {
    log::debug!("Handling {:?}", request.command);

    match request.command {
        Command::Authenticate => handle_authenticate().await,
        Command::ListEvents => handle_list_events(request.params).await,
        Command::CreateEvent => handle_create_event(request.params).await,
        Command::DeleteEvent => handle_delete_event(request.params).await,
    }
}

async fn handle_authenticate() -> String {
    match google::authenticate().await {
        Ok(account) => Response::success(account),
        Err(e) => Response::error(&format!("{:#}", e)),
    }
}

#[derive(Debug, Deserialize)]
struct ListEventsParams {
    google_account: String,
    google_calendar_id: Option<String>,
    time_min: String,
    time_max: String,
}

async fn handle_list_events(params: serde_json::Value) -> String {
    let params: ListEventsParams = match serde_json::from_value(params) {
        Ok(p) => p,
        Err(e) => return Response::error(&format!("Invalid params: {}", e)),
    };

    let calendar_id = params
        .google_calendar_id
        .as_deref()
        .unwrap_or(DEFAULT_CALENDAR_ID);

    match google::list_events(&params.google_account, calendar_id, &params.time_min, &params.time_max).await {
        Ok(events) => Response::success(events),
        Err(e) => Response::error(&format!("{:#}", e)),
    }
}

#[derive(Debug, Deserialize)]
struct CreateEventParams {
    google_account: String,
    google_calendar_id: Option<String>,
    event: NewEvent,
}

async fn handle_create_event(params: serde_json::Value) -> String {
    let params: CreateEventParams = match serde_json::from_value(params) {
        Ok(p) => p,
        Err(e) => return Response::error(&format!("Invalid params: {}", e)),
    };

    let calendar_id = params
        .google_calendar_id
        .as_deref()
        .unwrap_or(DEFAULT_CALENDAR_ID);

    match google::create_event(&params.google_account, calendar_id, &params.event).await {
        Ok(event) => Response::success(event),
        Err(e) => Response::error(&format!("{:#}", e)),
    }
}

#[derive(Debug, Deserialize)]
struct DeleteEventParams {
    google_account: String,
    google_calendar_id: Option<String>,
    event_id: String,
}

async fn handle_delete_event(params: serde_json::Value) -> String {
    let params: DeleteEventParams = match serde_json::from_value(params) {
        Ok(p) => p,
        Err(e) => return Response::error(&format!("Invalid params: {}", e)),
    };

    let calendar_id = params
        .google_calendar_id
        .as_deref()
        .unwrap_or(DEFAULT_CALENDAR_ID);

    match google::delete_event(&params.google_account, calendar_id, &params.event_id).await {
        Ok(()) => Response::success(()),
        Err(e) => Response::error(&format!("{:#}", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn invalid_params_are_reported() {
        let response = handle_request(Request {
            command: Command::ListEvents,
            params: serde_json::json!({ "google_account": "me@example.com" }),
        })
        .await;

        assert!(response.starts_with(r#"{"status":"error","error":"Invalid params"#));
    }

    #[test]
    fn create_params_accept_the_shell_payload() {
        let params: CreateEventParams = serde_json::from_value(serde_json::json!({
            "google_account": "me@example.com",
            "google_calendar_id": "primary",
            "event": {
                "summary": "Dentist",
                "start": { "Date": "2024-05-03" },
                "end": { "Date": "2024-05-04" }
            }
        }))
        .unwrap();

        assert_eq!(params.event.summary, "Dentist");
    }
}
