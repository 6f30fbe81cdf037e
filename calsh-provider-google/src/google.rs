//! Google Calendar API implementation.

use crate::config;
use crate::types::{AccountTokens, GoogleCredentials};
use anyhow::{Context, Result};
use calsh_core::event::{Event, EventStatus, EventTime, NewEvent};
use chrono::{DateTime, NaiveTime, Utc};
use google_calendar::types::{EventDateTime, MinAccessRole, OrderBy, SendUpdates};
use google_calendar::Client;
use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;

const REDIRECT_PORT: u16 = 8085;
const REDIRECT_URI: &str = "http://localhost:8085/callback";
const SCOPES: &[&str] = &["https://www.googleapis.com/auth/calendar"];

/// Create a Google Calendar client from stored tokens
fn create_client(creds: &GoogleCredentials, tokens: &AccountTokens) -> Client {
    Client::new(
        creds.client_id.clone(),
        creds.client_secret.clone(),
        REDIRECT_URI.to_string(),
        tokens.access_token.clone(),
        tokens.refresh_token.clone(),
    )
}

/// Create a new client for initial authentication (no tokens yet)
fn create_auth_client(creds: &GoogleCredentials) -> Client {
    Client::new(
        creds.client_id.clone(),
        creds.client_secret.clone(),
        REDIRECT_URI.to_string(),
        String::new(),
        String::new(),
    )
}

/// Accept one request on the redirect port and pull `code` and `state` out of it.
fn wait_for_callback() -> Result<(String, String)> {
    let listener = TcpListener::bind(format!("127.0.0.1:{}", REDIRECT_PORT))
        .with_context(|| format!("Failed to bind to port {}", REDIRECT_PORT))?;

    eprintln!("Waiting for OAuth callback on port {}...", REDIRECT_PORT);

    let (mut stream, _) = listener.accept().context("Failed to accept connection")?;

    let mut reader = BufReader::new(&stream);
    let mut request_line = String::new();
    reader.read_line(&mut request_line)?;

    let (code, state) = parse_callback(&request_line)?;

    let response = "HTTP/1.1 200 OK\r\n\
        Content-Type: text/html\r\n\
        Connection: close\r\n\
        \r\n\
        <html><body>\
        <h1>Authentication successful!</h1>\
        <p>You can close this window and return to calsh.</p>\
        </body></html>";

    stream.write_all(response.as_bytes())?;
    stream.flush()?;

    Ok((code, state))
}

/// `GET /callback?code=..&state=.. HTTP/1.1` -> (code, state)
fn parse_callback(request_line: &str) -> Result<(String, String)> {
    let url_part = request_line
        .split_whitespace()
        .nth(1)
        .context("Invalid request")?;

    let url = url::Url::parse(&format!("http://localhost{}", url_part))?;

    let query = |name: &str| {
        url.query_pairs()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.to_string())
    };

    if let Some(error) = query("error") {
        anyhow::bail!("Authorization was denied: {}", error);
    }

    let code = query("code").context("No code in callback")?;
    let state = query("state").context("No state in callback")?;

    Ok((code, state))
}

fn expires_at(expires_in: i64) -> Option<DateTime<Utc>> {
    (expires_in > 0).then(|| Utc::now() + chrono::Duration::seconds(expires_in))
}

/// Run the full OAuth authentication flow.
/// Returns the account email.
pub async fn authenticate() -> Result<String> {
    let creds = config::load_credentials()?;
    let mut client = create_auth_client(&creds);

    let scopes: Vec<String> = SCOPES.iter().map(|s| s.to_string()).collect();
    let auth_url = client.user_consent_url(&scopes);

    eprintln!("\nOpen this URL in your browser to authenticate:\n");
    eprintln!("{}\n", auth_url);

    if open::that(&auth_url).is_err() {
        eprintln!("(Could not open browser automatically, please copy the URL above)");
    }

    let (code, state) = wait_for_callback()?;

    log::info!("Received authorization code, exchanging for tokens...");

    let access_token = client
        .get_access_token(&code, &state)
        .await
        .context("Failed to exchange code for tokens")?;

    let tokens = AccountTokens {
        expires_at: expires_at(access_token.expires_in),
        access_token: access_token.access_token,
        refresh_token: access_token.refresh_token,
    };

    // The primary calendar's id is the account email
    let client = create_client(&creds, &tokens);
    let response = client
        .calendar_list()
        .list_all(MinAccessRole::default(), false, false)
        .await
        .context("Failed to look up the primary calendar")?;

    let email = response
        .body
        .iter()
        .find(|cal| cal.primary)
        .map(|cal| cal.id.clone())
        .context("Account has no primary calendar")?;

    config::save_tokens(&email, &tokens)?;

    eprintln!("Authentication successful!");

    Ok(email)
}

/// Get tokens for an account, refreshing if needed
async fn get_valid_tokens(creds: &GoogleCredentials, account: &str) -> Result<AccountTokens> {
    let mut tokens = config::load_tokens(account)?;

    if tokens.needs_refresh(Utc::now()) {
        log::info!("Access token expired, refreshing...");
        tokens = refresh_tokens(creds, &tokens).await?;
        config::save_tokens(account, &tokens)?;
    }

    Ok(tokens)
}

async fn refresh_tokens(creds: &GoogleCredentials, tokens: &AccountTokens) -> Result<AccountTokens> {
    let client = create_client(creds, tokens);

    let access_token = client
        .refresh_access_token()
        .await
        .context("Failed to refresh token")?;

    // Google typically doesn't return a new refresh_token on refresh
    let refresh_token = if access_token.refresh_token.is_empty() {
        tokens.refresh_token.clone()
    } else {
        access_token.refresh_token
    };

    Ok(AccountTokens {
        expires_at: expires_at(access_token.expires_in),
        access_token: access_token.access_token,
        refresh_token,
    })
}

async fn client_for(account: &str) -> Result<Client> {
    let creds = config::load_credentials()?;
    let tokens = get_valid_tokens(&creds, account).await?;
    Ok(create_client(&creds, &tokens))
}

/// Fetch events overlapping `[time_min, time_max)`, with recurring events
/// expanded into instances.
pub async fn list_events(account: &str, calendar_id: &str, time_min: &str, time_max: &str) -> Result<Vec<Event>> {
    let client = client_for(account).await?;

    let response = client
        .events()
        .list_all(
            calendar_id,
            "",                 // i_cal_uid
            0,                  // max_attendees
            OrderBy::default(), // order_by
            &[],                // private_extended_property
            "",                 // q (search query)
            &[],                // shared_extended_property
            false,              // show_deleted
            false,              // show_hidden_invitations
            true,               // single_events
            time_max,
            time_min,
            "",                 // time_zone
            "",                 // updated_min
        )
        .await
        .context("Failed to fetch events")?;

    log::debug!("Google returned {} events", response.body.len());

    Ok(listed_events(response.body))
}

/// Convert a listing, dropping cancelled and malformed entries, sorted by start.
fn listed_events(events: Vec<google_calendar::types::Event>) -> Vec<Event> {
    let mut result: Vec<Event> = events
        .into_iter()
        .filter(|e| e.status != "cancelled" && !e.id.is_empty())
        .filter_map(|e| match from_google_event(e) {
            Ok(event) => Some(event),
            Err(err) => {
                log::warn!("Skipping event: {:#}", err);
                None
            }
        })
        .collect();

    result.sort_by_key(|e| start_key(&e.start));
    result
}

fn start_key(time: &EventTime) -> DateTime<Utc> {
    match time {
        EventTime::DateTime(dt) => *dt,
        EventTime::Date(d) => d.and_time(NaiveTime::MIN).and_utc(),
    }
}

pub async fn create_event(account: &str, calendar_id: &str, event: &NewEvent) -> Result<Event> {
    let client = client_for(account).await?;

    let google_event = to_google_event(event);

    let response = client
        .events()
        .insert(
            calendar_id,
            0,
            0,
            false,
            SendUpdates::None,
            false,
            &google_event,
        )
        .await
        .with_context(|| format!("Failed to create event: {}", event.summary))?;

    from_google_event(response.body)
}

/// Delete an event. An event that is already gone counts as deleted.
pub async fn delete_event(account: &str, calendar_id: &str, event_id: &str) -> Result<()> {
    let client = client_for(account).await?;

    let result = client
        .events()
        .delete(calendar_id, event_id, false, SendUpdates::None)
        .await;

    match result {
        Ok(_) => Ok(()),
        Err(e) => {
            let error_str = e.to_string();
            if error_str.contains("410") || error_str.contains("Gone") {
                log::debug!("Event {} was already deleted", event_id);
                Ok(())
            } else {
                Err(e).with_context(|| format!("Failed to delete event: {}", event_id))
            }
        }
    }
}

fn event_time_from_google(time: Option<&EventDateTime>) -> Option<EventTime> {
    let time = time?;
    if let Some(dt) = time.date_time {
        Some(EventTime::DateTime(dt))
    } else {
        time.date.map(EventTime::Date)
    }
}

/// Convert EventTime to Google's EventDateTime
fn event_time_to_google(time: &EventTime) -> EventDateTime {
    match time {
        EventTime::Date(d) => EventDateTime {
            date: Some(*d),
            date_time: None,
            time_zone: String::new(),
        },
        EventTime::DateTime(dt) => EventDateTime {
            date: None,
            date_time: Some(*dt),
            time_zone: String::new(),
        },
    }
}

fn to_google_event(event: &NewEvent) -> google_calendar::types::Event {
    google_calendar::types::Event {
        // Let Google assign the ID
        id: String::new(),
        summary: event.summary.clone(),
        start: Some(event_time_to_google(&event.start)),
        end: Some(event_time_to_google(&event.end)),
        ..Default::default()
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

/// Convert a Google Calendar API Event to our Event
fn from_google_event(event: google_calendar::types::Event) -> Result<Event> {
    let start = event_time_from_google(event.start.as_ref())
        .with_context(|| format!("Event {} has no start time", event.id))?;
    let end = event_time_from_google(event.end.as_ref())
        .with_context(|| format!("Event {} has no end time", event.id))?;

    let status = match event.status.as_str() {
        "tentative" => EventStatus::Tentative,
        "cancelled" => EventStatus::Cancelled,
        _ => EventStatus::Confirmed,
    };

    Ok(Event {
        id: event.id,
        summary: if event.summary.is_empty() {
            "(No title)".to_string()
        } else {
            event.summary
        },
        location: non_empty(event.location),
        start,
        end,
        status,
    })
}
