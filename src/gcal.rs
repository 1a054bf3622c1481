//! Google Calendar integration: OAuth flow and the gateway implementation.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use google_calendar::types::{AclRule, EventDateTime, OrderBy, Scope, SendUpdates};
use google_calendar::Client;
use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::time::Duration;
use tokio::time::timeout;

use runcal_core::{CalendarGateway, DesiredEvent, EventStart, GatewayError, RemoteEvent};

use crate::config::{self, AccountTokens, GoogleConfig};

const REDIRECT_PORT: u16 = 8085;
const REDIRECT_URI: &str = "http://localhost:8085/callback";

const SCOPES: &[&str] = &["https://www.googleapis.com/auth/calendar"];

/// Bounded per-call deadline so one stalled request cannot hang a pass.
const CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Create a Google Calendar client from stored tokens
pub fn create_client(config: &GoogleConfig, tokens: &AccountTokens) -> Client {
    Client::new(
        config.client_id.clone(),
        config.client_secret.clone(),
        REDIRECT_URI.to_string(),
        tokens.access_token.clone(),
        tokens.refresh_token.clone(),
    )
}

/// Create a new client for initial authentication (no tokens yet)
fn create_auth_client(config: &GoogleConfig) -> Client {
    Client::new(
        config.client_id.clone(),
        config.client_secret.clone(),
        REDIRECT_URI.to_string(),
        String::new(),
        String::new(),
    )
}

/// Start a local HTTP server to receive the OAuth callback
/// Returns (code, state)
fn wait_for_callback() -> Result<(String, String)> {
    let listener = TcpListener::bind(format!("127.0.0.1:{}", REDIRECT_PORT))
        .with_context(|| format!("Failed to bind to port {}", REDIRECT_PORT))?;

    println!("Waiting for OAuth callback on port {}...", REDIRECT_PORT);

    let (mut stream, _) = listener.accept().context("Failed to accept connection")?;

    let mut reader = BufReader::new(&stream);
    let mut request_line = String::new();
    reader.read_line(&mut request_line)?;

    // Request line looks like: GET /callback?code=xxx&state=yyy HTTP/1.1
    let url_part = request_line
        .split_whitespace()
        .nth(1)
        .context("Invalid request")?;

    let url = url::Url::parse(&format!("http://localhost{}", url_part))?;

    let code = url
        .query_pairs()
        .find(|(k, _)| k == "code")
        .map(|(_, v)| v.to_string())
        .context("No code in callback")?;

    let state = url
        .query_pairs()
        .find(|(k, _)| k == "state")
        .map(|(_, v)| v.to_string())
        .context("No state in callback")?;

    let response = "HTTP/1.1 200 OK\r\n\
        Content-Type: text/html\r\n\
        Connection: close\r\n\
        \r\n\
        <html><body>\
        <h1>Authentication successful!</h1>\
        <p>You can close this window and return to the terminal.</p>\
        </body></html>";

    stream.write_all(response.as_bytes())?;
    stream.flush()?;

    Ok((code, state))
}

/// Run the full OAuth authentication flow
pub async fn authenticate(config: &GoogleConfig) -> Result<AccountTokens> {
    let mut client = create_auth_client(config);

    let scopes: Vec<String> = SCOPES.iter().map(|s| s.to_string()).collect();
    let auth_url = client.user_consent_url(&scopes);

    println!("\nOpen this URL in your browser to authenticate:\n");
    println!("{}\n", auth_url);

    if open::that(&auth_url).is_err() {
        println!("(Could not open browser automatically, please copy the URL above)");
    }

    let (code, state) = wait_for_callback()?;

    println!("\nReceived authorization code, exchanging for tokens...");

    let access_token = client
        .get_access_token(&code, &state)
        .await
        .context("Failed to exchange code for tokens")?;

    println!("Authentication successful!");

    let expires_at = if access_token.expires_in > 0 {
        Some(chrono::Utc::now() + chrono::Duration::seconds(access_token.expires_in))
    } else {
        None
    };

    Ok(AccountTokens {
        access_token: access_token.access_token,
        refresh_token: access_token.refresh_token,
        expires_at,
    })
}

/// Refresh an expired access token
pub async fn refresh_token(config: &GoogleConfig, tokens: &AccountTokens) -> Result<AccountTokens> {
    let client = create_client(config, tokens);

    let access_token = client
        .refresh_access_token()
        .await
        .context("Failed to refresh token")?;

    let expires_at = if access_token.expires_in > 0 {
        Some(chrono::Utc::now() + chrono::Duration::seconds(access_token.expires_in))
    } else {
        None
    };

    // Google typically doesn't return a new refresh_token on refresh
    let refresh_token = if access_token.refresh_token.is_empty() {
        tokens.refresh_token.clone()
    } else {
        access_token.refresh_token
    };

    Ok(AccountTokens {
        access_token: access_token.access_token,
        refresh_token,
        expires_at,
    })
}

/// Load stored tokens, refreshing them if they are about to expire.
pub async fn valid_tokens(google: &GoogleConfig) -> Result<AccountTokens> {
    let mut stored = config::load_tokens()?;
    let tokens = stored
        .google
        .clone()
        .context("Not authenticated. Run `runcal auth` first.")?;

    let expiring = tokens
        .expires_at
        .map(|at| at <= chrono::Utc::now() + chrono::Duration::seconds(60))
        .unwrap_or(true);

    if !expiring {
        return Ok(tokens);
    }

    log::debug!("access token expiring, refreshing");
    let refreshed = refresh_token(google, &tokens).await?;
    stored.google = Some(refreshed.clone());
    config::save_tokens(&stored)?;

    Ok(refreshed)
}

/// Create the group's dedicated calendar and make it publicly readable,
/// so runners can subscribe. Returns the calendar id.
pub async fn create_calendar(client: &Client, name: &str, timezone: &str) -> Result<String> {
    let body = google_calendar::types::Calendar {
        summary: name.to_string(),
        time_zone: timezone.to_string(),
        conference_properties: None,
        description: String::new(),
        etag: String::new(),
        id: String::new(),
        kind: String::new(),
        location: String::new(),
    };

    let created = client
        .calendars()
        .insert(&body)
        .await
        .context("Failed to create calendar")?;
    let calendar_id = created.body.id;

    let rule = AclRule {
        role: "reader".to_string(),
        scope: Some(Scope {
            type_: "default".to_string(),
            value: String::new(),
        }),
        etag: String::new(),
        id: String::new(),
        kind: String::new(),
    };

    client
        .acl()
        .insert(&calendar_id, false, &rule)
        .await
        .context("Failed to make calendar public")?;

    Ok(calendar_id)
}

/// Public iCal subscribe URL for a calendar, usable from any calendar app.
pub fn subscribe_url(calendar_id: &str) -> String {
    format!(
        "https://calendar.google.com/calendar/ical/{}/public/basic.ics",
        urlencoding::encode(calendar_id)
    )
}

/// Public web view URL for a calendar.
pub fn web_view_url(calendar_id: &str) -> String {
    format!(
        "https://calendar.google.com/calendar/embed?src={}",
        urlencoding::encode(calendar_id)
    )
}

/// [`CalendarGateway`] implementation over the Google Calendar API.
pub struct GoogleGateway {
    client: Client,
}

impl GoogleGateway {
    pub fn new(config: &GoogleConfig, tokens: &AccountTokens) -> Self {
        GoogleGateway {
            client: create_client(config, tokens),
        }
    }
}

fn request_error(e: impl std::fmt::Display) -> GatewayError {
    GatewayError::Request(e.to_string())
}

fn to_google_event(event: &DesiredEvent) -> google_calendar::types::Event {
    // Local wall-clock time with an explicit timeZone field, the same shape
    // the provider hands back for zoned events.
    let start = EventDateTime {
        date: None,
        date_time: Some(event.start.and_utc()),
        time_zone: event.timezone.clone(),
    };
    let end = EventDateTime {
        date: None,
        date_time: Some(event.end.and_utc()),
        time_zone: event.timezone.clone(),
    };

    google_calendar::types::Event {
        summary: event.title.clone(),
        description: event.description.clone(),
        location: event.location.clone(),
        start: Some(start),
        end: Some(end),
        ..Default::default()
    }
}

fn from_google_event(event: google_calendar::types::Event) -> RemoteEvent {
    let start = event.start.and_then(|s| {
        if let Some(dt) = s.date_time {
            Some(EventStart::DateTime(dt))
        } else {
            s.date.map(EventStart::Date)
        }
    });

    RemoteEvent {
        id: event.id,
        description: if event.description.is_empty() {
            None
        } else {
            Some(event.description)
        },
        start,
    }
}

#[async_trait]
impl CalendarGateway for GoogleGateway {
    async fn list_events(
        &self,
        calendar_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<RemoteEvent>, GatewayError> {
        let time_min = start.and_time(NaiveTime::MIN).and_utc().to_rfc3339();
        let time_max = end
            .and_hms_opt(23, 59, 59)
            .unwrap_or_else(|| end.and_time(NaiveTime::MIN))
            .and_utc()
            .to_rfc3339();

        let response = timeout(
            CALL_TIMEOUT,
            self.client.events().list_all(
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
                &time_max,
                &time_min,
                "", // time_zone
                "", // updated_min
            ),
        )
        .await
        .map_err(|_| GatewayError::Timeout(CALL_TIMEOUT.as_secs()))?
        .map_err(request_error)?;

        Ok(response
            .body
            .into_iter()
            .filter(|e| e.status != "cancelled" && !e.id.is_empty())
            .map(from_google_event)
            .collect())
    }

    async fn create_event(
        &self,
        calendar_id: &str,
        event: &DesiredEvent,
    ) -> Result<String, GatewayError> {
        let body = to_google_event(event);

        let response = timeout(
            CALL_TIMEOUT,
            self.client
                .events()
                .insert(calendar_id, 0, 0, false, SendUpdates::None, false, &body),
        )
        .await
        .map_err(|_| GatewayError::Timeout(CALL_TIMEOUT.as_secs()))?
        .map_err(request_error)?;

        Ok(response.body.id)
    }

    async fn update_event(
        &self,
        calendar_id: &str,
        event_id: &str,
        event: &DesiredEvent,
    ) -> Result<(), GatewayError> {
        let body = to_google_event(event);

        timeout(
            CALL_TIMEOUT,
            self.client.events().update(
                calendar_id,
                event_id,
                0,
                0,
                false,
                SendUpdates::None,
                false,
                &body,
            ),
        )
        .await
        .map_err(|_| GatewayError::Timeout(CALL_TIMEOUT.as_secs()))?
        .map_err(request_error)?;

        Ok(())
    }

    async fn delete_event(&self, calendar_id: &str, event_id: &str) -> Result<(), GatewayError> {
        let result = timeout(
            CALL_TIMEOUT,
            self.client
                .events()
                .delete(calendar_id, event_id, false, SendUpdates::None),
        )
        .await
        .map_err(|_| GatewayError::Timeout(CALL_TIMEOUT.as_secs()))?;

        match result {
            Ok(_) => Ok(()),
            Err(e) => {
                // Already gone on the remote: treat as deleted
                let error_str = e.to_string();
                if error_str.contains("410") || error_str.contains("Gone") {
                    Ok(())
                } else {
                    Err(request_error(e))
                }
            }
        }
    }
}
