//! Authorized Google Calendar API client.
//!
//! [`AuthorizedClient`] attaches the bearer token to each request and, when
//! the access token has expired, refreshes it first and writes the renewed
//! token back to the [`TokenStore`].

use chrono::{Local, SecondsFormat};
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, info};

use upcoming_core::{Event, EventStart};

use crate::error::{ProviderError, ProviderResult};

use super::oauth::OAuthClient;
use super::tokens::{Token, TokenStore};

/// Base URL for Google Calendar API v3.
pub const CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";

/// Parameters of the upcoming-events list request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventQuery {
    /// Calendar to list, `primary` for the user's own calendar.
    pub calendar_id: String,
    /// Maximum number of events returned.
    pub max_results: u32,
}

impl EventQuery {
    /// Default calendar.
    pub const PRIMARY: &'static str = "primary";
    /// Default number of events.
    pub const DEFAULT_MAX_RESULTS: u32 = 10;

    /// Creates a query for `calendar_id`.
    pub fn new(calendar_id: impl Into<String>) -> Self {
        Self {
            calendar_id: calendar_id.into(),
            max_results: Self::DEFAULT_MAX_RESULTS,
        }
    }

    /// Sets the maximum number of events.
    pub fn with_max_results(mut self, max_results: u32) -> Self {
        self.max_results = max_results;
        self
    }

    /// Query string for a request issued at `time_min`.
    fn params(&self, time_min: String) -> [(&'static str, String); 5] {
        [
            ("showDeleted", "false".to_string()),
            ("singleEvents", "true".to_string()),
            ("timeMin", time_min),
            ("maxResults", self.max_results.to_string()),
            ("orderBy", "startTime".to_string()),
        ]
    }
}

impl Default for EventQuery {
    fn default() -> Self {
        Self::new(Self::PRIMARY)
    }
}

/// HTTP client bound to an OAuth token.
#[derive(Debug)]
pub struct AuthorizedClient {
    oauth: OAuthClient,
    store: TokenStore,
    token: Mutex<Token>,
    api_base: String,
}

impl AuthorizedClient {
    /// Creates a client for `token`, refreshed through `oauth` and persisted
    /// to `store`.
    pub fn new(oauth: OAuthClient, store: TokenStore, token: Token) -> Self {
        Self {
            oauth,
            store,
            token: Mutex::new(token),
            api_base: CALENDAR_API_BASE.to_string(),
        }
    }

    /// Points the client at a different API base URL.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    #[cfg(test)]
    pub(crate) async fn token(&self) -> Token {
        self.token.lock().await.clone()
    }

    /// Returns a usable access token, refreshing and persisting it first
    /// when it has expired.
    pub async fn access_token(&self) -> ProviderResult<String> {
        let mut token = self.token.lock().await;
        if !token.is_expired() {
            return Ok(token.access_token.clone());
        }

        let refresh_token = token.refresh_token.clone().ok_or_else(|| {
            ProviderError::authentication(
                "access token expired and no refresh token is available - run 'upcoming auth --force'",
            )
        })?;

        debug!("refreshing expired access token");
        let refreshed = self.oauth.refresh_token(&refresh_token).await?;
        self.store.save(&refreshed)?;
        *token = refreshed;
        Ok(token.access_token.clone())
    }

    /// Lists the next events of `query.calendar_id`, starting now, ordered by
    /// start time.
    pub async fn fetch_upcoming_events(&self, query: &EventQuery) -> ProviderResult<Vec<Event>> {
        let time_min = Local::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        let access_token = self.access_token().await?;
        let url = format!(
            "{}/calendars/{}/events",
            self.api_base.trim_end_matches('/'),
            urlencoding::encode(&query.calendar_id)
        );

        debug!(calendar = %query.calendar_id, %time_min, "listing events");
        let response = self
            .oauth
            .http_client()
            .get(&url)
            .bearer_auth(&access_token)
            .query(&query.params(time_min))
            .send()
            .await
            .map_err(|e| {
                let message = if e.is_connect() {
                    "connection failed"
                } else {
                    "request failed"
                };
                ProviderError::network(message).with_source(e)
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::network("failed to read response").with_source(e))?;

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(ProviderError::authentication(
                "access token expired or invalid",
            ));
        }

        // Google reports exhausted quotas as 403 as well.
        if status == reqwest::StatusCode::FORBIDDEN {
            return Err(ProviderError::authorization(format!(
                "access denied to calendar {}: {}",
                query.calendar_id,
                body.trim()
            )));
        }

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ProviderError::calendar(format!(
                "calendar {} not found",
                query.calendar_id
            )));
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::rate_limited("rate limit exceeded"));
        }

        if !status.is_success() {
            return Err(ProviderError::server(format!(
                "API error ({}): {}",
                status,
                body.trim()
            )));
        }

        let list: EventListResponse = serde_json::from_str(&body).map_err(|e| {
            ProviderError::invalid_response("failed to parse event list").with_source(e)
        })?;

        let events: Vec<Event> = list.items.into_iter().map(Event::from).collect();
        info!(count = events.len(), "fetched upcoming events");
        Ok(events)
    }
}

/// Response from the events.list endpoint.
#[derive(Debug, Deserialize)]
struct EventListResponse {
    #[serde(default)]
    items: Vec<ApiEvent>,
}

/// The subset of an API event the box shows.
#[derive(Debug, Deserialize)]
struct ApiEvent {
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    start: EventStart,
}

impl From<ApiEvent> for Event {
    fn from(event: ApiEvent) -> Self {
        Event::new(event.summary.unwrap_or_default(), event.start)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;
    use crate::error::ProviderErrorCode;
    use crate::google::config::ClientSecret;
    use crate::google::test_support::{test_http_client, MockServer};

    const EVENTS_BODY: &str = r#"{
        "kind": "calendar#events",
        "items": [
            {"summary": "Standup", "start": {"dateTime": "2024-03-15T09:05:00-04:00"}},
            {"start": {"date": "2024-03-16"}},
            {"summary": "Review", "start": {"dateTime": "2024-03-18T14:00:00Z", "timeZone": "UTC"}}
        ]
    }"#;

    fn fresh_token() -> Token {
        Token::new("ya29.valid", Some("1//refresh".to_string()), Some(3600))
    }

    fn expired_token() -> Token {
        let mut token = fresh_token();
        token.access_token = "ya29.stale".to_string();
        token.expiry = Some(Utc::now() - Duration::hours(1));
        token
    }

    fn client(server: &MockServer, store: TokenStore, token: Token) -> AuthorizedClient {
        let secret = ClientSecret::new("id", "secret").with_token_uri(server.url("/token"));
        AuthorizedClient::new(OAuthClient::new(secret, test_http_client()), store, token)
            .with_api_base(server.url("/calendar/v3"))
    }

    fn query_pairs(target: &str) -> Vec<(String, String)> {
        let url = url::Url::parse(&format!("http://localhost{target}")).unwrap();
        url.query_pairs().into_owned().collect()
    }

    #[test]
    fn default_query_is_ten_primary_events() {
        let query = EventQuery::default();
        assert_eq!(query.calendar_id, "primary");
        assert_eq!(query.max_results, 10);
    }

    #[tokio::test]
    async fn fetch_sends_list_parameters() {
        let server = MockServer::start(vec![(200, EVENTS_BODY.to_string())]);
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("token.json"));
        let client = client(&server, store, fresh_token());

        let events = client
            .fetch_upcoming_events(&EventQuery::default())
            .await
            .unwrap();

        assert_eq!(events.len(), 3);
        assert_eq!(events[0].title, "Standup");
        assert_eq!(events[0].start, EventStart::at("2024-03-15T09:05:00-04:00"));
        assert_eq!(events[1].title, "");
        assert_eq!(events[1].start, EventStart::all_day("2024-03-16"));
        assert_eq!(events[2].title, "Review");

        let requests = server.requests();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert_eq!(request.method, "GET");
        assert!(request.target.starts_with("/calendar/v3/calendars/primary/events?"));
        assert_eq!(request.header("authorization"), Some("Bearer ya29.valid"));

        let pairs = query_pairs(&request.target);
        let get = |key: &str| {
            pairs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
        };
        assert_eq!(get("showDeleted").as_deref(), Some("false"));
        assert_eq!(get("singleEvents").as_deref(), Some("true"));
        assert_eq!(get("maxResults").as_deref(), Some("10"));
        assert_eq!(get("orderBy").as_deref(), Some("startTime"));

        let time_min = get("timeMin").unwrap();
        let parsed = chrono::DateTime::parse_from_rfc3339(&time_min).unwrap();
        assert!((Utc::now() - parsed.with_timezone(&Utc)).num_seconds().abs() < 60);

        // A valid token is never written back.
        assert!(!dir.path().join("token.json").exists());
    }

    #[tokio::test]
    async fn calendar_id_is_path_encoded() {
        let server = MockServer::start(vec![(200, r#"{"items": []}"#.to_string())]);
        let dir = tempfile::tempdir().unwrap();
        let client = client(
            &server,
            TokenStore::new(dir.path().join("token.json")),
            fresh_token(),
        );

        let events = client
            .fetch_upcoming_events(&EventQuery::new("team@group.calendar.google.com"))
            .await
            .unwrap();
        assert!(events.is_empty());
        assert!(server.requests()[0]
            .target
            .starts_with("/calendar/v3/calendars/team%40group.calendar.google.com/events?"));
    }

    #[tokio::test]
    async fn expired_token_is_refreshed_and_persisted() {
        let server = MockServer::start(vec![
            (
                200,
                r#"{"access_token":"ya29.fresh","expires_in":3599,"token_type":"Bearer"}"#
                    .to_string(),
            ),
            (200, EVENTS_BODY.to_string()),
        ]);
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("token.json"));
        let client = client(&server, store.clone(), expired_token());

        client
            .fetch_upcoming_events(&EventQuery::default())
            .await
            .unwrap();

        let requests = server.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].target, "/token");
        assert_eq!(requests[1].header("authorization"), Some("Bearer ya29.fresh"));

        let saved = store.load().unwrap();
        assert_eq!(saved.access_token, "ya29.fresh");
        assert_eq!(saved.refresh_token.as_deref(), Some("1//refresh"));
        assert_eq!(client.token().await, saved);
    }

    #[tokio::test]
    async fn expired_token_without_refresh_token_fails() {
        let server = MockServer::start(vec![]);
        let dir = tempfile::tempdir().unwrap();
        let mut token = expired_token();
        token.refresh_token = None;
        let client = client(&server, TokenStore::new(dir.path().join("token.json")), token);

        let err = client
            .fetch_upcoming_events(&EventQuery::default())
            .await
            .unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::AuthenticationFailed);
        assert!(server.requests().is_empty());
    }

    #[tokio::test]
    async fn api_errors_map_to_codes() {
        let cases = [
            (401, ProviderErrorCode::AuthenticationFailed),
            (403, ProviderErrorCode::AuthorizationFailed),
            (404, ProviderErrorCode::CalendarError),
            (429, ProviderErrorCode::RateLimited),
            (500, ProviderErrorCode::ServerError),
        ];

        for (status, expected) in cases {
            let server = MockServer::start(vec![(
                status,
                r#"{"error": {"message": "nope"}}"#.to_string(),
            )]);
            let dir = tempfile::tempdir().unwrap();
            let client = client(
                &server,
                TokenStore::new(dir.path().join("token.json")),
                fresh_token(),
            );

            let err = client
                .fetch_upcoming_events(&EventQuery::default())
                .await
                .unwrap_err();
            assert_eq!(err.code(), expected, "status {status}");
        }
    }

    #[tokio::test]
    async fn undecodable_body_is_invalid_response() {
        let server = MockServer::start(vec![(200, "<html>".to_string())]);
        let dir = tempfile::tempdir().unwrap();
        let client = client(
            &server,
            TokenStore::new(dir.path().join("token.json")),
            fresh_token(),
        );

        let err = client
            .fetch_upcoming_events(&EventQuery::default())
            .await
            .unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::InvalidResponse);
    }
}
