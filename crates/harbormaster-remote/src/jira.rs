//! JIRA-style REST implementation of [`TicketSource`].
//!
//! The hosting request form stores its three logical fields in tracker
//! custom fields; the mapping is configuration, not code, so staging
//! trackers with different field ids work unchanged. All calls share one
//! timeout-bounded client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::error::TrackerError;
use crate::tracker::{FieldCorrection, Ticket, TicketField, TicketSource, TrackerResult};

/// Default tracker root.
pub const DEFAULT_TRACKER_URL: &str = "https://issues.jenkins.io";

/// Logical-field to custom-field-id mapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldMap {
    pub source_url: String,
    pub authorized_users: String,
    pub target_name: String,
}

impl Default for FieldMap {
    fn default() -> Self {
        FieldMap {
            source_url: "customfield_10101".to_string(),
            authorized_users: "customfield_10102".to_string(),
            target_name: "customfield_10103".to_string(),
        }
    }
}

impl FieldMap {
    /// The tracker field id backing a logical field.
    pub fn id_of(&self, field: TicketField) -> &str {
        match field {
            TicketField::SourceUrl => &self.source_url,
            TicketField::AuthorizedUsers => &self.authorized_users,
            TicketField::TargetName => &self.target_name,
        }
    }
}

/// Tracker client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Tracker root URL.
    pub base_url: String,
    /// Basic-auth user; when unset, `token` is sent as a bearer token.
    pub user: Option<String>,
    /// Credential secret.
    pub token: Option<String>,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Logical-field id mapping.
    pub fields: FieldMap,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        TrackerConfig {
            base_url: std::env::var("TRACKER_URL")
                .unwrap_or_else(|_| DEFAULT_TRACKER_URL.to_string()),
            user: std::env::var("TRACKER_USER").ok(),
            token: std::env::var("TRACKER_TOKEN").ok(),
            timeout_secs: 30,
            fields: FieldMap::default(),
        }
    }
}

impl TrackerConfig {
    /// Create a config from environment variables.
    pub fn from_env() -> Self {
        Self::default()
    }
}

/// JIRA-style tracker client.
pub struct JiraTracker {
    config: TrackerConfig,
    http: reqwest::Client,
}

impl JiraTracker {
    /// Build a client with the configured timeout and user agent.
    pub fn new(config: TrackerConfig) -> TrackerResult<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("harbormaster/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TrackerError::Connection(e.to_string()))?;
        Ok(JiraTracker { config, http })
    }

    /// Create a client from environment variables.
    pub fn from_env() -> TrackerResult<Self> {
        Self::new(TrackerConfig::from_env())
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), path);
        let req = self.http.request(method, url);
        match (&self.config.user, &self.config.token) {
            (Some(user), token) => req.basic_auth(user, token.as_deref()),
            (None, Some(token)) => req.bearer_auth(token),
            (None, None) => req,
        }
    }

    async fn check_mutation_status(
        &self,
        key: &str,
        response: reqwest::Response,
    ) -> TrackerResult<()> {
        match response.status() {
            StatusCode::NOT_FOUND => Err(TrackerError::TicketNotFound(key.to_string())),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(TrackerError::Auth),
            status if status.is_success() => Ok(()),
            status => Err(TrackerError::Status {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
struct IssuePayload {
    fields: serde_json::Value,
}

/// Custom fields arrive as strings, but some tracker field types wrap the
/// value in an object with a `value` key. Accept both.
fn field_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Object(map) => map
            .get("value")
            .and_then(|v| v.as_str())
            .map(str::to_string),
        _ => None,
    }
}

fn ticket_from_payload(key: &str, payload: IssuePayload, map: &FieldMap) -> Ticket {
    let mut ticket = Ticket::new(key);

    ticket.reporter = payload
        .fields
        .get("reporter")
        .and_then(|r| r.get("name").or_else(|| r.get("key")))
        .and_then(|v| v.as_str())
        .map(str::to_string);

    for field in [
        TicketField::SourceUrl,
        TicketField::AuthorizedUsers,
        TicketField::TargetName,
    ] {
        if let Some(text) = payload.fields.get(map.id_of(field)).and_then(field_text) {
            ticket.fields.insert(field, text);
        }
    }

    ticket
}

#[async_trait]
impl TicketSource for JiraTracker {
    async fn get_ticket(&self, key: &str) -> TrackerResult<Option<Ticket>> {
        let map = &self.config.fields;
        let path = format!(
            "/rest/api/2/issue/{key}?fields=reporter,{},{},{}",
            map.source_url, map.authorized_users, map.target_name
        );
        debug!(key = %key, "tracker GET issue");

        let response = self.request(Method::GET, &path).send().await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(TrackerError::Auth),
            status if status.is_success() => {
                let payload: IssuePayload = response
                    .json()
                    .await
                    .map_err(|e| TrackerError::Malformed(e.to_string()))?;
                Ok(Some(ticket_from_payload(key, payload, map)))
            }
            status => Err(TrackerError::Status {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            }),
        }
    }

    async fn update_fields(
        &self,
        key: &str,
        corrections: &[FieldCorrection],
    ) -> TrackerResult<()> {
        if corrections.is_empty() {
            return Ok(());
        }

        // Later corrections overwrite earlier ones for the same field.
        let mut fields = serde_json::Map::new();
        for correction in corrections {
            fields.insert(
                self.config.fields.id_of(correction.field).to_string(),
                json!(correction.value),
            );
        }

        debug!(key = %key, count = corrections.len(), "tracker PUT fields");
        let response = self
            .request(Method::PUT, &format!("/rest/api/2/issue/{key}"))
            .json(&json!({ "fields": fields }))
            .send()
            .await?;
        self.check_mutation_status(key, response).await
    }

    async fn post_comment(&self, key: &str, body: &str) -> TrackerResult<()> {
        debug!(key = %key, "tracker POST comment");
        let response = self
            .request(Method::POST, &format!("/rest/api/2/issue/{key}/comment"))
            .json(&json!({ "body": body }))
            .send()
            .await?;
        self.check_mutation_status(key, response).await
    }
}
