//! GitHub REST implementation of [`SourceHost`] and [`RepoForge`].
//!
//! Talks to the v3 API with a single, timeout-bounded client. Pagination is
//! deliberately absent: `list_forks` fetches one bounded page, which is all
//! the duplicate-import guard needs. Credentials are a bearer token taken
//! from configuration; there is no OAuth dance here.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use reqwest::{header, Method, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::error::ForgeError;
use crate::forge::{
    Account, AccountKind, FileKind, ForgeResult, HostedRepo, RepoFile, RepoForge, RepoRef,
    SourceHost,
};

/// Default API root.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Largest fork page the duplicate-import guard inspects.
const FORK_PAGE_SIZE: u32 = 100;

/// GitHub client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ForgeConfig {
    /// API root URL.
    pub api_url: String,
    /// Bearer token (optional; unauthenticated works for public data).
    pub token: Option<String>,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ForgeConfig {
    fn default() -> Self {
        ForgeConfig {
            api_url: std::env::var("FORGE_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            token: std::env::var("FORGE_TOKEN").ok(),
            timeout_secs: 30,
        }
    }
}

impl ForgeConfig {
    /// Create a config from environment variables.
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Set the bearer token.
    pub fn with_token(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }
}

/// GitHub API client.
pub struct GithubClient {
    config: ForgeConfig,
    http: reqwest::Client,
}

impl GithubClient {
    /// Build a client with the configured timeout and user agent.
    pub fn new(config: ForgeConfig) -> ForgeResult<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("harbormaster/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ForgeError::Connection(e.to_string()))?;
        Ok(GithubClient { config, http })
    }

    /// Create a client from environment variables.
    pub fn from_env() -> ForgeResult<Self> {
        Self::new(ForgeConfig::from_env())
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.config.api_url.trim_end_matches('/'), path);
        let mut req = self
            .http
            .request(method, url)
            .header(header::ACCEPT, "application/vnd.github+json");
        if let Some(token) = &self.config.token {
            req = req.bearer_auth(token);
        }
        req
    }

    /// GET a JSON payload; 404 maps to `Ok(None)`.
    async fn get_json(&self, path: &str) -> ForgeResult<Option<serde_json::Value>> {
        debug!(path = %path, "forge GET");
        let response = self.request(Method::GET, path).send().await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(ForgeError::Auth),
            status if status.is_success() => {
                let value = response
                    .json::<serde_json::Value>()
                    .await
                    .map_err(|e| ForgeError::Malformed(e.to_string()))?;
                Ok(Some(value))
            }
            status => Err(ForgeError::Status {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            }),
        }
    }

    async fn send_expect_success(
        &self,
        req: reqwest::RequestBuilder,
    ) -> ForgeResult<serde_json::Value> {
        let response = req.send().await?;
        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(ForgeError::Auth),
            status if status.is_success() => {
                if status == StatusCode::NO_CONTENT {
                    return Ok(serde_json::Value::Null);
                }
                response
                    .json::<serde_json::Value>()
                    .await
                    .map_err(|e| ForgeError::Malformed(e.to_string()))
            }
            status => Err(ForgeError::Status {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Response payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RepoPayload {
    name: String,
    owner: OwnerPayload,
    #[serde(default)]
    fork: bool,
    parent: Option<ParentPayload>,
    license: Option<LicensePayload>,
}

#[derive(Debug, Deserialize)]
struct OwnerPayload {
    login: String,
}

#[derive(Debug, Deserialize)]
struct ParentPayload {
    full_name: String,
}

#[derive(Debug, Deserialize)]
struct LicensePayload {
    spdx_id: Option<String>,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContentPayload {
    path: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ForkPayload {
    full_name: String,
}

#[derive(Debug, Deserialize)]
struct UserPayload {
    login: String,
    #[serde(rename = "type")]
    kind: String,
}

/// Map the API's license object to the identifier the engine reports.
fn license_label(license: LicensePayload) -> Option<String> {
    license
        .spdx_id
        .filter(|id| id != "NOASSERTION")
        .or(license.name)
}

fn repo_from_payload(payload: RepoPayload) -> ForgeResult<HostedRepo> {
    let parent = match payload.parent {
        Some(p) => Some(RepoRef::parse(&p.full_name).ok_or_else(|| {
            ForgeError::Malformed(format!("unparseable parent full_name: {}", p.full_name))
        })?),
        None => None,
    };
    Ok(HostedRepo {
        owner: payload.owner.login,
        name: payload.name,
        fork: payload.fork,
        parent,
        license: payload.license.and_then(license_label),
    })
}

fn file_kind(kind: &str) -> FileKind {
    match kind {
        "file" => FileKind::File,
        "dir" => FileKind::Directory,
        _ => FileKind::Other,
    }
}

/// Decode the API's base64 content field, which embeds newlines.
fn decode_content(raw: &str) -> ForgeResult<String> {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(compact)
        .map_err(|e| ForgeError::Malformed(format!("invalid base64 content: {e}")))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn parse_json<T: serde::de::DeserializeOwned>(value: serde_json::Value) -> ForgeResult<T> {
    serde_json::from_value(value).map_err(|e| ForgeError::Malformed(e.to_string()))
}

fn ref_from_full_name(full_name: String) -> ForgeResult<RepoRef> {
    RepoRef::parse(&full_name).ok_or_else(|| {
        ForgeError::Malformed(format!("unparseable repository full_name: {full_name}"))
    })
}

// ---------------------------------------------------------------------------
// SourceHost
// ---------------------------------------------------------------------------

#[async_trait]
impl SourceHost for GithubClient {
    async fn resolve_repository(
        &self,
        owner: &str,
        name: &str,
    ) -> ForgeResult<Option<HostedRepo>> {
        let path = format!("/repos/{owner}/{name}");
        match self.get_json(&path).await? {
            Some(value) => {
                let payload: RepoPayload = parse_json(value)?;
                Ok(Some(repo_from_payload(payload)?))
            }
            None => Ok(None),
        }
    }

    async fn get_file(
        &self,
        owner: &str,
        name: &str,
        path: &str,
    ) -> ForgeResult<Option<RepoFile>> {
        let api_path = format!("/repos/{owner}/{name}/contents/{path}");
        let value = match self.get_json(&api_path).await? {
            Some(v) => v,
            None => return Ok(None),
        };

        // The contents endpoint answers with an array for directories and an
        // object for everything else.
        if value.is_array() {
            return Ok(Some(RepoFile {
                path: path.to_string(),
                kind: FileKind::Directory,
                content: String::new(),
            }));
        }

        let payload: ContentPayload = parse_json(value)?;
        let kind = file_kind(&payload.kind);
        let content = match (&kind, payload.content) {
            (FileKind::File, Some(raw)) => decode_content(&raw)?,
            _ => String::new(),
        };
        Ok(Some(RepoFile {
            path: payload.path,
            kind,
            content,
        }))
    }

    async fn get_readme(&self, owner: &str, name: &str) -> ForgeResult<Option<String>> {
        let path = format!("/repos/{owner}/{name}/readme");
        match self.get_json(&path).await? {
            Some(value) => {
                let payload: ContentPayload = parse_json(value)?;
                match payload.content {
                    Some(raw) => Ok(Some(decode_content(&raw)?)),
                    None => Ok(None),
                }
            }
            None => Ok(None),
        }
    }

    async fn list_forks(&self, owner: &str, name: &str) -> ForgeResult<Vec<RepoRef>> {
        let path = format!("/repos/{owner}/{name}/forks?per_page={FORK_PAGE_SIZE}");
        let value = match self.get_json(&path).await? {
            Some(v) => v,
            None => return Ok(Vec::new()),
        };
        let payloads: Vec<ForkPayload> = parse_json(value)?;
        Ok(payloads
            .into_iter()
            .filter_map(|f| RepoRef::parse(&f.full_name))
            .collect())
    }

    async fn resolve_user(&self, login: &str) -> ForgeResult<Option<Account>> {
        let path = format!("/users/{login}");
        match self.get_json(&path).await? {
            Some(value) => {
                let payload: UserPayload = parse_json(value)?;
                let kind = if payload.kind == "Organization" {
                    AccountKind::Organization
                } else {
                    AccountKind::User
                };
                Ok(Some(Account {
                    login: payload.login,
                    kind,
                }))
            }
            None => Ok(None),
        }
    }
}

// ---------------------------------------------------------------------------
// RepoForge
// ---------------------------------------------------------------------------

#[async_trait]
impl RepoForge for GithubClient {
    async fn create_repository(
        &self,
        org: &str,
        name: &str,
        description: &str,
    ) -> ForgeResult<RepoRef> {
        let req = self
            .request(Method::POST, &format!("/orgs/{org}/repos"))
            .json(&json!({ "name": name, "description": description }));
        let value = self.send_expect_success(req).await?;
        let payload: ForkPayload = parse_json(value)?;
        ref_from_full_name(payload.full_name)
    }

    async fn fork_repository(
        &self,
        owner: &str,
        name: &str,
        into_org: &str,
    ) -> ForgeResult<RepoRef> {
        let req = self
            .request(Method::POST, &format!("/repos/{owner}/{name}/forks"))
            .json(&json!({ "organization": into_org }));
        let value = self.send_expect_success(req).await?;
        let payload: ForkPayload = parse_json(value)?;
        ref_from_full_name(payload.full_name)
    }

    async fn rename_repository(&self, org: &str, from: &str, to: &str) -> ForgeResult<RepoRef> {
        let req = self
            .request(Method::PATCH, &format!("/repos/{org}/{from}"))
            .json(&json!({ "name": to }));
        let value = self.send_expect_success(req).await?;
        let payload: ForkPayload = parse_json(value)?;
        ref_from_full_name(payload.full_name)
    }

    async fn add_collaborator(&self, org: &str, repo: &str, user: &str) -> ForgeResult<()> {
        let req = self.request(
            Method::PUT,
            &format!("/repos/{org}/{repo}/collaborators/{user}"),
        );
        self.send_expect_success(req).await?;
        Ok(())
    }
}
