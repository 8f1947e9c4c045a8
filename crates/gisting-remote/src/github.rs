//! GitHub REST client and raw content fetcher.
//!
//! ## Example
//!
//! ```no_run
//! use gisting_remote::{GistRemote, GithubClient, RemoteConfig};
//!
//! # async fn example() -> gisting_remote::Result<()> {
//! let (client, login) = GithubClient::authenticate(RemoteConfig::default(), "ghp_...").await?;
//! println!("signed in as {login}");
//!
//! for gist in client.list_gists().await?.gists {
//!     println!("{} {}", gist.id, gist.description());
//! }
//! # Ok(())
//! # }
//! ```

use ::async_trait::async_trait;
use gisting_core::Config;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tokio::time::Duration;
use tracing::{debug, info, warn};

use crate::api::{ApiErrorBody, GistEdit, GistListing, NewGist, RemoteGist, RemoteUser};
use crate::error::{RemoteError, Result};
use crate::remote::{ContentFetcher, GistRemote, RemoteConfig};

const ACCEPT: &str = "application/vnd.github+json";
const API_VERSION: &str = "2022-11-28";

/// Pick the token to use: an explicit one (flag or environment) wins over
/// the stored one. Blank values count as absent.
pub fn resolve_token(explicit: Option<&str>, config: &Config) -> Option<String> {
    explicit
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .or_else(|| Some(config.access_token.trim()).filter(|t| !t.is_empty()))
        .map(str::to_string)
}

/// Authenticated client for the gist endpoints.
pub struct GithubClient {
    config: RemoteConfig,
    client: reqwest::Client,
    token: String,
}

impl GithubClient {
    /// Create a client without contacting the API.
    pub fn new(config: RemoteConfig, token: impl Into<String>) -> Result<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(RemoteError::Unauthenticated);
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| RemoteError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            config,
            client,
            token,
        })
    }

    /// Create a client and verify the token with `GET /user`.
    ///
    /// Returns the client together with the user's login.
    pub async fn authenticate(config: RemoteConfig, token: impl Into<String>) -> Result<(Self, String)> {
        let client = Self::new(config, token)?;
        let user: RemoteUser = client.send(client.request(Method::GET, "/user")).await?;
        info!(login = %user.login, "authenticated with GitHub");
        Ok((client, user.login))
    }

    pub fn config(&self) -> &RemoteConfig {
        &self.config
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.config.api_base_url, path))
            .bearer_auth(&self.token)
            .header(reqwest::header::ACCEPT, ACCEPT)
            .header("X-GitHub-Api-Version", API_VERSION)
    }

    /// Send a request and decode a JSON body.
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = check_status(request.send().await?).await?;
        response
            .json()
            .await
            .map_err(|e| RemoteError::Decode(e.to_string()))
    }
}

/// Map a non-success response to an error carrying the API's message.
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiErrorBody>(&body)
        .map(|b| b.message)
        .ok()
        .filter(|m| !m.is_empty())
        .or_else(|| Some(body.trim().to_string()).filter(|b| !b.is_empty()))
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown error").to_string());

    warn!(status = status.as_u16(), %message, "GitHub API request failed");
    if status == StatusCode::UNAUTHORIZED {
        Err(RemoteError::Unauthorized(message))
    } else {
        Err(RemoteError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl GistRemote for GithubClient {
    async fn list_gists(&self) -> Result<GistListing> {
        let per_page = self.config.per_page.max(1);
        let mut gists = Vec::new();

        for page in 1..=self.config.max_pages {
            let request = self
                .request(Method::GET, "/gists")
                .query(&[("per_page", per_page), ("page", page)]);
            let batch: Vec<RemoteGist> = self.send(request).await?;
            let count = batch.len();
            gists.extend(batch);
            debug!(page, count, "listed gist page");

            if count < per_page as usize {
                return Ok(GistListing::complete(gists));
            }
        }

        // Every page was full; more may follow
        warn!(max_pages = self.config.max_pages, listed = gists.len(), "gist listing truncated at page limit");
        Ok(GistListing::truncated(gists))
    }

    async fn create_gist(&self, gist: &NewGist) -> Result<RemoteGist> {
        debug!(files = gist.files.len(), public = gist.public, "creating gist");
        let created: RemoteGist = self
            .send(self.request(Method::POST, "/gists").json(gist))
            .await?;
        info!(gist_id = %created.id, "created gist");
        Ok(created)
    }

    async fn edit_gist(&self, id: &str, edit: &GistEdit) -> Result<RemoteGist> {
        debug!(gist_id = id, files = edit.files.len(), "editing gist");
        self.send(self.request(Method::PATCH, &format!("/gists/{id}")).json(edit))
            .await
    }

    async fn delete_gist(&self, id: &str) -> Result<()> {
        let response = self
            .request(Method::DELETE, &format!("/gists/{id}"))
            .send()
            .await?;
        check_status(response).await?;
        info!(gist_id = id, "deleted gist");
        Ok(())
    }

    fn name(&self) -> &str {
        "github"
    }
}

/// Plain HTTP GET for raw content URLs.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(config: &RemoteConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.raw_timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| RemoteError::Config(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ContentFetcher for HttpFetcher {
    async fn fetch(&self, raw_url: &str) -> Result<String> {
        debug!(raw_url, "fetching raw content");
        let response = check_status(self.client.get(raw_url).send().await?).await?;
        let bytes = response.bytes().await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}
