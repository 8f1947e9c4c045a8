//! Capability traits for the remote gist host.
//!
//! The sync engine only talks to [`GistRemote`] and [`ContentFetcher`], so
//! it can run against [`GithubClient`](crate::github::GithubClient) in
//! production and [`MockRemote`](crate::mock::MockRemote) in tests.

use ::async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::api::{GistEdit, GistListing, NewGist, RemoteGist};
use crate::error::Result;

/// List, create, edit and delete gists.
#[async_trait]
pub trait GistRemote: Send + Sync {
    /// Every gist of the authenticated user, all pages flattened.
    ///
    /// The listing is marked incomplete when paging hit the page limit.
    async fn list_gists(&self) -> Result<GistListing>;

    /// Create a gist with all of its files.
    async fn create_gist(&self, gist: &NewGist) -> Result<RemoteGist>;

    /// Change the description and/or add, replace, rename or delete files.
    async fn edit_gist(&self, id: &str, edit: &GistEdit) -> Result<RemoteGist>;

    async fn delete_gist(&self, id: &str) -> Result<()>;

    /// Short name for logging.
    fn name(&self) -> &str;
}

/// Download the body behind a raw URL.
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    async fn fetch(&self, raw_url: &str) -> Result<String>;
}

/// Connection settings for the GitHub API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// API root, overridable for tests
    pub api_base_url: String,
    /// Timeout for API calls
    pub timeout_secs: u64,
    /// Timeout for raw content downloads
    pub raw_timeout_secs: u64,
    /// Page size for listings (the API caps it at 100)
    pub per_page: u32,
    /// Stop listing after this many pages
    pub max_pages: u32,
    pub user_agent: String,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.github.com".to_string(),
            timeout_secs: 10,
            raw_timeout_secs: 5,
            per_page: 100,
            max_pages: 30,
            user_agent: format!("gisting/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl RemoteConfig {
    /// Point the client at a different API root.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RemoteConfig::default();
        assert_eq!(config.api_base_url, "https://api.github.com");
        assert_eq!(config.per_page, 100);
        assert_eq!(config.raw_timeout_secs, 5);
        assert!(config.user_agent.starts_with("gisting/"));
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let config = RemoteConfig::default().with_base_url("http://127.0.0.1:8080/");
        assert_eq!(config.api_base_url, "http://127.0.0.1:8080");
    }
}
