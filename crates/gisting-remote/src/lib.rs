//! # gisting-remote
//!
//! The remote side of gisting: the GitHub Gists API and raw content URLs.
//!
//! This crate provides:
//! - [`GistRemote`] / [`ContentFetcher`] - Capability traits the sync engine consumes
//! - [`GithubClient`] - REST client with token auth and pagination
//! - [`HttpFetcher`] - Raw content download with a short timeout
//! - [`MockRemote`] - In-memory gist host for tests
//! - [`RemoteError`] - API errors versus transport failures

pub mod api;
pub mod error;
pub mod github;
pub mod mock;
pub mod remote;

// Re-export main types
pub use api::{FileContent, FileEdit, GistEdit, GistListing, NewGist, RemoteFile, RemoteGist, RemoteUser};
pub use error::{RemoteError, Result};
pub use github::{GithubClient, HttpFetcher, resolve_token};
pub use mock::{MockCalls, MockFailure, MockRemote};
pub use remote::{ContentFetcher, GistRemote, RemoteConfig};
