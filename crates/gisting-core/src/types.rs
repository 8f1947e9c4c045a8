//! Shared type definitions used across gisting crates.
//!
//! A [`Gist`] is a named collection of [`GistFile`]s. Gists and files are
//! created locally as drafts and become published once uploaded; the
//! transition is one-way.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of a gist: a local UUID while drafted, the remote ID once published.
pub type GistId = String;

/// Stable local identifier of a file. Never changes, not even on publish.
pub type FileId = String;

/// Lifecycle status of a gist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GistStatus {
    /// Exists only in the local store
    #[default]
    Drafted,
    /// Exists on the remote host
    Published,
}

impl GistStatus {
    /// Returns true for published gists.
    pub fn is_published(&self) -> bool {
        matches!(self, Self::Published)
    }
}

impl std::fmt::Display for GistStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Drafted => write!(f, "drafted"),
            Self::Published => write!(f, "published"),
        }
    }
}

/// Visibility of a gist on the remote host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    Public,
    Secret,
}

impl Visibility {
    /// Map the remote `public` flag.
    pub fn from_public(public: bool) -> Self {
        if public { Self::Public } else { Self::Secret }
    }

    pub fn is_public(&self) -> bool {
        matches!(self, Self::Public)
    }

    /// The other visibility (used by the create dialog toggle).
    pub fn toggle(&self) -> Self {
        match self {
            Self::Public => Self::Secret,
            Self::Secret => Self::Public,
        }
    }
}

impl std::fmt::Display for Visibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Public => write!(f, "public"),
            Self::Secret => write!(f, "secret"),
        }
    }
}

/// A named collection of files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gist {
    /// Local UUID for drafts, remote ID once published
    pub id: GistId,
    /// Display name (the remote description)
    pub name: String,
    /// Lifecycle status
    pub status: GistStatus,
    /// Public or secret
    pub visibility: Visibility,
    /// Last update, see [`format_timestamp`]
    pub updated_at: String,
}

impl Gist {
    /// Create a new drafted gist with a fresh local identifier.
    pub fn draft(id: impl Into<GistId>, name: impl Into<String>, visibility: Visibility) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            status: GistStatus::Drafted,
            visibility,
            updated_at: timestamp_now(),
        }
    }

    pub fn is_draft(&self) -> bool {
        self.status == GistStatus::Drafted
    }

    /// Parsed `updated_at`, if it is a valid RFC 3339 timestamp.
    pub fn updated_at_time(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.updated_at)
    }
}

/// A single named content blob belonging to one gist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GistFile {
    /// Stable local identifier
    pub id: FileId,
    /// Owning gist
    pub gist_id: GistId,
    /// File name
    pub title: String,
    /// Inherited from the gist description
    pub description: String,
    /// Remote raw-content URL, empty until published. Changes on every edit.
    pub raw_url: String,
    /// Last update, see [`format_timestamp`]
    pub updated_at: String,
    /// Cached content, absent until fetched
    pub content: Option<String>,
    /// Exists only locally
    pub draft: bool,
    /// Cached content may be older than the remote
    pub stale: bool,
}

impl GistFile {
    /// Create a new draft file for the given gist.
    pub fn draft(
        id: impl Into<FileId>,
        gist: &Gist,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            gist_id: gist.id.clone(),
            title: title.into(),
            description: gist.name.clone(),
            raw_url: String::new(),
            updated_at: timestamp_now(),
            content: Some(content.into()),
            draft: true,
            stale: false,
        }
    }

    /// File extension without the dot, lowercased.
    pub fn extension(&self) -> Option<String> {
        let (stem, ext) = self.title.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            return None;
        }
        Some(ext.to_ascii_lowercase())
    }
}

/// Format a timestamp so that lexicographic and chronological order coincide.
///
/// Always UTC, second precision, `Z` suffix: `2024-05-01T12:00:00Z`. This is
/// the same shape the GitHub API uses.
pub fn format_timestamp(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// The current time formatted with [`format_timestamp`].
pub fn timestamp_now() -> String {
    format_timestamp(Utc::now())
}

/// Parse a timestamp produced by [`format_timestamp`].
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}
