//! Wire types for the GitHub Gists REST API.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use gisting_core::types::{Visibility, format_timestamp};
use serde::{Deserialize, Serialize};

/// A gist as returned by list, create and edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteGist {
    pub id: String,
    #[serde(default)]
    pub description: Option<String>,
    pub public: bool,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub files: BTreeMap<String, RemoteFile>,
}

impl RemoteGist {
    /// Description, empty when the API sent `null`.
    pub fn description(&self) -> &str {
        self.description.as_deref().unwrap_or_default()
    }

    pub fn visibility(&self) -> Visibility {
        Visibility::from_public(self.public)
    }

    /// `updated_at` in the comparable string form used by the cache.
    pub fn updated_at_string(&self) -> String {
        format_timestamp(self.updated_at)
    }

    /// Look up a file by its file name.
    pub fn file(&self, filename: &str) -> Option<&RemoteFile> {
        self.files
            .get(filename)
            .or_else(|| self.files.values().find(|f| f.filename == filename))
    }
}

/// Result of listing the user's gists.
///
/// `complete` is false when paging stopped at the page limit, so gists
/// missing from `gists` may still exist remotely.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GistListing {
    pub gists: Vec<RemoteGist>,
    pub complete: bool,
}

impl GistListing {
    pub fn complete(gists: Vec<RemoteGist>) -> Self {
        Self { gists, complete: true }
    }

    pub fn truncated(gists: Vec<RemoteGist>) -> Self {
        Self {
            gists,
            complete: false,
        }
    }

    pub fn len(&self) -> usize {
        self.gists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gists.is_empty()
    }
}

/// One file of a [`RemoteGist`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteFile {
    pub filename: String,
    #[serde(default)]
    pub raw_url: String,
    /// Present on single-gist responses, absent on listings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// Body of `POST /gists`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewGist {
    pub description: String,
    pub public: bool,
    pub files: BTreeMap<String, FileContent>,
}

impl NewGist {
    pub fn new(description: impl Into<String>, visibility: Visibility) -> Self {
        Self {
            description: description.into(),
            public: visibility.is_public(),
            files: BTreeMap::new(),
        }
    }

    pub fn file(mut self, filename: impl Into<String>, content: impl Into<String>) -> Self {
        self.files.insert(
            filename.into(),
            FileContent {
                content: content.into(),
            },
        );
        self
    }
}

/// File body of a [`NewGist`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileContent {
    pub content: String,
}

/// Body of `PATCH /gists/{id}`.
///
/// A file mapped to `None` serializes as `null`, which deletes it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GistEdit {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub files: BTreeMap<String, Option<FileEdit>>,
}

impl GistEdit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Add a file or replace its content.
    pub fn put_file(mut self, filename: impl Into<String>, content: impl Into<String>) -> Self {
        self.files.insert(
            filename.into(),
            Some(FileEdit {
                filename: None,
                content: Some(content.into()),
            }),
        );
        self
    }

    /// Rename a file, optionally replacing its content in the same call.
    pub fn rename_file(
        mut self,
        from: impl Into<String>,
        to: impl Into<String>,
        content: Option<String>,
    ) -> Self {
        self.files.insert(
            from.into(),
            Some(FileEdit {
                filename: Some(to.into()),
                content,
            }),
        );
        self
    }

    pub fn delete_file(mut self, filename: impl Into<String>) -> Self {
        self.files.insert(filename.into(), None);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.description.is_none() && self.files.is_empty()
    }
}

/// Per-file change inside a [`GistEdit`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FileEdit {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// The authenticated user, from `GET /user`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteUser {
    pub login: String,
}

/// Error body the API sends with non-success statuses.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiErrorBody {
    pub message: String,
}
