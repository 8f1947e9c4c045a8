//! Typed records for the two store collections.
//!
//! Every field carries `#[serde(default)]` semantics: a record written by an
//! older build that lacks a field decodes with the zero value for it.

use gisting_core::types::{FileId, Gist, GistFile, GistId, GistStatus, Visibility, timestamp_now};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Logical collection a record lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    /// Cached file metadata and content, draft and published alike
    GistContent,
    /// Gists that exist only locally
    DraftedGists,
}

impl Collection {
    /// Name stored in the `collection` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::GistContent => "gist_content",
            Collection::DraftedGists => "drafted_gists",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A record type bound to one collection.
pub trait Record: Serialize + DeserializeOwned {
    const COLLECTION: Collection;
}

/// Field names usable in filters and updates.
pub mod fields {
    pub const ID: &str = "id";
    pub const GIST_ID: &str = "gist_id";
    pub const TITLE: &str = "title";
    pub const DESCRIPTION: &str = "description";
    pub const RAW_URL: &str = "raw_url";
    pub const UPDATED_AT: &str = "updated_at";
    pub const CONTENT: &str = "content";
    pub const DRAFT: &str = "draft";
    pub const STATUS: &str = "status";
    pub const VISIBILITY: &str = "visibility";
}

/// One cached gist file.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentRecord {
    pub id: FileId,
    pub gist_id: GistId,
    pub title: String,
    pub description: String,
    pub raw_url: String,
    pub updated_at: String,
    pub content: Option<String>,
    pub draft: bool,
}

impl Record for ContentRecord {
    const COLLECTION: Collection = Collection::GistContent;
}

impl ContentRecord {
    /// Rebuild the in-memory file. Staleness is decided by the caller.
    pub fn to_file(&self, stale: bool) -> GistFile {
        GistFile {
            id: self.id.clone(),
            gist_id: self.gist_id.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            raw_url: self.raw_url.clone(),
            updated_at: self.updated_at.clone(),
            content: self.content.clone(),
            draft: self.draft,
            stale,
        }
    }
}

impl From<&GistFile> for ContentRecord {
    fn from(file: &GistFile) -> Self {
        Self {
            id: file.id.clone(),
            gist_id: file.gist_id.clone(),
            title: file.title.clone(),
            description: file.description.clone(),
            raw_url: file.raw_url.clone(),
            updated_at: file.updated_at.clone(),
            content: file.content.clone(),
            draft: file.draft,
        }
    }
}

/// A gist that has not been published yet.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DraftedGistRecord {
    pub id: GistId,
    pub description: String,
    pub status: GistStatus,
    pub visibility: Visibility,
    pub updated_at: String,
}

impl Record for DraftedGistRecord {
    const COLLECTION: Collection = Collection::DraftedGists;
}

impl DraftedGistRecord {
    /// Rebuild the in-memory gist. Records always load as drafted.
    pub fn to_gist(&self) -> Gist {
        let updated_at = if self.updated_at.is_empty() {
            timestamp_now()
        } else {
            self.updated_at.clone()
        };
        Gist {
            id: self.id.clone(),
            name: self.description.clone(),
            status: GistStatus::Drafted,
            visibility: self.visibility,
            updated_at,
        }
    }
}

impl From<&Gist> for DraftedGistRecord {
    fn from(gist: &Gist) -> Self {
        Self {
            id: gist.id.clone(),
            description: gist.name.clone(),
            status: gist.status,
            visibility: gist.visibility,
            updated_at: gist.updated_at.clone(),
        }
    }
}
