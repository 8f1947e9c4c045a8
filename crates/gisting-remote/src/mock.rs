//! In-memory gist host for tests.
//!
//! [`MockRemote`] behaves like the real API where the sync engine cares:
//! every content write assigns a fresh raw URL, every mutation advances the
//! gist's `updated_at`, old raw URLs stay fetchable, and empty file content is
//! rejected. Calls are counted and failures can be injected.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use ::async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use tracing::debug;

use crate::api::{GistEdit, GistListing, NewGist, RemoteFile, RemoteGist};
use crate::error::{RemoteError, Result};
use crate::remote::{ContentFetcher, GistRemote};

/// Base of the raw URLs handed out by the mock.
pub const MOCK_RAW_BASE: &str = "https://gist.example/raw";

/// Failure the mock returns instead of doing the work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockFailure {
    /// An API error with status and message
    Api(u16, String),
    /// A connection failure
    Network,
}

impl MockFailure {
    fn to_error(&self) -> RemoteError {
        match self {
            MockFailure::Api(status, message) => RemoteError::Api {
                status: *status,
                message: message.clone(),
            },
            MockFailure::Network => RemoteError::Connection("connection refused".to_string()),
        }
    }
}

/// Snapshot of the call counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MockCalls {
    pub list: usize,
    pub create: usize,
    pub edit: usize,
    pub delete: usize,
    pub fetch: usize,
}

impl MockCalls {
    /// Calls that change remote state.
    pub fn mutations(&self) -> usize {
        self.create + self.edit + self.delete
    }

    /// Every counted call.
    pub fn total(&self) -> usize {
        self.list + self.mutations() + self.fetch
    }
}

#[derive(Debug, Clone)]
struct MockFile {
    raw_url: String,
    content: String,
}

#[derive(Debug, Clone)]
struct MockGist {
    description: String,
    public: bool,
    updated_at: DateTime<Utc>,
    files: BTreeMap<String, MockFile>,
}

#[derive(Debug)]
struct MockState {
    gists: BTreeMap<String, MockGist>,
    blobs: HashMap<String, String>,
    next_id: usize,
    revision: usize,
    clock: DateTime<Utc>,
}

impl MockState {
    fn tick(&mut self) -> DateTime<Utc> {
        self.clock += Duration::minutes(1);
        self.clock
    }

    fn write_file(&mut self, gist_id: &str, filename: &str, content: String) -> MockFile {
        self.revision += 1;
        let raw_url = format!("{MOCK_RAW_BASE}/{gist_id}/{}/{filename}", self.revision);
        self.blobs.insert(raw_url.clone(), content.clone());
        MockFile { raw_url, content }
    }

    fn snapshot(&self, id: &str, with_content: bool) -> Option<RemoteGist> {
        let gist = self.gists.get(id)?;
        Some(RemoteGist {
            id: id.to_string(),
            description: Some(gist.description.clone()),
            public: gist.public,
            updated_at: gist.updated_at,
            files: gist
                .files
                .iter()
                .map(|(name, file)| {
                    (
                        name.clone(),
                        RemoteFile {
                            filename: name.clone(),
                            raw_url: file.raw_url.clone(),
                            content: with_content.then(|| file.content.clone()),
                        },
                    )
                })
                .collect(),
        })
    }
}

/// In-memory [`GistRemote`] and [`ContentFetcher`].
pub struct MockRemote {
    state: Mutex<MockState>,
    failure: Mutex<Option<MockFailure>>,
    list_limit: Mutex<Option<usize>>,
    list_calls: AtomicUsize,
    create_calls: AtomicUsize,
    edit_calls: AtomicUsize,
    delete_calls: AtomicUsize,
    fetch_calls: AtomicUsize,
}

impl Default for MockRemote {
    fn default() -> Self {
        Self::new()
    }
}

impl MockRemote {
    pub fn new() -> Self {
        let clock = Utc
            .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
            .single()
            .unwrap_or_default();
        Self {
            state: Mutex::new(MockState {
                gists: BTreeMap::new(),
                blobs: HashMap::new(),
                next_id: 0,
                revision: 0,
                clock,
            }),
            failure: Mutex::new(None),
            list_limit: Mutex::new(None),
            list_calls: AtomicUsize::new(0),
            create_calls: AtomicUsize::new(0),
            edit_calls: AtomicUsize::new(0),
            delete_calls: AtomicUsize::new(0),
            fetch_calls: AtomicUsize::new(0),
        }
    }

    fn state(&self) -> Result<std::sync::MutexGuard<'_, MockState>> {
        self.state
            .lock()
            .map_err(|_| RemoteError::Config("mock state poisoned".to_string()))
    }

    fn check_failure(&self) -> Result<()> {
        let failure = self
            .failure
            .lock()
            .map_err(|_| RemoteError::Config("mock state poisoned".to_string()))?;
        match failure.as_ref() {
            Some(f) => Err(f.to_error()),
            None => Ok(()),
        }
    }

    /// Make every following call fail until cleared with `None`.
    pub fn set_failure(&self, failure: Option<MockFailure>) {
        if let Ok(mut guard) = self.failure.lock() {
            *guard = failure;
        }
    }

    /// Cap listings at `limit` gists, reporting them incomplete when more exist.
    pub fn set_list_limit(&self, limit: Option<usize>) {
        if let Ok(mut guard) = self.list_limit.lock() {
            *guard = limit;
        }
    }

    pub fn calls(&self) -> MockCalls {
        MockCalls {
            list: self.list_calls.load(Ordering::SeqCst),
            create: self.create_calls.load(Ordering::SeqCst),
            edit: self.edit_calls.load(Ordering::SeqCst),
            delete: self.delete_calls.load(Ordering::SeqCst),
            fetch: self.fetch_calls.load(Ordering::SeqCst),
        }
    }

    /// Add a gist directly, without counting a call. Returns its ID.
    pub fn seed_gist(&self, description: &str, public: bool, files: &[(&str, &str)]) -> String {
        let Ok(mut state) = self.state.lock() else {
            return String::new();
        };
        state.next_id += 1;
        let id = format!("g{}", state.next_id);
        let updated_at = state.tick();
        let mut stored = BTreeMap::new();
        for (name, content) in files {
            let file = state.write_file(&id, name, content.to_string());
            stored.insert(name.to_string(), file);
        }
        state.gists.insert(
            id.clone(),
            MockGist {
                description: description.to_string(),
                public,
                updated_at,
                files: stored,
            },
        );
        id
    }

    /// Change a file as another client would, without counting a call.
    pub fn external_edit(&self, gist_id: &str, filename: &str, content: &str) {
        let Ok(mut state) = self.state.lock() else {
            return;
        };
        if !state.gists.contains_key(gist_id) {
            return;
        }
        let file = state.write_file(gist_id, filename, content.to_string());
        let updated_at = state.tick();
        if let Some(gist) = state.gists.get_mut(gist_id) {
            gist.files.insert(filename.to_string(), file);
            gist.updated_at = updated_at;
        }
    }

    /// Current remote view of one gist, with content.
    pub fn gist(&self, id: &str) -> Option<RemoteGist> {
        self.state.lock().ok()?.snapshot(id, true)
    }

    pub fn gist_count(&self) -> usize {
        self.state.lock().map(|s| s.gists.len()).unwrap_or_default()
    }
}

#[async_trait]
impl GistRemote for MockRemote {
    async fn list_gists(&self) -> Result<GistListing> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;
        let limit = self
            .list_limit
            .lock()
            .map_err(|_| RemoteError::Config("mock state poisoned".to_string()))?
            .unwrap_or(usize::MAX);
        let state = self.state()?;
        let gists: Vec<RemoteGist> = state
            .gists
            .keys()
            .take(limit)
            .filter_map(|id| state.snapshot(id, false))
            .collect();
        if state.gists.len() > limit {
            Ok(GistListing::truncated(gists))
        } else {
            Ok(GistListing::complete(gists))
        }
    }

    async fn create_gist(&self, gist: &NewGist) -> Result<RemoteGist> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;
        if gist.files.is_empty() {
            return Err(RemoteError::Api {
                status: 422,
                message: "Validation Failed: files cannot be empty".to_string(),
            });
        }
        if gist.files.values().any(|f| f.content.is_empty()) {
            return Err(RemoteError::Api {
                status: 422,
                message: "Validation Failed: contents can't be blank".to_string(),
            });
        }

        let mut state = self.state()?;
        state.next_id += 1;
        let id = format!("g{}", state.next_id);
        let updated_at = state.tick();
        let mut files = BTreeMap::new();
        for (name, file) in &gist.files {
            let stored = state.write_file(&id, name, file.content.clone());
            files.insert(name.clone(), stored);
        }
        state.gists.insert(
            id.clone(),
            MockGist {
                description: gist.description.clone(),
                public: gist.public,
                updated_at,
                files,
            },
        );
        debug!(gist_id = %id, "mock created gist");
        state
            .snapshot(&id, true)
            .ok_or_else(|| RemoteError::Decode("created gist vanished".to_string()))
    }

    async fn edit_gist(&self, id: &str, edit: &GistEdit) -> Result<RemoteGist> {
        self.edit_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;
        let mut state = self.state()?;
        let Some(mut gist) = state.gists.get(id).cloned() else {
            return Err(RemoteError::Api {
                status: 404,
                message: "Not Found".to_string(),
            });
        };

        if let Some(description) = &edit.description {
            gist.description = description.clone();
        }

        for (name, change) in &edit.files {
            match change {
                None => {
                    gist.files.remove(name);
                }
                Some(change) => {
                    let existing = gist.files.get(name).cloned();
                    let content = match (&change.content, &existing) {
                        (Some(content), _) => content.clone(),
                        (None, Some(file)) => file.content.clone(),
                        (None, None) => String::new(),
                    };
                    if content.is_empty() {
                        return Err(RemoteError::Api {
                            status: 422,
                            message: "Validation Failed: contents can't be blank".to_string(),
                        });
                    }
                    let target = change.filename.clone().unwrap_or_else(|| name.clone());
                    if target != *name {
                        gist.files.remove(name);
                    }
                    let unchanged = target == *name
                        && existing.as_ref().is_some_and(|f| f.content == content);
                    if !unchanged {
                        let file = state.write_file(id, &target, content);
                        gist.files.insert(target, file);
                    }
                }
            }
        }

        gist.updated_at = state.tick();
        state.gists.insert(id.to_string(), gist);
        state
            .snapshot(id, true)
            .ok_or_else(|| RemoteError::Decode("edited gist vanished".to_string()))
    }

    async fn delete_gist(&self, id: &str) -> Result<()> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;
        let mut state = self.state()?;
        match state.gists.remove(id) {
            Some(_) => Ok(()),
            None => Err(RemoteError::Api {
                status: 404,
                message: "Not Found".to_string(),
            }),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[async_trait]
impl ContentFetcher for MockRemote {
    async fn fetch(&self, raw_url: &str) -> Result<String> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;
        self.state()?
            .blobs
            .get(raw_url)
            .cloned()
            .ok_or_else(|| RemoteError::Api {
                status: 404,
                message: "Not Found".to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_edit_rewrites_raw_url_and_time() {
        let remote = MockRemote::new();
        let id = remote.seed_gist("Notes", true, &[("a.txt", "one"), ("b.txt", "two")]);
        let before = remote.gist(&id).unwrap();

        let after = remote
            .edit_gist(&id, &GistEdit::new().put_file("a.txt", "uno"))
            .await
            .unwrap();

        assert!(after.updated_at > before.updated_at);
        assert_ne!(after.files["a.txt"].raw_url, before.files["a.txt"].raw_url);
        assert_eq!(after.files["b.txt"].raw_url, before.files["b.txt"].raw_url);

        // Old revisions stay fetchable
        let old = remote.fetch(&before.files["a.txt"].raw_url).await.unwrap();
        assert_eq!(old, "one");
        assert_eq!(remote.calls().edit, 1);
        assert_eq!(remote.calls().fetch, 1);
    }

    #[tokio::test]
    async fn test_rename_and_delete() {
        let remote = MockRemote::new();
        let id = remote.seed_gist("Notes", true, &[("a.txt", "one"), ("b.txt", "two")]);

        let after = remote
            .edit_gist(
                &id,
                &GistEdit::new()
                    .rename_file("a.txt", "c.txt", None)
                    .delete_file("b.txt"),
            )
            .await
            .unwrap();

        let names: Vec<_> = after.files.keys().cloned().collect();
        assert_eq!(names, vec!["c.txt".to_string()]);
        assert_eq!(after.files["c.txt"].content.as_deref(), Some("one"));
    }

    #[tokio::test]
    async fn test_empty_content_is_rejected() {
        let remote = MockRemote::new();
        let id = remote.seed_gist("Notes", true, &[("a.txt", "one")]);

        let err = remote
            .edit_gist(&id, &GistEdit::new().put_file("new.txt", ""))
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(422));
        assert!(remote.gist(&id).unwrap().file("new.txt").is_none());
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let remote = MockRemote::new();
        remote.set_failure(Some(MockFailure::Network));

        let err = remote.list_gists().await.unwrap_err();
        assert!(err.is_transport());
        assert_eq!(remote.calls().list, 1);

        remote.set_failure(None);
        assert!(remote.list_gists().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_listing_omits_content() {
        let remote = MockRemote::new();
        remote.seed_gist("Notes", false, &[("a.txt", "one")]);

        let listing = remote.list_gists().await.unwrap();
        assert!(listing.complete);
        let gists = listing.gists;
        assert_eq!(gists.len(), 1);
        assert!(gists[0].files["a.txt"].content.is_none());
        assert!(!gists[0].public);
    }

    #[tokio::test]
    async fn test_list_limit_marks_listing_incomplete() {
        let remote = MockRemote::new();
        remote.seed_gist("One", true, &[("a.txt", "a")]);
        remote.seed_gist("Two", true, &[("b.txt", "b")]);

        remote.set_list_limit(Some(1));
        let listing = remote.list_gists().await.unwrap();
        assert_eq!(listing.len(), 1);
        assert!(!listing.complete);

        remote.set_list_limit(Some(2));
        assert!(remote.list_gists().await.unwrap().complete);
    }
}
