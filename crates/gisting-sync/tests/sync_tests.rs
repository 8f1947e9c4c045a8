//! End-to-end tests for the sync engine against the in-memory gist host.

use std::collections::HashSet;
use std::sync::Arc;

use gisting_core::types::{GistStatus, Visibility};
use async_trait::async_trait;
use gisting_remote::{
    GistEdit, GistListing, GistRemote, MockFailure, MockRemote, NewGist, RemoteGist,
};
use gisting_store::{Collection, ContentRecord, DraftedGistRecord, Filter, LocalStore, fields};
use gisting_sync::{AppContext, ErrorKind, PLACEHOLDER_CONTENT, SyncEngine};
use tempfile::tempdir;

struct Harness {
    engine: SyncEngine,
    mock: Arc<MockRemote>,
    store: Arc<LocalStore>,
}

fn harness() -> Harness {
    harness_with_store(Arc::new(LocalStore::open_in_memory().unwrap()))
}

fn harness_with_store(store: Arc<LocalStore>) -> Harness {
    let mock = Arc::new(MockRemote::new());
    let engine = SyncEngine::new(AppContext::with_mock(store.clone(), mock.clone()));
    Harness {
        engine,
        mock,
        store,
    }
}

/// Passes calls to a [`MockRemote`] but rewrites create and edit responses.
struct ResponseShaper {
    inner: Arc<MockRemote>,
    shape: fn(&mut RemoteGist),
}

impl ResponseShaper {
    fn reply(&self, mut gist: RemoteGist) -> RemoteGist {
        (self.shape)(&mut gist);
        gist
    }
}

#[async_trait]
impl GistRemote for ResponseShaper {
    async fn list_gists(&self) -> gisting_remote::Result<GistListing> {
        self.inner.list_gists().await
    }

    async fn create_gist(&self, gist: &NewGist) -> gisting_remote::Result<RemoteGist> {
        Ok(self.reply(self.inner.create_gist(gist).await?))
    }

    async fn edit_gist(&self, id: &str, edit: &GistEdit) -> gisting_remote::Result<RemoteGist> {
        Ok(self.reply(self.inner.edit_gist(id, edit).await?))
    }

    async fn delete_gist(&self, id: &str) -> gisting_remote::Result<()> {
        self.inner.delete_gist(id).await
    }

    fn name(&self) -> &str {
        "shaped"
    }
}

fn shaped_harness(shape: fn(&mut RemoteGist)) -> Harness {
    let store = Arc::new(LocalStore::open_in_memory().unwrap());
    let mock = Arc::new(MockRemote::new());
    let remote = Arc::new(ResponseShaper {
        inner: mock.clone(),
        shape,
    });
    let engine = SyncEngine::new(AppContext::new(store.clone(), remote, mock.clone()));
    Harness {
        engine,
        mock,
        store,
    }
}

fn cached_urls(store: &LocalStore, gist_id: &str) -> HashSet<String> {
    store
        .find_all::<ContentRecord>(
            &Filter::new()
                .eq(fields::GIST_ID, gist_id)
                .eq(fields::DRAFT, false),
        )
        .unwrap()
        .into_iter()
        .map(|r| r.raw_url)
        .collect()
}

fn remote_urls(mock: &MockRemote, gist_id: &str) -> HashSet<String> {
    mock.gist(gist_id)
        .unwrap()
        .files
        .values()
        .map(|f| f.raw_url.clone())
        .collect()
}

fn file_id_by_title(engine: &SyncEngine, gist_id: &str, title: &str) -> String {
    engine
        .catalog()
        .files_of(gist_id)
        .into_iter()
        .find(|f| f.title == title)
        .map(|f| f.id.clone())
        .unwrap()
}

// =========================================================================
// Orphan pruning
// =========================================================================

#[tokio::test]
async fn test_cache_matches_live_raw_urls_after_remote_edits() {
    let mut h = harness();
    let id = h
        .mock
        .seed_gist("Notes", true, &[("a.txt", "one"), ("b.txt", "two")]);
    h.engine.reconcile().await.unwrap();
    assert_eq!(cached_urls(&h.store, &id), remote_urls(&h.mock, &id));

    h.mock.external_edit(&id, "a.txt", "uno");
    h.mock.external_edit(&id, "a.txt", "eins");
    let report = h.engine.reconcile().await.unwrap();

    assert_eq!(report.pruned, 1);
    assert_eq!(report.inserted, 1);
    assert_eq!(cached_urls(&h.store, &id), remote_urls(&h.mock, &id));
    assert_eq!(h.engine.catalog().files_of(&id).len(), 2);
}

#[tokio::test]
async fn test_gist_deleted_elsewhere_is_pruned() {
    let mut h = harness();
    let keep = h.mock.seed_gist("Keep", true, &[("a.txt", "one")]);
    let gone = h.mock.seed_gist("Gone", true, &[("b.txt", "two")]);
    h.engine.reconcile().await.unwrap();

    h.mock.delete_gist(&gone).await.unwrap();
    let report = h.engine.reconcile().await.unwrap();

    assert_eq!(report.pruned, 1);
    assert!(cached_urls(&h.store, &gone).is_empty());
    assert_eq!(cached_urls(&h.store, &keep), remote_urls(&h.mock, &keep));
    assert!(h.engine.catalog().gist(&gone).is_none());
}

#[tokio::test]
async fn test_pruning_leaves_drafts_alone() {
    let mut h = harness();
    let gist = h.engine.create_gist("Draft", Visibility::Public).await.unwrap();
    h.engine
        .create_file(&gist.id, "todo.md", "- buy milk")
        .await
        .unwrap();

    let report = h.engine.reconcile().await.unwrap();
    assert_eq!(report.pruned, 0);
    assert_eq!(report.drafted, 1);
    let files = h.engine.catalog().files_of(&gist.id);
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].content.as_deref(), Some("- buy milk"));
}

// =========================================================================
// Identity stability and the draft → published transition
// =========================================================================

#[tokio::test]
async fn test_file_id_survives_edits_and_publish() {
    let mut h = harness();
    let gist = h.engine.create_gist("Notes", Visibility::Secret).await.unwrap();
    let file = h.engine.create_file(&gist.id, "todo.md", "v1").await.unwrap();

    h.engine.save_file(&file.id, "v2").await.unwrap();
    let outcome = h.engine.publish(&gist.id).await.unwrap();
    assert!(outcome.rekeyed());

    let first = h.engine.save_file(&file.id, "v3").await.unwrap();
    let second = h.engine.save_file(&file.id, "v4").await.unwrap();
    assert_eq!(first.id, file.id);
    assert_eq!(second.id, file.id);
    assert_ne!(first.raw_url, second.raw_url);
    assert!(second.updated_at > first.updated_at);

    h.engine.reconcile().await.unwrap();
    let files = h.engine.catalog().files_of(&outcome.gist.id);
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].id, file.id);
    assert_eq!(files[0].raw_url, second.raw_url);
}

#[tokio::test]
async fn test_published_gist_never_returns_to_draft() {
    let mut h = harness();
    let gist = h.engine.create_gist("Notes", Visibility::Public).await.unwrap();
    h.engine.create_file(&gist.id, "a.txt", "a").await.unwrap();
    let published = h.engine.publish(&gist.id).await.unwrap().gist;
    assert_eq!(published.status, GistStatus::Published);

    h.engine.rename_gist(&published.id, "Renamed").await.unwrap();
    let extra = h
        .engine
        .create_file(&published.id, "b.txt", "b")
        .await
        .unwrap();
    h.engine.delete_file(&extra.id).await.unwrap();
    h.engine.reconcile().await.unwrap();
    h.engine.publish(&published.id).await.unwrap();

    let gist = h.engine.catalog().gist(&published.id).unwrap();
    assert_eq!(gist.status, GistStatus::Published);
    assert_eq!(gist.name, "Renamed");
    assert_eq!(h.store.count(Collection::DraftedGists).unwrap(), 0);
}

// =========================================================================
// Staleness
// =========================================================================

#[tokio::test]
async fn test_fresh_cache_needs_no_fetch() {
    let mut h = harness();
    let id = h.mock.seed_gist("Notes", true, &[("a.txt", "one")]);
    h.engine.reconcile().await.unwrap();
    let file_id = file_id_by_title(&h.engine, &id, "a.txt");

    h.engine.get_content(&file_id).await.unwrap();
    assert_eq!(h.mock.calls().fetch, 1);

    let report = h.engine.reconcile().await.unwrap();
    assert_eq!(report.stale, 0);
    assert_eq!(h.engine.get_content(&file_id).await.unwrap(), "one");
    assert_eq!(h.mock.calls().fetch, 1);
}

#[tokio::test]
async fn test_newer_gist_marks_cache_stale() {
    let mut h = harness();
    let id = h
        .mock
        .seed_gist("Notes", true, &[("a.txt", "one"), ("b.txt", "two")]);
    h.engine.reconcile().await.unwrap();
    let a = file_id_by_title(&h.engine, &id, "a.txt");
    h.engine.get_content(&a).await.unwrap();

    // Another client touches b.txt; a.txt keeps its raw URL
    h.mock.external_edit(&id, "b.txt", "zwei");
    let report = h.engine.reconcile().await.unwrap();
    assert_eq!(report.stale, 1);
    assert!(h.engine.catalog().file(&a).unwrap().stale);

    assert_eq!(h.engine.get_content(&a).await.unwrap(), "one");
    assert_eq!(h.mock.calls().fetch, 2);

    // The refetch brought the cache up to date
    h.engine.reconcile().await.unwrap();
    h.engine.get_content(&a).await.unwrap();
    assert_eq!(h.mock.calls().fetch, 2);
}

#[tokio::test]
async fn test_fetch_failure_is_network_error() {
    let mut h = harness();
    let id = h.mock.seed_gist("Notes", true, &[("a.txt", "one")]);
    h.engine.reconcile().await.unwrap();
    let file_id = file_id_by_title(&h.engine, &id, "a.txt");

    h.mock.set_failure(Some(MockFailure::Network));
    let err = h.engine.get_content(&file_id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Network);
    assert!(h.engine.catalog().file(&file_id).unwrap().content.is_none());

    h.mock.set_failure(None);
    assert_eq!(h.engine.get_content(&file_id).await.unwrap(), "one");
}

#[tokio::test]
async fn test_draft_content_never_fetches() {
    let mut h = harness();
    let gist = h.engine.create_gist("Notes", Visibility::Public).await.unwrap();
    let file = h.engine.create_file(&gist.id, "a.txt", "local").await.unwrap();

    h.mock.set_failure(Some(MockFailure::Network));
    assert_eq!(h.engine.get_content(&file.id).await.unwrap(), "local");
    assert_eq!(h.mock.calls().fetch, 0);
}

// =========================================================================
// Atomic publish
// =========================================================================

#[tokio::test]
async fn test_failed_publish_changes_nothing() {
    let mut h = harness();
    let gist = h.engine.create_gist("Notes", Visibility::Public).await.unwrap();
    let file = h.engine.create_file(&gist.id, "todo.md", "- buy milk").await.unwrap();
    let before = h.engine.snapshot();

    h.mock
        .set_failure(Some(MockFailure::Api(500, "Server Error".to_string())));
    let err = h.engine.publish(&gist.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Remote);
    assert_eq!(err.friendly_message(), "Server Error");

    assert_eq!(h.engine.snapshot(), before);
    let record: ContentRecord = h
        .store
        .find_first(&Filter::new().eq(fields::ID, file.id.as_str()))
        .unwrap()
        .unwrap();
    assert!(record.draft);
    assert_eq!(record.gist_id, gist.id);
    let drafted: Vec<DraftedGistRecord> = h.store.find_all(&Filter::new()).unwrap();
    assert_eq!(drafted.len(), 1);
    assert_eq!(h.mock.gist_count(), 0);
}

#[tokio::test]
async fn test_publish_example_scenario() {
    let mut h = harness();
    let gist = h.engine.create_gist("Notes", Visibility::Public).await.unwrap();
    let file = h.engine.create_file(&gist.id, "todo.md", "- buy milk").await.unwrap();

    let outcome = h.engine.publish(&gist.id).await.unwrap();
    let new_id = outcome.gist.id.clone();
    assert_eq!(outcome.previous_id, gist.id);
    assert_eq!(outcome.uploaded, 1);

    // Drafted record gone, map rekeyed
    assert_eq!(h.store.count(Collection::DraftedGists).unwrap(), 0);
    assert!(h.engine.catalog().gist(&gist.id).is_none());
    let remote = h.mock.gist(&new_id).unwrap();
    let remote_file = remote.file("todo.md").unwrap();

    let files = h.engine.catalog().files_of(&new_id);
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].id, file.id);
    assert_eq!(files[0].gist_id, new_id);
    assert_eq!(files[0].raw_url, remote_file.raw_url);
    assert_eq!(files[0].updated_at, remote.updated_at_string());
    assert!(!files[0].draft);

    // A later pass hits the cache instead of creating a duplicate
    let report = h.engine.reconcile().await.unwrap();
    assert_eq!(report.inserted, 0);
    assert_eq!(report.drafted, 0);
    let files = h.engine.catalog().files_of(&new_id);
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].id, file.id);
    assert_eq!(h.store.count(Collection::GistContent).unwrap(), 1);
}

#[tokio::test]
async fn test_publish_uploads_draft_files_of_published_gist() {
    let mut h = harness();
    let id = h.mock.seed_gist("Notes", true, &[("a.txt", "one")]);
    h.store
        .insert(&ContentRecord {
            id: "draft-file".to_string(),
            gist_id: id.clone(),
            title: "b.txt".to_string(),
            description: "Notes".to_string(),
            raw_url: String::new(),
            updated_at: "2024-01-01T00:00:00Z".to_string(),
            content: Some("two".to_string()),
            draft: true,
        })
        .unwrap();

    h.engine.reconcile().await.unwrap();
    assert_eq!(h.engine.catalog().files_of(&id).len(), 2);

    let outcome = h.engine.publish(&id).await.unwrap();
    assert!(!outcome.rekeyed());
    assert_eq!(outcome.uploaded, 1);
    assert_eq!(h.mock.calls().edit, 1);

    let file = h.engine.catalog().file("draft-file").unwrap();
    assert!(!file.draft);
    assert_eq!(file.raw_url, h.mock.gist(&id).unwrap().file("b.txt").unwrap().raw_url);
}

#[tokio::test]
async fn test_publish_caches_uploaded_content_not_response_content() {
    let mut h = shaped_harness(|gist| {
        for file in gist.files.values_mut() {
            if let Some(content) = file.content.as_mut() {
                content.truncate(3);
            }
        }
    });
    let gist = h.engine.create_gist("Notes", Visibility::Public).await.unwrap();
    let file = h.engine.create_file(&gist.id, "big.txt", "0123456789").await.unwrap();

    let outcome = h.engine.publish(&gist.id).await.unwrap();
    assert_eq!(
        h.engine.catalog().file(&file.id).unwrap().content.as_deref(),
        Some("0123456789")
    );

    h.engine.reconcile().await.unwrap();
    let file_id = file_id_by_title(&h.engine, &outcome.gist.id, "big.txt");
    assert_eq!(h.engine.get_content(&file_id).await.unwrap(), "0123456789");
    assert_eq!(h.mock.calls().fetch, 0);
}

#[tokio::test]
async fn test_file_missing_from_publish_response_follows_the_gist() {
    let mut h = shaped_harness(|gist| {
        gist.files.remove("b.txt");
    });
    let gist = h.engine.create_gist("Notes", Visibility::Public).await.unwrap();
    h.engine.create_file(&gist.id, "a.txt", "one").await.unwrap();
    let missing = h.engine.create_file(&gist.id, "b.txt", "two").await.unwrap();

    let outcome = h.engine.publish(&gist.id).await.unwrap();
    let new_id = outcome.gist.id.clone();

    let record: ContentRecord = h
        .store
        .find_first(&Filter::new().eq(fields::ID, missing.id.as_str()))
        .unwrap()
        .unwrap();
    assert_eq!(record.gist_id, new_id);
    assert!(record.draft);

    // The next pass links it to the uploaded file instead of duplicating it
    let report = h.engine.reconcile().await.unwrap();
    assert_eq!(report.drafted, 0);
    assert_eq!(report.inserted, 0);
    let titles: Vec<_> = h
        .engine
        .catalog()
        .files_of(&new_id)
        .into_iter()
        .map(|f| f.title.clone())
        .collect();
    assert_eq!(titles.iter().filter(|t| *t == "b.txt").count(), 1);
    let linked = h.engine.catalog().file(&missing.id).unwrap();
    assert!(!linked.draft);
    assert_eq!(linked.raw_url, h.mock.gist(&new_id).unwrap().file("b.txt").unwrap().raw_url);
    assert_eq!(h.store.count(Collection::GistContent).unwrap(), 2);
    assert!(h.engine.catalog().gist(&gist.id).is_none());
}

// =========================================================================
// Validation
// =========================================================================

#[tokio::test]
async fn test_duplicate_title_fails_without_io() {
    let mut h = harness();
    let id = h.mock.seed_gist("Notes", true, &[("a.txt", "one")]);
    h.engine.reconcile().await.unwrap();
    let draft = h.engine.create_gist("Draft", Visibility::Public).await.unwrap();
    h.engine.create_file(&draft.id, "a.txt", "x").await.unwrap();

    let calls = h.mock.calls();
    let records = h.store.count(Collection::GistContent).unwrap();

    let err = h.engine.create_file(&id, "a.txt", "again").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    let err = h.engine.create_file(&draft.id, " a.txt ", "again").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    assert_eq!(h.mock.calls(), calls);
    assert_eq!(h.store.count(Collection::GistContent).unwrap(), records);
}

#[tokio::test]
async fn test_empty_names_are_rejected() {
    let mut h = harness();
    let err = h.engine.create_gist("   ", Visibility::Public).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let gist = h.engine.create_gist("Notes", Visibility::Public).await.unwrap();
    let err = h.engine.create_file(&gist.id, "", "x").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    let err = h.engine.publish(&gist.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(h.mock.calls().total(), 0);
}

#[tokio::test]
async fn test_unknown_ids_are_consistency_errors() {
    let mut h = harness();
    let err = h.engine.publish("nope").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Consistency);
    let err = h.engine.delete_file("nope").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Consistency);
}

// =========================================================================
// Create / save / rename / delete
// =========================================================================

#[tokio::test]
async fn test_create_file_on_published_gist_goes_remote() {
    let mut h = harness();
    let id = h.mock.seed_gist("Notes", true, &[("a.txt", "one")]);
    h.engine.reconcile().await.unwrap();

    let file = h.engine.create_file(&id, "new.txt", "").await.unwrap();
    assert!(!file.draft);
    assert_eq!(file.content.as_deref(), Some(PLACEHOLDER_CONTENT));
    assert_eq!(file.raw_url, h.mock.gist(&id).unwrap().file("new.txt").unwrap().raw_url);

    assert_eq!(h.engine.get_content(&file.id).await.unwrap(), PLACEHOLDER_CONTENT);
    assert_eq!(h.mock.calls().fetch, 0);
}

#[tokio::test]
async fn test_save_unchanged_content_is_noop() {
    let mut h = harness();
    let id = h.mock.seed_gist("Notes", true, &[("a.txt", "one")]);
    h.engine.reconcile().await.unwrap();
    let file_id = file_id_by_title(&h.engine, &id, "a.txt");
    h.engine.get_content(&file_id).await.unwrap();

    h.engine.save_file(&file_id, "one").await.unwrap();
    assert_eq!(h.mock.calls().edit, 0);

    let saved = h.engine.save_file(&file_id, "uno").await.unwrap();
    assert_eq!(h.mock.calls().edit, 1);
    let record: ContentRecord = h
        .store
        .find_first(&Filter::new().eq(fields::ID, file_id.as_str()))
        .unwrap()
        .unwrap();
    assert_eq!(record.raw_url, saved.raw_url);
    assert_eq!(record.content.as_deref(), Some("uno"));
    assert_eq!(record.updated_at, saved.updated_at);
}

#[tokio::test]
async fn test_publish_with_nothing_to_send_is_noop() {
    let mut h = harness();
    let id = h.mock.seed_gist("Notes", true, &[("a.txt", "one")]);
    h.engine.reconcile().await.unwrap();

    let outcome = h.engine.publish(&id).await.unwrap();
    assert_eq!(outcome.uploaded, 0);
    assert_eq!(h.mock.calls().mutations(), 0);
}

#[tokio::test]
async fn test_rename_published_file_keeps_identity() {
    let mut h = harness();
    let id = h.mock.seed_gist("Notes", true, &[("a.txt", "one")]);
    h.engine.reconcile().await.unwrap();
    let file_id = file_id_by_title(&h.engine, &id, "a.txt");

    let renamed = h.engine.rename_file(&file_id, "b.txt").await.unwrap();
    assert_eq!(renamed.id, file_id);
    assert_eq!(renamed.raw_url, h.mock.gist(&id).unwrap().file("b.txt").unwrap().raw_url);

    let report = h.engine.reconcile().await.unwrap();
    assert_eq!(report.inserted, 0);
    assert_eq!(file_id_by_title(&h.engine, &id, "b.txt"), file_id);
}

#[tokio::test]
async fn test_rename_drafted_gist_and_file() {
    let mut h = harness();
    let gist = h.engine.create_gist("Notes", Visibility::Public).await.unwrap();
    let file = h.engine.create_file(&gist.id, "a.txt", "a").await.unwrap();

    h.engine.rename_gist(&gist.id, "Journal").await.unwrap();
    h.engine.rename_file(&file.id, "b.txt").await.unwrap();
    assert_eq!(h.mock.calls().total(), 0);

    h.engine.reconcile().await.unwrap();
    let gist = h.engine.catalog().gist(&gist.id).unwrap();
    assert_eq!(gist.name, "Journal");
    let file = h.engine.catalog().file(&file.id).unwrap();
    assert_eq!(file.title, "b.txt");
    assert_eq!(file.description, "Journal");
}

#[tokio::test]
async fn test_delete_published_file_and_gist() {
    let mut h = harness();
    let id = h
        .mock
        .seed_gist("Notes", true, &[("a.txt", "one"), ("b.txt", "two")]);
    h.engine.reconcile().await.unwrap();
    let b = file_id_by_title(&h.engine, &id, "b.txt");

    h.engine.delete_file(&b).await.unwrap();
    assert!(h.mock.gist(&id).unwrap().file("b.txt").is_none());
    assert_eq!(cached_urls(&h.store, &id), remote_urls(&h.mock, &id));

    h.engine.delete_gist(&id).await.unwrap();
    assert_eq!(h.mock.gist_count(), 0);
    assert!(h.engine.catalog().is_empty());
    assert_eq!(h.store.count(Collection::GistContent).unwrap(), 0);
}

#[tokio::test]
async fn test_delete_drafted_gist_is_local() {
    let mut h = harness();
    let gist = h.engine.create_gist("Notes", Visibility::Public).await.unwrap();
    h.engine.create_file(&gist.id, "a.txt", "a").await.unwrap();

    h.engine.delete_gist(&gist.id).await.unwrap();
    assert_eq!(h.mock.calls().total(), 0);
    assert_eq!(h.store.count(Collection::DraftedGists).unwrap(), 0);
    assert_eq!(h.store.count(Collection::GistContent).unwrap(), 0);
}

#[tokio::test]
async fn test_drafts_survive_restart() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("gisting.db");

    let gist_id = {
        let mut h = harness_with_store(Arc::new(LocalStore::open(&path).unwrap()));
        let gist = h.engine.create_gist("Notes", Visibility::Secret).await.unwrap();
        h.engine.create_file(&gist.id, "todo.md", "- buy milk").await.unwrap();
        h.store.close().unwrap();
        gist.id
    };

    let mut h = harness_with_store(Arc::new(LocalStore::open(&path).unwrap()));
    h.engine.reconcile().await.unwrap();
    let gist = h.engine.catalog().gist(&gist_id).unwrap();
    assert!(gist.is_draft());
    assert_eq!(gist.visibility, Visibility::Secret);
    let files = h.engine.catalog().files_of(&gist_id);
    assert_eq!(files[0].content.as_deref(), Some("- buy milk"));
}

#[tokio::test]
async fn test_closed_store_is_storage_error() {
    let mut h = harness();
    h.mock.seed_gist("Notes", true, &[("a.txt", "one")]);
    h.store.close().unwrap();

    let err = h.engine.reconcile().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Storage);
    assert!(!err.is_recoverable());
}
