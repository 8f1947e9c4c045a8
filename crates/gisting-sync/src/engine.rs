//! Reconciliation of remote gists with the local cache and drafts.

use std::collections::HashSet;

use gisting_core::types::{Gist, GistFile, GistStatus};
use gisting_remote::{RemoteFile, RemoteGist};
use gisting_store::{ContentRecord, DraftedGistRecord, FieldUpdates, Filter, fields};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::catalog::{GistCatalog, GistEntry};
use crate::context::AppContext;
use crate::error::{Result, SyncError};

/// Counters from one reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Published gists listed by the remote
    pub published: usize,
    /// Drafted gists loaded from the store
    pub drafted: usize,
    /// Cache records created for files seen for the first time
    pub inserted: usize,
    /// Cache records whose metadata was rewritten
    pub refreshed: usize,
    /// Cache records removed because their raw URL is gone
    pub pruned: usize,
    /// Files whose cached content is older than the remote
    pub stale: usize,
    /// The listing stopped at the page limit; pruning was skipped
    pub truncated: bool,
}

/// Owns the gist catalog and keeps it consistent with the store and remote.
///
/// All mutation goes through `&mut self`, so a single owner (the sync worker)
/// serializes every operation.
pub struct SyncEngine {
    pub(crate) ctx: AppContext,
    pub(crate) catalog: GistCatalog,
}

impl SyncEngine {
    pub fn new(ctx: AppContext) -> Self {
        Self {
            ctx,
            catalog: GistCatalog::new(),
        }
    }

    pub fn context(&self) -> &AppContext {
        &self.ctx
    }

    pub fn catalog(&self) -> &GistCatalog {
        &self.catalog
    }

    /// Sorted projection of the catalog.
    pub fn snapshot(&self) -> Vec<GistEntry> {
        self.catalog.snapshot()
    }

    pub(crate) fn new_id() -> String {
        Uuid::new_v4().to_string()
    }

    /// Rebuild the catalog from the remote listing, the cache and drafts.
    ///
    /// Remote files are matched to cache records by raw URL. Records whose
    /// raw URL is no longer live are pruned only after every remote file has
    /// been processed, and never after an incomplete listing. Drafts are
    /// loaded last. The catalog is replaced only when the whole pass
    /// succeeds.
    #[instrument(skip(self))]
    pub async fn reconcile(&mut self) -> Result<ReconcileReport> {
        let listing = self.ctx.remote.list_gists().await?;
        let mut report = ReconcileReport {
            published: listing.len(),
            truncated: !listing.complete,
            ..ReconcileReport::default()
        };
        let mut catalog = GistCatalog::new();
        let mut live_urls = HashSet::new();

        for remote in &listing.gists {
            self.merge_remote_gist(remote, &mut catalog, &mut live_urls, &mut report)?;
        }

        if listing.complete {
            report.pruned = self.prune_orphans(&live_urls)?;
        } else {
            warn!(listed = listing.len(), "gist listing incomplete; keeping unlisted cache records");
        }
        report.drafted = self.load_drafts(&mut catalog)?;

        info!(
            published = report.published,
            drafted = report.drafted,
            inserted = report.inserted,
            refreshed = report.refreshed,
            pruned = report.pruned,
            stale = report.stale,
            truncated = report.truncated,
            "reconciliation complete"
        );
        self.catalog = catalog;
        Ok(report)
    }

    fn merge_remote_gist(
        &self,
        remote: &RemoteGist,
        catalog: &mut GistCatalog,
        live_urls: &mut HashSet<String>,
        report: &mut ReconcileReport,
    ) -> Result<()> {
        let store = &self.ctx.store;
        let gist = Gist {
            id: remote.id.clone(),
            name: remote.description().to_string(),
            status: GistStatus::Published,
            visibility: remote.visibility(),
            updated_at: remote.updated_at_string(),
        };
        catalog.insert_gist(gist.clone());

        for remote_file in remote.files.values() {
            live_urls.insert(remote_file.raw_url.clone());

            let cached: Option<ContentRecord> = store.find_first(
                &Filter::new()
                    .eq(fields::RAW_URL, remote_file.raw_url.as_str())
                    .eq(fields::DRAFT, false),
            )?;

            let cached = match cached {
                Some(record) => Some(record),
                None => self.adopt_uploaded_draft(&gist.id, remote_file)?,
            };

            let (record, stale) = match cached {
                None => {
                    let record = ContentRecord {
                        id: Self::new_id(),
                        gist_id: gist.id.clone(),
                        title: remote_file.filename.clone(),
                        description: gist.name.clone(),
                        raw_url: remote_file.raw_url.clone(),
                        updated_at: gist.updated_at.clone(),
                        content: None,
                        draft: false,
                    };
                    store.insert(&record)?;
                    report.inserted += 1;
                    debug!(gist_id = %gist.id, file_id = %record.id, raw_url = %record.raw_url, "cached new remote file");
                    (record, false)
                }
                Some(mut record) => {
                    let mut updates = FieldUpdates::new();
                    if record.gist_id != gist.id {
                        updates = updates.set(fields::GIST_ID, gist.id.as_str());
                        record.gist_id = gist.id.clone();
                    }
                    if record.title != remote_file.filename {
                        updates = updates.set(fields::TITLE, remote_file.filename.as_str());
                        record.title = remote_file.filename.clone();
                    }
                    if record.description != gist.name {
                        updates = updates.set(fields::DESCRIPTION, gist.name.as_str());
                        record.description = gist.name.clone();
                    }
                    if !updates.is_empty() {
                        store.update::<ContentRecord>(
                            &Filter::new().eq(fields::ID, record.id.as_str()),
                            &updates,
                        )?;
                        report.refreshed += 1;
                    }

                    let stale = record.updated_at < gist.updated_at;
                    if stale {
                        report.stale += 1;
                    }
                    (record, stale)
                }
            };

            let mut file = record.to_file(stale);
            file.updated_at = gist.updated_at.clone();
            catalog.add_file(file)?;
        }

        // Draft files added to an already published gist
        let drafts: Vec<ContentRecord> = store.find_all(
            &Filter::new()
                .eq(fields::GIST_ID, gist.id.as_str())
                .eq(fields::DRAFT, true),
        )?;
        for record in drafts {
            catalog.add_file(record.to_file(false))?;
        }
        Ok(())
    }

    /// A draft record of this gist with the remote file's title was uploaded
    /// but never linked to its raw URL; link it now so the file keeps its ID.
    fn adopt_uploaded_draft(&self, gist_id: &str, remote_file: &RemoteFile) -> Result<Option<ContentRecord>> {
        let store = &self.ctx.store;
        let draft: Option<ContentRecord> = store.find_first(
            &Filter::new()
                .eq(fields::GIST_ID, gist_id)
                .eq(fields::TITLE, remote_file.filename.as_str())
                .eq(fields::DRAFT, true),
        )?;
        let Some(mut record) = draft else {
            return Ok(None);
        };
        store.update::<ContentRecord>(
            &Filter::new().eq(fields::ID, record.id.as_str()),
            &FieldUpdates::new()
                .set(fields::RAW_URL, remote_file.raw_url.as_str())
                .set(fields::DRAFT, false),
        )?;
        record.raw_url = remote_file.raw_url.clone();
        record.draft = false;
        debug!(gist_id, file_id = %record.id, raw_url = %record.raw_url, "linked uploaded draft to remote file");
        Ok(Some(record))
    }

    fn prune_orphans(&self, live_urls: &HashSet<String>) -> Result<usize> {
        let store = &self.ctx.store;
        let cached: Vec<ContentRecord> = store.find_all(&Filter::new().eq(fields::DRAFT, false))?;

        let mut pruned = 0;
        for record in cached.iter().filter(|r| !live_urls.contains(&r.raw_url)) {
            pruned += store.delete::<ContentRecord>(
                &Filter::new()
                    .eq(fields::ID, record.id.as_str())
                    .eq(fields::RAW_URL, record.raw_url.as_str())
                    .eq(fields::DRAFT, false),
            )?;
            debug!(file_id = %record.id, raw_url = %record.raw_url, "pruned orphaned cache record");
        }
        Ok(pruned)
    }

    fn load_drafts(&self, catalog: &mut GistCatalog) -> Result<usize> {
        let store = &self.ctx.store;
        let records: Vec<DraftedGistRecord> = store.find_all(&Filter::new())?;

        let mut loaded = 0;
        for record in records {
            if catalog.gist(&record.id).is_some() {
                warn!(gist_id = %record.id, "drafted gist collides with a published gist; skipping");
                continue;
            }
            catalog.insert_gist(record.to_gist());

            let files: Vec<ContentRecord> = store.find_all(
                &Filter::new()
                    .eq(fields::GIST_ID, record.id.as_str())
                    .eq(fields::DRAFT, true),
            )?;
            for file in files {
                catalog.add_file(file.to_file(false))?;
            }
            loaded += 1;
        }
        Ok(loaded)
    }

    /// Content of a file, fetched lazily.
    ///
    /// Drafts answer from memory. A published file answers from the cache
    /// when the cached copy is at least as new as the remote gist; otherwise
    /// the raw URL is fetched and the cache updated. A fetch failure leaves
    /// the cache untouched.
    #[instrument(skip(self))]
    pub async fn get_content(&mut self, file_id: &str) -> Result<String> {
        let file = self
            .catalog
            .file(file_id)
            .cloned()
            .ok_or_else(|| SyncError::consistency(format!("unknown file {file_id}")))?;

        if file.draft {
            return Ok(file.content.unwrap_or_default());
        }
        if file.raw_url.is_empty() {
            return Err(SyncError::consistency(format!(
                "published file {} has no raw URL",
                file.title
            )));
        }

        let store = self.ctx.store.clone();
        let lookup = Filter::new()
            .eq(fields::ID, file.id.as_str())
            .eq(fields::RAW_URL, file.raw_url.as_str());
        let cached = match store.find_first::<ContentRecord>(&lookup) {
            Ok(record) => record,
            Err(e) => {
                warn!(file_id, error = %e, "cache lookup failed; fetching instead");
                None
            }
        };

        if let Some(record) = &cached {
            let fresh = record.updated_at >= file.updated_at;
            if let (true, Some(content)) = (fresh, record.content.as_ref()) {
                debug!(file_id, "serving cached content");
                self.remember_content(file_id, content.clone());
                return Ok(content.clone());
            }
        }

        let content = self.ctx.fetcher.fetch(&file.raw_url).await?;
        debug!(file_id, raw_url = %file.raw_url, bytes = content.len(), "fetched raw content");

        let persisted = if cached.is_some() {
            store
                .update::<ContentRecord>(
                    &lookup,
                    &FieldUpdates::new()
                        .set(fields::CONTENT, content.as_str())
                        .set(fields::UPDATED_AT, file.updated_at.as_str()),
                )
                .map(|_| ())
        } else {
            let mut record = ContentRecord::from(&file);
            record.content = Some(content.clone());
            store.insert(&record)
        };
        if let Err(e) = persisted {
            warn!(file_id, error = %e, "could not cache fetched content");
        }

        self.remember_content(file_id, content.clone());
        Ok(content)
    }

    fn remember_content(&mut self, file_id: &str, content: String) {
        if let Some(file) = self.catalog.file_mut(file_id) {
            file.content = Some(content);
            file.stale = false;
        }
    }

    /// Look up a file or report a consistency error.
    pub(crate) fn require_file(&self, file_id: &str) -> Result<GistFile> {
        self.catalog
            .file(file_id)
            .cloned()
            .ok_or_else(|| SyncError::consistency(format!("unknown file {file_id}")))
    }

    /// Look up a gist or report a consistency error.
    pub(crate) fn require_gist(&self, gist_id: &str) -> Result<Gist> {
        self.catalog
            .gist(gist_id)
            .cloned()
            .ok_or_else(|| SyncError::consistency(format!("unknown gist {gist_id}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gisting_remote::MockRemote;
    use gisting_store::LocalStore;
    use std::sync::Arc;

    fn engine() -> (SyncEngine, Arc<MockRemote>) {
        let store = Arc::new(LocalStore::open_in_memory().unwrap());
        let mock = Arc::new(MockRemote::new());
        (SyncEngine::new(AppContext::with_mock(store, mock.clone())), mock)
    }

    #[tokio::test]
    async fn test_reconcile_caches_remote_files_without_fetching() {
        let (mut engine, mock) = engine();
        let id = mock.seed_gist("Notes", true, &[("a.txt", "one"), ("b.txt", "two")]);

        let report = engine.reconcile().await.unwrap();
        assert_eq!(report.published, 1);
        assert_eq!(report.inserted, 2);
        assert_eq!(mock.calls().fetch, 0);

        let files = engine.catalog().files_of(&id);
        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|f| !f.draft && f.content.is_none()));
    }

    #[tokio::test]
    async fn test_second_pass_hits_cache() {
        let (mut engine, mock) = engine();
        let id = mock.seed_gist("Notes", true, &[("a.txt", "one")]);

        engine.reconcile().await.unwrap();
        let first_id = engine.catalog().files_of(&id)[0].id.clone();

        let report = engine.reconcile().await.unwrap();
        assert_eq!(report.inserted, 0);
        assert_eq!(report.pruned, 0);
        assert_eq!(engine.catalog().files_of(&id)[0].id, first_id);
    }

    #[tokio::test]
    async fn test_failed_listing_keeps_catalog() {
        let (mut engine, mock) = engine();
        mock.seed_gist("Notes", true, &[("a.txt", "one")]);
        engine.reconcile().await.unwrap();

        mock.set_failure(Some(gisting_remote::MockFailure::Network));
        let err = engine.reconcile().await.unwrap_err();
        assert!(matches!(err, SyncError::Network(_)));
        assert_eq!(engine.catalog().len(), 1);
    }

    #[tokio::test]
    async fn test_truncated_listing_skips_pruning() {
        let (mut engine, mock) = engine();
        mock.seed_gist("One", true, &[("a.txt", "one")]);
        let second = mock.seed_gist("Two", true, &[("b.txt", "two")]);
        engine.reconcile().await.unwrap();
        let store = engine.context().store.clone();
        assert_eq!(store.count(gisting_store::Collection::GistContent).unwrap(), 2);

        mock.set_list_limit(Some(1));
        let report = engine.reconcile().await.unwrap();
        assert!(report.truncated);
        assert_eq!(report.published, 1);
        assert_eq!(report.pruned, 0);
        assert_eq!(store.count(gisting_store::Collection::GistContent).unwrap(), 2);
        assert!(engine.catalog().gist(&second).is_none());

        // A full listing prunes again
        mock.set_list_limit(None);
        let report = engine.reconcile().await.unwrap();
        assert!(!report.truncated);
        assert_eq!(report.published, 2);
    }

    #[tokio::test]
    async fn test_get_content_fetches_then_caches() {
        let (mut engine, mock) = engine();
        let id = mock.seed_gist("Notes", true, &[("a.txt", "one")]);
        engine.reconcile().await.unwrap();
        let file_id = engine.catalog().files_of(&id)[0].id.clone();

        assert_eq!(engine.get_content(&file_id).await.unwrap(), "one");
        assert_eq!(engine.get_content(&file_id).await.unwrap(), "one");
        assert_eq!(mock.calls().fetch, 1);
    }

    #[tokio::test]
    async fn test_get_content_unknown_file() {
        let (mut engine, _) = engine();
        let err = engine.get_content("missing").await.unwrap_err();
        assert!(matches!(err, SyncError::Consistency { .. }));
    }
}
