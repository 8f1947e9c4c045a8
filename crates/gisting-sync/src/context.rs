//! Shared collaborators, constructed once at startup.

use std::sync::Arc;

use gisting_remote::{ContentFetcher, GistRemote, MockRemote};
use gisting_store::LocalStore;

/// The store, the remote API and the raw content fetcher.
///
/// Built in `main` and moved into the sync engine; nothing else opens the
/// store.
#[derive(Clone)]
pub struct AppContext {
    pub store: Arc<LocalStore>,
    pub remote: Arc<dyn GistRemote>,
    pub fetcher: Arc<dyn ContentFetcher>,
}

impl AppContext {
    pub fn new(
        store: Arc<LocalStore>,
        remote: Arc<dyn GistRemote>,
        fetcher: Arc<dyn ContentFetcher>,
    ) -> Self {
        Self {
            store,
            remote,
            fetcher,
        }
    }

    /// Use one [`MockRemote`] as both API and fetcher.
    pub fn with_mock(store: Arc<LocalStore>, mock: Arc<MockRemote>) -> Self {
        Self::new(store, mock.clone(), mock)
    }
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("remote", &self.remote.name())
            .field("store_closed", &self.store.is_closed())
            .finish()
    }
}
