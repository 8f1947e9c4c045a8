//! # gisting-sync
//!
//! The reconciliation engine and draft lifecycle of gisting.
//!
//! This crate provides:
//! - [`SyncEngine`] - Merges remote gists, cached content and local drafts
//! - [`GistCatalog`] - The identifier-keyed gist → files mapping
//! - [`AppContext`] - Store, remote and fetcher, injected once at startup
//! - [`SyncError`] - Storage / remote / network / validation / consistency errors
//!
//! The engine has no UI types in its API; the terminal front end drives it
//! from a worker thread.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use gisting_core::Visibility;
//! use gisting_remote::MockRemote;
//! use gisting_store::LocalStore;
//! use gisting_sync::{AppContext, SyncEngine};
//!
//! # async fn example() -> gisting_sync::Result<()> {
//! let store = Arc::new(LocalStore::open_in_memory()?);
//! let mut engine = SyncEngine::new(AppContext::with_mock(store, Arc::new(MockRemote::new())));
//!
//! engine.reconcile().await?;
//! let gist = engine.create_gist("Notes", Visibility::Public).await?;
//! engine.create_file(&gist.id, "todo.md", "- buy milk").await?;
//! let outcome = engine.publish(&gist.id).await?;
//! println!("published as {}", outcome.gist.id);
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod context;
pub mod drafts;
pub mod engine;
pub mod error;

// Re-export main types
pub use catalog::{GistCatalog, GistEntry};
pub use context::AppContext;
pub use drafts::{PLACEHOLDER_CONTENT, PublishOutcome};
pub use engine::{ReconcileReport, SyncEngine};
pub use error::{ErrorKind, Result, SyncError};
