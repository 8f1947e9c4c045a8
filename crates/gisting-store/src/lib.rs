//! # gisting-store
//!
//! Durable local storage for gisting.
//!
//! This crate provides:
//! - [`LocalStore`] - Document collections on an embedded SQLite file
//! - [`Filter`] / [`FieldUpdates`] - Field-equality predicates and partial merges
//! - [`ContentRecord`] / [`DraftedGistRecord`] - Typed records per collection
//!
//! ## Example
//!
//! ```no_run
//! use gisting_store::{ContentRecord, Filter, LocalStore, fields};
//!
//! fn main() -> gisting_store::Result<()> {
//!     let store = LocalStore::open("gisting.db")?;
//!
//!     let drafts: Vec<ContentRecord> = store.find_all(&Filter::new().eq(fields::DRAFT, true))?;
//!     println!("{} draft files", drafts.len());
//!
//!     store.close()
//! }
//! ```

pub mod db;
pub mod error;
pub mod records;

// Re-export main types
pub use db::{FieldUpdates, Filter, LocalStore};
pub use error::{Result, StoreError};
pub use records::{Collection, ContentRecord, DraftedGistRecord, Record, fields};
