//! # gisting-core
//!
//! Core types, errors, and utilities shared by every gisting crate.
//!
//! This crate provides:
//! - [`GistingError`] - Error type for configuration, I/O and logging setup
//! - [`logging`] - Tracing setup and log file management
//! - [`types`] - The gist/file data model and timestamp helpers
//! - [`config`] - The persisted JSON configuration
//!
//! ## Example
//!
//! ```no_run
//! use gisting_core::{Config, logging};
//!
//! fn main() -> gisting_core::Result<()> {
//!     let dir = gisting_core::config::default_config_dir()?;
//!     let config = Config::load_or_init(&dir)?;
//!     let _guard = logging::init_logging(Some(config.log_dir()), false, false)?;
//!
//!     tracing::info!(theme = %config.theme, "gisting started");
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod types;

// Re-export main types for convenience
pub use config::Config;
pub use error::{GistingError, Result};
pub use logging::{LogGuard, init_logging};
pub use types::{FileId, Gist, GistFile, GistId, GistStatus, Visibility};
