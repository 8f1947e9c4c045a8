//! Terminal UI for gisting.
//!
//! This crate provides the Ratatui-based three-pane interface: gists on the
//! left, the files of the selected gist in the middle and an editor on the
//! right. All gist operations run on a background [`SyncWorker`].
//!
//! ## Hotkeys
//!
//! - `Tab` / `Ctrl+L` - Focus the pane to the right
//! - `Shift+Tab` / `Ctrl+H` - Focus the pane to the left
//! - `Enter` - Open the selected gist or file
//! - `j` / `k` - Move the selection
//! - `a` - New gist or file
//! - `r` - Rename
//! - `d` - Delete
//! - `Ctrl+S` - Save the editor content
//! - `Ctrl+U` - Publish the selected gist
//! - `R` - Refresh from GitHub
//! - `T` - Cycle theme
//! - `?` - Help
//! - `q` - Quit
//! - `Esc` - Cancel/back

pub mod app;
pub mod dialog;
pub mod error;
pub mod event;
pub mod theme;
pub mod view;
pub mod worker;

pub use app::{App, StatusLevel};
pub use dialog::{DeleteTarget, Dialog, DialogKind};
pub use error::{AppResult, TuiError};
pub use event::{AppEvent, InputMode};
pub use theme::{Theme, ThemeManager, ThemeName};
pub use view::Pane;
pub use worker::{SyncAction, SyncCommand, SyncOutcome, SyncUpdate, SyncWorker};
