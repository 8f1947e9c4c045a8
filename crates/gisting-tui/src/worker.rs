//! Background sync worker.
//!
//! The worker thread owns the [`SyncEngine`] and a current-thread tokio
//! runtime. The UI sends [`SyncCommand`]s over a channel and receives exactly
//! one [`SyncUpdate`] per command, so the terminal never waits on the network
//! and every engine call is serialized on one thread.

use std::fmt;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use gisting_core::types::{FileId, Gist, GistFile, GistId, Visibility};
use gisting_sync::{GistEntry, PublishOutcome, ReconcileReport, SyncEngine, SyncError};
use tracing::{debug, error, info, warn};

use crate::error::{AppResult, TuiError};

/// A request for the sync worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncCommand {
    Refresh,
    LoadContent { file_id: FileId },
    CreateGist { name: String, visibility: Visibility },
    CreateFile { gist_id: GistId, title: String, content: String },
    SaveFile { file_id: FileId, content: String },
    Publish { gist_id: GistId },
    RenameGist { gist_id: GistId, name: String },
    RenameFile { file_id: FileId, title: String },
    DeleteGist { gist_id: GistId },
    DeleteFile { file_id: FileId },
    Shutdown,
}

impl SyncCommand {
    pub fn action(&self) -> SyncAction {
        match self {
            SyncCommand::Refresh => SyncAction::Refresh,
            SyncCommand::LoadContent { .. } => SyncAction::LoadContent,
            SyncCommand::CreateGist { .. } => SyncAction::CreateGist,
            SyncCommand::CreateFile { .. } => SyncAction::CreateFile,
            SyncCommand::SaveFile { .. } => SyncAction::SaveFile,
            SyncCommand::Publish { .. } => SyncAction::Publish,
            SyncCommand::RenameGist { .. } => SyncAction::RenameGist,
            SyncCommand::RenameFile { .. } => SyncAction::RenameFile,
            SyncCommand::DeleteGist { .. } => SyncAction::DeleteGist,
            SyncCommand::DeleteFile { .. } => SyncAction::DeleteFile,
            SyncCommand::Shutdown => SyncAction::Shutdown,
        }
    }
}

/// The kind of a command, used for busy notices and status messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncAction {
    Refresh,
    LoadContent,
    CreateGist,
    CreateFile,
    SaveFile,
    Publish,
    RenameGist,
    RenameFile,
    DeleteGist,
    DeleteFile,
    Shutdown,
}

impl SyncAction {
    /// Present-tense label shown while the action runs.
    pub fn label(&self) -> &'static str {
        match self {
            SyncAction::Refresh => "refresh",
            SyncAction::LoadContent => "load",
            SyncAction::CreateGist => "create gist",
            SyncAction::CreateFile => "create file",
            SyncAction::SaveFile => "save",
            SyncAction::Publish => "publish",
            SyncAction::RenameGist => "rename gist",
            SyncAction::RenameFile => "rename file",
            SyncAction::DeleteGist => "delete gist",
            SyncAction::DeleteFile => "delete file",
            SyncAction::Shutdown => "shutdown",
        }
    }
}

impl fmt::Display for SyncAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// What a successful command produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Refreshed(ReconcileReport),
    Content { file_id: FileId, content: String },
    GistCreated(Gist),
    FileCreated(GistFile),
    FileSaved(GistFile),
    Published(PublishOutcome),
    GistRenamed(Gist),
    FileRenamed(GistFile),
    GistDeleted(Gist),
    FileDeleted(GistFile),
    ShutDown,
}

/// The answer to one command.
#[derive(Debug)]
pub struct SyncUpdate {
    pub action: SyncAction,
    pub outcome: Result<SyncOutcome, SyncError>,
    /// Sorted catalog after the command ran
    pub snapshot: Vec<GistEntry>,
}

async fn execute(engine: &mut SyncEngine, command: SyncCommand) -> Result<SyncOutcome, SyncError> {
    match command {
        SyncCommand::Refresh => engine.reconcile().await.map(SyncOutcome::Refreshed),
        SyncCommand::LoadContent { file_id } => {
            let content = engine.get_content(&file_id).await?;
            Ok(SyncOutcome::Content { file_id, content })
        }
        SyncCommand::CreateGist { name, visibility } => engine
            .create_gist(&name, visibility)
            .await
            .map(SyncOutcome::GistCreated),
        SyncCommand::CreateFile {
            gist_id,
            title,
            content,
        } => engine
            .create_file(&gist_id, &title, &content)
            .await
            .map(SyncOutcome::FileCreated),
        SyncCommand::SaveFile { file_id, content } => engine
            .save_file(&file_id, &content)
            .await
            .map(SyncOutcome::FileSaved),
        SyncCommand::Publish { gist_id } => engine.publish(&gist_id).await.map(SyncOutcome::Published),
        SyncCommand::RenameGist { gist_id, name } => engine
            .rename_gist(&gist_id, &name)
            .await
            .map(SyncOutcome::GistRenamed),
        SyncCommand::RenameFile { file_id, title } => engine
            .rename_file(&file_id, &title)
            .await
            .map(SyncOutcome::FileRenamed),
        SyncCommand::DeleteGist { gist_id } => engine
            .delete_gist(&gist_id)
            .await
            .map(SyncOutcome::GistDeleted),
        SyncCommand::DeleteFile { file_id } => engine
            .delete_file(&file_id)
            .await
            .map(SyncOutcome::FileDeleted),
        SyncCommand::Shutdown => Ok(SyncOutcome::ShutDown),
    }
}

fn run_worker(
    mut engine: SyncEngine,
    runtime: tokio::runtime::Runtime,
    commands: Receiver<SyncCommand>,
    updates: Sender<SyncUpdate>,
) {
    info!("sync worker started");
    while let Ok(command) = commands.recv() {
        let action = command.action();
        if action == SyncAction::Shutdown {
            break;
        }

        debug!(%action, "running sync command");
        let outcome = runtime.block_on(execute(&mut engine, command));
        if let Err(e) = &outcome {
            warn!(%action, kind = ?e.kind(), error = %e, "sync command failed");
        }
        let update = SyncUpdate {
            action,
            outcome,
            snapshot: engine.snapshot(),
        };
        if updates.send(update).is_err() {
            debug!("UI gone; stopping sync worker");
            break;
        }
    }

    match engine.context().store.close() {
        Ok(()) => info!("local store closed"),
        Err(e) => error!(error = %e, "failed to close local store"),
    }
    let _ = updates.send(SyncUpdate {
        action: SyncAction::Shutdown,
        outcome: Ok(SyncOutcome::ShutDown),
        snapshot: engine.snapshot(),
    });
    info!("sync worker stopped");
}

/// Handle to the sync worker thread.
pub struct SyncWorker {
    commands: Sender<SyncCommand>,
    updates: Receiver<SyncUpdate>,
    handle: Option<JoinHandle<()>>,
}

impl SyncWorker {
    /// Start the worker thread, moving the engine onto it.
    pub fn spawn(engine: SyncEngine) -> AppResult<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(TuiError::WorkerSpawn)?;
        let (command_tx, command_rx) = mpsc::channel();
        let (update_tx, update_rx) = mpsc::channel();

        let handle = thread::Builder::new()
            .name("gisting-sync".to_string())
            .spawn(move || run_worker(engine, runtime, command_rx, update_tx))
            .map_err(TuiError::WorkerSpawn)?;

        Ok(Self {
            commands: command_tx,
            updates: update_rx,
            handle: Some(handle),
        })
    }

    /// Queue a command. Fails once the worker has stopped.
    pub fn send(&self, command: SyncCommand) -> AppResult<()> {
        self.commands.send(command).map_err(|_| TuiError::WorkerGone)
    }

    /// Next update, if one is ready.
    pub fn try_recv(&self) -> Option<SyncUpdate> {
        match self.updates.try_recv() {
            Ok(update) => Some(update),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Wait up to `timeout` for the next update.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<SyncUpdate> {
        match self.updates.recv_timeout(timeout) {
            Ok(update) => Some(update),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stop the worker and wait for it.
    ///
    /// A command already running finishes first (bounded by the HTTP client
    /// timeouts). The store is closed by the worker on its way out. Calling
    /// this twice is harmless.
    pub fn shutdown(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        let _ = self.commands.send(SyncCommand::Shutdown);
        if handle.join().is_err() {
            error!("sync worker panicked");
        }
    }
}

impl Drop for SyncWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl fmt::Debug for SyncWorker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncWorker")
            .field("running", &self.is_running())
            .finish()
    }
}
