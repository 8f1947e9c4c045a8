//! Main application state and logic for the gisting TUI.
//!
//! The `App` owns the panes, the editor and the dialogs. Every gist operation
//! is sent to the [`SyncWorker`] as a [`SyncCommand`]; the App applies the
//! resulting [`SyncUpdate`] when it arrives. At most one command is in flight.

use std::io;
use std::time::{Duration, Instant};

use chrono::Utc;
use crossterm::event::{self, Event, KeyEvent, KeyEventKind};
use gisting_core::types::{FileId, GistFile, GistId};
use gisting_sync::GistEntry;
use ratatui::{
    Frame, Terminal,
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
};
use tracing::{debug, info};
use tui_textarea::TextArea;

use crate::dialog::{DeleteTarget, Dialog, centered_rect};
use crate::error::AppResult;
use crate::event::{AppEvent, InputHandler, InputMode};
use crate::theme::ThemeManager;
use crate::view::{Pane, language_label, relative_time};
use crate::worker::{SyncAction, SyncCommand, SyncOutcome, SyncUpdate, SyncWorker};

/// How long the event loop waits for input before checking the worker.
const TICK: Duration = Duration::from_millis(50);

/// How long a status message stays visible.
const STATUS_TTL: Duration = Duration::from_secs(5);

/// Severity of a status line message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Busy,
    Error,
}

#[derive(Debug, Clone)]
struct StatusMessage {
    text: String,
    level: StatusLevel,
    shown_at: Instant,
}

/// What the editor pane is showing.
#[derive(Debug, Clone, PartialEq, Eq)]
enum EditorState {
    /// No file selected
    Empty,
    /// Content requested from the worker
    Loading(FileId),
    /// Content of this file is in the text area
    Loaded(FileId),
}

/// Line-ending shape of the text loaded into the editor.
///
/// The text area stores bare lines, so the separator and the final newline
/// are put back when the text is read out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct LineEndings {
    crlf: bool,
    trailing_newline: bool,
}

impl LineEndings {
    fn detect(content: &str) -> Self {
        Self {
            crlf: content.contains("\r\n"),
            trailing_newline: content.ends_with('\n'),
        }
    }

    fn separator(self) -> &'static str {
        if self.crlf { "\r\n" } else { "\n" }
    }

    fn join(self, lines: &[String]) -> String {
        let separator = self.separator();
        let mut text = lines.join(separator);
        if self.trailing_newline {
            text.push_str(separator);
        }
        text
    }
}

/// Main application state.
pub struct App {
    pane: Pane,
    input_handler: InputHandler,
    /// Sorted catalog projection from the last update
    entries: Vec<GistEntry>,
    gist_index: usize,
    file_index: usize,
    editor: TextArea<'static>,
    editor_endings: LineEndings,
    editor_state: EditorState,
    /// Text last loaded or saved, to detect unsaved edits
    editor_baseline: String,
    dialog: Option<Dialog>,
    show_help: bool,
    status: Option<StatusMessage>,
    theme_manager: ThemeManager,
    worker: SyncWorker,
    in_flight: Option<SyncAction>,
    /// The selected file could not be loaded because the worker was busy
    load_pending: bool,
    login: Option<String>,
    should_quit: bool,
    dirty: bool,
}

impl App {
    pub fn new(worker: SyncWorker, theme_manager: ThemeManager) -> Self {
        Self {
            pane: Pane::default(),
            input_handler: InputHandler::new(),
            entries: Vec::new(),
            gist_index: 0,
            file_index: 0,
            editor: TextArea::default(),
            editor_endings: LineEndings::default(),
            editor_state: EditorState::Empty,
            editor_baseline: String::new(),
            dialog: None,
            show_help: false,
            status: None,
            theme_manager,
            worker,
            in_flight: None,
            load_pending: false,
            login: None,
            should_quit: false,
            dirty: true,
        }
    }

    /// Show the authenticated user in the footer.
    pub fn with_login(mut self, login: impl Into<String>) -> Self {
        self.login = Some(login.into());
        self
    }

    pub fn pane(&self) -> Pane {
        self.pane
    }

    pub fn input_mode(&self) -> InputMode {
        self.input_handler.mode()
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn show_help(&self) -> bool {
        self.show_help
    }

    pub fn in_flight(&self) -> Option<SyncAction> {
        self.in_flight
    }

    pub fn entries(&self) -> &[GistEntry] {
        &self.entries
    }

    pub fn dialog(&self) -> Option<&Dialog> {
        self.dialog.as_ref()
    }

    /// Current status line text, if any.
    pub fn status_text(&self) -> Option<&str> {
        self.status.as_ref().map(|s| s.text.as_str())
    }

    pub fn status_level(&self) -> Option<StatusLevel> {
        self.status.as_ref().map(|s| s.level)
    }

    pub fn selected_entry(&self) -> Option<&GistEntry> {
        self.entries.get(self.gist_index)
    }

    pub fn selected_gist_id(&self) -> Option<GistId> {
        self.selected_entry().map(|e| e.gist.id.clone())
    }

    pub fn selected_file(&self) -> Option<&GistFile> {
        self.selected_entry()?.files.get(self.file_index)
    }

    pub fn selected_file_id(&self) -> Option<FileId> {
        self.selected_file().map(|f| f.id.clone())
    }

    /// Text currently in the editor.
    pub fn editor_text(&self) -> String {
        self.editor_endings.join(self.editor.lines())
    }

    /// File whose content the editor holds.
    pub fn editor_file_id(&self) -> Option<&str> {
        match &self.editor_state {
            EditorState::Loaded(id) => Some(id),
            _ => None,
        }
    }

    fn editor_modified(&self) -> bool {
        matches!(self.editor_state, EditorState::Loaded(_)) && self.editor_text() != self.editor_baseline
    }

    fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Check if UI needs redraw and clear the dirty flag.
    fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    fn set_status(&mut self, level: StatusLevel, text: impl Into<String>) {
        self.status = Some(StatusMessage {
            text: text.into(),
            level,
            shown_at: Instant::now(),
        });
        self.mark_dirty();
    }

    fn expire_status(&mut self) {
        let expired = self
            .status
            .as_ref()
            .is_some_and(|s| s.level != StatusLevel::Busy && s.shown_at.elapsed() >= STATUS_TTL);
        if expired {
            self.status = None;
            self.mark_dirty();
        }
    }

    // =========================================================================
    // Worker dispatch
    // =========================================================================

    /// Send a command unless one is already running.
    fn dispatch(&mut self, command: SyncCommand) -> bool {
        let action = command.action();
        if let Some(busy) = self.in_flight {
            debug!(%action, %busy, "ignoring command while busy");
            self.set_status(StatusLevel::Busy, format!("busy: {busy} in progress"));
            return false;
        }
        if let Err(e) = self.worker.send(command) {
            self.set_status(StatusLevel::Error, e.to_string());
            return false;
        }
        self.in_flight = Some(action);
        if action != SyncAction::LoadContent {
            self.set_status(StatusLevel::Busy, format!("{action}..."));
        }
        true
    }

    /// Ask for the initial reconciliation.
    pub fn start(&mut self) {
        self.dispatch(SyncCommand::Refresh);
    }

    /// Apply every update the worker has ready.
    pub fn poll_worker(&mut self) {
        while let Some(update) = self.worker.try_recv() {
            self.apply_update(update);
        }
    }

    /// Block until nothing is in flight or `timeout` passes. Returns whether
    /// the app is idle.
    pub fn wait_idle(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while self.in_flight.is_some() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return false;
            }
            if let Some(update) = self.worker.recv_timeout(remaining) {
                self.apply_update(update);
            }
        }
        true
    }

    /// Fold one worker answer into the UI state.
    pub fn apply_update(&mut self, update: SyncUpdate) {
        let SyncUpdate {
            action,
            outcome,
            snapshot,
        } = update;
        if action == SyncAction::Shutdown {
            return;
        }
        self.in_flight = None;

        let previous_gist = self.selected_gist_id();
        let previous_file = self.selected_file_id();
        self.entries = snapshot;
        self.mark_dirty();

        match outcome {
            Ok(SyncOutcome::Refreshed(report)) => {
                self.restore_selection(previous_gist.as_deref(), previous_file.as_deref());
                let suffix = if report.truncated { "; listing truncated" } else { "" };
                self.set_status(
                    StatusLevel::Info,
                    format!(
                        "{} gists ({} published, {} drafted{suffix})",
                        self.entries.len(),
                        report.published,
                        report.drafted
                    ),
                );
                let editor_file = self.editor_file_id().map(|id| self.find_file(id).map(|f| f.stale));
                match editor_file {
                    Some(None) => {
                        self.clear_editor();
                        if self.pane == Pane::Editor {
                            self.focus(Pane::Files);
                        }
                    }
                    // Changed elsewhere; reload unless there are local edits
                    Some(Some(true)) if !self.editor_modified() => self.clear_editor(),
                    _ => {}
                }
                if matches!(self.editor_state, EditorState::Empty) {
                    self.show_selected_file();
                }
            }
            Ok(SyncOutcome::Content { file_id, content }) => {
                self.restore_selection(previous_gist.as_deref(), previous_file.as_deref());
                if self.selected_file_id().as_deref() == Some(file_id.as_str()) {
                    self.load_editor(file_id, &content);
                }
                self.status = None;
            }
            Ok(SyncOutcome::GistCreated(gist)) => {
                self.restore_selection(Some(&gist.id), None);
                self.pane = Pane::Gists;
                self.show_selected_file();
                self.set_status(StatusLevel::Info, format!("Created draft gist {}", gist.name));
            }
            Ok(SyncOutcome::FileCreated(file)) => {
                self.restore_selection(Some(&file.gist_id), Some(&file.id));
                self.pane = Pane::Files;
                self.show_selected_file();
                self.set_status(StatusLevel::Info, format!("Created {}", file.title));
            }
            Ok(SyncOutcome::FileSaved(file)) => {
                self.restore_selection(previous_gist.as_deref(), Some(&file.id));
                if self.editor_file_id() == Some(file.id.as_str()) {
                    self.editor_baseline = file.content.clone().unwrap_or_default();
                }
                let what = if file.draft { "draft " } else { "" };
                self.set_status(StatusLevel::Info, format!("Saved {what}{}", file.title));
            }
            Ok(SyncOutcome::Published(outcome)) => {
                self.restore_selection(Some(&outcome.gist.id), previous_file.as_deref());
                let text = if outcome.uploaded == 0 {
                    "Nothing to publish".to_string()
                } else {
                    format!("Published {} ({} files)", outcome.gist.name, outcome.uploaded)
                };
                self.set_status(StatusLevel::Info, text);
            }
            Ok(SyncOutcome::GistRenamed(gist)) => {
                self.restore_selection(Some(&gist.id), previous_file.as_deref());
                self.set_status(StatusLevel::Info, format!("Renamed gist to {}", gist.name));
            }
            Ok(SyncOutcome::FileRenamed(file)) => {
                self.restore_selection(Some(&file.gist_id), Some(&file.id));
                self.set_status(StatusLevel::Info, format!("Renamed file to {}", file.title));
            }
            Ok(SyncOutcome::GistDeleted(gist)) => {
                // Same index now points at the neighbour
                self.clamp_selection();
                self.file_index = 0;
                self.clear_editor();
                self.show_selected_file();
                self.set_status(StatusLevel::Info, format!("Deleted gist {}", gist.name));
            }
            Ok(SyncOutcome::FileDeleted(file)) => {
                self.restore_selection(Some(&file.gist_id), None);
                self.file_index = self.file_index.min(self.selected_file_count().saturating_sub(1));
                self.clear_editor();
                self.show_selected_file();
                self.set_status(StatusLevel::Info, format!("Deleted {}", file.title));
            }
            Ok(SyncOutcome::ShutDown) => {}
            Err(e) => {
                self.restore_selection(previous_gist.as_deref(), previous_file.as_deref());
                if action == SyncAction::LoadContent {
                    self.clear_editor();
                }
                self.set_status(StatusLevel::Error, e.friendly_message());
            }
        }

        if self.load_pending && self.in_flight.is_none() {
            self.show_selected_file();
        }
    }

    // =========================================================================
    // Selection
    // =========================================================================

    fn selected_file_count(&self) -> usize {
        self.selected_entry().map(|e| e.files.len()).unwrap_or(0)
    }

    fn find_file(&self, file_id: &str) -> Option<&GistFile> {
        self.entries
            .iter()
            .flat_map(|e| e.files.iter())
            .find(|f| f.id == file_id)
    }

    fn clamp_selection(&mut self) {
        self.gist_index = self.gist_index.min(self.entries.len().saturating_sub(1));
        self.file_index = self.file_index.min(self.selected_file_count().saturating_sub(1));
    }

    /// Select by identifier, falling back to the nearest valid index.
    fn restore_selection(&mut self, gist_id: Option<&str>, file_id: Option<&str>) {
        if let Some(index) = gist_id.and_then(|id| self.entries.iter().position(|e| e.gist.id == id)) {
            if index != self.gist_index {
                self.file_index = 0;
            }
            self.gist_index = index;
        }
        if let Some(index) = file_id.and_then(|id| {
            self.selected_entry()
                .and_then(|e| e.files.iter().position(|f| f.id == id))
        }) {
            self.file_index = index;
        }
        self.clamp_selection();
    }

    fn move_selection(&mut self, delta: isize) {
        match self.pane {
            Pane::Gists => {
                let next = step(self.gist_index, delta, self.entries.len());
                if next != self.gist_index {
                    self.gist_index = next;
                    self.file_index = 0;
                    self.show_selected_file();
                }
            }
            Pane::Files => {
                let next = step(self.file_index, delta, self.selected_file_count());
                if next != self.file_index {
                    self.file_index = next;
                    self.show_selected_file();
                }
            }
            Pane::Editor => {}
        }
        self.mark_dirty();
    }

    fn clear_editor(&mut self) {
        self.editor = TextArea::default();
        self.editor_endings = LineEndings::default();
        self.editor_state = EditorState::Empty;
        self.editor_baseline.clear();
    }

    fn load_editor(&mut self, file_id: FileId, content: &str) {
        self.editor = TextArea::from(content.lines());
        self.editor_endings = LineEndings::detect(content);
        self.editor_state = EditorState::Loaded(file_id);
        self.editor_baseline = self.editor_text();
        self.mark_dirty();
    }

    /// Put the selected file into the editor, fetching it when needed.
    fn show_selected_file(&mut self) {
        self.load_pending = false;
        let Some(file) = self.selected_file().cloned() else {
            self.clear_editor();
            return;
        };
        if self.editor_file_id() == Some(file.id.as_str()) {
            return;
        }
        match (&file.content, file.stale) {
            (Some(content), false) => self.load_editor(file.id, content),
            _ => {
                self.editor = TextArea::default();
                self.editor_endings = LineEndings::default();
                self.editor_baseline.clear();
                self.editor_state = EditorState::Loading(file.id.clone());
                if self.in_flight.is_some() {
                    self.load_pending = true;
                } else {
                    self.dispatch(SyncCommand::LoadContent { file_id: file.id });
                }
            }
        }
    }

    // =========================================================================
    // Input
    // =========================================================================

    /// Handle a key event.
    pub fn handle_key_event(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        let event = self.input_handler.handle_key(key);
        self.handle_app_event(event);
    }

    fn set_mode(&mut self, mode: InputMode) {
        self.input_handler.set_mode(mode);
    }

    fn focus(&mut self, pane: Pane) {
        if pane == Pane::Editor && !matches!(self.editor_state, EditorState::Loaded(_)) {
            self.set_status(StatusLevel::Info, "Select a file to edit");
            return;
        }
        if self.pane == Pane::Editor && pane != Pane::Editor && self.editor_modified() {
            self.set_status(StatusLevel::Info, "Unsaved changes (Ctrl+S to save)");
        }
        self.pane = pane;
        self.set_mode(if pane == Pane::Editor {
            InputMode::Editor
        } else {
            InputMode::Normal
        });
        self.mark_dirty();
    }

    fn open_dialog(&mut self, dialog: Dialog) {
        let mode = if dialog.is_confirmation() {
            InputMode::Confirm
        } else {
            InputMode::Dialog
        };
        self.dialog = Some(dialog);
        self.set_mode(mode);
        self.mark_dirty();
    }

    fn close_dialog(&mut self) {
        self.dialog = None;
        self.set_mode(InputMode::Normal);
        self.mark_dirty();
    }

    fn submit_dialog(&mut self) {
        let Some(dialog) = self.dialog.as_ref() else {
            return;
        };
        let Some(command) = dialog.to_command() else {
            self.set_status(StatusLevel::Error, "Name cannot be empty");
            return;
        };
        if self.dispatch(command) {
            self.close_dialog();
        }
    }

    fn create(&mut self) {
        match self.pane {
            Pane::Gists => self.open_dialog(Dialog::create_gist()),
            Pane::Files => match self.selected_gist_id() {
                Some(gist_id) => self.open_dialog(Dialog::create_file(gist_id)),
                None => self.set_status(StatusLevel::Info, "Create a gist first"),
            },
            Pane::Editor => {}
        }
    }

    fn rename(&mut self) {
        let dialog = match self.pane {
            Pane::Gists => self
                .selected_entry()
                .map(|e| Dialog::rename_gist(e.gist.id.clone(), &e.gist.name)),
            Pane::Files => self
                .selected_file()
                .map(|f| Dialog::rename_file(f.id.clone(), &f.title)),
            Pane::Editor => None,
        };
        if let Some(dialog) = dialog {
            self.open_dialog(dialog);
        }
    }

    fn delete(&mut self) {
        let dialog = match self.pane {
            Pane::Gists => self.selected_entry().map(|e| {
                Dialog::confirm_delete(DeleteTarget::Gist(e.gist.id.clone()), e.display_name())
            }),
            Pane::Files => self
                .selected_file()
                .map(|f| Dialog::confirm_delete(DeleteTarget::File(f.id.clone()), &f.title)),
            Pane::Editor => None,
        };
        if let Some(dialog) = dialog {
            self.open_dialog(dialog);
        }
    }

    fn save(&mut self) {
        let Some(file_id) = self.editor_file_id().map(str::to_string) else {
            return;
        };
        let content = self.editor_text();
        self.dispatch(SyncCommand::SaveFile { file_id, content });
    }

    fn publish(&mut self) {
        if self.editor_modified() {
            self.set_status(StatusLevel::Error, "Unsaved changes; press Ctrl+S before publishing");
            return;
        }
        if let Some(gist_id) = self.selected_gist_id() {
            self.dispatch(SyncCommand::Publish { gist_id });
        }
    }

    /// Handle an application event.
    pub fn handle_app_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::FocusRight => self.focus(self.pane.right()),
            AppEvent::FocusLeft => self.focus(self.pane.left()),
            AppEvent::Select => match self.pane {
                Pane::Gists => self.focus(Pane::Files),
                Pane::Files => self.focus(Pane::Editor),
                Pane::Editor => {}
            },
            AppEvent::NavigateUp => self.move_selection(-1),
            AppEvent::NavigateDown => self.move_selection(1),
            AppEvent::GoToTop => self.move_selection(isize::MIN),
            AppEvent::GoToBottom => self.move_selection(isize::MAX),
            AppEvent::Create => self.create(),
            AppEvent::Rename => self.rename(),
            AppEvent::Delete => self.delete(),
            AppEvent::Publish => self.publish(),
            AppEvent::Save => self.save(),
            AppEvent::Refresh => {
                self.dispatch(SyncCommand::Refresh);
            }
            AppEvent::CycleTheme => {
                let theme = self.theme_manager.cycle_theme();
                self.set_status(StatusLevel::Info, format!("Theme: {}", theme.display_name()));
            }
            AppEvent::ToggleHelp => {
                self.show_help = !self.show_help;
                self.set_mode(if self.show_help {
                    InputMode::Help
                } else {
                    InputMode::Normal
                });
                self.mark_dirty();
            }
            AppEvent::Quit | AppEvent::ForceQuit => self.should_quit = true,
            AppEvent::Cancel => {
                if self.dialog.is_some() {
                    self.close_dialog();
                } else if self.show_help {
                    self.handle_app_event(AppEvent::ToggleHelp);
                } else if self.pane == Pane::Editor {
                    self.focus(Pane::Files);
                } else {
                    self.status = None;
                    self.mark_dirty();
                }
            }
            AppEvent::EditorInput(key) => {
                self.editor.input(key);
                self.mark_dirty();
            }
            AppEvent::DialogInput(key) => {
                if let Some(dialog) = self.dialog.as_mut() {
                    dialog.input(key);
                }
                self.mark_dirty();
            }
            AppEvent::ToggleVisibility => {
                if let Some(dialog) = self.dialog.as_mut() {
                    dialog.toggle_visibility();
                }
                self.mark_dirty();
            }
            AppEvent::Submit | AppEvent::Confirm => self.submit_dialog(),
            AppEvent::None => {}
        }
    }

    // =========================================================================
    // Main loop
    // =========================================================================

    /// Run the main application loop on the real terminal.
    pub fn run(&mut self) -> AppResult<()> {
        crossterm::terminal::enable_raw_mode()?;
        let mut stdout = io::stdout();
        crossterm::execute!(stdout, crossterm::terminal::EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let result = self.run_loop(&mut terminal);

        crossterm::terminal::disable_raw_mode()?;
        crossterm::execute!(terminal.backend_mut(), crossterm::terminal::LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    fn run_loop<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> AppResult<()> {
        self.start();
        while !self.should_quit {
            self.poll_worker();
            self.expire_status();

            if self.take_dirty() {
                terminal.draw(|frame| self.draw(frame))?;
            }

            if event::poll(TICK)? {
                match event::read()? {
                    Event::Key(key) => self.handle_key_event(key),
                    Event::Resize(_, _) => self.mark_dirty(),
                    _ => {}
                }
            }
        }

        info!("quitting; waiting for sync worker");
        self.worker.shutdown();
        Ok(())
    }

    // =========================================================================
    // Drawing
    // =========================================================================

    /// Draw the UI.
    pub fn draw(&mut self, frame: &mut Frame) {
        let area = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(3),    // Panes
                Constraint::Length(1), // Status line
                Constraint::Length(1), // Footer
            ])
            .split(area);

        let panes = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(30),
                Constraint::Percentage(20),
                Constraint::Percentage(50),
            ])
            .split(chunks[0]);

        self.draw_gists(frame, panes[0]);
        self.draw_files(frame, panes[1]);
        self.draw_editor(frame, panes[2]);
        self.draw_status(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);

        if let Some(dialog) = self.dialog.as_mut() {
            dialog.render(frame, area, self.theme_manager.current());
        }
        if self.show_help {
            self.draw_help_overlay(frame, area);
        }
    }

    fn pane_block(&self, pane: Pane, title: String) -> Block<'static> {
        let colors = &self.theme_manager.current().colors;
        let focused = self.pane == pane;
        let (border, title_style) = if focused {
            (
                Style::default().fg(colors.header),
                Style::default().fg(colors.header).add_modifier(Modifier::BOLD),
            )
        } else {
            (Style::default().fg(colors.border_dim), Style::default().fg(colors.text))
        };
        Block::default()
            .borders(Borders::ALL)
            .border_style(border)
            .title(Span::styled(format!(" {title} "), title_style))
    }

    fn draw_gists(&self, frame: &mut Frame, area: Rect) {
        let colors = &self.theme_manager.current().colors;
        let now = Utc::now();
        let items: Vec<ListItem> = self
            .entries
            .iter()
            .map(|entry| {
                let mut spans = vec![Span::styled(
                    entry.display_name().to_string(),
                    Style::default().fg(colors.text),
                )];
                if entry.gist.is_draft() {
                    spans.push(Span::styled(" (Draft)", Style::default().fg(colors.draft)));
                }
                let updated = relative_time(&entry.gist.updated_at, now);
                if !updated.is_empty() {
                    spans.push(Span::styled(
                        format!("  {updated}"),
                        Style::default().fg(colors.text_dim),
                    ));
                }
                ListItem::new(Line::from(spans))
            })
            .collect();

        let title = format!("{} ({})", Pane::Gists.title(), self.entries.len());
        let list = List::new(items)
            .block(self.pane_block(Pane::Gists, title))
            .highlight_style(Style::default().bg(colors.selection_bg).add_modifier(Modifier::BOLD));
        let mut state = ListState::default().with_selected((!self.entries.is_empty()).then_some(self.gist_index));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_files(&self, frame: &mut Frame, area: Rect) {
        let colors = &self.theme_manager.current().colors;
        let files = self.selected_entry().map(|e| e.files.as_slice()).unwrap_or_default();
        let items: Vec<ListItem> = files
            .iter()
            .map(|file| {
                let mut spans = vec![Span::styled(file.title.clone(), Style::default().fg(colors.text))];
                if file.draft {
                    spans.push(Span::styled(" [draft]", Style::default().fg(colors.draft)));
                }
                ListItem::new(Line::from(spans))
            })
            .collect();

        let list = List::new(items)
            .block(self.pane_block(Pane::Files, Pane::Files.title().to_string()))
            .highlight_style(Style::default().bg(colors.selection_bg).add_modifier(Modifier::BOLD));
        let mut state = ListState::default().with_selected((!files.is_empty()).then_some(self.file_index));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_editor(&mut self, frame: &mut Frame, area: Rect) {
        let colors = self.theme_manager.current().colors.clone();
        let file = self.selected_file().cloned();
        let title = match &file {
            Some(file) => {
                let mut title = file.title.clone();
                if file.draft {
                    title.push_str(" [draft]");
                }
                if self.editor_modified() {
                    title.push_str(" *");
                }
                format!("{title} · {}", language_label(file.extension().as_deref()))
            }
            None => Pane::Editor.title().to_string(),
        };
        let block = self.pane_block(Pane::Editor, title);

        match &self.editor_state {
            EditorState::Loaded(_) => {
                self.editor.set_block(block);
                self.editor.set_style(Style::default().fg(colors.text));
                let cursor_line = if self.pane == Pane::Editor {
                    Style::default().bg(colors.cursor_line)
                } else {
                    Style::default()
                };
                self.editor.set_cursor_line_style(cursor_line);
                frame.render_widget(&self.editor, area);
            }
            EditorState::Loading(_) => {
                let text = Paragraph::new("Loading...")
                    .style(Style::default().fg(colors.text_dim))
                    .block(block);
                frame.render_widget(text, area);
            }
            EditorState::Empty => {
                let hint = if self.entries.is_empty() {
                    "No gists yet. Press [a] in the Gists pane to create one."
                } else {
                    "Select a file to view it."
                };
                let text = Paragraph::new(hint)
                    .style(Style::default().fg(colors.text_dim))
                    .block(block)
                    .wrap(Wrap { trim: true });
                frame.render_widget(text, area);
            }
        }
    }

    fn draw_status(&self, frame: &mut Frame, area: Rect) {
        let colors = &self.theme_manager.current().colors;
        let Some(status) = &self.status else {
            return;
        };
        let color = match status.level {
            StatusLevel::Info => colors.status_ok,
            StatusLevel::Busy => colors.status_busy,
            StatusLevel::Error => colors.status_error,
        };
        frame.render_widget(
            Paragraph::new(Span::styled(format!(" {}", status.text), Style::default().fg(color))),
            area,
        );
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let colors = &self.theme_manager.current().colors;
        let hotkey_style = Style::default().fg(colors.hotkey);
        let dim = Style::default().fg(colors.text_dim);
        let keys: &[(&str, &str)] = match self.pane {
            Pane::Editor => &[("^S", "Save"), ("^U", "Publish"), ("Esc", "Back")],
            _ => &[
                ("a", "New"),
                ("r", "Rename"),
                ("d", "Delete"),
                ("^U", "Publish"),
                ("R", "Refresh"),
                ("?", "Help"),
                ("q", "Quit"),
            ],
        };
        let mut spans = vec![Span::raw(" ")];
        for (key, label) in keys {
            spans.push(Span::styled(format!("[{key}]"), hotkey_style));
            spans.push(Span::styled(format!("{label} "), dim));
        }
        if let Some(login) = &self.login {
            spans.push(Span::styled(format!(" @{login}"), dim));
        }
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    /// Draw the help overlay.
    fn draw_help_overlay(&self, frame: &mut Frame, area: Rect) {
        let colors = &self.theme_manager.current().colors;
        let overlay_area = centered_rect(56, 28, area);
        frame.render_widget(Clear, overlay_area);

        let help_text = "\
gisting Hotkey Reference

Panes:
  Tab  Ctrl+L     Focus right
  S-Tab  Ctrl+H   Focus left
  Enter           Open gist / edit file
  ↑ k  ↓ j        Move selection

Gists and files:
  a               New gist / new file
  r               Rename
  d               Delete
  Ctrl+U          Publish gist
  R               Refresh from GitHub

Editor:
  Ctrl+S          Save
  Esc             Back to files

General:
  T               Cycle theme
  ?               Toggle this help
  q               Quit
  Ctrl+C          Force quit";

        let help = Paragraph::new(help_text)
            .style(Style::default().fg(colors.text))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(colors.header))
                    .title(Span::styled(
                        " Help ",
                        Style::default().fg(colors.header).add_modifier(Modifier::BOLD),
                    )),
            )
            .wrap(Wrap { trim: false });

        frame.render_widget(help, overlay_area);
    }
}

/// Move `index` by `delta` within `0..len`, saturating at both ends.
fn step(index: usize, delta: isize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    index.saturating_add_signed(delta).min(len - 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crossterm::event::{KeyCode, KeyModifiers};
    use gisting_remote::MockRemote;
    use gisting_store::LocalStore;
    use gisting_sync::{AppContext, SyncEngine};
    use ratatui::backend::TestBackend;
    use ratatui::buffer::Buffer;

    const WAIT: Duration = Duration::from_secs(5);

    fn test_app(mock: Arc<MockRemote>) -> App {
        let store = Arc::new(LocalStore::open_in_memory().unwrap());
        let engine = SyncEngine::new(AppContext::with_mock(store, mock));
        let mut app = App::new(SyncWorker::spawn(engine).unwrap(), ThemeManager::new());
        app.start();
        assert!(app.wait_idle(WAIT));
        app
    }

    fn press(app: &mut App, code: KeyCode) {
        app.handle_key_event(KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn render_app(app: &mut App, width: u16, height: u16) -> Buffer {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|frame| app.draw(frame)).unwrap();
        terminal.backend().buffer().clone()
    }

    fn buffer_to_string(buffer: &Buffer) -> String {
        let area = buffer.area;
        let mut result = String::new();
        for y in 0..area.height {
            for x in 0..area.width {
                result.push_str(buffer[(x, y)].symbol());
            }
            result.push('\n');
        }
        result
    }

    #[test]
    fn test_step_saturates() {
        assert_eq!(step(0, -1, 3), 0);
        assert_eq!(step(1, 1, 3), 2);
        assert_eq!(step(2, 1, 3), 2);
        assert_eq!(step(1, isize::MIN, 3), 0);
        assert_eq!(step(0, isize::MAX, 3), 2);
        assert_eq!(step(0, 1, 0), 0);
    }

    #[test]
    fn test_line_endings_restore_loaded_text() {
        for content in ["", "one", "one\n", "a\nb\n\n", "a\r\nb\r\n", "a\r\nb"] {
            let endings = LineEndings::detect(content);
            let lines: Vec<String> = content.lines().map(str::to_string).collect();
            assert_eq!(endings.join(&lines), content, "{content:?}");
        }
    }

    #[test]
    fn test_initial_refresh_loads_first_file() {
        let mock = Arc::new(MockRemote::new());
        mock.seed_gist("Notes", true, &[("a.md", "# hello")]);
        let mut app = test_app(mock.clone());
        assert!(app.wait_idle(WAIT));

        assert_eq!(app.entries().len(), 1);
        assert_eq!(app.editor_text(), "# hello");
        assert_eq!(mock.calls().fetch, 1);
    }

    #[test]
    fn test_renders_three_panes_and_draft_marker() {
        let mock = Arc::new(MockRemote::new());
        mock.seed_gist("Published one", true, &[("a.rs", "fn main() {}")]);
        let mut app = test_app(mock);
        assert!(app.wait_idle(WAIT));

        app.handle_app_event(AppEvent::Create);
        for c in "Scratch".chars() {
            press(&mut app, KeyCode::Char(c));
        }
        press(&mut app, KeyCode::Enter);
        assert!(app.wait_idle(WAIT));

        let screen = buffer_to_string(&render_app(&mut app, 120, 20));
        assert!(screen.contains("Gists (2)"));
        assert!(screen.contains("Files"));
        assert!(screen.contains("Scratch (Draft)"));
        assert!(screen.contains("Published one"));
    }

    #[test]
    fn test_editor_title_shows_language() {
        let mock = Arc::new(MockRemote::new());
        mock.seed_gist("Notes", true, &[("main.rs", "fn main() {}")]);
        let mut app = test_app(mock);
        assert!(app.wait_idle(WAIT));

        let screen = buffer_to_string(&render_app(&mut app, 120, 20));
        assert!(screen.contains("main.rs · Rust"));
        assert!(screen.contains("fn main() {}"));
    }

    #[test]
    fn test_help_overlay_toggles() {
        let mut app = test_app(Arc::new(MockRemote::new()));
        press(&mut app, KeyCode::Char('?'));
        assert!(app.show_help());
        let screen = buffer_to_string(&render_app(&mut app, 100, 30));
        assert!(screen.contains("Hotkey Reference"));

        press(&mut app, KeyCode::Char('x'));
        assert!(!app.show_help());
        assert_eq!(app.input_mode(), InputMode::Normal);
    }

    #[test]
    fn test_quit_only_outside_editor() {
        let mock = Arc::new(MockRemote::new());
        mock.seed_gist("Notes", true, &[("a.txt", "one")]);
        let mut app = test_app(mock);
        assert!(app.wait_idle(WAIT));

        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.pane(), Pane::Editor);
        press(&mut app, KeyCode::Char('q'));
        assert!(!app.should_quit());
        assert_eq!(app.editor_text(), "qone");

        press(&mut app, KeyCode::Esc);
        assert_eq!(app.pane(), Pane::Files);
        press(&mut app, KeyCode::Char('q'));
        assert!(app.should_quit());
    }

    #[test]
    fn test_busy_commands_are_ignored() {
        let mut app = test_app(Arc::new(MockRemote::new()));
        press(&mut app, KeyCode::Char('R'));
        assert_eq!(app.in_flight(), Some(SyncAction::Refresh));

        press(&mut app, KeyCode::Char('R'));
        assert_eq!(app.status_text(), Some("busy: refresh in progress"));
        assert!(app.wait_idle(WAIT));
        assert_eq!(app.in_flight(), None);
    }

    #[test]
    fn test_empty_dialog_name_stays_open() {
        let mut app = test_app(Arc::new(MockRemote::new()));
        press(&mut app, KeyCode::Char('a'));
        assert_eq!(app.input_mode(), InputMode::Dialog);
        press(&mut app, KeyCode::Enter);

        assert!(app.dialog().is_some());
        assert_eq!(app.status_level(), Some(StatusLevel::Error));
        assert_eq!(app.in_flight(), None);
    }
}
