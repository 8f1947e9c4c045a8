//! Event handling for the gisting TUI.
//!
//! Converts key presses into [`AppEvent`]s. What a key means depends on the
//! [`InputMode`]: in the editor and in dialogs most keys are text input.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Which part of the UI receives keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    /// Navigating the gist and file lists
    #[default]
    Normal,
    /// Typing in the editor pane
    Editor,
    /// Typing in a create or rename dialog
    Dialog,
    /// Answering a yes/no question
    Confirm,
    /// Help overlay open
    Help,
}

/// Application-level events that can trigger state changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// Move focus one pane to the right
    FocusRight,
    /// Move focus one pane to the left
    FocusLeft,
    /// Descend into the selected item
    Select,
    NavigateUp,
    NavigateDown,
    GoToTop,
    GoToBottom,
    /// Open the create dialog for the focused pane
    Create,
    /// Open the rename dialog for the selected item
    Rename,
    /// Ask to delete the selected item
    Delete,
    /// Upload the selected gist
    Publish,
    /// Save the editor content
    Save,
    /// Reconcile with the remote
    Refresh,
    CycleTheme,
    ToggleHelp,
    /// Request application quit
    Quit,
    /// Force quit (Ctrl+C)
    ForceQuit,
    /// Leave the editor, close a dialog or the help overlay
    Cancel,
    /// Key for the editor text area
    EditorInput(KeyEvent),
    /// Key for the dialog text field
    DialogInput(KeyEvent),
    /// Switch the Public/Secret toggle of the create dialog
    ToggleVisibility,
    /// Accept the dialog
    Submit,
    /// Answer yes to a confirmation
    Confirm,
    /// No action needed
    None,
}

/// Input handler for converting key events to app events.
#[derive(Debug, Default)]
pub struct InputHandler {
    mode: InputMode,
}

impl InputHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> InputMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: InputMode) {
        self.mode = mode;
    }

    /// Handle a key event and return the corresponding app event.
    pub fn handle_key(&mut self, key: KeyEvent) -> AppEvent {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        // Ctrl+C always force quits
        if ctrl && key.code == KeyCode::Char('c') {
            return AppEvent::ForceQuit;
        }

        match self.mode {
            InputMode::Normal => self.handle_normal_mode(key),
            InputMode::Editor => self.handle_editor_mode(key),
            InputMode::Dialog => self.handle_dialog_mode(key),
            InputMode::Confirm => self.handle_confirm_mode(key),
            InputMode::Help => AppEvent::ToggleHelp,
        }
    }

    fn handle_normal_mode(&self, key: KeyEvent) -> AppEvent {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return match key.code {
                KeyCode::Char('l') => AppEvent::FocusRight,
                KeyCode::Char('h') => AppEvent::FocusLeft,
                KeyCode::Char('u') => AppEvent::Publish,
                _ => AppEvent::None,
            };
        }

        match key.code {
            KeyCode::Char('q') => AppEvent::Quit,
            KeyCode::Char('?') => AppEvent::ToggleHelp,
            KeyCode::Esc => AppEvent::Cancel,

            // Pane focus
            KeyCode::Tab => {
                if key.modifiers.contains(KeyModifiers::SHIFT) {
                    AppEvent::FocusLeft
                } else {
                    AppEvent::FocusRight
                }
            }
            KeyCode::BackTab => AppEvent::FocusLeft,
            KeyCode::Enter => AppEvent::Select,

            // List navigation
            KeyCode::Up | KeyCode::Char('k') => AppEvent::NavigateUp,
            KeyCode::Down | KeyCode::Char('j') => AppEvent::NavigateDown,
            KeyCode::Home | KeyCode::Char('g') => AppEvent::GoToTop,
            KeyCode::End | KeyCode::Char('G') => AppEvent::GoToBottom,

            // Gist and file actions
            KeyCode::Char('a') => AppEvent::Create,
            KeyCode::Char('r') => AppEvent::Rename,
            KeyCode::Char('d') => AppEvent::Delete,
            KeyCode::Char('R') => AppEvent::Refresh,
            KeyCode::Char('T') => AppEvent::CycleTheme,

            _ => AppEvent::None,
        }
    }

    fn handle_editor_mode(&self, key: KeyEvent) -> AppEvent {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('s') => return AppEvent::Save,
                KeyCode::Char('u') => return AppEvent::Publish,
                KeyCode::Char('h') => return AppEvent::FocusLeft,
                _ => {}
            }
        }
        match key.code {
            KeyCode::Esc => AppEvent::Cancel,
            KeyCode::BackTab => AppEvent::FocusLeft,
            _ => AppEvent::EditorInput(key),
        }
    }

    fn handle_dialog_mode(&self, key: KeyEvent) -> AppEvent {
        match key.code {
            KeyCode::Esc => AppEvent::Cancel,
            KeyCode::Enter => AppEvent::Submit,
            KeyCode::Tab | KeyCode::BackTab => AppEvent::ToggleVisibility,
            _ => AppEvent::DialogInput(key),
        }
    }

    fn handle_confirm_mode(&self, key: KeyEvent) -> AppEvent {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => AppEvent::Confirm,
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => AppEvent::Cancel,
            _ => AppEvent::None,
        }
    }
}
