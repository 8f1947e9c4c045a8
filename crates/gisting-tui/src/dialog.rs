//! Modal dialogs: create, rename and delete confirmation.

use crossterm::event::{KeyCode, KeyEvent};
use gisting_core::types::{FileId, GistId, Visibility};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};
use tui_textarea::{CursorMove, TextArea};

use crate::theme::Theme;
use crate::worker::SyncCommand;

/// What a delete confirmation will remove.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteTarget {
    Gist(GistId),
    File(FileId),
}

/// The purpose of a dialog and the item it acts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogKind {
    CreateGist,
    CreateFile { gist_id: GistId },
    RenameGist { gist_id: GistId },
    RenameFile { file_id: FileId },
    Delete(DeleteTarget),
}

/// A modal dialog with a single-line text field or a yes/no question.
#[derive(Debug)]
pub struct Dialog {
    kind: DialogKind,
    title: String,
    input: TextArea<'static>,
    visibility: Visibility,
}

impl Dialog {
    fn with_input(kind: DialogKind, title: impl Into<String>, initial: &str) -> Self {
        let mut input = TextArea::new(vec![initial.to_string()]);
        input.move_cursor(CursorMove::End);
        input.set_cursor_line_style(Style::default());
        Self {
            kind,
            title: title.into(),
            input,
            visibility: Visibility::Public,
        }
    }

    pub fn create_gist() -> Self {
        Self::with_input(DialogKind::CreateGist, "New gist", "")
    }

    pub fn create_file(gist_id: impl Into<GistId>) -> Self {
        Self::with_input(
            DialogKind::CreateFile {
                gist_id: gist_id.into(),
            },
            "New file",
            "",
        )
    }

    pub fn rename_gist(gist_id: impl Into<GistId>, current: &str) -> Self {
        Self::with_input(
            DialogKind::RenameGist {
                gist_id: gist_id.into(),
            },
            "Rename gist",
            current,
        )
    }

    pub fn rename_file(file_id: impl Into<FileId>, current: &str) -> Self {
        Self::with_input(
            DialogKind::RenameFile {
                file_id: file_id.into(),
            },
            "Rename file",
            current,
        )
    }

    /// Ask before deleting; `label` names the item in the question.
    pub fn confirm_delete(target: DeleteTarget, label: &str) -> Self {
        let noun = match target {
            DeleteTarget::Gist(_) => "gist",
            DeleteTarget::File(_) => "file",
        };
        Self::with_input(
            DialogKind::Delete(target),
            format!("Delete {noun} \"{label}\"?"),
            "",
        )
    }

    pub fn kind(&self) -> &DialogKind {
        &self.kind
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn is_confirmation(&self) -> bool {
        matches!(self.kind, DialogKind::Delete(_))
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    /// The text field, trimmed.
    pub fn value(&self) -> String {
        self.input
            .lines()
            .first()
            .map(|line| line.trim().to_string())
            .unwrap_or_default()
    }

    /// Feed a key to the text field. Line breaks are ignored.
    pub fn input(&mut self, key: KeyEvent) {
        if matches!(key.code, KeyCode::Enter) {
            return;
        }
        self.input.input(key);
    }

    /// Switch Public/Secret. Only the create-gist dialog has the toggle.
    pub fn toggle_visibility(&mut self) {
        if self.kind == DialogKind::CreateGist {
            self.visibility = self.visibility.toggle();
        }
    }

    /// The command this dialog submits.
    ///
    /// Text dialogs with an empty field produce nothing; the caller reports
    /// that without contacting the worker.
    pub fn to_command(&self) -> Option<SyncCommand> {
        let value = self.value();
        if !self.is_confirmation() && value.is_empty() {
            return None;
        }
        let command = match &self.kind {
            DialogKind::CreateGist => SyncCommand::CreateGist {
                name: value,
                visibility: self.visibility,
            },
            DialogKind::CreateFile { gist_id } => SyncCommand::CreateFile {
                gist_id: gist_id.clone(),
                title: value,
                content: String::new(),
            },
            DialogKind::RenameGist { gist_id } => SyncCommand::RenameGist {
                gist_id: gist_id.clone(),
                name: value,
            },
            DialogKind::RenameFile { file_id } => SyncCommand::RenameFile {
                file_id: file_id.clone(),
                title: value,
            },
            DialogKind::Delete(DeleteTarget::Gist(gist_id)) => SyncCommand::DeleteGist {
                gist_id: gist_id.clone(),
            },
            DialogKind::Delete(DeleteTarget::File(file_id)) => SyncCommand::DeleteFile {
                file_id: file_id.clone(),
            },
        };
        Some(command)
    }

    /// Draw the dialog centered over `area`.
    pub fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let colors = &theme.colors;
        let height = match self.kind {
            DialogKind::CreateGist => 7,
            DialogKind::Delete(_) => 5,
            _ => 6,
        };
        let dialog_area = centered_rect(50, height, area);
        frame.render_widget(Clear, dialog_area);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(colors.header))
            .title(Span::styled(
                format!(" {} ", self.title),
                Style::default().fg(colors.header).add_modifier(Modifier::BOLD),
            ));
        let inner = block.inner(dialog_area);
        frame.render_widget(block, dialog_area);

        let hint_style = Style::default().fg(colors.text_dim);
        let key_style = Style::default().fg(colors.hotkey);

        if self.is_confirmation() {
            let question = Paragraph::new(Line::from(vec![
                Span::styled("[y]", key_style),
                Span::styled(" delete   ", hint_style),
                Span::styled("[n]", key_style),
                Span::styled(" keep", hint_style),
            ]))
            .wrap(Wrap { trim: true });
            frame.render_widget(question, inner);
            return;
        }

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(1),
                Constraint::Min(0),
            ])
            .split(inner);

        self.input.set_block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(colors.border_dim))
                .title(" Name "),
        );
        self.input.set_style(Style::default().fg(colors.text));
        frame.render_widget(&self.input, rows[0]);

        let mut hints = Vec::new();
        if self.kind == DialogKind::CreateGist {
            let (public, secret) = match self.visibility {
                Visibility::Public => (
                    key_style.add_modifier(Modifier::BOLD),
                    hint_style,
                ),
                Visibility::Secret => (
                    hint_style,
                    key_style.add_modifier(Modifier::BOLD),
                ),
            };
            hints.push(Line::from(vec![
                Span::styled("Public", public),
                Span::styled(" / ", hint_style),
                Span::styled("Secret", secret),
                Span::styled("  [Tab] toggle", hint_style),
            ]));
        }
        hints.push(Line::from(vec![
            Span::styled("[Enter]", key_style),
            Span::styled(" ok  ", hint_style),
            Span::styled("[Esc]", key_style),
            Span::styled(" cancel", hint_style),
        ]));
        frame.render_widget(Paragraph::new(hints), rows[1].union(rows[2]));
    }
}

/// A `width` x `height` rectangle centered in `area`, clipped to it.
pub(crate) fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn type_text(dialog: &mut Dialog, text: &str) {
        for c in text.chars() {
            dialog.input(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE));
        }
    }

    #[test]
    fn test_create_gist_command() {
        let mut dialog = Dialog::create_gist();
        type_text(&mut dialog, "  Notes ");
        dialog.toggle_visibility();

        assert_eq!(
            dialog.to_command(),
            Some(SyncCommand::CreateGist {
                name: "Notes".to_string(),
                visibility: Visibility::Secret,
            })
        );
    }

    #[test]
    fn test_empty_name_yields_no_command() {
        let mut dialog = Dialog::create_file("g1");
        type_text(&mut dialog, "   ");
        assert_eq!(dialog.to_command(), None);
    }

    #[test]
    fn test_rename_is_prefilled() {
        let mut dialog = Dialog::rename_file("f1", "a.txt");
        assert_eq!(dialog.value(), "a.txt");

        for _ in 0..3 {
            dialog.input(KeyEvent::new(KeyCode::Backspace, KeyModifiers::NONE));
        }
        dialog.input(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE));
        type_text(&mut dialog, "md");
        assert_eq!(
            dialog.to_command(),
            Some(SyncCommand::RenameFile {
                file_id: "f1".to_string(),
                title: "a.md".to_string(),
            })
        );
    }

    #[test]
    fn test_toggle_only_on_create_gist() {
        let mut dialog = Dialog::rename_gist("g1", "Notes");
        dialog.toggle_visibility();
        assert_eq!(dialog.visibility(), Visibility::Public);
    }

    #[test]
    fn test_confirm_delete() {
        let dialog = Dialog::confirm_delete(DeleteTarget::File("f1".to_string()), "a.txt");
        assert!(dialog.is_confirmation());
        assert_eq!(dialog.title(), "Delete file \"a.txt\"?");
        assert_eq!(
            dialog.to_command(),
            Some(SyncCommand::DeleteFile {
                file_id: "f1".to_string()
            })
        );
    }

    #[test]
    fn test_centered_rect_is_clipped() {
        let area = Rect::new(0, 0, 40, 10);
        assert_eq!(centered_rect(20, 4, area), Rect::new(10, 3, 20, 4));
        assert_eq!(centered_rect(80, 20, area), area);
    }
}
