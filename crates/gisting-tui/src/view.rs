//! Panes and focus navigation.
//!
//! The screen is split into three panes laid out left to right. Focus moves
//! between neighbours and stops at either end.

use std::fmt;

use chrono::{DateTime, Utc};
use gisting_core::types::parse_timestamp;

/// The three panes of the main screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pane {
    /// Gist list
    #[default]
    Gists,
    /// Files of the selected gist
    Files,
    /// Content of the selected file
    Editor,
}

impl Pane {
    /// All panes in display order.
    pub const ALL: [Pane; 3] = [Pane::Gists, Pane::Files, Pane::Editor];

    /// Returns the display title for this pane.
    pub fn title(&self) -> &'static str {
        match self {
            Pane::Gists => "Gists",
            Pane::Files => "Files",
            Pane::Editor => "Editor",
        }
    }

    /// The pane to the right. The editor stays put.
    pub fn right(&self) -> Pane {
        match self {
            Pane::Gists => Pane::Files,
            Pane::Files | Pane::Editor => Pane::Editor,
        }
    }

    /// The pane to the left. The gist list stays put.
    pub fn left(&self) -> Pane {
        match self {
            Pane::Gists | Pane::Files => Pane::Gists,
            Pane::Editor => Pane::Files,
        }
    }

    /// Whether the pane shows a selectable list.
    pub fn is_list(&self) -> bool {
        !matches!(self, Pane::Editor)
    }
}

impl fmt::Display for Pane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title())
    }
}

/// Language label for the editor title, derived from a file extension.
pub fn language_label(extension: Option<&str>) -> &'static str {
    let Some(ext) = extension else {
        return "Plain Text";
    };
    match ext {
        "rs" => "Rust",
        "go" => "Go",
        "py" => "Python",
        "rb" => "Ruby",
        "js" | "mjs" | "cjs" => "JavaScript",
        "ts" => "TypeScript",
        "tsx" | "jsx" => "React",
        "java" => "Java",
        "kt" | "kts" => "Kotlin",
        "c" | "h" => "C",
        "cpp" | "cc" | "cxx" | "hpp" => "C++",
        "cs" => "C#",
        "swift" => "Swift",
        "php" => "PHP",
        "lua" => "Lua",
        "sh" | "bash" | "zsh" => "Shell",
        "ps1" => "PowerShell",
        "sql" => "SQL",
        "html" | "htm" => "HTML",
        "css" => "CSS",
        "scss" | "sass" => "Sass",
        "json" => "JSON",
        "yaml" | "yml" => "YAML",
        "toml" => "TOML",
        "xml" => "XML",
        "md" | "markdown" => "Markdown",
        "txt" => "Plain Text",
        "dockerfile" => "Dockerfile",
        "ex" | "exs" => "Elixir",
        "hs" => "Haskell",
        "ml" => "OCaml",
        "zig" => "Zig",
        _ => "Plain Text",
    }
}

/// Short "updated" label for list rows: `just now`, `5m ago`, `3h ago`,
/// `2d ago`, then the date.
pub fn relative_time(timestamp: &str, now: DateTime<Utc>) -> String {
    let Some(time) = parse_timestamp(timestamp) else {
        return String::new();
    };
    let secs = (now - time).num_seconds().max(0);
    match secs {
        0..60 => "just now".to_string(),
        60..3_600 => format!("{}m ago", secs / 60),
        3_600..86_400 => format!("{}h ago", secs / 3_600),
        86_400..2_592_000 => format!("{}d ago", secs / 86_400),
        _ => time.format("%Y-%m-%d").to_string(),
    }
}
