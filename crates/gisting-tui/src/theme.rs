//! Theme system for the gisting TUI.
//!
//! Provides color themes with runtime switching. The selected theme is stored
//! in the persisted [`Config`]; unknown names fall back to the default.

use gisting_core::Config;
use ratatui::style::Color;
use tracing::{debug, warn};

/// Theme name identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThemeName {
    /// Default theme
    #[default]
    Default,
    /// Dark theme (enhanced contrast)
    Dark,
    /// Light theme (for bright environments)
    Light,
    /// Cyberpunk theme (neon colors)
    Cyberpunk,
}

impl ThemeName {
    /// All available themes in cycle order.
    pub fn all() -> &'static [ThemeName] {
        &[
            ThemeName::Default,
            ThemeName::Dark,
            ThemeName::Light,
            ThemeName::Cyberpunk,
        ]
    }

    /// Get the next theme in the cycle.
    pub fn next(&self) -> ThemeName {
        let themes = Self::all();
        let current_idx = themes.iter().position(|t| t == self).unwrap_or(0);
        themes[(current_idx + 1) % themes.len()]
    }

    /// Get the display name for this theme.
    pub fn display_name(&self) -> &'static str {
        match self {
            ThemeName::Default => "Default",
            ThemeName::Dark => "Dark",
            ThemeName::Light => "Light",
            ThemeName::Cyberpunk => "Cyberpunk",
        }
    }

    /// The name stored in the config file.
    pub fn config_key(&self) -> &'static str {
        match self {
            ThemeName::Default => "default",
            ThemeName::Dark => "dark",
            ThemeName::Light => "light",
            ThemeName::Cyberpunk => "cyberpunk",
        }
    }

    /// Parse a theme name, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "default" => Some(ThemeName::Default),
            "dark" => Some(ThemeName::Dark),
            "light" => Some(ThemeName::Light),
            "cyberpunk" => Some(ThemeName::Cyberpunk),
            _ => None,
        }
    }
}

/// Color palette for a theme.
#[derive(Debug, Clone)]
pub struct ThemeColors {
    /// Pane titles and the focused border
    pub header: Color,
    /// Hotkey hints
    pub hotkey: Color,
    /// Normal text
    pub text: Color,
    /// Secondary text (timestamps, counts)
    pub text_dim: Color,
    /// Unfocused borders
    pub border_dim: Color,
    /// Background of the selected list row
    pub selection_bg: Color,
    /// Editor cursor line
    pub cursor_line: Color,
    /// `(Draft)` and `[draft]` markers
    pub draft: Color,
    /// Status line: success
    pub status_ok: Color,
    /// Status line: in progress
    pub status_busy: Color,
    /// Status line: error
    pub status_error: Color,
}

/// Complete theme definition.
#[derive(Debug, Clone)]
pub struct Theme {
    pub name: ThemeName,
    pub colors: ThemeColors,
}

impl Theme {
    pub fn default_theme() -> Self {
        Self {
            name: ThemeName::Default,
            colors: ThemeColors {
                header: Color::Cyan,
                hotkey: Color::Yellow,
                text: Color::White,
                text_dim: Color::Gray,
                border_dim: Color::DarkGray,
                selection_bg: Color::Rgb(40, 60, 80),
                cursor_line: Color::Rgb(35, 35, 35),
                draft: Color::Yellow,
                status_ok: Color::Green,
                status_busy: Color::Cyan,
                status_error: Color::Red,
            },
        }
    }

    pub fn dark_theme() -> Self {
        Self {
            name: ThemeName::Dark,
            colors: ThemeColors {
                header: Color::LightBlue,
                hotkey: Color::LightYellow,
                text: Color::White,
                text_dim: Color::DarkGray,
                border_dim: Color::Rgb(50, 50, 50),
                selection_bg: Color::Rgb(30, 30, 60),
                cursor_line: Color::Rgb(20, 20, 20),
                draft: Color::LightYellow,
                status_ok: Color::LightGreen,
                status_busy: Color::LightBlue,
                status_error: Color::LightRed,
            },
        }
    }

    pub fn light_theme() -> Self {
        Self {
            name: ThemeName::Light,
            colors: ThemeColors {
                header: Color::Blue,
                hotkey: Color::DarkGray,
                text: Color::Black,
                text_dim: Color::DarkGray,
                border_dim: Color::Gray,
                selection_bg: Color::Rgb(200, 220, 255),
                cursor_line: Color::Rgb(235, 235, 235),
                draft: Color::Rgb(180, 100, 0),
                status_ok: Color::Green,
                status_busy: Color::Blue,
                status_error: Color::Red,
            },
        }
    }

    pub fn cyberpunk_theme() -> Self {
        Self {
            name: ThemeName::Cyberpunk,
            colors: ThemeColors {
                header: Color::Magenta,
                hotkey: Color::Cyan,
                text: Color::White,
                text_dim: Color::LightMagenta,
                border_dim: Color::DarkGray,
                selection_bg: Color::Rgb(70, 0, 90),
                cursor_line: Color::Rgb(30, 0, 40),
                draft: Color::Rgb(0, 255, 255),
                status_ok: Color::Green,
                status_busy: Color::Magenta,
                status_error: Color::Red,
            },
        }
    }

    /// Get a theme by name.
    pub fn by_name(name: ThemeName) -> Self {
        match name {
            ThemeName::Default => Self::default_theme(),
            ThemeName::Dark => Self::dark_theme(),
            ThemeName::Light => Self::light_theme(),
            ThemeName::Cyberpunk => Self::cyberpunk_theme(),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::default_theme()
    }
}

/// Holds the current theme and writes changes back to the config file.
#[derive(Debug)]
pub struct ThemeManager {
    current: Theme,
    config: Option<Config>,
}

impl Default for ThemeManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ThemeManager {
    /// Default theme, nothing persisted.
    pub fn new() -> Self {
        Self {
            current: Theme::default_theme(),
            config: None,
        }
    }

    /// Theme named in `config`; changes are saved back to it.
    pub fn from_config(config: Config) -> Self {
        let name = ThemeName::parse(&config.theme).unwrap_or_else(|| {
            warn!(theme = %config.theme, "unknown theme in config; using default");
            ThemeName::Default
        });
        debug!(theme = name.display_name(), "loaded theme");
        Self {
            current: Theme::by_name(name),
            config: Some(config),
        }
    }

    pub fn current(&self) -> &Theme {
        &self.current
    }

    /// Switch to the next theme in the cycle and persist the choice.
    ///
    /// A failed save is logged; the new theme stays active either way.
    pub fn cycle_theme(&mut self) -> ThemeName {
        let next = self.current.name.next();
        self.current = Theme::by_name(next);
        if let Some(config) = self.config.as_mut() {
            if let Err(e) = config.set_theme(next.config_key()) {
                warn!(error = %e, "failed to save theme");
            }
        }
        next
    }
}
