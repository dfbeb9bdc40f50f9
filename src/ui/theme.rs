//! Theme definitions for testeate
//!
//! Provides the dark and light palettes. The active one follows the
//! persisted `theme` setting.

use crate::config::ThemeName;
use ratatui::style::{Color, Modifier, Style};

/// Complete theme with all required colors
#[derive(Debug, Clone)]
pub struct Theme {
    // Base colors
    pub bg: Color,
    pub fg: Color,
    pub fg_dim: Color,

    // Accent colors
    pub accent: Color,
    pub accent_dim: Color,

    // Status colors
    pub success: Color,
    pub warning: Color,
    pub error: Color,

    // UI element colors
    pub border: Color,
    pub border_focused: Color,
    pub selection_bg: Color,
    pub selection_fg: Color,

    // Answer colors
    pub correct: Color,
    pub incorrect: Color,
    pub chosen: Color,
}

impl Theme {
    /// Create a theme from a theme name
    pub fn from_name(name: ThemeName) -> Self {
        match name {
            ThemeName::Dark => Self::dark(),
            ThemeName::Light => Self::light(),
        }
    }

    /// Dark palette (default)
    pub fn dark() -> Self {
        Self {
            bg: Color::Rgb(18, 18, 24),              // #121218
            fg: Color::Rgb(229, 231, 235),           // #e5e7eb
            fg_dim: Color::Rgb(156, 163, 175),       // #9ca3af

            accent: Color::Rgb(129, 140, 248),       // #818cf8
            accent_dim: Color::Rgb(99, 102, 241),    // #6366f1

            success: Color::Rgb(52, 211, 153),       // #34d399
            warning: Color::Rgb(251, 191, 36),       // #fbbf24
            error: Color::Rgb(248, 113, 113),        // #f87171

            border: Color::Rgb(55, 65, 81),          // #374151
            border_focused: Color::Rgb(129, 140, 248),
            selection_bg: Color::Rgb(55, 65, 81),
            selection_fg: Color::Rgb(249, 250, 251), // #f9fafb

            correct: Color::Rgb(52, 211, 153),
            incorrect: Color::Rgb(248, 113, 113),
            chosen: Color::Rgb(96, 165, 250),        // #60a5fa
        }
    }

    /// Light palette
    pub fn light() -> Self {
        Self {
            bg: Color::Rgb(249, 250, 251),           // #f9fafb
            fg: Color::Rgb(17, 24, 39),              // #111827
            fg_dim: Color::Rgb(107, 114, 128),       // #6b7280

            accent: Color::Rgb(79, 70, 229),         // #4f46e5
            accent_dim: Color::Rgb(129, 140, 248),

            success: Color::Rgb(5, 150, 105),        // #059669
            warning: Color::Rgb(217, 119, 6),        // #d97706
            error: Color::Rgb(220, 38, 38),          // #dc2626

            border: Color::Rgb(209, 213, 219),       // #d1d5db
            border_focused: Color::Rgb(79, 70, 229),
            selection_bg: Color::Rgb(224, 231, 255), // #e0e7ff
            selection_fg: Color::Rgb(17, 24, 39),

            correct: Color::Rgb(5, 150, 105),
            incorrect: Color::Rgb(220, 38, 38),
            chosen: Color::Rgb(37, 99, 235),         // #2563eb
        }
    }

    // Style helpers for common UI patterns

    /// Background fill for blocks
    pub fn block_style(&self) -> Style {
        Style::default().bg(self.bg)
    }

    /// Default text style
    pub fn text(&self) -> Style {
        Style::default().fg(self.fg).bg(self.bg)
    }

    /// Dimmed text style
    pub fn text_dim(&self) -> Style {
        Style::default().fg(self.fg_dim).bg(self.bg)
    }

    /// Title/header style
    pub fn title(&self) -> Style {
        Style::default()
            .fg(self.accent)
            .bg(self.bg)
            .add_modifier(Modifier::BOLD)
    }

    /// Selected item style
    pub fn selected(&self) -> Style {
        Style::default()
            .fg(self.selection_fg)
            .bg(self.selection_bg)
            .add_modifier(Modifier::BOLD)
    }

    pub fn border(&self) -> Style {
        Style::default().fg(self.border).bg(self.bg)
    }

    pub fn border_focused(&self) -> Style {
        Style::default().fg(self.border_focused).bg(self.bg)
    }

    pub fn tab_inactive(&self) -> Style {
        Style::default().fg(self.fg_dim).bg(self.bg)
    }

    pub fn tab_active(&self) -> Style {
        Style::default()
            .fg(self.accent)
            .bg(self.bg)
            .add_modifier(Modifier::BOLD)
    }

    pub fn success(&self) -> Style {
        Style::default().fg(self.success).bg(self.bg)
    }

    pub fn warning(&self) -> Style {
        Style::default().fg(self.warning).bg(self.bg)
    }

    pub fn error(&self) -> Style {
        Style::default().fg(self.error).bg(self.bg)
    }

    /// Option revealed as the right answer
    pub fn answer_correct(&self) -> Style {
        Style::default()
            .fg(self.correct)
            .bg(self.bg)
            .add_modifier(Modifier::BOLD)
    }

    /// Chosen option revealed as wrong
    pub fn answer_incorrect(&self) -> Style {
        Style::default()
            .fg(self.incorrect)
            .bg(self.bg)
            .add_modifier(Modifier::CROSSED_OUT)
    }

    /// Chosen option while the answer is still hidden
    pub fn answer_chosen(&self) -> Style {
        Style::default()
            .fg(self.chosen)
            .bg(self.bg)
            .add_modifier(Modifier::BOLD)
    }

    /// Color a percentage score by how good it is
    pub fn score(&self, score: u32) -> Style {
        let fg = match score {
            80.. => self.success,
            50..=79 => self.warning,
            _ => self.error,
        };
        Style::default().fg(fg).bg(self.bg).add_modifier(Modifier::BOLD)
    }
}
