//! Reusable UI widgets
//!
//! Contains common UI components used across multiple screens:
//! - Popup dialogs (confirmation, error, text input)
//! - Progress bar and empty-state placeholders
//! - Flash messages and status bar

use crate::ui::Theme;
use ratatui::{
    layout::{Alignment, Constraint, Layout, Margin, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

/// Width of every popup, shrunk on narrow terminals
const POPUP_WIDTH: u16 = 56;

/// Draw a boxed dialog over `area` with a row of key hints under the body
pub fn render_popup(
    frame: &mut Frame,
    title: &str,
    body: Vec<Line>,
    keys: &[(&str, char)],
    theme: &Theme,
    area: Rect,
) {
    // Border, padding and the key row take 6 lines
    let height = body.len() as u16 + 6;
    let popup = centered_rect(POPUP_WIDTH, height, area);
    frame.render_widget(Clear, popup);

    let block = Block::default()
        .title(format!(" {} ", title))
        .title_style(theme.title())
        .borders(Borders::ALL)
        .border_style(theme.border_focused())
        .style(theme.text());
    let inner = block.inner(popup).inner(Margin::new(1, 1));
    frame.render_widget(block, popup);

    let [body_area, _, keys_area] = Layout::vertical([
        Constraint::Min(1),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .areas(inner);

    frame.render_widget(
        Paragraph::new(body).style(theme.text()).wrap(Wrap { trim: false }),
        body_area,
    );
    frame.render_widget(
        Paragraph::new(key_hints(keys, theme)).alignment(Alignment::Center),
        keys_area,
    );
}

/// `[y] Yes    [n] Cancel`
fn key_hints<'a>(keys: &[(&'a str, char)], theme: &Theme) -> Line<'a> {
    let key_style = Style::default().fg(theme.accent).add_modifier(Modifier::BOLD);
    let mut spans = Vec::with_capacity(keys.len() * 5);
    for (i, (label, key)) in keys.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw("    "));
        }
        spans.push(Span::styled("[", theme.text_dim()));
        spans.push(Span::styled(key.to_string(), key_style));
        spans.push(Span::styled("] ", theme.text_dim()));
        spans.push(Span::styled(*label, theme.text()));
    }
    Line::from(spans)
}

/// Render a confirmation popup with Yes/No buttons
pub fn render_confirm_popup(
    frame: &mut Frame,
    title: &str,
    message: &str,
    theme: &Theme,
    area: Rect,
) {
    let mut content = vec![Line::raw("")];
    content.extend(message.lines().map(Line::raw));
    content.push(Line::raw(""));

    render_popup(
        frame,
        title,
        content,
        &[("Yes", 'y'), ("Cancel", 'n')],
        theme,
        area,
    );
}

/// Render an error popup
pub fn render_error_popup(
    frame: &mut Frame,
    title: &str,
    message: &str,
    theme: &Theme,
    area: Rect,
) {
    let content = vec![
        Line::raw(""),
        Line::styled(message, theme.error()),
        Line::raw(""),
    ];

    render_popup(
        frame,
        title,
        content,
        &[("OK", 'o')],
        theme,
        area,
    );
}

/// Render a single-line text prompt
pub fn render_input_popup(
    frame: &mut Frame,
    title: &str,
    label: &str,
    value: &str,
    theme: &Theme,
    area: Rect,
) {
    let content = vec![
        Line::styled(label, theme.text_dim()),
        Line::raw(""),
        Line::from(vec![
            Span::styled("> ", Style::default().fg(theme.accent)),
            Span::styled(value, theme.text()),
            Span::styled("_", theme.text_dim()),
        ]),
    ];

    render_popup(
        frame,
        title,
        content,
        &[("Import", '⏎'), ("Cancel", '⎋')],
        theme,
        area,
    );
}

/// Text progress bar, e.g. `██████░░░░`
pub fn progress_bar(done: usize, total: usize, width: usize) -> String {
    let filled = if total == 0 {
        0
    } else {
        (done * width / total).min(width)
    };
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

/// Render a dimmed, centered placeholder for empty lists
pub fn render_empty_state(
    frame: &mut Frame,
    message: &str,
    hint: &str,
    theme: &Theme,
    area: Rect,
) {
    let top = area.height.saturating_sub(3) / 2;
    let mut lines: Vec<Line> = (0..top).map(|_| Line::raw("")).collect();
    lines.push(Line::styled(message, theme.text()));
    lines.push(Line::raw(""));
    lines.push(Line::styled(hint, theme.text_dim()));

    let placeholder = Paragraph::new(lines).alignment(Alignment::Center);
    frame.render_widget(placeholder, area);
}

/// Last row of `area`
fn bottom_line(area: Rect) -> Rect {
    Rect {
        y: area.bottom().saturating_sub(1),
        height: area.height.min(1),
        ..area
    }
}

/// Transient result line drawn over the status bar
pub fn render_flash_message(
    frame: &mut Frame,
    message: &str,
    is_error: bool,
    theme: &Theme,
    area: Rect,
) {
    let (mark, style) = if is_error {
        ("✗ ", theme.error())
    } else {
        ("✓ ", theme.success())
    };
    let line = bottom_line(area);

    frame.render_widget(Clear, line);
    frame.render_widget(
        Paragraph::new(Line::from(vec![Span::styled(mark, style), Span::styled(message, style)])),
        line,
    );
}

/// Key hints on the left, a short summary on the right
pub fn render_status_bar(frame: &mut Frame, hints: &str, summary: &str, theme: &Theme, area: Rect) {
    let line = bottom_line(area);
    let summary_width = summary.chars().count() as u16 + 1;
    let [hints_area, summary_area] =
        Layout::horizontal([Constraint::Min(0), Constraint::Length(summary_width)]).areas(line);

    frame.render_widget(Clear, line);
    frame.render_widget(Paragraph::new(hints).style(theme.text_dim()), hints_area);
    frame.render_widget(Paragraph::new(summary).style(theme.text_dim()), summary_area);
}

/// Rect of the given size centered in `area`, clamped to fit
pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

/// Side-by-side panels sized by percentage
pub fn horizontal_split(area: Rect, percentages: &[u16]) -> Vec<Rect> {
    Layout::horizontal(percentages.iter().map(|p| Constraint::Percentage(*p)))
        .split(area)
        .to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{backend::TestBackend, Terminal};

    #[test]
    fn test_centered_rect() {
        let area = Rect::new(0, 0, 100, 50);
        let popup = centered_rect(40, 20, area);

        assert_eq!(popup.x, 30);
        assert_eq!(popup.y, 15);
        assert_eq!(popup.width, 40);
        assert_eq!(popup.height, 20);
    }

    #[test]
    fn test_centered_rect_clamps_to_area() {
        let area = Rect::new(5, 5, 30, 10);
        assert_eq!(centered_rect(56, 20, area), area);
    }

    fn draw(width: u16, height: u16, f: impl FnOnce(&mut Frame)) -> Vec<String> {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(f).unwrap();
        let buffer = terminal.backend().buffer();
        buffer
            .content
            .chunks(width as usize)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect())
            .collect()
    }

    #[test]
    fn test_confirm_popup_shows_message_and_keys() {
        let theme = Theme::dark();
        let lines = draw(80, 20, |frame| {
            let area = frame.area();
            render_confirm_popup(frame, "Delete Test", "Delete \"Verbs\"?", &theme, area);
        });
        assert!(lines.iter().any(|l| l.contains("Delete Test")));
        assert!(lines.iter().any(|l| l.contains("Delete \"Verbs\"?")));
        assert!(lines.iter().any(|l| l.contains("[y] Yes") && l.contains("[n] Cancel")));
    }

    #[test]
    fn test_status_bar_uses_last_row() {
        let theme = Theme::dark();
        let lines = draw(40, 5, |frame| {
            let area = frame.area();
            render_status_bar(frame, "q quit", "2 tests", &theme, area);
        });
        assert!(lines[4].starts_with("q quit"));
        assert!(lines[4].trim_end().ends_with("2 tests"));
        assert!(lines[..4].iter().all(|l| l.trim().is_empty()));
    }

    #[test]
    fn test_horizontal_split() {
        let area = Rect::new(0, 0, 100, 50);
        let splits = horizontal_split(area, &[40, 60]);

        assert_eq!(splits.len(), 2);
        assert_eq!(splits[0].width, 40);
        assert_eq!(splits[1].width, 60);
    }

    #[test]
    fn test_progress_bar() {
        assert_eq!(progress_bar(0, 0, 4), "░░░░");
        assert_eq!(progress_bar(1, 2, 4), "██░░");
        assert_eq!(progress_bar(5, 5, 4), "████");
    }
}
