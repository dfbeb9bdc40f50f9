//! Main rendering module
//!
//! Handles rendering the complete UI including:
//! - Header with tab bar
//! - Active tab / screen content
//! - Popups and overlays
//! - Status bar

use crate::app::{App, PopupState, Screen};
use crate::session::QuizSession;
use crate::types::{format_duration, QuizMode, Tab, TestResult};
use crate::ui::{theme::Theme, widgets};
use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Cell, List, ListItem, Paragraph, Row, Table, Tabs, Wrap},
    Frame,
};

/// Main render function - entry point for all UI rendering
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    frame.render_widget(Block::default().style(app.theme.block_style()), area);

    // Main layout: header, content, status bar
    let layout = Layout::vertical([
        Constraint::Length(3), // Header + tabs
        Constraint::Min(10),   // Content
        Constraint::Length(1), // Status bar
    ])
    .split(area);

    render_header(frame, app, layout[0]);
    render_tab_content(frame, app, layout[1]);
    render_status_bar(frame, app, layout[2]);

    // Render popup overlays (if any)
    render_popups(frame, app, area);
}

/// Render header with app name and tab bar
fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;

    let header_block = Block::default()
        .style(theme.block_style())
        .title(" testeate ")
        .title_style(theme.title())
        .borders(Borders::BOTTOM)
        .border_style(theme.border());

    frame.render_widget(header_block, area);

    let tab_titles: Vec<Line> = Tab::all()
        .iter()
        .enumerate()
        .map(|(i, tab)| {
            let style = if app.active_tab == *tab {
                theme.tab_active()
            } else {
                theme.tab_inactive()
            };
            Line::styled(format!("[{}] {}", i + 1, tab.label()), style)
        })
        .collect();

    let tabs = Tabs::new(tab_titles)
        .select(app.active_tab.index())
        .divider(" │ ")
        .style(theme.text());

    let tabs_area = Rect {
        x: area.x + 2,
        y: area.y + 1,
        width: area.width.saturating_sub(4),
        height: 1,
    };
    frame.render_widget(tabs, tabs_area);
}

/// Render the active tab's content
fn render_tab_content(frame: &mut Frame, app: &App, area: Rect) {
    match app.active_tab {
        Tab::Tests => match app.screen {
            Screen::List => render_tests_list(frame, app, area),
            Screen::Details => render_details(frame, app, area),
            Screen::Quiz => render_quiz(frame, app, area),
            Screen::Summary => render_summary(frame, app, area),
        },
        Tab::History => render_history_tab(frame, app, area),
        Tab::Settings => render_settings_tab(frame, app, area),
    }
}

/// Render status bar with keybindings
fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;

    let hints = match (app.active_tab, app.screen) {
        (Tab::Tests, Screen::List) => {
            "[j/k] Navigate  [Enter] Details  [i] Import  [d] Delete  [r] Reload  [q] Quit"
        }
        (Tab::Tests, Screen::Details) => {
            "[j/k] Question  [h/l] Set answer  [x] Clear  [p] Practice  [e] Exam  [Esc] Back"
        }
        (Tab::Tests, Screen::Quiz) => {
            "[↑/↓] Option  [Enter] Answer  [a-z] Pick  [←/→] Question  [End] Finish  [Esc] Abandon"
        }
        (Tab::Tests, Screen::Summary) => "[Enter] Details  [r] Retry  [2] History  [q] Quit",
        (Tab::History, _) => "[j/k] Navigate  [Enter] Open test  [r] Reload  [q] Quit",
        (Tab::Settings, _) => "[j/k] Navigate  [Enter] Change  [q] Quit",
    };

    let right = format!("{} tests", app.tests.len());
    widgets::render_status_bar(frame, hints, &right, theme, area);
}

/// Render popups if active
fn render_popups(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;

    match &app.popup {
        PopupState::None => {
            if let Some(input) = &app.import_input {
                widgets::render_input_popup(
                    frame,
                    "Import Question Bank",
                    "Path to a text file of numbered questions:",
                    input,
                    theme,
                    area,
                );
            }
        }

        PopupState::Confirm { title, message, .. } => {
            widgets::render_confirm_popup(frame, title, message, theme, area);
        }

        PopupState::Error { title, message } => {
            widgets::render_error_popup(frame, title, message, theme, area);
        }
    }

    // Flash message (success/error feedback)
    if let Some((msg, is_error, _)) = &app.flash_message {
        widgets::render_flash_message(frame, msg, *is_error, theme, area);
    }
}

fn bordered<'a>(title: String, theme: &Theme) -> Block<'a> {
    Block::default()
        .style(theme.block_style())
        .title(title)
        .title_style(theme.title())
        .borders(Borders::ALL)
        .border_style(theme.border_focused())
}

// === TESTS TAB ===

/// Home screen: all tests with configuration status and stats
fn render_tests_list(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;

    let block = bordered(format!(" Tests ({}) ", app.tests.len()), theme);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if app.tests.is_empty() {
        widgets::render_empty_state(
            frame,
            "No tests yet",
            "Press [i] to import a question bank",
            theme,
            inner,
        );
        return;
    }

    let header = Row::new(vec![
        Cell::from("NAME").style(theme.title()),
        Cell::from("QUESTIONS").style(theme.title()),
        Cell::from("KEY").style(theme.title()),
        Cell::from("ATTEMPTS").style(theme.title()),
        Cell::from("BEST").style(theme.title()),
    ]);

    // Header takes one row
    let visible = inner.height.saturating_sub(1) as usize;
    let offset = app.tests_selected.saturating_sub(visible.saturating_sub(1));

    let rows: Vec<Row> = app
        .tests
        .iter()
        .enumerate()
        .skip(offset)
        .take(visible)
        .map(|(i, entry)| {
            let test = &entry.test;
            let style = if i == app.tests_selected {
                theme.selected()
            } else {
                theme.text()
            };

            let (key_label, key_style) = if test.is_configured() {
                ("✓ ready".to_string(), theme.success())
            } else {
                (
                    format!("{}/{} keys", test.configured_count(), test.questions.len()),
                    theme.warning(),
                )
            };

            let best = match entry.stats.best_score {
                Some(score) => Cell::from(format!("{}%", score)).style(theme.score(score)),
                None => Cell::from("-"),
            };

            Row::new(vec![
                Cell::from(test.name.clone()),
                Cell::from(test.questions.len().to_string()),
                Cell::from(key_label).style(key_style),
                Cell::from(entry.stats.attempts.to_string()),
                best,
            ])
            .style(style)
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Min(20),
            Constraint::Length(10),
            Constraint::Length(12),
            Constraint::Length(9),
            Constraint::Length(6),
        ],
    )
    .header(header);

    frame.render_widget(table, inner);
}

/// Test Details: info and stats on the left, answer key on the right
fn render_details(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;
    let Some(details) = &app.details else {
        return;
    };
    let test = &details.test;

    let panels = widgets::horizontal_split(area, &[35, 65]);

    // Info panel
    let info_block = bordered(format!(" {} ", test.name), theme);
    let info_inner = info_block.inner(panels[0]);
    frame.render_widget(info_block, panels[0]);

    let status = if test.is_configured() {
        Span::styled("Configured", theme.success())
    } else {
        Span::styled(
            format!(
                "{} of {} answers set",
                test.configured_count(),
                test.questions.len()
            ),
            theme.warning(),
        )
    };

    let stats = &details.stats;
    let mut info = vec![
        Line::from(vec![
            Span::styled("Questions   ", theme.text_dim()),
            Span::styled(test.questions.len().to_string(), theme.text()),
        ]),
        Line::from(vec![
            Span::styled("Created     ", theme.text_dim()),
            Span::styled(test.formatted_date(), theme.text()),
        ]),
        Line::from(vec![Span::styled("Status      ", theme.text_dim()), status]),
        Line::raw(""),
        Line::from(vec![
            Span::styled("Attempts    ", theme.text_dim()),
            Span::styled(stats.attempts.to_string(), theme.text()),
        ]),
        Line::from(vec![
            Span::styled("Best score  ", theme.text_dim()),
            match stats.best_score {
                Some(score) => Span::styled(format!("{}%", score), theme.score(score)),
                None => Span::styled("-", theme.text()),
            },
        ]),
    ];
    if let Some(avg) = stats.average_score {
        info.push(Line::from(vec![
            Span::styled("Average     ", theme.text_dim()),
            Span::styled(format!("{:.0}%", avg), theme.text()),
        ]));
    }
    info.push(Line::raw(""));
    info.push(Line::styled(
        format!(
            "[p] Practice  [e] Exam  [m] {}",
            app.config.default_mode.as_str()
        ),
        Style::default().fg(theme.accent_dim),
    ));

    frame.render_widget(
        Paragraph::new(info).wrap(Wrap { trim: false }),
        info_inner,
    );

    // Answer key panel
    let key_block = bordered(" Answer Key ".into(), theme);
    let key_inner = key_block.inner(panels[1]);
    frame.render_widget(key_block, panels[1]);

    if test.questions.is_empty() {
        widgets::render_empty_state(frame, "This test has no questions", "", theme, key_inner);
        return;
    }

    // Keep the selected question visible
    let visible = key_inner.height as usize;
    let offset = details.selected.saturating_sub(visible.saturating_sub(1));

    let items: Vec<ListItem> = test
        .questions
        .iter()
        .enumerate()
        .skip(offset)
        .take(visible)
        .map(|(i, q)| {
            let style = if i == details.selected {
                theme.selected()
            } else {
                theme.text()
            };
            let answer = match q.correct_answer {
                Some(letter) => Span::styled(format!("[{}]", letter), theme.success()),
                None => Span::styled("[ ]", theme.warning()),
            };
            ListItem::new(Line::from(vec![
                answer,
                Span::styled(format!(" {:>3}. {}", q.number, q.text), style),
            ]))
        })
        .collect();

    frame.render_widget(List::new(items), key_inner);
}

/// Quiz screen: current question and its options
fn render_quiz(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;
    let Some(session) = &app.session else {
        return;
    };

    let block = bordered(
        format!(" {} · {} ", session.test().name, session.mode().as_str()),
        theme,
    );
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let layout = Layout::vertical([
        Constraint::Length(2), // Progress
        Constraint::Min(3),    // Question + options
    ])
    .split(inner);

    render_quiz_progress(frame, session, theme, layout[0]);

    let question = session.current_question();
    let revealed = session.is_revealed();
    let chosen = session.current_answer();

    let mut lines = vec![
        Line::styled(
            format!("{}. {}", question.number, question.text),
            theme.title(),
        ),
        Line::raw(""),
    ];

    for (i, option) in question.options.iter().enumerate() {
        let is_chosen = chosen == Some(option.letter);
        let is_correct = question.correct_answer == Some(option.letter);

        let style = if revealed && is_correct {
            theme.answer_correct()
        } else if revealed && is_chosen {
            theme.answer_incorrect()
        } else if is_chosen {
            theme.answer_chosen()
        } else {
            theme.text()
        };

        let cursor = if i == app.quiz_cursor { "▶ " } else { "  " };
        let mark = match (revealed, is_chosen, is_correct) {
            (true, _, true) => " ✓",
            (true, true, false) => " ✗",
            (false, true, _) => " ●",
            _ => "",
        };

        lines.push(Line::from(vec![
            Span::styled(cursor, Style::default().fg(theme.accent)),
            Span::styled(format!("{}) {}", option.letter, option.text), style),
            Span::styled(mark, style),
        ]));
    }

    frame.render_widget(
        Paragraph::new(lines).wrap(Wrap { trim: false }),
        layout[1],
    );
}

fn render_quiz_progress(frame: &mut Frame, session: &QuizSession, theme: &Theme, area: Rect) {
    let position = session.current_index() + 1;
    let total = session.question_count();
    let answered = session.answered_count();

    let line = Line::from(vec![
        Span::styled(format!("Question {}/{}  ", position, total), theme.text()),
        Span::styled(widgets::progress_bar(answered, total, 20), theme.success()),
        Span::styled(
            format!("  {} answered · {}", answered, format_duration(session.elapsed().as_secs())),
            theme.text_dim(),
        ),
    ]);

    frame.render_widget(Paragraph::new(line), area);
}

/// Summary of the attempt that was just saved
fn render_summary(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;
    let Some(result) = &app.last_result else {
        return;
    };

    let block = bordered(" Result ".into(), theme);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let verdict = match result.score {
        90.. => "Excellent!",
        70..=89 => "Well done",
        50..=69 => "Keep practicing",
        _ => "Review this test and try again",
    };

    let lines = vec![
        Line::raw(""),
        Line::styled(result.test_name.clone(), theme.title()),
        Line::raw(""),
        Line::styled(format!("{}%", result.score), theme.score(result.score)),
        Line::styled(verdict, theme.text_dim()),
        Line::raw(""),
        Line::from(vec![
            Span::styled(format!("{} correct", result.correct), theme.success()),
            Span::styled("  ·  ", theme.text_dim()),
            Span::styled(format!("{} incorrect", result.incorrect), theme.error()),
        ]),
        Line::styled(
            format!("{} mode · {}", result.mode.as_str(), result.formatted_time()),
            theme.text_dim(),
        ),
    ];

    frame.render_widget(
        Paragraph::new(lines).alignment(Alignment::Center),
        inner,
    );
}

// === HISTORY TAB ===

fn render_history_tab(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;

    let block = bordered(" History ".into(), theme);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if app.results.is_empty() {
        widgets::render_empty_state(
            frame,
            "No results yet",
            "Finish a test to see it here",
            theme,
            inner,
        );
        return;
    }

    let layout = Layout::vertical([
        Constraint::Length(3), // Statistics
        Constraint::Min(3),    // Results table
    ])
    .split(inner);

    let stats = &app.history_stats;
    let stats_lines = vec![
        Line::styled(stats.summary(), theme.title()),
        Line::styled(
            format!(
                "{} practice · {} exam",
                stats.practice_attempts, stats.exam_attempts
            ),
            theme.text_dim(),
        ),
    ];
    frame.render_widget(Paragraph::new(stats_lines), layout[0]);

    let header = Row::new(vec![
        Cell::from("DATE").style(theme.title()),
        Cell::from("TEST").style(theme.title()),
        Cell::from("MODE").style(theme.title()),
        Cell::from("SCORE").style(theme.title()),
        Cell::from("RIGHT").style(theme.title()),
        Cell::from("TIME").style(theme.title()),
    ]);

    let visible = layout[1].height.saturating_sub(1) as usize;
    let offset = app.history_selected.saturating_sub(visible.saturating_sub(1));

    let rows: Vec<Row> = app
        .results
        .iter()
        .enumerate()
        .skip(offset)
        .take(visible)
        .map(|(i, result)| history_row(result, i == app.history_selected, theme))
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(16),
            Constraint::Min(16),
            Constraint::Length(9),
            Constraint::Length(6),
            Constraint::Length(7),
            Constraint::Length(8),
        ],
    )
    .header(header);

    frame.render_widget(table, layout[1]);
}

fn history_row<'a>(result: &'a TestResult, selected: bool, theme: &Theme) -> Row<'a> {
    let style = if selected {
        theme.selected()
    } else {
        theme.text()
    };
    let mode_style = match result.mode {
        QuizMode::Practice => theme.text_dim(),
        QuizMode::Exam => Style::default().fg(theme.accent),
    };

    Row::new(vec![
        Cell::from(result.formatted_date()),
        Cell::from(result.test_name.as_str()),
        Cell::from(result.mode.as_str()).style(mode_style),
        Cell::from(format!("{}%", result.score)).style(theme.score(result.score)),
        Cell::from(format!("{}/{}", result.correct, result.total())),
        Cell::from(result.formatted_time()),
    ])
    .style(style)
}

// === SETTINGS TAB ===

fn render_settings_tab(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;

    let block = bordered(" Settings ".into(), theme);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let settings = [
        ("Theme", app.config.theme.as_str()),
        ("Default mode", app.config.default_mode.as_str()),
    ];

    let items: Vec<ListItem> = settings
        .iter()
        .enumerate()
        .map(|(i, (label, value))| {
            let style = if i == app.settings_selected {
                theme.selected()
            } else {
                theme.text()
            };

            ListItem::new(Line::from(vec![
                Span::styled(format!("{:<24}", label), style),
                Span::styled(format!("[{}]", value), Style::default().fg(theme.accent)),
            ]))
        })
        .collect();

    frame.render_widget(List::new(items), inner);

    // Config and data paths at bottom
    let path_area = Rect {
        x: inner.x,
        y: inner.y + inner.height.saturating_sub(2),
        width: inner.width,
        height: 2,
    };
    let paths = vec![
        Line::styled(
            format!("Config: {}", app.config_path.display()),
            theme.text_dim(),
        ),
        Line::styled(
            format!("Data:   {}", app.storage.data_dir().display()),
            theme.text_dim(),
        ),
    ];
    frame.render_widget(Paragraph::new(paths), path_area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::storage::Storage;
    use crate::types::{AnswerOption, Question, Test};
    use ratatui::{backend::TestBackend, Terminal};

    fn screen_lines(terminal: &Terminal<TestBackend>) -> Vec<String> {
        let buffer = terminal.backend().buffer();
        buffer
            .content
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect())
            .collect()
    }

    fn app_with_tests(count: usize) -> (tempfile::TempDir, App) {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::open(dir.path().join("data")).unwrap();
        for n in 1..=count {
            let question = Question::new(
                1,
                "Pick one",
                vec![AnswerOption::new('a', "yes"), AnswerOption::new('b', "no")],
            );
            storage
                .save_test(&Test::new(format!("Bank {:02}", n), vec![question]))
                .unwrap();
        }
        let app = App::new(storage, Config::default(), dir.path().join("config.toml"));
        (dir, app)
    }

    #[test]
    fn test_tests_list_scrolls_to_selection() {
        let (_dir, mut app) = app_with_tests(40);
        app.tests_selected = 39;
        let selected = app.tests[39].test.name.clone();
        let first = app.tests[0].test.name.clone();

        let mut terminal = Terminal::new(TestBackend::new(100, 24)).unwrap();
        terminal.draw(|frame| render(frame, &app)).unwrap();

        let lines = screen_lines(&terminal);
        assert!(lines.iter().any(|l| l.contains(&selected)));
        assert!(!lines.iter().any(|l| l.contains(&first)));
    }

    #[test]
    fn test_tests_list_starts_at_top() {
        let (_dir, app) = app_with_tests(40);
        let first = app.tests[0].test.name.clone();

        let mut terminal = Terminal::new(TestBackend::new(100, 24)).unwrap();
        terminal.draw(|frame| render(frame, &app)).unwrap();

        assert!(screen_lines(&terminal).iter().any(|l| l.contains(&first)));
    }
}
