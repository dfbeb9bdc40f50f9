//! Application state and event handling
//!
//! This is the core of testeate, managing:
//! - Application state across all tabs and screens
//! - Event handling (keyboard input)
//! - State transitions and data loading through the storage layer

use crate::config::Config;
use crate::session::{Feedback, QuizSession};
use crate::storage::Storage;
use crate::types::{HistoryStats, QuizMode, Tab, Test, TestResult, TestStats};
use crate::ui::Theme;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

/// Seconds a flash message stays visible
const FLASH_SECS: u64 = 3;

/// Main application state
pub struct App {
    // Core state
    pub should_quit: bool,
    pub active_tab: Tab,
    pub screen: Screen,
    pub config: Config,
    pub config_path: PathBuf,
    pub theme: Theme,
    pub storage: Storage,

    // Tests tab: list
    pub tests: Vec<TestEntry>,
    pub tests_selected: usize,
    pub import_input: Option<String>,

    // Tests tab: details
    pub details: Option<DetailsState>,

    // Tests tab: quiz and summary
    pub session: Option<QuizSession>,
    pub quiz_cursor: usize,
    pub last_result: Option<TestResult>,

    // History tab state
    pub results: Vec<TestResult>,
    pub history_stats: HistoryStats,
    pub history_selected: usize,

    // Settings tab state
    pub settings_selected: usize,

    // Popup state
    pub popup: PopupState,

    // Flash message (temporary feedback)
    pub flash_message: Option<(String, bool, Instant)>, // (message, is_error, timestamp)
}

/// Screens stacked inside the Tests tab
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Screen {
    #[default]
    List,
    Details,
    Quiz,
    Summary,
}

/// A test together with its statistics, as shown in the list
#[derive(Debug, Clone)]
pub struct TestEntry {
    pub test: Test,
    pub stats: TestStats,
}

/// Test Details screen state
#[derive(Debug, Clone)]
pub struct DetailsState {
    pub test: Test,
    pub stats: TestStats,
    pub selected: usize,
}

/// Popup overlay state
#[derive(Debug, Clone)]
pub enum PopupState {
    None,
    Confirm {
        title: String,
        message: String,
        action: PendingAction,
    },
    Error {
        title: String,
        message: String,
    },
}

/// Action waiting for a yes/no answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingAction {
    DeleteTest(Uuid),
    FinishQuiz,
    AbandonQuiz,
}

/// Application state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    ImportInput,
    ConfirmAction,
    ShowError,
}

/// Number of rows on the Settings tab
const SETTINGS_COUNT: usize = 2;

impl App {
    /// Create a new App instance and load the initial test list
    pub fn new(storage: Storage, config: Config, config_path: PathBuf) -> Self {
        let theme = Theme::from_name(config.theme);

        let mut app = Self {
            should_quit: false,
            active_tab: Tab::Tests,
            screen: Screen::List,
            config,
            config_path,
            theme,
            storage,

            tests: Vec::new(),
            tests_selected: 0,
            import_input: None,

            details: None,

            session: None,
            quiz_cursor: 0,
            last_result: None,

            results: Vec::new(),
            history_stats: HistoryStats::default(),
            history_selected: 0,

            settings_selected: 0,

            popup: PopupState::None,
            flash_message: None,
        };
        app.reload_tests();
        app
    }

    /// Get current app state
    pub fn state(&self) -> AppState {
        match &self.popup {
            PopupState::None if self.import_input.is_some() => AppState::ImportInput,
            PopupState::None => AppState::Normal,
            PopupState::Confirm { .. } => AppState::ConfirmAction,
            PopupState::Error { .. } => AppState::ShowError,
        }
    }

    /// Periodic housekeeping between frames
    pub fn tick(&mut self) {
        if let Some((_, _, instant)) = &self.flash_message {
            if instant.elapsed().as_secs() >= FLASH_SECS {
                self.flash_message = None;
            }
        }
    }

    /// Handle a key event
    pub fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        self.tick();

        match self.state() {
            AppState::ConfirmAction => self.handle_confirm_key(key),
            AppState::ShowError => self.handle_error_key(key),
            AppState::ImportInput => self.handle_import_key(key),
            AppState::Normal => self.handle_normal_key(key),
        }
    }

    /// Handle key in normal state
    fn handle_normal_key(&mut self, key: KeyEvent) -> Result<()> {
        // While a quiz runs every letter may be an option, so no global keys
        let in_quiz = self.active_tab == Tab::Tests && self.screen == Screen::Quiz;

        if !in_quiz {
            match key.code {
                KeyCode::Char('q') => {
                    self.should_quit = true;
                    return Ok(());
                }
                KeyCode::Char('1') => return self.switch_tab(Tab::Tests),
                KeyCode::Char('2') => return self.switch_tab(Tab::History),
                KeyCode::Char('3') => return self.switch_tab(Tab::Settings),
                _ => {}
            }
        }

        match self.active_tab {
            Tab::Tests => match self.screen {
                Screen::List => self.handle_list_key(key),
                Screen::Details => self.handle_details_key(key),
                Screen::Quiz => self.handle_quiz_key(key),
                Screen::Summary => self.handle_summary_key(key),
            },
            Tab::History => self.handle_history_key(key),
            Tab::Settings => self.handle_settings_key(key),
        }
    }

    /// Switch tabs, refetching the data of the tab gaining focus
    fn switch_tab(&mut self, tab: Tab) -> Result<()> {
        self.active_tab = tab;
        match tab {
            Tab::Tests => {
                if self.screen == Screen::List {
                    self.reload_tests();
                } else if self.screen == Screen::Details {
                    self.refresh_details();
                }
            }
            Tab::History => self.reload_history(),
            Tab::Settings => {}
        }
        Ok(())
    }

    /// Handle keys in the test list
    fn handle_list_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                if self.tests_selected < self.tests.len().saturating_sub(1) {
                    self.tests_selected += 1;
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.tests_selected = self.tests_selected.saturating_sub(1);
            }
            KeyCode::Char('g') => self.tests_selected = 0,
            KeyCode::Char('G') => self.tests_selected = self.tests.len().saturating_sub(1),
            KeyCode::Enter => {
                if let Some(entry) = self.tests.get(self.tests_selected) {
                    let id = entry.test.id;
                    self.open_details(id);
                }
            }
            KeyCode::Char('d') | KeyCode::Char('D') => {
                if let Some(entry) = self.tests.get(self.tests_selected) {
                    let (id, name) = (entry.test.id, entry.test.name.clone());
                    self.prompt_delete(id, &name);
                }
            }
            KeyCode::Char('i') | KeyCode::Char('I') => {
                self.import_input = Some(String::new());
            }
            KeyCode::Char('r') | KeyCode::Char('R') => {
                self.reload_tests();
                self.show_flash("Tests reloaded", false);
            }
            _ => {}
        }
        Ok(())
    }

    /// Handle keys while typing an import path
    fn handle_import_key(&mut self, key: KeyEvent) -> Result<()> {
        let Some(input) = self.import_input.as_mut() else {
            return Ok(());
        };

        match key.code {
            KeyCode::Char(c) => input.push(c),
            KeyCode::Backspace => {
                input.pop();
            }
            KeyCode::Esc => self.import_input = None,
            KeyCode::Enter => {
                let raw = input.trim().to_string();
                self.import_input = None;
                if !raw.is_empty() {
                    self.import_path(&expand_home(&raw));
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Import a question bank and select the first new test
    fn import_path(&mut self, path: &Path) {
        match self.storage.import_file(path, None, None) {
            Ok(imported) => {
                self.reload_tests();
                if let Some(first) = imported.first() {
                    if let Some(pos) = self.tests.iter().position(|e| e.test.id == first.id) {
                        self.tests_selected = pos;
                    }
                }
                self.show_flash(&format!("Imported {} test(s)", imported.len()), false);
            }
            Err(e) => {
                warn!(path = %path.display(), error = %format!("{:#}", e), "import failed");
                self.show_error("Import Failed", &format!("{:#}", e));
            }
        }
    }

    /// Handle keys on the Test Details screen
    fn handle_details_key(&mut self, key: KeyEvent) -> Result<()> {
        let Some(details) = self.details.as_mut() else {
            self.screen = Screen::List;
            return Ok(());
        };
        let question_count = details.test.questions.len();

        match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                if details.selected < question_count.saturating_sub(1) {
                    details.selected += 1;
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                details.selected = details.selected.saturating_sub(1);
            }
            KeyCode::Char('g') => details.selected = 0,
            KeyCode::Char('G') => details.selected = question_count.saturating_sub(1),
            KeyCode::Char('l') | KeyCode::Right => self.cycle_selected_answer(true),
            KeyCode::Char('h') | KeyCode::Left => self.cycle_selected_answer(false),
            KeyCode::Char('x') => self.set_selected_answer(None),
            KeyCode::Char('p') => self.start_quiz(QuizMode::Practice),
            KeyCode::Char('e') => self.start_quiz(QuizMode::Exam),
            KeyCode::Char('m') => self.start_quiz(self.config.default_mode),
            KeyCode::Char('D') => {
                let (id, name) = (details.test.id, details.test.name.clone());
                self.prompt_delete(id, &name);
            }
            KeyCode::Esc | KeyCode::Backspace => self.back_to_list(),
            _ => {}
        }
        Ok(())
    }

    fn cycle_selected_answer(&mut self, forward: bool) {
        let next = self.details.as_ref().and_then(|d| {
            d.test
                .questions
                .get(d.selected)
                .map(|q| q.cycle_answer(forward))
        });
        if let Some(answer) = next {
            self.set_selected_answer(answer);
        }
    }

    /// Persist the correct answer of the selected question
    fn set_selected_answer(&mut self, answer: Option<char>) {
        let Some(details) = self.details.as_ref() else {
            return;
        };
        let Some(question) = details.test.questions.get(details.selected) else {
            return;
        };

        match self
            .storage
            .set_correct_answer(details.test.id, question.id, answer)
        {
            Ok(test) => {
                if let Some(details) = self.details.as_mut() {
                    details.test = test;
                }
            }
            Err(e) => {
                warn!(error = %format!("{:#}", e), "could not save answer key");
                self.show_error("Save Failed", &format!("{:#}", e));
            }
        }
    }

    fn start_quiz(&mut self, mode: QuizMode) {
        let Some(details) = self.details.as_ref() else {
            return;
        };

        match QuizSession::start(details.test.clone(), mode) {
            Ok(session) => {
                info!(test = %details.test.id, mode = mode.as_str(), "quiz started");
                self.session = Some(session);
                self.quiz_cursor = 0;
                self.flash_message = None;
                self.screen = Screen::Quiz;
            }
            Err(e) => self.show_flash(&e.to_string(), true),
        }
    }

    /// Handle keys while taking a test
    fn handle_quiz_key(&mut self, key: KeyEvent) -> Result<()> {
        let Some(session) = self.session.as_mut() else {
            self.screen = Screen::Details;
            return Ok(());
        };
        let option_count = session.current_question().options.len();

        match key.code {
            KeyCode::Down => {
                if self.quiz_cursor < option_count.saturating_sub(1) {
                    self.quiz_cursor += 1;
                }
            }
            KeyCode::Up => {
                self.quiz_cursor = self.quiz_cursor.saturating_sub(1);
            }
            KeyCode::Right | KeyCode::Tab => {
                if session.next() {
                    self.sync_quiz_cursor();
                }
            }
            KeyCode::Left | KeyCode::BackTab => {
                if session.previous() {
                    self.sync_quiz_cursor();
                }
            }
            KeyCode::Enter => {
                if session.mode() == QuizMode::Practice && session.is_revealed() {
                    // Already answered: Enter moves on
                    if session.next() {
                        self.sync_quiz_cursor();
                    } else {
                        self.prompt_finish();
                    }
                } else if let Some(option) = session.current_question().options.get(self.quiz_cursor) {
                    let letter = option.letter;
                    self.answer_current(letter);
                    let prompt = self
                        .session
                        .as_ref()
                        .is_some_and(|s| s.is_last() && s.current_answer().is_some());
                    if prompt {
                        self.prompt_finish();
                    }
                }
            }
            KeyCode::Char(c) if session.current_question().has_option(c) => {
                self.answer_current(c);
                let prompt = self.session.as_ref().is_some_and(|s| {
                    s.is_last()
                        && match s.mode() {
                            QuizMode::Practice => true,
                            QuizMode::Exam => s.is_complete(),
                        }
                });
                if prompt {
                    self.prompt_finish();
                }
            }
            KeyCode::End => self.prompt_finish(),
            KeyCode::Esc => {
                self.popup = PopupState::Confirm {
                    title: "Abandon Test".into(),
                    message: "Leave this attempt? Nothing will be recorded.".into(),
                    action: PendingAction::AbandonQuiz,
                };
            }
            _ => {}
        }
        Ok(())
    }

    /// Answer the current question and report practice feedback
    fn answer_current(&mut self, letter: char) {
        let Some(session) = self.session.as_mut() else {
            return;
        };

        let feedback = session.select(letter);
        if let Some(idx) = session.current_question().option_index(letter) {
            self.quiz_cursor = idx;
        }

        match feedback {
            Feedback::Correct => self.show_flash("Correct!", false),
            Feedback::Incorrect { correct } => {
                self.show_flash(&format!("Incorrect · the answer is {})", correct), true)
            }
            Feedback::Recorded | Feedback::Locked | Feedback::InvalidOption => {}
        }
    }

    /// Put the option cursor on the stored answer of the current question
    fn sync_quiz_cursor(&mut self) {
        self.quiz_cursor = self
            .session
            .as_ref()
            .and_then(|s| {
                s.current_answer()
                    .and_then(|a| s.current_question().option_index(a))
            })
            .unwrap_or(0);
    }

    fn prompt_finish(&mut self) {
        let Some(session) = self.session.as_ref() else {
            return;
        };

        let unanswered = session.unanswered();
        let message = if unanswered.is_empty() {
            format!(
                "All {} questions answered.\n\nFinish and save the result?",
                session.question_count()
            )
        } else {
            format!(
                "{} question(s) unanswered: {:?}\nThey will count as incorrect.\n\nFinish anyway?",
                unanswered.len(),
                unanswered
            )
        };

        self.popup = PopupState::Confirm {
            title: "Finish Test".into(),
            message,
            action: PendingAction::FinishQuiz,
        };
    }

    /// Score and store the running attempt
    fn finish_quiz(&mut self) {
        let Some(session) = self.session.as_ref() else {
            return;
        };

        let result = session.finish();
        match self.storage.save_result(&result) {
            Ok(()) => {
                self.session = None;
                self.last_result = Some(result);
                self.screen = Screen::Summary;
            }
            Err(e) => {
                warn!(error = %format!("{:#}", e), "could not save result");
                self.show_error("Save Failed", &format!("{:#}", e));
            }
        }
    }

    fn abandon_quiz(&mut self) {
        if let Some(session) = self.session.take() {
            info!(test = %session.test().id, "quiz abandoned");
        }
        self.flash_message = None;
        self.screen = Screen::Details;
        self.refresh_details();
    }

    /// Handle keys on the result summary
    fn handle_summary_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Enter | KeyCode::Esc => {
                self.screen = Screen::Details;
                self.refresh_details();
            }
            KeyCode::Char('r') | KeyCode::Char('R') => {
                let mode = self.last_result.as_ref().map(|r| r.mode);
                self.screen = Screen::Details;
                self.refresh_details();
                if let Some(mode) = mode {
                    self.start_quiz(mode);
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Handle keys in History tab
    fn handle_history_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                if self.history_selected < self.results.len().saturating_sub(1) {
                    self.history_selected += 1;
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.history_selected = self.history_selected.saturating_sub(1);
            }
            KeyCode::Char('g') => self.history_selected = 0,
            KeyCode::Char('G') => self.history_selected = self.results.len().saturating_sub(1),
            KeyCode::Enter => {
                if let Some(result) = self.results.get(self.history_selected) {
                    let id = result.test_id;
                    self.open_details(id);
                }
            }
            KeyCode::Char('r') | KeyCode::Char('R') => self.reload_history(),
            _ => {}
        }
        Ok(())
    }

    /// Handle keys in Settings tab
    fn handle_settings_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                if self.settings_selected < SETTINGS_COUNT - 1 {
                    self.settings_selected += 1;
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.settings_selected = self.settings_selected.saturating_sub(1);
            }
            KeyCode::Enter | KeyCode::Char(' ') => {
                match self.settings_selected {
                    0 => {
                        let name = self.config.toggle_theme();
                        self.theme = Theme::from_name(name);
                    }
                    1 => self.config.default_mode = self.config.default_mode.next(),
                    _ => {}
                }
                // Save config
                if let Err(e) = self.config.save_to(&self.config_path) {
                    warn!(error = %format!("{:#}", e), "could not save config");
                    self.show_error("Save Failed", &format!("{:#}", e));
                } else {
                    self.show_flash("Settings saved", false);
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Handle keys in confirm popup
    fn handle_confirm_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => {
                if let PopupState::Confirm { action, .. } = &self.popup {
                    let action = *action;
                    self.popup = PopupState::None;
                    self.execute_action(action);
                }
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                self.popup = PopupState::None;
            }
            _ => {}
        }
        Ok(())
    }

    /// Handle keys in error popup
    fn handle_error_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Char('o') | KeyCode::Enter | KeyCode::Esc => {
                self.popup = PopupState::None;
            }
            _ => {}
        }
        Ok(())
    }

    /// Execute a confirmed action
    fn execute_action(&mut self, action: PendingAction) {
        match action {
            PendingAction::DeleteTest(id) => self.delete_test(id),
            PendingAction::FinishQuiz => self.finish_quiz(),
            PendingAction::AbandonQuiz => self.abandon_quiz(),
        }
    }

    // === HELPER METHODS ===

    /// Refetch the test list with per-test statistics
    pub fn reload_tests(&mut self) {
        match self.load_test_entries() {
            Ok(entries) => {
                self.tests = entries;
                self.tests_selected = self.tests_selected.min(self.tests.len().saturating_sub(1));
            }
            Err(e) => {
                warn!(error = %format!("{:#}", e), "could not load tests");
                self.show_error("Could Not Load Tests", &format!("{:#}", e));
            }
        }
    }

    fn load_test_entries(&self) -> Result<Vec<TestEntry>> {
        self.storage
            .get_tests()?
            .into_iter()
            .map(|test| -> Result<TestEntry> {
                let stats = self.storage.calculate_test_stats(test.id)?;
                Ok(TestEntry { test, stats })
            })
            .collect()
    }

    /// Refetch results and history statistics
    pub fn reload_history(&mut self) {
        match self.storage.get_results() {
            Ok(results) => {
                self.history_stats = HistoryStats::calculate(&results);
                self.results = results;
                self.history_selected = self
                    .history_selected
                    .min(self.results.len().saturating_sub(1));
            }
            Err(e) => {
                warn!(error = %format!("{:#}", e), "could not load results");
                self.show_error("Could Not Load History", &format!("{:#}", e));
            }
        }
    }

    /// Open the details screen of a test
    fn open_details(&mut self, id: Uuid) {
        match self.storage.get_test_by_id(id) {
            Ok(Some(test)) => {
                let stats = match self.storage.calculate_test_stats(id) {
                    Ok(stats) => stats,
                    Err(e) => {
                        warn!(error = %format!("{:#}", e), "could not compute stats");
                        TestStats::default()
                    }
                };
                self.details = Some(DetailsState { test, stats, selected: 0 });
                self.active_tab = Tab::Tests;
                self.screen = Screen::Details;
            }
            Ok(None) => self.show_flash("That test no longer exists", true),
            Err(e) => self.show_error("Could Not Load Test", &format!("{:#}", e)),
        }
    }

    /// Reload the test and stats shown on the details screen
    fn refresh_details(&mut self) {
        let Some(id) = self.details.as_ref().map(|d| d.test.id) else {
            self.back_to_list();
            return;
        };

        let loaded = self
            .storage
            .get_test_by_id(id)
            .and_then(|t| Ok((t, self.storage.calculate_test_stats(id)?)));

        match loaded {
            Ok((Some(test), stats)) => {
                if let Some(details) = self.details.as_mut() {
                    details.selected = details.selected.min(test.questions.len().saturating_sub(1));
                    details.test = test;
                    details.stats = stats;
                }
            }
            Ok((None, _)) => self.back_to_list(),
            Err(e) => self.show_error("Could Not Load Test", &format!("{:#}", e)),
        }
    }

    fn back_to_list(&mut self) {
        self.details = None;
        self.screen = Screen::List;
        self.reload_tests();
    }

    fn prompt_delete(&mut self, id: Uuid, name: &str) {
        self.popup = PopupState::Confirm {
            title: "Delete Test".into(),
            message: format!(
                "Delete \"{}\"?\n\nIts results stay in the history.",
                name
            ),
            action: PendingAction::DeleteTest(id),
        };
    }

    fn delete_test(&mut self, id: Uuid) {
        match self.storage.delete_test(id) {
            Ok(_) => {
                self.show_flash("Test deleted", false);
                self.back_to_list();
            }
            Err(e) => {
                warn!(error = %format!("{:#}", e), "could not delete test");
                self.show_error("Delete Failed", &format!("{:#}", e));
            }
        }
    }

    /// Show an error popup
    fn show_error(&mut self, title: &str, message: &str) {
        self.popup = PopupState::Error {
            title: title.into(),
            message: message.into(),
        };
    }

    /// Show a flash message
    fn show_flash(&mut self, message: &str, is_error: bool) {
        self.flash_message = Some((message.into(), is_error, Instant::now()));
    }
}

/// Expand a leading `~/` to the home directory
fn expand_home(raw: &str) -> PathBuf {
    match raw.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(raw)),
        None => PathBuf::from(raw),
    }
}
