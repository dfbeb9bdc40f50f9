//! Core data types for testeate
//!
//! This module defines all shared data structures used throughout the application.

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// A named collection of multiple-choice questions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Test {
    pub id: Uuid,
    pub name: String,
    pub questions: Vec<Question>,
    pub created_at: DateTime<Utc>,
}

impl Test {
    pub fn new(name: impl Into<String>, questions: Vec<Question>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            questions,
            created_at: Utc::now(),
        }
    }

    /// A test is configured once every question has a correct answer.
    /// Empty tests are never configured.
    pub fn is_configured(&self) -> bool {
        !self.questions.is_empty() && self.questions.iter().all(|q| q.correct_answer.is_some())
    }

    /// Number of questions that already have a correct answer
    pub fn configured_count(&self) -> usize {
        self.questions
            .iter()
            .filter(|q| q.correct_answer.is_some())
            .count()
    }

    /// Format the creation date for display
    pub fn formatted_date(&self) -> String {
        self.created_at
            .with_timezone(&Local)
            .format("%d.%m.%y %H:%M")
            .to_string()
    }
}

/// A single multiple-choice question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: Uuid,
    pub number: u32,
    pub text: String,
    pub options: Vec<AnswerOption>,
    pub correct_answer: Option<char>,
}

impl Question {
    pub fn new(number: u32, text: impl Into<String>, options: Vec<AnswerOption>) -> Self {
        Self {
            id: Uuid::new_v4(),
            number,
            text: text.into(),
            options,
            correct_answer: None,
        }
    }

    pub fn has_option(&self, letter: char) -> bool {
        let letter = letter.to_ascii_lowercase();
        self.options.iter().any(|o| o.letter == letter)
    }

    pub fn option_index(&self, letter: char) -> Option<usize> {
        let letter = letter.to_ascii_lowercase();
        self.options.iter().position(|o| o.letter == letter)
    }

    /// Set (or clear) the correct answer, rejecting letters with no option
    pub fn set_correct_answer(&mut self, answer: Option<char>) -> Result<(), AnswerError> {
        match answer {
            Some(letter) if !self.has_option(letter) => Err(AnswerError::UnknownOption {
                number: self.number,
                letter,
            }),
            Some(letter) => {
                self.correct_answer = Some(letter.to_ascii_lowercase());
                Ok(())
            }
            None => {
                self.correct_answer = None;
                Ok(())
            }
        }
    }

    /// The next option letter after the current key, wrapping to "no answer"
    pub fn cycle_answer(&self, forward: bool) -> Option<char> {
        let letters: Vec<char> = self.options.iter().map(|o| o.letter).collect();
        if letters.is_empty() {
            return None;
        }
        // Slot 0 is "no answer", slots 1..=n are the options
        let slots = letters.len() + 1;
        let current = self
            .correct_answer
            .and_then(|c| letters.iter().position(|l| *l == c))
            .map(|i| i + 1)
            .unwrap_or(0);
        let next = if forward {
            (current + 1) % slots
        } else {
            (current + slots - 1) % slots
        };
        if next == 0 {
            None
        } else {
            Some(letters[next - 1])
        }
    }
}

/// One option of a question, e.g. `a) Apple`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerOption {
    pub letter: char,
    pub text: String,
}

impl AnswerOption {
    pub fn new(letter: char, text: impl Into<String>) -> Self {
        Self {
            letter: letter.to_ascii_lowercase(),
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnswerError {
    #[error("question {number} has no option '{letter}'")]
    UnknownOption { number: u32, letter: char },

    #[error("question not found in test")]
    QuestionNotFound,

    #[error("test not found")]
    TestNotFound,
}

/// How a test is taken
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum QuizMode {
    /// Each answer is revealed right away
    #[default]
    Practice,
    /// Scoring is deferred until the test is finished
    Exam,
}

impl QuizMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuizMode::Practice => "Practice",
            QuizMode::Exam => "Exam",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            QuizMode::Practice => QuizMode::Exam,
            QuizMode::Exam => QuizMode::Practice,
        }
    }
}

/// Scored outcome of one completed attempt. Never modified after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    pub id: Uuid,
    pub test_id: Uuid,
    pub test_name: String,
    /// Percentage, 0-100
    pub score: u32,
    pub correct: u32,
    pub incorrect: u32,
    /// Seconds
    pub time_spent: u64,
    pub mode: QuizMode,
    pub completed_at: DateTime<Utc>,
}

impl TestResult {
    pub fn total(&self) -> u32 {
        self.correct + self.incorrect
    }

    pub fn formatted_date(&self) -> String {
        self.completed_at
            .with_timezone(&Local)
            .format("%d.%m.%y %H:%M")
            .to_string()
    }

    pub fn formatted_time(&self) -> String {
        format_duration(self.time_spent)
    }
}

/// Per-test statistics derived from its results
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TestStats {
    pub attempts: usize,
    pub best_score: Option<u32>,
    pub average_score: Option<f64>,
    pub last_attempt: Option<DateTime<Utc>>,
}

impl TestStats {
    pub fn from_results<'a>(results: impl IntoIterator<Item = &'a TestResult>) -> Self {
        let mut stats = TestStats::default();
        let mut total = 0u64;
        for result in results {
            stats.attempts += 1;
            total += u64::from(result.score);
            stats.best_score = Some(stats.best_score.map_or(result.score, |b| b.max(result.score)));
            stats.last_attempt = Some(
                stats
                    .last_attempt
                    .map_or(result.completed_at, |l| l.max(result.completed_at)),
            );
        }
        if stats.attempts > 0 {
            stats.average_score = Some(total as f64 / stats.attempts as f64);
        }
        stats
    }

    pub fn best_score_label(&self) -> String {
        self.best_score
            .map(|s| format!("{}%", s))
            .unwrap_or_else(|| "-".into())
    }
}

/// Aggregate statistics over the whole history
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryStats {
    pub total_attempts: usize,
    pub average_score: Option<f64>,
    pub best_score: Option<u32>,
    pub total_time: u64,
    pub practice_attempts: usize,
    pub exam_attempts: usize,
}

impl HistoryStats {
    pub fn calculate(results: &[TestResult]) -> Self {
        let per_test = TestStats::from_results(results);
        Self {
            total_attempts: per_test.attempts,
            average_score: per_test.average_score,
            best_score: per_test.best_score,
            total_time: results.iter().map(|r| r.time_spent).sum(),
            practice_attempts: results.iter().filter(|r| r.mode == QuizMode::Practice).count(),
            exam_attempts: results.iter().filter(|r| r.mode == QuizMode::Exam).count(),
        }
    }

    /// Get summary string (e.g., "12 attempts · avg 74% · best 100%")
    pub fn summary(&self) -> String {
        format!(
            "{} attempts · avg {} · best {} · {} total",
            self.total_attempts,
            self.average_score
                .map(|a| format!("{:.0}%", a))
                .unwrap_or_else(|| "-".into()),
            self.best_score
                .map(|b| format!("{}%", b))
                .unwrap_or_else(|| "-".into()),
            format_duration(self.total_time),
        )
    }
}

/// Application tabs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Tests,
    History,
    Settings,
}

impl Tab {
    pub fn all() -> &'static [Tab] {
        &[Tab::Tests, Tab::History, Tab::Settings]
    }

    pub fn index(&self) -> usize {
        match self {
            Tab::Tests => 0,
            Tab::History => 1,
            Tab::Settings => 2,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Tab::Tests => "Tests",
            Tab::History => "History",
            Tab::Settings => "Settings",
        }
    }
}

// Helper functions

/// Round `correct / total` to a whole percentage
pub fn score_percent(correct: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    ((f64::from(correct) / f64::from(total)) * 100.0).round() as u32
}

/// Format seconds as `1h 02m`, `3m 07s` or `42s`
pub fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours > 0 {
        format!("{}h {:02}m", hours, minutes)
    } else if minutes > 0 {
        format!("{}m {:02}s", minutes, secs)
    } else {
        format!("{}s", secs)
    }
}
