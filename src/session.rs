//! Test-taking sessions
//!
//! A session walks through the questions of one configured test.
//! Practice mode locks and reveals every answer as soon as it is given;
//! exam mode lets answers change freely and only scores on finish.

use crate::types::{score_percent, QuizMode, Question, Test, TestResult};
use chrono::Utc;
use std::time::{Duration, Instant};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("test \"{name}\" has {missing} question(s) without a correct answer")]
    NotConfigured { name: String, missing: usize },
}

/// Outcome of selecting an option
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feedback {
    /// Practice: the answer was right
    Correct,
    /// Practice: the answer was wrong; carries the right letter
    Incorrect { correct: char },
    /// Exam: stored without feedback
    Recorded,
    /// Practice: this question was already answered
    Locked,
    /// No option with that letter
    InvalidOption,
}

/// State of one attempt at a test
#[derive(Debug, Clone)]
pub struct QuizSession {
    test: Test,
    mode: QuizMode,
    current: usize,
    answers: Vec<Option<char>>,
    revealed: Vec<bool>,
    started_at: Instant,
}

impl QuizSession {
    /// Start an attempt. The test must be configured.
    pub fn start(test: Test, mode: QuizMode) -> Result<Self, SessionError> {
        if !test.is_configured() {
            return Err(SessionError::NotConfigured {
                missing: test.questions.len() - test.configured_count(),
                name: test.name,
            });
        }

        let count = test.questions.len();
        Ok(Self {
            test,
            mode,
            current: 0,
            answers: vec![None; count],
            revealed: vec![false; count],
            started_at: Instant::now(),
        })
    }

    pub fn test(&self) -> &Test {
        &self.test
    }

    pub fn mode(&self) -> QuizMode {
        self.mode
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn question_count(&self) -> usize {
        self.test.questions.len()
    }

    pub fn current_question(&self) -> &Question {
        &self.test.questions[self.current]
    }

    pub fn current_answer(&self) -> Option<char> {
        self.answers[self.current]
    }

    /// Whether the correct answer of the current question may be shown
    pub fn is_revealed(&self) -> bool {
        self.revealed[self.current]
    }

    pub fn is_last(&self) -> bool {
        self.current + 1 == self.question_count()
    }

    /// Answer the current question
    pub fn select(&mut self, letter: char) -> Feedback {
        let letter = letter.to_ascii_lowercase();
        let question = &self.test.questions[self.current];
        if !question.has_option(letter) {
            return Feedback::InvalidOption;
        }

        match self.mode {
            QuizMode::Practice => {
                if self.revealed[self.current] {
                    return Feedback::Locked;
                }
                self.answers[self.current] = Some(letter);
                self.revealed[self.current] = true;
                match question.correct_answer {
                    Some(correct) if correct == letter => Feedback::Correct,
                    Some(correct) => Feedback::Incorrect { correct },
                    // Unreachable for configured tests
                    None => Feedback::Recorded,
                }
            }
            QuizMode::Exam => {
                self.answers[self.current] = Some(letter);
                Feedback::Recorded
            }
        }
    }

    /// Move to the next question. Returns false at the end.
    pub fn next(&mut self) -> bool {
        if self.is_last() {
            return false;
        }
        self.current += 1;
        true
    }

    /// Move to the previous question. Returns false at the start.
    pub fn previous(&mut self) -> bool {
        if self.current == 0 {
            return false;
        }
        self.current -= 1;
        true
    }

    pub fn answered_count(&self) -> usize {
        self.answers.iter().filter(|a| a.is_some()).count()
    }

    pub fn is_complete(&self) -> bool {
        self.answers.iter().all(|a| a.is_some())
    }

    /// Question numbers that still have no answer
    pub fn unanswered(&self) -> Vec<u32> {
        self.test
            .questions
            .iter()
            .zip(&self.answers)
            .filter(|(_, a)| a.is_none())
            .map(|(q, _)| q.number)
            .collect()
    }

    pub fn correct_count(&self) -> u32 {
        self.test
            .questions
            .iter()
            .zip(&self.answers)
            .filter(|(q, a)| a.is_some() && **a == q.correct_answer)
            .count() as u32
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Score the attempt using the wall-clock time since `start`
    pub fn finish(&self) -> TestResult {
        self.finish_with_elapsed(self.elapsed())
    }

    /// Score the attempt. Unanswered questions count as incorrect.
    pub fn finish_with_elapsed(&self, elapsed: Duration) -> TestResult {
        let total = self.question_count() as u32;
        let correct = self.correct_count();

        TestResult {
            id: Uuid::new_v4(),
            test_id: self.test.id,
            test_name: self.test.name.clone(),
            score: score_percent(correct, total),
            correct,
            incorrect: total - correct,
            time_spent: elapsed.as_secs(),
            mode: self.mode,
            completed_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AnswerOption;

    fn configured_test() -> Test {
        let questions = (1..=3)
            .map(|n| {
                let mut q = Question::new(
                    n,
                    format!("Question {}", n),
                    vec![
                        AnswerOption::new('a', "first"),
                        AnswerOption::new('b', "second"),
                        AnswerOption::new('c', "third"),
                    ],
                );
                q.correct_answer = Some('b');
                q
            })
            .collect();
        Test::new("Sample", questions)
    }

    #[test]
    fn test_start_requires_configured_test() {
        let mut test = configured_test();
        test.questions[1].correct_answer = None;
        test.questions[2].correct_answer = None;

        let err = QuizSession::start(test, QuizMode::Exam).unwrap_err();
        assert_eq!(
            err,
            SessionError::NotConfigured { name: "Sample".into(), missing: 2 }
        );

        let empty = Test::new("Empty", vec![]);
        assert!(QuizSession::start(empty, QuizMode::Practice).is_err());
    }

    #[test]
    fn test_practice_reveals_and_locks() {
        let mut session = QuizSession::start(configured_test(), QuizMode::Practice).unwrap();
        assert!(!session.is_revealed());

        assert_eq!(session.select('a'), Feedback::Incorrect { correct: 'b' });
        assert!(session.is_revealed());
        assert_eq!(session.select('b'), Feedback::Locked);
        assert_eq!(session.current_answer(), Some('a'));

        assert!(session.next());
        assert_eq!(session.select('B'), Feedback::Correct);
        assert_eq!(session.correct_count(), 1);
    }

    #[test]
    fn test_exam_allows_changes_without_feedback() {
        let mut session = QuizSession::start(configured_test(), QuizMode::Exam).unwrap();
        assert_eq!(session.select('a'), Feedback::Recorded);
        assert_eq!(session.select('b'), Feedback::Recorded);
        assert_eq!(session.current_answer(), Some('b'));
        assert!(!session.is_revealed());
        assert_eq!(session.select('z'), Feedback::InvalidOption);
    }

    #[test]
    fn test_navigation_bounds() {
        let mut session = QuizSession::start(configured_test(), QuizMode::Exam).unwrap();
        assert!(!session.previous());
        assert!(session.next());
        assert!(session.next());
        assert!(session.is_last());
        assert!(!session.next());
        assert_eq!(session.current_index(), 2);
        assert!(session.previous());
        assert_eq!(session.current_question().number, 2);
    }

    #[test]
    fn test_unanswered_and_completion() {
        let mut session = QuizSession::start(configured_test(), QuizMode::Exam).unwrap();
        session.select('b');
        session.next();
        session.next();
        session.select('c');

        assert_eq!(session.answered_count(), 2);
        assert!(!session.is_complete());
        assert_eq!(session.unanswered(), vec![2]);

        session.previous();
        session.select('a');
        assert!(session.is_complete());
    }

    #[test]
    fn test_finish_scores_unanswered_as_incorrect() {
        let mut session = QuizSession::start(configured_test(), QuizMode::Exam).unwrap();
        session.select('b');
        session.next();
        session.select('b');

        let result = session.finish_with_elapsed(Duration::from_millis(95_400));
        assert_eq!(result.correct, 2);
        assert_eq!(result.incorrect, 1);
        assert_eq!(result.score, 67);
        assert_eq!(result.time_spent, 95);
        assert_eq!(result.mode, QuizMode::Exam);
        assert_eq!(result.test_name, "Sample");
        assert_eq!(result.test_id, session.test().id);
    }
}
