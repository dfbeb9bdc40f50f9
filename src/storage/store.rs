//! JSON-file persistence for tests and results
//!
//! Every operation reads the file, applies the change and writes it back,
//! so concurrent writers resolve as last-write-wins.

use crate::storage::{defaults, parser};
use crate::types::{AnswerError, HistoryStats, Test, TestResult, TestStats};
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;

/// Storage manager for tests and results on disk
#[derive(Debug, Clone)]
pub struct Storage {
    data_dir: PathBuf,
    tests_file: PathBuf,
    results_file: PathBuf,
}

impl Storage {
    /// Default data directory (~/.local/share/testeate on Linux)
    pub fn default_dir() -> Result<PathBuf> {
        Ok(dirs::data_dir()
            .context("Could not determine data directory")?
            .join("testeate"))
    }

    /// Open storage rooted at `data_dir`, creating it if needed
    pub fn open(data_dir: impl Into<PathBuf>) -> Result<Self> {
        let data_dir = data_dir.into();
        fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory {:?}", data_dir))?;

        Ok(Self {
            tests_file: data_dir.join("tests.json"),
            results_file: data_dir.join("results.json"),
            data_dir,
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    // === TESTS ===

    /// All tests, newest first
    pub fn get_tests(&self) -> Result<Vec<Test>> {
        let mut tests: Vec<Test> = read_list(&self.tests_file)?;
        tests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(tests)
    }

    pub fn get_test_by_id(&self, id: Uuid) -> Result<Option<Test>> {
        let tests: Vec<Test> = read_list(&self.tests_file)?;
        Ok(tests.into_iter().find(|t| t.id == id))
    }

    /// Insert a test, or replace the one with the same id
    pub fn save_test(&self, test: &Test) -> Result<()> {
        let mut tests: Vec<Test> = read_list(&self.tests_file)?;
        match tests.iter_mut().find(|t| t.id == test.id) {
            Some(existing) => *existing = test.clone(),
            None => tests.push(test.clone()),
        }
        write_list(&self.tests_file, &tests)?;
        debug!(test = %test.id, name = %test.name, "saved test");
        Ok(())
    }

    /// Delete a test. Its results stay in the history.
    pub fn delete_test(&self, id: Uuid) -> Result<bool> {
        let mut tests: Vec<Test> = read_list(&self.tests_file)?;
        let before = tests.len();
        tests.retain(|t| t.id != id);
        let removed = tests.len() != before;
        if removed {
            write_list(&self.tests_file, &tests)?;
            info!(test = %id, "deleted test");
        }
        Ok(removed)
    }

    /// Set or clear the correct answer of one question and persist the test
    pub fn set_correct_answer(
        &self,
        test_id: Uuid,
        question_id: Uuid,
        answer: Option<char>,
    ) -> Result<Test> {
        let mut test = self
            .get_test_by_id(test_id)?
            .ok_or(AnswerError::TestNotFound)?;
        let question = test
            .questions
            .iter_mut()
            .find(|q| q.id == question_id)
            .ok_or(AnswerError::QuestionNotFound)?;
        question.set_correct_answer(answer)?;
        self.save_test(&test)?;
        Ok(test)
    }

    /// Seed the bundled vocabulary tests on first run.
    ///
    /// Only runs when no tests file exists yet, so deleting every test does
    /// not bring the defaults back. Returns the number of seeded tests.
    pub fn initialize_default_tests(&self) -> Result<usize> {
        if self.tests_file.exists() {
            return Ok(0);
        }
        let tests = defaults::default_tests().context("Bundled vocabulary bank is invalid")?;
        write_list(&self.tests_file, &tests)?;
        info!(count = tests.len(), "seeded default tests");
        Ok(tests.len())
    }

    /// Parse a question-bank file and save every test it contains
    pub fn import_file(
        &self,
        path: &Path,
        name: Option<&str>,
        chunk: Option<usize>,
    ) -> Result<Vec<Test>> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read question bank {:?}", path))?;

        let default_name = name
            .map(str::to_string)
            .or_else(|| path.file_stem().map(|s| s.to_string_lossy().to_string()))
            .unwrap_or_else(|| "Imported test".into());

        let imported = parser::parse_question_bank(&content, &default_name, chunk)
            .with_context(|| format!("Failed to parse question bank {:?}", path))?;

        let mut tests: Vec<Test> = read_list(&self.tests_file)?;
        tests.extend(imported.iter().cloned());
        write_list(&self.tests_file, &tests)?;

        info!(path = %path.display(), count = imported.len(), "imported question bank");
        Ok(imported)
    }

    // === RESULTS ===

    /// All results, newest first
    pub fn get_results(&self) -> Result<Vec<TestResult>> {
        let mut results: Vec<TestResult> = read_list(&self.results_file)?;
        results.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
        Ok(results)
    }

    pub fn get_results_for_test(&self, test_id: Uuid) -> Result<Vec<TestResult>> {
        let mut results = self.get_results()?;
        results.retain(|r| r.test_id == test_id);
        Ok(results)
    }

    /// Append a completed attempt
    pub fn save_result(&self, result: &TestResult) -> Result<()> {
        let mut results: Vec<TestResult> = read_list(&self.results_file)?;
        results.push(result.clone());
        write_list(&self.results_file, &results)?;
        info!(
            test = %result.test_id,
            score = result.score,
            mode = result.mode.as_str(),
            "saved result"
        );
        Ok(())
    }

    pub fn calculate_test_stats(&self, test_id: Uuid) -> Result<TestStats> {
        let results = self.get_results_for_test(test_id)?;
        Ok(TestStats::from_results(&results))
    }

    pub fn history_stats(&self) -> Result<HistoryStats> {
        let results: Vec<TestResult> = read_list(&self.results_file)?;
        Ok(HistoryStats::calculate(&results))
    }
}

/// Whether every question of the test has a correct answer
pub fn is_test_configured(test: &Test) -> bool {
    test.is_configured()
}

fn read_list<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {:?}", path))?;

    if content.trim().is_empty() {
        return Ok(Vec::new());
    }

    serde_json::from_str(&content).with_context(|| format!("Failed to parse {:?}", path))
}

fn write_list<T: Serialize>(path: &Path, items: &[T]) -> Result<()> {
    let content = serde_json::to_string_pretty(items)
        .with_context(|| format!("Failed to serialize {:?}", path))?;

    fs::write(path, content).with_context(|| format!("Failed to write {:?}", path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AnswerOption, QuizMode, Question};
    use chrono::{Duration, Utc};

    fn storage() -> (tempfile::TempDir, Storage) {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::open(dir.path().join("data")).unwrap();
        (dir, storage)
    }

    fn sample_test(name: &str) -> Test {
        Test::new(
            name,
            vec![Question::new(
                1,
                "Pick one",
                vec![AnswerOption::new('a', "yes"), AnswerOption::new('b', "no")],
            )],
        )
    }

    fn sample_result(test: &Test, score: u32, minutes_ago: i64) -> TestResult {
        TestResult {
            id: Uuid::new_v4(),
            test_id: test.id,
            test_name: test.name.clone(),
            score,
            correct: if score >= 50 { 1 } else { 0 },
            incorrect: if score >= 50 { 0 } else { 1 },
            time_spent: 30,
            mode: QuizMode::Exam,
            completed_at: Utc::now() - Duration::minutes(minutes_ago),
        }
    }

    #[test]
    fn test_empty_storage() {
        let (_dir, storage) = storage();
        assert!(storage.get_tests().unwrap().is_empty());
        assert!(storage.get_results().unwrap().is_empty());
        assert_eq!(storage.calculate_test_stats(Uuid::new_v4()).unwrap().attempts, 0);
    }

    #[test]
    fn test_save_replace_and_delete() {
        let (_dir, storage) = storage();
        let mut test = sample_test("Numbers");
        storage.save_test(&test).unwrap();

        test.name = "Numbers (renamed)".into();
        storage.save_test(&test).unwrap();

        let tests = storage.get_tests().unwrap();
        assert_eq!(tests.len(), 1);
        assert_eq!(tests[0].name, "Numbers (renamed)");
        assert_eq!(storage.get_test_by_id(test.id).unwrap(), Some(test.clone()));

        assert!(storage.delete_test(test.id).unwrap());
        assert!(!storage.delete_test(test.id).unwrap());
        assert!(storage.get_test_by_id(test.id).unwrap().is_none());
    }

    #[test]
    fn test_tests_sorted_newest_first() {
        let (_dir, storage) = storage();
        let mut old = sample_test("old");
        old.created_at = Utc::now() - Duration::days(2);
        let new = sample_test("new");
        storage.save_test(&old).unwrap();
        storage.save_test(&new).unwrap();

        let names: Vec<String> = storage.get_tests().unwrap().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["new", "old"]);
    }

    #[test]
    fn test_set_correct_answer() {
        let (_dir, storage) = storage();
        let test = sample_test("Keys");
        storage.save_test(&test).unwrap();
        assert!(!is_test_configured(&test));

        let question_id = test.questions[0].id;
        let updated = storage.set_correct_answer(test.id, question_id, Some('b')).unwrap();
        assert!(is_test_configured(&updated));

        let reloaded = storage.get_test_by_id(test.id).unwrap().unwrap();
        assert_eq!(reloaded.questions[0].correct_answer, Some('b'));

        let err = storage
            .set_correct_answer(test.id, question_id, Some('q'))
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AnswerError>(),
            Some(AnswerError::UnknownOption { letter: 'q', .. })
        ));

        let err = storage
            .set_correct_answer(Uuid::new_v4(), question_id, Some('a'))
            .unwrap_err();
        assert_eq!(err.downcast_ref::<AnswerError>(), Some(&AnswerError::TestNotFound));
    }

    #[test]
    fn test_results_and_stats() {
        let (_dir, storage) = storage();
        let test = sample_test("Scored");
        let other = sample_test("Other");

        storage.save_result(&sample_result(&test, 40, 10)).unwrap();
        storage.save_result(&sample_result(&test, 100, 5)).unwrap();
        storage.save_result(&sample_result(&other, 70, 1)).unwrap();

        let results = storage.get_results().unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].test_name, "Other");

        let stats = storage.calculate_test_stats(test.id).unwrap();
        assert_eq!(stats.attempts, 2);
        assert_eq!(stats.best_score, Some(100));
        assert_eq!(storage.get_results_for_test(test.id).unwrap().len(), 2);

        let history = storage.history_stats().unwrap();
        assert_eq!(history.total_attempts, 3);
        assert_eq!(history.best_score, Some(100));
    }

    #[test]
    fn test_delete_keeps_results() {
        let (_dir, storage) = storage();
        let test = sample_test("Gone");
        storage.save_test(&test).unwrap();
        storage.save_result(&sample_result(&test, 80, 0)).unwrap();

        storage.delete_test(test.id).unwrap();
        assert_eq!(storage.get_results().unwrap().len(), 1);
    }

    #[test]
    fn test_initialize_default_tests_only_once() {
        let (_dir, storage) = storage();
        assert_eq!(storage.initialize_default_tests().unwrap(), 2);
        assert_eq!(storage.get_tests().unwrap().len(), 2);

        for test in storage.get_tests().unwrap() {
            storage.delete_test(test.id).unwrap();
        }
        assert_eq!(storage.initialize_default_tests().unwrap(), 0);
        assert!(storage.get_tests().unwrap().is_empty());
    }

    #[test]
    fn test_import_file() {
        let (dir, storage) = storage();
        let path = dir.path().join("colors.txt");
        fs::write(&path, "1. Rojo?\na) red\nb) blue\n2. Azul?\na) red\nb) blue\n").unwrap();

        let imported = storage.import_file(&path, None, None).unwrap();
        assert_eq!(imported.len(), 1);
        assert_eq!(imported[0].name, "colors");
        assert_eq!(storage.get_tests().unwrap().len(), 1);

        let named = storage.import_file(&path, Some("Colores"), Some(1)).unwrap();
        let names: Vec<&str> = named.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Colores 1", "Colores 2"]);
        assert_eq!(storage.get_tests().unwrap().len(), 3);
    }

    #[test]
    fn test_import_reports_parse_errors() {
        let (dir, storage) = storage();
        let path = dir.path().join("broken.txt");
        fs::write(&path, "no questions here").unwrap();

        let err = storage.import_file(&path, None, None).unwrap_err();
        assert!(format!("{:#}", err).contains("no numbered questions found"));
        assert!(storage.get_tests().unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let (_dir, storage) = storage();
        fs::write(storage.data_dir().join("tests.json"), "{not json").unwrap();
        assert!(storage.get_tests().is_err());
    }
}
