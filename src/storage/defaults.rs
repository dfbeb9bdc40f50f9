//! Bundled vocabulary tests seeded on first run

use crate::storage::parser::{parse_question_bank, ParseError};
use crate::types::Test;

const VOCABULARY_BANK: &str = include_str!("../../assets/vocabulary.txt");

/// Parse the bundled vocabulary bank into fully configured tests
pub fn default_tests() -> Result<Vec<Test>, ParseError> {
    parse_question_bank(VOCABULARY_BANK, "Vocabulary", None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_bank_is_configured() {
        let tests = default_tests().unwrap();
        assert_eq!(tests.len(), 2);
        for test in &tests {
            assert_eq!(test.questions.len(), 10);
            assert!(test.is_configured(), "{} is missing answers", test.name);
        }
        assert_eq!(tests[0].name, "Spanish Vocabulary: Basics");
    }
}
