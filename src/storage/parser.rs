//! Question-bank text parser
//!
//! Turns plain-text banks of numbered multiple-choice questions into tests.
//!
//! Example input:
//!   ## Fruit
//!   1. What does "manzana" mean?
//!   a) Apple
//!   b) Orange
//!   Answer: a
//!
//! A `*` in front of an option letter also marks it as correct.
//! The `Answer:` line ends its question; only a new question or header may follow.
//! `#` headers start a new test; text without headers becomes one test.

use crate::types::{AnswerOption, Question, Test};
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("no numbered questions found")]
    NoQuestions,

    #[error("question {number} (line {line}) needs at least two options")]
    TooFewOptions { number: u32, line: usize },

    #[error("question {number} lists option '{letter}' twice")]
    DuplicateOption { number: u32, letter: char },

    #[error("question {number} marks '{letter}' as correct but has no such option")]
    UnknownAnswer { number: u32, letter: char },

    #[error("line {line}: expected a single option letter after 'Answer:', got '{value}'")]
    InvalidAnswer { line: usize, value: String },

    #[error("line {line}: text after the answer of question {number}")]
    TrailingText { number: u32, line: usize },

    #[error("invalid line pattern: {0}")]
    Pattern(String),
}

struct Patterns {
    header: Regex,
    question: Regex,
    option: Regex,
    answer: Regex,
    key: Regex,
}

impl Patterns {
    fn compile() -> Result<Self, regex::Error> {
        Ok(Self {
            header: Regex::new(r"^\s*#+\s*(.+?)\s*$")?,
            question: Regex::new(r"^\s*(\d+)[.)]\s+(.+?)\s*$")?,
            option: Regex::new(r"^\s*(\*)?\s*([A-Za-z])[.)]\s+(.+?)\s*$")?,
            answer: Regex::new(r"(?i)^\s*(?:answer|respuesta)\s*[:=]\s*(.*?)\s*$")?,
            key: Regex::new(r"(?i)^\(?([a-z])[.)]?$")?,
        })
    }
}

static PATTERNS: Lazy<Result<Patterns, regex::Error>> = Lazy::new(Patterns::compile);

/// Question being collected, not yet validated
struct Draft {
    number: u32,
    line: usize,
    text: String,
    options: Vec<AnswerOption>,
    starred: Option<char>,
    answer: Option<char>,
    last_is_option: bool,
    /// Set once the `Answer:` line is read
    closed: bool,
}

impl Draft {
    fn new(number: u32, line: usize, text: &str) -> Self {
        Self {
            number,
            line,
            text: text.to_string(),
            options: Vec::new(),
            starred: None,
            answer: None,
            last_is_option: false,
            closed: false,
        }
    }

    fn push_option(&mut self, letter: char, text: &str, starred: bool) -> Result<(), ParseError> {
        let letter = letter.to_ascii_lowercase();
        if self.options.iter().any(|o| o.letter == letter) {
            return Err(ParseError::DuplicateOption { number: self.number, letter });
        }
        if starred {
            self.starred = Some(letter);
        }
        self.options.push(AnswerOption::new(letter, text));
        self.last_is_option = true;
        Ok(())
    }

    fn continue_text(&mut self, text: &str) {
        let target = match self.options.last_mut() {
            Some(option) if self.last_is_option => &mut option.text,
            _ => &mut self.text,
        };
        target.push(' ');
        target.push_str(text);
    }

    fn finish(self) -> Result<Question, ParseError> {
        if self.options.len() < 2 {
            return Err(ParseError::TooFewOptions { number: self.number, line: self.line });
        }

        let mut question = Question::new(self.number, self.text, self.options);
        if let Some(letter) = self.answer.or(self.starred) {
            if question.set_correct_answer(Some(letter)).is_err() {
                return Err(ParseError::UnknownAnswer { number: self.number, letter });
            }
        }
        Ok(question)
    }
}

/// Parse a question bank into one or more tests.
///
/// `default_name` names the questions that appear before any header.
/// With `chunk`, every section is split into tests of at most that many
/// questions, numbered `"<name> 1"`, `"<name> 2"`, ...
pub fn parse_question_bank(
    input: &str,
    default_name: &str,
    chunk: Option<usize>,
) -> Result<Vec<Test>, ParseError> {
    let patterns = PATTERNS
        .as_ref()
        .map_err(|e| ParseError::Pattern(e.to_string()))?;
    let mut sections: Vec<(String, Vec<Question>)> = vec![(default_name.to_string(), Vec::new())];
    let mut draft: Option<Draft> = None;

    for (idx, raw) in input.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(caps) = patterns.header.captures(line) {
            flush(&mut draft, &mut sections)?;
            sections.push((caps[1].to_string(), Vec::new()));
            continue;
        }

        if let Some(caps) = patterns.question.captures(line) {
            // Numbers are small; fall back to position on overflow
            let number = caps[1].parse().unwrap_or(line_no as u32);
            flush(&mut draft, &mut sections)?;
            draft = Some(Draft::new(number, line_no, &caps[2]));
            continue;
        }

        let Some(current) = draft.as_mut() else {
            continue; // Preamble before the first question
        };

        if current.closed {
            return Err(ParseError::TrailingText { number: current.number, line: line_no });
        }

        if let Some(caps) = patterns.answer.captures(line) {
            let value = &caps[1];
            let letter = patterns
                .key
                .captures(value)
                .and_then(|key| key[1].chars().next())
                .ok_or_else(|| ParseError::InvalidAnswer {
                    line: line_no,
                    value: value.to_string(),
                })?;
            current.answer = Some(letter.to_ascii_lowercase());
            current.closed = true;
        } else if let Some(caps) = patterns.option.captures(line) {
            let letter = caps[2].chars().next().unwrap_or('a');
            current.push_option(letter, &caps[3], caps.get(1).is_some())?;
        } else {
            current.continue_text(line);
        }
    }
    flush(&mut draft, &mut sections)?;

    let tests: Vec<Test> = sections
        .into_iter()
        .filter(|(_, questions)| !questions.is_empty())
        .flat_map(|(name, questions)| split_section(name, questions, chunk))
        .collect();

    if tests.is_empty() {
        return Err(ParseError::NoQuestions);
    }
    Ok(tests)
}

fn flush(
    draft: &mut Option<Draft>,
    sections: &mut [(String, Vec<Question>)],
) -> Result<(), ParseError> {
    if let Some(d) = draft.take() {
        let question = d.finish()?;
        if let Some((_, questions)) = sections.last_mut() {
            questions.push(question);
        }
    }
    Ok(())
}

fn split_section(name: String, questions: Vec<Question>, chunk: Option<usize>) -> Vec<Test> {
    match chunk {
        Some(size) if size > 0 && questions.len() > size => questions
            .chunks(size)
            .enumerate()
            .map(|(i, part)| Test::new(format!("{} {}", name, i + 1), part.to_vec()))
            .collect(),
        _ => vec![Test::new(name, questions)],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
Spanish vocabulary, unit 1

1. What does "manzana" mean?
a) Apple
b) Orange
c) Pear
Answer: a

2) What does "perro" mean?
a. Cat
*b. Dog
c. Bird

3. What does "casa"
mean in English?
a) House
b) Car
"#;

    #[test]
    fn test_parse_single_section() {
        let tests = parse_question_bank(SAMPLE, "Unit 1", None).unwrap();
        assert_eq!(tests.len(), 1);

        let test = &tests[0];
        assert_eq!(test.name, "Unit 1");
        assert_eq!(test.questions.len(), 3);

        let q1 = &test.questions[0];
        assert_eq!(q1.number, 1);
        assert_eq!(q1.text, "What does \"manzana\" mean?");
        assert_eq!(q1.options.len(), 3);
        assert_eq!(q1.correct_answer, Some('a'));

        assert_eq!(test.questions[1].correct_answer, Some('b'));
        assert_eq!(test.questions[1].options[0].text, "Cat");

        let q3 = &test.questions[2];
        assert_eq!(q3.text, "What does \"casa\" mean in English?");
        assert_eq!(q3.correct_answer, None);
        assert!(!test.is_configured());
    }

    #[test]
    fn test_answer_line_wins_over_star() {
        let input = "1. Pick\n*a) one\nb) two\nRespuesta: B\n";
        let tests = parse_question_bank(input, "x", None).unwrap();
        assert_eq!(tests[0].questions[0].correct_answer, Some('b'));
    }

    #[test]
    fn test_option_continuation_lines() {
        let input = "1. Pick\na) a long\n   option text\nb) short\n";
        let tests = parse_question_bank(input, "x", None).unwrap();
        assert_eq!(tests[0].questions[0].options[0].text, "a long option text");
    }

    #[test]
    fn test_headers_start_new_tests() {
        let input = "# Animals\n1. Dog?\na) perro\nb) gato\n\n## Food\n1. Bread?\na) pan\nb) agua\n2. Water?\na) pan\nb) agua\n";
        let tests = parse_question_bank(input, "ignored", None).unwrap();
        let names: Vec<&str> = tests.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Animals", "Food"]);
        assert_eq!(tests[1].questions.len(), 2);
    }

    #[test]
    fn test_chunking() {
        let mut input = String::new();
        for n in 1..=5 {
            input.push_str(&format!("{}. Q{}\na) yes\nb) no\n", n, n));
        }
        let tests = parse_question_bank(&input, "Vocabulary", Some(2)).unwrap();
        let names: Vec<&str> = tests.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Vocabulary 1", "Vocabulary 2", "Vocabulary 3"]);
        assert_eq!(tests[2].questions.len(), 1);
        assert_eq!(tests[2].questions[0].number, 5);

        let whole = parse_question_bank(&input, "Vocabulary", Some(10)).unwrap();
        assert_eq!(whole.len(), 1);
        assert_eq!(whole[0].name, "Vocabulary");
    }

    #[test]
    fn test_answer_letter_with_punctuation() {
        for line in ["Answer: a)", "Answer: A.", "respuesta = (a)"] {
            let input = format!("1. Pick\na) one\nb) two\n{}\n", line);
            let tests = parse_question_bank(&input, "x", None).unwrap();
            let question = &tests[0].questions[0];
            assert_eq!(question.correct_answer, Some('a'), "{}", line);
            assert_eq!(question.options[1].text, "two");
        }
    }

    #[test]
    fn test_text_after_answer_is_rejected() {
        let input = "1. Pick\na) uno\nb) two\nAnswer: a\nNote: uno means one\n";
        assert_eq!(
            parse_question_bank(input, "x", None),
            Err(ParseError::TrailingText { number: 1, line: 5 })
        );
    }

    #[test]
    fn test_answer_closes_question_before_next() {
        let input = "1. Pick\na) one\nb) two\nAnswer: b\n\n2. Again\na) one\nb) two\nAnswer: a\n";
        let tests = parse_question_bank(input, "x", None).unwrap();
        let keys: Vec<Option<char>> = tests[0].questions.iter().map(|q| q.correct_answer).collect();
        assert_eq!(keys, vec![Some('b'), Some('a')]);
        assert_eq!(tests[0].questions[0].options[1].text, "two");
    }

    #[test]
    fn test_unreadable_answer_line() {
        assert_eq!(
            parse_question_bank("1. Pick\na) one\nb) two\nAnswer: ab\n", "x", None),
            Err(ParseError::InvalidAnswer { line: 4, value: "ab".to_string() })
        );
    }

    #[test]
    fn test_errors() {
        assert_eq!(
            parse_question_bank("just some notes", "x", None),
            Err(ParseError::NoQuestions)
        );
        assert_eq!(
            parse_question_bank("\n1. Only one\na) lonely\n", "x", None),
            Err(ParseError::TooFewOptions { number: 1, line: 2 })
        );
        assert_eq!(
            parse_question_bank("1. Twice\na) one\na) again\n", "x", None),
            Err(ParseError::DuplicateOption { number: 1, letter: 'a' })
        );
        assert_eq!(
            parse_question_bank("1. Missing\na) one\nb) two\nAnswer: d\n", "x", None),
            Err(ParseError::UnknownAnswer { number: 1, letter: 'd' })
        );
    }
}
