//! Validation of user-supplied words before they reach the engine.

use thiserror::Error;

use crate::consts::WORD_LEN;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WordError {
    #[error("invalid word '{0}': expected {len} ASCII letters", len = WORD_LEN)]
    Invalid(String),

    #[error("expected at least one guess")]
    NoGuesses,
}

/// Exactly [`WORD_LEN`] ASCII letters.
pub fn is_valid_word(word: &str) -> bool {
    word.len() == WORD_LEN && word.chars().all(|c| c.is_ascii_alphabetic())
}

pub fn check_word(word: &str) -> Result<&str, WordError> {
    if is_valid_word(word) {
        Ok(word)
    } else {
        Err(WordError::Invalid(word.to_string()))
    }
}

/// Split a comma-separated guess list, validating every entry.
pub fn parse_guesses(csv: &str) -> Result<Vec<String>, WordError> {
    if csv.is_empty() {
        return Err(WordError::NoGuesses);
    }
    csv.split(',')
        .map(|g| check_word(g).map(str::to_string))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_five_letters() {
        assert!(is_valid_word("crane"));
        assert!(is_valid_word("CRANE"));
    }

    #[test]
    fn rejects_wrong_length() {
        assert!(!is_valid_word("cran"));
        assert!(!is_valid_word("cranes"));
        assert!(!is_valid_word(""));
    }

    #[test]
    fn rejects_non_letters() {
        assert!(!is_valid_word("cr4ne"));
        assert!(!is_valid_word("cr ne"));
        assert!(!is_valid_word("-t123"));
    }

    #[test]
    fn rejects_non_ascii_letters() {
        // Five characters, but more than five bytes.
        assert!(!is_valid_word("crâne"));
        assert!(!is_valid_word("слово"));
    }

    #[test]
    fn parses_guess_list() {
        assert_eq!(
            parse_guesses("slate,trace").unwrap(),
            vec!["slate".to_string(), "trace".to_string()]
        );
    }

    #[test]
    fn empty_guess_list_rejected() {
        assert_eq!(parse_guesses(""), Err(WordError::NoGuesses));
    }

    #[test]
    fn one_bad_guess_rejects_list() {
        assert_eq!(
            parse_guesses("slate,,trace"),
            Err(WordError::Invalid(String::new()))
        );
        assert!(matches!(
            parse_guesses("slate,tr4ce"),
            Err(WordError::Invalid(w)) if w == "tr4ce"
        ));
    }
}
