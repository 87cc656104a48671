// ABOUTME: Input validation for book suggestions
// ABOUTME: Trims and bounds free text, normalizes ISBNs before they are stored or matched

use thiserror::Error;

use crate::types::SuggestionCreateInput;

pub const MAX_TITLE_LEN: usize = 300;
pub const MAX_AUTHOR_LEN: usize = 200;
pub const MAX_DESCRIPTION_LEN: usize = 2000;

#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("{0} cannot be empty")]
    EmptyField(&'static str),

    #[error("{field} exceeds maximum length of {max} characters")]
    TooLong { field: &'static str, max: usize },

    #[error("Invalid ISBN: {0}")]
    InvalidIsbn(String),

    #[error("Invalid enum value: {0}. Must be one of: {1}")]
    InvalidEnum(String, String),
}

/// Validate and normalize a suggestion before it reaches storage
pub fn validate_suggestion_input(
    input: SuggestionCreateInput,
) -> Result<SuggestionCreateInput, ValidationError> {
    let title = required("title", &input.title, MAX_TITLE_LEN)?;
    let author = required("author", &input.author, MAX_AUTHOR_LEN)?;

    let description = match input.description.as_deref().map(str::trim) {
        Some(d) if !d.is_empty() => {
            if d.chars().count() > MAX_DESCRIPTION_LEN {
                return Err(ValidationError::TooLong {
                    field: "description",
                    max: MAX_DESCRIPTION_LEN,
                });
            }
            Some(d.to_string())
        }
        _ => None,
    };

    let isbn = match input.isbn.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => Some(normalize_isbn(raw)?),
        _ => None,
    };

    let external_id = input
        .external_id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty());

    Ok(SuggestionCreateInput {
        title,
        author,
        description,
        isbn,
        external_id,
    })
}

/// Strip separators and upper-case the check digit. Accepts ISBN-10 and ISBN-13.
pub fn normalize_isbn(raw: &str) -> Result<String, ValidationError> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .map(|c| c.to_ascii_uppercase())
        .collect();

    // Byte offsets below assume one byte per character
    if !cleaned.is_ascii() {
        return Err(ValidationError::InvalidIsbn(raw.to_string()));
    }

    let valid = match cleaned.len() {
        10 => {
            cleaned[..9].chars().all(|c| c.is_ascii_digit())
                && cleaned
                    .chars()
                    .last()
                    .is_some_and(|c| c.is_ascii_digit() || c == 'X')
        }
        13 => cleaned.chars().all(|c| c.is_ascii_digit()),
        _ => false,
    };

    if valid {
        Ok(cleaned)
    } else {
        Err(ValidationError::InvalidIsbn(raw.to_string()))
    }
}

/// Case- and whitespace-insensitive form of a title or author, used to spot duplicates
pub fn match_key(value: &str) -> String {
    value.trim().to_lowercase()
}

fn required(field: &'static str, value: &str, max: usize) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField(field));
    }
    if trimmed.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn input(title: &str, author: &str) -> SuggestionCreateInput {
        SuggestionCreateInput {
            title: title.to_string(),
            author: author.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_trims_fields_and_drops_blank_optionals() {
        let mut raw = input("  Dune ", " Frank Herbert");
        raw.description = Some("   ".to_string());
        raw.external_id = Some(" OL123W ".to_string());

        let validated = validate_suggestion_input(raw).unwrap();
        assert_eq!(validated.title, "Dune");
        assert_eq!(validated.author, "Frank Herbert");
        assert_eq!(validated.description, None);
        assert_eq!(validated.external_id, Some("OL123W".to_string()));
    }

    #[test]
    fn test_rejects_empty_title() {
        let err = validate_suggestion_input(input("   ", "Someone")).unwrap_err();
        assert_eq!(err, ValidationError::EmptyField("title"));
    }

    #[test]
    fn test_rejects_overlong_author() {
        let err = validate_suggestion_input(input("Title", &"a".repeat(MAX_AUTHOR_LEN + 1)))
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::TooLong {
                field: "author",
                max: MAX_AUTHOR_LEN
            }
        );
    }

    #[rstest]
    #[case("978-0-441-17271-9", "9780441172719")]
    #[case("0 441 17271 7", "0441172717")]
    #[case("080442957x", "080442957X")]
    fn test_normalize_isbn_accepts(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(normalize_isbn(raw).unwrap(), expected);
    }

    #[rstest]
    #[case("12345")]
    #[case("97804411727X9")]
    #[case("X441172717")]
    #[case("12345678ä")]
    #[case("ä12345678")]
    #[case("978044117271é")]
    fn test_normalize_isbn_rejects(#[case] raw: &str) {
        assert!(normalize_isbn(raw).is_err());
    }

    #[test]
    fn test_match_key_folds_unicode_case() {
        assert_eq!(match_key("  Émile Zola "), "émile zola");
        assert_eq!(match_key("DER ZAUBERBERG"), match_key("der Zauberberg"));
    }

    #[test]
    fn test_non_ascii_isbn_is_a_validation_error() {
        let mut raw = input("Dune", "Frank Herbert");
        raw.isbn = Some("12345678ä".to_string());

        let err = validate_suggestion_input(raw).unwrap_err();
        assert_eq!(err, ValidationError::InvalidIsbn("12345678ä".to_string()));
    }
}
