//! Field validation for catalog submissions.
//!
//! Validation lives at the service boundary so every entry path (owner
//! forms, seeding, future API surfaces) shares the same rules.

use std::sync::LazyLock;

use regex::Regex;

use crate::{
    catalog::{Book, Comment},
    error::ValidationError,
};

/// Practical subset of RFC 5322, compiled once.
static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
        .expect("Invalid email regex pattern")
});

pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if email.is_empty() {
        return Err(ValidationError::MissingField("email".to_string()));
    }

    if email.len() > 254 {
        return Err(ValidationError::InvalidEmail(
            "email is too long".to_string(),
        ));
    }

    if EMAIL_REGEX.is_match(email) {
        Ok(())
    } else {
        Err(ValidationError::InvalidEmail(email.to_string()))
    }
}

/// A book needs at least a title and an author.
pub fn validate_book(book: &Book) -> Result<(), ValidationError> {
    if book.title.trim().is_empty() {
        return Err(ValidationError::MissingField("title".to_string()));
    }

    if book.author.trim().is_empty() {
        return Err(ValidationError::MissingField("author".to_string()));
    }

    Ok(())
}

/// A visitor comment needs a name and a body; the rating, when present,
/// must be one to five stars, and the reply address, when present, must be
/// well formed.
pub fn validate_comment(comment: &Comment) -> Result<(), ValidationError> {
    if comment.visitor_name.trim().is_empty() {
        return Err(ValidationError::MissingField("visitorName".to_string()));
    }

    if comment.comment_text.trim().is_empty() {
        return Err(ValidationError::MissingField("commentText".to_string()));
    }

    if let Some(rating) = comment.rating {
        if !(1..=5).contains(&rating) {
            return Err(ValidationError::InvalidField(format!(
                "rating must be between 1 and 5, got {rating}"
            )));
        }
    }

    if let Some(email) = comment.visitor_email.as_deref() {
        if !email.is_empty() {
            validate_email(email)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn comment() -> Comment {
        Comment {
            book_id: None,
            visitor_name: "Anna".to_string(),
            visitor_email: None,
            comment_text: "Letto in un giorno.".to_string(),
            rating: Some(5),
            comment_date: Utc::now(),
        }
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("user@example.com").is_ok());
        assert!(validate_email("first.last+tag@sub.example.org").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("user@no-tld").is_err());
    }

    #[test]
    fn test_validate_book_requires_title_and_author() {
        let book = Book {
            title: "  ".to_string(),
            author: "Someone".to_string(),
            category: None,
            is_must_read: false,
            micro_review: None,
            cover_image: None,
            year_read: None,
            synopsis: None,
        };
        assert!(matches!(
            validate_book(&book),
            Err(ValidationError::MissingField(field)) if field == "title"
        ));
    }

    #[test]
    fn test_validate_comment_accepts_complete_comment() {
        assert!(validate_comment(&comment()).is_ok());
    }

    #[test]
    fn test_validate_comment_requires_name_and_text() {
        let mut c = comment();
        c.visitor_name = String::new();
        assert!(validate_comment(&c).is_err());

        let mut c = comment();
        c.comment_text = "   ".to_string();
        assert!(validate_comment(&c).is_err());
    }

    #[test]
    fn test_validate_comment_checks_rating_range() {
        let mut c = comment();
        c.rating = Some(0);
        assert!(validate_comment(&c).is_err());

        c.rating = Some(6);
        assert!(validate_comment(&c).is_err());

        c.rating = None;
        assert!(validate_comment(&c).is_ok());
    }

    #[test]
    fn test_validate_comment_checks_optional_email() {
        let mut c = comment();
        c.visitor_email = Some("not-an-email".to_string());
        assert!(validate_comment(&c).is_err());

        c.visitor_email = Some("anna@example.com".to_string());
        assert!(validate_comment(&c).is_ok());
    }
}
