use crate::api::{BookCreate, BookId, BookUpdate};

pub const MIN_PUBLISHED_YEAR: i32 = 0;
pub const MAX_PUBLISHED_YEAR: i32 = 2024;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid book ID. Book ID must be a positive integer.")]
    InvalidBookId,

    #[error("Invalid published year. Year must be between 0 and 2024.")]
    InvalidPublishedYear,

    #[error("Book title cannot be empty.")]
    EmptyTitle,

    #[error("Author name cannot be empty.")]
    EmptyAuthor,

    #[error("Invalid request body.")]
    InvalidBody,
}

/// Parses the `{book_id}` path segment, anything that is not a positive integer is rejected
pub fn parse_book_id(raw: &str) -> Result<BookId, ValidationError> {
    match raw.parse::<BookId>() {
        Ok(book_id) if book_id > 0 => Ok(book_id),
        _ => Err(ValidationError::InvalidBookId),
    }
}

/// Checks a new book: year first, then title, then author
pub fn validate_new_book(book: &BookCreate) -> Result<(), ValidationError> {
    validate_published_year(book.published_year)?;
    validate_title(&book.title)?;
    validate_author(&book.author)
}

/// Same checks as for a new book, skipping the fields that were not supplied
pub fn validate_book_update(update: &BookUpdate) -> Result<(), ValidationError> {
    if let Some(published_year) = update.published_year {
        validate_published_year(published_year)?;
    }
    if let Some(title) = &update.title {
        validate_title(title)?;
    }
    if let Some(author) = &update.author {
        validate_author(author)?;
    }
    Ok(())
}

fn validate_published_year(published_year: i32) -> Result<(), ValidationError> {
    if (MIN_PUBLISHED_YEAR..=MAX_PUBLISHED_YEAR).contains(&published_year) {
        Ok(())
    } else {
        Err(ValidationError::InvalidPublishedYear)
    }
}

fn validate_title(title: &str) -> Result<(), ValidationError> {
    if title.trim().is_empty() {
        Err(ValidationError::EmptyTitle)
    } else {
        Ok(())
    }
}

fn validate_author(author: &str) -> Result<(), ValidationError> {
    if author.trim().is_empty() {
        Err(ValidationError::EmptyAuthor)
    } else {
        Ok(())
    }
}
