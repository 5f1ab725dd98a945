use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};

use crate::api::{Book, BookCreate, BookId, BookUpdate};
use crate::books_repository::{BookRepository, BookRepositoryError};

/// Repository keeping the books in process memory, ids start at 1
#[derive(Default)]
pub struct InMemoryBookRepository {
    book_sequence_generator: AtomicI64,
    books: parking_lot::RwLock<BTreeMap<BookId, Book>>,
}

fn is_duplicate<'a>(
    mut books: impl Iterator<Item = &'a Book>,
    title: &str,
    author: &str,
    except: Option<BookId>,
) -> bool {
    books.any(|book| Some(book.id) != except && book.title == title && book.author == author)
}

#[async_trait::async_trait]
impl BookRepository for InMemoryBookRepository {
    async fn list_books(&self) -> Result<Vec<Book>, BookRepositoryError> {
        Ok(self.books.read().values().cloned().collect())
    }

    async fn get_book(&self, book_id: BookId) -> Result<Option<Book>, BookRepositoryError> {
        Ok(self.books.read().get(&book_id).cloned())
    }

    async fn add_book(&self, book: BookCreate) -> Result<Book, BookRepositoryError> {
        let mut locked_books = self.books.write();
        if is_duplicate(locked_books.values(), &book.title, &book.author, None) {
            return Err(BookRepositoryError::Duplicate);
        }

        let id = self.book_sequence_generator.fetch_add(1, Ordering::Relaxed) + 1;
        let book = Book {
            id,
            title: book.title,
            author: book.author,
            published_year: book.published_year,
        };
        locked_books.insert(id, book.clone());
        Ok(book)
    }

    async fn update_book(
        &self,
        book_id: BookId,
        update: BookUpdate,
    ) -> Result<Option<Book>, BookRepositoryError> {
        let mut locked_books = self.books.write();
        let Some(current) = locked_books.get(&book_id) else {
            return Ok(None);
        };

        let updated = Book {
            id: book_id,
            title: update.title.unwrap_or_else(|| current.title.clone()),
            author: update.author.unwrap_or_else(|| current.author.clone()),
            published_year: update.published_year.unwrap_or(current.published_year),
        };
        if is_duplicate(
            locked_books.values(),
            &updated.title,
            &updated.author,
            Some(book_id),
        ) {
            return Err(BookRepositoryError::Duplicate);
        }

        locked_books.insert(book_id, updated.clone());
        Ok(Some(updated))
    }

    async fn delete_book(&self, book_id: BookId) -> Result<bool, BookRepositoryError> {
        Ok(self.books.write().remove(&book_id).is_some())
    }
}
