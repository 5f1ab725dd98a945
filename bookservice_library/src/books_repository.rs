pub use in_memory_books_repository::InMemoryBookRepository;
pub use postgres_books_repository::{PostgresBooksRepository, PostgresBooksRepositoryConfig};

use crate::api::{Book, BookCreate, BookId, BookUpdate};

mod in_memory_books_repository;
mod postgres_books_repository;

#[derive(thiserror::Error, Debug)]
pub enum BookRepositoryError {
    #[error("Book with the same title and author already exists")]
    Duplicate,

    #[error("DatabaseFailure failure {0}")]
    DatabaseFailure(#[from] tokio_postgres::Error),

    #[error("Failed to get connection from pool {0}")]
    PoolFailure(#[from] deadpool_postgres::PoolError),

    #[error("Other error {0}")]
    Other(String),
}

#[async_trait::async_trait]
pub trait BookRepository: Send + Sync {
    /// Lists all books in the repository, ordered by id
    async fn list_books(&self) -> Result<Vec<Book>, BookRepositoryError>;
    /// Retrieves the book, None if there is no book with such id
    async fn get_book(&self, book_id: BookId) -> Result<Option<Book>, BookRepositoryError>;
    /// Adds book to repository, returns the stored book with the id assigned to it
    async fn add_book(&self, book: BookCreate) -> Result<Book, BookRepositoryError>;
    /// Applies the supplied fields of the update, returns the updated book or None if it was not found
    async fn update_book(
        &self,
        book_id: BookId,
        update: BookUpdate,
    ) -> Result<Option<Book>, BookRepositoryError>;
    /// Removes the book, returns true if it was there
    async fn delete_book(&self, book_id: BookId) -> Result<bool, BookRepositoryError>;
}
