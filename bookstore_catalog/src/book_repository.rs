pub use in_memory_book_repository::InMemoryBookRepository;
pub use postgres_book_repository::{PostgresBookRepository, PostgresBookRepositoryConfig};

use crate::api::{Book, BookDraft, BookId, BookPatch};

mod in_memory_book_repository;
mod postgres_book_repository;

#[derive(thiserror::Error, Debug)]
pub enum BookRepositoryError {
    #[error("Book {0} not found")]
    NotFound(BookId),

    #[error("Failed to deserialize book: {0}")]
    DeserializationError(#[from] serde_json::Error),

    #[error("DatabaseFailure failure {0}")]
    DatabaseFailure(#[from] tokio_postgres::Error),

    #[error("Storage call exceeded its deadline")]
    DeadlineExceeded,

    #[error("Other error {0}")]
    Other(String),
}

#[async_trait::async_trait]
pub trait BookRepository {
    /// Adds book to the catalog, returns an id assigned to the book
    async fn add_book(&self, draft: BookDraft) -> Result<BookId, BookRepositoryError>;
    /// Retrieves a single book by id
    async fn get_book(&self, book_id: BookId) -> Result<Book, BookRepositoryError>;
    /// Returns one page of books ordered by id descending, skipping
    /// `page * PAGE_SIZE` records and returning at most `PAGE_SIZE`
    async fn list_page(&self, page: i64) -> Result<Vec<Book>, BookRepositoryError>;
    /// Returns the total number of books in the catalog
    async fn count_books(&self) -> Result<i64, BookRepositoryError>;
    /// Merge-updates a book: absent, empty, or zero-valued patch fields keep
    /// the stored value. Returns true if a row was touched and false if the
    /// book was not found
    async fn update_book(&self, book_id: BookId, patch: BookPatch)
        -> Result<bool, BookRepositoryError>;
    /// Deletes a book by id, returns true if a row was deleted and false if
    /// there was nothing to delete
    async fn delete_book(&self, book_id: BookId) -> Result<bool, BookRepositoryError>;
}
