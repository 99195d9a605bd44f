use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI32, Ordering};

use serde_json::json;

use crate::api::{Book, BookDraft, BookId, BookPatch, PAGE_SIZE};
use crate::book_repository::{BookRepository, BookRepositoryError};

/// Document-style backend: books live as whole records keyed by id, patches
/// are applied as JSON merges. Interchangeable with the Postgres backend.
pub struct InMemoryBookRepository {
    id_sequence: AtomicI32,
    books: parking_lot::RwLock<BTreeMap<BookId, Book>>,
}

impl Default for InMemoryBookRepository {
    fn default() -> Self {
        Self {
            // First assigned id is 1, matching the relational backend's SERIAL.
            id_sequence: AtomicI32::new(1),
            books: Default::default(),
        }
    }
}

#[async_trait::async_trait]
impl BookRepository for InMemoryBookRepository {
    async fn add_book(&self, draft: BookDraft) -> Result<BookId, BookRepositoryError> {
        let id = self.id_sequence.fetch_add(1, Ordering::Relaxed);
        self.books.write().insert(id, draft.into_book(id));
        Ok(id)
    }

    async fn get_book(&self, book_id: BookId) -> Result<Book, BookRepositoryError> {
        self.books
            .read()
            .get(&book_id)
            .cloned()
            .ok_or(BookRepositoryError::NotFound(book_id))
    }

    async fn list_page(&self, page: i64) -> Result<Vec<Book>, BookRepositoryError> {
        Ok(self
            .books
            .read()
            .values()
            .rev()
            .skip((page * PAGE_SIZE) as usize)
            .take(PAGE_SIZE as usize)
            .cloned()
            .collect())
    }

    async fn count_books(&self) -> Result<i64, BookRepositoryError> {
        Ok(self.books.read().len() as i64)
    }

    async fn update_book(
        &self,
        book_id: BookId,
        patch: BookPatch,
    ) -> Result<bool, BookRepositoryError> {
        let mut locked_books = self.books.write();
        if let Some(book) = locked_books.get_mut(&book_id) {
            let mut merged = json!(book);
            json_patch::merge(&mut merged, &json!(patch.normalize()));
            *book = serde_json::from_value(merged)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn delete_book(&self, book_id: BookId) -> Result<bool, BookRepositoryError> {
        Ok(self.books.write().remove(&book_id).is_some())
    }
}
