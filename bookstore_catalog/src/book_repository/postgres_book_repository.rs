use anyhow::Context;
use tokio_postgres::{Client, NoTls, Row, Statement};

use crate::api::{Book, BookDraft, BookId, BookPatch, PAGE_SIZE};
use crate::book_repository::{BookRepository, BookRepositoryError};

/// Relational backend: one typed column per field, coalesce merge on update.
pub struct PostgresBookRepository {
    client: Client,
}

pub struct PostgresBookRepositoryConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub dbname: String,
    pub sslmode: String,
}

const BOOK_COLUMNS: &str =
    "id, title, author, price, summary, cover_type, genre, quantity, category, cover_id";

impl PostgresBookRepository {
    pub async fn init(config: PostgresBookRepositoryConfig) -> anyhow::Result<Self> {
        let connection_str = format!(
            "postgresql://{}:{}@{}:{}/{}?sslmode={}",
            config.username,
            config.password,
            config.host,
            config.port,
            config.dbname,
            config.sslmode
        );
        tracing::info!(
            "Connecting to postgres at {}:{}/{}",
            config.host,
            config.port,
            config.dbname
        );
        let (client, connection) = tokio_postgres::connect(&connection_str, NoTls)
            .await
            .context("Failed to start postgres")?;

        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!("postgres connection error: {}", e);
            }
        });

        client
            .batch_execute(
                "
        CREATE TABLE IF NOT EXISTS books (
            id              SERIAL PRIMARY KEY,
            title           VARCHAR(255) NOT NULL,
            author          VARCHAR(64) NOT NULL,
            price           DOUBLE PRECISION NOT NULL,
            summary         VARCHAR(512) NOT NULL,
            cover_type      VARCHAR(32) NOT NULL,
            genre           VARCHAR(32) NOT NULL,
            quantity        INT NOT NULL,
            category        VARCHAR(32) NOT NULL,
            cover_id        INT NOT NULL
            )
        ",
            )
            .await
            .context("Failed to setup table")?;
        Ok(Self { client })
    }
}

fn book_from_row(row: &Row) -> Result<Book, tokio_postgres::Error> {
    Ok(Book {
        id: row.try_get(0)?,
        title: row.try_get(1)?,
        author: row.try_get(2)?,
        price: row.try_get(3)?,
        summary: row.try_get(4)?,
        cover_type: row.try_get(5)?,
        genre: row.try_get(6)?,
        quantity: row.try_get(7)?,
        category: row.try_get(8)?,
        cover_id: row.try_get(9)?,
    })
}

#[async_trait::async_trait]
impl BookRepository for PostgresBookRepository {
    #[tracing::instrument(skip(self, draft))]
    async fn add_book(&self, draft: BookDraft) -> Result<BookId, BookRepositoryError> {
        let stmt: Statement = self
            .client
            .prepare(
                "INSERT INTO books (title, author, price, summary, cover_type, genre, quantity, category, cover_id) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING id",
            )
            .await?;

        let rows = self
            .client
            .query(
                &stmt,
                &[
                    &draft.title,
                    &draft.author,
                    &draft.price,
                    &draft.summary,
                    &draft.cover_type,
                    &draft.genre,
                    &draft.quantity,
                    &draft.category,
                    &draft.cover_id,
                ],
            )
            .await?;

        let book_id: BookId = rows
            .first()
            .ok_or_else(|| BookRepositoryError::Other("Id not returned".to_string()))?
            .try_get(0)?;

        Ok(book_id)
    }

    #[tracing::instrument(skip(self))]
    async fn get_book(&self, book_id: BookId) -> Result<Book, BookRepositoryError> {
        let stmt: Statement = self
            .client
            .prepare(&format!(
                "SELECT {} FROM books WHERE id = ($1)",
                BOOK_COLUMNS
            ))
            .await?;

        let rows = self.client.query(&stmt, &[&book_id]).await?;

        let row = rows
            .first()
            .ok_or(BookRepositoryError::NotFound(book_id))?;

        Ok(book_from_row(row)?)
    }

    #[tracing::instrument(skip(self))]
    async fn list_page(&self, page: i64) -> Result<Vec<Book>, BookRepositoryError> {
        let stmt: Statement = self
            .client
            .prepare(&format!(
                "SELECT {} FROM books ORDER BY id DESC LIMIT {} OFFSET $1",
                BOOK_COLUMNS, PAGE_SIZE
            ))
            .await?;

        let offset = page * PAGE_SIZE;
        let rows = self.client.query(&stmt, &[&offset]).await?;

        rows.iter()
            .map(|row| Ok(book_from_row(row)?))
            .collect()
    }

    #[tracing::instrument(skip(self))]
    async fn count_books(&self) -> Result<i64, BookRepositoryError> {
        let stmt: Statement = self.client.prepare("SELECT COUNT(*) FROM books").await?;

        let rows = self.client.query(&stmt, &[]).await?;

        let count: i64 = rows
            .first()
            .ok_or_else(|| BookRepositoryError::Other("Count not returned".to_string()))?
            .try_get(0)?;

        Ok(count)
    }

    #[tracing::instrument(skip(self, patch))]
    async fn update_book(
        &self,
        book_id: BookId,
        patch: BookPatch,
    ) -> Result<bool, BookRepositoryError> {
        // Absent patch fields arrive as NULL and COALESCE keeps the stored value.
        let stmt: Statement = self
            .client
            .prepare(
                "UPDATE books SET \
                 title = COALESCE($1, title), \
                 author = COALESCE($2, author), \
                 price = COALESCE($3, price), \
                 summary = COALESCE($4, summary), \
                 cover_type = COALESCE($5, cover_type), \
                 genre = COALESCE($6, genre), \
                 quantity = COALESCE($7, quantity), \
                 category = COALESCE($8, category), \
                 cover_id = COALESCE($9, cover_id) \
                 WHERE id = ($10)",
            )
            .await?;

        let patch = patch.normalize();
        let rows_affected = self
            .client
            .execute(
                &stmt,
                &[
                    &patch.title,
                    &patch.author,
                    &patch.price,
                    &patch.summary,
                    &patch.cover_type,
                    &patch.genre,
                    &patch.quantity,
                    &patch.category,
                    &patch.cover_id,
                    &book_id,
                ],
            )
            .await?;
        Ok(rows_affected > 0)
    }

    #[tracing::instrument(skip(self))]
    async fn delete_book(&self, book_id: BookId) -> Result<bool, BookRepositoryError> {
        let stmt: Statement = self
            .client
            .prepare("DELETE FROM books WHERE id = ($1)")
            .await?;

        let rows_affected = self.client.execute(&stmt, &[&book_id]).await?;
        Ok(rows_affected > 0)
    }
}

#[cfg(test)]
mod postgres_book_repository_tests {
    use serial_test::file_serial;
    use testcontainers::core::IntoContainerPort;
    use testcontainers::runners::AsyncRunner;
    use testcontainers::{ContainerAsync, GenericImage, ImageExt};

    use crate::api::{BookDraft, BookPatch};
    use crate::book_repository::{BookRepository, BookRepositoryError};

    async fn start_postgres_container_and_init_repo() -> (
        ContainerAsync<GenericImage>,
        crate::book_repository::PostgresBookRepository,
    ) {
        let _pg_container = GenericImage::new("postgres", "latest")
            .with_mapped_port(5432, 5432.tcp())
            .with_env_var("POSTGRES_USER", "postgres")
            .with_env_var("POSTGRES_PASSWORD", "postgres")
            .start()
            .await
            .expect("Failed to start postgres");

        for _ in 0..10 {
            if let Ok(repo) = crate::book_repository::PostgresBookRepository::init(
                crate::book_repository::PostgresBookRepositoryConfig {
                    host: "127.0.0.1".to_string(),
                    port: 5432,
                    username: "postgres".to_string(),
                    password: "postgres".to_string(),
                    dbname: "postgres".to_string(),
                    sslmode: "disable".to_string(),
                },
            )
            .await
            {
                return (_pg_container, repo);
            }
            tokio::time::sleep(std::time::Duration::from_millis(300)).await;
        }
        panic!("Failed to setup postgres container")
    }

    fn draft(title: &str) -> BookDraft {
        BookDraft {
            title: title.to_string(),
            author: "Umberto Eco".to_string(),
            price: 15.9,
            summary: "A murder mystery in a medieval abbey".to_string(),
            cover_type: "Hard Cover".to_string(),
            genre: "Detective".to_string(),
            quantity: 3,
            category: "Best Seller".to_string(),
            cover_id: 7,
        }
    }

    #[tokio::test]
    #[file_serial(key, path => "../.pgtestslock")]
    /// Tests if add_book and get_book work correctly
    /// for the sake of not starting container multiple times it tests everything in one testcase
    async fn test_add_book_and_get_it() {
        let (_container, repo) = start_postgres_container_and_init_repo().await;

        let not_existing_book_id = 20000;
        let book_not_found = repo.get_book(not_existing_book_id).await;
        assert!(matches!(
            book_not_found,
            Err(BookRepositoryError::NotFound(..))
        ));

        let book_draft = draft("The Name of the Rose");
        let id = repo
            .add_book(book_draft.clone())
            .await
            .expect("Failed to add book");

        let book = repo.get_book(id).await.expect("Failed to get book");
        assert_eq!(book, book_draft.into_book(id));
    }

    #[tokio::test]
    #[file_serial(key, path => "../.pgtestslock")]
    /// Tests list_page and count_books against a 25-record catalog
    /// for the sake of not starting container multiple times it tests everything in one testcase
    async fn test_pagination_and_count() {
        let (_container, repo) = start_postgres_container_and_init_repo().await;

        assert_eq!(repo.count_books().await.expect("Failed to count"), 0);
        assert!(repo.list_page(0).await.expect("Failed to list").is_empty());

        let mut ids = Vec::new();
        for i in 1..=25 {
            let id = repo
                .add_book(draft(&format!("title{}", i)))
                .await
                .expect("Failed to add book");
            ids.push(id);
        }

        assert_eq!(repo.count_books().await.expect("Failed to count"), 25);

        let mut newest_first = ids.clone();
        newest_first.reverse();

        let first_page = repo.list_page(0).await.expect("Failed to list");
        let first_page_ids: Vec<_> = first_page.iter().map(|b| b.id).collect();
        assert_eq!(first_page_ids, newest_first[..10].to_vec());

        let last_page = repo.list_page(2).await.expect("Failed to list");
        let last_page_ids: Vec<_> = last_page.iter().map(|b| b.id).collect();
        assert_eq!(last_page_ids, newest_first[20..].to_vec());

        assert!(repo.list_page(3).await.expect("Failed to list").is_empty());
    }

    #[tokio::test]
    #[file_serial(key, path => "../.pgtestslock")]
    /// Tests the coalesce merge-update and idempotent delete
    /// for the sake of not starting container multiple times it tests everything in one testcase
    async fn test_patch_coalesce_and_delete() {
        let (_container, repo) = start_postgres_container_and_init_repo().await;

        let not_existing_book = 2000;
        let result = repo
            .update_book(not_existing_book, BookPatch::default())
            .await
            .expect("Failed to update");
        // false means nothing to update
        assert!(!result);

        let book_draft = draft("The Name of the Rose");
        let id = repo
            .add_book(book_draft.clone())
            .await
            .expect("Failed to add book");

        let price_only = BookPatch {
            price: Some(9.5),
            ..BookPatch::default()
        };
        assert!(repo
            .update_book(id, price_only)
            .await
            .expect("Failed to patch"));

        let book = repo.get_book(id).await.unwrap();
        assert_eq!(book.price, 9.5);
        assert_eq!(book.title, book_draft.title);
        assert_eq!(book.author, book_draft.author);

        // Zero values are "no change".
        let zero_values = BookPatch {
            title: Some(String::new()),
            price: Some(0.0),
            ..BookPatch::default()
        };
        assert!(repo
            .update_book(id, zero_values)
            .await
            .expect("Failed to patch"));

        let book = repo.get_book(id).await.unwrap();
        assert_eq!(book.title, book_draft.title);
        assert_eq!(book.price, 9.5);

        assert!(repo.delete_book(id).await.expect("Failed to delete"));
        assert!(!repo.delete_book(id).await.expect("Failed to delete"));

        let book_not_found = repo.get_book(id).await;
        assert!(matches!(
            book_not_found,
            Err(BookRepositoryError::NotFound(..))
        ));
    }
}
