use anyhow::{bail, Context};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_tracing::TracingMiddleware;

use crate::api::{Book, BookDraft, BookId, BookListResponse, BookPatch};
use crate::validation::BookField;

pub struct BookstoreCatalogClient {
    url: String,
    client: ClientWithMiddleware,
}

impl BookstoreCatalogClient {
    pub fn new(url: &str) -> anyhow::Result<Self> {
        let reqwest_client = reqwest::Client::builder()
            .build()
            .context("Failed to build reqwest client")?;
        let client = ClientBuilder::new(reqwest_client)
            // Insert the tracing middleware
            .with(TracingMiddleware::default())
            .build();

        Ok(Self {
            url: url.to_string(),
            client,
        })
    }

    pub async fn add_book(&self, draft: BookDraft) -> anyhow::Result<()> {
        let response = self
            .client
            .post(format!("{}/api/v1/book", self.url))
            .json(&draft)
            .send()
            .await?;

        if !response.status().is_success() {
            let error = response.text().await.unwrap_or_default();
            bail!("Failed to add book {}", error)
        }
        Ok(())
    }

    /// Returns `None` when the book does not exist.
    pub async fn get_book(&self, book_id: BookId) -> anyhow::Result<Option<Book>> {
        let response = self
            .client
            .get(format!("{}/api/v1/book/{}", self.url, book_id))
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            bail!("Failed to get book: {}", response.status())
        }

        Ok(Some(response.json().await.context("Failed to parse book")?))
    }

    /// Returns `None` for an empty page - the service reports it as not-found.
    pub async fn list_books(&self, page: i64) -> anyhow::Result<Option<BookListResponse>> {
        let response = self
            .client
            .get(format!("{}/api/v1/book?page={}", self.url, page))
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            bail!("Failed to list books: {}", response.status())
        }

        Ok(Some(
            response.json().await.context("Failed to parse listing")?,
        ))
    }

    /// Returns false when the book was not found.
    pub async fn update_book(&self, book_id: BookId, patch: BookPatch) -> anyhow::Result<bool> {
        let response = self
            .client
            .put(format!("{}/api/v1/book/{}", self.url, book_id))
            .json(&patch)
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(false);
        }
        if !response.status().is_success() {
            let error = response.text().await.unwrap_or_default();
            bail!("Failed to update book {}", error)
        }
        Ok(true)
    }

    pub async fn update_book_field(
        &self,
        field: BookField,
        book_id: BookId,
        patch: &BookPatch,
    ) -> anyhow::Result<()> {
        let response = self
            .client
            .put(format!(
                "{}/api/v1/book/{}/{}",
                self.url,
                field.as_str(),
                book_id
            ))
            .json(patch)
            .send()
            .await?;

        if !response.status().is_success() {
            let error = response.text().await.unwrap_or_default();
            bail!("Failed to update book {} {}", field, error)
        }
        Ok(())
    }

    /// Returns false when there was nothing to delete.
    pub async fn delete_book(&self, book_id: BookId) -> anyhow::Result<bool> {
        let response = self
            .client
            .delete(format!("{}/api/v1/book/{}", self.url, book_id))
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(false);
        }
        if !response.status().is_success() {
            bail!("Failed to delete book: {}", response.status())
        }
        Ok(true)
    }
}
