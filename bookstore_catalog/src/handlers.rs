use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use actix_web::http::StatusCode;
use actix_web::web::Data;
use actix_web::{Error, HttpResponse};
use paperclip::actix::{
    api_v2_operation,
    web::{self},
    Apiv2Schema,
};
use serde::Deserialize;

use crate::api::{ApiMessage, BookDraft, BookId, BookListResponse, BookPatch, Paging};
use crate::book_repository::{BookRepository, BookRepositoryError};
use crate::metrics::Metrics;
use crate::validation::{self, BookField, Mode};

/// Upper bound on every storage round-trip; a slow backend fails the request
/// instead of hanging it.
const STORAGE_DEADLINE: Duration = Duration::from_secs(5);

async fn with_deadline<T, F>(fut: F) -> Result<T, BookRepositoryError>
where
    F: Future<Output = Result<T, BookRepositoryError>>,
{
    match tokio::time::timeout(STORAGE_DEADLINE, fut).await {
        Ok(result) => result,
        Err(_) => Err(BookRepositoryError::DeadlineExceeded),
    }
}

fn message_response(status: StatusCode, message: impl Into<String>) -> HttpResponse {
    HttpResponse::build(status).json(ApiMessage {
        status: status.as_u16(),
        message: message.into(),
    })
}

#[api_v2_operation]
pub async fn health() -> Result<HttpResponse, Error> {
    Ok(HttpResponse::Ok().finish())
}

#[api_v2_operation]
pub async fn add_book(
    books_repository: Data<Arc<dyn BookRepository + Send + Sync>>,
    metrics: Data<Metrics>,
    draft: web::Json<BookDraft>,
) -> Result<HttpResponse, Error> {
    let draft = draft.into_inner();

    if let Err(violations) = validation::validate(&draft.clone().into_patch().normalize(), Mode::Full)
    {
        metrics.record_post_book(StatusCode::BAD_REQUEST.as_u16());
        return Ok(message_response(
            StatusCode::BAD_REQUEST,
            violations.to_string(),
        ));
    }

    Ok(
        match with_deadline(books_repository.add_book(draft)).await {
            Ok(_book_id) => {
                metrics.record_post_book(StatusCode::OK.as_u16());
                message_response(StatusCode::OK, "added new book")
            }
            Err(err) => {
                tracing::error!("Add book failed {}", err);
                metrics.record_post_book(StatusCode::INTERNAL_SERVER_ERROR.as_u16());
                message_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
        },
    )
}

#[api_v2_operation]
pub async fn get_book(
    books_repository: Data<Arc<dyn BookRepository + Send + Sync>>,
    metrics: Data<Metrics>,
    book_id: web::Path<BookId>,
) -> Result<HttpResponse, Error> {
    let book_id = book_id.into_inner();
    Ok(
        match with_deadline(books_repository.get_book(book_id)).await {
            Ok(book) => {
                metrics.record_get_book(StatusCode::OK.as_u16());
                HttpResponse::Ok().json(book)
            }
            Err(BookRepositoryError::NotFound(_)) => {
                metrics.record_get_book(StatusCode::NOT_FOUND.as_u16());
                message_response(StatusCode::NOT_FOUND, "book not found")
            }
            Err(err) => {
                tracing::error!("Get book {} failed {}", book_id, err);
                metrics.record_get_book(StatusCode::INTERNAL_SERVER_ERROR.as_u16());
                message_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
        },
    )
}

#[derive(Debug, Deserialize, Apiv2Schema)]
pub struct ListBooksQuery {
    /// Zero-based page number; anything unparseable counts as page 0.
    pub page: Option<String>,
}

#[api_v2_operation]
pub async fn list_books(
    books_repository: Data<Arc<dyn BookRepository + Send + Sync>>,
    metrics: Data<Metrics>,
    query: web::Query<ListBooksQuery>,
) -> Result<HttpResponse, Error> {
    let page = query
        .page
        .as_deref()
        .and_then(|raw| raw.parse::<i64>().ok())
        .unwrap_or(0)
        .max(0);

    let books = match with_deadline(books_repository.list_page(page)).await {
        Ok(books) => books,
        Err(err) => {
            tracing::error!("List books page {} failed {}", page, err);
            metrics.record_get_books(StatusCode::INTERNAL_SERVER_ERROR.as_u16());
            return Ok(message_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                err.to_string(),
            ));
        }
    };

    // An empty page is reported as not-found, never as an empty success list.
    if books.is_empty() {
        metrics.record_get_books(StatusCode::NOT_FOUND.as_u16());
        return Ok(message_response(
            StatusCode::NOT_FOUND,
            "there aren't books.",
        ));
    }

    Ok(
        match with_deadline(books_repository.count_books()).await {
            Ok(total_record) => {
                metrics.record_get_books(StatusCode::OK.as_u16());
                HttpResponse::Ok().json(BookListResponse {
                    data: books,
                    paging: Paging::for_page(page, total_record),
                })
            }
            Err(err) => {
                tracing::error!("Count books failed {}", err);
                metrics.record_get_books(StatusCode::INTERNAL_SERVER_ERROR.as_u16());
                message_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
        },
    )
}

#[api_v2_operation]
pub async fn update_book(
    books_repository: Data<Arc<dyn BookRepository + Send + Sync>>,
    metrics: Data<Metrics>,
    book_id: web::Path<BookId>,
    patch: web::Json<BookPatch>,
) -> Result<HttpResponse, Error> {
    let book_id = book_id.into_inner();
    let patch = patch.into_inner().normalize();

    if let Err(violations) = validation::validate(&patch, Mode::Partial) {
        metrics.record_put_book(StatusCode::BAD_REQUEST.as_u16());
        return Ok(message_response(
            StatusCode::BAD_REQUEST,
            violations.to_string(),
        ));
    }

    Ok(
        match with_deadline(books_repository.update_book(book_id, patch)).await {
            Ok(true) => {
                metrics.record_put_book(StatusCode::OK.as_u16());
                message_response(StatusCode::OK, "book updated")
            }
            Ok(false) => {
                metrics.record_put_book(StatusCode::NOT_FOUND.as_u16());
                message_response(StatusCode::NOT_FOUND, "book not found")
            }
            Err(err) => {
                tracing::error!("Update book {} failed {}", book_id, err);
                metrics.record_put_book(StatusCode::INTERNAL_SERVER_ERROR.as_u16());
                message_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
        },
    )
}

/// Shared body of the per-field update endpoints: keep only the path-named
/// field, validate it, and touch nothing else in storage. Unlike the full
/// update, this path reports success even when the id is absent.
async fn update_single_field(
    books_repository: &Arc<dyn BookRepository + Send + Sync>,
    metrics: &Metrics,
    book_id: BookId,
    patch: BookPatch,
    field: BookField,
) -> HttpResponse {
    let patch = validation::project(patch.normalize(), field);

    if let Err(violations) = validation::validate_field(&patch, field) {
        metrics.record_put_book(StatusCode::BAD_REQUEST.as_u16());
        return message_response(StatusCode::BAD_REQUEST, violations.to_string());
    }

    match with_deadline(books_repository.update_book(book_id, patch)).await {
        Ok(_) => {
            metrics.record_put_book(StatusCode::OK.as_u16());
            message_response(StatusCode::OK, "book updated")
        }
        Err(err) => {
            tracing::error!("Update book {} field {} failed {}", book_id, field, err);
            metrics.record_put_book(StatusCode::INTERNAL_SERVER_ERROR.as_u16());
            message_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

macro_rules! single_field_handler {
    ($name:ident, $field:expr) => {
        #[api_v2_operation]
        pub async fn $name(
            books_repository: Data<Arc<dyn BookRepository + Send + Sync>>,
            metrics: Data<Metrics>,
            book_id: web::Path<BookId>,
            patch: web::Json<BookPatch>,
        ) -> Result<HttpResponse, Error> {
            Ok(update_single_field(
                &books_repository,
                &metrics,
                book_id.into_inner(),
                patch.into_inner(),
                $field,
            )
            .await)
        }
    };
}

single_field_handler!(update_book_title, BookField::Title);
single_field_handler!(update_book_author, BookField::Author);
single_field_handler!(update_book_price, BookField::Price);
single_field_handler!(update_book_summary, BookField::Summary);
single_field_handler!(update_book_cover_type, BookField::CoverType);
single_field_handler!(update_book_genre, BookField::Genre);
single_field_handler!(update_book_quantity, BookField::Quantity);
single_field_handler!(update_book_category, BookField::Category);
single_field_handler!(update_book_cover_id, BookField::CoverId);

#[api_v2_operation]
pub async fn delete_book(
    books_repository: Data<Arc<dyn BookRepository + Send + Sync>>,
    metrics: Data<Metrics>,
    book_id: web::Path<BookId>,
) -> Result<HttpResponse, Error> {
    let book_id = book_id.into_inner();
    Ok(
        match with_deadline(books_repository.delete_book(book_id)).await {
            Ok(true) => {
                metrics.record_delete_book(StatusCode::OK.as_u16());
                message_response(StatusCode::OK, "book deleted")
            }
            Ok(false) => {
                metrics.record_delete_book(StatusCode::NOT_FOUND.as_u16());
                message_response(StatusCode::NOT_FOUND, "book not found or already deleted.")
            }
            Err(err) => {
                tracing::error!("Delete book {} failed {}", book_id, err);
                metrics.record_delete_book(StatusCode::INTERNAL_SERVER_ERROR.as_u16());
                message_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
        },
    )
}
