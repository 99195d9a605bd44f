use paperclip::actix::Apiv2Schema;
use serde::{Deserialize, Serialize};

pub type BookId = i32;

/// Fixed number of records per list page.
pub const PAGE_SIZE: i64 = 10;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Apiv2Schema)]
/// A catalog record, as stored and as returned by single reads
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub author: String,
    pub price: f64,
    pub summary: String,
    pub cover_type: String,
    pub genre: String,
    pub quantity: i32,
    pub category: String,
    pub cover_id: i32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Apiv2Schema)]
/// A full candidate book submitted to the create endpoint; the id is assigned by storage.
/// Missing fields deserialize to their zero value and are rejected by validation.
#[serde(default)]
pub struct BookDraft {
    pub title: String,
    pub author: String,
    pub price: f64,
    pub summary: String,
    pub cover_type: String,
    pub genre: String,
    pub quantity: i32,
    pub category: String,
    pub cover_id: i32,
}

impl BookDraft {
    /// Converts the draft into a patch with every field present, so create and
    /// update run through the same rule table.
    pub fn into_patch(self) -> BookPatch {
        BookPatch {
            title: Some(self.title),
            author: Some(self.author),
            price: Some(self.price),
            summary: Some(self.summary),
            cover_type: Some(self.cover_type),
            genre: Some(self.genre),
            quantity: Some(self.quantity),
            category: Some(self.category),
            cover_id: Some(self.cover_id),
        }
    }

    pub fn into_book(self, id: BookId) -> Book {
        Book {
            id,
            title: self.title,
            author: self.author,
            price: self.price,
            summary: self.summary,
            cover_type: self.cover_type,
            genre: self.genre,
            quantity: self.quantity,
            category: self.category,
            cover_id: self.cover_id,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Apiv2Schema)]
/// A partial update to a book. Absent fields leave the stored value unchanged.
pub struct BookPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_id: Option<i32>,
}

impl BookPatch {
    /// Drops empty-string and zero values so they read as "no change"
    /// (coalesce semantics) for both validation and storage.
    pub fn normalize(self) -> Self {
        Self {
            title: self.title.filter(|v| !v.is_empty()),
            author: self.author.filter(|v| !v.is_empty()),
            price: self.price.filter(|v| *v != 0.0),
            summary: self.summary.filter(|v| !v.is_empty()),
            cover_type: self.cover_type.filter(|v| !v.is_empty()),
            genre: self.genre.filter(|v| !v.is_empty()),
            quantity: self.quantity.filter(|v| *v != 0),
            category: self.category.filter(|v| !v.is_empty()),
            cover_id: self.cover_id.filter(|v| *v != 0),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.author.is_none()
            && self.price.is_none()
            && self.summary.is_none()
            && self.cover_type.is_none()
            && self.genre.is_none()
            && self.quantity.is_none()
            && self.category.is_none()
            && self.cover_id.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Apiv2Schema)]
/// Envelope returned by mutation endpoints and error responses
pub struct ApiMessage {
    pub status: u16,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Apiv2Schema)]
pub struct Paging {
    pub total_record: i64,
    pub page: i64,
    pub total_pages: i64,
}

impl Paging {
    /// `total_pages` is the zero-based index of the last page. Only computed
    /// when the fetched page is non-empty, so `total_record` is positive here.
    pub fn for_page(page: i64, total_record: i64) -> Self {
        Self {
            total_record,
            page,
            total_pages: (total_record + PAGE_SIZE - 1) / PAGE_SIZE - 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Apiv2Schema)]
pub struct BookListResponse {
    pub data: Vec<Book>,
    pub paging: Paging,
}
