use serde::{Deserialize, Serialize};

use crate::db::models::book::{Book, BookSummary};

#[derive(Debug, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateBookRequest {
    pub title: String,
    pub author: Option<String>,
}

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct BookResponse {
    pub id: String,
    pub title: String,
    pub author: Option<String>,
    pub created_at: String,
}

impl From<Book> for BookResponse {
    fn from(book: Book) -> Self {
        Self {
            id: book.id,
            title: book.title,
            author: book.author,
            created_at: book.created_at,
        }
    }
}

/// Library listing entry: the book plus how many PDFs it holds.
#[derive(Debug, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct BookSummaryResponse {
    pub id: String,
    pub title: String,
    pub author: Option<String>,
    pub material_count: i64,
    pub created_at: String,
}

impl From<BookSummary> for BookSummaryResponse {
    fn from(book: BookSummary) -> Self {
        Self {
            id: book.id,
            title: book.title,
            author: book.author,
            material_count: book.material_count,
            created_at: book.created_at,
        }
    }
}
