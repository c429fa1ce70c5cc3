use axum::{
    extract::{Path, State},
    Json,
};

use crate::db::models::book::Book;
use crate::dto::book::{BookResponse, BookSummaryResponse, CreateBookRequest};
use crate::errors::AppError;
use crate::middleware::auth::Claims;
use crate::state::AppState;

/// Loads a book and checks that the caller owns it. Every route that hangs
/// off a book id goes through this.
pub(crate) async fn find_owned_book(
    state: &AppState,
    claims: &Claims,
    book_id: &str,
) -> Result<Book, AppError> {
    let book = state
        .book_repo
        .find_by_id(book_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Book not found".to_string()))?;

    if book.user_id != claims.sub {
        return Err(AppError::Forbidden);
    }

    Ok(book)
}

#[cfg_attr(feature = "openapi", utoipa::path(post, path = "/api/books", tag = "Books", security(("bearer_auth" = [])), request_body = CreateBookRequest, responses((status = 200, body = BookResponse))))]
pub async fn create_book(
    State(state): State<AppState>,
    claims: Claims,
    Json(payload): Json<CreateBookRequest>,
) -> Result<Json<BookResponse>, AppError> {
    let title = payload.title.trim();
    if title.is_empty() {
        return Err(AppError::Validation("Book title is required".to_string()));
    }

    let author = payload
        .author
        .as_deref()
        .map(str::trim)
        .filter(|a| !a.is_empty());

    let book = state.book_repo.create(&claims.sub, title, author).await?;

    Ok(Json(book.into()))
}

#[cfg_attr(feature = "openapi", utoipa::path(get, path = "/api/books", tag = "Books", security(("bearer_auth" = [])), responses((status = 200, body = Vec<BookSummaryResponse>))))]
pub async fn list_books(
    State(state): State<AppState>,
    claims: Claims,
) -> Result<Json<Vec<BookSummaryResponse>>, AppError> {
    let books = state.book_repo.find_by_user(&claims.sub).await?;
    Ok(Json(books.into_iter().map(|b| b.into()).collect()))
}

#[cfg_attr(feature = "openapi", utoipa::path(get, path = "/api/books/{id}", tag = "Books", security(("bearer_auth" = [])), params(("id" = String, Path, description = "Book ID")), responses((status = 200, body = BookResponse))))]
pub async fn get_book(
    State(state): State<AppState>,
    claims: Claims,
    Path(id): Path<String>,
) -> Result<Json<BookResponse>, AppError> {
    let book = find_owned_book(&state, &claims, &id).await?;
    Ok(Json(book.into()))
}
