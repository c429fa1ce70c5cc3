use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

use crate::db::models::deck::DeckSummary;
use crate::errors::AppError;
use crate::middleware::auth::Claims;
use crate::routes::books::find_owned_book;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct DeckSummaryResponse {
    pub id: String,
    pub book_id: String,
    pub title: String,
    pub card_count: i64,
    /// Cards due for the caller now, counting never-reviewed cards as due.
    pub due_count: i64,
    pub created_at: String,
}

impl From<DeckSummary> for DeckSummaryResponse {
    fn from(deck: DeckSummary) -> Self {
        Self {
            id: deck.id,
            book_id: deck.book_id,
            title: deck.title,
            card_count: deck.card_count,
            due_count: deck.due_count,
            created_at: deck.created_at,
        }
    }
}

#[cfg_attr(feature = "openapi", utoipa::path(get, path = "/api/books/{id}/decks", tag = "Decks", security(("bearer_auth" = [])), params(("id" = String, Path, description = "Book ID")), responses((status = 200, body = Vec<DeckSummaryResponse>))))]
pub async fn list_decks(
    State(state): State<AppState>,
    claims: Claims,
    Path(book_id): Path<String>,
) -> Result<Json<Vec<DeckSummaryResponse>>, AppError> {
    let book = find_owned_book(&state, &claims, &book_id).await?;
    let decks = state
        .deck_repo
        .find_by_book_with_counts(&book.id, &claims.sub)
        .await?;
    Ok(Json(decks.into_iter().map(|d| d.into()).collect()))
}
