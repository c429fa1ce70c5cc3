use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::dto::card::CardResponse;
use crate::errors::AppError;
use crate::middleware::auth::Claims;
use crate::routes::books::find_owned_book;
use crate::services::study;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct GenerateRequest {
    /// How many cards to ask for. Defaults to the configured card count.
    pub count: Option<usize>,
    /// Deck title for the generated cards.
    pub topic: Option<String>,
}

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct GenerateCardsResponse {
    pub deck_id: String,
    pub deck_title: String,
    pub cards: Vec<CardResponse>,
}

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct GenerateConceptsResponse {
    pub concepts_created: usize,
}

#[cfg_attr(feature = "openapi", utoipa::path(post, path = "/api/books/{id}/generate/flashcards", tag = "Generate", security(("bearer_auth" = [])), params(("id" = String, Path, description = "Book ID")), request_body = GenerateRequest, responses((status = 200, body = GenerateCardsResponse))))]
pub async fn flashcards(
    State(state): State<AppState>,
    claims: Claims,
    Path(book_id): Path<String>,
    Json(payload): Json<GenerateRequest>,
) -> Result<Json<GenerateCardsResponse>, AppError> {
    let book = find_owned_book(&state, &claims, &book_id).await?;
    let count = card_count(&state, &payload);

    let generated =
        study::generate_flashcards(&state, &book.id, count, payload.topic.as_deref()).await?;

    Ok(Json(into_response(generated)))
}

#[cfg_attr(feature = "openapi", utoipa::path(post, path = "/api/books/{id}/generate/quiz", tag = "Generate", security(("bearer_auth" = [])), params(("id" = String, Path, description = "Book ID")), request_body = GenerateRequest, responses((status = 200, body = GenerateCardsResponse))))]
pub async fn quiz(
    State(state): State<AppState>,
    claims: Claims,
    Path(book_id): Path<String>,
    Json(payload): Json<GenerateRequest>,
) -> Result<Json<GenerateCardsResponse>, AppError> {
    let book = find_owned_book(&state, &claims, &book_id).await?;
    let count = card_count(&state, &payload);

    let generated =
        study::generate_quiz(&state, &book.id, count, payload.topic.as_deref()).await?;

    Ok(Json(into_response(generated)))
}

#[cfg_attr(feature = "openapi", utoipa::path(post, path = "/api/books/{id}/generate/concepts", tag = "Generate", security(("bearer_auth" = [])), params(("id" = String, Path, description = "Book ID")), responses((status = 200, body = GenerateConceptsResponse))))]
pub async fn concepts(
    State(state): State<AppState>,
    claims: Claims,
    Path(book_id): Path<String>,
) -> Result<Json<GenerateConceptsResponse>, AppError> {
    let book = find_owned_book(&state, &claims, &book_id).await?;

    let concepts_created = study::generate_concepts(&state, &book.id).await?;

    Ok(Json(GenerateConceptsResponse { concepts_created }))
}

fn card_count(state: &AppState, payload: &GenerateRequest) -> usize {
    payload
        .count
        .filter(|&count| count > 0)
        .unwrap_or(state.config.study.default_card_count)
}

fn into_response(generated: study::GeneratedCards) -> GenerateCardsResponse {
    GenerateCardsResponse {
        deck_id: generated.deck.id,
        deck_title: generated.deck.title,
        cards: generated.cards.into_iter().map(|c| c.into()).collect(),
    }
}
