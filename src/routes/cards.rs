use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use crate::db::models::card::CardType;
use crate::dto::card::StudyCardResponse;
use crate::errors::AppError;
use crate::middleware::auth::Claims;
use crate::routes::books::find_owned_book;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct CardListQuery {
    /// Optional filter: "flashcard" or "mcq".
    pub card_type: Option<String>,
}

#[cfg_attr(feature = "openapi", utoipa::path(get, path = "/api/decks/{id}/cards", tag = "Cards", security(("bearer_auth" = [])), params(("id" = String, Path, description = "Deck ID"), ("card_type" = Option<String>, Query, description = "Filter by card type")), responses((status = 200, body = Vec<StudyCardResponse>))))]
pub async fn list_cards(
    State(state): State<AppState>,
    claims: Claims,
    Path(deck_id): Path<String>,
    Query(query): Query<CardListQuery>,
) -> Result<Json<Vec<StudyCardResponse>>, AppError> {
    let deck = state
        .deck_repo
        .find_by_id(&deck_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Deck not found".to_string()))?;
    find_owned_book(&state, &claims, &deck.book_id).await?;

    let card_type = query
        .card_type
        .as_deref()
        .map(CardType::try_from)
        .transpose()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let cards = state.card_repo.find_by_deck(&deck.id, card_type).await?;

    Ok(Json(cards.into_iter().map(StudyCardResponse::new).collect()))
}
