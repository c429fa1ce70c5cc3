use axum::{
    extract::{Path, State},
    Json,
};

use crate::db::models::card::{Card, CardType};
use crate::dto::review::{AnswerRequest, AnswerResponse, CreateReviewRequest, ReviewResponse};
use crate::errors::AppError;
use crate::middleware::auth::Claims;
use crate::routes::books::find_owned_book;
use crate::services::scheduler;
use crate::state::AppState;

/// Records one grading action. Reviews are append-only: the card's current
/// scheduling state is always the row written here.
#[cfg_attr(feature = "openapi", utoipa::path(post, path = "/api/cards/{id}/reviews", tag = "Reviews", security(("bearer_auth" = [])), params(("id" = String, Path, description = "Card ID")), request_body = CreateReviewRequest, responses((status = 200, body = ReviewResponse))))]
pub async fn create_review(
    State(state): State<AppState>,
    claims: Claims,
    Path(card_id): Path<String>,
    Json(payload): Json<CreateReviewRequest>,
) -> Result<Json<ReviewResponse>, AppError> {
    if !(0..=4).contains(&payload.grade) {
        return Err(AppError::Validation(
            "Grade must be between 0 and 4".to_string(),
        ));
    }

    let card = find_owned_card(&state, &claims, &card_id).await?;

    let now = chrono::Utc::now();
    let schedule = scheduler::schedule_review(payload.grade, now);

    let review = state
        .review_repo
        .create(
            &card.id,
            &claims.sub,
            payload.grade,
            schedule.interval_days,
            schedule.ease_factor,
            schedule.due_at,
            now,
        )
        .await?;

    Ok(Json(review.into()))
}

/// Checks a submitted MCQ answer against the stored one and records the
/// resulting review (correct answers push the card a week out, wrong ones
/// bring it back tomorrow).
#[cfg_attr(feature = "openapi", utoipa::path(post, path = "/api/cards/{id}/answer", tag = "Reviews", security(("bearer_auth" = [])), params(("id" = String, Path, description = "Card ID")), request_body = AnswerRequest, responses((status = 200, body = AnswerResponse))))]
pub async fn answer_card(
    State(state): State<AppState>,
    claims: Claims,
    Path(card_id): Path<String>,
    Json(payload): Json<AnswerRequest>,
) -> Result<Json<AnswerResponse>, AppError> {
    let card = find_owned_card(&state, &claims, &card_id).await?;

    if card.card_type != CardType::Mcq {
        return Err(AppError::Validation(
            "Only multiple-choice cards accept answers".to_string(),
        ));
    }

    let correct = payload.answer.trim() == card.answer.trim();

    let now = chrono::Utc::now();
    let outcome = scheduler::grade_quiz_answer(correct, now);

    let review = state
        .review_repo
        .create(
            &card.id,
            &claims.sub,
            outcome.grade,
            outcome.schedule.interval_days,
            outcome.schedule.ease_factor,
            outcome.schedule.due_at,
            now,
        )
        .await?;

    Ok(Json(AnswerResponse {
        correct,
        correct_answer: card.answer,
        review: review.into(),
    }))
}

async fn find_owned_card(
    state: &AppState,
    claims: &Claims,
    card_id: &str,
) -> Result<Card, AppError> {
    let card = state
        .card_repo
        .find_by_id(card_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Card not found".to_string()))?;
    find_owned_book(state, claims, &card.book_id).await?;
    Ok(card)
}
