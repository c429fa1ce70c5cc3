use serde::{Deserialize, Serialize};

use crate::db::models::review::Review;

#[derive(Debug, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateReviewRequest {
    /// Recall grade on the 0-4 scale.
    pub grade: i32,
}

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ReviewResponse {
    pub id: String,
    pub card_id: String,
    pub grade: i32,
    pub interval_days: i32,
    pub ease_factor: f64,
    pub due_at: String,
    pub reviewed_at: String,
}

impl From<Review> for ReviewResponse {
    fn from(review: Review) -> Self {
        Self {
            id: review.id,
            card_id: review.card_id,
            grade: review.grade,
            interval_days: review.interval_days,
            ease_factor: review.ease_factor,
            due_at: review.due_at,
            reviewed_at: review.reviewed_at,
        }
    }
}

#[derive(Debug, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AnswerRequest {
    pub answer: String,
}

/// Verdict for a submitted MCQ answer plus the review row it produced.
#[derive(Debug, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AnswerResponse {
    pub correct: bool,
    pub correct_answer: String,
    pub review: ReviewResponse,
}
