use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

/// One grading action. Rows are append-only; a card's current scheduling
/// state is its most recent review.
#[derive(Debug, Clone, Serialize)]
pub struct Review {
    pub id: String,
    pub card_id: String,
    pub user_id: String,
    pub grade: i32,
    pub interval_days: i32,
    pub ease_factor: f64,
    pub due_at: String,
    pub reviewed_at: String,
    pub created_at: String,
}

#[derive(Clone)]
pub struct ReviewRepository {
    pool: PgPool,
}

impl ReviewRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        &self,
        card_id: &str,
        user_id: &str,
        grade: i32,
        interval_days: i32,
        ease_factor: f64,
        due_at: DateTime<Utc>,
        reviewed_at: DateTime<Utc>,
    ) -> Result<Review> {
        let id = Uuid::new_v4().to_string();
        let now = chrono::Utc::now();

        sqlx::query(
            "INSERT INTO reviews
                 (id, card_id, user_id, grade, interval_days, ease_factor, due_at, reviewed_at, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(&id)
        .bind(card_id)
        .bind(user_id)
        .bind(grade)
        .bind(interval_days)
        .bind(ease_factor)
        .bind(due_at)
        .bind(reviewed_at)
        .bind(now)
        .execute(&self.pool)
        .await
        .context("Failed to insert review")?;

        Ok(Review {
            id,
            card_id: card_id.to_string(),
            user_id: user_id.to_string(),
            grade,
            interval_days,
            ease_factor,
            due_at: due_at.to_rfc3339(),
            reviewed_at: reviewed_at.to_rfc3339(),
            created_at: now.to_rfc3339(),
        })
    }
}
