use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Row};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deck {
    pub id: String,
    pub book_id: String,
    pub title: String,
    pub created_at: String,
}

/// Listing row for a book's decks: card totals plus how many of those cards
/// the caller should study now.
#[derive(Debug, Clone, Serialize)]
pub struct DeckSummary {
    pub id: String,
    pub book_id: String,
    pub title: String,
    pub card_count: i64,
    pub due_count: i64,
    pub created_at: String,
}

#[derive(Clone)]
pub struct DeckRepository {
    pool: PgPool,
}

impl DeckRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find the deck with this title, creating it when absent. Generation
    /// reuses a deck across runs, so repeated generations accumulate cards in
    /// the same place. Safe against concurrent creation thanks to the
    /// `(book_id, title)` unique constraint.
    pub async fn get_or_create(&self, book_id: &str, title: &str) -> Result<Deck> {
        if let Some(deck) = self.find_by_title(book_id, title).await? {
            return Ok(deck);
        }

        let id = Uuid::new_v4().to_string();
        let now = chrono::Utc::now();

        sqlx::query(
            "INSERT INTO decks (id, book_id, title, created_at)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (book_id, title) DO NOTHING",
        )
        .bind(&id)
        .bind(book_id)
        .bind(title)
        .bind(now)
        .execute(&self.pool)
        .await
        .context("Failed to insert deck")?;

        self.find_by_title(book_id, title)
            .await?
            .context("Deck vanished after insert")
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Deck>> {
        let row = sqlx::query(
            "SELECT id, book_id, title,
                    to_char(created_at, 'YYYY-MM-DD\"T\"HH24:MI:SS\"Z\"') AS created_at
             FROM decks WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to query deck")?;

        row.map(|r| Self::map_row(&r)).transpose()
    }

    async fn find_by_title(&self, book_id: &str, title: &str) -> Result<Option<Deck>> {
        let row = sqlx::query(
            "SELECT id, book_id, title,
                    to_char(created_at, 'YYYY-MM-DD\"T\"HH24:MI:SS\"Z\"') AS created_at
             FROM decks WHERE book_id = $1 AND title = $2",
        )
        .bind(book_id)
        .bind(title)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to query deck by title")?;

        row.map(|r| Self::map_row(&r)).transpose()
    }

    /// A book's decks with per-deck card totals. A card counts as due for
    /// `user_id` when its latest review has come due, or when it has never
    /// been reviewed at all.
    pub async fn find_by_book_with_counts(
        &self,
        book_id: &str,
        user_id: &str,
    ) -> Result<Vec<DeckSummary>> {
        let rows = sqlx::query(
            "SELECT d.id, d.book_id, d.title,
                    COUNT(c.id) AS card_count,
                    COUNT(c.id) FILTER (WHERE lr.due_at IS NULL OR lr.due_at <= now()) AS due_count,
                    to_char(d.created_at, 'YYYY-MM-DD\"T\"HH24:MI:SS\"Z\"') AS created_at
             FROM decks d
             LEFT JOIN cards c ON c.deck_id = d.id
             LEFT JOIN LATERAL (
                 SELECT r.due_at FROM reviews r
                 WHERE r.card_id = c.id AND r.user_id = $2
                 ORDER BY r.reviewed_at DESC
                 LIMIT 1
             ) lr ON TRUE
             WHERE d.book_id = $1
             GROUP BY d.id
             ORDER BY d.created_at ASC",
        )
        .bind(book_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list decks")?;

        let decks = rows
            .iter()
            .map(|row| DeckSummary {
                id: row.get("id"),
                book_id: row.get("book_id"),
                title: row.get("title"),
                card_count: row.get("card_count"),
                due_count: row.get("due_count"),
                created_at: row.get("created_at"),
            })
            .collect();

        Ok(decks)
    }

    fn map_row(row: &sqlx::postgres::PgRow) -> Result<Deck> {
        Ok(Deck {
            id: row.try_get("id").context("Failed to get id")?,
            book_id: row.try_get("book_id").context("Failed to get book_id")?,
            title: row.try_get("title").context("Failed to get title")?,
            created_at: row.try_get("created_at").context("Failed to get created_at")?,
        })
    }
}
