use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Row};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Card {
    pub id: String,
    pub deck_id: String,
    pub book_id: String,
    pub card_type: CardType,
    pub question: String,
    pub answer: String,
    /// Wrong options for MCQ cards; empty for flashcards.
    pub distractors: Vec<String>,
    pub difficulty: i32,
    /// Ids of the chunks the generator cited for this card.
    pub source_chunk_ids: Vec<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum CardType {
    Flashcard,
    Mcq,
}

impl std::fmt::Display for CardType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CardType::Flashcard => write!(f, "flashcard"),
            CardType::Mcq => write!(f, "mcq"),
        }
    }
}

impl TryFrom<&str> for CardType {
    type Error = anyhow::Error;
    fn try_from(value: &str) -> Result<Self> {
        match value {
            "flashcard" => Ok(CardType::Flashcard),
            "mcq" => Ok(CardType::Mcq),
            other => Err(anyhow::anyhow!("Invalid card type: {other}")),
        }
    }
}

/// Values for a card about to be inserted from a generation run.
#[derive(Debug, Clone)]
pub struct NewCard {
    pub card_type: CardType,
    pub question: String,
    pub answer: String,
    pub distractors: Vec<String>,
    pub difficulty: i32,
    pub source_chunk_ids: Vec<String>,
}

#[derive(Clone)]
pub struct CardRepository {
    pool: PgPool,
}

impl CardRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_batch(
        &self,
        deck_id: &str,
        book_id: &str,
        cards: Vec<NewCard>,
    ) -> Result<Vec<Card>> {
        let now = chrono::Utc::now();
        let mut inserted = Vec::with_capacity(cards.len());

        for card in cards {
            let id = Uuid::new_v4().to_string();
            sqlx::query(
                "INSERT INTO cards
                     (id, deck_id, book_id, card_type, question, answer, distractors,
                      difficulty, source_chunk_ids, created_at)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
            )
            .bind(&id)
            .bind(deck_id)
            .bind(book_id)
            .bind(card.card_type.to_string())
            .bind(&card.question)
            .bind(&card.answer)
            .bind(&card.distractors)
            .bind(card.difficulty)
            .bind(&card.source_chunk_ids)
            .bind(now)
            .execute(&self.pool)
            .await
            .context("Failed to insert card")?;

            inserted.push(Card {
                id,
                deck_id: deck_id.to_string(),
                book_id: book_id.to_string(),
                card_type: card.card_type,
                question: card.question,
                answer: card.answer,
                distractors: card.distractors,
                difficulty: card.difficulty,
                source_chunk_ids: card.source_chunk_ids,
                created_at: now.to_rfc3339(),
            });
        }

        Ok(inserted)
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Card>> {
        let row = sqlx::query(
            "SELECT id, deck_id, book_id, card_type, question, answer, distractors,
                    difficulty, source_chunk_ids,
                    to_char(created_at, 'YYYY-MM-DD\"T\"HH24:MI:SS\"Z\"') AS created_at
             FROM cards WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to query card")?;

        row.map(|r| Self::map_row(&r)).transpose()
    }

    pub async fn find_by_deck(
        &self,
        deck_id: &str,
        card_type: Option<CardType>,
    ) -> Result<Vec<Card>> {
        let rows = match card_type {
            Some(card_type) => {
                sqlx::query(
                    "SELECT id, deck_id, book_id, card_type, question, answer, distractors,
                            difficulty, source_chunk_ids,
                            to_char(created_at, 'YYYY-MM-DD\"T\"HH24:MI:SS\"Z\"') AS created_at
                     FROM cards WHERE deck_id = $1 AND card_type = $2
                     ORDER BY created_at ASC",
                )
                .bind(deck_id)
                .bind(card_type.to_string())
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query(
                    "SELECT id, deck_id, book_id, card_type, question, answer, distractors,
                            difficulty, source_chunk_ids,
                            to_char(created_at, 'YYYY-MM-DD\"T\"HH24:MI:SS\"Z\"') AS created_at
                     FROM cards WHERE deck_id = $1
                     ORDER BY created_at ASC",
                )
                .bind(deck_id)
                .fetch_all(&self.pool)
                .await
            }
        }
        .context("Failed to list cards")?;

        rows.iter().map(|r| Self::map_row(r)).collect()
    }

    fn map_row(row: &sqlx::postgres::PgRow) -> Result<Card> {
        let type_str: String = row.try_get("card_type").context("Failed to get card_type")?;
        let card_type = CardType::try_from(type_str.as_str())?;

        Ok(Card {
            id: row.try_get("id").context("Failed to get id")?,
            deck_id: row.try_get("deck_id").context("Failed to get deck_id")?,
            book_id: row.try_get("book_id").context("Failed to get book_id")?,
            card_type,
            question: row.try_get("question").context("Failed to get question")?,
            answer: row.try_get("answer").context("Failed to get answer")?,
            distractors: row.try_get("distractors").context("Failed to get distractors")?,
            difficulty: row.try_get("difficulty").context("Failed to get difficulty")?,
            source_chunk_ids: row
                .try_get("source_chunk_ids")
                .context("Failed to get source_chunk_ids")?,
            created_at: row.try_get("created_at").context("Failed to get created_at")?,
        })
    }
}
