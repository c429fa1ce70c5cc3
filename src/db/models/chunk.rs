use anyhow::{Context, Result};
use serde::Serialize;
use sqlx::{PgPool, Row};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct Chunk {
    pub id: String,
    pub material_id: String,
    pub book_id: String,
    pub page_from: i32,
    pub page_to: i32,
    pub topic: Option<String>,
    pub difficulty: i32,
    pub text: String,
    /// JSON-serialized embedding vector, absent when the embedding pass was
    /// skipped or failed.
    pub embedding: Option<String>,
    pub created_at: String,
}

/// Row values for a chunk about to be inserted by the processing pipeline.
#[derive(Debug, Clone)]
pub struct NewChunk {
    pub page_from: i32,
    pub page_to: i32,
    pub topic: String,
    pub difficulty: i32,
    pub text: String,
    pub embedding: Option<String>,
}

#[derive(Clone)]
pub struct ChunkRepository {
    pool: PgPool,
}

impl ChunkRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_batch(
        &self,
        material_id: &str,
        book_id: &str,
        chunks: &[NewChunk],
    ) -> Result<()> {
        let now = chrono::Utc::now();

        for chunk in chunks {
            let id = Uuid::new_v4().to_string();
            sqlx::query(
                "INSERT INTO chunks
                     (id, material_id, book_id, page_from, page_to, topic, difficulty, text, embedding, created_at)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
            )
            .bind(&id)
            .bind(material_id)
            .bind(book_id)
            .bind(chunk.page_from)
            .bind(chunk.page_to)
            .bind(&chunk.topic)
            .bind(chunk.difficulty)
            .bind(&chunk.text)
            .bind(&chunk.embedding)
            .bind(now)
            .execute(&self.pool)
            .await
            .context("Failed to insert chunk")?;
        }

        Ok(())
    }

    /// Chunks for a generation prompt, in reading order, capped so the
    /// context stays within what the gateway accepts.
    pub async fn find_by_book(&self, book_id: &str, limit: i64) -> Result<Vec<Chunk>> {
        let rows = sqlx::query(
            "SELECT id, material_id, book_id, page_from, page_to, topic, difficulty, text, embedding,
                    to_char(created_at, 'YYYY-MM-DD\"T\"HH24:MI:SS\"Z\"') AS created_at
             FROM chunks WHERE book_id = $1
             ORDER BY page_from ASC
             LIMIT $2",
        )
        .bind(book_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("Failed to find chunks by book")?;

        let chunks = rows.iter().map(Self::map_row).collect();

        Ok(chunks)
    }

    /// Every chunk of a book in reading order. Concept extraction wants the
    /// whole text; the caller truncates, not the query.
    pub async fn find_all_by_book(&self, book_id: &str) -> Result<Vec<Chunk>> {
        let rows = sqlx::query(
            "SELECT id, material_id, book_id, page_from, page_to, topic, difficulty, text, embedding,
                    to_char(created_at, 'YYYY-MM-DD\"T\"HH24:MI:SS\"Z\"') AS created_at
             FROM chunks WHERE book_id = $1
             ORDER BY page_from ASC, created_at ASC",
        )
        .bind(book_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list chunks by book")?;

        let chunks = rows.iter().map(Self::map_row).collect();

        Ok(chunks)
    }

    pub async fn delete_by_material(&self, material_id: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM chunks WHERE material_id = $1")
            .bind(material_id)
            .execute(&self.pool)
            .await
            .context("Failed to delete chunks by material")?;

        Ok(result.rows_affected())
    }

    fn map_row(row: &sqlx::postgres::PgRow) -> Chunk {
        Chunk {
            id: row.get("id"),
            material_id: row.get("material_id"),
            book_id: row.get("book_id"),
            page_from: row.get("page_from"),
            page_to: row.get("page_to"),
            topic: row.get("topic"),
            difficulty: row.get("difficulty"),
            text: row.get("text"),
            embedding: row.get("embedding"),
            created_at: row.get("created_at"),
        }
    }
}
