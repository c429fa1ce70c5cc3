use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Row};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub author: Option<String>,
    pub created_at: String,
}

/// Listing row for the library view: the book plus how many materials have
/// been uploaded into it.
#[derive(Debug, Clone, Serialize)]
pub struct BookSummary {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub author: Option<String>,
    pub material_count: i64,
    pub created_at: String,
}

#[derive(Clone)]
pub struct BookRepository {
    pool: PgPool,
}

impl BookRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, user_id: &str, title: &str, author: Option<&str>) -> Result<Book> {
        let id = Uuid::new_v4().to_string();
        let now = chrono::Utc::now();

        sqlx::query(
            "INSERT INTO books (id, user_id, title, author, created_at)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(&id)
        .bind(user_id)
        .bind(title)
        .bind(author)
        .bind(now)
        .execute(&self.pool)
        .await
        .context("Failed to insert book")?;

        Ok(Book {
            id,
            user_id: user_id.to_string(),
            title: title.to_string(),
            author: author.map(str::to_string),
            created_at: now.to_rfc3339(),
        })
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Book>> {
        let row = sqlx::query(
            "SELECT id, user_id, title, author,
                    to_char(created_at, 'YYYY-MM-DD\"T\"HH24:MI:SS\"Z\"') AS created_at
             FROM books WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to query book")?;

        row.map(|r| Self::map_row(&r)).transpose()
    }

    pub async fn find_by_user(&self, user_id: &str) -> Result<Vec<BookSummary>> {
        let rows = sqlx::query(
            "SELECT b.id, b.user_id, b.title, b.author,
                    COUNT(m.id) AS material_count,
                    to_char(b.created_at, 'YYYY-MM-DD\"T\"HH24:MI:SS\"Z\"') AS created_at
             FROM books b
             LEFT JOIN materials m ON m.book_id = b.id
             WHERE b.user_id = $1
             GROUP BY b.id
             ORDER BY b.created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list books")?;

        let books = rows
            .iter()
            .map(|row| BookSummary {
                id: row.get("id"),
                user_id: row.get("user_id"),
                title: row.get("title"),
                author: row.get("author"),
                material_count: row.get("material_count"),
                created_at: row.get("created_at"),
            })
            .collect();

        Ok(books)
    }

    fn map_row(row: &sqlx::postgres::PgRow) -> Result<Book> {
        Ok(Book {
            id: row.try_get("id").context("Failed to get id")?,
            user_id: row.try_get("user_id").context("Failed to get user_id")?,
            title: row.try_get("title").context("Failed to get title")?,
            author: row.try_get("author").context("Failed to get author")?,
            created_at: row.try_get("created_at").context("Failed to get created_at")?,
        })
    }
}
