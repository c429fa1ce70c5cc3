use anyhow::{Context, Result};
use serde::Serialize;
use sqlx::{PgPool, Row};
use uuid::Uuid;

/// One node of a book's two-level concept map. Level 1 rows are roots with no
/// parent; level 2 rows hang off a root via `parent_id`. `order_index` orders
/// siblings.
#[derive(Debug, Clone, Serialize)]
pub struct Concept {
    pub id: String,
    pub book_id: String,
    pub title: String,
    pub description: Option<String>,
    pub parent_id: Option<String>,
    pub level: i32,
    pub order_index: i32,
    pub created_at: String,
}

/// Values for a concept row produced by a generation run. Ids are assigned by
/// the caller so sub-concepts can reference their root before insertion.
#[derive(Debug, Clone)]
pub struct NewConcept {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub parent_id: Option<String>,
    pub level: i32,
    pub order_index: i32,
}

impl NewConcept {
    pub fn root(title: String, description: Option<String>, order_index: i32) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title,
            description,
            parent_id: None,
            level: 1,
            order_index,
        }
    }

    pub fn child(
        parent_id: &str,
        title: String,
        description: Option<String>,
        order_index: i32,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title,
            description,
            parent_id: Some(parent_id.to_string()),
            level: 2,
            order_index,
        }
    }
}

#[derive(Clone)]
pub struct ConceptRepository {
    pool: PgPool,
}

impl ConceptRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Replaces a book's concept map in one transaction: a rerun of the
    /// extraction never leaves old and new nodes mixed together.
    pub async fn replace_for_book(&self, book_id: &str, concepts: &[NewConcept]) -> Result<()> {
        let now = chrono::Utc::now();
        let mut tx = self.pool.begin().await.context("Failed to open transaction")?;

        sqlx::query("DELETE FROM concepts WHERE book_id = $1")
            .bind(book_id)
            .execute(&mut *tx)
            .await
            .context("Failed to delete existing concepts")?;

        for concept in concepts {
            sqlx::query(
                "INSERT INTO concepts
                     (id, book_id, title, description, parent_id, level, order_index, created_at)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
            )
            .bind(&concept.id)
            .bind(book_id)
            .bind(&concept.title)
            .bind(&concept.description)
            .bind(&concept.parent_id)
            .bind(concept.level)
            .bind(concept.order_index)
            .bind(now)
            .execute(&mut *tx)
            .await
            .context("Failed to insert concept")?;
        }

        tx.commit().await.context("Failed to commit concept replacement")?;

        Ok(())
    }

    /// All of a book's concept rows, roots first, siblings in order. The
    /// two-level tree is assembled above the repository.
    pub async fn find_by_book(&self, book_id: &str) -> Result<Vec<Concept>> {
        let rows = sqlx::query(
            "SELECT id, book_id, title, description, parent_id, level, order_index,
                    to_char(created_at, 'YYYY-MM-DD\"T\"HH24:MI:SS\"Z\"') AS created_at
             FROM concepts WHERE book_id = $1
             ORDER BY level ASC, order_index ASC",
        )
        .bind(book_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list concepts")?;

        let concepts = rows
            .iter()
            .map(|row| Concept {
                id: row.get("id"),
                book_id: row.get("book_id"),
                title: row.get("title"),
                description: row.get("description"),
                parent_id: row.get("parent_id"),
                level: row.get("level"),
                order_index: row.get("order_index"),
                created_at: row.get("created_at"),
            })
            .collect();

        Ok(concepts)
    }
}
