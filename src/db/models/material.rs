use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Row};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Material {
    pub id: String,
    pub book_id: String,
    pub filename: String,
    pub storage_path: String,
    pub content_type: String,
    pub size_bytes: i64,
    /// Synthetic page count derived from the chunk windows, set once
    /// processing succeeds.
    pub pages: Option<i32>,
    pub status: MaterialStatus,
    pub error_message: Option<String>,
    pub created_at: String,
    pub processed_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum MaterialStatus {
    Uploading,
    Processing,
    Ready,
    Failed,
}

impl std::fmt::Display for MaterialStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MaterialStatus::Uploading => write!(f, "uploading"),
            MaterialStatus::Processing => write!(f, "processing"),
            MaterialStatus::Ready => write!(f, "ready"),
            MaterialStatus::Failed => write!(f, "failed"),
        }
    }
}

impl TryFrom<&str> for MaterialStatus {
    type Error = anyhow::Error;
    fn try_from(value: &str) -> Result<Self> {
        match value {
            "uploading" => Ok(MaterialStatus::Uploading),
            "processing" => Ok(MaterialStatus::Processing),
            "ready" => Ok(MaterialStatus::Ready),
            "failed" => Ok(MaterialStatus::Failed),
            other => Err(anyhow::anyhow!("Invalid material status: {other}")),
        }
    }
}

#[derive(Clone)]
pub struct MaterialRepository {
    pool: PgPool,
}

impl MaterialRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        book_id: &str,
        filename: &str,
        storage_path: &str,
        content_type: &str,
        size_bytes: i64,
    ) -> Result<Material> {
        let id = Uuid::new_v4().to_string();
        let now = chrono::Utc::now();

        sqlx::query(
            "INSERT INTO materials
                 (id, book_id, filename, storage_path, content_type, size_bytes, status, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(&id)
        .bind(book_id)
        .bind(filename)
        .bind(storage_path)
        .bind(content_type)
        .bind(size_bytes)
        .bind("uploading")
        .bind(now)
        .execute(&self.pool)
        .await
        .context("Failed to insert material")?;

        Ok(Material {
            id,
            book_id: book_id.to_string(),
            filename: filename.to_string(),
            storage_path: storage_path.to_string(),
            content_type: content_type.to_string(),
            size_bytes,
            pages: None,
            status: MaterialStatus::Uploading,
            error_message: None,
            created_at: now.to_rfc3339(),
            processed_at: None,
        })
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Material>> {
        let row = sqlx::query(
            "SELECT id, book_id, filename, storage_path, content_type, size_bytes, pages,
                    status, error_message,
                    to_char(created_at, 'YYYY-MM-DD\"T\"HH24:MI:SS\"Z\"') AS created_at,
                    to_char(processed_at, 'YYYY-MM-DD\"T\"HH24:MI:SS\"Z\"') AS processed_at
             FROM materials WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to query material")?;

        row.map(|r| Self::map_row(&r)).transpose()
    }

    pub async fn find_by_book(&self, book_id: &str) -> Result<Vec<Material>> {
        let rows = sqlx::query(
            "SELECT id, book_id, filename, storage_path, content_type, size_bytes, pages,
                    status, error_message,
                    to_char(created_at, 'YYYY-MM-DD\"T\"HH24:MI:SS\"Z\"') AS created_at,
                    to_char(processed_at, 'YYYY-MM-DD\"T\"HH24:MI:SS\"Z\"') AS processed_at
             FROM materials WHERE book_id = $1 ORDER BY created_at DESC",
        )
        .bind(book_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list materials")?;

        rows.iter().map(|r| Self::map_row(r)).collect()
    }

    /// The object key embeds the material id, so the row is inserted first
    /// and the key filled in once the upload lands.
    pub async fn update_storage_path(&self, id: &str, storage_path: &str) -> Result<()> {
        sqlx::query("UPDATE materials SET storage_path = $1 WHERE id = $2")
            .bind(storage_path)
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to update material storage path")?;
        Ok(())
    }

    pub async fn update_status(
        &self,
        id: &str,
        status: &MaterialStatus,
        error_message: Option<&str>,
    ) -> Result<()> {
        let now = chrono::Utc::now();
        let processed_at: Option<chrono::DateTime<chrono::Utc>> =
            if *status == MaterialStatus::Ready || *status == MaterialStatus::Failed {
                Some(now)
            } else {
                None
            };

        sqlx::query(
            "UPDATE materials SET status = $1, error_message = $2, processed_at = $3 WHERE id = $4",
        )
        .bind(status.to_string())
        .bind(error_message)
        .bind(processed_at)
        .bind(id)
        .execute(&self.pool)
        .await
        .context("Failed to update material status")?;

        Ok(())
    }

    pub async fn update_pages(&self, id: &str, pages: i32) -> Result<()> {
        sqlx::query("UPDATE materials SET pages = $1 WHERE id = $2")
            .bind(pages)
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to update material pages")?;
        Ok(())
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        sqlx::query("DELETE FROM materials WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete material")?;

        Ok(())
    }

    fn map_row(row: &sqlx::postgres::PgRow) -> Result<Material> {
        let status_str: String = row.try_get("status").context("Failed to get status")?;
        let status = MaterialStatus::try_from(status_str.as_str())?;

        Ok(Material {
            id: row.try_get("id").context("Failed to get id")?,
            book_id: row.try_get("book_id").context("Failed to get book_id")?,
            filename: row.try_get("filename").context("Failed to get filename")?,
            storage_path: row
                .try_get("storage_path")
                .context("Failed to get storage_path")?,
            content_type: row
                .try_get("content_type")
                .context("Failed to get content_type")?,
            size_bytes: row.try_get("size_bytes").context("Failed to get size_bytes")?,
            pages: row.try_get("pages").context("Failed to get pages")?,
            status,
            error_message: row
                .try_get("error_message")
                .context("Failed to get error_message")?,
            created_at: row.try_get("created_at").context("Failed to get created_at")?,
            processed_at: row
                .try_get("processed_at")
                .context("Failed to get processed_at")?,
        })
    }
}
