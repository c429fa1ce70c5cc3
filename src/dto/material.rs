use serde::Serialize;

use crate::db::models::material::{Material, MaterialStatus};

/// A material as served to clients. The object-store path stays internal.
#[derive(Debug, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct MaterialResponse {
    pub id: String,
    pub book_id: String,
    pub filename: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub pages: Option<i32>,
    pub status: MaterialStatus,
    pub error_message: Option<String>,
    pub created_at: String,
    pub processed_at: Option<String>,
}

impl From<Material> for MaterialResponse {
    fn from(material: Material) -> Self {
        Self {
            id: material.id,
            book_id: material.book_id,
            filename: material.filename,
            content_type: material.content_type,
            size_bytes: material.size_bytes,
            pages: material.pages,
            status: material.status,
            error_message: material.error_message,
            created_at: material.created_at,
            processed_at: material.processed_at,
        }
    }
}

/// Outcome of an explicit reprocessing run.
#[derive(Debug, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ProcessResponse {
    pub chunks_created: usize,
    pub material: MaterialResponse,
}
