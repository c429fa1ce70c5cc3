use axum::{
    extract::{Multipart, Path, State},
    Json,
};

use crate::db::models::material::{Material, MaterialStatus};
use crate::dto::material::{MaterialResponse, ProcessResponse};
use crate::errors::AppError;
use crate::middleware::auth::Claims;
use crate::routes::books::find_owned_book;
use crate::services::pdf;
use crate::services::storage::StorageService;
use crate::services::study;
use crate::state::AppState;

pub const MAX_FILE_SIZE: usize = 50 * 1024 * 1024; // 50 MB

/// Uploads a PDF into a book and processes it within the request: store the
/// bytes, extract the text, chunk, best-effort embed, persist. A processing
/// failure leaves the material row in place with status `failed` so the
/// upload is never lost; `POST /api/materials/{id}/process` retries it.
#[cfg_attr(feature = "openapi", utoipa::path(post, path = "/api/books/{id}/materials", tag = "Materials", security(("bearer_auth" = [])), params(("id" = String, Path, description = "Book ID")), responses((status = 200, body = MaterialResponse))))]
pub async fn upload(
    State(state): State<AppState>,
    claims: Claims,
    Path(book_id): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<MaterialResponse>, AppError> {
    if !state.config.features.pdf_upload_enabled {
        return Err(AppError::FeatureDisabled("PDF upload".to_string()));
    }

    let book = find_owned_book(&state, &claims, &book_id).await?;

    let field = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart data: {e}")))?
        .ok_or_else(|| AppError::Validation("No file provided".to_string()))?;

    let filename = field.file_name().unwrap_or("unnamed.pdf").to_string();
    let content_type = field.content_type().unwrap_or("application/pdf").to_string();

    if !pdf::is_pdf(&content_type, &filename) {
        return Err(AppError::Validation(
            "Only PDF files are supported".to_string(),
        ));
    }

    let data = field
        .bytes()
        .await
        .map_err(|e| AppError::Validation(format!("Failed to read file: {e}")))?;

    if data.is_empty() {
        return Err(AppError::Validation("Uploaded file is empty".to_string()));
    }
    if data.len() > MAX_FILE_SIZE {
        return Err(AppError::Validation(format!(
            "File too large. Maximum size is {} MB",
            MAX_FILE_SIZE / 1024 / 1024
        )));
    }

    let material = state
        .material_repo
        .create(&book.id, &filename, "", "application/pdf", data.len() as i64)
        .await?;

    let key = StorageService::material_key(&claims.sub, &material.id, &filename);
    state
        .storage
        .upload(&key, data.to_vec(), "application/pdf")
        .await?;
    state
        .material_repo
        .update_storage_path(&material.id, &key)
        .await?;

    let material = require_material(&state, &material.id).await?;
    run_pipeline(&state, &material).await;

    let material = require_material(&state, &material.id).await?;
    Ok(Json(material.into()))
}

#[cfg_attr(feature = "openapi", utoipa::path(get, path = "/api/books/{id}/materials", tag = "Materials", security(("bearer_auth" = [])), params(("id" = String, Path, description = "Book ID")), responses((status = 200, body = Vec<MaterialResponse>))))]
pub async fn list_materials(
    State(state): State<AppState>,
    claims: Claims,
    Path(book_id): Path<String>,
) -> Result<Json<Vec<MaterialResponse>>, AppError> {
    let book = find_owned_book(&state, &claims, &book_id).await?;
    let materials = state.material_repo.find_by_book(&book.id).await?;
    Ok(Json(materials.into_iter().map(|m| m.into()).collect()))
}

/// Reruns the processing pipeline for a material, replacing its chunks. The
/// retry path for uploads whose extraction or embedding run failed.
#[cfg_attr(feature = "openapi", utoipa::path(post, path = "/api/materials/{id}/process", tag = "Materials", security(("bearer_auth" = [])), params(("id" = String, Path, description = "Material ID")), responses((status = 200, body = ProcessResponse))))]
pub async fn process(
    State(state): State<AppState>,
    claims: Claims,
    Path(id): Path<String>,
) -> Result<Json<ProcessResponse>, AppError> {
    let material = find_owned_material(&state, &claims, &id).await?;

    let chunks_created = match study::process_material(&state, &material).await {
        Ok(count) => count,
        Err(e) => {
            let msg = format!("{e:#}");
            state
                .material_repo
                .update_status(&material.id, &MaterialStatus::Failed, Some(&msg))
                .await?;
            tracing::error!(material_id = %material.id, "Processing failed: {msg}");
            return Err(AppError::Internal(e));
        }
    };

    let material = require_material(&state, &id).await?;

    Ok(Json(ProcessResponse {
        chunks_created,
        material: material.into(),
    }))
}

#[cfg_attr(feature = "openapi", utoipa::path(delete, path = "/api/materials/{id}", tag = "Materials", security(("bearer_auth" = [])), params(("id" = String, Path, description = "Material ID")), responses((status = 200))))]
pub async fn delete_material(
    State(state): State<AppState>,
    claims: Claims,
    Path(id): Path<String>,
) -> Result<(), AppError> {
    let material = find_owned_material(&state, &claims, &id).await?;

    if !material.storage_path.is_empty() {
        state.storage.delete(&material.storage_path).await?;
    }

    // Chunks go with the material via ON DELETE CASCADE.
    state.material_repo.delete(&material.id).await?;

    Ok(())
}

/// Runs the pipeline for a freshly uploaded material, recording failure on
/// the row instead of failing the upload.
async fn run_pipeline(state: &AppState, material: &Material) {
    if let Err(e) = study::process_material(state, material).await {
        let msg = format!("{e:#}");
        tracing::error!(material_id = %material.id, "Processing failed: {msg}");
        if let Err(e) = state
            .material_repo
            .update_status(&material.id, &MaterialStatus::Failed, Some(&msg))
            .await
        {
            tracing::error!(material_id = %material.id, "Failed to record failure: {e:#}");
        }
    }
}

async fn find_owned_material(
    state: &AppState,
    claims: &Claims,
    id: &str,
) -> Result<Material, AppError> {
    let material = require_material(state, id).await?;
    find_owned_book(state, claims, &material.book_id).await?;
    Ok(material)
}

async fn require_material(state: &AppState, id: &str) -> Result<Material, AppError> {
    state
        .material_repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Material not found".to_string()))
}
