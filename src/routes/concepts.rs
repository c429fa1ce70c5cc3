use axum::{
    extract::{Path, State},
    Json,
};

use crate::dto::concept::ConceptTreeNode;
use crate::errors::AppError;
use crate::middleware::auth::Claims;
use crate::routes::books::find_owned_book;
use crate::state::AppState;

/// The book's stored concept map as a two-level tree. An empty list means no
/// extraction has run yet.
#[cfg_attr(feature = "openapi", utoipa::path(get, path = "/api/books/{id}/concepts", tag = "Concepts", security(("bearer_auth" = [])), params(("id" = String, Path, description = "Book ID")), responses((status = 200, body = Vec<ConceptTreeNode>))))]
pub async fn list_concepts(
    State(state): State<AppState>,
    claims: Claims,
    Path(book_id): Path<String>,
) -> Result<Json<Vec<ConceptTreeNode>>, AppError> {
    let book = find_owned_book(&state, &claims, &book_id).await?;
    let rows = state.concept_repo.find_by_book(&book.id).await?;
    Ok(Json(ConceptTreeNode::from_rows(rows)))
}
