//! Category handlers
//!
//! Categories are shared by every user. The seeded defaults are read-only.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{AppError, AppState, SuccessResponse};
use finsight_core::{Category, NewCategory};

/// GET /api/categories
pub async fn list_categories(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Category>>, AppError> {
    Ok(Json(state.advisor.store().list_categories()?))
}

/// POST /api/categories
pub async fn create_category(
    State(state): State<Arc<AppState>>,
    Json(new): Json<NewCategory>,
) -> Result<(StatusCode, Json<Category>), AppError> {
    let category = state.advisor.store().create_category(&new)?;
    Ok((StatusCode::CREATED, Json(category)))
}

/// PUT /api/categories/:id
pub async fn update_category(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(changes): Json<NewCategory>,
) -> Result<Json<Category>, AppError> {
    Ok(Json(state.advisor.store().update_category(&id, &changes)?))
}

/// DELETE /api/categories/:id
pub async fn delete_category(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.advisor.store().delete_category(&id)?;
    Ok(Json(SuccessResponse { success: true }))
}
