//! Budget handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};

use crate::{user_id, AppError, AppState, SuccessResponse};
use finsight_core::{Budget, NewBudget};

/// GET /api/budgets
pub async fn list_budgets(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<Budget>>, AppError> {
    let user = user_id(&headers)?;
    Ok(Json(state.advisor.store().list_budgets(&user)?))
}

/// POST /api/budgets - Create or replace the budget for a category
pub async fn set_budget(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(new): Json<NewBudget>,
) -> Result<Json<Budget>, AppError> {
    let user = user_id(&headers)?;
    Ok(Json(state.advisor.store().set_budget(&user, &new)?))
}

/// DELETE /api/budgets/:id
pub async fn delete_budget(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, AppError> {
    let user = user_id(&headers)?;
    state.advisor.store().delete_budget(&user, &id)?;
    Ok(Json(SuccessResponse { success: true }))
}
