//! Advisor settings handlers

use std::sync::Arc;

use axum::{extract::State, http::HeaderMap, Json};

use crate::{user_id, AppError, AppState};
use finsight_core::AiSettings;

/// GET /api/settings - Advisor preferences (defaults when never saved)
pub async fn get_settings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<AiSettings>, AppError> {
    let user = user_id(&headers)?;
    Ok(Json(state.advisor.store().ai_settings(&user)?))
}

/// PUT /api/settings
pub async fn save_settings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(settings): Json<AiSettings>,
) -> Result<Json<AiSettings>, AppError> {
    let user = user_id(&headers)?;
    state.advisor.store().save_ai_settings(&user, &settings)?;
    Ok(Json(settings))
}
