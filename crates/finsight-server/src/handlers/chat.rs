//! Advisor chat handlers

use std::sync::Arc;

use axum::{extract::State, http::HeaderMap, Json};
use serde::{Deserialize, Serialize};

use crate::{today, user_id, AppError, AppState};
use finsight_core::{AdvisorReply, ChatExport, Conversation};

/// Request body for a chat message
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

/// POST /api/chat - Ask the advisor a question
///
/// Answers from the LLM when configured, otherwise (or on LLM failure)
/// from the rule table. A second message while one is pending gets 409.
pub async fn chat(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<ChatRequest>,
) -> Result<Json<AdvisorReply>, AppError> {
    let user = user_id(&headers)?;
    let reply = state.advisor.ask(&user, &req.message, today()).await?;
    Ok(Json(reply))
}

/// GET /api/conversations - Chat history, oldest first
pub async fn list_conversations(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<Conversation>>, AppError> {
    let user = user_id(&headers)?;
    Ok(Json(state.advisor.history(&user)?))
}

/// Response for clearing history
#[derive(Debug, Serialize)]
pub struct ClearResponse {
    pub removed: usize,
}

/// DELETE /api/conversations
pub async fn clear_conversations(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<ClearResponse>, AppError> {
    let user = user_id(&headers)?;
    let removed = state.advisor.clear_history(&user)?;
    Ok(Json(ClearResponse { removed }))
}

/// GET /api/conversations/export
pub async fn export_conversations(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<ChatExport>, AppError> {
    let user = user_id(&headers)?;
    Ok(Json(state.advisor.export_history(&user)?))
}
