//! Full backup export and import handlers

use std::sync::Arc;

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use tracing::info;

use crate::{AppError, AppState};
use finsight_core::{
    export::{export_all, import_all},
    DataExport, ImportStats,
};

/// GET /api/export - Every stored record as one JSON document
pub async fn export_full(State(state): State<Arc<AppState>>) -> Result<Response, AppError> {
    let data = export_all(state.advisor.store().as_ref())?;
    let filename = format!(
        "attachment; filename=\"finsight-backup-{}.json\"",
        data.export_date.format("%Y-%m-%d")
    );
    info!(
        transactions = data.transactions.len(),
        budgets = data.budgets.len(),
        "Exported full backup"
    );
    Ok(([(header::CONTENT_DISPOSITION, filename)], Json(data)).into_response())
}

/// POST /api/import - Replace stored data with a backup document
pub async fn import_full(
    State(state): State<Arc<AppState>>,
    Json(data): Json<DataExport>,
) -> Result<Json<ImportStats>, AppError> {
    Ok(Json(import_all(state.advisor.store().as_ref(), &data)?))
}
