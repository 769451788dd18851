//! Transaction handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{today, user_id, AppError, AppState, SuccessResponse};
use finsight_core::{
    export, NewTransaction, Period, Transaction, TransactionFilter, TransactionType,
};

/// Maximum page size for transaction listing
const MAX_LIST_LIMIT: usize = 1000;

/// Query parameters for listing transactions
#[derive(Debug, Deserialize)]
pub struct TransactionQuery {
    /// Most recent N (by date); all when absent
    pub limit: Option<usize>,
    /// Search text (description, category name, amount)
    pub q: Option<String>,
    /// income or expense
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// Category id
    pub category: Option<String>,
    /// today, week, month, quarter or year
    pub period: Option<String>,
}

/// GET /api/transactions - Filtered, most recent first
pub async fn list_transactions(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<TransactionQuery>,
) -> Result<Json<Vec<Transaction>>, AppError> {
    let user = user_id(&headers)?;

    let kind = match params.kind.as_deref().filter(|k| !k.is_empty()) {
        Some(raw) => Some(raw.parse::<TransactionType>().map_err(|e| AppError::bad_request(&e))?),
        None => None,
    };
    let period = match params.period.as_deref().filter(|p| !p.is_empty()) {
        Some(raw) => Some(raw.parse::<Period>().map_err(|e| AppError::bad_request(&e))?),
        None => None,
    };

    let store = state.advisor.store();
    let all = store.list_transactions(&user)?;
    let mut matched = TransactionFilter::new()
        .search(params.q.as_deref())
        .kind(kind)
        .category(params.category.as_deref())
        .period(period)
        .apply(&all, &store.list_categories()?, today());
    matched.truncate(params.limit.unwrap_or(matched.len()).min(MAX_LIST_LIMIT));
    Ok(Json(matched))
}

/// POST /api/transactions
pub async fn create_transaction(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(new): Json<NewTransaction>,
) -> Result<(StatusCode, Json<Transaction>), AppError> {
    let user = user_id(&headers)?;
    let tx = state.advisor.store().create_transaction(&user, &new)?;
    Ok((StatusCode::CREATED, Json(tx)))
}

/// PUT /api/transactions/:id
pub async fn update_transaction(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(changes): Json<NewTransaction>,
) -> Result<Json<Transaction>, AppError> {
    let user = user_id(&headers)?;
    let tx = state.advisor.store().update_transaction(&user, &id, &changes)?;
    Ok(Json(tx))
}

/// DELETE /api/transactions/:id
pub async fn delete_transaction(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, AppError> {
    let user = user_id(&headers)?;
    state.advisor.store().delete_transaction(&user, &id)?;
    Ok(Json(SuccessResponse { success: true }))
}

/// GET /api/transactions/export - CSV download
pub async fn export_transactions(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let user = user_id(&headers)?;
    let store = state.advisor.store();
    let transactions = store.list_transactions(&user)?;
    let csv = export::transactions_to_csv(&transactions, &store.list_categories()?)?;

    info!(user = %user, count = transactions.len(), "Exported transactions");

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"transactions.csv\"",
            ),
        ],
        csv,
    )
        .into_response())
}

/// Request body for importing transactions
#[derive(Debug, Deserialize)]
pub struct ImportTransactionsRequest {
    pub transactions: Vec<NewTransaction>,
}

/// Response for transaction import
#[derive(Debug, Serialize)]
pub struct ImportTransactionsResponse {
    pub imported: usize,
}

/// POST /api/transactions/import - Append transactions for the caller
pub async fn import_transactions(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<ImportTransactionsRequest>,
) -> Result<Json<ImportTransactionsResponse>, AppError> {
    let user = user_id(&headers)?;
    let imported =
        export::import_transactions(state.advisor.store().as_ref(), &user, req.transactions)?;
    Ok(Json(ImportTransactionsResponse { imported }))
}
