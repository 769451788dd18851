//! Dashboard, insight, recommendation and analysis handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{today, user_id, AppError, AppState};
use finsight_core::{
    models::parse_date, Analysis, AnalysisKind, Dashboard, DateWindow, FinancialContext,
    Insight, Period, Recommendation, SpendingBreakdown, TrendOutcome, MAX_TREND_MONTHS,
};

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub llm: bool,
}

/// GET /api/health
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        llm: state.advisor.has_llm(),
    })
}

/// GET /api/dashboard - Current month totals, budget progress, insights
pub async fn get_dashboard(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Dashboard>, AppError> {
    let user = user_id(&headers)?;
    Ok(Json(state.advisor.dashboard(&user, today())?))
}

/// GET /api/insights - Full advisor insight battery
pub async fn list_insights(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<Insight>>, AppError> {
    let user = user_id(&headers)?;
    Ok(Json(state.advisor.insights(&user, today())?))
}

/// GET /api/recommendations
pub async fn list_recommendations(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<Recommendation>>, AppError> {
    let user = user_id(&headers)?;
    Ok(Json(state.advisor.recommendations(&user, today())?))
}

/// Query parameters selecting a reporting window
#[derive(Debug, Default, Deserialize)]
pub struct WindowQuery {
    /// Named period (today, week, month, quarter, year)
    pub period: Option<String>,
    /// Custom window start (YYYY-MM-DD)
    pub from: Option<String>,
    /// Custom window end (YYYY-MM-DD)
    pub to: Option<String>,
}

impl WindowQuery {
    /// Explicit from/to wins over a named period; unknown names mean month
    pub fn resolve(&self) -> Result<Period, AppError> {
        match (&self.from, &self.to) {
            (Some(from), Some(to)) => {
                let start = parse_date(from).map_err(|e| AppError::bad_request(&e))?;
                let end = parse_date(to).map_err(|e| AppError::bad_request(&e))?;
                if start > end {
                    return Err(AppError::bad_request("'from' must not be after 'to'"));
                }
                Ok(Period::Custom { start, end })
            }
            (None, None) => Ok(Period::parse_or_month(self.period.as_deref())),
            _ => Err(AppError::bad_request("Both 'from' and 'to' are required")),
        }
    }
}

/// GET /api/context?period=&from=&to= - Raw context snapshot
pub async fn get_context(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<WindowQuery>,
) -> Result<Json<FinancialContext>, AppError> {
    let user = user_id(&headers)?;
    let window: DateWindow = params.resolve()?.window(today());
    Ok(Json(state.advisor.context(&user, window)?))
}

/// GET /api/analysis/:kind - spending | income | budget | trends
pub async fn get_analysis(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(kind): Path<String>,
) -> Result<Json<Analysis>, AppError> {
    let user = user_id(&headers)?;
    let kind: AnalysisKind = kind
        .parse()
        .map_err(|e: String| AppError::bad_request(&e))?;
    Ok(Json(state.advisor.analysis(&user, kind, today())?))
}

/// GET /api/breakdown?period= - Expenses grouped by category
pub async fn get_breakdown(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<WindowQuery>,
) -> Result<Json<SpendingBreakdown>, AppError> {
    let user = user_id(&headers)?;
    let period = params.resolve()?;
    Ok(Json(state.advisor.breakdown(&user, period, today())?))
}

/// Query parameters for trend comparison
#[derive(Debug, Deserialize)]
pub struct TrendQuery {
    #[serde(default = "default_months")]
    pub months: u32,
}

fn default_months() -> u32 {
    6
}

/// GET /api/trend?months= - Month-over-month comparison
pub async fn get_trend(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<TrendQuery>,
) -> Result<Json<TrendOutcome>, AppError> {
    let user = user_id(&headers)?;
    if params.months == 0 || params.months > MAX_TREND_MONTHS {
        return Err(AppError::bad_request(&format!(
            "months must be between 1 and {}",
            MAX_TREND_MONTHS
        )));
    }
    Ok(Json(state.advisor.trend(&user, params.months, today())?))
}

/// GET /api/report - Downloadable JSON financial report
pub async fn get_report(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let user = user_id(&headers)?;
    let report = state.advisor.report(&user, today())?;
    let disposition = format!("attachment; filename=\"{}\"", report.file_name());

    Ok(([(header::CONTENT_DISPOSITION, disposition)], Json(report)).into_response())
}
