//! Finsight Web Server
//!
//! Axum-based REST API over the Finsight advisor.
//!
//! - Every request is scoped to the user named in `X-Finsight-User`
//!   (`local` when absent)
//! - Restrictive CORS policy
//! - Core errors mapped to HTTP status codes with sanitized messages

use std::sync::Arc;

use axum::{
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use chrono::NaiveDate;
use serde::Serialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};

use finsight_core::Advisor;

mod handlers;

/// Header carrying the acting user id
pub const USER_HEADER: &str = "x-finsight-user";

/// User id when no header is sent
pub const DEFAULT_USER: &str = "local";

/// Longest accepted user id
const MAX_USER_ID_LEN: usize = 64;

/// Server configuration
#[derive(Clone, Default)]
pub struct ServerConfig {
    /// Allowed CORS origins (empty = same-origin only)
    pub allowed_origins: Vec<String>,
}

/// Shared application state
pub struct AppState {
    pub advisor: Advisor,
}

/// Resolve the acting user from request headers
pub fn user_id(headers: &HeaderMap) -> Result<String, AppError> {
    let Some(value) = headers.get(USER_HEADER) else {
        return Ok(DEFAULT_USER.to_string());
    };
    let user = value
        .to_str()
        .map_err(|_| AppError::bad_request("Invalid user header"))?
        .trim();
    if user.is_empty() {
        return Ok(DEFAULT_USER.to_string());
    }
    if user.len() > MAX_USER_ID_LEN {
        return Err(AppError::bad_request("User id too long"));
    }
    Ok(user.to_string())
}

/// The server's notion of today
pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// Success response
#[derive(Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Create the application router
pub fn create_router(advisor: Advisor, config: ServerConfig) -> Router {
    if advisor.has_llm() {
        info!("LLM backend configured, rule-based advice used as fallback");
    } else {
        info!("ℹ️  LLM not configured (set FINSIGHT_LLM_API_KEY), using rule-based advice");
    }

    let state = Arc::new(AppState { advisor });

    let api_routes = Router::new()
        .route("/health", get(handlers::health))
        // Advice
        .route("/dashboard", get(handlers::get_dashboard))
        .route("/insights", get(handlers::list_insights))
        .route("/recommendations", get(handlers::list_recommendations))
        .route("/context", get(handlers::get_context))
        .route("/analysis/:kind", get(handlers::get_analysis))
        .route("/breakdown", get(handlers::get_breakdown))
        .route("/trend", get(handlers::get_trend))
        .route("/report", get(handlers::get_report))
        // Chat
        .route("/chat", post(handlers::chat))
        .route(
            "/conversations",
            get(handlers::list_conversations).delete(handlers::clear_conversations),
        )
        .route("/conversations/export", get(handlers::export_conversations))
        // Ledger
        .route(
            "/transactions",
            get(handlers::list_transactions).post(handlers::create_transaction),
        )
        .route("/transactions/export", get(handlers::export_transactions))
        .route("/transactions/import", post(handlers::import_transactions))
        .route(
            "/transactions/:id",
            put(handlers::update_transaction).delete(handlers::delete_transaction),
        )
        .route(
            "/budgets",
            get(handlers::list_budgets).post(handlers::set_budget),
        )
        .route("/budgets/:id", delete(handlers::delete_budget))
        .route(
            "/categories",
            get(handlers::list_categories).post(handlers::create_category),
        )
        .route(
            "/categories/:id",
            put(handlers::update_category).delete(handlers::delete_category),
        )
        .route(
            "/settings",
            get(handlers::get_settings).put(handlers::save_settings),
        )
        // Full backup
        .route("/export", get(handlers::export_full))
        .route("/import", post(handlers::import_full));

    let methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::OPTIONS,
    ];
    let headers = [
        header::CONTENT_TYPE,
        header::AUTHORIZATION,
        header::HeaderName::from_static(USER_HEADER),
    ];

    let cors = if config.allowed_origins.is_empty() {
        // Restrictive default: only allow same-origin
        CorsLayer::new().allow_methods(methods).allow_headers(headers)
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers(headers)
    };

    Router::new()
        .nest("/api", api_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Start the server
pub async fn serve(
    advisor: Advisor,
    host: &str,
    port: u16,
    config: ServerConfig,
) -> anyhow::Result<()> {
    let app = create_router(advisor, config);
    let addr = format!("{}:{}", host, port);

    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============================================================================
// Error Handling
// ============================================================================

/// Application error type with proper HTTP status codes
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
    internal: Option<anyhow::Error>,
}

impl AppError {
    pub fn bad_request(msg: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn not_found(msg: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn conflict(msg: &str) -> Self {
        Self {
            status: StatusCode::CONFLICT,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let Some(err) = &self.internal {
            error!(error = %err, "Internal error");
        }

        let body = Json(serde_json::json!({
            "error": self.message
        }));

        (self.status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        let err = err.into();
        // Client-caused core errors keep their message
        match err.downcast_ref::<finsight_core::Error>() {
            Some(finsight_core::Error::NotFound(what)) => {
                AppError::not_found(&format!("Not found: {}", what))
            }
            Some(finsight_core::Error::InvalidInput(msg))
            | Some(finsight_core::Error::InvalidData(msg)) => AppError::bad_request(msg),
            Some(finsight_core::Error::RequestInFlight(_)) => {
                AppError::conflict("A request is already in progress")
            }
            _ => Self {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                // Return generic message to client
                message: "An internal error occurred".to_string(),
                // Keep full error for logging
                internal: Some(err),
            },
        }
    }
}
