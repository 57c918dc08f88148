//! HTTP surface for sitecheck.
//!
//! Routes return JSON documents carrying everything a page needs: records,
//! the checklist, form defaults, and on failure the submitted input so the
//! form can be shown again.

mod inspections;
mod permits;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{
        rejection::{FormRejection, PathRejection, QueryRejection},
        State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{Local, Timelike};
use serde::Serialize;
use tracing::{error, info};

use crate::error::{Error, Result};
use crate::form::FormFields;
use crate::record::Shift;
use crate::service::{DayStatus, RecordService};

/// Shared application state.
pub type AppState = Arc<RecordService>;

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(dashboard))
        .route("/health", get(health))
        .merge(inspections::routes())
        .merge(permits::routes())
        .with_state(state)
}

/// Serve the application until interrupted.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server fails.
pub async fn serve(service: RecordService, addr: SocketAddr) -> Result<()> {
    let app = router(Arc::new(service));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("sitecheck listening on {}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("sitecheck stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("failed to listen for shutdown signal: {e}");
    }
}

/// Standard API error response body.
#[derive(Debug, Serialize)]
pub struct ApiError {
    /// HTTP status code.
    #[serde(skip)]
    pub status: StatusCode,
    /// Stable machine-readable code.
    pub code: &'static str,
    /// Human-readable message.
    pub message: String,
    /// Submitted form fields, echoed back so the form can be re-displayed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<FormFields>,
}

impl ApiError {
    /// Attach the submitted form so the client can restore it.
    #[must_use]
    pub fn with_input(mut self, input: FormFields) -> Self {
        self.input = Some(input);
        self
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let (status, code, message) = match &err {
            Error::InvalidInput { .. } => {
                (StatusCode::BAD_REQUEST, "INVALID_INPUT", err.to_string())
            }
            Error::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND", err.to_string()),
            Error::ConstraintViolation { message } => (
                StatusCode::CONFLICT,
                "ALREADY_EXISTS",
                format!(
                    "Could not save: {message}. Check that no inspection exists for the same site, date and shift."
                ),
            ),
            _ => {
                error!("request failed: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL",
                    "internal error".to_string(),
                )
            }
        };
        ApiError {
            status,
            code,
            message,
            input: None,
        }
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Error::invalid_input("id", rejection.body_text()).into()
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Error::invalid_input("query", rejection.body_text()).into()
    }
}

// The body never decoded, so there is no input to echo.
impl From<FormRejection> for ApiError {
    fn from(rejection: FormRejection) -> Self {
        Error::invalid_input("form", rejection.body_text()).into()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status;
        (status, Json(serde_json::json!({ "error": self }))).into_response()
    }
}

#[derive(Debug, Serialize)]
struct Dashboard {
    today: DayStatus,
    suggested_shift: Shift,
}

async fn dashboard(State(svc): State<AppState>) -> std::result::Result<Json<Dashboard>, ApiError> {
    let today = svc.today_status()?;
    Ok(Json(Dashboard {
        today,
        suggested_shift: Shift::for_hour(Local::now().hour()),
    }))
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
