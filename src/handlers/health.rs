//! Health check endpoint for service monitoring.

use crate::{error::AppError, state::AppState};
use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Overall service status
    pub status: String,

    /// Database connection status
    pub database: String,

    /// Whether the license document directory is present
    pub document_storage: String,

    /// Current server timestamp
    pub timestamp: DateTime<Utc>,
}

/// Health check handler.
///
/// # Checks
///
/// - Database connectivity (executes simple query)
/// - Document storage root exists
///
/// # Response (200 OK)
///
/// ```json
/// {
///   "status": "healthy",
///   "database": "connected",
///   "document_storage": "available",
///   "timestamp": "2026-01-12T09:30:00Z"
/// }
/// ```
///
/// A missing storage directory degrades the status but is not an error;
/// an unreachable database returns the standard 500 error body.
pub async fn health_check(State(state): State<AppState>) -> Result<Json<HealthResponse>, AppError> {
    sqlx::query("SELECT 1").execute(&state.pool).await?;

    let storage_ok = tokio::fs::try_exists(state.documents.root())
        .await
        .unwrap_or(false);

    Ok(Json(HealthResponse {
        status: if storage_ok { "healthy" } else { "degraded" }.to_string(),
        database: "connected".to_string(),
        document_storage: if storage_ok { "available" } else { "missing" }.to_string(),
        timestamp: Utc::now(),
    }))
}
