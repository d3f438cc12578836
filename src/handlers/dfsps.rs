//! DFSP HTTP handlers.
//!
//! - GET /api/v1/dfsps - List active DFSPs
//! - POST /api/v1/dfsps - Register a DFSP (hub users only)

use crate::{
    db::{DbPool, is_unique_violation},
    error::AppError,
    extract::AppJson,
    middleware::auth::AuthContext,
    models::dfsp::{CreateDfspRequest, Dfsp},
};
use axum::{Extension, Json, extract::State, http::StatusCode};

/// List all active DFSPs, alphabetically.
///
/// Visible to every authenticated user; the merchant draft form needs it.
pub async fn list_dfsps(State(pool): State<DbPool>) -> Result<Json<Vec<Dfsp>>, AppError> {
    let dfsps = sqlx::query_as::<_, Dfsp>(
        r#"
        SELECT id, fspid, name, dfsp_type, is_active, created_at
        FROM dfsps
        WHERE is_active = true
        ORDER BY name
        "#,
    )
    .fetch_all(&pool)
    .await?;

    Ok(Json(dfsps))
}

/// Register a new DFSP.
///
/// # Response
///
/// - **201 Created**: the new DFSP
/// - **401**: caller is not a hub user
/// - **422**: invalid fields or the fspid is already registered
pub async fn create_dfsp(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    AppJson(request): AppJson<CreateDfspRequest>,
) -> Result<(StatusCode, Json<Dfsp>), AppError> {
    if !auth.is_hub() {
        return Err(AppError::NotPermitted(
            "Only hub users can register DFSPs".to_string(),
        ));
    }
    request.validate()?;

    let dfsp = sqlx::query_as::<_, Dfsp>(
        r#"
        INSERT INTO dfsps (fspid, name, dfsp_type)
        VALUES ($1, $2, $3)
        RETURNING id, fspid, name, dfsp_type, is_active, created_at
        "#,
    )
    .bind(request.fspid.trim())
    .bind(request.name.trim())
    .bind(request.dfsp_type.trim())
    .fetch_one(&pool)
    .await
    .map_err(|err| {
        if is_unique_violation(&err) {
            AppError::Validation("fspid: is already registered".to_string())
        } else {
            AppError::Database(err)
        }
    })?;

    tracing::info!(dfsp_id = %dfsp.id, fspid = %dfsp.fspid, user_id = %auth.user_id, "DFSP registered");

    Ok((StatusCode::CREATED, Json(dfsp)))
}
