//! Portal user HTTP handlers.

use crate::{
    db::DbPool,
    error::AppError,
    middleware::auth::AuthContext,
    models::portal_user::{PortalUser, PortalUserResponse},
};
use axum::{Extension, Json, extract::State};

/// Profile of the authenticated user.
///
/// `GET /api/v1/users/me`
pub async fn current_user(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<PortalUserResponse>, AppError> {
    let user = sqlx::query_as::<_, PortalUser>(
        r#"
        SELECT id, name, email, user_type, dfsp_id, created_at
        FROM portal_users
        WHERE id = $1
        "#,
    )
    .bind(auth.user_id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("user"))?;

    Ok(Json(user.into()))
}
