//! Bearer token authentication middleware.
//!
//! This middleware intercepts every protected request to:
//! 1. Extract the token from the Authorization header
//! 2. Hash it and look up the active portal user owning that hash
//! 3. Inject the user's `AuthContext` into the request
//! 4. Reject unauthenticated requests with HTTP 401

use crate::{
    db::DbPool,
    error::AppError,
    models::portal_user::{PortalUser, PortalUserType},
};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Authentication context attached to authenticated requests.
///
/// Handlers extract it with `Extension<AuthContext>` to know who is acting and
/// which merchants they may see.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub name: String,
    pub user_type: PortalUserType,

    /// DFSP the user works for; `None` for hub operators
    pub dfsp_id: Option<Uuid>,
}

impl AuthContext {
    pub fn is_hub(&self) -> bool {
        self.user_type == PortalUserType::Hub
    }

    /// DFSP the caller is restricted to, or `None` when they may see every DFSP.
    pub fn dfsp_scope(&self) -> Option<Uuid> {
        if self.is_hub() { None } else { self.dfsp_id }
    }

    /// Whether a merchant of `dfsp_id` is visible to the caller.
    pub fn can_access_dfsp(&self, dfsp_id: Uuid) -> bool {
        match self.dfsp_scope() {
            None => self.is_hub(),
            Some(own) => own == dfsp_id,
        }
    }
}

impl From<PortalUser> for AuthContext {
    fn from(user: PortalUser) -> Self {
        Self {
            user_id: user.id,
            name: user.name,
            user_type: user.user_type,
            dfsp_id: user.dfsp_id,
        }
    }
}

/// Hex-encoded SHA-256 of a bearer token, as stored in `portal_users.api_key_hash`.
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Extract the token from an `Authorization: Bearer <token>` header value.
fn bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Authentication middleware function.
///
/// # Flow
///
/// 1. Extract `Authorization: Bearer <token>` header from request
/// 2. Hash the token using SHA-256
/// 3. Query `portal_users` for a matching hash where `is_active = true`
/// 4. If found: inject `AuthContext` into request, call next handler
/// 5. If not found: return 401 Unauthorized error
pub async fn auth_middleware(
    State(pool): State<DbPool>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(bearer_token)
        .ok_or(AppError::Unauthorized)?;

    let token_hash = hash_token(token);

    let user = sqlx::query_as::<_, PortalUser>(
        "SELECT id, name, email, user_type, dfsp_id, created_at
         FROM portal_users
         WHERE api_key_hash = $1 AND is_active = true",
    )
    .bind(&token_hash)
    .fetch_optional(&pool)
    .await?
    .ok_or_else(|| {
        tracing::warn!("rejected request with unknown bearer token");
        AppError::Unauthorized
    })?;

    // A DFSP user without a DFSP would otherwise see everything.
    if user.user_type == PortalUserType::Dfsp && user.dfsp_id.is_none() {
        return Err(AppError::Unauthorized);
    }

    request.extensions_mut().insert(AuthContext::from(user));

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(user_type: PortalUserType, dfsp_id: Option<Uuid>) -> AuthContext {
        AuthContext {
            user_id: Uuid::new_v4(),
            name: "tester".to_string(),
            user_type,
            dfsp_id,
        }
    }

    #[test]
    fn token_hash_is_hex_sha256() {
        assert_eq!(
            hash_token("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn bearer_prefix_is_required() {
        assert_eq!(bearer_token("Bearer secret"), Some("secret"));
        assert_eq!(bearer_token("Bearer   "), None);
        assert_eq!(bearer_token("Basic secret"), None);
        assert_eq!(bearer_token("secret"), None);
    }

    #[test]
    fn hub_users_see_every_dfsp() {
        let hub = context(PortalUserType::Hub, None);
        assert_eq!(hub.dfsp_scope(), None);
        assert!(hub.can_access_dfsp(Uuid::new_v4()));
    }

    #[test]
    fn dfsp_users_see_only_their_own() {
        let own = Uuid::new_v4();
        let user = context(PortalUserType::Dfsp, Some(own));
        assert_eq!(user.dfsp_scope(), Some(own));
        assert!(user.can_access_dfsp(own));
        assert!(!user.can_access_dfsp(Uuid::new_v4()));
    }
}
