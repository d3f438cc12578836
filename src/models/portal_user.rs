//! Portal user model for authentication.
//!
//! Portal users authenticate with a bearer token. Only the SHA-256 hash of the
//! token is stored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Whether a user operates the hub or works for a single DFSP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "portal_user_type")]
pub enum PortalUserType {
    Hub,
    Dfsp,
}

/// Represents a portal user record from the database.
///
/// # Database Table
///
/// Maps to the `portal_users` table. The token hash and `is_active` flag are
/// only used in the authentication lookup's `WHERE` clause, so they are not
/// loaded here.
/// - `user_type`: `Hub` or `Dfsp`
/// - `dfsp_id`: the DFSP a `Dfsp` user belongs to (NULL for hub users)
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PortalUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub user_type: PortalUserType,
    pub dfsp_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Response body for `GET /api/v1/users/me`. Never exposes the token hash.
#[derive(Debug, Serialize)]
pub struct PortalUserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub user_type: PortalUserType,
    pub dfsp_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl From<PortalUser> for PortalUserResponse {
    fn from(user: PortalUser) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            user_type: user.user_type,
            dfsp_id: user.dfsp_id,
            created_at: user.created_at,
        }
    }
}
