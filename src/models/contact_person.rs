//! Contact person model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::validation::Validator;

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct ContactPerson {
    pub id: Uuid,
    pub merchant_id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub phone_number: String,
    pub is_same_as_business_owner: bool,
    pub created_at: DateTime<Utc>,
}

/// Request body for creating or replacing a contact person.
#[derive(Debug, Deserialize)]
pub struct ContactPersonRequest {
    pub name: String,
    pub email: Option<String>,
    pub phone_number: String,
    #[serde(default)]
    pub is_same_as_business_owner: bool,
}

impl ContactPersonRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut v = Validator::new();
        v.required("name", &self.name, 255);
        if let Some(email) = self.email.as_deref() {
            v.email("email", email);
        }
        v.phone_number("phone_number", &self.phone_number);
        v.finish()
    }
}
