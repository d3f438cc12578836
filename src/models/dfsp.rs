//! DFSP (Digital Financial Service Provider) model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::validation::Validator;

/// Represents a DFSP record from the database.
///
/// Every merchant is onboarded on behalf of exactly one DFSP, and DFSP portal
/// users only ever see merchants of their own DFSP.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Dfsp {
    pub id: Uuid,

    /// Scheme-wide FSP identifier, unique across the hub
    pub fspid: String,

    pub name: String,

    /// Free-form classification (bank, mobile money operator, ...)
    pub dfsp_type: String,

    pub is_active: bool,

    pub created_at: DateTime<Utc>,
}

/// Request body for registering a DFSP.
///
/// ```json
/// { "fspid": "greenbank", "name": "Green Bank", "dfsp_type": "Bank" }
/// ```
#[derive(Debug, Deserialize)]
pub struct CreateDfspRequest {
    pub fspid: String,
    pub name: String,
    pub dfsp_type: String,
}

impl CreateDfspRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut v = Validator::new();
        v.required("fspid", &self.fspid, 64);
        if self.fspid.chars().any(char::is_whitespace) {
            v.push("fspid", "must not contain whitespace");
        }
        v.required("name", &self.name, 255);
        v.required("dfsp_type", &self.dfsp_type, 64);
        v.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fspid_must_be_a_single_token() {
        let request = CreateDfspRequest {
            fspid: "green bank".to_string(),
            name: "Green Bank".to_string(),
            dfsp_type: "Bank".to_string(),
        };
        assert!(matches!(request.validate(), Err(AppError::Validation(_))));

        let request = CreateDfspRequest {
            fspid: "greenbank".to_string(),
            ..request
        };
        assert!(request.validate().is_ok());
    }
}
