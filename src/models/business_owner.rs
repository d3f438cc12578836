//! Business owner model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::validation::Validator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "identification_type")]
pub enum IdentificationType {
    #[serde(rename = "National ID")]
    #[sqlx(rename = "National ID")]
    NationalId,
    Passport,
    Other,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct BusinessOwner {
    pub id: Uuid,
    pub merchant_id: Uuid,
    pub name: String,
    pub identification_type: IdentificationType,
    pub identification_number: String,
    pub phone_number: String,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Request body for creating or replacing a business owner.
///
/// ```json
/// {
///   "name": "Aye Aye",
///   "identification_type": "National ID",
///   "identification_number": "12/ABC(N)123456",
///   "phone_number": "+959123456789"
/// }
/// ```
#[derive(Debug, Deserialize)]
pub struct BusinessOwnerRequest {
    pub name: String,
    pub identification_type: IdentificationType,
    pub identification_number: String,
    pub phone_number: String,
    pub email: Option<String>,
}

impl BusinessOwnerRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut v = Validator::new();
        v.required("name", &self.name, 255);
        v.required("identification_number", &self.identification_number, 64);
        v.phone_number("phone_number", &self.phone_number);
        if let Some(email) = self.email.as_deref() {
            v.email("email", email);
        }
        v.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identification_type_uses_display_labels() {
        let request: BusinessOwnerRequest = serde_json::from_value(serde_json::json!({
            "name": "Aye Aye",
            "identification_type": "National ID",
            "identification_number": "12/ABC(N)123456",
            "phone_number": "+959123456789"
        }))
        .expect("request parses");

        assert_eq!(request.identification_type, IdentificationType::NationalId);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn owner_needs_identification_number() {
        let request = BusinessOwnerRequest {
            name: "Aye Aye".to_string(),
            identification_type: IdentificationType::Passport,
            identification_number: String::new(),
            phone_number: "+959123456789".to_string(),
            email: Some("aye@shop.example".to_string()),
        };
        assert!(request.validate().is_err());
    }
}
