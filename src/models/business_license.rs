//! Business license model.
//!
//! One license per merchant. The license number is captured with the draft;
//! the scanned document is uploaded separately and kept in the document store.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BusinessLicense {
    pub id: Uuid,
    pub license_number: String,

    /// Document store key of the uploaded PDF
    pub license_document_key: Option<String>,

    /// Hex SHA-256 of the uploaded PDF
    pub license_document_sha256: Option<String>,

    /// Original file name supplied by the uploader
    pub license_document_name: Option<String>,

    pub updated_at: DateTime<Utc>,
}

/// License as returned to clients. The storage key stays internal.
#[derive(Debug, Serialize)]
pub struct BusinessLicenseResponse {
    pub id: Uuid,
    pub license_number: String,
    pub has_document: bool,
    pub document_name: Option<String>,
    pub document_sha256: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl From<BusinessLicense> for BusinessLicenseResponse {
    fn from(license: BusinessLicense) -> Self {
        Self {
            id: license.id,
            license_number: license.license_number,
            has_document: license.license_document_key.is_some(),
            document_name: license.license_document_name,
            document_sha256: license.license_document_sha256,
            updated_at: license.updated_at,
        }
    }
}
