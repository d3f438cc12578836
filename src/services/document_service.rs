//! License document service - upload and download of the scanned business
//! license.
//!
//! # Rules
//!
//! - PDF only: the file must be declared as PDF (content type or `.pdf` name)
//!   and start with the `%PDF-` magic bytes
//! - At most `MAX_DOCUMENT_BYTES` (configuration)
//! - Uploads are maker edits; downloads follow the merchant's visibility scope

use uuid::Uuid;

use crate::{
    db::DbPool,
    error::AppError,
    middleware::auth::AuthContext,
    models::business_license::{BusinessLicense, BusinessLicenseResponse},
    services::merchant_service::{begin_maker_edit, get_merchant, touch_after_edit},
    storage::DocumentStore,
};

const PDF_MAGIC: &[u8] = b"%PDF-";

/// A file taken from a multipart upload.
#[derive(Debug)]
pub struct UploadedDocument {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Reject anything that is not a non-empty PDF within the size limit.
pub fn validate_pdf(document: &UploadedDocument, max_bytes: usize) -> Result<(), AppError> {
    if document.bytes.is_empty() {
        return Err(AppError::Validation("document: file is empty".to_string()));
    }
    if document.bytes.len() > max_bytes {
        return Err(AppError::Validation(format!(
            "document: file exceeds the {max_bytes} byte limit"
        )));
    }

    let declared_pdf = document.content_type.as_deref() == Some("application/pdf")
        || document.file_name.to_ascii_lowercase().ends_with(".pdf");
    if !declared_pdf || !document.bytes.starts_with(PDF_MAGIC) {
        return Err(AppError::Validation(
            "document: only PDF files are accepted".to_string(),
        ));
    }

    Ok(())
}

/// Keep only the final path component of a client-supplied name, drop control
/// characters and quotes (the name ends up in a `Content-Disposition` header),
/// and cap its length.
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .filter(|c| !c.is_control() && *c != '"')
        .take(255)
        .collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        "license.pdf".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Store the license document and record it on the merchant's license.
pub async fn upload_license_document(
    pool: &DbPool,
    store: &DocumentStore,
    max_bytes: usize,
    auth: &AuthContext,
    merchant_id: Uuid,
    document: UploadedDocument,
) -> Result<BusinessLicenseResponse, AppError> {
    validate_pdf(&document, max_bytes)?;
    let (mut tx, _) = begin_maker_edit(pool, auth, merchant_id).await?;

    let stored = store.put(&document.bytes).await?;

    let license = sqlx::query_as::<_, BusinessLicense>(
        r#"
        UPDATE business_licenses
        SET license_document_key = $2,
            license_document_sha256 = $3,
            license_document_name = $4,
            updated_at = NOW()
        WHERE merchant_id = $1
        RETURNING *
        "#,
    )
    .bind(merchant_id)
    .bind(&stored.key)
    .bind(&stored.sha256)
    .bind(sanitize_file_name(&document.file_name))
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(AppError::NotFound("business license"))?;

    touch_after_edit(&mut tx, merchant_id).await?;
    tx.commit().await?;

    tracing::info!(
        merchant_id = %merchant_id,
        sha256 = %stored.sha256,
        size = stored.size,
        "license document uploaded"
    );

    Ok(license.into())
}

/// File name and bytes of the merchant's license document.
pub async fn download_license_document(
    pool: &DbPool,
    store: &DocumentStore,
    auth: &AuthContext,
    merchant_id: Uuid,
) -> Result<(String, Vec<u8>), AppError> {
    // Scope check; the detail carries no storage key, so load the license row separately.
    get_merchant(pool, auth, merchant_id).await?;

    let license = sqlx::query_as::<_, BusinessLicense>(
        "SELECT * FROM business_licenses WHERE merchant_id = $1",
    )
    .bind(merchant_id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("license document"))?;

    let key = license
        .license_document_key
        .ok_or(AppError::NotFound("license document"))?;

    let bytes = store.get(&key).await?.ok_or_else(|| {
        tracing::error!(merchant_id = %merchant_id, key = %key, "license document missing from store");
        AppError::NotFound("license document")
    })?;

    let file_name = license
        .license_document_name
        .unwrap_or_else(|| "license.pdf".to_string());

    Ok((file_name, bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pdf(name: &str, content_type: Option<&str>, bytes: &[u8]) -> UploadedDocument {
        UploadedDocument {
            file_name: name.to_string(),
            content_type: content_type.map(str::to_string),
            bytes: bytes.to_vec(),
        }
    }

    #[test]
    fn accepts_declared_pdf_with_magic_bytes() {
        let doc = pdf("license.PDF", None, b"%PDF-1.7 body");
        assert!(validate_pdf(&doc, 1024).is_ok());

        let doc = pdf("scan", Some("application/pdf"), b"%PDF-1.4");
        assert!(validate_pdf(&doc, 1024).is_ok());
    }

    #[test]
    fn rejects_non_pdf_content() {
        let renamed_png = pdf("license.pdf", Some("application/pdf"), b"\x89PNG\r\n");
        assert!(matches!(
            validate_pdf(&renamed_png, 1024),
            Err(AppError::Validation(_))
        ));

        let undeclared = pdf("license.txt", Some("text/plain"), b"%PDF-1.4");
        assert!(validate_pdf(&undeclared, 1024).is_err());
    }

    #[test]
    fn rejects_empty_and_oversized_files() {
        assert!(validate_pdf(&pdf("a.pdf", None, b""), 1024).is_err());
        let big = [b"%PDF-".as_slice(), &[0u8; 64]].concat();
        assert!(validate_pdf(&pdf("a.pdf", None, &big), 32).is_err());
    }

    #[test]
    fn file_names_lose_their_directories() {
        assert_eq!(sanitize_file_name("../../etc/license.pdf"), "license.pdf");
        assert_eq!(sanitize_file_name("C:\\scans\\lic.pdf"), "lic.pdf");
        assert_eq!(sanitize_file_name("  "), "license.pdf");
    }

    #[test]
    fn file_names_are_safe_header_values() {
        let name = sanitize_file_name("lic\x01en\tse\r\n\"x\".pdf");
        assert_eq!(name, "licensex.pdf");
        assert_eq!(sanitize_file_name("\x07\x1b"), "license.pdf");
    }
}
