//! License document HTTP handlers.
//!
//! - POST /api/v1/merchants/{id}/license-document - multipart upload, field `document`
//! - GET /api/v1/merchants/{id}/license-document - download the stored PDF

use crate::{
    error::AppError,
    extract::{AppMultipart, AppPath},
    middleware::auth::AuthContext,
    models::business_license::BusinessLicenseResponse,
    services::document_service::{self, UploadedDocument},
    state::AppState,
};
use axum::{
    Extension, Json,
    extract::State,
    http::header,
    response::IntoResponse,
};
use uuid::Uuid;

const DOCUMENT_FIELD: &str = "document";

/// Upload the merchant's license document.
///
/// # Request
///
/// `multipart/form-data` with one file field named `document` (PDF).
///
/// # Response
///
/// - **200 OK**: the updated license (document name and SHA-256)
/// - **400**: malformed multipart body or missing `document` field
/// - **422**: not a PDF, empty, or over the size limit
pub async fn upload_license_document(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppPath(merchant_id): AppPath<Uuid>,
    AppMultipart(mut multipart): AppMultipart,
) -> Result<Json<BusinessLicenseResponse>, AppError> {
    let mut document = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidRequest(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some(DOCUMENT_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or("license.pdf").to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::InvalidRequest(format!("Failed to read upload: {}", e)))?;

        document = Some(UploadedDocument {
            file_name,
            content_type,
            bytes: bytes.to_vec(),
        });
        break;
    }

    let document = document.ok_or_else(|| {
        AppError::InvalidRequest(format!("Missing multipart field `{DOCUMENT_FIELD}`"))
    })?;

    let license = document_service::upload_license_document(
        &state.pool,
        &state.documents,
        state.config.max_document_bytes,
        &auth,
        merchant_id,
        document,
    )
    .await?;

    Ok(Json(license))
}

/// Download the merchant's license document as `application/pdf`.
pub async fn download_license_document(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppPath(merchant_id): AppPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let (file_name, bytes) = document_service::download_license_document(
        &state.pool,
        &state.documents,
        &auth,
        merchant_id,
    )
    .await?;

    let disposition = content_disposition(&file_name);

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    ))
}

/// `attachment` disposition with the name reduced to printable ASCII so the
/// header value is always valid.
fn content_disposition(file_name: &str) -> String {
    let ascii: String = file_name
        .chars()
        .map(|c| {
            if (c.is_ascii_graphic() || c == ' ') && c != '"' && c != '\\' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("attachment; filename=\"{ascii}\"")
}
