//! Merchant HTTP handlers.
//!
//! This module implements the merchant workflow endpoints:
//! - GET /api/v1/merchants - List merchants with optional filters
//! - GET /api/v1/merchants/export - Same filters, as CSV
//! - GET /api/v1/merchants/{id} - Merchant with all related entities
//! - POST /api/v1/merchants/draft - Create a draft
//! - PUT /api/v1/merchants/{id}/draft - Update a draft
//! - PUT /api/v1/merchants/{id}/ready-to-review - Submit a draft for review
//! - PUT /api/v1/merchants/{id}/registration-status - Approve, reject, or revert
//! - PUT /api/v1/merchants/bulk-approve - Approve many merchants
//! - PUT /api/v1/merchants/bulk-reject - Reject many merchants
//! - PUT /api/v1/merchants/{id}/alias-generation - Retry alias generation

use crate::{
    error::AppError,
    extract::{AppJson, AppPath, AppQuery},
    middleware::auth::AuthContext,
    models::merchant::{
        BulkActionResponse, BulkApproveRequest, BulkRejectRequest, MerchantDetailResponse,
        MerchantDraftRequest, MerchantDraftUpdateRequest, MerchantFilter, MerchantListResponse,
        RegistrationStatusRequest,
    },
    services::{merchant_query::Pagination, merchant_service},
    state::AppState,
};
use axum::{
    Extension, Json,
    extract::State,
    http::{StatusCode, header},
    response::IntoResponse,
};
use uuid::Uuid;

/// List merchants visible to the caller.
///
/// # Query Parameters
///
/// All optional: `added_by`, `approved_by` (user ids), `added_time`,
/// `updated_time` (YYYY-MM-DD), `dba_name` (substring, case-insensitive),
/// `merchant_id`, `registration_status`, `page` (1-based), `limit`.
///
/// # Response (200 OK)
///
/// ```json
/// {
///   "data": [ { "id": "...", "dba_trading_name": "Corner Coffee", ... } ],
///   "page": 1,
///   "limit": 20,
///   "total_count": 1,
///   "total_pages": 1
/// }
/// ```
pub async fn list_merchants(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppQuery(filter): AppQuery<MerchantFilter>,
) -> Result<Json<MerchantListResponse>, AppError> {
    let pagination = Pagination::resolve(
        &filter,
        state.config.default_page_size,
        state.config.max_page_size,
    );
    let response =
        merchant_service::list_merchants(&state.pool, &auth, &filter, pagination).await?;
    Ok(Json(response))
}

/// Export merchants matching the filters as `text/csv`.
///
/// Returns 422 when more merchants match than one export may hold; narrow the
/// filters (e.g. by `added_time` or `registration_status`) and export in parts.
pub async fn export_merchants(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppQuery(filter): AppQuery<MerchantFilter>,
) -> Result<impl IntoResponse, AppError> {
    let csv = merchant_service::export_merchants(&state.pool, &auth, &filter).await?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"merchants.csv\"",
            ),
        ],
        csv,
    ))
}

/// Get one merchant with locations, counters, contacts, owners and license.
///
/// Returns 404 if the merchant doesn't exist or belongs to another DFSP.
pub async fn get_merchant(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppPath(merchant_id): AppPath<Uuid>,
) -> Result<Json<MerchantDetailResponse>, AppError> {
    let merchant = merchant_service::get_merchant(&state.pool, &auth, merchant_id).await?;
    Ok(Json(merchant))
}

/// Create a merchant draft.
///
/// # Response
///
/// - **201 Created**: the new merchant with its license and checkout counter
/// - **422**: validation failed (including an alias already in use)
pub async fn create_draft(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppJson(request): AppJson<MerchantDraftRequest>,
) -> Result<(StatusCode, Json<MerchantDetailResponse>), AppError> {
    let merchant = merchant_service::create_draft(&state.pool, &auth, request).await?;
    Ok((StatusCode::CREATED, Json(merchant)))
}

/// Update a draft. Only the user who drafted it may do so.
pub async fn update_draft(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppPath(merchant_id): AppPath<Uuid>,
    AppJson(request): AppJson<MerchantDraftUpdateRequest>,
) -> Result<Json<MerchantDetailResponse>, AppError> {
    let merchant =
        merchant_service::update_draft(&state.pool, &auth, merchant_id, request).await?;
    Ok(Json(merchant))
}

/// Submit a draft for review.
pub async fn ready_to_review(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppPath(merchant_id): AppPath<Uuid>,
) -> Result<Json<MerchantDetailResponse>, AppError> {
    let merchant = merchant_service::ready_to_review(&state.pool, &auth, merchant_id).await?;
    Ok(Json(merchant))
}

/// Record a checker decision.
///
/// # Request Body
///
/// ```json
/// { "registration_status": "Approved" }
/// { "registration_status": "Rejected", "reason": "License expired" }
/// { "registration_status": "Reverted", "reason": "Add the second shop" }
/// ```
///
/// The drafter of a merchant can never review it (401).
pub async fn update_registration_status(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppPath(merchant_id): AppPath<Uuid>,
    AppJson(request): AppJson<RegistrationStatusRequest>,
) -> Result<Json<MerchantDetailResponse>, AppError> {
    let merchant = merchant_service::review(&state.pool, &auth, merchant_id, request).await?;
    Ok(Json(merchant))
}

/// Approve every listed merchant, or none of them.
pub async fn bulk_approve(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppJson(request): AppJson<BulkApproveRequest>,
) -> Result<Json<BulkActionResponse>, AppError> {
    let response = merchant_service::bulk_approve(&state.pool, &auth, request.ids).await?;
    Ok(Json(response))
}

/// Reject every listed merchant with one reason, or none of them.
pub async fn bulk_reject(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppJson(request): AppJson<BulkRejectRequest>,
) -> Result<Json<BulkActionResponse>, AppError> {
    let response =
        merchant_service::bulk_reject(&state.pool, &auth, request.ids, &request.reason).await?;
    Ok(Json(response))
}

/// Retry alias generation for a merchant stuck in WaitingAliasGeneration.
pub async fn retry_alias_generation(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppPath(merchant_id): AppPath<Uuid>,
) -> Result<Json<MerchantDetailResponse>, AppError> {
    let merchant =
        merchant_service::retry_alias_generation(&state.pool, &auth, merchant_id).await?;
    Ok(Json(merchant))
}
