//! Handlers for the entities hanging off a merchant.
//!
//! - POST/PUT /api/v1/merchants/{id}/locations[/{location_id}]
//! - POST/PUT /api/v1/merchants/{id}/contact-persons[/{contact_person_id}]
//! - POST/PUT /api/v1/merchants/{id}/business-owners[/{owner_id}]
//! - GET /api/v1/merchants/{id}/checkout-counters
//! - PUT /api/v1/merchants/{id}/checkout-counters/{counter_id}
//!
//! All mutations are limited to the merchant's creator while it is editable.

use crate::{
    db::DbPool,
    error::AppError,
    extract::{AppJson, AppPath},
    middleware::auth::AuthContext,
    models::{
        business_owner::{BusinessOwner, BusinessOwnerRequest},
        checkout_counter::{CheckoutCounter, CheckoutCounterUpdateRequest},
        contact_person::{ContactPerson, ContactPersonRequest},
        location::{LocationRequest, MerchantLocation},
    },
    services::profile_service,
};
use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
};
use uuid::Uuid;

pub async fn create_location(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    AppPath(merchant_id): AppPath<Uuid>,
    AppJson(request): AppJson<LocationRequest>,
) -> Result<(StatusCode, Json<MerchantLocation>), AppError> {
    let location = profile_service::create_location(&pool, &auth, merchant_id, request).await?;
    Ok((StatusCode::CREATED, Json(location)))
}

pub async fn update_location(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    AppPath((merchant_id, location_id)): AppPath<(Uuid, Uuid)>,
    AppJson(request): AppJson<LocationRequest>,
) -> Result<Json<MerchantLocation>, AppError> {
    let location =
        profile_service::update_location(&pool, &auth, merchant_id, location_id, request).await?;
    Ok(Json(location))
}

pub async fn create_contact_person(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    AppPath(merchant_id): AppPath<Uuid>,
    AppJson(request): AppJson<ContactPersonRequest>,
) -> Result<(StatusCode, Json<ContactPerson>), AppError> {
    let contact =
        profile_service::create_contact_person(&pool, &auth, merchant_id, request).await?;
    Ok((StatusCode::CREATED, Json(contact)))
}

pub async fn update_contact_person(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    AppPath((merchant_id, contact_person_id)): AppPath<(Uuid, Uuid)>,
    AppJson(request): AppJson<ContactPersonRequest>,
) -> Result<Json<ContactPerson>, AppError> {
    let contact = profile_service::update_contact_person(
        &pool,
        &auth,
        merchant_id,
        contact_person_id,
        request,
    )
    .await?;
    Ok(Json(contact))
}

pub async fn create_business_owner(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    AppPath(merchant_id): AppPath<Uuid>,
    AppJson(request): AppJson<BusinessOwnerRequest>,
) -> Result<(StatusCode, Json<BusinessOwner>), AppError> {
    let owner =
        profile_service::create_business_owner(&pool, &auth, merchant_id, request).await?;
    Ok((StatusCode::CREATED, Json(owner)))
}

pub async fn update_business_owner(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    AppPath((merchant_id, owner_id)): AppPath<(Uuid, Uuid)>,
    AppJson(request): AppJson<BusinessOwnerRequest>,
) -> Result<Json<BusinessOwner>, AppError> {
    let owner =
        profile_service::update_business_owner(&pool, &auth, merchant_id, owner_id, request)
            .await?;
    Ok(Json(owner))
}

pub async fn list_checkout_counters(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    AppPath(merchant_id): AppPath<Uuid>,
) -> Result<Json<Vec<CheckoutCounter>>, AppError> {
    let counters = profile_service::list_checkout_counters(&pool, &auth, merchant_id).await?;
    Ok(Json(counters))
}

/// Update a checkout counter. The alias can not be changed here.
pub async fn update_checkout_counter(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    AppPath((merchant_id, counter_id)): AppPath<(Uuid, Uuid)>,
    AppJson(request): AppJson<CheckoutCounterUpdateRequest>,
) -> Result<Json<CheckoutCounter>, AppError> {
    let counter =
        profile_service::update_checkout_counter(&pool, &auth, merchant_id, counter_id, request)
            .await?;
    Ok(Json(counter))
}
