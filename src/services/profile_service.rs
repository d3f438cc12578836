//! Merchant profile service - locations, contact persons, business owners
//! and checkout counters.
//!
//! Every mutation runs inside a maker edit (see `merchant_service::begin_maker_edit`):
//! the merchant row is locked, the caller must be its creator, and the merchant
//! must still be editable. A rejected merchant returns to Draft on any edit.

use uuid::Uuid;

use crate::{
    db::DbPool,
    error::AppError,
    middleware::auth::AuthContext,
    models::{
        business_owner::{BusinessOwner, BusinessOwnerRequest},
        checkout_counter::{CheckoutCounter, CheckoutCounterUpdateRequest},
        contact_person::{ContactPerson, ContactPersonRequest},
        location::{LocationRequest, MerchantLocation},
    },
    services::merchant_service::{begin_maker_edit, get_merchant, touch_after_edit},
};

/// Add a location to a merchant.
pub async fn create_location(
    pool: &DbPool,
    auth: &AuthContext,
    merchant_id: Uuid,
    request: LocationRequest,
) -> Result<MerchantLocation, AppError> {
    request.validate()?;
    let (mut tx, _) = begin_maker_edit(pool, auth, merchant_id).await?;

    let location = sqlx::query_as::<_, MerchantLocation>(
        r#"
        INSERT INTO merchant_locations (
            merchant_id, location_type, web_url, department, sub_department, street_name,
            building_number, building_name, floor_number, room_number, post_box, postal_code,
            town_name, district_name, country_subdivision, country, address_line,
            latitude, longitude
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)
        RETURNING *
        "#,
    )
    .bind(merchant_id)
    .bind(request.location_type)
    .bind(request.web_url)
    .bind(request.department)
    .bind(request.sub_department)
    .bind(request.street_name)
    .bind(request.building_number)
    .bind(request.building_name)
    .bind(request.floor_number)
    .bind(request.room_number)
    .bind(request.post_box)
    .bind(request.postal_code)
    .bind(request.town_name)
    .bind(request.district_name)
    .bind(request.country_subdivision)
    .bind(request.country)
    .bind(request.address_line)
    .bind(request.latitude)
    .bind(request.longitude)
    .fetch_one(&mut *tx)
    .await?;

    touch_after_edit(&mut tx, merchant_id).await?;
    tx.commit().await?;

    tracing::info!(merchant_id = %merchant_id, location_id = %location.id, "location added");

    Ok(location)
}

/// Replace every field of an existing location.
pub async fn update_location(
    pool: &DbPool,
    auth: &AuthContext,
    merchant_id: Uuid,
    location_id: Uuid,
    request: LocationRequest,
) -> Result<MerchantLocation, AppError> {
    request.validate()?;
    let (mut tx, _) = begin_maker_edit(pool, auth, merchant_id).await?;

    let location = sqlx::query_as::<_, MerchantLocation>(
        r#"
        UPDATE merchant_locations
        SET location_type = $3, web_url = $4, department = $5, sub_department = $6,
            street_name = $7, building_number = $8, building_name = $9, floor_number = $10,
            room_number = $11, post_box = $12, postal_code = $13, town_name = $14,
            district_name = $15, country_subdivision = $16, country = $17,
            address_line = $18, latitude = $19, longitude = $20
        WHERE id = $1 AND merchant_id = $2
        RETURNING *
        "#,
    )
    .bind(location_id)
    .bind(merchant_id)
    .bind(request.location_type)
    .bind(request.web_url)
    .bind(request.department)
    .bind(request.sub_department)
    .bind(request.street_name)
    .bind(request.building_number)
    .bind(request.building_name)
    .bind(request.floor_number)
    .bind(request.room_number)
    .bind(request.post_box)
    .bind(request.postal_code)
    .bind(request.town_name)
    .bind(request.district_name)
    .bind(request.country_subdivision)
    .bind(request.country)
    .bind(request.address_line)
    .bind(request.latitude)
    .bind(request.longitude)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(AppError::NotFound("location"))?;

    touch_after_edit(&mut tx, merchant_id).await?;
    tx.commit().await?;

    Ok(location)
}

pub async fn create_contact_person(
    pool: &DbPool,
    auth: &AuthContext,
    merchant_id: Uuid,
    request: ContactPersonRequest,
) -> Result<ContactPerson, AppError> {
    request.validate()?;
    let (mut tx, _) = begin_maker_edit(pool, auth, merchant_id).await?;

    let contact = sqlx::query_as::<_, ContactPerson>(
        r#"
        INSERT INTO contact_persons (merchant_id, name, email, phone_number, is_same_as_business_owner)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(merchant_id)
    .bind(request.name.trim())
    .bind(request.email.as_deref())
    .bind(&request.phone_number)
    .bind(request.is_same_as_business_owner)
    .fetch_one(&mut *tx)
    .await?;

    touch_after_edit(&mut tx, merchant_id).await?;
    tx.commit().await?;

    tracing::info!(merchant_id = %merchant_id, contact_person_id = %contact.id, "contact person added");

    Ok(contact)
}

pub async fn update_contact_person(
    pool: &DbPool,
    auth: &AuthContext,
    merchant_id: Uuid,
    contact_person_id: Uuid,
    request: ContactPersonRequest,
) -> Result<ContactPerson, AppError> {
    request.validate()?;
    let (mut tx, _) = begin_maker_edit(pool, auth, merchant_id).await?;

    let contact = sqlx::query_as::<_, ContactPerson>(
        r#"
        UPDATE contact_persons
        SET name = $3, email = $4, phone_number = $5, is_same_as_business_owner = $6
        WHERE id = $1 AND merchant_id = $2
        RETURNING *
        "#,
    )
    .bind(contact_person_id)
    .bind(merchant_id)
    .bind(request.name.trim())
    .bind(request.email.as_deref())
    .bind(&request.phone_number)
    .bind(request.is_same_as_business_owner)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(AppError::NotFound("contact person"))?;

    touch_after_edit(&mut tx, merchant_id).await?;
    tx.commit().await?;

    Ok(contact)
}

pub async fn create_business_owner(
    pool: &DbPool,
    auth: &AuthContext,
    merchant_id: Uuid,
    request: BusinessOwnerRequest,
) -> Result<BusinessOwner, AppError> {
    request.validate()?;
    let (mut tx, _) = begin_maker_edit(pool, auth, merchant_id).await?;

    let owner = sqlx::query_as::<_, BusinessOwner>(
        r#"
        INSERT INTO business_owners (
            merchant_id, name, identification_type, identification_number, phone_number, email
        )
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(merchant_id)
    .bind(request.name.trim())
    .bind(request.identification_type)
    .bind(request.identification_number.trim())
    .bind(&request.phone_number)
    .bind(request.email.as_deref())
    .fetch_one(&mut *tx)
    .await?;

    touch_after_edit(&mut tx, merchant_id).await?;
    tx.commit().await?;

    tracing::info!(merchant_id = %merchant_id, business_owner_id = %owner.id, "business owner added");

    Ok(owner)
}

pub async fn update_business_owner(
    pool: &DbPool,
    auth: &AuthContext,
    merchant_id: Uuid,
    owner_id: Uuid,
    request: BusinessOwnerRequest,
) -> Result<BusinessOwner, AppError> {
    request.validate()?;
    let (mut tx, _) = begin_maker_edit(pool, auth, merchant_id).await?;

    let owner = sqlx::query_as::<_, BusinessOwner>(
        r#"
        UPDATE business_owners
        SET name = $3, identification_type = $4, identification_number = $5,
            phone_number = $6, email = $7
        WHERE id = $1 AND merchant_id = $2
        RETURNING *
        "#,
    )
    .bind(owner_id)
    .bind(merchant_id)
    .bind(request.name.trim())
    .bind(request.identification_type)
    .bind(request.identification_number.trim())
    .bind(&request.phone_number)
    .bind(request.email.as_deref())
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(AppError::NotFound("business owner"))?;

    touch_after_edit(&mut tx, merchant_id).await?;
    tx.commit().await?;

    Ok(owner)
}

/// Checkout counters of a merchant visible to the caller.
pub async fn list_checkout_counters(
    pool: &DbPool,
    auth: &AuthContext,
    merchant_id: Uuid,
) -> Result<Vec<CheckoutCounter>, AppError> {
    // Resolves scope and existence the same way as the detail endpoint.
    let detail = get_merchant(pool, auth, merchant_id).await?;
    Ok(detail.checkout_counters)
}

/// Update description, notification number, and location link of a counter.
///
/// The linked location must belong to the same merchant.
pub async fn update_checkout_counter(
    pool: &DbPool,
    auth: &AuthContext,
    merchant_id: Uuid,
    counter_id: Uuid,
    request: CheckoutCounterUpdateRequest,
) -> Result<CheckoutCounter, AppError> {
    request.validate()?;
    let (mut tx, _) = begin_maker_edit(pool, auth, merchant_id).await?;

    if let Some(location_id) = request.merchant_location_id {
        let belongs: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM merchant_locations WHERE id = $1 AND merchant_id = $2)",
        )
        .bind(location_id)
        .bind(merchant_id)
        .fetch_one(&mut *tx)
        .await?;
        if !belongs {
            return Err(AppError::Validation(
                "merchant_location_id: location does not belong to this merchant".to_string(),
            ));
        }
    }

    let counter = sqlx::query_as::<_, CheckoutCounter>(
        r#"
        UPDATE checkout_counters
        SET description = $3, notification_number = $4, merchant_location_id = $5
        WHERE id = $1 AND merchant_id = $2
        RETURNING *
        "#,
    )
    .bind(counter_id)
    .bind(merchant_id)
    .bind(request.description.as_deref())
    .bind(request.notification_number.as_deref())
    .bind(request.merchant_location_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(AppError::NotFound("checkout counter"))?;

    touch_after_edit(&mut tx, merchant_id).await?;
    tx.commit().await?;

    Ok(counter)
}
