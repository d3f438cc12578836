//! Merchant service - onboarding workflow and review decisions.
//!
//! This service handles:
//! - Draft creation (merchant, license, first checkout counter) in one transaction
//! - Maker rules: only the drafting user edits a draft, only while it is editable
//! - Checker rules: the drafting user can never approve or reject their own merchant
//! - Single and bulk status transitions
//! - Filtered listing and CSV export
//!
//! # Scope
//!
//! DFSP users only see merchants of their own DFSP. A merchant outside the
//! caller's scope is reported as not found rather than forbidden.

use std::collections::HashSet;

use sqlx::{PgConnection, Postgres, Transaction};
use uuid::Uuid;

use crate::{
    db::{DbPool, is_unique_violation},
    error::AppError,
    middleware::auth::AuthContext,
    models::{
        business_license::BusinessLicense,
        business_owner::BusinessOwner,
        checkout_counter::{CheckoutCounter, DEFAULT_ALIAS_TYPE},
        contact_person::ContactPerson,
        location::MerchantLocation,
        merchant::{
            BulkActionResponse, MERCHANT_COLUMNS, Merchant, MerchantDetailResponse,
            MerchantDraftRequest, MerchantDraftUpdateRequest, MerchantFilter,
            MerchantListResponse, MerchantStatusView, MerchantSummary, RegistrationStatus,
            RegistrationStatusRequest, ReviewDecision,
        },
    },
    services::{
        alias_service,
        merchant_query::{self, Pagination},
    },
};

/// Largest export served; bigger result sets must be narrowed with filters.
pub const MAX_EXPORT_ROWS: i64 = 10_000;

/// Load a merchant, optionally locking its row for the rest of the transaction.
async fn find_merchant(
    conn: &mut PgConnection,
    merchant_id: Uuid,
    for_update: bool,
) -> Result<Option<Merchant>, sqlx::Error> {
    let sql = format!(
        "SELECT {MERCHANT_COLUMNS} FROM merchants WHERE id = $1{}",
        if for_update { " FOR UPDATE" } else { "" }
    );
    sqlx::query_as::<_, Merchant>(&sql)
        .bind(merchant_id)
        .fetch_optional(conn)
        .await
}

/// Ensure the merchant is visible to the caller.
pub fn check_scope(auth: &AuthContext, merchant: &Merchant) -> Result<(), AppError> {
    if auth.can_access_dfsp(merchant.dfsp_id) {
        Ok(())
    } else {
        Err(AppError::NotFound("merchant"))
    }
}

/// The maker rule: only the drafting user edits, and only while editable.
pub fn check_maker(auth: &AuthContext, merchant: &Merchant) -> Result<(), AppError> {
    if merchant.created_by_id != auth.user_id {
        return Err(AppError::NotPermitted(
            "Only the user who drafted this merchant can modify it".to_string(),
        ));
    }
    if !merchant.registration_status.is_editable() {
        return Err(AppError::Validation(format!(
            "Merchant can not be modified while its registration status is {}",
            merchant.registration_status
        )));
    }
    Ok(())
}

/// The checker rule: the drafting user can not review their own merchant.
pub fn check_checker(auth: &AuthContext, merchant: &Merchant) -> Result<(), AppError> {
    if merchant.created_by_id == auth.user_id {
        return Err(AppError::NotPermitted(
            "The user who drafted this merchant can not also review it".to_string(),
        ));
    }
    Ok(())
}

/// Start a transaction for a maker edit: the merchant row is locked, in scope,
/// owned by the caller, and editable.
pub async fn begin_maker_edit(
    pool: &DbPool,
    auth: &AuthContext,
    merchant_id: Uuid,
) -> Result<(Transaction<'static, Postgres>, Merchant), AppError> {
    let mut tx = pool.begin().await?;
    let merchant = find_merchant(&mut tx, merchant_id, true)
        .await?
        .ok_or(AppError::NotFound("merchant"))?;
    check_scope(auth, &merchant)?;
    check_maker(auth, &merchant)?;
    Ok((tx, merchant))
}

/// Record a maker edit on the merchant row. A rejected merchant goes back to
/// Draft and loses its rejection reason and checker.
pub async fn touch_after_edit(conn: &mut PgConnection, merchant_id: Uuid) -> Result<(), AppError> {
    sqlx::query(TOUCH_AFTER_EDIT_SQL)
        .bind(merchant_id)
        .execute(conn)
        .await?;
    Ok(())
}

// Every SET expression reads the pre-update row, so the CASEs see the old status.
const TOUCH_AFTER_EDIT_SQL: &str = r#"
    UPDATE merchants
    SET updated_at = NOW(),
        registration_status_reason = CASE
            WHEN registration_status = 'Rejected' THEN NULL
            ELSE registration_status_reason
        END,
        checked_by_id = CASE
            WHEN registration_status = 'Rejected' THEN NULL
            ELSE checked_by_id
        END,
        registration_status = 'Draft'
    WHERE id = $1
"#;

/// Which DFSP a new draft belongs to: DFSP users always draft for their own
/// DFSP, hub users must say which one.
pub fn resolve_dfsp(auth: &AuthContext, requested: Option<Uuid>) -> Result<Uuid, AppError> {
    match auth.dfsp_scope() {
        Some(own) => Ok(own),
        None => requested.ok_or_else(|| {
            AppError::Validation("dfsp_id: is required when drafting as a hub user".to_string())
        }),
    }
}

fn alias_conflict(err: sqlx::Error) -> AppError {
    if is_unique_violation(&err) {
        AppError::Validation("payinto_alias: is already in use".to_string())
    } else {
        AppError::Database(err)
    }
}

/// Create a merchant draft with its license and first checkout counter.
///
/// # Errors
///
/// - `Validation`: bad fields, unknown DFSP, or the alias is already taken
/// - `Database`: database error occurred
pub async fn create_draft(
    pool: &DbPool,
    auth: &AuthContext,
    request: MerchantDraftRequest,
) -> Result<MerchantDetailResponse, AppError> {
    request.validate()?;
    let dfsp_id = resolve_dfsp(auth, request.dfsp_id)?;

    let mut tx = pool.begin().await?;

    let dfsp_active: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM dfsps WHERE id = $1 AND is_active)")
            .bind(dfsp_id)
            .fetch_one(&mut *tx)
            .await?;
    if !dfsp_active {
        return Err(AppError::Validation(
            "dfsp_id: unknown or inactive DFSP".to_string(),
        ));
    }

    if let Some(alias) = request.payinto_alias.as_deref() {
        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM checkout_counters WHERE alias_value = $1)",
        )
        .bind(alias)
        .fetch_one(&mut *tx)
        .await?;
        if taken {
            return Err(AppError::Validation(
                "payinto_alias: is already in use".to_string(),
            ));
        }
    }

    let merchant = sqlx::query_as::<_, Merchant>(&format!(
        r#"
        INSERT INTO merchants (
            dfsp_id, dba_trading_name, registered_name, employees_num, monthly_turnover,
            currency_code, category_code, merchant_type, registration_status, created_by_id
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'Draft', $9)
        RETURNING {MERCHANT_COLUMNS}
        "#
    ))
    .bind(dfsp_id)
    .bind(request.dba_trading_name.trim())
    .bind(request.registered_name.as_deref())
    .bind(request.employees_num)
    .bind(request.monthly_turnover.as_deref())
    .bind(&request.currency_code)
    .bind(&request.category_code)
    .bind(request.merchant_type)
    .bind(auth.user_id)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query("INSERT INTO business_licenses (merchant_id, license_number) VALUES ($1, $2)")
        .bind(merchant.id)
        .bind(request.license_number.trim())
        .execute(&mut *tx)
        .await?;

    sqlx::query(
        r#"
        INSERT INTO checkout_counters (merchant_id, description, alias_type, alias_value)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(merchant.id)
    .bind(request.checkout_description.as_deref())
    .bind(DEFAULT_ALIAS_TYPE)
    .bind(request.payinto_alias.as_deref())
    .execute(&mut *tx)
    .await
    .map_err(alias_conflict)?;

    tx.commit().await?;

    tracing::info!(
        merchant_id = %merchant.id,
        user_id = %auth.user_id,
        dfsp_id = %dfsp_id,
        "merchant draft created"
    );

    load_detail(pool, merchant).await
}

/// Update fields of a draft (or rejected) merchant.
pub async fn update_draft(
    pool: &DbPool,
    auth: &AuthContext,
    merchant_id: Uuid,
    request: MerchantDraftUpdateRequest,
) -> Result<MerchantDetailResponse, AppError> {
    request.validate()?;
    let (mut tx, _) = begin_maker_edit(pool, auth, merchant_id).await?;

    sqlx::query(
        r#"
        UPDATE merchants
        SET dba_trading_name = COALESCE($2, dba_trading_name),
            registered_name = COALESCE($3, registered_name),
            employees_num = COALESCE($4, employees_num),
            monthly_turnover = COALESCE($5, monthly_turnover),
            currency_code = COALESCE($6, currency_code),
            category_code = COALESCE($7, category_code),
            merchant_type = COALESCE($8, merchant_type)
        WHERE id = $1
        "#,
    )
    .bind(merchant_id)
    .bind(request.dba_trading_name.as_deref().map(str::trim))
    .bind(request.registered_name.as_deref())
    .bind(request.employees_num)
    .bind(request.monthly_turnover.as_deref())
    .bind(request.currency_code.as_deref())
    .bind(request.category_code.as_deref())
    .bind(request.merchant_type)
    .execute(&mut *tx)
    .await?;

    if let Some(number) = request.license_number.as_deref() {
        sqlx::query(
            r#"
            INSERT INTO business_licenses (merchant_id, license_number)
            VALUES ($1, $2)
            ON CONFLICT (merchant_id)
            DO UPDATE SET license_number = EXCLUDED.license_number, updated_at = NOW()
            "#,
        )
        .bind(merchant_id)
        .bind(number.trim())
        .execute(&mut *tx)
        .await?;
    }

    touch_after_edit(&mut tx, merchant_id).await?;
    tx.commit().await?;

    tracing::info!(merchant_id = %merchant_id, user_id = %auth.user_id, "merchant draft updated");

    get_merchant(pool, auth, merchant_id).await
}

/// Submit a draft for review (Draft -> Review).
///
/// The merchant needs at least one location and one contact person.
pub async fn ready_to_review(
    pool: &DbPool,
    auth: &AuthContext,
    merchant_id: Uuid,
) -> Result<MerchantDetailResponse, AppError> {
    let mut tx = pool.begin().await?;
    let merchant = find_merchant(&mut tx, merchant_id, true)
        .await?
        .ok_or(AppError::NotFound("merchant"))?;
    check_scope(auth, &merchant)?;
    if merchant.created_by_id != auth.user_id {
        return Err(AppError::NotPermitted(
            "Only the user who drafted this merchant can submit it for review".to_string(),
        ));
    }
    let next = merchant
        .registration_status
        .transition(RegistrationStatus::Review)?;

    let (locations, contacts): (i64, i64) = sqlx::query_as(
        r#"
        SELECT
            (SELECT COUNT(*) FROM merchant_locations WHERE merchant_id = $1),
            (SELECT COUNT(*) FROM contact_persons WHERE merchant_id = $1)
        "#,
    )
    .bind(merchant_id)
    .fetch_one(&mut *tx)
    .await?;
    completeness_check(locations, contacts)?;

    sqlx::query(
        r#"
        UPDATE merchants
        SET registration_status = $2,
            registration_status_reason = NULL,
            checked_by_id = NULL,
            updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(merchant_id)
    .bind(next)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!(merchant_id = %merchant_id, user_id = %auth.user_id, "merchant submitted for review");

    get_merchant(pool, auth, merchant_id).await
}

/// A merchant can only be reviewed once it has somewhere to be found and
/// someone to contact.
pub fn completeness_check(locations: i64, contact_persons: i64) -> Result<(), AppError> {
    let mut missing = Vec::new();
    if locations == 0 {
        missing.push("at least one location");
    }
    if contact_persons == 0 {
        missing.push("at least one contact person");
    }
    if missing.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "Merchant needs {} before review",
            missing.join(" and ")
        )))
    }
}

/// Record a checker decision on a merchant in review.
///
/// Approval moves the merchant to WaitingAliasGeneration and then runs alias
/// generation; if that fails the merchant stays waiting and can be retried.
pub async fn review(
    pool: &DbPool,
    auth: &AuthContext,
    merchant_id: Uuid,
    request: RegistrationStatusRequest,
) -> Result<MerchantDetailResponse, AppError> {
    let reason = request.validated_reason()?;
    let decision = request.registration_status;

    let mut tx = pool.begin().await?;
    let merchant = find_merchant(&mut tx, merchant_id, true)
        .await?
        .ok_or(AppError::NotFound("merchant"))?;
    check_scope(auth, &merchant)?;
    check_checker(auth, &merchant)?;
    let next = merchant
        .registration_status
        .transition(decision.target_status())?;

    apply_review(&mut tx, &[merchant_id], next, reason.as_deref(), auth.user_id).await?;
    tx.commit().await?;

    tracing::info!(
        merchant_id = %merchant_id,
        checker_id = %auth.user_id,
        decision = ?decision,
        status = %next,
        "merchant reviewed"
    );

    if decision == ReviewDecision::Approved {
        if let Err(err) = alias_service::generate_and_approve(pool, merchant_id).await {
            tracing::warn!(
                merchant_id = %merchant_id,
                error = %err,
                "alias generation failed; merchant left waiting"
            );
        }
    }

    get_merchant(pool, auth, merchant_id).await
}

async fn apply_review(
    conn: &mut PgConnection,
    merchant_ids: &[Uuid],
    status: RegistrationStatus,
    reason: Option<&str>,
    checker_id: Uuid,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE merchants
        SET registration_status = $2,
            registration_status_reason = $3,
            checked_by_id = $4,
            updated_at = NOW()
        WHERE id = ANY($1)
        "#,
    )
    .bind(merchant_ids)
    .bind(status)
    .bind(reason)
    .bind(checker_id)
    .execute(conn)
    .await?;
    Ok(())
}

/// Every reason a bulk review can not go ahead, one entry per offending id.
///
/// `found` holds the merchants that exist; ids with no row are reported as
/// not found, as are merchants outside the caller's scope.
pub fn bulk_violations(
    auth: &AuthContext,
    ids: &[Uuid],
    found: &[Merchant],
    target: RegistrationStatus,
) -> Vec<String> {
    let mut violations = Vec::new();

    for id in ids {
        let Some(merchant) = found.iter().find(|m| m.id == *id) else {
            violations.push(format!("{id}: not found"));
            continue;
        };
        if check_scope(auth, merchant).is_err() {
            violations.push(format!("{id}: not found"));
        } else if check_checker(auth, merchant).is_err() {
            violations.push(format!("{id}: drafted by the same user"));
        } else if !merchant.registration_status.can_transition_to(target) {
            violations.push(format!(
                "{id}: registration status is {}",
                merchant.registration_status
            ));
        }
    }

    violations
}

fn dedup_ids(ids: Vec<Uuid>) -> Result<Vec<Uuid>, AppError> {
    let mut seen = HashSet::new();
    let ids: Vec<Uuid> = ids.into_iter().filter(|id| seen.insert(*id)).collect();
    if ids.is_empty() {
        return Err(AppError::Validation("ids: must not be empty".to_string()));
    }
    Ok(ids)
}

/// Apply one checker decision to many merchants, all or nothing.
async fn bulk_review(
    pool: &DbPool,
    auth: &AuthContext,
    ids: Vec<Uuid>,
    decision: ReviewDecision,
    reason: Option<&str>,
) -> Result<Vec<Uuid>, AppError> {
    let ids = dedup_ids(ids)?;
    let target = decision.target_status();

    let mut tx = pool.begin().await?;
    let found = sqlx::query_as::<_, Merchant>(&format!(
        "SELECT {MERCHANT_COLUMNS} FROM merchants WHERE id = ANY($1) ORDER BY id FOR UPDATE"
    ))
    .bind(&ids)
    .fetch_all(&mut *tx)
    .await?;

    let violations = bulk_violations(auth, &ids, &found, target);
    if !violations.is_empty() {
        return Err(AppError::Validation(format!(
            "No merchants were updated: {}",
            violations.join("; ")
        )));
    }

    apply_review(&mut tx, &ids, target, reason, auth.user_id).await?;
    tx.commit().await?;

    tracing::info!(
        count = ids.len(),
        checker_id = %auth.user_id,
        decision = ?decision,
        "bulk review applied"
    );

    Ok(ids)
}

/// Approve many merchants in review, then generate their aliases.
pub async fn bulk_approve(
    pool: &DbPool,
    auth: &AuthContext,
    ids: Vec<Uuid>,
) -> Result<BulkActionResponse, AppError> {
    let ids = bulk_review(pool, auth, ids, ReviewDecision::Approved, None).await?;

    let mut merchants = Vec::with_capacity(ids.len());
    for id in ids {
        let registration_status = match alias_service::generate_and_approve(pool, id).await {
            Ok(_) => RegistrationStatus::Approved,
            Err(err) => {
                tracing::warn!(merchant_id = %id, error = %err, "alias generation failed; merchant left waiting");
                RegistrationStatus::WaitingAliasGeneration
            }
        };
        merchants.push(MerchantStatusView {
            id,
            registration_status,
        });
    }

    Ok(BulkActionResponse { merchants })
}

/// Reject many merchants in review with one shared reason.
pub async fn bulk_reject(
    pool: &DbPool,
    auth: &AuthContext,
    ids: Vec<Uuid>,
    reason: &str,
) -> Result<BulkActionResponse, AppError> {
    let reason = reason.trim();
    if reason.is_empty() {
        return Err(AppError::Validation("reason: must not be empty".to_string()));
    }

    let ids = bulk_review(pool, auth, ids, ReviewDecision::Rejected, Some(reason)).await?;

    Ok(BulkActionResponse {
        merchants: ids
            .into_iter()
            .map(|id| MerchantStatusView {
                id,
                registration_status: RegistrationStatus::Rejected,
            })
            .collect(),
    })
}

/// Retry alias generation for a merchant stuck in WaitingAliasGeneration.
pub async fn retry_alias_generation(
    pool: &DbPool,
    auth: &AuthContext,
    merchant_id: Uuid,
) -> Result<MerchantDetailResponse, AppError> {
    let merchant = find_merchant(&mut *pool.acquire().await?, merchant_id, false)
        .await?
        .ok_or(AppError::NotFound("merchant"))?;
    check_scope(auth, &merchant)?;
    check_checker(auth, &merchant)?;

    alias_service::generate_and_approve(pool, merchant_id).await?;

    get_merchant(pool, auth, merchant_id).await
}

/// Merchant with all related entities, scoped to the caller.
pub async fn get_merchant(
    pool: &DbPool,
    auth: &AuthContext,
    merchant_id: Uuid,
) -> Result<MerchantDetailResponse, AppError> {
    let merchant = find_merchant(&mut *pool.acquire().await?, merchant_id, false)
        .await?
        .ok_or(AppError::NotFound("merchant"))?;
    check_scope(auth, &merchant)?;
    load_detail(pool, merchant).await
}

async fn load_detail(pool: &DbPool, merchant: Merchant) -> Result<MerchantDetailResponse, AppError> {
    let locations = sqlx::query_as::<_, MerchantLocation>(
        "SELECT * FROM merchant_locations WHERE merchant_id = $1 ORDER BY created_at",
    )
    .bind(merchant.id)
    .fetch_all(pool)
    .await?;

    let checkout_counters = sqlx::query_as::<_, CheckoutCounter>(
        "SELECT * FROM checkout_counters WHERE merchant_id = $1 ORDER BY created_at",
    )
    .bind(merchant.id)
    .fetch_all(pool)
    .await?;

    let contact_persons = sqlx::query_as::<_, ContactPerson>(
        "SELECT * FROM contact_persons WHERE merchant_id = $1 ORDER BY created_at",
    )
    .bind(merchant.id)
    .fetch_all(pool)
    .await?;

    let business_owners = sqlx::query_as::<_, BusinessOwner>(
        "SELECT * FROM business_owners WHERE merchant_id = $1 ORDER BY created_at",
    )
    .bind(merchant.id)
    .fetch_all(pool)
    .await?;

    let business_license = sqlx::query_as::<_, BusinessLicense>(
        "SELECT * FROM business_licenses WHERE merchant_id = $1",
    )
    .bind(merchant.id)
    .fetch_optional(pool)
    .await?;

    Ok(MerchantDetailResponse {
        merchant,
        locations,
        checkout_counters,
        contact_persons,
        business_owners,
        business_license: business_license.map(Into::into),
    })
}

/// One page of merchants matching `filter`, newest first.
pub async fn list_merchants(
    pool: &DbPool,
    auth: &AuthContext,
    filter: &MerchantFilter,
    pagination: Pagination,
) -> Result<MerchantListResponse, AppError> {
    let scope = auth.dfsp_scope();

    let total_count: i64 = merchant_query::count_query(filter, scope)
        .build_query_scalar()
        .fetch_one(pool)
        .await?;

    let data = merchant_query::list_query(filter, scope, pagination)
        .build_query_as::<MerchantSummary>()
        .fetch_all(pool)
        .await?;

    Ok(MerchantListResponse {
        data,
        page: pagination.page,
        limit: pagination.limit,
        total_count,
        total_pages: pagination.total_pages(total_count),
    })
}

/// Refuse exports that would exceed `max_rows` instead of cutting them short.
pub fn check_export_size(total_count: i64, max_rows: i64) -> Result<(), AppError> {
    if total_count > max_rows {
        return Err(AppError::Validation(format!(
            "export: {total_count} merchants match, at most {max_rows} can be exported; narrow the filters"
        )));
    }
    Ok(())
}

/// Every merchant matching `filter` rendered as CSV.
///
/// # Errors
///
/// - `Validation`: more than `MAX_EXPORT_ROWS` merchants match
pub async fn export_merchants(
    pool: &DbPool,
    auth: &AuthContext,
    filter: &MerchantFilter,
) -> Result<Vec<u8>, AppError> {
    let scope = auth.dfsp_scope();

    let total_count: i64 = merchant_query::count_query(filter, scope)
        .build_query_scalar()
        .fetch_one(pool)
        .await?;
    check_export_size(total_count, MAX_EXPORT_ROWS)?;

    // The limit still guards against rows inserted after the count.
    let rows = merchant_query::export_query(filter, scope, MAX_EXPORT_ROWS)
        .build_query_as::<MerchantSummary>()
        .fetch_all(pool)
        .await?;

    tracing::info!(rows = rows.len(), user_id = %auth.user_id, "merchant export generated");

    render_csv(&rows)
}

/// CSV with a header row and one line per merchant.
pub fn render_csv(rows: &[MerchantSummary]) -> Result<Vec<u8>, AppError> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer
        .write_record([
            "id",
            "dba_trading_name",
            "registered_name",
            "merchant_type",
            "employees_num",
            "currency_code",
            "category_code",
            "registration_status",
            "registration_status_reason",
            "dfsp",
            "payinto_alias",
            "created_by",
            "checked_by",
            "created_at",
            "updated_at",
        ])
        .map_err(std::io::Error::from)?;

    for row in rows {
        writer
            .write_record([
                row.id.to_string(),
                row.dba_trading_name.clone(),
                row.registered_name.clone().unwrap_or_default(),
                row.merchant_type.as_str().to_string(),
                row.employees_num.as_str().to_string(),
                row.currency_code.clone(),
                row.category_code.clone(),
                row.registration_status.to_string(),
                row.registration_status_reason.clone().unwrap_or_default(),
                row.dfsp_name.clone(),
                row.payinto_alias.clone().unwrap_or_default(),
                row.created_by_name.clone(),
                row.checked_by_name.clone().unwrap_or_default(),
                row.created_at.to_rfc3339(),
                row.updated_at.to_rfc3339(),
            ])
            .map_err(std::io::Error::from)?;
    }

    writer
        .into_inner()
        .map_err(|err| AppError::Storage(err.into_error()))
}


/// Workflow tests against a real database. `#[sqlx::test]` creates a fresh
/// database per test from `DATABASE_URL` and applies `migrations/`.
#[cfg(test)]
mod workflow_tests {
    use super::*;
    use crate::middleware::auth::hash_token;
    use crate::models::merchant::{EmployeesNum, MerchantType};
    use crate::models::portal_user::PortalUserType;
    use crate::services::alias_service::ALIAS_LENGTH;
    use sqlx::PgPool;

    async fn seed_user(pool: &PgPool, dfsp_id: Uuid, name: &str) -> AuthContext {
        let user_id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO portal_users (name, email, api_key_hash, user_type, dfsp_id)
            VALUES ($1, $2, $3, 'Dfsp', $4)
            RETURNING id
            "#,
        )
        .bind(name)
        .bind(format!("{name}@greenbank.test"))
        .bind(hash_token(name))
        .bind(dfsp_id)
        .fetch_one(pool)
        .await
        .unwrap();

        AuthContext {
            user_id,
            name: name.to_string(),
            user_type: PortalUserType::Dfsp,
            dfsp_id: Some(dfsp_id),
        }
    }

    /// A DFSP with one maker and one checker.
    async fn seed(pool: &PgPool) -> (AuthContext, AuthContext) {
        let dfsp_id: Uuid = sqlx::query_scalar(
            "INSERT INTO dfsps (fspid, name, dfsp_type) VALUES ('greenbank', 'Green Bank', 'Bank') RETURNING id",
        )
        .fetch_one(pool)
        .await
        .unwrap();

        let maker = seed_user(pool, dfsp_id, "maker").await;
        let checker = seed_user(pool, dfsp_id, "checker").await;
        (maker, checker)
    }

    fn draft_request(name: &str, alias: Option<&str>) -> MerchantDraftRequest {
        MerchantDraftRequest {
            dba_trading_name: name.to_string(),
            registered_name: None,
            employees_num: EmployeesNum::OneToFive,
            monthly_turnover: None,
            currency_code: "USD".to_string(),
            category_code: "5814".to_string(),
            merchant_type: MerchantType::SmallShop,
            dfsp_id: None,
            license_number: format!("LIC-{name}"),
            payinto_alias: alias.map(str::to_string),
            checkout_description: Some("Front till".to_string()),
        }
    }

    async fn set_status(pool: &PgPool, ids: &[Uuid], status: RegistrationStatus) {
        sqlx::query("UPDATE merchants SET registration_status = $2 WHERE id = ANY($1)")
            .bind(ids)
            .bind(status)
            .execute(pool)
            .await
            .unwrap();
    }

    async fn statuses(pool: &PgPool, ids: &[Uuid]) -> Vec<RegistrationStatus> {
        sqlx::query_scalar("SELECT registration_status FROM merchants WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(pool)
            .await
            .unwrap()
    }

    fn decision(decision: ReviewDecision, reason: Option<&str>) -> RegistrationStatusRequest {
        RegistrationStatusRequest {
            registration_status: decision,
            reason: reason.map(str::to_string),
        }
    }

    #[sqlx::test]
    async fn duplicate_alias_is_a_validation_error(pool: PgPool) {
        let (maker, _) = seed(&pool).await;
        let first = create_draft(&pool, &maker, draft_request("Corner Coffee", Some("1234567890")))
            .await
            .unwrap();

        let err = create_draft(&pool, &maker, draft_request("Tea House", Some("1234567890")))
            .await
            .unwrap_err();
        assert!(matches!(&err, AppError::Validation(m) if m.contains("payinto_alias")));
        assert_eq!(err.status_and_code().0.as_u16(), 422);

        let merchants: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM merchants")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(merchants, 1);

        // A race past the pre-check hits the unique index instead.
        let raced = sqlx::query(
            "INSERT INTO checkout_counters (merchant_id, alias_value) VALUES ($1, '1234567890')",
        )
        .bind(first.merchant.id)
        .execute(&pool)
        .await
        .unwrap_err();
        assert!(is_unique_violation(&raced));
        assert!(matches!(alias_conflict(raced), AppError::Validation(m) if m.contains("payinto_alias")));
    }

    #[sqlx::test]
    async fn approval_assigns_an_alias_to_every_counter(pool: PgPool) {
        let (maker, checker) = seed(&pool).await;
        let draft = create_draft(&pool, &maker, draft_request("Corner Coffee", Some("55501234")))
            .await
            .unwrap();
        let id = draft.merchant.id;
        sqlx::query("INSERT INTO checkout_counters (merchant_id, description) VALUES ($1, 'Till 2')")
            .bind(id)
            .execute(&pool)
            .await
            .unwrap();
        set_status(&pool, &[id], RegistrationStatus::Review).await;

        let approved = review(&pool, &checker, id, decision(ReviewDecision::Approved, None))
            .await
            .unwrap();

        assert_eq!(approved.merchant.registration_status, RegistrationStatus::Approved);
        assert_eq!(approved.merchant.checked_by_id, Some(checker.user_id));
        assert_eq!(approved.checkout_counters.len(), 2);

        let aliases: Vec<&str> = approved
            .checkout_counters
            .iter()
            .map(|c| c.alias_value.as_deref().expect("alias assigned"))
            .collect();
        assert!(aliases.contains(&"55501234"));
        let generated = aliases.iter().find(|a| **a != "55501234").unwrap();
        assert_eq!(generated.len(), ALIAS_LENGTH);
        assert!(generated.chars().all(|c| c.is_ascii_digit()));
    }

    #[sqlx::test]
    async fn drafter_can_not_approve_their_own_merchant(pool: PgPool) {
        let (maker, _) = seed(&pool).await;
        let draft = create_draft(&pool, &maker, draft_request("Corner Coffee", None))
            .await
            .unwrap();
        let id = draft.merchant.id;
        set_status(&pool, &[id], RegistrationStatus::Review).await;

        let err = review(&pool, &maker, id, decision(ReviewDecision::Approved, None))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotPermitted(_)));
        assert_eq!(statuses(&pool, &[id]).await, vec![RegistrationStatus::Review]);
    }

    #[sqlx::test]
    async fn bulk_approve_is_all_or_nothing(pool: PgPool) {
        let (maker, checker) = seed(&pool).await;
        let a = create_draft(&pool, &maker, draft_request("Corner Coffee", None))
            .await
            .unwrap()
            .merchant
            .id;
        let b = create_draft(&pool, &maker, draft_request("Tea House", None))
            .await
            .unwrap()
            .merchant
            .id;
        set_status(&pool, &[a, b], RegistrationStatus::Review).await;

        let missing = Uuid::new_v4();
        let err = bulk_approve(&pool, &checker, vec![a, b, missing])
            .await
            .unwrap_err();
        assert!(matches!(&err, AppError::Validation(m) if m.contains(&missing.to_string())));
        assert_eq!(
            statuses(&pool, &[a, b]).await,
            vec![RegistrationStatus::Review, RegistrationStatus::Review]
        );

        let done = bulk_approve(&pool, &checker, vec![a, b]).await.unwrap();
        assert!(
            done.merchants
                .iter()
                .all(|m| m.registration_status == RegistrationStatus::Approved)
        );

        let without_alias: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM checkout_counters WHERE merchant_id = ANY($1) AND alias_value IS NULL",
        )
        .bind(&[a, b][..])
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(without_alias, 0);
    }

    #[sqlx::test]
    async fn editing_a_rejected_merchant_forgets_the_checker(pool: PgPool) {
        let (maker, checker) = seed(&pool).await;
        let id = create_draft(&pool, &maker, draft_request("Corner Coffee", None))
            .await
            .unwrap()
            .merchant
            .id;
        set_status(&pool, &[id], RegistrationStatus::Review).await;

        let rejected = review(
            &pool,
            &checker,
            id,
            decision(ReviewDecision::Rejected, Some("License expired")),
        )
        .await
        .unwrap();
        assert_eq!(rejected.merchant.checked_by_id, Some(checker.user_id));

        let edited = update_draft(
            &pool,
            &maker,
            id,
            MerchantDraftUpdateRequest {
                dba_trading_name: Some("Corner Coffee Co".to_string()),
                ..MerchantDraftUpdateRequest::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(edited.merchant.registration_status, RegistrationStatus::Draft);
        assert_eq!(edited.merchant.registration_status_reason, None);
        assert_eq!(edited.merchant.checked_by_id, None);

        let approved_by_checker = MerchantFilter {
            approved_by: Some(checker.user_id),
            ..MerchantFilter::default()
        };
        let listed = list_merchants(
            &pool,
            &checker,
            &approved_by_checker,
            Pagination { page: 1, limit: 20 },
        )
        .await
        .unwrap();
        assert_eq!(listed.total_count, 0);
    }
}
