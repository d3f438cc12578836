//! Merchant data models and API request/response types.
//!
//! This module defines:
//! - The enum-valued columns of the `merchants` table
//! - `Merchant`: Database entity representing a merchant application
//! - Request bodies for drafting, updating, and reviewing merchants
//! - Response bodies returned to clients

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::business_license::BusinessLicenseResponse;
use crate::models::business_owner::BusinessOwner;
use crate::models::checkout_counter::CheckoutCounter;
use crate::models::contact_person::ContactPerson;
use crate::models::location::MerchantLocation;
use crate::validation::Validator;

/// Workflow state of a merchant application.
///
/// ```text
/// Draft -> Review -> WaitingAliasGeneration -> Approved
///            |  \-> Rejected -> Draft (after edits)
///            \-> Draft (reverted by checker)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "registration_status")]
pub enum RegistrationStatus {
    Draft,
    Review,
    WaitingAliasGeneration,
    Approved,
    Rejected,
}

impl RegistrationStatus {
    /// Whether the workflow allows moving from `self` to `next`.
    pub fn can_transition_to(self, next: RegistrationStatus) -> bool {
        use RegistrationStatus::*;

        matches!(
            (self, next),
            (Draft, Review)
                | (Review, WaitingAliasGeneration)
                | (Review, Rejected)
                | (Review, Draft)
                | (WaitingAliasGeneration, Approved)
                | (Rejected, Draft)
        )
    }

    /// Validate a transition, returning the new status.
    pub fn transition(self, next: RegistrationStatus) -> Result<RegistrationStatus, AppError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(AppError::InvalidTransition {
                from: self,
                to: next,
            })
        }
    }

    /// Drafts and rejected applications may still be edited by their creator.
    pub fn is_editable(self) -> bool {
        matches!(self, RegistrationStatus::Draft | RegistrationStatus::Rejected)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RegistrationStatus::Draft => "Draft",
            RegistrationStatus::Review => "Review",
            RegistrationStatus::WaitingAliasGeneration => "WaitingAliasGeneration",
            RegistrationStatus::Approved => "Approved",
            RegistrationStatus::Rejected => "Rejected",
        }
    }
}

impl fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "merchant_type")]
pub enum MerchantType {
    Individual,
    #[serde(rename = "Small Shop")]
    #[sqlx(rename = "Small Shop")]
    SmallShop,
    #[serde(rename = "Chain Store")]
    #[sqlx(rename = "Chain Store")]
    ChainStore,
}

impl MerchantType {
    pub fn as_str(self) -> &'static str {
        match self {
            MerchantType::Individual => "Individual",
            MerchantType::SmallShop => "Small Shop",
            MerchantType::ChainStore => "Chain Store",
        }
    }
}

/// Headcount bracket reported by the merchant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "employees_num")]
pub enum EmployeesNum {
    #[serde(rename = "1 - 5")]
    #[sqlx(rename = "1 - 5")]
    OneToFive,
    #[serde(rename = "6 - 10")]
    #[sqlx(rename = "6 - 10")]
    SixToTen,
    #[serde(rename = "11 - 50")]
    #[sqlx(rename = "11 - 50")]
    ElevenToFifty,
    #[serde(rename = "51 - 100")]
    #[sqlx(rename = "51 - 100")]
    FiftyOneToHundred,
    #[serde(rename = "100 +")]
    #[sqlx(rename = "100 +")]
    OverHundred,
}

impl EmployeesNum {
    pub fn as_str(self) -> &'static str {
        match self {
            EmployeesNum::OneToFive => "1 - 5",
            EmployeesNum::SixToTen => "6 - 10",
            EmployeesNum::ElevenToFifty => "11 - 50",
            EmployeesNum::FiftyOneToHundred => "51 - 100",
            EmployeesNum::OverHundred => "100 +",
        }
    }
}

/// Represents a merchant record from the database.
///
/// # Database Table
///
/// Maps to the `merchants` table. Each merchant:
/// - Belongs to one DFSP (via `dfsp_id`)
/// - Was drafted by one portal user (`created_by_id`)
/// - Is checked (approved, rejected, reverted) by a different user (`checked_by_id`)
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Merchant {
    pub id: Uuid,
    pub dfsp_id: Uuid,
    pub dba_trading_name: String,
    pub registered_name: Option<String>,
    pub employees_num: EmployeesNum,
    pub monthly_turnover: Option<String>,
    pub currency_code: String,
    pub category_code: String,
    pub merchant_type: MerchantType,
    pub registration_status: RegistrationStatus,
    pub registration_status_reason: Option<String>,
    pub created_by_id: Uuid,
    pub checked_by_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Column list shared by every query that loads a full `Merchant`.
pub const MERCHANT_COLUMNS: &str = "id, dfsp_id, dba_trading_name, registered_name, employees_num, \
     monthly_turnover, currency_code, category_code, merchant_type, registration_status, \
     registration_status_reason, created_by_id, checked_by_id, created_at, updated_at";

/// Request body for creating a merchant draft.
///
/// # JSON Example
///
/// ```json
/// {
///   "dba_trading_name": "Corner Coffee",
///   "employees_num": "1 - 5",
///   "currency_code": "USD",
///   "category_code": "5814",
///   "merchant_type": "Small Shop",
///   "license_number": "LIC-2025-001",
///   "payinto_alias": "1234567890"
/// }
/// ```
///
/// `dfsp_id` is required for hub users and ignored for DFSP users, whose
/// merchants always belong to their own DFSP.
#[derive(Debug, Deserialize)]
pub struct MerchantDraftRequest {
    pub dba_trading_name: String,
    pub registered_name: Option<String>,
    pub employees_num: EmployeesNum,
    pub monthly_turnover: Option<String>,
    pub currency_code: String,
    pub category_code: String,
    pub merchant_type: MerchantType,
    pub dfsp_id: Option<Uuid>,
    pub license_number: String,
    /// Pre-assigned alias for the first checkout counter
    pub payinto_alias: Option<String>,
    pub checkout_description: Option<String>,
}

impl MerchantDraftRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut v = Validator::new();
        v.required("dba_trading_name", &self.dba_trading_name, 255);
        v.optional("registered_name", self.registered_name.as_deref(), 255);
        v.optional("monthly_turnover", self.monthly_turnover.as_deref(), 64);
        v.currency_code("currency_code", &self.currency_code);
        v.category_code("category_code", &self.category_code);
        v.required("license_number", &self.license_number, 128);
        if let Some(alias) = self.payinto_alias.as_deref() {
            v.alias("payinto_alias", alias);
        }
        v.finish()
    }
}

/// Partial update of a merchant draft. Absent fields keep their current value.
#[derive(Debug, Default, Deserialize)]
pub struct MerchantDraftUpdateRequest {
    pub dba_trading_name: Option<String>,
    pub registered_name: Option<String>,
    pub employees_num: Option<EmployeesNum>,
    pub monthly_turnover: Option<String>,
    pub currency_code: Option<String>,
    pub category_code: Option<String>,
    pub merchant_type: Option<MerchantType>,
    pub license_number: Option<String>,
}

impl MerchantDraftUpdateRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut v = Validator::new();
        if let Some(name) = self.dba_trading_name.as_deref() {
            v.required("dba_trading_name", name, 255);
        }
        v.optional("registered_name", self.registered_name.as_deref(), 255);
        v.optional("monthly_turnover", self.monthly_turnover.as_deref(), 64);
        if let Some(code) = self.currency_code.as_deref() {
            v.currency_code("currency_code", code);
        }
        if let Some(code) = self.category_code.as_deref() {
            v.category_code("category_code", code);
        }
        if let Some(number) = self.license_number.as_deref() {
            v.required("license_number", number, 128);
        }
        v.finish()
    }
}

/// Decision a checker can record on a merchant in review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum ReviewDecision {
    Approved,
    Rejected,
    /// Send back to the maker as a draft
    Reverted,
}

impl ReviewDecision {
    /// Status the merchant moves to immediately after this decision.
    pub fn target_status(self) -> RegistrationStatus {
        match self {
            ReviewDecision::Approved => RegistrationStatus::WaitingAliasGeneration,
            ReviewDecision::Rejected => RegistrationStatus::Rejected,
            ReviewDecision::Reverted => RegistrationStatus::Draft,
        }
    }

    pub fn requires_reason(self) -> bool {
        !matches!(self, ReviewDecision::Approved)
    }
}

/// Request body for `PUT /api/v1/merchants/{id}/registration-status`.
///
/// ```json
/// { "registration_status": "Rejected", "reason": "License document is unreadable" }
/// ```
#[derive(Debug, Deserialize)]
pub struct RegistrationStatusRequest {
    pub registration_status: ReviewDecision,
    pub reason: Option<String>,
}

impl RegistrationStatusRequest {
    /// Normalized reason, required for rejections and reverts.
    pub fn validated_reason(&self) -> Result<Option<String>, AppError> {
        let reason = self
            .reason
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string);

        if self.registration_status.requires_reason() && reason.is_none() {
            return Err(AppError::Validation(format!(
                "reason is required when the registration status is {:?}",
                self.registration_status
            )));
        }

        Ok(reason)
    }
}

/// Request body for bulk approve.
#[derive(Debug, Deserialize)]
pub struct BulkApproveRequest {
    pub ids: Vec<Uuid>,
}

/// Request body for bulk reject.
#[derive(Debug, Deserialize)]
pub struct BulkRejectRequest {
    pub ids: Vec<Uuid>,
    pub reason: String,
}

/// Id and resulting status of one merchant touched by a bulk action.
#[derive(Debug, Clone, Serialize)]
pub struct MerchantStatusView {
    pub id: Uuid,
    pub registration_status: RegistrationStatus,
}

/// Outcome of a bulk review action.
///
/// Approved merchants whose alias generation failed are reported as
/// `WaitingAliasGeneration`.
#[derive(Debug, Serialize)]
pub struct BulkActionResponse {
    pub merchants: Vec<MerchantStatusView>,
}

/// Querystring filters for listing and exporting merchants.
///
/// All fields are optional; dates match the calendar day in UTC.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct MerchantFilter {
    pub added_by: Option<Uuid>,
    pub approved_by: Option<Uuid>,
    pub added_time: Option<NaiveDate>,
    pub updated_time: Option<NaiveDate>,
    pub dba_name: Option<String>,
    pub merchant_id: Option<Uuid>,
    pub registration_status: Option<RegistrationStatus>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Merchant row as shown in listings, joined with user and DFSP names.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct MerchantSummary {
    pub id: Uuid,
    pub dba_trading_name: String,
    pub registered_name: Option<String>,
    pub merchant_type: MerchantType,
    pub employees_num: EmployeesNum,
    pub currency_code: String,
    pub category_code: String,
    pub registration_status: RegistrationStatus,
    pub registration_status_reason: Option<String>,
    pub dfsp_id: Uuid,
    pub dfsp_name: String,
    pub created_by_id: Uuid,
    pub created_by_name: String,
    pub checked_by_id: Option<Uuid>,
    pub checked_by_name: Option<String>,
    pub payinto_alias: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Paginated list response.
#[derive(Debug, Serialize)]
pub struct MerchantListResponse {
    pub data: Vec<MerchantSummary>,
    pub page: i64,
    pub limit: i64,
    pub total_count: i64,
    pub total_pages: i64,
}

/// Full merchant record with every related entity.
#[derive(Debug, Serialize)]
pub struct MerchantDetailResponse {
    #[serde(flatten)]
    pub merchant: Merchant,
    pub locations: Vec<MerchantLocation>,
    pub checkout_counters: Vec<CheckoutCounter>,
    pub contact_persons: Vec<ContactPerson>,
    pub business_owners: Vec<BusinessOwner>,
    pub business_license: Option<BusinessLicenseResponse>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workflow_allows_the_documented_path() {
        use RegistrationStatus::*;

        assert!(Draft.can_transition_to(Review));
        assert!(Review.can_transition_to(WaitingAliasGeneration));
        assert!(WaitingAliasGeneration.can_transition_to(Approved));
        assert!(Review.can_transition_to(Rejected));
        assert!(Review.can_transition_to(Draft));
        assert!(Rejected.can_transition_to(Draft));
    }

    #[test]
    fn workflow_rejects_shortcuts_and_reopening() {
        use RegistrationStatus::*;

        assert!(!Draft.can_transition_to(Approved));
        assert!(!Draft.can_transition_to(WaitingAliasGeneration));
        assert!(!Review.can_transition_to(Approved));
        assert!(!Approved.can_transition_to(Draft));
        assert!(!Approved.can_transition_to(Rejected));
        assert!(!Rejected.can_transition_to(Review));

        let err = Approved.transition(Review).unwrap_err();
        assert!(matches!(
            err,
            AppError::InvalidTransition {
                from: Approved,
                to: Review
            }
        ));
    }

    #[test]
    fn only_drafts_and_rejections_are_editable() {
        assert!(RegistrationStatus::Draft.is_editable());
        assert!(RegistrationStatus::Rejected.is_editable());
        assert!(!RegistrationStatus::Review.is_editable());
        assert!(!RegistrationStatus::WaitingAliasGeneration.is_editable());
        assert!(!RegistrationStatus::Approved.is_editable());
    }

    #[test]
    fn enum_labels_match_wire_format() {
        assert_eq!(
            serde_json::to_value(MerchantType::SmallShop).unwrap(),
            serde_json::json!("Small Shop")
        );
        assert_eq!(
            serde_json::from_value::<EmployeesNum>(serde_json::json!("100 +")).unwrap(),
            EmployeesNum::OverHundred
        );
        assert_eq!(
            serde_json::to_value(RegistrationStatus::WaitingAliasGeneration).unwrap(),
            serde_json::json!("WaitingAliasGeneration")
        );
    }

    #[test]
    fn review_decisions_map_to_statuses() {
        assert_eq!(
            ReviewDecision::Approved.target_status(),
            RegistrationStatus::WaitingAliasGeneration
        );
        assert_eq!(
            ReviewDecision::Rejected.target_status(),
            RegistrationStatus::Rejected
        );
        assert_eq!(
            ReviewDecision::Reverted.target_status(),
            RegistrationStatus::Draft
        );
    }

    #[test]
    fn rejection_requires_a_reason() {
        let request = RegistrationStatusRequest {
            registration_status: ReviewDecision::Rejected,
            reason: Some("   ".to_string()),
        };
        assert!(matches!(
            request.validated_reason(),
            Err(AppError::Validation(_))
        ));

        let approve = RegistrationStatusRequest {
            registration_status: ReviewDecision::Approved,
            reason: None,
        };
        assert_eq!(approve.validated_reason().unwrap(), None);
    }

    fn draft_request() -> MerchantDraftRequest {
        MerchantDraftRequest {
            dba_trading_name: "Corner Coffee".to_string(),
            registered_name: None,
            employees_num: EmployeesNum::OneToFive,
            monthly_turnover: Some("5000".to_string()),
            currency_code: "USD".to_string(),
            category_code: "5814".to_string(),
            merchant_type: MerchantType::SmallShop,
            dfsp_id: None,
            license_number: "LIC-001".to_string(),
            payinto_alias: Some("1234567890".to_string()),
            checkout_description: None,
        }
    }

    #[test]
    fn valid_draft_passes() {
        assert!(draft_request().validate().is_ok());
    }

    #[test]
    fn draft_validation_reports_every_bad_field() {
        let mut request = draft_request();
        request.dba_trading_name = " ".to_string();
        request.currency_code = "usd".to_string();
        request.payinto_alias = Some("abc".to_string());

        let message = match request.validate() {
            Err(AppError::Validation(message)) => message,
            other => panic!("expected validation error, got {:?}", other),
        };
        assert!(message.contains("dba_trading_name"));
        assert!(message.contains("currency_code"));
        assert!(message.contains("payinto_alias"));
    }

    #[test]
    fn empty_update_is_valid() {
        assert!(MerchantDraftUpdateRequest::default().validate().is_ok());
    }
}
