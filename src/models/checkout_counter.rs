//! Checkout counter model.
//!
//! A checkout counter is the payment-collection point of a merchant. Payers
//! address it through its alias (`alias_value`), which is either supplied when
//! the merchant is drafted or generated once the merchant is approved.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::validation::Validator;

/// Alias type recorded for every generated or supplied alias.
pub const DEFAULT_ALIAS_TYPE: &str = "MERCHANT_PAYINTOID";

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct CheckoutCounter {
    pub id: Uuid,
    pub merchant_id: Uuid,
    pub merchant_location_id: Option<Uuid>,
    pub description: Option<String>,

    /// Phone number notified when a payment arrives at this counter
    pub notification_number: Option<String>,

    pub alias_type: String,

    /// Unique across all counters; NULL until assigned
    pub alias_value: Option<String>,

    pub created_at: DateTime<Utc>,
}

/// Request body for `PUT /api/v1/merchants/{id}/checkout-counters/{counter_id}`.
///
/// The alias itself can not be changed through this endpoint.
#[derive(Debug, Deserialize)]
pub struct CheckoutCounterUpdateRequest {
    pub description: Option<String>,
    pub notification_number: Option<String>,
    pub merchant_location_id: Option<Uuid>,
}

impl CheckoutCounterUpdateRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut v = Validator::new();
        v.optional("description", self.description.as_deref(), 1000);
        if let Some(number) = self.notification_number.as_deref() {
            v.phone_number("notification_number", number);
        }
        v.finish()
    }
}
