//! Alias generation for approved merchants.
//!
//! Once a checker approves a merchant it waits in `WaitingAliasGeneration`
//! until every checkout counter has an alias. This service assigns random
//! 10-digit aliases to the counters that still lack one and then marks the
//! merchant `Approved`, all in one transaction.

use rand::Rng;
use uuid::Uuid;

use crate::{
    db::DbPool,
    error::AppError,
    models::{
        checkout_counter::{CheckoutCounter, DEFAULT_ALIAS_TYPE},
        merchant::RegistrationStatus,
    },
};

/// Number of digits in a generated alias.
pub const ALIAS_LENGTH: usize = 10;

/// Attempts per counter before giving up on finding a free alias.
const MAX_ATTEMPTS: usize = 8;

/// A random numeric alias of `ALIAS_LENGTH` digits with a non-zero first digit.
pub fn random_alias<R: Rng + ?Sized>(rng: &mut R) -> String {
    let mut alias = String::with_capacity(ALIAS_LENGTH);
    alias.push(char::from(b'0' + rng.random_range(1..=9u8)));
    for _ in 1..ALIAS_LENGTH {
        alias.push(char::from(b'0' + rng.random_range(0..=9u8)));
    }
    alias
}

/// Assign aliases to the merchant's counters and approve it.
///
/// # Errors
///
/// - `NotFound`: merchant doesn't exist
/// - `InvalidTransition`: merchant is not waiting for alias generation
/// - `Validation`: no free alias found after `MAX_ATTEMPTS` tries
/// - `Database`: database error occurred
pub async fn generate_and_approve(
    pool: &DbPool,
    merchant_id: Uuid,
) -> Result<Vec<CheckoutCounter>, AppError> {
    let mut tx = pool.begin().await?;

    let status: RegistrationStatus =
        sqlx::query_scalar("SELECT registration_status FROM merchants WHERE id = $1 FOR UPDATE")
            .bind(merchant_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(AppError::NotFound("merchant"))?;
    let next = status.transition(RegistrationStatus::Approved)?;

    let pending: Vec<Uuid> = sqlx::query_scalar(
        r#"
        SELECT id FROM checkout_counters
        WHERE merchant_id = $1 AND alias_value IS NULL
        ORDER BY created_at
        FOR UPDATE
        "#,
    )
    .bind(merchant_id)
    .fetch_all(&mut *tx)
    .await?;

    for counter_id in pending {
        let mut assigned = false;

        for _ in 0..MAX_ATTEMPTS {
            let alias = random_alias(&mut rand::rng());

            // The NOT EXISTS guard keeps a collision from aborting the transaction.
            let updated = sqlx::query(
                r#"
                UPDATE checkout_counters
                SET alias_value = $1, alias_type = $2
                WHERE id = $3
                  AND NOT EXISTS (SELECT 1 FROM checkout_counters WHERE alias_value = $1)
                "#,
            )
            .bind(&alias)
            .bind(DEFAULT_ALIAS_TYPE)
            .bind(counter_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

            if updated == 1 {
                tracing::debug!(counter_id = %counter_id, alias = %alias, "alias assigned");
                assigned = true;
                break;
            }
        }

        if !assigned {
            tx.rollback().await?;
            return Err(AppError::Validation(format!(
                "Could not find a free alias for checkout counter {counter_id}"
            )));
        }
    }

    sqlx::query("UPDATE merchants SET registration_status = $2, updated_at = NOW() WHERE id = $1")
        .bind(merchant_id)
        .bind(next)
        .execute(&mut *tx)
        .await?;

    let counters = sqlx::query_as::<_, CheckoutCounter>(
        "SELECT * FROM checkout_counters WHERE merchant_id = $1 ORDER BY created_at",
    )
    .bind(merchant_id)
    .fetch_all(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!(merchant_id = %merchant_id, counters = counters.len(), "merchant approved");

    Ok(counters)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn aliases_are_ten_digits_without_leading_zero() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let alias = random_alias(&mut rng);
            assert_eq!(alias.len(), ALIAS_LENGTH);
            assert!(alias.chars().all(|c| c.is_ascii_digit()));
            assert_ne!(alias.as_bytes()[0], b'0');
        }
    }

    #[test]
    fn aliases_vary() {
        let mut rng = StdRng::seed_from_u64(11);
        let first = random_alias(&mut rng);
        let second = random_alias(&mut rng);
        assert_ne!(first, second);
    }
}
