//! Token ledger: the one piece of shared state requiring mutual exclusion.
//!
//! Every billable action runs through [`log_activity`]: a single transaction
//! that locks the profile row, checks the balance, appends exactly one
//! activity row stamped with the resulting balance, and applies the balance
//! mutation. Credits take the same row lock, so a logged "balance after" is
//! never stale relative to a concurrent credit.

pub mod handlers;
pub mod pricing;

use sqlx::{PgConnection, PgPool};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::activity::ActivityRow;
use crate::models::user::UserProfileRow;
use pricing::{price_for, ActivityType};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("insufficient token balance: have {balance}, need {cost}")]
    InsufficientBalance { balance: i64, cost: i64 },
}

impl From<LedgerError> for AppError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::InsufficientBalance { balance, cost } => {
                AppError::InsufficientBalance { balance, cost }
            }
        }
    }
}

/// Applies a charge to a balance. Pure so the invariant is testable without a
/// database: a rejected charge leaves the balance unchanged.
pub fn charge(balance: i64, cost: i64) -> Result<i64, LedgerError> {
    if balance < cost {
        return Err(LedgerError::InsufficientBalance { balance, cost });
    }
    Ok(balance - cost)
}

#[derive(Debug, Clone)]
pub struct ActivityParams {
    pub user_id: Uuid,
    pub activity_type: ActivityType,
    pub resource_id: Option<Uuid>,
    /// Records a zero-cost activity row without touching the balance.
    pub skip_token_deduction: bool,
}

/// Deducts the action's price and appends the activity row, atomically.
/// On insufficient balance nothing is written and the balance is unchanged.
pub async fn log_activity(pool: &PgPool, params: ActivityParams) -> Result<ActivityRow, AppError> {
    let mut tx = pool.begin().await?;

    let balance: i64 = sqlx::query_scalar(
        "SELECT token_balance FROM user_profiles WHERE user_id = $1 FOR UPDATE",
    )
    .bind(params.user_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Profile {} not found", params.user_id)))?;

    let cost = if params.skip_token_deduction {
        0
    } else {
        price_for(params.activity_type)
    };

    let new_balance = charge(balance, cost)?;

    let activity: ActivityRow = sqlx::query_as(
        r#"
        INSERT INTO activities (id, user_id, activity_type, resource_id, tokens_used, token_balance_after)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(params.user_id)
    .bind(params.activity_type.as_str())
    .bind(params.resource_id)
    .bind(cost)
    .bind(new_balance)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query(
        "UPDATE user_profiles SET token_balance = $1, total_tokens_used = total_tokens_used + $2 WHERE user_id = $3",
    )
    .bind(new_balance)
    .bind(cost)
    .bind(params.user_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    info!(
        "Activity {} for user {}: -{} tokens, balance {}",
        params.activity_type.as_str(),
        params.user_id,
        cost,
        new_balance
    );

    Ok(activity)
}

/// Credit body, runnable inside a caller-owned transaction. Purchase
/// confirmation uses this so the purchase-row claim and the credit commit or
/// roll back together. Takes the same profile row lock as deductions and
/// records its own activity row, with `tokens_used` negative for credits.
pub async fn credit_tokens_in_tx(
    conn: &mut PgConnection,
    user_id: Uuid,
    amount: i64,
    activity_type: ActivityType,
    resource_id: Option<Uuid>,
) -> Result<ActivityRow, AppError> {
    if amount <= 0 {
        return Err(AppError::Validation(
            "Credit amount must be positive".to_string(),
        ));
    }

    let balance: i64 = sqlx::query_scalar(
        "SELECT token_balance FROM user_profiles WHERE user_id = $1 FOR UPDATE",
    )
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Profile {user_id} not found")))?;

    let new_balance = balance + amount;

    let activity: ActivityRow = sqlx::query_as(
        r#"
        INSERT INTO activities (id, user_id, activity_type, resource_id, tokens_used, token_balance_after)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(activity_type.as_str())
    .bind(resource_id)
    .bind(-amount)
    .bind(new_balance)
    .fetch_one(&mut *conn)
    .await?;

    sqlx::query("UPDATE user_profiles SET token_balance = $1 WHERE user_id = $2")
        .bind(new_balance)
        .bind(user_id)
        .execute(&mut *conn)
        .await?;

    info!("Credited {amount} tokens to user {user_id}, balance {new_balance}");

    Ok(activity)
}

/// Credits tokens (admin grant) in its own transaction.
pub async fn credit_tokens(
    pool: &PgPool,
    user_id: Uuid,
    amount: i64,
    activity_type: ActivityType,
    resource_id: Option<Uuid>,
) -> Result<ActivityRow, AppError> {
    let mut tx = pool.begin().await?;
    let activity =
        credit_tokens_in_tx(&mut *tx, user_id, amount, activity_type, resource_id).await?;
    tx.commit().await?;
    Ok(activity)
}

/// Creates the profile on first contact; no-op if it already exists.
pub async fn ensure_profile(pool: &PgPool, user_id: Uuid) -> Result<(), AppError> {
    sqlx::query("INSERT INTO user_profiles (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn get_profile(pool: &PgPool, user_id: Uuid) -> Result<UserProfileRow, AppError> {
    sqlx::query_as("SELECT * FROM user_profiles WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Profile {user_id} not found")))
}

/// Read-only balance check used to block actions before any task is created.
pub async fn require_balance(
    pool: &PgPool,
    user_id: Uuid,
    activity_type: ActivityType,
) -> Result<(), AppError> {
    let profile = get_profile(pool, user_id).await?;
    charge(profile.token_balance, price_for(activity_type))?;
    Ok(())
}

pub async fn list_activities(pool: &PgPool, user_id: Uuid) -> Result<Vec<ActivityRow>, AppError> {
    Ok(sqlx::query_as(
        "SELECT * FROM activities WHERE user_id = $1 ORDER BY created_at DESC LIMIT 100",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_charge_deducts_cost() {
        assert_eq!(charge(50, 15), Ok(35));
    }

    #[test]
    fn test_insufficient_balance_rejects_and_reports_both_sides() {
        // balance=10 against cost=15 must fail and leave the balance as-is.
        let err = charge(10, 15).unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientBalance {
                balance: 10,
                cost: 15
            }
        );
    }

    #[test]
    fn test_exact_balance_is_spendable_to_zero() {
        assert_eq!(charge(15, 15), Ok(0));
    }

    #[test]
    fn test_zero_cost_charge_keeps_balance() {
        // skip_token_deduction path: tokens_used = 0, balance unchanged.
        assert_eq!(charge(50, 0), Ok(50));
    }

    #[test]
    fn test_balance_never_goes_negative() {
        for balance in [0, 1, 9, 14] {
            assert!(charge(balance, 15).is_err());
        }
    }
}
