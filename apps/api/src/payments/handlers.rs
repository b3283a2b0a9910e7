//! Axum handlers for token purchases.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::ledger::{self, pricing::ActivityType};
use crate::payments::{to_minor_units, PaymentError, PaymentIntent, TokenPackage};
use crate::state::AppState;

impl From<PaymentError> for AppError {
    fn from(e: PaymentError) -> Self {
        AppError::Payment(e.to_string())
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateIntentRequest {
    pub user_id: Uuid,
    pub package: String,
}

#[derive(Debug, Serialize)]
pub struct CreateIntentResponse {
    pub intent_id: String,
    pub client_secret: Option<String>,
    pub amount_minor: i64,
    pub tokens: i64,
}

/// POST /api/v1/payments/intent
pub async fn handle_create_intent(
    State(state): State<AppState>,
    Json(req): Json<CreateIntentRequest>,
) -> Result<Json<CreateIntentResponse>, AppError> {
    let package = TokenPackage::parse(&req.package)
        .ok_or_else(|| AppError::Validation(format!("Unknown package '{}'", req.package)))?;

    let amount_minor = to_minor_units(package.price_whole());
    let intent = state
        .stripe
        .create_payment_intent(amount_minor, "usd")
        .await?;

    sqlx::query(
        r#"
        INSERT INTO token_purchases (id, user_id, intent_id, package, amount_minor, tokens)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(req.user_id)
    .bind(&intent.id)
    .bind(package.as_str())
    .bind(amount_minor)
    .bind(package.tokens())
    .execute(&state.db)
    .await?;

    info!(
        "Created payment intent {} for user {} ({} tokens)",
        intent.id,
        req.user_id,
        package.tokens()
    );

    Ok(Json(CreateIntentResponse {
        intent_id: intent.id,
        client_secret: intent.client_secret,
        amount_minor,
        tokens: package.tokens(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct ConfirmRequest {
    pub user_id: Uuid,
    pub intent_id: String,
}

#[derive(Debug, Serialize)]
pub struct ConfirmResponse {
    pub tokens_credited: i64,
    pub token_balance: i64,
}

/// A purchase credits only off a verified 'succeeded' intent; any other
/// status is reported back with the purchase row untouched.
fn require_succeeded(intent: &PaymentIntent) -> Result<(), AppError> {
    if intent.succeeded() {
        Ok(())
    } else {
        Err(AppError::Payment(format!(
            "Payment intent {} has status '{}', not 'succeeded'",
            intent.id, intent.status
        )))
    }
}

/// POST /api/v1/payments/confirm
///
/// Verifies the intent against Stripe rather than trusting the client, then
/// credits the purchase's tokens exactly once.
pub async fn handle_confirm(
    State(state): State<AppState>,
    Json(req): Json<ConfirmRequest>,
) -> Result<Json<ConfirmResponse>, AppError> {
    let intent = state.stripe.retrieve_intent(&req.intent_id).await?;
    require_succeeded(&intent)?;

    ledger::ensure_profile(&state.db, req.user_id).await?;

    // Claim and credit commit together: if the credit fails, the claim rolls
    // back too and a retried confirm can claim the row again. Only a fully
    // credited purchase ever ends up marked credited.
    let mut tx = state.db.begin().await?;

    let claimed: Option<(Uuid, i64)> = sqlx::query_as(
        r#"
        UPDATE token_purchases
        SET credited = TRUE
        WHERE intent_id = $1 AND user_id = $2 AND credited = FALSE
        RETURNING id, tokens
        "#,
    )
    .bind(&req.intent_id)
    .bind(req.user_id)
    .fetch_optional(&mut *tx)
    .await?;

    let (purchase_id, tokens) = claimed.ok_or_else(|| {
        AppError::Validation(format!(
            "Intent {} is unknown for this user or already credited",
            req.intent_id
        ))
    })?;

    let activity = ledger::credit_tokens_in_tx(
        &mut *tx,
        req.user_id,
        tokens,
        ActivityType::TokenPurchase,
        Some(purchase_id),
    )
    .await?;

    tx.commit().await?;

    Ok(Json(ConfirmResponse {
        tokens_credited: tokens,
        token_balance: activity.token_balance_after,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn intent(status: &str) -> PaymentIntent {
        PaymentIntent {
            id: "pi_1".to_string(),
            client_secret: None,
            status: status.to_string(),
            amount: 500,
        }
    }

    #[test]
    fn test_unsucceeded_intent_is_rejected_before_any_claim() {
        for status in ["requires_payment_method", "processing", "canceled"] {
            let err = require_succeeded(&intent(status)).unwrap_err();
            assert!(matches!(err, AppError::Payment(_)));
        }
    }

    #[test]
    fn test_succeeded_intent_passes_verification() {
        assert!(require_succeeded(&intent("succeeded")).is_ok());
    }
}
