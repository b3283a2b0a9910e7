//! Token purchases via Stripe payment intents.
//!
//! Packages are priced in whole currency units and converted to integer minor
//! units before anything reaches the payment API. Tokens are credited only
//! after the client-observed success is verified against Stripe, and at most
//! once per intent.

pub mod handlers;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

const STRIPE_API_URL: &str = "https://api.stripe.com/v1";
const MINOR_UNITS_PER_WHOLE: i64 = 100;

/// Converts a whole-currency price (e.g. dollars) into minor units (cents).
pub fn to_minor_units(whole: i64) -> i64 {
    whole * MINOR_UNITS_PER_WHOLE
}

/// The token bundles offered in the app.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenPackage {
    Starter,
    Standard,
    Power,
}

impl TokenPackage {
    pub fn as_str(self) -> &'static str {
        match self {
            TokenPackage::Starter => "starter",
            TokenPackage::Standard => "standard",
            TokenPackage::Power => "power",
        }
    }

    pub fn parse(s: &str) -> Option<TokenPackage> {
        match s {
            "starter" => Some(TokenPackage::Starter),
            "standard" => Some(TokenPackage::Standard),
            "power" => Some(TokenPackage::Power),
            _ => None,
        }
    }

    pub fn tokens(self) -> i64 {
        match self {
            TokenPackage::Starter => 100,
            TokenPackage::Standard => 500,
            TokenPackage::Power => 1200,
        }
    }

    /// Price in whole currency units.
    pub fn price_whole(self) -> i64 {
        match self {
            TokenPackage::Starter => 5,
            TokenPackage::Standard => 20,
            TokenPackage::Power => 40,
        }
    }
}

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Stripe error (status {status}): {message}")]
    Api { status: u16, message: String },
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: Option<String>,
    pub status: String,
    pub amount: i64,
}

impl PaymentIntent {
    pub fn succeeded(&self) -> bool {
        self.status == "succeeded"
    }
}

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetail {
    message: String,
}

/// Minimal Stripe client: create and retrieve payment intents.
#[derive(Clone)]
pub struct StripeClient {
    client: Client,
    secret_key: String,
}

impl StripeClient {
    pub fn new(secret_key: String) -> Self {
        Self {
            client: Client::new(),
            secret_key,
        }
    }

    pub async fn create_payment_intent(
        &self,
        amount_minor: i64,
        currency: &str,
    ) -> Result<PaymentIntent, PaymentError> {
        let response = self
            .client
            .post(format!("{STRIPE_API_URL}/payment_intents"))
            .bearer_auth(&self.secret_key)
            .form(&[
                ("amount", amount_minor.to_string()),
                ("currency", currency.to_string()),
                ("automatic_payment_methods[enabled]", "true".to_string()),
            ])
            .send()
            .await?;

        Self::parse_response(response).await
    }

    pub async fn retrieve_intent(&self, intent_id: &str) -> Result<PaymentIntent, PaymentError> {
        let response = self
            .client
            .get(format!("{STRIPE_API_URL}/payment_intents/{intent_id}"))
            .bearer_auth(&self.secret_key)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    async fn parse_response(response: reqwest::Response) -> Result<PaymentIntent, PaymentError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<StripeErrorBody>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(PaymentError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let intent: PaymentIntent = response.json().await?;
        debug!("Stripe intent {} status {}", intent.id, intent.status);
        Ok(intent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whole_units_convert_to_cents() {
        assert_eq!(to_minor_units(5), 500);
        assert_eq!(to_minor_units(0), 0);
        assert_eq!(to_minor_units(40), 4000);
    }

    #[test]
    fn test_package_prices_are_whole_units() {
        for package in [TokenPackage::Starter, TokenPackage::Standard, TokenPackage::Power] {
            assert!(package.price_whole() > 0);
            assert_eq!(
                to_minor_units(package.price_whole()) % MINOR_UNITS_PER_WHOLE,
                0
            );
        }
    }

    #[test]
    fn test_larger_packages_have_better_rates() {
        let rate = |p: TokenPackage| p.tokens() as f64 / p.price_whole() as f64;
        assert!(rate(TokenPackage::Standard) > rate(TokenPackage::Starter));
        assert!(rate(TokenPackage::Power) > rate(TokenPackage::Standard));
    }

    #[test]
    fn test_package_round_trips_through_str() {
        for package in [TokenPackage::Starter, TokenPackage::Standard, TokenPackage::Power] {
            assert_eq!(TokenPackage::parse(package.as_str()), Some(package));
        }
        assert_eq!(TokenPackage::parse("jumbo"), None);
    }

    #[test]
    fn test_only_succeeded_intents_credit() {
        let intent = PaymentIntent {
            id: "pi_1".to_string(),
            client_secret: None,
            status: "requires_payment_method".to_string(),
            amount: 500,
        };
        assert!(!intent.succeeded());
    }
}
