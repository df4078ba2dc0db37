use serde::Deserialize;
use std::time::Duration;

use crate::utils::AppError;

#[derive(Debug, Deserialize)]
struct StripePaymentIntent {
    id: String,
    client_secret: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetail {
    message: Option<String>,
}

/// Thin client for Stripe's PaymentIntents API
#[derive(Clone)]
pub struct PaymentClient {
    http: reqwest::Client,
    api_base: String,
    secret_key: String,
    currency: String,
}

impl PaymentClient {
    pub fn new(api_base: &str, secret_key: &str, currency: &str) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            secret_key: secret_key.to_string(),
            currency: currency.to_lowercase(),
        })
    }

    /// Creates a card payment intent for `amount` minor units and returns its client secret.
    /// `None` is sent as an empty amount and left for Stripe to reject.
    pub async fn create_payment_intent(&self, amount: Option<i64>) -> Result<String, AppError> {
        let amount = amount.map(|a| a.to_string()).unwrap_or_default();
        log::info!("💳 Creating payment intent: '{}' {} (minor units)", amount, self.currency);

        let url = format!("{}/v1/payment_intents", self.api_base);
        let form = [
            ("amount", amount.as_str()),
            ("currency", self.currency.as_str()),
            ("payment_method_types[]", "card"),
        ];

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.secret_key)
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response
                .json::<StripeErrorBody>()
                .await
                .ok()
                .and_then(|body| body.error.message)
                .unwrap_or_else(|| status.to_string());
            log::warn!("❌ Stripe rejected payment intent: {}", detail);
            return Err(AppError::PaymentError(detail));
        }

        let intent: StripePaymentIntent = response.json().await?;
        log::info!("✅ Payment intent created: {}", intent.id);

        intent
            .client_secret
            .ok_or_else(|| AppError::PaymentError("payment intent has no client secret".to_string()))
    }
}
