//! Flutterwave payment provider client.
//!
//! Implements hosted checkout session creation, verify-by-reference, and
//! webhook signature verification against the v3 API surface.

use crate::config::ProviderConfig;
use hmac::{Hmac, Mac};
use reqwest::{Client, StatusCode};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::time::Duration;
use subtle::ConstantTimeEq;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// The one transaction status that releases an entitlement.
pub const SUCCESS_STATUS: &str = "successful";

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("payment provider {0} is not configured")]
    NotConfigured(&'static str),

    #[error("payment provider request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("payment provider returned {status}")]
    Api {
        status: StatusCode,
        detail: serde_json::Value,
    },

    #[error("payment provider response missing {0}")]
    MissingData(&'static str),
}

/// Client for the Flutterwave API.
#[derive(Clone)]
pub struct FlutterwaveClient {
    client: Client,
    config: ProviderConfig,
}

/// Request to create a hosted checkout session.
#[derive(Debug, Serialize)]
pub struct CreateSessionRequest {
    pub tx_ref: String,
    pub amount: f64,
    pub currency: String,
    pub redirect_url: String,
    pub customer: Customer,
    pub meta: SessionMeta,
}

#[derive(Debug, Default, Serialize)]
pub struct Customer {
    pub email: String,
    pub phonenumber: String,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct SessionMeta {
    #[serde(rename = "productId")]
    pub product_id: String,
}

/// Envelope wrapping every provider response body; only the nested payload
/// matters, the outer status is advisory.
#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct SessionData {
    link: Option<String>,
}

/// Transaction payload returned by verify-by-reference.
#[derive(Debug, Deserialize)]
pub struct TransactionData {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub tx_ref: Option<String>,
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub currency: Option<String>,
    pub status: String,
}

/// Webhook event notification.
#[derive(Debug, Deserialize)]
pub struct WebhookEvent {
    pub event: String,
    pub data: WebhookCharge,
}

#[derive(Debug, Deserialize)]
pub struct WebhookCharge {
    #[serde(default)]
    pub id: Option<u64>,
    pub tx_ref: String,
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub currency: Option<String>,
    pub status: String,
}

impl FlutterwaveClient {
    pub fn new(config: ProviderConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    /// Check whether the API secret key is set.
    pub fn is_configured(&self) -> bool {
        !self.config.secret_key.expose_secret().is_empty()
    }

    /// Check whether the webhook shared secret is set.
    pub fn webhook_configured(&self) -> bool {
        !self.config.webhook_secret.expose_secret().is_empty()
    }

    /// Create a hosted checkout session and return its payment link.
    pub async fn create_session(
        &self,
        request: &CreateSessionRequest,
    ) -> Result<String, ProviderError> {
        if !self.is_configured() {
            return Err(ProviderError::NotConfigured("secret key"));
        }

        let url = format!("{}/payments", self.config.api_base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.config.secret_key.expose_secret())
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        tracing::debug!(status = %status, body = %body, "Flutterwave create_session response");

        if !status.is_success() {
            return Err(ProviderError::Api {
                status,
                detail: parse_detail(&body),
            });
        }

        let envelope: ApiEnvelope<SessionData> = serde_json::from_str(&body)
            .map_err(|_| ProviderError::MissingData("session payload"))?;
        let link = envelope
            .data
            .and_then(|d| d.link)
            .ok_or(ProviderError::MissingData("checkout link"))?;

        tracing::info!(tx_ref = %request.tx_ref, "Checkout session created");
        Ok(link)
    }

    /// Verify a transaction by its reference and return its payload.
    pub async fn verify_by_reference(
        &self,
        tx_ref: &str,
    ) -> Result<TransactionData, ProviderError> {
        if !self.is_configured() {
            return Err(ProviderError::NotConfigured("secret key"));
        }

        let url = format!(
            "{}/transactions/verify_by_reference",
            self.config.api_base_url
        );

        let response = self
            .client
            .get(&url)
            .query(&[("tx_ref", tx_ref)])
            .bearer_auth(self.config.secret_key.expose_secret())
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        tracing::debug!(status = %status, body = %body, "Flutterwave verify response");

        if !status.is_success() {
            return Err(ProviderError::Api {
                status,
                detail: parse_detail(&body),
            });
        }

        let envelope: ApiEnvelope<TransactionData> = serde_json::from_str(&body)
            .map_err(|_| ProviderError::MissingData("transaction data"))?;
        envelope
            .data
            .ok_or(ProviderError::MissingData("transaction data"))
    }

    /// Verify a webhook signature.
    ///
    /// The signature is hex(HMAC-SHA256(raw_body, webhook_secret)), carried
    /// in the `verif-hash` header. Comparison is constant-time.
    pub fn verify_webhook_signature(
        &self,
        body: &[u8],
        signature: &str,
    ) -> Result<bool, ProviderError> {
        if !self.webhook_configured() {
            return Err(ProviderError::NotConfigured("webhook secret"));
        }

        let expected = compute_signature(body, self.config.webhook_secret.expose_secret());
        let is_valid: bool = expected.as_bytes().ct_eq(signature.as_bytes()).into();

        if !is_valid {
            tracing::warn!("Webhook signature verification failed");
        }

        Ok(is_valid)
    }

    /// Parse a webhook event from a verified request body.
    pub fn parse_webhook_event(&self, body: &str) -> Result<WebhookEvent, serde_json::Error> {
        serde_json::from_str(body)
    }
}

/// Compute hex(HMAC-SHA256(payload, secret)).
pub fn compute_signature(payload: &[u8], secret: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}

fn parse_detail(body: &str) -> serde_json::Value {
    serde_json::from_str(body)
        .unwrap_or_else(|_| serde_json::Value::String(body.to_string()))
}
