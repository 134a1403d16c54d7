//! Checkout, verification, and webhook handlers.
//!
//! Implements session initiation against the payment provider, the
//! verify-then-issue entitlement flow, and signature-gated webhook intake.

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::{
    error::AppError,
    models::{PurchaseRecord, PurchaseStatus, TransactionReference},
    services::flutterwave::{
        CreateSessionRequest, Customer, SessionMeta, SUCCESS_STATUS,
    },
    AppState,
};

/// Request to initiate a checkout session.
#[derive(Debug, Deserialize)]
pub struct CreatePaymentRequest {
    #[serde(rename = "productId")]
    pub product_id: Option<String>,
    pub redirect_url: Option<String>,
    #[serde(rename = "customerEmail")]
    pub customer_email: Option<String>,
    #[serde(rename = "customerPhone")]
    pub customer_phone: Option<String>,
    #[serde(rename = "customerName")]
    pub customer_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreatePaymentResponse {
    #[serde(rename = "checkoutUrl")]
    pub checkout_url: String,
    pub tx_ref: String,
}

/// Create a hosted checkout session for a catalog product.
///
/// Stateless: nothing is persisted locally, the transaction reference alone
/// binds the eventual payment back to the product.
pub async fn create_payment(
    State(state): State<AppState>,
    Json(payload): Json<CreatePaymentRequest>,
) -> Result<Json<CreatePaymentResponse>, AppError> {
    let product_id = payload
        .product_id
        .as_deref()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::InvalidRequest("productId is required".to_string()))?;

    let product = state
        .catalog
        .get(product_id)
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

    let reference = TransactionReference::issue(&product.id);
    let redirect_url = payload.redirect_url.clone().unwrap_or_else(|| {
        format!("{}/payment-success.html", state.config.server.base_url)
    });

    tracing::info!(
        product_id = %product.id,
        tx_ref = %reference,
        amount = product.price,
        currency = %product.currency,
        "Creating checkout session"
    );

    let request = CreateSessionRequest {
        tx_ref: reference.as_str().to_string(),
        amount: product.price,
        currency: product.currency.clone(),
        redirect_url,
        customer: Customer {
            email: payload.customer_email.unwrap_or_default(),
            phonenumber: payload.customer_phone.unwrap_or_default(),
            name: payload.customer_name.unwrap_or_default(),
        },
        meta: SessionMeta {
            product_id: product.id.clone(),
        },
    };

    let checkout_url = state.provider.create_session(&request).await?;

    Ok(Json(CreatePaymentResponse {
        checkout_url,
        tx_ref: reference.as_str().to_string(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct VerifyPaymentParams {
    #[serde(alias = "txref", alias = "txrefid")]
    pub tx_ref: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct VerifyPaymentResponse {
    pub success: bool,
    #[serde(rename = "downloadUrl")]
    pub download_url: String,
}

/// Verify a payment by transaction reference and issue a download credential.
///
/// Idempotent: re-verifying a still-successful reference mints a fresh
/// credential with a fresh expiry; prior credentials are not invalidated.
pub async fn verify_payment(
    State(state): State<AppState>,
    Query(params): Query<VerifyPaymentParams>,
) -> Result<Json<VerifyPaymentResponse>, AppError> {
    let tx_ref = params
        .tx_ref
        .as_deref()
        .filter(|r| !r.is_empty())
        .ok_or_else(|| AppError::InvalidRequest("tx_ref is required".to_string()))?;

    let transaction = state.provider.verify_by_reference(tx_ref).await?;

    if transaction.status != SUCCESS_STATUS {
        tracing::info!(
            tx_ref = %tx_ref,
            status = %transaction.status,
            "Payment not successful"
        );
        return Err(AppError::PaymentNotSuccessful {
            status: transaction.status,
        });
    }

    let reference = TransactionReference::from_raw(tx_ref);
    let product_id = reference.product_id().ok_or_else(|| {
        AppError::InvalidRequest("Malformed transaction reference".to_string())
    })?;

    // The catalog may have changed between checkout and verification; an
    // unresolvable product is a hard failure, never a fallback.
    let product = state
        .catalog
        .get(product_id)
        .ok_or_else(|| AppError::NotFound("Product not found in catalog".to_string()))?;

    let file_key = product.file_key.as_deref().ok_or_else(|| {
        AppError::Configuration("No file key configured for this product".to_string())
    })?;

    let signed = state.blobs.signed_url(file_key)?;

    tracing::info!(
        tx_ref = %tx_ref,
        product_id = %product.id,
        expires_at = %signed.expires_at,
        "Download credential issued"
    );

    Ok(Json(VerifyPaymentResponse {
        success: true,
        download_url: signed.url,
    }))
}

pub const WEBHOOK_SIGNATURE_HEADER: &str = "verif-hash";

/// Provider webhook receiver.
///
/// The signature gate is a hard precondition: nothing is parsed or recorded
/// until the HMAC over the raw body checks out.
pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<StatusCode, AppError> {
    let signature = headers
        .get(WEBHOOK_SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            tracing::warn!("Missing webhook signature header");
            AppError::Unauthorized("Missing webhook signature".to_string())
        })?;

    let is_valid = state
        .provider
        .verify_webhook_signature(body.as_bytes(), signature)?;
    if !is_valid {
        return Err(AppError::Unauthorized("Invalid webhook signature".to_string()));
    }

    let event = state.provider.parse_webhook_event(&body).map_err(|e| {
        tracing::warn!(error = %e, "Failed to parse webhook event");
        AppError::InvalidRequest("Invalid webhook payload".to_string())
    })?;

    tracing::info!(event_type = %event.event, tx_ref = %event.data.tx_ref, "Processing webhook");

    match event.event.as_str() {
        "charge.completed" if event.data.status == SUCCESS_STATUS => {
            let reference = TransactionReference::from_raw(event.data.tx_ref.clone());
            match reference.product_id() {
                Some(product_id) => {
                    let record = PurchaseRecord {
                        tx_ref: event.data.tx_ref.clone(),
                        product_id: product_id.to_string(),
                        amount: event.data.amount.unwrap_or_default(),
                        currency: event.data.currency.clone().unwrap_or_default(),
                        status: PurchaseStatus::Completed,
                        recorded_at: Utc::now(),
                    };
                    state.ledger.record(&record).await?;
                }
                None => {
                    tracing::warn!(
                        tx_ref = %event.data.tx_ref,
                        "Webhook carried a malformed transaction reference, not recorded"
                    );
                }
            }
        }
        "charge.completed" => {
            tracing::info!(
                tx_ref = %event.data.tx_ref,
                status = %event.data.status,
                "Charge completed without success status"
            );
        }
        _ => {
            tracing::debug!(event_type = %event.event, "Unhandled webhook event type");
        }
    }

    Ok(StatusCode::OK)
}
