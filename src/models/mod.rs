use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A purchasable product from the catalog.
///
/// Sourced from an external JSON catalog; the service only reads the fields
/// needed for checkout and fulfillment, unknown fields are ignored.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Product {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    pub price: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Storage-object key of the purchasable file.
    #[serde(rename = "blob", default)]
    pub file_key: Option<String>,
}

fn default_currency() -> String {
    "NGN".to_string()
}

/// Correlation id between a checkout session and its eventual verification.
///
/// Issued as `{productId}-{creationTimestampMillis}`. The timestamp segment
/// is all digits, so parsing splits on the last separator; product ids
/// containing `-` stay unambiguous.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionReference(String);

impl TransactionReference {
    /// Issue a fresh reference for a product at the current instant.
    pub fn issue(product_id: &str) -> Self {
        Self(format!("{}-{}", product_id, Utc::now().timestamp_millis()))
    }

    /// Wrap a reference received from a client or webhook, unvalidated.
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Recover the product id this reference was issued for.
    ///
    /// Returns `None` when the reference is malformed: no separator, an
    /// empty product segment, or a non-numeric timestamp segment.
    pub fn product_id(&self) -> Option<&str> {
        let (product_id, timestamp) = self.0.rsplit_once('-')?;
        if product_id.is_empty()
            || timestamp.is_empty()
            || !timestamp.bytes().all(|b| b.is_ascii_digit())
        {
            return None;
        }
        Some(product_id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TransactionReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A completed purchase recorded from a verified webhook event.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PurchaseRecord {
    pub tx_ref: String,
    pub product_id: String,
    pub amount: f64,
    pub currency: String,
    pub status: PurchaseStatus,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PurchaseStatus {
    Completed,
    Failed,
}
