//! Signed download-URL issuance for stored blobs.
//!
//! Credentials are minted locally: an HMAC over the object key, expiry, and
//! a per-issuance token, so every mint yields a distinct URL and no outbound
//! call is needed.

use crate::config::BlobConfig;
use chrono::{DateTime, Duration, Utc};
use secrecy::ExposeSecret;
use subtle::ConstantTimeEq;
use thiserror::Error;
use uuid::Uuid;

use super::flutterwave::compute_signature;

#[derive(Debug, Error)]
pub enum BlobError {
    #[error("blob signing secret is not configured")]
    NotConfigured,
}

/// A time-limited download credential for one stored object.
#[derive(Debug, Clone)]
pub struct SignedUrl {
    pub url: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct BlobStore {
    config: BlobConfig,
}

impl BlobStore {
    pub fn new(config: BlobConfig) -> Self {
        Self { config }
    }

    pub fn is_configured(&self) -> bool {
        !self.config.signing_secret.expose_secret().is_empty()
    }

    /// Mint a fresh signed URL for an object key with the configured expiry.
    pub fn signed_url(&self, key: &str) -> Result<SignedUrl, BlobError> {
        if !self.is_configured() {
            return Err(BlobError::NotConfigured);
        }

        let expires_at = Utc::now() + Duration::seconds(self.config.download_expiry_secs as i64);
        let expires = expires_at.timestamp();
        let token = Uuid::new_v4().to_string();
        let signature = self.sign(key, expires, &token);

        let base = self.config.base_url.trim_end_matches('/');
        let key = key.trim_start_matches('/');
        let url = format!(
            "{}/{}?expires={}&token={}&signature={}",
            base, key, expires, token, signature
        );

        Ok(SignedUrl { url, expires_at })
    }

    /// Check a previously minted credential. Used by the blob fetch path and
    /// by tests; expired credentials fail regardless of signature.
    pub fn verify(&self, key: &str, expires: i64, token: &str, signature: &str) -> bool {
        if !self.is_configured() || expires < Utc::now().timestamp() {
            return false;
        }
        let expected = self.sign(key.trim_start_matches('/'), expires, token);
        expected.as_bytes().ct_eq(signature.as_bytes()).into()
    }

    fn sign(&self, key: &str, expires: i64, token: &str) -> String {
        let payload = format!("{}:{}:{}", key, expires, token);
        compute_signature(
            payload.as_bytes(),
            self.config.signing_secret.expose_secret(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::Secret;

    fn test_store() -> BlobStore {
        BlobStore::new(BlobConfig {
            base_url: "https://blob.test/".to_string(),
            signing_secret: Secret::new("blob-secret".to_string()),
            download_expiry_secs: 86_400,
        })
    }

    fn query_param(url: &str, name: &str) -> String {
        let query = url.split_once('?').expect("url has query").1;
        query
            .split('&')
            .find_map(|pair| pair.strip_prefix(&format!("{}=", name)))
            .unwrap_or_else(|| panic!("missing query param {}", name))
            .to_string()
    }

    #[test]
    fn signed_url_references_exact_key_with_future_expiry() {
        let store = test_store();
        let signed = store.signed_url("blobs/p1/book.pdf").expect("mints");

        assert!(signed
            .url
            .starts_with("https://blob.test/blobs/p1/book.pdf?"));

        let now = Utc::now();
        assert!(signed.expires_at > now);
        assert!(signed.expires_at <= now + Duration::hours(24));
    }

    #[test]
    fn minted_credential_verifies() {
        let store = test_store();
        let signed = store.signed_url("blobs/p1/book.pdf").expect("mints");

        let expires: i64 = query_param(&signed.url, "expires").parse().expect("expires");
        let token = query_param(&signed.url, "token");
        let signature = query_param(&signed.url, "signature");

        assert!(store.verify("blobs/p1/book.pdf", expires, &token, &signature));
        assert!(!store.verify("blobs/p2/other.pdf", expires, &token, &signature));
        assert!(!store.verify("blobs/p1/book.pdf", expires - 200_000, &token, &signature));
    }

    #[test]
    fn reissuance_yields_distinct_urls() {
        let store = test_store();
        let first = store.signed_url("blobs/p1/book.pdf").expect("mints");
        let second = store.signed_url("blobs/p1/book.pdf").expect("mints");
        assert_ne!(first.url, second.url);
    }

    #[test]
    fn missing_secret_is_a_configuration_error() {
        let store = BlobStore::new(BlobConfig {
            base_url: "https://blob.test".to_string(),
            signing_secret: Secret::new(String::new()),
            download_expiry_secs: 86_400,
        });

        assert!(matches!(
            store.signed_url("blobs/p1/book.pdf"),
            Err(BlobError::NotConfigured)
        ));
    }
}
