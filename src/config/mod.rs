use anyhow::Result;
use dotenvy::dotenv;
use secrecy::Secret;
use std::env;
use std::path::PathBuf;

#[derive(Clone, Debug)]
pub struct Config {
    pub server: ServerConfig,
    pub provider: ProviderConfig,
    pub blob: BlobConfig,
    pub catalog: CatalogConfig,
    pub ledger: LedgerConfig,
    pub service_name: String,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Public origin used to build the default post-payment redirect URL.
    pub base_url: String,
}

#[derive(Clone, Debug)]
pub struct ProviderConfig {
    pub secret_key: Secret<String>,
    pub webhook_secret: Secret<String>,
    pub api_base_url: String,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct BlobConfig {
    pub base_url: String,
    pub signing_secret: Secret<String>,
    pub download_expiry_secs: u64,
}

#[derive(Clone, Debug)]
pub struct CatalogConfig {
    pub path: PathBuf,
}

#[derive(Clone, Debug)]
pub struct LedgerConfig {
    pub path: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let host = env::var("STOREFRONT_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("STOREFRONT_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()?;
        let base_url =
            env::var("BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());

        // Empty secrets are allowed at startup; handlers fail with a
        // configuration error when the credential is actually needed.
        let secret_key = env::var("FLW_SECRET_KEY").unwrap_or_default();
        let webhook_secret = env::var("FLW_WEBHOOK_SECRET").unwrap_or_default();
        let api_base_url = env::var("FLW_API_BASE_URL")
            .unwrap_or_else(|_| "https://api.flutterwave.com/v3".to_string());
        let timeout_secs = env::var("PROVIDER_TIMEOUT_SECS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()?;

        let blob_base_url = env::var("BLOB_BASE_URL")
            .unwrap_or_else(|_| "https://blob.storefront.local".to_string());
        let blob_signing_secret = env::var("BLOB_SIGNING_SECRET").unwrap_or_default();
        let download_expiry_secs = env::var("DOWNLOAD_EXPIRY_SECS")
            .unwrap_or_else(|_| "86400".to_string())
            .parse()?;

        let catalog_path = env::var("CATALOG_PATH").unwrap_or_else(|_| "products.json".to_string());
        let ledger_path = env::var("LEDGER_PATH").unwrap_or_else(|_| "purchases.jsonl".to_string());

        Ok(Self {
            server: ServerConfig {
                host,
                port,
                base_url,
            },
            provider: ProviderConfig {
                secret_key: Secret::new(secret_key),
                webhook_secret: Secret::new(webhook_secret),
                api_base_url,
                timeout_secs,
            },
            blob: BlobConfig {
                base_url: blob_base_url,
                signing_secret: Secret::new(blob_signing_secret),
                download_expiry_secs,
            },
            catalog: CatalogConfig {
                path: PathBuf::from(catalog_path),
            },
            ledger: LedgerConfig {
                path: PathBuf::from(ledger_path),
            },
            service_name: "storefront-service".to_string(),
        })
    }
}
