use secrecy::Secret;
use storefront_service::config::{
    BlobConfig, CatalogConfig, Config, LedgerConfig, ProviderConfig, ServerConfig,
};
use storefront_service::services::flutterwave::compute_signature;
use storefront_service::services::PurchaseLedger;
use storefront_service::Application;
use tempfile::TempDir;
use wiremock::MockServer;

pub const WEBHOOK_SECRET: &str = "test-webhook-secret";
pub const BLOB_SECRET: &str = "test-blob-secret";

const CATALOG_FIXTURE: &str = r#"[
    {
        "id": "p1",
        "title": "Cucumber Farming Guide",
        "price": 1500.0,
        "currency": "NGN",
        "blob": "blobs/p1/book.pdf"
    },
    {
        "id": "p2",
        "title": "No Download Configured",
        "price": 900.0,
        "currency": "NGN"
    },
    {
        "id": "bundle-2024",
        "title": "Starter Bundle",
        "price": 5000.0,
        "currency": "NGN",
        "blob": "blobs/bundle-2024/bundle.zip"
    }
]"#;

pub struct TestSettings {
    pub provider_secret: String,
    pub provider_timeout_secs: u64,
}

impl Default for TestSettings {
    fn default() -> Self {
        Self {
            provider_secret: "FLWSECK_TEST-secret".to_string(),
            provider_timeout_secs: 5,
        }
    }
}

pub struct TestApp {
    pub address: String,
    pub provider: MockServer,
    pub ledger: PurchaseLedger,
    _dir: TempDir,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with(TestSettings::default()).await
    }

    pub async fn spawn_with(settings: TestSettings) -> Self {
        let provider = MockServer::start().await;

        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let catalog_path = dir.path().join("products.json");
        std::fs::write(&catalog_path, CATALOG_FIXTURE).expect("Failed to write catalog fixture");
        let ledger_path = dir.path().join("purchases.jsonl");

        let config = Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0, // Random port
                base_url: "http://localhost:3000".to_string(),
            },
            provider: ProviderConfig {
                secret_key: Secret::new(settings.provider_secret),
                webhook_secret: Secret::new(WEBHOOK_SECRET.to_string()),
                api_base_url: provider.uri(),
                timeout_secs: settings.provider_timeout_secs,
            },
            blob: BlobConfig {
                base_url: "https://blob.test".to_string(),
                signing_secret: Secret::new(BLOB_SECRET.to_string()),
                download_expiry_secs: 86_400,
            },
            catalog: CatalogConfig { path: catalog_path },
            ledger: LedgerConfig {
                path: ledger_path.clone(),
            },
            service_name: "storefront-service-test".to_string(),
        };

        let app = Application::build(config)
            .await
            .expect("Failed to build test application");
        let address = format!("http://127.0.0.1:{}", app.port());

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        TestApp {
            address,
            provider,
            ledger: PurchaseLedger::new(ledger_path),
            _dir: dir,
        }
    }

    /// Sign a webhook body the way the provider would.
    pub fn sign_webhook(&self, body: &str) -> String {
        compute_signature(body.as_bytes(), WEBHOOK_SECRET)
    }
}

/// Pull a single query parameter out of a URL.
pub fn query_param(url: &str, name: &str) -> String {
    let query = url.split_once('?').expect("url has a query string").1;
    query
        .split('&')
        .find_map(|pair| pair.strip_prefix(&format!("{}=", name)))
        .unwrap_or_else(|| panic!("missing query param {}", name))
        .to_string()
}
