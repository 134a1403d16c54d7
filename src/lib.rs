pub mod catalog;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

use axum::middleware::from_fn;
use axum::{
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use catalog::Catalog;
use config::Config;
use middleware::request_id_middleware;
use services::{BlobStore, FlutterwaveClient, PurchaseLedger};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub catalog: Catalog,
    pub provider: FlutterwaveClient,
    pub blobs: BlobStore,
    pub ledger: PurchaseLedger,
}

pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    pub async fn build(config: Config) -> anyhow::Result<Self> {
        let catalog = Catalog::load(&config.catalog.path)?;
        tracing::info!(products = catalog.len(), "Catalog loaded");

        let provider = FlutterwaveClient::new(config.provider.clone())?;
        if provider.is_configured() {
            tracing::info!("Payment provider client initialized");
        } else {
            tracing::warn!(
                "Payment provider secret key not configured - checkout and verification will fail"
            );
        }

        let blobs = BlobStore::new(config.blob.clone());
        let ledger = PurchaseLedger::new(config.ledger.path.clone());

        let state = AppState {
            config: config.clone(),
            catalog,
            provider,
            blobs,
            ledger,
        };

        let router = Router::new()
            .route("/health", get(handlers::health_check))
            .route("/api/createPayment", post(handlers::payments::create_payment))
            .route("/api/verifyPayment", get(handlers::payments::verify_payment))
            .route("/api/webhook", post(handlers::payments::webhook))
            .layer(from_fn(request_id_middleware))
            .layer(
                TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                    let request_id = request
                        .headers()
                        .get("x-request-id")
                        .and_then(|value| value.to_str().ok())
                        .unwrap_or("-");

                    tracing::info_span!(
                        "http_request",
                        request_id = %request_id,
                        method = %request.method(),
                        uri = %request.uri(),
                        version = ?request.version(),
                    )
                }),
            )
            .with_state(state);

        // Bind eagerly so a port of 0 resolves before the server starts;
        // tests rely on reading the assigned port back.
        let listener =
            TcpListener::bind(format!("{}:{}", config.server.host, config.server.port)).await?;
        let port = listener.local_addr()?.port();

        Ok(Self {
            port,
            listener,
            router,
        })
    }

    pub async fn run_until_stopped(self) -> anyhow::Result<()> {
        tracing::info!("Listening on {}", self.listener.local_addr()?);
        axum::serve(self.listener, self.router).await?;
        Ok(())
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}
