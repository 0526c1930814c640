//! End-to-end tests for the SignGate HTTP service.
//!
//! Each test starts the real hyper service on an ephemeral loopback port, backed
//! by an in-memory storage gateway, and drives it over HTTP with `reqwest`.
//!
//! ```text
//! cargo test -p signgate-integration
//! ```

use std::sync::{Arc, Once};
use std::time::Duration;

use http::Method;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as HttpConnBuilder;
use signgate_auth::Signer;
use signgate_core::{SignGateConfig, SigningKey};
use signgate_http::gateway::MemoryStorageGateway;
use signgate_http::service::{GateHttpConfig, GateHttpService};
use tokio::net::TcpListener;

mod test_cors;
mod test_presigned;

static INIT: Once = Once::new();

/// Key shared by the server and the URL-minting side of the tests.
pub const TEST_SECRET_KEY: &str = "test-secret-key";

/// Origin allowed through `FRONTEND_DOMAIN`.
pub const FRONTEND_ORIGIN: &str = "https://app.example.com";

/// Initialize tracing (once).
fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// A running SignGate service.
#[derive(Debug)]
pub struct TestServer {
    /// `http://127.0.0.1:<port>`.
    pub base_url: String,
    /// Backing store, shared with the service.
    pub gateway: Arc<MemoryStorageGateway>,
    /// Signer holding the server's key.
    pub signer: Signer,
    /// Route prefix the service was configured with.
    pub route_prefix: String,
}

impl TestServer {
    /// Start a service on an ephemeral port.
    pub async fn start() -> Self {
        init_tracing();

        let config = SignGateConfig::from_lookup(|name| match name {
            "SIGNGATE_SECRET_KEY" => Some(TEST_SECRET_KEY.to_owned()),
            "FRONTEND_DOMAIN" => Some(format!("{FRONTEND_ORIGIN}/")),
            _ => None,
        })
        .expect("test configuration should load");

        let gateway = Arc::new(MemoryStorageGateway::new());
        let service = GateHttpService::from_shared(
            Arc::clone(&gateway),
            GateHttpConfig::from_config(&config),
        );

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind ephemeral port");
        let addr = listener.local_addr().expect("local addr");

        tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    continue;
                };
                let svc = service.clone();
                tokio::spawn(async move {
                    let http = HttpConnBuilder::new(TokioExecutor::new());
                    if let Err(e) = http.serve_connection(TokioIo::new(stream), svc).await {
                        tracing::debug!(error = %e, "test connection closed with error");
                    }
                });
            }
        });

        Self {
            base_url: format!("http://{addr}"),
            gateway,
            signer: Signer::new(config.signing_key.clone()),
            route_prefix: config.route_prefix,
        }
    }

    /// Mint a URL for `method` on `resource_id` valid for `ttl_secs` from now.
    #[must_use]
    pub fn presign(&self, method: &Method, resource_id: &str, ttl_secs: u64) -> String {
        self.signer
            .presign_for(method, resource_id, Duration::from_secs(ttl_secs))
            .expect("signing should succeed")
            .to_url(&self.base_url, &self.route_prefix)
    }

    /// Mint a URL for `method` on `resource_id` expiring at `expires_at`.
    #[must_use]
    pub fn presign_at(&self, method: &Method, resource_id: &str, expires_at: i64) -> String {
        self.signer
            .presign(method, resource_id, expires_at)
            .expect("signing should succeed")
            .to_url(&self.base_url, &self.route_prefix)
    }

    /// Mint a URL with a key other than the server's.
    #[must_use]
    pub fn presign_with_foreign_key(&self, method: &Method, resource_id: &str) -> String {
        Signer::new(SigningKey::new("some-other-key").expect("non-empty key"))
            .presign_for(method, resource_id, Duration::from_secs(300))
            .expect("signing should succeed")
            .to_url(&self.base_url, &self.route_prefix)
    }

    /// Absolute URL for a raw path and query.
    #[must_use]
    pub fn url(&self, path_and_query: &str) -> String {
        format!("{}{path_and_query}", self.base_url)
    }
}

/// An HTTP client for talking to a [`TestServer`].
#[must_use]
pub fn client() -> reqwest::Client {
    reqwest::Client::new()
}
