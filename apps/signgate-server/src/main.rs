//! SignGate Server - a file store gated by HMAC-SHA256 presigned URLs.
//!
//! Every request on the object route must carry an `expires` timestamp and a
//! `signature` minted with the server's secret key. Expired or forged requests are
//! rejected before any byte of the file store is touched.
//!
//! # Usage
//!
//! ```text
//! SIGNGATE_SECRET_KEY=... signgate-server
//! SIGNGATE_SECRET_KEY=... signgate-server --presign PUT report.pdf 300
//! signgate-server --health-check
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `SIGNGATE_SECRET_KEY` | *(required)* | HMAC signing key |
//! | `GATEWAY_LISTEN` | `0.0.0.0:8080` | Bind address |
//! | `STORAGE_DIR` | `./uploads` | Object directory |
//! | `ROUTE_PREFIX` | `/storage` | Gated route prefix |
//! | `FRONTEND_DOMAIN` | *(unset)* | Extra allowed CORS origin |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |

mod storage;

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use http::Method;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as HttpConnBuilder;
use signgate_auth::Signer;
use signgate_core::{DEFAULT_GATEWAY_LISTEN, SignGateConfig};
use signgate_http::gateway::StorageGateway;
use signgate_http::service::{GateHttpConfig, GateHttpService};
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::storage::FsStorageGateway;

/// Server version reported at start-up.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the tracing subscriber.
///
/// Uses `RUST_LOG` if set, otherwise falls back to the `LOG_LEVEL` config value.
fn init_tracing(log_level: &str) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    Ok(())
}

/// Loopback form of a wildcard bind address, for local clients.
fn local_addr(gateway_listen: &str) -> String {
    gateway_listen.replace("0.0.0.0", "127.0.0.1")
}

/// Address probed by `--health-check`, from the raw `GATEWAY_LISTEN` value.
fn health_check_addr(gateway_listen: Option<String>) -> String {
    local_addr(gateway_listen.as_deref().unwrap_or(DEFAULT_GATEWAY_LISTEN))
}

/// Arguments of `--presign <METHOD> <RESOURCE_ID> <TTL_SECONDS> [BASE_URL]`.
#[derive(Debug, PartialEq, Eq)]
struct PresignArgs {
    method: Method,
    resource_id: String,
    ttl: Duration,
    base_url: Option<String>,
}

impl PresignArgs {
    /// Parse the arguments following `--presign`.
    fn parse(args: &[String]) -> Result<Self> {
        let [method, resource_id, ttl, rest @ ..] = args else {
            anyhow::bail!("usage: --presign <METHOD> <RESOURCE_ID> <TTL_SECONDS> [BASE_URL]");
        };
        if rest.len() > 1 {
            anyhow::bail!("unexpected arguments after BASE_URL: {:?}", &rest[1..]);
        }

        let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())
            .with_context(|| format!("invalid method: {method}"))?;
        let ttl = ttl
            .parse::<u64>()
            .with_context(|| format!("invalid TTL seconds: {ttl}"))?;

        Ok(Self {
            method,
            resource_id: resource_id.clone(),
            ttl: Duration::from_secs(ttl),
            base_url: rest.first().cloned(),
        })
    }
}

/// Mint a presigned URL for the configured key and render it.
fn run_presign(config: &SignGateConfig, args: &PresignArgs) -> Result<String> {
    let signer = Signer::new(config.signing_key.clone());
    let url = signer
        .presign_for(&args.method, &args.resource_id, args.ttl)
        .context("failed to sign presigned URL")?;

    let base_url = args
        .base_url
        .clone()
        .unwrap_or_else(|| format!("http://{}", local_addr(&config.gateway_listen)));

    Ok(url.to_url(&base_url, &config.route_prefix))
}

/// Run the accept loop, serving connections until a shutdown signal is received.
async fn serve<G: StorageGateway>(
    listener: TcpListener,
    service: GateHttpService<G>,
) -> Result<()> {
    let graceful = hyper_util::server::graceful::GracefulShutdown::new();
    let http = HttpConnBuilder::new(TokioExecutor::new());

    let shutdown = async {
        tokio::signal::ctrl_c().await.ok();
        info!("received shutdown signal, draining connections");
    };

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = listener.accept() => {
                let (stream, peer_addr) = match result {
                    Ok(conn) => conn,
                    Err(e) => {
                        warn!(error = %e, "failed to accept connection");
                        continue;
                    }
                };

                let svc = service.clone();
                let conn = http.serve_connection(TokioIo::new(stream), svc);
                let conn = graceful.watch(conn.into_owned());

                tokio::spawn(async move {
                    if let Err(e) = conn.await {
                        error!(peer_addr = %peer_addr, error = %e, "connection error");
                    }
                });
            }

            () = &mut shutdown => {
                info!("shutting down gracefully");
                break;
            }
        }
    }

    graceful.shutdown().await;
    info!("all connections drained, exiting");

    Ok(())
}

/// Probe `GET /health` on the local server.
async fn run_health_check(addr: &str) -> Result<()> {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    let stream = TcpStream::connect(addr)
        .await
        .with_context(|| format!("cannot connect to {addr}"))?;

    let (mut reader, mut writer) = stream.into_split();

    let request = format!("GET /health HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n");
    writer.write_all(request.as_bytes()).await?;
    writer.shutdown().await?;

    let mut response = String::new();
    reader.read_to_string(&mut response).await?;

    if response.contains("200 OK") && response.contains("\"status\":\"running\"") {
        Ok(())
    } else {
        anyhow::bail!("unhealthy response from {addr}")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    // Handle --health-check flag for Docker HEALTHCHECK. The key is not needed.
    if args.iter().any(|a| a == "--health-check") {
        let addr = health_check_addr(std::env::var("GATEWAY_LISTEN").ok());
        let healthy = run_health_check(&addr).await.is_ok();
        std::process::exit(i32::from(!healthy));
    }

    let config = SignGateConfig::from_env().context("invalid SignGate configuration")?;

    if let Some(pos) = args.iter().position(|a| a == "--presign") {
        let presign = PresignArgs::parse(&args[pos + 1..])?;
        println!("{}", run_presign(&config, &presign)?);
        return Ok(());
    }

    init_tracing(&config.log_level)?;

    tokio::fs::create_dir_all(&config.storage_dir)
        .await
        .with_context(|| {
            format!(
                "failed to create storage directory {}",
                config.storage_dir.display()
            )
        })?;

    let gateway = FsStorageGateway::new(config.storage_dir.clone());

    info!(
        gateway_listen = %config.gateway_listen,
        storage_dir = %gateway.root().display(),
        route_prefix = %config.route_prefix,
        cors_allowed_origins = ?config.cors_allowed_origins,
        version = VERSION,
        "starting SignGate Server",
    );

    let service = GateHttpService::new(gateway, GateHttpConfig::from_config(&config));

    let addr: SocketAddr = config
        .gateway_listen
        .parse()
        .with_context(|| format!("invalid bind address: {}", config.gateway_listen))?;

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;

    info!(%addr, "listening for connections");

    serve(listener, service).await
}
