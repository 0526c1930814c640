//! Presigned URL gate, routing, and hyper service for SignGate.
//!
//! This crate is the HTTP layer in front of a file store. It handles:
//!
//! - **Routing** ([`router`]): Maps request paths to the health check, the gated
//!   object route, or not found.
//!
//! - **Gateway** ([`gateway`]): The [`StorageGateway`](gateway::StorageGateway)
//!   trait that authorized requests are dispatched to, plus an in-memory
//!   implementation.
//!
//! - **Response construction** ([`response`]): JSON error bodies, object and
//!   upload responses, health check.
//!
//! - **Service** ([`service`]): The main [`GateHttpService`](service::GateHttpService)
//!   that implements hyper's `Service` trait, tying routing, verification and
//!   dispatch together.
//!
//! - **Multipart** ([`multipart`]): Picks the `file` part out of
//!   `multipart/form-data` uploads; other upload bodies are stored as sent.
//!
//! # Architecture
//!
//! ```text
//! HTTP Request
//!   -> GateHttpService (hyper Service)
//!     -> CORS preflight / health check interception
//!     -> GateRouter (object route identification)
//!     -> verify_presigned (expiry, then signature)
//!     -> Body collection (uploads only, `file` part of multipart forms)
//!     -> StorageGateway
//!     -> Common response headers (x-request-id, Server, CORS)
//!   <- HTTP Response
//! ```
//!
//! No byte of an upload is read, and no storage call made, before the request
//! has passed the gate.
//!
//! # Usage
//!
//! ```no_run
//! use signgate_core::SignGateConfig;
//! use signgate_http::gateway::MemoryStorageGateway;
//! use signgate_http::service::{GateHttpConfig, GateHttpService};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = SignGateConfig::from_env()?;
//! let service = GateHttpService::new(
//!     MemoryStorageGateway::new(),
//!     GateHttpConfig::from_config(&config),
//! );
//! # let _ = service;
//! # Ok(())
//! # }
//! ```

pub mod gateway;
pub mod multipart;
pub mod response;
pub mod router;
pub mod service;

pub use gateway::{GatewayError, MemoryStorageGateway, StorageGateway, StoredObject};
pub use response::GateResponse;
pub use service::{GateHttpConfig, GateHttpService};
