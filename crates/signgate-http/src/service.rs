//! The main SignGate HTTP service implementing hyper's `Service` trait.
//!
//! [`GateHttpService`] handles:
//!
//! 1. CORS preflight requests (`OPTIONS`, any path)
//! 2. Health check (`GET /health`)
//! 3. Routing via [`GateRouter`]
//! 4. Presigned URL verification for the object route
//! 5. Body collection (uploads only, after verification), keeping the `file`
//!    part of `multipart/form-data` uploads
//! 6. Dispatch to the [`StorageGateway`]
//! 7. Common response headers (`x-request-id`, `Server`, CORS)

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use http::header::HeaderValue;
use http::{Method, StatusCode};
use http_body_util::BodyExt;
use hyper::body::Incoming;
use hyper::service::Service;
use signgate_auth::{AuthError, RejectionKind, Verifier, verify_presigned};
use signgate_core::SignGateConfig;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::gateway::StorageGateway;
use crate::multipart::upload_payload;
use crate::response::{
    GateResponse, auth_error_to_response, empty_body, gateway_error_to_response,
    health_check_response, json_error, object_response, upload_response,
};
use crate::router::{GateRouter, Route};

/// Methods served on the object route.
const OBJECT_METHODS: &str = "GET, HEAD, PUT";

/// Methods advertised to CORS preflights.
const CORS_ALLOW_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";

/// Configuration for the SignGate HTTP service.
#[derive(Debug, Clone)]
pub struct GateHttpConfig {
    /// Path prefix of the gated object route.
    pub route_prefix: String,
    /// Origins allowed to make cross-origin requests.
    pub cors_allowed_origins: Vec<String>,
    /// Verifier bound to the process signing key.
    pub verifier: Verifier,
}

impl GateHttpConfig {
    /// Build the HTTP configuration from the process configuration.
    #[must_use]
    pub fn from_config(config: &SignGateConfig) -> Self {
        Self {
            route_prefix: config.route_prefix.clone(),
            cors_allowed_origins: config.cors_allowed_origins.clone(),
            verifier: Verifier::from_key(config.signing_key.clone()),
        }
    }

    fn is_origin_allowed(&self, origin: &str) -> bool {
        self.cors_allowed_origins.iter().any(|o| o == origin)
    }
}

/// The SignGate HTTP service.
///
/// # Type Parameters
///
/// - `G`: The storage backend implementing [`StorageGateway`].
#[derive(Debug)]
pub struct GateHttpService<G: StorageGateway> {
    gateway: Arc<G>,
    router: GateRouter,
    config: Arc<GateHttpConfig>,
}

impl<G: StorageGateway> GateHttpService<G> {
    /// Create a new service with the given gateway and configuration.
    #[must_use]
    pub fn new(gateway: G, config: GateHttpConfig) -> Self {
        Self::from_shared(Arc::new(gateway), config)
    }

    /// Create a new service from an `Arc<G>` gateway and configuration.
    #[must_use]
    pub fn from_shared(gateway: Arc<G>, config: GateHttpConfig) -> Self {
        let router = GateRouter::new(config.route_prefix.clone());
        Self {
            gateway,
            router,
            config: Arc::new(config),
        }
    }
}

impl<G: StorageGateway> Clone for GateHttpService<G> {
    fn clone(&self) -> Self {
        Self {
            gateway: Arc::clone(&self.gateway),
            router: self.router.clone(),
            config: Arc::clone(&self.config),
        }
    }
}

impl<G: StorageGateway> Service<http::Request<Incoming>> for GateHttpService<G> {
    type Response = GateResponse;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: http::Request<Incoming>) -> Self::Future {
        let gateway = Arc::clone(&self.gateway);
        let router = self.router.clone();
        let config = Arc::clone(&self.config);

        Box::pin(async move {
            let request_id = Uuid::new_v4().to_string();
            let origin = allowed_origin(req.headers(), &config);

            let response =
                process_request(req, gateway.as_ref(), &router, &config, &request_id).await;

            Ok(add_common_headers(response, &request_id, origin))
        })
    }
}

/// Process an incoming HTTP request through the gate pipeline.
async fn process_request<B, G>(
    req: http::Request<B>,
    gateway: &G,
    router: &GateRouter,
    config: &GateHttpConfig,
    request_id: &str,
) -> GateResponse
where
    B: http_body::Body<Data = Bytes>,
    B::Error: std::fmt::Display,
    G: StorageGateway,
{
    let method = req.method().clone();
    debug!(%method, uri = %req.uri().path(), request_id, "processing request");

    if method == Method::OPTIONS {
        return cors_preflight_response(req.headers(), config);
    }

    match router.resolve(&method, req.uri().path()) {
        Route::Health => health_check_response(),
        Route::NotFound => json_error(StatusCode::NOT_FOUND, "Resource not found"),
        Route::Object { resource_id } => {
            handle_object(req, resource_id, gateway, config, request_id).await
        }
    }
}

/// Gate and dispatch a request on the object route.
async fn handle_object<B, G>(
    req: http::Request<B>,
    resource_id: Option<String>,
    gateway: &G,
    config: &GateHttpConfig,
    request_id: &str,
) -> GateResponse
where
    B: http_body::Body<Data = Bytes>,
    B::Error: std::fmt::Display,
    G: StorageGateway,
{
    if !matches!(*req.method(), Method::GET | Method::HEAD | Method::PUT) {
        let mut resp = json_error(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed");
        resp.headers_mut()
            .insert(http::header::ALLOW, HeaderValue::from_static(OBJECT_METHODS));
        return resp;
    }

    let (parts, body) = req.into_parts();

    let verified = match verify_presigned(&parts, resource_id.as_deref(), &config.verifier) {
        Ok(verified) => verified,
        Err(err) => {
            log_rejection(&err, &parts.method, resource_id.as_deref(), request_id);
            return auth_error_to_response(&err);
        }
    };

    info!(
        method = %verified.method,
        resource_id = %verified.resource_id,
        expires_at = verified.expires_at,
        request_id,
        "presigned request accepted"
    );

    let result = if verified.method == Method::PUT {
        let data = match body.collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(err) => {
                error!(error = %err, request_id, "failed to collect request body");
                return json_error(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to read request body",
                );
            }
        };
        let data = match upload_payload(&parts.headers, data) {
            Ok(data) => data,
            Err(err) => {
                warn!(error = %err, request_id, "rejected upload body");
                return json_error(StatusCode::BAD_REQUEST, &err.to_string());
            }
        };
        let size = data.len();
        gateway
            .put_object(verified.resource_id.clone(), data)
            .await
            .map(|()| {
                info!(resource_id = %verified.resource_id, size, request_id, "object stored");
                upload_response(&verified.resource_id)
            })
    } else {
        let head_only = verified.method == Method::HEAD;
        gateway
            .get_object(verified.resource_id.clone())
            .await
            .map(|object| object_response(object, head_only))
    };

    result.unwrap_or_else(|err| {
        let resource_id = verified.resource_id.as_str();
        if err.status_code().is_server_error() {
            error!(error = %err, resource_id, request_id, "storage gateway failed");
        } else {
            warn!(error = %err, resource_id, request_id, "storage gateway refused request");
        }
        gateway_error_to_response(&err)
    })
}

/// Record a gate rejection. Internal faults log at error level, rejected claims
/// at warn.
fn log_rejection(
    err: &AuthError,
    method: &Method,
    resource_id: Option<&str>,
    request_id: &str,
) {
    let kind = err.kind();
    if kind == RejectionKind::InternalFault {
        error!(
            reason = %kind,
            error = %err,
            %method,
            resource_id = ?resource_id,
            request_id,
            "signature processing failed"
        );
    } else {
        warn!(
            reason = %kind,
            error = %err,
            %method,
            resource_id = ?resource_id,
            request_id,
            "presigned request rejected"
        );
    }
}

/// The request's `Origin` header, if it is on the allow list.
fn allowed_origin(headers: &http::HeaderMap, config: &GateHttpConfig) -> Option<HeaderValue> {
    headers
        .get(http::header::ORIGIN)
        .filter(|v| v.to_str().is_ok_and(|o| config.is_origin_allowed(o)))
        .cloned()
}

/// Produce a CORS preflight response.
fn cors_preflight_response(
    headers: &http::HeaderMap,
    config: &GateHttpConfig,
) -> GateResponse {
    if headers.contains_key(http::header::ORIGIN) && allowed_origin(headers, config).is_none() {
        return json_error(StatusCode::FORBIDDEN, "Invalid CORS request");
    }

    let allow_headers = headers
        .get(http::header::ACCESS_CONTROL_REQUEST_HEADERS)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static("*"));

    http::Response::builder()
        .status(StatusCode::OK)
        .header(
            http::header::ACCESS_CONTROL_ALLOW_METHODS,
            CORS_ALLOW_METHODS,
        )
        .header(http::header::ACCESS_CONTROL_ALLOW_HEADERS, allow_headers)
        .header(http::header::ACCESS_CONTROL_MAX_AGE, "1800")
        .body(empty_body())
        .expect("static CORS response should be valid")
}

/// Add common response headers to every response.
fn add_common_headers(
    mut response: GateResponse,
    request_id: &str,
    origin: Option<HeaderValue>,
) -> GateResponse {
    let headers = response.headers_mut();

    if let Ok(hv) = HeaderValue::from_str(request_id) {
        headers.insert("x-request-id", hv);
    }
    headers.insert(http::header::SERVER, HeaderValue::from_static("SignGate"));

    if let Some(origin) = origin {
        headers.insert(http::header::ACCESS_CONTROL_ALLOW_ORIGIN, origin);
        headers.insert(
            http::header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
            HeaderValue::from_static("true"),
        );
        headers.insert(
            http::header::ACCESS_CONTROL_EXPOSE_HEADERS,
            HeaderValue::from_static("x-request-id"),
        );
        headers.append(http::header::VARY, HeaderValue::from_static("Origin"));
    }

    response
}
