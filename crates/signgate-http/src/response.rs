//! Response construction.
//!
//! Every error leaves the service as a JSON body:
//!
//! ```json
//! {"status": 403, "message": "Access denied"}
//! ```

use bytes::Bytes;
use http::StatusCode;
use http_body_util::Full;
use serde::Serialize;
use signgate_auth::AuthError;

use crate::gateway::{GatewayError, StoredObject};

/// Response type produced by every SignGate handler.
pub type GateResponse = http::Response<Full<Bytes>>;

/// An empty response body.
#[must_use]
pub fn empty_body() -> Full<Bytes> {
    Full::new(Bytes::new())
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    status: u16,
    message: &'a str,
}

/// Build a JSON error response.
#[must_use]
pub fn json_error(status: StatusCode, message: &str) -> GateResponse {
    let payload = ErrorBody {
        status: status.as_u16(),
        message,
    };
    let body = serde_json::to_vec(&payload).unwrap_or_else(|_| b"{}".to_vec());

    http::Response::builder()
        .status(status)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(Full::new(Bytes::from(body)))
        .unwrap_or_else(|_| {
            http::Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .body(empty_body())
                .expect("static response should be valid")
        })
}

/// Convert a gate rejection into its client-facing response.
#[must_use]
pub fn auth_error_to_response(err: &AuthError) -> GateResponse {
    json_error(err.status_code(), &err.public_message())
}

/// Convert a storage failure into its client-facing response.
#[must_use]
pub fn gateway_error_to_response(err: &GatewayError) -> GateResponse {
    json_error(err.status_code(), &err.public_message())
}

/// Response for a successful upload.
#[must_use]
pub fn upload_response(resource_id: &str) -> GateResponse {
    http::Response::builder()
        .status(StatusCode::OK)
        .header(http::header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .body(Full::new(Bytes::from(format!(
            "File uploaded successfully: {resource_id}"
        ))))
        .expect("static upload response should be valid")
}

/// Response serving a stored object. `head_only` omits the body but keeps
/// `Content-Length`.
#[must_use]
pub fn object_response(object: StoredObject, head_only: bool) -> GateResponse {
    let len = object.data.len();
    let body = if head_only {
        empty_body()
    } else {
        Full::new(object.data)
    };

    http::Response::builder()
        .status(StatusCode::OK)
        .header(http::header::CONTENT_TYPE, object.content_type.as_ref())
        .header(http::header::CONTENT_LENGTH, len)
        .body(body)
        .expect("object response headers should be valid")
}

/// Response for `GET /health`.
#[must_use]
pub fn health_check_response() -> GateResponse {
    http::Response::builder()
        .status(StatusCode::OK)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(Full::new(Bytes::from_static(br#"{"status":"running"}"#)))
        .expect("static health response should be valid")
}

#[cfg(test)]
mod tests {
    use http_body_util::BodyExt;

    use super::*;

    async fn body_json(resp: GateResponse) -> serde_json::Value {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_should_render_json_error() {
        let resp = json_error(StatusCode::BAD_REQUEST, "nope");
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            resp.headers()
                .get(http::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok()),
            Some("application/json")
        );
        let json = body_json(resp).await;
        assert_eq!(json["status"], 400);
        assert_eq!(json["message"], "nope");
    }

    #[tokio::test]
    async fn test_should_render_identical_bodies_for_expired_and_forged() {
        let expired = auth_error_to_response(&AuthError::RequestExpired {
            expires_at: 1,
            now: 2,
        });
        let forged = auth_error_to_response(&AuthError::SignatureDoesNotMatch);
        assert_eq!(expired.status(), StatusCode::FORBIDDEN);
        assert_eq!(forged.status(), StatusCode::FORBIDDEN);
        assert_eq!(body_json(expired).await, body_json(forged).await);
    }

    #[tokio::test]
    async fn test_should_serve_object_and_head() {
        let object = StoredObject {
            content_type: mime::IMAGE_PNG,
            data: Bytes::from_static(b"\x89PNG"),
        };

        let head = object_response(object.clone(), true);
        assert_eq!(
            head.headers()
                .get(http::header::CONTENT_LENGTH)
                .and_then(|v| v.to_str().ok()),
            Some("4")
        );
        let head_bytes = head.into_body().collect().await.unwrap().to_bytes();
        assert!(head_bytes.is_empty());

        let get = object_response(object, false);
        assert_eq!(
            get.headers()
                .get(http::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok()),
            Some("image/png")
        );
        let bytes = get.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(bytes, Bytes::from_static(b"\x89PNG"));
    }

    #[test]
    fn test_should_produce_health_check_response() {
        assert_eq!(health_check_response().status(), StatusCode::OK);
    }
}
