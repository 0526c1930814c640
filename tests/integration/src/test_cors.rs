//! CORS integration tests.

#[cfg(test)]
mod tests {
    use http::{Method, StatusCode};

    use crate::{FRONTEND_ORIGIN, TestServer, client};

    #[tokio::test]
    async fn test_should_answer_preflight_from_frontend_origin() {
        let server = TestServer::start().await;
        let resp = client()
            .request(Method::OPTIONS, server.url("/storage/img"))
            .header(http::header::ORIGIN, FRONTEND_ORIGIN)
            .header(http::header::ACCESS_CONTROL_REQUEST_METHOD, "PUT")
            .send()
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let header = |name: http::header::HeaderName| {
            resp.headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(ToOwned::to_owned)
        };
        assert_eq!(
            header(http::header::ACCESS_CONTROL_ALLOW_ORIGIN).as_deref(),
            Some(FRONTEND_ORIGIN)
        );
        assert_eq!(
            header(http::header::ACCESS_CONTROL_ALLOW_CREDENTIALS).as_deref(),
            Some("true")
        );
        assert!(
            header(http::header::ACCESS_CONTROL_ALLOW_METHODS)
                .unwrap()
                .contains("PUT")
        );
    }

    #[tokio::test]
    async fn test_should_allow_null_origin() {
        let server = TestServer::start().await;
        let resp = client()
            .get(server.url("/health"))
            .header(http::header::ORIGIN, "null")
            .send()
            .await
            .unwrap();
        assert_eq!(
            resp.headers()
                .get(http::header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .and_then(|v| v.to_str().ok()),
            Some("null")
        );
    }

    #[tokio::test]
    async fn test_should_refuse_preflight_from_unknown_origin() {
        let server = TestServer::start().await;
        let resp = client()
            .request(Method::OPTIONS, server.url("/storage/img"))
            .header(http::header::ORIGIN, "https://evil.example.com")
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        assert!(
            !resp
                .headers()
                .contains_key(http::header::ACCESS_CONTROL_ALLOW_ORIGIN)
        );
    }

    #[tokio::test]
    async fn test_should_gate_cross_origin_requests_like_any_other() {
        let server = TestServer::start().await;
        let resp = client()
            .get(server.url("/storage/img?expires=99999999999&signature=forged"))
            .header(http::header::ORIGIN, FRONTEND_ORIGIN)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            resp.headers()
                .get(http::header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .and_then(|v| v.to_str().ok()),
            Some(FRONTEND_ORIGIN)
        );
    }
}
