//! Presigned URL upload, download, and rejection tests.

#[cfg(test)]
mod tests {
    use http::{Method, StatusCode};
    use signgate_auth::presigned::parse_presigned_params;

    use crate::{TestServer, client};

    fn unix_now() -> i64 {
        i64::try_from(
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_secs(),
        )
        .unwrap()
    }

    async fn error_json(resp: reqwest::Response) -> serde_json::Value {
        resp.json().await.expect("JSON error body")
    }

    #[tokio::test]
    async fn test_should_upload_then_download_through_presigned_urls() {
        let server = TestServer::start().await;
        let client = client();

        let resp = client
            .put(server.presign(&Method::PUT, "report.pdf", 300))
            .body("%PDF-1.7 contents")
            .send()
            .await
            .expect("upload");
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp.headers().contains_key("x-request-id"));
        assert_eq!(
            resp.text().await.unwrap(),
            "File uploaded successfully: report.pdf"
        );

        let resp = client
            .get(server.presign(&Method::GET, "report.pdf", 300))
            .send()
            .await
            .expect("download");
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers()
                .get(http::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok()),
            Some("application/pdf")
        );
        assert_eq!(resp.bytes().await.unwrap().as_ref(), b"%PDF-1.7 contents");
    }

    #[tokio::test]
    async fn test_should_store_file_field_of_form_upload() {
        let server = TestServer::start().await;
        let client = client();

        let resp = client
            .put(server.presign(&Method::PUT, "hello.txt", 300))
            .header(
                http::header::CONTENT_TYPE,
                "multipart/form-data; boundary=XyZ",
            )
            .body(
                "--XyZ\r\n\
                 Content-Disposition: form-data; name=\"file\"; filename=\"hello.txt\"\r\n\
                 Content-Type: text/plain\r\n\
                 \r\n\
                 Hello, World!\r\n\
                 --XyZ--\r\n",
            )
            .send()
            .await
            .expect("form upload");
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(server.gateway.len(), 1);

        let resp = client
            .get(server.presign(&Method::GET, "hello.txt", 300))
            .send()
            .await
            .expect("download");
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.text().await.unwrap(), "Hello, World!");
    }

    #[tokio::test]
    async fn test_should_reject_form_upload_without_boundary() {
        let server = TestServer::start().await;

        let resp = client()
            .put(server.presign(&Method::PUT, "hello.txt", 300))
            .header(http::header::CONTENT_TYPE, "multipart/form-data")
            .body("Hello, World!")
            .send()
            .await
            .expect("form upload");
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            error_json(resp).await["message"],
            "Missing boundary in multipart Content-Type"
        );
        assert!(server.gateway.is_empty());
    }

    #[tokio::test]
    async fn test_should_handle_percent_encoded_resource_ids() {
        let server = TestServer::start().await;
        let client = client();

        let url = server.presign(&Method::PUT, "summer photo.png", 300);
        assert!(url.contains("/storage/summer%20photo.png?"));
        let resp = client.put(url).body("png").send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = client
            .get(server.presign(&Method::GET, "summer photo.png", 300))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.bytes().await.unwrap().as_ref(), b"png");
    }

    #[tokio::test]
    async fn test_should_reject_expired_url_with_access_denied() {
        let server = TestServer::start().await;
        let url = server.presign_at(&Method::GET, "img", unix_now() - 60);

        let resp = client().get(url).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        let json = error_json(resp).await;
        assert_eq!(json["status"], 403);
        assert_eq!(json["message"], "Access denied");
    }

    #[tokio::test]
    async fn test_should_not_distinguish_expired_from_forged() {
        let server = TestServer::start().await;
        let client = client();

        let expired = client
            .get(server.presign_at(&Method::GET, "img", unix_now() - 60))
            .send()
            .await
            .unwrap();
        let forged = client
            .get(server.presign_with_foreign_key(&Method::GET, "img"))
            .send()
            .await
            .unwrap();

        assert_eq!(expired.status(), forged.status());
        assert_eq!(error_json(expired).await, error_json(forged).await);
    }

    #[tokio::test]
    async fn test_should_reject_download_url_used_for_upload() {
        let server = TestServer::start().await;

        let resp = client()
            .put(server.presign(&Method::GET, "victim.txt", 300))
            .body("overwrite")
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        assert!(server.gateway.is_empty());
    }

    #[tokio::test]
    async fn test_should_reject_url_replayed_on_other_resource() {
        let server = TestServer::start().await;
        let url = server.presign(&Method::PUT, "mine.txt", 300);
        let query = url.split_once('?').map(|(_, q)| q).unwrap();

        let resp = client()
            .put(server.url(&format!("/storage/theirs.txt?{query}")))
            .body("x")
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        assert!(server.gateway.is_empty());
    }

    #[tokio::test]
    async fn test_should_reject_extended_expiry() {
        let server = TestServer::start().await;
        let url = server.presign(&Method::GET, "img", 60);
        let query = url.split_once('?').map(|(_, q)| q).unwrap();
        let params = parse_presigned_params(query);
        let extended: i64 = params.expires.unwrap().parse::<i64>().unwrap() + 3600;

        let resp = client()
            .get(server.url(&format!(
                "/storage/img?expires={extended}&signature={}",
                params.signature.unwrap()
            )))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_should_reject_malformed_requests_with_bad_request() {
        let server = TestServer::start().await;
        let client = client();

        for path in [
            "/storage/img",
            "/storage/img?expires=99999999999",
            "/storage/img?signature=abc",
            "/storage/img?expires=&signature=abc",
            "/storage/img?expires=tomorrow&signature=abc",
            "/storage/?expires=99999999999&signature=abc",
        ] {
            let resp = client.get(server.url(path)).send().await.unwrap();
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{path}");
            assert_eq!(error_json(resp).await["status"], 400, "{path}");
        }
    }

    #[tokio::test]
    async fn test_should_return_not_found_for_authorized_missing_object() {
        let server = TestServer::start().await;
        let resp = client()
            .get(server.presign(&Method::GET, "ghost.bin", 300))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_should_reject_unsupported_method_on_object_route() {
        let server = TestServer::start().await;
        let resp = client()
            .delete(server.presign(&Method::DELETE, "img", 300))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_should_answer_health_and_unknown_paths() {
        let server = TestServer::start().await;
        let client = client();

        let resp = client.get(server.url("/health")).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(json["status"], "running");

        let resp = client
            .get(server.url("/storage/exhibits/images/1/2/img"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
