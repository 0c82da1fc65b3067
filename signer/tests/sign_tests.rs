mod common;

use std::time::Duration;

use axum::body::Body;
use common::*;
use http::StatusCode;
use serde_json::json;
use signer::{object_storage::StorageError, types::SignerConfig};

const SIGN_ROUTE: &str = "/api/b2/sign";

// Happy path tests

#[tokio::test]
async fn test_sign_happy_path() {
    let setup = TestSetup::default_setup();

    let response = setup
        .send_post_request(
            SIGN_ROUTE,
            json!({ "key": "users/u1/laudos/laudo-p1.pdf", "contentType": "application/pdf" }),
        )
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::OK);

    let body = parse_response_body(response).await;
    assert_eq!(body["type"], "put");
    assert!(!body["url"].as_str().unwrap().is_empty());
    assert_eq!(body["headers"], json!({}));
    assert_eq!(
        body["publicUrl"],
        "https://cdn.example.com/users/u1/laudos/laudo-p1.pdf"
    );

    let calls = setup.presigner.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].bucket, "laudos");
    assert_eq!(calls[0].key, "users/u1/laudos/laudo-p1.pdf");
    assert_eq!(calls[0].content_type, "application/pdf");
    assert_eq!(calls[0].expires_in, Duration::from_secs(600));
}

#[tokio::test]
async fn test_sign_defaults_content_type() {
    let setup = TestSetup::default_setup();

    for payload in [
        json!({ "key": "a.bin" }),
        json!({ "key": "a.bin", "contentType": "" }),
        json!({ "key": "a.bin", "contentType": null }),
    ] {
        let response = setup
            .send_post_request(SIGN_ROUTE, payload)
            .await
            .expect("Failed to send request");
        assert_eq!(response.status(), StatusCode::OK);
    }

    assert!(setup
        .presigner
        .calls()
        .iter()
        .all(|call| call.content_type == "application/octet-stream"));
}

#[tokio::test]
async fn test_sign_accepts_metadata_and_any_path() {
    let setup = TestSetup::default_setup();

    for route in ["/", "/sign", "/api/b2/sign"] {
        let response = setup
            .send_post_request(
                route,
                json!({ "key": "a.bin", "metadata": { "patient": "p1" } }),
            )
            .await
            .expect("Failed to send request");

        assert_eq!(response.status(), StatusCode::OK, "Failed for route {route}");
    }
}

#[tokio::test]
async fn test_sign_without_public_base_returns_null_public_url() {
    let setup = TestSetup::new(SignerConfig {
        public_base_url: None,
        ..test_config()
    });

    let response = setup
        .send_post_request(SIGN_ROUTE, json!({ "key": "a.bin" }))
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    assert!(body["publicUrl"].is_null());
}

#[tokio::test]
async fn test_sign_with_real_presigner_expires_in_600_seconds() {
    let setup = offline_s3_setup(test_config()).await;

    for (key, content_type) in [
        ("users/u1/laudos/laudo-p1.pdf", Some("application/pdf")),
        ("users/u1/logo.png", Some("image/png")),
        ("x", None),
    ] {
        let mut payload = json!({ "key": key });
        if let Some(content_type) = content_type {
            payload["contentType"] = json!(content_type);
        }

        let response = setup
            .send_post_request(SIGN_ROUTE, payload)
            .await
            .expect("Failed to send request");
        assert_eq!(response.status(), StatusCode::OK, "Failed for key {key}");

        let body = parse_response_body(response).await;
        let url = body["url"].as_str().unwrap();
        assert!(url.starts_with(&format!("http://localhost:9000/laudos/{key}?")));
        assert!(url.contains("X-Amz-Expires=600"));
    }
}

#[tokio::test]
async fn test_sign_with_real_presigner_returns_empty_headers() {
    let setup = offline_s3_setup(test_config()).await;

    let response = setup
        .send_post_request(
            SIGN_ROUTE,
            json!({ "key": "users/u1/a.pdf", "contentType": "application/pdf" }),
        )
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    assert_eq!(body["headers"], json!({}));
}

#[tokio::test]
async fn test_sign_ignores_metadata_shape() {
    let setup = TestSetup::default_setup();

    for metadata in [
        json!({ "pages": 3 }),
        json!({ "tags": ["a", "b"], "nested": { "x": true } }),
        json!("opaque"),
        json!(null),
    ] {
        let response = setup
            .send_post_request(SIGN_ROUTE, json!({ "key": "a.bin", "metadata": metadata.clone() }))
            .await
            .expect("Failed to send request");

        assert_eq!(response.status(), StatusCode::OK, "Failed for metadata {metadata}");
    }

    assert_eq!(setup.presigner.calls().len(), 4);
}

// Validation error tests

#[tokio::test]
async fn test_sign_missing_key() {
    let setup = TestSetup::default_setup();

    for payload in [
        json!({}),
        json!({ "key": "" }),
        json!({ "key": null, "contentType": "application/pdf" }),
        json!({ "contentType": "application/pdf", "metadata": { "a": "b" } }),
        json!({ "key": 42 }),
        json!([]),
    ] {
        let response = setup
            .send_post_request(SIGN_ROUTE, payload.clone())
            .await
            .expect("Failed to send request");

        assert_eq!(
            response.status(),
            StatusCode::BAD_REQUEST,
            "Failed for payload {payload}"
        );
        let body = parse_response_body(response).await;
        assert_eq!(body, json!({ "error": "Missing key" }));
    }

    assert!(setup.presigner.calls().is_empty());
}

#[tokio::test]
async fn test_sign_empty_and_malformed_body() {
    let setup = TestSetup::default_setup();

    for body in ["", "{not json", "key=a.bin"] {
        let response = setup
            .send_request("POST", SIGN_ROUTE, &[], Body::from(body))
            .await
            .expect("Failed to send request");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = parse_response_body(response).await;
        assert_eq!(body["error"], "Missing key");
    }
}

#[tokio::test]
async fn test_sign_rejects_other_methods() {
    let setup = TestSetup::default_setup();

    for method in ["GET", "DELETE", "PUT", "PATCH"] {
        let response = setup
            .send_request(
                method,
                SIGN_ROUTE,
                &[("Content-Type", "application/json")],
                Body::from(json!({ "key": "a.bin" }).to_string()),
            )
            .await
            .expect("Failed to send request");

        assert_eq!(
            response.status(),
            StatusCode::METHOD_NOT_ALLOWED,
            "Failed for method {method}"
        );
        let body = parse_response_body(response).await;
        assert_eq!(body, json!({ "error": "Method not allowed" }));
    }

    assert!(setup.presigner.calls().is_empty());
}

// Server-side failures

#[tokio::test]
async fn test_sign_bucket_not_configured() {
    let setup = TestSetup::new(SignerConfig {
        bucket: None,
        ..test_config()
    });

    let response = setup
        .send_post_request(SIGN_ROUTE, json!({ "key": "a.bin" }))
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = parse_response_body(response).await;
    assert_eq!(body, json!({ "error": "Bucket not configured" }));
    assert!(setup.presigner.calls().is_empty());
}

#[tokio::test]
async fn test_sign_missing_key_wins_over_missing_bucket() {
    let setup = TestSetup::new(SignerConfig {
        bucket: None,
        ..test_config()
    });

    let response = setup
        .send_post_request(SIGN_ROUTE, json!({}))
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_sign_failure_is_not_leaked() {
    let setup = TestSetup::failing(StorageError::S3Error(
        "InvalidAccessKeyId: the key 004abc is expired".to_string(),
    ));

    let response = setup
        .send_post_request(SIGN_ROUTE, json!({ "key": "a.bin" }))
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let bytes = response_bytes(response).await;
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body, json!({ "error": "Sign error" }));
    assert!(!String::from_utf8_lossy(&bytes).contains("004abc"));
}

// Health

#[tokio::test]
async fn test_health() {
    let setup = TestSetup::default_setup();

    let response = setup
        .send_request("GET", "/health", &[], Body::empty())
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["semver"], env!("CARGO_PKG_VERSION"));
}
