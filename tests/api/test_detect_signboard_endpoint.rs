// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! POST /api/detect-signboard tests
//!
//! These tests verify that the endpoint:
//! - Returns the documented JSON shape for a valid upload
//! - Rejects missing images and non-multipart bodies with 400
//! - Hides detector failures behind a generic 500
//! - Enforces the upload size limit
//! - Sends permissive CORS headers

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use signboard_reader_node::{
    api::{create_router, AppState},
    config::ServerConfig,
    pipeline::SignboardPipeline,
};
use std::sync::Arc;
use tempfile::TempDir;
use tower::util::ServiceExt; // for `oneshot`

use crate::common::*;

struct TestApp {
    router: Router,
    store: Arc<RecordingStore>,
    _work: TempDir,
    _static: TempDir,
}

fn setup(detector: FakeDetector, config: impl FnOnce(&mut ServerConfig)) -> TestApp {
    let work = TempDir::new().unwrap();
    let static_dir = TempDir::new().unwrap();
    let mut server_config = ServerConfig {
        work_dir: work.path().to_path_buf(),
        static_dir: static_dir.path().to_path_buf(),
        ..ServerConfig::default()
    };
    config(&mut server_config);

    let models = models(detector, FakeRecognizer::reading(&["Joe's", "PIZZA!"]));
    let store = Arc::new(RecordingStore::succeeding());
    let pipeline = SignboardPipeline::new(&models, store.clone(), (&server_config).into());
    let router = create_router(AppState::new(pipeline, models), &server_config);

    TestApp {
        router,
        store,
        _work: work,
        _static: static_dir,
    }
}

fn upload_request(body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/api/detect-signboard")
        .header(header::CONTENT_TYPE, multipart_content_type())
        .body(Body::from(body))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[cfg(test)]
mod detect_signboard_tests {
    use super::*;

    #[tokio::test]
    async fn test_success_response_shape() {
        let app = setup(
            FakeDetector::returning(vec![
                detection(10.0, 12.0, 120.0, 60.0, 0.91),
                detection(130.0, 20.0, 190.0, 90.0, 0.76),
            ]),
            |_| {},
        );
        let png = png_bytes(200, 100);
        let body = multipart_body(&[Part::File {
            name: "image",
            file_name: "street.png",
            bytes: &png,
        }]);

        let response = app.router.oneshot(upload_request(body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = json_body(response).await;
        assert!(json.get("original_image").is_none());
        assert!(json["boxed_image_url"]
            .as_str()
            .unwrap()
            .contains("Signboard_boxed_"));

        let detections = json["detections"].as_array().unwrap();
        assert_eq!(detections.len(), 2);

        let first = &detections[0];
        assert_eq!(first["bbox"], serde_json::json!([10.0, 12.0, 120.0, 60.0]));
        assert_eq!(first["class"], 0);
        assert!((first["confidence"].as_f64().unwrap() - 0.91).abs() < 1e-6);
        assert_eq!(first["extracted_text"], "joes pizza");
        assert!(first["cropped_url"].as_str().unwrap().ends_with("_0.jpg"));
        assert!((detections[1]["confidence"].as_f64().unwrap() - 0.76).abs() < 1e-6);

        assert_eq!(app.store.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_other_fields_are_ignored() {
        let app = setup(FakeDetector::returning(Vec::new()), |_| {});
        let png = png_bytes(32, 32);
        let body = multipart_body(&[
            Part::Text {
                name: "note",
                value: "corner of main street",
            },
            Part::File {
                name: "image",
                file_name: "street.png",
                bytes: &png,
            },
        ]);

        let response = app.router.oneshot(upload_request(body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = json_body(response).await;
        assert_eq!(json["detections"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_missing_image_returns_400() {
        let app = setup(FakeDetector::returning(Vec::new()), |_| {});
        let body = multipart_body(&[Part::Text {
            name: "note",
            value: "no photo here",
        }]);

        let response = app.router.oneshot(upload_request(body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json = json_body(response).await;
        assert_eq!(json, serde_json::json!({ "error": "No image uploaded" }));
        assert!(app.store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_empty_image_returns_400() {
        let app = setup(FakeDetector::returning(Vec::new()), |_| {});
        let body = multipart_body(&[Part::File {
            name: "image",
            file_name: "empty.png",
            bytes: &[],
        }]);

        let response = app.router.oneshot(upload_request(body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json = json_body(response).await;
        assert_eq!(json["error"], "No image uploaded");
    }

    #[tokio::test]
    async fn test_non_multipart_body_returns_400() {
        let app = setup(FakeDetector::returning(Vec::new()), |_| {});
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/detect-signboard")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"image": "not a file"}"#))
            .unwrap();

        let response = app.router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json = json_body(response).await;
        assert!(json["error"].is_string());
    }

    #[tokio::test]
    async fn test_detector_failure_returns_generic_500() {
        let app = setup(FakeDetector::failing(), |_| {});
        let png = png_bytes(64, 64);
        let body = multipart_body(&[Part::File {
            name: "image",
            file_name: "street.png",
            bytes: &png,
        }]);

        let response = app.router.oneshot(upload_request(body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let json = json_body(response).await;
        assert_eq!(json, serde_json::json!({ "error": "Signboard detection failed" }));
        assert!(!json.to_string().contains("model exploded"));
    }

    #[tokio::test]
    async fn test_oversized_body_returns_413() {
        let app = setup(FakeDetector::returning(Vec::new()), |config| {
            config.max_upload_bytes = 1024;
        });
        let large = vec![7u8; 64 * 1024];
        let body = multipart_body(&[Part::File {
            name: "image",
            file_name: "huge.png",
            bytes: &large,
        }]);

        let response = app.router.oneshot(upload_request(body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert!(app.store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_get_is_not_allowed() {
        let app = setup(FakeDetector::returning(Vec::new()), |_| {});
        let request = Request::builder()
            .method(Method::GET)
            .uri("/api/detect-signboard")
            .body(Body::empty())
            .unwrap();

        let response = app.router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_cors_allows_any_origin() {
        let app = setup(FakeDetector::returning(Vec::new()), |_| {});
        let png = png_bytes(32, 32);
        let body = multipart_body(&[Part::File {
            name: "image",
            file_name: "street.png",
            bytes: &png,
        }]);
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/detect-signboard")
            .header(header::ORIGIN, "https://example.org")
            .header(header::CONTENT_TYPE, multipart_content_type())
            .body(Body::from(body))
            .unwrap();

        let response = app.router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .unwrap(),
            "*"
        );
    }

    #[tokio::test]
    async fn test_retained_original_is_reported_and_served() {
        let app = setup(FakeDetector::returning(Vec::new()), |config| {
            config.retain_originals = true;
        });
        let png = png_bytes(32, 32);
        let body = multipart_body(&[Part::File {
            name: "image",
            file_name: "street.png",
            bytes: &png,
        }]);

        let response = app
            .router
            .clone()
            .oneshot(upload_request(body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = json_body(response).await;
        let original = json["original_image"].as_str().unwrap().to_string();
        assert!(original.starts_with("/static/uploads/Signboard_"));

        let request = Request::builder()
            .method(Method::GET)
            .uri(&original)
            .body(Body::empty())
            .unwrap();
        let response = app.router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let served = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(served.as_ref(), png.as_slice());
    }
}
