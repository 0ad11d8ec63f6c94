// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! GET /health tests

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
};
use serde_json::Value;
use signboard_reader_node::{
    api::{create_router, AppState},
    config::ServerConfig,
    pipeline::SignboardPipeline,
    storage::DisabledAssetStore,
};
use std::sync::Arc;
use tower::util::ServiceExt;

use crate::common::*;

#[tokio::test]
async fn test_health_reports_models_and_store() {
    let config = ServerConfig::default();
    let models = models(
        FakeDetector::returning(Vec::new()),
        FakeRecognizer::reading(&[]),
    );
    let pipeline = SignboardPipeline::new(&models, Arc::new(DisabledAssetStore), (&config).into());
    let app = create_router(AppState::new(pipeline, models), &config);

    let request = Request::builder()
        .method(Method::GET)
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(json["status"], "ok");
    assert_eq!(json["version"], signboard_reader_node::version::VERSION_NUMBER);
    assert_eq!(json["models"]["detector"]["name"], "fake-detector");
    assert_eq!(json["models"]["ocr"]["name"], "fake-ocr");
    assert_eq!(json["models"]["ocr"]["available"], true);
    assert_eq!(json["asset_store"], "disabled");
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let config = ServerConfig::default();
    let models = models(
        FakeDetector::returning(Vec::new()),
        FakeRecognizer::reading(&[]),
    );
    let pipeline = SignboardPipeline::new(&models, Arc::new(DisabledAssetStore), (&config).into());
    let app = create_router(AppState::new(pipeline, models), &config);

    let request = Request::builder()
        .method(Method::GET)
        .uri("/v1/models")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
