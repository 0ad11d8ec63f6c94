// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Signboard detection endpoint handler

use axum::{extract::State, Json};
use axum_extra::extract::multipart::MultipartRejection;
use axum_extra::extract::Multipart;
use tracing::{info, warn};

use super::request::{read_image_upload, MALFORMED_MULTIPART_MESSAGE};
use super::response::DetectSignboardResponse;
use crate::api::errors::ApiError;
use crate::api::http_server::AppState;

/// POST /api/detect-signboard - Detect signboards and read their text
///
/// # Request
/// Multipart form with one file field `image`.
///
/// # Response
/// - `boxed_image_url`: Hosted copy with every detection outlined (or null)
/// - `detections`: One record per detection, in detector order
/// - `original_image`: Static path of the retained original (only when retention is on)
///
/// # Errors
/// - 400 Bad Request: missing or empty `image`, malformed multipart body
/// - 413 Payload Too Large: body over the configured limit
/// - 500 Internal Server Error: detection failed or an internal fault
pub async fn detect_signboard_handler(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<DetectSignboardResponse>, ApiError> {
    let mut multipart = multipart.map_err(|e| {
        warn!("Rejected non-multipart request: {}", e);
        ApiError::InvalidRequest(MALFORMED_MULTIPART_MESSAGE.to_string())
    })?;

    let upload = read_image_upload(&mut multipart).await?;
    let report = state.pipeline.process(upload).await?;

    info!(
        "Signboard request complete: {} detections, boxed image {}",
        report.detections.len(),
        if report.boxed_image_url.is_some() {
            "uploaded"
        } else {
            "not uploaded"
        }
    );

    Ok(Json(report.into()))
}
