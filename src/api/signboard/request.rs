// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Multipart request parsing for signboard detection

use axum::http::StatusCode;
use axum_extra::extract::multipart::MultipartError;
use axum_extra::extract::Multipart;
use tracing::{debug, warn};

use crate::api::errors::ApiError;
use crate::pipeline::{ImageUpload, NO_IMAGE_MESSAGE};

/// Name of the multipart file field carrying the photo
pub const IMAGE_FIELD: &str = "image";

/// Message for a body that is not valid multipart
pub const MALFORMED_MULTIPART_MESSAGE: &str = "Invalid multipart form data";

/// Read the `image` field from a multipart body
///
/// Other fields are skipped. A missing or empty `image` field is a
/// validation error.
pub async fn read_image_upload(multipart: &mut Multipart) -> Result<ImageUpload, ApiError> {
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return Err(multipart_error(e)),
        };

        if field.name() != Some(IMAGE_FIELD) {
            debug!("Skipping multipart field {:?}", field.name());
            continue;
        }

        let file_name = field.file_name().map(str::to_string);
        let bytes = field.bytes().await.map_err(multipart_error)?;
        if bytes.is_empty() {
            warn!("Rejected request with an empty image field");
            return Err(ApiError::InvalidRequest(NO_IMAGE_MESSAGE.to_string()));
        }

        let upload = ImageUpload::new(bytes);
        return Ok(match file_name {
            Some(name) => upload.with_file_name(name),
            None => upload,
        });
    }

    warn!("Rejected request without an image field");
    Err(ApiError::InvalidRequest(NO_IMAGE_MESSAGE.to_string()))
}

fn multipart_error(error: MultipartError) -> ApiError {
    warn!("Failed to read multipart body: {}", error);
    if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge("Image exceeds the upload size limit".to_string())
    } else {
        ApiError::InvalidRequest(MALFORMED_MULTIPART_MESSAGE.to_string())
    }
}
