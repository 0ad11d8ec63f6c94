// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::pipeline::PipelineError;

/// Generic message for detection failures
pub const DETECTION_FAILED_MESSAGE: &str = "Signboard detection failed";

/// Generic message for anything else that went wrong server-side
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    NotFound(String),
    InvalidRequest(String),
    PayloadTooLarge(String),
    DetectionFailed,
    InternalError,
}

impl ApiError {
    pub fn to_response(&self) -> ErrorResponse {
        let error = match self {
            ApiError::NotFound(msg)
            | ApiError::InvalidRequest(msg)
            | ApiError::PayloadTooLarge(msg) => msg.clone(),
            ApiError::DetectionFailed => DETECTION_FAILED_MESSAGE.to_string(),
            ApiError::InternalError => INTERNAL_ERROR_MESSAGE.to_string(),
        };
        ErrorResponse { error }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::NotFound(_) => 404,
            ApiError::InvalidRequest(_) => 400,
            ApiError::PayloadTooLarge(_) => 413,
            ApiError::DetectionFailed | ApiError::InternalError => 500,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::InvalidRequest(msg) => write!(f, "Invalid request: {}", msg),
            ApiError::PayloadTooLarge(msg) => write!(f, "Payload too large: {}", msg),
            ApiError::DetectionFailed => write!(f, "{}", DETECTION_FAILED_MESSAGE),
            ApiError::InternalError => write!(f, "{}", INTERNAL_ERROR_MESSAGE),
        }
    }
}

impl std::error::Error for ApiError {}

/// Pipeline details stay in the logs; clients only see generic messages
impl From<PipelineError> for ApiError {
    fn from(error: PipelineError) -> Self {
        match error {
            PipelineError::Validation(msg) => ApiError::InvalidRequest(msg),
            PipelineError::Detection(_) => ApiError::DetectionFailed,
            PipelineError::Persist(_) | PipelineError::Internal(_) => ApiError::InternalError,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_response())).into_response()
    }
}
