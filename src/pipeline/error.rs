// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Request-fatal pipeline errors
//!
//! Per-detection failures (crop, upload, OCR) never appear here; they
//! degrade a field of the affected result instead.

use thiserror::Error;

use crate::vision::VisionError;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// The request carried no usable image
    #[error("{0}")]
    Validation(String),

    /// The upload could not be written to the request session
    #[error("failed to persist upload: {0}")]
    Persist(#[from] std::io::Error),

    /// The detector rejected the image or failed
    #[error("signboard detection failed: {0}")]
    Detection(#[source] VisionError),

    /// A blocking task panicked or was cancelled
    #[error("internal error: {0}")]
    Internal(String),
}

impl PipelineError {
    pub fn is_client_error(&self) -> bool {
        matches!(self, PipelineError::Validation(_))
    }
}
