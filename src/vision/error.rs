// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Errors surfaced by the vision adapters

use std::path::PathBuf;
use thiserror::Error;

/// Failure of a detector or recognizer call
#[derive(Debug, Error)]
pub enum VisionError {
    /// The input file could not be read or decoded
    #[error("failed to load image {path}: {source}")]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// The model rejected the input or inference failed
    #[error("inference failed: {0:#}")]
    Inference(#[from] anyhow::Error),
}

impl VisionError {
    pub fn image_load(path: impl Into<PathBuf>, source: image::ImageError) -> Self {
        VisionError::ImageLoad {
            path: path.into(),
            source,
        }
    }
}
