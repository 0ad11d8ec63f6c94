// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Remote asset storage for annotated images and signboard crops
//!
//! Uploads never fail a request. Every call resolves to an `UploadOutcome`
//! and the caller decides how a failed upload shows up in its response.

pub mod cloudinary;
pub mod disabled;

pub use cloudinary::CloudinaryStore;
pub use disabled::DisabledAssetStore;

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result of a single upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// Public HTTPS URL of the stored asset
    Uploaded(String),
    /// Reason the upload did not happen
    Failed(String),
}

impl UploadOutcome {
    pub fn is_uploaded(&self) -> bool {
        matches!(self, UploadOutcome::Uploaded(_))
    }
}

impl From<Result<String, UploadError>> for UploadOutcome {
    fn from(result: Result<String, UploadError>) -> Self {
        match result {
            Ok(url) => UploadOutcome::Uploaded(url),
            Err(e) => UploadOutcome::Failed(e.to_string()),
        }
    }
}

/// Errors raised inside an asset store before they are folded into an outcome
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("upload request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("asset store returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("asset store response has no secure_url")]
    MissingUrl,

    #[error("asset store is not configured")]
    NotConfigured,
}

/// Stores a local file remotely and returns its public URL
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Upload `local_path` into `folder`
    async fn upload(&self, local_path: &Path, folder: &str) -> UploadOutcome;

    /// Name for logs and the health endpoint
    fn name(&self) -> &str;
}
