// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Asset store used when no Cloudinary credentials are configured

use async_trait::async_trait;
use std::path::Path;
use tracing::debug;

use super::{AssetStore, UploadError, UploadOutcome};

/// Refuses every upload, so responses carry null URLs
#[derive(Debug, Clone, Default)]
pub struct DisabledAssetStore;

#[async_trait]
impl AssetStore for DisabledAssetStore {
    async fn upload(&self, local_path: &Path, _folder: &str) -> UploadOutcome {
        debug!("Skipping upload of {} (asset store disabled)", local_path.display());
        Err::<String, _>(UploadError::NotConfigured).into()
    }

    fn name(&self) -> &str {
        "disabled"
    }
}
