// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Cloudinary upload client
//!
//! Uses the signed upload API: every request carries the API key, a
//! timestamp and a SHA-256 signature over the sorted parameters.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

use super::{AssetStore, UploadError, UploadOutcome};
use crate::config::AssetStoreConfig;

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: Option<String>,
}

/// Asset store backed by a Cloudinary account
pub struct CloudinaryStore {
    client: Client,
    config: AssetStoreConfig,
}

impl std::fmt::Debug for CloudinaryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudinaryStore")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl CloudinaryStore {
    pub fn new(config: AssetStoreConfig) -> Result<Self, UploadError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        info!(
            "Cloudinary store configured: cloud={}, endpoint={}",
            config.cloud_name,
            config.upload_url()
        );

        Ok(Self { client, config })
    }

    /// Upload a file and return its `secure_url`
    pub async fn try_upload(&self, local_path: &Path, folder: &str) -> Result<String, UploadError> {
        let bytes = tokio::fs::read(local_path)
            .await
            .map_err(|source| UploadError::Read {
                path: local_path.to_path_buf(),
                source,
            })?;

        let timestamp = chrono::Utc::now().timestamp().to_string();
        let mut params = vec![("timestamp", timestamp)];
        if !folder.is_empty() {
            params.push(("folder", folder.to_string()));
        }
        let signature = sign_params(&params, &self.config.api_secret);

        let file_name = local_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());

        let mut form = Form::new()
            .part("file", Part::bytes(bytes).file_name(file_name))
            .text("api_key", self.config.api_key.clone())
            .text("signature", signature)
            .text("signature_algorithm", "sha256");
        for (key, value) in params {
            form = form.text(key, value);
        }

        let url = self.config.upload_url();
        debug!("Cloudinary upload POST {} ({})", url, local_path.display());

        let response = self.client.post(&url).multipart(form).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(UploadError::Status { status, body });
        }

        let body: UploadResponse = response.json().await?;
        body.secure_url.ok_or(UploadError::MissingUrl)
    }
}

#[async_trait]
impl AssetStore for CloudinaryStore {
    async fn upload(&self, local_path: &Path, folder: &str) -> UploadOutcome {
        let result = self.try_upload(local_path, folder).await;
        match &result {
            Ok(url) => debug!("Uploaded {} to {}", local_path.display(), url),
            Err(e) => debug!("Cloudinary upload of {} failed: {:?}", local_path.display(), e),
        }
        result.into()
    }

    fn name(&self) -> &str {
        "cloudinary"
    }
}

/// Cloudinary request signature
///
/// Parameters are sorted by name, joined as `k=v` with `&`, suffixed with
/// the API secret and hashed with SHA-256. Empty values are not signed.
pub fn sign_params(params: &[(&str, String)], api_secret: &str) -> String {
    let mut signed: Vec<&(&str, String)> =
        params.iter().filter(|(_, value)| !value.is_empty()).collect();
    signed.sort_by(|a, b| a.0.cmp(b.0));

    let to_sign = signed
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}
