// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Credentials and endpoint for the remote asset store (Cloudinary)

use std::env;
use std::fmt;

use super::ConfigError;

/// Default Cloudinary API base URL
pub const DEFAULT_API_BASE: &str = "https://api.cloudinary.com";

/// Default upload timeout in seconds
pub const DEFAULT_UPLOAD_TIMEOUT_SECS: u64 = 30;

/// Configuration for the Cloudinary-backed asset store
#[derive(Clone, PartialEq)]
pub struct AssetStoreConfig {
    /// Cloudinary cloud name
    pub cloud_name: String,
    /// API key
    pub api_key: String,
    /// API secret used to sign upload requests
    pub api_secret: String,
    /// API base URL (overridable for testing)
    pub api_base: String,
    /// Per-upload request timeout in seconds
    pub timeout_secs: u64,
}

// Keep the secret out of logs
impl fmt::Debug for AssetStoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssetStoreConfig")
            .field("cloud_name", &self.cloud_name)
            .field("api_key", &self.api_key)
            .field("api_base", &self.api_base)
            .field("timeout_secs", &self.timeout_secs)
            .finish_non_exhaustive()
    }
}

impl AssetStoreConfig {
    /// Load configuration from environment variables
    ///
    /// Required: `CLOUDINARY_CLOUD_NAME`, `CLOUDINARY_API_KEY`, `CLOUDINARY_API_SECRET`.
    /// Optional: `CLOUDINARY_API_BASE`, `CLOUDINARY_UPLOAD_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            cloud_name: required_var("CLOUDINARY_CLOUD_NAME")?,
            api_key: required_var("CLOUDINARY_API_KEY")?,
            api_secret: required_var("CLOUDINARY_API_SECRET")?,
            api_base: env::var("CLOUDINARY_API_BASE")
                .unwrap_or_else(|_| DEFAULT_API_BASE.to_string()),
            timeout_secs: env::var("CLOUDINARY_UPLOAD_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_UPLOAD_TIMEOUT_SECS),
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cloud_name.trim().is_empty() {
            return Err(ConfigError::invalid("cloud_name", "must not be empty"));
        }
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::invalid("api_key", "must not be empty"));
        }
        if self.api_secret.trim().is_empty() {
            return Err(ConfigError::invalid("api_secret", "must not be empty"));
        }
        if !self.api_base.starts_with("http://") && !self.api_base.starts_with("https://") {
            return Err(ConfigError::invalid(
                "api_base",
                format!("'{}' is not an http(s) URL", self.api_base),
            ));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::invalid("timeout_secs", "must be greater than 0"));
        }
        Ok(())
    }

    /// Upload endpoint for images
    pub fn upload_url(&self) -> String {
        format!(
            "{}/v1_1/{}/image/upload",
            self.api_base.trim_end_matches('/'),
            self.cloud_name
        )
    }
}

fn required_var(name: &str) -> Result<String, ConfigError> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::MissingVar(name.to_string())),
    }
}
