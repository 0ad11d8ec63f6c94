// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! HTTP server and request pipeline settings

use std::net::SocketAddr;
use std::path::PathBuf;

use super::ConfigError;

/// Maximum accepted upload size (10MB)
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Remote folder crops and annotated images are uploaded into
pub const DEFAULT_UPLOAD_FOLDER: &str = "signboards";

/// Settings for the HTTP surface and the per-request pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    /// Interface to bind
    pub host: String,
    /// Port to bind
    pub port: u16,
    /// Root under which each request creates its private temporary directory
    pub work_dir: PathBuf,
    /// Directory served under `/static`
    pub static_dir: PathBuf,
    /// Keep a copy of every uploaded original under `<static_dir>/uploads`
    pub retain_originals: bool,
    /// Remote folder for uploaded assets
    pub upload_folder: String,
    /// Request body limit for the upload route
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            work_dir: std::env::temp_dir(),
            static_dir: PathBuf::from("static"),
            retain_originals: false,
            upload_folder: DEFAULT_UPLOAD_FOLDER.to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl ServerConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.upload_folder.trim().is_empty() {
            return Err(ConfigError::invalid("upload_folder", "must not be empty"));
        }
        if self.max_upload_bytes == 0 {
            return Err(ConfigError::invalid(
                "max_upload_bytes",
                "must be greater than 0",
            ));
        }
        self.bind_addr()?;
        Ok(())
    }

    /// Socket address to listen on
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::invalid("host", format!("{}: {}", self.host, e)))
    }

    /// Directory retained originals are written into
    pub fn retained_dir(&self) -> Option<PathBuf> {
        self.retain_originals
            .then(|| self.static_dir.join("uploads"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 5000);
        assert_eq!(config.upload_folder, "signboards");
        assert!(!config.retain_originals);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_bind_addr() {
        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8088,
            ..Default::default()
        };
        assert_eq!(config.bind_addr().unwrap().port(), 8088);
    }

    #[test]
    fn test_invalid_host_rejected() {
        let config = ServerConfig {
            host: "not a host".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_upload_folder_rejected() {
        let config = ServerConfig {
            upload_folder: "".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_retained_dir_only_when_enabled() {
        let mut config = ServerConfig::default();
        assert!(config.retained_dir().is_none());

        config.retain_originals = true;
        assert_eq!(config.retained_dir(), Some(PathBuf::from("static/uploads")));
    }
}
