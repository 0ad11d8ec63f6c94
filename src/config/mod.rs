// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Runtime configuration
//!
//! Configuration is built once at startup and handed to the components that
//! need it. Nothing reads the environment after that point.

pub mod asset_store;
pub mod server;

pub use asset_store::AssetStoreConfig;
pub use server::ServerConfig;

use thiserror::Error;

/// Errors raised while building or validating configuration
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("missing environment variable {0}")]
    MissingVar(String),

    #[error("invalid value for {field}: {message}")]
    Invalid { field: String, message: String },
}

impl ConfigError {
    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field: field.to_string(),
            message: message.into(),
        }
    }
}
