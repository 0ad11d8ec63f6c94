// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod api;
pub mod cli;
pub mod config;
pub mod pipeline;
pub mod storage;
pub mod version;
pub mod vision;

pub use api::{create_router, AppState};
pub use config::{AssetStoreConfig, ServerConfig};
pub use pipeline::{ImageUpload, PipelineError, SignboardPipeline, SignboardReport};
pub use storage::{AssetStore, UploadOutcome};
pub use vision::{SignboardDetector, TextRecognizer, VisionModelManager};
