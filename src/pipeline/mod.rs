// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Request pipeline for signboard uploads
//!
//! Components:
//! - `session` - request-scoped temporary files
//! - `orchestrator` - the per-request state machine
//! - `result` - per-detection and aggregate results
//! - `error` - request-fatal errors

pub mod error;
pub mod orchestrator;
pub mod result;
pub mod session;

pub use error::PipelineError;
pub use orchestrator::{ImageUpload, PipelineSettings, SignboardPipeline, NO_IMAGE_MESSAGE};
pub use result::{DetectionResult, SignboardReport};
pub use session::RequestSession;
