// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Signboard detection API endpoint module
//!
//! Provides POST /api/detect-signboard for detecting signboards in a photo,
//! reading their text and hosting the annotated image and crops.

pub mod handler;
pub mod request;
pub mod response;

pub use handler::detect_signboard_handler;
pub use request::{read_image_upload, IMAGE_FIELD};
pub use response::{DetectSignboardResponse, DetectionRecord};
