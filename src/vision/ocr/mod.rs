// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! PaddleOCR integration for reading text off cropped signboards
//!
//! This module provides CPU-based OCR using PaddleOCR ONNX models.
//!
//! Components:
//! - `detection` - Text line detection (DB)
//! - `recognition` - Text recognition from detected lines (CTC)
//! - `preprocessing` - Image preprocessing for models
//! - `model` - Combined OCR pipeline
//! - `normalize` - Speech-friendly text cleanup

pub mod detection;
pub mod model;
pub mod normalize;
pub mod preprocessing;
pub mod recognition;

pub use detection::{OcrDetectionModel, TextBox};
pub use model::{OcrModelConfig, PaddleOcrModel};
pub use normalize::{normalize_fragments, normalize_text};
pub use recognition::{OcrRecognitionModel, RecognizedText};

use image::GrayImage;
use std::path::Path;
use tracing::debug;

use super::error::VisionError;
use super::image_utils::load_grayscale;

/// Reads text from an image
///
/// Implementations only provide `read_fragments`. `recognize` fixes the
/// contract every backend shares: grayscale input and normalized output.
pub trait TextRecognizer: Send + Sync {
    /// Recognize text fragments in a grayscale image, in reading order
    fn read_fragments(&self, image: &GrayImage) -> Result<Vec<String>, VisionError>;

    /// Name for logs and the health endpoint
    fn name(&self) -> &str;

    /// Read the image at `image_path` and return its normalized text
    fn recognize(&self, image_path: &Path) -> Result<String, VisionError> {
        let gray = load_grayscale(image_path)?;
        let fragments = self.read_fragments(&gray)?;
        debug!("OCR raw text: {:?}", fragments.join(" "));

        let text = normalize_fragments(&fragments);
        debug!("OCR normalized text: {:?}", text);
        Ok(text)
    }
}
