// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Signboard detection
//!
//! Components:
//! - `yolo` - YOLO ONNX model wrapper (CPU)
//! - `postprocess` - decoding raw candidates into detections

pub mod postprocess;
pub mod yolo;

pub use yolo::YoloDetector;

use std::path::Path;

use super::error::VisionError;
use super::types::Detection;

/// Default square input size for the detection model
pub const DEFAULT_INPUT_SIZE: u32 = 640;

/// Default confidence floor applied by the model's own post-processing
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.25;

/// Default IoU threshold for non-maximum suppression
pub const DEFAULT_IOU_THRESHOLD: f32 = 0.7;

/// Default cap on detections per image
pub const DEFAULT_MAX_DETECTIONS: usize = 300;

/// Settings baked into the detection model's post-processing
#[derive(Debug, Clone, PartialEq)]
pub struct DetectorConfig {
    /// Square input edge in pixels
    pub input_size: u32,
    /// Minimum class score for a candidate
    pub confidence_threshold: f32,
    /// Overlap above which the weaker of two same-class boxes is dropped
    pub iou_threshold: f32,
    /// Maximum number of detections returned
    pub max_detections: usize,
    /// ONNX Runtime intra-op threads
    pub intra_threads: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            input_size: DEFAULT_INPUT_SIZE,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            iou_threshold: DEFAULT_IOU_THRESHOLD,
            max_detections: DEFAULT_MAX_DETECTIONS,
            intra_threads: 4,
        }
    }
}

impl DetectorConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.input_size == 0 || self.input_size % 32 != 0 {
            return Err(format!(
                "input_size must be a positive multiple of 32, got {}",
                self.input_size
            ));
        }
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err("confidence_threshold must be between 0 and 1".to_string());
        }
        if !(0.0..=1.0).contains(&self.iou_threshold) {
            return Err("iou_threshold must be between 0 and 1".to_string());
        }
        if self.max_detections == 0 {
            return Err("max_detections must be greater than 0".to_string());
        }
        Ok(())
    }
}

/// Finds signboard regions in an image file
///
/// Implementations are shared across requests and must be safe to call
/// from several threads at once.
pub trait SignboardDetector: Send + Sync {
    /// Detect regions in the image at `image_path`, in model output order
    fn detect(&self, image_path: &Path) -> Result<Vec<Detection>, VisionError>;

    /// Name for logs and the health endpoint
    fn name(&self) -> &str;
}
