// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Values produced by one pipeline run

use crate::vision::{BoundingBox, Detection};

/// Outcome for one detected signboard
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionResult {
    pub bounding_box: BoundingBox,
    pub confidence: f32,
    pub class_id: u32,
    /// Public URL of the crop, `None` when cropping or uploading failed
    pub cropped_url: Option<String>,
    /// Normalized text, empty when nothing was read
    pub extracted_text: String,
}

impl DetectionResult {
    pub fn new(detection: &Detection, cropped_url: Option<String>, extracted_text: String) -> Self {
        Self {
            bounding_box: detection.bounding_box,
            confidence: detection.confidence,
            class_id: detection.class_id,
            cropped_url,
            extracted_text,
        }
    }
}

/// Aggregate result for one uploaded image
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SignboardReport {
    /// Local static path of the retained original, when retention is on
    pub original_image: Option<String>,
    pub boxed_image_url: Option<String>,
    /// One entry per detection, in detector order
    pub detections: Vec<DetectionResult>,
}
