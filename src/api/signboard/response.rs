// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Signboard detection response types

use serde::{Deserialize, Serialize};

use crate::pipeline::{DetectionResult, SignboardReport};

/// One detected signboard
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DetectionRecord {
    /// `[x1, y1, x2, y2]` in source-image pixels
    pub bbox: [f32; 4],
    /// Confidence score (0.0-1.0)
    pub confidence: f32,
    /// Detector class id
    #[serde(rename = "class")]
    pub class_id: u32,
    /// Hosted crop, null when cropping or uploading failed
    pub cropped_url: Option<String>,
    /// Lowercase letters, digits and single spaces only
    pub extracted_text: String,
}

/// Response from POST /api/detect-signboard
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DetectSignboardResponse {
    /// Static path of the retained original; omitted when retention is off
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_image: Option<String>,
    /// Hosted image with every box drawn, null when drawing or uploading failed
    pub boxed_image_url: Option<String>,
    pub detections: Vec<DetectionRecord>,
}

impl From<DetectionResult> for DetectionRecord {
    fn from(result: DetectionResult) -> Self {
        Self {
            bbox: result.bounding_box.to_array(),
            confidence: result.confidence,
            class_id: result.class_id,
            cropped_url: result.cropped_url,
            extracted_text: result.extracted_text,
        }
    }
}

impl From<SignboardReport> for DetectSignboardResponse {
    fn from(report: SignboardReport) -> Self {
        Self {
            original_image: report.original_image,
            boxed_image_url: report.boxed_image_url,
            detections: report.detections.into_iter().map(Into::into).collect(),
        }
    }
}
