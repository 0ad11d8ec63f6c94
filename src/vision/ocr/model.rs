// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! PaddleOCR model wrapper for text detection and recognition

use anyhow::Result;
use image::{DynamicImage, GrayImage};
use std::path::PathBuf;
use tracing::{debug, info};

use super::detection::OcrDetectionModel;
use super::preprocessing::gray_to_rgb;
use super::recognition::{OcrRecognitionModel, RecognizedText};
use super::TextRecognizer;
use crate::vision::error::VisionError;

/// Default detection model file name
pub const DETECTION_MODEL_FILE: &str = "det_model.onnx";

/// Default recognition model file name
pub const RECOGNITION_MODEL_FILE: &str = "rec_model.onnx";

/// Default character dictionary file name
pub const DICTIONARY_FILE: &str = "en_dict.txt";

/// Lines recognized below this confidence are discarded
pub const DEFAULT_DROP_SCORE: f32 = 0.5;

/// Default directory holding the PaddleOCR ONNX models
pub const DEFAULT_MODEL_DIR: &str = "./models/paddleocr-onnx";

/// Where the PaddleOCR files live and how they run
#[derive(Debug, Clone, PartialEq)]
pub struct OcrModelConfig {
    pub model_dir: PathBuf,
    pub detection_file: String,
    pub recognition_file: String,
    pub dictionary_file: String,
    /// ONNX Runtime intra-op threads per model
    pub intra_threads: usize,
    pub drop_score: f32,
}

impl Default for OcrModelConfig {
    fn default() -> Self {
        Self::new(DEFAULT_MODEL_DIR)
    }
}

impl OcrModelConfig {
    pub fn new(model_dir: impl Into<PathBuf>) -> Self {
        Self {
            model_dir: model_dir.into(),
            detection_file: DETECTION_MODEL_FILE.to_string(),
            recognition_file: RECOGNITION_MODEL_FILE.to_string(),
            dictionary_file: DICTIONARY_FILE.to_string(),
            intra_threads: 4,
            drop_score: DEFAULT_DROP_SCORE,
        }
    }

    pub fn detection_path(&self) -> PathBuf {
        self.model_dir.join(&self.detection_file)
    }

    pub fn recognition_path(&self) -> PathBuf {
        self.model_dir.join(&self.recognition_file)
    }

    pub fn dictionary_path(&self) -> PathBuf {
        self.model_dir.join(&self.dictionary_file)
    }
}

/// PaddleOCR model for text extraction
///
/// Combines text detection and recognition models for end-to-end OCR.
pub struct PaddleOcrModel {
    detection: OcrDetectionModel,
    recognition: OcrRecognitionModel,
    drop_score: f32,
}

impl std::fmt::Debug for PaddleOcrModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaddleOcrModel")
            .field("detection", &self.detection)
            .field("recognition", &self.recognition)
            .field("drop_score", &self.drop_score)
            .finish()
    }
}

impl PaddleOcrModel {
    /// Load PaddleOCR models from the configured directory
    ///
    /// Expected files:
    /// - det_model.onnx (text detection)
    /// - rec_model.onnx (text recognition)
    /// - en_dict.txt (character dictionary)
    pub async fn new(config: &OcrModelConfig) -> Result<Self> {
        info!("Loading PaddleOCR models from {}", config.model_dir.display());

        let detection = OcrDetectionModel::new(config.detection_path(), config.intra_threads).await?;
        let recognition = OcrRecognitionModel::new(
            config.recognition_path(),
            config.dictionary_path(),
            config.intra_threads,
        )
        .await?;

        Ok(Self {
            detection,
            recognition,
            drop_score: config.drop_score,
        })
    }

    /// Detect lines, then recognize each in reading order
    ///
    /// When no line is detected the whole image is treated as one line, since
    /// a tight signboard crop often is a single line of text.
    fn read_lines(&self, image: &DynamicImage) -> Result<Vec<RecognizedText>> {
        let (width, height) = (image.width(), image.height());
        if width == 0 || height == 0 {
            return Ok(Vec::new());
        }

        let boxes = self.detection.detect(image)?;
        if boxes.is_empty() {
            debug!("No text lines detected, recognizing whole crop");
            return Ok(vec![self.recognition.recognize(image)?]);
        }

        let mut lines = Vec::with_capacity(boxes.len());
        for text_box in &boxes {
            let Some(rect) = text_box.to_bounding_box().pixel_rect(width, height) else {
                continue;
            };
            let line = image.crop_imm(rect.x, rect.y, rect.width, rect.height);
            lines.push(self.recognition.recognize(&line)?);
        }
        Ok(lines)
    }
}

impl TextRecognizer for PaddleOcrModel {
    fn read_fragments(&self, image: &GrayImage) -> Result<Vec<String>, VisionError> {
        let rgb = DynamicImage::ImageRgb8(gray_to_rgb(image));
        let lines = self.read_lines(&rgb)?;

        Ok(keep_confident(lines, self.drop_score))
    }

    fn name(&self) -> &str {
        "paddleocr"
    }
}

/// Text of lines at or above `drop_score`, skipping empty ones
pub fn keep_confident(lines: Vec<RecognizedText>, drop_score: f32) -> Vec<String> {
    lines
        .into_iter()
        .filter(|line| !line.is_empty() && line.confidence >= drop_score)
        .map(|line| line.text)
        .collect()
}
