// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Vision model manager for loading the signboard detector and OCR models

use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

use crate::vision::detector::{DetectorConfig, SignboardDetector, YoloDetector};
use crate::vision::ocr::{OcrModelConfig, PaddleOcrModel, TextRecognizer};

/// Configuration for loading vision models
#[derive(Debug, Clone)]
pub struct VisionModelConfig {
    /// Path to the signboard detection ONNX model
    pub detector_model_path: PathBuf,
    /// PaddleOCR model files
    pub ocr: OcrModelConfig,
    /// Detector post-processing settings
    pub detector: DetectorConfig,
}

impl Default for VisionModelConfig {
    fn default() -> Self {
        Self {
            detector_model_path: PathBuf::from("./models/signboard/best.onnx"),
            ocr: OcrModelConfig::default(),
            detector: DetectorConfig::default(),
        }
    }
}

/// Information about a loaded vision model
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct VisionModelInfo {
    /// Model name
    pub name: String,
    /// Model type (detector, ocr)
    pub model_type: String,
    /// Whether the model is available
    pub available: bool,
}

/// Holds the detector and recognizer shared by every request
///
/// Both are loaded once at startup. The service cannot answer a single
/// request without them, so a load failure is fatal.
#[derive(Clone)]
pub struct VisionModelManager {
    detector: Arc<dyn SignboardDetector>,
    recognizer: Arc<dyn TextRecognizer>,
}

impl std::fmt::Debug for VisionModelManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisionModelManager")
            .field("detector", &self.detector.name())
            .field("recognizer", &self.recognizer.name())
            .finish()
    }
}

impl VisionModelManager {
    /// Load both models from the configured paths
    pub async fn new(config: VisionModelConfig) -> anyhow::Result<Self> {
        let detector = YoloDetector::new(&config.detector_model_path, config.detector.clone())
            .await
            .map_err(|e| {
                tracing::error!(
                    "❌ Failed to load signboard detector from {}: {:#}",
                    config.detector_model_path.display(),
                    e
                );
                e
            })?;
        tracing::info!(
            "✅ Signboard detector loaded from {}",
            config.detector_model_path.display()
        );

        let recognizer = PaddleOcrModel::new(&config.ocr).await.map_err(|e| {
            tracing::error!(
                "❌ Failed to load OCR models from {}: {:#}",
                config.ocr.model_dir.display(),
                e
            );
            e
        })?;
        tracing::info!("✅ PaddleOCR models loaded from {}", config.ocr.model_dir.display());

        Ok(Self::from_parts(Arc::new(detector), Arc::new(recognizer)))
    }

    /// Build a manager around already constructed adapters
    pub fn from_parts(
        detector: Arc<dyn SignboardDetector>,
        recognizer: Arc<dyn TextRecognizer>,
    ) -> Self {
        Self {
            detector,
            recognizer,
        }
    }

    pub fn detector(&self) -> Arc<dyn SignboardDetector> {
        self.detector.clone()
    }

    pub fn recognizer(&self) -> Arc<dyn TextRecognizer> {
        self.recognizer.clone()
    }

    /// List the loaded vision models
    pub fn list_models(&self) -> Vec<VisionModelInfo> {
        vec![
            VisionModelInfo {
                name: self.detector.name().to_string(),
                model_type: "detector".to_string(),
                available: true,
            },
            VisionModelInfo {
                name: self.recognizer.name().to_string(),
                model_type: "ocr".to_string(),
                available: true,
            },
        ]
    }
}
