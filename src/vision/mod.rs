// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Vision processing module for CPU-based image analysis
//!
//! This module provides:
//! - Signboard detection via a YOLO ONNX model
//! - OCR (Optical Character Recognition) via PaddleOCR
//! - Bounding-box drawing and region cropping
//!
//! All models run on CPU.

pub mod annotate;
pub mod detector;
pub mod error;
pub mod image_utils;
pub mod model_manager;
pub mod ocr;
pub mod types;

pub use annotate::{AnnotateError, ImageAnnotator};
pub use detector::{DetectorConfig, SignboardDetector, YoloDetector};
pub use error::VisionError;
pub use image_utils::extension_for_bytes;
pub use model_manager::{VisionModelConfig, VisionModelInfo, VisionModelManager};
pub use ocr::{normalize_text, TextRecognizer};
pub use types::{BoundingBox, Detection, PixelRect};
