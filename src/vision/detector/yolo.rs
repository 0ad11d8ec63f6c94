// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! YOLO signboard detection model
//!
//! Wraps a YOLOv8-style ONNX export trained on signboards. The session is
//! loaded once at startup and shared by every request.

use anyhow::{Context, Result};
use image::DynamicImage;
use ndarray::Array4;
use ort::execution_providers::CPUExecutionProvider;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use super::postprocess::decode_output;
use super::{DetectorConfig, SignboardDetector};
use crate::vision::error::VisionError;
use crate::vision::image_utils::{load_image, resize_with_padding, PreprocessInfo};
use crate::vision::types::Detection;

/// Letterbox padding value used by YOLO training pipelines
pub const LETTERBOX_FILL: u8 = 114;

/// YOLO detection model running on CPU
#[derive(Clone)]
pub struct YoloDetector {
    /// ONNX Runtime session (thread-safe)
    session: Arc<Mutex<Session>>,
    /// Model input name
    input_name: String,
    /// Post-processing settings
    config: DetectorConfig,
}

impl std::fmt::Debug for YoloDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YoloDetector")
            .field("input_name", &self.input_name)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl YoloDetector {
    /// Load the detection model from an ONNX file
    ///
    /// # Errors
    /// Returns error if:
    /// - Model file not found
    /// - Configuration is invalid
    /// - ONNX Runtime initialization fails
    pub async fn new<P: AsRef<Path>>(model_path: P, config: DetectorConfig) -> Result<Self> {
        let model_path = model_path.as_ref();

        if !model_path.exists() {
            anyhow::bail!("Signboard detection model not found: {}", model_path.display());
        }
        config
            .validate()
            .map_err(|e| anyhow::anyhow!("Invalid detector configuration: {}", e))?;

        info!("Loading signboard detection model from {}", model_path.display());

        let session = Session::builder()
            .context("Failed to create session builder")?
            .with_execution_providers([CPUExecutionProvider::default().build()])
            .context("Failed to set CPU execution provider")?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .context("Failed to set optimization level")?
            .with_intra_threads(config.intra_threads)
            .context("Failed to set intra threads")?
            .commit_from_file(model_path)
            .context(format!(
                "Failed to load signboard detection model from {}",
                model_path.display()
            ))?;

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .unwrap_or_else(|| "images".to_string());

        if let Some(output) = session.outputs.first() {
            debug!("Detection model output: {} {:?}", output.name, output.output_type);
        }

        info!("✅ Signboard detection model loaded (CPU-only, input: {})", input_name);

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            input_name,
            config,
        })
    }

    /// Run detection on a decoded image
    pub fn detect_image(&self, image: &DynamicImage) -> Result<Vec<Detection>> {
        let info = PreprocessInfo::new(image, self.config.input_size);
        let input = preprocess(image, self.config.input_size);

        let mut session = self
            .session
            .lock()
            .map_err(|_| anyhow::anyhow!("detection session lock poisoned"))?;

        let input_value =
            Value::from_array(input).context("Failed to create input tensor")?;

        let outputs = session
            .run(ort::inputs![self.input_name.as_str() => input_value])
            .context("Detection inference failed")?;

        let output_tensor = outputs[0]
            .try_extract_array::<f32>()
            .context("Failed to extract output tensor")?;
        debug!("Detection output shape: {:?}", output_tensor.shape());

        let detections = decode_output(output_tensor.view(), &info, &self.config)?;
        debug!("Detected {} signboard regions", detections.len());

        Ok(detections)
    }
}

impl SignboardDetector for YoloDetector {
    fn detect(&self, image_path: &Path) -> Result<Vec<Detection>, VisionError> {
        let image = load_image(image_path)?;
        Ok(self.detect_image(&image)?)
    }

    fn name(&self) -> &str {
        "yolo"
    }
}

/// Letterbox to a square RGB tensor of shape [1, 3, size, size] scaled to [0, 1]
pub fn preprocess(image: &DynamicImage, input_size: u32) -> Array4<f32> {
    let rgb = resize_with_padding(image, input_size, LETTERBOX_FILL).to_rgb8();
    let size = input_size as usize;

    let mut tensor = Array4::zeros((1, 3, size, size));
    for (x, y, pixel) in rgb.enumerate_pixels() {
        for c in 0..3 {
            tensor[[0, c, y as usize, x as usize]] = pixel[c] as f32 / 255.0;
        }
    }
    tensor
}
