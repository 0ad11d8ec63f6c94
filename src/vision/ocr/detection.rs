// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! PaddleOCR text detection model
//!
//! This module provides the text detection component of PaddleOCR.
//! It finds text lines in an image and returns them in reading order.

use anyhow::{Context, Result};
use image::DynamicImage;
use ndarray::{ArrayView2, ArrayViewD, Axis, Ix2};
use ort::execution_providers::CPUExecutionProvider;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use std::cmp::Ordering;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use super::preprocessing::{preprocess_for_detection, OCR_INPUT_SIZE};
use crate::vision::image_utils::PreprocessInfo;
use crate::vision::types::BoundingBox;

/// Probability above which a pixel counts as text
pub const DEFAULT_PIXEL_THRESHOLD: f32 = 0.3;

/// Mean probability a region needs to be kept
pub const DEFAULT_BOX_THRESHOLD: f32 = 0.5;

/// Regions smaller than this many pixels are noise
pub const MIN_REGION_PIXELS: usize = 10;

/// DB shrinks text regions during training; boxes are grown back by this ratio
pub const UNCLIP_RATIO: f32 = 1.5;

/// A detected text line
#[derive(Debug, Clone, PartialEq)]
pub struct TextBox {
    /// X coordinate of top-left corner
    pub x: f32,
    /// Y coordinate of top-left corner
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Mean text probability over the region
    pub confidence: f32,
}

impl TextBox {
    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    pub fn center_y(&self) -> f32 {
        self.y + self.height / 2.0
    }

    pub fn to_bounding_box(&self) -> BoundingBox {
        BoundingBox::new(self.x, self.y, self.x + self.width, self.y + self.height)
    }

    fn from_bounding_box(bbox: BoundingBox, confidence: f32) -> Self {
        Self {
            x: bbox.x1,
            y: bbox.y1,
            width: bbox.width(),
            height: bbox.height(),
            confidence,
        }
    }
}

/// PaddleOCR text detection model (DB)
///
/// Runs on CPU. The session is shared behind a mutex so one model instance
/// can serve concurrent requests.
#[derive(Clone)]
pub struct OcrDetectionModel {
    /// ONNX Runtime session (thread-safe)
    session: Arc<Mutex<Session>>,
    /// Model input name
    input_name: String,
    pixel_threshold: f32,
    box_threshold: f32,
}

impl std::fmt::Debug for OcrDetectionModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OcrDetectionModel")
            .field("input_name", &self.input_name)
            .field("pixel_threshold", &self.pixel_threshold)
            .field("box_threshold", &self.box_threshold)
            .finish_non_exhaustive()
    }
}

impl OcrDetectionModel {
    /// Load the OCR detection model from a file
    ///
    /// # Errors
    /// Returns error if the model file is missing or ONNX Runtime rejects it
    pub async fn new<P: AsRef<Path>>(model_path: P, intra_threads: usize) -> Result<Self> {
        let model_path = model_path.as_ref();

        if !model_path.exists() {
            anyhow::bail!("OCR detection model not found: {}", model_path.display());
        }

        info!("Loading OCR detection model from {}", model_path.display());

        let session = Session::builder()
            .context("Failed to create session builder")?
            .with_execution_providers([CPUExecutionProvider::default().build()])
            .context("Failed to set CPU execution provider")?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .context("Failed to set optimization level")?
            .with_intra_threads(intra_threads)
            .context("Failed to set intra threads")?
            .commit_from_file(model_path)
            .context(format!(
                "Failed to load OCR detection model from {}",
                model_path.display()
            ))?;

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .unwrap_or_else(|| "x".to_string());

        if let Some(input) = session.inputs.first() {
            debug!("Detection model input shape: {:?}", input.input_type);
        }

        info!("✅ OCR detection model loaded successfully (CPU-only)");

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            input_name,
            pixel_threshold: DEFAULT_PIXEL_THRESHOLD,
            box_threshold: DEFAULT_BOX_THRESHOLD,
        })
    }

    /// Find text lines in an image
    ///
    /// Boxes are in the image's own pixel coordinates, clipped to its bounds
    /// and sorted top-to-bottom, left-to-right.
    pub fn detect(&self, image: &DynamicImage) -> Result<Vec<TextBox>> {
        let info = PreprocessInfo::new(image, OCR_INPUT_SIZE);
        let input = preprocess_for_detection(image);

        let mut session = self
            .session
            .lock()
            .map_err(|_| anyhow::anyhow!("OCR detection session lock poisoned"))?;

        let input_value = Value::from_array(input).context("Failed to create input tensor")?;

        let outputs = session
            .run(ort::inputs![self.input_name.as_str() => input_value])
            .context("Detection inference failed")?;

        let output_tensor = outputs[0]
            .try_extract_array::<f32>()
            .context("Failed to extract output tensor")?;
        debug!("OCR detection output shape: {:?}", output_tensor.shape());

        let prob = probability_map(output_tensor.view())?;
        let (prob_height, prob_width) = prob.dim();
        let scale_x = OCR_INPUT_SIZE as f32 / prob_width as f32;
        let scale_y = OCR_INPUT_SIZE as f32 / prob_height as f32;

        let boxes = extract_text_boxes(prob, self.pixel_threshold, self.box_threshold)
            .into_iter()
            .filter_map(|text_box| {
                let (x1, y1) = info.map_to_original(text_box.x * scale_x, text_box.y * scale_y);
                let (x2, y2) = info.map_to_original(
                    (text_box.x + text_box.width) * scale_x,
                    (text_box.y + text_box.height) * scale_y,
                );
                let bbox = BoundingBox::new(x1, y1, x2, y2)
                    .clip(info.original_width, info.original_height);
                (bbox.area() > 0.0).then(|| TextBox::from_bounding_box(bbox, text_box.confidence))
            })
            .collect();

        let boxes = sort_reading_order(boxes);
        debug!("Detected {} text lines", boxes.len());
        Ok(boxes)
    }
}

/// Reduce a `[1, 1, H, W]` or `[1, H, W]` output to its `[H, W]` map
pub fn probability_map(output: ArrayViewD<'_, f32>) -> Result<ArrayView2<'_, f32>> {
    let mut view = output;
    while view.ndim() > 2 {
        if view.shape()[0] != 1 {
            anyhow::bail!("Unexpected detection output shape: {:?}", view.shape());
        }
        view = view.index_axis_move(Axis(0), 0);
    }
    view.into_dimensionality::<Ix2>()
        .map_err(|_| anyhow::anyhow!("Detection output is not a probability map"))
}

/// Connected text regions of a probability map, in map coordinates
///
/// Each region is grown by the DB unclip offset so the box covers the
/// whole glyphs rather than the shrunk text kernel.
pub fn extract_text_boxes(
    prob: ArrayView2<f32>,
    pixel_threshold: f32,
    box_threshold: f32,
) -> Vec<TextBox> {
    let (height, width) = prob.dim();
    let mut visited = vec![vec![false; width]; height];
    let mut boxes = Vec::new();

    for y in 0..height {
        for x in 0..width {
            if visited[y][x] || prob[[y, x]] < pixel_threshold {
                continue;
            }

            let region = flood_fill(&prob, &mut visited, x, y, pixel_threshold);
            if region.count < MIN_REGION_PIXELS {
                continue;
            }
            let confidence = region.sum / region.count as f32;
            if confidence < box_threshold {
                continue;
            }

            let w = (region.max_x - region.min_x + 1) as f32;
            let h = (region.max_y - region.min_y + 1) as f32;
            let offset = w * h * UNCLIP_RATIO / (2.0 * (w + h));

            boxes.push(TextBox {
                x: region.min_x as f32 - offset,
                y: region.min_y as f32 - offset,
                width: w + 2.0 * offset,
                height: h + 2.0 * offset,
                confidence,
            });
        }
    }

    boxes
}

/// Sort boxes into lines by vertical center, then each line left to right
pub fn sort_reading_order(mut boxes: Vec<TextBox>) -> Vec<TextBox> {
    boxes.sort_by(|a, b| {
        a.center_y()
            .partial_cmp(&b.center_y())
            .unwrap_or(Ordering::Equal)
    });

    let mut lines: Vec<Vec<TextBox>> = Vec::new();
    for text_box in boxes {
        let same_line = lines
            .last()
            .and_then(|line| line.first())
            .map_or(false, |anchor| {
                (text_box.center_y() - anchor.center_y()).abs()
                    < anchor.height.min(text_box.height) / 2.0
            });

        match lines.last_mut() {
            Some(line) if same_line => line.push(text_box),
            _ => lines.push(vec![text_box]),
        }
    }

    lines
        .into_iter()
        .flat_map(|mut line| {
            line.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(Ordering::Equal));
            line
        })
        .collect()
}

struct Region {
    min_x: usize,
    max_x: usize,
    min_y: usize,
    max_y: usize,
    count: usize,
    sum: f32,
}

/// 4-connected flood fill from a text pixel
fn flood_fill(
    prob: &ArrayView2<f32>,
    visited: &mut [Vec<bool>],
    start_x: usize,
    start_y: usize,
    threshold: f32,
) -> Region {
    let (height, width) = prob.dim();
    let mut region = Region {
        min_x: start_x,
        max_x: start_x,
        min_y: start_y,
        max_y: start_y,
        count: 0,
        sum: 0.0,
    };
    let mut stack = vec![(start_x, start_y)];

    while let Some((x, y)) = stack.pop() {
        if visited[y][x] {
            continue;
        }
        let p = prob[[y, x]];
        if p < threshold {
            continue;
        }

        visited[y][x] = true;
        region.count += 1;
        region.sum += p;
        region.min_x = region.min_x.min(x);
        region.max_x = region.max_x.max(x);
        region.min_y = region.min_y.min(y);
        region.max_y = region.max_y.max(y);

        if x > 0 {
            stack.push((x - 1, y));
        }
        if x + 1 < width {
            stack.push((x + 1, y));
        }
        if y > 0 {
            stack.push((x, y - 1));
        }
        if y + 1 < height {
            stack.push((x, y + 1));
        }
    }

    region
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array2, Array4};

    const DETECTION_MODEL_PATH: &str = "/workspace/models/paddleocr-onnx/det_model.onnx";

    fn text_box(x: f32, y: f32, width: f32, height: f32) -> TextBox {
        TextBox {
            x,
            y,
            width,
            height,
            confidence: 0.9,
        }
    }

    fn fill(
        map: &mut Array2<f32>,
        rows: std::ops::RangeInclusive<usize>,
        cols: std::ops::RangeInclusive<usize>,
        p: f32,
    ) {
        for y in rows {
            for x in cols.clone() {
                map[[y, x]] = p;
            }
        }
    }

    #[test]
    fn test_text_box_geometry() {
        let b = text_box(10.0, 20.0, 100.0, 50.0);
        assert_eq!(b.area(), 5000.0);
        assert_eq!(b.center_y(), 45.0);
        assert_eq!(b.to_bounding_box(), BoundingBox::new(10.0, 20.0, 110.0, 70.0));
    }

    #[test]
    fn test_extract_single_region_with_unclip() {
        let mut map = Array2::<f32>::zeros((20, 40));
        fill(&mut map, 2..=5, 3..=12, 0.9);

        let boxes = extract_text_boxes(map.view(), 0.3, 0.5);
        assert_eq!(boxes.len(), 1);

        let offset = 10.0 * 4.0 * UNCLIP_RATIO / (2.0 * 14.0);
        assert!((boxes[0].x - (3.0 - offset)).abs() < 1e-4);
        assert!((boxes[0].y - (2.0 - offset)).abs() < 1e-4);
        assert!((boxes[0].width - (10.0 + 2.0 * offset)).abs() < 1e-4);
        assert!((boxes[0].confidence - 0.9).abs() < 1e-4);
    }

    #[test]
    fn test_extract_drops_small_and_weak_regions() {
        let mut map = Array2::<f32>::zeros((20, 40));
        // 4 pixels: too small
        fill(&mut map, 1..=2, 1..=2, 0.9);
        // large but low mean probability
        fill(&mut map, 10..=14, 10..=30, 0.35);

        assert!(extract_text_boxes(map.view(), 0.3, 0.5).is_empty());
    }

    #[test]
    fn test_extract_separates_disconnected_regions() {
        let mut map = Array2::<f32>::zeros((30, 60));
        fill(&mut map, 2..=6, 2..=20, 0.8);
        fill(&mut map, 2..=6, 30..=50, 0.8);
        fill(&mut map, 15..=20, 2..=40, 0.8);

        assert_eq!(extract_text_boxes(map.view(), 0.3, 0.5).len(), 3);
    }

    #[test]
    fn test_probability_map_shapes() {
        let four_d = Array4::<f32>::zeros((1, 1, 8, 16));
        assert_eq!(probability_map(four_d.view().into_dyn()).unwrap().dim(), (8, 16));

        let three_d = ndarray::Array3::<f32>::zeros((1, 8, 16));
        assert_eq!(probability_map(three_d.view().into_dyn()).unwrap().dim(), (8, 16));

        let batched = Array4::<f32>::zeros((2, 1, 8, 16));
        assert!(probability_map(batched.view().into_dyn()).is_err());
    }

    #[test]
    fn test_sort_reading_order() {
        let boxes = vec![
            text_box(200.0, 102.0, 80.0, 30.0), // line 2, right
            text_box(10.0, 10.0, 80.0, 30.0),   // line 1, left
            text_box(10.0, 100.0, 80.0, 30.0),  // line 2, left
            text_box(150.0, 14.0, 80.0, 30.0),  // line 1, right
        ];

        let sorted = sort_reading_order(boxes);
        let order: Vec<(f32, f32)> = sorted.iter().map(|b| (b.x, b.y)).collect();
        assert_eq!(
            order,
            vec![(10.0, 10.0), (150.0, 14.0), (10.0, 100.0), (200.0, 102.0)]
        );
    }

    #[test]
    fn test_sort_reading_order_empty() {
        assert!(sort_reading_order(Vec::new()).is_empty());
    }

    #[tokio::test]
    async fn test_model_not_found_error() {
        let result = OcrDetectionModel::new("/nonexistent/path/det_model.onnx", 1).await;
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("not found"));
    }

    #[tokio::test]
    #[ignore] // Only run if model files are downloaded
    async fn test_detection_on_blank_image() {
        let model = match OcrDetectionModel::new(DETECTION_MODEL_PATH, 4).await {
            Ok(m) => m,
            Err(_) => return,
        };

        let boxes = model.detect(&DynamicImage::new_rgb8(320, 120)).unwrap();
        assert!(boxes.is_empty());
    }
}
