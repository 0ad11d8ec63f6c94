// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Box drawing and signboard cropping
//!
//! Both operations write a new file and never modify the source. The
//! path-based forms decode the source themselves; the `*_on`/`crop_image`
//! forms take an image the caller already decoded.

use image::{DynamicImage, GenericImageView, Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use super::error::VisionError;
use super::image_utils::load_image;
use super::types::{BoundingBox, Detection};

/// Outline color for detected regions
pub const BOX_COLOR: [u8; 3] = [255, 0, 0];

/// Outline width in pixels
pub const BOX_THICKNESS: u32 = 4;

#[derive(Debug, Error)]
pub enum AnnotateError {
    #[error(transparent)]
    Load(#[from] VisionError),

    /// The box has no pixels left after truncation and clamping
    #[error("bounding box {bbox:?} is empty inside a {width}x{height} image")]
    EmptyRegion {
        bbox: [f32; 4],
        width: u32,
        height: u32,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Renders detection boxes and extracts per-detection crops
#[derive(Debug, Clone)]
pub struct ImageAnnotator {
    color: Rgb<u8>,
    thickness: u32,
}

impl Default for ImageAnnotator {
    fn default() -> Self {
        Self {
            color: Rgb(BOX_COLOR),
            thickness: BOX_THICKNESS,
        }
    }
}

impl ImageAnnotator {
    /// Draw every detection box onto an RGB copy of `image_path` and write it to `output_path`
    pub fn draw_boxes(
        &self,
        image_path: &Path,
        detections: &[Detection],
        output_path: &Path,
    ) -> Result<PathBuf, AnnotateError> {
        let image = load_image(image_path)?;
        self.draw_boxes_on(&image, detections, output_path)
    }

    /// Draw every detection box onto an RGB copy of `image`
    pub fn draw_boxes_on(
        &self,
        image: &DynamicImage,
        detections: &[Detection],
        output_path: &Path,
    ) -> Result<PathBuf, AnnotateError> {
        let mut canvas = image.to_rgb8();

        for detection in detections {
            self.draw_box(&mut canvas, &detection.bounding_box);
        }

        save_rgb(&canvas, output_path)?;
        debug!(
            "Drew {} boxes into {}",
            detections.len(),
            output_path.display()
        );
        Ok(output_path.to_path_buf())
    }

    /// Extract the region under `bbox` from `image_path` and write it to `output_path`
    pub fn crop(
        &self,
        image_path: &Path,
        bbox: &BoundingBox,
        output_path: &Path,
    ) -> Result<PathBuf, AnnotateError> {
        let image = load_image(image_path)?;
        self.crop_image(&image, bbox, output_path)
    }

    /// Extract the region under `bbox` from a decoded image
    pub fn crop_image(
        &self,
        image: &DynamicImage,
        bbox: &BoundingBox,
        output_path: &Path,
    ) -> Result<PathBuf, AnnotateError> {
        let (width, height) = image.dimensions();

        let rect = bbox
            .pixel_rect(width, height)
            .ok_or(AnnotateError::EmptyRegion {
                bbox: bbox.to_array(),
                width,
                height,
            })?;

        let cropped = image
            .crop_imm(rect.x, rect.y, rect.width, rect.height)
            .to_rgb8();
        save_rgb(&cropped, output_path)?;
        Ok(output_path.to_path_buf())
    }

    fn draw_box(&self, canvas: &mut RgbImage, bbox: &BoundingBox) {
        let Some(rect) = bbox.pixel_rect(canvas.width(), canvas.height()) else {
            return;
        };

        // Nested outlines grow the stroke inwards
        for inset in 0..self.thickness {
            let width = rect.width.saturating_sub(2 * inset);
            let height = rect.height.saturating_sub(2 * inset);
            if width == 0 || height == 0 {
                break;
            }
            let outline = Rect::at((rect.x + inset) as i32, (rect.y + inset) as i32)
                .of_size(width, height);
            draw_hollow_rect_mut(canvas, outline, self.color);
        }
    }
}

fn save_rgb(image: &RgbImage, path: &Path) -> Result<(), AnnotateError> {
    image.save(path).map_err(|source| AnnotateError::Write {
        path: path.to_path_buf(),
        source,
    })
}
