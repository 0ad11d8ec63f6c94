// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image loading and utility functions for vision processing

use image::{DynamicImage, GenericImageView, GrayImage, Rgb, RgbImage};
use std::path::Path;

use super::error::VisionError;

/// Load an image from disk, detecting the format from its content
pub fn load_image(path: &Path) -> Result<DynamicImage, VisionError> {
    image::ImageReader::open(path)
        .map_err(|e| VisionError::image_load(path, image::ImageError::IoError(e)))?
        .with_guessed_format()
        .map_err(|e| VisionError::image_load(path, image::ImageError::IoError(e)))?
        .decode()
        .map_err(|e| VisionError::image_load(path, e))
}

/// Load an image from disk as single-channel grayscale
pub fn load_grayscale(path: &Path) -> Result<GrayImage, VisionError> {
    Ok(load_image(path)?.to_luma8())
}

/// File extension for uploaded bytes, falling back to `jpg` for unknown content
pub fn extension_for_bytes(bytes: &[u8]) -> &'static str {
    image::guess_format(bytes)
        .ok()
        .and_then(|format| format.extensions_str().first().copied())
        .unwrap_or("jpg")
}

/// Resize image with aspect ratio preservation and padding
///
/// The image is scaled to fit within target_size x target_size
/// while preserving aspect ratio, then centered on a `fill` gray
/// background to reach the target dimensions.
pub fn resize_with_padding(image: &DynamicImage, target_size: u32, fill: u8) -> DynamicImage {
    let (orig_w, orig_h) = image.dimensions();
    let background = Rgb([fill, fill, fill]);

    if orig_w == 0 || orig_h == 0 {
        return DynamicImage::ImageRgb8(RgbImage::from_pixel(
            target_size,
            target_size,
            background,
        ));
    }

    let info = PreprocessInfo::new(image, target_size);
    let new_w = ((orig_w as f32 * info.scale).round() as u32).clamp(1, target_size);
    let new_h = ((orig_h as f32 * info.scale).round() as u32).clamp(1, target_size);

    let resized = image.resize_exact(new_w, new_h, image::imageops::FilterType::Triangle);
    let mut output = RgbImage::from_pixel(target_size, target_size, background);
    image::imageops::replace(
        &mut output,
        &resized.to_rgb8(),
        info.offset_x as i64,
        info.offset_y as i64,
    );

    DynamicImage::ImageRgb8(output)
}

/// Scaling factor and offsets used during letterbox preprocessing
///
/// Maps model-space coordinates back to the original image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreprocessInfo {
    /// Scale factor applied
    pub scale: f32,
    /// X offset from padding
    pub offset_x: u32,
    /// Y offset from padding
    pub offset_y: u32,
    /// Original image width
    pub original_width: u32,
    /// Original image height
    pub original_height: u32,
}

impl PreprocessInfo {
    /// Calculate preprocessing info for an image
    pub fn new(image: &DynamicImage, target_size: u32) -> Self {
        let (orig_w, orig_h) = image.dimensions();
        Self::for_dimensions(orig_w, orig_h, target_size)
    }

    pub fn for_dimensions(orig_w: u32, orig_h: u32, target_size: u32) -> Self {
        if orig_w == 0 || orig_h == 0 {
            return Self {
                scale: 1.0,
                offset_x: 0,
                offset_y: 0,
                original_width: orig_w,
                original_height: orig_h,
            };
        }

        let scale = (target_size as f32 / orig_w as f32).min(target_size as f32 / orig_h as f32);
        let new_w = ((orig_w as f32 * scale).round() as u32).clamp(1, target_size);
        let new_h = ((orig_h as f32 * scale).round() as u32).clamp(1, target_size);

        Self {
            scale,
            offset_x: (target_size - new_w) / 2,
            offset_y: (target_size - new_h) / 2,
            original_width: orig_w,
            original_height: orig_h,
        }
    }

    /// Map a coordinate from preprocessed space back to original image space
    pub fn map_to_original(&self, x: f32, y: f32) -> (f32, f32) {
        let orig_x = (x - self.offset_x as f32) / self.scale;
        let orig_y = (y - self.offset_y as f32) / self.scale;
        (orig_x, orig_y)
    }
}
