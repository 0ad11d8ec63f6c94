// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image preprocessing for PaddleOCR

use image::{imageops::FilterType, DynamicImage, GenericImageView, GrayImage, RgbImage};
use ndarray::Array4;

use crate::vision::image_utils::resize_with_padding;

/// Target size for PaddleOCR detection model
pub const OCR_INPUT_SIZE: u32 = 640;

/// Recognition model input height
pub const REC_INPUT_HEIGHT: u32 = 48;

/// Maximum width for recognition model input
pub const REC_MAX_WIDTH: u32 = 320;

/// Minimum width for recognition model input
pub const REC_MIN_WIDTH: u32 = 4;

/// Padding gray for the detection canvas
pub const DETECTION_FILL: u8 = 128;

/// Mean values for detection normalization (ImageNet)
pub const MEAN: [f32; 3] = [0.485, 0.456, 0.406];

/// Std values for detection normalization (ImageNet)
pub const STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Recognition input is scaled to [-1, 1]
pub const REC_MEAN: f32 = 0.5;
pub const REC_STD: f32 = 0.5;

/// Expand a grayscale image to three identical channels
///
/// Both PaddleOCR models take RGB input; the signboard crops are read in
/// grayscale, so each channel carries the same luma value.
pub fn gray_to_rgb(image: &GrayImage) -> RgbImage {
    DynamicImage::ImageLuma8(image.clone()).to_rgb8()
}

/// Preprocess an image for OCR detection
///
/// Steps:
/// 1. Resize with aspect ratio preservation to OCR_INPUT_SIZE
/// 2. Pad to square with gray background
/// 3. Normalize with ImageNet mean/std: (pixel/255 - mean) / std
/// 4. Convert to NCHW tensor format [1, 3, H, W]
pub fn preprocess_for_detection(image: &DynamicImage) -> Array4<f32> {
    let rgb = resize_with_padding(image, OCR_INPUT_SIZE, DETECTION_FILL).to_rgb8();
    let size = OCR_INPUT_SIZE as usize;

    let mut tensor = Array4::zeros((1, 3, size, size));
    for (x, y, pixel) in rgb.enumerate_pixels() {
        for c in 0..3 {
            tensor[[0, c, y as usize, x as usize]] =
                (pixel[c] as f32 / 255.0 - MEAN[c]) / STD[c];
        }
    }
    tensor
}

/// Width a text line is resized to for recognition
pub fn recognition_width(width: u32, height: u32) -> u32 {
    if height == 0 {
        return REC_MIN_WIDTH;
    }
    let scale = REC_INPUT_HEIGHT as f32 / height as f32;
    ((width as f32 * scale).round() as u32).clamp(REC_MIN_WIDTH, REC_MAX_WIDTH)
}

/// Preprocess a cropped text line for recognition
///
/// Resizes to height 48 with a dynamic width (aspect ratio preserved, capped
/// at REC_MAX_WIDTH) and produces a [1, 3, 48, W] tensor in [-1, 1].
pub fn preprocess_for_recognition(image: &DynamicImage) -> Array4<f32> {
    let (orig_w, orig_h) = image.dimensions();
    let new_width = recognition_width(orig_w, orig_h);

    let rgb = image
        .resize_exact(new_width, REC_INPUT_HEIGHT, FilterType::Triangle)
        .to_rgb8();

    let mut tensor = Array4::zeros((1, 3, REC_INPUT_HEIGHT as usize, new_width as usize));
    for (x, y, pixel) in rgb.enumerate_pixels() {
        for c in 0..3 {
            tensor[[0, c, y as usize, x as usize]] =
                (pixel[c] as f32 / 255.0 - REC_MEAN) / REC_STD;
        }
    }
    tensor
}
