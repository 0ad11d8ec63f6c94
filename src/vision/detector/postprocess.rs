// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Decoding of raw YOLO output into detections
//!
//! The exported model emits one candidate per anchor as
//! `[cx, cy, w, h, score_0, .., score_n]` in letterboxed input space.
//! Output is either `[1, 4 + classes, anchors]` (the default export) or the
//! transposed `[1, anchors, 4 + classes]`.

use anyhow::Result;
use ndarray::{ArrayViewD, Ix3};
use std::cmp::Ordering;

use super::DetectorConfig;
use crate::vision::image_utils::PreprocessInfo;
use crate::vision::types::{BoundingBox, Detection};

/// Decode a raw output tensor into detections in original image coordinates
///
/// Applies the confidence floor, class-wise NMS and the detection cap, then
/// maps boxes back through the letterbox and clips them to the image.
/// Result is sorted by confidence, highest first.
pub fn decode_output(
    output: ArrayViewD<f32>,
    info: &PreprocessInfo,
    config: &DetectorConfig,
) -> Result<Vec<Detection>> {
    let output = output
        .into_dimensionality::<Ix3>()
        .map_err(|_| anyhow::anyhow!("expected a 3-D detection output"))?;
    let (batch, rows, cols) = output.dim();
    if batch != 1 {
        anyhow::bail!("expected batch size 1, got {}", batch);
    }

    // Anchors always outnumber attributes
    let channels_first = rows < cols;
    let (attributes, anchors) = if channels_first {
        (rows, cols)
    } else {
        (cols, rows)
    };
    if attributes < 5 {
        anyhow::bail!(
            "detection output has {} attributes per candidate, expected at least 5",
            attributes
        );
    }

    let value = |anchor: usize, attr: usize| -> f32 {
        if channels_first {
            output[[0, attr, anchor]]
        } else {
            output[[0, anchor, attr]]
        }
    };

    let mut candidates = Vec::new();
    for anchor in 0..anchors {
        let (class_id, score) = (4..attributes)
            .map(|attr| (attr - 4, value(anchor, attr)))
            .fold((0usize, f32::MIN), |best, current| {
                if current.1 > best.1 {
                    current
                } else {
                    best
                }
            });

        if score < config.confidence_threshold {
            continue;
        }

        let bbox = BoundingBox::from_center(
            value(anchor, 0),
            value(anchor, 1),
            value(anchor, 2),
            value(anchor, 3),
        );
        candidates.push(Detection::new(bbox, score, class_id as u32));
    }

    let kept = non_max_suppression(candidates, config.iou_threshold, config.max_detections);

    Ok(kept
        .into_iter()
        .map(|detection| Detection {
            bounding_box: to_original(&detection.bounding_box, info),
            ..detection
        })
        .collect())
}

/// Class-wise greedy NMS, highest confidence first
pub fn non_max_suppression(
    mut candidates: Vec<Detection>,
    iou_threshold: f32,
    max_detections: usize,
) -> Vec<Detection> {
    candidates.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(Ordering::Equal)
    });

    let mut kept: Vec<Detection> = Vec::new();
    for candidate in candidates {
        if kept.len() >= max_detections {
            break;
        }
        let suppressed = kept.iter().any(|k| {
            k.class_id == candidate.class_id
                && k.bounding_box.iou(&candidate.bounding_box) > iou_threshold
        });
        if !suppressed {
            kept.push(candidate);
        }
    }
    kept
}

fn to_original(bbox: &BoundingBox, info: &PreprocessInfo) -> BoundingBox {
    let (x1, y1) = info.map_to_original(bbox.x1, bbox.y1);
    let (x2, y2) = info.map_to_original(bbox.x2, bbox.y2);
    BoundingBox::new(x1, y1, x2, y2).clip(info.original_width, info.original_height)
}
