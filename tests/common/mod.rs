// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Shared fakes and fixtures for the integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use image::{GrayImage, ImageFormat, Rgb, RgbImage};
use signboard_reader_node::{
    pipeline::{PipelineSettings, SignboardPipeline},
    storage::{AssetStore, UploadOutcome},
    vision::{
        BoundingBox, Detection, SignboardDetector, TextRecognizer, VisionError, VisionModelManager,
    },
};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

pub const BOUNDARY: &str = "signboard-test-boundary";

/// Detector that returns a fixed list, or fails
pub struct FakeDetector {
    detections: Vec<Detection>,
    fail: bool,
    seen: Mutex<Vec<PathBuf>>,
}

impl FakeDetector {
    pub fn returning(detections: Vec<Detection>) -> Self {
        Self {
            detections,
            fail: false,
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            detections: Vec::new(),
            fail: true,
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn seen(&self) -> Vec<PathBuf> {
        self.seen.lock().unwrap().clone()
    }
}

impl SignboardDetector for FakeDetector {
    fn detect(&self, image_path: &Path) -> Result<Vec<Detection>, VisionError> {
        assert!(image_path.exists(), "detector ran before the upload was persisted");
        self.seen.lock().unwrap().push(image_path.to_path_buf());
        if self.fail {
            return Err(VisionError::Inference(anyhow::anyhow!("model exploded")));
        }
        Ok(self.detections.clone())
    }

    fn name(&self) -> &str {
        "fake-detector"
    }
}

enum RecognizerMode {
    Read(Vec<String>),
    Fail,
    Panic,
}

/// Recognizer that reads the same fragments off every crop
pub struct FakeRecognizer {
    mode: RecognizerMode,
}

impl FakeRecognizer {
    pub fn reading(fragments: &[&str]) -> Self {
        Self {
            mode: RecognizerMode::Read(fragments.iter().map(|s| s.to_string()).collect()),
        }
    }

    pub fn failing() -> Self {
        Self {
            mode: RecognizerMode::Fail,
        }
    }

    /// Panics inside the blocking OCR task
    pub fn panicking() -> Self {
        Self {
            mode: RecognizerMode::Panic,
        }
    }
}

impl TextRecognizer for FakeRecognizer {
    fn read_fragments(&self, _image: &GrayImage) -> Result<Vec<String>, VisionError> {
        match &self.mode {
            RecognizerMode::Read(fragments) => Ok(fragments.clone()),
            RecognizerMode::Fail => Err(VisionError::Inference(anyhow::anyhow!("ocr exploded"))),
            RecognizerMode::Panic => panic!("ocr backend crashed"),
        }
    }

    fn name(&self) -> &str {
        "fake-ocr"
    }
}

/// One call seen by `RecordingStore`
#[derive(Debug, Clone)]
pub struct UploadCall {
    pub file_name: String,
    pub folder: String,
    /// Whether the local file existed when the upload ran
    pub existed: bool,
}

/// Asset store that records every upload and either succeeds or fails
pub struct RecordingStore {
    fail: bool,
    calls: Mutex<Vec<UploadCall>>,
}

impl RecordingStore {
    pub fn succeeding() -> Self {
        Self {
            fail: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<UploadCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl AssetStore for RecordingStore {
    async fn upload(&self, local_path: &Path, folder: &str) -> UploadOutcome {
        let file_name = local_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        self.calls.lock().unwrap().push(UploadCall {
            file_name: file_name.clone(),
            folder: folder.to_string(),
            existed: local_path.exists(),
        });

        if self.fail {
            UploadOutcome::Failed("asset store returned 500: down".to_string())
        } else {
            UploadOutcome::Uploaded(format!(
                "https://res.cloudinary.com/demo/image/upload/{}/{}",
                folder, file_name
            ))
        }
    }

    fn name(&self) -> &str {
        "recording"
    }
}

pub fn detection(x1: f32, y1: f32, x2: f32, y2: f32, confidence: f32) -> Detection {
    Detection::new(BoundingBox::new(x1, y1, x2, y2), confidence, 0)
}

/// Encoded PNG with a light background and a dark block in the middle
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        if x > width / 4 && x < width * 3 / 4 && y > height / 4 && y < height * 3 / 4 {
            Rgb([20, 20, 20])
        } else {
            Rgb([230, 230, 230])
        }
    });
    let mut buffer = Cursor::new(Vec::new());
    img.write_to(&mut buffer, ImageFormat::Png).unwrap();
    buffer.into_inner()
}

pub fn settings(work_dir: &Path) -> PipelineSettings {
    PipelineSettings {
        work_dir: work_dir.to_path_buf(),
        upload_folder: "signboards".to_string(),
        retained_dir: None,
    }
}

pub fn build_pipeline(
    detector: FakeDetector,
    recognizer: FakeRecognizer,
    store: Arc<RecordingStore>,
    settings: PipelineSettings,
) -> SignboardPipeline {
    let models = models(detector, recognizer);
    SignboardPipeline::new(&models, store, settings)
}

pub fn models(detector: FakeDetector, recognizer: FakeRecognizer) -> VisionModelManager {
    VisionModelManager::from_parts(Arc::new(detector), Arc::new(recognizer))
}

/// Entries left under a work root
pub fn entries(dir: &Path) -> Vec<PathBuf> {
    match std::fs::read_dir(dir) {
        Ok(read) => read.map(|e| e.unwrap().path()).collect(),
        Err(_) => Vec::new(),
    }
}

/// Multipart part description for `multipart_body`
pub enum Part<'a> {
    File {
        name: &'a str,
        file_name: &'a str,
        bytes: &'a [u8],
    },
    Text {
        name: &'a str,
        value: &'a str,
    },
}

/// Encode parts as a multipart/form-data body delimited by `BOUNDARY`
pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::File {
                name,
                file_name,
                bytes,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                        name, file_name
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
                body.extend_from_slice(bytes);
            }
            Part::Text { name, value } => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name)
                        .as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={}", BOUNDARY)
}
