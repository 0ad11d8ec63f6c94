// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Command-line and environment configuration for the node binary

use clap::Parser;
use std::path::PathBuf;

use crate::config::server::{DEFAULT_MAX_UPLOAD_BYTES, DEFAULT_UPLOAD_FOLDER};
use crate::config::ServerConfig;
use crate::vision::detector::{
    DetectorConfig, DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_IOU_THRESHOLD, DEFAULT_MAX_DETECTIONS,
};
use crate::vision::ocr::model::{DEFAULT_MODEL_DIR, DICTIONARY_FILE};
use crate::vision::ocr::OcrModelConfig;
use crate::vision::VisionModelConfig;

/// Signboard Reader Node
#[derive(Parser, Debug, Clone)]
#[command(name = "signboard-reader-node")]
#[command(version = crate::version::VERSION_NUMBER)]
#[command(about = "Detects signboards in photos, reads their text and hosts the crops", long_about = None)]
pub struct Args {
    /// Interface to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to bind
    #[arg(long, env = "PORT", default_value_t = 5000)]
    pub port: u16,

    /// Signboard detection ONNX model
    #[arg(long, env = "DETECTOR_MODEL_PATH", default_value = "./models/signboard/best.onnx")]
    pub detector_model: PathBuf,

    /// Directory holding the PaddleOCR ONNX models
    #[arg(long, env = "OCR_MODEL_DIR", default_value = DEFAULT_MODEL_DIR)]
    pub ocr_model_dir: PathBuf,

    /// Character dictionary file inside the OCR model directory
    #[arg(long, env = "OCR_DICTIONARY", default_value = DICTIONARY_FILE)]
    pub ocr_dictionary: String,

    /// ONNX Runtime intra-op threads per model
    #[arg(long, env = "VISION_THREADS", default_value_t = 4)]
    pub vision_threads: usize,

    /// Minimum detection confidence
    #[arg(long, env = "DETECTION_CONFIDENCE", default_value_t = DEFAULT_CONFIDENCE_THRESHOLD)]
    pub detection_confidence: f32,

    /// IoU threshold for detection NMS
    #[arg(long, env = "DETECTION_IOU", default_value_t = DEFAULT_IOU_THRESHOLD)]
    pub detection_iou: f32,

    /// Root for per-request temporary directories (defaults to the system temp dir)
    #[arg(long, env = "WORK_DIR")]
    pub work_dir: Option<PathBuf>,

    /// Directory served under /static
    #[arg(long, env = "STATIC_DIR", default_value = "static")]
    pub static_dir: PathBuf,

    /// Keep a copy of every uploaded original under <static-dir>/uploads
    #[arg(long, env = "RETAIN_ORIGINALS")]
    pub retain_originals: bool,

    /// Remote folder for uploaded images
    #[arg(long, env = "UPLOAD_FOLDER", default_value = DEFAULT_UPLOAD_FOLDER)]
    pub upload_folder: String,

    /// Request body limit for uploads, in bytes
    #[arg(long, env = "MAX_UPLOAD_BYTES", default_value_t = DEFAULT_MAX_UPLOAD_BYTES)]
    pub max_upload_bytes: usize,
}

impl Args {
    pub fn server_config(&self) -> ServerConfig {
        let defaults = ServerConfig::default();
        ServerConfig {
            host: self.host.clone(),
            port: self.port,
            work_dir: self.work_dir.clone().unwrap_or(defaults.work_dir),
            static_dir: self.static_dir.clone(),
            retain_originals: self.retain_originals,
            upload_folder: self.upload_folder.clone(),
            max_upload_bytes: self.max_upload_bytes,
        }
    }

    pub fn vision_config(&self) -> VisionModelConfig {
        let mut ocr = OcrModelConfig::new(&self.ocr_model_dir);
        ocr.dictionary_file = self.ocr_dictionary.clone();
        ocr.intra_threads = self.vision_threads;

        VisionModelConfig {
            detector_model_path: self.detector_model.clone(),
            ocr,
            detector: DetectorConfig {
                confidence_threshold: self.detection_confidence,
                iou_threshold: self.detection_iou,
                max_detections: DEFAULT_MAX_DETECTIONS,
                intra_threads: self.vision_threads,
                ..DetectorConfig::default()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["signboard-reader-node"]).unwrap();
        let server = args.server_config();

        assert_eq!(server.port, 5000);
        assert_eq!(server.upload_folder, "signboards");
        assert!(!server.retain_originals);
        assert_eq!(server.max_upload_bytes, 10 * 1024 * 1024);

        let vision = args.vision_config();
        assert_eq!(vision.detector, DetectorConfig::default());
        assert_eq!(vision.ocr.dictionary_file, "en_dict.txt");
    }

    #[test]
    fn test_flags_override_defaults() {
        let args = Args::try_parse_from([
            "signboard-reader-node",
            "--port",
            "8088",
            "--retain-originals",
            "--work-dir",
            "/var/tmp/signboards",
            "--detection-confidence",
            "0.4",
            "--vision-threads",
            "2",
        ])
        .unwrap();

        let server = args.server_config();
        assert_eq!(server.port, 8088);
        assert!(server.retain_originals);
        assert_eq!(server.work_dir, PathBuf::from("/var/tmp/signboards"));

        let vision = args.vision_config();
        assert_eq!(vision.detector.confidence_threshold, 0.4);
        assert_eq!(vision.detector.intra_threads, 2);
        assert_eq!(vision.ocr.intra_threads, 2);
    }
}
