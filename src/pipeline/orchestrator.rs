// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Drives one uploaded image through detection, annotation, upload and OCR
//!
//! Only validation, persistence and detection can fail a request. Every later
//! step degrades a single field, so the report always has one result per
//! detection.

use bytes::Bytes;
use image::DynamicImage;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, field, info, info_span, warn, Instrument, Span};
use uuid::Uuid;

use super::error::PipelineError;
use super::result::{DetectionResult, SignboardReport};
use super::session::RequestSession;
use crate::config::ServerConfig;
use crate::storage::{AssetStore, UploadOutcome};
use crate::vision::image_utils::load_image;
use crate::vision::{
    extension_for_bytes, Detection, ImageAnnotator, SignboardDetector, TextRecognizer,
    VisionModelManager,
};

/// Message returned when a request carries no image
pub const NO_IMAGE_MESSAGE: &str = "No image uploaded";

/// Public path prefix of retained originals
pub const RETAINED_URL_PREFIX: &str = "/static/uploads";

/// Raw upload as received from the HTTP layer
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub bytes: Bytes,
    /// Client-side file name, for logs only
    pub file_name: Option<String>,
}

impl ImageUpload {
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self {
            bytes: bytes.into(),
            file_name: None,
        }
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }
}

/// Where a pipeline run puts its files
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSettings {
    /// Root for request session directories
    pub work_dir: PathBuf,
    /// Remote folder for uploads
    pub upload_folder: String,
    /// Directory for retained originals, `None` disables retention
    pub retained_dir: Option<PathBuf>,
}

impl From<&ServerConfig> for PipelineSettings {
    fn from(config: &ServerConfig) -> Self {
        Self {
            work_dir: config.work_dir.clone(),
            upload_folder: config.upload_folder.clone(),
            retained_dir: config.retained_dir(),
        }
    }
}

/// Request orchestrator shared by all handlers
#[derive(Clone)]
pub struct SignboardPipeline {
    detector: Arc<dyn SignboardDetector>,
    recognizer: Arc<dyn TextRecognizer>,
    store: Arc<dyn AssetStore>,
    annotator: ImageAnnotator,
    settings: Arc<PipelineSettings>,
}

impl std::fmt::Debug for SignboardPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignboardPipeline")
            .field("detector", &self.detector.name())
            .field("recognizer", &self.recognizer.name())
            .field("store", &self.store.name())
            .field("settings", &self.settings)
            .finish()
    }
}

impl SignboardPipeline {
    pub fn new(
        models: &VisionModelManager,
        store: Arc<dyn AssetStore>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            detector: models.detector(),
            recognizer: models.recognizer(),
            store,
            annotator: ImageAnnotator::default(),
            settings: Arc::new(settings),
        }
    }

    pub fn store_name(&self) -> &str {
        self.store.name()
    }

    /// Run the full pipeline for one uploaded image
    ///
    /// # Errors
    /// - `Validation` when the upload is empty; nothing is written
    /// - `Persist` when the request session cannot be created or written
    /// - `Detection` when the detector fails
    /// - `Internal` when a blocking task panics
    pub async fn process(&self, upload: ImageUpload) -> Result<SignboardReport, PipelineError> {
        if upload.bytes.is_empty() {
            return Err(PipelineError::Validation(NO_IMAGE_MESSAGE.to_string()));
        }

        let request_id = Uuid::new_v4();
        let span = info_span!(
            "detect_signboard",
            %request_id,
            session = field::Empty,
            detections = field::Empty
        );

        async move {
            let work_dir = self.settings.work_dir.clone();
            let mut session = blocking(move || RequestSession::create(&work_dir)).await??;
            Span::current().record("session", field::display(session.path().display()));

            let result = self.run(&mut session, upload, request_id).await;
            if let Err(e) = &result {
                error!("❌ Signboard request failed: {}", e);
            }

            if let Err(e) = blocking(move || session.release()).await {
                warn!("⚠️ Request cleanup did not finish: {}", e);
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn run(
        &self,
        session: &mut RequestSession,
        upload: ImageUpload,
        request_id: Uuid,
    ) -> Result<SignboardReport, PipelineError> {
        let extension = extension_for_bytes(&upload.bytes);
        let original = session.original_path(extension);
        session.track(original.clone());

        let size = upload.bytes.len();
        let (path, bytes) = (original.clone(), upload.bytes);
        blocking(move || std::fs::write(&path, &bytes)).await??;
        info!(
            "Persisted upload {} ({} bytes) to {}",
            upload.file_name.as_deref().unwrap_or("<unnamed>"),
            size,
            original.display()
        );

        let original_image = self
            .retain_original(&original, session.stamp(), request_id, extension)
            .await;

        let detector = self.detector.clone();
        let path = original.clone();
        let detections = blocking(move || detector.detect(&path))
            .await?
            .map_err(PipelineError::Detection)?;
        Span::current().record("detections", detections.len());
        info!("Detected {} signboards", detections.len());

        // Decoded once for the overview and every crop
        let path = original.clone();
        let source = match blocking(move || load_image(&path)).await? {
            Ok(image) => Some(Arc::new(image)),
            Err(e) => {
                warn!("⚠️ Failed to decode upload for annotation: {}", e);
                None
            }
        };

        let boxed_image_url = match &source {
            Some(image) => self.annotate_overview(session, image, &detections).await?,
            None => None,
        };

        let mut results = Vec::with_capacity(detections.len());
        for (index, detection) in detections.iter().enumerate() {
            let result = match &source {
                Some(image) => {
                    self.process_detection(session, image, index, detection)
                        .await?
                }
                None => DetectionResult::new(detection, None, String::new()),
            };
            results.push(result);
        }

        Ok(SignboardReport {
            original_image,
            boxed_image_url,
            detections: results,
        })
    }

    /// Draw all boxes and upload the overview
    async fn annotate_overview(
        &self,
        session: &mut RequestSession,
        image: &Arc<DynamicImage>,
        detections: &[Detection],
    ) -> Result<Option<String>, PipelineError> {
        let boxed = session.boxed_path();
        session.track(boxed.clone());

        let annotator = self.annotator.clone();
        let (image, target, boxes) = (Arc::clone(image), boxed, detections.to_vec());
        let drawn = blocking(move || annotator.draw_boxes_on(&image, &boxes, &target)).await?;

        match drawn {
            Ok(path) => Ok(self.upload(&path, "boxed image").await),
            Err(e) => {
                warn!("⚠️ Failed to draw detection boxes: {}", e);
                Ok(None)
            }
        }
    }

    /// Crop, upload and read one detection
    ///
    /// OCR runs on the local crop whatever the upload outcome.
    async fn process_detection(
        &self,
        session: &mut RequestSession,
        image: &Arc<DynamicImage>,
        index: usize,
        detection: &Detection,
    ) -> Result<DetectionResult, PipelineError> {
        let crop_path = session.crop_path(index);
        session.track(crop_path.clone());

        let annotator = self.annotator.clone();
        let (image, bbox) = (Arc::clone(image), detection.bounding_box);
        let cropped = blocking(move || annotator.crop_image(&image, &bbox, &crop_path)).await?;

        let crop = match cropped {
            Ok(path) => path,
            Err(e) => {
                warn!("⚠️ Failed to crop detection {}: {}", index, e);
                return Ok(DetectionResult::new(detection, None, String::new()));
            }
        };

        let cropped_url = self.upload(&crop, &format!("crop {}", index)).await;

        let recognizer = self.recognizer.clone();
        let extracted_text = match blocking(move || recognizer.recognize(&crop)).await? {
            Ok(text) => text,
            Err(e) => {
                warn!("⚠️ Text recognition failed for detection {}: {}", index, e);
                String::new()
            }
        };
        debug!("Detection {} text: {:?}", index, extracted_text);

        Ok(DetectionResult::new(detection, cropped_url, extracted_text))
    }

    async fn upload(&self, path: &Path, what: &str) -> Option<String> {
        match self.store.upload(path, &self.settings.upload_folder).await {
            UploadOutcome::Uploaded(url) => {
                debug!("Uploaded {} to {}", what, url);
                Some(url)
            }
            UploadOutcome::Failed(reason) => {
                warn!("⚠️ Upload of {} failed: {}", what, reason);
                None
            }
        }
    }

    /// Copy the original into the static uploads directory
    async fn retain_original(
        &self,
        original: &Path,
        stamp: i64,
        request_id: Uuid,
        extension: &str,
    ) -> Option<String> {
        let dir = self.settings.retained_dir.clone()?;
        let file_name = retained_file_name(stamp, request_id, extension);
        let (source, target) = (original.to_path_buf(), file_name.clone());

        let copied = blocking(move || copy_retained(&source, &dir, &target))
            .await
            .and_then(|copied| copied.map_err(PipelineError::from));

        match copied {
            Ok(()) => Some(format!("{}/{}", RETAINED_URL_PREFIX, file_name)),
            Err(e) => {
                warn!("⚠️ Failed to retain original image: {}", e);
                None
            }
        }
    }
}

/// Retained file name, unique per request even within one millisecond
fn retained_file_name(stamp: i64, request_id: Uuid, extension: &str) -> String {
    format!("Signboard_{}_{}.{}", stamp, request_id.simple(), extension)
}

/// Copy `source` to `dir/file_name`, refusing to replace an existing file
fn copy_retained(source: &Path, dir: &Path, file_name: &str) -> io::Result<()> {
    std::fs::create_dir_all(dir)?;
    let mut target = std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(dir.join(file_name))?;
    let mut input = std::fs::File::open(source)?;
    io::copy(&mut input, &mut target)?;
    Ok(())
}

/// Run blocking work off the async executor
async fn blocking<T, F>(work: F) -> Result<T, PipelineError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| PipelineError::Internal(format!("blocking task failed: {}", e)))
}
