// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! PaddleOCR text recognition model
//!
//! This module provides the text recognition component of PaddleOCR.
//! It recognizes the characters of one cropped text line.

use anyhow::{Context, Result};
use ndarray::{ArrayView2, ArrayViewD, Axis, Ix2};
use ort::execution_providers::CPUExecutionProvider;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use super::preprocessing::preprocess_for_recognition;
use image::DynamicImage;

/// CTC blank token index
pub const CTC_BLANK: usize = 0;

/// Recognized text with confidence score
#[derive(Debug, Clone, PartialEq)]
pub struct RecognizedText {
    /// The recognized text content
    pub text: String,
    /// Mean probability of the emitted characters (0.0-1.0)
    pub confidence: f32,
}

impl RecognizedText {
    pub fn new(text: String, confidence: f32) -> Self {
        Self { text, confidence }
    }

    /// Check if the text is empty or whitespace only
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// PaddleOCR text recognition model (CTC)
#[derive(Clone)]
pub struct OcrRecognitionModel {
    /// ONNX Runtime session (thread-safe)
    session: Arc<Mutex<Session>>,
    /// Class labels; index 0 is the CTC blank
    dictionary: Arc<Vec<String>>,
    /// Model input name
    input_name: String,
}

impl std::fmt::Debug for OcrRecognitionModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OcrRecognitionModel")
            .field("dictionary_size", &self.dictionary.len())
            .field("input_name", &self.input_name)
            .finish_non_exhaustive()
    }
}

impl OcrRecognitionModel {
    /// Load the OCR recognition model and its character dictionary
    ///
    /// # Errors
    /// Returns error if:
    /// - Model file not found
    /// - Dictionary file not found or unreadable
    /// - ONNX Runtime initialization fails
    pub async fn new<P: AsRef<Path>, D: AsRef<Path>>(
        model_path: P,
        dict_path: D,
        intra_threads: usize,
    ) -> Result<Self> {
        let model_path = model_path.as_ref();
        let dict_path = dict_path.as_ref();

        if !model_path.exists() {
            anyhow::bail!("OCR recognition model not found: {}", model_path.display());
        }
        if !dict_path.exists() {
            anyhow::bail!("OCR character dictionary not found: {}", dict_path.display());
        }

        info!("Loading OCR recognition model from {}", model_path.display());

        let contents = tokio::fs::read_to_string(dict_path)
            .await
            .context(format!("Failed to read dictionary: {}", dict_path.display()))?;
        let dictionary = parse_dictionary(&contents);
        info!("Loaded character dictionary with {} classes", dictionary.len());

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
                "Failed to load OCR recognition model from {}",
                model_path.display()
            ))?;

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .unwrap_or_else(|| "x".to_string());

        if let Some(input) = session.inputs.first() {
            debug!("Recognition model expected input: {:?}", input.input_type);
        }

        info!("✅ OCR recognition model loaded successfully (CPU-only)");

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            dictionary: Arc::new(dictionary),
            input_name,
        })
    }

    /// Recognize the text in a single cropped line
    pub fn recognize(&self, line: &DynamicImage) -> Result<RecognizedText> {
        let input = preprocess_for_recognition(line);

        let mut session = self
            .session
            .lock()
            .map_err(|_| anyhow::anyhow!("OCR recognition session lock poisoned"))?;

        let input_value = Value::from_array(input).context("Failed to create input tensor")?;

        let outputs = session
            .run(ort::inputs![self.input_name.as_str() => input_value])
            .context("Recognition inference failed")?;

        let output_tensor = outputs[0]
            .try_extract_array::<f32>()
            .context("Failed to extract output tensor")?;
        debug!("Recognition output shape: {:?}", output_tensor.shape());

        let scores = sequence_scores(output_tensor.view())?;
        Ok(ctc_decode(scores, &self.dictionary))
    }
}

/// Build class labels from a PaddleOCR dictionary file
///
/// One label per line. Index 0 is reserved for the CTC blank and a space
/// class is appended last, matching how the models are exported.
pub fn parse_dictionary(contents: &str) -> Vec<String> {
    let mut dictionary = vec![String::new()];
    dictionary.extend(
        contents
            .lines()
            .map(|line| line.trim_end_matches('\r'))
            .filter(|line| !line.is_empty())
            .map(str::to_string),
    );
    if !dictionary.iter().skip(1).any(|label| label == " ") {
        dictionary.push(" ".to_string());
    }
    dictionary
}

/// Reduce a `[1, T, C]` output to its `[T, C]` score matrix
pub fn sequence_scores(output: ArrayViewD<'_, f32>) -> Result<ArrayView2<'_, f32>> {
    let view = match output.ndim() {
        3 if output.shape()[0] == 1 => output.index_axis_move(Axis(0), 0),
        2 => output,
        _ => anyhow::bail!("Unexpected recognition output shape: {:?}", output.shape()),
    };
    view.into_dimensionality::<Ix2>()
        .map_err(|_| anyhow::anyhow!("Recognition output is not a score matrix"))
}

/// CTC greedy (best path) decoding
///
/// Takes the best class at each timestep, collapses repeats, and drops
/// blanks. A blank between two identical classes keeps both.
pub fn ctc_decode(scores: ArrayView2<f32>, dictionary: &[String]) -> RecognizedText {
    let mut text = String::new();
    let mut emitted = 0usize;
    let mut total_confidence = 0.0f32;
    let mut prev_index = CTC_BLANK;

    for row in scores.outer_iter() {
        let (best_index, best_score) = row
            .iter()
            .copied()
            .enumerate()
            .fold((CTC_BLANK, f32::NEG_INFINITY), |best, (index, score)| {
                if score > best.1 {
                    (index, score)
                } else {
                    best
                }
            });

        if best_index != CTC_BLANK && best_index != prev_index {
            if let Some(label) = dictionary.get(best_index) {
                text.push_str(label);
                emitted += 1;
                total_confidence += best_score;
            }
        }
        prev_index = best_index;
    }

    let confidence = if emitted == 0 {
        0.0
    } else {
        (total_confidence / emitted as f32).clamp(0.0, 1.0)
    };

    RecognizedText::new(text, confidence)
}
