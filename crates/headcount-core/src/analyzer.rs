//! The face-analysis boundary: one RGB frame in, paired boxes and embeddings out.

use crate::detector::{DetectorError, FaceDetector};
use crate::recognizer::{FaceRecognizer, RecognizerError};
use crate::types::Observation;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyzerError {
    #[error("detector error: {0}")]
    Detector(#[from] DetectorError),
    #[error("recognizer error: {0}")]
    Recognizer(#[from] RecognizerError),
}

/// Anything that can localize and embed faces in a frame.
///
/// Each returned observation pairs a box with the embedding taken from it.
pub trait FaceAnalyzer {
    fn analyze(&mut self, rgb: &[u8], width: u32, height: u32) -> Result<Vec<Observation>, AnalyzerError>;
}

/// SCRFD detection followed by ArcFace embedding of every detected face.
pub struct OnnxAnalyzer {
    detector: FaceDetector,
    recognizer: FaceRecognizer,
}

impl OnnxAnalyzer {
    pub fn new(detector: FaceDetector, recognizer: FaceRecognizer) -> Self {
        Self { detector, recognizer }
    }

    /// Load both models, failing fast if either is missing.
    pub fn load(scrfd_path: &str, arcface_path: &str, confidence: f32) -> Result<Self, AnalyzerError> {
        let detector = FaceDetector::load(scrfd_path)?.with_confidence_threshold(confidence);
        let recognizer = FaceRecognizer::load(arcface_path)?;
        Ok(Self::new(detector, recognizer))
    }
}

impl FaceAnalyzer for OnnxAnalyzer {
    fn analyze(&mut self, rgb: &[u8], width: u32, height: u32) -> Result<Vec<Observation>, AnalyzerError> {
        let faces = self.detector.detect(rgb, width, height)?;
        let mut observations = Vec::with_capacity(faces.len());

        for bbox in faces {
            match self.recognizer.extract(rgb, width, height, &bbox) {
                Ok(embedding) => observations.push(Observation { bbox, embedding }),
                Err(RecognizerError::NoLandmarks) => {
                    tracing::debug!(confidence = bbox.confidence, "skipping face without landmarks");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Ok(observations)
    }
}
