//! headcount-core — face analysis and presence tracking.
//!
//! SCRFD detection and ArcFace embedding run on ONNX Runtime; the presence
//! registry deduplicates faces across frames and yields the live count.

pub mod alignment;
pub mod analyzer;
pub mod detector;
pub mod recognizer;
pub mod registry;
pub mod types;

pub use analyzer::{AnalyzerError, FaceAnalyzer, OnnxAnalyzer};
pub use registry::{FrameUpdate, PresenceRegistry, RegistryEntry};
pub use types::{face_distance, BoundingBox, Embedding, MatchPolicy, MatchResult, Matcher, Observation};

use std::path::PathBuf;

/// SCRFD model file name inside the model directory.
pub const SCRFD_MODEL_FILE: &str = "det_10g.onnx";
/// ArcFace model file name inside the model directory.
pub const ARCFACE_MODEL_FILE: &str = "w600k_r50.onnx";

/// Default model directory: `$XDG_DATA_HOME/headcount/models`, falling back
/// to `~/.local/share/headcount/models`.
pub fn default_model_dir() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".local/share")
        })
        .join("headcount")
        .join("models")
}
