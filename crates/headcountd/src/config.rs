use headcount_core::MatchPolicy;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_ENDPOINT: &str = "https://api.rutasegura.xyz/pasajeros";
const DEFAULT_FONT: &str = "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf";

/// Daemon configuration, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// V4L2 device path (default: /dev/video0).
    pub camera_device: String,
    pub frame_width: u32,
    pub frame_height: u32,
    /// Directory containing ONNX model files.
    pub model_dir: PathBuf,
    /// Euclidean distance below which two embeddings are the same person.
    ///
    /// ArcFace embeddings are unit length, so 1.1 corresponds to a cosine
    /// similarity of roughly 0.4.
    pub match_threshold: f32,
    pub match_policy: MatchPolicy,
    /// A face not re-observed for this long is considered gone.
    pub expiry: Duration,
    /// Minimum SCRFD score for a detection.
    pub detection_confidence: f32,
    /// Report endpoint; `None` disables reporting.
    pub endpoint: Option<String>,
    pub report_interval_secs: u64,
    pub report_timeout: Duration,
    /// Show the preview window; otherwise run headless.
    pub display: bool,
    /// TTF font used for the count label.
    pub overlay_font: PathBuf,
}

impl Config {
    /// Load configuration from `HEADCOUNT_*` environment variables with defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Self {
        let float = |key: &str, default: f32, valid: fn(f32) -> bool| -> f32 {
            match var(key).map(|v| v.trim().parse::<f32>()) {
                Some(Ok(v)) if valid(v) => v,
                Some(_) => {
                    tracing::warn!(key, default, "invalid value, using default");
                    default
                }
                None => default,
            }
        };
        let uint = |key: &str, default: u64| -> u64 {
            var(key).and_then(|v| v.trim().parse().ok()).unwrap_or(default)
        };
        let dim = |key: &str, default: u32| -> u32 {
            match var(key).map(|v| v.trim().parse::<u32>()) {
                Some(Ok(v)) if v > 0 => v,
                Some(_) => {
                    tracing::warn!(key, default, "invalid frame size, using default");
                    default
                }
                None => default,
            }
        };

        let match_policy = match var("HEADCOUNT_MATCH_POLICY") {
            Some(raw) => raw.parse().unwrap_or_else(|e| {
                tracing::warn!(error = %e, "invalid HEADCOUNT_MATCH_POLICY, using default");
                MatchPolicy::default()
            }),
            None => MatchPolicy::default(),
        };

        let endpoint = var("HEADCOUNT_ENDPOINT")
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string())
            .trim()
            .to_string();

        Self {
            camera_device: var("HEADCOUNT_CAMERA_DEVICE").unwrap_or_else(|| "/dev/video0".to_string()),
            frame_width: dim("HEADCOUNT_FRAME_WIDTH", 640),
            frame_height: dim("HEADCOUNT_FRAME_HEIGHT", 480),
            model_dir: var("HEADCOUNT_MODEL_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(headcount_core::default_model_dir),
            match_threshold: float("HEADCOUNT_MATCH_THRESHOLD", 1.1, |v: f32| v.is_finite() && v > 0.0),
            match_policy,
            expiry: Duration::from_secs(uint("HEADCOUNT_EXPIRY_SECS", 10)),
            detection_confidence: float("HEADCOUNT_DETECTION_CONFIDENCE", 0.5, |v: f32| v > 0.0 && v <= 1.0),
            endpoint: (!endpoint.is_empty()).then_some(endpoint),
            report_interval_secs: uint("HEADCOUNT_REPORT_INTERVAL_SECS", 10).max(1),
            report_timeout: Duration::from_secs(uint("HEADCOUNT_REPORT_TIMEOUT_SECS", 5).max(1)),
            display: var("HEADCOUNT_DISPLAY").map(|v| v.trim() != "0").unwrap_or(true),
            overlay_font: var("HEADCOUNT_OVERLAY_FONT")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_FONT)),
        }
    }

    /// Path to the SCRFD detection model.
    pub fn scrfd_model_path(&self) -> String {
        self.model_dir
            .join(headcount_core::SCRFD_MODEL_FILE)
            .to_string_lossy()
            .into_owned()
    }

    /// Path to the ArcFace recognition model.
    pub fn arcface_model_path(&self) -> String {
        self.model_dir
            .join(headcount_core::ARCFACE_MODEL_FILE)
            .to_string_lossy()
            .into_owned()
    }
}
