/// Bounding box for a detected face, with optional facial landmarks.
#[derive(Debug, Clone)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub confidence: f32,
    /// Five-point facial landmarks: [left_eye, right_eye, nose, left_mouth, right_mouth].
    pub landmarks: Option<[(f32, f32); 5]>,
}

/// Face embedding vector (512-dimensional for ArcFace).
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding {
    pub values: Vec<f32>,
    /// Model version that produced this embedding (e.g., "w600k_r50").
    pub model_version: Option<String>,
}

impl Embedding {
    pub fn new(values: Vec<f32>) -> Self {
        Self { values, model_version: None }
    }

    pub fn with_model_version(mut self, version: &str) -> Self {
        self.model_version = Some(version.to_string());
        self
    }

    /// Whether two embeddings come from the same model.
    ///
    /// An embedding with no recorded version is comparable with any model.
    pub fn same_model(&self, other: &Embedding) -> bool {
        match (&self.model_version, &other.model_version) {
            (Some(a), Some(b)) => a == b,
            _ => true,
        }
    }

    /// Euclidean distance between two embeddings.
    ///
    /// Embeddings of different dimension or from different models are never
    /// comparable and yield `f32::INFINITY`, so they can never fall under a
    /// match threshold.
    pub fn euclidean_distance(&self, other: &Embedding) -> f32 {
        if self.values.len() != other.values.len() || !self.same_model(other) {
            return f32::INFINITY;
        }
        self.values
            .iter()
            .zip(other.values.iter())
            .map(|(a, b)| (a - b).powi(2))
            .sum::<f32>()
            .sqrt()
    }
}

/// One detected face in one frame: its box and the embedding extracted from it.
#[derive(Debug, Clone)]
pub struct Observation {
    pub bbox: BoundingBox,
    pub embedding: Embedding,
}

/// Distance from `probe` to each candidate, in candidate order.
pub fn face_distance(candidates: &[&Embedding], probe: &Embedding) -> Vec<f32> {
    candidates
        .iter()
        .map(|c| c.euclidean_distance(probe))
        .collect()
}

/// A candidate selected by a [`Matcher`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchResult {
    /// Position of the winning candidate in the slice passed to the matcher.
    pub index: usize,
    pub distance: f32,
}

/// Strategy for picking which known face (if any) a probe embedding belongs to.
///
/// A candidate matches only when its distance is strictly below `threshold`.
pub trait Matcher {
    fn select(&self, probe: &Embedding, candidates: &[&Embedding], threshold: f32) -> Option<MatchResult>;
}

/// First candidate under the threshold wins, in candidate order.
pub struct FirstMatcher;

impl Matcher for FirstMatcher {
    fn select(&self, probe: &Embedding, candidates: &[&Embedding], threshold: f32) -> Option<MatchResult> {
        face_distance(candidates, probe)
            .into_iter()
            .enumerate()
            .find(|&(_, d)| d < threshold)
            .map(|(index, distance)| MatchResult { index, distance })
    }
}

/// Minimum-distance candidate wins, provided it is under the threshold.
///
/// Ties keep the earlier candidate. A NaN distance is never under the threshold.
pub struct NearestMatcher;

impl Matcher for NearestMatcher {
    fn select(&self, probe: &Embedding, candidates: &[&Embedding], threshold: f32) -> Option<MatchResult> {
        face_distance(candidates, probe)
            .into_iter()
            .enumerate()
            .filter(|&(_, d)| d < threshold)
            .fold(None, |best: Option<MatchResult>, (index, distance)| match best {
                Some(b) if b.distance <= distance => Some(b),
                _ => Some(MatchResult { index, distance }),
            })
    }
}

/// Runtime-selectable matching policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchPolicy {
    /// Scan in registry order and stop at the first entry under threshold.
    First,
    /// Pick the closest entry under threshold.
    #[default]
    Nearest,
}

impl std::str::FromStr for MatchPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "first" => Ok(Self::First),
            "nearest" => Ok(Self::Nearest),
            other => Err(format!("unknown match policy: {other} (expected \"first\" or \"nearest\")")),
        }
    }
}

impl Matcher for MatchPolicy {
    fn select(&self, probe: &Embedding, candidates: &[&Embedding], threshold: f32) -> Option<MatchResult> {
        match self {
            Self::First => FirstMatcher.select(probe, candidates, threshold),
            Self::Nearest => NearestMatcher.select(probe, candidates, threshold),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emb(values: &[f32]) -> Embedding {
        Embedding::new(values.to_vec())
    }

    #[test]
    fn test_euclidean_distance_identical() {
        let a = emb(&[0.3, 0.4, 0.5]);
        assert_eq!(a.euclidean_distance(&a), 0.0);
    }

    #[test]
    fn test_euclidean_distance_known() {
        let a = emb(&[0.0, 0.0]);
        let b = emb(&[3.0, 4.0]);
        assert!((a.euclidean_distance(&b) - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_euclidean_distance_dimension_mismatch() {
        let a = emb(&[1.0, 0.0]);
        let b = emb(&[1.0, 0.0, 0.0]);
        assert!(a.euclidean_distance(&b).is_infinite());
    }

    #[test]
    fn test_euclidean_distance_model_mismatch() {
        let a = emb(&[1.0, 0.0]).with_model_version("w600k_r50");
        let b = emb(&[1.0, 0.0]).with_model_version("glint360k_r100");
        let unversioned = emb(&[1.0, 0.0]);
        assert!(a.euclidean_distance(&b).is_infinite());
        assert_eq!(a.euclidean_distance(&unversioned), 0.0);
        assert_eq!(a.euclidean_distance(&a.clone()), 0.0);
    }

    #[test]
    fn test_face_distance_one_per_candidate() {
        let probe = emb(&[0.0, 0.0]);
        let c1 = emb(&[1.0, 0.0]);
        let c2 = emb(&[0.0, 2.0]);
        let d = face_distance(&[&c1, &c2], &probe);
        assert_eq!(d.len(), 2);
        assert!((d[0] - 1.0).abs() < 1e-6);
        assert!((d[1] - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_face_distance_empty() {
        assert!(face_distance(&[], &emb(&[1.0])).is_empty());
    }

    #[test]
    fn test_first_matcher_takes_scan_order() {
        let probe = emb(&[0.0, 0.0]);
        let far_but_first = emb(&[0.5, 0.0]);
        let closest = emb(&[0.1, 0.0]);
        let result = FirstMatcher.select(&probe, &[&far_but_first, &closest], 0.6).unwrap();
        assert_eq!(result.index, 0);
        assert!((result.distance - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_nearest_matcher_takes_minimum() {
        let probe = emb(&[0.0, 0.0]);
        let far = emb(&[0.5, 0.0]);
        let closest = emb(&[0.1, 0.0]);
        let result = NearestMatcher.select(&probe, &[&far, &closest], 0.6).unwrap();
        assert_eq!(result.index, 1);
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let probe = emb(&[0.0, 0.0]);
        let edge = emb(&[0.5, 0.0]);
        assert!(FirstMatcher.select(&probe, &[&edge], 0.5).is_none());
        assert!(NearestMatcher.select(&probe, &[&edge], 0.5).is_none());
    }

    #[test]
    fn test_nan_distance_never_matches() {
        let probe = emb(&[f32::NAN, 0.0]);
        let known = emb(&[1.0, 0.0]);
        assert!(face_distance(&[&known], &probe)[0].is_nan());
        assert!(FirstMatcher.select(&probe, &[&known], 0.6).is_none());
        assert!(NearestMatcher.select(&probe, &[&known], 0.6).is_none());
    }

    #[test]
    fn test_nan_threshold_never_matches() {
        let probe = emb(&[1.0, 0.0]);
        let known = emb(&[1.0, 0.0]);
        assert!(FirstMatcher.select(&probe, &[&known], f32::NAN).is_none());
        assert!(NearestMatcher.select(&probe, &[&known], f32::NAN).is_none());
    }

    #[test]
    fn test_nearest_matcher_skips_nan_and_keeps_valid() {
        let probe = emb(&[0.0, 0.0]);
        let broken = emb(&[f32::NAN, 0.0]);
        let near = emb(&[0.2, 0.0]);
        let result = NearestMatcher.select(&probe, &[&broken, &near], 0.6).unwrap();
        assert_eq!(result.index, 1);
    }

    #[test]
    fn test_nearest_matcher_tie_keeps_earlier() {
        let probe = emb(&[0.0, 0.0]);
        let a = emb(&[0.3, 0.0]);
        let b = emb(&[0.0, 0.3]);
        assert_eq!(NearestMatcher.select(&probe, &[&a, &b], 0.6).unwrap().index, 0);
    }

    #[test]
    fn test_matchers_no_candidates() {
        let probe = emb(&[1.0]);
        assert!(FirstMatcher.select(&probe, &[], 0.6).is_none());
        assert!(NearestMatcher.select(&probe, &[], 0.6).is_none());
    }

    #[test]
    fn test_match_policy_parse() {
        assert_eq!("first".parse::<MatchPolicy>(), Ok(MatchPolicy::First));
        assert_eq!(" Nearest ".parse::<MatchPolicy>(), Ok(MatchPolicy::Nearest));
        assert!("closest".parse::<MatchPolicy>().is_err());
        assert_eq!(MatchPolicy::default(), MatchPolicy::Nearest);
    }
}
