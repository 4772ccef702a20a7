//! Bounding-box correction for face detections.
//!
//! Vision providers disagree on coordinate units, emit canned placeholder
//! boxes when they fail to localize a face, and often return boxes covering
//! the whole torso. [`BoxCorrector`] turns whatever a provider returned into a
//! normalized crop region and tags each result with how it was obtained.
//!
//! ```
//! use face_crop::{BoundingBox, BoxCorrector, CoordinateSource, DetectedFace};
//!
//! let corrector = BoxCorrector::new();
//! let faces = vec![DetectedFace::new("a", BoundingBox::new(40.0, 30.0, 20.0, 25.0))];
//! let corrected = corrector.correct(&faces, None);
//! assert_eq!(corrected[0].coordinate_source, CoordinateSource::Validated);
//! ```

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

pub mod anomaly;
pub mod canonical;
pub mod corrector;
pub mod diagnostics;
mod lenient;
pub mod random;
pub mod settings;
mod stats;
pub mod types;
pub mod units;

use anomaly::PlaceholderMatch;

pub use anomaly::{
    classify, is_default, is_loose, is_loose_normalized, ProviderPlaceholder, Verdict,
};
pub use canonical::{canonicalize, MIN_HEIGHT, MIN_WIDTH};
pub use corrector::FallbackTemplate;
pub use diagnostics::{CorrectionEvent, DiagnosticsSink, NoopDiagnostics, TracingDiagnostics};
pub use random::{FixedRandom, RandomSource, SeededRandom, ThreadRandom};
pub use settings::CorrectionSettings;
pub use stats::stats;
pub use types::{
    BoundingBox, CoordinateSource, CorrectedFace, CroppingStats, DetectedFace, DetectionBatch,
    ImageInfo, RawBoundingBox,
};
pub use units::{classify_units, CoordinateUnit, UnitClassification};

#[derive(Debug, Error)]
pub enum FaceCropError {
    #[error("Invalid Batch: {0}")]
    InvalidBatch(String),
    #[error("Serialization Error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for FaceCropError {
    fn from(e: serde_json::Error) -> Self {
        FaceCropError::SerializationError(e.to_string())
    }
}

/// Unit and verdict for one face, without correcting it.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct FaceAnalysis {
    /// `None` when the box could not be read.
    pub units: Option<UnitClassification>,
    pub verdict: Verdict,
}

/// The correction engine.
///
/// Holds no per-call state, so one instance can serve any number of
/// pipelines at once.
#[derive(Clone)]
pub struct BoxCorrector {
    settings: CorrectionSettings,
    random: Arc<dyn RandomSource>,
    diagnostics: Arc<dyn DiagnosticsSink>,
}

impl Default for BoxCorrector {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for BoxCorrector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoxCorrector")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl BoxCorrector {
    /// Default settings, thread-local randomness, diagnostics to `tracing`.
    pub fn new() -> Self {
        Self::with_settings(CorrectionSettings::default())
    }

    pub fn with_settings(settings: CorrectionSettings) -> Self {
        let settings = settings.sanitized();
        Self {
            diagnostics: Arc::new(TracingDiagnostics::new(settings.debug)),
            random: Arc::new(ThreadRandom),
            settings,
        }
    }

    pub fn random_source(mut self, random: Arc<dyn RandomSource>) -> Self {
        self.random = random;
        self
    }

    pub fn diagnostics(mut self, diagnostics: Arc<dyn DiagnosticsSink>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn settings(&self) -> &CorrectionSettings {
        &self.settings
    }

    /// Corrects a batch of faces from one image.
    ///
    /// Returns one record per input face, in input order.
    #[cfg_attr(feature = "trace-spans", tracing::instrument(skip(self, faces)))]
    pub fn correct(
        &self,
        faces: &[DetectedFace],
        image: Option<ImageInfo>,
    ) -> Vec<CorrectedFace> {
        let corrected: Vec<CorrectedFace> = faces
            .iter()
            .enumerate()
            .map(|(index, face)| self.correct_face(face, index, image.as_ref()))
            .collect();
        self.diagnostics.record(&CorrectionEvent::BatchCorrected {
            stats: CroppingStats::from_batch(faces, &corrected),
        });
        corrected
    }

    /// Corrects a batch given as JSON.
    ///
    /// The batch itself must be an array; anything else is a caller error.
    /// Individual elements are read leniently and never fail.
    pub fn correct_json(
        &self,
        batch: &Value,
        image: Option<ImageInfo>,
    ) -> Result<Vec<CorrectedFace>, FaceCropError> {
        let faces = parse_batch(batch)?;
        Ok(self.correct(&faces, image))
    }

    /// Corrects a single face. `index` is its position within its batch and
    /// selects the fallback template.
    pub fn correct_face(
        &self,
        face: &DetectedFace,
        index: usize,
        image: Option<&ImageInfo>,
    ) -> CorrectedFace {
        let face_id = face.id.as_str();
        let Some(raw) = face.bounding_box.resolve() else {
            self.diagnostics.record(&CorrectionEvent::MalformedInput {
                face_id,
                original: face.bounding_box,
            });
            let bbox = canonicalize(&corrector::SAFE_DEFAULT_BOX);
            return CorrectedFace::from_detected(face, bbox, CoordinateSource::Validated);
        };

        let classification = classify_units(&raw, image);
        if classification.ambiguous {
            self.diagnostics.record(&CorrectionEvent::UnitAmbiguous {
                face_id,
                original: raw,
            });
        }
        let assessment = Assessment::of(&raw, classification.unit, image);

        let (bbox, source) = if let Some(placeholder) = assessment.placeholder {
            let (template, bbox) = corrector::intelligent_fallback(
                index,
                face.confidence,
                &self.settings,
                self.random.as_ref(),
            );
            self.diagnostics.record(&CorrectionEvent::PlaceholderDetected {
                face_id,
                placeholder,
                template,
                corrected: bbox,
            });
            (bbox, CoordinateSource::IntelligentFallback)
        } else if assessment.loose {
            let factor = corrector::tightening_factor(
                face.confidence,
                face.description.as_deref(),
                &self.settings,
            );
            let bbox = corrector::tighten(&assessment.normalized, factor);
            self.diagnostics.record(&CorrectionEvent::GeometryInvalid {
                face_id,
                original: raw,
                factor,
                corrected: bbox,
            });
            (bbox, CoordinateSource::Tightened)
        } else {
            let bbox =
                corrector::validate(&assessment.normalized, CoordinateUnit::Normalized, image);
            self.diagnostics.record(&CorrectionEvent::Validated {
                face_id,
                corrected: bbox,
            });
            (bbox, CoordinateSource::Validated)
        };

        CorrectedFace::from_detected(face, canonicalize(&bbox), source)
    }

    /// Unit classification and verdict for `face`, without correcting it.
    pub fn analyze(&self, face: &DetectedFace, image: Option<&ImageInfo>) -> FaceAnalysis {
        match face.bounding_box.resolve() {
            Some(raw) => {
                let classification = classify_units(&raw, image);
                let assessment = Assessment::of(&raw, classification.unit, image);
                FaceAnalysis {
                    units: Some(classification),
                    verdict: assessment.verdict(),
                }
            }
            None => FaceAnalysis {
                units: None,
                verdict: Verdict::Validated,
            },
        }
    }
}

/// What the anomaly checks found for one readable box.
struct Assessment {
    normalized: BoundingBox,
    placeholder: Option<PlaceholderMatch>,
    loose: bool,
}

impl Assessment {
    fn of(raw: &BoundingBox, unit: CoordinateUnit, image: Option<&ImageInfo>) -> Self {
        // The catalog is in percentage units. Pixel boxes are compared in
        // those units; percentage and normalized boxes as given.
        let candidate = match unit {
            CoordinateUnit::Pixel => units::to_percentage(raw, unit, image),
            _ => *raw,
        };
        let normalized = units::to_normalized(raw, unit, image);
        Self {
            normalized,
            placeholder: anomaly::match_placeholder(&candidate),
            loose: anomaly::is_loose_normalized(&normalized),
        }
    }

    fn verdict(&self) -> Verdict {
        if self.placeholder.is_some() {
            Verdict::Default
        } else if self.loose {
            Verdict::Loose
        } else {
            Verdict::Validated
        }
    }
}

impl DetectionBatch {
    /// Reads a detection event from JSON: either a bare array of faces or an
    /// object with `faces` and optional `image`.
    pub fn from_json(value: &Value) -> Result<Self, FaceCropError> {
        let faces = match value {
            Value::Array(_) => {
                return Ok(DetectionBatch {
                    faces: parse_batch(value)?,
                    image: None,
                })
            }
            Value::Object(map) => map.get("faces"),
            _ => None,
        };
        match faces {
            Some(Value::Array(_)) | Some(Value::Null) => {
                Ok(serde_json::from_value(value.clone())?)
            }
            Some(other) => Err(FaceCropError::InvalidBatch(format!(
                "expected `faces` to be a list, got {}",
                lenient::json_kind(other)
            ))),
            None => Err(FaceCropError::InvalidBatch(format!(
                "expected a list of faces or an object with `faces`, got {}",
                lenient::json_kind(value)
            ))),
        }
    }
}

/// Reads a JSON batch into faces. Fails only when `batch` is not an array.
pub fn parse_batch(batch: &Value) -> Result<Vec<DetectedFace>, FaceCropError> {
    match batch {
        Value::Array(items) => Ok(items.iter().map(lenient::face).collect()),
        other => Err(FaceCropError::InvalidBatch(format!(
            "expected a list of faces, got {}",
            lenient::json_kind(other)
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn non_list_batch_fails_fast() {
        let engine = BoxCorrector::new();
        let err = engine
            .correct_json(&json!({"id": "a"}), None)
            .unwrap_err();
        assert!(matches!(err, FaceCropError::InvalidBatch(_)));
        assert!(err.to_string().contains("object"));
    }

    #[test]
    fn missing_fields_get_safe_default() {
        let engine = BoxCorrector::new();
        let out = engine
            .correct_json(&json!([{"id": "a", "bounding_box": {"x": 10, "y": "?"}}]), None)
            .unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].coordinate_source, CoordinateSource::Validated);
        assert_eq!(out[0].bounding_box, corrector::SAFE_DEFAULT_BOX);
        assert_eq!(out[0].original_bounding_box.x, Some(10.0));
        assert_eq!(out[0].original_bounding_box.y, None);
    }

    #[test]
    fn batch_from_json_shapes() {
        let bare = DetectionBatch::from_json(&json!([{"id": "a"}])).unwrap();
        assert_eq!(bare.faces.len(), 1);
        assert!(bare.image.is_none());

        let envelope = DetectionBatch::from_json(&json!({
            "faces": [{"id": "a"}, {"id": "b"}],
            "image": {"width": 100, "height": 50}
        }))
        .unwrap();
        assert_eq!(envelope.faces.len(), 2);
        assert_eq!(envelope.image, Some(ImageInfo::new(100, 50)));

        assert!(DetectionBatch::from_json(&json!({"id": "a"})).is_err());
        assert!(matches!(
            DetectionBatch::from_json(&json!({"faces": 3})),
            Err(FaceCropError::InvalidBatch(_))
        ));
    }

    #[test]
    fn bad_image_info_is_a_serialization_error() {
        let err = DetectionBatch::from_json(&json!({
            "faces": [],
            "image": {"width": "wide", "height": 50}
        }))
        .unwrap_err();
        assert!(matches!(err, FaceCropError::SerializationError(_)));
    }

    #[test]
    fn analyze_reports_pixel_units() {
        let engine = BoxCorrector::new();
        let face = DetectedFace::new("p", BoundingBox::new(800.0, 200.0, 160.0, 180.0));
        let analysis = engine.analyze(&face, Some(&ImageInfo::new(1600, 900)));
        let classification = analysis.units.unwrap();
        assert_eq!(classification.unit, CoordinateUnit::Pixel);
        assert_eq!(analysis.verdict, Verdict::Validated);
    }

    #[test]
    fn analyze_spots_pixel_placeholders() {
        let engine = BoxCorrector::new();
        let face = DetectedFace::new("p", BoundingBox::new(480.0, 270.0, 960.0, 540.0));
        let analysis = engine.analyze(&face, Some(&ImageInfo::new(1920, 1080)));
        assert_eq!(analysis.verdict, Verdict::Default);
    }
}
