//! Records flowing in and out of the correction engine.

use serde::{Deserialize, Serialize};

use crate::lenient;

/// Rectangle anchored at its top-left corner.
///
/// The unit system is not self-describing: the same values may be percentage
/// (0–100), normalized (0–1) or pixel coordinates depending on where the box
/// came from. Boxes returned by the engine are always normalized.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Scale width and height by `factor`, keeping the center fixed.
    pub fn scaled_about_center(&self, factor: f64) -> Self {
        let (cx, cy) = self.center();
        let width = self.width * factor;
        let height = self.height * factor;
        Self {
            x: cx - width / 2.0,
            y: cy - height / 2.0,
            width,
            height,
        }
    }

    pub(crate) fn max_magnitude(&self) -> f64 {
        self.x
            .abs()
            .max(self.y.abs())
            .max(self.width.abs())
            .max(self.height.abs())
    }

    pub(crate) fn fields(&self) -> [f64; 4] {
        [self.x, self.y, self.width, self.height]
    }
}

/// Box exactly as a provider reported it.
///
/// Every field is optional: providers omit fields, send strings, or send
/// `NaN`. Anything that is not a finite number deserializes to `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RawBoundingBox {
    #[serde(default, deserialize_with = "lenient::number")]
    pub x: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub y: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub width: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub height: Option<f64>,
}

impl RawBoundingBox {
    /// Returns the numeric box when all four fields are present and finite.
    pub fn resolve(&self) -> Option<BoundingBox> {
        let finite = |v: Option<f64>| v.filter(|n| n.is_finite());
        Some(BoundingBox {
            x: finite(self.x)?,
            y: finite(self.y)?,
            width: finite(self.width)?,
            height: finite(self.height)?,
        })
    }
}

impl From<BoundingBox> for RawBoundingBox {
    fn from(b: BoundingBox) -> Self {
        Self {
            x: Some(b.x),
            y: Some(b.y),
            width: Some(b.width),
            height: Some(b.height),
        }
    }
}

/// Pixel dimensions of the image a batch was detected in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
}

impl ImageInfo {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Dimensions usable for pixel conversion, `None` if either side is zero.
    pub fn dimensions(&self) -> Option<(f64, f64)> {
        if self.width == 0 || self.height == 0 {
            None
        } else {
            Some((self.width as f64, self.height as f64))
        }
    }
}

/// A face as reported by an upstream detector.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectedFace {
    #[serde(default, deserialize_with = "lenient::string")]
    pub id: String,
    #[serde(
        default,
        alias = "boundingBox",
        deserialize_with = "lenient::bounding_box"
    )]
    pub bounding_box: RawBoundingBox,
    /// Detection confidence on a 0–100 scale.
    #[serde(default, deserialize_with = "lenient::number")]
    pub confidence: Option<f64>,
    #[serde(default, deserialize_with = "lenient::optional_string")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_string")]
    pub quality: Option<String>,
}

impl DetectedFace {
    pub fn new(id: impl Into<String>, bounding_box: BoundingBox) -> Self {
        Self {
            id: id.into(),
            bounding_box: bounding_box.into(),
            ..Self::default()
        }
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Which repair path produced a corrected box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordinateSource {
    /// Synthetic estimate; the provider gave no usable position.
    IntelligentFallback,
    Tightened,
    Validated,
}

impl CoordinateSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            CoordinateSource::IntelligentFallback => "intelligent_fallback",
            CoordinateSource::Tightened => "tightened",
            CoordinateSource::Validated => "validated",
        }
    }
}

impl std::fmt::Display for CoordinateSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output record: the input face plus its canonical box and provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectedFace {
    pub id: String,
    pub bounding_box: BoundingBox,
    pub confidence: Option<f64>,
    pub description: Option<String>,
    pub quality: Option<String>,
    pub coordinate_source: CoordinateSource,
    pub original_bounding_box: RawBoundingBox,
}

impl CorrectedFace {
    pub(crate) fn from_detected(
        face: &DetectedFace,
        bounding_box: BoundingBox,
        coordinate_source: CoordinateSource,
    ) -> Self {
        Self {
            id: face.id.clone(),
            bounding_box,
            confidence: face.confidence,
            description: face.description.clone(),
            quality: face.quality.clone(),
            coordinate_source,
            original_bounding_box: face.bounding_box,
        }
    }
}

/// One detection event: the faces found in a single image.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetectionBatch {
    #[serde(default, deserialize_with = "lenient::faces")]
    pub faces: Vec<DetectedFace>,
    #[serde(default, alias = "imageInfo")]
    pub image: Option<ImageInfo>,
}

/// Per-batch tally of repair categories.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CroppingStats {
    pub total_faces: usize,
    pub defaults_fixed: usize,
    pub coordinates_tightened: usize,
    pub coordinates_validated: usize,
}
