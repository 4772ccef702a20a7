//! Repair strategies, one per verdict.

use serde::Serialize;

use crate::canonical::{clamp_to_frame, MIN_HEIGHT, MIN_WIDTH};
use crate::random::RandomSource;
use crate::settings::CorrectionSettings;
use crate::types::{BoundingBox, ImageInfo};
use crate::units::{to_normalized, CoordinateUnit};

/// Plausible face positions used when a provider gave no usable box.
/// Boxes are normalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackTemplate {
    UpperCenter,
    Left,
    Right,
    Center,
    LeftUpper,
    RightUpper,
}

impl FallbackTemplate {
    /// Rotation order; face `i` of a batch uses `ROTATION[i % 6]`.
    pub const ROTATION: [FallbackTemplate; 6] = [
        FallbackTemplate::UpperCenter,
        FallbackTemplate::Left,
        FallbackTemplate::Right,
        FallbackTemplate::Center,
        FallbackTemplate::LeftUpper,
        FallbackTemplate::RightUpper,
    ];

    pub fn for_index(index: usize) -> Self {
        Self::ROTATION[index % Self::ROTATION.len()]
    }

    pub const fn bounding_box(&self) -> BoundingBox {
        match self {
            FallbackTemplate::UpperCenter => BoundingBox::new(0.35, 0.15, 0.30, 0.35),
            FallbackTemplate::Left => BoundingBox::new(0.10, 0.25, 0.30, 0.35),
            FallbackTemplate::Right => BoundingBox::new(0.60, 0.25, 0.30, 0.35),
            FallbackTemplate::Center => BoundingBox::new(0.35, 0.30, 0.30, 0.35),
            FallbackTemplate::LeftUpper => BoundingBox::new(0.15, 0.10, 0.30, 0.35),
            FallbackTemplate::RightUpper => BoundingBox::new(0.55, 0.10, 0.30, 0.35),
        }
    }
}

/// Fraction of size kept by a high-confidence fallback.
pub const HIGH_CONFIDENCE_FALLBACK_SCALE: f64 = 0.8;

pub const BASE_TIGHTENING: f64 = 0.7;
pub const HIGH_CONFIDENCE_TIGHTENING: f64 = 0.6;
pub const LOW_CONFIDENCE_TIGHTENING: f64 = 0.8;
pub const FRONTAL_ADJUSTMENT: f64 = 0.9;
pub const PROFILE_ADJUSTMENT: f64 = 1.1;

const FRONTAL_KEYWORDS: [&str; 2] = ["clear", "frontal"];
const PROFILE_KEYWORDS: [&str; 2] = ["profile", "side"];

/// Box handed out when the input cannot be read at all.
pub const SAFE_DEFAULT_BOX: BoundingBox = BoundingBox::new(0.35, 0.2, 0.3, 0.4);

/// Synthesizes a box for the `index`-th face of a batch.
///
/// This is an estimate, not a recovered position.
pub fn intelligent_fallback(
    index: usize,
    confidence: Option<f64>,
    settings: &CorrectionSettings,
    random: &dyn RandomSource,
) -> (FallbackTemplate, BoundingBox) {
    let template = FallbackTemplate::for_index(index);
    let base = template.bounding_box();
    let mut bbox = BoundingBox {
        x: base.x + random.offset(settings.max_jitter),
        y: base.y + random.offset(settings.max_jitter),
        ..base
    };
    if confidence.is_some_and(|c| c > settings.high_confidence_threshold) {
        bbox = bbox.scaled_about_center(HIGH_CONFIDENCE_FALLBACK_SCALE);
    }
    (template, clamp_to_frame(&bbox))
}

/// Shrink factor for a loose box given what the detector told us about it.
pub fn tightening_factor(
    confidence: Option<f64>,
    description: Option<&str>,
    settings: &CorrectionSettings,
) -> f64 {
    let mut factor = match confidence {
        Some(c) if c > settings.high_confidence_threshold => HIGH_CONFIDENCE_TIGHTENING,
        Some(c) if c < settings.low_confidence_threshold => LOW_CONFIDENCE_TIGHTENING,
        _ => BASE_TIGHTENING,
    };
    if let Some(text) = description.map(str::to_lowercase) {
        if FRONTAL_KEYWORDS.iter().any(|k| text.contains(k)) {
            factor *= FRONTAL_ADJUSTMENT;
        }
        if PROFILE_KEYWORDS.iter().any(|k| text.contains(k)) {
            factor *= PROFILE_ADJUSTMENT;
        }
    }
    factor
}

/// Shrinks a normalized box toward its own center and clamps it to the frame.
pub fn tighten(bbox: &BoundingBox, factor: f64) -> BoundingBox {
    clamp_to_frame(&bbox.scaled_about_center(factor))
}

/// Accepts the box's geometry, only converting units and clamping.
pub fn validate(
    bbox: &BoundingBox,
    unit: CoordinateUnit,
    image: Option<&ImageInfo>,
) -> BoundingBox {
    let n = to_normalized(bbox, unit, image);
    let width = n.width.max(MIN_WIDTH);
    let height = n.height.max(MIN_HEIGHT);
    clamp_to_frame(&BoundingBox {
        x: n.x.max(0.0),
        y: n.y.max(0.0),
        width,
        height,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::FixedRandom;

    fn settings() -> CorrectionSettings {
        CorrectionSettings::default()
    }

    #[test]
    fn rotation_wraps_every_six() {
        assert_eq!(FallbackTemplate::for_index(0), FallbackTemplate::UpperCenter);
        assert_eq!(FallbackTemplate::for_index(5), FallbackTemplate::RightUpper);
        assert_eq!(FallbackTemplate::for_index(6), FallbackTemplate::UpperCenter);
    }

    #[test]
    fn fallback_without_jitter_is_the_template() {
        let (template, bbox) = intelligent_fallback(3, None, &settings(), &FixedRandom(0.5));
        assert_eq!(template, FallbackTemplate::Center);
        assert_eq!(bbox, FallbackTemplate::Center.bounding_box());
    }

    #[test]
    fn fallback_jitter_is_bounded() {
        for sample in [0.0, 0.25, 0.75, 1.0] {
            let (_, bbox) = intelligent_fallback(1, None, &settings(), &FixedRandom(sample));
            let base = FallbackTemplate::Left.bounding_box();
            assert!((bbox.x - base.x).abs() <= 0.05 + 1e-12);
            assert!((bbox.y - base.y).abs() <= 0.05 + 1e-12);
            assert_eq!(bbox.width, base.width);
        }
    }

    #[test]
    fn high_confidence_fallback_shrinks_around_center() {
        let (_, bbox) = intelligent_fallback(0, Some(95.0), &settings(), &FixedRandom(0.5));
        let base = FallbackTemplate::UpperCenter.bounding_box();
        assert!((bbox.width - base.width * 0.8).abs() < 1e-12);
        assert!((bbox.height - base.height * 0.8).abs() < 1e-12);
        let (cx, cy) = bbox.center();
        let (bx, by) = base.center();
        assert!((cx - bx).abs() < 1e-12);
        assert!((cy - by).abs() < 1e-12);
    }

    #[test]
    fn factor_by_confidence() {
        let s = settings();
        assert_eq!(tightening_factor(None, None, &s), 0.7);
        assert_eq!(tightening_factor(Some(60.0), None, &s), 0.7);
        assert_eq!(tightening_factor(Some(90.0), None, &s), 0.6);
        assert_eq!(tightening_factor(Some(30.0), None, &s), 0.8);
        assert_eq!(tightening_factor(Some(80.0), None, &s), 0.7);
        assert_eq!(tightening_factor(Some(50.0), None, &s), 0.7);
    }

    #[test]
    fn factor_by_description() {
        let s = settings();
        let frontal = tightening_factor(Some(60.0), Some("Clear frontal view"), &s);
        assert!((frontal - 0.63).abs() < 1e-12);
        let profile = tightening_factor(Some(60.0), Some("left PROFILE"), &s);
        assert!((profile - 0.77).abs() < 1e-12);
    }

    #[test]
    fn tighten_keeps_center() {
        let bbox = BoundingBox::new(0.1, 0.1, 0.8, 0.7);
        let tight = tighten(&bbox, 0.7);
        assert!((tight.width - 0.56).abs() < 1e-12);
        assert!((tight.height - 0.49).abs() < 1e-12);
        let (cx, cy) = tight.center();
        assert!((cx - 0.5).abs() < 1e-12);
        assert!((cy - 0.45).abs() < 1e-12);
    }

    #[test]
    fn tighten_near_the_edge_moves_back_inside() {
        let tight = tighten(&BoundingBox::new(1.0, 1.0, 1.0, 1.0), 0.7);
        assert!((tight.width - 0.7).abs() < 1e-12);
        assert!((tight.x - 0.3).abs() < 1e-12);
        assert!((tight.y - 0.3).abs() < 1e-12);
    }

    #[test]
    fn validate_converts_and_floors() {
        let b = validate(
            &BoundingBox::new(98.0, -3.0, 1.5, 2.0),
            CoordinateUnit::Percentage,
            None,
        );
        assert_eq!(b.width, MIN_WIDTH);
        assert_eq!(b.height, MIN_HEIGHT);
        assert!((b.x - 0.95).abs() < 1e-12);
        assert_eq!(b.y, 0.0);
    }
}
