//! Placeholder and looseness detection.
//!
//! Checks run in a fixed order: placeholder first, then looseness, otherwise
//! the box is accepted as-is. A genuine loose detection that happens to equal
//! a catalog entry is therefore treated as a placeholder.
//!
//! The round-number heuristic is weaker evidence than a catalog match and only
//! applies to boxes with plausible face geometry. A loose box made of round
//! numbers, such as `{10, 10, 80, 70}`, is tightened instead.

use serde::Serialize;

use crate::types::BoundingBox;

/// Fallback rectangles providers are known to emit when they report a face
/// but fail to localize it. Values are in percentage units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderPlaceholder {
    /// `{25, 25, 50, 50}`
    CenteredHalf,
    /// `{0, 0, 100, 100}`
    FullFrame,
    /// `{20, 20, 60, 60}`
    CenteredSixty,
    /// `{30, 30, 40, 40}`
    CenteredForty,
}

impl ProviderPlaceholder {
    pub const ALL: [ProviderPlaceholder; 4] = [
        ProviderPlaceholder::CenteredHalf,
        ProviderPlaceholder::FullFrame,
        ProviderPlaceholder::CenteredSixty,
        ProviderPlaceholder::CenteredForty,
    ];

    pub const fn bounding_box(&self) -> BoundingBox {
        match self {
            ProviderPlaceholder::CenteredHalf => BoundingBox::new(25.0, 25.0, 50.0, 50.0),
            ProviderPlaceholder::FullFrame => BoundingBox::new(0.0, 0.0, 100.0, 100.0),
            ProviderPlaceholder::CenteredSixty => BoundingBox::new(20.0, 20.0, 60.0, 60.0),
            ProviderPlaceholder::CenteredForty => BoundingBox::new(30.0, 30.0, 40.0, 40.0),
        }
    }
}

/// Why a box was judged to be a placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "entry")]
pub enum PlaceholderMatch {
    Catalog(ProviderPlaceholder),
    /// Every field a multiple of 5 with a large width and height, on a box
    /// that is not loose.
    RoundNumbers,
}

/// Round-number placeholders must be at least this wide and tall.
pub const ROUND_PLACEHOLDER_MIN_SIZE: f64 = 40.0;
const ROUND_STEP: f64 = 5.0;

/// Any side above this fraction of the frame is too large for a face crop.
pub const LOOSE_MAX_SIDE: f64 = 0.5;
pub const MIN_FACE_ASPECT: f64 = 0.3;
pub const MAX_FACE_ASPECT: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Default,
    Loose,
    Validated,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Default => "default",
            Verdict::Loose => "loose",
            Verdict::Validated => "validated",
        }
    }
}

pub fn match_placeholder(bbox: &BoundingBox) -> Option<PlaceholderMatch> {
    if let Some(entry) = ProviderPlaceholder::ALL
        .iter()
        .find(|p| p.bounding_box() == *bbox)
    {
        return Some(PlaceholderMatch::Catalog(*entry));
    }

    let round = bbox.fields().iter().all(|v| v % ROUND_STEP == 0.0);
    if round
        && bbox.width >= ROUND_PLACEHOLDER_MIN_SIZE
        && bbox.height >= ROUND_PLACEHOLDER_MIN_SIZE
        && !is_loose(bbox)
    {
        return Some(PlaceholderMatch::RoundNumbers);
    }
    None
}

pub fn is_default(bbox: &BoundingBox) -> bool {
    match_placeholder(bbox).is_some()
}

/// True when the box is too large or has an aspect ratio no face has.
///
/// The unit is guessed from the size alone: width and height are divided by
/// 100 when either exceeds 1. Callers that already know the unit should
/// convert and use [`is_loose_normalized`].
pub fn is_loose(bbox: &BoundingBox) -> bool {
    let (mut width, mut height) = (bbox.width, bbox.height);
    if width > 1.0 || height > 1.0 {
        width /= 100.0;
        height /= 100.0;
    }
    is_loose_normalized(&BoundingBox {
        width,
        height,
        ..*bbox
    })
}

/// Looseness of a box already in normalized units. Nothing is rescaled.
pub fn is_loose_normalized(bbox: &BoundingBox) -> bool {
    let aspect = bbox.width / bbox.height;
    bbox.width > LOOSE_MAX_SIDE
        || bbox.height > LOOSE_MAX_SIDE
        || aspect < MIN_FACE_ASPECT
        || aspect > MAX_FACE_ASPECT
}

pub fn classify(bbox: &BoundingBox) -> Verdict {
    if is_default(bbox) {
        Verdict::Default
    } else if is_loose(bbox) {
        Verdict::Loose
    } else {
        Verdict::Validated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_entries_are_defaults() {
        for entry in ProviderPlaceholder::ALL {
            assert_eq!(
                match_placeholder(&entry.bounding_box()),
                Some(PlaceholderMatch::Catalog(entry))
            );
        }
    }

    #[test]
    fn round_numbers_outside_catalog() {
        let bbox = BoundingBox::new(10.0, 15.0, 45.0, 40.0);
        assert_eq!(match_placeholder(&bbox), Some(PlaceholderMatch::RoundNumbers));
    }

    #[test]
    fn round_but_loose_is_not_default() {
        let bbox = BoundingBox::new(10.0, 10.0, 80.0, 70.0);
        assert_eq!(match_placeholder(&bbox), None);
        assert_eq!(classify(&bbox), Verdict::Loose);
    }

    #[test]
    fn round_but_small_is_not_default() {
        assert!(!is_default(&BoundingBox::new(40.0, 30.0, 20.0, 25.0)));
        assert!(!is_default(&BoundingBox::new(10.0, 10.0, 40.0, 35.0)));
    }

    #[test]
    fn fractional_values_are_never_round() {
        assert!(!is_default(&BoundingBox::new(25.5, 25.0, 50.0, 50.0)));
        assert!(!is_default(&BoundingBox::new(0.25, 0.25, 0.5, 0.5)));
    }

    #[test]
    fn looseness_by_size() {
        assert!(is_loose(&BoundingBox::new(10.0, 10.0, 80.0, 70.0)));
        assert!(is_loose(&BoundingBox::new(0.1, 0.1, 0.3, 0.6)));
        assert!(!is_loose(&BoundingBox::new(0.1, 0.1, 0.5, 0.5)));
    }

    #[test]
    fn looseness_by_aspect_ratio() {
        assert!(is_loose(&BoundingBox::new(0.1, 0.1, 0.4, 0.1)));
        assert!(is_loose(&BoundingBox::new(0.1, 0.1, 0.05, 0.4)));
        assert!(!is_loose(&BoundingBox::new(0.1, 0.1, 0.2, 0.25)));
    }

    #[test]
    fn normalized_check_does_not_guess_units() {
        // {50, 50, 0.8, 0.6} in percentage units, already converted.
        let tiny = BoundingBox::new(0.5, 0.5, 0.008, 0.006);
        assert!(!is_loose_normalized(&tiny));
        assert!(is_loose_normalized(&BoundingBox::new(0.0, 0.0, 3.0, 2.0)));
    }

    #[test]
    fn zero_height_is_loose() {
        assert!(is_loose(&BoundingBox::new(0.1, 0.1, 0.2, 0.0)));
    }

    #[test]
    fn default_takes_precedence_over_loose() {
        let full = ProviderPlaceholder::FullFrame.bounding_box();
        assert!(is_loose(&full));
        assert_eq!(classify(&full), Verdict::Default);
    }

    #[test]
    fn plain_face_is_validated() {
        assert_eq!(
            classify(&BoundingBox::new(40.0, 30.0, 20.0, 25.0)),
            Verdict::Validated
        );
    }
}
