//! Coordinate unit inference.
//!
//! A box carries no unit marker, so the unit is read off the magnitudes:
//! everything within `[-1, 1]` is normalized, anything larger up to 100 is a
//! percentage, and anything beyond 100 can only be pixels. Pixel boxes need
//! the image dimensions to be converted; without them the box is read as a
//! percentage and the result is flagged as ambiguous.

use serde::Serialize;

use crate::types::{BoundingBox, ImageInfo};

/// Largest magnitude still read as a normalized coordinate.
pub const NORMALIZED_MAX: f64 = 1.0;
/// Largest magnitude still read as a percentage coordinate.
pub const PERCENTAGE_MAX: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordinateUnit {
    Normalized,
    Percentage,
    Pixel,
}

impl CoordinateUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            CoordinateUnit::Normalized => "normalized",
            CoordinateUnit::Percentage => "percentage",
            CoordinateUnit::Pixel => "pixel",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UnitClassification {
    pub unit: CoordinateUnit,
    /// The box looked like pixels but no image dimensions were supplied, so it
    /// was read as a percentage instead.
    pub ambiguous: bool,
}

pub fn classify_units(bbox: &BoundingBox, image: Option<&ImageInfo>) -> UnitClassification {
    let magnitude = bbox.max_magnitude();
    if magnitude <= NORMALIZED_MAX {
        return UnitClassification {
            unit: CoordinateUnit::Normalized,
            ambiguous: false,
        };
    }
    if magnitude <= PERCENTAGE_MAX {
        return UnitClassification {
            unit: CoordinateUnit::Percentage,
            ambiguous: false,
        };
    }
    match image.and_then(ImageInfo::dimensions) {
        Some(_) => UnitClassification {
            unit: CoordinateUnit::Pixel,
            ambiguous: false,
        },
        None => UnitClassification {
            unit: CoordinateUnit::Percentage,
            ambiguous: true,
        },
    }
}

/// Converts `bbox` from `unit` into normalized coordinates.
///
/// Pixel boxes without usable image dimensions are returned unchanged; the
/// canonicalizer clamps whatever is left.
pub fn to_normalized(
    bbox: &BoundingBox,
    unit: CoordinateUnit,
    image: Option<&ImageInfo>,
) -> BoundingBox {
    match unit {
        CoordinateUnit::Normalized => *bbox,
        CoordinateUnit::Percentage => BoundingBox {
            x: bbox.x / PERCENTAGE_MAX,
            y: bbox.y / PERCENTAGE_MAX,
            width: bbox.width / PERCENTAGE_MAX,
            height: bbox.height / PERCENTAGE_MAX,
        },
        CoordinateUnit::Pixel => match image.and_then(ImageInfo::dimensions) {
            Some((w, h)) => BoundingBox {
                x: bbox.x / w,
                y: bbox.y / h,
                width: bbox.width / w,
                height: bbox.height / h,
            },
            None => *bbox,
        },
    }
}

/// Converts `bbox` from `unit` into percentage coordinates.
///
/// Pixel values are scaled before dividing, so a pixel box that lands on
/// whole percentages converts exactly.
pub fn to_percentage(
    bbox: &BoundingBox,
    unit: CoordinateUnit,
    image: Option<&ImageInfo>,
) -> BoundingBox {
    match unit {
        CoordinateUnit::Normalized => BoundingBox {
            x: bbox.x * PERCENTAGE_MAX,
            y: bbox.y * PERCENTAGE_MAX,
            width: bbox.width * PERCENTAGE_MAX,
            height: bbox.height * PERCENTAGE_MAX,
        },
        CoordinateUnit::Percentage => *bbox,
        CoordinateUnit::Pixel => match image.and_then(ImageInfo::dimensions) {
            Some((w, h)) => BoundingBox {
                x: bbox.x * PERCENTAGE_MAX / w,
                y: bbox.y * PERCENTAGE_MAX / h,
                width: bbox.width * PERCENTAGE_MAX / w,
                height: bbox.height * PERCENTAGE_MAX / h,
            },
            None => *bbox,
        },
    }
}
