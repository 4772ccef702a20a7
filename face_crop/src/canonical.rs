//! Final clamp into the normalized frame.

use crate::types::BoundingBox;
use crate::units::{NORMALIZED_MAX, PERCENTAGE_MAX};

/// Narrowest crop the engine will hand out, as a fraction of image width.
pub const MIN_WIDTH: f64 = 0.05;
/// Shortest crop the engine will hand out, as a fraction of image height.
pub const MIN_HEIGHT: f64 = 0.08;

/// Brings any box into normalized space and inside the frame.
///
/// Boxes with any value above 1 are read as percentages. Running it on its
/// own output changes nothing.
pub fn canonicalize(bbox: &BoundingBox) -> BoundingBox {
    let b = BoundingBox {
        x: finite_or(bbox.x, 0.0),
        y: finite_or(bbox.y, 0.0),
        width: finite_or(bbox.width, MIN_WIDTH),
        height: finite_or(bbox.height, MIN_HEIGHT),
    };
    if b.max_magnitude() > NORMALIZED_MAX {
        clamp_to_frame(&BoundingBox {
            x: b.x / PERCENTAGE_MAX,
            y: b.y / PERCENTAGE_MAX,
            width: b.width / PERCENTAGE_MAX,
            height: b.height / PERCENTAGE_MAX,
        })
    } else {
        clamp_to_frame(&b)
    }
}

/// Clamps a box already in normalized units.
///
/// Width and height are held between their minimums and the full frame, then
/// `x`/`y` are moved so the box ends at or before the frame edge. Unlike
/// [`canonicalize`] this never rescales, so a normalized box pushed past the
/// edge is moved back rather than mistaken for a percentage box.
pub fn clamp_to_frame(bbox: &BoundingBox) -> BoundingBox {
    let width = finite_or(bbox.width, MIN_WIDTH).clamp(MIN_WIDTH, 1.0);
    let height = finite_or(bbox.height, MIN_HEIGHT).clamp(MIN_HEIGHT, 1.0);
    BoundingBox {
        x: finite_or(bbox.x, 0.0).clamp(0.0, 1.0 - width),
        y: finite_or(bbox.y, 0.0).clamp(0.0, 1.0 - height),
        width,
        height,
    }
}

/// Whether `bbox` already satisfies every invariant [`canonicalize`] enforces.
pub fn is_canonical(bbox: &BoundingBox) -> bool {
    bbox.x >= 0.0
        && bbox.y >= 0.0
        && bbox.width >= MIN_WIDTH
        && bbox.height >= MIN_HEIGHT
        && bbox.x + bbox.width <= 1.0 + f64::EPSILON
        && bbox.y + bbox.height <= 1.0 + f64::EPSILON
}

fn finite_or(v: f64, fallback: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        fallback
    }
}
