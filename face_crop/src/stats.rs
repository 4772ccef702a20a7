//! Per-batch tally of how each face was repaired.

use crate::types::{CoordinateSource, CorrectedFace, CroppingStats, DetectedFace};

impl CroppingStats {
    /// Counts the provenance tags of `after`; `before` is the batch that was
    /// fed to the engine.
    pub fn from_batch(before: &[DetectedFace], after: &[CorrectedFace]) -> Self {
        let mut stats = CroppingStats {
            total_faces: before.len(),
            ..Self::default()
        };
        for face in after {
            match face.coordinate_source {
                CoordinateSource::IntelligentFallback => stats.defaults_fixed += 1,
                CoordinateSource::Tightened => stats.coordinates_tightened += 1,
                CoordinateSource::Validated => stats.coordinates_validated += 1,
            }
        }
        stats
    }

    pub fn corrected(&self) -> usize {
        self.defaults_fixed + self.coordinates_tightened
    }
}

pub fn stats(before: &[DetectedFace], after: &[CorrectedFace]) -> CroppingStats {
    CroppingStats::from_batch(before, after)
}
