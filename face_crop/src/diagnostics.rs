//! Diagnostics emitted while correcting a batch.
//!
//! The engine never logs directly; it hands every event to the
//! [`DiagnosticsSink`] it was built with.

use crate::anomaly::PlaceholderMatch;
use crate::corrector::FallbackTemplate;
use crate::types::{BoundingBox, CroppingStats, RawBoundingBox};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CorrectionEvent<'a> {
    /// Values above 100 with no image dimensions; read as percentages.
    UnitAmbiguous {
        face_id: &'a str,
        original: BoundingBox,
    },
    /// Missing or non-numeric box fields; replaced by the safe default box.
    MalformedInput {
        face_id: &'a str,
        original: RawBoundingBox,
    },
    PlaceholderDetected {
        face_id: &'a str,
        placeholder: PlaceholderMatch,
        template: FallbackTemplate,
        corrected: BoundingBox,
    },
    GeometryInvalid {
        face_id: &'a str,
        original: BoundingBox,
        factor: f64,
        corrected: BoundingBox,
    },
    Validated {
        face_id: &'a str,
        corrected: BoundingBox,
    },
    BatchCorrected {
        stats: CroppingStats,
    },
}

impl CorrectionEvent<'_> {
    pub fn kind(&self) -> &'static str {
        match self {
            CorrectionEvent::UnitAmbiguous { .. } => "unit-ambiguous",
            CorrectionEvent::MalformedInput { .. } => "malformed-input",
            CorrectionEvent::PlaceholderDetected { .. } => "placeholder-detected",
            CorrectionEvent::GeometryInvalid { .. } => "geometry-invalid",
            CorrectionEvent::Validated { .. } => "validated",
            CorrectionEvent::BatchCorrected { .. } => "batch-corrected",
        }
    }

    pub fn face_id(&self) -> Option<&str> {
        match self {
            CorrectionEvent::UnitAmbiguous { face_id, .. }
            | CorrectionEvent::MalformedInput { face_id, .. }
            | CorrectionEvent::PlaceholderDetected { face_id, .. }
            | CorrectionEvent::GeometryInvalid { face_id, .. }
            | CorrectionEvent::Validated { face_id, .. } => Some(face_id),
            CorrectionEvent::BatchCorrected { .. } => None,
        }
    }
}

pub trait DiagnosticsSink: Send + Sync {
    fn record(&self, event: &CorrectionEvent<'_>);
}

/// Drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopDiagnostics;

impl DiagnosticsSink for NoopDiagnostics {
    fn record(&self, _event: &CorrectionEvent<'_>) {}
}

/// Forwards events to `tracing`.
///
/// Batch summaries are always emitted at debug level. Per-face events are
/// only emitted when `debug` is set.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostics {
    debug: bool,
}

impl TracingDiagnostics {
    pub fn new(debug: bool) -> Self {
        Self { debug }
    }
}

impl DiagnosticsSink for TracingDiagnostics {
    fn record(&self, event: &CorrectionEvent<'_>) {
        let kind = event.kind();
        match *event {
            CorrectionEvent::BatchCorrected { stats } => {
                tracing::debug!(
                    kind,
                    total = stats.total_faces,
                    defaults_fixed = stats.defaults_fixed,
                    tightened = stats.coordinates_tightened,
                    validated = stats.coordinates_validated,
                    "Corrected face batch"
                );
            }
            _ if !self.debug => {}
            CorrectionEvent::UnitAmbiguous { face_id, original } => {
                tracing::debug!(
                    kind,
                    face_id,
                    x = original.x,
                    y = original.y,
                    width = original.width,
                    height = original.height,
                    "No image dimensions for pixel-sized box, reading as percentage"
                );
            }
            CorrectionEvent::MalformedInput { face_id, original } => {
                tracing::debug!(kind, face_id, ?original, "Unusable box, using safe default");
            }
            CorrectionEvent::PlaceholderDetected {
                face_id,
                placeholder,
                template,
                corrected,
            } => {
                tracing::debug!(
                    kind,
                    face_id,
                    ?placeholder,
                    ?template,
                    ?corrected,
                    "Replaced placeholder box with fallback estimate"
                );
            }
            CorrectionEvent::GeometryInvalid {
                face_id,
                original,
                factor,
                corrected,
            } => {
                tracing::debug!(
                    kind,
                    face_id,
                    ?original,
                    factor,
                    ?corrected,
                    "Tightened loose box"
                );
            }
            CorrectionEvent::Validated { face_id, corrected } => {
                tracing::debug!(kind, face_id, ?corrected, "Box validated");
            }
        }
    }
}
