//! Admissibility gates and sparse-probe threshold relaxation.

use serde::{Deserialize, Serialize};

use crate::binary::BinaryStats;
use crate::profile::PixelProfile;
use crate::types::{GateSpec, RELAXABLE_THRESHOLD, RELAXED_THRESHOLD};

/// Which gate stage a candidate stopped at.
///
/// Gates are checked in declaration order; the first failing stage wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    /// IoU below the floor.
    RejectedIou,
    /// Union smaller than the floor.
    RejectedUnion,
    /// One of the masks covers too few pixels.
    RejectedCoverage,
    /// All floors cleared.
    Admitted,
}

impl GateOutcome {
    /// Returns `true` if the candidate may be selected.
    #[must_use]
    pub const fn is_admitted(self) -> bool {
        matches!(self, Self::Admitted)
    }
}

/// Cascading pass counts for one (probe, threshold) scan.
///
/// `passed_union` counts candidates that cleared both the IoU and union
/// floors; `passed_cov` counts candidates that cleared every floor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateCounters {
    /// Candidates with IoU at or above the floor.
    pub passed_iou: usize,
    /// Candidates that also cleared the union floor.
    pub passed_union: usize,
    /// Candidates that also cleared the coverage floor.
    pub passed_cov: usize,
}

impl GateCounters {
    /// Count one gate evaluation.
    pub const fn record(&mut self, outcome: GateOutcome) {
        match outcome {
            GateOutcome::RejectedIou => {}
            GateOutcome::RejectedUnion => self.passed_iou += 1,
            GateOutcome::RejectedCoverage => {
                self.passed_iou += 1;
                self.passed_union += 1;
            }
            GateOutcome::Admitted => {
                self.passed_iou += 1;
                self.passed_union += 1;
                self.passed_cov += 1;
            }
        }
    }
}

/// Check `stats` for a profile pair of `pixel_count` samples against `gate`.
#[must_use]
pub fn evaluate(gate: &GateSpec, stats: &BinaryStats, pixel_count: usize) -> GateOutcome {
    if stats.iou < gate.min_iou {
        return GateOutcome::RejectedIou;
    }
    if stats.union < gate.min_union_px {
        return GateOutcome::RejectedUnion;
    }
    let min_cov = gate.min_coverage_fraction(pixel_count);
    if stats.coverage_a < min_cov || stats.coverage_b < min_cov {
        return GateOutcome::RejectedCoverage;
    }
    GateOutcome::Admitted
}

/// Threshold actually used for `probe` at the configured `threshold`.
///
/// Only [`RELAXABLE_THRESHOLD`] relaxes: when the probe has fewer than
/// `relax_floor_px` on-pixels there it is too sparse to have a shape, and
/// [`RELAXED_THRESHOLD`] is returned instead.
#[must_use]
pub fn effective_threshold(probe: &PixelProfile, threshold: u8, relax_floor_px: u64) -> u8 {
    if threshold == RELAXABLE_THRESHOLD && probe.on_count(threshold) < relax_floor_px {
        RELAXED_THRESHOLD
    } else {
        threshold
    }
}
