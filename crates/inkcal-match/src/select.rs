//! Candidate selection: best/second-best by shape, and the asymmetric
//! over/under search.
//!
//! Both selectors scan the candidate set sequentially in its stored order
//! and share one ranking comparator, [`rank_order`].

use std::cmp::Ordering;

use crate::alpha_scale::{AlphaScale, estimate_alpha_scale};
use crate::binary::{BinaryStats, binary_stats};
use crate::gate::{self, GateCounters};
use crate::over_under::{OverUnderStats, over_under_stats};
use crate::profile::{CandidateSet, PixelProfile};
use crate::types::{GateSpec, MatchConfig, MatchError, TIE_EPSILON};

/// Similarity of one candidate to one probe at one threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchCandidateScore {
    /// Intersection over union of the binarized masks.
    pub iou: f64,
    /// Fraction of disagreeing pixels.
    pub mismatch: f64,
    /// Probe coverage fraction.
    pub coverage_a: f64,
    /// Candidate coverage fraction.
    pub coverage_b: f64,
    /// Union pixel count.
    pub union: u64,
    /// Intersection pixel count.
    pub inter: u64,
    /// Least-squares alpha gain mapping candidate onto probe.
    pub alpha_k: f64,
    /// Mean clipped residual after applying `alpha_k`.
    pub alpha_l1_scaled: f64,
}

impl MatchCandidateScore {
    /// Combine binary statistics and the alpha-scale fit.
    #[must_use]
    pub const fn new(stats: &BinaryStats, scale: &AlphaScale) -> Self {
        Self {
            iou: stats.iou,
            mismatch: stats.mismatch,
            coverage_a: stats.coverage_a,
            coverage_b: stats.coverage_b,
            union: stats.union,
            inter: stats.inter,
            alpha_k: scale.k,
            alpha_l1_scaled: scale.l1_scaled,
        }
    }
}

/// A candidate together with its score against the probe.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredMatch<'a> {
    /// The selected candidate, borrowed from the shared candidate set.
    pub candidate: &'a PixelProfile,
    /// Its score.
    pub score: MatchCandidateScore,
}

/// Outcome of the shape selector for one (probe, threshold) pair.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult<'a> {
    /// Configured threshold.
    pub threshold: u8,
    /// Threshold the statistics were computed at (differs from
    /// `threshold` only when a sparse probe was relaxed).
    pub effective_threshold: u8,
    /// Highest-ranked admissible candidate.
    pub best: Option<ScoredMatch<'a>>,
    /// Runner-up.
    pub second: Option<ScoredMatch<'a>>,
    /// Gate pass counts across the scan.
    pub gates: GateCounters,
}

impl MatchResult<'_> {
    /// Returns `true` if the threshold was relaxed for this probe.
    #[must_use]
    pub const fn is_relaxed(&self) -> bool {
        self.effective_threshold != self.threshold
    }
}

/// The winning candidate of the over/under search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverUnderMatch<'a> {
    /// Candidate and shape score.
    pub matched: ScoredMatch<'a>,
    /// Over/under statistics the weighted score was computed from.
    pub stats: OverUnderStats,
    /// `under_weight * under_area + over_area`.
    pub score: u64,
}

/// Outcome of the over/under search for one probe.
#[derive(Debug, Clone, PartialEq)]
pub struct OverUnderSearch<'a> {
    /// Threshold the search ran at.
    pub threshold: u8,
    /// Lowest-cost admissible candidate.
    pub best: Option<OverUnderMatch<'a>>,
    /// Candidates scanned.
    pub candidates_checked: usize,
    /// Candidates that cleared the loose gate.
    pub candidates_gated: usize,
}

/// Compare `x` and `y` treating values within [`TIE_EPSILON`] as equal.
fn cmp_eps(x: f64, y: f64) -> Ordering {
    if (x - y).abs() <= TIE_EPSILON {
        Ordering::Equal
    } else {
        x.total_cmp(&y)
    }
}

/// Ranking order of two scores: [`Ordering::Less`] means `a` ranks ahead.
///
/// Keys in priority order: higher `iou`, lower `mismatch`, lower
/// `alpha_l1_scaled`. Differences within [`TIE_EPSILON`] fall through to
/// the next key.
#[must_use]
pub fn rank_order(a: &MatchCandidateScore, b: &MatchCandidateScore) -> Ordering {
    cmp_eps(b.iou, a.iou)
        .then_with(|| cmp_eps(a.mismatch, b.mismatch))
        .then_with(|| cmp_eps(a.alpha_l1_scaled, b.alpha_l1_scaled))
}

fn ranks_ahead(a: &MatchCandidateScore, b: Option<&ScoredMatch<'_>>) -> bool {
    b.is_none_or(|b| rank_order(a, &b.score) == Ordering::Less)
}

fn score_candidate(
    probe: &[u8],
    candidate: &[u8],
    threshold: u8,
    gate: &GateSpec,
) -> Result<(BinaryStats, gate::GateOutcome), MatchError> {
    let stats = binary_stats(probe, candidate, threshold)?;
    let outcome = gate::evaluate(gate, &stats, probe.len());
    Ok((stats, outcome))
}

/// Find the best and second-best candidate for `probe` at `threshold`.
///
/// The effective threshold is resolved first (see
/// [`gate::effective_threshold`]); the gate is always the one configured
/// for `threshold`. Candidates failing the gate are never selected.
///
/// # Errors
///
/// Returns [`MatchError::ProfileLengthMismatch`] if any candidate's length
/// differs from the probe's. This aborts the scan.
pub fn select_best_and_second<'a>(
    probe: &PixelProfile,
    candidates: &'a CandidateSet,
    threshold: u8,
    config: &MatchConfig,
) -> Result<MatchResult<'a>, MatchError> {
    let effective_threshold = gate::effective_threshold(probe, threshold, config.relax_floor_px);
    let gate_spec = config.gate_for(threshold);

    let mut best: Option<ScoredMatch<'a>> = None;
    let mut second: Option<ScoredMatch<'a>> = None;
    let mut gates = GateCounters::default();

    for candidate in candidates {
        let (stats, outcome) = score_candidate(
            probe.samples(),
            candidate.samples(),
            effective_threshold,
            &gate_spec,
        )?;
        gates.record(outcome);
        if !outcome.is_admitted() {
            continue;
        }

        let scale = estimate_alpha_scale(probe.samples(), candidate.samples())?;
        let scored = ScoredMatch {
            candidate,
            score: MatchCandidateScore::new(&stats, &scale),
        };

        if ranks_ahead(&scored.score, best.as_ref()) {
            second = best.replace(scored);
        } else if ranks_ahead(&scored.score, second.as_ref()) {
            second = Some(scored);
        }
    }

    Ok(MatchResult {
        threshold,
        effective_threshold,
        best,
        second,
        gates,
    })
}

/// Find the candidate with the lowest asymmetric coverage cost.
///
/// Uses the loose `config.over_under_gate` and ranks by
/// `config.under_weight * under_area + over_area` ascending, breaking ties
/// with [`rank_order`]. The threshold is used as given and never relaxed.
///
/// # Errors
///
/// Returns [`MatchError::ProfileLengthMismatch`] if any candidate's length
/// differs from the probe's.
pub fn search_over_under<'a>(
    probe: &PixelProfile,
    candidates: &'a CandidateSet,
    threshold: u8,
    config: &MatchConfig,
) -> Result<OverUnderSearch<'a>, MatchError> {
    let mut best: Option<OverUnderMatch<'a>> = None;
    let mut candidates_checked = 0;
    let mut candidates_gated = 0;

    for candidate in candidates {
        candidates_checked += 1;
        let (stats, outcome) = score_candidate(
            probe.samples(),
            candidate.samples(),
            threshold,
            &config.over_under_gate,
        )?;
        if !outcome.is_admitted() {
            continue;
        }
        candidates_gated += 1;

        let ou = over_under_stats(probe.samples(), candidate.samples(), threshold)?;
        let score = ou.weighted_score(config.under_weight);
        let scale = estimate_alpha_scale(probe.samples(), candidate.samples())?;
        let scored = MatchCandidateScore::new(&stats, &scale);

        let better = best.as_ref().is_none_or(|b| {
            score < b.score
                || (score == b.score && rank_order(&scored, &b.matched.score) == Ordering::Less)
        });
        if better {
            best = Some(OverUnderMatch {
                matched: ScoredMatch {
                    candidate,
                    score: scored,
                },
                stats: ou,
                score,
            });
        }
    }

    Ok(OverUnderSearch {
        threshold,
        best,
        candidates_checked,
        candidates_gated,
    })
}
