//! Per-probe calibration driver.
//!
//! For every probe (ascending pressure) and every configured threshold
//! (declared order) this runs the shape selector, attaches over/under
//! diagnostics to the retained matches and, at the relaxable threshold,
//! LUT diagnostics and the over/under search.

use std::borrow::Cow;

use crate::gate::GateCounters;
use crate::lut::{AlphaLut, LutStats, lut_stats};
use crate::over_under::{OverUnderStats, over_under_stats};
use crate::profile::{CandidateSet, PixelProfile, ProfileSet};
use crate::select::{OverUnderSearch, ScoredMatch, search_over_under, select_best_and_second};
use crate::types::{MatchConfig, MatchError, RELAXABLE_THRESHOLD};

/// A retained match with its diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedMatch<'a> {
    /// Candidate and shape score.
    pub matched: ScoredMatch<'a>,
    /// Over/under statistics at the effective threshold.
    pub over_under: OverUnderStats,
    /// LUT diagnostics; only present at the relaxable threshold when a
    /// LUT is loaded.
    pub lut: Option<LutStats>,
}

/// Selector outcome and diagnostics for one (probe, threshold) pair.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdReport<'a> {
    /// Configured threshold.
    pub threshold: u8,
    /// Threshold actually used.
    pub effective_threshold: u8,
    /// Best match.
    pub best: Option<RankedMatch<'a>>,
    /// Runner-up.
    pub second: Option<RankedMatch<'a>>,
    /// Gate pass counts.
    pub gates: GateCounters,
}

impl ThresholdReport<'_> {
    /// Returns `true` if no candidate survived the gates.
    #[must_use]
    pub const fn is_rejected(&self) -> bool {
        self.best.is_none()
    }

    /// Returns `true` if the threshold was relaxed for this probe.
    #[must_use]
    pub const fn is_relaxed(&self) -> bool {
        self.effective_threshold != self.threshold
    }
}

/// Everything computed for one probe.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeReport<'a> {
    /// The probe.
    pub probe: &'a PixelProfile,
    /// One entry per configured threshold, in declared order.
    pub thresholds: Vec<ThresholdReport<'a>>,
    /// Over/under search at the relaxable threshold; `None` when that
    /// threshold is not configured.
    pub over_under: Option<OverUnderSearch<'a>>,
}

impl<'a> ProbeReport<'a> {
    /// Report for the configured `threshold`, if it was evaluated.
    #[must_use]
    pub fn threshold(&self, threshold: u8) -> Option<&ThresholdReport<'a>> {
        self.thresholds.iter().find(|t| t.threshold == threshold)
    }

    /// Effective threshold used at the relaxable threshold, if configured.
    #[must_use]
    pub fn relaxable_effective_threshold(&self) -> Option<u8> {
        self.threshold(RELAXABLE_THRESHOLD)
            .map(|t| t.effective_threshold)
    }
}

/// The candidate set matching should run against.
///
/// When `config.remap_candidates` is set and a LUT is loaded, every
/// candidate profile is remapped through it; otherwise the set is borrowed
/// unchanged.
#[must_use]
pub fn prepare_candidates<'a>(
    candidates: &'a CandidateSet,
    config: &MatchConfig,
    lut: Option<&AlphaLut>,
) -> Cow<'a, CandidateSet> {
    match lut {
        Some(lut) if config.remap_candidates => Cow::Owned(candidates.remapped(lut)),
        _ => Cow::Borrowed(candidates),
    }
}

fn rank<'a>(
    probe: &PixelProfile,
    matched: Option<ScoredMatch<'a>>,
    threshold: u8,
    lut: Option<&AlphaLut>,
) -> Result<Option<RankedMatch<'a>>, MatchError> {
    let Some(matched) = matched else {
        return Ok(None);
    };
    let candidate = matched.candidate.samples();
    let over_under = over_under_stats(probe.samples(), candidate, threshold)?;
    let lut = lut
        .map(|lut| lut_stats(probe.samples(), candidate, threshold, lut))
        .transpose()?;
    Ok(Some(RankedMatch {
        matched,
        over_under,
        lut,
    }))
}

/// Calibrate a single probe against the candidate set.
///
/// # Errors
///
/// Returns [`MatchError::ProfileLengthMismatch`] if any candidate's length
/// differs from the probe's.
pub fn calibrate_probe<'a>(
    probe: &'a PixelProfile,
    candidates: &'a CandidateSet,
    config: &MatchConfig,
    lut: Option<&AlphaLut>,
) -> Result<ProbeReport<'a>, MatchError> {
    let mut thresholds = Vec::with_capacity(config.thresholds.len());
    for &threshold in &config.thresholds {
        let result = select_best_and_second(probe, candidates, threshold, config)?;
        let effective = result.effective_threshold;
        let threshold_lut = lut.filter(|_| threshold == RELAXABLE_THRESHOLD);

        let report = ThresholdReport {
            threshold,
            effective_threshold: effective,
            best: rank(probe, result.best, effective, threshold_lut)?,
            second: rank(probe, result.second, effective, threshold_lut)?,
            gates: result.gates,
        };
        if report.is_relaxed() {
            log::debug!(
                "{}: threshold {threshold} relaxed to {effective}",
                probe.source_id()
            );
        }
        if report.is_rejected() {
            log::debug!(
                "{}: no candidate admitted at threshold {threshold}",
                probe.source_id()
            );
        }
        thresholds.push(report);
    }

    let over_under = if config.thresholds.contains(&RELAXABLE_THRESHOLD) {
        Some(search_over_under(
            probe,
            candidates,
            RELAXABLE_THRESHOLD,
            config,
        )?)
    } else {
        None
    };

    log::debug!(
        "{} (P={}): best th1 = {}, over/under = {}",
        probe.source_id(),
        probe.pressure(),
        thresholds
            .iter()
            .find(|t| t.threshold == RELAXABLE_THRESHOLD)
            .and_then(|t| t.best.as_ref())
            .map_or("-", |b| b.matched.candidate.source_id()),
        over_under
            .as_ref()
            .and_then(|s| s.best.as_ref())
            .map_or("-", |b| b.matched.candidate.source_id()),
    );

    Ok(ProbeReport {
        probe,
        thresholds,
        over_under,
    })
}

/// Calibrate every probe, in ascending pressure order.
///
/// An empty probe or candidate set yields no reports; it is not an error.
///
/// # Errors
///
/// Returns [`MatchError::ProfileLengthMismatch`] on the first probe whose
/// length differs from any candidate's. No partial result is returned.
pub fn calibrate<'a>(
    probes: &'a ProfileSet,
    candidates: &'a CandidateSet,
    config: &MatchConfig,
    lut: Option<&AlphaLut>,
) -> Result<Vec<ProbeReport<'a>>, MatchError> {
    if probes.is_empty() || candidates.is_empty() {
        log::warn!(
            "nothing to match: {} probes, {} candidates",
            probes.len(),
            candidates.len()
        );
        return Ok(Vec::new());
    }
    log::info!(
        "matching {} probes against {} candidates at thresholds {:?}",
        probes.len(),
        candidates.len(),
        config.thresholds
    );
    probes
        .iter()
        .map(|probe| calibrate_probe(probe, candidates, config, lut))
        .collect()
}
