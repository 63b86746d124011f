//! Over/under-coverage classification of discordant pixels.
//!
//! At threshold `t`, a pixel is **over** when the candidate is on and the
//! probe is off (the candidate paints ink the probe lacks), and **under**
//! when the probe is on and the candidate is off (the candidate misses
//! ink). The magnitude of a discordant pixel is the alpha difference in
//! the direction of the discord.

use serde::{Deserialize, Serialize};

use crate::binary::ensure_same_len;
use crate::types::MatchError;

/// Area and magnitude distribution of both discordant classes.
///
/// Empty classes report zero for every field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OverUnderStats {
    /// Pixels where the candidate is on and the probe is off.
    pub over_area: u64,
    /// Pixels where the probe is on and the candidate is off.
    pub under_area: u64,
    /// Median over-coverage magnitude.
    pub over_median: f64,
    /// Median under-coverage magnitude.
    pub under_median: f64,
    /// 90th percentile over-coverage magnitude.
    pub over_p90: u8,
    /// 90th percentile under-coverage magnitude.
    pub under_p90: u8,
    /// Largest over-coverage magnitude.
    pub over_max: u8,
    /// Largest under-coverage magnitude.
    pub under_max: u8,
}

impl OverUnderStats {
    /// Weighted asymmetric cost: `under_weight * under_area + over_area`.
    #[must_use]
    pub const fn weighted_score(&self, under_weight: u64) -> u64 {
        under_weight
            .saturating_mul(self.under_area)
            .saturating_add(self.over_area)
    }
}

/// Classify discordant pixels of `probe` against `candidate` at `threshold`.
///
/// # Errors
///
/// Returns [`MatchError::ProfileLengthMismatch`] if the slices differ in
/// length.
pub fn over_under_stats(
    probe: &[u8],
    candidate: &[u8],
    threshold: u8,
) -> Result<OverUnderStats, MatchError> {
    ensure_same_len(probe, candidate)?;

    let mut over = Vec::new();
    let mut under = Vec::new();
    for (&p, &c) in probe.iter().zip(candidate) {
        match (p >= threshold, c >= threshold) {
            (false, true) => over.push(c.saturating_sub(p)),
            (true, false) => under.push(p.saturating_sub(c)),
            _ => {}
        }
    }
    over.sort_unstable();
    under.sort_unstable();

    Ok(OverUnderStats {
        over_area: over.len() as u64,
        under_area: under.len() as u64,
        over_median: median(&over),
        under_median: median(&under),
        over_p90: percentile(&over, 0.90),
        under_p90: percentile(&under, 0.90),
        over_max: over.last().copied().unwrap_or(0),
        under_max: under.last().copied().unwrap_or(0),
    })
}

/// Median of a sorted slice; the mean of the two middle values for even
/// lengths, `0.0` when empty.
#[must_use]
pub fn median(sorted: &[u8]) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return 0.0;
    }
    let mid = n / 2;
    if n % 2 == 1 {
        f64::from(sorted[mid])
    } else {
        0.5 * (f64::from(sorted[mid - 1]) + f64::from(sorted[mid]))
    }
}

/// Nearest-rank-below percentile of a sorted slice: the value at index
/// `floor(p * (n - 1))`, `0` when empty.
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn percentile(sorted: &[u8], p: f64) -> u8 {
    if sorted.is_empty() {
        return 0;
    }
    let last = sorted.len() - 1;
    let idx = (p.clamp(0.0, 1.0) * last as f64).floor() as usize;
    sorted[idx.min(last)]
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn classifies_over_and_under() {
        let probe = [0, 50, 10, 0, 0];
        let candidate = [30, 0, 12, 0, 7];
        let s = over_under_stats(&probe, &candidate, 1).unwrap();
        assert_eq!(s.over_area, 2); // pixels 0 and 4
        assert_eq!(s.under_area, 1); // pixel 1
        assert!((s.over_median - 18.5).abs() < 1e-12);
        assert!((s.under_median - 50.0).abs() < 1e-12);
        assert_eq!(s.over_max, 30);
        assert_eq!(s.under_max, 50);
        assert_eq!(s.over_p90, 7);
        assert_eq!(s.under_p90, 50);
    }

    #[test]
    fn empty_classes_report_zero() {
        let s = over_under_stats(&[5, 5, 0], &[9, 1, 0], 1).unwrap();
        assert_eq!(s, OverUnderStats::default());
        assert!(!s.over_median.is_nan());
    }

    #[test]
    fn threshold_shifts_classification() {
        // At threshold 3 the probe's value 2 is off, so the candidate's 9 is over.
        let s = over_under_stats(&[2], &[9], 3).unwrap();
        assert_eq!(s.over_area, 1);
        assert_eq!(s.over_max, 7);
    }

    #[test]
    fn weighted_score_prefers_less_under_coverage() {
        let x = OverUnderStats {
            over_area: 50,
            under_area: 1,
            ..OverUnderStats::default()
        };
        let y = OverUnderStats {
            over_area: 0,
            under_area: 2,
            ..OverUnderStats::default()
        };
        assert_eq!(x.weighted_score(1000), 1050);
        assert_eq!(y.weighted_score(1000), 2000);
    }

    #[test]
    fn median_and_percentile_helpers() {
        assert!(median(&[]).abs() < f64::EPSILON);
        assert!((median(&[1, 3]) - 2.0).abs() < 1e-12);
        assert!((median(&[1, 3, 9]) - 3.0).abs() < 1e-12);
        let values: Vec<u8> = (1..=10).collect();
        // floor(0.9 * 9) = 8 -> value 9
        assert_eq!(percentile(&values, 0.9), 9);
        assert_eq!(percentile(&[], 0.9), 0);
    }

    #[test]
    fn length_mismatch_is_an_error() {
        assert!(over_under_stats(&[1, 2, 3], &[1], 1).is_err());
    }
}
