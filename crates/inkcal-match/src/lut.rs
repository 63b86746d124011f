//! Alpha lookup table and LUT-remapped comparison diagnostics.

use crate::binary::ensure_same_len;
use crate::over_under::median;
use crate::types::MatchError;

/// Number of entries in an 8-bit alpha lookup table.
pub const LUT_SIZE: usize = 256;

/// A 256-entry remapping of alpha values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlphaLut([u8; LUT_SIZE]);

impl AlphaLut {
    /// Wrap a ready-made table.
    #[must_use]
    pub const fn from_table(table: [u8; LUT_SIZE]) -> Self {
        Self(table)
    }

    /// The identity mapping.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn identity() -> Self {
        Self(std::array::from_fn(|i| i as u8))
    }

    /// Build a table from exactly 256 curve samples in `[0, 1]`.
    ///
    /// Samples outside the unit range are clamped; each entry becomes
    /// `sample * 255` rounded half to even.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::InvalidLut`] if there are not exactly 256
    /// samples or a sample is not finite.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn from_unit_samples(samples: &[f64]) -> Result<Self, MatchError> {
        if samples.len() != LUT_SIZE {
            return Err(MatchError::InvalidLut(format!(
                "expected {LUT_SIZE} samples, got {}",
                samples.len()
            )));
        }
        let mut table = [0u8; LUT_SIZE];
        for (i, (slot, &v)) in table.iter_mut().zip(samples).enumerate() {
            if !v.is_finite() {
                return Err(MatchError::InvalidLut(format!(
                    "sample {i} is not finite: {v}"
                )));
            }
            *slot = (v.clamp(0.0, 1.0) * 255.0).round_ties_even() as u8;
        }
        Ok(Self(table))
    }

    /// Remap one alpha value.
    #[must_use]
    pub const fn apply(&self, value: u8) -> u8 {
        self.0[value as usize]
    }

}

/// Comparison of a probe against a LUT-remapped candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LutStats {
    /// Mean absolute difference between probe and remapped candidate.
    pub l1_mean: f64,
    /// Pixels where the remapped candidate is on and the probe is off.
    pub over_area: u64,
    /// Pixels where the probe is on and the remapped candidate is off.
    pub under_area: u64,
    /// Median over-coverage magnitude.
    pub over_median: f64,
    /// Median under-coverage magnitude.
    pub under_median: f64,
}

/// Compare `probe` with `candidate` remapped through `lut` at `threshold`.
///
/// # Errors
///
/// Returns [`MatchError::ProfileLengthMismatch`] if the slices differ in
/// length.
#[allow(clippy::cast_precision_loss)]
pub fn lut_stats(
    probe: &[u8],
    candidate: &[u8],
    threshold: u8,
    lut: &AlphaLut,
) -> Result<LutStats, MatchError> {
    ensure_same_len(probe, candidate)?;

    let mut sum_abs = 0u64;
    let mut over = Vec::new();
    let mut under = Vec::new();
    for (&p, &c) in probe.iter().zip(candidate) {
        let mapped = lut.apply(c);
        sum_abs += u64::from(p.abs_diff(mapped));
        match (p >= threshold, mapped >= threshold) {
            (false, true) => over.push(mapped - p),
            (true, false) => under.push(p - mapped),
            _ => {}
        }
    }
    over.sort_unstable();
    under.sort_unstable();

    Ok(LutStats {
        l1_mean: if probe.is_empty() {
            0.0
        } else {
            sum_abs as f64 / probe.len() as f64
        },
        over_area: over.len() as u64,
        under_area: under.len() as u64,
        over_median: median(&over),
        under_median: median(&under),
    })
}
