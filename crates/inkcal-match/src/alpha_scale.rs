//! Least-squares alpha scale between a probe and a candidate.
//!
//! IoU ignores intensity, so two candidates with the same footprint are
//! told apart by how well a single gain `k` maps the candidate's alpha
//! onto the probe's.

use crate::binary::ensure_same_len;
use crate::types::MatchError;

/// Result of fitting `a ≈ clip(k * b, 0, 255)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlphaScale {
    /// Fitted gain, never negative.
    pub k: f64,
    /// Mean absolute residual after scaling and clipping.
    pub l1_scaled: f64,
}

/// Fit `k = Σ(a·b) / Σ(b·b)` and report the clipped mean L1 residual.
///
/// `k` falls back to `1.0` when `b` is all zero or the ratio is not
/// finite, and is clamped to zero from below. An empty pair reports
/// `k = 1.0` and a residual of `0.0`.
///
/// # Errors
///
/// Returns [`MatchError::ProfileLengthMismatch`] if the slices differ in
/// length.
#[allow(clippy::cast_precision_loss)]
pub fn estimate_alpha_scale(a: &[u8], b: &[u8]) -> Result<AlphaScale, MatchError> {
    ensure_same_len(a, b)?;

    let (num, den) = a.iter().zip(b).fold((0.0f64, 0.0f64), |(num, den), (&va, &vb)| {
        let (fa, fb) = (f64::from(va), f64::from(vb));
        (fa.mul_add(fb, num), fb.mul_add(fb, den))
    });

    let mut k = if den <= 0.0 { 1.0 } else { num / den };
    if !k.is_finite() {
        k = 1.0;
    }
    let k = k.max(0.0);

    if a.is_empty() {
        return Ok(AlphaScale { k, l1_scaled: 0.0 });
    }

    let sum: f64 = a
        .iter()
        .zip(b)
        .map(|(&va, &vb)| {
            let scaled = (k * f64::from(vb)).clamp(0.0, 255.0);
            (f64::from(va) - scaled).abs()
        })
        .sum();

    Ok(AlphaScale {
        k,
        l1_scaled: sum / a.len() as f64,
    })
}
