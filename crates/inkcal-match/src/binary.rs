//! Binary mask statistics between two profiles at a threshold.
//!
//! Each sample is binarized as `on = value >= threshold`. Two empty masks
//! (empty union) are defined as a perfect match with IoU 1.0.

use crate::types::MatchError;

/// Overlap statistics of two binarized profiles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinaryStats {
    /// Pixels on in both masks.
    pub inter: u64,
    /// Pixels on in either mask.
    pub union: u64,
    /// Pixels on in the first mask.
    pub a_on: u64,
    /// Pixels on in the second mask.
    pub b_on: u64,
    /// Fraction of pixels where the masks disagree.
    pub mismatch: f64,
    /// Intersection over union, `1.0` when the union is empty.
    pub iou: f64,
    /// Fraction of pixels on in the first mask.
    pub coverage_a: f64,
    /// Fraction of pixels on in the second mask.
    pub coverage_b: f64,
}

/// Fail with [`MatchError::ProfileLengthMismatch`] unless `a` and `b` have
/// the same length.
pub(crate) const fn ensure_same_len(a: &[u8], b: &[u8]) -> Result<(), MatchError> {
    if a.len() == b.len() {
        Ok(())
    } else {
        Err(MatchError::ProfileLengthMismatch {
            probe: a.len(),
            candidate: b.len(),
        })
    }
}

/// Compute [`BinaryStats`] for `a` and `b` at `threshold`.
///
/// # Errors
///
/// Returns [`MatchError::ProfileLengthMismatch`] if the slices differ in
/// length. Callers must treat this as fatal.
#[allow(clippy::cast_precision_loss)]
pub fn binary_stats(a: &[u8], b: &[u8], threshold: u8) -> Result<BinaryStats, MatchError> {
    ensure_same_len(a, b)?;

    let mut inter = 0u64;
    let mut union = 0u64;
    let mut a_on = 0u64;
    let mut b_on = 0u64;
    let mut mismatched = 0u64;
    for (&va, &vb) in a.iter().zip(b) {
        let on_a = va >= threshold;
        let on_b = vb >= threshold;
        a_on += u64::from(on_a);
        b_on += u64::from(on_b);
        inter += u64::from(on_a && on_b);
        union += u64::from(on_a || on_b);
        mismatched += u64::from(on_a != on_b);
    }

    let n = a.len() as f64;
    let ratio = |count: u64| if a.is_empty() { 0.0 } else { count as f64 / n };

    Ok(BinaryStats {
        inter,
        union,
        a_on,
        b_on,
        mismatch: ratio(mismatched),
        iou: if union == 0 {
            1.0
        } else {
            inter as f64 / union as f64
        },
        coverage_a: ratio(a_on),
        coverage_b: ratio(b_on),
    })
}
