//! inkcal-match: Pure footprint matching engine (sans-IO).
//!
//! Calibrates ink stroke footprints by comparing probe line images with
//! candidate dot-stamp images inside a fixed region of interest:
//! profile extraction -> binary statistics -> gating -> best/second
//! selection -> over/under diagnostics -> over/under search.
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! byte slices and decoded images and returns structured reports. Folder
//! scanning, filename parsing and output writing live in `inkcal-io`;
//! table layout lives in `inkcal-export`.

pub mod alpha_scale;
pub mod binary;
pub mod calibrate;
pub mod diagnostics;
pub mod gate;
pub mod lut;
pub mod over_under;
pub mod profile;
pub mod select;
pub mod types;

pub use alpha_scale::{AlphaScale, estimate_alpha_scale};
pub use binary::{BinaryStats, binary_stats};
pub use calibrate::{
    ProbeReport, RankedMatch, ThresholdReport, calibrate, calibrate_probe, prepare_candidates,
};
pub use diagnostics::{
    Clock, ExportCounters, LoadCounters, MatchCounters, RunDiagnostics, timed,
};
pub use gate::{GateCounters, GateOutcome};
pub use lut::{AlphaLut, LUT_SIZE, LutStats, lut_stats};
pub use over_under::{OverUnderStats, over_under_stats};
pub use profile::{CandidateSet, PixelProfile, ProfileSet, decode_rgba, extract_profile};
pub use select::{
    MatchCandidateScore, MatchResult, OverUnderMatch, OverUnderSearch, ScoredMatch, rank_order,
    search_over_under, select_best_and_second,
};
pub use types::{
    Dimensions, GateSpec, MatchConfig, MatchError, RELAXABLE_THRESHOLD, RELAXED_THRESHOLD, Roi,
    RgbaImage, TIE_EPSILON,
};

/// Decode `image_bytes` and extract its ROI profile in one step.
///
/// # Errors
///
/// Returns [`MatchError::EmptyInput`] if `image_bytes` is empty,
/// [`MatchError::ImageDecode`] if the format is unrecognized,
/// [`MatchError::UnsupportedLayout`] for anything but 8-bit RGBA, and
/// [`MatchError::RoiOutOfBounds`] if the image is smaller than the ROI.
pub fn load_profile(
    image_bytes: &[u8],
    roi: &Roi,
    source_id: impl Into<String>,
    pressure: f64,
) -> Result<PixelProfile, MatchError> {
    let image = decode_rgba(image_bytes)?;
    extract_profile(&image, roi, source_id, pressure)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::Cursor;

    use image::{ImageFormat, Rgba};

    use super::*;

    fn png(width: u32, height: u32, alpha_at: impl Fn(u32, u32) -> u8) -> Vec<u8> {
        let img = RgbaImage::from_fn(width, height, |x, y| Rgba([0, 0, 0, alpha_at(x, y)]));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    #[test]
    fn load_profile_reads_roi_alpha() {
        let roi = Roi {
            x0: 0,
            width: 4,
            y0: 2,
            y1: 5,
        };
        let bytes = png(6, 8, |x, y| u8::try_from(x + 10 * y).unwrap());
        let profile = load_profile(&bytes, &roi, "probe", 0.4).unwrap();
        assert_eq!(profile.len(), 12);
        assert_eq!(&profile.samples()[..5], &[20, 21, 22, 23, 30]);
        assert_eq!(
            profile.image_dimensions(),
            Dimensions {
                width: 6,
                height: 8
            }
        );
    }

    #[test]
    fn end_to_end_degenerate_match() {
        let roi = Roi {
            x0: 0,
            width: 10,
            y0: 0,
            y1: 10,
        };
        let stroke = |x: u32, y: u32| if x < 5 && y < 8 { 200 } else { 0 };
        let probe = load_profile(&png(10, 10, stroke), &roi, "line", 0.5).unwrap();
        let dot = load_profile(&png(10, 10, stroke), &roi, "dot", 0.5).unwrap();

        let probes = ProfileSet::new(vec![probe]);
        let candidates = ProfileSet::new(vec![dot]);
        let reports = calibrate(&probes, &candidates, &MatchConfig::default(), None).unwrap();
        let best = reports[0].threshold(1).unwrap().best.as_ref().unwrap();
        assert!((best.matched.score.iou - 1.0).abs() < 1e-12);
        assert!(best.matched.score.mismatch.abs() < 1e-12);
        assert!((best.matched.score.alpha_k - 1.0).abs() < 1e-12);
        assert!(best.matched.score.alpha_l1_scaled.abs() < 1e-12);
    }
}
