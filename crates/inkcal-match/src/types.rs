//! Shared types for the inkcal matching engine.

use serde::{Deserialize, Serialize};

/// Re-export `RgbaImage` so downstream crates can hand decoded images
/// to the extractor without depending on `image` directly.
pub use image::RgbaImage;

/// The only threshold level that may be auto-relaxed for sparse probes.
pub const RELAXABLE_THRESHOLD: u8 = 1;

/// Effective threshold used when [`RELAXABLE_THRESHOLD`] is relaxed.
///
/// Every alpha value satisfies `value >= 0`, so at this level every
/// pixel of both profiles is "on".
pub const RELAXED_THRESHOLD: u8 = 0;

/// Tolerance for float equality in ranking comparisons.
pub const TIE_EPSILON: f64 = 1e-12;

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// Fixed rectangular region of interest sampled from every image.
///
/// The vertical band is half-open: rows `y0..y1` are sampled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roi {
    /// Leftmost sampled column.
    pub x0: u32,
    /// Number of sampled columns.
    pub width: u32,
    /// First sampled row.
    pub y0: u32,
    /// One past the last sampled row.
    pub y1: u32,
}

impl Roi {
    /// Default ROI width in pixels.
    pub const DEFAULT_WIDTH: u32 = 18;
    /// Default first row of the vertical band.
    pub const DEFAULT_Y0: u32 = 435;
    /// Default exclusive end row of the vertical band.
    pub const DEFAULT_Y1: u32 = 1592;

    /// Number of sampled rows (zero when the band is inverted).
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.y1.saturating_sub(self.y0)
    }

    /// Total number of samples in a profile extracted with this ROI.
    #[must_use]
    pub const fn pixel_count(&self) -> usize {
        self.width as usize * self.height() as usize
    }

    /// Returns `true` if an image of the given size fully contains the ROI.
    #[must_use]
    pub const fn fits(&self, dimensions: Dimensions) -> bool {
        let x_end = self.x0 as u64 + self.width as u64;
        x_end <= dimensions.width as u64 && self.y1 <= dimensions.height
    }
}

impl Default for Roi {
    fn default() -> Self {
        Self {
            x0: 0,
            width: Self::DEFAULT_WIDTH,
            y0: Self::DEFAULT_Y0,
            y1: Self::DEFAULT_Y1,
        }
    }
}

/// Admissibility floors a candidate must clear to be selectable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GateSpec {
    /// Minimum intersection-over-union.
    pub min_iou: f64,
    /// Minimum number of pixels in the union of both masks.
    pub min_union_px: u64,
    /// Minimum on-pixel count each mask must cover, expressed in pixels
    /// and converted to a coverage fraction per profile length.
    pub min_coverage_px: f64,
}

impl GateSpec {
    /// Floors for threshold 1. A single-alpha-level binarization is noisy,
    /// so the union floor is much smaller than at higher thresholds.
    pub const TH1: Self = Self {
        min_iou: 0.10,
        min_union_px: 20,
        min_coverage_px: 20.0,
    };

    /// Floors for thresholds 2 and above.
    pub const DEFAULT: Self = Self {
        min_iou: 0.10,
        min_union_px: 200,
        min_coverage_px: 20.0,
    };

    /// Loose gate for the over/under search: only an empty union is rejected.
    pub const OVER_UNDER: Self = Self {
        min_iou: 0.0,
        min_union_px: 1,
        min_coverage_px: 0.0,
    };

    /// Coverage fraction corresponding to `min_coverage_px` for a profile
    /// of `pixel_count` samples.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn min_coverage_fraction(&self, pixel_count: usize) -> f64 {
        if pixel_count == 0 {
            return 0.0;
        }
        self.min_coverage_px / pixel_count as f64
    }

    fn is_valid(&self) -> bool {
        self.min_iou.is_finite() && self.min_coverage_px.is_finite() && self.min_coverage_px >= 0.0
    }
}

/// Configuration for a calibration run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Region sampled from every probe and candidate image.
    pub roi: Roi,

    /// Binarization levels, processed in this order for every probe.
    pub thresholds: Vec<u8>,

    /// Gate applied at [`RELAXABLE_THRESHOLD`].
    pub th1_gate: GateSpec,

    /// Gate applied at every other threshold.
    pub default_gate: GateSpec,

    /// A probe with fewer on-pixels than this at threshold 1 is matched at
    /// threshold 0 instead.
    pub relax_floor_px: u64,

    /// Gate applied by the over/under search.
    pub over_under_gate: GateSpec,

    /// Weight of one under-covered pixel relative to one over-covered pixel.
    pub under_weight: u64,

    /// Remap candidate alpha through the loaded LUT before matching.
    pub remap_candidates: bool,
}

impl MatchConfig {
    /// Default binarization levels.
    pub const DEFAULT_THRESHOLDS: [u8; 3] = [1, 2, 3];

    /// Default sparse-probe floor for threshold 1 auto-relaxation.
    pub const DEFAULT_RELAX_FLOOR_PX: u64 = 10;

    /// Default weight of an under-covered pixel in the over/under score.
    pub const DEFAULT_UNDER_WEIGHT: u64 = 1000;

    /// Gate for the given threshold level.
    #[must_use]
    pub const fn gate_for(&self, threshold: u8) -> GateSpec {
        if threshold == RELAXABLE_THRESHOLD {
            self.th1_gate
        } else {
            self.default_gate
        }
    }

    /// Check the configuration for values the engine cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::InvalidConfig`] for an empty or duplicated
    /// threshold list, an empty ROI, or a non-finite gate.
    pub fn validate(&self) -> Result<(), MatchError> {
        if self.thresholds.is_empty() {
            return Err(MatchError::InvalidConfig(
                "at least one threshold is required".to_owned(),
            ));
        }
        for (i, t) in self.thresholds.iter().enumerate() {
            if self.thresholds[..i].contains(t) {
                return Err(MatchError::InvalidConfig(format!(
                    "threshold {t} is listed more than once"
                )));
            }
        }
        if self.roi.pixel_count() == 0 {
            return Err(MatchError::InvalidConfig(format!(
                "ROI is empty: width={} rows={}..{}",
                self.roi.width, self.roi.y0, self.roi.y1
            )));
        }
        for (name, gate) in [
            ("th1_gate", &self.th1_gate),
            ("default_gate", &self.default_gate),
            ("over_under_gate", &self.over_under_gate),
        ] {
            if !gate.is_valid() {
                return Err(MatchError::InvalidConfig(format!(
                    "{name} has a non-finite or negative floor: {gate:?}"
                )));
            }
        }
        Ok(())
    }
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            roi: Roi::default(),
            thresholds: Self::DEFAULT_THRESHOLDS.to_vec(),
            th1_gate: GateSpec::TH1,
            default_gate: GateSpec::DEFAULT,
            relax_floor_px: Self::DEFAULT_RELAX_FLOOR_PX,
            over_under_gate: GateSpec::OVER_UNDER,
            under_weight: Self::DEFAULT_UNDER_WEIGHT,
            remap_candidates: false,
        }
    }
}

/// Errors raised by the matching engine.
///
/// [`MatchError::ProfileLengthMismatch`] signals a broken precondition
/// inside scoring and must abort the whole run. The remaining variants
/// describe a single bad input that callers skip and count.
#[derive(Debug, thiserror::Error)]
pub enum MatchError {
    /// Failed to decode the input image.
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// The input image bytes were empty.
    #[error("input image data is empty")]
    EmptyInput,

    /// The decoded image is not 8-bit RGBA, so no alpha byte can be located.
    #[error("unsupported pixel layout: {0}")]
    UnsupportedLayout(String),

    /// The image is smaller than the configured ROI.
    #[error("image {width}x{height} does not contain ROI x={x0}+{roi_width} rows={y0}..{y1}")]
    RoiOutOfBounds {
        /// Image width.
        width: u32,
        /// Image height.
        height: u32,
        /// ROI left column.
        x0: u32,
        /// ROI width.
        roi_width: u32,
        /// ROI first row.
        y0: u32,
        /// ROI exclusive end row.
        y1: u32,
    },

    /// A profile was built with a sample buffer of the wrong size.
    #[error("profile has {actual} samples, expected {expected}")]
    SampleCountMismatch {
        /// `width * height`.
        expected: usize,
        /// Length of the supplied buffer.
        actual: usize,
    },

    /// Probe and candidate profiles differ in length during scoring.
    #[error("profile length mismatch during scoring: probe={probe} candidate={candidate}")]
    ProfileLengthMismatch {
        /// Probe sample count.
        probe: usize,
        /// Candidate sample count.
        candidate: usize,
    },

    /// Configuration is invalid.
    #[error("invalid match configuration: {0}")]
    InvalidConfig(String),

    /// An alpha lookup table could not be built.
    #[error("invalid alpha LUT: {0}")]
    InvalidLut(String),
}

impl MatchError {
    /// Returns `true` for errors that indicate a logic bug and must stop
    /// the run instead of skipping one input.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::ProfileLengthMismatch { .. })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_roi_geometry() {
        let roi = Roi::default();
        assert_eq!(roi.height(), 1157);
        assert_eq!(roi.pixel_count(), 18 * 1157);
    }

    #[test]
    fn inverted_band_has_zero_height() {
        let roi = Roi {
            x0: 0,
            width: 4,
            y0: 10,
            y1: 5,
        };
        assert_eq!(roi.height(), 0);
        assert_eq!(roi.pixel_count(), 0);
    }

    #[test]
    fn roi_fits_checks_both_axes() {
        let roi = Roi {
            x0: 2,
            width: 3,
            y0: 1,
            y1: 4,
        };
        assert!(roi.fits(Dimensions {
            width: 5,
            height: 4
        }));
        assert!(!roi.fits(Dimensions {
            width: 4,
            height: 4
        }));
        assert!(!roi.fits(Dimensions {
            width: 5,
            height: 3
        }));
    }

    #[test]
    fn threshold_one_uses_its_own_gate() {
        let config = MatchConfig::default();
        assert_eq!(config.gate_for(1), GateSpec::TH1);
        assert_eq!(config.gate_for(2), GateSpec::DEFAULT);
        assert_eq!(config.gate_for(3), GateSpec::DEFAULT);
        assert!(config.gate_for(1).min_union_px < config.gate_for(2).min_union_px);
    }

    #[test]
    fn coverage_fraction_scales_with_length() {
        let gate = GateSpec::TH1;
        assert!((gate.min_coverage_fraction(200) - 0.1).abs() < 1e-12);
        assert!(gate.min_coverage_fraction(0).abs() < f64::EPSILON);
    }

    #[test]
    fn default_config_validates() {
        MatchConfig::default().validate().unwrap();
    }

    #[test]
    fn duplicate_thresholds_rejected() {
        let config = MatchConfig {
            thresholds: vec![1, 2, 1],
            ..MatchConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(MatchError::InvalidConfig(_))
        ));
    }

    #[test]
    fn empty_thresholds_rejected() {
        let config = MatchConfig {
            thresholds: Vec::new(),
            ..MatchConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn nan_gate_rejected() {
        let config = MatchConfig {
            default_gate: GateSpec {
                min_iou: f64::NAN,
                ..GateSpec::DEFAULT
            },
            ..MatchConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn config_json_roundtrip_keeps_defaults_for_missing_fields() {
        let config: MatchConfig = serde_json::from_str(r#"{"relax_floor_px": 4}"#).unwrap();
        assert_eq!(config.relax_floor_px, 4);
        assert_eq!(config.thresholds, vec![1, 2, 3]);
        assert_eq!(config.roi, Roi::default());
    }

    #[test]
    fn only_length_mismatch_is_fatal() {
        assert!(
            MatchError::ProfileLengthMismatch {
                probe: 1,
                candidate: 2
            }
            .is_fatal()
        );
        assert!(!MatchError::EmptyInput.is_fatal());
    }
}
