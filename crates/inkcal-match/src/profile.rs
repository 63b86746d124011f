//! Pixel profiles: fixed-ROI alpha samples extracted from decoded images.
//!
//! A [`PixelProfile`] is created once at load time and never mutated.
//! Profiles are grouped into a [`ProfileSet`] sorted by ascending
//! pressure, which every comparison borrows read-only.

use image::{DynamicImage, RgbaImage};

use crate::lut::AlphaLut;
use crate::types::{Dimensions, MatchError, Roi};

/// Alpha samples of one image's ROI, tagged with the simulated pressure
/// the image was rendered at.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelProfile {
    source_id: String,
    pressure: f64,
    samples: Vec<u8>,
    width: u32,
    height: u32,
    image_dimensions: Dimensions,
}

impl PixelProfile {
    /// Build a profile from row-major alpha samples.
    ///
    /// The source image dimensions default to the profile dimensions; use
    /// [`with_image_dimensions`](Self::with_image_dimensions) to record the
    /// size of the image the ROI was cut from.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::SampleCountMismatch`] if `samples.len()` is not
    /// `width * height`.
    pub fn new(
        source_id: impl Into<String>,
        pressure: f64,
        width: u32,
        height: u32,
        samples: Vec<u8>,
    ) -> Result<Self, MatchError> {
        let expected = width as usize * height as usize;
        if samples.len() != expected {
            return Err(MatchError::SampleCountMismatch {
                expected,
                actual: samples.len(),
            });
        }
        Ok(Self {
            source_id: source_id.into(),
            pressure,
            samples,
            width,
            height,
            image_dimensions: Dimensions { width, height },
        })
    }

    /// Record the dimensions of the full source image.
    #[must_use]
    pub const fn with_image_dimensions(mut self, dimensions: Dimensions) -> Self {
        self.image_dimensions = dimensions;
        self
    }

    /// Identifier of the source (typically the file name).
    #[must_use]
    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    /// Simulated stylus pressure the source was rendered at.
    #[must_use]
    pub const fn pressure(&self) -> f64 {
        self.pressure
    }

    /// Row-major alpha samples.
    #[must_use]
    pub fn samples(&self) -> &[u8] {
        &self.samples
    }

    /// ROI width in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// ROI height in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Dimensions of the image the profile was extracted from.
    #[must_use]
    pub const fn image_dimensions(&self) -> Dimensions {
        self.image_dimensions
    }

    /// Number of samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Returns `true` if the profile holds no samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Number of samples at or above `threshold`.
    #[must_use]
    pub fn on_count(&self, threshold: u8) -> u64 {
        self.samples.iter().filter(|&&v| v >= threshold).count() as u64
    }

    /// A copy of this profile with every sample passed through `lut`.
    #[must_use]
    pub fn remapped(&self, lut: &AlphaLut) -> Self {
        Self {
            samples: self.samples.iter().map(|&v| lut.apply(v)).collect(),
            ..self.clone()
        }
    }
}

/// Profiles sorted by ascending pressure.
///
/// Sorting is stable, so profiles with equal pressure keep the order they
/// were supplied in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileSet {
    profiles: Vec<PixelProfile>,
}

/// The reference table of dot-stamp profiles every probe is compared to.
pub type CandidateSet = ProfileSet;

impl ProfileSet {
    /// Sort `profiles` by pressure and wrap them.
    #[must_use]
    pub fn new(mut profiles: Vec<PixelProfile>) -> Self {
        profiles.sort_by(|a, b| a.pressure.total_cmp(&b.pressure));
        Self { profiles }
    }

    /// Number of profiles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    /// Returns `true` if the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Profiles in ascending pressure order.
    #[must_use]
    pub fn as_slice(&self) -> &[PixelProfile] {
        &self.profiles
    }

    /// Iterate in ascending pressure order.
    pub fn iter(&self) -> std::slice::Iter<'_, PixelProfile> {
        self.profiles.iter()
    }

    /// A new set with every profile remapped through `lut`.
    #[must_use]
    pub fn remapped(&self, lut: &AlphaLut) -> Self {
        Self {
            profiles: self.profiles.iter().map(|p| p.remapped(lut)).collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ProfileSet {
    type Item = &'a PixelProfile;
    type IntoIter = std::slice::Iter<'a, PixelProfile>;

    fn into_iter(self) -> Self::IntoIter {
        self.profiles.iter()
    }
}

/// Decode raw image bytes into an 8-bit RGBA buffer.
///
/// Only images whose native layout is 8-bit RGBA are accepted: the alpha
/// byte must sit at a known offset in a 32-bit pixel. Other layouts are
/// rejected rather than converted so that synthesized opaque alpha never
/// enters a comparison.
///
/// # Errors
///
/// Returns [`MatchError::EmptyInput`] if `bytes` is empty,
/// [`MatchError::ImageDecode`] if decoding fails, and
/// [`MatchError::UnsupportedLayout`] for any non-RGBA8 layout.
pub fn decode_rgba(bytes: &[u8]) -> Result<RgbaImage, MatchError> {
    if bytes.is_empty() {
        return Err(MatchError::EmptyInput);
    }

    match image::load_from_memory(bytes)? {
        DynamicImage::ImageRgba8(img) => Ok(img),
        other => Err(MatchError::UnsupportedLayout(format!(
            "{:?} ({} bits per pixel)",
            other.color(),
            other.color().bits_per_pixel()
        ))),
    }
}

/// Extract the alpha channel of `roi` from `image` as a profile.
///
/// # Errors
///
/// Returns [`MatchError::RoiOutOfBounds`] if the image does not fully
/// contain the ROI.
pub fn extract_profile(
    image: &RgbaImage,
    roi: &Roi,
    source_id: impl Into<String>,
    pressure: f64,
) -> Result<PixelProfile, MatchError> {
    let dimensions = Dimensions {
        width: image.width(),
        height: image.height(),
    };
    if roi.pixel_count() == 0 || !roi.fits(dimensions) {
        return Err(MatchError::RoiOutOfBounds {
            width: dimensions.width,
            height: dimensions.height,
            x0: roi.x0,
            roi_width: roi.width,
            y0: roi.y0,
            y1: roi.y1,
        });
    }

    let mut samples = Vec::with_capacity(roi.pixel_count());
    for y in roi.y0..roi.y1 {
        for x in roi.x0..roi.x0 + roi.width {
            samples.push(image.get_pixel(x, y).0[3]);
        }
    }

    Ok(
        PixelProfile::new(source_id, pressure, roi.width, roi.height(), samples)?
            .with_image_dimensions(dimensions),
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn encode_png(img: &DynamicImage) -> Vec<u8> {
        let mut buf = std::io::Cursor::new(Vec::new());
        img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    fn profile(pressure: f64, samples: Vec<u8>) -> PixelProfile {
        let n = u32::try_from(samples.len()).unwrap();
        PixelProfile::new(format!("p{pressure}"), pressure, n, 1, samples).unwrap()
    }

    #[test]
    fn new_rejects_wrong_sample_count() {
        let result = PixelProfile::new("x", 0.5, 3, 2, vec![0; 5]);
        assert!(matches!(
            result,
            Err(MatchError::SampleCountMismatch {
                expected: 6,
                actual: 5
            })
        ));
    }

    #[test]
    fn on_count_uses_inclusive_threshold() {
        let p = profile(0.1, vec![0, 1, 2, 3, 255]);
        assert_eq!(p.on_count(0), 5);
        assert_eq!(p.on_count(1), 4);
        assert_eq!(p.on_count(3), 2);
    }

    #[test]
    fn set_sorts_by_pressure_and_keeps_ties_stable() {
        let set = ProfileSet::new(vec![
            PixelProfile::new("b", 0.5, 1, 1, vec![1]).unwrap(),
            PixelProfile::new("a", 0.2, 1, 1, vec![1]).unwrap(),
            PixelProfile::new("c", 0.5, 1, 1, vec![1]).unwrap(),
        ]);
        let ids: Vec<&str> = set.iter().map(PixelProfile::source_id).collect();
        assert_eq!(ids, ["a", "b", "c"]);
    }

    #[test]
    fn extract_reads_alpha_row_major() {
        let img = RgbaImage::from_fn(4, 5, |x, y| {
            image::Rgba([9, 9, 9, u8::try_from(y * 10 + x).unwrap()])
        });
        let roi = Roi {
            x0: 1,
            width: 2,
            y0: 2,
            y1: 4,
        };
        let p = extract_profile(&img, &roi, "img", 0.3).unwrap();
        assert_eq!(p.samples(), &[21, 22, 31, 32]);
        assert_eq!((p.width(), p.height()), (2, 2));
        assert_eq!(
            p.image_dimensions(),
            Dimensions {
                width: 4,
                height: 5
            }
        );
    }

    #[test]
    fn extract_fails_when_image_smaller_than_roi() {
        let img = RgbaImage::new(10, 10);
        let roi = Roi {
            x0: 0,
            width: 18,
            y0: 0,
            y1: 5,
        };
        assert!(matches!(
            extract_profile(&img, &roi, "small", 1.0),
            Err(MatchError::RoiOutOfBounds { .. })
        ));
    }

    #[test]
    fn decode_accepts_rgba8() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(3, 2, image::Rgba([1, 2, 3, 4])));
        let decoded = decode_rgba(&encode_png(&img)).unwrap();
        assert_eq!(decoded.get_pixel(2, 1).0[3], 4);
    }

    #[test]
    fn decode_rejects_rgb_layout() {
        let img = DynamicImage::ImageRgb8(image::RgbImage::new(2, 2));
        assert!(matches!(
            decode_rgba(&encode_png(&img)),
            Err(MatchError::UnsupportedLayout(_))
        ));
    }

    #[test]
    fn decode_rejects_empty_and_corrupt_input() {
        assert!(matches!(decode_rgba(&[]), Err(MatchError::EmptyInput)));
        assert!(matches!(
            decode_rgba(&[0xFF, 0x00, 0x12]),
            Err(MatchError::ImageDecode(_))
        ));
    }

    #[test]
    fn remapped_profile_applies_lut() {
        let lut = AlphaLut::from_table(std::array::from_fn(|i| u8::try_from(255 - i).unwrap()));
        let p = profile(0.1, vec![0, 10, 255]);
        assert_eq!(p.remapped(&lut).samples(), &[255, 245, 0]);
        assert_eq!(p.samples(), &[0, 10, 255]);
    }
}
