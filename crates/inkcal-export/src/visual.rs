//! Diagnostic rasters comparing a probe with a matched candidate.
//!
//! Images are ROI-sized: one pixel per profile sample, laid out with the
//! profile's width and height.

use std::io::Cursor;

use image::{ImageFormat, Rgba, RgbaImage};
use inkcal_match::{AlphaLut, MatchError, PixelProfile};

const BOTH: Rgba<u8> = Rgba([0, 0, 0, 255]);
const PROBE_ONLY: Rgba<u8> = Rgba([0, 255, 0, 255]);
const CANDIDATE_ONLY: Rgba<u8> = Rgba([0, 0, 255, 255]);
const NEITHER: Rgba<u8> = Rgba([255, 255, 255, 255]);

fn paired_samples<'p>(
    probe: &'p PixelProfile,
    candidate: &'p PixelProfile,
    lut: Option<&'p AlphaLut>,
) -> Result<impl Iterator<Item = (u8, u8)> + 'p, MatchError> {
    if probe.len() != candidate.len() {
        return Err(MatchError::ProfileLengthMismatch {
            probe: probe.len(),
            candidate: candidate.len(),
        });
    }
    Ok(probe
        .samples()
        .iter()
        .zip(candidate.samples())
        .map(move |(&p, &c)| (p, lut.map_or(c, |l| l.apply(c)))))
}

fn render(
    probe: &PixelProfile,
    pixels: impl Iterator<Item = Rgba<u8>>,
) -> RgbaImage {
    let mut image = RgbaImage::new(probe.width(), probe.height());
    for (slot, px) in image.pixels_mut().zip(pixels) {
        *slot = px;
    }
    image
}

/// Binary agreement map at `threshold`.
///
/// Both on is black, probe only is green, candidate only is blue and
/// neither is white. With a LUT the candidate is remapped first.
///
/// # Errors
///
/// Returns [`MatchError::ProfileLengthMismatch`] if the profiles differ in
/// length.
pub fn agreement_heatmap(
    probe: &PixelProfile,
    candidate: &PixelProfile,
    threshold: u8,
    lut: Option<&AlphaLut>,
) -> Result<RgbaImage, MatchError> {
    let pixels = paired_samples(probe, candidate, lut)?.map(|(p, c)| {
        match (p >= threshold, c >= threshold) {
            (true, true) => BOTH,
            (true, false) => PROBE_ONLY,
            (false, true) => CANDIDATE_ONLY,
            (false, false) => NEITHER,
        }
    });
    Ok(render(probe, pixels))
}

/// Absolute alpha difference, white (equal) to red (maximal).
///
/// A difference `d` maps to `(255, 255 - d, 255 - d)`. With a LUT the
/// candidate is remapped first.
///
/// # Errors
///
/// Returns [`MatchError::ProfileLengthMismatch`] if the profiles differ in
/// length.
pub fn difference_map(
    probe: &PixelProfile,
    candidate: &PixelProfile,
    lut: Option<&AlphaLut>,
) -> Result<RgbaImage, MatchError> {
    let pixels = paired_samples(probe, candidate, lut)?.map(|(p, c)| {
        let fade = 255 - p.abs_diff(c);
        Rgba([255, fade, fade, 255])
    });
    Ok(render(probe, pixels))
}

/// Encode an image as PNG bytes.
///
/// # Errors
///
/// Returns [`image::ImageError`] if encoding fails.
pub fn to_png(image: &RgbaImage) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Cursor::new(Vec::new());
    image.write_to(&mut buf, ImageFormat::Png)?;
    Ok(buf.into_inner())
}
