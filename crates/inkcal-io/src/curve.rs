//! GIMP `.crv` curve files as alpha lookup tables.
//!
//! Only the `(channel alpha)` block is read. Its `(samples 256 ...)` list
//! holds the curve evaluated at 256 evenly spaced inputs, each in `[0, 1]`.

use std::path::Path;

use inkcal_match::{AlphaLut, LUT_SIZE};
use regex::Regex;

use crate::error::LoadError;

const BLOCK_PATTERN: &str =
    r"(?is)\(channel\s+alpha\)\s*\(curve(?P<body>.*?)\)\s*(?:\(channel\s+|#\s*end|\z)";
const SAMPLES_PATTERN: &str = r"(?is)\(samples\s+(?P<n>\d+)\s+(?P<vals>.*?)\)";
const NUMBER_PATTERN: &str = r"[-+]?(?:\d+\.\d+|\d+|\.\d+)(?:[eE][-+]?\d+)?";

/// Parser for the alpha curve of a GIMP curves preset.
#[derive(Debug, Clone)]
pub struct CurveParser {
    block: Regex,
    samples: Regex,
    number: Regex,
}

impl CurveParser {
    /// Compile the curve patterns.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Pattern`] if a pattern fails to compile.
    pub fn new() -> Result<Self, LoadError> {
        Ok(Self {
            block: Regex::new(BLOCK_PATTERN)?,
            samples: Regex::new(SAMPLES_PATTERN)?,
            number: Regex::new(NUMBER_PATTERN)?,
        })
    }

    /// Parse curve file text into a lookup table.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::InvalidCurve`] if there is no alpha block, no
    /// samples list, the sample count is not 256, or a value does not
    /// parse.
    pub fn parse(&self, text: &str) -> Result<AlphaLut, LoadError> {
        let body = self
            .block
            .captures(text)
            .and_then(|c| c.name("body"))
            .ok_or_else(|| LoadError::InvalidCurve("no (channel alpha) curve block".into()))?
            .as_str();

        let samples = self
            .samples
            .captures(body)
            .ok_or_else(|| LoadError::InvalidCurve("no (samples ...) list in alpha curve".into()))?;

        let declared: usize = samples["n"]
            .parse()
            .map_err(|_| LoadError::InvalidCurve(format!("bad sample count {}", &samples["n"])))?;
        if declared != LUT_SIZE {
            return Err(LoadError::InvalidCurve(format!(
                "expected {LUT_SIZE} samples, file declares {declared}"
            )));
        }

        let values = self
            .number
            .find_iter(&samples["vals"])
            .map(|m| {
                m.as_str()
                    .parse::<f64>()
                    .map_err(|e| LoadError::InvalidCurve(format!("bad sample {}: {e}", m.as_str())))
            })
            .collect::<Result<Vec<_>, _>>()?;

        AlphaLut::from_unit_samples(&values).map_err(|e| LoadError::InvalidCurve(e.to_string()))
    }

    /// Read and parse the curve file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Read`] if the file cannot be read, otherwise
    /// as [`CurveParser::parse`].
    pub fn load(&self, path: &Path) -> Result<AlphaLut, LoadError> {
        let text = std::fs::read_to_string(path).map_err(|source| LoadError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        self.parse(&text)
    }
}

/// Load the alpha LUT at `path`, logging and returning `None` on failure.
#[must_use]
pub fn load_lut_or_warn(path: &Path) -> Option<AlphaLut> {
    let result = CurveParser::new().and_then(|parser| parser.load(path));
    match result {
        Ok(lut) => {
            log::info!("loaded alpha LUT from {}", path.display());
            Some(lut)
        }
        Err(e) => {
            log::warn!("alpha LUT not loaded, continuing without it: {e}");
            None
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::fmt::Write;

    use super::*;

    fn samples_text(n: usize, f: impl Fn(usize) -> f64) -> String {
        let mut s = String::new();
        for i in 0..n {
            write!(s, " {}", f(i)).unwrap();
        }
        s
    }

    fn crv(alpha_samples: &str) -> String {
        format!(
            "# GIMP curves tool settings\n\n\
             (time 0)\n\
             (channel value)\n\
             (curve\n    (curve-type smooth)\n    (n-points 3)\n    (points 4 0.0 0.0 1.0 1.0)\n    \
             (point-types 2 0 0)\n    (n-samples 256)\n    (samples 2 0.0 1.0))\n\
             (channel alpha)\n\
             (curve\n    (curve-type free)\n    (n-points 0)\n    (n-samples 256)\n    \
             (samples 256{alpha_samples}))\n\
             (channel red)\n\
             (curve (samples 1 0.5))\n\
             # end of curves tool settings\n"
        )
    }

    #[test]
    #[allow(clippy::cast_precision_loss)]
    fn parses_alpha_channel_only() {
        let text = crv(&samples_text(256, |i| i as f64 / 255.0));
        let lut = CurveParser::new().unwrap().parse(&text).unwrap();
        assert_eq!(lut, AlphaLut::identity());
    }

    #[test]
    fn clamps_and_accepts_exponents() {
        let mut values: Vec<String> = (0..256).map(|_| "0.5".to_string()).collect();
        values[0] = "-1".into();
        values[1] = "2.5e0".into();
        values[2] = ".25".into();
        let text = crv(&format!(" {}", values.join(" ")));
        let lut = CurveParser::new().unwrap().parse(&text).unwrap();
        assert_eq!(lut.apply(0), 0);
        assert_eq!(lut.apply(1), 255);
        assert_eq!(lut.apply(2), 64);
        assert_eq!(lut.apply(3), 128);
    }

    #[test]
    fn wrong_declared_count_rejected() {
        let text = "(channel alpha) (curve (samples 2 0.0 1.0))";
        let err = CurveParser::new().unwrap().parse(text).unwrap_err();
        assert!(matches!(err, LoadError::InvalidCurve(_)));
    }

    #[test]
    fn value_count_must_match() {
        let text = format!("(channel alpha) (curve (samples 256{}))", samples_text(255, |_| 0.0));
        assert!(CurveParser::new().unwrap().parse(&text).is_err());
    }

    #[test]
    fn missing_alpha_block_rejected() {
        let text = "(channel value) (curve (samples 256 0.0))";
        assert!(matches!(
            CurveParser::new().unwrap().parse(text),
            Err(LoadError::InvalidCurve(_))
        ));
    }

    #[test]
    fn missing_file_warns_and_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_lut_or_warn(&dir.path().join("absent.crv")).is_none());
    }
}
