//! One calibration run from an input folder to written outputs.

use std::borrow::Cow;
use std::path::PathBuf;

use inkcal_export::assemble_table;
use inkcal_match::{
    Clock, ExportCounters, MatchConfig, MatchCounters, RunDiagnostics, calibrate,
    prepare_candidates, timed,
};

use crate::curve::load_lut_or_warn;
use crate::error::LoadError;
use crate::filename::{ClassifierConfig, FilenameClassifier};
use crate::load::load_folder;
use crate::write::{write_table, write_visuals};

/// Curve file looked up inside the input folder when no LUT path is given.
pub const DEFAULT_LUT_PATH: &str = "LUT/Dot P1 LUT.crv";

/// Default table file name inside the input folder.
pub const DEFAULT_TABLE_NAME: &str = "footprint-calibration.csv";

/// Where a run reads from and writes to.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Folder holding probe and candidate images.
    pub input_dir: PathBuf,
    /// CSV destination.
    pub output: PathBuf,
    /// Folder for diagnostic PNGs; none are written when `None`.
    pub png_dir: Option<PathBuf>,
    /// Alpha curve file; no LUT is used when `None`.
    pub lut_path: Option<PathBuf>,
    /// Matching parameters.
    pub config: MatchConfig,
    /// Filename role markers.
    pub classifier: ClassifierConfig,
}

impl RunOptions {
    /// Options reading `input_dir` with default parameters, writing the
    /// table next to the inputs and using the default curve file.
    #[must_use]
    pub fn for_folder(input_dir: impl Into<PathBuf>) -> Self {
        let input_dir = input_dir.into();
        Self {
            output: input_dir.join(DEFAULT_TABLE_NAME),
            png_dir: None,
            lut_path: Some(input_dir.join(DEFAULT_LUT_PATH)),
            config: MatchConfig::default(),
            classifier: ClassifierConfig::default(),
            input_dir,
        }
    }
}

/// Load, match and write everything for one folder.
///
/// The table is written only after matching and assembly succeed, so a
/// fatal error leaves no partial CSV behind. Image failures are counted,
/// not returned.
///
/// # Errors
///
/// Returns [`LoadError::Match`] for an invalid configuration or a profile
/// length mismatch, [`LoadError::Table`] for a row wider than the header,
/// and folder or write errors for the input folder and the CSV.
pub fn run<C: Clock>(options: &RunOptions, clock: &C) -> Result<RunDiagnostics, LoadError> {
    let config = &options.config;
    config.validate()?;
    let classifier = FilenameClassifier::new(options.classifier.clone())?;

    let (loaded, load_duration) = timed(clock, || {
        let lut = options.lut_path.as_deref().and_then(load_lut_or_warn);
        load_folder(&options.input_dir, &config.roi, &classifier).map(|inputs| (lut, inputs))
    });
    let (lut, inputs) = loaded?;
    let lut = lut.as_ref();
    // Remapped candidates already carry the curve, so the LUT diagnostics
    // would apply it twice.
    let diagnostic_lut = lut.filter(|_| !config.remap_candidates);

    let (prepared, match_duration) = timed(clock, || {
        let candidates = prepare_candidates(&inputs.candidates, config, lut);
        if matches!(candidates, Cow::Owned(_)) {
            log::info!("{} candidates remapped through the alpha LUT", candidates.len());
        }
        candidates
    });
    let (reports, calibrate_duration) = timed(clock, || {
        calibrate(&inputs.probes, &prepared, config, diagnostic_lut)
    });
    let reports = reports?;
    let matching = MatchCounters::from_reports(&reports);

    let (export, export_duration) = timed(clock, || -> Result<ExportCounters, LoadError> {
        let table = assemble_table(&reports, &config.thresholds, diagnostic_lut.is_some())?;
        write_table(&options.output, &table)?;
        let mut counters = options
            .png_dir
            .as_deref()
            .map(|dir| write_visuals(dir, &reports, diagnostic_lut))
            .unwrap_or_default();
        counters.rows = table.rows().len();
        counters.columns = table.schema().len();
        Ok(counters)
    });

    let diagnostics = RunDiagnostics {
        load_duration,
        match_duration: match_duration + calibrate_duration,
        export_duration,
        lut_loaded: lut.is_some(),
        load: inputs.counters,
        matching,
        export: export?,
    };
    log::info!("{}", diagnostics.summary());
    Ok(diagnostics)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use inkcal_match::MatchError;

    use super::*;

    struct ZeroClock;

    impl Clock for ZeroClock {
        type Instant = ();

        fn now(&self) {}

        fn elapsed(&self, _since: &()) -> Duration {
            Duration::ZERO
        }
    }

    #[test]
    fn folder_defaults() {
        let options = RunOptions::for_folder("scans");
        assert_eq!(options.output, PathBuf::from("scans").join(DEFAULT_TABLE_NAME));
        assert_eq!(
            options.lut_path,
            Some(PathBuf::from("scans").join("LUT").join("Dot P1 LUT.crv"))
        );
        assert!(options.png_dir.is_none());
    }

    #[test]
    fn invalid_config_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut options = RunOptions::for_folder(dir.path());
        options.config.thresholds.clear();
        let err = run(&options, &ZeroClock).unwrap_err();
        assert!(matches!(err, LoadError::Match(MatchError::InvalidConfig(_))));
        assert!(!options.output.exists());
    }

    #[test]
    fn empty_folder_writes_header_only() {
        let dir = tempfile::tempdir().unwrap();
        let options = RunOptions::for_folder(dir.path());
        let diagnostics = run(&options, &ZeroClock).unwrap();
        assert!(!diagnostics.lut_loaded);
        assert_eq!(diagnostics.export.rows, 0);
        let text = std::fs::read_to_string(&options.output).unwrap();
        assert_eq!(text.lines().count(), 1);
        assert_eq!(diagnostics.export.columns, text.trim_end().split(',').count());
    }
}
