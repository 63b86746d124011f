//! inkcal-io: Filesystem boundary for footprint calibration.
//!
//! Scans an input folder for probe and candidate images, classifies them
//! by filename, loads the optional alpha curve, runs the matching engine
//! and writes the calibration table and diagnostic images. All matching
//! logic lives in `inkcal-match`; this crate only moves bytes.

pub mod curve;
pub mod error;
pub mod filename;
pub mod load;
pub mod run;
pub mod write;

pub use curve::{CurveParser, load_lut_or_warn};
pub use error::LoadError;
pub use filename::{ClassifierConfig, FilenameClassifier, PRESSURE_PATTERN, Role};
pub use load::{LoadedInputs, load_folder};
pub use run::{DEFAULT_LUT_PATH, DEFAULT_TABLE_NAME, RunOptions, run};
pub use write::{VISUAL_PREFIX, write_table, write_visuals};
