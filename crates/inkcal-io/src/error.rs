//! Error type for the filesystem boundary.

use std::path::PathBuf;

use inkcal_export::TableError;
use inkcal_match::MatchError;

/// Errors that can occur while loading inputs or writing outputs.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The input folder could not be listed.
    #[error("cannot read folder {path}: {source}")]
    ReadDir {
        /// Folder that failed.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// A file could not be read.
    #[error("cannot read {path}: {source}")]
    Read {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// An output file or folder could not be written.
    #[error("cannot write {path}: {source}")]
    Write {
        /// Path that failed.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// A diagnostic image could not be encoded.
    #[error("cannot encode {path}: {source}")]
    Encode {
        /// Image that failed.
        path: PathBuf,
        /// Underlying error.
        source: image::ImageError,
    },

    /// A curve file did not contain a usable alpha curve.
    #[error("invalid curve file: {0}")]
    InvalidCurve(String),

    /// A filename pattern failed to compile.
    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// Matching failed.
    #[error(transparent)]
    Match(#[from] MatchError),

    /// Table assembly failed.
    #[error(transparent)]
    Table(#[from] TableError),
}
