//! inkcal-export: Pure serializers for calibration output (sans-IO)
//!
//! Turns calibration reports into a fixed-width CSV table and renders
//! diagnostic comparison rasters.

pub mod format;
pub mod rows;
pub mod table;
pub mod visual;

pub use format::format_number;
pub use rows::{assemble_table, probe_row};
pub use table::{PAD_CELL, TableAssembler, TableError, TableSchema};
pub use visual::{agreement_heatmap, difference_map, to_png};
