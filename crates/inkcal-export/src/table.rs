//! Calibration table schema and row assembly.
//!
//! The header is computed once from the configured thresholds and every
//! row is checked against its width here, in one place. Rows longer than
//! the header are rejected; shorter rows are padded with [`PAD_CELL`].

use std::io::Write;

use inkcal_match::RELAXABLE_THRESHOLD;

/// Cell used to pad rows shorter than the header.
pub const PAD_CELL: &str = "0";

/// Errors from table assembly and CSV serialization.
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    /// A row had more cells than the header has columns.
    #[error("row {row} has {cells} cells but the header has {columns} columns")]
    RowOverflow {
        /// Zero-based data row index.
        row: usize,
        /// Cells in the offending row.
        cells: usize,
        /// Header width.
        columns: usize,
    },

    /// CSV serialization failed.
    #[error("CSV write failed: {0}")]
    Csv(#[from] csv::Error),

    /// The underlying writer failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Fields of a detailed match block, in column order.
pub const DETAILED_FIELDS: &[&str] = &[
    "candidate_pressure",
    "candidate_file",
    "iou",
    "mismatch",
    "alpha_k",
    "alpha_l1",
    "coverage_probe",
    "coverage_candidate",
    "union",
    "over_area",
    "under_area",
    "over_median",
    "under_median",
    "over_p90",
    "under_p90",
    "over_max",
    "under_max",
    "lut_loaded",
    "alpha_l1_lut",
    "over_area_lut",
    "under_area_lut",
    "over_median_lut",
    "under_median_lut",
];

/// Fields of the over/under search block, in column order.
pub const OVER_UNDER_FIELDS: &[&str] = &[
    "candidate_pressure",
    "candidate_file",
    "iou",
    "mismatch",
    "alpha_k",
    "alpha_l1",
    "coverage_probe",
    "coverage_candidate",
    "union",
    "over_area",
    "under_area",
    "over_median",
    "under_median",
    "over_p90",
    "under_p90",
    "over_max",
    "under_max",
    "score",
    "candidates_checked",
    "candidates_gated",
];

/// Fields of a shape-only match block, in column order.
pub const SHAPE_FIELDS: &[&str] = &[
    "candidate_pressure",
    "candidate_file",
    "iou",
    "mismatch",
    "coverage_probe",
    "coverage_candidate",
    "union",
    "over_area",
    "under_area",
    "over_median",
    "under_median",
    "over_p90",
    "under_p90",
    "over_max",
    "under_max",
];

/// Leading per-probe columns.
pub const BASE_FIELDS: &[&str] = &[
    "probe_pressure",
    "probe_file",
    "image_width",
    "image_height",
    "roi_w",
    "roi_h",
];

/// Rank labels of the two retained matches.
pub const RANKS: [&str; 2] = ["best", "second"];

/// Column layout of the calibration table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    thresholds: Vec<u8>,
    columns: Vec<String>,
}

impl TableSchema {
    /// Build the header for `thresholds` in their declared order.
    ///
    /// The relaxable threshold gets detailed best/second blocks followed
    /// by the over/under search block; every other threshold gets shape
    /// blocks. A diagnostics block closes the row.
    #[must_use]
    pub fn for_thresholds(thresholds: &[u8]) -> Self {
        let mut columns: Vec<String> = BASE_FIELDS.iter().map(ToString::to_string).collect();

        for &t in thresholds {
            let fields = if t == RELAXABLE_THRESHOLD {
                DETAILED_FIELDS
            } else {
                SHAPE_FIELDS
            };
            for rank in RANKS {
                columns.extend(fields.iter().map(|f| format!("th{t}_{rank}_{f}")));
            }
            if t == RELAXABLE_THRESHOLD {
                columns.extend(OVER_UNDER_FIELDS.iter().map(|f| format!("th{t}_ou_{f}")));
            }
        }

        if thresholds.contains(&RELAXABLE_THRESHOLD) {
            columns.push(format!("th{RELAXABLE_THRESHOLD}_effective_threshold"));
        }
        for &t in thresholds {
            for gate in ["pass_iou", "pass_union", "pass_cov"] {
                columns.push(format!("th{t}_{gate}"));
            }
        }

        Self {
            thresholds: thresholds.to_vec(),
            columns,
        }
    }

    /// Thresholds the schema was built for.
    #[must_use]
    pub fn thresholds(&self) -> &[u8] {
        &self.thresholds
    }

    /// Column names in order.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Header width.
    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns `true` if the schema has no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Accumulates fixed-width rows under a [`TableSchema`].
#[derive(Debug, Clone)]
pub struct TableAssembler {
    schema: TableSchema,
    rows: Vec<Vec<String>>,
}

impl TableAssembler {
    /// Start an empty table.
    #[must_use]
    pub const fn new(schema: TableSchema) -> Self {
        Self {
            schema,
            rows: Vec::new(),
        }
    }

    /// The table's schema.
    #[must_use]
    pub const fn schema(&self) -> &TableSchema {
        &self.schema
    }

    /// Data rows so far.
    #[must_use]
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Append a row, padding it to the header width.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::RowOverflow`] if the row has more cells than
    /// the header.
    pub fn push_row(&mut self, mut cells: Vec<String>) -> Result<(), TableError> {
        let columns = self.schema.len();
        if cells.len() > columns {
            return Err(TableError::RowOverflow {
                row: self.rows.len(),
                cells: cells.len(),
                columns,
            });
        }
        cells.resize(columns, PAD_CELL.to_string());
        self.rows.push(cells);
        Ok(())
    }

    /// Serialize header and rows as CSV into `writer`.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::Csv`] or [`TableError::Io`] if writing fails.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), TableError> {
        let mut out = csv::WriterBuilder::new()
            .terminator(csv::Terminator::CRLF)
            .from_writer(writer);
        out.write_record(self.schema.columns())?;
        for row in &self.rows {
            out.write_record(row)?;
        }
        out.flush()?;
        Ok(())
    }

    /// Serialize the table as a CSV string.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::Csv`] if serialization fails.
    pub fn to_csv_string(&self) -> Result<String, TableError> {
        let mut buf = Vec::new();
        self.write_csv(&mut buf)?;
        String::from_utf8(buf).map_err(|e| {
            TableError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn schema() -> TableSchema {
        TableSchema::for_thresholds(&[1, 2, 3])
    }

    #[test]
    fn default_schema_width() {
        // base + th1 (2 detailed + over/under) + th2/th3 (2 shape each) + diagnostics
        let expected = 6 + 2 * 23 + 20 + 2 * 2 * 15 + 1 + 3 * 3;
        assert_eq!(schema().len(), expected);
        assert_eq!(expected, 142);
    }

    #[test]
    fn schema_column_order() {
        let s = schema();
        let cols = s.columns();
        assert_eq!(cols[0], "probe_pressure");
        assert_eq!(cols[6], "th1_best_candidate_pressure");
        assert_eq!(cols[6 + 23], "th1_second_candidate_pressure");
        assert_eq!(cols[6 + 46], "th1_ou_candidate_pressure");
        assert_eq!(cols[6 + 46 + 17], "th1_ou_score");
        assert_eq!(cols[6 + 66], "th2_best_candidate_pressure");
        assert_eq!(cols[cols.len() - 10], "th1_effective_threshold");
        assert_eq!(cols.last().unwrap(), "th3_pass_cov");
    }

    #[test]
    fn column_names_are_unique() {
        let s = schema();
        let mut names = s.columns().to_vec();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), s.len());
    }

    #[test]
    fn schema_without_relaxable_threshold() {
        let s = TableSchema::for_thresholds(&[2]);
        assert_eq!(s.len(), 6 + 2 * 15 + 3);
        assert!(!s.columns().iter().any(|c| c.contains("effective")));
    }

    #[test]
    fn overflow_is_rejected() {
        let mut table = TableAssembler::new(TableSchema::for_thresholds(&[]));
        let row = vec!["x".to_string(); 7];
        let err = table.push_row(row).unwrap_err();
        assert!(matches!(
            err,
            TableError::RowOverflow {
                row: 0,
                cells: 7,
                columns: 6,
            }
        ));
        assert!(table.rows().is_empty());
    }

    #[test]
    fn short_rows_are_padded() {
        let mut table = TableAssembler::new(TableSchema::for_thresholds(&[]));
        table.push_row(vec!["0.5".to_string(), "a.png".to_string()]).unwrap();
        assert_eq!(table.rows()[0], vec!["0.5", "a.png", "0", "0", "0", "0"]);
    }

    #[test]
    fn csv_output() {
        let mut table = TableAssembler::new(TableSchema::for_thresholds(&[]));
        table
            .push_row(vec!["0.5".to_string(), "odd, name.png".to_string()])
            .unwrap();
        let csv = table.to_csv_string().unwrap();
        assert_eq!(
            csv,
            "probe_pressure,probe_file,image_width,image_height,roi_w,roi_h\r\n\
             0.5,\"odd, name.png\",0,0,0,0\r\n"
        );
    }
}
