//! Rendering calibration reports into table rows.
//!
//! Cells are produced in exactly the order [`TableSchema`] names them;
//! each block writer below mirrors one field list in [`crate::table`].

use inkcal_match::{
    LutStats, OverUnderSearch, OverUnderStats, ProbeReport, RELAXABLE_THRESHOLD, RankedMatch,
    ScoredMatch,
};

use crate::format::{INFINITY, format_flag, format_number};
use crate::table::{TableAssembler, TableError, TableSchema};

/// Accumulates the cells of one row.
#[derive(Debug, Default)]
struct Row {
    cells: Vec<String>,
}

impl Row {
    fn num(&mut self, value: f64) {
        self.cells.push(format_number(value));
    }

    fn count(&mut self, value: impl ToString) {
        self.cells.push(value.to_string());
    }

    fn text(&mut self, value: &str) {
        self.cells.push(value.to_string());
    }

    /// Candidate identity followed by the shape score.
    fn scored(&mut self, matched: Option<&ScoredMatch<'_>>, with_alpha: bool) {
        match matched {
            Some(m) => {
                self.num(m.candidate.pressure());
                self.text(m.candidate.source_id());
                self.num(m.score.iou);
                self.num(m.score.mismatch);
                if with_alpha {
                    self.num(m.score.alpha_k);
                    self.num(m.score.alpha_l1_scaled);
                }
                self.num(m.score.coverage_a);
                self.num(m.score.coverage_b);
                self.count(m.score.union);
            }
            None => {
                self.count(0);
                self.text("");
                self.count(0);
                self.text(INFINITY);
                if with_alpha {
                    self.count(1);
                    self.text(INFINITY);
                }
                self.count(0);
                self.count(0);
                self.count(0);
            }
        }
    }

    fn over_under(&mut self, stats: &OverUnderStats) {
        self.count(stats.over_area);
        self.count(stats.under_area);
        self.num(stats.over_median);
        self.num(stats.under_median);
        self.count(stats.over_p90);
        self.count(stats.under_p90);
        self.count(stats.over_max);
        self.count(stats.under_max);
    }

    fn lut(&mut self, lut_loaded: bool, stats: Option<&LutStats>) {
        self.text(&format_flag(lut_loaded));
        match stats {
            Some(s) => {
                self.num(s.l1_mean);
                self.count(s.over_area);
                self.count(s.under_area);
                self.num(s.over_median);
                self.num(s.under_median);
            }
            None => {
                for _ in 0..5 {
                    self.count(0);
                }
            }
        }
    }

    fn detailed(&mut self, ranked: Option<&RankedMatch<'_>>, lut_loaded: bool) {
        self.scored(ranked.map(|r| &r.matched), true);
        self.over_under(&ranked.map(|r| r.over_under).unwrap_or_default());
        self.lut(lut_loaded, ranked.and_then(|r| r.lut.as_ref()));
    }

    fn shape(&mut self, ranked: Option<&RankedMatch<'_>>) {
        self.scored(ranked.map(|r| &r.matched), false);
        self.over_under(&ranked.map(|r| r.over_under).unwrap_or_default());
    }

    fn search(&mut self, search: Option<&OverUnderSearch<'_>>) {
        let best = search.and_then(|s| s.best.as_ref());
        self.scored(best.map(|b| &b.matched), true);
        self.over_under(&best.map(|b| b.stats).unwrap_or_default());
        match best {
            Some(b) => self.count(b.score),
            None => self.text(INFINITY),
        }
        self.count(search.map_or(0, |s| s.candidates_checked));
        self.count(search.map_or(0, |s| s.candidates_gated));
    }
}

/// Render one probe's report as a row laid out for `schema`.
///
/// Thresholds in the schema that the report lacks render as placeholder
/// blocks.
#[must_use]
pub fn probe_row(report: &ProbeReport<'_>, schema: &TableSchema, lut_loaded: bool) -> Vec<String> {
    let probe = report.probe;
    let mut row = Row::default();

    row.num(probe.pressure());
    row.text(probe.source_id());
    row.count(probe.image_dimensions().width);
    row.count(probe.image_dimensions().height);
    row.count(probe.width());
    row.count(probe.height());

    for &t in schema.thresholds() {
        let tr = report.threshold(t);
        if t == RELAXABLE_THRESHOLD {
            row.detailed(tr.and_then(|r| r.best.as_ref()), lut_loaded);
            row.detailed(tr.and_then(|r| r.second.as_ref()), lut_loaded);
            row.search(report.over_under.as_ref());
        } else {
            row.shape(tr.and_then(|r| r.best.as_ref()));
            row.shape(tr.and_then(|r| r.second.as_ref()));
        }
    }

    if schema.thresholds().contains(&RELAXABLE_THRESHOLD) {
        row.count(
            report
                .relaxable_effective_threshold()
                .unwrap_or(RELAXABLE_THRESHOLD),
        );
    }
    for &t in schema.thresholds() {
        let gates = report.threshold(t).map(|r| r.gates).unwrap_or_default();
        row.count(gates.passed_iou);
        row.count(gates.passed_union);
        row.count(gates.passed_cov);
    }

    row.cells
}

/// Build the full calibration table for `reports`, one row per probe.
///
/// # Errors
///
/// Returns [`TableError::RowOverflow`] if a rendered row is wider than the
/// header.
pub fn assemble_table(
    reports: &[ProbeReport<'_>],
    thresholds: &[u8],
    lut_loaded: bool,
) -> Result<TableAssembler, TableError> {
    let schema = TableSchema::for_thresholds(thresholds);
    let mut table = TableAssembler::new(schema);
    for report in reports {
        let cells = probe_row(report, table.schema(), lut_loaded);
        table.push_row(cells)?;
    }
    Ok(table)
}
