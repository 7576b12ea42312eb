//! Final table and metadata handed to chart builders

use std::fmt::Write as _;

use indexmap::IndexMap;
use serde::Serialize;

use sv_core::{CellValue, ColumnKind};

/// A coerced row, tagged with its record index in the source file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoercedRow {
    pub record_index: u64,
    pub cells: Vec<CellValue>,
}

impl CoercedRow {
    pub fn new(record_index: u64, cells: Vec<CellValue>) -> Self {
        Self { record_index, cells }
    }
}

/// Column info for the result table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnInfo {
    pub name: String,
    pub kind: ColumnKind,
}

/// Outcome of one sampling pass.
///
/// Built once at the end of a pass and read-only afterwards. Row order is the
/// reservoir's slot order, which is not file order once replacements happened;
/// use [`SampleResult::sorted_by_source_order`] when order matters.
#[derive(Debug, Clone, Serialize)]
pub struct SampleResult {
    columns: Vec<ColumnInfo>,
    rows: Vec<CoercedRow>,
    total_rows_seen: u64,
    was_sampled: bool,
    coercion_failures: IndexMap<String, usize>,
    malformed_rows: u64,
    incomplete_rows_dropped: u64,
    rows_before_filter: usize,
    interrupted: bool,
}

/// Everything needed to assemble a [`SampleResult`]
#[derive(Debug, Clone, Default)]
pub(crate) struct ResultParts {
    pub columns: Vec<ColumnInfo>,
    pub rows: Vec<CoercedRow>,
    pub total_rows_seen: u64,
    pub was_sampled: bool,
    pub coercion_failures: IndexMap<String, usize>,
    pub malformed_rows: u64,
    pub incomplete_rows_dropped: u64,
    pub rows_before_filter: usize,
    pub interrupted: bool,
}

impl SampleResult {
    pub(crate) fn from_parts(parts: ResultParts) -> Self {
        Self {
            columns: parts.columns,
            rows: parts.rows,
            total_rows_seen: parts.total_rows_seen,
            was_sampled: parts.was_sampled,
            coercion_failures: parts.coercion_failures,
            malformed_rows: parts.malformed_rows,
            incomplete_rows_dropped: parts.incomplete_rows_dropped,
            rows_before_filter: parts.rows_before_filter,
            interrupted: parts.interrupted,
        }
    }

    /// Columns in header order with their coerced kind
    pub fn columns(&self) -> &[ColumnInfo] {
        &self.columns
    }

    /// Coerced and filtered rows
    pub fn rows(&self) -> &[CoercedRow] {
        &self.rows
    }

    /// Valid rows offered to the sampler
    pub fn total_rows_seen(&self) -> u64 {
        self.total_rows_seen
    }

    /// Whether the reservoir had to drop rows
    pub fn was_sampled(&self) -> bool {
        self.was_sampled
    }

    /// Unparseable values per coerced column
    pub fn coercion_failures(&self) -> &IndexMap<String, usize> {
        &self.coercion_failures
    }

    /// Records skipped for a field count mismatch
    pub fn malformed_rows(&self) -> u64 {
        self.malformed_rows
    }

    /// Rows discarded before sampling because a chart column was missing
    pub fn incomplete_rows_dropped(&self) -> u64 {
        self.incomplete_rows_dropped
    }

    /// Sampled rows before the post-sample filter ran
    pub fn rows_before_filter(&self) -> usize {
        self.rows_before_filter
    }

    /// Whether the pass stopped early on an abort request
    pub fn interrupted(&self) -> bool {
        self.interrupted
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column by name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// All cells of one column, in row order
    pub fn column_values(&self, name: &str) -> Option<Vec<&CellValue>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|row| &row.cells[idx]).collect())
    }

    /// Same result with rows sorted back into file order
    pub fn sorted_by_source_order(mut self) -> Self {
        self.rows.sort_by_key(|row| row.record_index);
        self
    }

    /// Human-readable diagnostics for the pass
    pub fn summary(&self) -> String {
        let mut out = String::new();

        let kept = format_count(self.rows_before_filter as u64);
        let seen = format_count(self.total_rows_seen);
        let _ = match (self.was_sampled, self.interrupted) {
            (true, false) => write!(out, "Sampled {} of {} rows", kept, seen),
            (false, false) => write!(out, "Loaded all {} rows", seen),
            (true, true) => write!(
                out,
                "Sampled {} of the first {} rows; interrupted before the end of the file",
                kept, seen
            ),
            (false, true) => write!(
                out,
                "Loaded {} rows; interrupted before the end of the file",
                seen
            ),
        };
        if self.rows.len() != self.rows_before_filter {
            let _ = write!(
                out,
                "; {} of {} sampled rows matched the filters",
                format_count(self.rows.len() as u64),
                format_count(self.rows_before_filter as u64)
            );
        }
        out.push('.');

        for (column, count) in &self.coercion_failures {
            if *count == 0 {
                continue;
            }
            let kind = self
                .columns
                .iter()
                .find(|c| &c.name == column)
                .map(|c| c.kind)
                .unwrap_or(ColumnKind::Text);
            let _ = write!(
                out,
                "\n{} of {} {} values in '{}' were unparseable.",
                format_count(*count as u64),
                format_count(self.rows_before_filter as u64),
                kind,
                column
            );
        }
        if self.malformed_rows > 0 {
            let _ = write!(out, "\n{} malformed rows were skipped.", format_count(self.malformed_rows));
        }
        if self.incomplete_rows_dropped > 0 {
            let _ = write!(
                out,
                "\n{} rows with missing chart values were dropped.",
                format_count(self.incomplete_rows_dropped)
            );
        }

        out
    }
}

/// Format a count with thousands separators (e.g., "5,000")
pub fn format_count(count: u64) -> String {
    let digits = count.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
