//! Post-sample row filters
//!
//! Filters run on the rows the reservoir kept, never on the raw stream. The
//! sampler knows nothing about them, so a selective filter over a large file
//! can return far fewer rows than actually match in the file, or none at all.
//! That is the documented behaviour of a single bounded-memory pass.

use ahash::AHashSet;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use sv_core::{CellValue, ColumnKind};

use crate::coercion::{parse_number, TemporalParser};
use crate::result::{CoercedRow, ColumnInfo};
use crate::DataError;

/// A predicate on one column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RowFilter {
    /// Inclusive numeric range; a missing bound is open
    Range {
        column: String,
        #[serde(default)]
        min: Option<f64>,
        #[serde(default)]
        max: Option<f64>,
    },
    /// Inclusive date-time range on a temporal column
    TimeRange {
        column: String,
        #[serde(default)]
        start: Option<NaiveDateTime>,
        #[serde(default)]
        end: Option<NaiveDateTime>,
    },
    /// Cell must equal one of `values`; an empty list matches everything.
    ///
    /// On numeric and temporal columns the values are parsed like the cells,
    /// so `2.50` matches a cell read from `2.5`.
    Categorical {
        column: String,
        values: Vec<String>,
    },
}

impl RowFilter {
    /// Column the filter applies to
    pub fn column(&self) -> &str {
        match self {
            RowFilter::Range { column, .. }
            | RowFilter::TimeRange { column, .. }
            | RowFilter::Categorical { column, .. } => column,
        }
    }

    /// Bind the filter to a column position
    fn compile(
        &self,
        columns: &[ColumnInfo],
        parser: &TemporalParser,
    ) -> Result<Option<CompiledFilter>, DataError> {
        let idx = columns
            .iter()
            .position(|c| c.name == self.column())
            .ok_or_else(|| DataError::ColumnNotFound {
                column: self.column().to_string(),
                role: "filters",
            })?;

        let predicate = match self {
            RowFilter::Range { min, max, .. } => Predicate::Range { min: *min, max: *max },
            RowFilter::TimeRange { start, end, .. } => Predicate::TimeRange { start: *start, end: *end },
            RowFilter::Categorical { values, .. } if values.is_empty() => return Ok(None),
            RowFilter::Categorical { values, .. } => match columns[idx].kind {
                ColumnKind::Numeric => {
                    Predicate::OneOfNumber(values.iter().filter_map(|v| parse_number(v)).collect())
                }
                ColumnKind::Temporal => {
                    Predicate::OneOfTime(values.iter().filter_map(|v| parser.parse(v)).collect())
                }
                ColumnKind::Text => Predicate::OneOf(values.iter().cloned().collect()),
            },
        };

        Ok(Some(CompiledFilter { idx, predicate }))
    }
}

struct CompiledFilter {
    idx: usize,
    predicate: Predicate,
}

enum Predicate {
    Range { min: Option<f64>, max: Option<f64> },
    TimeRange { start: Option<NaiveDateTime>, end: Option<NaiveDateTime> },
    OneOf(AHashSet<String>),
    OneOfNumber(Vec<f64>),
    OneOfTime(AHashSet<NaiveDateTime>),
}

impl CompiledFilter {
    fn matches(&self, row: &CoercedRow) -> bool {
        let Some(cell) = row.cells.get(self.idx) else {
            return false;
        };

        match &self.predicate {
            Predicate::Range { min, max } => {
                let value = match cell {
                    CellValue::Number(v) => *v,
                    CellValue::Text(s) => match parse_number(s) {
                        Some(v) => v,
                        None => return false,
                    },
                    _ => return false,
                };
                min.map_or(true, |lo| value >= lo) && max.map_or(true, |hi| value <= hi)
            }
            Predicate::TimeRange { start, end } => match cell {
                CellValue::Timestamp(ts) => {
                    start.map_or(true, |lo| *ts >= lo) && end.map_or(true, |hi| *ts <= hi)
                }
                _ => false,
            },
            Predicate::OneOf(values) => !cell.is_null() && values.contains(&cell.to_string()),
            Predicate::OneOfNumber(values) => match cell {
                CellValue::Number(v) => values.contains(v),
                _ => false,
            },
            Predicate::OneOfTime(values) => match cell {
                CellValue::Timestamp(ts) => values.contains(ts),
                _ => false,
            },
        }
    }
}

/// Keep the rows that satisfy every filter
pub fn apply_filters(
    columns: &[ColumnInfo],
    rows: Vec<CoercedRow>,
    filters: &[RowFilter],
    parser: &TemporalParser,
) -> Result<Vec<CoercedRow>, DataError> {
    let mut compiled = Vec::with_capacity(filters.len());
    for filter in filters {
        if let Some(c) = filter.compile(columns, parser)? {
            compiled.push(c);
        }
    }

    if compiled.is_empty() {
        return Ok(rows);
    }

    Ok(rows
        .into_iter()
        .filter(|row| compiled.iter().all(|f| f.matches(row)))
        .collect())
}
