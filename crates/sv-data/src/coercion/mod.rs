//! Type coercion of sampled rows
//!
//! Numeric and temporal columns are parsed cell by cell. A cell that fails to
//! parse becomes null and is counted against its column; it never drops the
//! row or aborts the pass. Cells matching a missing-value token are null
//! without counting as failures.

pub mod numeric;
pub mod temporal;

use indexmap::IndexMap;
use tracing::warn;

use sv_core::{CellValue, ColumnKind, ColumnSchema, Row};

use crate::config::{NullConfig, SampleConfig};
use crate::result::CoercedRow;

pub use numeric::parse_number;
pub use temporal::TemporalParser;

/// Typed rows plus per-column failure counts
#[derive(Debug, Clone)]
pub struct CoercedTable {
    pub rows: Vec<CoercedRow>,
    pub failures: IndexMap<String, usize>,
}

/// Target kind of every schema column.
///
/// Datetime columns win over value columns when a name is listed in both.
pub fn column_kinds(schema: &ColumnSchema, config: &SampleConfig) -> Vec<ColumnKind> {
    schema
        .names()
        .iter()
        .map(|name| {
            if config.datetime_columns.iter().any(|c| c == name) {
                ColumnKind::Temporal
            } else if config.value_columns.iter().any(|c| c == name) {
                ColumnKind::Numeric
            } else {
                ColumnKind::Text
            }
        })
        .collect()
}

/// Coerce raw rows according to `kinds`
pub fn coerce_rows(
    schema: &ColumnSchema,
    kinds: &[ColumnKind],
    rows: Vec<Row>,
    parser: &TemporalParser,
    nulls: &NullConfig,
) -> CoercedTable {
    let mut counts = vec![0usize; kinds.len()];
    let total = rows.len();

    let coerced = rows
        .into_iter()
        .map(|row| {
            let cells = row
                .fields
                .into_iter()
                .zip(kinds.iter())
                .enumerate()
                .map(|(idx, (raw, kind))| {
                    let (cell, failed) = coerce_cell(raw, *kind, parser, nulls);
                    if failed {
                        counts[idx] += 1;
                    }
                    cell
                })
                .collect();
            CoercedRow::new(row.record_index, cells)
        })
        .collect();

    let mut failures = IndexMap::new();
    for ((name, kind), count) in schema.names().iter().zip(kinds).zip(counts) {
        if *kind == ColumnKind::Text {
            continue;
        }
        if count > 0 {
            warn!("{} of {} {} values in '{}' could not be parsed", count, total, kind, name);
        }
        failures.insert(name.clone(), count);
    }

    CoercedTable { rows: coerced, failures }
}

/// Coerce one cell, reporting whether parsing failed
fn coerce_cell(
    raw: String,
    kind: ColumnKind,
    parser: &TemporalParser,
    nulls: &NullConfig,
) -> (CellValue, bool) {
    if nulls.is_null(&raw) {
        return (CellValue::Null, false);
    }

    match kind {
        ColumnKind::Text => (CellValue::Text(raw), false),
        ColumnKind::Numeric => match parse_number(&raw) {
            Some(v) => (CellValue::Number(v), false),
            None => (CellValue::Null, true),
        },
        ColumnKind::Temporal => match parser.parse(&raw) {
            Some(ts) => (CellValue::Timestamp(ts), false),
            None => (CellValue::Null, true),
        },
    }
}
