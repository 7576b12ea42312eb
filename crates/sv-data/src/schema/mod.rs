//! Header preview and filter suggestions
//!
//! A preview reads the header and the first rows of a source without any
//! sampling, so a dashboard can offer column pickers and filter widgets before
//! the real pass runs.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;

use sv_core::{ColumnSchema, Row};

use crate::coercion::parse_number;
use crate::config::{NullConfig, SampleConfig};
use crate::sources::{CsvBatchReader, Source};
use crate::DataError;

/// Default number of rows read by a preview
pub const DEFAULT_PREVIEW_ROWS: usize = 500;

/// Columns with more distinct values than this get no categorical picker
pub const MAX_CATEGORIES: usize = 50;

/// Suggested filter widget for a column
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FilterHint {
    /// Every value is numeric; offer a range slider
    Numeric { min: f64, max: f64 },
    /// Few distinct values; offer a multi-select
    Categorical { values: Vec<String> },
    /// A single numeric value, nothing to filter on
    Constant,
    /// No value in the preview
    AllMissing,
    /// Too many distinct values for a picker
    TooManyValues { count: usize },
}

/// First rows of a source plus per-column hints
#[derive(Debug, Clone)]
pub struct Preview {
    pub schema: Arc<ColumnSchema>,
    pub rows: Vec<Row>,
    pub hints: Vec<(String, FilterHint)>,
}

/// Read the header and up to `max_rows` rows of a source
pub fn preview(source: Source, config: &SampleConfig, max_rows: usize) -> Result<Preview, DataError> {
    let preview_config = SampleConfig {
        chunk_size: max_rows.max(1),
        ..config.clone()
    };
    let mut reader = CsvBatchReader::open(source, &preview_config)?;
    let rows = if max_rows == 0 {
        Vec::new()
    } else {
        reader.next_batch()?.unwrap_or_default()
    };
    reader.close();

    let schema = reader.schema().clone();
    let detector = HintDetector::new(&config.null_values);
    let hints = schema
        .names()
        .iter()
        .enumerate()
        .map(|(idx, name)| (name.clone(), detector.analyze_column(&rows, idx)))
        .collect();

    Ok(Preview { schema, rows, hints })
}

/// Derives a filter hint from preview values
struct HintDetector<'a> {
    nulls: &'a NullConfig,
}

impl<'a> HintDetector<'a> {
    fn new(nulls: &'a NullConfig) -> Self {
        Self { nulls }
    }

    /// Analyze a single column
    fn analyze_column(&self, rows: &[Row], col_idx: usize) -> FilterHint {
        let values: Vec<&str> = rows
            .iter()
            .filter_map(|row| row.fields.get(col_idx))
            .map(|s| s.as_str())
            .filter(|s| !self.nulls.is_null(s))
            .collect();

        if values.is_empty() {
            return FilterHint::AllMissing;
        }

        let numbers: Option<Vec<f64>> = values.iter().map(|v| parse_number(v)).collect();
        if let Some(numbers) = numbers {
            let min = numbers.iter().copied().fold(f64::INFINITY, f64::min);
            let max = numbers.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            return if min == max {
                FilterHint::Constant
            } else {
                FilterHint::Numeric { min, max }
            };
        }

        let distinct: BTreeSet<&str> = values.into_iter().collect();
        if distinct.len() > MAX_CATEGORIES {
            FilterHint::TooManyValues { count: distinct.len() }
        } else {
            FilterHint::Categorical {
                values: distinct.into_iter().map(|s| s.to_string()).collect(),
            }
        }
    }
}
