//! Configuration for one sampling pass

use chrono::format::{Item, StrftimeItems};
use serde::{Serialize, Deserialize};

use crate::filter::RowFilter;
use crate::sources::resolve_encoding;
use crate::DataError;

use super::null_handling::NullConfig;

/// Default reservoir capacity
pub const DEFAULT_MAX_ROWS: i64 = 50_000;

/// Default number of rows per batch pulled from the source
pub const DEFAULT_CHUNK_SIZE: usize = 50_000;

/// Chart the sampled table is meant for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Line,
    Bar,
    Scatter,
    #[serde(alias = "histogram")]
    Hist,
}

impl ChartKind {
    /// Whether the chart needs an x axis column
    pub fn requires_x_column(&self) -> bool {
        matches!(self, ChartKind::Line | ChartKind::Bar | ChartKind::Scatter)
    }
}

/// Configuration for a sampling pass
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SampleConfig {
    /// Reservoir capacity; `None` keeps every row
    pub max_rows: Option<i64>,

    /// Rows per batch read from the source
    pub chunk_size: usize,

    /// Field separator
    pub delimiter: char,

    /// Text encoding label
    pub encoding: String,

    /// Columns parsed as date-times
    pub datetime_columns: Vec<String>,

    /// Extra chrono layouts tried before the built-in ones
    pub datetime_formats: Vec<String>,

    /// Columns parsed as numbers
    pub value_columns: Vec<String>,

    /// Axis column
    pub x_column: Option<String>,

    /// Chart the result feeds, used to check required columns
    pub chart: Option<ChartKind>,

    /// Keep every row instead of sampling
    pub no_sampling: bool,

    /// Seed for the sampler's random source
    pub random_seed: Option<u64>,

    /// Predicates applied to the sampled rows
    pub filters: Vec<RowFilter>,

    /// Missing-value tokens
    pub null_values: NullConfig,

    /// Discard rows with missing chart columns before they reach the sampler
    pub drop_incomplete_rows: bool,

    /// Treat an empty filtered result as an error
    pub fail_on_empty: bool,

    /// Sort the final rows back into file order
    pub restore_source_order: bool,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            max_rows: Some(DEFAULT_MAX_ROWS),
            chunk_size: DEFAULT_CHUNK_SIZE,
            delimiter: ',',
            encoding: "utf-8".to_string(),
            datetime_columns: Vec::new(),
            datetime_formats: Vec::new(),
            value_columns: Vec::new(),
            x_column: None,
            chart: None,
            no_sampling: false,
            random_seed: None,
            filters: Vec::new(),
            null_values: NullConfig::default(),
            drop_incomplete_rows: false,
            fail_on_empty: false,
            restore_source_order: false,
        }
    }
}

impl SampleConfig {
    /// Create a configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the reservoir capacity
    pub fn with_max_rows(mut self, max_rows: i64) -> Self {
        self.max_rows = Some(max_rows);
        self
    }

    /// Set the batch size
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Set the random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }

    /// Check the configuration before any input is touched
    pub fn validate(&self) -> Result<(), DataError> {
        if let Some(max_rows) = self.max_rows {
            if max_rows <= 0 {
                return Err(DataError::InvalidCapacity(max_rows));
            }
        }

        if self.chunk_size == 0 {
            return Err(DataError::InvalidConfig("chunk_size must be a positive integer".to_string()));
        }

        self.delimiter_byte()?;
        resolve_encoding(&self.encoding)?;

        for format in &self.datetime_formats {
            if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
                return Err(DataError::InvalidConfig(format!("invalid datetime format '{}'", format)));
            }
        }

        if let Some(chart) = self.chart {
            if chart.requires_x_column() {
                if self.x_column.is_none() {
                    return Err(DataError::InvalidConfig(
                        "x_column is required for line, bar, and scatter charts".to_string(),
                    ));
                }
                if self.value_columns.is_empty() {
                    return Err(DataError::InvalidConfig(
                        "value_columns is required for line, bar, and scatter charts".to_string(),
                    ));
                }
            } else if self.value_columns.is_empty() && self.x_column.is_none() {
                return Err(DataError::InvalidConfig(
                    "provide either value_columns or x_column to build a histogram".to_string(),
                ));
            }
        }

        Ok(())
    }

    /// Reservoir capacity for this pass, or `None` when every row is kept
    pub fn capacity(&self) -> Result<Option<usize>, DataError> {
        if self.no_sampling {
            return Ok(None);
        }
        match self.max_rows {
            Some(max_rows) if max_rows <= 0 => Err(DataError::InvalidCapacity(max_rows)),
            Some(max_rows) => Ok(Some(max_rows as usize)),
            None => Ok(None),
        }
    }

    /// Delimiter as the single byte the CSV reader expects
    pub fn delimiter_byte(&self) -> Result<u8, DataError> {
        if self.delimiter.is_ascii() && self.delimiter != '"' && self.delimiter != '\n' {
            Ok(self.delimiter as u8)
        } else {
            Err(DataError::InvalidConfig(format!("unsupported delimiter {:?}", self.delimiter)))
        }
    }

    /// Columns a chart needs, x axis first, without duplicates
    pub fn chart_columns(&self) -> Vec<&str> {
        let mut columns: Vec<&str> = Vec::new();
        for column in self.x_column.iter().chain(self.value_columns.iter()) {
            if !columns.contains(&column.as_str()) {
                columns.push(column);
            }
        }
        columns
    }

    /// Every configured column name, paired with the option it came from
    pub fn referenced_columns(&self) -> Vec<(&str, &'static str)> {
        let mut columns = Vec::new();
        if let Some(x) = &self.x_column {
            columns.push((x.as_str(), "x_column"));
        }
        columns.extend(self.value_columns.iter().map(|c| (c.as_str(), "value_columns")));
        columns.extend(self.datetime_columns.iter().map(|c| (c.as_str(), "datetime_columns")));
        columns.extend(self.filters.iter().map(|f| (f.column(), "filters")));
        columns
    }
}
