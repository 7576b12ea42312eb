//! Command-line arguments and their mapping onto a sampling configuration

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};

use sv_data::{ChartKind, RowFilter, SampleConfig};

/// Seed used when neither the flags nor a config file set one
pub const DEFAULT_SEED: u64 = 13;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ChartArg {
    Line,
    Bar,
    Scatter,
    #[value(alias = "histogram")]
    Hist,
}

impl From<ChartArg> for ChartKind {
    fn from(arg: ChartArg) -> Self {
        match arg {
            ChartArg::Line => ChartKind::Line,
            ChartArg::Bar => ChartKind::Bar,
            ChartArg::Scatter => ChartKind::Scatter,
            ChartArg::Hist => ChartKind::Hist,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Csv,
    Json,
}

/// Sample a large delimited file into a table small enough to chart
#[derive(Debug, Parser)]
#[command(name = "csvsample", version)]
pub struct Args {
    /// Delimited text file to read
    pub path: PathBuf,

    /// Chart the table is meant for
    #[arg(long, value_enum)]
    pub chart: Option<ChartArg>,

    /// Axis column
    #[arg(short = 'x', long)]
    pub x_column: Option<String>,

    /// Columns parsed as numbers
    #[arg(short = 'y', long, num_args = 1..)]
    pub value_columns: Vec<String>,

    /// Reservoir capacity [default: 50000]
    #[arg(long, allow_negative_numbers = true)]
    pub max_rows: Option<i64>,

    /// Rows per batch [default: 50000]
    #[arg(long)]
    pub chunk_size: Option<usize>,

    /// Field separator [default: ,]
    #[arg(short = 'd', long)]
    pub delimiter: Option<char>,

    /// Text encoding [default: utf-8]
    #[arg(long)]
    pub encoding: Option<String>,

    /// Columns parsed as date-times
    #[arg(long, num_args = 1..)]
    pub datetime_columns: Vec<String>,

    /// Extra chrono layouts for date-time columns
    #[arg(long = "datetime-format")]
    pub datetime_formats: Vec<String>,

    /// Extra missing-value tokens
    #[arg(long = "null-value")]
    pub null_values: Vec<String>,

    /// Sampler seed [default: 13]
    #[arg(long)]
    pub seed: Option<u64>,

    /// Keep every row
    #[arg(long)]
    pub no_sampling: bool,

    /// Numeric range filter, `column:min:max` (either bound may be empty)
    #[arg(long = "range", value_name = "COL:MIN:MAX")]
    pub ranges: Vec<String>,

    /// Categorical filter, `column=a,b,c`
    #[arg(long = "include", value_name = "COL=VALUES")]
    pub includes: Vec<String>,

    /// Drop rows with missing chart values before sampling
    #[arg(long)]
    pub drop_incomplete: bool,

    /// Exit with an error when no rows are left
    #[arg(long)]
    pub fail_on_empty: bool,

    /// Restore file order in the output
    #[arg(long)]
    pub sort_by_source: bool,

    /// JSON file holding a saved configuration
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Print the header preview and filter hints instead of sampling
    #[arg(long)]
    pub preview: bool,

    /// Output file (stdout when omitted)
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
    pub format: OutputFormat,
}

impl Args {
    /// Build the sampling configuration, layering flags over the config file
    pub fn to_config(&self) -> Result<SampleConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config {}", path.display()))?;
                serde_json::from_str::<SampleConfig>(&text)
                    .with_context(|| format!("Invalid config {}", path.display()))?
            }
            None => SampleConfig {
                random_seed: Some(DEFAULT_SEED),
                ..SampleConfig::default()
            },
        };

        if let Some(chart) = self.chart {
            config.chart = Some(chart.into());
        }
        if self.x_column.is_some() {
            config.x_column = self.x_column.clone();
        }
        if !self.value_columns.is_empty() {
            config.value_columns = self.value_columns.clone();
        }
        if let Some(max_rows) = self.max_rows {
            config.max_rows = Some(max_rows);
        }
        if let Some(chunk_size) = self.chunk_size {
            config.chunk_size = chunk_size;
        }
        if let Some(delimiter) = self.delimiter {
            config.delimiter = delimiter;
        }
        if let Some(encoding) = &self.encoding {
            config.encoding = encoding.clone();
        }
        if !self.datetime_columns.is_empty() {
            config.datetime_columns = self.datetime_columns.clone();
        }
        config.datetime_formats.extend(self.datetime_formats.iter().cloned());
        for token in &self.null_values {
            config.null_values.add_pattern(token.clone());
        }
        if let Some(seed) = self.seed {
            config.random_seed = Some(seed);
        }

        config.no_sampling |= self.no_sampling;
        config.drop_incomplete_rows |= self.drop_incomplete;
        config.fail_on_empty |= self.fail_on_empty;
        config.restore_source_order |= self.sort_by_source;

        for spec in &self.ranges {
            config.filters.push(parse_range(spec)?);
        }
        for spec in &self.includes {
            config.filters.push(parse_include(spec)?);
        }

        Ok(config)
    }
}

/// Parse `column:min:max`; the column name may itself contain colons
pub fn parse_range(spec: &str) -> Result<RowFilter> {
    let mut parts = spec.rsplitn(3, ':');
    let (Some(max), Some(min), Some(column)) = (parts.next(), parts.next(), parts.next()) else {
        bail!("range filter '{}' must look like column:min:max", spec);
    };
    if column.is_empty() {
        bail!("range filter '{}' has no column", spec);
    }

    let bound = |text: &str| -> Result<Option<f64>> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }
        text.parse::<f64>()
            .map(Some)
            .with_context(|| format!("range bound '{}' in '{}' is not a number", text, spec))
    };

    let (min, max) = (bound(min)?, bound(max)?);
    if let (Some(lo), Some(hi)) = (min, max) {
        if lo > hi {
            bail!("range filter '{}' has min greater than max", spec);
        }
    }

    Ok(RowFilter::Range {
        column: column.to_string(),
        min,
        max,
    })
}

/// Parse `column=a,b,c`
pub fn parse_include(spec: &str) -> Result<RowFilter> {
    let Some((column, values)) = spec.split_once('=') else {
        bail!("include filter '{}' must look like column=a,b", spec);
    };
    if column.is_empty() {
        bail!("include filter '{}' has no column", spec);
    }

    Ok(RowFilter::Categorical {
        column: column.to_string(),
        values: values
            .split(',')
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .collect(),
    })
}
