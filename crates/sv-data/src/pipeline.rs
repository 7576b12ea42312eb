//! The sampling pass: source → reservoir → coercion → filter → result

use std::time::Instant;

use rand::Rng;
use tracing::{debug, info};

use sv_core::{AbortSignal, ColumnSchema, Row};

use crate::coercion::{coerce_rows, column_kinds, TemporalParser};
use crate::config::SampleConfig;
use crate::filter::apply_filters;
use crate::result::{ColumnInfo, ResultParts, SampleResult};
use crate::sampling::{sampler_rng, Reservoir, ReservoirSampler, RowSink};
use crate::sources::{CsvBatchReader, Source};
use crate::DataError;

/// How a cancellable pass ended
#[derive(Debug)]
pub enum SampleOutcome {
    /// The source was read to the end
    Complete(SampleResult),
    /// An abort was requested before the end of the source
    Interrupted(InterruptedSample),
}

impl SampleOutcome {
    /// The complete result, treating an interrupted pass as an error
    pub fn into_complete(self) -> Result<SampleResult, DataError> {
        match self {
            SampleOutcome::Complete(result) => Ok(result),
            SampleOutcome::Interrupted(partial) => Err(DataError::Interrupted {
                rows_seen: partial.rows_seen(),
            }),
        }
    }

    pub fn is_interrupted(&self) -> bool {
        matches!(self, SampleOutcome::Interrupted(_))
    }
}

/// Result of a pass that stopped early.
///
/// The rows are only reachable through [`InterruptedSample::acknowledge_partial`],
/// which marks the returned result as interrupted.
#[derive(Debug)]
pub struct InterruptedSample {
    result: SampleResult,
}

impl InterruptedSample {
    /// Valid rows offered to the sampler before the pass stopped
    pub fn rows_seen(&self) -> u64 {
        self.result.total_rows_seen()
    }

    /// Accept the partial sample
    pub fn acknowledge_partial(self) -> SampleResult {
        self.result
    }
}

/// Sample a source with the random source described by the configuration
pub fn sample(source: impl Into<Source>, config: &SampleConfig) -> Result<SampleResult, DataError> {
    sample_with_rng(source, config, sampler_rng(config.random_seed))
}

/// Sample a source with a caller-supplied random source
pub fn sample_with_rng<R: Rng>(
    source: impl Into<Source>,
    config: &SampleConfig,
    rng: R,
) -> Result<SampleResult, DataError> {
    sample_cancellable(source, config, rng, &AbortSignal::new())?.into_complete()
}

/// Sample a source, checking `abort` between batches
pub fn sample_cancellable<R: Rng>(
    source: impl Into<Source>,
    config: &SampleConfig,
    rng: R,
    abort: &AbortSignal,
) -> Result<SampleOutcome, DataError> {
    let start = Instant::now();
    config.validate()?;
    let capacity = config.capacity()?;

    let mut reader = CsvBatchReader::open(source.into(), config)?;
    let schema = reader.schema().clone();
    check_columns(&schema, config)?;

    let mut sink: RowSink<Row, R> = match capacity {
        Some(k) => RowSink::Reservoir(ReservoirSampler::new(k, rng)?),
        None => RowSink::All(Vec::new()),
    };

    let required: Vec<usize> = if config.drop_incomplete_rows {
        config
            .chart_columns()
            .iter()
            .filter_map(|name| schema.position(name))
            .collect()
    } else {
        Vec::new()
    };

    let mut incomplete_rows_dropped = 0u64;
    let mut interrupted = false;

    loop {
        if abort.is_aborted() {
            info!("Abort requested after {} rows; stopping", sink.seen());
            reader.close();
            interrupted = true;
            break;
        }

        let Some(batch) = reader.next_batch()? else {
            break;
        };

        for row in batch {
            if required
                .iter()
                .any(|&idx| config.null_values.is_null(&row.fields[idx]))
            {
                incomplete_rows_dropped += 1;
                continue;
            }
            sink.offer(row);
        }
        debug!("Offered {} rows so far", sink.seen());
    }

    let Reservoir { items, total_seen, was_sampled } = sink.finalize();

    let kinds = column_kinds(&schema, config);
    let parser = TemporalParser::new(config.datetime_formats.clone());
    let table = coerce_rows(&schema, &kinds, items, &parser, &config.null_values);

    let columns: Vec<ColumnInfo> = schema
        .names()
        .iter()
        .zip(kinds)
        .map(|(name, kind)| ColumnInfo { name: name.clone(), kind })
        .collect();

    let rows_before_filter = table.rows.len();
    let mut rows = apply_filters(&columns, table.rows, &config.filters, &parser)?;

    if config.restore_source_order {
        rows.sort_by_key(|row| row.record_index);
    }

    if rows.is_empty() && config.fail_on_empty && !interrupted {
        return Err(DataError::EmptyResult);
    }

    info!(
        "Sampling finished in {:?}: {} rows seen, {} kept, {} after filters, {} malformed",
        start.elapsed(),
        total_seen,
        rows_before_filter,
        rows.len(),
        reader.malformed_rows()
    );

    let result = SampleResult::from_parts(ResultParts {
        columns,
        rows,
        total_rows_seen: total_seen,
        was_sampled,
        coercion_failures: table.failures,
        malformed_rows: reader.malformed_rows(),
        incomplete_rows_dropped,
        rows_before_filter,
        interrupted,
    });

    if interrupted {
        Ok(SampleOutcome::Interrupted(InterruptedSample { result }))
    } else {
        Ok(SampleOutcome::Complete(result))
    }
}

/// Run a pass on tokio's blocking pool.
///
/// Each call builds its own reader, sampler, and random source, so concurrent
/// passes share no mutable state.
pub async fn sample_async(source: Source, config: SampleConfig) -> Result<SampleResult, DataError> {
    tokio::task::spawn_blocking(move || sample(source, &config)).await?
}

/// Every configured column must exist in the header
fn check_columns(schema: &ColumnSchema, config: &SampleConfig) -> Result<(), DataError> {
    for (column, role) in config.referenced_columns() {
        if !schema.contains(column) {
            return Err(DataError::ColumnNotFound {
                column: column.to_string(),
                role,
            });
        }
    }
    Ok(())
}
