use std::io::{Cursor, Read, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use sv_core::{AbortSignal, CellValue, ColumnKind};
use sv_data::sampling::{sampler_rng, ReservoirSampler};
use sv_data::{sample, sample_cancellable, DataError, RowFilter, SampleConfig, Source};

fn numbered(n: usize) -> Source {
    let mut content = String::from("id,value\n");
    for i in 0..n {
        content.push_str(&format!("{},{}\n", i, i % 97));
    }
    Source::reader(Cursor::new(content.into_bytes()))
}

fn record_indices(result: &sv_data::SampleResult) -> Vec<u64> {
    result.rows().iter().map(|r| r.record_index).collect()
}

#[test]
fn test_large_stream_is_bounded_to_capacity() {
    let config = SampleConfig::new().with_max_rows(100).with_chunk_size(64).with_seed(1);
    let result = sample(numbered(5_000), &config).unwrap();

    assert_eq!(result.len(), 100);
    assert_eq!(result.total_rows_seen(), 5_000);
    assert!(result.was_sampled());

    let mut distinct = record_indices(&result);
    distinct.sort_unstable();
    distinct.dedup();
    assert_eq!(distinct.len(), 100);
}

#[test]
fn test_short_stream_keeps_every_row_in_order() {
    let config = SampleConfig::new().with_max_rows(20).with_seed(4);
    let result = sample(numbered(8), &config).unwrap();

    assert_eq!(record_indices(&result), (0..8).collect::<Vec<u64>>());
    assert_eq!(result.total_rows_seen(), 8);
    assert!(!result.was_sampled());
    assert!(result.summary().starts_with("Loaded all 8 rows"));
}

#[test]
fn test_exact_capacity_is_not_sampled() {
    let config = SampleConfig::new().with_max_rows(10).with_seed(4);
    let result = sample(numbered(10), &config).unwrap();
    assert_eq!(result.len(), 10);
    assert!(!result.was_sampled());
}

#[test]
fn test_non_positive_capacity_rejected_before_reading() {
    for bad in [0, -5] {
        let config = SampleConfig::new().with_max_rows(bad);
        let err = sample(Source::path("/no/such/file.csv"), &config).unwrap_err();
        assert!(matches!(err, DataError::InvalidCapacity(v) if v == bad));
    }
}

#[test]
fn test_missing_file() {
    let err = sample(Source::path("/no/such/file.csv"), &SampleConfig::new()).unwrap_err();
    assert!(matches!(err, DataError::SourceNotFound { .. }));
}

#[test]
fn test_fixed_seed_is_reproducible() {
    let config = SampleConfig::new().with_max_rows(50).with_seed(42);
    let a = sample(numbered(2_000), &config).unwrap();
    let b = sample(numbered(2_000), &config).unwrap();
    assert_eq!(record_indices(&a), record_indices(&b));

    let other = sample(numbered(2_000), &config.clone().with_seed(43)).unwrap();
    assert_ne!(record_indices(&a), record_indices(&other));
}

#[test]
fn test_chunk_size_does_not_change_the_sample() {
    let base = SampleConfig::new().with_max_rows(25).with_seed(9);
    let expected = record_indices(&sample(numbered(700), &base.clone().with_chunk_size(1000)).unwrap());

    for chunk in [1, 3, 7] {
        let result = sample(numbered(700), &base.clone().with_chunk_size(chunk)).unwrap();
        assert_eq!(record_indices(&result), expected, "chunk size {}", chunk);
    }
}

#[test]
fn test_matches_reservoir_over_row_indices() {
    let config = SampleConfig::new().with_max_rows(5).with_chunk_size(3).with_seed(21);
    let result = sample(numbered(10), &config).unwrap();

    let mut sampler = ReservoirSampler::new(5, sampler_rng(Some(21))).unwrap();
    for i in 0..10u64 {
        sampler.offer(i);
    }
    let reservoir = sampler.finalize();

    assert_eq!(record_indices(&result), reservoir.items);
    assert_eq!(result.total_rows_seen(), 10);
    assert!(result.was_sampled());
}

#[test]
fn test_no_sampling_keeps_a_million_rows() {
    let mut content = String::with_capacity(8_000_000);
    content.push_str("n\n");
    for i in 0..1_000_000u32 {
        content.push_str(&i.to_string());
        content.push('\n');
    }
    let config = SampleConfig {
        no_sampling: true,
        ..SampleConfig::new().with_max_rows(10)
    };
    let result = sample(Source::reader(Cursor::new(content.into_bytes())), &config).unwrap();

    assert_eq!(result.len(), 1_000_000);
    assert!(!result.was_sampled());
    assert_eq!(result.rows()[999_999].record_index, 999_999);
}

#[test]
fn test_unparseable_values_become_null_and_are_counted() {
    let mut content = String::from("when,amount,label\n");
    for i in 0..50 {
        let amount = if [4, 17, 33].contains(&i) { "n/a?".to_string() } else { format!("{}.5", i) };
        content.push_str(&format!("2024-02-{:02},{},row{}\n", i % 28 + 1, amount, i));
    }
    let config = SampleConfig {
        value_columns: vec!["amount".to_string()],
        datetime_columns: vec!["when".to_string()],
        ..SampleConfig::new().with_seed(1)
    };
    let result = sample(Source::reader(Cursor::new(content.into_bytes())), &config).unwrap();

    assert_eq!(result.len(), 50);
    assert_eq!(result.coercion_failures().get("amount"), Some(&3));
    assert_eq!(result.coercion_failures().get("when"), Some(&0));
    assert!(result.coercion_failures().get("label").is_none());

    let amounts = result.column_values("amount").unwrap();
    assert_eq!(amounts.iter().filter(|v| v.is_null()).count(), 3);
    assert_eq!(amounts[5], &CellValue::Number(5.5));
    assert_eq!(result.columns()[0].kind, ColumnKind::Temporal);
    assert!(matches!(result.rows()[0].cells[0], CellValue::Timestamp(_)));
}

#[test]
fn test_filters_only_see_sampled_rows() {
    // Exactly one row in the file matches; a small reservoir will almost
    // always miss it.
    let mut content = String::from("id,kind\n");
    for i in 0..10_000 {
        content.push_str(&format!("{},{}\n", i, if i == 6_000 { "rare" } else { "common" }));
    }
    let config = SampleConfig {
        filters: vec![RowFilter::Categorical {
            column: "kind".to_string(),
            values: vec!["rare".to_string()],
        }],
        ..SampleConfig::new().with_max_rows(10).with_seed(2)
    };

    let result = sample(Source::reader(Cursor::new(content.clone().into_bytes())), &config).unwrap();
    assert_eq!(result.rows_before_filter(), 10);
    assert!(result.len() <= 1);

    let full = SampleConfig { no_sampling: true, ..config };
    let result = sample(Source::reader(Cursor::new(content.into_bytes())), &full).unwrap();
    assert_eq!(record_indices(&result), vec![6_000]);
}

#[test]
fn test_unknown_filter_column_is_fatal() {
    let config = SampleConfig {
        filters: vec![RowFilter::Range { column: "missing".to_string(), min: None, max: Some(1.0) }],
        ..SampleConfig::default()
    };
    let err = sample(numbered(5), &config).unwrap_err();
    assert!(matches!(err, DataError::ColumnNotFound { ref column, role: "filters" } if column == "missing"));
}

#[test]
fn test_malformed_rows_are_skipped_without_advancing_the_count() {
    let content = "a,b\n1,2\n3\n4,5\n6,7,8\n9,10\n";
    let result = sample(
        Source::reader(Cursor::new(content.as_bytes().to_vec())),
        &SampleConfig::new().with_seed(1),
    )
    .unwrap();

    assert_eq!(result.len(), 3);
    assert_eq!(result.total_rows_seen(), 3);
    assert_eq!(result.malformed_rows(), 2);
    assert_eq!(record_indices(&result), vec![0, 2, 4]);
}

#[test]
fn test_semicolon_file_on_disk() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "date;price").unwrap();
    for day in 1..=31 {
        writeln!(file, "2024-03-{:02};{},{}", day, day, 25).unwrap();
    }
    file.flush().unwrap();

    let config = SampleConfig {
        delimiter: ';',
        datetime_columns: vec!["date".to_string()],
        ..SampleConfig::new().with_max_rows(10).with_seed(8)
    };
    let result = sample(file.path(), &config).unwrap();

    assert_eq!(result.len(), 10);
    assert_eq!(result.total_rows_seen(), 31);
    assert_eq!(result.column_values("price").unwrap().len(), 10);
    assert!(result.rows().iter().all(|r| matches!(r.cells[0], CellValue::Timestamp(_))));
}

#[test]
fn test_abort_before_first_batch_returns_empty_partial_sample() {
    let abort = AbortSignal::new();
    let config = SampleConfig::new().with_max_rows(5).with_chunk_size(10);

    // Raised from a second handle; clones share the flag
    let handle = abort.clone();
    handle.abort();

    let outcome = sample_cancellable(numbered(100), &config, sampler_rng(Some(3)), &abort).unwrap();
    assert!(outcome.is_interrupted());

    let sv_data::SampleOutcome::Interrupted(partial) = outcome else {
        unreachable!();
    };
    assert_eq!(partial.rows_seen(), 0);
    let result = partial.acknowledge_partial();
    assert!(result.interrupted());
    assert!(result.is_empty());
}

#[test]
fn test_chart_requirements_checked_up_front() {
    let config = SampleConfig {
        chart: Some(sv_data::ChartKind::Line),
        value_columns: vec!["value".to_string()],
        ..SampleConfig::default()
    };
    let err = sample(Source::path("/no/such/file.csv"), &config).unwrap_err();
    assert!(matches!(err, DataError::InvalidConfig(_)));
}

/// Byte stream that raises an abort once `limit` bytes have been handed out
struct AbortingReader {
    inner: Cursor<Vec<u8>>,
    limit: usize,
    bytes_read: Arc<AtomicUsize>,
    signal: AbortSignal,
}

impl Read for AbortingReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.inner.read(buf)?;
        let total = self.bytes_read.fetch_add(n, Ordering::SeqCst) + n;
        if total >= self.limit {
            self.signal.abort();
        }
        Ok(n)
    }
}

fn aborting_source(rows: usize, limit: usize) -> (Source, AbortSignal, Arc<AtomicUsize>, usize) {
    let mut content = String::from("id,value\n");
    for i in 0..rows {
        content.push_str(&format!("{},{}\n", i, i % 97));
    }
    let len = content.len();
    let signal = AbortSignal::new();
    let bytes_read = Arc::new(AtomicUsize::new(0));
    let reader = AbortingReader {
        inner: Cursor::new(content.into_bytes()),
        limit,
        bytes_read: bytes_read.clone(),
        signal: signal.clone(),
    };
    (Source::reader(reader), signal, bytes_read, len)
}

#[test]
fn test_abort_between_batches_keeps_a_flagged_partial_reservoir() {
    let config = SampleConfig::new().with_max_rows(50).with_chunk_size(100);
    let (source, signal, bytes_read, len) = aborting_source(10_000, 20_000);

    let outcome = sample_cancellable(source, &config, sampler_rng(Some(5)), &signal).unwrap();
    assert!(outcome.is_interrupted());
    assert!(bytes_read.load(Ordering::SeqCst) < len);

    let sv_data::SampleOutcome::Interrupted(partial) = outcome else {
        unreachable!();
    };
    let seen = partial.rows_seen();
    assert!(seen > 50 && seen < 10_000, "stopped after {} rows", seen);
    // The flag is only looked at between batches
    assert_eq!(seen % 100, 0);

    let result = partial.acknowledge_partial();
    assert!(result.interrupted());
    assert!(result.was_sampled());
    assert_eq!(result.len(), 50);
    assert_eq!(result.total_rows_seen(), seen);
    assert!(record_indices(&result).iter().all(|&idx| idx < seen));
    assert!(result.summary().contains("interrupted before the end of the file"));
}

#[test]
fn test_unacknowledged_abort_is_an_error() {
    let config = SampleConfig::new().with_max_rows(50).with_chunk_size(100);
    let (source, signal, _, _) = aborting_source(10_000, 20_000);

    let err = sample_cancellable(source, &config, sampler_rng(Some(5)), &signal)
        .unwrap()
        .into_complete()
        .unwrap_err();
    assert!(matches!(err, DataError::Interrupted { rows_seen } if rows_seen > 0 && rows_seen < 10_000));
}

#[test]
fn test_include_filter_matches_file_text_of_typed_columns() {
    let content = "price,day\n2.50,2024-01-15\n10.00,2024-01-16\n3,2024-01-17\n";
    let config = SampleConfig {
        value_columns: vec!["price".to_string()],
        datetime_columns: vec!["day".to_string()],
        filters: vec![RowFilter::Categorical {
            column: "price".to_string(),
            values: vec!["2.50".to_string(), "10.00".to_string()],
        }],
        ..SampleConfig::new().with_seed(1)
    };
    let result = sample(Source::reader(Cursor::new(content.as_bytes().to_vec())), &config).unwrap();
    assert_eq!(record_indices(&result), vec![0, 1]);

    let by_day = SampleConfig {
        filters: vec![RowFilter::Categorical {
            column: "day".to_string(),
            values: vec!["2024-01-15".to_string()],
        }],
        ..config
    };
    let result = sample(Source::reader(Cursor::new(content.as_bytes().to_vec())), &by_day).unwrap();
    assert_eq!(record_indices(&result), vec![0]);
}
