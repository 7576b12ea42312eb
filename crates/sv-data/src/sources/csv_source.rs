use std::fs::File;
use std::io::{BufReader, ErrorKind, Read};
use std::sync::Arc;

use csv::{ByteRecord, ReaderBuilder};
use encoding_rs::{Encoding, UTF_8};
use tracing::{debug, info, warn};

use sv_core::{ColumnSchema, Row};

use crate::config::SampleConfig;
use crate::DataError;

use super::{resolve_encoding, Source};

/// Malformed records reported one by one before switching to a summary
const MALFORMED_LOG_LIMIT: u64 = 5;

/// Streaming reader that yields fixed-size batches of raw rows.
///
/// The header is consumed on open to build the schema. Batches hold at most
/// `chunk_size` rows; records whose field count disagrees with the header are
/// skipped and counted. The underlying handle is dropped as soon as the input
/// is exhausted or a fatal error occurs, and the iterator yields nothing after
/// that.
pub struct CsvBatchReader {
    /// Underlying CSV reader, `None` once the pass is over
    reader: Option<csv::Reader<Box<dyn Read + Send>>>,

    /// Schema taken from the header line
    schema: Arc<ColumnSchema>,

    /// Declared text encoding
    encoding: &'static Encoding,

    /// Rows per batch
    chunk_size: usize,

    /// Reusable record buffer
    record: ByteRecord,

    /// Data records read so far, malformed ones included
    records_read: u64,

    /// Records skipped because of a field count mismatch
    malformed_rows: u64,

    /// Name used in logs
    source_name: String,
}

impl CsvBatchReader {
    /// Open a source and read its header
    pub fn open(source: Source, config: &SampleConfig) -> Result<Self, DataError> {
        let delimiter = config.delimiter_byte()?;
        let encoding = resolve_encoding(&config.encoding)?;
        if config.chunk_size == 0 {
            return Err(DataError::InvalidConfig("chunk_size must be a positive integer".to_string()));
        }

        let source_name = source.display_name();
        let input: Box<dyn Read + Send> = match source {
            Source::Path(path) => {
                let file = File::open(&path).map_err(|e| match e.kind() {
                    ErrorKind::NotFound => DataError::SourceNotFound { path: path.clone() },
                    _ => DataError::Io(e),
                })?;
                Box::new(BufReader::new(file))
            }
            Source::Reader(reader) => reader,
        };

        let mut csv_reader = ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .flexible(true)
            .from_reader(input);

        let header_record = csv_reader.byte_headers()?.clone();
        if header_record.is_empty() {
            return Err(DataError::EmptySource);
        }

        let mut headers = Vec::with_capacity(header_record.len());
        for (idx, field) in header_record.iter().enumerate() {
            let name = decode_field(field, encoding).ok_or(DataError::Encoding {
                line: 1,
                encoding: encoding.name(),
            })?;
            let name = if idx == 0 {
                name.trim_start_matches('\u{feff}').to_string()
            } else {
                name
            };
            headers.push(name);
        }
        let schema = ColumnSchema::from_headers(headers);

        info!(
            "Opened {} ({} columns, encoding {}, chunk size {})",
            source_name,
            schema.len(),
            encoding.name(),
            config.chunk_size
        );

        Ok(Self {
            reader: Some(csv_reader),
            schema: Arc::new(schema),
            encoding,
            chunk_size: config.chunk_size,
            record: ByteRecord::new(),
            records_read: 0,
            malformed_rows: 0,
            source_name,
        })
    }

    /// Schema taken from the header line
    pub fn schema(&self) -> &Arc<ColumnSchema> {
        &self.schema
    }

    /// Records skipped so far because of a field count mismatch
    pub fn malformed_rows(&self) -> u64 {
        self.malformed_rows
    }

    /// Data records read so far, malformed ones included
    pub fn records_read(&self) -> u64 {
        self.records_read
    }

    /// Whether the underlying handle has been released
    pub fn is_finished(&self) -> bool {
        self.reader.is_none()
    }

    /// Release the underlying handle without reading further
    pub fn close(&mut self) {
        if self.reader.take().is_some() {
            debug!("Closed {} after {} records", self.source_name, self.records_read);
        }
    }

    /// Read the next batch, or `None` once the input is exhausted
    pub fn next_batch(&mut self) -> Result<Option<Vec<Row>>, DataError> {
        let Some(reader) = self.reader.as_mut() else {
            return Ok(None);
        };

        let mut batch = Vec::with_capacity(self.chunk_size.min(4096));
        let mut exhausted = false;
        let mut failure = None;

        while batch.len() < self.chunk_size {
            match reader.read_byte_record(&mut self.record) {
                Ok(true) => {}
                Ok(false) => {
                    exhausted = true;
                    break;
                }
                Err(e) => {
                    failure = Some(DataError::from(e));
                    break;
                }
            }

            let record_index = self.records_read;
            self.records_read += 1;
            let line = self.record.position().map(|p| p.line()).unwrap_or(0);

            if self.record.len() != self.schema.len() {
                self.malformed_rows += 1;
                if self.malformed_rows <= MALFORMED_LOG_LIMIT {
                    warn!(
                        "Skipping malformed row at line {}: expected {} fields, found {}",
                        line,
                        self.schema.len(),
                        self.record.len()
                    );
                }
                continue;
            }

            let mut fields = Vec::with_capacity(self.record.len());
            for field in self.record.iter() {
                match decode_field(field, self.encoding) {
                    Some(value) => fields.push(value),
                    None => {
                        failure = Some(DataError::Encoding {
                            line,
                            encoding: self.encoding.name(),
                        });
                        break;
                    }
                }
            }
            if failure.is_some() {
                break;
            }

            batch.push(Row::new(record_index, fields));
        }

        if let Some(error) = failure {
            self.close();
            return Err(error);
        }

        if exhausted {
            if self.malformed_rows > MALFORMED_LOG_LIMIT {
                warn!(
                    "{} malformed rows skipped in {}",
                    self.malformed_rows, self.source_name
                );
            }
            self.close();
        }

        debug!("Read batch of {} rows from {}", batch.len(), self.source_name);

        if batch.is_empty() {
            Ok(None)
        } else {
            Ok(Some(batch))
        }
    }
}

impl Iterator for CsvBatchReader {
    type Item = Result<Vec<Row>, DataError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_batch().transpose()
    }
}

/// Strictly decode one field, `None` if the bytes are invalid in `encoding`
fn decode_field(bytes: &[u8], encoding: &'static Encoding) -> Option<String> {
    if encoding == UTF_8 {
        return std::str::from_utf8(bytes).ok().map(|s| s.to_string());
    }
    encoding
        .decode_without_bom_handling_and_without_replacement(bytes)
        .map(|s| s.into_owned())
}
