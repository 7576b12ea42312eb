//! Conversion of a sample into the formats chart builders consume

use std::io::Write;
use std::sync::Arc;

use arrow::array::*;
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;

use sv_core::{CellValue, ColumnKind};

use crate::result::SampleResult;
use crate::DataError;

impl SampleResult {
    /// Arrow schema matching the result columns
    pub fn arrow_schema(&self) -> Schema {
        let fields = self
            .columns()
            .iter()
            .map(|column| {
                let data_type = match column.kind {
                    ColumnKind::Numeric => DataType::Float64,
                    ColumnKind::Temporal => DataType::Timestamp(TimeUnit::Millisecond, None),
                    ColumnKind::Text => DataType::Utf8,
                };
                Field::new(&column.name, data_type, true)
            })
            .collect::<Vec<_>>();
        Schema::new(fields)
    }

    /// Build an arrow record batch from the sampled rows
    pub fn to_record_batch(&self) -> Result<RecordBatch, DataError> {
        let schema = Arc::new(self.arrow_schema());
        let mut columns: Vec<ArrayRef> = Vec::with_capacity(self.columns().len());

        for (col_idx, column) in self.columns().iter().enumerate() {
            let cells = self.rows().iter().map(|row| row.cells.get(col_idx));

            let array: ArrayRef = match column.kind {
                ColumnKind::Numeric => {
                    let mut builder = Float64Builder::with_capacity(self.len());
                    for cell in cells {
                        builder.append_option(cell.and_then(CellValue::as_f64));
                    }
                    Arc::new(builder.finish())
                }
                ColumnKind::Temporal => {
                    let mut builder = TimestampMillisecondBuilder::with_capacity(self.len());
                    for cell in cells {
                        builder.append_option(
                            cell.and_then(CellValue::as_timestamp)
                                .map(|ts| ts.and_utc().timestamp_millis()),
                        );
                    }
                    Arc::new(builder.finish())
                }
                ColumnKind::Text => {
                    let mut builder = StringBuilder::new();
                    for cell in cells {
                        match cell {
                            Some(CellValue::Null) | None => builder.append_null(),
                            Some(value) => builder.append_value(value.to_string()),
                        }
                    }
                    Arc::new(builder.finish())
                }
            };

            columns.push(array);
        }

        RecordBatch::try_new(schema, columns).map_err(|e| e.into())
    }

    /// Write the rows as delimited text with a header line
    pub fn write_csv<W: Write>(&self, writer: W, delimiter: u8) -> Result<(), DataError> {
        let mut csv_writer = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .from_writer(writer);

        csv_writer.write_record(self.columns().iter().map(|c| c.name.as_str()))?;
        for row in self.rows() {
            csv_writer.write_record(row.cells.iter().map(|cell| cell.to_string()))?;
        }
        csv_writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::{CoercedRow, ColumnInfo, ResultParts};
    use arrow::array::Array;
    use chrono::NaiveDate;

    fn sample() -> SampleResult {
        let ts = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap().and_hms_opt(0, 0, 0).unwrap();
        SampleResult::from_parts(ResultParts {
            columns: vec![
                ColumnInfo { name: "Date".to_string(), kind: ColumnKind::Temporal },
                ColumnInfo { name: "Sales".to_string(), kind: ColumnKind::Numeric },
                ColumnInfo { name: "Note".to_string(), kind: ColumnKind::Text },
            ],
            rows: vec![
                CoercedRow::new(0, vec![CellValue::Timestamp(ts), CellValue::Number(1.5), CellValue::Text("a, b".into())]),
                CoercedRow::new(1, vec![CellValue::Null, CellValue::Null, CellValue::Null]),
            ],
            total_rows_seen: 2,
            rows_before_filter: 2,
            ..ResultParts::default()
        })
    }

    #[test]
    fn test_record_batch_types_and_nulls() {
        let batch = sample().to_record_batch().unwrap();
        assert_eq!(batch.num_rows(), 2);
        assert_eq!(batch.num_columns(), 3);
        assert_eq!(batch.schema().field(1).data_type(), &DataType::Float64);

        let dates = batch.column(0).as_any().downcast_ref::<TimestampMillisecondArray>().unwrap();
        assert_eq!(dates.value(0), 1_704_153_600_000);
        assert!(dates.is_null(1));

        let sales = batch.column(1).as_any().downcast_ref::<Float64Array>().unwrap();
        assert_eq!(sales.value(0), 1.5);
        assert!(sales.is_null(1));

        let notes = batch.column(2).as_any().downcast_ref::<StringArray>().unwrap();
        assert_eq!(notes.value(0), "a, b");
        assert!(notes.is_null(1));
    }

    #[test]
    fn test_write_csv_quotes_fields() {
        let mut out = Vec::new();
        sample().write_csv(&mut out, b',').unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "Date,Sales,Note\n2024-01-02 00:00:00,1.5,\"a, b\"\n,,\n");
    }
}
