//! CSV parsing and serialization for review tables.
//!
//! Input is read whole into a single `RecordBatch` with a header row and an
//! inferred schema. Output is UTF-8 CSV with a header row and no index column.
//!
//! The usual spreadsheet/pandas missing-value markers (`NA`, `N/A`, `null`,
//! `NaN`, `None`, ...) read as null, the same as an empty field.

use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use arrow::compute::concat_batches;
use arrow::csv::reader::Format;
use arrow::csv::{ReaderBuilder, WriterBuilder};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;
use regex::Regex;
use tracing::{debug, info, warn};

use crate::StoreError;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Whole-field values treated as missing.
const NULL_PATTERN: &str = r"^(?:|#N/A|#N/A N/A|#NA|-1\.#IND|-1\.#QNAN|-NaN|-nan|1\.#IND|1\.#QNAN|<NA>|N/A|NA|NULL|NaN|None|n/a|nan|null)$";

/// Parse a CSV byte stream into a single RecordBatch.
///
/// The whole stream is scanned for schema inference. When a value does not
/// fit the type inferred for its column (`2023-02-30` in a date column), the
/// stream is re-read with every column as `Utf8`. Input that is empty (or
/// only whitespace) yields a batch with no columns and no rows. Ragged rows,
/// bad quoting and invalid UTF-8 are reported as [`StoreError::MalformedInput`].
pub fn parse_csv(bytes: &[u8]) -> Result<RecordBatch, StoreError> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    if bytes.iter().all(u8::is_ascii_whitespace) {
        debug!("empty csv input");
        return Ok(RecordBatch::new_empty(Arc::new(Schema::empty())));
    }

    let null_regex = Regex::new(NULL_PATTERN)
        .map_err(|e| StoreError::MalformedInput(format!("null marker pattern: {e}")))?;
    let format = Format::default()
        .with_header(true)
        .with_null_regex(null_regex);
    let (schema, records) = format
        .infer_schema(Cursor::new(bytes), None)
        .map_err(malformed)?;
    let schema = Arc::new(schema);
    debug!(records, fields = schema.fields().len(), "inferred csv schema");

    let batch = match read_with_schema(bytes, &format, schema.clone()) {
        Ok(batch) => batch,
        Err(ArrowError::ParseError(reason)) => {
            warn!(%reason, "value does not fit inferred column type; reading every column as text");
            read_with_schema(bytes, &format, text_schema(&schema)).map_err(malformed)?
        }
        Err(err) => return Err(malformed(err)),
    };

    info!(
        rows = batch.num_rows(),
        columns = batch.num_columns(),
        "parsed csv"
    );
    Ok(batch)
}

fn read_with_schema(
    bytes: &[u8],
    format: &Format,
    schema: SchemaRef,
) -> Result<RecordBatch, ArrowError> {
    let reader = ReaderBuilder::new(schema.clone())
        .with_format(format.clone())
        .build(Cursor::new(bytes))?;
    let batches = reader.collect::<Result<Vec<_>, _>>()?;
    concat_batches(&schema, &batches)
}

/// Same column names, every column nullable `Utf8`.
fn text_schema(schema: &Schema) -> SchemaRef {
    let fields: Vec<Field> = schema
        .fields()
        .iter()
        .map(|f| Field::new(f.name(), DataType::Utf8, true))
        .collect();
    Arc::new(Schema::new_with_metadata(fields, schema.metadata().clone()))
}

/// Read and parse a CSV file.
pub fn read_csv(path: &Path) -> Result<RecordBatch, StoreError> {
    if !path.exists() {
        return Err(StoreError::FileNotFound(path.to_path_buf()));
    }
    let bytes = std::fs::read(path)?;
    parse_csv(&bytes)
}

/// Serialize a RecordBatch as UTF-8 CSV with a header row.
pub fn serialize_csv(batch: &RecordBatch) -> Result<Vec<u8>, StoreError> {
    let mut buf = Vec::new();
    {
        let mut writer = WriterBuilder::new().with_header(true).build(&mut buf);
        writer.write(batch)?;
    }
    debug!(rows = batch.num_rows(), bytes = buf.len(), "serialized csv");
    Ok(buf)
}

/// Serialize a RecordBatch and write it to `path`, replacing any existing file.
pub fn write_csv(path: &Path, batch: &RecordBatch) -> Result<(), StoreError> {
    let bytes = serialize_csv(batch)?;
    std::fs::write(path, bytes)?;
    info!(path = %path.display(), rows = batch.num_rows(), "wrote csv");
    Ok(())
}

fn malformed(err: ArrowError) -> StoreError {
    StoreError::MalformedInput(err.to_string())
}
