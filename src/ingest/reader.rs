//! Chunked CSV reader
//!
//! Two passes over the file: a streaming schema inference pass, then a
//! sequential read yielding batches of at most `chunk_size` rows. Neither
//! pass holds more than one chunk in memory.

use crate::error::{Error, Result};
use crate::naming::column_identifier;
use arrow::csv::reader::Format;
use arrow::csv::ReaderBuilder;
use arrow::datatypes::{Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use regex::Regex;
use std::collections::HashSet;
use std::fs::File;
use std::io::Seek;
use std::path::Path;
use std::sync::Arc;

/// Cell values read as missing: empty plus the usual NA spellings
/// (`NA`, `N/A`, `NULL`, `NaN`, `None`, `#N/A`, ...)
pub const MISSING_VALUE_PATTERN: &str = r"^(|#N/A|#N/A N/A|#NA|-1\.#IND|-1\.#QNAN|-NaN|-nan|1\.#IND|1\.#QNAN|<NA>|N/A|NA|NULL|NaN|None|n/a|nan|null)$";

/// Options controlling how a CSV file is chunked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvOptions {
    /// Maximum rows per chunk
    pub chunk_size: usize,
    /// Field delimiter byte
    pub delimiter: u8,
    /// Rows sampled for type inference (`None` reads the whole file)
    pub infer_schema_rows: Option<usize>,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            chunk_size: 200_000,
            delimiter: b',',
            infer_schema_rows: None,
        }
    }
}

/// Streams a CSV file as normalized-column batches
pub struct CsvChunkReader {
    file_name: String,
    schema: SchemaRef,
    reader: arrow::csv::Reader<File>,
}

impl CsvChunkReader {
    /// Open `path` and infer its schema
    pub fn open(path: &Path, options: &CsvOptions) -> Result<Self> {
        let file_name = path.display().to_string();
        let mut file = File::open(path)?;

        let missing = Regex::new(MISSING_VALUE_PATTERN)
            .map_err(|e| Error::csv(&file_name, e.to_string()))?;
        let format = Format::default()
            .with_header(true)
            .with_delimiter(options.delimiter)
            .with_null_regex(missing);

        let (inferred, _) = format
            .infer_schema(&mut file, options.infer_schema_rows)
            .map_err(|e| Error::csv(&file_name, e.to_string()))?;
        if inferred.fields().is_empty() {
            return Err(Error::csv(&file_name, "missing header row"));
        }
        file.rewind()?;

        let schema = Arc::new(normalize_schema(&inferred)?);
        let reader = ReaderBuilder::new(schema.clone())
            .with_format(format)
            .with_batch_size(options.chunk_size)
            .build(file)
            .map_err(|e| Error::csv(&file_name, e.to_string()))?;

        Ok(Self {
            file_name,
            schema,
            reader,
        })
    }

    /// Schema every chunk carries
    pub fn schema(&self) -> SchemaRef {
        self.schema.clone()
    }

    /// Read the next chunk, `None` at end of file
    pub fn next_chunk(&mut self) -> Result<Option<RecordBatch>> {
        self.reader
            .next()
            .transpose()
            .map_err(|e| Error::csv(&self.file_name, e.to_string()))
    }
}

/// Rename every field with `column_identifier`, rejecting collisions
pub fn normalize_schema(schema: &Schema) -> Result<Schema> {
    let mut seen = HashSet::new();
    let mut fields = Vec::with_capacity(schema.fields().len());

    for field in schema.fields() {
        let name = column_identifier(field.name());
        if !seen.insert(name.clone()) {
            return Err(Error::DuplicateColumn { column: name });
        }
        fields.push(Field::new(name, field.data_type().clone(), true));
    }

    Ok(Schema::new(fields))
}
