//! DuckDB-backed table store
//!
//! Opens a DuckDB database file (or `:memory:`) directly. For PostgreSQL,
//! DuckDB's postgres extension attaches the database read/write and makes it
//! the default catalog, so the same SQL runs against both engines.

use super::types::{Store, WriteMode};
use super::{column_names, quote_ident};
use crate::config::{StoreConfig, StoreEngine};
use crate::error::{Error, Result};
use arrow::array::new_null_array;
use arrow::compute::concat_batches;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use duckdb::vtab::arrow::ArrowVTab;
use duckdb::vtab::arrow_recordbatch_to_query_params;
use duckdb::Connection;
use std::sync::Arc;

/// Catalog alias for an attached PostgreSQL database
const ATTACHED_CATALOG: &str = "vendor_store";

/// Table function that scans an Arrow batch passed as two pointer parameters
const ARROW_SCAN: &str = "arrow";

/// Rows per `arrow(?, ?)` scan
///
/// The scan hands DuckDB the whole batch as a single data chunk, which holds
/// at most one vector (2048 rows).
const SCAN_ROWS: usize = 2048;

/// Table store on a DuckDB connection
pub struct DuckDbStore {
    /// DuckDB connection
    conn: Connection,
    /// Engine type
    engine: StoreEngine,
    /// Connection string used (for logging)
    connection_string: String,
}

impl DuckDbStore {
    /// Open the store described by `config`
    pub fn open(config: &StoreConfig) -> Result<Self> {
        let connection_string = config.connection_string();

        let conn = match config.engine {
            StoreEngine::Duckdb if connection_string != ":memory:" => {
                Connection::open(&connection_string)
            }
            _ => Connection::open_in_memory(),
        }
        .map_err(|e| Error::store(format!("Failed to create DuckDB connection: {e}")))?;

        conn.register_table_function::<ArrowVTab>(ARROW_SCAN)
            .map_err(|e| Error::store(format!("Failed to register arrow scan: {e}")))?;

        let store = Self {
            conn,
            engine: config.engine,
            connection_string,
        };

        if store.engine == StoreEngine::Postgres {
            store.attach_postgres()?;
        }

        tracing::info!(
            "Connected to {} store at {}",
            store.engine,
            store.connection_info()
        );
        Ok(store)
    }

    /// Open a private in-memory DuckDB store
    pub fn open_in_memory() -> Result<Self> {
        Self::open(&StoreConfig::in_memory())
    }

    /// Attach PostgreSQL and make it the default catalog
    fn attach_postgres(&self) -> Result<()> {
        self.conn
            .execute_batch("INSTALL postgres; LOAD postgres;")
            .map_err(|e| Error::store(format!("Failed to load postgres extension: {e}")))?;

        let attach_sql = format!(
            "ATTACH '{}' AS {ATTACHED_CATALOG} (TYPE POSTGRES); USE {ATTACHED_CATALOG};",
            self.connection_string.replace('\'', "''")
        );
        self.conn
            .execute_batch(&attach_sql)
            .map_err(|e| Error::store(format!("Failed to attach PostgreSQL: {e}")))?;

        Ok(())
    }

    /// Underlying connection, for ad-hoc SQL
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Engine type
    pub fn engine(&self) -> StoreEngine {
        self.engine
    }

    /// Column names of `table` in ordinal order (empty when it does not exist)
    pub fn table_columns(&self, table: &str) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT column_name FROM information_schema.columns
             WHERE table_catalog = current_database() AND table_name = ?
             ORDER BY ordinal_position",
        )?;

        let columns = stmt
            .query_map([table], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(columns)
    }

    /// Check whether `table` exists
    pub fn table_exists(&self, table: &str) -> Result<bool> {
        Ok(!self.table_columns(table)?.is_empty())
    }

    /// Number of rows in `table`
    pub fn row_count(&self, table: &str) -> Result<usize> {
        let sql = format!("SELECT COUNT(*) FROM {}", quote_ident(table));
        let count: i64 = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Get connection string (for logging - password masked)
    pub fn connection_info(&self) -> String {
        let conn_str = &self.connection_string;
        let start = conn_str.find("://").map_or(0, |pos| pos + 3);
        if let Some(at_pos) = conn_str[start..].find('@').map(|pos| start + pos) {
            if let Some(colon_pos) = conn_str[start..at_pos].rfind(':').map(|pos| start + pos) {
                let before_pass = &conn_str[..=colon_pos];
                let after_at = &conn_str[at_pos..];
                return format!("{before_pass}****{after_at}");
            }
        }
        conn_str.clone()
    }
}

impl Store for DuckDbStore {
    fn execute_read_query(&self, sql: &str) -> Result<RecordBatch> {
        tracing::debug!("Executing query: {}", sql);

        let mut stmt = self.conn.prepare(sql)?;
        let arrow = stmt.query_arrow([])?;
        let empty_schema = arrow.get_schema();
        let batches: Vec<RecordBatch> = arrow.collect();

        let schema = batches.first().map_or(empty_schema, RecordBatch::schema);
        Ok(concat_batches(&schema, &batches)?)
    }

    fn write_table(&mut self, table: &str, batch: &RecordBatch, mode: WriteMode) -> Result<usize> {
        let quoted = quote_ident(table);
        let columns = column_names(batch);

        if mode == WriteMode::Append {
            let existing = self.table_columns(table)?;
            if existing.is_empty() {
                return Err(Error::TableNotFound {
                    table: table.to_string(),
                });
            }
            if existing != columns {
                return Err(Error::SchemaMismatch {
                    table: table.to_string(),
                    expected: existing.join(", "),
                    actual: columns.join(", "),
                });
            }
        }

        let tx = self.conn.transaction()?;

        if mode == WriteMode::Replace {
            let ddl = create_table_sql(&quoted, batch.schema().as_ref());
            tx.execute_batch(&format!("DROP TABLE IF EXISTS {quoted}; {ddl}"))?;
        }

        let written = insert_batch(&tx, &quoted, batch)?;
        tx.commit()?;

        tracing::debug!("Wrote {written} rows to '{table}' ({mode})");
        Ok(written)
    }
}

/// Build a CREATE TABLE statement from an Arrow schema
fn create_table_sql(quoted_table: &str, schema: &Schema) -> String {
    let columns: Vec<String> = schema
        .fields()
        .iter()
        .map(|field| format!("{} {}", quote_ident(field.name()), sql_type(field.data_type())))
        .collect();
    format!("CREATE TABLE {quoted_table} ({})", columns.join(", "))
}

/// SQL column type for an Arrow type
fn sql_type(data_type: &DataType) -> &'static str {
    match data_type {
        DataType::Boolean => "BOOLEAN",
        DataType::Int8 | DataType::Int16 | DataType::Int32 => "INTEGER",
        DataType::Int64 | DataType::UInt8 | DataType::UInt16 | DataType::UInt32 => "BIGINT",
        DataType::UInt64 => "UBIGINT",
        DataType::Float16 | DataType::Float32 | DataType::Float64 | DataType::Decimal128(..) => {
            "DOUBLE"
        }
        DataType::Date32 | DataType::Date64 => "DATE",
        DataType::Timestamp(..) => "TIMESTAMP",
        _ => "VARCHAR",
    }
}

/// Bulk insert a batch through DuckDB's arrow scan
///
/// `INSERT ... SELECT` keeps this working on an attached catalog, where an
/// appender is not available.
fn insert_batch(conn: &Connection, quoted_table: &str, batch: &RecordBatch) -> Result<usize> {
    if batch.num_rows() == 0 || batch.num_columns() == 0 {
        return Ok(0);
    }

    let batch = with_typed_nulls(batch)?;
    let sql = format!("INSERT INTO {quoted_table} SELECT * FROM {ARROW_SCAN}(?, ?)");
    let mut offset = 0;
    while offset < batch.num_rows() {
        let len = SCAN_ROWS.min(batch.num_rows() - offset);
        let params = arrow_recordbatch_to_query_params(batch.slice(offset, len));
        conn.execute(&sql, params)?;
        offset += len;
    }

    Ok(batch.num_rows())
}

/// Give all-null columns a concrete type
///
/// A column with no values is inferred as `Null`, which the arrow scan
/// rejects. It is created as VARCHAR, so it is sent as Utf8.
fn with_typed_nulls(batch: &RecordBatch) -> Result<RecordBatch> {
    if !batch
        .schema()
        .fields()
        .iter()
        .any(|f| f.data_type() == &DataType::Null)
    {
        return Ok(batch.clone());
    }

    let mut fields = Vec::with_capacity(batch.num_columns());
    let mut columns = Vec::with_capacity(batch.num_columns());
    for (field, column) in batch.schema().fields().iter().zip(batch.columns()) {
        if field.data_type() == &DataType::Null {
            fields.push(Field::new(field.name(), DataType::Utf8, true));
            columns.push(new_null_array(&DataType::Utf8, column.len()));
        } else {
            fields.push(field.as_ref().clone());
            columns.push(column.clone());
        }
    }

    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_info_masks_password() {
        let config = StoreConfig {
            engine: StoreEngine::Postgres,
            connection_string: Some("postgresql://etl:hunter2@db:5433/vendor_db".to_string()),
            ..StoreConfig::default()
        };
        let store = DuckDbStore {
            conn: Connection::open_in_memory().unwrap(),
            engine: config.engine,
            connection_string: config.connection_string(),
        };
        assert_eq!(
            store.connection_info(),
            "postgresql://etl:****@db:5433/vendor_db"
        );
    }

    #[test]
    fn test_connection_info_without_password() {
        let store = DuckDbStore {
            conn: Connection::open_in_memory().unwrap(),
            engine: StoreEngine::Postgres,
            connection_string: "postgresql://etl@db/vendor_db".to_string(),
        };
        assert_eq!(store.connection_info(), "postgresql://etl@db/vendor_db");
    }

    #[test]
    fn test_connection_info_plain_path() {
        let store = DuckDbStore::open_in_memory().unwrap();
        assert_eq!(store.connection_info(), ":memory:");
        assert_eq!(store.engine(), StoreEngine::Duckdb);
    }

    #[test]
    fn test_sql_type_mapping() {
        assert_eq!(sql_type(&DataType::Int64), "BIGINT");
        assert_eq!(sql_type(&DataType::Float64), "DOUBLE");
        assert_eq!(sql_type(&DataType::Utf8), "VARCHAR");
        assert_eq!(sql_type(&DataType::Null), "VARCHAR");
        assert_eq!(sql_type(&DataType::Date32), "DATE");
    }

    #[test]
    fn test_with_typed_nulls() {
        let batch = RecordBatch::try_new(
            Arc::new(Schema::new(vec![
                Field::new("brand", DataType::Int64, true),
                Field::new("approval", DataType::Null, true),
            ])),
            vec![
                Arc::new(arrow::array::Int64Array::from(vec![1, 2])),
                new_null_array(&DataType::Null, 2),
            ],
        )
        .unwrap();

        let typed = with_typed_nulls(&batch).unwrap();
        assert_eq!(typed.schema().field(0).data_type(), &DataType::Int64);
        assert_eq!(typed.schema().field(1).data_type(), &DataType::Utf8);
        assert_eq!(typed.column(1).null_count(), 2);
    }

    #[test]
    fn test_create_table_sql_quotes_identifiers() {
        let schema = Schema::new(vec![
            Field::new("vendor\"no", DataType::Int64, true),
            Field::new("name", DataType::Utf8, true),
        ]);
        assert_eq!(
            create_table_sql("\"t\"", &schema),
            "CREATE TABLE \"t\" (\"vendor\"\"no\" BIGINT, \"name\" VARCHAR)"
        );
    }
}
