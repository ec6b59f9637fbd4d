//! End-to-end pipeline tests
//!
//! Source CSVs are written to a temp directory, ingested into DuckDB and
//! summarized, the way the two binaries run back to back.

use pretty_assertions::assert_eq;
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use vendor_etl::config::{PipelineConfig, StoreConfig};
use vendor_etl::ingest::{IngestStatus, Ingestor};
use vendor_etl::store::{DuckDbStore, Store};
use vendor_etl::summary::{clean_data, Summarizer, VendorBrandRecord, SUMMARY_COLUMNS};

const PURCHASES: &str = "\
InventoryId,Store,Brand,Description,Size,VendorNumber,VendorName,PONumber,PODate,ReceivingDate,InvoiceDate,PayDate,PurchasePrice,Quantity,Dollars,Classification
1_HARDERSFIELD_58,1,58,Gekkeikan Black & Gold Sake,750mL,12546,JIM BEAM BRANDS COMPANY   ,8124,2023-12-21,2024-01-02,2024-01-04,2024-02-16,9.28,6,55.68,1
1_HARDERSFIELD_58,1,58,Gekkeikan Black & Gold Sake,750mL,12546,JIM BEAM BRANDS COMPANY   ,8125,2023-12-22,2024-01-03,2024-01-05,2024-02-17,9.28,4,37.12,1
1_HARDERSFIELD_62,1,62,Herradura Silver Tequila,750mL,3960,DIAGEO NORTH AMERICA INC,8169,2023-12-22,2024-01-03,2024-01-05,2024-02-17,28.67,10,286.70,1
1_HARDERSFIELD_63,1,63,Herradura Reposado Tequila,750mL,3960,DIAGEO NORTH AMERICA INC,8169,2023-12-22,2024-01-03,2024-01-05,2024-02-17,0.00,5,0.00,1
1_HARDERSFIELD_77,1,77,Three Olives Espresso Vodka,1.75L,17035,PERNOD RICARD USA,8200,2023-12-23,2024-01-04,2024-01-06,2024-02-18,12.45,2,24.90,1
";

const PURCHASE_PRICES: &str = "\
Brand,Description,Price,Size,Volume,Classification,PurchasePrice,VendorNumber,VendorName
58,Gekkeikan Black & Gold Sake,12.99,750mL,750,1,9.28,12546,JIM BEAM BRANDS COMPANY
62,Herradura Silver Tequila,36.99,750mL,750,1,28.67,3960,DIAGEO NORTH AMERICA INC
63,Herradura Reposado Tequila,38.99,750mL,750,1,30.46,3960,DIAGEO NORTH AMERICA INC
77,Three Olives Espresso Vodka,17.99,1.75L,Unknown,1,12.45,17035,PERNOD RICARD USA
";

const VENDOR_INVOICE: &str = "\
VendorNumber,VendorName,InvoiceDate,PONumber,PODate,PayDate,Quantity,Dollars,Freight,Approval
12546,JIM BEAM BRANDS COMPANY,2024-01-04,8124,2023-12-21,2024-02-16,6,55.68,1.57,None
12546,JIM BEAM BRANDS COMPANY,2024-01-05,8125,2023-12-22,2024-02-17,4,37.12,0.93,None
3960,DIAGEO NORTH AMERICA INC,2024-01-05,8169,2023-12-22,2024-02-17,15,286.70,8.50,None
";

const SALES: &str = "\
InventoryId,Store,Brand,Description,Size,SalesQuantity,SalesDollars,SalesPrice,SalesDate,Volume,Classification,ExciseTax,VendorNo,VendorName
1_HARDERSFIELD_58,1,58,Gekkeikan Black & Gold Sake,750mL,5,64.95,12.99,2024-01-01,750,1,0.79,12546,JIM BEAM BRANDS COMPANY
1_HARDERSFIELD_58,1,58,Gekkeikan Black & Gold Sake,750mL,3,38.97,12.99,2024-01-02,750,1,0.47,12546,JIM BEAM BRANDS COMPANY
1_HARDERSFIELD_62,1,62,Herradura Silver Tequila,750mL,0,0.00,36.99,2024-01-02,750,1,0.00,3960,DIAGEO NORTH AMERICA INC
";

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-6,
        "expected {expected}, got {actual}"
    );
}

fn write_sources(dir: &Path) {
    std::fs::write(dir.join("purchases.csv"), PURCHASES).unwrap();
    std::fs::write(dir.join("purchase_prices.csv"), PURCHASE_PRICES).unwrap();
    std::fs::write(dir.join("vendor_invoice.csv"), VENDOR_INVOICE).unwrap();
    std::fs::write(dir.join("sales.csv"), SALES).unwrap();
}

fn test_config(source_dir: &Path) -> PipelineConfig {
    PipelineConfig {
        source_dir: source_dir.to_path_buf(),
        chunk_size: 2,
        summary_batch_size: 2,
        store: StoreConfig::in_memory(),
        ..PipelineConfig::default()
    }
}

fn read_summary(store: &DuckDbStore) -> Vec<VendorBrandRecord> {
    let batch = store
        .execute_read_query(r#"SELECT * FROM "summary_table""#)
        .unwrap();
    clean_data(&batch).unwrap()
}

fn run_pipeline(config: &PipelineConfig, store: &mut DuckDbStore) {
    let report = Ingestor::new(config.clone()).unwrap().run(store).unwrap();
    assert_eq!(report.status, IngestStatus::Completed);
    Summarizer::new(config.clone()).unwrap().run(store).unwrap();
}

// ============================================================================
// Full Pipeline
// ============================================================================

#[test]
fn test_full_pipeline() {
    let dir = TempDir::new().unwrap();
    write_sources(dir.path());
    let config = test_config(dir.path());
    let mut store = DuckDbStore::open(&config.store).unwrap();

    let report = Ingestor::new(config.clone()).unwrap().run(&mut store).unwrap();
    assert_eq!(report.loaded().count(), 4);
    assert_eq!(store.row_count("purchases").unwrap(), 5);
    assert_eq!(store.row_count("sales").unwrap(), 3);
    assert!(store
        .table_columns("vendor_invoice")
        .unwrap()
        .contains(&"freight".to_string()));

    let summary = Summarizer::new(config).unwrap().run(&mut store).unwrap();
    assert_eq!(summary.rows, 3);
    assert_eq!(
        store.table_columns("summary_table").unwrap(),
        SUMMARY_COLUMNS.to_vec()
    );

    let records = read_summary(&store);
    let keys: Vec<(i64, i64)> = records.iter().map(|r| (r.vendor_number, r.brand)).collect();
    // Brand 63 has a zero purchase price and is left out
    assert_eq!(keys, vec![(3960, 62), (12546, 58), (17035, 77)]);

    let jim_beam = &records[1];
    assert_eq!(jim_beam.vendor_name, "JIM BEAM BRANDS COMPANY");
    assert_close(jim_beam.total_purchase_quantity, 10.0);
    assert_close(jim_beam.total_purchase_dollars, 92.80);
    assert_close(jim_beam.total_sales_quantity, 8.0);
    assert_close(jim_beam.total_sales_dollars, 103.92);
    assert_close(jim_beam.total_excise_tax, 1.26);
    assert_close(jim_beam.freight_cost, 2.50);
    assert_close(jim_beam.actual_price, 12.99);
    assert_close(jim_beam.volume, 750.0);
    assert_close(jim_beam.gross_profit, 103.92 - 92.80);
    assert_close(jim_beam.profit_margin, (103.92 - 92.80) / 103.92 * 100.0);
    assert_close(jim_beam.stock_turnover, 0.8);
    assert_close(jim_beam.sales_to_purchase_ratio, 103.92 / 92.80);

    let diageo = &records[0];
    assert_close(diageo.total_sales_dollars, 0.0);
    assert_close(diageo.profit_margin, 0.0);
    assert_close(diageo.freight_cost, 8.50);

    // No sales and no invoices: kept, with zeros
    let pernod = &records[2];
    assert_close(pernod.volume, 0.0);
    assert_close(pernod.total_sales_quantity, 0.0);
    assert_close(pernod.freight_cost, 0.0);
    assert_close(pernod.gross_profit, -24.90);
    assert_close(pernod.stock_turnover, 0.0);
}

#[test]
fn test_rerun_is_idempotent() {
    let dir = TempDir::new().unwrap();
    write_sources(dir.path());
    let config = test_config(dir.path());
    let mut store = DuckDbStore::open(&config.store).unwrap();

    run_pipeline(&config, &mut store);
    let first = store
        .execute_read_query(r#"SELECT * FROM "summary_table""#)
        .unwrap();
    let purchases = store.row_count("purchases").unwrap();

    run_pipeline(&config, &mut store);
    let second = store
        .execute_read_query(r#"SELECT * FROM "summary_table""#)
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(store.row_count("purchases").unwrap(), purchases);
}

#[test]
fn test_stages_share_a_database_file() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("data");
    std::fs::create_dir(&data).unwrap();
    write_sources(&data);

    let mut config = test_config(&data);
    config.store.path = dir.path().join("vendor.duckdb").display().to_string();

    {
        let mut store = DuckDbStore::open(&config.store).unwrap();
        Ingestor::new(config.clone()).unwrap().run(&mut store).unwrap();
    }

    let mut store = DuckDbStore::open(&config.store).unwrap();
    let report = Summarizer::new(config).unwrap().run(&mut store).unwrap();
    assert_eq!(report.rows, 3);
}

// ============================================================================
// Failure Handling
// ============================================================================

#[test]
fn test_na_cells_load_as_missing_numbers() {
    let dir = TempDir::new().unwrap();
    write_sources(dir.path());
    let sales = SALES.replacen(",3,38.97,12.99,", ",NA,NA,12.99,", 1);
    std::fs::write(dir.path().join("sales.csv"), sales).unwrap();
    let config = test_config(dir.path());
    let mut store = DuckDbStore::open(&config.store).unwrap();

    run_pipeline(&config, &mut store);

    let types = store
        .execute_read_query("SELECT salesquantity, salesdollars FROM sales")
        .unwrap();
    assert!(types.schema().field(0).data_type().is_numeric());
    assert!(types.schema().field(1).data_type().is_numeric());

    let records = read_summary(&store);
    let jim_beam = records.iter().find(|r| r.brand == 58).unwrap();
    assert_close(jim_beam.total_sales_quantity, 5.0);
    assert_close(jim_beam.total_sales_dollars, 64.95);
    assert_close(jim_beam.gross_profit, 64.95 - 92.80);
}

#[test]
fn test_malformed_file_is_skipped() {
    let dir = TempDir::new().unwrap();
    write_sources(dir.path());
    std::fs::write(dir.path().join("begin_inventory.csv"), "a,b\n1,2\n3\n").unwrap();
    let config = test_config(dir.path());
    let mut store = DuckDbStore::open(&config.store).unwrap();

    let report = Ingestor::new(config.clone()).unwrap().run(&mut store).unwrap();

    assert_eq!(report.loaded().count(), 4);
    assert_eq!(report.failed().count(), 1);
    assert!(store.table_exists("sales").unwrap());
    assert_eq!(
        Summarizer::new(config).unwrap().run(&mut store).unwrap().rows,
        3
    );
}

#[test]
fn test_missing_source_dir() {
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir.path().join("data"));
    let mut store = DuckDbStore::open(&config.store).unwrap();

    let report = Ingestor::new(config).unwrap().run(&mut store).unwrap();

    assert!(matches!(report.status, IngestStatus::SourceDirMissing { .. }));
    assert!(!store.table_exists("purchases").unwrap());
}

#[test]
fn test_summary_without_raw_tables_fails() {
    let config = test_config(Path::new("unused"));
    let mut store = DuckDbStore::open(&config.store).unwrap();

    assert!(Summarizer::new(config).unwrap().run(&mut store).is_err());
    assert!(!store.table_exists("summary_table").unwrap());
}

// ============================================================================
// Logging
// ============================================================================

#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for SharedBuffer {
    type Writer = SharedBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

impl SharedBuffer {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).to_string()
    }
}

#[test]
fn test_ingest_logs_per_file() {
    let dir = TempDir::new().unwrap();
    write_sources(dir.path());
    std::fs::write(dir.path().join("broken.csv"), "a,b\n1,2\n3\n").unwrap();
    let config = test_config(dir.path());
    let mut store = DuckDbStore::open(&config.store).unwrap();

    let buffer = SharedBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(buffer.clone())
        .with_ansi(false)
        .finish();
    tracing::subscriber::with_default(subscriber, || {
        Ingestor::new(config).unwrap().run(&mut store).unwrap();
    });

    let logs = buffer.contents();
    assert!(logs.contains("Ingesting purchases.csv -> table 'purchases'"));
    assert!(logs.contains("Failed ingest for"));
    assert!(logs.contains("broken.csv"));
    assert!(logs.contains("Ingestion complete"));
    assert!(logs.contains("Total time taken"));
}
