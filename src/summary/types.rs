//! Summary record and run report types

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;

/// Columns returned by the aggregation query, in select-list order
pub const QUERY_COLUMNS: [&str; 14] = [
    "vendornumber",
    "vendorname",
    "brand",
    "description",
    "purchaseprice",
    "actual_price",
    "volume",
    "total_purchase_quantity",
    "total_purchase_dollars",
    "total_sales_quantity",
    "total_sales_dollars",
    "total_sales_price",
    "total_excise_tax",
    "freight_cost",
];

/// Columns of the persisted summary table, in order
pub const SUMMARY_COLUMNS: [&str; 18] = [
    "vendornumber",
    "vendorname",
    "brand",
    "description",
    "purchaseprice",
    "actual_price",
    "volume",
    "total_purchase_quantity",
    "total_purchase_dollars",
    "total_sales_quantity",
    "total_sales_dollars",
    "total_sales_price",
    "total_excise_tax",
    "freight_cost",
    "gross_profit",
    "profit_margin",
    "stock_turnover",
    "sales_to_purchase_ratio",
];

/// One (vendor, brand, price) group of the summary
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VendorBrandRecord {
    pub vendor_number: i64,
    pub vendor_name: String,
    pub brand: i64,
    pub description: String,
    pub purchase_price: f64,
    /// Catalog price from the price list
    pub actual_price: f64,
    pub volume: f64,
    pub total_purchase_quantity: f64,
    pub total_purchase_dollars: f64,
    pub total_sales_quantity: f64,
    pub total_sales_dollars: f64,
    pub total_sales_price: f64,
    pub total_excise_tax: f64,
    pub freight_cost: f64,
    pub gross_profit: f64,
    /// Percent of sales dollars kept as gross profit
    pub profit_margin: f64,
    pub stock_turnover: f64,
    pub sales_to_purchase_ratio: f64,
}

/// Summary of one summary-stage run
#[derive(Debug, Clone, Serialize)]
pub struct SummaryReport {
    /// Destination table
    pub table: String,
    /// Rows written
    pub rows: usize,
    pub started_at: DateTime<Utc>,
    pub elapsed: Duration,
}

impl SummaryReport {
    /// Elapsed wall-clock time in minutes
    pub fn elapsed_minutes(&self) -> f64 {
        self.elapsed.as_secs_f64() / 60.0
    }
}
