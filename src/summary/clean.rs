//! Cleaning and feature engineering
//!
//! Turns the aggregation result into typed records:
//!
//! 1. `volume` is coerced to a number; anything unparseable becomes missing
//! 2. Missing values become zero (`"0"` for text)
//! 3. Vendor name and description are trimmed
//! 4. Gross profit, profit margin, stock turnover and the sales-to-purchase
//!    ratio are derived, with zero for any zero divisor

use super::types::{VendorBrandRecord, SUMMARY_COLUMNS};
use crate::error::{Error, Result};
use arrow::array::{Array, ArrayRef, AsArray, Float64Array, Int64Array, StringArray};
use arrow::compute::{cast_with_options, CastOptions};
use arrow::datatypes::{DataType, Field, Float64Type, Int64Type, Schema};
use arrow::record_batch::RecordBatch;
use std::sync::Arc;

/// Text written in place of a missing string value
const MISSING_TEXT: &str = "0";

/// Clean the query result and derive the features for every row
pub fn clean_data(batch: &RecordBatch) -> Result<Vec<VendorBrandRecord>> {
    let vendor_number = int_column(batch, "vendornumber")?;
    let vendor_name = text_column(batch, "vendorname")?;
    let brand = int_column(batch, "brand")?;
    let description = text_column(batch, "description")?;
    let purchase_price = float_column(batch, "purchaseprice")?;
    let actual_price = float_column(batch, "actual_price")?;
    let volume = lenient_float_column(batch, "volume")?;
    let total_purchase_quantity = float_column(batch, "total_purchase_quantity")?;
    let total_purchase_dollars = float_column(batch, "total_purchase_dollars")?;
    let total_sales_quantity = float_column(batch, "total_sales_quantity")?;
    let total_sales_dollars = float_column(batch, "total_sales_dollars")?;
    let total_sales_price = float_column(batch, "total_sales_price")?;
    let total_excise_tax = float_column(batch, "total_excise_tax")?;
    let freight_cost = float_column(batch, "freight_cost")?;

    let records = (0..batch.num_rows())
        .map(|row| {
            let mut record = VendorBrandRecord {
                vendor_number: vendor_number[row],
                vendor_name: vendor_name[row].clone(),
                brand: brand[row],
                description: description[row].clone(),
                purchase_price: purchase_price[row],
                actual_price: actual_price[row],
                volume: volume[row],
                total_purchase_quantity: total_purchase_quantity[row],
                total_purchase_dollars: total_purchase_dollars[row],
                total_sales_quantity: total_sales_quantity[row],
                total_sales_dollars: total_sales_dollars[row],
                total_sales_price: total_sales_price[row],
                total_excise_tax: total_excise_tax[row],
                freight_cost: freight_cost[row],
                gross_profit: 0.0,
                profit_margin: 0.0,
                stock_turnover: 0.0,
                sales_to_purchase_ratio: 0.0,
            };
            record.derive_features();
            record
        })
        .collect();

    Ok(records)
}

impl VendorBrandRecord {
    /// Recompute the derived fields from the aggregates
    pub fn derive_features(&mut self) {
        self.gross_profit = self.total_sales_dollars - self.total_purchase_dollars;
        self.profit_margin = ratio(self.gross_profit, self.total_sales_dollars) * 100.0;
        self.stock_turnover = ratio(self.total_sales_quantity, self.total_purchase_quantity);
        self.sales_to_purchase_ratio = ratio(self.total_sales_dollars, self.total_purchase_dollars);
    }
}

/// `numerator / denominator`, or zero when the divisor is zero
#[allow(clippy::float_cmp)]
fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        return 0.0;
    }
    let value = numerator / denominator;
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Convert records into a batch with the summary table's column order
pub fn records_to_batch(records: &[VendorBrandRecord]) -> Result<RecordBatch> {
    let floats = |f: fn(&VendorBrandRecord) -> f64| -> ArrayRef {
        Arc::new(Float64Array::from_iter_values(records.iter().map(f)))
    };

    let columns: Vec<ArrayRef> = vec![
        Arc::new(Int64Array::from_iter_values(records.iter().map(|r| r.vendor_number))),
        Arc::new(StringArray::from_iter_values(records.iter().map(|r| r.vendor_name.as_str()))),
        Arc::new(Int64Array::from_iter_values(records.iter().map(|r| r.brand))),
        Arc::new(StringArray::from_iter_values(records.iter().map(|r| r.description.as_str()))),
        floats(|r| r.purchase_price),
        floats(|r| r.actual_price),
        floats(|r| r.volume),
        floats(|r| r.total_purchase_quantity),
        floats(|r| r.total_purchase_dollars),
        floats(|r| r.total_sales_quantity),
        floats(|r| r.total_sales_dollars),
        floats(|r| r.total_sales_price),
        floats(|r| r.total_excise_tax),
        floats(|r| r.freight_cost),
        floats(|r| r.gross_profit),
        floats(|r| r.profit_margin),
        floats(|r| r.stock_turnover),
        floats(|r| r.sales_to_purchase_ratio),
    ];

    let fields: Vec<Field> = SUMMARY_COLUMNS
        .iter()
        .zip(&columns)
        .map(|(name, array)| Field::new(*name, array.data_type().clone(), false))
        .collect();

    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?)
}

// ============================================================================
// Column Coercion
// ============================================================================

fn column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a ArrayRef> {
    batch.column_by_name(name).ok_or_else(|| Error::MissingColumn {
        column: name.to_string(),
    })
}

/// Cast a column, failing on any value that does not convert
fn strict_cast(batch: &RecordBatch, name: &str, to: &DataType) -> Result<ArrayRef> {
    let options = CastOptions {
        safe: false,
        ..CastOptions::default()
    };
    cast_with_options(column(batch, name)?, to, &options)
        .map_err(|e| Error::transform(format!("column '{name}' is not {to}: {e}")))
}

fn int_column(batch: &RecordBatch, name: &str) -> Result<Vec<i64>> {
    let array = strict_cast(batch, name, &DataType::Int64)?;
    let values = array.as_primitive::<Int64Type>();
    Ok(values.iter().map(Option::unwrap_or_default).collect())
}

fn float_column(batch: &RecordBatch, name: &str) -> Result<Vec<f64>> {
    let array = strict_cast(batch, name, &DataType::Float64)?;
    let values = array.as_primitive::<Float64Type>();
    Ok(values.iter().map(Option::unwrap_or_default).collect())
}

/// Cast to Float64 with unparseable and non-finite values as zero
fn lenient_float_column(batch: &RecordBatch, name: &str) -> Result<Vec<f64>> {
    let array = cast_with_options(column(batch, name)?, &DataType::Float64, &CastOptions::default())?;
    let values = array.as_primitive::<Float64Type>();
    Ok(values
        .iter()
        .map(|v| v.filter(|f| f.is_finite()).unwrap_or_default())
        .collect())
}

fn text_column(batch: &RecordBatch, name: &str) -> Result<Vec<String>> {
    let array = strict_cast(batch, name, &DataType::Utf8)?;
    let values = array.as_string::<i32>();
    Ok((0..values.len())
        .map(|i| {
            if values.is_null(i) {
                MISSING_TEXT.to_string()
            } else {
                values.value(i).trim().to_string()
            }
        })
        .collect())
}
