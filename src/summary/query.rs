//! Vendor summary aggregation query
//!
//! Three aggregates joined onto the purchase groups:
//!
//! - `freight_summary`: freight per vendor from the invoices
//! - `purchase_summary`: purchases joined to the price list on brand, valid
//!   (positive) purchase prices only, summed per group
//! - `sales_summary`: sales per (vendor, brand)
//!
//! Sums are cast to DOUBLE so integer and decimal inputs come back with one
//! type. The ordering includes the whole group key after total purchase
//! dollars, so reruns produce rows in the same order.

use crate::config::TableNames;
use crate::store::quote_ident;

/// Build the summary query over the configured raw tables
pub fn vendor_summary_sql(tables: &TableNames) -> String {
    let vendor_invoice = quote_ident(&tables.vendor_invoice);
    let purchases = quote_ident(&tables.purchases);
    let purchase_prices = quote_ident(&tables.purchase_prices);
    let sales = quote_ident(&tables.sales);

    format!(
        r"WITH freight_summary AS (
    SELECT
        vendornumber,
        CAST(SUM(freight) AS DOUBLE) AS freight_cost
    FROM {vendor_invoice}
    GROUP BY vendornumber
),
purchase_summary AS (
    SELECT
        p.vendornumber,
        p.vendorname,
        p.brand,
        p.description,
        p.purchaseprice,
        pp.price AS actual_price,
        pp.volume,
        CAST(SUM(p.quantity) AS DOUBLE) AS total_purchase_quantity,
        CAST(SUM(p.dollars) AS DOUBLE) AS total_purchase_dollars
    FROM {purchases} p
    JOIN {purchase_prices} pp
        ON p.brand = pp.brand
    WHERE p.purchaseprice > 0
    GROUP BY p.vendornumber, p.vendorname, p.brand, p.description,
             p.purchaseprice, pp.price, pp.volume
),
sales_summary AS (
    SELECT
        vendorno,
        brand,
        CAST(SUM(salesquantity) AS DOUBLE) AS total_sales_quantity,
        CAST(SUM(salesdollars) AS DOUBLE) AS total_sales_dollars,
        CAST(SUM(salesprice) AS DOUBLE) AS total_sales_price,
        CAST(SUM(excisetax) AS DOUBLE) AS total_excise_tax
    FROM {sales}
    GROUP BY vendorno, brand
)
SELECT
    ps.vendornumber,
    ps.vendorname,
    ps.brand,
    ps.description,
    ps.purchaseprice,
    ps.actual_price,
    ps.volume,
    ps.total_purchase_quantity,
    ps.total_purchase_dollars,
    ss.total_sales_quantity,
    ss.total_sales_dollars,
    ss.total_sales_price,
    ss.total_excise_tax,
    fs.freight_cost
FROM purchase_summary ps
LEFT JOIN sales_summary ss
    ON ps.vendornumber = ss.vendorno
   AND ps.brand = ss.brand
LEFT JOIN freight_summary fs
    ON ps.vendornumber = fs.vendornumber
ORDER BY ps.total_purchase_dollars DESC, ps.vendornumber, ps.brand, ps.vendorname,
         ps.description, ps.purchaseprice, ps.actual_price, ps.volume"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table_names() {
        let sql = vendor_summary_sql(&TableNames::default());
        assert!(sql.contains(r#"FROM "vendor_invoice""#));
        assert!(sql.contains(r#"FROM "purchases" p"#));
        assert!(sql.contains(r#"JOIN "purchase_prices" pp"#));
        assert!(sql.contains(r#"FROM "sales""#));
        assert!(sql.contains("WHERE p.purchaseprice > 0"));
    }

    #[test]
    fn test_custom_table_names_are_quoted() {
        let tables = TableNames {
            sales: "sales 2024".to_string(),
            ..TableNames::default()
        };
        let sql = vendor_summary_sql(&tables);
        assert!(sql.contains(r#"FROM "sales 2024""#));
    }

    #[test]
    fn test_ordering_is_total() {
        let sql = vendor_summary_sql(&TableNames::default());
        let order_by = &sql[sql.find("ORDER BY").unwrap()..];
        assert!(order_by.starts_with("ORDER BY ps.total_purchase_dollars DESC, ps.vendornumber, ps.brand"));
        assert!(order_by.contains("ps.volume"));
    }
}
