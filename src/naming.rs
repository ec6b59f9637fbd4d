//! Storage-safe identifiers
//!
//! Table names are derived from source file names and column names from CSV
//! headers. Both use the same character mapping: alphanumerics are
//! lowercased, everything else becomes `_`. Runs are not collapsed and
//! nothing is trimmed, so the mapping is length-preserving per character.

/// Separator substituted for every non-alphanumeric character
pub const SEPARATOR: char = '_';

/// Derive a table identifier from a file name
///
/// The final extension is stripped before mapping characters.
///
/// ```
/// use vendor_etl::naming::table_identifier;
///
/// assert_eq!(table_identifier("Purchase-Prices.csv"), "purchase_prices");
/// assert_eq!(table_identifier("Vendor Invoice.csv"), "vendor_invoice");
/// ```
pub fn table_identifier(file_name: &str) -> String {
    column_identifier(strip_extension(file_name))
}

/// Normalize a column name
pub fn column_identifier(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for ch in name.chars() {
        if ch.is_alphanumeric() {
            out.extend(ch.to_lowercase());
        } else {
            out.push(SEPARATOR);
        }
    }
    out
}

/// Strip the final `.ext` from a file name
///
/// A dot only starts an extension when some non-dot character precedes it,
/// so `.env` and `..csv` are returned unchanged.
fn strip_extension(file_name: &str) -> &str {
    match file_name.rfind('.') {
        Some(pos) if file_name[..pos].chars().any(|c| c != '.') => &file_name[..pos],
        _ => file_name,
    }
}
