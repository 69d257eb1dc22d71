//! Common utilities for output formatters

use comfy_table::{presets::NOTHING, Table};
use serde::Serialize;

use crate::cli::OutputFormat;

/// One record rendered as a table/CSV row or a structured object
///
/// The serialized form is used for JSON and YAML, the cells for table and
/// CSV output.
pub trait Row: Serialize {
    /// Column headers, in cell order
    fn headers() -> &'static [&'static str];

    /// Cell values for this record
    fn cells(&self) -> Vec<String>;
}

/// Render rows in the requested format
///
/// `noun` names the records in the table footer, e.g. "roles".
pub fn render<R: Row>(rows: &[R], format: OutputFormat, no_header: bool, noun: &str) {
    match format {
        OutputFormat::Table => print!("{}", table_string(rows, no_header, noun)),
        OutputFormat::Csv => print!("{}", csv_string(rows, no_header)),
        OutputFormat::Json => print_json(&rows),
        OutputFormat::Yaml => print_yaml(&rows),
    }
}

/// Table rendering with a "Total" footer unless headers are suppressed
pub fn table_string<R: Row>(rows: &[R], no_header: bool, noun: &str) -> String {
    let mut table = Table::new();
    table.load_preset(NOTHING);
    if !no_header {
        table.set_header(R::headers().to_vec());
    }
    for row in rows {
        table.add_row(row.cells());
    }

    let mut out = format!("\n{table}\n");
    if !no_header {
        out.push_str(&format!("\nTotal: {} {}\n", rows.len(), noun));
    }
    out
}

/// RFC 4180 CSV rendering
pub fn csv_string<R: Row>(rows: &[R], no_header: bool) -> String {
    let mut out = String::new();
    if !no_header {
        out.push_str(&R::headers().join(","));
        out.push('\n');
    }
    for row in rows {
        let cells: Vec<String> = row.cells().iter().map(|c| escape_csv(c)).collect();
        out.push_str(&cells.join(","));
        out.push('\n');
    }
    out
}

/// Escape a value for CSV output
/// Handles commas, quotes, and newlines according to RFC 4180
pub fn escape_csv(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Print a value as pretty JSON
pub fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error: failed to serialize JSON: {}", e),
    }
}

/// Print a value as YAML
pub fn print_yaml<T: Serialize + ?Sized>(value: &T) {
    match serde_yml::to_string(value) {
        Ok(yaml) => print!("{}", yaml),
        Err(e) => eprintln!("Error: failed to serialize YAML: {}", e),
    }
}

/// "Yes"/"No" for boolean cells
pub fn yes_no(value: bool) -> String {
    if value { "Yes" } else { "No" }.to_string()
}
