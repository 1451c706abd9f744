//! Export of detailed reports to CSV and of store snapshots to JSON data files

use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::borrow::Cow;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::analytics::{BucketUnit, DetailedReport};
use crate::money::format_money;
use crate::parsers::DataFile;
use crate::store::Snapshot;

/// Header row of the detailed report CSV
pub const REPORT_CSV_HEADER: &str = "Period,Total Orders,Paid Orders,Revenue,Average Order Value";

/// Write a detailed report as CSV, one row per period
///
/// Columns: full period label, total orders, paid orders, revenue and
/// average order value, both amounts prefixed with `currency` and printed
/// with 2 decimals.
pub fn write_report_csv<W: Write>(report: &DetailedReport, currency: &str, writer: W) -> Result<()> {
    let mut writer = BufWriter::new(writer);

    writeln!(writer, "{}", REPORT_CSV_HEADER).context("Failed to write CSV header")?;

    for row in &report.rows {
        writeln!(
            writer,
            "{},{},{},{},{}",
            csv_field(&row.full_period),
            row.metrics.total_orders,
            row.metrics.paid_orders,
            format_money(currency, row.metrics.revenue),
            format_money(currency, row.metrics.average_order_value)
        )
        .with_context(|| format!("Failed to write row for period {}", row.full_period))?;
    }

    writer.flush().context("Failed to flush CSV writer")?;
    Ok(())
}

/// Export a detailed report to a CSV file (created or overwritten)
///
/// # Examples
///
/// ```no_run
/// use bistro_core::analytics::{detailed_report, BucketUnit};
/// use bistro_core::export::export_report_to_csv;
/// use chrono::Utc;
/// use std::path::Path;
///
/// let report = detailed_report(&[], BucketUnit::Week, 12, &Utc::now());
/// export_report_to_csv(&report, "₹", Path::new("weekly.csv")).unwrap();
/// ```
pub fn export_report_to_csv(report: &DetailedReport, currency: &str, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let file = File::create(path)
        .with_context(|| format!("Failed to create CSV file: {}", path.display()))?;

    write_report_csv(report, currency, file)
}

/// Default export file name, e.g. `restaurant_report_week_2026-10-19.csv`
pub fn report_file_name(unit: BucketUnit, date: NaiveDate) -> String {
    format!("restaurant_report_{}_{}.csv", unit, date.format("%Y-%m-%d"))
}

/// Write a snapshot as a data file the parser can read back
pub fn export_snapshot_to_json(snapshot: &Snapshot, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let data = DataFile {
        menu_items: snapshot.menu_items.clone(),
        orders: snapshot.orders.clone(),
    };

    let json = serde_json::to_string_pretty(&data).context("Failed to serialize data file")?;

    // Replace atomically, the watcher may read at any moment
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json)
        .with_context(|| format!("Failed to write JSON file: {}", tmp.display()))?;
    std::fs::rename(&tmp, path)
        .with_context(|| format!("Failed to replace data file: {}", path.display()))?;

    Ok(())
}

fn csv_field(value: &str) -> Cow<'_, str> {
    if value.contains([',', '"', '\n']) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::detailed_report;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    #[test]
    fn test_empty_report_has_header_and_zero_rows() {
        let reference = Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap();
        let report = detailed_report(&[], BucketUnit::Month, 2, &reference);

        let mut out = Vec::new();
        write_report_csv(&report, "₹", &mut out).unwrap();
        let contents = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = contents.lines().collect();

        assert_eq!(lines[0], REPORT_CSV_HEADER);
        assert_eq!(lines[1], "September 2026,0,0,₹0.00,₹0.00");
        assert_eq!(lines[2], "October 2026,0,0,₹0.00,₹0.00");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_creates_parent_directory() {
        let reference = Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap();
        let report = detailed_report(&[], BucketUnit::Day, 3, &reference);
        let temp_dir = TempDir::new().unwrap();
        let nested_path = temp_dir.path().join("exports/nested/report.csv");

        export_report_to_csv(&report, "$", &nested_path).unwrap();

        let contents = std::fs::read_to_string(&nested_path).unwrap();
        assert!(contents.ends_with("10/19/2026,0,0,$0.00,$0.00\n"));
    }

    #[test]
    fn test_report_file_name() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 7).unwrap();
        assert_eq!(
            report_file_name(BucketUnit::Week, date),
            "restaurant_report_week_2026-03-07.csv"
        );
    }

    #[test]
    fn test_csv_field_quotes_commas() {
        assert_eq!(csv_field("Oct 19"), "Oct 19");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }
}
