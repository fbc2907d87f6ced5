/// Utility functions for formatting readings in log output
use time::{format_description, OffsetDateTime};

use crate::models::TelemetryReport;

/// Format a timestamp for human-readable logging
///
/// Converts an OffsetDateTime to DD.MM.YYYY - HH:MM:SS format
/// Falls back to default string representation if formatting fails.
pub fn format_datetime(dt: &OffsetDateTime) -> String {
    match format_description::parse_borrowed::<2>("[day].[month].[year] - [hour]:[minute]:[second]") {
        Ok(format) => dt.format(&format).unwrap_or_else(|_| dt.to_string()),
        Err(_) => dt.to_string(),
    }
}

/// Format an optional reading with one decimal place, or `n/a` when absent
pub fn format_optional(value: Option<f64>) -> String {
    match value {
        Some(value) => format!("{:.1}", value),
        None => "n/a".to_string(),
    }
}

/// One-line summary of a report, logged before it is uploaded
pub fn format_report(report: &TelemetryReport) -> String {
    let soils = report
        .soil
        .iter()
        .map(|value| format!("{:.1}", value))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "Temp={}*C  Humidity={}%  Soils=[{}]",
        format_optional(report.temperature),
        format_optional(report.humidity),
        soils
    )
}
