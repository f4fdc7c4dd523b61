//! Export filename conventions shared by every collector.

use chrono::{Local, NaiveDate};

/// Date layout used in export filenames, e.g. `03.04.2025`.
pub const EXPORT_DATE_FORMAT: &str = "%m.%d.%Y";

/// Formats a date the way export filenames expect it.
pub fn format_export_date(date: NaiveDate) -> String {
    date.format(EXPORT_DATE_FORMAT).to_string()
}

/// Today's date in export filename layout.
pub fn today_stamp() -> String {
    format_export_date(Local::now().date_naive())
}

/// Builds `{account_label}-{resource_type}-{suffix}-export-{date}.xlsx`. The
/// suffix segment is left out when empty and `date` defaults to today.
pub fn build_filename(
    account_label: &str,
    resource_type: &str,
    suffix: &str,
    date: Option<&str>,
) -> String {
    let date = date.map_or_else(today_stamp, str::to_string);
    if suffix.is_empty() {
        format!("{account_label}-{resource_type}-export-{date}.xlsx")
    } else {
        format!("{account_label}-{resource_type}-{suffix}-export-{date}.xlsx")
    }
}

/// Builds `{account_label}-export-{date}.zip` for output archives.
pub fn build_archive_filename(account_label: &str, date: Option<&str>) -> String {
    let date = date.map_or_else(today_stamp, str::to_string);
    format!("{account_label}-export-{date}.zip")
}
