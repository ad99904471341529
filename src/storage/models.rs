use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeDelta};
use lazy_static::lazy_static;
use serde::Serialize;

use crate::naming::NamingFlag;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Column headers of the spreadsheet log, in order.
pub const LOG_HEADERS: [&str; 6] = [
    "Folder Name",
    "Naming Flag",
    "Processed Date",
    "File Name",
    "File Path",
    "File Created Date",
];

/// Number format applied to date cells in the workbook.
pub const EXCEL_DATE_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";

const MILLIS_PER_DAY: f64 = 86_400_000.0;

lazy_static! {
    // Day zero of the 1900 date system, valid for every date after 1900-03-01.
    static ref EXCEL_EPOCH: NaiveDateTime = NaiveDate::from_ymd_opt(1899, 12, 30)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .expect("excel epoch");
}

pub fn format_timestamp(ts: &DateTime<Local>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Local wall-clock time as an Excel serial date (days since the epoch).
pub fn to_excel_serial(ts: &DateTime<Local>) -> f64 {
    let millis = (ts.naive_local() - *EXCEL_EPOCH).num_milliseconds();
    millis as f64 / MILLIS_PER_DAY
}

/// Renders an Excel serial date the way timestamps are written to the logs.
/// `None` when the serial is out of range.
pub fn format_excel_serial(serial: f64) -> Option<String> {
    if !serial.is_finite() {
        return None;
    }
    let delta = TimeDelta::try_milliseconds((serial * MILLIS_PER_DAY).round() as i64)?;
    EXCEL_EPOCH
        .checked_add_signed(delta)
        .map(|ts| ts.format(TIMESTAMP_FORMAT).to_string())
}

/// One spreadsheet row per validly named file of a moved folder.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRow {
    pub folder_name: String,
    pub naming_flag: NamingFlag,
    pub processed_date: DateTime<Local>,
    pub file_name: String,
    pub file_path: String,
    pub file_created_date: DateTime<Local>,
}

/// One CSV row per validly named file, mapping where it came from to where it
/// now lives. Field names double as the CSV header.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MappingRow {
    pub original_path: String,
    pub new_path: String,
    pub folder: String,
    pub processed_date: String,
    pub naming_flag: NamingFlag,
}
