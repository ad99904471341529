use calamine::{open_workbook, Data, Range, Reader, Xlsx};
use rust_xlsxwriter::{Format, Workbook, Worksheet};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::models::{format_excel_serial, to_excel_serial, LogRow, EXCEL_DATE_FORMAT, LOG_HEADERS};
use super::StorageError;

pub const SHEET_NAME: &str = "Processing Log";

/// Durable, append-only processing log.
pub trait SpreadsheetLog {
    fn path(&self) -> &Path;

    /// Distinct values of the "Folder Name" column.
    fn logged_folders(&self) -> Result<HashSet<String>, StorageError>;

    fn append(&self, rows: &[LogRow]) -> Result<(), StorageError>;
}

/// Cell value carried through a rewrite with its type intact.
#[derive(Debug, Clone, PartialEq)]
enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    /// Excel serial date.
    DateTime(f64),
}

impl Cell {
    fn from_data(data: &Data) -> Self {
        match data {
            Data::Empty => Cell::Empty,
            Data::String(s) => Cell::Text(s.clone()),
            Data::Float(f) => Cell::Number(*f),
            Data::Int(i) => Cell::Number(*i as f64),
            Data::Bool(b) => Cell::Bool(*b),
            Data::DateTime(dt) => Cell::DateTime(dt.as_f64()),
            other => Cell::Text(other.to_string()),
        }
    }

    fn render(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
            Cell::Number(n) => n.to_string(),
            Cell::Bool(b) => b.to_string().to_uppercase(),
            Cell::DateTime(serial) => {
                format_excel_serial(*serial).unwrap_or_else(|| serial.to_string())
            }
        }
    }
}

/// One worksheet as a dense grid anchored at A1.
#[derive(Debug, Clone)]
struct Sheet {
    name: String,
    rows: Vec<Vec<Cell>>,
}

impl Sheet {
    fn from_range(name: String, range: &Range<Data>) -> Self {
        let mut rows = Vec::new();
        if let Some((first_row, first_col)) = range.start() {
            rows.resize(first_row as usize, Vec::new());
            for row in range.rows() {
                let mut cells = vec![Cell::Empty; first_col as usize];
                cells.extend(row.iter().map(Cell::from_data));
                rows.push(cells);
            }
        }
        Self { name, rows }
    }

    fn header(&self) -> &[Cell] {
        self.rows.first().map(Vec::as_slice).unwrap_or(&[])
    }

    fn column_of(&self, header: &str) -> Option<usize> {
        self.header().iter().position(|cell| match cell {
            Cell::Text(text) => text.trim().eq_ignore_ascii_case(header),
            _ => false,
        })
    }

    /// Column index of every log header, adding missing headers after the
    /// last used column.
    fn ensure_log_columns(&mut self) -> Vec<usize> {
        if self.rows.is_empty() {
            self.rows.push(Vec::new());
        }
        LOG_HEADERS
            .iter()
            .map(|header| match self.column_of(header) {
                Some(col) => col,
                None => {
                    self.rows[0].push(Cell::Text(header.to_string()));
                    self.rows[0].len() - 1
                }
            })
            .collect()
    }

    fn write(&self, worksheet: &mut Worksheet, bold_header: bool) -> Result<(), StorageError> {
        let header_format = Format::new().set_bold();
        let date_format = Format::new().set_num_format(EXCEL_DATE_FORMAT);

        for (row_idx, row) in self.rows.iter().enumerate() {
            let r = row_idx as u32;
            for (col_idx, cell) in row.iter().enumerate() {
                let c = col_idx as u16;
                match cell {
                    Cell::Empty => {}
                    Cell::Text(s) if bold_header && row_idx == 0 => {
                        worksheet.write_string_with_format(r, c, s, &header_format)?;
                    }
                    Cell::Text(s) => {
                        worksheet.write_string(r, c, s)?;
                    }
                    Cell::Number(n) => {
                        worksheet.write_number(r, c, *n)?;
                    }
                    Cell::Bool(b) => {
                        worksheet.write_boolean(r, c, *b)?;
                    }
                    Cell::DateTime(serial) => {
                        worksheet.write_number_with_format(r, c, *serial, &date_format)?;
                    }
                }
            }
        }
        Ok(())
    }
}

/// Every sheet of the log workbook, in workbook order.
#[derive(Debug)]
struct LogWorkbook {
    sheets: Vec<Sheet>,
    log_sheet: usize,
}

impl LogWorkbook {
    fn log(&self) -> &Sheet {
        &self.sheets[self.log_sheet]
    }

    fn log_mut(&mut self) -> &mut Sheet {
        &mut self.sheets[self.log_sheet]
    }
}

/// Processing log kept as an `.xlsx` workbook.
///
/// Appending reads the whole workbook and writes it back to a sibling temp
/// file that then replaces the log, so an interrupted write never leaves a
/// truncated log behind. Cell values keep their types, and other sheets and
/// extra columns are carried over; cell styling other than dates is not.
#[derive(Debug, Clone)]
pub struct XlsxLog {
    path: PathBuf,
}

impl XlsxLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Data rows of the log sheet as text, header excluded. Rows are padded to
    /// at least the log's column count; extra columns are kept.
    pub fn read_rows(&self) -> Result<Vec<Vec<String>>, StorageError> {
        let workbook = self.load()?;
        Ok(workbook
            .log()
            .rows
            .iter()
            .skip(1)
            .map(|row| {
                let mut cells: Vec<String> = row.iter().map(Cell::render).collect();
                if cells.len() < LOG_HEADERS.len() {
                    cells.resize(LOG_HEADERS.len(), String::new());
                }
                cells
            })
            .collect())
    }

    fn load(&self) -> Result<LogWorkbook, StorageError> {
        if !self.path.exists() {
            return Ok(LogWorkbook {
                sheets: vec![Sheet {
                    name: SHEET_NAME.to_string(),
                    rows: Vec::new(),
                }],
                log_sheet: 0,
            });
        }

        let mut workbook: Xlsx<_> = open_workbook(&self.path)?;
        let mut sheets = Vec::new();
        for name in workbook.sheet_names() {
            let range = workbook.worksheet_range(&name)?;
            sheets.push(Sheet::from_range(name, &range));
        }

        let log_sheet = match sheets.iter().position(|sheet| sheet.name == SHEET_NAME) {
            Some(idx) => idx,
            None if sheets.is_empty() => {
                sheets.push(Sheet {
                    name: SHEET_NAME.to_string(),
                    rows: Vec::new(),
                });
                0
            }
            // Logs written by earlier tools use the default sheet.
            None => 0,
        };
        Ok(LogWorkbook { sheets, log_sheet })
    }

    fn save(&self, workbook: &LogWorkbook) -> Result<(), StorageError> {
        let mut out = Workbook::new();
        for (idx, sheet) in workbook.sheets.iter().enumerate() {
            let worksheet = out.add_worksheet();
            worksheet.set_name(&sheet.name)?;
            sheet.write(worksheet, idx == workbook.log_sheet)?;
        }

        let tmp = temp_path(&self.path);
        out.save(&tmp)?;
        if let Err(err) = fs::rename(&tmp, &self.path) {
            let _ = fs::remove_file(&tmp);
            return Err(StorageError::Io(err));
        }
        Ok(())
    }
}

impl SpreadsheetLog for XlsxLog {
    fn path(&self) -> &Path {
        &self.path
    }

    fn logged_folders(&self) -> Result<HashSet<String>, StorageError> {
        let workbook = self.load()?;
        let log = workbook.log();
        let col = log.column_of(LOG_HEADERS[0]).unwrap_or(0);

        Ok(log
            .rows
            .iter()
            .skip(1)
            .filter_map(|row| row.get(col))
            .map(Cell::render)
            .filter(|name| !name.is_empty())
            .collect())
    }

    fn append(&self, rows: &[LogRow]) -> Result<(), StorageError> {
        let mut workbook = self.load()?;
        let log = workbook.log_mut();
        let columns = log.ensure_log_columns();
        let width = log.header().len();
        let existing = log.rows.len() - 1;

        for row in rows {
            let mut cells = vec![Cell::Empty; width];
            for (col, value) in columns.iter().zip(log_cells(row)) {
                cells[*col] = value;
            }
            log.rows.push(cells);
        }

        self.save(&workbook)?;
        debug!(
            "Appended {} rows to {} ({} already present)",
            rows.len(),
            self.path.display(),
            existing
        );
        Ok(())
    }
}

/// Cells of one log row, in `LOG_HEADERS` order.
fn log_cells(row: &LogRow) -> [Cell; 6] {
    [
        Cell::Text(row.folder_name.clone()),
        Cell::Text(row.naming_flag.to_string()),
        Cell::DateTime(to_excel_serial(&row.processed_date)),
        Cell::Text(row.file_name.clone()),
        Cell::Text(row.file_path.clone()),
        Cell::DateTime(to_excel_serial(&row.file_created_date)),
    ]
}

fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "log.xlsx".to_string());
    path.with_file_name(format!(".{}.tmp", name))
}

impl From<calamine::XlsxError> for StorageError {
    fn from(err: calamine::XlsxError) -> Self {
        match err {
            calamine::XlsxError::Io(io) => StorageError::Io(io),
            other => StorageError::Read(other),
        }
    }
}

impl From<rust_xlsxwriter::XlsxError> for StorageError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        match err {
            rust_xlsxwriter::XlsxError::IoError(io) => StorageError::Io(io),
            other => StorageError::Write(other),
        }
    }
}
