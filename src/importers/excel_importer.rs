use calamine::{open_workbook_auto, Data, Range, Reader};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use super::period::{extract_period, Period, PeriodError};

/// Cell holding the day-type label ("Weekday OD", "Saturday OD", ...)
pub const DAY_TYPE_CELL: (u32, u32) = (0, 3);
/// Row holding the exit-station labels
pub const HEADER_ROW: u32 = 1;
/// First row of the entry/exit matrix
pub const FIRST_DATA_ROW: u32 = 2;
/// Column holding the entry-station labels
pub const LABEL_COL: u32 = 0;
/// Header-row label just right of the last exit-station column
pub const EXITS_LABEL: &str = "Exits";
/// Column-0 label just below the last entry-station row
pub const ENTRIES_LABEL: &str = "Entries";
/// Replaces the cross-tab corner label in the captured header
pub const EXIT_STATIONS_LABEL: &str = "Exit stations";

#[derive(Error, Debug)]
pub enum ExcelImportError {
    #[error("Failed to open workbook {path}: {msg}")]
    WorkbookOpen { path: PathBuf, msg: String },

    #[error("Failed to read sheet {sheet}: {msg}")]
    SheetRead { sheet: String, msg: String },

    #[error("Label {label:?} not found in sheet {sheet}")]
    MissingLabel { sheet: String, label: &'static str },

    #[error("Invalid data in sheet {sheet} at row {row}, col {col}: {msg}")]
    InvalidData {
        sheet: String,
        row: u32,
        col: u32,
        msg: String,
    },

    #[error("Sheet {sheet} has {found} exit columns but the captured header has {expected}")]
    HeaderWidthMismatch {
        sheet: String,
        expected: usize,
        found: usize,
    },

    #[error("Invalid workbook name: {0}")]
    Period(#[from] PeriodError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DayType {
    Weekday,
    Saturday,
    Sunday,
}

impl DayType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DayType::Weekday => "weekday",
            DayType::Saturday => "saturday",
            DayType::Sunday => "sunday",
        }
    }
}

impl fmt::Display for DayType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of reading a sheet's day-type label
///
/// `Halt` ends the scan of the whole workbook, not just the current sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetKind {
    Data(DayType),
    Halt,
}

impl SheetKind {
    pub fn detect(cell: Option<&Data>) -> Self {
        let Some(Data::String(label)) = cell else {
            return SheetKind::Halt;
        };

        let label = label.to_lowercase();
        if label.contains("weekday") {
            SheetKind::Data(DayType::Weekday)
        } else if label.contains("saturday") {
            SheetKind::Data(DayType::Saturday)
        } else if label.contains("sunday") {
            SheetKind::Data(DayType::Sunday)
        } else {
            SheetKind::Halt
        }
    }
}

/// One normalized (period, day-type, entry, exit) ridership count
///
/// Field names serialize to the staging header.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiderRecord {
    #[serde(rename = "mon")]
    pub month: u32,
    pub year: i32,
    #[serde(rename = "daytype")]
    pub day_type: DayType,
    #[serde(rename = "Entry stations")]
    pub entry_station: String,
    #[serde(rename = "Exit stations")]
    pub exit_station: String,
    /// Blank source cells stay blank
    pub riders: Option<f64>,
}

/// Location of the "Exits" and "Entries" labels bounding a sheet's matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridBounds {
    pub exits_col: u32,
    pub entries_row: u32,
}

impl GridBounds {
    /// Rightmost column of the matrix, `None` when "Exits" sits in column 0
    pub fn col_limit(&self) -> Option<u32> {
        self.exits_col.checked_sub(1)
    }

    /// Bottom row of the matrix, `None` when "Entries" sits in row 0
    pub fn row_limit(&self) -> Option<u32> {
        self.entries_row.checked_sub(1)
    }

    pub fn data_rows(&self) -> std::ops::Range<u32> {
        FIRST_DATA_ROW..self.entries_row
    }

    pub fn exit_cols(&self) -> std::ops::Range<u32> {
        LABEL_COL + 1..self.exits_col
    }
}

/// A named worksheet grid, addressed by absolute (row, col)
#[derive(Debug, Clone)]
pub struct Sheet {
    name: String,
    range: Range<Data>,
}

impl Sheet {
    pub fn new(name: impl Into<String>, range: Range<Data>) -> Self {
        Self {
            name: name.into(),
            range,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn range(&self) -> &Range<Data> {
        &self.range
    }

    pub fn cell(&self, row: u32, col: u32) -> Option<&Data> {
        self.range.get_value((row, col))
    }

    pub fn kind(&self) -> SheetKind {
        SheetKind::detect(self.cell(DAY_TYPE_CELL.0, DAY_TYPE_CELL.1))
    }

    /// Scan the header row for "Exits" and column 0 for "Entries"
    pub fn grid_bounds(&self) -> Result<GridBounds, ExcelImportError> {
        let exits_col = self
            .find_in_row(HEADER_ROW, EXITS_LABEL)
            .ok_or_else(|| self.missing(EXITS_LABEL))?;
        let entries_row = self
            .find_in_col(LABEL_COL, ENTRIES_LABEL)
            .ok_or_else(|| self.missing(ENTRIES_LABEL))?;

        debug!(
            "Sheet {}: exits at col {}, entries at row {}",
            self.name, exits_col, entries_row
        );
        Ok(GridBounds {
            exits_col,
            entries_row,
        })
    }

    /// Header row from column 0 through the column before "Exits"
    ///
    /// The corner cell is replaced with [`EXIT_STATIONS_LABEL`].
    pub fn capture_header(&self, bounds: &GridBounds) -> Vec<String> {
        let mut header: Vec<String> = (LABEL_COL..bounds.exits_col)
            .map(|col| station_label(self.cell(HEADER_ROW, col)))
            .collect();
        if let Some(corner) = header.first_mut() {
            *corner = EXIT_STATIONS_LABEL.to_string();
        }
        header
    }

    fn find_in_row(&self, row: u32, label: &str) -> Option<u32> {
        let (_, last_col) = self.range.end()?;
        (0..=last_col).find(|&col| is_label(self.cell(row, col), label))
    }

    fn find_in_col(&self, col: u32, label: &str) -> Option<u32> {
        let (last_row, _) = self.range.end()?;
        (0..=last_row).find(|&row| is_label(self.cell(row, col), label))
    }

    fn missing(&self, label: &'static str) -> ExcelImportError {
        ExcelImportError::MissingLabel {
            sheet: self.name.clone(),
            label,
        }
    }

    fn parse_riders(&self, row: u32, col: u32) -> Result<Option<f64>, ExcelImportError> {
        match self.cell(row, col) {
            Some(Data::Float(f)) => Ok(Some(*f)),
            Some(Data::Int(i)) => Ok(Some(*i as f64)),
            Some(Data::String(s)) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    Ok(None)
                } else {
                    trimmed
                        .parse::<f64>()
                        .map(Some)
                        .map_err(|_| self.invalid(row, col, format!("Cannot parse rider count: {s}")))
                }
            }
            Some(Data::Empty) | None => Ok(None),
            Some(other) => Err(self.invalid(row, col, format!("Expected number, got: {other:?}"))),
        }
    }

    fn invalid(&self, row: u32, col: u32, msg: String) -> ExcelImportError {
        ExcelImportError::InvalidData {
            sheet: self.name.clone(),
            row,
            col,
            msg,
        }
    }
}

fn is_label(cell: Option<&Data>, label: &str) -> bool {
    matches!(cell, Some(Data::String(s)) if s == label)
}

/// Render a station label cell as text; integral numbers drop the ".0"
pub fn station_label(cell: Option<&Data>) -> String {
    match cell {
        Some(Data::String(s)) => s.clone(),
        Some(Data::Float(f)) if f.fract() == 0.0 => format!("{f:.0}"),
        Some(Data::Float(f)) => f.to_string(),
        Some(Data::Int(i)) => i.to_string(),
        Some(Data::Empty) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

/// All sheets of one monthly workbook, in workbook order
#[derive(Debug, Clone, Default)]
pub struct RawWorkbook {
    pub sheets: Vec<Sheet>,
}

impl RawWorkbook {
    pub fn from_sheets(sheets: Vec<Sheet>) -> Self {
        Self { sheets }
    }

    /// Read every sheet of an xls/xlsx/xlsb/ods file (synchronous, caller should use spawn_blocking)
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ExcelImportError> {
        let path = path.as_ref();
        let mut workbook = open_workbook_auto(path).map_err(|e| ExcelImportError::WorkbookOpen {
            path: path.to_path_buf(),
            msg: e.to_string(),
        })?;

        let mut sheets = Vec::new();
        for name in workbook.sheet_names() {
            let range = workbook
                .worksheet_range(&name)
                .map_err(|e| ExcelImportError::SheetRead {
                    sheet: name.clone(),
                    msg: e.to_string(),
                })?;
            sheets.push(Sheet::new(name, range));
        }

        Ok(Self { sheets })
    }
}

/// Turn every day-type sheet of `workbook` into long-format records
///
/// Sheets are read in order until the first one whose day-type label is not
/// recognised. The header of the first data sheet supplies the exit-station
/// labels for every later sheet; a later sheet may be narrower than that header
/// but not wider. Records come out grouped by sheet, then by
/// entry row, then by exit column.
pub fn reshape(workbook: &RawWorkbook, period: Period) -> Result<Vec<RiderRecord>, ExcelImportError> {
    let mut header: Option<Vec<String>> = None;
    let mut records = Vec::new();

    for sheet in &workbook.sheets {
        let day_type = match sheet.kind() {
            SheetKind::Data(day_type) => day_type,
            SheetKind::Halt => {
                debug!("Sheet {} has no day-type label, stopping", sheet.name());
                break;
            }
        };

        let bounds = sheet.grid_bounds()?;
        let captured = header.get_or_insert_with(|| sheet.capture_header(&bounds));
        let exit_stations = captured.get(1..).unwrap_or_default();

        let found = bounds.exit_cols().len();
        if found > exit_stations.len() {
            return Err(ExcelImportError::HeaderWidthMismatch {
                sheet: sheet.name().to_string(),
                expected: exit_stations.len(),
                found,
            });
        }

        // A narrower sheet leaves the trailing header columns blank
        let before = records.len();
        for row in bounds.data_rows() {
            let entry_station = station_label(sheet.cell(row, LABEL_COL));
            for (col, exit_station) in (LABEL_COL + 1..).zip(exit_stations) {
                let riders = if bounds.exit_cols().contains(&col) {
                    sheet.parse_riders(row, col)?
                } else {
                    None
                };
                records.push(RiderRecord {
                    month: period.month,
                    year: period.year,
                    day_type,
                    entry_station: entry_station.clone(),
                    exit_station: exit_station.clone(),
                    riders,
                });
            }
        }

        debug!(
            "Sheet {} ({}): {} records",
            sheet.name(),
            day_type,
            records.len() - before
        );
    }

    Ok(records)
}

/// Reshapes one monthly ridership workbook file
pub struct ExcelImporter {
    workbook_path: PathBuf,
}

impl ExcelImporter {
    pub fn new(workbook_path: impl Into<PathBuf>) -> Self {
        Self {
            workbook_path: workbook_path.into(),
        }
    }

    /// Period from the file name, records from the workbook contents
    pub fn import(&self) -> Result<Vec<RiderRecord>, ExcelImportError> {
        let file_name = self
            .workbook_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let period = extract_period(&file_name)?;

        let workbook = RawWorkbook::open(&self.workbook_path)?;
        let records = reshape(&workbook, period)?;

        info!(
            "Reshaped {} into {} records ({:02}/{})",
            file_name,
            records.len(),
            period.month,
            period.year
        );
        Ok(records)
    }
}
