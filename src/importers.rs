// ! Workbook importers: archive expansion, period parsing and sheet reshaping

pub mod archive_expander;
pub mod excel_importer;
pub mod period;

// Re-export commonly used items
pub use archive_expander::{expand_archives, list_files, ArchiveError};
pub use excel_importer::{
    reshape, DayType, ExcelImportError, ExcelImporter, GridBounds, RawWorkbook, RiderRecord,
    Sheet, SheetKind,
};
pub use period::{extract_period, Period, PeriodError};
