// Tests for ExcelImporter against workbooks written to disk
// Covers period parsing from the file name, day-type sheets and the halt rule

mod common;

use common::{riders_at, write_od_workbook, OdSheet};
use ridership_loader::importers::excel_importer::{ExcelImportError, ExcelImporter};
use ridership_loader::importers::{DayType, PeriodError, RawWorkbook, SheetKind};

const STATIONS: [&str; 3] = ["RM", "EN", "EP"];

fn three_day_types() -> Vec<OdSheet<'static>> {
    vec![
        OdSheet {
            name: "Weekday OD",
            day_label: "Average Weekday Exits",
            stations: &STATIONS,
        },
        OdSheet {
            name: "Saturday OD",
            day_label: "Average Saturday Exits",
            stations: &STATIONS,
        },
        OdSheet {
            name: "Sunday OD",
            day_label: "Average Sunday Exits",
            stations: &STATIONS,
        },
    ]
}

#[test]
fn test_workbook_not_found() {
    let importer = ExcelImporter::new("/nonexistent/path/Ridership_September2017.xlsx");
    let result = importer.import();

    match result {
        Err(ExcelImportError::WorkbookOpen { .. }) => {}
        other => panic!("Expected WorkbookOpen error, got {other:?}"),
    }
}

#[test]
fn test_file_name_without_month() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Ridership_2017.xlsx");
    write_od_workbook(&path, &three_day_types());

    match ExcelImporter::new(&path).import() {
        Err(ExcelImportError::Period(PeriodError::MissingMonth(name))) => {
            assert_eq!(name, "Ridership_2017.xlsx");
        }
        other => panic!("Expected MissingMonth, got {other:?}"),
    }
}

#[test]
fn test_single_sheet_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("September2017.xlsx");

    let mut workbook = rust_xlsxwriter::Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.write_string(0, 3, "Weekday").unwrap();
    worksheet.write_string(1, 1, "A").unwrap();
    worksheet.write_string(1, 2, "B").unwrap();
    worksheet.write_string(1, 3, "Exits").unwrap();
    worksheet.write_string(2, 0, "A").unwrap();
    worksheet.write_number(2, 1, 1.0).unwrap();
    worksheet.write_number(2, 2, 2.0).unwrap();
    worksheet.write_string(3, 0, "Entries").unwrap();
    workbook.save(&path).unwrap();

    let records = ExcelImporter::new(&path).import().unwrap();
    assert_eq!(records.len(), 2);

    let summary: Vec<(u32, i32, &str, &str, &str, Option<f64>)> = records
        .iter()
        .map(|r| {
            (
                r.month,
                r.year,
                r.day_type.as_str(),
                r.entry_station.as_str(),
                r.exit_station.as_str(),
                r.riders,
            )
        })
        .collect();
    assert_eq!(
        summary,
        vec![
            (9, 2017, "weekday", "A", "A", Some(1.0)),
            (9, 2017, "weekday", "A", "B", Some(2.0)),
        ]
    );
}

#[test]
fn test_three_day_types_record_count() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Ridership_March2016.xlsx");
    write_od_workbook(&path, &three_day_types());

    let records = ExcelImporter::new(&path).import().unwrap();

    // N sheets x R rows x C columns; totals row and column excluded
    assert_eq!(records.len(), 3 * 3 * 3);
    assert!(records.iter().all(|r| r.month == 3 && r.year == 2016));

    for (sheet_idx, day_type) in [DayType::Weekday, DayType::Saturday, DayType::Sunday]
        .into_iter()
        .enumerate()
    {
        let sheet_records = &records[sheet_idx * 9..(sheet_idx + 1) * 9];
        assert!(sheet_records.iter().all(|r| r.day_type == day_type));

        for (k, record) in sheet_records.iter().enumerate() {
            let (entry, exit) = (k / 3, k % 3);
            assert_eq!(record.entry_station, STATIONS[entry]);
            assert_eq!(record.exit_station, STATIONS[exit]);
            assert_eq!(record.riders, Some(riders_at(sheet_idx, entry, exit)));
        }
    }
}

#[test]
fn test_non_data_sheet_halts_workbook() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Ridership_April2016.xlsx");

    let mut sheets = three_day_types();
    sheets.insert(
        1,
        OdSheet {
            name: "Notes",
            day_label: "Station legend",
            stations: &STATIONS,
        },
    );
    write_od_workbook(&path, &sheets);

    let records = ExcelImporter::new(&path).import().unwrap();
    assert_eq!(records.len(), 9);
    assert!(records.iter().all(|r| r.day_type == DayType::Weekday));
}

#[test]
fn test_numeric_day_type_cell_halts() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Ridership_May2016.xlsx");

    let mut workbook = rust_xlsxwriter::Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.write_number(0, 3, 2016.0).unwrap();
    workbook.save(&path).unwrap();

    let workbook = RawWorkbook::open(&path).unwrap();
    assert_eq!(workbook.sheets[0].kind(), SheetKind::Halt);
    assert!(ExcelImporter::new(&path).import().unwrap().is_empty());
}

#[test]
fn test_missing_entries_label_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Ridership_June2016.xlsx");

    let mut workbook = rust_xlsxwriter::Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.write_string(0, 3, "Weekday").unwrap();
    worksheet.write_string(1, 1, "RM").unwrap();
    worksheet.write_string(1, 2, "Exits").unwrap();
    worksheet.write_string(2, 0, "RM").unwrap();
    worksheet.write_number(2, 1, 5.0).unwrap();
    workbook.save(&path).unwrap();

    match ExcelImporter::new(&path).import() {
        Err(ExcelImportError::MissingLabel { label, .. }) => assert_eq!(label, "Entries"),
        other => panic!("Expected MissingLabel, got {other:?}"),
    }
}

#[test]
fn test_reimport_is_identical() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Ridership_July2016.xlsx");
    write_od_workbook(&path, &three_day_types());

    let first = ExcelImporter::new(&path).import().unwrap();
    let second = ExcelImporter::new(&path).import().unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_narrower_saturday_sheet_loads_blank_riders() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Ridership_August2016.xlsx");
    write_od_workbook(
        &path,
        &[
            OdSheet {
                name: "Weekday OD",
                day_label: "Weekday",
                stations: &STATIONS,
            },
            OdSheet {
                name: "Saturday OD",
                day_label: "Saturday",
                stations: &STATIONS[..2],
            },
        ],
    );

    let records = ExcelImporter::new(&path).import().unwrap();
    assert_eq!(records.len(), 9 + 2 * 3);

    let saturday = &records[9..];
    assert!(saturday.iter().all(|r| r.day_type == DayType::Saturday));
    let blank: Vec<&str> = saturday
        .iter()
        .filter(|r| r.riders.is_none())
        .map(|r| r.exit_station.as_str())
        .collect();
    assert_eq!(blank, vec!["EP", "EP"]);
    assert_eq!(saturday[1].riders, Some(riders_at(1, 0, 1)));
}
