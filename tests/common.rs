#![allow(dead_code)]

use rust_xlsxwriter::Workbook;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// Connection to the test database, or `None` when DATABASE_URL is unset
pub async fn test_pool() -> Option<PgPool> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping database test");
        return None;
    };

    let pool = PgPoolOptions::new()
        .max_connections(1)
        .acquire_timeout(std::time::Duration::from_secs(60))
        .connect(&database_url)
        .await
        .expect("Failed to connect to test database");

    Some(pool)
}

/// One origin-destination sheet: `stations` on both axes
pub struct OdSheet<'a> {
    pub name: &'a str,
    pub day_label: &'a str,
    pub stations: &'a [&'a str],
}

/// Rider count written at (entry index, exit index) of the `sheet_idx`th sheet
pub fn riders_at(sheet_idx: usize, entry: usize, exit: usize) -> f64 {
    (100 * (sheet_idx + 1) + 10 * entry + exit) as f64
}

/// Write a workbook laid out like the monthly ridership files
///
/// Row 0 col 3: day-type label; row 1: exit stations then "Exits";
/// col 0: entry stations then "Entries"; totals in the Exits column and Entries row.
pub fn write_od_workbook(path: &Path, sheets: &[OdSheet]) {
    let mut workbook = Workbook::new();

    for (sheet_idx, od) in sheets.iter().enumerate() {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(od.name).unwrap();
        worksheet.write_string(0, 3, od.day_label).unwrap();
        worksheet.write_string(1, 0, "Exit/Entry").unwrap();

        let n = od.stations.len();
        for (i, station) in od.stations.iter().enumerate() {
            worksheet.write_string(1, (i + 1) as u16, *station).unwrap();
            worksheet.write_string((i + 2) as u32, 0, *station).unwrap();

            let mut row_total = 0.0;
            for j in 0..n {
                let value = riders_at(sheet_idx, i, j);
                row_total += value;
                worksheet
                    .write_number((i + 2) as u32, (j + 1) as u16, value)
                    .unwrap();
            }
            worksheet
                .write_number((i + 2) as u32, (n + 1) as u16, row_total)
                .unwrap();
        }

        worksheet.write_string(1, (n + 1) as u16, "Exits").unwrap();
        worksheet.write_string((n + 2) as u32, 0, "Entries").unwrap();
        for j in 0..n {
            let col_total: f64 = (0..n).map(|i| riders_at(sheet_idx, i, j)).sum();
            worksheet
                .write_number((n + 2) as u32, (j + 1) as u16, col_total)
                .unwrap();
        }
    }

    workbook.save(path).unwrap();
}

/// Zip `entries` (name inside the archive, file on disk) into `zip_path`
pub fn zip_files(zip_path: &Path, entries: &[(&str, &Path)]) {
    let mut zip = ZipWriter::new(File::create(zip_path).unwrap());
    let options = SimpleFileOptions::default();

    for (name, source) in entries {
        zip.start_file(*name, options).unwrap();
        zip.write_all(&std::fs::read(source).unwrap()).unwrap();
    }

    zip.finish().unwrap();
}
