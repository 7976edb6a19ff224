use calamine::DataType;
use ridership_loader::importers::{extract_period, RawWorkbook, SheetKind};
use std::env;
use std::path::Path;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();
    let Some(file_path) = args.get(1) else {
        eprintln!("Usage: examine-workbook <workbook> [rows]");
        std::process::exit(2);
    };
    let preview_rows: usize = match args.get(2) {
        Some(n) => n.parse()?,
        None => 6,
    };

    println!("Opening workbook: {file_path}");
    let file_name = Path::new(file_path)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    match extract_period(&file_name) {
        Ok(period) => println!("Period: {:02}/{}", period.month, period.year),
        Err(e) => println!("Period: {e}"),
    }

    let workbook = RawWorkbook::open(file_path)?;

    println!("\nSheet names:");
    for (i, sheet) in workbook.sheets.iter().enumerate() {
        println!("  {i}: {}", sheet.name());
    }

    let mut halted = false;
    for sheet in &workbook.sheets {
        println!("\n\nExamining sheet: {}", sheet.name());
        println!("{}", "=".repeat(100));
        println!("Dimensions: {:?}", sheet.range().get_size());

        match sheet.kind() {
            SheetKind::Data(day_type) if !halted => println!("Day type: {day_type}"),
            SheetKind::Data(day_type) => {
                println!("Day type: {day_type} (ignored, an earlier sheet stopped the scan)")
            }
            SheetKind::Halt => {
                println!("Day type: none (reshaping stops here)");
                halted = true;
            }
        }

        match sheet.grid_bounds() {
            Ok(bounds) => {
                println!(
                    "Exits at col {}, Entries at row {} ({} entry rows x {} exit cols)",
                    bounds.exits_col,
                    bounds.entries_row,
                    bounds.data_rows().len(),
                    bounds.exit_cols().len()
                );
                println!("Header: {:?}", sheet.capture_header(&bounds));
            }
            Err(e) => println!("Bounds: {e}"),
        }

        println!("\nFirst {preview_rows} rows (showing first 10 columns):");
        for (row_idx, row) in sheet.range().rows().enumerate().take(preview_rows) {
            let has_data = row.iter().any(|cell| !cell.is_empty());
            if has_data {
                print!("Row {row_idx:3}: ");
                for cell in row.iter().take(10) {
                    if cell.is_empty() {
                        print!("[empty] ");
                    } else {
                        print!("[{cell}] ");
                    }
                }
                println!();
            }
        }
    }

    Ok(())
}
