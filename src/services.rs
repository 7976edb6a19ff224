pub mod ridership_import_service;

pub use ridership_import_service::{ImportSummary, RidershipImportError, RidershipImportService};
