pub mod column_mapping;
pub mod error;
pub mod ridership_table_repository;

pub use column_mapping::COLUMN_MAPPING;
pub use error::DbError;
pub use ridership_table_repository::{QualifiedTable, RidershipTableRepository, TABLE_COLUMNS};
