use sqlx::PgPool;
use std::fmt;
use std::path::Path;
use tracing::{debug, info, instrument, warn};

use crate::db::column_mapping::{destination_columns, COLUMN_MAPPING};
use crate::db::DbError;
use crate::staging::read_header;

/// Destination layout, in column order
pub const TABLE_COLUMNS: [(&str, &str); 6] = [
    ("mon", "INT"),
    ("yr", "INT"),
    ("daytype", "VARCHAR(15)"),
    ("start", "VARCHAR(5)"),
    ("term", "VARCHAR(5)"),
    ("riders", "FLOAT"),
];

const MAX_IDENTIFIER_LEN: usize = 63;

/// A validated `schema.table` pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualifiedTable {
    schema: String,
    table: String,
}

impl QualifiedTable {
    pub fn new(schema: impl Into<String>, table: impl Into<String>) -> Result<Self, DbError> {
        let schema = schema.into();
        let table = table.into();
        validate_identifier(&schema)?;
        validate_identifier(&table)?;
        Ok(Self { schema, table })
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// `"schema"."table"`, safe to splice into SQL
    pub fn quoted(&self) -> String {
        format!("\"{}\".\"{}\"", self.schema, self.table)
    }
}

impl fmt::Display for QualifiedTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.table)
    }
}

fn validate_identifier(name: &str) -> Result<(), DbError> {
    let valid = !name.is_empty()
        && name.len() <= MAX_IDENTIFIER_LEN
        && !name.starts_with(|c: char| c.is_ascii_digit())
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');

    if valid {
        Ok(())
    } else {
        Err(DbError::InvalidIdentifier(name.to_string()))
    }
}

/// Recreates and bulk-loads the ridership destination table
#[derive(Clone)]
pub struct RidershipTableRepository {
    pool: PgPool,
    table: QualifiedTable,
}

impl RidershipTableRepository {
    pub fn new(pool: PgPool, table: QualifiedTable) -> Self {
        Self { pool, table }
    }

    pub fn table(&self) -> &QualifiedTable {
        &self.table
    }

    #[instrument(skip(self), fields(table = %self.table))]
    pub async fn table_exists(&self) -> Result<bool, DbError> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM pg_tables
                WHERE schemaname = $1 AND tablename = $2
            )
            "#,
        )
        .bind(self.table.schema())
        .bind(self.table.table())
        .fetch_one(&self.pool)
        .await?;

        debug!("Table {} exists: {}", self.table, exists);
        Ok(exists)
    }

    /// Drop the table if present, then create it empty with [`TABLE_COLUMNS`]
    #[instrument(skip(self), fields(table = %self.table))]
    pub async fn ensure_table(&self) -> Result<(), DbError> {
        if self.table_exists().await? {
            warn!("Dropping existing table {}", self.table);
            sqlx::query(&format!("DROP TABLE {}", self.table.quoted()))
                .execute(&self.pool)
                .await?;
        }

        let columns = TABLE_COLUMNS
            .iter()
            .map(|(name, sql_type)| format!("\"{name}\" {sql_type}"))
            .collect::<Vec<_>>()
            .join(", ");
        sqlx::query(&format!("CREATE TABLE {} ({columns})", self.table.quoted()))
            .execute(&self.pool)
            .await?;

        info!("Created table {}", self.table);
        Ok(())
    }

    /// Column names of the destination table in ordinal order
    #[instrument(skip(self), fields(table = %self.table))]
    pub async fn column_names(&self) -> Result<Vec<String>, DbError> {
        let names = sqlx::query_scalar::<_, String>(
            r#"
            SELECT column_name::text FROM information_schema.columns
            WHERE table_schema = $1 AND table_name = $2
            ORDER BY ordinal_position
            "#,
        )
        .bind(self.table.schema())
        .bind(self.table.table())
        .fetch_all(&self.pool)
        .await?;

        Ok(names)
    }

    /// Every destination column named by the column mapping must exist
    #[instrument(skip(self), fields(table = %self.table))]
    pub async fn verify_columns(&self) -> Result<(), DbError> {
        let existing = self.column_names().await?;
        let missing: Vec<String> = COLUMN_MAPPING
            .iter()
            .map(|(_, destination)| *destination)
            .filter(|destination| !existing.iter().any(|name| name == destination))
            .map(str::to_string)
            .collect();

        if missing.is_empty() {
            debug!("Columns of {}: {:?}", self.table, existing);
            Ok(())
        } else {
            Err(DbError::ColumnMismatch {
                table: self.table.to_string(),
                missing,
            })
        }
    }

    /// COPY a staged CSV into the table, leaving the file in place
    ///
    /// The COPY column list follows the file's own header through the column mapping.
    #[instrument(skip(self, artifact_path), fields(table = %self.table, path = %artifact_path.display()))]
    pub async fn copy_from_file(&self, artifact_path: &Path) -> Result<u64, DbError> {
        let header = read_header(artifact_path)?;
        let columns = destination_columns(&header)?
            .iter()
            .map(|column| format!("\"{column}\""))
            .collect::<Vec<_>>()
            .join(", ");
        let statement = format!(
            "COPY {} ({columns}) FROM STDIN WITH (FORMAT CSV, HEADER true)",
            self.table.quoted()
        );
        debug!("{}", statement);

        let file = tokio::fs::File::open(artifact_path).await?;

        let mut conn = self.pool.acquire().await?;
        let mut copy = conn.copy_in_raw(&statement).await?;
        let streamed = copy.read_from(file).await.map(|_| ());
        if let Err(e) = streamed {
            copy.abort(e.to_string()).await?;
            return Err(e.into());
        }
        let rows = copy.finish().await?;

        info!("Copied {} rows into {}", rows, self.table);
        Ok(rows)
    }

    /// COPY a staged CSV into the table, then delete the file
    pub async fn bulk_load(&self, artifact_path: &Path) -> Result<u64, DbError> {
        let rows = self.copy_from_file(artifact_path).await?;
        tokio::fs::remove_file(artifact_path).await?;
        debug!("Removed staging file {}", artifact_path.display());
        Ok(rows)
    }

    /// Recreate the table, check its columns and bulk-load the staged CSV
    pub async fn load(&self, artifact_path: &Path) -> Result<u64, DbError> {
        self.ensure_table().await?;
        self.verify_columns().await?;
        self.bulk_load(artifact_path).await
    }

    /// Row count, for verifying a load
    pub async fn count_rows(&self) -> Result<i64, DbError> {
        let count = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM {}",
            self.table.quoted()
        ))
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }
}
