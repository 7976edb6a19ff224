use std::env;
use std::path::PathBuf;

pub const DEFAULT_SCHEMA: &str = "cls";
pub const DEFAULT_TABLE: &str = "bart";
pub const DEFAULT_STAGING_FILE_NAME: &str = "toLoad.csv";

/// Everything one pipeline run needs
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory of zipped monthly workbooks
    pub archive_dir: PathBuf,
    /// Where archives are expanded and the staging CSV is written
    pub working_dir: PathBuf,
    /// Destination database; stage-only run when absent
    pub database_url: Option<String>,
    pub schema: String,
    pub table: String,
    pub staging_file_name: String,
    pub keep_staging: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        Ok(Config {
            archive_dir: env::var("ARCHIVE_DIR")?.into(),
            working_dir: env::var("WORKING_DIR")?.into(),
            database_url: env::var("DATABASE_URL").ok(),
            schema: env::var("RIDERSHIP_SCHEMA").unwrap_or_else(|_| DEFAULT_SCHEMA.to_string()),
            table: env::var("RIDERSHIP_TABLE").unwrap_or_else(|_| DEFAULT_TABLE.to_string()),
            staging_file_name: env::var("STAGING_FILE_NAME")
                .unwrap_or_else(|_| DEFAULT_STAGING_FILE_NAME.to_string()),
            keep_staging: env::var("KEEP_STAGING")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        })
    }

    pub fn staging_path(&self) -> PathBuf {
        self.working_dir.join(&self.staging_file_name)
    }
}
