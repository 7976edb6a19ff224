use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use sqlx::postgres::PgPoolOptions;
use std::path::PathBuf;
use tracing::{info, instrument};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ridership_loader::config::{
    Config, DEFAULT_SCHEMA, DEFAULT_STAGING_FILE_NAME, DEFAULT_TABLE,
};
use ridership_loader::db::{QualifiedTable, RidershipTableRepository};
use ridership_loader::services::RidershipImportService;

#[derive(Parser, Debug)]
#[command(name = "ridership-loader")]
#[command(about = "Load zipped monthly ridership workbooks into a Postgres table", long_about = None)]
struct Cli {
    /// Directory containing the zipped workbooks
    #[arg(long, env)]
    archive_dir: PathBuf,

    /// Directory the archives are expanded into (also holds the staging CSV)
    #[arg(long, env)]
    working_dir: PathBuf,

    /// Destination database; omit to only write the staging CSV
    #[arg(long, env, hide_env_values = true)]
    database_url: Option<String>,

    /// Destination schema
    #[arg(long, env = "RIDERSHIP_SCHEMA", default_value = DEFAULT_SCHEMA)]
    schema: String,

    /// Destination table (dropped and recreated on every run)
    #[arg(long, env = "RIDERSHIP_TABLE", default_value = DEFAULT_TABLE)]
    table: String,

    /// Name of the staging CSV inside the working directory
    #[arg(long, env, default_value = DEFAULT_STAGING_FILE_NAME)]
    staging_file_name: String,

    /// Keep the staging CSV after a successful load
    #[arg(long, env)]
    keep_staging: bool,
}

impl From<Cli> for Config {
    fn from(cli: Cli) -> Self {
        Config {
            archive_dir: cli.archive_dir,
            working_dir: cli.working_dir,
            database_url: cli.database_url,
            schema: cli.schema,
            table: cli.table,
            staging_file_name: cli.staging_file_name,
            keep_staging: cli.keep_staging,
        }
    }
}

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env before clap reads its env fallbacks
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,ridership_loader=debug")),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_line_number(true),
        )
        .init();

    let config = Config::from(Cli::parse());
    info!(
        "Loading archives from {} via {} into {}.{}",
        config.archive_dir.display(),
        config.working_dir.display(),
        config.schema,
        config.table
    );

    // Validate names before touching the working directory
    let table = QualifiedTable::new(&config.schema, &config.table)?;

    let repo = match &config.database_url {
        Some(url) => {
            info!("Connecting to database...");
            let pool = PgPoolOptions::new()
                .max_connections(1)
                .connect(url)
                .await?;
            info!("Database connection established");
            Some(RidershipTableRepository::new(pool, table))
        }
        None => None,
    };

    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")?
            .progress_chars("##-"),
    );

    let summary = RidershipImportService::new(config, repo)
        .with_progress(pb)
        .run()
        .await?;

    match summary.rows_loaded {
        Some(rows) => info!("Loaded {} rows ({:.1}s)", rows, summary.duration_secs),
        None => info!(
            "Staged {} records to {} ({:.1}s)",
            summary.records_staged,
            summary.staging_path.display(),
            summary.duration_secs
        ),
    }

    Ok(())
}
