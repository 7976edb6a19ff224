use indicatif::ProgressBar;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, instrument, warn};

use crate::config::Config;
use crate::db::{DbError, RidershipTableRepository};
use crate::importers::{expand_archives, ArchiveError, ExcelImportError, ExcelImporter, RiderRecord};
use crate::staging::{stage, StagingError};

/// Error types for a ridership import run
#[derive(Debug, thiserror::Error)]
pub enum RidershipImportError {
    #[error("Archive expansion failed: {0}")]
    Archive(#[from] ArchiveError),

    #[error("Failed to reshape {path}: {source}")]
    Workbook {
        path: PathBuf,
        #[source]
        source: ExcelImportError,
    },

    #[error("Staging failed: {0}")]
    Staging(#[from] StagingError),

    #[error("Destination error: {0}")]
    Database(#[from] DbError),

    #[error("Staging task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Result of the expand/reshape/stage phase
#[derive(Debug, Clone)]
pub struct StagingOutcome {
    pub workbooks: usize,
    pub records: usize,
    pub staging_path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct ImportSummary {
    pub workbooks: usize,
    pub records_staged: usize,
    /// `None` for a stage-only run
    pub rows_loaded: Option<u64>,
    pub staging_path: PathBuf,
    pub duration_secs: f64,
}

/// Runs expand -> reshape -> stage -> load for one configuration
pub struct RidershipImportService {
    config: Config,
    repo: Option<RidershipTableRepository>,
    progress: ProgressBar,
}

impl RidershipImportService {
    pub fn new(config: Config, repo: Option<RidershipTableRepository>) -> Self {
        Self {
            config,
            repo,
            progress: ProgressBar::hidden(),
        }
    }

    /// Report workbook reshaping on `progress`
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    /// Expand every archive, reshape every workbook and write the staging CSV
    ///
    /// Blocking; the whole record set is held in memory until it is staged.
    pub fn stage_workbooks(
        config: &Config,
        progress: &ProgressBar,
    ) -> Result<StagingOutcome, RidershipImportError> {
        let staging_path = config.staging_path();
        let expanded = expand_archives(&config.archive_dir, &config.working_dir)?;

        let workbooks: Vec<PathBuf> = expanded
            .into_iter()
            .filter(|path| {
                let is_staging = *path == staging_path;
                if is_staging {
                    warn!("Ignoring leftover staging file {}", path.display());
                }
                !is_staging
            })
            .collect();
        info!("Reshaping {} workbooks", workbooks.len());

        progress.set_length(workbooks.len() as u64);
        let mut batches: Vec<Vec<RiderRecord>> = Vec::with_capacity(workbooks.len());
        for path in &workbooks {
            progress.set_message(
                path.file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_default(),
            );
            let records = ExcelImporter::new(path)
                .import()
                .map_err(|source| RidershipImportError::Workbook {
                    path: path.clone(),
                    source,
                })?;
            batches.push(records);
            progress.inc(1);
        }

        let records = stage(batches.iter(), &staging_path)?;
        progress.finish_with_message(format!("✓ Staged {records} records"));

        Ok(StagingOutcome {
            workbooks: workbooks.len(),
            records,
            staging_path,
        })
    }

    /// Full pipeline run
    ///
    /// Without a destination the staging CSV is left on disk. With one, the
    /// table is recreated, checked and loaded, and the CSV is removed unless
    /// `keep_staging` is set.
    #[instrument(skip(self), fields(archive_dir = %self.config.archive_dir.display()))]
    pub async fn run(&self) -> Result<ImportSummary, RidershipImportError> {
        let start_time = Instant::now();

        let config = self.config.clone();
        let progress = self.progress.clone();
        let outcome =
            tokio::task::spawn_blocking(move || Self::stage_workbooks(&config, &progress)).await??;

        let rows_loaded = match &self.repo {
            None => {
                info!(
                    "No destination configured, staging file left at {}",
                    outcome.staging_path.display()
                );
                None
            }
            Some(repo) if self.config.keep_staging => {
                repo.ensure_table().await?;
                repo.verify_columns().await?;
                Some(repo.copy_from_file(&outcome.staging_path).await?)
            }
            Some(repo) => Some(repo.load(&outcome.staging_path).await?),
        };

        let duration = start_time.elapsed();
        info!(
            "✓ Ridership import complete ({:.1}s, {} workbooks, {} records)",
            duration.as_secs_f64(),
            outcome.workbooks,
            outcome.records
        );

        Ok(ImportSummary {
            workbooks: outcome.workbooks,
            records_staged: outcome.records,
            rows_loaded,
            staging_path: outcome.staging_path,
            duration_secs: duration.as_secs_f64(),
        })
    }
}
