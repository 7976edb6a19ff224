use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::importers::RiderRecord;

/// Header row of the staging artifact, in column order
pub const STAGING_HEADER: [&str; 6] = [
    "mon",
    "year",
    "daytype",
    "Entry stations",
    "Exit stations",
    "riders",
];

#[derive(Error, Debug)]
pub enum StagingError {
    #[error("CSV error in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Staging file {0} has no header row")]
    MissingHeader(PathBuf),
}

/// Concatenate per-file record batches into one CSV at `output_path`
///
/// Any existing file is overwritten. The header is written even when there are
/// no records. Returns the number of data rows written.
#[instrument(skip_all, fields(path = %output_path.as_ref().display()))]
pub fn stage<I>(records_per_file: I, output_path: impl AsRef<Path>) -> Result<usize, StagingError>
where
    I: IntoIterator,
    I::Item: AsRef<[RiderRecord]>,
{
    let path = output_path.as_ref();
    let csv_err = |source| StagingError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(csv_err)?;
    writer.write_record(STAGING_HEADER).map_err(csv_err)?;

    let mut written = 0;
    for (file_idx, batch) in records_per_file.into_iter().enumerate() {
        let batch = batch.as_ref();
        for record in batch {
            writer.serialize(record).map_err(csv_err)?;
        }
        debug!("Staged batch {} ({} records)", file_idx, batch.len());
        written += batch.len();
    }

    writer.flush().map_err(|source| StagingError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    info!("Staged {} records to {}", written, path.display());
    Ok(written)
}

/// Read the header row of a staged CSV
pub fn read_header(path: impl AsRef<Path>) -> Result<Vec<String>, StagingError> {
    let path = path.as_ref();
    let csv_err = |source| StagingError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(csv_err)?;

    let mut record = csv::StringRecord::new();
    if !reader.read_record(&mut record).map_err(csv_err)? {
        return Err(StagingError::MissingHeader(path.to_path_buf()));
    }

    Ok(record.iter().map(str::to_string).collect())
}
