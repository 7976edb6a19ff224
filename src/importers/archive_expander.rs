use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};
use zip::ZipArchive;

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read archive {path}: {source}")]
    Zip {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },
}

impl ArchiveError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        ArchiveError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Recursively list every non-hidden file under `root`
///
/// Hidden means the file name starts with `.`; hidden directories are still
/// descended into. Paths are returned sorted so repeated runs see the same order.
pub fn list_files(root: impl AsRef<Path>) -> Result<Vec<PathBuf>, ArchiveError> {
    let mut files = Vec::new();
    collect_files(root.as_ref(), &mut files)?;
    files.sort();
    Ok(files)
}

fn collect_files(dir: &Path, files: &mut Vec<PathBuf>) -> Result<(), ArchiveError> {
    let entries = fs::read_dir(dir).map_err(|e| ArchiveError::io(dir, e))?;

    for entry in entries {
        let entry = entry.map_err(|e| ArchiveError::io(dir, e))?;
        let path = entry.path();
        let file_type = entry.file_type().map_err(|e| ArchiveError::io(&path, e))?;

        if file_type.is_dir() {
            collect_files(&path, files)?;
        } else if !entry.file_name().to_string_lossy().starts_with('.') {
            files.push(path);
        }
    }

    Ok(())
}

/// Extract every archive under `archive_dir` into `output_dir`
///
/// Returns the listing of `output_dir` after extraction. Any file that is not a
/// readable zip archive aborts the whole expansion.
pub fn expand_archives(
    archive_dir: impl AsRef<Path>,
    output_dir: impl AsRef<Path>,
) -> Result<Vec<PathBuf>, ArchiveError> {
    let archive_dir = archive_dir.as_ref();
    let output_dir = output_dir.as_ref();

    fs::create_dir_all(output_dir).map_err(|e| ArchiveError::io(output_dir, e))?;

    let archives = list_files(archive_dir)?;
    info!(
        "Expanding {} archives from {} into {}",
        archives.len(),
        archive_dir.display(),
        output_dir.display()
    );

    for archive_path in &archives {
        let file = File::open(archive_path).map_err(|e| ArchiveError::io(archive_path, e))?;
        let mut archive =
            ZipArchive::new(BufReader::new(file)).map_err(|e| ArchiveError::Zip {
                path: archive_path.clone(),
                source: e,
            })?;

        debug!(
            "Extracting {} entries from {}",
            archive.len(),
            archive_path.display()
        );

        archive.extract(output_dir).map_err(|e| ArchiveError::Zip {
            path: archive_path.clone(),
            source: e,
        })?;
    }

    list_files(output_dir)
}
