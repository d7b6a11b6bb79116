//! Tabular CSV export of annotation directories.
//!
//! Emits one row per labeled object, in the
//! `filename,width,height,class,xmin,ymin,xmax,ymax` layout consumed by
//! downstream training tooling. Runs over post-split directories, so the
//! partitioner must have run first.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

use crate::annotation::parse_annotation;

/// Errors raised while exporting one directory.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Annotation directory is not a directory: {0}")]
    InvalidRoot(PathBuf),
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to write CSV {path}: {source}")]
    Csv { path: PathBuf, source: csv::Error },
}

/// Summary of one export run.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvExportSummary {
    /// Annotation files successfully exported.
    pub files: usize,
    /// Object rows written.
    pub rows: usize,
    /// Annotation files skipped because they could not be parsed.
    pub skipped: usize,
}

const CSV_HEADER: [&str; 8] = [
    "filename", "width", "height", "class", "xmin", "ymin", "xmax", "ymax",
];

/// Export every `.xml` annotation directly under `dir` into `out_path`.
///
/// Unparsable annotations are skipped with a warning and counted; they
/// never abort the export.
pub fn export_label_csv(dir: &Path, out_path: &Path) -> Result<CsvExportSummary, ExportError> {
    if !dir.is_dir() {
        return Err(ExportError::InvalidRoot(dir.to_path_buf()));
    }

    let mut annotation_paths: Vec<PathBuf> = std::fs::read_dir(dir)
        .map_err(|source| ExportError::Io {
            path: dir.to_path_buf(),
            source,
        })?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("xml"))
        })
        .collect();
    annotation_paths.sort();

    let mut writer = csv::Writer::from_path(out_path).map_err(|source| ExportError::Csv {
        path: out_path.to_path_buf(),
        source,
    })?;
    let map_csv = |source: csv::Error| ExportError::Csv {
        path: out_path.to_path_buf(),
        source,
    };
    writer.write_record(CSV_HEADER).map_err(map_csv)?;

    let mut summary = CsvExportSummary::default();
    for path in annotation_paths {
        let annotation = match parse_annotation(&path) {
            Ok(annotation) => annotation,
            Err(err) => {
                warn!(
                    annotation = %path.display(),
                    error = %err,
                    "Skipping unparsable annotation during CSV export"
                );
                summary.skipped += 1;
                continue;
            }
        };
        for object in &annotation.objects {
            writer
                .write_record([
                    annotation.filename.clone(),
                    annotation.size.width.to_string(),
                    annotation.size.height.to_string(),
                    object.name.clone(),
                    object.bndbox.xmin.to_string(),
                    object.bndbox.ymin.to_string(),
                    object.bndbox.xmax.to_string(),
                    object.bndbox.ymax.to_string(),
                ])
                .map_err(map_csv)?;
            summary.rows += 1;
        }
        summary.files += 1;
    }
    writer.flush().map_err(|source| ExportError::Io {
        path: out_path.to_path_buf(),
        source,
    })?;

    info!(
        dir = %dir.display(),
        out = %out_path.display(),
        files = summary.files,
        rows = summary.rows,
        skipped = summary.skipped,
        "Exported annotation CSV"
    );
    Ok(summary)
}
