//! Relocation of partitioned image/annotation pairs.
//!
//! Each pair is moved as one logical transaction built from two renames.
//! The executor commits one sample at a time, so a failure partway through
//! leaves the filesystem introspectable: already-moved samples are simply
//! absent from the next discovery pass, and the halt error reports exactly
//! what was committed.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::OutputDirs;
use crate::partition::{PartitionCounts, PartitionPlan};

/// Errors that can occur while relocating a single sample.
#[derive(Debug, Error)]
pub enum RelocationError {
    #[error("Failed to create destination directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Destination already exists (pass overwrite to replace): {path}")]
    DestinationExists { path: PathBuf },
    #[error("Failed to remove existing destination {path}: {source}")]
    Overwrite {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to move {from} to {to}: {source}")]
    Move {
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },
    #[error(
        "Annotation move failed after its image was relocated; \
         image now at {image}, annotation stranded at {annotation}: {source}"
    )]
    OrphanedAnnotation {
        image: PathBuf,
        annotation: PathBuf,
        source: std::io::Error,
    },
}

/// Counts of committed moves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RelocationReport {
    /// Samples whose image and annotation both reached their destination
    /// (or would have, under a dry run).
    pub moved_samples: usize,
    pub per_partition: PartitionCounts,
    /// True when no filesystem mutation was performed.
    pub dry_run: bool,
}

/// A relocation failure, carrying the report of everything committed
/// before the halt so a re-run is well-defined.
#[derive(Debug, Error)]
#[error(
    "Relocation halted on sample `{stem}` after {} committed moves: {source}",
    report.moved_samples
)]
pub struct RelocationHalt {
    pub report: RelocationReport,
    /// Stem of the sample that failed.
    pub stem: String,
    pub source: RelocationError,
}

/// Execute a partition plan: move each sample's image and annotation into
/// the destination directory for its partition, preserving filenames.
///
/// Destination directories are created idempotently. Existing destination
/// files fail loudly unless `overwrite` is set. Under `dry_run` the same
/// planning and collision checks run, but nothing is touched.
pub fn execute_plan(
    plan: &PartitionPlan,
    output_dirs: &OutputDirs,
    dry_run: bool,
    overwrite: bool,
) -> Result<RelocationReport, RelocationHalt> {
    let mut report = RelocationReport {
        dry_run,
        ..RelocationReport::default()
    };

    for assignment in &plan.assignments {
        let sample = &assignment.sample;
        let dest_dir = output_dirs.for_partition(assignment.partition);
        let halt = |source: RelocationError, report: RelocationReport| RelocationHalt {
            report,
            stem: sample.stem.clone(),
            source,
        };

        if !dry_run {
            // create_dir_all does not fail on an already-existing directory.
            if let Err(source) = fs::create_dir_all(dest_dir) {
                return Err(halt(
                    RelocationError::CreateDir {
                        path: dest_dir.to_path_buf(),
                        source,
                    },
                    report,
                ));
            }
        }

        let image_dest = match destination(&sample.image_path, dest_dir) {
            Ok(dest) => dest,
            Err(source) => return Err(halt(source, report)),
        };
        let annotation_dest = match destination(&sample.annotation_path, dest_dir) {
            Ok(dest) => dest,
            Err(source) => return Err(halt(source, report)),
        };

        for dest in [&image_dest, &annotation_dest] {
            if !dest.exists() {
                continue;
            }
            if !overwrite {
                return Err(halt(
                    RelocationError::DestinationExists { path: dest.clone() },
                    report,
                ));
            }
            if !dry_run {
                if let Err(source) = fs::remove_file(dest) {
                    return Err(halt(
                        RelocationError::Overwrite {
                            path: dest.clone(),
                            source,
                        },
                        report,
                    ));
                }
            }
        }

        if dry_run {
            debug!(
                image = %sample.image_path.display(),
                dest = %image_dest.display(),
                "Dry run: would move sample"
            );
        } else {
            if let Err(source) = fs::rename(&sample.image_path, &image_dest) {
                return Err(halt(
                    RelocationError::Move {
                        from: sample.image_path.clone(),
                        to: image_dest,
                        source,
                    },
                    report,
                ));
            }
            if let Err(source) = fs::rename(&sample.annotation_path, &annotation_dest) {
                // The image rename already committed; surface the partial
                // state instead of hiding it.
                return Err(halt(
                    RelocationError::OrphanedAnnotation {
                        image: image_dest,
                        annotation: sample.annotation_path.clone(),
                        source,
                    },
                    report,
                ));
            }
            debug!(
                image = %sample.image_path.display(),
                dest = %image_dest.display(),
                partition = assignment.partition.as_str(),
                "Moved sample"
            );
        }

        report.moved_samples += 1;
        report.per_partition.bump(assignment.partition);
    }

    info!(
        moved = report.moved_samples,
        train = report.per_partition.train,
        validation = report.per_partition.validation,
        test = report.per_partition.test,
        dry_run,
        "Relocation finished"
    );
    Ok(report)
}

fn destination(source: &Path, dest_dir: &Path) -> Result<PathBuf, RelocationError> {
    let name = source.file_name().ok_or_else(|| RelocationError::Move {
        from: source.to_path_buf(),
        to: dest_dir.to_path_buf(),
        source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no file name"),
    })?;
    Ok(dest_dir.join(name))
}
