//! End-to-end split pipeline.
//!
//! Stages run strictly forward: discovery, grouping, partitioning,
//! relocation. Configuration is validated up front so every fatal error
//! aborts before any filesystem mutation.

use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::config::{ConfigError, SplitConfig};
use crate::discovery::{DiscoveryError, discover_samples};
use crate::grouping::{SkippedSample, group_samples};
use crate::labelmap::{LabelMap, LabelMapError};
use crate::partition::{PartitionCounts, SmallClassSkip, stratified_partition};
use crate::relocate::{RelocationHalt, execute_plan};

/// Any failure that aborts a split run.
#[derive(Debug, Error)]
pub enum SplitError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    LabelMap(#[from] LabelMapError),
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),
    #[error(transparent)]
    Relocation(#[from] Box<RelocationHalt>),
}

/// Per-class partition counts for the run summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassSummary {
    pub class: String,
    pub counts: PartitionCounts,
}

/// Structured report of one completed run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// Image files seen during discovery.
    pub images_seen: usize,
    /// Images successfully paired with an annotation.
    pub samples_paired: usize,
    /// Images skipped for lack of a same-stem annotation.
    pub missing_annotation: usize,
    /// Images skipped because their stem was already paired.
    pub duplicate_stems: usize,
    /// Samples excluded during grouping, with reasons.
    pub skipped_samples: Vec<SkippedSample>,
    /// Classes too small to split, reported rather than dropped.
    pub skipped_small_classes: Vec<SmallClassSkip>,
    /// Partition counts per representative class, in label-map order.
    pub per_class: Vec<ClassSummary>,
    /// Partition counts across all classes.
    pub totals: PartitionCounts,
    /// True when the run mutated nothing.
    pub dry_run: bool,
}

/// Run the full pipeline described by `config`.
///
/// On success the summary covers everything: moved counts per partition and
/// per class, plus every skipped sample and class. On a relocation failure
/// the returned [`RelocationHalt`] reports exactly which moves were
/// committed, so a re-run (which simply no longer discovers the moved
/// samples) is well-defined.
pub fn run_split(config: &SplitConfig) -> Result<RunSummary, SplitError> {
    config.validate()?;
    let labelmap = LabelMap::load(&config.labelmap_path)?;
    info!(
        source = %config.source_dir.display(),
        classes = labelmap.len(),
        dry_run = config.dry_run,
        "Starting stratified split"
    );

    let discovered = discover_samples(
        &config.source_dir,
        &config.image_extensions,
        &config.annotation_extension,
    )?;
    let stats = discovered.stats;
    let samples_paired = discovered.samples.len();

    let grouped = group_samples(discovered.samples, &labelmap);
    let plan = stratified_partition(grouped.groups, &config.split_ratios, config.random_seed);

    let mut per_class: Vec<ClassSummary> = Vec::new();
    for assignment in &plan.assignments {
        match per_class
            .iter_mut()
            .find(|summary| summary.class == assignment.class)
        {
            Some(summary) => summary.counts.bump(assignment.partition),
            None => {
                let mut counts = PartitionCounts::default();
                counts.bump(assignment.partition);
                per_class.push(ClassSummary {
                    class: assignment.class.clone(),
                    counts,
                });
            }
        }
    }

    let report = execute_plan(
        &plan,
        &config.output_dirs,
        config.dry_run,
        config.overwrite,
    )
    .map_err(Box::new)?;

    let summary = RunSummary {
        images_seen: stats.images_seen,
        samples_paired,
        missing_annotation: stats.missing_annotation,
        duplicate_stems: stats.duplicate_stems,
        skipped_samples: grouped.skipped,
        skipped_small_classes: plan.skipped_small_classes,
        per_class,
        totals: report.per_partition,
        dry_run: report.dry_run,
    };
    info!(
        paired = summary.samples_paired,
        train = summary.totals.train,
        validation = summary.totals.validation,
        test = summary.totals.test,
        skipped = summary.skipped_samples.len(),
        "Split complete"
    );
    Ok(summary)
}
