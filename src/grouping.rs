//! Representative-class assignment and grouping.
//!
//! Each sample is stratified by a single representative class: the first
//! class in label-map declaration order that occurs among its annotated
//! objects. Document order inside the annotation never influences the
//! choice, so which class "claims" a multi-class image is deterministic.

use std::collections::HashSet;

use serde::Serialize;
use tracing::warn;

use crate::annotation::parse_annotation;
use crate::discovery::Sample;
use crate::labelmap::LabelMap;

/// Why a discovered sample was excluded from partitioning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The annotation file could not be parsed.
    UnparsableAnnotation { detail: String },
    /// No annotated class belongs to the label map.
    NoValidClass,
}

/// One excluded sample with its reason, reported in the run summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedSample {
    pub stem: String,
    pub reason: SkipReason,
}

/// All samples sharing one representative class.
#[derive(Debug, Clone)]
pub struct ClassGroup {
    pub class: String,
    pub samples: Vec<Sample>,
}

/// Output of grouping: class groups in label-map order plus recorded skips.
#[derive(Debug, Clone)]
pub struct Grouped {
    pub groups: Vec<ClassGroup>,
    pub skipped: Vec<SkippedSample>,
}

/// Pick the representative class for a set of annotated class names:
/// the first label-map class present in the set, or `None` when the
/// intersection is empty.
pub fn representative_class<'map>(
    labelmap: &'map LabelMap,
    present: &HashSet<&str>,
) -> Option<&'map str> {
    labelmap
        .classes()
        .iter()
        .map(String::as_str)
        .find(|class| present.contains(class))
}

/// Parse each sample's annotation and group samples by representative
/// class. Unparsable annotations and samples without a valid class are
/// recorded as skips; processing continues.
pub fn group_samples(samples: Vec<Sample>, labelmap: &LabelMap) -> Grouped {
    let mut buckets: Vec<Vec<Sample>> = vec![Vec::new(); labelmap.len()];
    let mut skipped = Vec::new();

    for sample in samples {
        let annotation = match parse_annotation(&sample.annotation_path) {
            Ok(annotation) => annotation,
            Err(err) => {
                warn!(
                    annotation = %sample.annotation_path.display(),
                    error = %err,
                    "Skipping sample with unparsable annotation"
                );
                skipped.push(SkippedSample {
                    stem: sample.stem,
                    reason: SkipReason::UnparsableAnnotation {
                        detail: err.to_string(),
                    },
                });
                continue;
            }
        };
        let present: HashSet<&str> = annotation.class_names().collect();
        let Some(class) = representative_class(labelmap, &present) else {
            warn!(
                annotation = %sample.annotation_path.display(),
                "Skipping sample with no class from the label map"
            );
            skipped.push(SkippedSample {
                stem: sample.stem,
                reason: SkipReason::NoValidClass,
            });
            continue;
        };
        let index = labelmap
            .classes()
            .iter()
            .position(|candidate| candidate == class)
            .unwrap_or_default();
        buckets[index].push(sample);
    }

    let groups = labelmap
        .classes()
        .iter()
        .zip(buckets)
        .filter(|(_, samples)| !samples.is_empty())
        .map(|(class, samples)| ClassGroup {
            class: class.clone(),
            samples,
        })
        .collect();

    Grouped { groups, skipped }
}
