//! Library exports for reuse in the CLI binaries and tests.
/// Pascal VOC annotation parsing.
pub mod annotation;
/// Run configuration loading and validation.
pub mod config;
/// Image/annotation pair discovery.
pub mod discovery;
/// Tabular CSV export of annotation directories.
pub mod export;
/// Representative-class assignment and grouping.
pub mod grouping;
/// Ordered label-map handling.
pub mod labelmap;
/// Logging setup.
pub mod logging;
/// Stratified train/validation/test partitioning.
pub mod partition;
/// End-to-end split pipeline and run summary.
pub mod pipeline;
/// Relocation of partitioned file pairs.
pub mod relocate;
