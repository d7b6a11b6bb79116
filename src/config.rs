//! Run configuration for the split pipeline.
//!
//! Everything a run needs is carried in an explicit [`SplitConfig`] passed
//! into each component; there is no ambient or module-level state. Configs
//! can be loaded from a TOML file, with every omitted field falling back to
//! its default.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::partition::Partition;

/// Image extensions accepted by default, matched case-insensitively.
pub const DEFAULT_IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "bmp"];
/// Annotation extension used by default (Pascal VOC XML).
pub const DEFAULT_ANNOTATION_EXTENSION: &str = "xml";

/// Tolerance when checking that the split ratios sum to 1.0.
const RATIO_SUM_EPSILON: f64 = 1e-6;

/// Errors raised while loading or validating a configuration.
///
/// All of these are fatal and abort a run before any filesystem mutation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config file {path}: {source}")]
    ParseToml {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Split ratios must sum to 1.0: train={train}, val={val}, test={test}")]
    RatioSum { train: f64, val: f64, test: f64 },
    #[error("Split ratio `{name}` must be within [0, 1], got {value}")]
    RatioRange { name: &'static str, value: f64 },
    #[error("Source directory does not exist: {0}")]
    SourceDirMissing(PathBuf),
    #[error("No image extensions configured")]
    NoImageExtensions,
    #[error("Annotation extension must not be empty")]
    EmptyAnnotationExtension,
}

/// Target fractions for each partition. Must sum to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct SplitRatios {
    pub train: f64,
    pub val: f64,
    pub test: f64,
}

impl Default for SplitRatios {
    fn default() -> Self {
        Self {
            train: 0.7,
            val: 0.15,
            test: 0.15,
        }
    }
}

impl SplitRatios {
    /// Check that each ratio is within `[0, 1]` and the three sum to 1.0.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [("train", self.train), ("val", self.val), ("test", self.test)] {
            if !(0.0..=1.0).contains(&value) || !value.is_finite() {
                return Err(ConfigError::RatioRange { name, value });
            }
        }
        let sum = self.train + self.val + self.test;
        if (sum - 1.0).abs() > RATIO_SUM_EPSILON {
            return Err(ConfigError::RatioSum {
                train: self.train,
                val: self.val,
                test: self.test,
            });
        }
        Ok(())
    }
}

/// Destination directory for each partition.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct OutputDirs {
    pub train: PathBuf,
    pub validation: PathBuf,
    pub test: PathBuf,
}

impl Default for OutputDirs {
    fn default() -> Self {
        Self {
            train: PathBuf::from("dataset/train"),
            validation: PathBuf::from("dataset/validation"),
            test: PathBuf::from("dataset/test"),
        }
    }
}

impl OutputDirs {
    /// Destination directory for a partition.
    pub fn for_partition(&self, partition: Partition) -> &Path {
        match partition {
            Partition::Train => &self.train,
            Partition::Validation => &self.validation,
            Partition::Test => &self.test,
        }
    }
}

/// Full configuration for one split run.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    /// Root directory scanned for image/annotation pairs.
    pub source_dir: PathBuf,
    /// Newline-separated ordered class names.
    pub labelmap_path: PathBuf,
    /// Destination directory per partition, created if absent.
    pub output_dirs: OutputDirs,
    /// Accepted image extensions, matched case-insensitively.
    pub image_extensions: Vec<String>,
    /// Extension of the paired annotation file.
    pub annotation_extension: String,
    /// Target partition fractions.
    pub split_ratios: SplitRatios,
    /// Seed for the per-class shuffle; the same seed and input set always
    /// produce the same assignment.
    pub random_seed: u64,
    /// Plan and report without touching the filesystem.
    pub dry_run: bool,
    /// Replace destination files instead of failing on collision.
    pub overwrite: bool,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("dataset/all"),
            labelmap_path: PathBuf::from("labelmap.txt"),
            output_dirs: OutputDirs::default(),
            image_extensions: DEFAULT_IMAGE_EXTENSIONS
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
            annotation_extension: DEFAULT_ANNOTATION_EXTENSION.to_string(),
            split_ratios: SplitRatios::default(),
            random_seed: 42,
            dry_run: false,
            overwrite: false,
        }
    }
}

impl SplitConfig {
    /// Validate everything that must hold before any filesystem mutation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.split_ratios.validate()?;
        if self.image_extensions.is_empty() {
            return Err(ConfigError::NoImageExtensions);
        }
        if self.annotation_extension.is_empty() {
            return Err(ConfigError::EmptyAnnotationExtension);
        }
        if !self.source_dir.is_dir() {
            return Err(ConfigError::SourceDirMissing(self.source_dir.clone()));
        }
        Ok(())
    }
}

/// Load a [`SplitConfig`] from a TOML file, defaulting omitted fields.
pub fn load_config(path: &Path) -> Result<SplitConfig, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&text).map_err(|source| ConfigError::ParseToml {
        path: path.to_path_buf(),
        source,
    })
}
