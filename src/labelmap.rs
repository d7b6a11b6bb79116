//! Ordered label map.
//!
//! The label map is a newline-separated list of class names whose order is
//! significant: when a sample carries several valid classes, the first one
//! in label-map order becomes its representative class.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors raised while loading a label map. Fatal for the run.
#[derive(Debug, Error)]
pub enum LabelMapError {
    #[error("Failed to read label map {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Label map {path} contains no class names")]
    Empty { path: PathBuf },
    #[error("Duplicate class `{class}` in label map {path}")]
    Duplicate { path: PathBuf, class: String },
}

/// Ordered set of known class names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelMap {
    classes: Vec<String>,
}

impl LabelMap {
    /// Build a label map from already-ordered class names, without
    /// validation. Prefer [`LabelMap::load`] for user input.
    pub fn from_classes(classes: Vec<String>) -> Self {
        Self { classes }
    }

    /// Load a label map file: one class per line, blank lines ignored,
    /// surrounding whitespace trimmed.
    pub fn load(path: &Path) -> Result<Self, LabelMapError> {
        let text = std::fs::read_to_string(path).map_err(|source| LabelMapError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut classes: Vec<String> = Vec::new();
        for line in text.lines() {
            let class = line.trim();
            if class.is_empty() {
                continue;
            }
            if classes.iter().any(|existing| existing == class) {
                return Err(LabelMapError::Duplicate {
                    path: path.to_path_buf(),
                    class: class.to_string(),
                });
            }
            classes.push(class.to_string());
        }
        if classes.is_empty() {
            return Err(LabelMapError::Empty {
                path: path.to_path_buf(),
            });
        }
        Ok(Self { classes })
    }

    /// Class names in declaration order.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn contains(&self, class: &str) -> bool {
        self.classes.iter().any(|existing| existing == class)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}
