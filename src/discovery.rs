//! Discovery of image/annotation pairs under a source root.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

/// One image plus its paired annotation, treated as an indivisible unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    /// Base filename without extension.
    pub stem: String,
    pub image_path: PathBuf,
    pub annotation_path: PathBuf,
}

/// Counts accumulated during one discovery pass.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiscoveryStats {
    /// Image files whose extension matched the accepted set.
    pub images_seen: usize,
    /// Images skipped because no same-stem annotation exists.
    pub missing_annotation: usize,
    /// Images skipped because another image with the same stem in the same
    /// directory was already paired.
    pub duplicate_stems: usize,
}

/// Result of one discovery pass.
#[derive(Debug, Clone)]
pub struct Discovered {
    /// Paired samples, sorted by image path so downstream seeding is
    /// reproducible.
    pub samples: Vec<Sample>,
    pub stats: DiscoveryStats,
}

/// Errors that can occur while scanning the source root.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("Source root is not a directory: {0}")]
    InvalidRoot(PathBuf),
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Recursively scan `root` for accepted images and pair each with its
/// same-stem annotation file.
///
/// Extensions are matched case-insensitively in a single walk, so `a.jpg`
/// and `a.JPG` can never be discovered twice through different patterns.
/// Images without an annotation are counted as skips, not errors. Two
/// images sharing a stem in the same directory would claim the same
/// annotation, so only the first (in path order) is kept.
pub fn discover_samples(
    root: &Path,
    image_extensions: &[String],
    annotation_extension: &str,
) -> Result<Discovered, DiscoveryError> {
    if !root.is_dir() {
        return Err(DiscoveryError::InvalidRoot(root.to_path_buf()));
    }

    let mut candidates = Vec::new();
    visit_dir(root, &mut |path| {
        if is_accepted_image(path, image_extensions) {
            candidates.push(path.to_path_buf());
        }
    })?;
    candidates.sort();

    let mut stats = DiscoveryStats::default();
    let mut samples = Vec::new();
    let mut claimed: HashSet<PathBuf> = HashSet::new();
    for image_path in candidates {
        stats.images_seen += 1;
        let annotation_path = image_path.with_extension(annotation_extension);
        if !annotation_path.is_file() {
            debug!(image = %image_path.display(), "No annotation for image, skipping");
            stats.missing_annotation += 1;
            continue;
        }
        if !claimed.insert(annotation_path.clone()) {
            warn!(
                image = %image_path.display(),
                annotation = %annotation_path.display(),
                "Annotation already claimed by another image with the same stem, skipping"
            );
            stats.duplicate_stems += 1;
            continue;
        }
        let stem = image_path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        samples.push(Sample {
            stem,
            image_path,
            annotation_path,
        });
    }

    Ok(Discovered { samples, stats })
}

fn visit_dir(root: &Path, visitor: &mut impl FnMut(&Path)) -> Result<(), DiscoveryError> {
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(source) if dir != root => {
                warn!(
                    dir = %dir.display(),
                    error = %source,
                    "Failed to read directory during discovery"
                );
                continue;
            }
            Err(source) => {
                return Err(DiscoveryError::Io {
                    path: dir.clone(),
                    source,
                });
            }
        };
        for entry_result in entries {
            let entry = match entry_result {
                Ok(entry) => entry,
                Err(err) => {
                    warn!(
                        dir = %dir.display(),
                        error = %err,
                        "Failed to read directory entry during discovery"
                    );
                    continue;
                }
            };
            let path = entry.path();
            let file_type = match entry.file_type() {
                Ok(file_type) => file_type,
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "Failed to read file type during discovery"
                    );
                    continue;
                }
            };
            if file_type.is_symlink() {
                continue;
            }
            if file_type.is_dir() {
                stack.push(path);
                continue;
            }
            if file_type.is_file() {
                visitor(&path);
            }
        }
    }
    Ok(())
}

fn is_accepted_image(path: &Path, image_extensions: &[String]) -> bool {
    path.extension().is_some_and(|ext| {
        image_extensions
            .iter()
            .any(|accepted| ext.eq_ignore_ascii_case(accepted.as_str()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn jpg_extensions() -> Vec<String> {
        vec!["jpg".to_string(), "png".to_string()]
    }

    fn touch(path: &Path) {
        std::fs::write(path, b"x").unwrap();
    }

    #[test]
    fn pairs_images_with_same_stem_annotations() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("a.jpg"));
        touch(&dir.path().join("a.xml"));
        touch(&dir.path().join("b.jpg"));
        // b has no annotation
        touch(&dir.path().join("notes.txt"));

        let discovered = discover_samples(dir.path(), &jpg_extensions(), "xml").unwrap();
        assert_eq!(discovered.samples.len(), 1);
        assert_eq!(discovered.samples[0].stem, "a");
        assert_eq!(discovered.stats.images_seen, 2);
        assert_eq!(discovered.stats.missing_annotation, 1);
    }

    #[test]
    fn extension_match_is_case_insensitive() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("shout.JPG"));
        touch(&dir.path().join("shout.xml"));

        let discovered = discover_samples(dir.path(), &jpg_extensions(), "xml").unwrap();
        assert_eq!(discovered.samples.len(), 1);
        assert_eq!(discovered.stats.images_seen, 1);
    }

    #[test]
    fn nested_directories_are_walked() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("nested/deeper");
        std::fs::create_dir_all(&nested).unwrap();
        touch(&nested.join("c.png"));
        touch(&nested.join("c.xml"));

        let discovered = discover_samples(dir.path(), &jpg_extensions(), "xml").unwrap();
        assert_eq!(discovered.samples.len(), 1);
        assert_eq!(discovered.samples[0].annotation_path, nested.join("c.xml"));
    }

    #[test]
    fn second_image_with_same_stem_is_skipped() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("a.jpg"));
        touch(&dir.path().join("a.png"));
        touch(&dir.path().join("a.xml"));

        let discovered = discover_samples(dir.path(), &jpg_extensions(), "xml").unwrap();
        assert_eq!(discovered.samples.len(), 1);
        // Sorted path order keeps a.jpg.
        assert_eq!(
            discovered.samples[0].image_path,
            dir.path().join("a.jpg")
        );
        assert_eq!(discovered.stats.duplicate_stems, 1);
    }

    #[test]
    fn output_is_sorted_by_image_path() {
        let dir = tempdir().unwrap();
        for stem in ["zed", "alpha", "mid"] {
            touch(&dir.path().join(format!("{stem}.jpg")));
            touch(&dir.path().join(format!("{stem}.xml")));
        }
        let discovered = discover_samples(dir.path(), &jpg_extensions(), "xml").unwrap();
        let stems: Vec<&str> = discovered
            .samples
            .iter()
            .map(|sample| sample.stem.as_str())
            .collect();
        assert_eq!(stems, ["alpha", "mid", "zed"]);
    }

    #[test]
    fn missing_root_is_an_error() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(
            discover_samples(&missing, &jpg_extensions(), "xml"),
            Err(DiscoveryError::InvalidRoot(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_directories_are_skipped() {
        use std::os::unix::fs as unix_fs;

        let dir = tempdir().unwrap();
        let real = dir.path().join("real");
        std::fs::create_dir_all(&real).unwrap();
        touch(&real.join("a.jpg"));
        touch(&real.join("a.xml"));
        unix_fs::symlink(&real, dir.path().join("link")).unwrap();

        let discovered = discover_samples(dir.path(), &jpg_extensions(), "xml").unwrap();
        assert_eq!(discovered.samples.len(), 1);
    }
}
