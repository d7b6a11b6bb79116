//! Pascal VOC annotation parsing.
//!
//! Only the object class names feed the partitioner; the sizes and boxes are
//! carried for the tabular CSV export.

use std::path::{Path, PathBuf};

use quick_xml::DeError;
use serde::Deserialize;
use thiserror::Error;

/// Errors raised while parsing one annotation file.
///
/// Callers treat these as per-sample skips, never as fatal errors.
#[derive(Debug, Error)]
pub enum AnnotationError {
    #[error("Failed to read annotation {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse annotation {path}: {source}")]
    Parse { path: PathBuf, source: DeError },
}

/// Parsed `<annotation>` document.
#[derive(Debug, Clone, Deserialize)]
pub struct VocAnnotation {
    /// Image filename recorded inside the annotation.
    pub filename: String,
    /// Image dimensions.
    pub size: VocSize,
    /// Labeled objects; zero objects is valid.
    #[serde(default, rename = "object")]
    pub objects: Vec<VocObject>,
}

/// `<size>` element.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct VocSize {
    pub width: u32,
    pub height: u32,
}

/// One `<object>` element.
#[derive(Debug, Clone, Deserialize)]
pub struct VocObject {
    /// Class name.
    pub name: String,
    /// Bounding box in pixel coordinates.
    pub bndbox: BndBox,
}

/// `<bndbox>` element.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct BndBox {
    pub xmin: i32,
    pub ymin: i32,
    pub xmax: i32,
    pub ymax: i32,
}

impl VocAnnotation {
    /// Class names of the labeled objects, in document order, duplicates
    /// included.
    pub fn class_names(&self) -> impl Iterator<Item = &str> {
        self.objects.iter().map(|object| object.name.as_str())
    }
}

/// Parse one Pascal VOC annotation file.
pub fn parse_annotation(path: &Path) -> Result<VocAnnotation, AnnotationError> {
    let text = std::fs::read_to_string(path).map_err(|source| AnnotationError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    quick_xml::de::from_str(&text).map_err(|source| AnnotationError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const TWO_OBJECTS: &str = r#"<annotation>
  <folder>all</folder>
  <filename>pic1.jpg</filename>
  <size><width>640</width><height>480</height><depth>3</depth></size>
  <object>
    <name>cat</name>
    <bndbox><xmin>10</xmin><ymin>20</ymin><xmax>110</xmax><ymax>220</ymax></bndbox>
  </object>
  <object>
    <name>dog</name>
    <bndbox><xmin>5</xmin><ymin>6</ymin><xmax>7</xmax><ymax>8</ymax></bndbox>
  </object>
</annotation>"#;

    fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn parses_objects_in_document_order() {
        let dir = tempdir().unwrap();
        let path = write(dir.path(), "pic1.xml", TWO_OBJECTS);
        let annotation = parse_annotation(&path).unwrap();
        assert_eq!(annotation.filename, "pic1.jpg");
        assert_eq!(annotation.size.width, 640);
        assert_eq!(annotation.size.height, 480);
        let names: Vec<&str> = annotation.class_names().collect();
        assert_eq!(names, ["cat", "dog"]);
        assert_eq!(annotation.objects[0].bndbox.xmax, 110);
    }

    #[test]
    fn zero_objects_is_valid() {
        let dir = tempdir().unwrap();
        let path = write(
            dir.path(),
            "empty.xml",
            r#"<annotation>
  <filename>empty.jpg</filename>
  <size><width>10</width><height>10</height></size>
</annotation>"#,
        );
        let annotation = parse_annotation(&path).unwrap();
        assert!(annotation.objects.is_empty());
    }

    #[test]
    fn malformed_xml_is_a_parse_error() {
        let dir = tempdir().unwrap();
        let path = write(dir.path(), "bad.xml", "<annotation><object>");
        assert!(matches!(
            parse_annotation(&path),
            Err(AnnotationError::Parse { .. })
        ));
    }

    #[test]
    fn missing_required_field_is_a_parse_error() {
        let dir = tempdir().unwrap();
        // Object without a bndbox.
        let path = write(
            dir.path(),
            "nofield.xml",
            r#"<annotation>
  <filename>x.jpg</filename>
  <size><width>10</width><height>10</height></size>
  <object><name>cat</name></object>
</annotation>"#,
        );
        assert!(matches!(
            parse_annotation(&path),
            Err(AnnotationError::Parse { .. })
        ));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            parse_annotation(&dir.path().join("nope.xml")),
            Err(AnnotationError::Read { .. })
        ));
    }
}
