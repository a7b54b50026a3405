//! Upload marker: a file whose presence records a completed upload.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub const APP_DIR_NAME: &str = "gnome-info-collect";
pub const MARKER_FILE_NAME: &str = "uploaded";
pub const MARKER_CONTENT: &str = "{\"status\": \"successful\"}\n";

pub struct UploadMarker {
    path: PathBuf,
}

impl UploadMarker {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Marker inside `<data_dir>/gnome-info-collect/`.
    pub fn in_data_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join(APP_DIR_NAME).join(MARKER_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Only presence matters; the content is never read back.
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Create the marker, creating its directory if needed.
    ///
    /// Fails if the marker already exists; it is never rewritten.
    pub fn create(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating directory {}", parent.display()))?;
        }

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.path)
            .with_context(|| format!("creating {}", self.path.display()))?;
        file.write_all(MARKER_CONTENT.as_bytes())
            .with_context(|| format!("writing {}", self.path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_writes_status_line_and_directory() {
        let dir = tempfile::tempdir().unwrap();
        let marker = UploadMarker::in_data_dir(dir.path());
        assert!(!marker.exists());

        marker.create().unwrap();

        assert!(marker.exists());
        assert_eq!(
            marker.path(),
            dir.path().join("gnome-info-collect").join("uploaded")
        );
        let content = std::fs::read_to_string(marker.path()).unwrap();
        assert_eq!(content, "{\"status\": \"successful\"}\n");
    }

    #[test]
    fn test_create_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let marker = UploadMarker::in_data_dir(dir.path());
        marker.create().unwrap();
        assert!(marker.create().is_err());
    }

    #[test]
    fn test_existence_ignores_content() {
        let dir = tempfile::tempdir().unwrap();
        let marker = UploadMarker::in_data_dir(dir.path());
        std::fs::create_dir_all(marker.path().parent().unwrap()).unwrap();
        std::fs::write(marker.path(), "garbage").unwrap();
        assert!(marker.exists());
    }
}
