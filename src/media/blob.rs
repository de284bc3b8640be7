/// A media file slated for preview and upload.

use std::io;
use std::path::{Path, PathBuf};

/// A complete media file on local disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaBlob {
    /// Original file name (e.g., "holiday.mp4"), used for the upload extension
    pub file_name: String,
    /// Where the bytes live
    pub path: PathBuf,
    /// Size on disk
    pub size_bytes: u64,
}

impl MediaBlob {
    pub fn new(file_name: impl Into<String>, path: impl Into<PathBuf>, size_bytes: u64) -> Self {
        Self {
            file_name: file_name.into(),
            path: path.into(),
            size_bytes,
        }
    }

    /// Build a blob from a file on disk, reading its size
    pub async fn from_path(path: &Path) -> io::Result<Self> {
        let metadata = tokio::fs::metadata(path).await?;
        if !metadata.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("not a regular file: {}", path.display()),
            ));
        }

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| "video".to_string());

        Ok(Self::new(file_name, path, metadata.len()))
    }

    /// Text after the last '.', or the whole name when there is none
    pub fn extension(&self) -> &str {
        self.file_name
            .rsplit('.')
            .next()
            .unwrap_or(self.file_name.as_str())
    }

    /// Read the whole file into memory
    pub async fn read(&self) -> io::Result<Vec<u8>> {
        tokio::fs::read(&self.path).await
    }

    /// Human-readable size (e.g., "4.2 MB")
    pub fn display_size(&self) -> String {
        let mb = self.size_bytes as f64 / 1024.0 / 1024.0;
        if mb >= 0.1 {
            format!("{:.1} MB", mb)
        } else {
            format!("{} KB", self.size_bytes / 1024)
        }
    }
}
