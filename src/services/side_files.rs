//! Cleanup of externally stored product artifacts.
//!
//! Every product owns a generated QR code image and an optional media
//! directory, both keyed by product id. Their lifetime is tied to the
//! product's, so deletion flows call this service after removing the
//! record. Callers treat failures as non-fatal.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

/// Collaborator seam for side-file deletion.
#[async_trait]
pub trait SideFileService: Send + Sync {
    /// Removes all stored artifacts for the given product id.
    /// A product without artifacts is not an error.
    async fn delete_side_files(&self, product_id: &str) -> Result<()>;
}

pub struct FsSideFileService {
    qr_path: PathBuf,
    media_path: PathBuf,
}

impl FsSideFileService {
    pub fn new(qr_path: impl Into<PathBuf>, media_path: impl Into<PathBuf>) -> Self {
        Self {
            qr_path: qr_path.into(),
            media_path: media_path.into(),
        }
    }
}

#[async_trait]
impl SideFileService for FsSideFileService {
    async fn delete_side_files(&self, product_id: &str) -> Result<()> {
        let qr_file = self.qr_path.join(format!("{product_id}.png"));
        remove_if_present(&qr_file, fs::remove_file(&qr_file).await)?;

        let media_dir = self.media_path.join(product_id);
        remove_if_present(&media_dir, fs::remove_dir_all(&media_dir).await)?;

        Ok(())
    }
}

fn remove_if_present(path: &Path, result: std::io::Result<()>) -> Result<()> {
    match result {
        Ok(()) => {
            debug!(path = %path.display(), "Removed product artifact");
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => {
            Err(e).with_context(|| format!("Failed to remove artifact: {}", path.display()))
        }
    }
}
