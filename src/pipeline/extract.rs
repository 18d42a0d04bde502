//! PDF text extraction for uploaded files.
//!
//! ## Why stage to disk?
//!
//! Uploads are written to a [`NamedTempFile`] inside the configured upload
//! directory before parsing, the same way a multipart middleware would spool
//! them. The temp file is owned by the blocking extraction task and deleted
//! when it drops, so no staged file survives the request on the success
//! path, the error path, or a panic.

use crate::error::PlannerError;
use async_trait::async_trait;
use lopdf::Document;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// Turns uploaded bytes into plain text.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract(&self, bytes: &[u8]) -> Result<String, PlannerError>;
}

/// [`TextExtractor`] backed by lopdf, staging uploads in `upload_dir`.
#[derive(Debug, Clone)]
pub struct PdfTextExtractor {
    upload_dir: PathBuf,
}

impl PdfTextExtractor {
    pub fn new(upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            upload_dir: upload_dir.into(),
        }
    }

    /// Write the upload to a uniquely named file in the staging directory.
    fn stage(&self, bytes: &[u8]) -> Result<NamedTempFile, PlannerError> {
        std::fs::create_dir_all(&self.upload_dir)
            .map_err(|source| PlannerError::Staging { source })?;

        let mut staged = tempfile::Builder::new()
            .prefix("upload-")
            .suffix(".pdf")
            .tempfile_in(&self.upload_dir)
            .map_err(|source| PlannerError::Staging { source })?;
        staged
            .write_all(bytes)
            .and_then(|_| staged.flush())
            .map_err(|source| PlannerError::Staging { source })?;

        debug!("Staged {} bytes at {}", bytes.len(), staged.path().display());
        Ok(staged)
    }
}

#[async_trait]
impl TextExtractor for PdfTextExtractor {
    async fn extract(&self, bytes: &[u8]) -> Result<String, PlannerError> {
        let staged = self.stage(bytes)?;

        let joined = tokio::task::spawn_blocking(move || {
            let text = extract_text_blocking(staged.path());
            // `staged` is dropped here, removing the file on every path.
            drop(staged);
            text
        })
        .await;
        let result = flatten_join(joined);

        match &result {
            Ok(text) => info!("PDF parsed successfully, text length: {}", text.len()),
            Err(e) => warn!("PDF extraction failed: {}", e),
        }
        result
    }
}

/// A panic inside the parser is reported as an unreadable PDF.
fn flatten_join(
    joined: Result<Result<String, PlannerError>, tokio::task::JoinError>,
) -> Result<String, PlannerError> {
    joined.unwrap_or_else(|e| {
        Err(PlannerError::CorruptPdf {
            detail: format!("extraction task panicked: {e}"),
        })
    })
}

/// Blocking implementation of text extraction.
fn extract_text_blocking(path: &Path) -> Result<String, PlannerError> {
    check_magic(path)?;

    let document = Document::load(path).map_err(|e| PlannerError::CorruptPdf {
        detail: e.to_string(),
    })?;

    if document.is_encrypted() {
        return Err(PlannerError::EncryptedPdf);
    }

    let page_numbers: Vec<u32> = document.get_pages().keys().copied().collect();
    debug!("PDF loaded: {} pages", page_numbers.len());
    if page_numbers.is_empty() {
        return Ok(String::new());
    }

    document
        .extract_text(&page_numbers)
        .map_err(|e| PlannerError::CorruptPdf {
            detail: e.to_string(),
        })
}

/// Verify the `%PDF` magic bytes before handing the file to the parser.
fn check_magic(path: &Path) -> Result<(), PlannerError> {
    let mut file = std::fs::File::open(path).map_err(|source| PlannerError::Staging { source })?;
    let mut magic = Vec::with_capacity(4);
    Read::by_ref(&mut file)
        .take(4)
        .read_to_end(&mut magic)
        .map_err(|source| PlannerError::Staging { source })?;

    if magic.as_slice() != b"%PDF" {
        return Err(PlannerError::NotAPdf { magic });
    }
    Ok(())
}
