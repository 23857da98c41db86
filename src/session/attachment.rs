//! File metadata attachments and the single-slot staging area

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Mutex, PoisonError};
use thiserror::Error;

/// Extensions the file-selection surface accepts
pub const ACCEPTED_EXTENSIONS: &[&str] = &[
    // text and code
    "txt", "md", "json", "csv", "xml", "html", "css", "js", "py", "java", "c", "cpp", "h", "hpp",
    "sh", "rb", "php", "sql",
    // documents
    "pdf", "doc", "docx", "ppt", "pptx", "xls", "xlsx", "odt", "ods", "odp",
    // images
    "png", "jpg", "jpeg", "gif", "bmp", "svg", "tiff", "webp",
    // archives
    "zip", "tar", "gz", "rar", "7z",
    // audio
    "mp3", "wav", "ogg", "flac",
    // video
    "mp4", "mov", "avi", "mkv", "webm",
];

const FALLBACK_MEDIA_TYPE: &str = "application/octet-stream";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttachmentError {
    #[error("Attachment name must not be empty")]
    EmptyName,
    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),
}

/// Descriptive metadata of a selected file. Never carries file bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "AttachmentWire")]
pub struct AttachmentMetadata {
    name: String,
    #[serde(rename = "type")]
    media_type: String,
    #[serde(rename = "size")]
    size_bytes: u64,
}

#[derive(Deserialize)]
struct AttachmentWire {
    name: String,
    #[serde(rename = "type")]
    media_type: String,
    size: u64,
}

impl TryFrom<AttachmentWire> for AttachmentMetadata {
    type Error = AttachmentError;

    fn try_from(wire: AttachmentWire) -> Result<Self, Self::Error> {
        Self::new(wire.name, wire.media_type, wire.size)
    }
}

impl AttachmentMetadata {
    pub fn new(
        name: impl Into<String>,
        media_type: impl Into<String>,
        size_bytes: u64,
    ) -> Result<Self, AttachmentError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(AttachmentError::EmptyName);
        }
        Ok(Self {
            name,
            media_type: media_type.into(),
            size_bytes,
        })
    }

    /// Build metadata with the media type inferred from the file extension
    pub fn guess(name: impl Into<String>, size_bytes: u64) -> Result<Self, AttachmentError> {
        let name = name.into();
        let media_type = mime_guess::from_path(&name)
            .first_raw()
            .unwrap_or(FALLBACK_MEDIA_TYPE)
            .to_string();
        Self::new(name, media_type, size_bytes)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    /// Reject files whose extension is outside [`ACCEPTED_EXTENSIONS`]
    pub fn ensure_accepted(&self) -> Result<(), AttachmentError> {
        let ext = Path::new(&self.name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext {
            Some(ext) if ACCEPTED_EXTENSIONS.contains(&ext.as_str()) => Ok(()),
            _ => Err(AttachmentError::UnsupportedType(self.name.clone())),
        }
    }
}

/// Holds at most one attachment waiting for the next submitted message
#[derive(Debug, Default)]
pub struct AttachmentStaging {
    pending: Mutex<Option<AttachmentMetadata>>,
}

impl AttachmentStaging {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace whatever is staged
    pub fn stage(&self, meta: AttachmentMetadata) {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = pending.replace(meta) {
            tracing::debug!(replaced = %previous.name, "Staged attachment replaced");
        }
    }

    /// Read and clear in one critical section
    pub fn take_if_present(&self) -> Option<AttachmentMetadata> {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    pub fn clear(&self) {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }

    /// Peek without consuming
    pub fn pending(&self) -> Option<AttachmentMetadata> {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
