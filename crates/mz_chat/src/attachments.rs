//! Files staged for the next message.

use std::fs;
use std::path::Path;

use mz_api::AttachedFilePayload;
use tracing::debug;

use crate::error::{ChatError, ChatResult};
use crate::types::FileRef;

/// Per-file size cap
pub const MAX_ATTACHMENT_BYTES: u64 = 10 * 1024 * 1024;

/// A file chosen by the user and waiting to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    pub name: String,
    pub size: u64,
    pub mime: String,
    /// Text content; non-UTF-8 bytes are replaced
    pub content: String,
}

impl StagedFile {
    /// Read a file from disk, rejecting it before reading when over the cap.
    pub fn from_path(path: impl AsRef<Path>) -> ChatResult<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let size = fs::metadata(path)?.len();
        check_size(&name, size)?;

        let bytes = fs::read(path)?;
        debug!(%name, size, "staged attachment");
        Self::from_bytes(name, &bytes)
    }

    pub fn from_bytes(name: impl Into<String>, bytes: &[u8]) -> ChatResult<Self> {
        let name = name.into();
        let size = bytes.len() as u64;
        check_size(&name, size)?;

        Ok(Self {
            mime: guess_mime(&name).to_string(),
            content: String::from_utf8_lossy(bytes).into_owned(),
            name,
            size,
        })
    }

    pub fn file_ref(&self) -> FileRef {
        FileRef {
            name: self.name.clone(),
            size: self.size,
        }
    }

    pub fn payload(&self) -> AttachedFilePayload {
        AttachedFilePayload {
            name: self.name.clone(),
            content: self.content.clone(),
            mime: self.mime.clone(),
        }
    }
}

fn check_size(name: &str, size: u64) -> ChatResult<()> {
    if size > MAX_ATTACHMENT_BYTES {
        return Err(ChatError::FileTooLarge {
            name: name.to_string(),
            size,
        });
    }
    Ok(())
}

/// MIME type from the file extension
pub fn guess_mime(name: &str) -> &'static str {
    let ext = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "txt" | "log" => "text/plain",
        "md" => "text/markdown",
        "csv" => "text/csv",
        "json" => "application/json",
        "yaml" | "yml" => "application/yaml",
        "html" | "htm" => "text/html",
        "js" => "text/javascript",
        "py" => "text/x-python",
        "rs" => "text/x-rust",
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        _ => "application/octet-stream",
    }
}

/// Human-readable size: bytes, then KB and MB with one decimal
pub fn format_file_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / KB)
    } else {
        format!("{:.1} MB", bytes as f64 / (KB * KB))
    }
}
