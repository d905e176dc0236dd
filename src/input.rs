//! Input files: bytes plus a *declared* media type.
//!
//! Classification never looks at the bytes. A PNG labelled `application/pdf`
//! is routed to the PDF path and fails at parse time with an ordinary error;
//! that is the contract callers rely on.

use crate::error::ConvertError;
use std::path::Path;
use tracing::debug;

/// The media type that routes a file to PDF→image conversion.
pub const PDF_MEDIA_TYPE: &str = "application/pdf";

/// An input file, read once into memory and never mutated.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Original file name, used to derive output names.
    pub name: String,
    /// Declared media type, e.g. `image/png` or `application/pdf`.
    pub media_type: String,
    pub bytes: Vec<u8>,
}

/// What the orchestrator does with a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Pdf,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            bytes,
        }
    }

    /// Read a file from disk, declaring its media type from the extension.
    ///
    /// Unknown extensions are declared as `application/octet-stream`, which
    /// the orchestrator rejects as unsupported.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConvertError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| ConvertError::InputReadFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let media_type = media_type_for_path(path);
        debug!("Read {} ({} bytes, {})", path.display(), bytes.len(), media_type);
        Ok(Self::new(name, media_type, bytes))
    }

    /// Size of the file in bytes.
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Classify by declared media type.
    pub fn kind(&self) -> Result<MediaKind, ConvertError> {
        let mt = self.media_type.trim().to_ascii_lowercase();
        if mt.starts_with("image/") {
            Ok(MediaKind::Image)
        } else if mt == PDF_MEDIA_TYPE {
            Ok(MediaKind::Pdf)
        } else {
            Err(ConvertError::UnsupportedType {
                name: self.name.clone(),
                media_type: self.media_type.clone(),
            })
        }
    }

    /// File name with its last extension removed (`scan.v2.pdf` → `scan.v2`).
    pub fn stem(&self) -> &str {
        file_stem(&self.name)
    }
}

/// Strip the final `.ext` from a file name, keeping dot-files intact.
pub fn file_stem(name: &str) -> &str {
    match name.rfind('.') {
        Some(0) | None => name,
        Some(i) => &name[..i],
    }
}

/// Map a path's extension to a declared media type.
pub fn media_type_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "pdf" => PDF_MEDIA_TYPE,
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        _ => "application/octet-stream",
    }
}
