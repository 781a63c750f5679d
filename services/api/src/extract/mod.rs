//! services/api/src/extract/mod.rs
//!
//! Document text extraction for uploaded files. Dispatch is on the media
//! type the client declared for the upload, not on sniffed content.

mod docx;
mod pdf;
mod txt;

use thiserror::Error;

/// Media types accepted for extraction.
pub const PDF_MEDIA_TYPE: &str = "application/pdf";
pub const DOCX_MEDIA_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const PLAIN_TEXT_MEDIA_TYPE: &str = "text/plain";

/// Shown in place of extracted content for any other declared media type.
pub const UNSUPPORTED_FORMAT: &str = "Unsupported file format.";

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("PDF extraction failed: {0}")]
    Pdf(String),
    #[error("DOCX extraction failed: {0}")]
    Docx(String),
    #[error("Plain text is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}

/// Result of extracting an uploaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extracted {
    /// Plain text recovered from a supported format.
    Text(String),
    /// The declared media type is none we parse. Not an error: the sentinel
    /// takes the place of the extracted content.
    Unsupported,
}

impl Extracted {
    /// The string that becomes the session's document context.
    pub fn into_context(self) -> String {
        match self {
            Extracted::Text(text) => text,
            Extracted::Unsupported => UNSUPPORTED_FORMAT.to_string(),
        }
    }

    pub fn is_supported(&self) -> bool {
        matches!(self, Extracted::Text(_))
    }
}

/// Extracts plain text from the uploaded bytes according to the declared
/// media type. Unknown media types yield `Extracted::Unsupported`; only a
/// supported format with unusable bytes is an error.
pub fn extract_text(media_type: &str, bytes: &[u8]) -> Result<Extracted, ExtractError> {
    match media_type {
        PDF_MEDIA_TYPE => pdf::extract(bytes).map(Extracted::Text),
        DOCX_MEDIA_TYPE => docx::extract(bytes).map(Extracted::Text),
        PLAIN_TEXT_MEDIA_TYPE => txt::extract(bytes).map(Extracted::Text),
        _ => Ok(Extracted::Unsupported),
    }
}
