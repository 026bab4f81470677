use std::panic;

use certame_core::{Document, ExtractedText};
use tracing::{debug, info};

use crate::ExtractionError;

/// Legacy word-processor types that are decoded as raw UTF-8 rather than parsed.
const LEGACY_WORD_TYPES: &[&str] = &[
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
];

/// Turns an uploaded document into plain text.
///
/// PDFs go through structural text extraction. Every other declared type is
/// decoded as UTF-8, replacing invalid sequences. No OCR is attempted, so
/// scanned PDFs come back (nearly) empty and are caught by the caller's
/// length check.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextExtractor;

impl TextExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract the text of `document`, taking ownership of it.
    pub fn extract(&self, document: Document) -> Result<ExtractedText, ExtractionError> {
        let content = if document.is_pdf() {
            extract_pdf(document.bytes())?
        } else {
            if LEGACY_WORD_TYPES.contains(&document.essence().as_str()) {
                debug!(
                    media_type = %document.media_type(),
                    "word-processor document decoded as raw UTF-8"
                );
            }
            decode_plain(document.bytes())
        };

        info!(
            media_type = %document.media_type(),
            bytes = document.size_bytes(),
            chars = content.chars().count(),
            "extracted document text"
        );
        Ok(ExtractedText {
            content,
            source: document,
        })
    }
}

fn extract_pdf(bytes: &[u8]) -> Result<String, ExtractionError> {
    // pdf-extract panics on some malformed inputs instead of returning Err.
    match panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes)) {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(ExtractionError::UnparsablePdf(e.to_string())),
        Err(_) => Err(ExtractionError::PdfParserPanicked),
    }
}

fn decode_plain(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}
