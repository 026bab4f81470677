use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("failed to parse PDF: {0}")]
    UnparsablePdf(String),

    #[error("PDF parser aborted on malformed input")]
    PdfParserPanicked,

    #[error("extraction task did not complete: {0}")]
    Interrupted(String),
}
