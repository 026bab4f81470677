//! Text extraction: structural PDF text for PDFs, lossy UTF-8 for everything else.

mod error;
mod extractor;

pub use error::ExtractionError;
pub use extractor::TextExtractor;
