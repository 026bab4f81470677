pub mod analysis;
pub mod document;

pub use analysis::{
    AnalysisMode, AnalysisResult, AppealDraft, DocumentSummary, Irregularity, PromptPayload,
    Severity,
};
pub use document::{Document, DocumentRole, ExtractedText, MAX_DOCUMENT_BYTES};
