//! Analysis pipeline: sequences extraction, prompt building, generation and
//! parsing for each mode, classifies failures, and shapes caller outcomes.

mod error;
mod orchestrator;
mod outcome;
mod progress;
mod retry;
mod stage;

pub use error::{AnalysisError, ErrorKind};
pub use orchestrator::AnalysisOrchestrator;
pub use outcome::{AnalysisOutcome, AppealOutcome};
pub use progress::ProgressEstimator;
pub use retry::RetryPolicy;
pub use stage::Stage;
