//! Generative layer: instruction prompts, the language-model gateway, and
//! recovery of structured results from free-form model output.

pub mod gateway;
pub mod parser;
pub mod prompts;

pub use gateway::{CohereGateway, GatewayConfig, GatewayError, LanguageModelGateway, RawModelResponse};
pub use parser::{ParseError, ResponseParser};
pub use prompts::{PromptBuilder, PromptInput, APPEAL_SECTIONS};
