use certame_ai::{GatewayError, ParseError};
use certame_core::{AnalysisMode, DocumentRole};
use certame_extract::ExtractionError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Stage;

/// Machine-readable failure class handed to the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    MissingInput,
    DocumentTooLarge,
    UnparsableDocument,
    InsufficientText,
    GatewayError,
    NoStructuredContent,
    MalformedStructuredContent,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingInput => "missing_input",
            Self::DocumentTooLarge => "document_too_large",
            Self::UnparsableDocument => "unparsable_document",
            Self::InsufficientText => "insufficient_text",
            Self::GatewayError => "gateway_error",
            Self::NoStructuredContent => "no_structured_content",
            Self::MalformedStructuredContent => "malformed_structured_content",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("required document(s) not supplied for {mode}")]
    MissingInput { mode: AnalysisMode },

    #[error("{role} is {size} bytes, above the {limit} byte limit")]
    DocumentTooLarge {
        role: DocumentRole,
        size: usize,
        limit: usize,
    },

    #[error("could not extract text from {role}: {source}")]
    UnparsableDocument {
        role: DocumentRole,
        #[source]
        source: ExtractionError,
    },

    #[error("{role} has {found} characters of text, at least {required} required")]
    InsufficientText {
        mode: AnalysisMode,
        role: DocumentRole,
        found: usize,
        required: usize,
    },

    #[error("text generation failed after {attempts} attempt(s): {source}")]
    Gateway {
        mode: AnalysisMode,
        attempts: u32,
        #[source]
        source: GatewayError,
    },

    #[error("text generation returned no content")]
    EmptyResponse { mode: AnalysisMode },

    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl AnalysisError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingInput { .. } => ErrorKind::MissingInput,
            Self::DocumentTooLarge { .. } => ErrorKind::DocumentTooLarge,
            Self::UnparsableDocument { .. } => ErrorKind::UnparsableDocument,
            Self::InsufficientText { .. } => ErrorKind::InsufficientText,
            Self::Gateway { .. } | Self::EmptyResponse { .. } => ErrorKind::GatewayError,
            Self::Parse(ParseError::NoStructuredContent) => ErrorKind::NoStructuredContent,
            Self::Parse(ParseError::MalformedStructuredContent(_)) => {
                ErrorKind::MalformedStructuredContent
            }
        }
    }

    /// The stage the request was in when it failed.
    pub fn stage(&self) -> Stage {
        match self {
            Self::MissingInput { .. } | Self::DocumentTooLarge { .. } => Stage::Received,
            Self::UnparsableDocument { .. } | Self::InsufficientText { .. } => Stage::Extracting,
            Self::Gateway { .. } | Self::EmptyResponse { .. } => Stage::Generating,
            Self::Parse(_) => Stage::Parsing,
        }
    }

    /// The document a failure is attributed to, if any.
    pub fn role(&self) -> Option<DocumentRole> {
        match self {
            Self::DocumentTooLarge { role, .. }
            | Self::UnparsableDocument { role, .. }
            | Self::InsufficientText { role, .. } => Some(*role),
            _ => None,
        }
    }

    /// Message shown to the user by the presentation layer.
    pub fn user_message(&self) -> String {
        match self {
            Self::MissingInput { mode } => match mode {
                AnalysisMode::SingleDocumentScan => "Nenhum arquivo enviado".into(),
                AnalysisMode::ComparativeScan => "É necessário enviar o edital e a proposta".into(),
                AnalysisMode::AppealDraft => "Nenhuma irregularidade selecionada".into(),
            },
            Self::DocumentTooLarge { role, .. } => {
                format!("O arquivo {} excede o limite de 50 MB", role.with_article())
            }
            Self::UnparsableDocument { .. } => "Falha ao processar o arquivo PDF".into(),
            Self::InsufficientText { mode, role, .. } => {
                let subject = match mode {
                    AnalysisMode::SingleDocumentScan => "do documento",
                    _ => role.with_article(),
                };
                format!("Não foi possível extrair texto suficiente {subject}")
            }
            Self::Gateway { mode, .. } | Self::EmptyResponse { mode } => match mode {
                AnalysisMode::AppealDraft => "Não foi possível gerar o recurso".into(),
                _ => "Não foi possível obter resposta da IA".into(),
            },
            Self::Parse(_) => "Resposta da IA em formato inválido".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_and_stages() {
        let err = AnalysisError::InsufficientText {
            mode: AnalysisMode::ComparativeScan,
            role: DocumentRole::Bid,
            found: 30,
            required: 50,
        };
        assert_eq!(err.kind(), ErrorKind::InsufficientText);
        assert_eq!(err.stage(), Stage::Extracting);
        assert_eq!(err.role(), Some(DocumentRole::Bid));
        assert_eq!(
            err.user_message(),
            "Não foi possível extrair texto suficiente da proposta"
        );

        let err = AnalysisError::from(ParseError::NoStructuredContent);
        assert_eq!(err.kind(), ErrorKind::NoStructuredContent);
        assert_eq!(err.stage(), Stage::Parsing);
        assert_eq!(err.user_message(), "Resposta da IA em formato inválido");
        assert!(err.role().is_none());
    }

    #[test]
    fn notice_message_depends_on_mode() {
        let insufficient = |mode| AnalysisError::InsufficientText {
            mode,
            role: DocumentRole::Notice,
            found: 10,
            required: 100,
        };
        assert_eq!(
            insufficient(AnalysisMode::SingleDocumentScan).user_message(),
            "Não foi possível extrair texto suficiente do documento"
        );
        assert_eq!(
            insufficient(AnalysisMode::ComparativeScan).user_message(),
            "Não foi possível extrair texto suficiente do edital"
        );
    }

    #[test]
    fn unparsable_document_message() {
        let err = AnalysisError::UnparsableDocument {
            role: DocumentRole::Bid,
            source: ExtractionError::PdfParserPanicked,
        };
        assert_eq!(err.kind(), ErrorKind::UnparsableDocument);
        assert_eq!(err.user_message(), "Falha ao processar o arquivo PDF");
    }

    #[test]
    fn empty_response_is_a_gateway_failure() {
        let err = AnalysisError::EmptyResponse {
            mode: AnalysisMode::AppealDraft,
        };
        assert_eq!(err.kind(), ErrorKind::GatewayError);
        assert_eq!(err.user_message(), "Não foi possível gerar o recurso");

        let err = AnalysisError::EmptyResponse {
            mode: AnalysisMode::ComparativeScan,
        };
        assert_eq!(err.user_message(), "Não foi possível obter resposta da IA");
    }

    #[test]
    fn missing_input_messages_per_mode() {
        let single = AnalysisError::MissingInput {
            mode: AnalysisMode::SingleDocumentScan,
        };
        let comparative = AnalysisError::MissingInput {
            mode: AnalysisMode::ComparativeScan,
        };
        assert_eq!(single.user_message(), "Nenhum arquivo enviado");
        assert_eq!(
            comparative.user_message(),
            "É necessário enviar o edital e a proposta"
        );
        assert_eq!(single.stage(), Stage::Received);

        let appeal = AnalysisError::MissingInput {
            mode: AnalysisMode::AppealDraft,
        };
        assert_eq!(appeal.user_message(), "Nenhuma irregularidade selecionada");
    }

    #[test]
    fn kind_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::MalformedStructuredContent).unwrap();
        assert_eq!(json, "\"malformed_structured_content\"");
        assert_eq!(ErrorKind::GatewayError.to_string(), "gateway_error");
    }
}
