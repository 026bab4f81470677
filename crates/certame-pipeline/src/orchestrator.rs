use std::sync::Arc;

use certame_ai::{
    GatewayError, LanguageModelGateway, PromptBuilder, PromptInput, ResponseParser,
};
use certame_core::{
    AnalysisMode, AnalysisResult, AppealDraft, Document, DocumentRole, ExtractedText,
    Irregularity, MAX_DOCUMENT_BYTES, PromptPayload,
};
use certame_extract::{ExtractionError, TextExtractor};
use tracing::{Instrument, debug, info, info_span, warn};

use crate::{AnalysisError, RetryPolicy, Stage};

/// Runs the three analysis operations end to end.
///
/// Stateless between requests: nothing about a document or result is kept
/// once an operation returns, so one orchestrator can serve concurrent
/// requests.
pub struct AnalysisOrchestrator {
    extractor: TextExtractor,
    prompts: PromptBuilder,
    gateway: Arc<dyn LanguageModelGateway>,
    parser: ResponseParser,
    retry: RetryPolicy,
}

impl AnalysisOrchestrator {
    pub fn new(gateway: Arc<dyn LanguageModelGateway>) -> Self {
        Self {
            extractor: TextExtractor::new(),
            prompts: PromptBuilder::new(),
            gateway,
            parser: ResponseParser::new(),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Scan a tender notice on its own.
    pub async fn analyze_single_document(
        &self,
        document: Option<Document>,
    ) -> Result<AnalysisResult, AnalysisError> {
        let mode = AnalysisMode::SingleDocumentScan;
        let span = info_span!("analysis", mode = %mode);
        let result: Result<AnalysisResult, AnalysisError> = async {
            let document = supplied(document).ok_or(AnalysisError::MissingInput { mode })?;
            let notice = self.extract(DocumentRole::Notice, document).await?;
            ensure_sufficient(mode, DocumentRole::Notice, &notice)?;

            let payload = self.build(PromptInput::SingleDocument {
                notice: &notice.content,
            });
            self.scan(&payload).await
        }
        .instrument(span.clone())
        .await;
        span.in_scope(|| finish(&result));
        result
    }

    /// Check a winning bid against its tender notice.
    ///
    /// Both documents are extracted concurrently and both extractions run to
    /// completion; the notice's failure is reported before the bid's.
    pub async fn analyze_comparative(
        &self,
        notice: Option<Document>,
        bid: Option<Document>,
    ) -> Result<AnalysisResult, AnalysisError> {
        let mode = AnalysisMode::ComparativeScan;
        let span = info_span!("analysis", mode = %mode);
        let result: Result<AnalysisResult, AnalysisError> = async {
            let (Some(notice), Some(bid)) = (supplied(notice), supplied(bid)) else {
                return Err(AnalysisError::MissingInput { mode });
            };
            let (notice, bid) = tokio::join!(
                self.extract(DocumentRole::Notice, notice),
                self.extract(DocumentRole::Bid, bid),
            );
            let (notice, bid) = (notice?, bid?);
            ensure_sufficient(mode, DocumentRole::Notice, &notice)?;
            ensure_sufficient(mode, DocumentRole::Bid, &bid)?;

            let payload = self.build(PromptInput::Comparative {
                notice: &notice.content,
                bid: &bid.content,
            });
            self.scan(&payload).await
        }
        .instrument(span.clone())
        .await;
        span.in_scope(|| finish(&result));
        result
    }

    /// Draft an appeal letter from a previously reported irregularity.
    ///
    /// The model's text is returned verbatim; only an empty reply is a failure.
    pub async fn draft_appeal(
        &self,
        irregularity: Option<Irregularity>,
    ) -> Result<AppealDraft, AnalysisError> {
        let mode = AnalysisMode::AppealDraft;
        let span = info_span!(
            "analysis",
            mode = %mode,
            item = irregularity.as_ref().map(|i| i.item.as_str())
        );
        let result: Result<AppealDraft, AnalysisError> = async {
            let irregularity = irregularity.ok_or(AnalysisError::MissingInput { mode })?;
            let payload = self.build(PromptInput::Appeal {
                irregularity: &irregularity,
            });
            let text = self.generate(&payload).await?;
            Ok::<_, AnalysisError>(self.parser.parse_appeal(&text, irregularity))
        }
        .instrument(span.clone())
        .await;
        span.in_scope(|| finish(&result));
        result
    }

    async fn extract(
        &self,
        role: DocumentRole,
        document: Document,
    ) -> Result<ExtractedText, AnalysisError> {
        let size = document.size_bytes();
        if size > MAX_DOCUMENT_BYTES {
            return Err(AnalysisError::DocumentTooLarge {
                role,
                size,
                limit: MAX_DOCUMENT_BYTES,
            });
        }

        debug!(stage = %Stage::Extracting, %role, size, "extracting");
        let extractor = self.extractor;
        tokio::task::spawn_blocking(move || extractor.extract(document))
            .await
            .unwrap_or_else(|e| Err(ExtractionError::Interrupted(e.to_string())))
            .map_err(|source| AnalysisError::UnparsableDocument { role, source })
    }

    fn build(&self, input: PromptInput<'_>) -> PromptPayload {
        debug!(stage = %Stage::PromptBuilding, "building prompt");
        self.prompts.build(input)
    }

    async fn scan(&self, payload: &PromptPayload) -> Result<AnalysisResult, AnalysisError> {
        let raw = self.generate(payload).await?;
        debug!(stage = %Stage::Parsing, chars = raw.chars().count(), "parsing");
        Ok(self.parser.parse_analysis(&raw)?)
    }

    /// One logical generation call, retried only on transient gateway failures.
    async fn generate(&self, payload: &PromptPayload) -> Result<String, AnalysisError> {
        debug!(stage = %Stage::Generating, temperature = payload.temperature, "generating");
        let response = self
            .retry
            .run(
                "generate",
                || self.gateway.generate(payload),
                GatewayError::is_transient,
            )
            .await
            .map_err(|(source, attempts)| AnalysisError::Gateway {
                mode: payload.mode,
                attempts,
                source,
            })?;

        match response.content {
            Some(content) if !content.trim().is_empty() => {
                info!(
                    model = %response.model,
                    tokens_used = response.tokens_used,
                    "model responded"
                );
                Ok(content)
            }
            _ => Err(AnalysisError::EmptyResponse { mode: payload.mode }),
        }
    }
}

/// Zero-byte uploads count as absent.
fn supplied(document: Option<Document>) -> Option<Document> {
    document.filter(|d| d.size_bytes() > 0)
}

fn ensure_sufficient(
    mode: AnalysisMode,
    role: DocumentRole,
    text: &ExtractedText,
) -> Result<(), AnalysisError> {
    let found = text.trimmed_chars();
    if text.is_sufficient_for(role) {
        Ok(())
    } else {
        Err(AnalysisError::InsufficientText {
            mode,
            role,
            found,
            required: role.min_chars(),
        })
    }
}

fn finish<T>(result: &Result<T, AnalysisError>) {
    match result {
        Ok(_) => info!(stage = %Stage::Succeeded, "analysis complete"),
        Err(err) => warn!(
            stage = %Stage::Failed,
            failed_at = %err.stage(),
            kind = %err.kind(),
            error = %err,
            "analysis failed"
        ),
    }
}
