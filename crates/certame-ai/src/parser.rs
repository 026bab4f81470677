//! Recovery of a structured result from free-form model output.
//!
//! Models wrap the requested JSON in prose, markdown fences, or both, and
//! sometimes echo a fragment of the requested format before the answer. The
//! parser scans for balanced `{...}` spans (string- and escape-aware), prefers
//! the first object carrying the expected top-level key, and only falls back
//! to the first-`{`-to-last-`}` span when nothing balances.

use certame_core::{AnalysisResult, AppealDraft, Irregularity};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

const RESULT_KEY: &str = "irregularidades";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("model output contains no JSON object")]
    NoStructuredContent,
    #[error("malformed JSON in model output: {0}")]
    MalformedStructuredContent(String),
}

/// Turns raw model text into typed results.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseParser;

impl ResponseParser {
    pub fn new() -> Self {
        Self
    }

    /// Recover and validate an [`AnalysisResult`] from a scan response.
    ///
    /// `irregularidades` must be present and be a list; everything else is
    /// defaulted. Risk counts that do not add up are logged, not rejected.
    pub fn parse_analysis(&self, raw: &str) -> Result<AnalysisResult, ParseError> {
        let object = recover_object(raw, RESULT_KEY)?;

        match object.get("irregularidades") {
            Some(Value::Array(_)) => {}
            Some(_) => {
                return Err(ParseError::MalformedStructuredContent(
                    "`irregularidades` is not a list".into(),
                ));
            }
            None => {
                return Err(ParseError::MalformedStructuredContent(
                    "missing `irregularidades`".into(),
                ));
            }
        }

        let mut result: AnalysisResult = serde_json::from_value(Value::Object(object))
            .map_err(|e| ParseError::MalformedStructuredContent(e.to_string()))?;
        result.assign_missing_ids();

        if !result.risk_counts_consistent() {
            warn!(
                total = result.total_irregularidades,
                altos = result.riscos_altos,
                medios = result.riscos_medios,
                baixos = result.riscos_baixos,
                "risk counts do not add up to total"
            );
        }
        debug!(
            irregularidades = result.irregularidades.len(),
            "parsed analysis result"
        );
        Ok(result)
    }

    /// Appeal drafts are prose: the text is kept verbatim.
    pub fn parse_appeal(&self, raw: &str, based_on: Irregularity) -> AppealDraft {
        AppealDraft {
            text: raw.to_string(),
            based_on,
        }
    }
}

/// Find the JSON object embedded in `raw`.
///
/// The first balanced object containing `key` wins. Without one, the first
/// balanced span that parses as an object is returned so the caller can
/// report what is missing.
pub fn recover_object(raw: &str, key: &str) -> Result<Map<String, Value>, ParseError> {
    let spans = balanced_object_spans(raw);

    if spans.is_empty() {
        let span = greedy_object_span(raw).ok_or(ParseError::NoStructuredContent)?;
        debug!(len = span.len(), "no balanced span, using greedy span");
        return parse_object(span);
    }

    let mut first_object = None;
    let mut first_error = None;
    for span in spans {
        match parse_object(span) {
            Ok(object) if object.contains_key(key) => return Ok(object),
            Ok(object) => {
                debug!(len = span.len(), key, "skipping object without expected key");
                first_object.get_or_insert(object);
            }
            Err(e) => {
                first_error.get_or_insert(e);
            }
        }
    }
    match (first_object, first_error) {
        (Some(object), _) => Ok(object),
        (None, Some(e)) => Err(e),
        (None, None) => Err(ParseError::NoStructuredContent),
    }
}

fn parse_object(span: &str) -> Result<Map<String, Value>, ParseError> {
    match serde_json::from_str::<Value>(span) {
        Ok(Value::Object(object)) => Ok(object),
        Ok(_) => Err(ParseError::MalformedStructuredContent(
            "not a JSON object".into(),
        )),
        Err(e) => Err(ParseError::MalformedStructuredContent(e.to_string())),
    }
}

/// Top-level balanced `{...}` spans, in order of appearance.
///
/// Braces inside JSON strings are ignored. An opening brace that never closes
/// is skipped and scanning resumes just after it, so a stray `{` in leading
/// prose does not hide the object that follows.
pub fn balanced_object_spans(raw: &str) -> Vec<&str> {
    let bytes = raw.as_bytes();
    let mut spans = Vec::new();
    let mut pos = 0;

    while let Some(offset) = bytes[pos..].iter().position(|&b| b == b'{') {
        let start = pos + offset;
        match closing_brace(bytes, start) {
            Some(end) => {
                spans.push(&raw[start..=end]);
                pos = end + 1;
            }
            None => pos = start + 1,
        }
    }
    spans
}

/// Index of the brace closing the object opened at `start`.
fn closing_brace(bytes: &[u8], start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Span from the first `{` to the last `}`, if they are in that order.
pub fn greedy_object_span(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (start < end).then(|| &raw[start..=end])
}
