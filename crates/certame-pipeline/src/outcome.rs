//! Wire shapes returned to the presentation layer.
//!
//! Success and failure share one flat object keyed by `success`, matching
//! what the UI already consumes; `kind` is the typed addition on failure.

use certame_core::{AnalysisMode, AnalysisResult, AppealDraft};
use serde::{Deserialize, Serialize};

use crate::{AnalysisError, ErrorKind};

/// Outcome of a single-document or comparative scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisOutcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<AnalysisResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ErrorKind>,
}

impl AnalysisOutcome {
    pub fn success(mode: AnalysisMode, data: AnalysisResult) -> Self {
        Self {
            success: true,
            data: Some(data),
            analysis_type: mode.analysis_type().map(str::to_string),
            error: None,
            kind: None,
        }
    }

    pub fn failure(err: &AnalysisError) -> Self {
        Self {
            success: false,
            data: None,
            analysis_type: None,
            error: Some(err.user_message()),
            kind: Some(err.kind()),
        }
    }

    pub fn from_result(mode: AnalysisMode, result: Result<AnalysisResult, AnalysisError>) -> Self {
        match result {
            Ok(data) => Self::success(mode, data),
            Err(err) => Self::failure(&err),
        }
    }
}

/// Outcome of appeal drafting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppealOutcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub appeal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ErrorKind>,
}

impl AppealOutcome {
    pub fn from_result(result: Result<AppealDraft, AnalysisError>) -> Self {
        match result {
            Ok(draft) => Self {
                success: true,
                appeal: Some(draft.text),
                error: None,
                kind: None,
            },
            Err(err) => Self {
                success: false,
                appeal: None,
                error: Some(err.user_message()),
                kind: Some(err.kind()),
            },
        }
    }
}
