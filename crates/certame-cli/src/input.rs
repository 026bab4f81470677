//! Reading documents and prior scan results from disk.

use std::path::Path;

use anyhow::{Context, bail};
use certame_core::{AnalysisResult, Document, Irregularity};
use certame_pipeline::AnalysisOutcome;

const FALLBACK_MEDIA_TYPE: &str = "application/octet-stream";

/// Media type declared for a file, guessed from its extension.
pub fn media_type_for(path: &Path) -> &'static str {
    mime_guess::from_path(path)
        .first_raw()
        .unwrap_or(FALLBACK_MEDIA_TYPE)
}

/// Load a document if a path was given. An absent path is left for the
/// pipeline to report as missing input.
pub async fn read_document(path: Option<&Path>) -> anyhow::Result<Option<Document>> {
    let Some(path) = path else {
        return Ok(None);
    };
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    let media_type = media_type_for(path);
    tracing::debug!(path = %path.display(), media_type, size = bytes.len(), "loaded document");
    Ok(Some(Document::new(bytes, media_type)))
}

/// Load the result of an earlier scan, as written by `edital`/`proposta`.
pub async fn read_prior_result(path: &Path) -> anyhow::Result<AnalysisResult> {
    let json = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    parse_prior_result(&json).with_context(|| format!("parsing {}", path.display()))
}

/// Accepts either a full scan outcome (`{success, data, ...}`) or a bare result.
/// Irregularities without an id get their 1-based position, as in a fresh scan.
pub fn parse_prior_result(json: &str) -> anyhow::Result<AnalysisResult> {
    let value: serde_json::Value = serde_json::from_str(json).context("not valid JSON")?;

    let mut result: AnalysisResult = if value.get("success").is_none() {
        serde_json::from_value(value).context("not an analysis result")?
    } else {
        let outcome: AnalysisOutcome =
            serde_json::from_value(value).context("not an analysis outcome")?;
        match outcome.data {
            Some(data) if outcome.success => data,
            _ => bail!(
                "scan did not succeed: {}",
                outcome.error.as_deref().unwrap_or("no result recorded")
            ),
        }
    };
    result.assign_missing_ids();
    Ok(result)
}

pub fn select_irregularity(result: &AnalysisResult, id: u32) -> anyhow::Result<Irregularity> {
    result.find(id).cloned().with_context(|| {
        let ids: Vec<String> = result
            .irregularidades
            .iter()
            .map(|i| i.id.to_string())
            .collect();
        format!("no irregularity with id {id} (available: {})", ids.join(", "))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESULT: &str = r#"{
        "resumo": {"numero": "12/2024"},
        "irregularidades": [
            {"id": 1, "tipo": "Marca", "item": "4.2", "severidade": "alta",
             "descricao": "d", "fundamentacao": "f", "sugestao": "s"},
            {"id": 2, "tipo": "Prazo", "item": "8.1", "severidade": "baixa",
             "descricao": "d", "fundamentacao": "f", "sugestao": "s"}
        ],
        "totalIrregularidades": 2,
        "riscosAltos": 1,
        "riscosMedios": 0,
        "riscosBaixos": 1
    }"#;

    #[test]
    fn media_types_from_extension() {
        assert_eq!(media_type_for(Path::new("edital.pdf")), "application/pdf");
        assert_eq!(media_type_for(Path::new("EDITAL.PDF")), "application/pdf");
        assert_eq!(media_type_for(Path::new("notas.txt")), "text/plain");
        assert_eq!(media_type_for(Path::new("sem_extensao")), FALLBACK_MEDIA_TYPE);
    }

    #[test]
    fn reads_bare_result() {
        let result = parse_prior_result(RESULT).unwrap();
        assert_eq!(result.irregularidades.len(), 2);
        assert_eq!(result.resumo.numero.as_deref(), Some("12/2024"));
    }

    #[test]
    fn reads_result_inside_outcome() {
        let json = format!(r#"{{"success": true, "analysisType": "edital", "data": {RESULT}}}"#);
        let result = parse_prior_result(&json).unwrap();
        assert_eq!(result.total_irregularidades, 2);
    }

    #[test]
    fn failed_outcome_is_rejected() {
        let json = r#"{"success": false, "error": "Nenhum arquivo enviado", "kind": "missing_input"}"#;
        let err = parse_prior_result(json).unwrap_err();
        assert!(err.to_string().contains("Nenhum arquivo enviado"));
    }

    #[test]
    fn selects_by_id() {
        let result = parse_prior_result(RESULT).unwrap();
        assert_eq!(select_irregularity(&result, 2).unwrap().tipo, "Prazo");
        let err = select_irregularity(&result, 7).unwrap_err();
        assert_eq!(err.to_string(), "no irregularity with id 7 (available: 1, 2)");
    }

    #[test]
    fn hand_written_result_gets_positional_ids() {
        let json = r#"{"irregularidades": [
            {"tipo": "Marca", "item": "4.2", "severidade": "alta"},
            {"tipo": "Prazo", "item": "8.1", "severidade": "media"}
        ]}"#;
        let result = parse_prior_result(json).unwrap();
        assert_eq!(select_irregularity(&result, 2).unwrap().item, "8.1");
        let err = select_irregularity(&result, 3).unwrap_err();
        assert_eq!(err.to_string(), "no irregularity with id 3 (available: 1, 2)");
    }

    #[tokio::test]
    async fn absent_path_is_not_an_error() {
        assert!(read_document(None).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn missing_file_is_reported_with_path() {
        let err = read_document(Some(Path::new("/nonexistent/edital.pdf")))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("/nonexistent/edital.pdf"));
    }
}
