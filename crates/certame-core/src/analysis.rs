//! Analysis modes, prompt payloads, and the structured result of a scan.
//!
//! Field names on the wire are Portuguese (`resumo`, `irregularidades`,
//! `riscosAltos`, ...) because they are shared with the instruction templates
//! and with the presentation layer.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

/// Which of the three pipeline operations a request runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisMode {
    /// A tender notice scanned on its own.
    SingleDocumentScan,
    /// A winning bid checked against its tender notice.
    ComparativeScan,
    /// An appeal letter drafted from one prior irregularity.
    AppealDraft,
}

impl AnalysisMode {
    /// Sampling temperature: scans favour consistency, drafting favours fluency.
    pub fn temperature(&self) -> f32 {
        match self {
            Self::SingleDocumentScan | Self::ComparativeScan => 0.3,
            Self::AppealDraft => 0.4,
        }
    }

    /// Value of `analysisType` in a successful scan outcome.
    pub fn analysis_type(&self) -> Option<&'static str> {
        match self {
            Self::SingleDocumentScan => Some("edital"),
            Self::ComparativeScan => Some("proposta"),
            Self::AppealDraft => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SingleDocumentScan => "single_document_scan",
            Self::ComparativeScan => "comparative_scan",
            Self::AppealDraft => "appeal_draft",
        }
    }
}

impl std::fmt::Display for AnalysisMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully rendered prompt, ready for the language model.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptPayload {
    pub mode: AnalysisMode,
    pub rendered_text: String,
    pub temperature: f32,
}

/// Severity of an irregularity.
///
/// Accepts `alta|media|média|baixa` and `high|medium|low` in any case;
/// always serializes to the Portuguese, unaccented form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    Alta,
    Media,
    Baixa,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Alta => "alta",
            Self::Media => "media",
            Self::Baixa => "baixa",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "alta" | "high" => Some(Self::Alta),
            "media" | "média" | "medium" => Some(Self::Media),
            "baixa" | "low" => Some(Self::Baixa),
            _ => None,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Severity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Severity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Severity::parse(&raw).ok_or_else(|| {
            de::Error::custom(format!(
                "unknown severidade {raw:?}, expected alta, media or baixa"
            ))
        })
    }
}

/// A legal or procedural defect reported by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Irregularity {
    #[serde(default, deserialize_with = "lenient_u32")]
    pub id: u32,
    #[serde(default, deserialize_with = "lenient_string")]
    pub tipo: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub item: String,
    pub severidade: Severity,
    #[serde(default, deserialize_with = "lenient_string")]
    pub descricao: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub fundamentacao: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub sugestao: String,
}

/// Identification of the procurement, as summarised by the model.
///
/// Every field is optional: the presentation layer renders whatever is present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSummary {
    #[serde(default, deserialize_with = "lenient_opt_string", skip_serializing_if = "Option::is_none")]
    pub tipo: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string", skip_serializing_if = "Option::is_none")]
    pub numero: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string", skip_serializing_if = "Option::is_none")]
    pub orgao: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string", skip_serializing_if = "Option::is_none")]
    pub objeto: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string", skip_serializing_if = "Option::is_none")]
    pub valor_estimado: Option<String>,
    /// Only requested by the comparative template.
    #[serde(default, deserialize_with = "lenient_opt_string", skip_serializing_if = "Option::is_none")]
    pub valor_proposta: Option<String>,
}

/// Structured outcome of a single-document or comparative scan.
///
/// `irregularidades` is mandatory; everything else defaults when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    #[serde(default, deserialize_with = "lenient_summary")]
    pub resumo: DocumentSummary,
    pub irregularidades: Vec<Irregularity>,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub total_irregularidades: u32,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub riscos_altos: u32,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub riscos_medios: u32,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub riscos_baixos: u32,
}

impl AnalysisResult {
    /// Whether the three risk counts add up to the reported total.
    ///
    /// The model is instructed to keep these consistent; the pipeline only
    /// observes it.
    pub fn risk_counts_consistent(&self) -> bool {
        let sum = u64::from(self.riscos_altos)
            + u64::from(self.riscos_medios)
            + u64::from(self.riscos_baixos);
        sum == u64::from(self.total_irregularidades)
    }

    /// Count irregularities of the given severity in the list itself.
    pub fn count_of(&self, severity: Severity) -> u32 {
        self.irregularidades
            .iter()
            .filter(|i| i.severidade == severity)
            .count() as u32
    }

    /// Give irregularities without an id their 1-based position.
    pub fn assign_missing_ids(&mut self) {
        for (pos, irregularity) in self.irregularidades.iter_mut().enumerate() {
            if irregularity.id == 0 {
                irregularity.id = pos as u32 + 1;
            }
        }
    }

    pub fn find(&self, id: u32) -> Option<&Irregularity> {
        self.irregularidades.iter().find(|i| i.id == id)
    }
}

/// Appeal letter prose drafted from one irregularity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppealDraft {
    pub text: String,
    pub based_on: Irregularity,
}

// ── Lenient field decoding ──
//
// Models occasionally emit counts as strings ("3"), ids as strings, numbers
// where text was asked for, or explicit nulls. These helpers absorb that
// without failing the whole result.

fn lenient_u32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .map(|n| n.min(u32::MAX as u64) as u32)
            .unwrap_or(0),
        Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    })
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(value_to_text(Value::deserialize(deserializer)?).unwrap_or_default())
}

fn lenient_opt_string<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Ok(value_to_text(Value::deserialize(deserializer)?))
}

fn lenient_summary<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<DocumentSummary, D::Error> {
    let value = Value::deserialize(deserializer)?;
    match value {
        Value::Object(_) => serde_json::from_value(value).map_err(de::Error::custom),
        _ => Ok(DocumentSummary::default()),
    }
}

fn value_to_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn irregularity(id: u32, severidade: Severity) -> Irregularity {
        Irregularity {
            id,
            tipo: "Cláusula restritiva".into(),
            item: "4.2".into(),
            severidade,
            descricao: "Exigência de marca específica".into(),
            fundamentacao: "Art. 41, Lei 14.133/21".into(),
            sugestao: "Impugnar o item".into(),
        }
    }

    #[test]
    fn temperatures_per_mode() {
        assert_eq!(AnalysisMode::SingleDocumentScan.temperature(), 0.3);
        assert_eq!(AnalysisMode::ComparativeScan.temperature(), 0.3);
        assert_eq!(AnalysisMode::AppealDraft.temperature(), 0.4);
    }

    #[test]
    fn severity_accepts_accents_case_and_english() {
        assert_eq!(Severity::parse("Média"), Some(Severity::Media));
        assert_eq!(Severity::parse(" ALTA "), Some(Severity::Alta));
        assert_eq!(Severity::parse("low"), Some(Severity::Baixa));
        assert_eq!(Severity::parse("critica"), None);
    }

    #[test]
    fn severity_serializes_unaccented() {
        let json = serde_json::to_string(&Severity::Media).unwrap();
        assert_eq!(json, "\"media\"");
    }

    #[test]
    fn unknown_severity_is_rejected() {
        let json = r#"{"id":1,"severidade":"gravissima"}"#;
        assert!(serde_json::from_str::<Irregularity>(json).is_err());
    }

    #[test]
    fn result_defaults_missing_summary_and_counts() {
        let json = r#"{"irregularidades":[]}"#;
        let result: AnalysisResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.resumo, DocumentSummary::default());
        assert_eq!(result.total_irregularidades, 0);
        assert_eq!(result.riscos_baixos, 0);
        assert!(result.risk_counts_consistent());
    }

    #[test]
    fn result_requires_irregularidades() {
        let json = r#"{"resumo":{},"totalIrregularidades":0}"#;
        assert!(serde_json::from_str::<AnalysisResult>(json).is_err());
    }

    #[test]
    fn lenient_fields_absorb_model_quirks() {
        let json = r#"{
            "resumo": {"tipo": "Pregão", "numero": 12, "valorEstimado": 150000.5, "orgao": null},
            "irregularidades": [
                {"id": "2", "tipo": "Prazo", "item": 7.1, "severidade": "Baixa", "descricao": null}
            ],
            "totalIrregularidades": "1",
            "riscosAltos": 0,
            "riscosMedios": 0,
            "riscosBaixos": 1
        }"#;
        let result: AnalysisResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.resumo.numero.as_deref(), Some("12"));
        assert_eq!(result.resumo.valor_estimado.as_deref(), Some("150000.5"));
        assert!(result.resumo.orgao.is_none());
        let first = &result.irregularidades[0];
        assert_eq!(first.id, 2);
        assert_eq!(first.item, "7.1");
        assert_eq!(first.descricao, "");
        assert_eq!(first.sugestao, "");
        assert_eq!(result.total_irregularidades, 1);
        assert!(result.risk_counts_consistent());
    }

    #[test]
    fn non_object_summary_becomes_empty() {
        let json = r#"{"resumo":"n/a","irregularidades":[]}"#;
        let result: AnalysisResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.resumo, DocumentSummary::default());
    }

    #[test]
    fn serializes_portuguese_field_names() {
        let result = AnalysisResult {
            resumo: DocumentSummary {
                orgao: Some("Prefeitura".into()),
                ..Default::default()
            },
            irregularidades: vec![irregularity(1, Severity::Alta)],
            total_irregularidades: 1,
            riscos_altos: 1,
            riscos_medios: 0,
            riscos_baixos: 0,
        };
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["totalIrregularidades"], 1);
        assert_eq!(value["riscosAltos"], 1);
        assert_eq!(value["resumo"]["orgao"], "Prefeitura");
        assert!(value["resumo"].get("numero").is_none());
        assert_eq!(value["irregularidades"][0]["severidade"], "alta");
    }

    #[test]
    fn inconsistent_counts_are_detected() {
        let result = AnalysisResult {
            resumo: DocumentSummary::default(),
            irregularidades: vec![irregularity(1, Severity::Alta)],
            total_irregularidades: 3,
            riscos_altos: 1,
            riscos_medios: 0,
            riscos_baixos: 0,
        };
        assert!(!result.risk_counts_consistent());
        assert_eq!(result.count_of(Severity::Alta), 1);
    }

    #[test]
    fn count_sum_does_not_wrap() {
        let result = AnalysisResult {
            resumo: DocumentSummary::default(),
            irregularidades: vec![],
            total_irregularidades: 0,
            riscos_altos: u32::MAX,
            riscos_medios: 1,
            riscos_baixos: 0,
        };
        assert!(!result.risk_counts_consistent());
    }

    #[test]
    fn missing_ids_take_their_position() {
        let mut result = AnalysisResult {
            resumo: DocumentSummary::default(),
            irregularidades: vec![
                irregularity(0, Severity::Alta),
                irregularity(7, Severity::Media),
                irregularity(0, Severity::Baixa),
            ],
            total_irregularidades: 3,
            riscos_altos: 1,
            riscos_medios: 1,
            riscos_baixos: 1,
        };
        result.assign_missing_ids();
        let ids: Vec<u32> = result.irregularidades.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![1, 7, 3]);
        assert_eq!(result.find(7).map(|i| i.severidade), Some(Severity::Media));
    }
}
