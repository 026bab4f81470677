//! Plain-text rendering of outcomes for `--report`.

use std::fmt::Write;

use certame_core::{AnalysisResult, DocumentSummary, Irregularity, Severity};
use certame_pipeline::{AnalysisOutcome, AppealOutcome};

const LABEL_WIDTH: usize = 22;

// ── Public API ──

/// Render a scan outcome as a card: summary, risk totals, then each irregularity.
pub fn render_analysis(outcome: &AnalysisOutcome) -> String {
    let mut out = String::new();
    match (&outcome.data, outcome.success) {
        (Some(data), true) => {
            let subject = match outcome.analysis_type.as_deref() {
                Some("proposta") => "da proposta",
                _ => "do edital",
            };
            let _ = writeln!(out, "=== Análise {subject} ===");
            let _ = writeln!(out);
            write_summary(&mut out, &data.resumo);
            write_risks(&mut out, data);
            write_irregularities(&mut out, &data.irregularidades);
        }
        _ => write_failure(&mut out, outcome.error.as_deref(), outcome.kind.map(|k| k.as_str())),
    }
    out
}

/// Render an appeal outcome: the letter text, or the failure.
pub fn render_appeal(outcome: &AppealOutcome) -> String {
    let mut out = String::new();
    match (&outcome.appeal, outcome.success) {
        (Some(text), true) => {
            let _ = writeln!(out, "=== Recurso administrativo ===");
            let _ = writeln!(out);
            let _ = writeln!(out, "{}", text.trim_end());
        }
        _ => write_failure(&mut out, outcome.error.as_deref(), outcome.kind.map(|k| k.as_str())),
    }
    out
}

// ── Sections ──

fn write_summary(out: &mut String, resumo: &DocumentSummary) {
    let fields = [
        ("Tipo", &resumo.tipo),
        ("Número", &resumo.numero),
        ("Órgão", &resumo.orgao),
        ("Objeto", &resumo.objeto),
        ("Valor estimado", &resumo.valor_estimado),
        ("Valor da proposta", &resumo.valor_proposta),
    ];
    if fields.iter().all(|(_, v)| v.is_none()) {
        return;
    }

    let _ = writeln!(out, "Resumo");
    for (label, value) in fields {
        if let Some(value) = value {
            let _ = writeln!(out, "  {label:<LABEL_WIDTH$} {value}");
        }
    }
    let _ = writeln!(out);
}

fn write_risks(out: &mut String, data: &AnalysisResult) {
    let _ = writeln!(out, "Riscos");
    let rows = [
        ("Total", data.total_irregularidades),
        ("Altos", data.riscos_altos),
        ("Médios", data.riscos_medios),
        ("Baixos", data.riscos_baixos),
    ];
    for (label, count) in rows {
        let _ = writeln!(out, "  {label:<LABEL_WIDTH$} {count}");
    }
    if !data.risk_counts_consistent() {
        let _ = writeln!(
            out,
            "  (contagem pela lista: {} alta, {} média, {} baixa)",
            data.count_of(Severity::Alta),
            data.count_of(Severity::Media),
            data.count_of(Severity::Baixa),
        );
    }
    let _ = writeln!(out);
}

fn write_irregularities(out: &mut String, items: &[Irregularity]) {
    if items.is_empty() {
        let _ = writeln!(out, "Nenhuma irregularidade encontrada.");
        return;
    }

    let _ = writeln!(out, "Irregularidades ({})", items.len());
    for item in items {
        let _ = writeln!(
            out,
            "  [{}] {:<5} {} (item {})",
            item.id,
            item.severidade.as_str().to_uppercase(),
            item.tipo,
            item.item
        );
        write_detail(out, "Descrição", &item.descricao);
        write_detail(out, "Fundamentação", &item.fundamentacao);
        write_detail(out, "Sugestão", &item.sugestao);
    }
}

fn write_detail(out: &mut String, label: &str, text: &str) {
    if !text.trim().is_empty() {
        let _ = writeln!(out, "      {label}: {}", text.trim());
    }
}

fn write_failure(out: &mut String, message: Option<&str>, kind: Option<&str>) {
    let message = message.unwrap_or("Falha na análise");
    match kind {
        Some(kind) => {
            let _ = writeln!(out, "Erro: {message} ({kind})");
        }
        None => {
            let _ = writeln!(out, "Erro: {message}");
        }
    }
}
