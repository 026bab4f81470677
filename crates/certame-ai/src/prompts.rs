//! Instruction templates for the three analysis modes.
//!
//! The JSON shape embedded in the scan templates is the contract the
//! [`ResponseParser`](crate::ResponseParser) decodes, so field names here must
//! stay in step with `certame_core::AnalysisResult`.

use certame_core::{AnalysisMode, Irregularity, PromptPayload};
use tracing::debug;

/// Character budget for the notice in a single-document scan.
pub const SINGLE_DOCUMENT_BUDGET: usize = 100_000;

/// Character budget for each of the two texts in a comparative scan.
pub const COMPARATIVE_BUDGET: usize = 50_000;

/// Section labels an appeal letter must contain, in order.
pub const APPEAL_SECTIONS: [&str; 6] = [
    "Cabeçalho",
    "Qualificação do recorrente",
    "Dos Fatos",
    "Do Direito",
    "Do Pedido",
    "Fecho",
];

const NOTICE_PLACEHOLDER: &str = "{EDITAL}";
const BID_PLACEHOLDER: &str = "{PROPOSTA}";

const EXPERT_PREAMBLE: &str = "\
Você é um especialista em licitações públicas brasileiras com profundo conhecimento da \
Lei 8.666/93, Lei 14.133/21 (Nova Lei de Licitações), Lei do Pregão (10.520/02), e \
jurisprudência do TCU.";

const SINGLE_DOCUMENT_TEMPLATE: &str = "

Analise o seguinte edital de licitação e identifique:
1. Cláusulas restritivas à competitividade
2. Especificações direcionadas ou que mencionam marcas sem justificativa
3. Prazos inexequíveis
4. Exigências excessivas de qualificação técnica ou econômico-financeira
5. Irregularidades formais
6. Violações aos princípios da isonomia, competitividade, economicidade e legalidade

Para cada irregularidade encontrada, forneça:
- O item/cláusula específica do edital
- A descrição do problema
- A fundamentação legal (leis, decretos, súmulas, acórdãos do TCU)
- A severidade (alta, média ou baixa)
- Sugestão de argumentação para impugnação ou recurso

Responda APENAS em formato JSON válido com a seguinte estrutura:
{
  \"resumo\": {
    \"tipo\": \"tipo da licitação (Pregão, Concorrência, etc)\",
    \"numero\": \"número do processo\",
    \"orgao\": \"órgão licitante\",
    \"objeto\": \"descrição resumida do objeto\",
    \"valorEstimado\": \"valor estimado se disponível\"
  },
  \"irregularidades\": [
    {
      \"id\": 1,
      \"tipo\": \"tipo da irregularidade\",
      \"item\": \"número do item/cláusula\",
      \"severidade\": \"alta|media|baixa\",
      \"descricao\": \"descrição detalhada do problema\",
      \"fundamentacao\": \"fundamentação legal completa\",
      \"sugestao\": \"sugestão para argumentação jurídica\"
    }
  ],
  \"totalIrregularidades\": número total,
  \"riscosAltos\": número de riscos altos,
  \"riscosMedios\": número de riscos médios,
  \"riscosBaixos\": número de riscos baixos
}

EDITAL PARA ANÁLISE:
";

const COMPARATIVE_TEMPLATE: &str = "

Compare a proposta vencedora com as exigências do edital e identifique:
1. Descumprimentos das especificações técnicas exigidas
2. Documentação faltante ou irregular
3. Preços inexequíveis ou acima do estimado
4. Falhas na habilitação jurídica, técnica ou econômico-financeira
5. Vícios formais na proposta
6. Qualquer descumprimento que justifique recurso ou impugnação

Para cada irregularidade encontrada, forneça:
- O item/cláusula específica do edital descumprida
- A descrição do problema na proposta
- A fundamentação legal
- A severidade (alta, média ou baixa)
- Sugestão de argumentação para recurso

Responda APENAS em formato JSON válido com a seguinte estrutura:
{
  \"resumo\": {
    \"tipo\": \"tipo da licitação\",
    \"numero\": \"número do processo\",
    \"orgao\": \"órgão licitante\",
    \"objeto\": \"descrição resumida do objeto\",
    \"valorEstimado\": \"valor estimado se disponível\",
    \"valorProposta\": \"valor da proposta analisada se disponível\"
  },
  \"irregularidades\": [
    {
      \"id\": 1,
      \"tipo\": \"tipo da irregularidade\",
      \"item\": \"número do item/cláusula do edital\",
      \"severidade\": \"alta|media|baixa\",
      \"descricao\": \"descrição detalhada do problema encontrado na proposta\",
      \"fundamentacao\": \"fundamentação legal completa\",
      \"sugestao\": \"sugestão para argumentação jurídica no recurso\"
    }
  ],
  \"totalIrregularidades\": número total,
  \"riscosAltos\": número de riscos altos,
  \"riscosMedios\": número de riscos médios,
  \"riscosBaixos\": número de riscos baixos
}

EDITAL:
{EDITAL}

PROPOSTA VENCEDORA:
{PROPOSTA}
";

fn build_appeal_prompt(irregularity: &Irregularity) -> String {
    let [heading, party, facts, law, request, closing] = APPEAL_SECTIONS;
    format!(
        "Você é um advogado especialista em licitações públicas brasileiras. Gere um recurso \
         administrativo formal e completo para impugnar a seguinte irregularidade encontrada \
         em um processo licitatório:\n\
         \n\
         Tipo de Irregularidade: {tipo}\n\
         Item/Cláusula: {item}\n\
         Descrição: {descricao}\n\
         Fundamentação: {fundamentacao}\n\
         \n\
         Gere um recurso administrativo completo em português formal jurídico, incluindo:\n\
         1. {heading} formal endereçado ao Pregoeiro/Comissão de Licitação\n\
         2. {party} (deixar campos para preenchimento)\n\
         3. {facts}\n\
         4. {law} (com citação de leis, jurisprudência do TCU, doutrinas)\n\
         5. {request}\n\
         6. {closing}\n\
         \n\
         O recurso deve ser convincente, bem fundamentado e pronto para uso profissional.",
        tipo = irregularity.tipo,
        item = irregularity.item,
        descricao = irregularity.descricao,
        fundamentacao = irregularity.fundamentacao,
    )
}

/// Inputs for one prompt; the variant determines the [`AnalysisMode`].
#[derive(Debug, Clone, Copy)]
pub enum PromptInput<'a> {
    SingleDocument { notice: &'a str },
    Comparative { notice: &'a str, bid: &'a str },
    Appeal { irregularity: &'a Irregularity },
}

impl PromptInput<'_> {
    pub fn mode(&self) -> AnalysisMode {
        match self {
            Self::SingleDocument { .. } => AnalysisMode::SingleDocumentScan,
            Self::Comparative { .. } => AnalysisMode::ComparativeScan,
            Self::Appeal { .. } => AnalysisMode::AppealDraft,
        }
    }
}

/// Renders mode-specific instruction prompts with bounded document text.
///
/// Truncation is a hard character cut standing in for a token budget; it may
/// end mid-sentence. Rendering is pure: the same input always yields the same
/// payload.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    single_document_budget: usize,
    comparative_budget: usize,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self {
            single_document_budget: SINGLE_DOCUMENT_BUDGET,
            comparative_budget: COMPARATIVE_BUDGET,
        }
    }
}

impl PromptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn build(&self, input: PromptInput<'_>) -> PromptPayload {
        let mode = input.mode();
        let rendered_text = match input {
            PromptInput::SingleDocument { notice } => {
                let notice = truncate_chars(notice, self.single_document_budget);
                let mut text = String::with_capacity(
                    EXPERT_PREAMBLE.len() + SINGLE_DOCUMENT_TEMPLATE.len() + notice.len(),
                );
                text.push_str(EXPERT_PREAMBLE);
                text.push_str(SINGLE_DOCUMENT_TEMPLATE);
                text.push_str(notice);
                text
            }
            PromptInput::Comparative { notice, bid } => {
                let body = render(
                    COMPARATIVE_TEMPLATE,
                    &[
                        (NOTICE_PLACEHOLDER, truncate_chars(notice, self.comparative_budget)),
                        (BID_PLACEHOLDER, truncate_chars(bid, self.comparative_budget)),
                    ],
                );
                format!("{EXPERT_PREAMBLE}{body}")
            }
            PromptInput::Appeal { irregularity } => build_appeal_prompt(irregularity),
        };

        debug!(mode = %mode, chars = rendered_text.chars().count(), "rendered prompt");
        PromptPayload {
            mode,
            rendered_text,
            temperature: mode.temperature(),
        }
    }
}

/// The first `max` characters of `text` (not bytes).
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Substitute placeholders in one left-to-right pass over `template`.
///
/// Substituted values are never rescanned, so a document that contains a
/// placeholder literal cannot be spliced into twice.
fn render(template: &str, substitutions: &[(&str, &str)]) -> String {
    let extra: usize = substitutions.iter().map(|(_, v)| v.len()).sum();
    let mut out = String::with_capacity(template.len() + extra);
    let mut rest = template;

    loop {
        let next = substitutions
            .iter()
            .filter_map(|(key, value)| rest.find(key).map(|pos| (pos, *key, *value)))
            .min_by_key(|(pos, _, _)| *pos);

        match next {
            Some((pos, key, value)) => {
                out.push_str(&rest[..pos]);
                out.push_str(value);
                rest = &rest[pos + key.len()..];
            }
            None => {
                out.push_str(rest);
                return out;
            }
        }
    }
}
