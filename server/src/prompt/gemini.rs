use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, Context};
use indoc::formatdoc;
use serde::{Deserialize, Serialize};
use serde_json::json;

use lib_classify::Label;

use crate::{
    server_config::{cfg, gemini_api_key},
    HttpClient,
};

const AI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Structured triage answer from the Gemini fallback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiTriage {
    pub classification: Label,
    pub suggested_reply: String,
    pub justification: String,
}

fn triage_prompt(email_text: &str) -> String {
    formatdoc! {r#"
        Você é um sistema automatizado responsável por analisar e classificar
        emails recebidos por uma grande empresa do setor financeiro.

        Tarefa:
        Analise o email abaixo e:

        1. Classifique o conteúdo como PRODUTIVO ou IMPRODUTIVO.
        2. Sugira uma resposta automática adequada ao tipo identificado.

        Critérios de Classificação:

        PRODUTIVO:
        - Solicitações de andamento ou status de processos
        - Envio ou solicitação de documentos
        - Dúvidas sobre serviços, contratos ou operações
        - Mensagens que exigem ação ou resposta da equipe

        IMPRODUTIVO:
        - Mensagens de felicitação ou cortesia (ex: "feliz natal", "bom dia")
        - Agradecimentos sem nova solicitação
        - Conteúdo genérico, irrelevante ou sem demanda clara

        Formato de Resposta:
        Responda EXCLUSIVAMENTE com um único objeto JSON no seguinte formato:

        {{
          "classification": "PRODUTIVO ou IMPRODUTIVO",
          "suggested_reply": "Resposta automática profissional e objetiva",
          "justification": "Breve explicação da decisão"
        }}

        Texto:
        "{email_text}"
    "#, email_text = email_text}
}

/// Consult Gemini with the original, un-normalized email text.
///
/// Single attempt, explicit timeout. Transport failures and unparseable
/// responses never surface to the caller; they degrade into the
/// deterministic safe result so the request always gets a usable reply.
pub async fn classify_with_gemini(http_client: &HttpClient, raw_text: &str) -> GeminiTriage {
    match request_triage(http_client, raw_text).await {
        Ok(triage) => triage,
        Err(e) => {
            tracing::warn!("Gemini fallback degraded to safe default: {:?}", e);
            safe_default()
        }
    }
}

/// The result used whenever the oracle cannot be consulted or understood.
pub fn safe_default() -> GeminiTriage {
    GeminiTriage {
        classification: Label::Improdutivo,
        suggested_reply: cfg.replies.improdutivo.clone(),
        justification: "A resposta do serviço Gemini não pôde ser interpretada.".to_string(),
    }
}

async fn request_triage(http_client: &HttpClient, raw_text: &str) -> anyhow::Result<GeminiTriage> {
    let api_key = gemini_api_key().ok_or_else(|| anyhow!("GEMINI_API_KEY is not set"))?;
    let url = format!("{}/{}:generateContent", AI_ENDPOINT, cfg.model.id);

    let resp = http_client
        .post(&url)
        .query(&[("key", api_key)])
        .timeout(Duration::from_secs(cfg.model.timeout_secs))
        .json(&json!({
            "contents": [
                { "parts": [ { "text": triage_prompt(raw_text) } ] }
            ],
            "generationConfig": { "temperature": cfg.model.temperature }
        }))
        .send()
        .await?
        .error_for_status()?
        .json::<GenerateContentResponse>()
        .await?;

    let text = resp
        .candidates
        .first()
        .and_then(|c| c.content.parts.first())
        .map(|p| p.text.as_str())
        .context("No candidates in Gemini response")?;

    parse_triage_response(text)
}

/// Parse the model's answer text into a [`GeminiTriage`].
///
/// Explicit two-outcome step: the caller decides what a failure becomes.
pub fn parse_triage_response(text: &str) -> anyhow::Result<GeminiTriage> {
    let body = strip_code_fences(text.trim());

    #[derive(Deserialize)]
    struct RawTriage {
        classification: String,
        suggested_reply: String,
        justification: String,
    }

    let raw: RawTriage =
        serde_json::from_str(&body).context("Gemini response is not a valid JSON object")?;
    let classification = Label::from_str(raw.classification.trim())
        .map_err(|_| anyhow!("Unknown classification: {}", raw.classification))?;

    Ok(GeminiTriage {
        classification,
        suggested_reply: raw.suggested_reply,
        justification: raw.justification,
    })
}

/// Drop the first and last lines of a ```-fenced block, tagged or not.
fn strip_code_fences(text: &str) -> String {
    if text.starts_with("```") && text.ends_with("```") {
        let lines: Vec<&str> = text.lines().collect();
        if lines.len() >= 2 {
            return lines[1..lines.len() - 1].join("\n");
        }
    }
    text.to_string()
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_plain_json() {
        let triage = parse_triage_response(
            r#"{"classification":"produtivo","suggested_reply":"Recebido, retornaremos em breve.","justification":"Pede status."}"#,
        )
        .unwrap();
        assert_eq!(triage.classification, Label::Produtivo);
        assert_eq!(triage.suggested_reply, "Recebido, retornaremos em breve.");
    }

    #[test]
    fn test_strips_tagged_code_fence() {
        let text = "```json\n{\"classification\":\"IMPRODUTIVO\",\"suggested_reply\":\"Obrigado.\",\"justification\":\"Cortesia.\"}\n```";
        let triage = parse_triage_response(text).unwrap();
        assert_eq!(triage.classification, Label::Improdutivo);
    }

    #[test]
    fn test_strips_untagged_code_fence() {
        let text = "```\n{\"classification\":\"PRODUTIVO\",\"suggested_reply\":\"Ok.\",\"justification\":\"Ação.\"}\n```";
        assert!(parse_triage_response(text).is_ok());
    }

    #[test]
    fn test_non_json_response_is_an_error() {
        assert!(parse_triage_response("Não consigo classificar este email.").is_err());
    }

    #[test]
    fn test_unknown_classification_is_an_error() {
        let text = r#"{"classification":"TALVEZ","suggested_reply":"x","justification":"y"}"#;
        assert!(parse_triage_response(text).is_err());
    }

    #[test]
    fn test_safe_default_is_unproductive() {
        let triage = safe_default();
        assert_eq!(triage.classification, Label::Improdutivo);
        assert!(!triage.suggested_reply.is_empty());
        assert!(triage.justification.contains("não pôde ser interpretada"));
    }
}
