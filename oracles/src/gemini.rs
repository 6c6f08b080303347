use std::{fmt::Debug, time::Duration};

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use types::{Oracle, OracleError, OracleResponse};

pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const SYSTEM_INSTRUCTION: &str = "VALIDATOR: Check if player played for club. \
Output JSON only. \
Field \"isValid\": boolean. \
Field \"appearances\": total competitive matches for THIS club. \
Field \"explanation\": string (why invalid). \
Use internal knowledge if 100% certain to save time. Use search ONLY for exact numbers if unsure.";

#[derive(Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub endpoint: String,
    pub timeout: Duration,
}

impl GeminiConfig {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            model: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Asks Gemini, grounded with Google Search, whether a player played for a
/// club and how often.
#[derive(Debug)]
pub struct GeminiOracle {
    client: reqwest::Client,
    config: GeminiConfig,
}

impl GeminiOracle {
    pub fn new(config: GeminiConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    fn url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.endpoint.trim_end_matches('/'),
            self.config.model
        )
    }
}

pub fn request_body(player_name: &str, club_name: &str) -> Value {
    json!({
        "systemInstruction": { "parts": [{ "text": SYSTEM_INSTRUCTION }] },
        "contents": [{
            "role": "user",
            "parts": [{ "text": format!("Player: {player_name}, Club: {club_name}") }]
        }],
        "tools": [{ "googleSearch": {} }],
        "generationConfig": {
            "temperature": 0,
            "responseMimeType": "application/json",
            "responseSchema": {
                "type": "OBJECT",
                "properties": {
                    "isValid": { "type": "BOOLEAN" },
                    "appearances": { "type": "INTEGER" },
                    "explanation": { "type": "STRING" }
                },
                "required": ["isValid", "appearances"]
            },
            "thinkingConfig": { "thinkingBudget": 0 }
        }
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Deserialize)]
struct GroundingChunk {
    web: Option<WebSource>,
}

#[derive(Debug, Deserialize)]
struct WebSource {
    uri: Option<String>,
}

/// Turns a `generateContent` response body into the oracle's answer.
pub fn parse_generate_content(body: &str) -> Result<OracleResponse, OracleError> {
    let envelope: GenerateContentResponse =
        serde_json::from_str(body).map_err(|e| OracleError::Malformed(e.to_string()))?;
    let candidate = envelope.candidates.first();

    let text: String = candidate
        .and_then(|c| c.content.as_ref())
        .map(|content| {
            content
                .parts
                .iter()
                .filter_map(|part| part.text.as_deref())
                .collect()
        })
        .unwrap_or_default();
    let text = strip_code_fence(&text);
    let text = if text.is_empty() { "{}" } else { text };

    let answer: Value =
        serde_json::from_str(text).map_err(|e| OracleError::Malformed(format!("{e}: {text}")))?;
    if !answer.is_object() {
        return Err(OracleError::Malformed(format!("expected an object, got {answer}")));
    }

    let source_url = candidate
        .and_then(|c| c.grounding_metadata.as_ref())
        .and_then(|meta| meta.grounding_chunks.first())
        .and_then(|chunk| chunk.web.as_ref())
        .and_then(|web| web.uri.clone());

    Ok(OracleResponse {
        is_valid: answer.get("isValid").and_then(Value::as_bool),
        appearances: answer.get("appearances").and_then(Value::as_i64),
        explanation: answer
            .get("explanation")
            .and_then(Value::as_str)
            .map(str::to_string),
        source_url,
    })
}

fn strip_code_fence(text: &str) -> &str {
    let text = text.trim();
    let Some(inner) = text.strip_prefix("```") else {
        return text;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

#[async_trait]
impl Oracle for GeminiOracle {
    async fn verify(
        &self,
        player_name: &str,
        club_name: &str,
    ) -> Result<OracleResponse, OracleError> {
        log::debug!("Asking {} about {player_name} at {club_name}", self.config.model);
        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", &self.config.api_key)
            .json(&request_body(player_name, club_name))
            .send()
            .await
            .map_err(|e| OracleError::Unavailable(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| OracleError::Unavailable(e.to_string()))?;
        if !status.is_success() {
            log::error!("Gemini returned {status}: {body}");
            return Err(OracleError::Unavailable(format!("HTTP {status}")));
        }

        parse_generate_content(&body)
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_valid_answer_with_grounding() {
        let body = r#"{
            "candidates": [{
                "content": {"parts": [{"text": "{\"isValid\": true, \"appearances\": 669}"}]},
                "groundingMetadata": {
                    "groundingChunks": [
                        {"web": {"uri": "https://example.org/adams", "title": "Tony Adams"}},
                        {"web": {"uri": "https://example.org/other"}}
                    ]
                }
            }]
        }"#;
        let response = parse_generate_content(body).unwrap();
        assert_eq!(
            response,
            OracleResponse::valid(669).with_source("https://example.org/adams")
        );
    }

    #[test]
    fn test_parses_rejection() {
        let body = r#"{"candidates": [{"content": {"parts": [
            {"text": "{\"isValid\": false, \"appearances\": 0, \"explanation\": \"Never at Arsenal\"}"}
        ]}}]}"#;
        let response = parse_generate_content(body).unwrap();
        assert_eq!(response.is_valid, Some(false));
        assert_eq!(response.explanation.as_deref(), Some("Never at Arsenal"));
        assert_eq!(response.source_url, None);
    }

    #[test]
    fn test_empty_text_is_inconclusive() {
        let response = parse_generate_content(r#"{"candidates": []}"#).unwrap();
        assert!(!response.is_conclusive());
    }

    #[test]
    fn test_non_numeric_appearances_dropped() {
        let body = r#"{"candidates": [{"content": {"parts": [
            {"text": "{\"isValid\": true, \"appearances\": \"lots\"}"}
        ]}}]}"#;
        let response = parse_generate_content(body).unwrap();
        assert_eq!(response.is_valid, Some(true));
        assert_eq!(response.appearances, None);
    }

    #[test]
    fn test_fenced_json_accepted() {
        let body = r#"{"candidates": [{"content": {"parts": [
            {"text": "```json\n{\"isValid\": true, \"appearances\": 12}\n```"}
        ]}}]}"#;
        assert_eq!(parse_generate_content(body).unwrap(), OracleResponse::valid(12));
    }

    #[test]
    fn test_garbage_is_malformed() {
        assert!(matches!(
            parse_generate_content("<html>busy</html>"),
            Err(OracleError::Malformed(_))
        ));
        let body = r#"{"candidates": [{"content": {"parts": [{"text": "I think so"}]}}]}"#;
        assert!(matches!(
            parse_generate_content(body),
            Err(OracleError::Malformed(_))
        ));
    }

    #[test]
    fn test_request_names_player_and_club() {
        let body = request_body("Tony Adams", "Arsenal");
        assert_eq!(
            body["contents"][0]["parts"][0]["text"],
            "Player: Tony Adams, Club: Arsenal"
        );
        assert_eq!(body["generationConfig"]["temperature"], 0);
    }

    #[test]
    fn test_config_debug_hides_key() {
        let config = GeminiConfig::new("secret-key".to_string());
        assert!(!format!("{config:?}").contains("secret-key"));
    }
}
