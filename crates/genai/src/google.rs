//! Google Gemini adapter.
//!
//! Implements the Gemini `generateContent` API. Auth is via an API key
//! passed as a query parameter (`key={api_key}`).

use serde_json::Value;

use crate::traits::{DialogueModel, DialogueRequest};
use crate::util::{from_reqwest, resolve_api_key};
use ll_domain::config::GenAiConfig;
use ll_domain::dialogue::{Completion, CompletionStatus};
use ll_domain::error::{Error, Result};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Adapter struct
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A dialogue-model adapter for the Google Gemini API.
///
/// Holds only connection state (base URL, key, HTTP client) — never any
/// per-conversation state. A single instance is safe to share across
/// concurrent turns.
pub struct GeminiModel {
    base_url: String,
    model: String,
    api_key: String,
    client: reqwest::Client,
}

impl GeminiModel {
    /// Create a new adapter from the deserialized genai config.
    pub fn from_config(cfg: &GenAiConfig) -> Result<Self> {
        let api_key = resolve_api_key(cfg)?;

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_millis(cfg.timeout_ms))
            .build()
            .map_err(from_reqwest)?;

        Ok(Self {
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            model: cfg.model.clone(),
            api_key,
            client,
        })
    }

    // ── Internal helpers ───────────────────────────────────────────

    fn generate_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        )
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Request serialization
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

fn build_body(req: &DialogueRequest) -> Value {
    let contents: Vec<Value> = req
        .turns
        .iter()
        .map(|turn| {
            serde_json::json!({
                "role": turn.role.as_str(),
                "parts": [{"text": turn.text}],
            })
        })
        .collect();

    let mut body = serde_json::json!({
        "contents": contents,
    });

    let mut gen_config = serde_json::json!({});
    if let Some(temp) = req.temperature {
        gen_config["temperature"] = serde_json::json!(temp);
    }
    if let Some(max) = req.max_output_tokens {
        gen_config["maxOutputTokens"] = serde_json::json!(max);
    }
    if gen_config.as_object().is_some_and(|o| !o.is_empty()) {
        body["generationConfig"] = gen_config;
    }

    body
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Response deserialization
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

fn parse_response(body: &Value) -> Result<Completion> {
    let Some(candidate) = body
        .get("candidates")
        .and_then(|c| c.as_array())
        .and_then(|a| a.first())
    else {
        // A fully blocked prompt has no candidates, only promptFeedback.
        if block_reason(body) == Some("SAFETY") {
            return Ok(Completion {
                text: String::new(),
                status: CompletionStatus::SafetyBlocked,
            });
        }
        return Err(Error::Provider {
            provider: "google".into(),
            message: "no candidates in response".into(),
        });
    };

    let mut text = String::new();
    if let Some(parts) = candidate
        .get("content")
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.as_array())
    {
        for part in parts {
            if let Some(t) = part.get("text").and_then(|v| v.as_str()) {
                text.push_str(t);
            }
        }
    }

    let finish_reason = candidate.get("finishReason").and_then(|v| v.as_str());
    let status = CompletionStatus::from_finish_reason(finish_reason);

    Ok(Completion { text, status })
}

fn block_reason(body: &Value) -> Option<&str> {
    body.get("promptFeedback")
        .and_then(|f| f.get("blockReason"))
        .and_then(|v| v.as_str())
}

/// Redact API key from URL for safe logging.
fn redact_url_key(url: &str) -> String {
    if let Some(idx) = url.find("key=") {
        let prefix = &url[..idx + 4];
        let rest = &url[idx + 4..];
        let end = rest.find('&').unwrap_or(rest.len());
        format!("{prefix}[REDACTED]{}", &rest[end..])
    } else {
        url.to_string()
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Trait implementation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[async_trait::async_trait]
impl DialogueModel for GeminiModel {
    async fn complete(&self, req: &DialogueRequest) -> Result<Completion> {
        let url = self.generate_url();
        let body = build_body(req);

        tracing::debug!(
            model = %self.model,
            url = %redact_url_key(&url),
            turns = req.turns.len(),
            "gemini generate request"
        );

        let resp = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(from_reqwest)?;

        let status = resp.status();
        let resp_text = resp.text().await.map_err(from_reqwest)?;

        if !status.is_success() {
            return Err(Error::Provider {
                provider: "google".into(),
                message: format!("HTTP {} - {}", status.as_u16(), resp_text),
            });
        }

        let resp_json: Value = serde_json::from_str(&resp_text)?;
        parse_response(&resp_json)
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ll_domain::dialogue::DialogueTurn;

    #[test]
    fn body_carries_roles_and_generation_config() {
        let req = DialogueRequest {
            turns: vec![
                DialogueTurn::user("instruction"),
                DialogueTurn::model("ack"),
                DialogueTurn::user("question"),
            ],
            temperature: Some(0.7),
            max_output_tokens: Some(500),
        };

        let body = build_body(&req);
        let contents = body["contents"].as_array().unwrap();
        assert_eq!(contents.len(), 3);
        assert_eq!(contents[0]["role"], "user");
        assert_eq!(contents[1]["role"], "model");
        assert_eq!(contents[2]["parts"][0]["text"], "question");
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 500);
    }

    #[test]
    fn body_omits_empty_generation_config() {
        let req = DialogueRequest {
            turns: vec![DialogueTurn::user("hi")],
            ..Default::default()
        };
        let body = build_body(&req);
        assert!(body.get("generationConfig").is_none());
    }

    #[test]
    fn parse_normal_stop() {
        let body = serde_json::json!({
            "candidates": [{
                "content": {"parts": [{"text": "Spray in the "}, {"text": "morning."}]},
                "finishReason": "STOP",
            }]
        });
        let completion = parse_response(&body).unwrap();
        assert_eq!(completion.text, "Spray in the morning.");
        assert_eq!(completion.status, CompletionStatus::NormalStop);
    }

    #[test]
    fn parse_safety_block_on_candidate() {
        let body = serde_json::json!({
            "candidates": [{
                "finishReason": "SAFETY",
                "safetyRatings": [{"category": "HARM_CATEGORY_DANGEROUS_CONTENT", "probability": "HIGH"}],
            }]
        });
        let completion = parse_response(&body).unwrap();
        assert!(completion.text.is_empty());
        assert_eq!(completion.status, CompletionStatus::SafetyBlocked);
    }

    #[test]
    fn parse_blocked_prompt_without_candidates() {
        let body = serde_json::json!({
            "promptFeedback": {"blockReason": "SAFETY"}
        });
        let completion = parse_response(&body).unwrap();
        assert_eq!(completion.status, CompletionStatus::SafetyBlocked);
    }

    #[test]
    fn parse_unrecognized_reason_is_anomaly() {
        let body = serde_json::json!({
            "candidates": [{
                "content": {"parts": []},
                "finishReason": "RECITATION",
            }]
        });
        let completion = parse_response(&body).unwrap();
        assert_eq!(
            completion.status,
            CompletionStatus::OtherAnomaly("RECITATION".into())
        );
    }

    #[test]
    fn parse_missing_candidates_is_provider_error() {
        let body = serde_json::json!({});
        let err = parse_response(&body).unwrap_err();
        assert!(matches!(err, Error::Provider { .. }));
    }

    #[test]
    fn redacts_key_in_url() {
        let url = "https://example.com/v1beta/models/x:generateContent?key=secret123&alt=json";
        let redacted = redact_url_key(url);
        assert!(!redacted.contains("secret123"));
        assert!(redacted.contains("key=[REDACTED]&alt=json"));
    }
}
