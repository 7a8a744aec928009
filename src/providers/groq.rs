//! Groq-style chat-completions Translator adapter.
//!
//! Wire contract: an OpenAI-chat-completions-shaped endpoint is asked for a
//! JSON object `{"translation": "..."}` at low temperature; on any failure
//! to parse that structure out, the adapter falls back to returning the
//! source text unchanged rather than surfacing a hard error, matching the
//! best-effort passthrough the translation step promises.

use tracing::warn;

use super::Translator;
use crate::lang::LangTag;

const ENDPOINT: &str = "https://api.groq.com/openai/v1/chat/completions";
const MODEL: &str = "llama-3.1-8b-instant";

pub struct GroqTranslator {
    api_key: String,
    client: reqwest::Client,
}

impl GroqTranslator {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            client: reqwest::Client::new(),
        }
    }
}

impl Translator for GroqTranslator {
    fn translate<'a>(
        &'a self,
        text: &'a str,
        target_lang: &'a LangTag,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = anyhow::Result<String>> + Send + 'a>>
    {
        Box::pin(async move {
            let body = serde_json::json!({
                "model": MODEL,
                "messages": [
                    {
                        "role": "system",
                        "content": "You are a professional translator. Output only JSON: {\"translation\": \"...\"}",
                    },
                    {
                        "role": "user",
                        "content": format!("Translate to {}: {}", target_lang.name, text),
                    },
                ],
                "temperature": 0.1,
                "response_format": { "type": "json_object" },
            });

            let resp = self
                .client
                .post(ENDPOINT)
                .bearer_auth(&self.api_key)
                .json(&body)
                .send()
                .await
                .map_err(|e| anyhow::anyhow!("Groq translate request failed: {e}"))?;

            if !resp.status().is_success() {
                let status = resp.status();
                let body = resp.text().await.unwrap_or_default();
                anyhow::bail!("Groq translate API error {status}: {body}");
            }

            let json: serde_json::Value = resp
                .json()
                .await
                .map_err(|e| anyhow::anyhow!("Groq translate response was not JSON: {e}"))?;

            let content = json["choices"][0]["message"]["content"].as_str().unwrap_or("");

            match serde_json::from_str::<serde_json::Value>(content) {
                Ok(parsed) => match parsed["translation"].as_str() {
                    Some(translation) => Ok(translation.to_string()),
                    None => {
                        warn!("Groq response JSON had no 'translation' field; passing text through");
                        Ok(text.to_string())
                    }
                },
                Err(e) => {
                    warn!(error = %e, "Groq response was not structured JSON; passing text through");
                    Ok(text.to_string())
                }
            }
        })
    }
}
