use std::time::Duration;

use reqwest::StatusCode as HttpStatusCode;
use serde_json::{Value, json};
use thiserror::Error;

pub const DEFAULT_COMPLETION_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum TextGenError {
    #[error("{0} is not configured")]
    NotConfigured(&'static str),
    #[error("text service request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("text service returned {status}: {body}")]
    Api { status: HttpStatusCode, body: String },
    #[error("text service response does not contain candidate text")]
    MalformedResponse,
}

/// The external services the content pipeline talks to: a general-purpose
/// completion endpoint for drafting and a paraphrasing endpoint used as the
/// primary rewrite path. Either may be absent in a given deployment.
pub struct TextServices {
    pub completion: Option<CompletionClient>,
    pub paraphrase: Option<ParaphraseClient>,
}

impl TextServices {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        Ok(Self {
            completion: CompletionClient::from_env()?,
            paraphrase: ParaphraseClient::from_env()?,
        })
    }

    pub fn completion(&self) -> Result<&CompletionClient, TextGenError> {
        self.completion
            .as_ref()
            .ok_or(TextGenError::NotConfigured("GEMINI_API_KEY"))
    }

    /// Two-tier rewrite: the paraphrasing service first, then the completion
    /// service with an explicit rewrite instruction. Each tier is attempted
    /// once; the fallback's error propagates unwrapped.
    pub async fn rewrite(&self, text: &str) -> Result<String, TextGenError> {
        if let Some(paraphrase) = &self.paraphrase {
            match paraphrase.paraphrase(text).await {
                Ok(rewritten) => return Ok(rewritten),
                Err(error) => {
                    tracing::warn!("Paraphrase service failed, falling back to completion: {}", error);
                }
            }
        }

        self.completion()?.generate(&build_rewrite_prompt(text)).await
    }
}

/// Gemini-style `generateContent` client.
pub struct CompletionClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl CompletionClient {
    pub fn from_env() -> Result<Option<Self>, anyhow::Error> {
        let Ok(api_key) = std::env::var("GEMINI_API_KEY") else {
            return Ok(None);
        };
        let model =
            std::env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_COMPLETION_MODEL.to_string());
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs()))
            .build()?;

        Ok(Some(Self {
            client,
            api_key,
            model,
        }))
    }

    pub async fn draft_post(&self, title: &str, context: Option<&str>) -> Result<String, TextGenError> {
        self.generate(&build_draft_prompt(title, context)).await
    }

    pub async fn generate(&self, prompt: &str) -> Result<String, TextGenError> {
        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent?key={}",
            self.model, self.api_key
        );
        let request_body = json!({
            "contents": [
                {
                    "role": "user",
                    "parts": [{ "text": prompt }]
                }
            ],
            "generationConfig": {
                "temperature": 0.7
            }
        });

        let response = self.client.post(&url).json(&request_body).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status != HttpStatusCode::OK {
            return Err(TextGenError::Api { status, body });
        }

        let raw: Value = serde_json::from_str(&body).map_err(|_| TextGenError::MalformedResponse)?;
        let text = raw
            .get("candidates")
            .and_then(|c| c.as_array())
            .and_then(|arr| arr.first())
            .and_then(|item| item.get("content"))
            .and_then(|content| content.get("parts"))
            .and_then(|parts| parts.as_array())
            .and_then(|parts| parts.first())
            .and_then(|part| part.get("text"))
            .and_then(|text| text.as_str())
            .ok_or(TextGenError::MalformedResponse)?;

        Ok(text.trim().to_string())
    }
}

/// Plain-text HTTP paraphrasing service: the request body is the text to
/// rewrite, the response body is the rewritten text.
pub struct ParaphraseClient {
    client: reqwest::Client,
    url: String,
}

impl ParaphraseClient {
    pub fn from_env() -> Result<Option<Self>, anyhow::Error> {
        let Ok(url) = std::env::var("PARAPHRASE_API_URL") else {
            return Ok(None);
        };
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs()))
            .build()?;

        Ok(Some(Self { client, url }))
    }

    pub async fn paraphrase(&self, text: &str) -> Result<String, TextGenError> {
        let response = self
            .client
            .post(&self.url)
            .header(reqwest::header::CONTENT_TYPE, "text/plain")
            .body(text.to_string())
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if status != HttpStatusCode::OK {
            return Err(TextGenError::Api { status, body });
        }

        Ok(body.trim().to_string())
    }
}

fn build_draft_prompt(title: &str, context: Option<&str>) -> String {
    format!(
        r#"You are a writing assistant for a personal blog. Write an engaging, well-structured blog post in Markdown. Output only the post body, no front matter and no commentary.

Title:
{}

Additional context:
{}
"#,
        title,
        context.unwrap_or("(none)")
    )
}

fn build_rewrite_prompt(text: &str) -> String {
    format!(
        r#"Rewrite the following text so it reads naturally, with varied sentence structure and vocabulary, while preserving its meaning. Output only the rewritten text.

Text:
{}
"#,
        text
    )
}

fn timeout_secs() -> u64 {
    std::env::var("TEXT_SERVICE_TIMEOUT_SECS")
        .ok()
        .and_then(|raw| raw.parse::<u64>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_TIMEOUT_SECS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_prompt_carries_title_and_context() {
        let prompt = build_draft_prompt("Hello World", Some("a post about greetings"));
        assert!(prompt.contains("Hello World"));
        assert!(prompt.contains("a post about greetings"));

        let without_context = build_draft_prompt("Hello World", None);
        assert!(without_context.contains("(none)"));
    }

    #[test]
    fn rewrite_prompt_embeds_the_text() {
        let prompt = build_rewrite_prompt("some generated paragraph");
        assert!(prompt.contains("some generated paragraph"));
        assert!(prompt.starts_with("Rewrite"));
    }

    #[tokio::test]
    async fn rewrite_without_any_service_reports_missing_config() {
        let services = TextServices {
            completion: None,
            paraphrase: None,
        };
        let error = services.rewrite("text").await.unwrap_err();
        assert!(matches!(error, TextGenError::NotConfigured(_)));
    }
}
