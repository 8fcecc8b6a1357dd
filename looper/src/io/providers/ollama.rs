//! Ollama backend: local inference server over HTTP.

use std::time::Duration;

use anyhow::{Context, Result, bail};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::io::provider::{ChatRequest, Provider};
use crate::io::providers::clamp_output;

/// Backend that talks to a local Ollama server.
pub struct OllamaProvider {
    base_url: String,
    model: String,
    client: Client,
}

#[derive(Debug, Serialize)]
struct ChatBody<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    message: ReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct TagsReply {
    #[serde(default)]
    models: Vec<TagEntry>,
}

#[derive(Debug, Deserialize)]
struct TagEntry {
    name: String,
}

impl OllamaProvider {
    pub fn new(base_url: String, model: String) -> Result<Self> {
        let client = Client::builder()
            .build()
            .context("build ollama http client")?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            client,
        })
    }
}

impl Provider for OllamaProvider {
    fn name(&self) -> &'static str {
        "ollama"
    }

    #[instrument(skip_all, fields(model = %self.model))]
    fn chat(&self, request: &ChatRequest) -> Result<String> {
        let body = ChatBody {
            model: &self.model,
            messages: vec![Message {
                role: "user",
                content: &request.prompt,
            }],
            // The loop consumes one complete response per iteration.
            stream: false,
        };

        let url = format!("{}/api/chat", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&body)
            .timeout(request.timeout)
            .send()
            .with_context(|| format!("send chat request to {url}"))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().unwrap_or_default();
            bail!("ollama chat failed with {status}: {}", detail.trim());
        }

        let reply: ChatReply = response.json().context("parse ollama chat response")?;
        debug!(bytes = reply.message.content.len(), "ollama reply received");
        Ok(clamp_output(reply.message.content, request.output_limit_bytes))
    }
}

/// List the model names served at `base_url`. Used by provider detection.
pub(crate) fn list_models(base_url: &str, timeout: Duration) -> Result<Vec<String>> {
    let url = format!("{}/api/tags", base_url.trim_end_matches('/'));
    let client = Client::builder()
        .timeout(timeout)
        .build()
        .context("build ollama probe client")?;
    let response = client
        .get(&url)
        .send()
        .with_context(|| format!("probe {url}"))?;
    let status = response.status();
    if !status.is_success() {
        bail!("ollama tags probe failed with {status}");
    }
    let tags: TagsReply = response.json().context("parse ollama tags response")?;
    Ok(tags.models.into_iter().map(|entry| entry.name).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_body_serializes_a_single_user_message() {
        let body = ChatBody {
            model: "llama3.1",
            messages: vec![Message {
                role: "user",
                content: "do the thing",
            }],
            stream: false,
        };

        let json = serde_json::to_value(&body).expect("serialize");
        assert_eq!(json["model"], "llama3.1");
        assert_eq!(json["stream"], false);
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "do the thing");
    }

    #[test]
    fn tags_reply_tolerates_missing_model_list() {
        let tags: TagsReply = serde_json::from_str("{}").expect("parse");
        assert!(tags.models.is_empty());

        let tags: TagsReply =
            serde_json::from_str(r#"{"models": [{"name": "llama3.1:latest", "size": 42}]}"#)
                .expect("parse");
        assert_eq!(tags.models[0].name, "llama3.1:latest");
    }
}
