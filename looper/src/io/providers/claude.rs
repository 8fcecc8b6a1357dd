//! Claude backend: the Anthropic Messages API over HTTPS.

use anyhow::{Context, Result, bail};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::io::provider::{ChatRequest, Provider};
use crate::io::providers::clamp_output;

const MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 4096;

/// Backend that talks to the hosted Claude Messages API.
pub struct ClaudeProvider {
    api_key: String,
    model: String,
    client: Client,
}

#[derive(Debug, Serialize)]
struct MessagesBody<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesReply {
    content: Vec<ContentBlock>,
}

/// One response content block. Only `text` blocks carry agent output;
/// other kinds (tool use, thinking) are skipped rather than rejected.
#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

impl ClaudeProvider {
    pub fn new(api_key: String, model: String) -> Result<Self> {
        let client = Client::builder()
            .build()
            .context("build claude http client")?;
        Ok(Self {
            api_key,
            model,
            client,
        })
    }
}

impl Provider for ClaudeProvider {
    fn name(&self) -> &'static str {
        "claude"
    }

    #[instrument(skip_all, fields(model = %self.model))]
    fn chat(&self, request: &ChatRequest) -> Result<String> {
        let body = MessagesBody {
            model: &self.model,
            max_tokens: MAX_TOKENS,
            messages: vec![Message {
                role: "user",
                content: &request.prompt,
            }],
        };

        let response = self
            .client
            .post(MESSAGES_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .timeout(request.timeout)
            .send()
            .context("send claude messages request")?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().unwrap_or_default();
            bail!("claude messages request failed with {status}: {}", detail.trim());
        }

        let reply: MessagesReply = response.json().context("parse claude messages response")?;
        let text = extract_text(&reply);
        debug!(bytes = text.len(), "claude reply received");
        Ok(clamp_output(text, request.output_limit_bytes))
    }
}

/// Concatenate the `text` content blocks of a response.
fn extract_text(reply: &MessagesReply) -> String {
    reply
        .content
        .iter()
        .filter(|block| block.kind == "text")
        .map(|block| block.text.as_str())
        .collect()
}
