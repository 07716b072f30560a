//! TextEstimator backends: an OpenAI-compatible HTTP API and a local command
//!
//! Neither backend retries. A failed call is reported once as
//! `EstimatorUnavailable` and the caller decides what to do.

use std::io::Write;
use std::process::{Command, Stdio};
use std::time::Duration;

use bodyfit_domain::ports::TextEstimator;
use bodyfit_types::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ChatReplyMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Chat-completions client (OpenAI API shape)
pub struct ChatCompletionsEstimator {
    client: reqwest::blocking::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl ChatCompletionsEstimator {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::EstimatorUnavailable(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

impl TextEstimator for ChatCompletionsEstimator {
    fn refine(&self, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        debug!(model = %self.model, endpoint = %self.endpoint(), "sending refinement prompt");

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .map_err(|e| Error::EstimatorUnavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(Error::EstimatorUnavailable(format!("HTTP {}: {}", status, body.trim())));
        }

        let parsed: ChatResponse = response
            .json()
            .map_err(|e| Error::EstimatorUnavailable(format!("unreadable response: {}", e)))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .ok_or_else(|| Error::EstimatorUnavailable("response contained no message".to_string()))
    }
}

/// Runs a local command, writing the prompt to stdin and reading the reply from stdout
pub struct CommandEstimator {
    command: String,
}

impl CommandEstimator {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

impl TextEstimator for CommandEstimator {
    fn refine(&self, prompt: &str) -> Result<String> {
        let mut parts = shell_words::split(&self.command)
            .map_err(|e| Error::EstimatorUnavailable(format!("invalid estimator command: {}", e)))?;
        if parts.is_empty() {
            return Err(Error::EstimatorUnavailable("estimator command is empty".to_string()));
        }
        let program = parts.remove(0);

        debug!(program = %program, args = ?parts, "running estimator command");

        let mut child = Command::new(&program)
            .args(&parts)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Error::EstimatorUnavailable(format!("{}: {}", program, e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(prompt.as_bytes())
                .map_err(|e| Error::EstimatorUnavailable(format!("failed to send prompt: {}", e)))?;
        }

        let output = child
            .wait_with_output()
            .map_err(|e| Error::EstimatorUnavailable(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::EstimatorUnavailable(format!(
                "{} exited with {}: {}",
                program,
                output.status,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}
