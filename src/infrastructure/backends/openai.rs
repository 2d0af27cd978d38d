#[cfg(test)]
#[path = "openai_test.rs"]
mod tests;

use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;
use futures::stream;
use futures::stream::StreamExt;
use futures::stream::TryStreamExt;
use serde::Deserialize;
use serde::Serialize;
use tokio::io::AsyncBufRead;
use tokio::io::AsyncBufReadExt;
use tokio_util::io::StreamReader;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Backend;
use crate::domain::models::CompletionRequest;
use crate::domain::models::CompletionStream;

fn convert_err(err: reqwest::Error) -> std::io::Error {
    let err_msg = err.to_string();
    return std::io::Error::new(std::io::ErrorKind::Interrupted, err_msg);
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct CompletionDeltaResponse {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct CompletionChoiceResponse {
    #[serde(default)]
    delta: CompletionDeltaResponse,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoiceResponse>,
}

#[derive(Debug, PartialEq, Eq)]
enum StreamLine {
    Skip,
    Done,
    Fragment(String),
}

/// Reads one line of the event stream. Blank lines, comments, non-data
/// fields, and chunks that fail to parse are skipped rather than ending the
/// reply.
fn parse_line(line: &str) -> StreamLine {
    let mut cleaned_line = line.trim();
    if cleaned_line.is_empty() || cleaned_line.starts_with(':') {
        return StreamLine::Skip;
    }
    if let Some(data) = cleaned_line.strip_prefix("data:") {
        cleaned_line = data.trim();
    }
    if cleaned_line == "[DONE]" {
        return StreamLine::Done;
    }

    let ores = match serde_json::from_str::<CompletionResponse>(cleaned_line) {
        Ok(ores) => ores,
        Err(err) => {
            tracing::warn!(error = ?err, line = cleaned_line, "Skipping malformed completion chunk");
            return StreamLine::Skip;
        }
    };
    tracing::debug!(body = ?ores, "Completion response");

    match ores.choices.into_iter().next().and_then(|e| return e.delta.content) {
        Some(text) if !text.is_empty() => return StreamLine::Fragment(text),
        _ => return StreamLine::Skip,
    }
}

/// Turns a line reader over the response body into reply fragments. The
/// stream ends at `[DONE]`, at end of body, or right after the first read
/// error.
fn fragments<R>(reader: R) -> CompletionStream
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    let lines = reader.lines();
    return stream::unfold(Some(lines), |state| async move {
        let mut lines = state?;
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => match parse_line(&line) {
                    StreamLine::Skip => continue,
                    StreamLine::Done => return None,
                    StreamLine::Fragment(text) => return Some((Ok(text), Some(lines))),
                },
                Ok(None) => return None,
                Err(err) => return Some((Err(anyhow::Error::from(err)), None)),
            }
        }
    })
    .boxed();
}

pub struct OpenAI {
    url: String,
    token: String,
    client: reqwest::Client,
}

impl Default for OpenAI {
    fn default() -> OpenAI {
        return OpenAI::new(
            &Config::get(ConfigKey::CompletionURL),
            &Config::get(ConfigKey::ApiKey),
        );
    }
}

impl OpenAI {
    pub fn new(url: &str, token: &str) -> OpenAI {
        return OpenAI {
            url: url.to_string(),
            token: token.to_string(),
            client: reqwest::Client::new(),
        };
    }
}

#[async_trait]
impl Backend for OpenAI {
    fn check_config(&self) -> Result<()> {
        if self.url.is_empty() {
            bail!("The completion endpoint URL is not configured");
        }
        if self.token.is_empty() {
            bail!("The API key is not configured");
        }

        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn get_completion(&self, request: CompletionRequest) -> Result<CompletionStream> {
        tracing::debug!(
            model = request.model,
            messages = request.messages.len(),
            "Sending completion request"
        );

        let res = self
            .client
            .post(&self.url)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", self.token))
            .json(&request)
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            tracing::error!(
                status = status.as_u16(),
                body = body,
                "Failed to make completion request"
            );
            bail!(
                "Completion request failed with HTTP {}: {}",
                status.as_u16(),
                body.trim()
            );
        }

        let stream = res.bytes_stream().map_err(convert_err);
        return Ok(fragments(StreamReader::new(stream)));
    }
}
