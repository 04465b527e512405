//! Streaming client for OpenAI-compatible chat completion endpoints.

use anyhow::{Context, Result, anyhow};
use std::io::{BufRead, BufReader, Write};
use std::time::Duration;

use super::stream::CompletionStream;
use super::types::ChatCompletionRequest;
use crate::config::AiSettings;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Returned instead of an analysis when no API key is configured.
pub const SKIPPED_MESSAGE: &str = "No AI API key configured, skipping AI analysis";

/// Opens a streaming response body for a chat completion request.
pub trait ChatTransport {
    fn open(
        &self,
        endpoint: &str,
        api_key: &str,
        request: &ChatCompletionRequest,
    ) -> Result<Box<dyn BufRead + Send>>;
}

/// Blocking HTTP transport.
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self> {
        // Streams can run for minutes, only bound the connect phase
        let client = reqwest::blocking::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(None::<Duration>)
            .build()
            .map_err(|e| anyhow!("Failed to create HTTP client: {}", e))?;

        Ok(Self { client })
    }
}

impl ChatTransport for HttpTransport {
    fn open(
        &self,
        endpoint: &str,
        api_key: &str,
        request: &ChatCompletionRequest,
    ) -> Result<Box<dyn BufRead + Send>> {
        let response = self
            .client
            .post(endpoint)
            .bearer_auth(api_key)
            .header("accept", "text/event-stream")
            .json(request)
            .send()
            .map_err(|e| anyhow!("API request failed: {}", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(anyhow!("API error ({}): {}", status, body));
        }

        Ok(Box::new(BufReader::new(response)))
    }
}

/// Sends one prompt and reassembles the streamed answer.
pub struct CompletionClient<T = HttpTransport> {
    api_key: String,
    model: String,
    base_url: String,
    transport: T,
}

impl CompletionClient<HttpTransport> {
    pub fn builder() -> CompletionClientBuilder {
        CompletionClientBuilder::default()
    }

    pub fn from_settings(settings: &AiSettings) -> Result<Self> {
        let mut builder = Self::builder()
            .api_key(settings.api_key.clone())
            .model(settings.model.clone());
        if let Some(base_url) = &settings.base_url {
            builder = builder.base_url(base_url.clone());
        }
        builder.build()
    }
}

impl<T: ChatTransport> CompletionClient<T> {
    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    /// Stream a completion for `prompt`, writing each fragment to `sink` as
    /// it arrives, and return the full answer.
    ///
    /// Without an API key no request is made; [`SKIPPED_MESSAGE`] is written
    /// to the sink and returned.
    pub fn complete(&self, prompt: &str, mut sink: Option<&mut dyn Write>) -> Result<String> {
        if self.api_key.is_empty() {
            tracing::info!("No API key configured, skipping completion");
            if let Some(sink) = sink.as_mut() {
                write!(sink, "{}", SKIPPED_MESSAGE)
                    .context("Failed to write completion output")?;
            }
            return Ok(SKIPPED_MESSAGE.to_string());
        }

        let request = ChatCompletionRequest::streaming(&self.model, prompt);
        let endpoint = self.endpoint();
        tracing::debug!("Requesting completion from {} with model {}", endpoint, self.model);

        let body = self.transport.open(&endpoint, &self.api_key, &request)?;

        let mut answer = String::new();
        for fragment in CompletionStream::new(body) {
            let fragment = fragment?;
            if let Some(sink) = sink.as_mut() {
                sink.write_all(fragment.as_bytes())
                    .and_then(|_| sink.flush())
                    .context("Failed to write completion output")?;
            }
            answer.push_str(&fragment);
        }

        tracing::debug!("Completion finished, {} bytes", answer.len());
        Ok(answer)
    }
}

/// Builder for [`CompletionClient`].
pub struct CompletionClientBuilder {
    api_key: String,
    model: String,
    base_url: String,
}

impl Default for CompletionClientBuilder {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl CompletionClientBuilder {
    pub fn api_key(mut self, api_key: String) -> Self {
        self.api_key = api_key;
        self
    }

    pub fn model(mut self, model: String) -> Self {
        self.model = model;
        self
    }

    /// Override the endpoint base; quotes and trailing slashes are trimmed.
    pub fn base_url(mut self, base_url: String) -> Self {
        let trimmed = base_url.trim().trim_matches('"').trim_end_matches('/');
        if !trimmed.is_empty() {
            self.base_url = trimmed.to_string();
        }
        self
    }

    pub fn build(self) -> Result<CompletionClient<HttpTransport>> {
        Ok(self.build_with_transport(HttpTransport::new()?))
    }

    pub fn build_with_transport<T: ChatTransport>(self, transport: T) -> CompletionClient<T> {
        CompletionClient {
            api_key: self.api_key,
            model: self.model,
            base_url: self.base_url,
            transport,
        }
    }
}
