use crate::incident::IncidentAnalysis;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "llama3.1:8b";

/// Low temperature keeps the narrative close to deterministic for identical
/// evidence.
const GENERATION_TEMPERATURE: f32 = 0.2;

/// A hanging local service must not stall the upgrade; timing out is treated
/// the same as unreachable.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Error, Debug)]
pub enum OllamaError {
    #[error("http request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("ollama returned status {0}")]
    Status(reqwest::StatusCode),
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Client for a local Ollama instance.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: Client,
    base_url: String,
    model: String,
    timeout: Duration,
}

impl OllamaClient {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            model: model.into(),
            timeout: REQUEST_TIMEOUT,
        }
    }

    /// Create from environment variables:
    /// - OLLAMA_URL: base URL (default: http://localhost:11434)
    /// - OLLAMA_MODEL: model name (default: llama3.1:8b)
    pub fn from_env() -> Self {
        let base_url =
            std::env::var("OLLAMA_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let model = std::env::var("OLLAMA_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        Self::new(base_url, model)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Health check: GET the model-list endpoint. Any network failure or
    /// non-2xx response means the service is unavailable.
    pub async fn is_available(&self) -> bool {
        let url = format!("{}/api/tags", self.base_url);
        match self.client.get(&url).timeout(self.timeout).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(err) => {
                tracing::debug!(error = %err, "ollama health check failed");
                false
            }
        }
    }

    /// Non-streaming generation against `/api/generate`.
    pub async fn generate(&self, prompt: &str) -> Result<String, OllamaError> {
        let url = format!("{}/api/generate", self.base_url);
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: GenerateOptions {
                temperature: GENERATION_TEMPERATURE,
            },
        };
        let response = self
            .client
            .post(&url)
            .json(&request)
            .timeout(self.timeout)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(OllamaError::Status(response.status()));
        }
        let body: GenerateResponse = response.json().await?;
        Ok(body.response)
    }

    /// Best-effort narrative upgrade of a heuristic analysis. Returns the
    /// trimmed HTML narrative, or `None` on any failure: unreachable service,
    /// non-OK response, malformed payload. Never an error; the heuristic
    /// analysis stands on its own and the generation call is skipped entirely
    /// when the health check fails.
    pub async fn summarize_incident(&self, analysis: &IncidentAnalysis) -> Option<String> {
        if !self.is_available().await {
            return None;
        }
        let prompt = build_prompt(analysis);
        match self.generate(&prompt).await {
            Ok(text) => Some(text.trim().to_string()),
            Err(err) => {
                tracing::debug!(error = %err, "incident narrative generation failed");
                None
            }
        }
    }
}

/// Structured evidence prompt: the model gets the analysis numbers and a
/// fixed section template, and is told to use nothing else.
pub fn build_prompt(analysis: &IncidentAnalysis) -> String {
    let evidence = serde_json::json!({
        "total": analysis.total,
        "spikes": analysis.spikes,
        "topClusters": analysis.clusters.iter().take(5).collect::<Vec<_>>(),
        "categories": analysis.categories.iter().take(5).collect::<Vec<_>>(),
        "heuristic": analysis.summary,
    });
    format!(
        "ROLE: You are a senior SRE writing a concise engineering incident report.\n\
         \n\
         CONSTRAINTS:\n\
         - Use ONLY the provided evidence. Do not invent data.\n\
         - Output clean, semantic HTML (no markdown, no code fences), a single snippet without <html>/<body>.\n\
         - Keep paragraphs short and high-signal. Mark speculation as hypothesis.\n\
         \n\
         EVIDENCE (JSON):\n\
         {evidence}\n\
         \n\
         TASK: Produce the report with exactly these sections:\n\
         <h3>Incident Overview</h3> - what happened, when (include the spike window if present), and total error volume.\n\
         <h3>Dominant Error Patterns</h3> - <ul> of the 3-5 most significant patterns with frequencies.\n\
         <h3>Primary Root Cause</h3> - the single most likely cause, prioritized by category priority (lower number = higher priority), with 2-3 sentences of justification citing concrete fields (codes, endpoints, services).\n\
         <h3>Alternative Hypotheses</h3> - <ul> of 2-3 plausible alternatives, one sentence each.\n\
         <h3>Immediate Next Steps</h3> - <ol> of 3-6 concrete actions (validate, investigate, mitigate, monitor).\n\
         \n\
         OUTPUT: Return ONLY the HTML content."
    )
}
