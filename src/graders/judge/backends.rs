use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, header};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use crate::graders::judge::{
    LlmBackend,
    error::{BackendError, invalid_response, transport_error},
};

/// Backend talking to a local Ollama server. Structured output is
/// requested through Ollama's `format` field, which constrains
/// generation to the supplied JSON schema.
#[derive(Clone)]
pub struct OllamaBackend {
    client: Client,
    model: String,
    host: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

impl OllamaBackend {
    pub fn new(model: impl Into<String>, host: impl Into<String>) -> Result<Self, BackendError> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(30))
            .build()
            .map_err(|err| transport_error(format!("failed to build http client: {}", err)))?;
        Ok(Self {
            client,
            model: model.into(),
            host: host.into(),
        })
    }

    pub fn local(model: impl Into<String>) -> Result<Self, BackendError> {
        Self::new(model, "http://localhost:11434")
    }

    async fn generate(&self, body: Value) -> Result<String, BackendError> {
        let url = format!("{}/api/generate", self.host.trim_end_matches('/'));
        debug!(model = %self.model, %url, "ollama_generate");

        let response = self
            .client
            .post(url)
            .header(header::CONTENT_TYPE, "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|err| transport_error(format!("ollama request failed: {}", err)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(transport_error(format!(
                "ollama returned http {}",
                status.as_u16()
            )));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|err| invalid_response(format!("malformed ollama response: {}", err)))?;
        Ok(parsed.response)
    }
}

#[async_trait]
impl LlmBackend for OllamaBackend {
    fn model_id(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str, temperature: f64) -> Result<String, BackendError> {
        let body = json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false,
            "options": {"temperature": temperature},
        });
        self.generate(body).await
    }

    async fn complete_structured(
        &self,
        prompt: &str,
        schema: &Value,
        temperature: f64,
    ) -> Result<Value, BackendError> {
        let body = json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false,
            "format": schema,
            "options": {"temperature": temperature},
        });
        let text = self.generate(body).await?;
        serde_json::from_str(&text)
            .map_err(|err| invalid_response(format!("ollama returned non-JSON output: {}", err)))
    }
}
