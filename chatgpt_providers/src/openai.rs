use async_trait::async_trait;
use chatgpt_config::{Config, ConfigError};
use chatgpt_core::{CompletionClient, CompletionError, Turn};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{debug, info};

use crate::wire::{ResponsesBody, ResponsesRequest, error_message};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

pub struct OpenAiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiClient {
    /// Build a client whose every request is bounded by `timeout`.
    pub fn new(api_key: String, model: String, timeout: Duration) -> Result<Self, ConfigError> {
        info!("Creating OpenAiClient: model={model}");
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(CONNECT_TIMEOUT.min(timeout))
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(Self {
            client,
            api_key,
            base_url: chatgpt_config::DEFAULT_BASE_URL.to_string(),
            model,
        })
    }

    /// Fails with [`ConfigError::MissingApiKey`] before any network use.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let api_key = config.api_key()?.to_string();
        Ok(Self::new(
            api_key,
            config.model.clone(),
            Duration::from_secs(config.timeout_secs),
        )?
        .with_base_url(config.base_url.clone()))
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn network_error(e: &reqwest::Error) -> CompletionError {
        if e.is_timeout() {
            CompletionError::Network(format!("request timed out: {e}"))
        } else {
            CompletionError::Network(e.to_string())
        }
    }
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn complete(&self, turns: &[Turn]) -> Result<String, CompletionError> {
        let request = ResponsesRequest {
            model: &self.model,
            input: turns,
        };

        info!(
            "Sending request to completion API: model={}, turns={}",
            self.model,
            turns.len()
        );

        let response = self
            .client
            .post(format!("{}/responses", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| Self::network_error(&e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Self::network_error(&e))?;
        debug!("Completion API answered {status} with {} bytes", body.len());

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(CompletionError::RateLimit {
                message: error_message(&body).unwrap_or_else(|| status.to_string()),
            });
        }

        if !status.is_success() {
            return Err(CompletionError::Api {
                status: status.as_u16(),
                message: error_message(&body).unwrap_or_else(|| status.to_string()),
            });
        }

        let parsed: ResponsesBody = serde_json::from_str(&body)
            .map_err(|e| CompletionError::MalformedResponse(e.to_string()))?;
        let text = parsed.into_text()?;

        info!("Received response from completion API");
        Ok(text)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn config(api_key: Option<&str>) -> Config {
        Config {
            api_key: api_key.map(str::to_string),
            model: "gpt-4.1-mini".to_string(),
            base_url: "http://127.0.0.1:9/v1/".to_string(),
            history_path: PathBuf::from("/tmp/history.json"),
            max_turns: 60,
            system_prompt: None,
            timeout_secs: 5,
            retry_delays_secs: Vec::new(),
        }
    }

    #[test]
    fn from_config_requires_api_key() {
        let Err(err) = OpenAiClient::from_config(&config(None)) else {
            panic!("client built without a credential");
        };
        assert!(matches!(err, ConfigError::MissingApiKey));
    }

    #[test]
    fn from_config_uses_configured_model_and_base_url() {
        let client = OpenAiClient::from_config(&config(Some("sk-test"))).unwrap();

        assert_eq!(client.model(), "gpt-4.1-mini");
        assert_eq!(client.base_url, "http://127.0.0.1:9/v1");
    }
}
