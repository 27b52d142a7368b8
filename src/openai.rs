//! OpenAI-compatible client configuration.

use crate::error::{LeseError, Result};
use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Connection details for an OpenAI-compatible endpoint.
#[derive(Debug, Clone, Default)]
pub struct Endpoint {
    /// Base URL override (e.g. a Mistral or self-hosted gateway). `None` uses api.openai.com.
    pub api_base: Option<String>,
    /// Environment variable holding the API key.
    pub api_key_env: String,
}

/// Create a client for the endpoint with the given request timeout.
///
/// The key is read from `api_key_env` when set; otherwise async-openai falls
/// back to `OPENAI_API_KEY`.
pub fn create_client(endpoint: &Endpoint, timeout: Duration) -> Result<Client<OpenAIConfig>> {
    let http_client = reqwest::Client::builder().timeout(timeout).build()?;

    let mut config = OpenAIConfig::default();
    if let Some(base) = endpoint.api_base.as_deref().filter(|b| !b.is_empty()) {
        config = config.with_api_base(base);
    }
    if !endpoint.api_key_env.is_empty() {
        match std::env::var(&endpoint.api_key_env) {
            Ok(key) => config = config.with_api_key(key),
            Err(_) if endpoint.api_key_env == "OPENAI_API_KEY" => {}
            Err(_) => {
                return Err(LeseError::Config(format!(
                    "{} not set. Export it before using this provider.",
                    endpoint.api_key_env
                )))
            }
        }
    }

    Ok(Client::with_config(config).with_http_client(http_client))
}
