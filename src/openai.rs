//! OpenAI-compatible client configuration with sensible defaults.

use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Default timeout for API requests (2 minutes).
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Create a client for any OpenAI-compatible endpoint, such as Groq or OpenAI itself.
pub fn create_compatible_client(base_url: &str, api_key: &str) -> Client<OpenAIConfig> {
    let config = OpenAIConfig::new()
        .with_api_base(base_url)
        .with_api_key(api_key);
    with_timeout(config, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
}

fn with_timeout(config: OpenAIConfig, timeout: Duration) -> Client<OpenAIConfig> {
    let http_client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_default();

    Client::with_config(config).with_http_client(http_client)
}
