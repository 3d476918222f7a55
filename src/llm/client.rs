use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ResolverError;
use crate::stages::{AttributionResolver, ResolverReply, ResolverRequest, TokenUsage};

use super::prompts::{SYSTEM_PROMPT, build_attribution_prompt};

const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

/// Configuration for the Anthropic API client
#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    /// API key (from ANTHROPIC_API_KEY env var)
    pub api_key: String,
    /// Model to use (ANTHROPIC_MODEL env var, or the default)
    pub model: String,
    /// Temperature (0-1, lower = more deterministic)
    pub temperature: f64,
    /// Nucleus sampling cutoff, sent only when set
    pub top_p: Option<f64>,
    /// Maximum tokens in response
    pub max_tokens: u32,
    /// USD per million input/output tokens, used only for the cost log line
    pub pricing: Option<TokenPricing>,
}

#[derive(Debug, Clone, Copy)]
pub struct TokenPricing {
    pub input_per_million: f64,
    pub output_per_million: f64,
}

impl AnthropicConfig {
    /// Create config from environment variables
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("ANTHROPIC_API_KEY")
            .context("ANTHROPIC_API_KEY environment variable not set")?;

        let model = std::env::var("ANTHROPIC_MODEL")
            .ok()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let pricing = match (
            std::env::var("ANTHROPIC_INPUT_COST_PER_MTOK"),
            std::env::var("ANTHROPIC_OUTPUT_COST_PER_MTOK"),
        ) {
            (Ok(input), Ok(output)) => Some(TokenPricing {
                input_per_million: input
                    .parse()
                    .context("ANTHROPIC_INPUT_COST_PER_MTOK is not a number")?,
                output_per_million: output
                    .parse()
                    .context("ANTHROPIC_OUTPUT_COST_PER_MTOK is not a number")?,
            }),
            _ => None,
        };

        Ok(Self {
            pricing,
            ..Self::new(api_key, model)
        })
    }

    /// Create with custom settings
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            api_key,
            model,
            temperature: 0.0,
            top_p: None,
            max_tokens: 4096,
            pricing: None,
        }
    }
}

/// Anthropic API client
pub struct AnthropicClient {
    client: Client,
    config: AnthropicConfig,
}

impl AnthropicClient {
    pub fn new(config: AnthropicConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    pub fn config(&self) -> &AnthropicConfig {
        &self.config
    }

    /// Send a message to Claude and return the text of the first content block
    pub async fn send_message(
        &self,
        system: &str,
        user: &str,
    ) -> Result<(String, TokenUsage), ResolverError> {
        let request = AnthropicRequest {
            model: self.config.model.clone(),
            max_tokens: self.config.max_tokens,
            temperature: Some(self.config.temperature),
            top_p: self.config.top_p,
            system: Some(system.to_string()),
            messages: vec![Message {
                role: "user".to_string(),
                content: user.to_string(),
            }],
        };

        debug!(
            "Sending {} prompt characters to {}",
            user.len(),
            self.config.model
        );

        let response = self
            .client
            .post("https://api.anthropic.com/v1/messages")
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| ResolverError::Request(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ResolverError::Api { status, body });
        }

        let response: AnthropicResponse = response.json().await.map_err(|e| ResolverError::Parse {
            message: format!("unreadable API envelope: {}", e),
        })?;

        let usage = TokenUsage {
            input_tokens: response.usage.input_tokens,
            output_tokens: response.usage.output_tokens,
        };

        let text = response
            .content
            .into_iter()
            .find(|c| c.content_type == "text")
            .map(|c| c.text)
            .filter(|t| !t.trim().is_empty())
            .ok_or(ResolverError::EmptyResponse)?;

        Ok((text, usage))
    }

    fn log_usage(&self, usage: &TokenUsage) {
        match self.config.pricing {
            Some(pricing) => info!(
                "Resolver used {} input + {} output tokens (${:.4})",
                usage.input_tokens,
                usage.output_tokens,
                usage.cost(pricing.input_per_million, pricing.output_per_million)
            ),
            None => info!(
                "Resolver used {} input + {} output tokens",
                usage.input_tokens, usage.output_tokens
            ),
        }
    }
}

#[async_trait]
impl AttributionResolver for AnthropicClient {
    fn name(&self) -> &str {
        &self.config.model
    }

    async fn resolve(&self, request: &ResolverRequest) -> Result<ResolverReply, ResolverError> {
        let prompt = build_attribution_prompt(request);
        let (raw_text, usage) = self.send_message(SYSTEM_PROMPT, &prompt).await?;
        self.log_usage(&usage);

        Ok(ResolverReply {
            raw_text,
            usage: Some(usage),
        })
    }
}

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
    #[serde(default)]
    usage: ApiUsage,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    content_type: String,
    #[serde(default)]
    text: String,
}

#[derive(Debug, Default, Deserialize)]
struct ApiUsage {
    #[serde(default)]
    input_tokens: u64,
    #[serde(default)]
    output_tokens: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_omits_unset_top_p() {
        let request = AnthropicRequest {
            model: "m".to_string(),
            max_tokens: 10,
            temperature: Some(0.0),
            top_p: None,
            system: None,
            messages: vec![],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("top_p").is_none());
        assert!(json.get("system").is_none());
        assert_eq!(json["temperature"], 0.0);
    }

    #[test]
    fn test_response_envelope() {
        let json = r#"{
            "content": [{"type": "text", "text": "{}"}],
            "usage": {"input_tokens": 1200, "output_tokens": 300}
        }"#;
        let response: AnthropicResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.content[0].text, "{}");
        assert_eq!(response.usage.input_tokens, 1200);
    }

    #[test]
    fn test_config_defaults() {
        let config = AnthropicConfig::new("key".to_string(), "model".to_string());
        assert_eq!(config.temperature, 0.0);
        assert_eq!(config.max_tokens, 4096);
        assert!(config.top_p.is_none());
    }
}
