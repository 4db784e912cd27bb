use std::time::Duration;

use anyhow::Context as _;
use url::Url;

use crate::cli::EndpointArgs;

pub const API_KEY_ENV: &str = "DEEPSEEK_API_KEY";

pub const SYSTEM_PROMPT: &str = "你是一位专业的英语语法教学专家，擅长用中文清晰讲解英语语法概念。请严格按照用户要求的 JSON 格式输出。";

/// Synchronous text completion capability.
pub trait CompletionProvider {
    /// Sends one rendered prompt and returns the raw assistant text.
    fn complete(&self, prompt: &str) -> anyhow::Result<String>;
}

impl<T: CompletionProvider + ?Sized> CompletionProvider for &T {
    fn complete(&self, prompt: &str) -> anyhow::Result<String> {
        (**self).complete(prompt)
    }
}

#[derive(Debug, Clone)]
pub struct EndpointConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: String,
    pub system_prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl EndpointConfig {
    /// Builds the config from CLI args and the credential in the environment.
    pub fn from_args(args: &EndpointArgs) -> anyhow::Result<Self> {
        let api_key = std::env::var(API_KEY_ENV)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| anyhow::anyhow!("{API_KEY_ENV} is not set"))?;
        Self::new(args, api_key)
    }

    pub fn new(args: &EndpointArgs, api_key: String) -> anyhow::Result<Self> {
        let url = Url::parse(&args.base_url)
            .with_context(|| format!("parse --base-url: {}", args.base_url))?;
        if !matches!(url.scheme(), "http" | "https") {
            anyhow::bail!("--base-url must be http/https: {}", args.base_url);
        }
        if args.timeout_secs == 0 {
            anyhow::bail!("--timeout-secs must be > 0");
        }

        Ok(Self {
            base_url: args.base_url.clone(),
            model: args.model.clone(),
            api_key,
            system_prompt: SYSTEM_PROMPT.to_owned(),
            temperature: args.temperature,
            max_tokens: args.max_tokens,
            timeout: Duration::from_secs(args.timeout_secs),
        })
    }
}

pub fn chat_completions_endpoint(base_url: &str) -> String {
    let base_url = base_url.trim_end_matches('/');
    format!("{base_url}/chat/completions")
}

/// OpenAI-compatible chat completions client.
pub struct ChatClient {
    client: reqwest::blocking::Client,
    endpoint: String,
    config: EndpointConfig,
}

impl ChatClient {
    pub fn new(config: EndpointConfig) -> anyhow::Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()
            .context("build http client")?;
        Ok(Self {
            client,
            endpoint: chat_completions_endpoint(&config.base_url),
            config,
        })
    }
}

impl CompletionProvider for ChatClient {
    fn complete(&self, prompt: &str) -> anyhow::Result<String> {
        let body = serde_json::json!({
            "model": self.config.model,
            "messages": [
                { "role": "system", "content": self.config.system_prompt },
                { "role": "user", "content": prompt },
            ],
            "temperature": self.config.temperature,
            "max_tokens": self.config.max_tokens,
            "stream": false,
        });

        tracing::info!(
            endpoint = %self.endpoint,
            model = %self.config.model,
            prompt_chars = prompt.chars().count(),
            "chat completion request"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .with_context(|| format!("POST {}", self.endpoint))?;

        let status = response.status();
        let raw = response.text().context("read chat completion body")?;
        if !status.is_success() {
            let message = parse_error_message(&raw).unwrap_or_else(|| raw.clone());
            anyhow::bail!("chat completion API error ({status}): {message}");
        }

        let value: serde_json::Value =
            serde_json::from_str(&raw).context("parse chat completion response")?;
        extract_message_content(&value).context("extract message content")
    }
}

fn parse_error_message(raw_json: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(raw_json).ok()?;
    let message = value.get("error")?.get("message")?.as_str()?.to_owned();
    Some(message)
}

fn extract_message_content(value: &serde_json::Value) -> anyhow::Result<String> {
    let content = value
        .pointer("/choices/0/message/content")
        .and_then(|v| v.as_str())
        .ok_or_else(|| anyhow::anyhow!("missing `choices[0].message.content` in response"))?;
    if content.trim().is_empty() {
        anyhow::bail!("chat completion content is empty");
    }
    Ok(content.to_owned())
}
