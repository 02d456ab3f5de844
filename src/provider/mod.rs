// src/provider/mod.rs — Text-completion utility for drafting candidates
//
// Stateless request/response. The generation loop never calls into this
// module; only the `draft` command does.

pub mod openai;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::infra::config::LlmConfig;
use crate::infra::errors::ForgeError;

/// Core trait that chat providers implement.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    fn id(&self) -> &str;
    fn name(&self) -> &str;

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, ForgeError>;
}

#[derive(Debug, Clone, Default)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub system: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ChatResponse {
    pub content: String,
    pub usage: TokenUsage,
    pub stop_reason: StopReason,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl TokenUsage {
    pub fn total(&self) -> u32 {
        self.input_tokens + self.output_tokens
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub enum StopReason {
    EndTurn,
    MaxTokens,
    #[default]
    Unknown,
}

/// Build the configured provider from the environment.
pub fn provider_from_env(llm: &LlmConfig) -> Result<Arc<dyn ModelProvider>, ForgeError> {
    let api_key = std::env::var("OPENAI_API_KEY")
        .ok()
        .filter(|k| !k.trim().is_empty())
        .ok_or(ForgeError::NoProvider)?;
    let provider = match &llm.base_url {
        Some(url) => openai::OpenAIProvider::with_base_url(api_key, url.clone()),
        None => openai::OpenAIProvider::new(api_key),
    };
    Ok(Arc::new(provider))
}

/// One system + user exchange; returns the trimmed reply text.
pub async fn llm_call(
    provider: &dyn ModelProvider,
    llm: &LlmConfig,
    system_prompt: &str,
    user_prompt: &str,
) -> Result<String, ForgeError> {
    let request = ChatRequest {
        model: llm.model.clone(),
        messages: vec![Message::user(user_prompt)],
        max_tokens: None,
        temperature: llm.temperature,
        system: Some(system_prompt.to_string()),
    };
    let response = provider.chat(request).await?;
    tracing::debug!(
        provider = provider.id(),
        tokens = response.usage.total(),
        "LLM call complete"
    );
    Ok(response.content.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoProvider;

    #[async_trait]
    impl ModelProvider for EchoProvider {
        fn id(&self) -> &str {
            "echo"
        }

        fn name(&self) -> &str {
            "Echo"
        }

        async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, ForgeError> {
            let last = request.messages.last().map(|m| m.content.clone()).unwrap_or_default();
            Ok(ChatResponse {
                content: format!("  {} | {}  \n", request.system.unwrap_or_default(), last),
                usage: TokenUsage {
                    input_tokens: 3,
                    output_tokens: 2,
                },
                stop_reason: StopReason::EndTurn,
            })
        }
    }

    #[tokio::test]
    async fn test_llm_call_trims_and_passes_prompts() {
        let out = llm_call(&EchoProvider, &LlmConfig::default(), "sys", "hello")
            .await
            .unwrap();
        assert_eq!(out, "sys | hello");
    }

    #[test]
    fn test_message_constructors() {
        assert_eq!(Message::system("s").role, Role::System);
        assert_eq!(Message::user("u").role, Role::User);
        assert_eq!(Message::assistant("a").role, Role::Assistant);
    }

    #[test]
    fn test_token_usage_total() {
        let u = TokenUsage {
            input_tokens: 100,
            output_tokens: 50,
        };
        assert_eq!(u.total(), 150);
    }

    #[test]
    fn test_stop_reason_default() {
        assert_eq!(StopReason::default(), StopReason::Unknown);
    }
}
