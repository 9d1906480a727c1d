//! `OpenAI`-compatible [`Inference`] adapter built on `async-openai`.
//!
//! Grounded on the teacher's habit of keeping one reference adapter per
//! external collaborator trait alongside the trait itself, and on
//! `dlmanning-tau`'s provider adapters for the shape of translating a
//! streaming SSE response into the crate's own token stream.

use crate::error::{Error, InferenceError, Result};
use crate::inference::{ChatMessage, CompletionRequest, Inference, Token, TokenStream};
use async_openai::Client;
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs, CreateEmbeddingRequestArgs, EmbeddingInput,
};
use async_trait::async_trait;
use tokio_stream::StreamExt;

/// Adapter delegating embedding and completion calls to an
/// `OpenAI`-compatible endpoint via `async-openai`.
pub struct OpenAiInference {
    client: Client<OpenAIConfig>,
}

impl OpenAiInference {
    /// Builds an adapter using the API key and (optional) base URL from the
    /// process environment, following `async-openai`'s own conventions
    /// (`OPENAI_API_KEY`, `OPENAI_API_BASE`).
    #[must_use]
    pub fn from_env() -> Self {
        Self { client: Client::new() }
    }

    /// Builds an adapter pointed at a custom base URL and API key, for
    /// self-hosted or gateway-fronted `OpenAI`-compatible endpoints.
    #[must_use]
    pub fn with_config(api_key: impl Into<String>, api_base: impl Into<String>) -> Self {
        let config = OpenAIConfig::new().with_api_key(api_key).with_api_base(api_base);
        Self { client: Client::with_config(config) }
    }

    fn to_request_messages(messages: &[ChatMessage]) -> Result<Vec<ChatCompletionRequestMessage>> {
        messages
            .iter()
            .map(|m| match m.role {
                "system" => ChatCompletionRequestSystemMessageArgs::default()
                    .content(m.content.clone())
                    .build()
                    .map(ChatCompletionRequestMessage::System)
                    .map_err(|e| Error::Inference(InferenceError::InvalidResponse(e.to_string()))),
                "assistant" => ChatCompletionRequestAssistantMessageArgs::default()
                    .content(m.content.clone())
                    .build()
                    .map(ChatCompletionRequestMessage::Assistant)
                    .map_err(|e| Error::Inference(InferenceError::InvalidResponse(e.to_string()))),
                _ => ChatCompletionRequestUserMessageArgs::default()
                    .content(m.content.clone())
                    .build()
                    .map(ChatCompletionRequestMessage::User)
                    .map_err(|e| Error::Inference(InferenceError::InvalidResponse(e.to_string()))),
            })
            .collect()
    }
}

#[async_trait]
impl Inference for OpenAiInference {
    async fn embed(&self, model: &str, text: &str) -> Result<Vec<f32>> {
        let request = CreateEmbeddingRequestArgs::default()
            .model(model)
            .input(EmbeddingInput::String(text.to_string()))
            .build()
            .map_err(|e| Error::Inference(InferenceError::InvalidResponse(e.to_string())))?;
        let response = self
            .client
            .embeddings()
            .create(request)
            .await
            .map_err(|e| Error::Inference(InferenceError::Request(e.to_string())))?;
        response
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| Error::Inference(InferenceError::InvalidResponse("empty embedding response".to_string())))
    }

    async fn embed_batch(&self, model: &str, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let request = CreateEmbeddingRequestArgs::default()
            .model(model)
            .input(EmbeddingInput::StringArray(texts.to_vec()))
            .build()
            .map_err(|e| Error::Inference(InferenceError::InvalidResponse(e.to_string())))?;
        let response = self
            .client
            .embeddings()
            .create(request)
            .await
            .map_err(|e| Error::Inference(InferenceError::Request(e.to_string())))?;
        Ok(response.data.into_iter().map(|d| d.embedding).collect())
    }

    async fn chat_completion_stream(&self, request: CompletionRequest) -> Result<TokenStream> {
        let messages = Self::to_request_messages(&request.messages)?;
        let openai_request = CreateChatCompletionRequestArgs::default()
            .model(request.model)
            .messages(messages)
            .temperature(request.temperature as f32)
            .max_tokens(request.max_tokens as u32)
            .stream(true)
            .build()
            .map_err(|e| Error::Inference(InferenceError::InvalidResponse(e.to_string())))?;

        let upstream = self
            .client
            .chat()
            .create_stream(openai_request)
            .await
            .map_err(|e| Error::Inference(InferenceError::Request(e.to_string())))?;

        let tokens = upstream.map(|chunk| {
            let chunk = chunk.map_err(|e| Error::Inference(InferenceError::Request(e.to_string())))?;
            let choice = chunk
                .choices
                .first()
                .ok_or_else(|| Error::Inference(InferenceError::InvalidResponse("no choices in stream chunk".to_string())))?;
            Ok(Token {
                text: choice.delta.content.clone().unwrap_or_default(),
                finish_reason: choice.finish_reason.map(|r| format!("{r:?}")),
            })
        });

        Ok(Box::pin(tokens))
    }

    async fn chat_completion_sync(&self, request: CompletionRequest) -> Result<String> {
        let messages = Self::to_request_messages(&request.messages)?;
        let openai_request = CreateChatCompletionRequestArgs::default()
            .model(request.model)
            .messages(messages)
            .temperature(request.temperature as f32)
            .max_tokens(request.max_tokens as u32)
            .build()
            .map_err(|e| Error::Inference(InferenceError::InvalidResponse(e.to_string())))?;

        let response = self
            .client
            .chat()
            .create(openai_request)
            .await
            .map_err(|e| Error::Inference(InferenceError::Request(e.to_string())))?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| Error::Inference(InferenceError::InvalidResponse("empty completion response".to_string())))
    }
}
