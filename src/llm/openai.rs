use serde::{Deserialize, Serialize};

use super::provider::{
    ChatProvider, CompletionOutput, CompletionRequest, LlmError, LlmResult, TokenUsage,
};
use crate::chat::Turn;
use crate::http::client::HttpClient;

const ERROR_BODY_MAX_CHARS: usize = 400;

#[derive(Debug, Clone)]
pub struct OpenAiProvider {
    http: HttpClient,
    api_key: String,
    base_url: String,
}

impl OpenAiProvider {
    pub fn new(http: HttpClient, api_key: Option<String>, base_url: &str) -> LlmResult<Self> {
        let api_key = api_key
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or(LlmError::MissingApiKey)?;

        Ok(Self {
            http,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }

    fn extract_output(resp: ChatCompletionResponse) -> LlmResult<CompletionOutput> {
        let text = resp
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(LlmError::EmptyResponse)?;

        Ok(CompletionOutput {
            text,
            usage: resp.usage.map(|usage| TokenUsage {
                prompt_tokens: usage.prompt_tokens,
                completion_tokens: usage.completion_tokens,
                total_tokens: usage.total_tokens,
            }),
        })
    }
}

impl ChatProvider for OpenAiProvider {
    async fn complete(&self, request: CompletionRequest) -> LlmResult<CompletionOutput> {
        let payload = ChatCompletionRequest {
            model: &request.model,
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let resp = self
            .http
            .post_json(&self.endpoint(), &self.api_key, &payload)
            .await
            .map_err(|err| LlmError::Transport(err.to_string()))?;

        if !resp.is_success() {
            let body = resp.body.chars().take(ERROR_BODY_MAX_CHARS).collect();
            return Err(LlmError::HttpStatus {
                status: resp.status,
                body,
            });
        }

        let parsed = serde_json::from_str::<ChatCompletionResponse>(&resp.body)
            .map_err(|err| LlmError::Parse(err.to_string()))?;
        Self::extract_output(parsed)
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [Turn],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
    #[serde(default)]
    total_tokens: u32,
}
