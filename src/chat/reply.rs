use super::conversation::{Conversation, build_messages};
use super::prompt::build_system_prompt;
use super::settings::Settings;
use crate::llm::provider::{ChatProvider, CompletionRequest, LlmError, LlmResult, TokenUsage};

pub const MAX_REPLY_TOKENS: u32 = 500;
pub const APOLOGY_PREFIX: &str = "Sorry, I couldn't generate a joke right now. Error: ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub usage: Option<TokenUsage>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    pub text: String,
    pub usage: Option<TokenUsage>,
    pub failed: bool,
}

/// Sends the whole transcript, prefixed with a freshly built system prompt,
/// and returns the first choice trimmed.
pub async fn generate_reply<P: ChatProvider>(
    provider: &P,
    settings: &Settings,
    conversation: &Conversation,
) -> LlmResult<Reply> {
    let system_prompt =
        build_system_prompt(settings.style, settings.clean_mode, settings.max_lines);
    let output = provider
        .complete(CompletionRequest {
            model: settings.model.clone(),
            messages: build_messages(&system_prompt, conversation.turns()),
            temperature: settings.temperature,
            max_tokens: MAX_REPLY_TOKENS,
        })
        .await?;

    Ok(Reply {
        text: output.text.trim().to_string(),
        usage: output.usage,
    })
}

pub fn apology_for(err: &LlmError) -> String {
    format!("{APOLOGY_PREFIX}{err}")
}

/// Completes one chat turn. The caller has already appended the user turn;
/// the assistant turn (reply or apology) is appended here. `provider` is the
/// result of building the client so that a missing key surfaces as a reply.
pub async fn respond<P: ChatProvider>(
    provider: LlmResult<P>,
    settings: &Settings,
    conversation: &mut Conversation,
) -> TurnOutcome {
    let result = match provider {
        Ok(provider) => generate_reply(&provider, settings, conversation).await,
        Err(err) => Err(err),
    };

    let outcome = match result {
        Ok(reply) => TurnOutcome {
            text: reply.text,
            usage: reply.usage,
            failed: false,
        },
        Err(err) => TurnOutcome {
            text: apology_for(&err),
            usage: None,
            failed: true,
        },
    };

    conversation.push_assistant(outcome.text.clone());
    outcome
}
