mod conversation;
mod prompt;
mod reply;
pub mod settings;

pub use conversation::{Conversation, Role, Turn, build_messages};
pub use prompt::build_system_prompt;
pub use reply::{
    APOLOGY_PREFIX, MAX_REPLY_TOKENS, Reply, TurnOutcome, apology_for, generate_reply, respond,
};
pub use settings::{JokeStyle, Settings};
