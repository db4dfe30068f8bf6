pub mod openai;
pub mod provider;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";
