use super::settings::JokeStyle;

const CLEAN_SENTENCE: &str = "Keep content clean, friendly, and suitable for all ages.";
const WITTY_SENTENCE: &str = "Stay witty but avoid hateful, sexual, or excessively crude content.";

pub fn build_system_prompt(style: JokeStyle, clean_mode: bool, max_lines: u8) -> String {
    let cleanliness = if clean_mode {
        CLEAN_SENTENCE
    } else {
        WITTY_SENTENCE
    };

    format!(
        "You are JokeBot, an AI stand-up comedian specializing in {style} jokes. \
         - Be original and concise. \
         - Deliver clear setups and punchlines. \
         - Prefer one-liners unless the user requests otherwise. \
         - If asked for multiple jokes, return a numbered list. \
         - Keep responses to about {max_lines} lines unless the user clearly asks for more. \
         {cleanliness}"
    )
}
