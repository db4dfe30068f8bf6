use crate::cli::theme::Theme;
use crate::config::ThemeToken;
use crate::llm::provider::TokenUsage;
use ratatui::style::Style;
use ratatui::text::{Line, Span};

pub(crate) const WELCOME_TEXT: &str =
    "Welcome to JokeBot. Ask for a joke, /help lists commands, TAB opens the settings panel.";
const THINKING_TEXT: &str = "Thinking...";
const INDENT: &str = "     ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Notice {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Reply {
    Pending,
    Joke(String),
    Failed(String),
}

#[derive(Debug, Clone)]
enum Entry {
    You(String),
    Command(String),
    Notice(Notice, String),
    Bot {
        reply: Reply,
        usage: Option<TokenUsage>,
    },
}

/// What the chat area shows: everything typed, every reply and every
/// command result since the last `/clear`.
#[derive(Debug, Clone, Default)]
pub(crate) struct Timeline {
    entries: Vec<Entry>,
}

impl Timeline {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// One entry per line, so an empty `text` adds nothing.
    pub(crate) fn push_notice(&mut self, kind: Notice, text: &str) {
        self.entries
            .extend(text.lines().map(|line| Entry::Notice(kind, line.to_string())));
    }

    pub(crate) fn push_user(&mut self, text: &str) {
        self.entries.push(Entry::You(text.to_string()));
    }

    pub(crate) fn push_command(&mut self, text: &str) {
        self.entries.push(Entry::Command(text.to_string()));
    }

    /// Returns the handle [`Timeline::resolve_reply`] expects.
    pub(crate) fn push_pending_reply(&mut self) -> usize {
        self.entries.push(Entry::Bot {
            reply: Reply::Pending,
            usage: None,
        });
        self.entries.len() - 1
    }

    /// `false` if `index` does not point at a bot reply, e.g. after `/clear`.
    pub(crate) fn resolve_reply(
        &mut self,
        index: usize,
        outcome: Reply,
        turn_usage: Option<TokenUsage>,
    ) -> bool {
        match self.entries.get_mut(index) {
            Some(Entry::Bot { reply, usage }) => {
                *reply = outcome;
                *usage = turn_usage;
                true
            }
            _ => false,
        }
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    pub(crate) fn render_lines(&self, theme: &Theme) -> Vec<Line<'static>> {
        if self.entries.is_empty() {
            return vec![Line::styled(WELCOME_TEXT, theme.style(ThemeToken::SystemInfo))];
        }

        let mut out = Vec::new();
        for entry in &self.entries {
            render_entry(entry, theme, &mut out);
        }
        out
    }
}

fn render_entry(entry: &Entry, theme: &Theme, out: &mut Vec<Line<'static>>) {
    match entry {
        Entry::You(text) => block(
            out,
            prompt("you> ", theme, ThemeToken::UserPrompt),
            text,
            theme.style(ThemeToken::UserText),
        ),
        Entry::Command(text) => out.push(Line::from(vec![
            prompt("cmd> ", theme, ThemeToken::CommandPrompt),
            Span::styled(text.clone(), theme.style(ThemeToken::UserText)),
        ])),
        Entry::Notice(kind, text) => {
            let token = match kind {
                Notice::Info => ThemeToken::SystemInfo,
                Notice::Error => ThemeToken::SystemError,
            };
            out.push(Line::styled(text.clone(), theme.style(token)));
        }
        Entry::Bot { reply, usage } => {
            let bot = prompt("bot> ", theme, ThemeToken::AssistantPrompt);
            match reply {
                Reply::Pending => out.push(Line::from(vec![
                    bot,
                    Span::styled(THINKING_TEXT, theme.style(ThemeToken::AssistantWaiting)),
                ])),
                Reply::Joke(text) => {
                    block(out, bot, text, theme.style(ThemeToken::AssistantText));
                    if let Some(line) = usage_line(usage.as_ref()) {
                        out.push(Line::styled(line, theme.style(ThemeToken::SystemInfo)));
                    }
                }
                Reply::Failed(text) => {
                    block(out, bot, text, theme.style(ThemeToken::SystemError));
                }
            }
        }
    }
}

fn prompt(text: &'static str, theme: &Theme, token: ThemeToken) -> Span<'static> {
    Span::styled(text, theme.style(token))
}

// Later lines sit under the text of the first one, not under the prompt.
fn block(out: &mut Vec<Line<'static>>, head: Span<'static>, text: &str, style: Style) {
    let mut lines = text.lines();
    out.push(Line::from(vec![
        head,
        Span::styled(lines.next().unwrap_or_default().to_string(), style),
    ]));
    out.extend(
        lines.map(|line| Line::from(vec![Span::raw(INDENT), Span::styled(line.to_string(), style)])),
    );
}

fn usage_line(usage: Option<&TokenUsage>) -> Option<String> {
    let usage = usage.filter(|usage| !usage.is_zero())?;
    let total = match usage.total_tokens {
        0 => "?".to_string(),
        total => total.to_string(),
    };
    Some(format!("  Tokens (turn): {total}"))
}
