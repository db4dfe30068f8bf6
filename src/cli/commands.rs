use crate::chat::settings::{
    JokeStyle, MAX_LINES_MAX, MAX_LINES_MIN, TEMPERATURE_MAX, TEMPERATURE_MIN,
};
use std::fmt::Write;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Command {
    Help,
    Clear,
    Settings,
    Trace,
    Quit,
    Model(Option<String>),
    Style(Option<JokeStyle>),
    Clean(Option<bool>),
    Temperature(Option<f32>),
    Lines(Option<u8>),
    Key(Option<String>),
}

/// Shown verbatim in the timeline as an error line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CommandError(String);

impl CommandError {
    pub(crate) fn message(&self) -> &str {
        &self.0
    }
}

struct CommandInfo {
    name: &'static str,
    args: &'static str,
    about: &'static str,
}

const COMMANDS: &[CommandInfo] = &[
    CommandInfo { name: "help", args: "", about: "Show this command list" },
    CommandInfo { name: "clear", args: "", about: "Clear the chat" },
    CommandInfo { name: "settings", args: "", about: "Show the current settings" },
    CommandInfo { name: "trace", args: "", about: "Show path to the current trace file" },
    CommandInfo { name: "model", args: "[name]", about: "Show or set the model" },
    CommandInfo { name: "style", args: "[name]", about: "Show or set the joke style" },
    CommandInfo { name: "clean", args: "[on|off]", about: "Show or set family-friendly mode" },
    CommandInfo { name: "temperature", args: "[0.0-1.5]", about: "Show or set creativity" },
    CommandInfo { name: "lines", args: "[1-20]", about: "Show or set max lines per reply" },
    CommandInfo {
        name: "key",
        args: "[value]",
        about: "Set the API key (no value: use env/config key)",
    },
    CommandInfo { name: "quit", args: "", about: "Exit JokeBot" },
];

const KEYS_HINT: &str = "Keys: TAB settings panel, Ctrl-L clear chat, PgUp/PgDn scroll, Ctrl-C quit";

impl CommandInfo {
    fn synopsis(&self) -> String {
        if self.args.is_empty() {
            format!("/{}", self.name)
        } else {
            format!("/{} {}", self.name, self.args)
        }
    }
}

pub(crate) fn help_text() -> String {
    let mut text = String::from("Available commands:\n");
    for info in COMMANDS {
        let _ = writeln!(text, "  {:<22} {}", info.synopsis(), info.about);
    }
    text.push_str(KEYS_HINT);
    text
}

fn usage(name: &str) -> CommandError {
    let synopsis = COMMANDS
        .iter()
        .find(|info| info.name == name)
        .map_or_else(|| format!("/{name}"), CommandInfo::synopsis);
    CommandError(format!("usage: {synopsis}"))
}

pub(crate) fn is_command_line(line: &str) -> bool {
    line.starts_with('/')
}

/// Char offset of the value in a `/key <value>` line, if one has been typed.
pub(crate) fn secret_start(line: &str) -> Option<usize> {
    let name_end = line.find(char::is_whitespace)?;
    if !line[..name_end].eq_ignore_ascii_case("/key") {
        return None;
    }
    let value_at = name_end + line[name_end..].find(|c: char| !c.is_whitespace())?;
    Some(line[..value_at].chars().count())
}

pub(crate) fn parse_command(line: &str) -> Result<Command, CommandError> {
    let Some(body) = line.trim().strip_prefix('/') else {
        return Err(CommandError("not a command".to_string()));
    };

    let (name, rest) = match body.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (body, ""),
    };
    if name.is_empty() {
        return Err(CommandError("empty command. Try /help".to_string()));
    }
    let name = name.to_ascii_lowercase();
    let arg = (!rest.is_empty()).then_some(rest);

    let bare = |command: Command, canonical: &str| match arg {
        None => Ok(command),
        Some(_) => Err(usage(canonical)),
    };

    match name.as_str() {
        "help" => bare(Command::Help, "help"),
        "clear" => bare(Command::Clear, "clear"),
        "settings" => bare(Command::Settings, "settings"),
        "trace" => bare(Command::Trace, "trace"),
        "quit" | "exit" => bare(Command::Quit, "quit"),
        "model" => Ok(Command::Model(arg.map(str::to_string))),
        "key" => Ok(Command::Key(arg.map(str::to_string))),
        "style" => arg.map(style_arg).transpose().map(Command::Style),
        "clean" => match arg {
            None => Ok(Command::Clean(None)),
            Some("on") => Ok(Command::Clean(Some(true))),
            Some("off") => Ok(Command::Clean(Some(false))),
            Some(_) => Err(usage("clean")),
        },
        "temperature" | "temp" => arg
            .map(|value| {
                value
                    .parse::<f32>()
                    .ok()
                    .filter(|t| (TEMPERATURE_MIN..=TEMPERATURE_MAX).contains(t))
                    .ok_or_else(|| usage("temperature"))
            })
            .transpose()
            .map(Command::Temperature),
        "lines" => arg
            .map(|value| {
                value
                    .parse::<u8>()
                    .ok()
                    .filter(|n| (MAX_LINES_MIN..=MAX_LINES_MAX).contains(n))
                    .ok_or_else(|| usage("lines"))
            })
            .transpose()
            .map(Command::Lines),
        _ => Err(CommandError(format!("unknown command '/{name}'. Try /help"))),
    }
}

fn style_arg(value: &str) -> Result<JokeStyle, CommandError> {
    value.parse::<JokeStyle>().map_err(|reason| {
        let choices = JokeStyle::ALL
            .iter()
            .map(|style| style.label())
            .collect::<Vec<_>>()
            .join(", ");
        CommandError(format!("{reason}. choose one of: {choices}"))
    })
}
