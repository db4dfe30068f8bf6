use clap::Parser;
use std::path::PathBuf;

const CONFIG_HELP: &str = "\
Configuration:
  --config PATH reads that file, which must exist. Otherwise the first of
  $XDG_CONFIG_HOME/jokebot/config.toml and ~/.config/jokebot/config.toml
  is used when present.

  OPENAI_API_KEY, OPENAI_MODEL and OPENAI_BASE_URL take precedence over the file.";

/// JokeBot: an AI comedian in your terminal
#[derive(Debug, Parser, Clone, PartialEq, Eq)]
#[command(name = "jokebot", version, after_long_help = CONFIG_HELP)]
pub struct CliArgs {
    /// Read configuration from PATH instead of the default location.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Print every API request and response to stderr, credentials masked.
    #[arg(long)]
    pub verbose: bool,
}
