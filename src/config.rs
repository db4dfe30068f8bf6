//! Startup configuration. Sources, lowest precedence first: built-in
//! defaults, the TOML config file, `.env` in the working directory, and the
//! process environment.

use anyhow::{Context, Result, anyhow, bail};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::chat::settings::{
    JokeStyle, MAX_LINES_MAX, MAX_LINES_MIN, Settings, TEMPERATURE_MAX, TEMPERATURE_MIN,
};
use crate::llm::DEFAULT_OPENAI_BASE_URL;

const APP_DIR: &str = "jokebot";
const FILE_NAME: &str = "config.toml";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub config_path: PathBuf,
    /// Fallback key used whenever no key was entered in the UI.
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    /// Initial panel values; `model` already reflects `OPENAI_MODEL`.
    pub chat: Settings,
    pub theme: ThemeConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThemeConfig {
    pub preset: ThemePreset,
    pub styles: HashMap<ThemeToken, StyleOverride>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ThemePreset {
    #[default]
    Default,
    Light,
    HighContrast,
}

/// Every styled element of the UI, addressable from `[theme.styles.<name>]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThemeToken {
    Header,
    UserPrompt,
    AssistantPrompt,
    CommandPrompt,
    UserText,
    AssistantText,
    AssistantWaiting,
    SystemInfo,
    SystemError,
    PanelLabel,
    PanelValue,
    PanelSelected,
    Placeholder,
    Status,
    InputBlock,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeModifier {
    Bold,
    Dim,
    Italic,
    Underlined,
    Reversed,
    CrossedOut,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleOverride {
    pub fg: Option<HexColor>,
    pub bg: Option<HexColor>,
    /// Replaces the preset's modifiers entirely when set.
    pub modifiers: Option<Vec<ThemeModifier>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HexColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

const PRESET_NAMES: &[(&str, ThemePreset)] = &[
    ("default", ThemePreset::Default),
    ("light", ThemePreset::Light),
    ("high-contrast", ThemePreset::HighContrast),
];

const TOKEN_NAMES: &[(&str, ThemeToken)] = &[
    ("header", ThemeToken::Header),
    ("user_prompt", ThemeToken::UserPrompt),
    ("assistant_prompt", ThemeToken::AssistantPrompt),
    ("command_prompt", ThemeToken::CommandPrompt),
    ("user_text", ThemeToken::UserText),
    ("assistant_text", ThemeToken::AssistantText),
    ("assistant_waiting", ThemeToken::AssistantWaiting),
    ("system_info", ThemeToken::SystemInfo),
    ("system_error", ThemeToken::SystemError),
    ("panel_label", ThemeToken::PanelLabel),
    ("panel_value", ThemeToken::PanelValue),
    ("panel_selected", ThemeToken::PanelSelected),
    ("placeholder", ThemeToken::Placeholder),
    ("status", ThemeToken::Status),
    ("input_block", ThemeToken::InputBlock),
];

const MODIFIER_NAMES: &[(&str, ThemeModifier)] = &[
    ("bold", ThemeModifier::Bold),
    ("dim", ThemeModifier::Dim),
    ("italic", ThemeModifier::Italic),
    ("underlined", ThemeModifier::Underlined),
    ("reversed", ThemeModifier::Reversed),
    ("crossed_out", ThemeModifier::CrossedOut),
];

fn lookup<T: Copy>(table: &[(&str, T)], name: &str, what: &str) -> Result<T, String> {
    table
        .iter()
        .find(|(candidate, _)| *candidate == name)
        .map(|(_, value)| *value)
        .ok_or_else(|| format!("unknown {what} '{name}'"))
}

impl ThemeToken {
    pub fn all() -> impl Iterator<Item = ThemeToken> {
        TOKEN_NAMES.iter().map(|(_, token)| *token)
    }
}

impl FromStr for ThemePreset {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        lookup(PRESET_NAMES, value, "preset")
    }
}

impl FromStr for ThemeToken {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        lookup(TOKEN_NAMES, value, "token")
    }
}

impl FromStr for ThemeModifier {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        lookup(MODIFIER_NAMES, value, "modifier")
    }
}

impl FromStr for HexColor {
    type Err = String;

    /// Accepts `#RRGGBB` only.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let rgb = value
            .strip_prefix('#')
            .filter(|digits| digits.len() == 6 && digits.bytes().all(|b| b.is_ascii_hexdigit()))
            .and_then(|digits| u32::from_str_radix(digits, 16).ok())
            .ok_or_else(|| "invalid hex color, expected #RRGGBB".to_string())?;
        let [_, r, g, b] = rgb.to_be_bytes();
        Ok(Self { r, g, b })
    }
}

/// A rejected value, located by its dotted key path in the file.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Invalid {
    key: String,
    reason: String,
}

impl Invalid {
    fn new(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for Invalid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.key, self.reason)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    openai_api_key: Option<String>,
    openai_model: Option<String>,
    openai_base_url: Option<String>,
    #[serde(default)]
    chat: ChatSection,
    #[serde(default)]
    theme: ThemeSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ChatSection {
    style: Option<String>,
    clean_mode: Option<bool>,
    temperature: Option<f64>,
    max_lines: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ThemeSection {
    name: Option<String>,
    #[serde(default)]
    styles: BTreeMap<String, StyleSection>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct StyleSection {
    fg: Option<String>,
    bg: Option<String>,
    modifiers: Option<Vec<String>>,
}

impl AppConfig {
    /// Reads `explicit_path` (which must exist) or the discovered default
    /// path (which may be missing), then layers the environment on top.
    pub fn load_with_path(explicit_path: Option<&Path>) -> Result<Self> {
        let config_path = match explicit_path {
            Some(path) if path.is_file() => path.to_path_buf(),
            Some(path) => bail!("Failed to load config {}: file does not exist", path.display()),
            None => default_config_path()?,
        };

        let file = read_file_config(&config_path)?;
        dotenvy::dotenv().ok();

        let (mut settings, theme) = resolve_sections(&file).map_err(|invalid| {
            anyhow!("Failed to load config {}: {invalid}", config_path.display())
        })?;

        if let Some(model) = layered("OPENAI_MODEL", file.openai_model.as_deref()) {
            settings.model = model;
        }

        Ok(Self {
            openai_api_key: layered("OPENAI_API_KEY", file.openai_api_key.as_deref()),
            openai_base_url: layered("OPENAI_BASE_URL", file.openai_base_url.as_deref())
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            chat: settings,
            theme,
            config_path,
        })
    }
}

fn default_config_path() -> Result<PathBuf> {
    let base = match std::env::var("XDG_CONFIG_HOME") {
        Ok(xdg) if xdg.trim().is_empty() => {
            bail!("Failed to resolve config path: XDG_CONFIG_HOME is set but empty")
        }
        Ok(xdg) => PathBuf::from(xdg.trim()),
        Err(_) => dirs::home_dir()
            .map(|home| home.join(".config"))
            .ok_or_else(|| anyhow!("Failed to resolve config path: HOME directory is unavailable"))?,
    };
    Ok(base.join(APP_DIR).join(FILE_NAME))
}

/// A missing file is an empty config.
fn read_file_config(path: &Path) -> Result<FileConfig> {
    if !path.is_file() {
        return Ok(FileConfig::default());
    }

    let text = fs::read_to_string(path).with_context(|| {
        format!("Failed to load config {}: unable to read file", path.display())
    })?;
    toml::from_str(&text).map_err(|err| anyhow!("Failed to load config {}: {err}", path.display()))
}

fn resolve_sections(file: &FileConfig) -> Result<(Settings, ThemeConfig), Invalid> {
    Ok((file.chat.to_settings()?, file.theme.to_theme_config()?))
}

/// Non-blank environment value, else non-blank file value.
fn layered(env_key: &str, file_value: Option<&str>) -> Option<String> {
    let env_value = std::env::var(env_key).ok();
    [env_value.as_deref(), file_value]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|value| !value.is_empty())
        .map(ToOwned::to_owned)
}

impl ChatSection {
    fn to_settings(&self) -> Result<Settings, Invalid> {
        let mut settings = Settings::default();

        if let Some(style) = &self.style {
            settings.style =
                JokeStyle::from_str(style).map_err(|reason| Invalid::new("chat.style", reason))?;
        }
        if let Some(clean_mode) = self.clean_mode {
            settings.clean_mode = clean_mode;
        }
        if let Some(temperature) = self.temperature {
            let range = f64::from(TEMPERATURE_MIN)..=f64::from(TEMPERATURE_MAX);
            if !range.contains(&temperature) {
                return Err(Invalid::new(
                    "chat.temperature",
                    format!("must be between {TEMPERATURE_MIN:.1} and {TEMPERATURE_MAX:.1}"),
                ));
            }
            settings.set_temperature(temperature as f32);
        }
        if let Some(max_lines) = self.max_lines {
            let max_lines = u8::try_from(max_lines)
                .ok()
                .filter(|lines| (MAX_LINES_MIN..=MAX_LINES_MAX).contains(lines))
                .ok_or_else(|| {
                    Invalid::new(
                        "chat.max_lines",
                        format!("must be between {MAX_LINES_MIN} and {MAX_LINES_MAX}"),
                    )
                })?;
            settings.set_max_lines(max_lines);
        }

        Ok(settings)
    }
}

impl ThemeSection {
    fn to_theme_config(&self) -> Result<ThemeConfig, Invalid> {
        let preset = match &self.name {
            Some(name) => name
                .parse::<ThemePreset>()
                .map_err(|reason| Invalid::new("theme.name", reason))?,
            None => ThemePreset::default(),
        };

        let styles = self
            .styles
            .iter()
            .map(|(name, section)| {
                let key = format!("theme.styles.{name}");
                let token = name
                    .parse::<ThemeToken>()
                    .map_err(|reason| Invalid::new(key.clone(), reason))?;
                Ok((token, section.to_override(&key)?))
            })
            .collect::<Result<HashMap<_, _>, Invalid>>()?;

        Ok(ThemeConfig { preset, styles })
    }
}

impl StyleSection {
    fn to_override(&self, key: &str) -> Result<StyleOverride, Invalid> {
        let color = |value: &Option<String>, field: &str| {
            value
                .as_deref()
                .map(|value| {
                    value
                        .parse::<HexColor>()
                        .map_err(|reason| Invalid::new(format!("{key}.{field}"), reason))
                })
                .transpose()
        };
        let modifiers = self
            .modifiers
            .as_ref()
            .map(|names| {
                names
                    .iter()
                    .map(|name| {
                        name.parse::<ThemeModifier>()
                            .map_err(|reason| Invalid::new(format!("{key}.modifiers"), reason))
                    })
                    .collect::<Result<Vec<_>, _>>()
            })
            .transpose()?;

        Ok(StyleOverride {
            fg: color(&self.fg, "fg")?,
            bg: color(&self.bg, "bg")?,
            modifiers,
        })
    }
}
