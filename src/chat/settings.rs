use std::fmt::{Display, Formatter};
use std::str::FromStr;

pub const MODEL_OPTIONS: [&str; 2] = ["gpt-4", "gpt-3.5-turbo"];
pub const DEFAULT_MODEL: &str = MODEL_OPTIONS[0];

pub const TEMPERATURE_MIN: f32 = 0.0;
pub const TEMPERATURE_MAX: f32 = 1.5;
pub const DEFAULT_TEMPERATURE: f32 = 0.9;

pub const MAX_LINES_MIN: u8 = 1;
pub const MAX_LINES_MAX: u8 = 20;
pub const DEFAULT_MAX_LINES: u8 = 6;

const TEMPERATURE_STEPS_MAX: i16 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum JokeStyle {
    #[default]
    OneLiners,
    Puns,
    DadJokes,
    Riddles,
    Observational,
    Absurdist,
}

impl JokeStyle {
    pub const ALL: [JokeStyle; 6] = [
        Self::OneLiners,
        Self::Puns,
        Self::DadJokes,
        Self::Riddles,
        Self::Observational,
        Self::Absurdist,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::OneLiners => "one-liners",
            Self::Puns => "puns",
            Self::DadJokes => "dad jokes",
            Self::Riddles => "riddles",
            Self::Observational => "observational",
            Self::Absurdist => "absurdist",
        }
    }

    pub fn next(self) -> Self {
        let idx = self.position();
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    pub fn previous(self) -> Self {
        let idx = self.position();
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    fn position(self) -> usize {
        Self::ALL
            .iter()
            .position(|style| *style == self)
            .unwrap_or(0)
    }
}

impl Display for JokeStyle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for JokeStyle {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value
            .trim()
            .to_ascii_lowercase()
            .replace(['-', '_'], " ");
        match normalized.as_str() {
            "one liners" | "oneliners" => Ok(Self::OneLiners),
            "puns" => Ok(Self::Puns),
            "dad jokes" => Ok(Self::DadJokes),
            "riddles" => Ok(Self::Riddles),
            "observational" => Ok(Self::Observational),
            "absurdist" => Ok(Self::Absurdist),
            _ => Err(format!("unknown joke style '{}'", value.trim())),
        }
    }
}

/// Options picked in the settings panel. Rebuilt from config at startup and
/// edited in place for the rest of the session; never written back.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub model: String,
    pub style: JokeStyle,
    pub clean_mode: bool,
    pub temperature: f32,
    pub max_lines: u8,
    pub api_key: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            style: JokeStyle::default(),
            clean_mode: true,
            temperature: DEFAULT_TEMPERATURE,
            max_lines: DEFAULT_MAX_LINES,
            api_key: None,
        }
    }
}

impl Settings {
    pub fn cycle_model(&mut self, forward: bool) {
        let len = MODEL_OPTIONS.len();
        let next = match MODEL_OPTIONS.iter().position(|m| *m == self.model) {
            Some(idx) if forward => (idx + 1) % len,
            Some(idx) => (idx + len - 1) % len,
            None => 0,
        };
        self.model = MODEL_OPTIONS[next].to_string();
    }

    pub fn cycle_style(&mut self, forward: bool) {
        self.style = if forward {
            self.style.next()
        } else {
            self.style.previous()
        };
    }

    pub fn toggle_clean_mode(&mut self) {
        self.clean_mode = !self.clean_mode;
    }

    /// Moves the temperature slider by `steps` tenths, clamped to its range.
    pub fn step_temperature(&mut self, steps: i16) {
        let current = temperature_steps(self.temperature);
        let next = (current + steps).clamp(0, TEMPERATURE_STEPS_MAX);
        self.temperature = f32::from(next) / 10.0;
    }

    pub fn set_temperature(&mut self, value: f32) {
        let steps = temperature_steps(value).clamp(0, TEMPERATURE_STEPS_MAX);
        self.temperature = f32::from(steps) / 10.0;
    }

    pub fn step_max_lines(&mut self, steps: i16) {
        let next = (i16::from(self.max_lines) + steps)
            .clamp(i16::from(MAX_LINES_MIN), i16::from(MAX_LINES_MAX));
        self.max_lines = u8::try_from(next).unwrap_or(DEFAULT_MAX_LINES);
    }

    pub fn set_max_lines(&mut self, value: u8) {
        self.max_lines = value.clamp(MAX_LINES_MIN, MAX_LINES_MAX);
    }

    pub fn set_api_key(&mut self, key: Option<String>) {
        self.api_key = key.filter(|value| !value.trim().is_empty());
    }

    /// UI-entered key first, otherwise the environment/config fallback.
    pub fn effective_api_key(&self, fallback: Option<&str>) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| fallback.map(ToOwned::to_owned))
    }
}

fn temperature_steps(value: f32) -> i16 {
    if !value.is_finite() {
        return 0;
    }
    (value.clamp(TEMPERATURE_MIN, TEMPERATURE_MAX) * 10.0).round() as i16
}
