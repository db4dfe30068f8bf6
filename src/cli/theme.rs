use crate::config::{HexColor, StyleOverride, ThemeConfig, ThemeModifier, ThemePreset, ThemeToken};
use ratatui::style::{Color, Modifier, Style};
use std::collections::HashMap;

/// The handful of colors a preset is made of. Every token draws from one role.
struct Palette {
    accent: Color,
    user: Color,
    bot: Color,
    command: Color,
    text: Color,
    bot_text: Color,
    muted: Color,
    error: Color,
    label: Color,
    selection_fg: Color,
    selection_bg: Color,
    field_fg: Color,
    field_bg: Color,
}

const DEFAULT_PALETTE: Palette = Palette {
    accent: Color::Rgb(255, 199, 95),
    user: Color::Rgb(122, 162, 247),
    bot: Color::Rgb(255, 158, 100),
    command: Color::Rgb(187, 154, 247),
    text: Color::Rgb(192, 202, 245),
    bot_text: Color::Rgb(224, 175, 104),
    muted: Color::Rgb(86, 95, 137),
    error: Color::Rgb(247, 118, 142),
    label: Color::Rgb(138, 138, 138),
    selection_fg: Color::Rgb(22, 22, 30),
    selection_bg: Color::Rgb(255, 199, 95),
    field_fg: Color::White,
    field_bg: Color::Rgb(22, 22, 30),
};

const LIGHT_PALETTE: Palette = Palette {
    accent: Color::Rgb(176, 64, 0),
    user: Color::Rgb(31, 111, 235),
    bot: Color::Rgb(176, 64, 0),
    command: Color::Rgb(111, 66, 193),
    text: Color::Rgb(36, 41, 47),
    bot_text: Color::Rgb(130, 70, 0),
    muted: Color::Rgb(36, 70, 120),
    error: Color::Rgb(176, 0, 32),
    label: Color::Rgb(80, 90, 110),
    selection_fg: Color::Rgb(255, 255, 255),
    selection_bg: Color::Rgb(31, 111, 235),
    field_fg: Color::Rgb(36, 41, 47),
    field_bg: Color::Rgb(246, 248, 250),
};

const HIGH_CONTRAST_PALETTE: Palette = Palette {
    accent: Color::Rgb(255, 255, 0),
    user: Color::Rgb(0, 255, 127),
    bot: Color::Rgb(255, 215, 0),
    command: Color::Rgb(135, 206, 250),
    text: Color::Rgb(255, 255, 255),
    bot_text: Color::Rgb(255, 215, 0),
    muted: Color::Rgb(173, 216, 230),
    error: Color::Rgb(255, 64, 64),
    label: Color::Rgb(173, 216, 230),
    selection_fg: Color::Rgb(0, 0, 0),
    selection_bg: Color::Rgb(255, 255, 0),
    field_fg: Color::Rgb(255, 255, 255),
    field_bg: Color::Rgb(0, 0, 0),
};

impl Palette {
    fn for_preset(preset: ThemePreset) -> &'static Palette {
        match preset {
            ThemePreset::Default => &DEFAULT_PALETTE,
            ThemePreset::Light => &LIGHT_PALETTE,
            ThemePreset::HighContrast => &HIGH_CONTRAST_PALETTE,
        }
    }

    fn style(&self, token: ThemeToken) -> Style {
        let fg = |color| Style::default().fg(color);
        match token {
            ThemeToken::Header => fg(self.accent).add_modifier(Modifier::BOLD),
            ThemeToken::UserPrompt => fg(self.user).add_modifier(Modifier::BOLD),
            ThemeToken::AssistantPrompt => fg(self.bot).add_modifier(Modifier::BOLD),
            ThemeToken::CommandPrompt => fg(self.command).add_modifier(Modifier::BOLD),
            ThemeToken::UserText | ThemeToken::PanelValue => fg(self.text),
            ThemeToken::AssistantText => fg(self.bot_text),
            ThemeToken::AssistantWaiting => fg(self.bot_text).add_modifier(Modifier::ITALIC),
            ThemeToken::SystemInfo | ThemeToken::Status => fg(self.muted),
            ThemeToken::SystemError => fg(self.error).add_modifier(Modifier::BOLD),
            ThemeToken::PanelLabel => fg(self.label),
            ThemeToken::PanelSelected => fg(self.selection_fg)
                .bg(self.selection_bg)
                .add_modifier(Modifier::BOLD),
            ThemeToken::Placeholder => fg(self.muted).add_modifier(Modifier::ITALIC),
            ThemeToken::InputBlock => fg(self.field_fg).bg(self.field_bg),
        }
    }
}

/// Resolved styles for every token. With colors off, only emphasis survives.
#[derive(Debug, Clone)]
pub struct Theme {
    colored: bool,
    styles: HashMap<ThemeToken, Style>,
}

impl Theme {
    #[cfg(test)]
    pub fn new(colored: bool) -> Self {
        Self::from_config(colored, &ThemeConfig::default())
    }

    pub fn from_config(colored: bool, config: &ThemeConfig) -> Self {
        let palette = Palette::for_preset(config.preset);
        let styles = ThemeToken::all()
            .map(|token| {
                let base = palette.style(token);
                let style = match config.styles.get(&token) {
                    Some(custom) => apply_override(base, custom),
                    None => base,
                };
                (token, style)
            })
            .collect();

        Self { colored, styles }
    }

    /// Colors are on unless `NO_COLOR` is set to anything non-empty.
    pub fn from_env(config: &ThemeConfig) -> Self {
        let no_color = std::env::var_os("NO_COLOR").is_some_and(|value| !value.is_empty());
        Self::from_config(!no_color, config)
    }

    pub fn style(&self, token: ThemeToken) -> Style {
        if self.colored {
            self.styles.get(&token).copied().unwrap_or_default()
        } else {
            monochrome(token)
        }
    }
}

fn monochrome(token: ThemeToken) -> Style {
    match token {
        ThemeToken::Header
        | ThemeToken::UserPrompt
        | ThemeToken::AssistantPrompt
        | ThemeToken::CommandPrompt => Style::default().add_modifier(Modifier::BOLD),
        ThemeToken::PanelSelected => Style::default().add_modifier(Modifier::REVERSED),
        _ => Style::default(),
    }
}

fn apply_override(base: Style, custom: &StyleOverride) -> Style {
    let mut style = base;
    if let Some(color) = custom.fg {
        style = style.fg(rgb(color));
    }
    if let Some(color) = custom.bg {
        style = style.bg(rgb(color));
    }
    if let Some(modifiers) = &custom.modifiers {
        let replacement = modifiers
            .iter()
            .fold(Modifier::empty(), |acc, modifier| acc | to_modifier(*modifier));
        style = style
            .remove_modifier(Modifier::all())
            .add_modifier(replacement);
    }
    style
}

fn rgb(color: HexColor) -> Color {
    Color::Rgb(color.r, color.g, color.b)
}

fn to_modifier(modifier: ThemeModifier) -> Modifier {
    match modifier {
        ThemeModifier::Bold => Modifier::BOLD,
        ThemeModifier::Dim => Modifier::DIM,
        ThemeModifier::Italic => Modifier::ITALIC,
        ThemeModifier::Underlined => Modifier::UNDERLINED,
        ThemeModifier::Reversed => Modifier::REVERSED,
        ThemeModifier::CrossedOut => Modifier::CROSSED_OUT,
    }
}
