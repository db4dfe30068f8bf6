use crate::chat::Settings;
use crate::cli::theme::Theme;
use crate::config::ThemeToken;
use ratatui::text::{Line, Span};

pub(crate) const PANEL_TITLE: &str = "Settings";
pub(crate) const CLEAR_CHAT_LABEL: &str = "[ Clear chat ]";
pub(crate) const TIP_TEXT: &str = "Tip: Ask for theme-specific jokes (e.g., cats, coding, space).";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SettingField {
    Model,
    Style,
    CleanMode,
    Temperature,
    MaxLines,
    ApiKey,
    ClearChat,
}

impl SettingField {
    pub(crate) const ALL: [SettingField; 7] = [
        Self::Model,
        Self::Style,
        Self::CleanMode,
        Self::Temperature,
        Self::MaxLines,
        Self::ApiKey,
        Self::ClearChat,
    ];

    pub(crate) fn label(self) -> &'static str {
        match self {
            Self::Model => "Model",
            Self::Style => "Joke style",
            Self::CleanMode => "Family-friendly",
            Self::Temperature => "Creativity",
            Self::MaxLines => "Max lines",
            Self::ApiKey => "API key",
            Self::ClearChat => CLEAR_CHAT_LABEL,
        }
    }
}

/// What the app must do after a panel key press beyond editing `Settings`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PanelAction {
    None,
    ClearChat,
    EditApiKey,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct SettingsPanel {
    selected: usize,
}

impl SettingsPanel {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn selected(&self) -> SettingField {
        SettingField::ALL[self.selected]
    }

    pub(crate) fn select_previous(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub(crate) fn select_next(&mut self) {
        self.selected = (self.selected + 1).min(SettingField::ALL.len() - 1);
    }

    /// Left/Right on the selected row.
    pub(crate) fn adjust(&self, settings: &mut Settings, forward: bool) {
        let step = if forward { 1 } else { -1 };
        match self.selected() {
            SettingField::Model => settings.cycle_model(forward),
            SettingField::Style => settings.cycle_style(forward),
            SettingField::CleanMode => settings.toggle_clean_mode(),
            SettingField::Temperature => settings.step_temperature(step),
            SettingField::MaxLines => settings.step_max_lines(step),
            SettingField::ApiKey | SettingField::ClearChat => {}
        }
    }

    /// Enter/Space on the selected row.
    pub(crate) fn activate(&self, settings: &mut Settings) -> PanelAction {
        match self.selected() {
            SettingField::CleanMode => {
                settings.toggle_clean_mode();
                PanelAction::None
            }
            SettingField::Model | SettingField::Style => {
                self.adjust(settings, true);
                PanelAction::None
            }
            SettingField::Temperature | SettingField::MaxLines => PanelAction::None,
            SettingField::ApiKey => PanelAction::EditApiKey,
            SettingField::ClearChat => PanelAction::ClearChat,
        }
    }

    pub(crate) fn render_lines(
        &self,
        settings: &Settings,
        has_fallback_key: bool,
        focused: bool,
        theme: &Theme,
    ) -> Vec<Line<'static>> {
        let mut lines = Vec::new();
        for (index, field) in SettingField::ALL.iter().copied().enumerate() {
            let highlighted = focused && index == self.selected;
            if field == SettingField::ClearChat {
                lines.push(Line::from(""));
                lines.push(Line::from(Span::styled(
                    CLEAR_CHAT_LABEL,
                    if highlighted {
                        theme.style(ThemeToken::PanelSelected)
                    } else {
                        theme.style(ThemeToken::PanelValue)
                    },
                )));
                continue;
            }

            let marker = if highlighted { "> " } else { "  " };
            let value_style = if highlighted {
                theme.style(ThemeToken::PanelSelected)
            } else {
                theme.style(ThemeToken::PanelValue)
            };
            lines.push(Line::from(vec![
                Span::styled(
                    format!("{marker}{}: ", field.label()),
                    theme.style(ThemeToken::PanelLabel),
                ),
                Span::styled(value_text(field, settings, has_fallback_key), value_style),
            ]));
        }

        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            TIP_TEXT,
            theme.style(ThemeToken::SystemInfo),
        )));
        lines
    }
}

pub(crate) fn value_text(field: SettingField, settings: &Settings, has_fallback_key: bool) -> String {
    match field {
        SettingField::Model => settings.model.clone(),
        SettingField::Style => settings.style.label().to_string(),
        SettingField::CleanMode => on_off(settings.clean_mode).to_string(),
        SettingField::Temperature => format!("{:.1}", settings.temperature),
        SettingField::MaxLines => settings.max_lines.to_string(),
        SettingField::ApiKey => api_key_summary(settings.api_key.as_deref(), has_fallback_key),
        SettingField::ClearChat => String::new(),
    }
}

pub(crate) fn on_off(value: bool) -> &'static str {
    if value { "on" } else { "off" }
}

/// Never shows more than the last four characters of an entered key.
pub(crate) fn api_key_summary(entered: Option<&str>, has_fallback_key: bool) -> String {
    match entered {
        Some(key) => format!("{} (entered)", mask_key(key)),
        None if has_fallback_key => "from env/config".to_string(),
        None => "not set".to_string(),
    }
}

pub(crate) fn mask_key(key: &str) -> String {
    let chars = key.chars().collect::<Vec<_>>();
    if chars.len() <= 8 {
        return "****".to_string();
    }
    let tail = chars[chars.len() - 4..].iter().collect::<String>();
    format!("****{tail}")
}
