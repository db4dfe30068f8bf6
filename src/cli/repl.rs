use crate::chat::{self, Conversation, JokeStyle, Settings};
use crate::cli::commands::{Command, help_text, is_command_line, parse_command};
use crate::cli::input::InputBuffer;
use crate::cli::settings_panel::{PanelAction, SettingsPanel, api_key_summary, mask_key, on_off};
use crate::cli::theme::Theme;
use crate::cli::timeline::{Notice, Reply, Timeline};
use crate::cli::view::{self, Regions};
use crate::http::client::HttpClient;
use crate::llm::openai::OpenAiProvider;
use crate::trace::SessionTrace;
use anyhow::Result;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers, MouseEvent, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::{Backend, CrosstermBackend};
use std::io;
use std::path::PathBuf;
use std::time::Duration;

const EVENT_POLL_INTERVAL: Duration = Duration::from_millis(250);
const QUIT_POLL_INTERVAL: Duration = Duration::from_millis(50);
const MOUSE_SCROLL_LINES: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Input,
    Settings,
}

/// Follow-up the event loop owes after a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AppAction {
    None,
    AwaitReply,
    Quit,
}

pub struct AppDeps {
    pub session_id: String,
    pub settings: Settings,
    pub fallback_api_key: Option<String>,
    pub base_url: String,
    pub config_path: PathBuf,
    pub http: HttpClient,
    pub trace: SessionTrace,
    pub theme: Theme,
}

pub struct App {
    pub(crate) session_id: String,
    pub(crate) settings: Settings,
    pub(crate) conversation: Conversation,
    pub(crate) timeline: Timeline,
    pub(crate) input: InputBuffer,
    pub(crate) panel: SettingsPanel,
    pub(crate) focus: Focus,
    pub(crate) theme: Theme,
    pub(crate) timeline_scroll: usize,
    pub(crate) timeline_max_scroll: usize,
    pub(crate) timeline_page: usize,
    pub(crate) regions: Option<Regions>,
    pub(crate) pending_turn: Option<usize>,
    pub(crate) should_quit: bool,
    fallback_api_key: Option<String>,
    base_url: String,
    config_path: PathBuf,
    http: HttpClient,
    trace: SessionTrace,
}

impl App {
    pub fn new(deps: AppDeps) -> Self {
        Self {
            session_id: deps.session_id,
            settings: deps.settings,
            conversation: Conversation::new(),
            timeline: Timeline::new(),
            input: InputBuffer::new(),
            panel: SettingsPanel::new(),
            focus: Focus::Input,
            theme: deps.theme,
            timeline_scroll: 0,
            timeline_max_scroll: 0,
            timeline_page: 1,
            regions: None,
            pending_turn: None,
            should_quit: false,
            fallback_api_key: deps.fallback_api_key,
            base_url: deps.base_url,
            config_path: deps.config_path,
            http: deps.http,
            trace: deps.trace,
        }
    }

    #[cfg(any(test, feature = "test-support"))]
    pub(crate) fn trace(&self) -> &SessionTrace {
        &self.trace
    }

    pub(crate) fn has_fallback_key(&self) -> bool {
        self.fallback_api_key.is_some()
    }

    pub(crate) fn is_waiting(&self) -> bool {
        self.pending_turn.is_some()
    }

    pub(crate) fn handle_key(&mut self, key: KeyEvent) -> AppAction {
        if key.kind != KeyEventKind::Press {
            return AppAction::None;
        }

        if is_quit_chord(&key) {
            self.should_quit = true;
            return AppAction::Quit;
        }

        if matches!(key.code, KeyCode::Tab | KeyCode::BackTab) {
            self.focus = match self.focus {
                Focus::Input => Focus::Settings,
                Focus::Settings => Focus::Input,
            };
            return AppAction::None;
        }

        match self.focus {
            Focus::Settings => {
                self.handle_settings_key(key);
                AppAction::None
            }
            Focus::Input => self.handle_input_key(key),
        }
    }

    fn handle_settings_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Up => self.panel.select_previous(),
            KeyCode::Down => self.panel.select_next(),
            KeyCode::Left => self.panel.adjust(&mut self.settings, false),
            KeyCode::Right => self.panel.adjust(&mut self.settings, true),
            KeyCode::Enter | KeyCode::Char(' ') => {
                match self.panel.activate(&mut self.settings) {
                    PanelAction::None => {}
                    PanelAction::ClearChat => self.clear_chat(),
                    PanelAction::EditApiKey => {
                        self.focus = Focus::Input;
                        self.input.set_text("/key ");
                    }
                }
            }
            KeyCode::Esc => self.focus = Focus::Input,
            _ => {}
        }
    }

    fn handle_input_key(&mut self, key: KeyEvent) -> AppAction {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('l') => self.clear_chat(),
                KeyCode::Char('d') if self.input.is_empty() => {
                    self.should_quit = true;
                    return AppAction::Quit;
                }
                _ => {}
            }
            return AppAction::None;
        }

        match key.code {
            KeyCode::Enter => {
                let line = self.input.submit();
                return self.submit_line(&line);
            }
            KeyCode::Char(ch) => self.input.insert_char(ch),
            KeyCode::Backspace => self.input.backspace(),
            KeyCode::Delete => self.input.delete(),
            KeyCode::Left => self.input.move_left(),
            KeyCode::Right => self.input.move_right(),
            KeyCode::Home => self.input.move_home(),
            KeyCode::End => self.input.move_end(),
            KeyCode::Up => self.input.history_previous(),
            KeyCode::Down => self.input.history_next(),
            KeyCode::PageUp => self.scroll_timeline_up(self.timeline_page),
            KeyCode::PageDown => self.scroll_timeline_down(self.timeline_page),
            _ => {}
        }
        AppAction::None
    }

    pub(crate) fn handle_mouse(&mut self, mouse: MouseEvent) {
        let Some(regions) = self.regions else {
            return;
        };
        let inside_timeline = mouse.column >= regions.timeline.x
            && mouse.column < regions.timeline.x.saturating_add(regions.timeline.width)
            && mouse.row >= regions.timeline.y
            && mouse.row < regions.timeline.y.saturating_add(regions.timeline.height);
        if !inside_timeline {
            return;
        }

        match mouse.kind {
            MouseEventKind::ScrollUp => self.scroll_timeline_up(MOUSE_SCROLL_LINES),
            MouseEventKind::ScrollDown => self.scroll_timeline_down(MOUSE_SCROLL_LINES),
            _ => {}
        }
    }

    fn scroll_timeline_up(&mut self, lines: usize) {
        self.timeline_scroll = self
            .timeline_scroll
            .saturating_add(lines)
            .min(self.timeline_max_scroll);
    }

    fn scroll_timeline_down(&mut self, lines: usize) {
        self.timeline_scroll = self.timeline_scroll.saturating_sub(lines);
    }

    fn submit_line(&mut self, line: &str) -> AppAction {
        if line.trim().is_empty() {
            return AppAction::None;
        }

        self.timeline_scroll = 0;
        if is_command_line(line) {
            let shown = display_command(line);
            self.trace.log_command(&shown);
            self.timeline.push_command(&shown);
            return self.run_command(line);
        }

        if self.is_waiting() {
            self.push_system(Notice::Error, "still waiting for the last joke");
            return AppAction::None;
        }

        self.trace.log_user_input(line);
        self.conversation.push_user(line);
        self.timeline.push_user(line);
        self.pending_turn = Some(self.timeline.push_pending_reply());
        AppAction::AwaitReply
    }

    /// Resolves the in-flight turn. The provider is rebuilt per turn so panel
    /// changes to the key take effect immediately.
    pub(crate) async fn finish_turn(&mut self) {
        let Some(index) = self.pending_turn.take() else {
            return;
        };

        let api_key = self
            .settings
            .effective_api_key(self.fallback_api_key.as_deref());
        let provider = OpenAiProvider::new(self.http.clone(), api_key, &self.base_url);
        let outcome = chat::respond(provider, &self.settings, &mut self.conversation).await;

        let reply = if outcome.failed {
            self.trace.log_reply_error(&outcome.text);
            Reply::Failed(outcome.text)
        } else {
            self.trace.log_reply(&outcome.text);
            Reply::Joke(outcome.text)
        };
        self.timeline.resolve_reply(index, reply, outcome.usage);
    }

    /// Like `finish_turn`, but abandons the request and quits if `quit`
    /// resolves first.
    pub(crate) async fn finish_turn_or_quit(&mut self, quit: impl Future<Output = ()>) {
        let quit_requested = tokio::select! {
            () = self.finish_turn() => false,
            () = quit => true,
        };
        if quit_requested {
            self.trace.log_system("quit while waiting for a reply");
            self.should_quit = true;
        }
    }

    fn run_command(&mut self, line: &str) -> AppAction {
        let command = match parse_command(line) {
            Ok(command) => command,
            Err(err) => {
                self.push_system(Notice::Error, err.message());
                return AppAction::None;
            }
        };

        match command {
            Command::Help => self.push_system(Notice::Info, &help_text()),
            Command::Clear => self.clear_chat(),
            Command::Settings => {
                let text = self.settings_summary();
                self.push_system(Notice::Info, &text);
            }
            Command::Trace => {
                let text = format!("trace: {}", self.trace.file_path().display());
                self.push_system(Notice::Info, &text);
            }
            Command::Quit => {
                self.should_quit = true;
                return AppAction::Quit;
            }
            Command::Model(None) => {
                let text = format!("model: {}", self.settings.model);
                self.push_system(Notice::Info, &text);
            }
            Command::Model(Some(model)) => {
                self.settings.model = model;
                let text = format!("model set to {}", self.settings.model);
                self.push_system(Notice::Info, &text);
            }
            Command::Style(None) => {
                let choices = JokeStyle::ALL
                    .iter()
                    .map(|style| style.label())
                    .collect::<Vec<_>>()
                    .join(", ");
                let text = format!("style: {} (choices: {choices})", self.settings.style);
                self.push_system(Notice::Info, &text);
            }
            Command::Style(Some(style)) => {
                self.settings.style = style;
                self.push_system(Notice::Info, &format!("style set to {style}"));
            }
            Command::Clean(None) => {
                let text = format!("clean: {}", on_off(self.settings.clean_mode));
                self.push_system(Notice::Info, &text);
            }
            Command::Clean(Some(value)) => {
                self.settings.clean_mode = value;
                self.push_system(
                    Notice::Info,
                    &format!("clean set to {}", on_off(value)),
                );
            }
            Command::Temperature(None) => {
                let text = format!("temperature: {:.1}", self.settings.temperature);
                self.push_system(Notice::Info, &text);
            }
            Command::Temperature(Some(value)) => {
                self.settings.set_temperature(value);
                let text = format!("temperature set to {:.1}", self.settings.temperature);
                self.push_system(Notice::Info, &text);
            }
            Command::Lines(None) => {
                let text = format!("max lines: {}", self.settings.max_lines);
                self.push_system(Notice::Info, &text);
            }
            Command::Lines(Some(value)) => {
                self.settings.set_max_lines(value);
                let text = format!("max lines set to {}", self.settings.max_lines);
                self.push_system(Notice::Info, &text);
            }
            Command::Key(value) => {
                self.settings.set_api_key(value);
                let text = match (&self.settings.api_key, self.has_fallback_key()) {
                    (Some(key), _) => format!("api key set: {}", mask_key(key)),
                    (None, true) => "api key cleared; using key from env/config".to_string(),
                    (None, false) => "api key cleared; no fallback key configured".to_string(),
                };
                self.push_system(Notice::Info, &text);
            }
        }

        AppAction::None
    }

    fn settings_summary(&self) -> String {
        [
            format!("model: {}", self.settings.model),
            format!("style: {}", self.settings.style),
            format!("clean: {}", on_off(self.settings.clean_mode)),
            format!("temperature: {:.1}", self.settings.temperature),
            format!("max lines: {}", self.settings.max_lines),
            format!(
                "api key: {}",
                api_key_summary(self.settings.api_key.as_deref(), self.has_fallback_key())
            ),
            format!("config: {}", self.config_path.display()),
            format!("session: {}", self.session_id),
        ]
        .join("\n")
    }

    /// Drops the transcript on screen and the history sent to the model.
    /// Settings are kept.
    pub(crate) fn clear_chat(&mut self) {
        self.conversation.clear();
        self.timeline.clear();
        self.timeline_scroll = 0;
        self.trace.log_system("chat cleared");
    }

    fn push_system(&mut self, kind: Notice, text: &str) {
        self.trace.log_system(text);
        self.timeline.push_notice(kind, text);
    }
}

/// `/key <value>` is shown and traced with the value masked.
fn display_command(line: &str) -> String {
    let trimmed = line.trim();
    let mut parts = trimmed.splitn(2, char::is_whitespace);
    let name = parts.next().unwrap_or("");
    let rest = parts.next().map(str::trim).unwrap_or("");
    if name.eq_ignore_ascii_case("/key") && !rest.is_empty() {
        format!("{name} {}", mask_key(rest))
    } else {
        trimmed.to_string()
    }
}

pub async fn run_tui(app: &mut App) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    restore_terminal_on_panic();
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    let result = event_loop(&mut terminal, app).await;

    restore_terminal()?;
    terminal.show_cursor()?;
    result
}

fn restore_terminal() -> io::Result<()> {
    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture)
}

fn restore_terminal_on_panic() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = restore_terminal();
        previous(info);
    }));
}

fn is_quit_chord(key: &KeyEvent) -> bool {
    key.kind == KeyEventKind::Press
        && key.modifiers.contains(KeyModifiers::CONTROL)
        && key.code == KeyCode::Char('c')
}

/// Resolves on Ctrl-C. Other events read meanwhile are dropped, so nothing
/// typed while a reply is pending reaches the input box.
async fn ctrl_c_pressed() {
    loop {
        let pressed = tokio::task::spawn_blocking(|| -> io::Result<bool> {
            if !event::poll(QUIT_POLL_INTERVAL)? {
                return Ok(false);
            }
            Ok(matches!(event::read()?, Event::Key(key) if is_quit_chord(&key)))
        })
        .await;
        match pressed {
            Ok(Ok(true)) => return,
            Ok(Ok(false)) => {}
            // Terminal input is gone; let the request finish on its own.
            Ok(Err(_)) | Err(_) => std::future::pending::<()>().await,
        }
    }
}

async fn event_loop<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| view::draw(frame, app))?;

        if !event::poll(EVENT_POLL_INTERVAL)? {
            continue;
        }

        match event::read()? {
            Event::Key(key) => {
                if app.handle_key(key) == AppAction::AwaitReply {
                    terminal.draw(|frame| view::draw(frame, app))?;
                    app.finish_turn_or_quit(ctrl_c_pressed()).await;
                }
            }
            Event::Mouse(mouse) => app.handle_mouse(mouse),
            _ => {}
        }
    }

    Ok(())
}
