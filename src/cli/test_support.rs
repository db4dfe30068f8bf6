use crate::chat::Settings;
use crate::cli::repl::{App, AppAction, AppDeps, Focus};
use crate::cli::theme::Theme;
use crate::cli::view::{self, Regions, layout_regions};
use crate::config::ThemeConfig;
use crate::http::client::HttpClient;
use crate::http::debug::HttpDebugConfig;
use crate::trace::SessionTrace;
use anyhow::Result;
use crossterm::event::{KeyEvent, MouseEvent};
use ratatui::Terminal;
use ratatui::backend::TestBackend;
use ratatui::layout::Rect;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq)]
pub struct UiStateView {
    pub input: String,
    pub cursor: usize,
    pub focus: Focus,
    pub selected_setting: &'static str,
    pub settings: Settings,
    pub conversation_len: usize,
    pub timeline_scroll: usize,
    pub waiting: bool,
    pub should_quit: bool,
    pub status: String,
}

/// Drives an `App` against ratatui's in-memory backend. Key presses that
/// submit a message render the in-flight turn, await the reply, then render
/// again, the same sequence the real event loop follows.
pub struct UiHarness {
    terminal: Terminal<TestBackend>,
    app: App,
}

impl UiHarness {
    pub fn new(width: u16, height: u16, app: App) -> Result<Self> {
        let terminal = Terminal::new(TestBackend::new(width, height))?;
        Ok(Self { terminal, app })
    }

    pub fn render(&mut self) -> Result<()> {
        let app = &mut self.app;
        self.terminal.draw(|frame| view::draw(frame, app))?;
        Ok(())
    }

    pub async fn send_key(&mut self, key: KeyEvent) -> Result<()> {
        let action = self.app.handle_key(key);
        self.render()?;
        if action == AppAction::AwaitReply {
            self.app.finish_turn().await;
            self.render()?;
        }
        Ok(())
    }

    /// Like `send_key`, but leaves a submitted turn in flight.
    pub fn send_key_without_reply(&mut self, key: KeyEvent) -> Result<()> {
        self.app.handle_key(key);
        self.render()
    }

    pub async fn finish_pending_turn(&mut self) -> Result<()> {
        self.app.finish_turn().await;
        self.render()
    }

    /// Resolves the in-flight turn the way Ctrl-C does while it is pending.
    pub async fn quit_while_waiting(&mut self) -> Result<()> {
        self.app.finish_turn_or_quit(std::future::ready(())).await;
        self.render()
    }

    pub fn send_mouse(&mut self, event: MouseEvent) -> Result<()> {
        self.app.handle_mouse(event);
        self.render()
    }

    pub fn buffer_lines(&self) -> Vec<String> {
        let buffer = self.terminal.backend().buffer();
        let area = buffer.area;
        (area.top()..area.bottom())
            .map(|y| {
                (area.left()..area.right())
                    .map(|x| buffer[(x, y)].symbol())
                    .collect::<String>()
            })
            .collect()
    }

    pub fn regions(&self) -> Result<Regions> {
        let size = self.terminal.size()?;
        Ok(layout_regions(Rect::new(0, 0, size.width, size.height)))
    }

    pub fn trace_path(&self) -> PathBuf {
        self.app.trace().file_path().to_path_buf()
    }

    pub fn ui_state_view(&self) -> UiStateView {
        UiStateView {
            input: self.app.input.text().to_string(),
            cursor: self.app.input.cursor(),
            focus: self.app.focus,
            selected_setting: self.app.panel.selected().label(),
            settings: self.app.settings.clone(),
            conversation_len: self.app.conversation.len(),
            timeline_scroll: self.app.timeline_scroll,
            waiting: self.app.is_waiting(),
            should_quit: self.app.should_quit,
            status: view::status_text(&self.app),
        }
    }
}

/// App wired to `base_url` with colors off and a trace file in `trace_dir`.
/// `fallback_api_key` plays the role of `OPENAI_API_KEY`.
pub fn deterministic_app(
    session_id: &str,
    base_url: &str,
    fallback_api_key: Option<&str>,
    trace_dir: &Path,
) -> Result<App> {
    let trace = SessionTrace::create_in_temp_dir(session_id, trace_dir)?;
    let http = HttpClient::new(reqwest::Client::new(), HttpDebugConfig::disabled())
        .with_trace(trace.clone());

    Ok(App::new(AppDeps {
        session_id: session_id.to_string(),
        settings: Settings::default(),
        fallback_api_key: fallback_api_key.map(ToOwned::to_owned),
        base_url: base_url.to_string(),
        config_path: trace_dir.join("config.toml"),
        http,
        trace,
        theme: Theme::from_config(false, &ThemeConfig::default()),
    }))
}
