use crate::cli::commands::secret_start;
use crate::cli::repl::{App, Focus};
use crate::cli::settings_panel::PANEL_TITLE;
use crate::config::ThemeToken;
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Position, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Wrap};

pub(crate) const APP_TITLE: &str = "JokeBot";
pub(crate) const APP_CAPTION: &str = "An AI comedian that delivers clean, original jokes on demand.";
pub(crate) const INPUT_PLACEHOLDER: &str =
    "Ask for a joke or a theme (e.g., 'Tell me 3 coding puns')";
const SETTINGS_WIDTH: u16 = 36;
const INPUT_TITLE: &str = " Message ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Regions {
    pub header: Rect,
    pub timeline: Rect,
    pub settings: Rect,
    pub input: Rect,
    pub status: Rect,
}

pub fn layout_regions(area: Rect) -> Regions {
    let [header, body, input, status] = Layout::vertical([
        Constraint::Length(2),
        Constraint::Min(3),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(area);
    let [timeline, settings] =
        Layout::horizontal([Constraint::Min(20), Constraint::Length(SETTINGS_WIDTH)]).areas(body);

    Regions {
        header,
        timeline,
        settings,
        input,
        status,
    }
}

pub(crate) fn draw(frame: &mut Frame<'_>, app: &mut App) {
    let regions = layout_regions(frame.area());
    app.regions = Some(regions);

    draw_header(frame, app, regions.header);
    draw_timeline(frame, app, regions.timeline);
    draw_settings(frame, app, regions.settings);
    draw_input(frame, app, regions.input);
    draw_status(frame, app, regions.status);
}

fn draw_header(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let lines = vec![
        Line::from(Span::styled(APP_TITLE, app.theme.style(ThemeToken::Header))),
        Line::from(Span::styled(
            APP_CAPTION,
            app.theme.style(ThemeToken::SystemInfo),
        )),
    ];
    frame.render_widget(Paragraph::new(lines), area);
}

/// Bottom-anchored: `timeline_scroll` counts rows hidden below the view.
fn draw_timeline(frame: &mut Frame<'_>, app: &mut App, area: Rect) {
    let rows = wrap_lines(
        app.timeline.render_lines(&app.theme),
        usize::from(area.width),
    );
    let height = usize::from(area.height);
    app.timeline_max_scroll = rows.len().saturating_sub(height);
    app.timeline_scroll = app.timeline_scroll.min(app.timeline_max_scroll);
    app.timeline_page = height.saturating_sub(1).max(1);

    let end = rows.len() - app.timeline_scroll;
    let start = end.saturating_sub(height);
    frame.render_widget(Paragraph::new(rows[start..end].to_vec()), area);
}

fn draw_settings(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let focused = app.focus == Focus::Settings;
    let border_style = if focused {
        app.theme.style(ThemeToken::PanelSelected)
    } else {
        app.theme.style(ThemeToken::PanelLabel)
    };
    let block = Block::bordered()
        .title(Span::styled(format!(" {PANEL_TITLE} "), border_style))
        .border_style(app.theme.style(ThemeToken::PanelLabel));
    let lines =
        app.panel
            .render_lines(&app.settings, app.has_fallback_key(), focused, &app.theme);
    frame.render_widget(
        Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: false }),
        area,
    );
}

/// Stars out a typed `/key` value one char per char, so cursor math is unchanged.
fn shown_input(text: &str) -> String {
    match secret_start(text) {
        Some(start) => text
            .chars()
            .enumerate()
            .map(|(index, ch)| if index >= start { '*' } else { ch })
            .collect(),
        None => text.to_string(),
    }
}

fn draw_input(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let block = Block::bordered()
        .title(INPUT_TITLE)
        .style(app.theme.style(ThemeToken::InputBlock));
    let inner = block.inner(area);
    let width = usize::from(inner.width);

    let line = if app.input.is_empty() {
        Line::from(Span::styled(
            INPUT_PLACEHOLDER,
            app.theme.style(ThemeToken::Placeholder),
        ))
    } else {
        let start = visible_start(app.input.cursor(), width);
        let visible = shown_input(app.input.text())
            .chars()
            .skip(start)
            .take(width)
            .collect::<String>();
        Line::from(Span::styled(visible, app.theme.style(ThemeToken::UserText)))
    };
    frame.render_widget(Paragraph::new(line).block(block), area);

    if app.focus == Focus::Input && width > 0 {
        let offset = app.input.cursor() - visible_start(app.input.cursor(), width);
        let offset = u16::try_from(offset).unwrap_or(inner.width.saturating_sub(1));
        frame.set_cursor_position(Position::new(inner.x + offset, inner.y));
    }
}

fn draw_status(frame: &mut Frame<'_>, app: &App, area: Rect) {
    frame.render_widget(
        Paragraph::new(Span::styled(
            status_text(app),
            app.theme.style(ThemeToken::Status),
        )),
        area,
    );
}

pub(crate) fn status_text(app: &App) -> String {
    let mut text = if app.is_waiting() {
        "Generating a joke...  Ctrl-C quit".to_string()
    } else {
        match app.focus {
            Focus::Settings => {
                "Settings: Up/Down select  Left/Right adjust  Enter toggle  Esc back".to_string()
            }
            Focus::Input => {
                "TAB settings  /help commands  PgUp/PgDn scroll  Ctrl-C quit".to_string()
            }
        }
    };
    if app.timeline_scroll > 0 {
        text.push_str(&format!("  [scrolled {}]", app.timeline_scroll));
    }
    text
}

/// First visible char so that the cursor stays inside a `width`-wide box.
fn visible_start(cursor: usize, width: usize) -> usize {
    if width == 0 {
        return cursor;
    }
    cursor.saturating_sub(width - 1)
}

/// Hard-wraps styled lines at `width` columns, one column per char.
fn wrap_lines(lines: Vec<Line<'static>>, width: usize) -> Vec<Line<'static>> {
    if width == 0 {
        return lines;
    }

    let mut rows = Vec::new();
    for line in lines {
        let mut current: Vec<Span<'static>> = Vec::new();
        let mut used = 0;
        for span in line.spans {
            let style = span.style;
            let mut chunk = String::new();
            for ch in span.content.chars() {
                if used == width {
                    if !chunk.is_empty() {
                        current.push(Span::styled(std::mem::take(&mut chunk), style));
                    }
                    rows.push(Line::from(std::mem::take(&mut current)));
                    used = 0;
                }
                chunk.push(ch);
                used += 1;
            }
            if !chunk.is_empty() {
                current.push(Span::styled(chunk, style));
            }
        }
        rows.push(Line::from(current));
    }
    rows
}
