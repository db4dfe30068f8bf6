use anyhow::Result;
use crossterm::event::KeyCode;
use jokebot::cli::Focus;
use serde_json::json;
use std::fs;

use crate::ui_rendering::common::{
    input_snapshot, mount_reply, new_fixture, press, received_bodies, settings_snapshot,
    status_snapshot, submit_line, timeline_snapshot, type_text,
};

async fn press_times(
    harness: &mut jokebot::cli::test_support::UiHarness,
    code: KeyCode,
    times: usize,
) -> Result<()> {
    for _ in 0..times {
        press(harness, code).await?;
    }
    Ok(())
}

#[tokio::test]
async fn sidebar_lists_settings_with_defaults_and_tip() -> Result<()> {
    let fx = new_fixture("panel-defaults", Some("env-key")).await?;

    let panel = settings_snapshot(&fx.harness)?;
    for row in [
        "Settings",
        "  Model: gpt-4",
        "  Joke style: one-liners",
        "  Family-friendly: on",
        "  Creativity: 0.9",
        "  Max lines: 6",
        "  API key: from env/config",
        "[ Clear chat ]",
        "Tip: Ask for theme-specific jokes",
    ] {
        assert!(panel.contains(row), "missing {row:?} in:\n{panel}");
    }
    assert!(!panel.contains("env-key"));

    Ok(())
}

#[tokio::test]
async fn tab_moves_focus_and_esc_returns_to_input() -> Result<()> {
    let mut fx = new_fixture("panel-focus", None).await?;

    press(&mut fx.harness, KeyCode::Tab).await?;
    assert_eq!(fx.harness.ui_state_view().focus, Focus::Settings);
    assert!(settings_snapshot(&fx.harness)?.contains("> Model: gpt-4"));
    assert!(status_snapshot(&fx.harness)?.contains("Left/Right adjust"));

    type_text(&mut fx.harness, "x").await?;
    assert_eq!(fx.harness.ui_state_view().input, "");

    press(&mut fx.harness, KeyCode::Esc).await?;
    assert_eq!(fx.harness.ui_state_view().focus, Focus::Input);
    assert!(!settings_snapshot(&fx.harness)?.contains("> Model"));

    press(&mut fx.harness, KeyCode::Tab).await?;
    press(&mut fx.harness, KeyCode::Tab).await?;
    assert_eq!(fx.harness.ui_state_view().focus, Focus::Input);

    Ok(())
}

#[tokio::test]
async fn panel_changes_shape_the_next_request() -> Result<()> {
    let mut fx = new_fixture("panel-request", Some("test-key")).await?;
    mount_reply(&fx.server, "Puns are how eye roll.", 30).await;

    press(&mut fx.harness, KeyCode::Tab).await?;
    press(&mut fx.harness, KeyCode::Right).await?;
    press(&mut fx.harness, KeyCode::Down).await?;
    press(&mut fx.harness, KeyCode::Right).await?;
    press(&mut fx.harness, KeyCode::Down).await?;
    press(&mut fx.harness, KeyCode::Enter).await?;
    press(&mut fx.harness, KeyCode::Down).await?;
    press_times(&mut fx.harness, KeyCode::Left, 2).await?;
    press(&mut fx.harness, KeyCode::Down).await?;
    press(&mut fx.harness, KeyCode::Right).await?;

    let panel = settings_snapshot(&fx.harness)?;
    assert!(panel.contains("Model: gpt-3.5-turbo"));
    assert!(panel.contains("Joke style: puns"));
    assert!(panel.contains("Family-friendly: off"));
    assert!(panel.contains("Creativity: 0.7"));
    assert!(panel.contains("> Max lines: 7"));

    press(&mut fx.harness, KeyCode::Tab).await?;
    submit_line(&mut fx.harness, "go").await?;

    let bodies = received_bodies(&fx.server).await;
    assert_eq!(bodies.len(), 1);
    assert_eq!(bodies[0]["model"], "gpt-3.5-turbo");
    assert_eq!(bodies[0]["temperature"], json!(0.7));
    let prompt = bodies[0]["messages"][0]["content"]
        .as_str()
        .expect("system prompt");
    assert!(prompt.contains("specializing in puns jokes"));
    assert!(prompt.contains("about 7 lines"));
    assert!(prompt.ends_with("Stay witty but avoid hateful, sexual, or excessively crude content."));

    Ok(())
}

#[tokio::test]
async fn sliders_stop_at_their_bounds() -> Result<()> {
    let mut fx = new_fixture("panel-bounds", None).await?;

    press(&mut fx.harness, KeyCode::Tab).await?;
    press_times(&mut fx.harness, KeyCode::Down, 3).await?;
    press_times(&mut fx.harness, KeyCode::Right, 10).await?;
    press(&mut fx.harness, KeyCode::Down).await?;
    press_times(&mut fx.harness, KeyCode::Left, 10).await?;

    let settings = fx.harness.ui_state_view().settings;
    assert_eq!(format!("{:.1}", settings.temperature), "1.5");
    assert_eq!(settings.max_lines, 1);

    Ok(())
}

#[tokio::test]
async fn clear_chat_button_empties_transcript() -> Result<()> {
    let mut fx = new_fixture("panel-clear", Some("test-key")).await?;
    mount_reply(&fx.server, "Ha.", 3).await;

    submit_line(&mut fx.harness, "one joke").await?;
    assert_eq!(fx.harness.ui_state_view().conversation_len, 2);

    press(&mut fx.harness, KeyCode::Tab).await?;
    press_times(&mut fx.harness, KeyCode::Down, 6).await?;
    assert_eq!(fx.harness.ui_state_view().selected_setting, "[ Clear chat ]");
    press(&mut fx.harness, KeyCode::Enter).await?;

    let view = fx.harness.ui_state_view();
    assert_eq!(view.conversation_len, 0);
    assert_eq!(view.settings.model, "gpt-4", "settings survive a clear");
    assert!(timeline_snapshot(&fx.harness)?.contains("Welcome to JokeBot."));

    Ok(())
}

#[tokio::test]
async fn api_key_row_prefills_key_command_and_masks_value() -> Result<()> {
    let mut fx = new_fixture("panel-key", None).await?;

    press(&mut fx.harness, KeyCode::Tab).await?;
    press_times(&mut fx.harness, KeyCode::Down, 5).await?;
    assert_eq!(fx.harness.ui_state_view().selected_setting, "API key");
    press(&mut fx.harness, KeyCode::Enter).await?;

    let view = fx.harness.ui_state_view();
    assert_eq!(view.focus, Focus::Input);
    assert_eq!(view.input, "/key ");

    type_text(&mut fx.harness, "sk-panel-key-9999").await?;
    press(&mut fx.harness, KeyCode::Enter).await?;

    assert!(settings_snapshot(&fx.harness)?.contains("API key: ****9999 (entered)"));
    let timeline = timeline_snapshot(&fx.harness)?;
    assert!(timeline.contains("cmd> /key ****9999"));
    assert!(!timeline.contains("sk-panel-key-9999"));
    let trace = fs::read_to_string(fx.harness.trace_path())?;
    assert!(!trace.contains("sk-panel-key-9999"));
    assert_eq!(
        fx.harness.ui_state_view().settings.api_key.as_deref(),
        Some("sk-panel-key-9999")
    );

    Ok(())
}

#[tokio::test]
async fn typed_key_is_starred_in_input_box_and_left_out_of_history() -> Result<()> {
    let mut fx = new_fixture("panel-key-input", None).await?;
    submit_line(&mut fx.harness, "/style puns").await?;

    type_text(&mut fx.harness, "/key sk-supersecret-9876").await?;
    let input = input_snapshot(&fx.harness)?;
    assert!(input.contains("/key *******************"), "{input}");
    assert!(!input.contains("supersecret"));

    press(&mut fx.harness, KeyCode::Enter).await?;
    assert!(timeline_snapshot(&fx.harness)?.contains("cmd> /key ****9876"));

    press(&mut fx.harness, KeyCode::Up).await?;
    assert_eq!(fx.harness.ui_state_view().input, "/style puns");
    let input = input_snapshot(&fx.harness)?;
    assert!(input.contains("/style puns"));
    assert!(!input.contains("supersecret"));

    press(&mut fx.harness, KeyCode::Up).await?;
    assert_eq!(fx.harness.ui_state_view().input, "/style puns");

    Ok(())
}
