use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use serde_json::json;
use std::fs;
use std::time::{Duration, Instant};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::ui_rendering::common::{
    COMPLETIONS_PATH, completion_body, header_snapshot, input_snapshot, mount_reply, new_fixture,
    press, press_ctrl, received_bodies, status_snapshot, submit_line, timeline_snapshot, type_text,
};

#[tokio::test]
async fn first_frame_shows_header_welcome_and_placeholder() -> Result<()> {
    let fx = new_fixture("flow-first-frame", None).await?;

    let header = header_snapshot(&fx.harness)?;
    assert!(header.starts_with("JokeBot"));
    assert!(header.contains("An AI comedian that delivers clean, original jokes on demand."));

    assert!(timeline_snapshot(&fx.harness)?.contains("Welcome to JokeBot."));
    assert!(
        input_snapshot(&fx.harness)?
            .contains("Ask for a joke or a theme (e.g., 'Tell me 3 coding puns')")
    );
    assert!(status_snapshot(&fx.harness)?.contains("Ctrl-C quit"));

    Ok(())
}

#[tokio::test]
async fn typing_replaces_placeholder() -> Result<()> {
    let mut fx = new_fixture("flow-typing", None).await?;

    type_text(&mut fx.harness, "cats").await?;

    let input = input_snapshot(&fx.harness)?;
    assert!(input.contains("cats"));
    assert!(!input.contains("Ask for a joke"));
    assert_eq!(fx.harness.ui_state_view().cursor, 4);

    Ok(())
}

#[tokio::test]
async fn submitted_message_gets_reply_with_token_total() -> Result<()> {
    let mut fx = new_fixture("flow-reply", Some("test-key")).await?;
    Mock::given(method("POST"))
        .and(path(COMPLETIONS_PATH))
        .and(header("authorization", "Bearer test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body(
            "  Why did the cat sit on the computer?\nTo keep an eye on the mouse.  ",
            42,
        )))
        .expect(1)
        .mount(&fx.server)
        .await;

    submit_line(&mut fx.harness, "tell me a cat joke").await?;

    let timeline = timeline_snapshot(&fx.harness)?;
    assert!(timeline.contains("you> tell me a cat joke"));
    assert!(timeline.contains("bot> Why did the cat sit on the computer?"));
    assert!(timeline.contains("\n     To keep an eye on the mouse."));
    assert!(timeline.contains("  Tokens (turn): 42"));
    assert!(!timeline.contains("Thinking..."));

    let view = fx.harness.ui_state_view();
    assert_eq!(view.conversation_len, 2);
    assert_eq!(view.input, "");
    assert!(!view.waiting);

    let bodies = received_bodies(&fx.server).await;
    assert_eq!(bodies.len(), 1);
    let body = &bodies[0];
    assert_eq!(body["model"], "gpt-4");
    assert_eq!(body["max_tokens"], 500);
    assert_eq!(body["temperature"], json!(0.9));
    assert_eq!(body["messages"][0]["role"], "system");
    assert!(
        body["messages"][0]["content"]
            .as_str()
            .expect("system prompt")
            .contains("specializing in one-liners jokes")
    );
    assert_eq!(
        body["messages"][1],
        json!({"role": "user", "content": "tell me a cat joke"})
    );

    Ok(())
}

#[tokio::test]
async fn inflight_turn_renders_thinking_until_reply_arrives() -> Result<()> {
    let mut fx = new_fixture("flow-inflight", Some("test-key")).await?;
    mount_reply(&fx.server, "I'm reading a book on anti-gravity.", 20).await;

    type_text(&mut fx.harness, "pun please").await?;
    fx.harness
        .send_key_without_reply(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE))?;

    let timeline = timeline_snapshot(&fx.harness)?;
    assert!(timeline.contains("you> pun please"));
    assert!(timeline.contains("bot> Thinking..."));
    assert!(status_snapshot(&fx.harness)?.contains("Generating a joke...  Ctrl-C quit"));
    assert!(fx.harness.ui_state_view().waiting);

    fx.harness.finish_pending_turn().await?;

    let timeline = timeline_snapshot(&fx.harness)?;
    assert!(!timeline.contains("Thinking..."));
    assert!(timeline.contains("bot> I'm reading a book on anti-gravity."));
    assert!(!fx.harness.ui_state_view().waiting);

    Ok(())
}

#[tokio::test]
async fn missing_key_becomes_apology_and_history_keeps_it() -> Result<()> {
    let mut fx = new_fixture("flow-missing-key", None).await?;
    Mock::given(method("POST"))
        .and(path(COMPLETIONS_PATH))
        .and(header("authorization", "Bearer sk-entered-1234"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("Better now?", 9)))
        .expect(1)
        .mount(&fx.server)
        .await;

    submit_line(&mut fx.harness, "joke please").await?;

    let timeline = timeline_snapshot(&fx.harness)?;
    assert!(timeline.contains("bot> Sorry, I couldn't generate a joke right now."));
    assert_eq!(fx.harness.ui_state_view().conversation_len, 2);
    let trace = fs::read_to_string(fx.harness.trace_path())?;
    assert!(trace.contains(
        "[bot.err    ] Sorry, I couldn't generate a joke right now. Error: missing OPENAI_API_KEY"
    ));

    submit_line(&mut fx.harness, "/key sk-entered-1234").await?;
    submit_line(&mut fx.harness, "try again").await?;

    assert!(timeline_snapshot(&fx.harness)?.contains("bot> Better now?"));
    let bodies = received_bodies(&fx.server).await;
    assert_eq!(bodies.len(), 1);
    let messages = bodies[0]["messages"].as_array().expect("messages");
    assert_eq!(messages.len(), 4);
    assert_eq!(messages[1]["content"], "joke please");
    assert_eq!(messages[2]["role"], "assistant");
    assert!(
        messages[2]["content"]
            .as_str()
            .expect("apology")
            .starts_with("Sorry, I couldn't generate a joke right now. Error: ")
    );
    assert_eq!(messages[3]["content"], "try again");

    Ok(())
}

#[tokio::test]
async fn provider_error_is_shown_and_next_turn_recovers() -> Result<()> {
    let mut fx = new_fixture("flow-recover", Some("test-key")).await?;
    Mock::given(method("POST"))
        .and(path(COMPLETIONS_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .up_to_n_times(1)
        .mount(&fx.server)
        .await;
    mount_reply(&fx.server, "Second time lucky.", 11).await;

    submit_line(&mut fx.harness, "first").await?;
    let timeline = timeline_snapshot(&fx.harness)?;
    assert!(timeline.contains("bot> Sorry, I couldn't generate a joke right now."));
    assert!(!timeline.contains("Tokens (turn)"));
    let trace = fs::read_to_string(fx.harness.trace_path())?;
    assert!(trace.contains("status 500: upstream exploded"));

    submit_line(&mut fx.harness, "second").await?;
    let timeline = timeline_snapshot(&fx.harness)?;
    assert!(timeline.contains("bot> Second time lucky."));
    assert!(timeline.contains("  Tokens (turn): 11"));
    assert_eq!(fx.harness.ui_state_view().conversation_len, 4);

    Ok(())
}

#[tokio::test]
async fn blank_input_is_ignored() -> Result<()> {
    let mut fx = new_fixture("flow-blank", Some("test-key")).await?;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("x", 1)))
        .expect(0)
        .mount(&fx.server)
        .await;

    submit_line(&mut fx.harness, "   ").await?;
    press(&mut fx.harness, KeyCode::Enter).await?;

    assert_eq!(fx.harness.ui_state_view().conversation_len, 0);
    assert!(timeline_snapshot(&fx.harness)?.contains("Welcome to JokeBot."));

    Ok(())
}

#[tokio::test]
async fn ctrl_l_clears_transcript_and_history() -> Result<()> {
    let mut fx = new_fixture("flow-ctrl-l", Some("test-key")).await?;
    mount_reply(&fx.server, "Knock knock.", 5).await;

    submit_line(&mut fx.harness, "old joke").await?;
    press_ctrl(&mut fx.harness, 'l').await?;

    assert_eq!(fx.harness.ui_state_view().conversation_len, 0);
    let timeline = timeline_snapshot(&fx.harness)?;
    assert!(timeline.contains("Welcome to JokeBot."));
    assert!(!timeline.contains("old joke"));

    submit_line(&mut fx.harness, "new joke").await?;
    let bodies = received_bodies(&fx.server).await;
    let last = bodies.last().expect("second request");
    let messages = last["messages"].as_array().expect("messages");
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1]["content"], "new joke");

    Ok(())
}

#[tokio::test]
async fn up_down_walks_submitted_history() -> Result<()> {
    let mut fx = new_fixture("flow-history", None).await?;

    submit_line(&mut fx.harness, "/help").await?;
    submit_line(&mut fx.harness, "/style puns").await?;
    type_text(&mut fx.harness, "dra").await?;

    press(&mut fx.harness, KeyCode::Up).await?;
    assert_eq!(fx.harness.ui_state_view().input, "/style puns");
    press(&mut fx.harness, KeyCode::Up).await?;
    assert_eq!(fx.harness.ui_state_view().input, "/help");
    press(&mut fx.harness, KeyCode::Down).await?;
    assert_eq!(fx.harness.ui_state_view().input, "/style puns");
    press(&mut fx.harness, KeyCode::Down).await?;
    assert_eq!(fx.harness.ui_state_view().input, "dra");

    Ok(())
}

#[tokio::test]
async fn ctrl_c_requests_quit() -> Result<()> {
    let mut fx = new_fixture("flow-ctrl-c", None).await?;

    press_ctrl(&mut fx.harness, 'c').await?;

    assert!(fx.harness.ui_state_view().should_quit);
    Ok(())
}

#[tokio::test]
async fn header_and_transcript_snapshots() -> Result<()> {
    let mut fx = new_fixture("flow-snapshot", Some("test-key")).await?;
    insta::assert_snapshot!(header_snapshot(&fx.harness)?, @r"
    JokeBot
    An AI comedian that delivers clean, original jokes on demand.
    ");

    mount_reply(&fx.server, "I told my cat a joke.\nIt was purr-fect.", 42).await;
    submit_line(&mut fx.harness, "cat joke").await?;

    insta::assert_snapshot!(timeline_snapshot(&fx.harness)?.trim_end(), @r"
    you> cat joke
    bot> I told my cat a joke.
         It was purr-fect.
      Tokens (turn): 42
    ");

    Ok(())
}

#[tokio::test]
async fn ctrl_c_quits_without_waiting_for_a_hung_endpoint() -> Result<()> {
    let mut fx = new_fixture("flow-hung", Some("test-key")).await?;
    let stalled = ResponseTemplate::new(200)
        .set_body_json(completion_body("Too late.", 3))
        .set_delay(Duration::from_secs(30));
    Mock::given(method("POST"))
        .and(path(COMPLETIONS_PATH))
        .respond_with(stalled)
        .mount(&fx.server)
        .await;

    type_text(&mut fx.harness, "pun please").await?;
    fx.harness
        .send_key_without_reply(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE))?;

    let started = Instant::now();
    fx.harness.quit_while_waiting().await?;

    assert!(started.elapsed() < Duration::from_secs(5));
    let view = fx.harness.ui_state_view();
    assert!(view.should_quit);
    assert!(!timeline_snapshot(&fx.harness)?.contains("Too late."));
    let trace = fs::read_to_string(fx.harness.trace_path())?;
    assert!(trace.contains("quit while waiting for a reply"));

    Ok(())
}
