use anyhow::Result;
use crossterm::event::KeyCode;

use crate::ui_rendering::common::{
    new_fixture, press, scroll_down, scroll_up, status_snapshot, submit_line, timeline_snapshot,
};

async fn fill_timeline(harness: &mut jokebot::cli::test_support::UiHarness) -> Result<()> {
    for _ in 0..3 {
        submit_line(harness, "/help").await?;
    }
    submit_line(harness, "/trace").await
}

#[tokio::test]
async fn timeline_follows_newest_output() -> Result<()> {
    let mut fx = new_fixture("scroll-follow", None).await?;

    fill_timeline(&mut fx.harness).await?;

    let timeline = timeline_snapshot(&fx.harness)?;
    assert!(timeline.contains("cmd> /trace"));
    assert!(!timeline.starts_with("cmd> /help"));
    assert_eq!(fx.harness.ui_state_view().timeline_scroll, 0);

    Ok(())
}

#[tokio::test]
async fn page_keys_scroll_and_clamp() -> Result<()> {
    let mut fx = new_fixture("scroll-page", None).await?;
    fill_timeline(&mut fx.harness).await?;

    press(&mut fx.harness, KeyCode::PageUp).await?;
    let after_one_page = fx.harness.ui_state_view().timeline_scroll;
    assert!(after_one_page > 0);
    assert!(!timeline_snapshot(&fx.harness)?.contains("cmd> /trace"));
    assert!(status_snapshot(&fx.harness)?.contains("[scrolled"));

    for _ in 0..10 {
        press(&mut fx.harness, KeyCode::PageUp).await?;
    }
    let at_top = fx.harness.ui_state_view().timeline_scroll;
    assert!(at_top >= after_one_page);
    assert!(timeline_snapshot(&fx.harness)?.starts_with("cmd> /help"));

    for _ in 0..10 {
        press(&mut fx.harness, KeyCode::PageDown).await?;
    }
    assert_eq!(fx.harness.ui_state_view().timeline_scroll, 0);
    assert!(timeline_snapshot(&fx.harness)?.contains("cmd> /trace"));

    Ok(())
}

#[tokio::test]
async fn mouse_wheel_scroll_only_applies_inside_timeline_region() -> Result<()> {
    let mut fx = new_fixture("scroll-mouse", None).await?;
    fill_timeline(&mut fx.harness).await?;
    let regions = fx.harness.regions()?;

    scroll_up(&mut fx.harness, regions.input.x + 1, regions.input.y + 1)?;
    assert_eq!(fx.harness.ui_state_view().timeline_scroll, 0);
    scroll_up(&mut fx.harness, regions.settings.x + 1, regions.settings.y + 1)?;
    assert_eq!(fx.harness.ui_state_view().timeline_scroll, 0);

    scroll_up(&mut fx.harness, regions.timeline.x + 1, regions.timeline.y + 1)?;
    let after_up = fx.harness.ui_state_view().timeline_scroll;
    assert!(after_up > 0);

    scroll_down(&mut fx.harness, regions.status.x + 1, regions.status.y)?;
    assert_eq!(fx.harness.ui_state_view().timeline_scroll, after_up);

    scroll_down(&mut fx.harness, regions.timeline.x + 1, regions.timeline.y + 1)?;
    assert!(fx.harness.ui_state_view().timeline_scroll < after_up);

    Ok(())
}

#[tokio::test]
async fn submitting_snaps_back_to_bottom() -> Result<()> {
    let mut fx = new_fixture("scroll-snap", None).await?;
    fill_timeline(&mut fx.harness).await?;

    press(&mut fx.harness, KeyCode::PageUp).await?;
    assert!(fx.harness.ui_state_view().timeline_scroll > 0);

    submit_line(&mut fx.harness, "/style").await?;
    assert_eq!(fx.harness.ui_state_view().timeline_scroll, 0);
    assert!(timeline_snapshot(&fx.harness)?.contains("style: one-liners"));

    Ok(())
}
