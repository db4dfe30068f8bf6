pub mod chat;
pub mod cli;
pub mod config;
pub mod http;
pub mod llm;
pub mod trace;

use anyhow::Result;
use cli::{App, AppDeps, CliArgs, Theme, run_tui};
use config::AppConfig;
use http::client::HttpClient;
use http::debug::HttpDebugConfig;
use std::time::{SystemTime, UNIX_EPOCH};
use trace::SessionTrace;

pub async fn run(args: CliArgs) -> Result<()> {
    let config = AppConfig::load_with_path(args.config.as_deref())?;
    let mut app = build_app(config, args.verbose)?;
    run_tui(&mut app).await
}

/// Opens the session trace and wires config into a ready-to-draw app.
fn build_app(config: AppConfig, verbose: bool) -> Result<App> {
    let session_id = session_id(SystemTime::now(), std::process::id());
    let trace = SessionTrace::create(&session_id)?;
    trace.log_system(&format!(
        "session started (model {}, config {})",
        config.chat.model,
        config.config_path.display()
    ));

    let http = HttpClient::new(reqwest::Client::new(), HttpDebugConfig::from_verbose(verbose))
        .with_trace(trace.clone());

    Ok(App::new(AppDeps {
        session_id,
        theme: Theme::from_env(&config.theme),
        settings: config.chat,
        fallback_api_key: config.openai_api_key,
        base_url: config.openai_base_url,
        config_path: config.config_path,
        http,
        trace,
    }))
}

/// `{unix millis}-{pid}`, both lowercase hex.
fn session_id(now: SystemTime, pid: u32) -> String {
    let millis = now
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_millis());
    format!("{millis:x}-{pid:x}")
}
