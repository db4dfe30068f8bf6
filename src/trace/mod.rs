//! Per-session trace file. Every chat turn, command, system message and HTTP
//! exchange lands here as timestamped, kind-tagged lines.

use crate::http::debug::header_line;
use anyhow::{Context, Result, anyhow, bail};
use reqwest::header::HeaderMap;
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{LineWriter, Write};
#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};
use time::OffsetDateTime;

const APP_STATE_SUBDIR: &str = "jokebot/traces";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TraceKind {
    UserInput,
    Command,
    Reply,
    ReplyError,
    System,
    HttpRequest,
    HttpResponse,
    HttpError,
}

impl TraceKind {
    fn tag(self) -> &'static str {
        match self {
            Self::UserInput => "you.in",
            Self::Command => "cmd.in",
            Self::Reply => "bot.out",
            Self::ReplyError => "bot.err",
            Self::System => "sys.out",
            Self::HttpRequest => "http.req",
            Self::HttpResponse => "http.resp",
            Self::HttpError => "http.err",
        }
    }
}

/// Cheap to clone; clones append to the same file.
#[derive(Clone)]
pub struct SessionTrace {
    file: Arc<TraceFile>,
}

struct TraceFile {
    path: PathBuf,
    writer: Mutex<LineWriter<File>>,
    warned: AtomicBool,
}

impl SessionTrace {
    /// Opens `session-{id}-{unix_secs}.log` under the XDG state directory.
    pub fn create(session_id: &str) -> Result<Self> {
        let state_home = std::env::var("XDG_STATE_HOME").ok();
        let dir = trace_dir(state_home.as_deref(), dirs::home_dir().as_deref())?;
        Self::open_in(&dir, session_id)
    }

    #[cfg(any(test, feature = "test-support"))]
    pub fn create_in_temp_dir(session_id: &str, trace_dir: &Path) -> Result<Self> {
        Self::open_in(trace_dir, session_id)
    }

    fn open_in(dir: &Path, session_id: &str) -> Result<Self> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create trace directory {}", dir.display()))?;

        let started = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| elapsed.as_secs());
        let path = dir.join(format!("session-{session_id}-{started}.log"));
        let file = open_private(&path)
            .with_context(|| format!("Failed to create trace file {}", path.display()))?;

        Ok(Self {
            file: Arc::new(TraceFile {
                path,
                writer: Mutex::new(LineWriter::new(file)),
                warned: AtomicBool::new(false),
            }),
        })
    }

    pub fn file_path(&self) -> &Path {
        &self.file.path
    }

    pub fn log_user_input(&self, text: &str) {
        self.record_text(TraceKind::UserInput, text);
    }

    pub fn log_command(&self, text: &str) {
        self.record_text(TraceKind::Command, text);
    }

    pub fn log_reply(&self, text: &str) {
        self.record_text(TraceKind::Reply, text);
    }

    pub fn log_reply_error(&self, text: &str) {
        self.record_text(TraceKind::ReplyError, text);
    }

    pub fn log_system(&self, text: &str) {
        self.record_text(TraceKind::System, text);
    }

    pub fn log_http_request(&self, method: &str, url: &str, headers: &HeaderMap, body: &str) {
        self.record(TraceKind::HttpRequest, &format!("{method} {url}"));
        self.record_exchange(TraceKind::HttpRequest, headers, body);
    }

    pub fn log_http_response(&self, status: u16, headers: &HeaderMap, body: &str) {
        self.record(TraceKind::HttpResponse, &format!("HTTP {status}"));
        self.record_exchange(TraceKind::HttpResponse, headers, body);
    }

    pub fn log_http_error(&self, message: &str) {
        self.record(TraceKind::HttpError, message);
    }

    // Credentials in headers are masked; bodies are kept as sent.
    fn record_exchange(&self, kind: TraceKind, headers: &HeaderMap, body: &str) {
        for (name, value) in headers {
            self.record(kind, &header_line(name, value, true));
        }
        self.record_text(kind, body);
    }

    fn record_text(&self, kind: TraceKind, text: &str) {
        if text.is_empty() {
            self.record(kind, "<empty>");
        }
        for line in text.lines() {
            self.record(kind, line);
        }
    }

    fn record(&self, kind: TraceKind, text: &str) {
        let line = format!("[{}] [{:<11}] {text}\n", Stamp::now(), kind.tag());
        let written = match self.file.writer.lock() {
            Ok(mut writer) => writer.write_all(line.as_bytes()).is_ok(),
            Err(_) => false,
        };
        if !written && !self.file.warned.swap(true, Ordering::Relaxed) {
            eprintln!(
                "JokeBot trace warning: cannot write to {}",
                self.file.path.display()
            );
        }
    }
}

/// UTC timestamp with millisecond precision, e.g. `2025-01-31T09:05:07.042Z`.
struct Stamp(OffsetDateTime);

impl Stamp {
    fn now() -> Self {
        Self(OffsetDateTime::now_utc())
    }
}

impl fmt::Display for Stamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (date, time) = (self.0.date(), self.0.time());
        write!(
            f,
            "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}.{:03}Z",
            date.year(),
            u8::from(date.month()),
            date.day(),
            time.hour(),
            time.minute(),
            time.second(),
            time.millisecond()
        )
    }
}

#[cfg(unix)]
fn open_private(path: &Path) -> std::io::Result<File> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
}

#[cfg(not(unix))]
fn open_private(path: &Path) -> std::io::Result<File> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
}

fn trace_dir(state_home: Option<&str>, home: Option<&Path>) -> Result<PathBuf> {
    match state_home.map(str::trim) {
        Some("") => bail!("Failed to resolve trace path: XDG_STATE_HOME is set but empty"),
        Some(state_home) => Ok(Path::new(state_home).join(APP_STATE_SUBDIR)),
        None => home
            .map(|home| home.join(".local/state").join(APP_STATE_SUBDIR))
            .ok_or_else(|| anyhow!("Failed to resolve trace path: HOME directory is unavailable")),
    }
}
