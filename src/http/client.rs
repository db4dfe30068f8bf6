use super::debug::HttpDebugConfig;
use crate::trace::SessionTrace;
use reqwest::header::HeaderMap;
use reqwest::{Client, Request};
use serde::Serialize;
use std::fmt;
use std::io::Write;
#[cfg(test)]
use std::sync::{Arc, Mutex};

/// Thin wrapper over `reqwest::Client` that mirrors every exchange to the
/// session trace and, with `--verbose`, to stderr.
#[derive(Clone)]
pub struct HttpClient {
    inner: Client,
    debug: HttpDebugConfig,
    echo: DebugEcho,
    trace: Option<SessionTrace>,
}

#[derive(Clone)]
enum DebugEcho {
    Stderr,
    #[cfg(test)]
    Captured(Arc<Mutex<Vec<String>>>),
}

#[derive(Debug, Clone, Copy)]
enum Direction {
    Outgoing,
    Incoming,
}

impl Direction {
    fn prefix(self) -> &'static str {
        match self {
            Self::Outgoing => "[http-debug] >",
            Self::Incoming => "[http-debug] <",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

impl HttpReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

impl fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpClient")
            .field("debug", &self.debug)
            .field("traced", &self.trace.is_some())
            .finish_non_exhaustive()
    }
}

impl HttpClient {
    pub fn new(inner: Client, debug: HttpDebugConfig) -> Self {
        Self {
            inner,
            debug,
            echo: DebugEcho::Stderr,
            trace: None,
        }
    }

    pub fn with_trace(mut self, trace: SessionTrace) -> Self {
        self.trace = Some(trace);
        self
    }

    /// POSTs `payload` as JSON with a bearer token. Non-2xx statuses come back
    /// as an `HttpReply`; only transport failures are errors.
    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        url: &str,
        bearer_token: &str,
        payload: &T,
    ) -> Result<HttpReply, reqwest::Error> {
        let request = self
            .inner
            .post(url)
            .bearer_auth(bearer_token)
            .json(payload)
            .build()?;
        self.record_request(&request);

        let response = self.inner.execute(request).await.inspect_err(|err| {
            self.echo_lines(vec![format!("{} ! {err}", Direction::Incoming.prefix())]);
            if let Some(trace) = &self.trace {
                trace.log_http_error(&err.to_string());
            }
        })?;

        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.text().await?;
        self.record_response(status, &headers, &body);

        Ok(HttpReply { status, body })
    }

    fn record_request(&self, request: &Request) {
        let body = request_body_text(request);
        if let Some(trace) = &self.trace {
            trace.log_http_request(
                request.method().as_str(),
                request.url().as_str(),
                request.headers(),
                &body,
            );
        }
        if self.debug.enabled {
            let head = format!("{} {}", request.method(), self.debug.show_url(request.url()));
            self.echo_lines(debug_lines(
                self.debug,
                Direction::Outgoing,
                head,
                request.headers(),
                &body,
            ));
        }
    }

    fn record_response(&self, status: u16, headers: &HeaderMap, body: &str) {
        if let Some(trace) = &self.trace {
            trace.log_http_response(status, headers, body);
        }
        if self.debug.enabled {
            self.echo_lines(debug_lines(
                self.debug,
                Direction::Incoming,
                format!("HTTP {status}"),
                headers,
                body,
            ));
        }
    }

    fn echo_lines(&self, lines: Vec<String>) {
        if !self.debug.enabled {
            return;
        }

        match &self.echo {
            DebugEcho::Stderr => {
                let mut stderr = std::io::stderr().lock();
                for line in lines {
                    let _ = writeln!(stderr, "{line}");
                }
            }
            #[cfg(test)]
            DebugEcho::Captured(captured) => {
                if let Ok(mut captured) = captured.lock() {
                    captured.extend(lines);
                }
            }
        }
    }

    #[cfg(test)]
    fn capturing(debug: HttpDebugConfig) -> (Self, Arc<Mutex<Vec<String>>>) {
        let captured = Arc::new(Mutex::new(Vec::new()));
        let client = Self {
            inner: Client::new(),
            debug,
            echo: DebugEcho::Captured(Arc::clone(&captured)),
            trace: None,
        };
        (client, captured)
    }
}

fn request_body_text(request: &Request) -> String {
    request
        .body()
        .and_then(|body| body.as_bytes())
        .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
        .unwrap_or_default()
}

/// Head line, one line per header, a bare separator, then the body.
fn debug_lines(
    debug: HttpDebugConfig,
    direction: Direction,
    head: String,
    headers: &HeaderMap,
    body: &str,
) -> Vec<String> {
    let prefix = direction.prefix();
    let mut lines = vec![format!("{prefix} {head}")];
    lines.extend(
        headers
            .iter()
            .map(|(name, value)| format!("{prefix} {}", debug.show_header(name, value))),
    );
    lines.push(prefix.to_string());

    let body = debug.show_body(body);
    if body.is_empty() {
        lines.push(format!("{prefix} <empty body>"));
    } else {
        lines.extend(body.lines().map(|line| format!("{prefix} {line}")));
    }
    lines
}
