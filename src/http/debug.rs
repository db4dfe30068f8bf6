//! Rendering of HTTP exchanges for `--verbose` output and the session trace.
//!
//! Credentials are recognised by name: header names, query parameter names
//! and JSON object keys all go through [`is_credential`].

use reqwest::Url;
use reqwest::header::{HeaderName, HeaderValue};
use serde_json::Value;

pub const MASK: &str = "[redacted]";
pub const DEFAULT_BODY_LIMIT: usize = 4_000;

const CREDENTIAL_NAMES: &[&str] = &[
    "authorization",
    "proxy-authorization",
    "x-api-key",
    "api-key",
    "api_key",
    "apikey",
    "openai_api_key",
    "key",
    "token",
    "access_token",
    "secret",
    "password",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpDebugConfig {
    pub enabled: bool,
    pub redact: bool,
    pub body_limit: usize,
}

impl HttpDebugConfig {
    /// `--verbose` turns stderr output on. Redaction is always on.
    pub fn from_verbose(verbose: bool) -> Self {
        Self {
            enabled: verbose,
            redact: true,
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }

    pub fn disabled() -> Self {
        Self::from_verbose(false)
    }

    pub fn show_url(&self, url: &Url) -> String {
        if self.redact {
            masked_url(url)
        } else {
            url.to_string()
        }
    }

    pub fn show_header(&self, name: &HeaderName, value: &HeaderValue) -> String {
        header_line(name, value, self.redact)
    }

    /// JSON bodies get credential fields masked, then everything is clipped
    /// to `body_limit` chars.
    pub fn show_body(&self, raw: &str) -> String {
        let shown = if self.redact {
            masked_json_text(raw).unwrap_or_else(|| raw.to_string())
        } else {
            raw.to_string()
        };
        clip(&shown, self.body_limit)
    }
}

pub fn is_credential(name: &str) -> bool {
    CREDENTIAL_NAMES
        .iter()
        .any(|candidate| candidate.eq_ignore_ascii_case(name))
}

/// `name: value`, with credential values replaced by [`MASK`] when `redact` is set.
pub fn header_line(name: &HeaderName, value: &HeaderValue, redact: bool) -> String {
    let shown = if redact && is_credential(name.as_str()) {
        MASK
    } else {
        value.to_str().unwrap_or("<binary>")
    };
    format!("{name}: {shown}")
}

fn masked_url(url: &Url) -> String {
    if url.query().is_none() {
        return url.to_string();
    }

    let pairs = url
        .query_pairs()
        .map(|(name, value)| {
            let value = if is_credential(&name) {
                MASK.to_string()
            } else {
                value.into_owned()
            };
            (name.into_owned(), value)
        })
        .collect::<Vec<_>>();

    let mut masked = url.clone();
    masked.query_pairs_mut().clear().extend_pairs(pairs);
    masked.to_string()
}

/// `None` when `raw` is not JSON.
fn masked_json_text(raw: &str) -> Option<String> {
    let mut json = serde_json::from_str::<Value>(raw).ok()?;
    mask_credentials(&mut json);
    serde_json::to_string(&json).ok()
}

fn mask_credentials(value: &mut Value) {
    match value {
        Value::Object(map) => map.iter_mut().for_each(|(key, item)| {
            if is_credential(key) {
                *item = Value::String(MASK.to_string());
            } else {
                mask_credentials(item);
            }
        }),
        Value::Array(items) => items.iter_mut().for_each(mask_credentials),
        _ => {}
    }
}

pub fn clip(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        None => text.to_string(),
        Some((cut, _)) => {
            let dropped = text[cut..].chars().count();
            format!("{} [+{dropped} chars]", &text[..cut])
        }
    }
}
