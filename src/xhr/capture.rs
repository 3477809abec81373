use std::sync::LazyLock;

use bytes::Bytes;
use regex::Regex;
use tokio::sync::oneshot;

/// Request payload accepted by the body-capture hook.
#[derive(Clone, Debug)]
pub enum BodyPayload {
    Text(String),
    Json(serde_json::Value),
    Binary(Bytes),
}

/// Response body handed to the capture hook: either text that is already
/// available, or text still being decoded asynchronously by the host (blob
/// and array-buffer responses).
#[derive(Debug)]
pub enum ResponseBody {
    Text(String),
    Pending(oneshot::Receiver<String>),
}

/// Best-effort stringification of a request payload. Bodies that cannot be
/// rendered as text fall back to a placeholder naming their type.
pub(crate) fn stringify_body(payload: BodyPayload) -> String {
    match payload {
        BodyPayload::Text(text) => text,
        BodyPayload::Json(value) => {
            serde_json::to_string(&value).unwrap_or_else(|_| "[object Object]".to_string())
        }
        BodyPayload::Binary(bytes) => match String::from_utf8(bytes.to_vec()) {
            Ok(text) => text,
            Err(_) => "[object ArrayBuffer]".to_string(),
        },
    }
}

/// Truncates `text` to at most `limit` bytes, backing up to the nearest
/// character boundary.
pub(crate) fn truncate_body(mut text: String, limit: usize) -> String {
    if text.len() <= limit {
        return text;
    }
    let mut cut = limit;
    while cut > 0 && !text.is_char_boundary(cut) {
        cut -= 1;
    }
    text.truncate(cut);
    text
}

/// Normalizes a header name for use in an attribute key: lower-case with
/// `-` folded to `_`.
pub(crate) fn normalize_header_name(name: &str) -> String {
    name.trim().to_ascii_lowercase().replace('-', "_")
}

/// Splits a raw response-header blob (`Name: value` lines separated by
/// CRLF) into pairs. Malformed lines are skipped.
pub(crate) fn parse_raw_headers(raw: &str) -> Vec<(String, String)> {
    raw.lines()
        .filter_map(|line| {
            let line = line.trim();
            if line.is_empty() {
                return None;
            }
            let (name, value) = line.split_once(':')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some((name.to_string(), value.trim().to_string()))
        })
        .collect()
}

static SERVER_TIMING_TRACEPARENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"traceparent;desc\s*=\s*['"]00-([0-9a-f]{32})-([0-9a-f]{16})-01['"]"#)
        .expect("server-timing traceparent pattern")
});

/// Extracts the backend trace and span ids from a `Server-Timing` header
/// value of the form `traceparent;desc="00-<trace-id>-<span-id>-01"`.
/// Only sampled entries are honored.
pub(crate) fn server_timing_trace(value: &str) -> Option<(String, String)> {
    let captures = SERVER_TIMING_TRACEPARENT.captures(value)?;
    Some((captures[1].to_string(), captures[2].to_string()))
}
