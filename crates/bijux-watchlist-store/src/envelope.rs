// SPDX-License-Identifier: Apache-2.0

use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;

fn wrapper_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"(?s)^\s*[A-Za-z_][\w.]*\((.*)\)\s*$").ok())
        .as_ref()
}

/// Strips textual wrappers such as `HttpError({...})` around an error body.
/// Nested wrappers are removed one layer at a time.
#[must_use]
pub fn unwrap_error_envelope(body: &str) -> &str {
    let mut current = body.trim();
    let Some(pattern) = wrapper_pattern() else {
        return current;
    };
    while let Some(inner) = pattern
        .captures(current)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
    {
        if inner == current {
            break;
        }
        current = inner;
    }
    current
}

#[derive(Deserialize)]
struct ErrorDocument {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Extracts a readable message from a remote error body: `code: message` when
/// the unwrapped body is a structured error document, the unwrapped text
/// otherwise.
#[must_use]
pub fn remote_error_message(body: &str) -> String {
    let inner = unwrap_error_envelope(body);
    if let Ok(doc) = serde_json::from_str::<ErrorDocument>(inner) {
        match (doc.error.code, doc.error.message) {
            (Some(code), Some(message)) => return format!("{code}: {message}"),
            (None, Some(message)) => return message,
            (Some(code), None) => return code,
            (None, None) => {}
        }
    }
    if inner.is_empty() {
        "empty response body".to_string()
    } else {
        inner.to_string()
    }
}
