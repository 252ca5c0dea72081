//! The `<answer>…</answer>` wire format.

use regex::Regex;
use std::sync::LazyLock;

/// Opening tag of an answer span.
pub const ANSWER_OPEN: &str = "<answer>";

/// Closing tag of an answer span.
pub const ANSWER_CLOSE: &str = "</answer>";

#[allow(clippy::expect_used)]
static ANSWER_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<answer>(.*?)</answer>").expect("answer pattern is valid"));

#[allow(clippy::expect_used)]
static NUMERIC_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+\.?\d*%?").expect("numeric pattern is valid"));

/// Returns the trimmed body of the first answer span, or the trimmed text
/// when there is none.
#[must_use]
pub fn extract_answer(text: &str) -> String {
    ANSWER_SPAN
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map_or_else(|| text.trim().to_string(), |m| m.as_str().trim().to_string())
}

/// Whether the text contains a complete answer span.
#[must_use]
pub fn has_answer_format(text: &str) -> bool {
    ANSWER_SPAN.is_match(text)
}

/// Wraps a body in the answer tags.
#[must_use]
pub fn wrap_answer(body: &str) -> String {
    format!("{ANSWER_OPEN}\n{}\n{ANSWER_CLOSE}", body.trim())
}

/// Returns the last number or percentage in the text, if any.
#[must_use]
pub fn last_numeric_token(text: &str) -> Option<&str> {
    NUMERIC_TOKEN.find_iter(text).last().map(|m| m.as_str())
}

/// Canonicalizes generated text into exactly one answer span.
///
/// Text that already opens with a complete span keeps that span's body.
/// Anything else is reduced to its last numeric token, or kept whole when
/// it contains no number.
#[must_use]
pub fn canonicalize_answer(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.starts_with(ANSWER_OPEN) && has_answer_format(trimmed) {
        return wrap_answer(&extract_answer(trimmed));
    }

    let body = last_numeric_token(trimmed).unwrap_or(trimmed);
    wrap_answer(body)
}
