//! Model output → JSON
//!
//! Two attempts only: the whole text as JSON, then the first fenced block.
//! Anything else is a [`ParseError`] and aborts the request.

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;
use thiserror::Error;

static FENCED_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```(?:json|JSON)?[ \t]*\r?\n?(.*?)```").expect("fence pattern compiles")
});

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("model output is not JSON and contains no fenced block")]
    NoJson,

    #[error("fenced block is not valid JSON: {0}")]
    InvalidFencedJson(#[source] serde_json::Error),
}

/// Parse the raw text returned by the model.
pub fn parse_model_output(raw: &str) -> Result<Value, ParseError> {
    if let Ok(value) = serde_json::from_str::<Value>(raw.trim()) {
        return Ok(value);
    }

    let captures = FENCED_BLOCK.captures(raw).ok_or(ParseError::NoJson)?;
    let body = captures.get(1).map_or("", |m| m.as_str()).trim();
    serde_json::from_str(body).map_err(ParseError::InvalidFencedJson)
}
