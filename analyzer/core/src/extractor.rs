//! Sentiment Extractor
//!
//! Turns the answer text of a finished assistant message into sentiment
//! records. Parsing is a two-stage pipeline:
//!
//! 1. [`strip_fences`] removes an optional opening code-fence line (with or
//!    without a language hint) and an optional closing fence.
//! 2. [`decode_records`] strictly decodes what is left as either one record
//!    object or an array of them. A lone object is normalized into a
//!    one-element sequence.
//!
//! Only text parts are read; reasoning parts never reach the decoder.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::messages::Message;
use crate::sentiment::SentimentRecord;

const FENCE: &str = "```";

/// Errors from decoding model output
#[derive(Debug, Error)]
pub enum ExtractError {
    /// Nothing left to decode after fence stripping
    #[error("answer text is empty")]
    Empty,

    /// Not valid JSON (trailing commas, truncated output, prose)
    #[error("answer is not valid JSON: {0}")]
    Syntax(#[source] serde_json::Error),

    /// Valid JSON with the wrong shape (missing field, wrong type, bad value)
    #[error("answer does not match the sentiment record shape: {0}")]
    Shape(#[source] serde_json::Error),
}

/// Remove optional code-fence markers around the answer
///
/// The opening marker may carry a language hint (```` ```json ````), optionally
/// after spaces. Absence of either marker is fine; the input is returned trimmed.
#[must_use]
pub fn strip_fences(input: &str) -> &str {
    let mut body = input.trim();

    if let Some(rest) = body.strip_prefix(FENCE) {
        let rest = rest.trim_start_matches([' ', '\t']);
        let hint_len = rest
            .find(|c: char| c.is_whitespace() || c == '[' || c == '{')
            .unwrap_or(rest.len());
        body = rest[hint_len..].trim_start();
    }

    if let Some(rest) = body.strip_suffix(FENCE) {
        body = rest.trim_end();
    }

    body
}

/// Strictly decode one record or an ordered array of records
///
/// An empty array decodes to an empty sequence: the model found nothing to
/// report, which still replaces the previous results.
///
/// # Errors
///
/// Returns [`ExtractError`] when `body` is empty, is not JSON, or does not
/// match the record shape.
pub fn decode_records(body: &str) -> Result<Vec<SentimentRecord>, ExtractError> {
    if body.is_empty() {
        return Err(ExtractError::Empty);
    }

    let value: Value = serde_json::from_str(body).map_err(ExtractError::Syntax)?;
    if value.is_array() {
        Vec::<SentimentRecord>::deserialize(value).map_err(ExtractError::Shape)
    } else {
        Ok(vec![SentimentRecord::deserialize(value).map_err(ExtractError::Shape)?])
    }
}

/// Fence-strip and decode raw answer text
///
/// # Errors
///
/// See [`decode_records`].
pub fn parse_records(text: &str) -> Result<Vec<SentimentRecord>, ExtractError> {
    decode_records(strip_fences(text))
}

/// Extract records from a completed assistant message
///
/// All text parts are concatenated in order and parsed as one unit.
///
/// # Errors
///
/// See [`decode_records`].
pub fn extract(message: &Message) -> Result<Vec<SentimentRecord>, ExtractError> {
    parse_records(&message.text())
}
