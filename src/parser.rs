//! Recover a metadata object from free-form model output

use log::{debug, warn};
use serde::Serialize;
use serde_json::{Map, Number, Value};

use crate::error::ExtractionError;
use crate::model::MetadataRecord;

/// Which recovery step produced the JSON object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseStrategy {
    /// The whole output was a JSON object
    Direct,
    /// The object sat inside a markdown code fence
    FencedBlock,
    /// The object was embedded in surrounding prose
    BalancedSpan,
}

/// Parse model output into a [`MetadataRecord`].
///
/// Tries, in order: the whole text, the contents of markdown code fences, and
/// every top-level `{...}` span. The first JSON object found must carry
/// `title`, `authors`, `year` and `keywords` as strings (numbers are accepted
/// and rendered as text). Any other outcome is `MalformedResponse` with the
/// raw text attached.
pub fn parse_metadata(raw: &str) -> Result<(MetadataRecord, ParseStrategy), ExtractionError> {
    let (object, strategy) = recover_json_object(raw)
        .ok_or_else(|| ExtractionError::MalformedResponse(raw.to_string()))?;
    debug!("Recovered metadata object via {:?}", strategy);

    let record = record_from_object(&object)
        .ok_or_else(|| ExtractionError::MalformedResponse(raw.to_string()))?;

    Ok((record, strategy))
}

/// Locate the first JSON object in `raw` using the three recovery steps.
pub fn recover_json_object(raw: &str) -> Option<(Map<String, Value>, ParseStrategy)> {
    if let Some(object) = parse_object(raw.trim()) {
        return Some((object, ParseStrategy::Direct));
    }

    if let Some(object) = fenced_blocks(raw).into_iter().find_map(parse_object) {
        return Some((object, ParseStrategy::FencedBlock));
    }

    balanced_spans(raw)
        .into_iter()
        .find_map(parse_object)
        .map(|object| (object, ParseStrategy::BalancedSpan))
}

fn parse_object(candidate: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(candidate) {
        Ok(Value::Object(object)) => Some(object),
        _ => None,
    }
}

/// Contents of every closed ``` fence, with the language tag stripped
fn fenced_blocks(raw: &str) -> Vec<&str> {
    let mut blocks = Vec::new();
    let mut rest = raw;

    while let Some(open) = rest.find("```") {
        let after = &rest[open + 3..];
        let tag_len = after
            .find(|c: char| !c.is_ascii_alphanumeric())
            .unwrap_or(after.len());
        let body = &after[tag_len..];

        match body.find("```") {
            Some(close) => {
                blocks.push(body[..close].trim());
                rest = &body[close + 3..];
            }
            None => break,
        }
    }

    blocks
}

/// Outermost brace-balanced spans in document order, ignoring braces inside
/// JSON strings.
///
/// Single pass with a stack of open positions. An opening brace that is never
/// closed does not swallow the rest of the text: spans closed inside it still
/// count as outermost.
fn balanced_spans(raw: &str) -> Vec<&str> {
    let mut open: Vec<usize> = Vec::new();
    let mut closed: Vec<(usize, usize)> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in raw.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' if !open.is_empty() => in_string = true,
            '{' => open.push(i),
            '}' => {
                if let Some(start) = open.pop() {
                    closed.push((start, i));
                }
            }
            _ => {}
        }
    }

    // Pairs close inner-first; order by start and drop nested ones
    closed.sort_unstable_by_key(|&(start, _)| start);
    let mut spans = Vec::new();
    let mut covered_until = 0;
    for (start, end) in closed {
        if spans.is_empty() || start > covered_until {
            spans.push(&raw[start..=end]);
            covered_until = end;
        }
    }

    spans
}

fn record_from_object(object: &Map<String, Value>) -> Option<MetadataRecord> {
    Some(MetadataRecord {
        title: text_field(object, "title")?,
        authors: text_field(object, "authors")?,
        year: text_field(object, "year")?,
        keywords: text_field(object, "keywords")?,
    })
}

/// Integral values print without a fractional part (`2021.0` -> `2021`)
fn number_text(n: &Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
        _ => n.to_string(),
    }
}

fn text_field(object: &Map<String, Value>, key: &str) -> Option<String> {
    match object.get(key) {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(number_text(n)),
        Some(other) => {
            warn!("Field '{}' has unexpected type: {}", key, other);
            None
        }
        None => {
            warn!("Field '{}' missing from model output", key);
            None
        }
    }
}
