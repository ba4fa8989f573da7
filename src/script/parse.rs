//! Parsing and validation of model output into script segments.

use super::ScriptSegment;
use crate::error::{Gener8Error, Result};
use regex::Regex;
use std::sync::LazyLock;

static CODE_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```[a-zA-Z]*\s*\n?(.*?)```").expect("Invalid regex")
});

/// Strip a markdown fence and decode the segment array inside the response.
///
/// Every `[` is a candidate start, `[{` ones first, so bracketed prose before
/// or after the array does not get in the way. Anything after the array is
/// ignored.
fn decode_array(response: &str) -> serde_json::Result<Vec<ScriptSegment>> {
    let body = CODE_FENCE
        .captures(response)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or(response);

    let (objects, others): (Vec<usize>, Vec<usize>) = body
        .match_indices('[')
        .map(|(idx, _)| idx)
        .partition(|&idx| body[idx + 1..].trim_start().starts_with('{'));

    let mut first_error = None;
    for start in objects.into_iter().chain(others) {
        let mut stream =
            serde_json::Deserializer::from_str(&body[start..]).into_iter::<Vec<ScriptSegment>>();
        match stream.next() {
            Some(Ok(segments)) => return Ok(segments),
            Some(Err(e)) => {
                first_error.get_or_insert(e);
            }
            None => {}
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => serde_json::from_str(body.trim()),
    }
}

/// Parse a model response into validated segments.
///
/// Every segment must have a non-empty title and content, and the array
/// must not be empty.
pub fn parse_segments(response: &str) -> Result<Vec<ScriptSegment>> {
    let segments = decode_array(response).map_err(|e| {
        Gener8Error::Parse(format!(
            "{}. Response was: {}",
            e,
            preview(response, 300)
        ))
    })?;

    if segments.is_empty() {
        return Err(Gener8Error::Parse("Response contained no segments".to_string()));
    }

    let segments: Vec<ScriptSegment> = segments
        .into_iter()
        .map(|s| ScriptSegment {
            title: s.title.trim().to_string(),
            content: s.content.trim().to_string(),
        })
        .collect();

    for (idx, segment) in segments.iter().enumerate() {
        if segment.title.is_empty() {
            return Err(Gener8Error::Parse(format!("Segment {} has an empty title", idx + 1)));
        }
        if segment.content.is_empty() {
            return Err(Gener8Error::Parse(format!(
                "Segment {} ('{}') has empty content",
                idx + 1,
                segment.title
            )));
        }
    }

    Ok(segments)
}

fn preview(text: &str, max_chars: usize) -> String {
    let mut out: String = text.chars().take(max_chars).collect();
    if text.chars().count() > max_chars {
        out.push_str("...");
    }
    out
}
