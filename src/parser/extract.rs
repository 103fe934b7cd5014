//! Tolerant location of a JSON report embedded in noisy output.
//!
//! Frameworks interleave banners, console output and warnings with their
//! structured report, so the payload is found by scanning for an object that
//! decodes and carries a known top-level marker key.

use regex::Regex;
use serde_json::{Map, Value};

use crate::error::ExtractError;

/// Find the first JSON object in `raw` whose top level contains `marker`.
///
/// Candidates are every `{` that precedes an occurrence of `"marker":`. The
/// first one that decodes to an object holding the key wins. When the marker
/// is present but no candidate decodes, the decode error of the outermost
/// candidate is reported.
pub fn find_object(
    raw: &str,
    framework: &'static str,
    marker: &'static str,
) -> Result<Map<String, Value>, ExtractError> {
    let pattern = Regex::new(&format!(r#""{}"\s*:"#, regex::escape(marker))).map_err(|e| {
        ExtractError::Malformed {
            framework,
            reason: e.to_string(),
        }
    })?;

    let no_payload = || ExtractError::NoPayload {
        framework,
        marker,
    };
    let last_marker = pattern.find_iter(raw).last().ok_or_else(no_payload)?.start();

    let mut first_error = None;
    for (start, _) in raw.match_indices('{').take_while(|(i, _)| *i < last_marker) {
        let mut stream = serde_json::Deserializer::from_str(&raw[start..]).into_iter::<Value>();
        match stream.next() {
            Some(Ok(Value::Object(object))) if object.contains_key(marker) => return Ok(object),
            Some(Ok(_)) => {}
            Some(Err(err)) => {
                if first_error.is_none() {
                    first_error = Some(err);
                }
            }
            None => {}
        }
    }

    Err(match first_error {
        Some(source) => ExtractError::Decode { framework, source },
        None => no_payload(),
    })
}
