use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One recognized speech segment on a gapless timeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechSegment {
    pub text: String,

    /// Start in seconds; always the previous segment's end (0 for the first)
    pub start: f64,

    /// End in seconds, parsed from the recognizer's end-time value
    pub end: f64,

    /// Recognizer confidence, 0 when absent
    pub confidence: f64,
}

/// Known payload shapes, probed in order. Each extractor either returns
/// the per-result objects or reports "not applicable".
const EXTRACTORS: &[fn(&Value) -> Option<Vec<Value>>] = &[
    direct_results,
    uri_keyed_transcript,
    uri_keyed_inline_result,
];

/// Pull speech segments out of a completed operation response.
///
/// Returns `None` when no known shape matches; the caller persists the
/// raw payload and fails.
pub fn extract_segments(response: &Value) -> Option<Vec<SpeechSegment>> {
    for extractor in EXTRACTORS {
        if let Some(results) = extractor(response) {
            return Some(segments_from_results(&results));
        }
    }
    None
}

/// Shape 1: `response.results` is the result list itself
fn direct_results(response: &Value) -> Option<Vec<Value>> {
    let results = response.get("results")?.as_array()?;
    Some(results.to_vec())
}

/// Shape 2: `response.results` maps a storage URI to `{transcript: {results}}`
fn uri_keyed_transcript(response: &Value) -> Option<Vec<Value>> {
    let by_uri = response.get("results")?.as_object()?;
    let mut collected = Vec::new();
    for entry in by_uri.values() {
        let results = entry.get("transcript")?.get("results")?.as_array()?;
        collected.extend(results.iter().cloned());
    }
    Some(collected)
}

/// Shape 3: as shape 2, but wrapped in an `inlineResult` envelope
fn uri_keyed_inline_result(response: &Value) -> Option<Vec<Value>> {
    let by_uri = response.get("results")?.as_object()?;
    let mut collected = Vec::new();
    for entry in by_uri.values() {
        let results = entry
            .get("inlineResult")?
            .get("transcript")?
            .get("results")?
            .as_array()?;
        collected.extend(results.iter().cloned());
    }
    Some(collected)
}

/// Build the gapless segment timeline.
///
/// Each segment starts where the previous one ended, whatever the true
/// silence gaps were. Results without an alternative are skipped; a
/// missing end time leaves the cursor where it was.
fn segments_from_results(results: &[Value]) -> Vec<SpeechSegment> {
    let mut segments = Vec::new();
    let mut cursor = 0.0_f64;

    for result in results {
        let Some(first_alt) = result
            .get("alternatives")
            .and_then(Value::as_array)
            .and_then(|alts| alts.first())
        else {
            continue;
        };

        let text = first_alt
            .get("transcript")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .trim()
            .to_string();

        let confidence = first_alt
            .get("confidence")
            .and_then(Value::as_f64)
            .unwrap_or(0.0);

        let end = result
            .get("resultEndTime")
            .or_else(|| result.get("resultEndOffset"))
            .and_then(parse_end_seconds)
            .unwrap_or(cursor);

        segments.push(SpeechSegment {
            text,
            start: cursor,
            end,
            confidence,
        });
        cursor = end;
    }

    segments
}

/// End times arrive either as a string with an `s` suffix (`"9.250s"`)
/// or as a structured seconds + fractional-nanosecond pair.
fn parse_end_seconds(value: &Value) -> Option<f64> {
    match value {
        Value::String(s) => s.trim().trim_end_matches('s').parse::<f64>().ok(),
        Value::Object(fields) => {
            let seconds = match fields.get("seconds") {
                Some(Value::Number(n)) => n.as_f64()?,
                Some(Value::String(s)) => s.parse::<f64>().ok()?,
                None => 0.0,
                _ => return None,
            };
            let nanos = fields.get("nanos").and_then(Value::as_f64).unwrap_or(0.0);
            Some(seconds + nanos / 1_000_000_000.0)
        }
        _ => None,
    }
}

/// Full transcript: segment texts joined with single spaces
pub fn concatenated_transcript(segments: &[SpeechSegment]) -> String {
    segments
        .iter()
        .map(|s| s.text.as_str())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
