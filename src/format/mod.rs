use serde::{Deserialize, Serialize};

use crate::transcript::{format_timestamp, TranscriptDocument};
use crate::{Error, Result};

/// Input text is capped rather than chunked; long videos lose trailing
/// content past this point.
pub const MAX_INPUT_CHARS: usize = 200_000;

/// Formatter output below this length is rejected outright
pub const MIN_OUTPUT_CHARS: usize = 100;

const TRUNCATION_MARKER: &str = "\n\n[transcript truncated at 200,000 characters]";

/// Upstream error phrases that mean "input too large", which needs
/// different remediation than a generic failure.
const CAPACITY_PHRASES: &[&str] = &[
    "exceeds the maximum number of tokens",
    "input token count",
    "payload size exceeds",
];

/// Markdown formatter backed by the Gemini `generateContent` endpoint
pub struct MarkdownFormatter {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<RequestContent>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct RequestContent {
    parts: Vec<RequestPart>,
}

#[derive(Debug, Serialize)]
struct RequestPart {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl MarkdownFormatter {
    pub fn new(api_key: String, model: String) -> Result<Self> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            http,
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            api_key,
            model,
        })
    }

    /// Turn raw transcript text into structured markdown.
    ///
    /// One request, deterministic-leaning sampling, no retries. The
    /// result is trimmed and must clear the minimum-length gate.
    pub async fn format_transcript(
        &self,
        document: &TranscriptDocument,
        raw_text: &str,
    ) -> Result<String> {
        let (text, truncated) = truncate_input(raw_text);
        if truncated {
            tracing::warn!(
                chars = raw_text.chars().count(),
                "transcript truncated before formatting"
            );
        }

        let prompt = build_prompt(document, &text);

        let request = GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.2,
                max_output_tokens: 8192,
            },
        };

        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );

        tracing::info!(model = %self.model, "requesting markdown formatting");
        let response = self.http.post(&url).json(&request).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();

            if is_capacity_error(&body) {
                return Err(Error::ContentTooLarge(format!(
                    "model rejected input (HTTP {status}); try a shorter video"
                )));
            }
            return Err(Error::UpstreamService {
                service: "gemini",
                message: format!("HTTP {status}: {body}"),
            });
        }

        let parsed: GenerateResponse = response.json().await?;
        let markdown = extract_text(&parsed).ok_or(Error::EmptyResponse)?;
        accept_output(markdown)
    }
}

/// Trim and apply the minimum-length sanity gate
fn accept_output(markdown: String) -> Result<String> {
    let markdown = markdown.trim().to_string();
    let length = markdown.chars().count();
    if length < MIN_OUTPUT_CHARS {
        return Err(Error::DegenerateResponse {
            length,
            minimum: MIN_OUTPUT_CHARS,
        });
    }
    Ok(markdown)
}

/// Cap input at the model-friendly limit, appending a continuation marker
/// when anything was dropped.
fn truncate_input(raw: &str) -> (String, bool) {
    if raw.chars().count() <= MAX_INPUT_CHARS {
        return (raw.to_string(), false);
    }

    let mut text: String = raw.chars().take(MAX_INPUT_CHARS).collect();
    text.push_str(TRUNCATION_MARKER);
    (text, true)
}

fn build_prompt(document: &TranscriptDocument, text: &str) -> String {
    format!(
        "You are formatting the raw transcript of a video into a clean markdown document.\n\
         \n\
         Video: {source_url} (id {video_id})\n\
         Duration: {duration}, {segment_count} caption segments.\n\
         \n\
         Instructions:\n\
         - Infer a fitting document title from the content.\n\
         - Organize the content into sections and subsections using markdown headings.\n\
         - Where the transcript carries [timestamp] markers, keep one at each section boundary.\n\
         - Fence any code in code blocks with a language tag.\n\
         - Remove filler words and disfluencies, but preserve meaning and all technical terms.\n\
         - Return only the markdown document, with no commentary before or after.\n\
         \n\
         Transcript:\n\
         {text}",
        source_url = document.source_url,
        video_id = document.video_id,
        duration = format_timestamp(document.total_duration_seconds),
        segment_count = document.segment_count,
        text = text,
    )
}

/// First candidate that carries any text, its parts concatenated
fn extract_text(response: &GenerateResponse) -> Option<String> {
    for candidate in &response.candidates {
        let Some(content) = &candidate.content else {
            continue;
        };
        let text: String = content
            .parts
            .iter()
            .filter_map(|part| part.text.as_deref())
            .collect::<Vec<_>>()
            .join("\n");
        if !text.trim().is_empty() {
            return Some(text);
        }
    }
    None
}

fn is_capacity_error(body: &str) -> bool {
    CAPACITY_PHRASES.iter().any(|phrase| body.contains(phrase))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_document() -> TranscriptDocument {
        TranscriptDocument {
            video_id: "dQw4w9WgXcQ".to_string(),
            source_url: "https://youtu.be/dQw4w9WgXcQ".to_string(),
            total_duration_seconds: 125.0,
            segment_count: 2,
            segments: Vec::new(),
        }
    }

    #[test]
    fn test_truncate_input_under_limit() {
        let (text, truncated) = truncate_input("short transcript");
        assert_eq!(text, "short transcript");
        assert!(!truncated);
    }

    #[test]
    fn test_truncate_input_over_limit() {
        let raw = "x".repeat(MAX_INPUT_CHARS + 10);
        let (text, truncated) = truncate_input(&raw);
        assert!(truncated);
        assert!(text.ends_with(TRUNCATION_MARKER));
        assert_eq!(
            text.chars().count(),
            MAX_INPUT_CHARS + TRUNCATION_MARKER.chars().count()
        );
    }

    #[test]
    fn test_build_prompt_embeds_context() {
        let prompt = build_prompt(&sample_document(), "[0:00] hello");
        assert!(prompt.contains("dQw4w9WgXcQ"));
        assert!(prompt.contains("2:05"));
        assert!(prompt.contains("[0:00] hello"));
        assert!(prompt.contains("only the markdown"));
    }

    #[test]
    fn test_extract_text_first_candidate() {
        let response: GenerateResponse = serde_json::from_str(
            r##"{
                "candidates": [
                    {"content": {"parts": [{"text": "# Title"}, {"text": "body"}]}},
                    {"content": {"parts": [{"text": "second candidate"}]}}
                ]
            }"##,
        )
        .unwrap();
        assert_eq!(extract_text(&response).as_deref(), Some("# Title\nbody"));
    }

    #[test]
    fn test_extract_text_skips_empty_candidates() {
        let response: GenerateResponse = serde_json::from_str(
            r#"{
                "candidates": [
                    {"content": {"parts": []}},
                    {"content": {"parts": [{"text": "real output"}]}}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(extract_text(&response).as_deref(), Some("real output"));
    }

    #[test]
    fn test_extract_text_none_when_no_candidates() {
        let response: GenerateResponse = serde_json::from_str(r#"{"candidates": []}"#).unwrap();
        assert!(extract_text(&response).is_none());
    }

    #[test]
    fn test_accept_output_rejects_short_text() {
        let err = accept_output("  ## Too short  ".to_string()).unwrap_err();
        match err {
            Error::DegenerateResponse { length, minimum } => {
                assert_eq!(length, 12);
                assert_eq!(minimum, MIN_OUTPUT_CHARS);
            }
            other => panic!("expected DegenerateResponse, got {other:?}"),
        }
    }

    #[test]
    fn test_accept_output_trims_and_passes() {
        let body = format!("  {}  ", "a".repeat(MIN_OUTPUT_CHARS));
        let accepted = accept_output(body).unwrap();
        assert_eq!(accepted.chars().count(), MIN_OUTPUT_CHARS);
    }

    #[test]
    fn test_capacity_error_phrases() {
        assert!(is_capacity_error(
            "The input token count exceeds what the model supports"
        ));
        assert!(is_capacity_error("Request payload size exceeds the limit"));
        assert!(!is_capacity_error("quota exhausted, retry later"));
    }
}
