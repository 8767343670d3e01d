use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

pub mod innertube;

pub use innertube::WatchPageClient;

/// Language candidates tried in order; `None` lets the service pick the
/// only track it has.
pub const LANGUAGE_CANDIDATES: &[Option<&str>] = &[Some("en"), Some("en-US"), Some("en-GB"), None];

/// Joined caption text must exceed this many characters to count as usable
const MIN_USABLE_CHARS: usize = 50;

/// One raw timed caption segment, in the service's native milliseconds.
///
/// Timing fields stay optional here; the normalizer is the component
/// that insists on their presence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptionSegment {
    pub text: String,
    pub offset_ms: Option<u64>,
    pub duration_ms: Option<u64>,
}

/// Source of timed captions for a single video
#[async_trait]
pub trait CaptionSource: Send + Sync {
    /// Fetch captions for one language candidate (`None` = service default)
    async fn fetch_captions(
        &self,
        video_id: &str,
        language: Option<&str>,
    ) -> Result<Vec<CaptionSegment>>;
}

/// Fetch captions, trying each language candidate until one yields a
/// usable track.
///
/// A candidate fails when the fetch errors, returns no segments, or the
/// space-joined text does not exceed 50 characters; each failure is
/// logged and the next candidate tried. Only once every candidate is
/// exhausted does this fail, carrying the last candidate's error text.
pub async fn fetch_with_fallback(
    source: &dyn CaptionSource,
    video_id: &str,
) -> Result<Vec<CaptionSegment>> {
    let mut last_error = String::from("no caption source attempted");

    for candidate in LANGUAGE_CANDIDATES {
        let label = candidate.unwrap_or("default");

        match source.fetch_captions(video_id, *candidate).await {
            Ok(segments) => {
                let joined = segments
                    .iter()
                    .map(|s| s.text.as_str())
                    .collect::<Vec<_>>()
                    .join(" ");
                let joined_chars = joined.chars().count();

                if segments.is_empty() || joined_chars <= MIN_USABLE_CHARS {
                    last_error = format!(
                        "captions for '{label}' too short to use ({joined_chars} chars)"
                    );
                    tracing::warn!(language = label, chars = joined_chars, "caption track unusable");
                    continue;
                }

                tracing::info!(
                    language = label,
                    segments = segments.len(),
                    "caption track accepted"
                );
                return Ok(segments);
            }
            Err(err) => {
                last_error = err.to_string();
                tracing::warn!(language = label, error = %err, "caption fetch failed");
            }
        }
    }

    Err(Error::NoCaptionsAvailable { last_error })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Per-candidate canned response
    #[derive(Clone)]
    enum Scripted {
        Segments(Vec<CaptionSegment>),
        Upstream(String),
    }

    /// Caption source that serves a script keyed by candidate label and
    /// records the order it was asked in
    struct ScriptedSource {
        script: HashMap<&'static str, Scripted>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedSource {
        fn new(script: HashMap<&'static str, Scripted>) -> Self {
            Self {
                script,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CaptionSource for ScriptedSource {
        async fn fetch_captions(
            &self,
            _video_id: &str,
            language: Option<&str>,
        ) -> Result<Vec<CaptionSegment>> {
            let label = language.unwrap_or("default").to_string();
            self.calls.lock().unwrap().push(label.clone());

            match self.script.get(label.as_str()) {
                Some(Scripted::Segments(segments)) => Ok(segments.clone()),
                Some(Scripted::Upstream(message)) => Err(Error::UpstreamService {
                    service: "youtube",
                    message: message.clone(),
                }),
                None => panic!("unscripted language candidate: {label}"),
            }
        }
    }

    fn long_segments() -> Scripted {
        Scripted::Segments(vec![CaptionSegment {
            text: "this caption track carries comfortably more than fifty characters of text"
                .to_string(),
            offset_ms: Some(0),
            duration_ms: Some(4000),
        }])
    }

    fn short_segments() -> Scripted {
        Scripted::Segments(vec![CaptionSegment {
            text: "too short".to_string(),
            offset_ms: Some(0),
            duration_ms: Some(1000),
        }])
    }

    #[tokio::test]
    async fn test_first_candidate_wins() {
        let source = ScriptedSource::new(HashMap::from([("en", long_segments())]));

        let segments = fetch_with_fallback(&source, "dQw4w9WgXcQ").await.unwrap();
        assert_eq!(segments.len(), 1);
        assert_eq!(source.calls(), vec!["en"]);
    }

    #[tokio::test]
    async fn test_fallback_stops_at_first_success() {
        let source = ScriptedSource::new(HashMap::from([
            ("en", Scripted::Upstream("HTTP 404".to_string())),
            ("en-US", long_segments()),
        ]));

        let segments = fetch_with_fallback(&source, "dQw4w9WgXcQ").await.unwrap();
        assert_eq!(segments.len(), 1);
        // en-GB and default are never attempted
        assert_eq!(source.calls(), vec!["en", "en-US"]);
    }

    #[tokio::test]
    async fn test_all_candidates_short_fails_with_last_error() {
        let source = ScriptedSource::new(HashMap::from([
            ("en", short_segments()),
            ("en-US", short_segments()),
            ("en-GB", short_segments()),
            ("default", short_segments()),
        ]));

        let err = fetch_with_fallback(&source, "dQw4w9WgXcQ").await.unwrap_err();
        match err {
            Error::NoCaptionsAvailable { last_error } => {
                assert!(last_error.contains("default"), "last error: {last_error}");
                assert!(last_error.contains("too short"), "last error: {last_error}");
            }
            other => panic!("expected NoCaptionsAvailable, got {other:?}"),
        }
        assert_eq!(source.calls().len(), 4);
    }

    #[tokio::test]
    async fn test_error_message_embeds_last_candidate_failure() {
        let source = ScriptedSource::new(HashMap::from([
            ("en", Scripted::Upstream("HTTP 500".to_string())),
            ("en-US", Scripted::Upstream("HTTP 500".to_string())),
            ("en-GB", Scripted::Upstream("HTTP 500".to_string())),
            ("default", Scripted::Upstream("video has no caption tracks".to_string())),
        ]));

        let err = fetch_with_fallback(&source, "dQw4w9WgXcQ").await.unwrap_err();
        match err {
            Error::NoCaptionsAvailable { last_error } => {
                assert!(
                    last_error.contains("video has no caption tracks"),
                    "last error: {last_error}"
                );
            }
            other => panic!("expected NoCaptionsAvailable, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_track_counts_as_failure() {
        let source = ScriptedSource::new(HashMap::from([
            ("en", Scripted::Segments(Vec::new())),
            ("en-US", long_segments()),
        ]));

        let segments = fetch_with_fallback(&source, "dQw4w9WgXcQ").await.unwrap();
        assert_eq!(segments.len(), 1);
        assert_eq!(source.calls(), vec!["en", "en-US"]);
    }
}
