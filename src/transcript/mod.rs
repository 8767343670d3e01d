use serde::{Deserialize, Serialize};

use crate::captions::CaptionSegment;
use crate::{Error, Result};

/// One caption segment converted to seconds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedSegment {
    /// Segment text as supplied by the captioning service
    pub text: String,

    /// Start time in seconds
    pub timestamp_seconds: f64,

    /// Duration in seconds
    pub duration_seconds: f64,
}

/// The assembled transcript handed to the formatter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptDocument {
    /// Canonical 11-character video id
    pub video_id: String,

    /// URL the transcript was derived from
    pub source_url: String,

    /// Last segment's timestamp plus its duration
    pub total_duration_seconds: f64,

    /// Number of caption segments folded in
    pub segment_count: usize,

    /// Normalized segments in upstream order
    pub segments: Vec<NormalizedSegment>,
}

impl TranscriptDocument {
    /// Normalize raw caption segments (milliseconds) into a document.
    ///
    /// Every segment must carry both timing fields; a missing field is a
    /// hard stop identifying the offending index. Segment order is
    /// trusted as chronological and never re-sorted, so the total
    /// duration comes from the final segment alone.
    pub fn from_captions(
        video_id: &str,
        source_url: &str,
        raw: &[CaptionSegment],
    ) -> Result<Self> {
        let mut segments = Vec::with_capacity(raw.len());

        for (index, segment) in raw.iter().enumerate() {
            let (offset_ms, duration_ms) = match (segment.offset_ms, segment.duration_ms) {
                (Some(offset), Some(duration)) => (offset, duration),
                _ => return Err(Error::MalformedSegment { index }),
            };

            segments.push(NormalizedSegment {
                text: segment.text.clone(),
                timestamp_seconds: offset_ms as f64 / 1000.0,
                duration_seconds: duration_ms as f64 / 1000.0,
            });
        }

        let total_duration_seconds = segments
            .last()
            .map(|s| s.timestamp_seconds + s.duration_seconds)
            .unwrap_or(0.0);

        Ok(Self {
            video_id: video_id.to_string(),
            source_url: source_url.to_string(),
            total_duration_seconds,
            segment_count: segments.len(),
            segments,
        })
    }

    /// Segment texts joined with single spaces, no timestamps
    pub fn joined_text(&self) -> String {
        self.segments
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// One `[timestamp] text` line per segment
    pub fn timestamped_text(&self) -> String {
        self.segments
            .iter()
            .map(|s| format!("[{}] {}", format_timestamp(s.timestamp_seconds), s.text))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Render seconds as `M:SS` under an hour, `H:MM:SS` otherwise.
///
/// Minutes and seconds are zero-padded to two digits; the leading unit
/// never is (`0:45`, `2:05`, `1:02:05`).
pub fn format_timestamp(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(text: &str, offset_ms: u64, duration_ms: u64) -> CaptionSegment {
        CaptionSegment {
            text: text.to_string(),
            offset_ms: Some(offset_ms),
            duration_ms: Some(duration_ms),
        }
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0.0), "0:00");
        assert_eq!(format_timestamp(45.0), "0:45");
        assert_eq!(format_timestamp(125.0), "2:05");
        assert_eq!(format_timestamp(3725.0), "1:02:05");
    }

    #[test]
    fn test_normalize_two_segments() {
        let doc = TranscriptDocument::from_captions(
            "dQw4w9WgXcQ",
            "https://youtu.be/dQw4w9WgXcQ",
            &[raw("a", 0, 1000), raw("b", 1000, 1000)],
        )
        .unwrap();

        assert_eq!(doc.total_duration_seconds, 2.0);
        assert_eq!(doc.segment_count, 2);
        assert_eq!(format_timestamp(doc.segments[0].timestamp_seconds), "0:00");
        assert_eq!(format_timestamp(doc.segments[1].timestamp_seconds), "0:01");
    }

    #[test]
    fn test_missing_timing_is_fatal() {
        let mut segments = vec![raw("ok", 0, 500)];
        segments.push(CaptionSegment {
            text: "broken".to_string(),
            offset_ms: Some(500),
            duration_ms: None,
        });

        let err = TranscriptDocument::from_captions("id", "url", &segments).unwrap_err();
        assert!(matches!(err, Error::MalformedSegment { index: 1 }));
    }

    #[test]
    fn test_empty_input_yields_zero_duration() {
        let doc = TranscriptDocument::from_captions("id", "url", &[]).unwrap();
        assert_eq!(doc.total_duration_seconds, 0.0);
        assert_eq!(doc.segment_count, 0);
        assert_eq!(doc.joined_text(), "");
    }

    #[test]
    fn test_joined_text_uses_single_spaces() {
        let doc = TranscriptDocument::from_captions(
            "id",
            "url",
            &[raw("hello", 0, 1000), raw("world", 1000, 1000)],
        )
        .unwrap();
        assert_eq!(doc.joined_text(), "hello world");
    }

    #[test]
    fn test_timestamped_text_lines() {
        let doc = TranscriptDocument::from_captions(
            "id",
            "url",
            &[raw("intro", 0, 45_000), raw("main point", 125_000, 5000)],
        )
        .unwrap();
        assert_eq!(doc.timestamped_text(), "[0:00] intro\n[2:05] main point");
    }
}
