use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use super::{CaptionSegment, CaptionSource};
use crate::{Error, Result};

/// A desktop browser user agent; the watch page serves different markup
/// to unknown clients.
const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko)";

/// Caption client backed by the public watch page.
///
/// Fetches the page HTML, lifts the embedded player response JSON out of
/// it, picks the caption track for the requested language, and downloads
/// that track's timed text in `json3` form.
pub struct WatchPageClient {
    http: reqwest::Client,
}

impl WatchPageClient {
    pub fn new() -> Result<Self> {
        let http = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self { http })
    }

    async fn player_response(&self, video_id: &str) -> Result<Value> {
        let url = crate::resolve::watch_url(video_id);
        tracing::debug!(%url, "fetching watch page");

        let response = self.http.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(Error::UpstreamService {
                service: "youtube",
                message: format!("watch page returned HTTP {}", response.status()),
            });
        }

        let html = response.text().await?;
        let json = extract_player_json(&html).ok_or_else(|| Error::UpstreamService {
            service: "youtube",
            message: "player data not found in watch page".to_string(),
        })?;

        Ok(serde_json::from_str(json)?)
    }
}

#[async_trait]
impl CaptionSource for WatchPageClient {
    async fn fetch_captions(
        &self,
        video_id: &str,
        language: Option<&str>,
    ) -> Result<Vec<CaptionSegment>> {
        let player = self.player_response(video_id).await?;

        let base_url = select_track(&player, language).ok_or_else(|| Error::UpstreamService {
            service: "youtube",
            message: match language {
                Some(lang) => format!("no caption track for language '{lang}'"),
                None => "video has no caption tracks".to_string(),
            },
        })?;

        let timed_text_url = timed_text_url(base_url)?;
        let response = self.http.get(timed_text_url).send().await?;
        if !response.status().is_success() {
            return Err(Error::UpstreamService {
                service: "youtube",
                message: format!("timed text returned HTTP {}", response.status()),
            });
        }

        let body = response.text().await?;
        parse_timed_text(&body)
    }
}

/// Ask the track URL for `json3`, which carries explicit millisecond
/// offsets unlike the default XML
fn timed_text_url(base_url: &str) -> Result<url::Url> {
    let mut parsed = url::Url::parse(base_url).map_err(|e| Error::UpstreamService {
        service: "youtube",
        message: format!("caption track URL is unusable: {e}"),
    })?;
    parsed.query_pairs_mut().append_pair("fmt", "json3");
    Ok(parsed)
}

/// Locate the `ytInitialPlayerResponse` object inside the watch page HTML
fn extract_player_json(html: &str) -> Option<&str> {
    let start_marker = "ytInitialPlayerResponse = ";
    let end_marker = ";</script>";

    html.find(start_marker).map(|start_idx| {
        let start_pos = start_idx + start_marker.len();
        let sub_str = &html[start_pos..];
        let end_pos = sub_str.find(end_marker).unwrap_or(sub_str.len());
        &sub_str[..end_pos]
    })
}

/// Pick the caption track matching `language`, or the first track when no
/// language is requested. Returns the track's timed-text base URL.
fn select_track<'a>(player: &'a Value, language: Option<&str>) -> Option<&'a str> {
    let tracks = player
        .get("captions")?
        .get("playerCaptionsTracklistRenderer")?
        .get("captionTracks")?
        .as_array()?;

    let track = match language {
        Some(lang) => tracks
            .iter()
            .find(|t| t.get("languageCode").and_then(Value::as_str) == Some(lang))?,
        None => tracks.first()?,
    };

    track.get("baseUrl").and_then(Value::as_str)
}

#[derive(Debug, Deserialize)]
struct TimedText {
    #[serde(default)]
    events: Vec<TimedTextEvent>,
}

#[derive(Debug, Deserialize)]
struct TimedTextEvent {
    #[serde(rename = "tStartMs")]
    start_ms: Option<u64>,
    #[serde(rename = "dDurationMs")]
    duration_ms: Option<u64>,
    #[serde(default)]
    segs: Vec<TimedTextRun>,
}

#[derive(Debug, Deserialize)]
struct TimedTextRun {
    #[serde(default)]
    utf8: String,
}

/// Convert a `json3` timed-text body into raw caption segments.
///
/// Window-styling events carry no text runs and are skipped; everything
/// else is kept in upstream order, timing fields passed through untouched.
fn parse_timed_text(body: &str) -> Result<Vec<CaptionSegment>> {
    let timed_text: TimedText = serde_json::from_str(body)?;

    let segments = timed_text
        .events
        .into_iter()
        .filter(|event| !event.segs.is_empty())
        .map(|event| {
            let text = event
                .segs
                .iter()
                .map(|run| run.utf8.as_str())
                .collect::<String>()
                .replace('\n', " ")
                .trim()
                .to_string();

            CaptionSegment {
                text,
                offset_ms: event.start_ms,
                duration_ms: event.duration_ms,
            }
        })
        .collect();

    Ok(segments)
}
