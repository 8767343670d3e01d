use serde_json::{json, Value};
use std::path::{Path, PathBuf};

use crate::speech::SpeechTranscription;
use crate::Result;

const TRANSCRIPT_FILE: &str = "transcript.md";
const METADATA_FILE: &str = "metadata.json";
const DEBUG_DUMP_FILE: &str = "last-batch-response.json";

/// Directory holding all artifacts for one video
pub fn transcript_dir(output_root: &Path, video_id: &str) -> PathBuf {
    output_root.join(video_id)
}

/// Write the formatted markdown verbatim to
/// `{root}/{videoId}/transcript.md`, creating directories as needed and
/// overwriting any previous run.
pub fn write_transcript(output_root: &Path, video_id: &str, markdown: &str) -> Result<PathBuf> {
    let dir = transcript_dir(output_root, video_id);
    fs_err::create_dir_all(&dir)?;

    let path = dir.join(TRANSCRIPT_FILE);
    fs_err::write(&path, markdown)?;
    tracing::info!(path = %path.display(), bytes = markdown.len(), "transcript written");

    Ok(path)
}

/// Write `{root}/{videoId}/metadata.json` describing the run
pub fn write_metadata(
    output_root: &Path,
    video_id: &str,
    source_url: &str,
    byte_size: usize,
) -> Result<PathBuf> {
    let dir = transcript_dir(output_root, video_id);
    fs_err::create_dir_all(&dir)?;

    let metadata = json!({
        "videoId": video_id,
        "sourceUrl": source_url,
        "downloadedAt": chrono::Utc::now().to_rfc3339(),
        "bytes": byte_size,
    });

    let path = dir.join(METADATA_FILE);
    fs_err::write(&path, serde_json::to_string_pretty(&metadata)?)?;

    Ok(path)
}

/// Write the speech-path result next to the audio file, as
/// `{audioStem}-transcript.json`
pub fn write_speech_result(audio_path: &Path, result: &SpeechTranscription) -> Result<PathBuf> {
    let stem = audio_path.with_extension("");
    let path = PathBuf::from(format!("{}-transcript.json", stem.display()));

    let payload = json!({
        "audioPath": audio_path.display().to_string(),
        "totalDurationSeconds": result.total_duration_seconds,
        "segments": result.segments,
        "transcript": result.transcript,
        "completedAt": chrono::Utc::now().to_rfc3339(),
    });

    if let Some(parent) = path.parent() {
        fs_err::create_dir_all(parent)?;
    }
    fs_err::write(&path, serde_json::to_string_pretty(&payload)?)?;
    tracing::info!(path = %path.display(), "speech transcript written");

    Ok(path)
}

/// Persist a raw upstream payload for postmortem before failing.
///
/// One fixed path per root; a later failure overwrites an earlier dump.
pub fn dump_debug_payload(output_root: &Path, payload: &Value) -> Result<PathBuf> {
    let dir = output_root.join("debug");
    fs_err::create_dir_all(&dir)?;

    let path = dir.join(DEBUG_DUMP_FILE);
    fs_err::write(&path, serde_json::to_string_pretty(payload)?)?;
    tracing::warn!(path = %path.display(), "raw batch payload saved for diagnosis");

    Ok(path)
}
