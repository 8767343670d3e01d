use std::path::PathBuf;
use tempfile::TempDir;

use crate::audio::AudioDownloader;
use crate::captions::{self, WatchPageClient};
use crate::config::Config;
use crate::format::MarkdownFormatter;
use crate::output;
use crate::resolve;
use crate::speech::BatchSpeechClient;
use crate::transcript::TranscriptDocument;
use crate::{Error, Result};

/// What a completed run produced
#[derive(Debug)]
pub struct RunOutcome {
    pub video_id: String,
    pub transcript_path: PathBuf,
    pub metadata_path: Option<PathBuf>,
}

/// Sequential pipeline from video reference to written transcript.
///
/// One invocation processes one video to completion or failure; nothing
/// is shared across invocations and no partial progress survives one.
pub struct TranscriptPipeline {
    config: Config,
    temp_dir: TempDir,
}

impl TranscriptPipeline {
    pub fn new(config: Config) -> Result<Self> {
        let temp_dir = TempDir::new()?;
        Ok(Self { config, temp_dir })
    }

    /// Primary path, optionally chaining into the speech path when the
    /// video turns out to have no usable captions.
    pub async fn run(&self, input: &str, audio_fallback: bool) -> Result<RunOutcome> {
        match self.run_captions(input).await {
            Err(Error::NoCaptionsAvailable { last_error }) if audio_fallback => {
                tracing::warn!(
                    %last_error,
                    "no usable captions, falling back to audio transcription"
                );
                self.run_speech(input, self.config.app.keep_audio).await
            }
            other => other,
        }
    }

    /// Captions path: resolve, fetch with language fallback, normalize,
    /// format, write.
    pub async fn run_captions(&self, input: &str) -> Result<RunOutcome> {
        let video_id = resolve::video_id(input)?;
        let source_url = resolve::watch_url(&video_id);
        tracing::info!(%video_id, "starting caption transcription");

        let source = WatchPageClient::new()?;
        let raw = captions::fetch_with_fallback(&source, &video_id).await?;

        let document = TranscriptDocument::from_captions(&video_id, &source_url, &raw)?;
        tracing::info!(
            segments = document.segment_count,
            duration_seconds = document.total_duration_seconds,
            "transcript assembled"
        );

        let formatter = MarkdownFormatter::new(
            self.config.gemini_api_key()?.to_string(),
            self.config.google.gemini_model.clone(),
        )?;
        let markdown = formatter
            .format_transcript(&document, &document.timestamped_text())
            .await?;

        let root = &self.config.app.output_root;
        let transcript_path = output::write_transcript(root, &video_id, &markdown)?;
        let metadata_path = output::write_metadata(root, &video_id, &source_url, markdown.len())?;

        Ok(RunOutcome {
            video_id,
            transcript_path,
            metadata_path: Some(metadata_path),
        })
    }

    /// Alternate path: resolve, download audio, batch-recognize, write.
    pub async fn run_speech(&self, input: &str, keep_audio: bool) -> Result<RunOutcome> {
        let video_id = resolve::video_id(input)?;
        let source_url = resolve::watch_url(&video_id);
        tracing::info!(%video_id, "starting audio transcription");

        let staged_audio = self.temp_dir.path().join(format!("{video_id}.mp3"));
        AudioDownloader::new()
            .download_audio(&source_url, &staged_audio)
            .await?;

        let client = BatchSpeechClient::new(&self.config).await?;
        let result = client.transcribe_file(&staged_audio).await?;

        // Artifacts are keyed by the audio's resting place, whether or
        // not the audio itself is kept.
        let root = &self.config.app.output_root;
        let audio_target = output::transcript_dir(root, &video_id).join("audio.mp3");
        if keep_audio {
            if let Some(parent) = audio_target.parent() {
                fs_err::create_dir_all(parent)?;
            }
            fs_err::copy(&staged_audio, &audio_target)?;
            tracing::info!(path = %audio_target.display(), "audio preserved");
        }

        let transcript_path = output::write_speech_result(&audio_target, &result)?;

        Ok(RunOutcome {
            video_id,
            transcript_path,
            metadata_path: None,
        })
    }
}
