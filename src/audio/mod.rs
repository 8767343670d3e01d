use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

use crate::{Error, Result};

/// Audio downloader shelling out to yt-dlp
pub struct AudioDownloader {
    yt_dlp_path: String,
}

impl AudioDownloader {
    pub fn new() -> Self {
        Self {
            yt_dlp_path: "yt-dlp".to_string(),
        }
    }

    /// Check if yt-dlp is available
    pub async fn check_availability(&self) -> bool {
        Command::new(&self.yt_dlp_path)
            .arg("--version")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map(|output| output.status.success())
            .unwrap_or(false)
    }

    /// Download a video's audio track as mp3 to `output_path`.
    ///
    /// yt-dlp handles format selection and conversion itself; low audio
    /// quality is plenty for recognition and much faster to fetch.
    pub async fn download_audio(&self, url: &str, output_path: &Path) -> Result<()> {
        if !self.check_availability().await {
            return Err(Error::AudioDownload(
                "yt-dlp is not available; install it from https://github.com/yt-dlp/yt-dlp"
                    .to_string(),
            ));
        }

        tracing::info!(%url, path = %output_path.display(), "downloading audio");

        let progress = ProgressBar::new_spinner();
        progress.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap(),
        );
        progress.set_message("Downloading audio with yt-dlp...");

        let output = Command::new(&self.yt_dlp_path)
            .args([
                "--output",
                &output_path.to_string_lossy(),
                "--extract-audio",
                "--audio-format",
                "mp3",
                "--audio-quality",
                "9",
                "--format",
                "worstaudio[acodec^=mp4a]/worstaudio[ext=m4a]/worstaudio[ext=mp3]/worstaudio",
                "--no-playlist",
                "--no-warnings",
                "--newline",
                url,
            ])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            progress.finish_with_message("Download failed");
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::AudioDownload(stderr.trim().to_string()));
        }

        progress.finish_with_message("Download complete");
        Ok(())
    }
}

impl Default for AudioDownloader {
    fn default() -> Self {
        Self::new()
    }
}
