use base64::Engine;
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::sleep;
use uuid::Uuid;

use crate::config::Config;
use crate::{Error, Result};

pub mod auth;
pub mod results;
pub mod storage;

pub use results::SpeechSegment;

use storage::StorageClient;

/// Hard payload ceiling of the inline recognition endpoint; anything
/// larger must be staged in object storage before submission.
pub const INLINE_LIMIT_BYTES: u64 = 10 * 1024 * 1024;

const SPEECH_API: &str = "https://speech.googleapis.com/v1";
const HEARTBEAT_EVERY_POLLS: u32 = 4;

/// How the audio reaches the recognizer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitRoute {
    /// Base64-encoded in the request body
    Inline,
    /// Uploaded to object storage, submitted by reference
    ObjectStorage,
}

impl SubmitRoute {
    /// Choosing the wrong route fails outright at the service, so the
    /// branch happens up front on file size.
    pub fn for_size(bytes: u64) -> Self {
        if bytes <= INLINE_LIMIT_BYTES {
            SubmitRoute::Inline
        } else {
            SubmitRoute::ObjectStorage
        }
    }
}

/// Completed batch recognition output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechTranscription {
    /// Segment texts joined with single spaces
    pub transcript: String,

    /// Ordered, contiguous segments
    pub segments: Vec<SpeechSegment>,

    /// Last segment's end time, 0 for empty results
    pub total_duration_seconds: f64,
}

/// Client for the long-running batch recognition flow
pub struct BatchSpeechClient {
    http: reqwest::Client,
    token: String,
    project_id: String,
    bucket: String,
    poll_interval: Duration,
    deadline: Duration,
    output_root: PathBuf,
}

impl BatchSpeechClient {
    /// Build a client, exchanging credentials for a bearer token up front
    pub async fn new(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder().build()?;
        let token = auth::access_token(&http, &config.google).await?;

        let project_id = config
            .google
            .project_id
            .clone()
            .ok_or_else(|| Error::Config("google.project_id is not set".to_string()))?;
        let bucket = config
            .google
            .storage_bucket
            .clone()
            .ok_or_else(|| Error::Config("google.storage_bucket is not set".to_string()))?;

        Ok(Self {
            http,
            token,
            project_id,
            bucket,
            poll_interval: Duration::from_secs(config.app.poll_interval_secs),
            deadline: Duration::from_secs(config.app.operation_deadline_secs),
            output_root: config.app.output_root.clone(),
        })
    }

    /// Transcribe a local audio file end to end: route, submit, poll,
    /// extract.
    pub async fn transcribe_file(&self, audio_path: &Path) -> Result<SpeechTranscription> {
        let bytes = fs_err::read(audio_path)?;
        let size = bytes.len() as u64;
        let route = SubmitRoute::for_size(size);
        tracing::info!(bytes = size, ?route, "submitting audio for batch recognition");

        let mut staged_object: Option<String> = None;
        let audio_payload = match route {
            SubmitRoute::Inline => {
                json!({ "content": base64::engine::general_purpose::STANDARD.encode(&bytes) })
            }
            SubmitRoute::ObjectStorage => {
                let storage = StorageClient::new(self.http.clone(), self.token.clone());
                storage.ensure_bucket(&self.project_id, &self.bucket).await?;

                let object_name = format!(
                    "audio_{}_{}.mp3",
                    Uuid::new_v4(),
                    chrono::Utc::now().format("%Y%m%d_%H%M%S")
                );
                let uri = storage
                    .upload_object(&self.bucket, &object_name, bytes, "audio/mpeg")
                    .await?;
                staged_object = Some(object_name);
                json!({ "uri": uri })
            }
        };

        let operation_name = self.submit(audio_payload).await?;
        let payload = self.poll_operation(&operation_name).await?;

        // The staged blob is only needed while the job runs
        if let Some(object_name) = staged_object {
            let storage = StorageClient::new(self.http.clone(), self.token.clone());
            storage.delete_object(&self.bucket, &object_name).await?;
        }

        let segments = match results::extract_segments(&payload) {
            Some(segments) => segments,
            None => {
                let dump_path = crate::output::dump_debug_payload(&self.output_root, &payload)?;
                return Err(Error::UnparseableResponse { dump_path });
            }
        };

        let total_duration_seconds = segments.last().map(|s| s.end).unwrap_or(0.0);
        let transcript = results::concatenated_transcript(&segments);

        Ok(SpeechTranscription {
            transcript,
            segments,
            total_duration_seconds,
        })
    }

    /// Submit the job; returns the opaque operation handle immediately
    async fn submit(&self, audio_payload: Value) -> Result<String> {
        let body = json!({
            "config": {
                "encoding": "MP3",
                "languageCode": "en-US",
            },
            "audio": audio_payload,
        });

        let response = self
            .http
            .post(format!("{SPEECH_API}/speech:longrunningrecognize"))
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(Error::UpstreamService {
                service: "speech",
                message: format!("job submission returned HTTP {status}: {text}"),
            });
        }

        let submitted: Value = response.json().await?;
        submitted
            .get("name")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| Error::UpstreamService {
                service: "speech",
                message: "job submission response carried no operation name".to_string(),
            })
    }

    /// Poll the operation handle until completion or the deadline.
    ///
    /// Fixed cadence, heartbeat log every fourth poll. Exhausting the
    /// deadline is an error, not an endless loop.
    async fn poll_operation(&self, name: &str) -> Result<Value> {
        let progress = ProgressBar::new_spinner();
        progress.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap(),
        );
        progress.set_message("Waiting for batch recognition...");

        let start = std::time::Instant::now();
        let mut poll_count: u32 = 0;

        loop {
            if start.elapsed() > self.deadline {
                progress.finish_with_message("Recognition timed out");
                return Err(Error::OperationTimeout {
                    name: name.to_string(),
                    deadline_secs: self.deadline.as_secs(),
                });
            }

            let response = self
                .http
                .get(format!("{SPEECH_API}/operations/{name}"))
                .bearer_auth(&self.token)
                .send()
                .await?;

            if !response.status().is_success() {
                progress.finish_with_message("Recognition failed");
                return Err(Error::UpstreamService {
                    service: "speech",
                    message: format!("operation status returned HTTP {}", response.status()),
                });
            }

            let operation: Value = response.json().await?;

            if let Some(error) = operation.get("error") {
                progress.finish_with_message("Recognition failed");
                return Err(Error::UpstreamService {
                    service: "speech",
                    message: format!("operation failed: {error}"),
                });
            }

            if operation.get("done").and_then(Value::as_bool) == Some(true) {
                progress.finish_with_message("Recognition completed");
                // Older responses used `result` in place of `response`
                let payload = operation
                    .get("response")
                    .or_else(|| operation.get("result"))
                    .cloned()
                    .unwrap_or_else(|| operation.clone());
                return Ok(payload);
            }

            poll_count += 1;
            progress.set_message(format!(
                "Recognizing... ({}s elapsed, poll #{})",
                start.elapsed().as_secs(),
                poll_count
            ));
            if poll_count % HEARTBEAT_EVERY_POLLS == 0 {
                tracing::info!(
                    operation = name,
                    elapsed_secs = start.elapsed().as_secs(),
                    "batch recognition still running"
                );
            }

            sleep(self.poll_interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_limit_boundary() {
        assert_eq!(SubmitRoute::for_size(0), SubmitRoute::Inline);
        assert_eq!(SubmitRoute::for_size(INLINE_LIMIT_BYTES), SubmitRoute::Inline);
        assert_eq!(
            SubmitRoute::for_size(INLINE_LIMIT_BYTES + 1),
            SubmitRoute::ObjectStorage
        );
    }
}
