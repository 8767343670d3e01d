//! Tubescribe - turn YouTube videos into structured markdown transcripts
//!
//! This library fetches timed captions for a video (falling back across
//! languages), normalizes them into a transcript document, reformats the
//! text into markdown with the Gemini API, and writes the result to disk.
//! When a video has no captions at all, an alternate path downloads the
//! audio and runs it through Google Cloud Speech batch recognition.

pub mod audio;
pub mod captions;
pub mod cli;
pub mod config;
pub mod format;
pub mod output;
pub mod pipeline;
pub mod resolve;
pub mod speech;
pub mod transcript;

pub use cli::{Cli, Commands};
pub use config::Config;
pub use pipeline::TranscriptPipeline;
pub use transcript::{NormalizedSegment, TranscriptDocument};

use std::path::PathBuf;

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error taxonomy for the transcript pipeline
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Input was neither a recognized YouTube URL nor a bare video id
    #[error("unrecognized video URL or id: {0}")]
    InvalidIdentifier(String),

    /// Every caption language candidate was exhausted
    #[error("no usable captions for this video (last attempt: {last_error})")]
    NoCaptionsAvailable { last_error: String },

    /// Upstream returned a caption segment missing its timing fields
    #[error("caption segment {index} is missing offset or duration")]
    MalformedSegment { index: usize },

    /// The model returned no text-bearing candidate
    #[error("model returned an empty response")]
    EmptyResponse,

    /// The model returned text too short to be a real transcript
    #[error("model output is only {length} characters; expected at least {minimum}")]
    DegenerateResponse { length: usize, minimum: usize },

    /// The transcript does not fit the model's input window
    #[error("transcript exceeds the model input capacity: {0}")]
    ContentTooLarge(String),

    /// A network dependency answered with a non-success status
    #[error("{service} request failed: {message}")]
    UpstreamService {
        service: &'static str,
        message: String,
    },

    /// The batch recognition payload matched none of the known shapes
    #[error("unrecognized batch response shape; raw payload saved to {dump_path}")]
    UnparseableResponse { dump_path: PathBuf },

    /// The long-running operation outlived its deadline
    #[error("operation {name} did not complete within {deadline_secs}s")]
    OperationTimeout { name: String, deadline_secs: u64 },

    /// Audio download tooling failed or is unavailable
    #[error("audio download failed: {0}")]
    AudioDownload(String),

    /// A required configuration value is missing or invalid
    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
