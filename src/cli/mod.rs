use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "tubescribe",
    about = "Turn YouTube videos into structured markdown transcripts",
    version,
    long_about = "Fetches a video's captions (falling back across languages), reformats them \
into clean markdown with Gemini, and writes the result to disk. Videos without captions can \
be transcribed from audio via Google Cloud Speech batch recognition."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Transcribe a video from its captions
    Transcribe {
        /// Video URL or bare 11-character video id
        #[arg(value_name = "URL_OR_ID")]
        input: String,

        /// Fall back to audio transcription when the video has no captions
        #[arg(long)]
        audio_fallback: bool,

        /// Override the output root directory
        #[arg(short, long, value_name = "DIR", env = "TUBESCRIBE_OUTPUT_ROOT")]
        output_root: Option<std::path::PathBuf>,
    },

    /// Transcribe a video from its audio via batch speech recognition
    Audio {
        /// Video URL or bare 11-character video id
        #[arg(value_name = "URL_OR_ID")]
        input: String,

        /// Keep the downloaded audio file next to the transcript
        #[arg(long)]
        keep_audio: bool,
    },

    /// Show or initialize the configuration file
    Config {
        /// Show current configuration
        #[arg(short, long)]
        show: bool,
    },
}
