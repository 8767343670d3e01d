use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::{Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Google service configuration (Gemini, Speech, Storage, OAuth)
    pub google: GoogleConfig,

    /// Application settings
    pub app: AppConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleConfig {
    /// API key for the Gemini generateContent endpoint
    pub gemini_api_key: Option<String>,

    /// Gemini model used for markdown formatting
    pub gemini_model: String,

    /// Cloud project owning the speech and storage resources
    pub project_id: Option<String>,

    /// Bucket for staging audio files too large for inline submission
    pub storage_bucket: Option<String>,

    /// OAuth client for the speech pipeline
    pub oauth_client_id: Option<String>,
    pub oauth_client_secret: Option<String>,

    /// Refresh token obtained out of band
    pub refresh_token: Option<String>,

    /// Pre-issued access token; skips the refresh-token exchange
    pub access_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Root directory for written transcripts
    pub output_root: PathBuf,

    /// Keep the downloaded audio file after speech transcription
    pub keep_audio: bool,

    /// Seconds between operation status polls
    pub poll_interval_secs: u64,

    /// Deadline for a batch recognition operation
    pub operation_deadline_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            google: GoogleConfig {
                gemini_api_key: None,
                gemini_model: "gemini-2.0-flash".to_string(),
                project_id: None,
                storage_bucket: None,
                oauth_client_id: None,
                oauth_client_secret: None,
                refresh_token: None,
                access_token: None,
            },
            app: AppConfig {
                output_root: PathBuf::from("."),
                keep_audio: false,
                poll_interval_secs: 5,
                operation_deadline_secs: 1800,
            },
        }
    }
}

impl Config {
    /// Load configuration from file or create default
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        let mut config = if config_path.exists() {
            let content = fs_err::read_to_string(&config_path)?;
            serde_yaml::from_str(&content)
                .map_err(|e| Error::Config(format!("failed to parse {}: {e}", config_path.display())))?
        } else {
            let config = Self::default();
            config.save()?;
            config
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Environment wins over the file for the secrets people rotate most
    fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var("GEMINI_API_KEY") {
            if !key.trim().is_empty() {
                self.google.gemini_api_key = Some(key.trim().to_string());
            }
        }
        if let Ok(token) = std::env::var("GOOGLE_ACCESS_TOKEN") {
            if !token.trim().is_empty() {
                self.google.access_token = Some(token.trim().to_string());
            }
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            fs_err::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(self)
            .map_err(|e| Error::Config(format!("failed to serialize config: {e}")))?;
        fs_err::write(&config_path, content)?;

        Ok(())
    }

    /// Get configuration file path
    fn config_path() -> Result<PathBuf> {
        // A local config.yaml wins, for easy testing
        let local_config = PathBuf::from("config.yaml");
        if local_config.exists() {
            return Ok(local_config);
        }

        let config_dir = dirs::config_dir()
            .ok_or_else(|| Error::Config("could not determine config directory".to_string()))?;

        Ok(config_dir.join("tubescribe").join("config.yaml"))
    }

    /// The Gemini key, or a pointed error naming what to set
    pub fn gemini_api_key(&self) -> Result<&str> {
        self.google
            .gemini_api_key
            .as_deref()
            .ok_or_else(|| {
                Error::Config(
                    "google.gemini_api_key is not set (or export GEMINI_API_KEY)".to_string(),
                )
            })
    }

    /// Display current configuration, secrets elided
    pub fn display(&self) {
        println!("Current Configuration:");
        println!("  Gemini model: {}", self.google.gemini_model);
        println!(
            "  Gemini API key: {}",
            if self.google.gemini_api_key.is_some() { "set" } else { "not set" }
        );
        if let Some(project) = &self.google.project_id {
            println!("  Cloud project: {}", project);
        }
        if let Some(bucket) = &self.google.storage_bucket {
            println!("  Storage bucket: {}", bucket);
        }
        println!("  Output root: {}", self.app.output_root.display());
        println!("  Keep audio: {}", self.app.keep_audio);
        println!("  Poll interval: {}s", self.app.poll_interval_secs);
        println!("  Operation deadline: {}s", self.app.operation_deadline_secs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.app.output_root, PathBuf::from("."));
        assert_eq!(config.app.poll_interval_secs, 5);
        assert_eq!(config.app.operation_deadline_secs, 1800);
        assert!(config.google.gemini_api_key.is_none());
    }

    #[test]
    fn test_config_yaml_round_trip() {
        let mut config = Config::default();
        config.google.gemini_api_key = Some("test-key".to_string());
        config.app.output_root = PathBuf::from("/tmp/transcripts");

        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed: Config = serde_yaml::from_str(&yaml).unwrap();

        assert_eq!(parsed.google.gemini_api_key.as_deref(), Some("test-key"));
        assert_eq!(parsed.app.output_root, PathBuf::from("/tmp/transcripts"));
    }

    #[test]
    fn test_missing_gemini_key_error_names_the_setting() {
        let config = Config::default();
        let err = config.gemini_api_key().unwrap_err();
        assert!(err.to_string().contains("gemini_api_key"));
    }
}
