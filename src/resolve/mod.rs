use regex::Regex;

use crate::{Error, Result};

/// URL patterns tried in priority order; the first capture wins.
const URL_PATTERNS: &[&str] = &[
    r"youtube\.com/watch\?.*v=([a-zA-Z0-9_-]{11})",
    r"youtu\.be/([a-zA-Z0-9_-]{11})",
    r"youtube\.com/embed/([a-zA-Z0-9_-]{11})",
    r"youtube\.com/shorts/([a-zA-Z0-9_-]{11})",
];

/// Extract the canonical 11-character video id from a URL or bare id.
///
/// Accepts the common YouTube URL forms (`watch?v=`, `youtu.be/`,
/// `embed/`, `shorts/`) as well as a bare id. A bare id is taken as-is;
/// whether it names a real video is not checked here. No network access.
pub fn video_id(input: &str) -> Result<String> {
    let input = input.trim();

    for pattern in URL_PATTERNS {
        let re = Regex::new(pattern).expect("URL pattern is a valid regex");
        if let Some(caps) = re.captures(input) {
            return Ok(caps[1].to_string());
        }
    }

    // Bare 11-character video id
    let bare = Regex::new(r"^[a-zA-Z0-9_-]{11}$").expect("id pattern is a valid regex");
    if bare.is_match(input) {
        return Ok(input.to_string());
    }

    Err(Error::InvalidIdentifier(input.to_string()))
}

/// Canonical watch URL for a resolved video id
pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={video_id}")
}
