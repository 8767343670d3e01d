use serde::Deserialize;

use crate::config::GoogleConfig;
use crate::{Error, Result};

const TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Produce a bearer token for the speech and storage calls.
///
/// A pre-issued access token from configuration is used as-is; otherwise
/// the refresh token is exchanged at the Google token endpoint. The
/// interactive authorization-code flow happens outside this tool - only
/// its refresh token ever reaches us.
pub async fn access_token(http: &reqwest::Client, google: &GoogleConfig) -> Result<String> {
    if let Some(token) = &google.access_token {
        return Ok(token.clone());
    }

    let (client_id, client_secret, refresh_token) = match (
        &google.oauth_client_id,
        &google.oauth_client_secret,
        &google.refresh_token,
    ) {
        (Some(id), Some(secret), Some(refresh)) => (id, secret, refresh),
        _ => {
            return Err(Error::Config(
                "speech transcription needs google.access_token, or google.oauth_client_id + \
                 google.oauth_client_secret + google.refresh_token"
                    .to_string(),
            ))
        }
    };

    tracing::debug!("exchanging refresh token for access token");

    let params = [
        ("client_id", client_id.as_str()),
        ("client_secret", client_secret.as_str()),
        ("refresh_token", refresh_token.as_str()),
        ("grant_type", "refresh_token"),
    ];

    let response = http.post(TOKEN_ENDPOINT).form(&params).send().await?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(Error::UpstreamService {
            service: "oauth",
            message: format!("token exchange returned HTTP {status}: {body}"),
        });
    }

    let token: TokenResponse = response.json().await?;
    Ok(token.access_token)
}
