//! OAuth client-credentials grant, used when no access token is configured.

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

use crate::error::{ApiError, Result};

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

/// Exchange an OAuth consumer key/secret for a bearer token.
pub async fn client_credentials_token(
    token_url: &str,
    client_id: &str,
    client_secret: &str,
) -> Result<String> {
    let client = Client::builder()
        .user_agent(format!("bitbucket-admin/{}", env!("CARGO_PKG_VERSION")))
        .build()?;

    let response = client
        .post(token_url)
        .basic_auth(client_id, Some(client_secret))
        .form(&[("grant_type", "client_credentials")])
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(match status {
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                ApiError::AuthenticationFailed {
                    status: status.as_u16(),
                    message,
                }
            }
            _ => ApiError::ServerError {
                status: status.as_u16(),
                message,
            },
        });
    }

    let token: TokenResponse = response
        .json()
        .await
        .map_err(|e| ApiError::InvalidResponse(e.to_string()))?;
    debug!(expires_in = token.expires_in, "Access token minted");
    Ok(token.access_token)
}
