use driveview_config::OAuthSettings;
use rand::{Rng, distr::Alphanumeric};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum OAuthError {
    #[error("token endpoint returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("token request failed: {0}")]
    Network(#[from] reqwest::Error),
}

/// Token pair returned by the authorization-code exchange.
#[derive(Debug, Clone, Deserialize)]
pub struct OAuthTokens {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub expires_in: u64,
}

/// Authorization-code flow against the identity provider.
pub struct OAuthFlow {
    client: reqwest::Client,
    client_id: String,
    client_secret: String,
    authorize_endpoint: String,
    token_endpoint: String,
    scopes: String,
}

impl OAuthFlow {
    pub fn new(settings: &OAuthSettings) -> Self {
        Self {
            client: reqwest::Client::new(),
            client_id: settings.client_id.clone(),
            client_secret: settings.client_secret.clone(),
            authorize_endpoint: settings.authorize_url.clone(),
            token_endpoint: settings.token_url.clone(),
            scopes: settings.scopes.clone(),
        }
    }

    /// Random opaque state nonce for the authorization redirect.
    pub fn generate_state() -> String {
        rand::rng()
            .sample_iter(&Alphanumeric)
            .take(16)
            .map(char::from)
            .collect()
    }

    /// Provider authorization URL the user agent is redirected to.
    pub fn authorize_url(&self, redirect_uri: &str, state: &str) -> String {
        format!(
            "{}?client_id={}&response_type=code&redirect_uri={}&scope={}&state={}&response_mode=query",
            self.authorize_endpoint,
            self.client_id,
            urlencoding::encode(redirect_uri),
            urlencoding::encode(&self.scopes),
            state
        )
    }

    /// Exchanges an authorization code for a token pair. Server-to-server,
    /// form-encoded, carries the client secret (possibly empty for
    /// public-client registrations).
    pub async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<OAuthTokens, OAuthError> {
        debug!(endpoint = %self.token_endpoint, "exchanging authorization code");

        let resp = self
            .client
            .post(&self.token_endpoint)
            .form(&[
                ("grant_type", "authorization_code"),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("code", code),
                ("redirect_uri", redirect_uri),
            ])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(OAuthError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(resp.json().await?)
    }
}
