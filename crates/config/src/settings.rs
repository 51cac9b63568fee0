use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub app: AppSettings,
    pub oauth: OAuthSettings,
    pub graph: GraphSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppSettings {
    pub host: String,
    pub port: u16,
    pub base_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OAuthSettings {
    pub client_id: String,
    pub client_secret: String,
    /// Explicit callback URL. When unset the callback URL is derived from
    /// the Host header of the incoming request.
    pub redirect_uri: Option<String>,
    pub scopes: String,
    pub authorize_url: String,
    pub token_url: String,
    pub retry_max_attempts: u32,
    pub retry_base_delay_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GraphSettings {
    pub base_url: String,
    /// Timeout applied to the identity and profile-photo fetches.
    pub user_fetch_timeout_secs: u64,
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(
                Environment::default()
                    .separator("__")
                    .prefix("DRIVEVIEW"),
            )
            .set_default("app.host", "0.0.0.0")?
            .set_default("app.port", 3000)?
            .set_default("app.base_url", "http://localhost:3000")?
            .set_default("oauth.client_id", "")?
            .set_default("oauth.client_secret", "")?
            .set_default("oauth.redirect_uri", None::<String>)?
            .set_default("oauth.scopes", "files.read,files.read.all,sites.read.all")?
            .set_default(
                "oauth.authorize_url",
                "https://login.microsoftonline.com/common/oauth2/v2.0/authorize",
            )?
            .set_default(
                "oauth.token_url",
                "https://login.microsoftonline.com/common/oauth2/v2.0/token",
            )?
            .set_default("oauth.retry_max_attempts", 3)?
            .set_default("oauth.retry_base_delay_ms", 1000)?
            .set_default("graph.base_url", "https://graph.microsoft.com/v1.0")?
            .set_default("graph.user_fetch_timeout_secs", 10)?
            .build()?;

        config.try_deserialize()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::load().expect("Failed to load default settings")
    }
}
