use config::{Config, ConfigError, Environment};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub google_client_id: String,
    pub google_client_secret: String,
    pub google_token_uri: String,
    pub google_tokeninfo_uri: String,
    pub google_userinfo_uri: String,
    pub google_revoke_uri: String,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("google_token_uri", "https://oauth2.googleapis.com/token")?
            .set_default(
                "google_tokeninfo_uri",
                "https://www.googleapis.com/oauth2/v1/tokeninfo",
            )?
            .set_default(
                "google_userinfo_uri",
                "https://www.googleapis.com/oauth2/v1/userinfo",
            )?
            .set_default(
                "google_revoke_uri",
                "https://accounts.google.com/o/oauth2/revoke",
            )?
            .add_source(Environment::default())
            .build()?
            .try_deserialize()
    }
}
