use crate::settings::Settings;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub(crate) enum ProviderError {
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),
    #[error("Identity provider answered with status {0}")]
    Rejected(u16),
    #[error("Couldn't validate identity token")]
    InvalidIdToken,
}

/// Result of upgrading an authorization code.
#[derive(Debug, Clone)]
pub(crate) struct Credentials {
    pub(crate) access_token: String,
    /// Subject of the signed ID token issued alongside the access token.
    pub(crate) subject: String,
}

/// Token introspection answer. Google reports problems in `error` rather
/// than through the HTTP status alone.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct TokenInfo {
    pub(crate) error: Option<String>,
    pub(crate) user_id: Option<String>,
    pub(crate) issued_to: Option<String>,
    pub(crate) audience: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Profile {
    pub(crate) name: String,
    pub(crate) email: String,
    #[serde(default)]
    pub(crate) picture: String,
}

/// An OAuth2 identity provider able to verify who is signing in.
#[rocket::async_trait]
pub(crate) trait IdentityProvider: Send + Sync {
    async fn exchange_code(&self, code: &str) -> Result<Credentials, ProviderError>;

    async fn token_info(&self, access_token: &str) -> Result<TokenInfo, ProviderError>;

    async fn user_info(&self, access_token: &str) -> Result<Profile, ProviderError>;

    /// Revokes the access token at the provider.
    async fn revoke(&self, access_token: &str) -> Result<(), ProviderError>;
}

pub(crate) struct GoogleProvider {
    client: Client,
    client_id: String,
    client_secret: String,
    token_uri: String,
    tokeninfo_uri: String,
    userinfo_uri: String,
    revoke_uri: String,
}

impl GoogleProvider {
    pub(crate) fn new(settings: &Settings) -> Self {
        Self {
            client: Client::new(),
            client_id: settings.google_client_id.clone(),
            client_secret: settings.google_client_secret.clone(),
            token_uri: settings.google_token_uri.clone(),
            tokeninfo_uri: settings.google_tokeninfo_uri.clone(),
            userinfo_uri: settings.google_userinfo_uri.clone(),
            revoke_uri: settings.google_revoke_uri.clone(),
        }
    }
}

#[derive(Serialize)]
struct CodeExchange<'a> {
    code: &'a str,
    client_id: &'a str,
    client_secret: &'a str,
    redirect_uri: &'a str,
    grant_type: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    id_token: String,
}

#[derive(Debug, Deserialize)]
struct IdTokenClaims {
    sub: String,
}

#[rocket::async_trait]
impl IdentityProvider for GoogleProvider {
    async fn exchange_code(&self, code: &str) -> Result<Credentials, ProviderError> {
        // The sign-in button uses the popup flow, which has no redirect URI.
        let payload = CodeExchange {
            code,
            client_id: &self.client_id,
            client_secret: &self.client_secret,
            redirect_uri: "postmessage",
            grant_type: "authorization_code",
        };

        let response = self
            .client
            .post(&self.token_uri)
            .form(&payload)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ProviderError::Rejected(response.status().as_u16()));
        }
        let tokens = response.json::<TokenResponse>().await?;

        let parser = jsonwebtoken_google::Parser::new(&self.client_id);
        let claims = parser
            .parse::<IdTokenClaims>(&tokens.id_token)
            .await
            .map_err(|_| ProviderError::InvalidIdToken)?;

        Ok(Credentials {
            access_token: tokens.access_token,
            subject: claims.sub,
        })
    }

    async fn token_info(&self, access_token: &str) -> Result<TokenInfo, ProviderError> {
        let info = self
            .client
            .get(&self.tokeninfo_uri)
            .query(&[("access_token", access_token)])
            .send()
            .await?
            .json::<TokenInfo>()
            .await?;
        Ok(info)
    }

    async fn user_info(&self, access_token: &str) -> Result<Profile, ProviderError> {
        let response = self
            .client
            .get(&self.userinfo_uri)
            .query(&[("access_token", access_token), ("alt", "json")])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ProviderError::Rejected(response.status().as_u16()));
        }
        Ok(response.json::<Profile>().await?)
    }

    async fn revoke(&self, access_token: &str) -> Result<(), ProviderError> {
        let response = self
            .client
            .get(&self.revoke_uri)
            .query(&[("token", access_token)])
            .send()
            .await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(ProviderError::Rejected(response.status().as_u16()))
        }
    }
}

/// In-process provider for tests. Codes look like `user:NAME`; a few names
/// trigger the failure paths.
#[cfg(test)]
pub(crate) struct FakeProvider {
    pub(crate) client_id: String,
}

#[cfg(test)]
impl FakeProvider {
    pub(crate) const CLIENT_ID: &'static str = "test-client.apps.googleusercontent.com";

    pub(crate) fn new() -> Self {
        Self {
            client_id: Self::CLIENT_ID.to_string(),
        }
    }
}

#[cfg(test)]
#[rocket::async_trait]
impl IdentityProvider for FakeProvider {
    async fn exchange_code(&self, code: &str) -> Result<Credentials, ProviderError> {
        let name = code.strip_prefix("user:").ok_or(ProviderError::Rejected(400))?;
        Ok(Credentials {
            access_token: format!("token-{}", name),
            subject: format!("sub-{}", name),
        })
    }

    async fn token_info(&self, access_token: &str) -> Result<TokenInfo, ProviderError> {
        let name = access_token.trim_start_matches("token-");
        let mut info = TokenInfo {
            error: None,
            user_id: Some(format!("sub-{}", name)),
            issued_to: Some(self.client_id.clone()),
            audience: Some(self.client_id.clone()),
        };
        match name {
            "provider-error" => info.error = Some("invalid_token".to_string()),
            "wrong-subject" => info.user_id = Some("sub-someone-else".to_string()),
            "wrong-client" => info.issued_to = Some("other-client".to_string()),
            "wrong-audience" => info.audience = Some("other-client".to_string()),
            "no-audience" => info.audience = None,
            _ => {}
        }
        Ok(info)
    }

    async fn user_info(&self, access_token: &str) -> Result<Profile, ProviderError> {
        let name = access_token.trim_start_matches("token-");
        if name == "no-profile" {
            return Err(ProviderError::Rejected(401));
        }
        Ok(Profile {
            name: name.to_string(),
            email: format!("{}@example.com", name),
            picture: format!("https://example.com/{}.png", name),
        })
    }

    async fn revoke(&self, access_token: &str) -> Result<(), ProviderError> {
        if access_token == "token-norevoke" {
            Err(ProviderError::Rejected(400))
        } else {
            Ok(())
        }
    }
}
