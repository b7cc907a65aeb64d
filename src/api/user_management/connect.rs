use crate::api::user_management::provider::{Credentials, IdentityProvider, Profile};
use crate::api::user_management::sessions::Identity;
use crate::error::AuthError;

pub(crate) enum Verification {
    /// The session is already signed in as this subject.
    AlreadyConnected,
    Verified {
        credentials: Credentials,
        profile: Profile,
    },
}

/// Checks the anti-forgery token echoed by the browser against the one
/// stored for its session.
pub(crate) fn check_state(supplied: Option<&str>, stored: Option<&str>) -> Result<(), AuthError> {
    match (supplied, stored) {
        (Some(supplied), Some(stored)) if supplied == stored => Ok(()),
        _ => Err(AuthError::StateMismatch),
    }
}

/// Upgrades an authorization code into a verified identity.
pub(crate) async fn verify_identity(
    provider: &dyn IdentityProvider,
    client_id: &str,
    code: &str,
    current: Option<&Identity>,
) -> Result<Verification, AuthError> {
    let credentials = provider.exchange_code(code).await.map_err(|err| {
        tracing::warn!(error = %err, "authorization code exchange failed");
        AuthError::CodeExchange
    })?;

    let info = provider
        .token_info(&credentials.access_token)
        .await
        .map_err(|err| AuthError::TokenInfo(err.to_string()))?;
    if let Some(error) = info.error {
        return Err(AuthError::TokenInfo(error));
    }
    if info.user_id.as_deref() != Some(credentials.subject.as_str()) {
        return Err(AuthError::SubjectMismatch);
    }
    if info.issued_to.as_deref() != Some(client_id) {
        return Err(AuthError::ClientMismatch);
    }
    if matches!(info.audience.as_deref(), Some(audience) if audience != client_id) {
        return Err(AuthError::AudienceMismatch);
    }

    if current.map_or(false, |identity| identity.subject == credentials.subject) {
        return Ok(Verification::AlreadyConnected);
    }

    let profile = provider
        .user_info(&credentials.access_token)
        .await
        .map_err(|err| {
            tracing::warn!(error = %err, "couldn't fetch user profile");
            AuthError::Profile
        })?;

    Ok(Verification::Verified {
        credentials,
        profile,
    })
}
