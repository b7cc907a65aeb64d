use crate::api::user_management::connect::{check_state, verify_identity, Verification};
use crate::api::user_management::models::{find_or_create_user, NewUser, UserLoggedIn};
use crate::api::user_management::provider::IdentityProvider;
use crate::api::user_management::sessions::{
    ensure_session_key, session_key, Identity, UserSession,
};
use crate::api::Page;
use crate::db::DbConn;
use crate::error::{database_error, AuthError, ErrorResponse};
use crate::settings::Settings;
use rocket::http::CookieJar;
use rocket::request::FlashMessage;
use rocket::response::{Flash, Redirect};
use rocket::serde::json::Json;
use rocket::State;
use rocket_dyn_templates::{context, Template};

#[derive(Responder)]
pub(crate) enum Connected {
    Welcome(Flash<Template>),
    Already(Json<&'static str>),
}

#[get("/login")]
pub(crate) fn login(
    cookies: &CookieJar<'_>,
    sessions: &State<UserSession>,
    settings: &State<Settings>,
    user: Option<UserLoggedIn>,
    flash: Option<FlashMessage<'_>>,
) -> Result<Template, ErrorResponse> {
    let key = ensure_session_key(cookies)?;
    let state = sessions.issue_state(&key)?;

    Ok(Template::render(
        "login",
        context! {
            page: Page::new(user.as_ref(), flash),
            state: state,
            client_id: &settings.google_client_id,
        },
    ))
}

#[post("/gconnect?<state>", data = "<code>")]
pub(crate) async fn gconnect(
    state: Option<String>,
    code: String,
    cookies: &CookieJar<'_>,
    sessions: &State<UserSession>,
    provider: &State<Box<dyn IdentityProvider>>,
    settings: &State<Settings>,
    conn: DbConn,
) -> Result<Connected, ErrorResponse> {
    let key = session_key(cookies).ok_or(AuthError::StateMismatch)?;
    let stored = sessions.state(&key)?;
    check_state(state.as_deref(), stored.as_deref()).map_err(|err| {
        tracing::warn!("sign-in attempt with mismatched state token");
        err
    })?;

    let current = sessions.identity(&key)?;
    let provider: &dyn IdentityProvider = provider.inner().as_ref();
    let verification = verify_identity(
        provider,
        &settings.google_client_id,
        code.trim(),
        current.as_ref(),
    )
    .await
    .map_err(|err| {
        tracing::warn!(error = %err, "sign-in rejected");
        err
    })?;

    let (credentials, profile) = match verification {
        Verification::AlreadyConnected => {
            return Ok(Connected::Already(Json("Current user is already connected.")))
        }
        Verification::Verified {
            credentials,
            profile,
        } => (credentials, profile),
    };

    let new_user = profile.clone();
    let user = conn
        .run(move |c| {
            find_or_create_user(
                c,
                &NewUser {
                    name: &new_user.name,
                    email: &new_user.email,
                    picture: &new_user.picture,
                },
            )
        })
        .await
        .map_err(database_error)?;

    let identity = Identity {
        user_id: user.id,
        subject: credentials.subject,
        access_token: credentials.access_token,
        username: profile.name,
        email: profile.email,
        picture: profile.picture,
    };
    tracing::info!(user_id = user.id, email = %identity.email, "user signed in");

    let welcome = Template::render(
        "welcome",
        context! {
            name: &identity.username,
            picture: &identity.picture,
        },
    );
    let message = format!("You are now logged in as {}!", identity.username);
    sessions.sign_in(&key, identity)?;

    Ok(Connected::Welcome(Flash::success(welcome, message)))
}

#[get("/logout")]
pub(crate) async fn logout(
    cookies: &CookieJar<'_>,
    sessions: &State<UserSession>,
    provider: &State<Box<dyn IdentityProvider>>,
) -> Result<Flash<Redirect>, ErrorResponse> {
    let identity = match session_key(cookies) {
        Some(key) => sessions.sign_out(&key)?,
        None => None,
    };

    let Some(identity) = identity else {
        return Ok(Flash::error(Redirect::to("/"), "You were not logged in!"));
    };
    tracing::info!(user_id = identity.user_id, "user signed out");

    let provider: &dyn IdentityProvider = provider.inner().as_ref();
    match provider.revoke(&identity.access_token).await {
        Ok(()) => Ok(Flash::success(
            Redirect::to("/"),
            "You have been successfully logged out!",
        )),
        Err(err) => {
            tracing::warn!(
                error = %err,
                user_id = identity.user_id,
                "couldn't revoke provider token"
            );
            Ok(Flash::warning(
                Redirect::to("/"),
                "You have been logged out, but the provider token could not be revoked.",
            ))
        }
    }
}
