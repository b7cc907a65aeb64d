use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, SystemTime};

use crate::api::user_management::models::{find_user, UserLoggedIn};
use crate::db::DbConn;
use crate::error::{ApiError, ErrorResponse};
use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};
use rocket::http::{Cookie, CookieJar, Status};
use rocket::request::{self, FromRequest, Outcome};
use rocket::response::{Flash, Redirect};
use rocket::Request;
use serde::{Deserialize, Serialize};

pub(crate) const SESSION_COOKIE: &str = "session";

const MAX_SESSION_AGE: Duration = Duration::from_secs(60 * 60 * 24 * 30);

#[derive(Serialize, Deserialize)]
pub(super) struct SessionCookie {
    pub(super) session_key: String,
    pub(super) creation_time: SystemTime,
}

/// A verified provider identity bound to a local user.
#[derive(Debug, Clone)]
pub(crate) struct Identity {
    pub(crate) user_id: i32,
    pub(crate) subject: String,
    pub(crate) access_token: String,
    pub(crate) username: String,
    pub(crate) email: String,
    pub(crate) picture: String,
}

/// Sessions kept at most; beyond this the oldest signed-out ones are evicted.
const MAX_SESSIONS: usize = 10_000;

#[derive(Debug)]
struct SessionData {
    created: SystemTime,
    state: Option<String>,
    identity: Option<Identity>,
}

impl SessionData {
    fn new() -> SessionData {
        SessionData {
            created: SystemTime::now(),
            state: None,
            identity: None,
        }
    }

    fn expired(&self, max_age: Duration) -> bool {
        self.created.elapsed().map_or(false, |age| age > max_age)
    }
}

type SessionMap = HashMap<String, SessionData>;

pub(crate) struct UserSession {
    sessions: Mutex<SessionMap>,
    max_age: Duration,
    capacity: usize,
}

impl UserSession {
    pub(crate) fn new() -> UserSession {
        UserSession::with_limits(MAX_SESSION_AGE, MAX_SESSIONS)
    }

    pub(crate) fn with_limits(max_age: Duration, capacity: usize) -> UserSession {
        UserSession {
            sessions: Mutex::new(HashMap::new()),
            max_age,
            capacity: capacity.max(1),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, SessionMap>, ErrorResponse> {
        self.sessions.lock().map_err(|_| {
            ErrorResponse::new(
                Status::InternalServerError,
                "Couldn't access user sessions".to_string(),
            )
        })
    }

    /// Returns the entry for `session_key`, making room for it first when it
    /// is new.
    fn entry<'a>(&self, sessions: &'a mut SessionMap, session_key: &str) -> &'a mut SessionData {
        if !sessions.contains_key(session_key) {
            self.prune(sessions);
        }
        sessions
            .entry(session_key.to_string())
            .or_insert_with(SessionData::new)
    }

    /// Drops sessions older than the cookie lifetime, then the oldest
    /// signed-out ones while the map is still full.
    fn prune(&self, sessions: &mut SessionMap) {
        let before = sessions.len();
        sessions.retain(|_, data| !data.expired(self.max_age));

        while sessions.len() >= self.capacity {
            let oldest = sessions
                .iter()
                .filter(|(_, data)| data.identity.is_none())
                .min_by_key(|(_, data)| data.created)
                .map(|(key, _)| key.clone());
            match oldest {
                Some(key) => {
                    sessions.remove(&key);
                }
                None => break,
            }
        }

        let pruned = before - sessions.len();
        if pruned > 0 {
            tracing::debug!(pruned, remaining = sessions.len(), "pruned user sessions");
        }
    }

    /// Stores a fresh anti-forgery token for the session and returns it.
    pub(crate) fn issue_state(&self, session_key: &str) -> Result<String, ErrorResponse> {
        let state = generate_key();
        let mut sessions = self.lock()?;
        self.entry(&mut sessions, session_key).state = Some(state.clone());
        Ok(state)
    }

    pub(crate) fn state(&self, session_key: &str) -> Result<Option<String>, ErrorResponse> {
        Ok(self
            .lock()?
            .get(session_key)
            .and_then(|data| data.state.clone()))
    }

    pub(crate) fn identity(&self, session_key: &str) -> Result<Option<Identity>, ErrorResponse> {
        Ok(self
            .lock()?
            .get(session_key)
            .and_then(|data| data.identity.clone()))
    }

    pub(crate) fn sign_in(
        &self,
        session_key: &str,
        identity: Identity,
    ) -> Result<(), ErrorResponse> {
        let mut sessions = self.lock()?;
        self.entry(&mut sessions, session_key).identity = Some(identity);
        Ok(())
    }

    /// Drops everything stored for the session and returns the identity it
    /// held, if any.
    pub(crate) fn sign_out(&self, session_key: &str) -> Result<Option<Identity>, ErrorResponse> {
        Ok(self
            .lock()?
            .remove(session_key)
            .and_then(|data| data.identity))
    }
}

fn generate_key() -> String {
    const LEN: usize = 32;

    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(LEN)
        .map(char::from)
        .collect()
}

/// Reads the session key from the private session cookie. Missing, malformed
/// and expired cookies all yield `None`.
pub(crate) fn session_key(cookies: &CookieJar<'_>) -> Option<String> {
    let cookie = cookies.get_private(SESSION_COOKIE)?;
    let value = serde_json::from_str::<SessionCookie>(cookie.value()).ok()?;
    let age = value.creation_time.elapsed().ok()?;
    if age > MAX_SESSION_AGE {
        return None;
    }
    Some(value.session_key)
}

/// Returns the current session key, starting a new session when the browser
/// has none.
pub(crate) fn ensure_session_key(cookies: &CookieJar<'_>) -> Result<String, ErrorResponse> {
    if let Some(key) = session_key(cookies) {
        return Ok(key);
    }

    let cookie = SessionCookie {
        session_key: generate_key(),
        creation_time: SystemTime::now(),
    };

    let cookie_string = serde_json::to_string(&cookie).map_err(|err| {
        ErrorResponse::new(
            Status::InternalServerError,
            format!("Couldn't create session cookie {}", err),
        )
    })?;

    cookies.add_private(Cookie::new(SESSION_COOKIE, cookie_string));

    Ok(cookie.session_key)
}

/// Turns a missing login into a redirect to the sign-in page.
pub(crate) fn login_required(user: Option<UserLoggedIn>) -> Result<UserLoggedIn, Flash<Redirect>> {
    user.ok_or_else(|| {
        Flash::error(
            Redirect::to("/login/"),
            "You were not authorised to access that page. Please log in to continue.",
        )
    })
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for UserLoggedIn {
    type Error = ApiError;

    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let Some(key) = session_key(req.cookies()) else {
            return Outcome::Forward(Status::Unauthorized);
        };

        let Some(sessions) = req.rocket().state::<UserSession>() else {
            return Outcome::Error((
                Status::InternalServerError,
                ApiError::new("Couldn't get UserSession".to_string()),
            ));
        };

        let identity = match sessions.identity(&key) {
            Ok(Some(identity)) => identity,
            Ok(None) => return Outcome::Forward(Status::Unauthorized),
            Err(_) => {
                return Outcome::Error((
                    Status::InternalServerError,
                    ApiError::new("Couldn't get user sessions".to_string()),
                ))
            }
        };

        let conn = match req.guard::<DbConn>().await {
            Outcome::Success(conn) => conn,
            _ => {
                return Outcome::Error((
                    Status::InternalServerError,
                    ApiError::new("Couldn't get database connection".to_string()),
                ))
            }
        };

        let user_id = identity.user_id;
        match conn.run(move |c| find_user(c, user_id)).await {
            Ok(Some(user)) => Outcome::Success(UserLoggedIn(user)),
            Ok(None) => Outcome::Forward(Status::Unauthorized),
            Err(err) => {
                tracing::error!(error = %err, "couldn't load session user");
                Outcome::Error((
                    Status::InternalServerError,
                    ApiError::new("Couldn't load user from database".to_string()),
                ))
            }
        }
    }
}
