use rocket::response::{Flash, Redirect, Responder, Response};
use rocket::{
    http::{ContentType, Status},
    response,
    serde::json::Json,
    Request,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Serialize, Debug)]
pub struct ApiError {
    err: String,
}

impl ApiError {
    pub(crate) fn new(err: String) -> ApiError {
        ApiError { err }
    }
}

#[derive(Debug)]
pub(crate) struct ErrorResponse<T = ApiError> {
    json: Json<T>,
    status: Status,
}

impl ErrorResponse<ApiError> {
    pub(crate) fn new(status: Status, err: String) -> ErrorResponse<ApiError> {
        ErrorResponse {
            json: Json(ApiError { err }),
            status,
        }
    }
}

impl<'r, T: serde::Serialize> Responder<'r, 'static> for ErrorResponse<T> {
    fn respond_to(self, req: &'r Request) -> response::Result<'static> {
        Response::build_from(self.json.respond_to(req)?)
            .status(self.status)
            .header(ContentType::JSON)
            .ok()
    }
}

/// Failures of the sign-in round trip. These are reported as hard HTTP errors
/// because the caller is the sign-in script, not a human.
#[derive(Error, Debug)]
pub(crate) enum AuthError {
    #[error("Invalid state parameter.")]
    StateMismatch,
    #[error("Failed to upgrade the authorization code.")]
    CodeExchange,
    #[error("{0}")]
    TokenInfo(String),
    #[error("Token's user ID doesn't match given user ID.")]
    SubjectMismatch,
    #[error("Token's audience doesn't match app's client ID.")]
    AudienceMismatch,
    #[error("Token's client ID does not match app's.")]
    ClientMismatch,
    #[error("Couldn't fetch user profile.")]
    Profile,
}

impl AuthError {
    pub(crate) fn status(&self) -> Status {
        match self {
            AuthError::TokenInfo(_) | AuthError::Profile => Status::InternalServerError,
            _ => Status::Unauthorized,
        }
    }
}

impl From<AuthError> for ErrorResponse {
    fn from(err: AuthError) -> Self {
        ErrorResponse::new(err.status(), err.to_string())
    }
}

/// User-facing catalog failures. The presentation layer turns each of these
/// into a flashed notice on the home page.
#[derive(Error, Debug)]
pub(crate) enum CatalogError {
    #[error("The requested category does not exist.")]
    CategoryNotFound,
    #[error("The requested item does not exist.")]
    ItemNotFound,
    #[error("You were not authorised to access that page.")]
    NotOwner,
    #[error("The {0} name cannot be empty.")]
    EmptyName(&'static str),
    #[error("A category named \"{0}\" already exists.")]
    DuplicateCategory(String),
    #[error("An item named \"{0}\" already exists in this category.")]
    DuplicateItem(String),
    #[error("Couldn't access the catalog database.")]
    Database(#[from] diesel::result::Error),
}

impl From<CatalogError> for Flash<Redirect> {
    fn from(err: CatalogError) -> Self {
        match &err {
            CatalogError::Database(source) => {
                tracing::error!(error = %source, "catalog query failed")
            }
            CatalogError::NotOwner => tracing::warn!("rejected mutation by non-owner"),
            _ => {}
        }
        Flash::error(Redirect::to("/"), err.to_string())
    }
}

pub(crate) fn database_error(err: diesel::result::Error) -> ErrorResponse {
    tracing::error!(error = %err, "catalog query failed");
    ErrorResponse::new(
        Status::InternalServerError,
        "Couldn't load catalog from database".to_string(),
    )
}
