use crate::api::user_management::models::{User, UserLoggedIn};
use rocket::request::FlashMessage;
use serde::Serialize;

pub(crate) mod catalog;
pub(crate) mod category_management;
pub(crate) mod item_management;
pub(crate) mod json;
pub(crate) mod user_management;

#[derive(Serialize)]
pub(crate) struct Notice {
    kind: String,
    message: String,
}

/// Values every page layout needs: who is signed in and the pending notice.
#[derive(Serialize)]
pub(crate) struct Page {
    user: Option<User>,
    notice: Option<Notice>,
}

impl Page {
    pub(crate) fn new(user: Option<&UserLoggedIn>, flash: Option<FlashMessage<'_>>) -> Page {
        Page {
            user: user.map(|user| user.0.clone()),
            notice: flash.map(|flash| Notice {
                kind: flash.kind().to_string(),
                message: flash.message().to_string(),
            }),
        }
    }
}
