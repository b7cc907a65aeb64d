use crate::api::category_management::models::list_categories;
use crate::api::item_management::models::list_items_newest_first;
use crate::api::user_management::models::UserLoggedIn;
use crate::api::Page;
use crate::db::DbConn;
use crate::error::{database_error, ErrorResponse};
use rocket::request::FlashMessage;
use rocket::response::Redirect;
use rocket_dyn_templates::{context, Template};

#[get("/")]
pub(crate) async fn home(
    user: Option<UserLoggedIn>,
    flash: Option<FlashMessage<'_>>,
    conn: DbConn,
) -> Result<Template, ErrorResponse> {
    let (categories, items) = conn
        .run(|c| {
            Ok::<_, diesel::result::Error>((list_categories(c)?, list_items_newest_first(c)?))
        })
        .await
        .map_err(database_error)?;

    Ok(Template::render(
        "index",
        context! {
            page: Page::new(user.as_ref(), flash),
            categories: categories,
            items: items,
        },
    ))
}

#[get("/catalog")]
pub(crate) fn catalog_index() -> Redirect {
    Redirect::to("/")
}

#[get("/catalog/items")]
pub(crate) fn catalog_items() -> Redirect {
    Redirect::to("/")
}
