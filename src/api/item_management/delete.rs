use crate::api::item_management::models::{owned_item, Item};
use crate::api::user_management::models::UserLoggedIn;
use crate::api::user_management::sessions::login_required;
use crate::api::Page;
use crate::db::DbConn;
use crate::error::CatalogError;
use diesel::prelude::*;
use rocket::request::FlashMessage;
use rocket::response::{Flash, Redirect};
use rocket_dyn_templates::{context, Template};

pub(crate) fn delete_item(
    c: &mut SqliteConnection,
    owner: i32,
    iid: i32,
) -> Result<Item, CatalogError> {
    let item = owned_item(c, owner, iid)?;
    diesel::delete(&item).execute(c)?;
    Ok(item)
}

#[get("/catalog/item/<iid>/delete")]
pub(crate) async fn delete_item_form(
    iid: i32,
    user: Option<UserLoggedIn>,
    flash: Option<FlashMessage<'_>>,
    conn: DbConn,
) -> Result<Template, Flash<Redirect>> {
    let user = login_required(user)?;
    let owner = user.0.id;

    let item = conn.run(move |c| owned_item(c, owner, iid)).await?;

    Ok(Template::render(
        "delete-item",
        context! {
            page: Page::new(Some(&user), flash),
            item: item,
        },
    ))
}

#[post("/catalog/item/<iid>/delete")]
pub(crate) async fn remove_item(
    iid: i32,
    user: Option<UserLoggedIn>,
    conn: DbConn,
) -> Result<Flash<Redirect>, Flash<Redirect>> {
    let user = login_required(user)?;
    let owner = user.0.id;

    let item = conn.run(move |c| delete_item(c, owner, iid)).await?;
    tracing::info!(item_id = item.id, user_id = owner, "item deleted");

    Ok(Flash::success(
        Redirect::to(format!("/catalog/category/{}/items/", item.category_id)),
        format!("Item {} successfully deleted!", item.name),
    ))
}
