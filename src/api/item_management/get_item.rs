use crate::api::category_management::models::find_category;
use crate::api::item_management::models::find_item;
use crate::api::user_management::models::{find_user, UserLoggedIn};
use crate::api::Page;
use crate::db::DbConn;
use crate::error::CatalogError;
use rocket::request::FlashMessage;
use rocket::response::{Flash, Redirect};
use rocket_dyn_templates::{context, Template};

#[get("/catalog/item/<iid>")]
pub(crate) async fn view_item(
    iid: i32,
    user: Option<UserLoggedIn>,
    flash: Option<FlashMessage<'_>>,
    conn: DbConn,
) -> Result<Template, Flash<Redirect>> {
    let (item, category, owner) = conn
        .run(move |c| {
            let item = find_item(c, iid)?.ok_or(CatalogError::ItemNotFound)?;
            let category = find_category(c, item.category_id)?;
            let owner = find_user(c, item.user_id)?;
            Ok::<_, CatalogError>((item, category, owner))
        })
        .await?;

    let is_owner = user.as_ref().map_or(false, |user| user.0.id == item.user_id);

    Ok(Template::render(
        "view-item",
        context! {
            page: Page::new(user.as_ref(), flash),
            item: item,
            category: category,
            owner: owner,
            is_owner: is_owner,
        },
    ))
}
