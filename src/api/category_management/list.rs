use crate::api::category_management::models::find_category;
use crate::api::item_management::models::list_category_items;
use crate::api::user_management::models::UserLoggedIn;
use crate::api::Page;
use crate::db::DbConn;
use crate::error::CatalogError;
use rocket::request::FlashMessage;
use rocket::response::{Flash, Redirect};
use rocket_dyn_templates::{context, Template};

#[get("/catalog/category/<cid>/items")]
pub(crate) async fn category_items(
    cid: i32,
    user: Option<UserLoggedIn>,
    flash: Option<FlashMessage<'_>>,
    conn: DbConn,
) -> Result<Template, Flash<Redirect>> {
    let (category, items) = conn
        .run(move |c| {
            let category = find_category(c, cid)?.ok_or(CatalogError::CategoryNotFound)?;
            let items = list_category_items(c, cid)?;
            Ok::<_, CatalogError>((category, items))
        })
        .await?;

    let is_owner = user.as_ref().map_or(false, |user| user.0.id == category.user_id);

    Ok(Template::render(
        "category-items",
        context! {
            page: Page::new(user.as_ref(), flash),
            category: category,
            items: items,
            is_owner: is_owner,
        },
    ))
}
