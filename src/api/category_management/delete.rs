use crate::api::category_management::models::{owned_category, Category};
use crate::api::user_management::models::UserLoggedIn;
use crate::api::user_management::sessions::login_required;
use crate::api::Page;
use crate::db::DbConn;
use crate::error::CatalogError;
use crate::schema::{categories, items};
use diesel::prelude::*;
use rocket::request::FlashMessage;
use rocket::response::{Flash, Redirect};
use rocket_dyn_templates::{context, Template};

/// Deletes the category together with every item filed under it.
pub(crate) fn delete_category(
    c: &mut SqliteConnection,
    owner: i32,
    cid: i32,
) -> Result<(Category, usize), CatalogError> {
    let category = owned_category(c, owner, cid)?;

    let removed_items = c.transaction::<_, diesel::result::Error, _>(|c| {
        let removed_items =
            diesel::delete(items::table.filter(items::category_id.eq(cid))).execute(c)?;
        diesel::delete(categories::table.find(cid)).execute(c)?;
        Ok(removed_items)
    })?;

    Ok((category, removed_items))
}

#[get("/catalog/category/<cid>/delete")]
pub(crate) async fn delete_category_form(
    cid: i32,
    user: Option<UserLoggedIn>,
    flash: Option<FlashMessage<'_>>,
    conn: DbConn,
) -> Result<Template, Flash<Redirect>> {
    let user = login_required(user)?;
    let owner = user.0.id;

    let (category, item_count) = conn
        .run(move |c| {
            let category = owned_category(c, owner, cid)?;
            let item_count = items::table
                .filter(items::category_id.eq(cid))
                .count()
                .get_result::<i64>(c)?;
            Ok::<_, CatalogError>((category, item_count))
        })
        .await?;

    Ok(Template::render(
        "delete-category",
        context! {
            page: Page::new(Some(&user), flash),
            category: category,
            item_count: item_count,
        },
    ))
}

#[post("/catalog/category/<cid>/delete")]
pub(crate) async fn remove_category(
    cid: i32,
    user: Option<UserLoggedIn>,
    conn: DbConn,
) -> Result<Flash<Redirect>, Flash<Redirect>> {
    let user = login_required(user)?;
    let owner = user.0.id;

    let (category, removed_items) = conn
        .run(move |c| delete_category(c, owner, cid))
        .await?;
    tracing::info!(
        category_id = category.id,
        user_id = owner,
        removed_items,
        "category deleted"
    );

    Ok(Flash::success(
        Redirect::to("/"),
        format!("Category {} successfully deleted!", category.name),
    ))
}
