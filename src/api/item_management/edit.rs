use crate::api::category_management::models::{list_owned_categories, owned_category};
use crate::api::item_management::models::{
    owned_item, validate_item_name, FormItem, Item, ItemChanges,
};
use crate::api::user_management::models::UserLoggedIn;
use crate::api::user_management::sessions::login_required;
use crate::api::Page;
use crate::db::DbConn;
use crate::error::CatalogError;
use diesel::prelude::*;
use rocket::form::Form;
use rocket::request::FlashMessage;
use rocket::response::{Flash, Redirect};
use rocket_dyn_templates::{context, Template};

/// Applies the non-empty fields of the form. A category id moves the item,
/// provided the caller owns the target category.
pub(crate) fn update_item(
    c: &mut SqliteConnection,
    owner: i32,
    iid: i32,
    form_item: &FormItem,
) -> Result<Item, CatalogError> {
    let item = owned_item(c, owner, iid)?;

    let mut changes = ItemChanges::default();
    if let Some(cid) = form_item.category.filter(|cid| *cid != item.category_id) {
        changes.category_id = Some(owned_category(c, owner, cid)?.id);
    }
    let target_category = changes.category_id.unwrap_or(item.category_id);

    let name = form_item.name.trim();
    if !name.is_empty() && (name != item.name || changes.category_id.is_some()) {
        let name = validate_item_name(c, name, target_category, Some(item.id))?;
        changes.name = Some(name.to_string());
    } else if changes.category_id.is_some() {
        validate_item_name(c, &item.name, target_category, Some(item.id))?;
    }

    let description = form_item.description.trim();
    if !description.is_empty() && description != item.description {
        changes.description = Some(description.to_string());
    }

    if changes.is_empty() {
        return Ok(item);
    }

    let item = diesel::update(&item)
        .set(&changes)
        .get_result::<Item>(c)?;

    Ok(item)
}

#[get("/catalog/item/<iid>/edit")]
pub(crate) async fn edit_item_form(
    iid: i32,
    user: Option<UserLoggedIn>,
    flash: Option<FlashMessage<'_>>,
    conn: DbConn,
) -> Result<Template, Flash<Redirect>> {
    let user = login_required(user)?;
    let owner = user.0.id;

    let (item, categories) = conn
        .run(move |c| {
            let item = owned_item(c, owner, iid)?;
            let categories = list_owned_categories(c, owner)?;
            Ok::<_, CatalogError>((item, categories))
        })
        .await?;

    Ok(Template::render(
        "edit-item",
        context! {
            page: Page::new(Some(&user), flash),
            item: item,
            categories: categories,
        },
    ))
}

#[post("/catalog/item/<iid>/edit", data = "<form_item>")]
pub(crate) async fn edit_item(
    iid: i32,
    form_item: Form<FormItem>,
    user: Option<UserLoggedIn>,
    conn: DbConn,
) -> Result<Flash<Redirect>, Flash<Redirect>> {
    let user = login_required(user)?;
    let owner = user.0.id;
    let form_item = form_item.into_inner();

    let item = conn
        .run(move |c| update_item(c, owner, iid, &form_item))
        .await?;
    tracing::info!(item_id = item.id, user_id = owner, "item updated");

    Ok(Flash::success(
        Redirect::to(format!("/catalog/item/{}/", item.id)),
        "Item successfully updated!",
    ))
}
