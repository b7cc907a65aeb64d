use crate::api::category_management::models::{list_owned_categories, owned_category};
use crate::api::item_management::models::{validate_item_name, FormItem, Item, NewItem};
use crate::api::user_management::models::UserLoggedIn;
use crate::api::user_management::sessions::login_required;
use crate::api::Page;
use crate::db::DbConn;
use crate::error::CatalogError;
use crate::schema::items;
use diesel::prelude::*;
use rocket::form::Form;
use rocket::request::FlashMessage;
use rocket::response::{Flash, Redirect};
use rocket_dyn_templates::{context, Template};

/// Files a new item under one of the caller's own categories.
pub(crate) fn create_item(
    c: &mut SqliteConnection,
    owner: i32,
    cid: Option<i32>,
    name: &str,
    description: &str,
) -> Result<Item, CatalogError> {
    let cid = cid.ok_or(CatalogError::CategoryNotFound)?;
    let category = owned_category(c, owner, cid)?;
    let name = validate_item_name(c, name, category.id, None)?;

    let item = diesel::insert_into(items::table)
        .values(&NewItem {
            name,
            description: description.trim(),
            category_id: category.id,
            user_id: owner,
        })
        .get_result::<Item>(c)?;

    Ok(item)
}

async fn store_item(
    conn: DbConn,
    owner: i32,
    cid: Option<i32>,
    form_item: FormItem,
) -> Result<Flash<Redirect>, Flash<Redirect>> {
    let item = conn
        .run(move |c| create_item(c, owner, cid, &form_item.name, &form_item.description))
        .await?;
    tracing::info!(
        item_id = item.id,
        category_id = item.category_id,
        user_id = owner,
        "item created"
    );

    Ok(Flash::success(
        Redirect::to(format!("/catalog/item/{}/", item.id)),
        format!("New item {} successfully created!", item.name),
    ))
}

#[get("/catalog/item/new")]
pub(crate) async fn new_item(
    user: Option<UserLoggedIn>,
    flash: Option<FlashMessage<'_>>,
    conn: DbConn,
) -> Result<Template, Flash<Redirect>> {
    let user = login_required(user)?;
    let owner = user.0.id;

    let categories = conn
        .run(move |c| list_owned_categories(c, owner))
        .await
        .map_err(CatalogError::from)?;

    Ok(Template::render(
        "new-item",
        context! {
            page: Page::new(Some(&user), flash),
            action: "/catalog/item/new/",
            categories: categories,
            selected: Option::<i32>::None,
        },
    ))
}

#[post("/catalog/item/new", data = "<form_item>")]
pub(crate) async fn add_item(
    form_item: Form<FormItem>,
    user: Option<UserLoggedIn>,
    conn: DbConn,
) -> Result<Flash<Redirect>, Flash<Redirect>> {
    let user = login_required(user)?;
    let form_item = form_item.into_inner();
    let cid = form_item.category;

    store_item(conn, user.0.id, cid, form_item).await
}

#[get("/catalog/category/<cid>/item/new")]
pub(crate) async fn new_category_item(
    cid: i32,
    user: Option<UserLoggedIn>,
    flash: Option<FlashMessage<'_>>,
    conn: DbConn,
) -> Result<Template, Flash<Redirect>> {
    let user = login_required(user)?;
    let owner = user.0.id;

    let category = conn.run(move |c| owned_category(c, owner, cid)).await?;
    let action = format!("/catalog/category/{}/item/new/", category.id);
    let selected = Some(category.id);

    Ok(Template::render(
        "new-item",
        context! {
            page: Page::new(Some(&user), flash),
            action: action,
            categories: vec![category],
            selected: selected,
        },
    ))
}

#[post("/catalog/category/<cid>/item/new", data = "<form_item>")]
pub(crate) async fn add_category_item(
    cid: i32,
    form_item: Form<FormItem>,
    user: Option<UserLoggedIn>,
    conn: DbConn,
) -> Result<Flash<Redirect>, Flash<Redirect>> {
    let user = login_required(user)?;

    store_item(conn, user.0.id, Some(cid), form_item.into_inner()).await
}
