use crate::api::category_management::models::{list_categories, Category};
use crate::api::item_management::models::{find_item, list_items_newest_first, Item};
use crate::db::DbConn;
use crate::error::{database_error, ErrorResponse};
use rocket::http::Status;
use rocket::serde::json::Json;
use serde::Serialize;

#[derive(Serialize)]
pub(crate) struct CatalogOut {
    pub(crate) catalog: Vec<Item>,
}

#[derive(Serialize)]
pub(crate) struct CategoriesOut {
    pub(crate) categories: Vec<Category>,
}

/// Serializes as `{"item": {...}}` or `{"error": "..."}`.
#[derive(Serialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub(crate) enum ItemLookup {
    Item(Item),
    Error(String),
}

/// Resolves an item through the category it is requested under.
pub(crate) fn lookup_item(item: Option<Item>, cid: i32, iid: i32) -> ItemLookup {
    match item {
        None => ItemLookup::Error(format!("Item {} does not exist.", iid)),
        Some(item) if item.category_id != cid => ItemLookup::Error(format!(
            "Item {} does not belong to category {}.",
            iid, cid
        )),
        Some(item) => ItemLookup::Item(item),
    }
}

#[get("/catalog.json")]
pub(crate) async fn catalog_json(conn: DbConn) -> Result<Json<CatalogOut>, ErrorResponse> {
    let catalog = conn
        .run(|c| list_items_newest_first(c))
        .await
        .map_err(database_error)?;

    Ok(Json(CatalogOut { catalog }))
}

#[get("/categories/JSON")]
pub(crate) async fn categories_json(conn: DbConn) -> Result<Json<CategoriesOut>, ErrorResponse> {
    let categories = conn
        .run(|c| list_categories(c))
        .await
        .map_err(database_error)?;

    Ok(Json(CategoriesOut { categories }))
}

#[get("/categories/<cid>/item/<iid>/JSON")]
pub(crate) async fn category_item_json(
    cid: i32,
    iid: i32,
    conn: DbConn,
) -> Result<(Status, Json<ItemLookup>), ErrorResponse> {
    let item = conn
        .run(move |c| find_item(c, iid))
        .await
        .map_err(database_error)?;

    let lookup = lookup_item(item, cid, iid);
    let status = match lookup {
        ItemLookup::Item(_) => Status::Ok,
        ItemLookup::Error(_) => Status::NotFound,
    };

    Ok((status, Json(lookup)))
}
