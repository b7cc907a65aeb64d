use crate::error::CatalogError;
use crate::schema::items;
use diesel::dsl::exists;
use diesel::prelude::*;
use serde::Serialize;
use std::fmt::Debug;

#[derive(Queryable, Identifiable, Serialize, Debug, Clone, PartialEq, Eq)]
#[diesel(table_name = items)]
pub struct Item {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub category_id: i32,
    pub user_id: i32,
}

#[derive(Insertable)]
#[diesel(table_name = items)]
pub struct NewItem<'a> {
    pub name: &'a str,
    pub description: &'a str,
    pub category_id: i32,
    pub user_id: i32,
}

/// Partial update; `None` leaves the column untouched.
#[derive(AsChangeset, Default, Debug)]
#[diesel(table_name = items)]
pub struct ItemChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<i32>,
}

impl ItemChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.category_id.is_none()
    }
}

#[derive(FromForm)]
pub struct FormItem {
    #[field(default = String::new())]
    pub name: String,
    #[field(default = String::new())]
    pub description: String,
    pub category: Option<i32>,
}

pub(crate) fn find_item(c: &mut SqliteConnection, iid: i32) -> QueryResult<Option<Item>> {
    items::table.find(iid).first::<Item>(c).optional()
}

/// Loads an item the caller is allowed to mutate.
pub(crate) fn owned_item(
    c: &mut SqliteConnection,
    owner: i32,
    iid: i32,
) -> Result<Item, CatalogError> {
    let item = find_item(c, iid)?.ok_or(CatalogError::ItemNotFound)?;
    if item.user_id != owner {
        return Err(CatalogError::NotOwner);
    }
    Ok(item)
}

pub(crate) fn list_category_items(c: &mut SqliteConnection, cid: i32) -> QueryResult<Vec<Item>> {
    items::table
        .filter(items::category_id.eq(cid))
        .order(items::name.asc())
        .load::<Item>(c)
}

pub(crate) fn list_items_newest_first(c: &mut SqliteConnection) -> QueryResult<Vec<Item>> {
    items::table.order(items::id.desc()).load::<Item>(c)
}

/// Trims the submitted name and rejects it when empty or already used by
/// another item of the same category.
pub(crate) fn validate_item_name<'a>(
    c: &mut SqliteConnection,
    name: &'a str,
    cid: i32,
    except: Option<i32>,
) -> Result<&'a str, CatalogError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CatalogError::EmptyName("item"));
    }

    let same_name = items::table
        .filter(items::category_id.eq(cid))
        .filter(items::name.eq(name))
        .filter(items::id.ne(except.unwrap_or(0)));
    if diesel::select(exists(same_name)).get_result::<bool>(c)? {
        return Err(CatalogError::DuplicateItem(name.to_string()));
    }

    Ok(name)
}

#[cfg(test)]
pub(crate) fn test_item(c: &mut SqliteConnection, owner: i32, cid: i32, name: &str) -> Item {
    diesel::insert_into(items::table)
        .values(&NewItem {
            name,
            description: "",
            category_id: cid,
            user_id: owner,
        })
        .get_result::<Item>(c)
        .expect("item inserted")
}
