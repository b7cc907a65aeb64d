use crate::error::CatalogError;
use crate::schema::categories;
use diesel::dsl::exists;
use diesel::prelude::*;
use serde::Serialize;
use std::fmt::Debug;

#[derive(Queryable, Identifiable, Serialize, Debug, Clone, PartialEq, Eq)]
#[diesel(table_name = categories)]
pub struct Category {
    pub id: i32,
    pub name: String,
    pub user_id: i32,
}

#[derive(Insertable)]
#[diesel(table_name = categories)]
pub struct NewCategory<'a> {
    pub name: &'a str,
    pub user_id: i32,
}

#[derive(FromForm)]
pub struct FormCategory {
    #[field(default = String::new())]
    pub name: String,
}

pub(crate) fn find_category(c: &mut SqliteConnection, cid: i32) -> QueryResult<Option<Category>> {
    categories::table.find(cid).first::<Category>(c).optional()
}

/// Loads a category the caller is allowed to mutate.
pub(crate) fn owned_category(
    c: &mut SqliteConnection,
    owner: i32,
    cid: i32,
) -> Result<Category, CatalogError> {
    let category = find_category(c, cid)?.ok_or(CatalogError::CategoryNotFound)?;
    if category.user_id != owner {
        return Err(CatalogError::NotOwner);
    }
    Ok(category)
}

pub(crate) fn list_categories(c: &mut SqliteConnection) -> QueryResult<Vec<Category>> {
    categories::table
        .order(categories::name.asc())
        .load::<Category>(c)
}

pub(crate) fn list_owned_categories(
    c: &mut SqliteConnection,
    owner: i32,
) -> QueryResult<Vec<Category>> {
    categories::table
        .filter(categories::user_id.eq(owner))
        .order(categories::name.asc())
        .load::<Category>(c)
}

/// Trims the submitted name and rejects it when empty or already taken by
/// another category.
pub(crate) fn validate_category_name<'a>(
    c: &mut SqliteConnection,
    name: &'a str,
    except: Option<i32>,
) -> Result<&'a str, CatalogError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CatalogError::EmptyName("category"));
    }

    let same_name = categories::table
        .filter(categories::name.eq(name))
        .filter(categories::id.ne(except.unwrap_or(0)));
    if diesel::select(exists(same_name)).get_result::<bool>(c)? {
        return Err(CatalogError::DuplicateCategory(name.to_string()));
    }

    Ok(name)
}

#[cfg(test)]
pub(crate) fn test_category(c: &mut SqliteConnection, owner: i32, name: &str) -> Category {
    diesel::insert_into(categories::table)
        .values(&NewCategory {
            name,
            user_id: owner,
        })
        .get_result::<Category>(c)
        .expect("category inserted")
}
