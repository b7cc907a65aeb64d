use crate::schema::users;
use diesel::prelude::*;
use serde::Serialize;
use std::fmt::Debug;

#[derive(Queryable, Identifiable, Serialize, Debug, Clone, PartialEq, Eq)]
#[diesel(table_name = users)]
pub struct User {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub picture: String,
}

#[derive(Insertable)]
#[diesel(table_name = users)]
pub struct NewUser<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub picture: &'a str,
}

/// Request guard for a browser whose session holds a verified identity.
#[derive(Debug)]
pub struct UserLoggedIn(pub User);

/// Looks the user up by email and creates it when absent. An existing
/// record keeps its id.
pub(crate) fn find_or_create_user(
    c: &mut SqliteConnection,
    new_user: &NewUser<'_>,
) -> QueryResult<User> {
    c.transaction(|c| {
        let existing = users::table
            .filter(users::email.eq(new_user.email))
            .first::<User>(c)
            .optional()?;

        match existing {
            Some(user) => Ok(user),
            None => diesel::insert_into(users::table)
                .values(new_user)
                .get_result::<User>(c),
        }
    })
}

pub(crate) fn find_user(c: &mut SqliteConnection, uid: i32) -> QueryResult<Option<User>> {
    users::table.find(uid).first::<User>(c).optional()
}

#[cfg(test)]
pub(crate) fn test_user(c: &mut SqliteConnection, name: &str) -> User {
    let email = format!("{}@example.com", name);
    find_or_create_user(
        c,
        &NewUser {
            name,
            email: &email,
            picture: "https://example.com/avatar.png",
        },
    )
    .expect("user inserted")
}
