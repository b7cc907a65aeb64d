use crate::api::category_management::models::{
    owned_category, validate_category_name, Category, FormCategory,
};
use crate::api::user_management::models::UserLoggedIn;
use crate::api::user_management::sessions::login_required;
use crate::api::Page;
use crate::db::DbConn;
use crate::error::CatalogError;
use crate::schema::categories;
use diesel::prelude::*;
use rocket::form::Form;
use rocket::request::FlashMessage;
use rocket::response::{Flash, Redirect};
use rocket_dyn_templates::{context, Template};

pub(crate) fn rename_category(
    c: &mut SqliteConnection,
    owner: i32,
    cid: i32,
    name: &str,
) -> Result<Category, CatalogError> {
    let category = owned_category(c, owner, cid)?;
    let name = validate_category_name(c, name, Some(category.id))?;

    let category = diesel::update(&category)
        .set(categories::name.eq(name))
        .get_result::<Category>(c)?;

    Ok(category)
}

#[get("/catalog/category/<cid>/edit")]
pub(crate) async fn edit_category_form(
    cid: i32,
    user: Option<UserLoggedIn>,
    flash: Option<FlashMessage<'_>>,
    conn: DbConn,
) -> Result<Template, Flash<Redirect>> {
    let user = login_required(user)?;
    let owner = user.0.id;

    let category = conn.run(move |c| owned_category(c, owner, cid)).await?;

    Ok(Template::render(
        "edit-category",
        context! {
            page: Page::new(Some(&user), flash),
            category: category,
        },
    ))
}

#[post("/catalog/category/<cid>/edit", data = "<form_category>")]
pub(crate) async fn edit_category(
    cid: i32,
    form_category: Form<FormCategory>,
    user: Option<UserLoggedIn>,
    conn: DbConn,
) -> Result<Flash<Redirect>, Flash<Redirect>> {
    let user = login_required(user)?;
    let owner = user.0.id;
    let name = form_category.into_inner().name;

    let category = conn
        .run(move |c| rename_category(c, owner, cid, &name))
        .await?;
    tracing::info!(category_id = category.id, user_id = owner, "category renamed");

    Ok(Flash::success(
        Redirect::to(format!("/catalog/category/{}/items/", category.id)),
        format!("Category {} successfully updated!", category.name),
    ))
}
