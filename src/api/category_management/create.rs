use crate::api::category_management::models::{
    validate_category_name, Category, FormCategory, NewCategory,
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

pub(crate) fn create_category(
    c: &mut SqliteConnection,
    owner: i32,
    name: &str,
) -> Result<Category, CatalogError> {
    let name = validate_category_name(c, name, None)?;

    let category = diesel::insert_into(categories::table)
        .values(&NewCategory {
            name,
            user_id: owner,
        })
        .get_result::<Category>(c)?;

    Ok(category)
}

#[get("/catalog/category/new")]
pub(crate) fn new_category(
    user: Option<UserLoggedIn>,
    flash: Option<FlashMessage<'_>>,
) -> Result<Template, Flash<Redirect>> {
    let user = login_required(user)?;

    Ok(Template::render(
        "new-category",
        context! { page: Page::new(Some(&user), flash) },
    ))
}

#[post("/catalog/category/new", data = "<form_category>")]
pub(crate) async fn add_category(
    form_category: Form<FormCategory>,
    user: Option<UserLoggedIn>,
    conn: DbConn,
) -> Result<Flash<Redirect>, Flash<Redirect>> {
    let user = login_required(user)?;
    let owner = user.0.id;
    let name = form_category.into_inner().name;

    let category = conn
        .run(move |c| create_category(c, owner, &name))
        .await?;
    tracing::info!(category_id = category.id, user_id = owner, "category created");

    Ok(Flash::success(
        Redirect::to(format!("/catalog/category/{}/items/", category.id)),
        format!("New category {} successfully created!", category.name),
    ))
}
