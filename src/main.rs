mod api;
mod db;
mod error;
mod schema;
mod settings;

#[cfg(test)]
mod tests;

#[macro_use]
extern crate rocket;
#[macro_use]
extern crate diesel;
extern crate dotenv;

use api::user_management::provider::{GoogleProvider, IdentityProvider};
use api::user_management::sessions::UserSession;
use db::DbConn;
use rocket::fairing::AdHoc;
use rocket::figment::Figment;
use rocket::{Build, Rocket};
use rocket_dyn_templates::Template;
use settings::Settings;
use tracing_subscriber::EnvFilter;

fn init_logging() {
    // Default to `info` if RUST_LOG is not set. Rocket's own `log` records are
    // forwarded into the same subscriber.
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .try_init()
        .ok();
}

pub(crate) fn build(
    figment: Figment,
    settings: Settings,
    provider: Box<dyn IdentityProvider>,
) -> Rocket<Build> {
    rocket::custom(figment)
        .attach(DbConn::fairing())
        .attach(AdHoc::on_ignite(
            "Database Migrations",
            db::run_db_migrations,
        ))
        .attach(Template::fairing())
        .manage(settings)
        .manage(provider)
        .manage(UserSession::new())
        .mount(
            "/",
            routes![
                api::catalog::home,
                api::catalog::catalog_index,
                api::catalog::catalog_items,
                api::user_management::login::login,
                api::user_management::login::gconnect,
                api::user_management::login::logout,
                api::category_management::create::new_category,
                api::category_management::create::add_category,
                api::category_management::edit::edit_category_form,
                api::category_management::edit::edit_category,
                api::category_management::delete::delete_category_form,
                api::category_management::delete::remove_category,
                api::category_management::list::category_items,
                api::item_management::create::new_item,
                api::item_management::create::add_item,
                api::item_management::create::new_category_item,
                api::item_management::create::add_category_item,
                api::item_management::get_item::view_item,
                api::item_management::edit::edit_item_form,
                api::item_management::edit::edit_item,
                api::item_management::delete::delete_item_form,
                api::item_management::delete::remove_item,
            ],
        )
        .mount(
            "/api/v1",
            routes![
                api::json::catalog_json,
                api::json::categories_json,
                api::json::category_item_json,
            ],
        )
}

#[launch]
fn rocket() -> _ {
    dotenv::dotenv().ok();
    init_logging();

    let settings = Settings::new().expect("GOOGLE_CLIENT_ID and GOOGLE_CLIENT_SECRET must be set");
    let provider = GoogleProvider::new(&settings);
    tracing::info!("starting item catalog");

    build(rocket::Config::figment(), settings, Box::new(provider))
}
