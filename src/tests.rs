use std::path::PathBuf;

use crate::api::user_management::provider::FakeProvider;
use crate::build;
use crate::schema::users;
use crate::settings::Settings;
use diesel::prelude::*;
use rocket::http::{ContentType, Status};
use rocket::local::asynchronous::{Client, LocalResponse};
use serde_json::Value;
use tempfile::TempDir;

const SECRET_KEY: &str = "hPRYyVRiMyxpw5sBB1XeCMN1kFsDCqKvBi2QJxBVHQk=";

struct TestApp {
    client: Client,
    db_path: PathBuf,
    _dir: TempDir,
}

fn settings() -> Settings {
    Settings {
        google_client_id: FakeProvider::CLIENT_ID.to_string(),
        google_client_secret: "test-secret".to_string(),
        google_token_uri: "http://127.0.0.1:9/token".to_string(),
        google_tokeninfo_uri: "http://127.0.0.1:9/tokeninfo".to_string(),
        google_userinfo_uri: "http://127.0.0.1:9/userinfo".to_string(),
        google_revoke_uri: "http://127.0.0.1:9/revoke".to_string(),
    }
}

fn location<'a>(response: &'a LocalResponse<'_>) -> Option<&'a str> {
    response.headers().get_one("Location")
}

impl TestApp {
    async fn new() -> TestApp {
        let dir = tempfile::tempdir().expect("temp dir");
        let db_path = dir.path().join("catalog.db");
        let figment = rocket::Config::figment()
            .merge(("databases.catalog.url", db_path.display().to_string()))
            .merge(("secret_key", SECRET_KEY))
            .merge(("log_level", "off"));

        let client = Client::tracked(build(figment, settings(), Box::new(FakeProvider::new())))
            .await
            .expect("valid rocket instance");

        TestApp {
            client,
            db_path,
            _dir: dir,
        }
    }

    async fn state_token(&self) -> String {
        let body = self
            .client
            .get("/login/")
            .dispatch()
            .await
            .into_string()
            .await
            .expect("login page");
        let marker = "data-state=\"";
        let start = body.find(marker).expect("state token") + marker.len();
        let end = start + body[start..].find('"').expect("end of state token");
        body[start..end].to_string()
    }

    async fn connect(&self, code: &str) -> LocalResponse<'_> {
        let state = self.state_token().await;
        self.client
            .post(format!("/gconnect?state={}", state))
            .body(code.to_string())
            .dispatch()
            .await
    }

    async fn login(&self, name: &str) {
        let response = self.connect(&format!("user:{}", name)).await;
        assert_eq!(response.status(), Status::Ok);
    }

    async fn logout(&self) {
        let response = self.client.get("/logout").dispatch().await;
        assert_eq!(response.status(), Status::SeeOther);
    }

    async fn post_form(&self, uri: &str, body: &str) -> LocalResponse<'_> {
        self.client
            .post(uri.to_string())
            .header(ContentType::Form)
            .body(body.to_string())
            .dispatch()
            .await
    }

    async fn json(&self, uri: &str) -> Value {
        self.client
            .get(uri.to_string())
            .dispatch()
            .await
            .into_json::<Value>()
            .await
            .expect("json body")
    }

    async fn home_page(&self) -> String {
        self.client
            .get("/")
            .dispatch()
            .await
            .into_string()
            .await
            .expect("home page")
    }

    fn user_count(&self) -> i64 {
        let mut c = SqliteConnection::establish(&self.db_path.display().to_string())
            .expect("database file");
        users::table.count().get_result(&mut c).expect("user count")
    }
}

const MUTATING_PAGES: [&str; 7] = [
    "/catalog/category/new/",
    "/catalog/item/new/",
    "/catalog/category/1/item/new/",
    "/catalog/item/1/edit/",
    "/catalog/item/1/delete/",
    "/catalog/category/1/edit/",
    "/catalog/category/1/delete/",
];

#[rocket::async_test]
async fn anonymous_users_are_sent_to_login() {
    let app = TestApp::new().await;

    for uri in MUTATING_PAGES {
        let response = app.client.get(uri).dispatch().await;
        assert_eq!(response.status(), Status::SeeOther, "GET {}", uri);
        assert_eq!(location(&response), Some("/login/"), "GET {}", uri);

        let response = app
            .post_form(uri, "name=Stick&description=Wood&category=1")
            .await;
        assert_eq!(response.status(), Status::SeeOther, "POST {}", uri);
        assert_eq!(location(&response), Some("/login/"), "POST {}", uri);
    }
}

#[rocket::async_test]
async fn anonymous_posts_with_missing_fields_are_sent_to_login() {
    let app = TestApp::new().await;

    for uri in MUTATING_PAGES {
        for body in ["", "name=Stick"] {
            let response = app.post_form(uri, body).await;
            assert_eq!(response.status(), Status::SeeOther, "POST {} {:?}", uri, body);
            assert_eq!(location(&response), Some("/login/"), "POST {} {:?}", uri, body);
        }
    }
}

#[rocket::async_test]
async fn missing_form_fields_become_notices() {
    let app = TestApp::new().await;
    app.login("alice").await;

    let response = app.post_form("/catalog/category/new/", "").await;
    assert_eq!(response.status(), Status::SeeOther);
    assert_eq!(location(&response), Some("/"));
    assert!(app
        .home_page()
        .await
        .contains("The category name cannot be empty."));

    app.post_form("/catalog/category/new/", "name=Hockey").await;

    let response = app.post_form("/catalog/category/1/item/new/", "").await;
    assert_eq!(response.status(), Status::SeeOther);
    assert_eq!(location(&response), Some("/"));
    assert!(app.home_page().await.contains("The item name cannot be empty."));

    let response = app.post_form("/catalog/item/new/", "name=Stick").await;
    assert_eq!(response.status(), Status::SeeOther);
    assert_eq!(location(&response), Some("/"));

    let response = app
        .post_form("/catalog/category/1/item/new/", "name=Stick")
        .await;
    assert_eq!(location(&response), Some("/catalog/item/1/"));

    let response = app.post_form("/catalog/item/1/edit/", "").await;
    assert_eq!(location(&response), Some("/catalog/item/1/"));
    let response = app.post_form("/catalog/category/1/edit/", "").await;
    assert_eq!(location(&response), Some("/"));

    let catalog = app.json("/api/v1/catalog.json").await;
    assert_eq!(catalog["catalog"][0]["name"], "Stick");
    assert_eq!(catalog["catalog"][0]["description"], "");
}

#[rocket::async_test]
async fn public_pages_need_no_login() {
    let app = TestApp::new().await;

    assert_eq!(app.client.get("/").dispatch().await.status(), Status::Ok);
    assert_eq!(app.client.get("/login/").dispatch().await.status(), Status::Ok);

    let response = app.client.get("/catalog/").dispatch().await;
    assert_eq!(location(&response), Some("/"));

    let response = app.client.get("/catalog/item/99/").dispatch().await;
    assert_eq!(response.status(), Status::SeeOther);
    assert_eq!(location(&response), Some("/"));
    assert!(app
        .home_page()
        .await
        .contains("The requested item does not exist."));
}

#[rocket::async_test]
async fn sign_in_requires_matching_state() {
    let app = TestApp::new().await;
    app.state_token().await;

    let response = app
        .client
        .post("/gconnect?state=forged")
        .body("user:alice")
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Unauthorized);
    let body = response.into_json::<Value>().await.expect("json error");
    assert_eq!(body["err"], "Invalid state parameter.");
    assert_eq!(app.user_count(), 0);
}

#[rocket::async_test]
async fn sign_in_failures_map_to_statuses() {
    let app = TestApp::new().await;

    assert_eq!(app.connect("garbage").await.status(), Status::Unauthorized);
    assert_eq!(
        app.connect("user:wrong-subject").await.status(),
        Status::Unauthorized
    );
    assert_eq!(
        app.connect("user:wrong-client").await.status(),
        Status::Unauthorized
    );
    assert_eq!(
        app.connect("user:provider-error").await.status(),
        Status::InternalServerError
    );
    assert_eq!(app.user_count(), 0);
}

#[rocket::async_test]
async fn repeated_sign_in_is_already_connected() {
    let app = TestApp::new().await;
    app.login("alice").await;
    assert_eq!(app.user_count(), 1);

    let response = app.connect("user:alice").await;
    assert_eq!(response.status(), Status::Ok);
    assert_eq!(
        response.into_string().await.as_deref(),
        Some("\"Current user is already connected.\"")
    );
    assert_eq!(app.user_count(), 1);
}

#[rocket::async_test]
async fn login_after_logout_reuses_user() {
    let app = TestApp::new().await;
    app.login("alice").await;
    app.logout().await;
    app.login("alice").await;

    assert_eq!(app.user_count(), 1);
    assert!(app.home_page().await.contains("alice"));
}

#[rocket::async_test]
async fn logout_clears_session_even_when_revoke_fails() {
    let app = TestApp::new().await;

    let response = app.client.get("/logout").dispatch().await;
    assert_eq!(location(&response), Some("/"));
    assert!(app.home_page().await.contains("You were not logged in!"));

    app.login("norevoke").await;
    app.logout().await;
    assert!(app
        .home_page()
        .await
        .contains("the provider token could not be revoked"));

    let response = app.client.get("/catalog/category/new/").dispatch().await;
    assert_eq!(location(&response), Some("/login/"));
}

#[rocket::async_test]
async fn empty_category_name_inserts_nothing() {
    let app = TestApp::new().await;
    app.login("alice").await;

    let response = app.post_form("/catalog/category/new/", "name=").await;
    assert_eq!(response.status(), Status::SeeOther);
    assert_eq!(location(&response), Some("/"));
    assert!(app
        .home_page()
        .await
        .contains("The category name cannot be empty."));

    let categories = app.json("/api/v1/categories/JSON").await;
    assert_eq!(categories["categories"].as_array().map(Vec::len), Some(0));
}

#[rocket::async_test]
async fn owner_builds_catalog() {
    let app = TestApp::new().await;
    app.login("alice").await;

    let response = app.post_form("/catalog/category/new/", "name=Hockey").await;
    assert_eq!(location(&response), Some("/catalog/category/1/items/"));

    let response = app
        .post_form("/catalog/category/1/item/new/", "name=Stick&description=Wood")
        .await;
    assert_eq!(location(&response), Some("/catalog/item/1/"));

    let response = app
        .post_form("/catalog/item/new/", "name=Puck&description=Rubber&category=1")
        .await;
    assert_eq!(location(&response), Some("/catalog/item/2/"));

    let response = app
        .post_form("/catalog/item/1/edit/", "name=&description=Carbon&category=1")
        .await;
    assert_eq!(location(&response), Some("/catalog/item/1/"));

    let catalog = app.json("/api/v1/catalog.json").await;
    let items = catalog["catalog"].as_array().expect("catalog list");
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["name"], "Puck");
    assert_eq!(items[1]["name"], "Stick");
    assert_eq!(items[1]["description"], "Carbon");

    let page = app
        .client
        .get("/catalog/item/1/")
        .dispatch()
        .await
        .into_string()
        .await
        .expect("item page");
    assert!(page.contains("Stick"));
    assert!(page.contains("Added by alice"));
}

#[rocket::async_test]
async fn others_cannot_mutate() {
    let app = TestApp::new().await;
    app.login("alice").await;
    app.post_form("/catalog/category/new/", "name=Hockey").await;
    app.post_form("/catalog/category/1/item/new/", "name=Stick&description=Wood")
        .await;
    app.logout().await;
    app.login("bob").await;

    for (uri, body) in [
        ("/catalog/category/1/edit/", "name=Mine"),
        ("/catalog/category/1/delete/", ""),
        ("/catalog/item/1/edit/", "name=Mine&description=Mine"),
        ("/catalog/item/1/delete/", ""),
        ("/catalog/category/1/item/new/", "name=Intruder&description=x"),
    ] {
        let response = app.client.get(uri).dispatch().await;
        assert_eq!(location(&response), Some("/"), "GET {}", uri);

        let response = app.post_form(uri, body).await;
        assert_eq!(response.status(), Status::SeeOther, "POST {}", uri);
        assert_eq!(location(&response), Some("/"), "POST {}", uri);
    }

    let categories = app.json("/api/v1/categories/JSON").await;
    assert_eq!(categories["categories"][0]["name"], "Hockey");
    let catalog = app.json("/api/v1/catalog.json").await;
    assert_eq!(catalog["catalog"].as_array().map(Vec::len), Some(1));
    assert_eq!(catalog["catalog"][0]["name"], "Stick");
}

#[rocket::async_test]
async fn deleting_category_removes_items() {
    let app = TestApp::new().await;
    app.login("alice").await;
    app.post_form("/catalog/category/new/", "name=Hockey").await;
    app.post_form("/catalog/category/1/item/new/", "name=Stick&description=Wood")
        .await;

    let response = app.post_form("/catalog/category/1/delete/", "").await;
    assert_eq!(location(&response), Some("/"));

    let response = app.client.get("/catalog/category/1/items/").dispatch().await;
    assert_eq!(response.status(), Status::SeeOther);
    assert_eq!(location(&response), Some("/"));
    assert!(app
        .home_page()
        .await
        .contains("The requested category does not exist."));

    let catalog = app.json("/api/v1/catalog.json").await;
    assert_eq!(catalog["catalog"].as_array().map(Vec::len), Some(0));
}

#[rocket::async_test]
async fn item_json_is_scoped_to_category() {
    let app = TestApp::new().await;
    app.login("alice").await;
    app.post_form("/catalog/category/new/", "name=Hockey").await;
    app.post_form("/catalog/category/new/", "name=Soccer").await;
    app.post_form("/catalog/category/1/item/new/", "name=Stick&description=Wood")
        .await;

    let response = app
        .client
        .get("/api/v1/categories/1/item/1/JSON")
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    let body = response.into_json::<Value>().await.expect("json body");
    assert_eq!(body["item"]["name"], "Stick");

    let response = app
        .client
        .get("/api/v1/categories/2/item/1/JSON")
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::NotFound);
    let body = response.into_json::<Value>().await.expect("json body");
    assert_eq!(body["error"], "Item 1 does not belong to category 2.");
    assert!(body.get("item").is_none());
}
