use axum::{
    Router,
    body::Body,
    http::{Request, Response, StatusCode, header},
};
use chrono::{DateTime, TimeZone, Utc};
use http_body_util::BodyExt;
use std::path::PathBuf;
use std::sync::{Arc, LazyLock, Mutex};
use tempfile::TempDir;
use tower::ServiceExt;

use agritrace_admin::api;
use agritrace_admin::api::auth::hash_password;
use agritrace_admin::config::Config;
use agritrace_admin::db::{AccountStore, ProductStore};
use agritrace_admin::models::{Account, AccountStatus, Product, Role};
use agritrace_admin::services::{Clock, SideFileService};
use agritrace_admin::state::SharedState;

const PASSWORD: &str = "hunter2hunter2";

/// Hashing is CPU-heavy; share one hash across every seeded account.
static PASSWORD_HASH: LazyLock<String> =
    LazyLock::new(|| hash_password(PASSWORD).expect("hash seed password"));

struct TestApp {
    app: Router,
    qr_dir: PathBuf,
    _dir: TempDir,
}

fn seed_account(username: &str, role: Role, status: AccountStatus) -> Account {
    Account {
        username: username.to_string(),
        password_hash: PASSWORD_HASH.clone(),
        role,
        status,
        created_at: None,
        updated_at: None,
    }
}

fn seed_product(id: &str, created_by: &str, scan_count: u64, minute: u32) -> Product {
    Product {
        id: id.to_string(),
        name: format!("Product {id}"),
        created_by: created_by.to_string(),
        created_at: Utc.with_ymd_and_hms(2026, 3, 1, 8, minute, 0).unwrap(),
        scan_count,
    }
}

/// Writes the fixed seed into a tempdir and returns a config pointing at it:
/// accounts admin / alice / minh (active) / dormant (inactive),
/// products p1+p3 by alice, p2 by minh.
async fn seeded_config(dir: &TempDir) -> Config {
    let data = dir.path();

    let mut config = Config::default();
    config.general.accounts_path = data.join("accounts.json").display().to_string();
    config.general.products_path = data.join("products.json").display().to_string();
    config.general.qr_path = data.join("qr").display().to_string();
    config.general.media_path = data.join("media").display().to_string();

    let accounts = AccountStore::new(&config.general.accounts_path);
    accounts
        .save(vec![
            seed_account("admin", Role::Admin, AccountStatus::Active),
            seed_account("alice", Role::Farmer, AccountStatus::Active),
            seed_account("minh", Role::Farmer, AccountStatus::Active),
            seed_account("dormant", Role::Farmer, AccountStatus::Inactive),
        ])
        .await
        .expect("seed accounts");

    let products = ProductStore::new(&config.general.products_path);
    products
        .save(vec![
            seed_product("p1", "alice", 3, 5),
            seed_product("p2", "minh", 2, 10),
            seed_product("p3", "alice", 0, 1),
        ])
        .await
        .expect("seed products");

    std::fs::create_dir_all(&config.general.qr_path).expect("create qr dir");

    config
}

async fn spawn_app() -> TestApp {
    let dir = tempfile::tempdir().expect("create tempdir");
    let config = seeded_config(&dir).await;
    let qr_dir = PathBuf::from(&config.general.qr_path);

    let state = api::create_app_state(config);
    TestApp {
        app: api::router(state),
        qr_dir,
        _dir: dir,
    }
}

async fn login(app: &Router, username: &str, password: &str) -> Response<Body> {
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(format!(
                    r#"{{"username":"{username}","password":"{password}"}}"#
                )))
                .unwrap(),
        )
        .await
        .unwrap()
}

/// Logs in and returns the session cookie to replay on later requests.
async fn session_cookie(app: &Router, username: &str) -> String {
    let response = login(app, username, PASSWORD).await;
    assert_eq!(response.status(), StatusCode::OK);
    response
        .headers()
        .get(header::SET_COOKIE)
        .expect("login sets a session cookie")
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string()
}

fn request(method: &str, uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).expect("response body is JSON")
}

#[tokio::test]
async fn admin_routes_reject_missing_and_non_admin_sessions() {
    let test = spawn_app().await;

    let response = test
        .app
        .clone()
        .oneshot(request("GET", "/api/admin/dashboard", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let cookie = session_cookie(&test.app, "alice").await;
    let response = test
        .app
        .clone()
        .oneshot(request("GET", "/api/admin/dashboard", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn login_rejects_bad_credentials_and_inactive_accounts() {
    let test = spawn_app().await;

    let response = login(&test.app, "admin", "wrong-password").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = login(&test.app, "nobody", PASSWORD).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = login(&test.app, "dormant", PASSWORD).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn dashboard_reports_store_totals() {
    let test = spawn_app().await;
    let cookie = session_cookie(&test.app, "admin").await;

    let response = test
        .app
        .clone()
        .oneshot(request("GET", "/api/admin/dashboard", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    let stats = &body["data"]["stats"];
    assert_eq!(stats["total_products"], 3);
    assert_eq!(stats["total_farmers"], 3);
    assert_eq!(stats["total_scans"], 5);
    assert_eq!(stats["recent_products"][0]["id"], "p2");
    assert_eq!(stats["recent_products"][2]["id"], "p3");
    assert_eq!(body["data"]["user"]["username"], "admin");
}

#[tokio::test]
async fn cascade_delete_removes_farmer_products_and_side_files() {
    let test = spawn_app().await;
    let cookie = session_cookie(&test.app, "admin").await;

    std::fs::write(test.qr_dir.join("p1.png"), b"png").unwrap();
    std::fs::write(test.qr_dir.join("p3.png"), b"png").unwrap();

    let response = test
        .app
        .clone()
        .oneshot(request("DELETE", "/api/admin/farmers/alice", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);

    let response = test
        .app
        .clone()
        .oneshot(request("GET", "/api/admin/farmers", Some(&cookie)))
        .await
        .unwrap();
    let farmers = body_json(response).await;
    let usernames: Vec<&str> = farmers["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["username"].as_str().unwrap())
        .collect();
    assert_eq!(usernames, vec!["minh", "dormant"]);

    let response = test
        .app
        .clone()
        .oneshot(request("GET", "/api/admin/products", Some(&cookie)))
        .await
        .unwrap();
    let products = body_json(response).await;
    let ids: Vec<&str> = products["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["p2"]);

    assert!(!test.qr_dir.join("p1.png").exists());
    assert!(!test.qr_dir.join("p3.png").exists());
}

#[tokio::test]
async fn reserved_admin_account_cannot_be_deleted() {
    let test = spawn_app().await;
    let cookie = session_cookie(&test.app, "admin").await;

    let response = test
        .app
        .clone()
        .oneshot(request("DELETE", "/api/admin/farmers/admin", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);

    // Collections untouched: the admin can still log in and sees all farmers.
    let response = test
        .app
        .clone()
        .oneshot(request("GET", "/api/admin/farmers", Some(&cookie)))
        .await
        .unwrap();
    let farmers = body_json(response).await;
    assert_eq!(farmers["data"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn delete_product_then_repeat_is_not_found() {
    let test = spawn_app().await;
    let cookie = session_cookie(&test.app, "admin").await;

    let response = test
        .app
        .clone()
        .oneshot(request("DELETE", "/api/admin/products/p2", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = test
        .app
        .clone()
        .oneshot(request("DELETE", "/api/admin/products/p2", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);

    let response = test
        .app
        .clone()
        .oneshot(request("GET", "/api/admin/products", Some(&cookie)))
        .await
        .unwrap();
    let products = body_json(response).await;
    assert_eq!(products["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn toggle_farmer_status_round_trips() {
    let test = spawn_app().await;
    let cookie = session_cookie(&test.app, "admin").await;

    let status_of = |farmers: serde_json::Value, username: &str| -> String {
        farmers["data"]
            .as_array()
            .unwrap()
            .iter()
            .find(|f| f["username"] == username)
            .unwrap()["status"]
            .as_str()
            .unwrap()
            .to_string()
    };

    let response = test
        .app
        .clone()
        .oneshot(request(
            "POST",
            "/api/admin/farmers/minh/toggle",
            Some(&cookie),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = test
        .app
        .clone()
        .oneshot(request("GET", "/api/admin/farmers", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(status_of(body_json(response).await, "minh"), "inactive");

    let response = test
        .app
        .clone()
        .oneshot(request(
            "POST",
            "/api/admin/farmers/minh/toggle",
            Some(&cookie),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = test
        .app
        .clone()
        .oneshot(request("GET", "/api/admin/farmers", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(status_of(body_json(response).await, "minh"), "active");

    // Unknown usernames are a silent success, preserved behavior.
    let response = test
        .app
        .clone()
        .oneshot(request(
            "POST",
            "/api/admin/farmers/ghost/toggle",
            Some(&cookie),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn farmer_detail_lists_products_most_recent_first() {
    let test = spawn_app().await;
    let cookie = session_cookie(&test.app, "admin").await;

    let response = test
        .app
        .clone()
        .oneshot(request("GET", "/api/admin/farmers/alice", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["farmer"]["product_count"], 2);
    assert_eq!(body["data"]["farmer"]["total_scans"], 3);
    assert_eq!(body["data"]["products"][0]["id"], "p1");
    assert_eq!(body["data"]["products"][1]["id"], "p3");

    // The admin account is not a farmer.
    let response = test
        .app
        .clone()
        .oneshot(request("GET", "/api/admin/farmers/admin", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn me_reports_the_session_account() {
    let test = spawn_app().await;

    let response = test
        .app
        .clone()
        .oneshot(request("GET", "/api/auth/me", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let cookie = session_cookie(&test.app, "admin").await;
    let response = test
        .app
        .clone()
        .oneshot(request("GET", "/api/auth/me", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["username"], "admin");
    assert_eq!(body["data"]["role"], "admin");
}

struct RecordingSideFiles {
    deleted: Mutex<Vec<String>>,
}

#[async_trait::async_trait]
impl SideFileService for RecordingSideFiles {
    async fn delete_side_files(&self, product_id: &str) -> anyhow::Result<()> {
        self.deleted.lock().unwrap().push(product_id.to_string());
        Ok(())
    }
}

struct FixedClock(DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Wires the app over injected collaborators and drives it end to end:
/// the cascade reports each owned product to the side-file collaborator,
/// and the toggle stamps `updated_at` from the injected clock.
#[tokio::test]
async fn injected_collaborators_observe_cascade_and_toggle() {
    let dir = tempfile::tempdir().expect("create tempdir");
    let config = seeded_config(&dir).await;

    let side_files = Arc::new(RecordingSideFiles {
        deleted: Mutex::new(Vec::new()),
    });
    let toggle_stamp = Utc.with_ymd_and_hms(2026, 3, 2, 12, 0, 0).unwrap();

    let shared = Arc::new(SharedState::with_collaborators(
        config,
        side_files.clone(),
        Arc::new(FixedClock(toggle_stamp)),
    ));
    let app = api::router(api::create_app_state_from_shared(shared));

    let cookie = session_cookie(&app, "admin").await;

    let response = app
        .clone()
        .oneshot(request("DELETE", "/api/admin/farmers/alice", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(*side_files.deleted.lock().unwrap(), vec!["p1", "p3"]);

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/admin/farmers/minh/toggle",
            Some(&cookie),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(request("GET", "/api/admin/farmers", Some(&cookie)))
        .await
        .unwrap();
    let farmers = body_json(response).await;
    let minh = farmers["data"]
        .as_array()
        .unwrap()
        .iter()
        .find(|f| f["username"] == "minh")
        .unwrap();
    assert_eq!(minh["status"], "inactive");
    let stamped: DateTime<Utc> = minh["updated_at"]
        .as_str()
        .unwrap()
        .parse()
        .expect("updated_at is RFC 3339");
    assert_eq!(stamped, toggle_stamp);
}

#[tokio::test]
async fn logout_ends_the_session() {
    let test = spawn_app().await;
    let cookie = session_cookie(&test.app, "admin").await;

    let response = test
        .app
        .clone()
        .oneshot(request("POST", "/api/auth/logout", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = test
        .app
        .clone()
        .oneshot(request("GET", "/api/admin/dashboard", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
