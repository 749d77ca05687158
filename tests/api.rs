//! HTTP-level tests driving the assembled router through the real token
//! gate and middleware stack.

use std::str::FromStr;
use std::sync::Arc;

use axum::http::StatusCode;
use axum::{middleware::from_fn_with_state, Router};
use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use serde_json::{json, Value};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use pdfbox_core::core::config::{AuthConfig, LicenseSeed, UploadConfig};
use pdfbox_core::core::{middleware, schema};
use pdfbox_core::features::auth::routes as auth_routes;
use pdfbox_core::features::auth::services::{AuthService, LicenseService, TokenService};
use pdfbox_core::features::auth::AuthGate;
use pdfbox_core::features::boxes::{routes as boxes_routes, services::BoxService};
use pdfbox_core::features::entries::{routes as entries_routes, services::EntryService};
use pdfbox_core::features::files::{routes as files_routes, services::FileService};
use pdfbox_core::features::public::{routes as public_routes, services::PublicService};
use pdfbox_core::modules::storage::LocalStore;

struct TestApp {
    server: TestServer,
    _dir: tempfile::TempDir,
}

async fn spawn_app() -> TestApp {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .expect("valid sqlite options")
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .expect("in-memory sqlite pool");
    schema::initialize(&pool).await.expect("schema init");

    let dir = tempfile::tempdir().expect("tempdir");
    let storage = Arc::new(LocalStore::new(dir.path()));

    let tokens = Arc::new(TokenService::new(&AuthConfig {
        jwt_secret: "integration-secret".to_string(),
        token_ttl_secs: 3600,
    }));
    let licenses = Arc::new(LicenseService::new(pool.clone()));
    licenses
        .seed(&[LicenseSeed {
            code: "TEST-CODE".to_string(),
            max_uses: 10,
        }])
        .await
        .expect("license seed");
    let auth_service = Arc::new(AuthService::new(
        pool.clone(),
        Arc::clone(&tokens),
        licenses,
    ));
    let gate = Arc::new(AuthGate::new(pool.clone(), tokens));

    let box_service = Arc::new(BoxService::new(
        pool.clone(),
        Arc::clone(&storage),
        "http://localhost:3000".to_string(),
    ));
    let entry_service = Arc::new(EntryService::new(
        pool.clone(),
        Arc::clone(&storage),
        UploadConfig {
            dir: dir.path().display().to_string(),
            max_file_size: 1024 * 1024,
            max_files_per_upload: 5,
        },
    ));
    let public_service = Arc::new(PublicService::new(pool.clone()));
    let file_service = Arc::new(FileService::new(pool.clone(), storage));

    let protected = Router::new()
        .merge(auth_routes::protected_routes())
        .merge(boxes_routes::routes(box_service))
        .merge(entries_routes::routes(entry_service, 8 * 1024 * 1024))
        .route_layer(from_fn_with_state(
            Arc::clone(&gate),
            middleware::auth_middleware,
        ));

    let public = Router::new()
        .merge(auth_routes::public_routes(auth_service))
        .merge(public_routes::routes(public_service))
        .merge(files_routes::routes(file_service))
        .layer(from_fn_with_state(gate, middleware::optional_auth_middleware));

    let app = Router::new().merge(protected).merge(public);

    TestApp {
        server: TestServer::new(app).expect("test server"),
        _dir: dir,
    }
}

async fn register(server: &TestServer, email: &str, name: &str) -> String {
    let response = server
        .post("/api/auth/register")
        .json(&json!({
            "name": name,
            "email": email,
            "password": "secret1",
            "licenseCode": "TEST-CODE",
        }))
        .await;
    response.assert_status(StatusCode::CREATED);
    response.json::<Value>()["token"]
        .as_str()
        .expect("token in register response")
        .to_string()
}

fn pdf_part(data: &[u8], name: &str) -> Part {
    Part::bytes(data.to_vec())
        .file_name(name)
        .mime_type("application/pdf")
}

#[tokio::test]
async fn register_login_me_flow() {
    let app = spawn_app().await;
    let server = &app.server;

    let token = register(server, "alice@example.com", "Alice").await;

    // Token from registration works against the gate
    let me = server
        .get("/api/auth/me")
        .authorization_bearer(&token)
        .await;
    me.assert_status_ok();
    let body = me.json::<Value>();
    assert_eq!(body["email"], "alice@example.com");
    assert_eq!(body["name"], "Alice");

    // Fresh login issues a usable token too
    let login = server
        .post("/api/auth/login")
        .json(&json!({"email": "alice@example.com", "password": "secret1"}))
        .await;
    login.assert_status_ok();
    let login_token = login.json::<Value>()["token"].as_str().unwrap().to_string();
    server
        .get("/api/auth/me")
        .authorization_bearer(&login_token)
        .await
        .assert_status_ok();

    // Missing and invalid credentials
    server
        .get("/api/auth/me")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
    server
        .get("/api/auth/me")
        .authorization_bearer("not-a-token")
        .await
        .assert_status(StatusCode::FORBIDDEN);

    // Duplicate email registration conflicts
    let dup = server
        .post("/api/auth/register")
        .json(&json!({
            "name": "Alice Again",
            "email": "alice@example.com",
            "password": "secret1",
            "licenseCode": "TEST-CODE",
        }))
        .await;
    dup.assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn box_upload_share_delete_scenario() {
    let app = spawn_app().await;
    let server = &app.server;
    let token = register(server, "owner@example.com", "Owner").await;

    // Create a box
    let created = server
        .post("/api/boxes")
        .authorization_bearer(&token)
        .json(&json!({"name": "Quarterly Reports"}))
        .await;
    created.assert_status(StatusCode::CREATED);
    let box_id = created.json::<Value>()["id"].as_str().unwrap().to_string();
    assert_eq!(created.json::<Value>()["status"], "active");

    // Upload two PDFs under one title
    let form = MultipartForm::new()
        .add_text("title", "Q1 Report")
        .add_part("pdfs", pdf_part(b"%PDF-1.4 first", "q1-a.pdf"))
        .add_part("pdfs", pdf_part(b"%PDF-1.4 second", "q1-b.pdf"));
    let uploaded = server
        .post(&format!("/api/boxes/{}/pdfs", box_id))
        .authorization_bearer(&token)
        .multipart(form)
        .await;
    uploaded.assert_status(StatusCode::CREATED);
    let entries = uploaded.json::<Value>();
    let entries = entries.as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["title"], "Q1 Report (1)");
    assert_eq!(entries[1]["title"], "Q1 Report (2)");
    assert_eq!(entries[0]["hasFile"], true);
    assert_eq!(entries[0]["size"], b"%PDF-1.4 first".len() as i64);

    // Title-only entry
    let titled = server
        .post(&format!("/api/boxes/{}/titles", box_id))
        .authorization_bearer(&token)
        .json(&json!({"title": "Missing hardcopy"}))
        .await;
    titled.assert_status(StatusCode::CREATED);
    assert_eq!(titled.json::<Value>()["hasFile"], false);

    // Owner detail view sees all three entries
    let detail = server
        .get(&format!("/api/boxes/{}", box_id))
        .authorization_bearer(&token)
        .await;
    detail.assert_status_ok();
    assert_eq!(detail.json::<Value>()["pdfs"].as_array().unwrap().len(), 3);

    // QR code points at the public view
    let qr = server
        .get(&format!("/api/boxes/{}/qr", box_id))
        .authorization_bearer(&token)
        .await;
    qr.assert_status_ok();
    let qr_body = qr.json::<Value>();
    assert_eq!(
        qr_body["url"],
        format!("http://localhost:3000/view/{}", box_id)
    );
    assert!(qr_body["qrCode"]
        .as_str()
        .unwrap()
        .starts_with("data:image/svg+xml;base64,"));

    // Public view needs no token and hides owner-only fields
    let public_view = server.get(&format!("/api/public/boxes/{}", box_id)).await;
    public_view.assert_status_ok();
    let public_body = public_view.json::<Value>();
    assert_eq!(public_body["ownerName"], "Owner");
    assert_eq!(public_body["pdfCount"], 3);
    assert!(public_body.get("status").is_none());
    assert!(public_body.get("retentionDate").is_none());

    // Stats aggregate the uploads
    let stats = server
        .get(&format!("/api/public/boxes/{}/stats", box_id))
        .await;
    stats.assert_status_ok();
    let stats_body = stats.json::<Value>();
    assert_eq!(stats_body["totalEntries"], 3);
    assert_eq!(
        stats_body["totalSize"],
        (b"%PDF-1.4 first".len() + b"%PDF-1.4 second".len()) as i64
    );

    // Stored file is served with PDF headers
    let key = entries[0]["filename"].as_str().unwrap().to_string();
    let served = server.get(&format!("/api/files/{}", key)).await;
    served.assert_status_ok();
    assert_eq!(
        served.headers()["content-type"].to_str().unwrap(),
        "application/pdf"
    );
    assert!(served.headers()["content-disposition"]
        .to_str()
        .unwrap()
        .starts_with("inline"));
    let download = server.get(&format!("/api/files/{}/download", key)).await;
    download.assert_status_ok();
    assert!(download.headers()["content-disposition"]
        .to_str()
        .unwrap()
        .contains("attachment"));

    // Deleting the entry removes the file from the transfer surface
    let entry_id = entries[0]["id"].as_str().unwrap();
    server
        .delete(&format!("/api/boxes/{}/pdfs/{}", box_id, entry_id))
        .authorization_bearer(&token)
        .await
        .assert_status_ok();
    server
        .get(&format!("/api/files/{}", key))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    // Deleting the box removes the public view
    server
        .delete(&format!("/api/boxes/{}", box_id))
        .authorization_bearer(&token)
        .await
        .assert_status_ok();
    server
        .get(&format!("/api/public/boxes/{}", box_id))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn foreign_boxes_look_missing() {
    let app = spawn_app().await;
    let server = &app.server;
    let owner_token = register(server, "owner@example.com", "Owner").await;
    let other_token = register(server, "other@example.com", "Other").await;

    let created = server
        .post("/api/boxes")
        .authorization_bearer(&owner_token)
        .json(&json!({"name": "Private"}))
        .await;
    let box_id = created.json::<Value>()["id"].as_str().unwrap().to_string();

    server
        .get(&format!("/api/boxes/{}", box_id))
        .authorization_bearer(&other_token)
        .await
        .assert_status(StatusCode::NOT_FOUND);

    let form = MultipartForm::new()
        .add_text("title", "Sneak")
        .add_part("pdfs", pdf_part(b"%PDF-1.4", "sneak.pdf"));
    server
        .post(&format!("/api/boxes/{}/pdfs", box_id))
        .authorization_bearer(&other_token)
        .multipart(form)
        .await
        .assert_status(StatusCode::NOT_FOUND);

    server
        .delete(&format!("/api/boxes/{}", box_id))
        .authorization_bearer(&other_token)
        .await
        .assert_status(StatusCode::NOT_FOUND);

    // The owner still sees it
    server
        .get(&format!("/api/boxes/{}", box_id))
        .authorization_bearer(&owner_token)
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn upload_rejects_non_pdf_and_missing_title() {
    let app = spawn_app().await;
    let server = &app.server;
    let token = register(server, "owner@example.com", "Owner").await;

    let created = server
        .post("/api/boxes")
        .authorization_bearer(&token)
        .json(&json!({"name": "Box"}))
        .await;
    let box_id = created.json::<Value>()["id"].as_str().unwrap().to_string();

    let form = MultipartForm::new().add_text("title", "Nope").add_part(
        "pdfs",
        Part::bytes(b"GIF89a".to_vec())
            .file_name("image.gif")
            .mime_type("image/gif"),
    );
    server
        .post(&format!("/api/boxes/{}/pdfs", box_id))
        .authorization_bearer(&token)
        .multipart(form)
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let form = MultipartForm::new().add_part("pdfs", pdf_part(b"%PDF-1.4", "a.pdf"));
    server
        .post(&format!("/api/boxes/{}/pdfs", box_id))
        .authorization_bearer(&token)
        .multipart(form)
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unreferenced_file_keys_are_not_served() {
    let app = spawn_app().await;
    let server = &app.server;

    server
        .get("/api/files/no-such-key.pdf")
        .await
        .assert_status(StatusCode::NOT_FOUND);
    server
        .get("/api/files/no-such-key.pdf/download")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}
