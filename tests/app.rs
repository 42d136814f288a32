//! The production router, wired to a Postgres address nothing listens on.

use reqwest::StatusCode;
use serde_json::{json, Value};
use std::collections::HashMap;
use tenant_iam::{app_router, AppState, Settings};

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        let env: HashMap<&str, &str> = HashMap::from([
            ("DB_USER", "iam"),
            ("DB_PASS", "p@ss word"),
            ("DB_HOST", "127.0.0.1"),
            ("DB_PORT", "1"),
            ("DB_CONNECT_TIMEOUT_SECS", "1"),
            ("DATABASE_NAMES", "acme, globex"),
            ("JWT_SECRET", "app-test-secret"),
        ]);
        let settings = Settings::from_lookup(|k| env.get(k).map(|v| v.to_string())).unwrap();
        let app = app_router(AppState::from_settings(&settings));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        TestServer { base_url, handle }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn token(client: &reqwest::Client, server: &TestServer, tenant: &str) -> String {
    let res = client
        .post(server.url("/generate-token"))
        .json(&json!({ "database": tenant }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    body["data"]["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn health_and_version() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client.get(server.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client.get(server.url("/version")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["name"], "tenant-iam");
}

#[tokio::test]
async fn ready_reports_tenants_without_pools() {
    let server = TestServer::spawn().await;
    let res = reqwest::Client::new()
        .get(server.url("/ready"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["tenants"], 0);
    assert_eq!(body["unavailable"], json!(["acme", "globex"]));
}

#[tokio::test]
async fn resources_require_a_token() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();
    for path in ["/users", "/groups", "/roles", "/users/abc/groups"] {
        let res = client.get(server.url(path)).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "{}", path);
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["error"]["message"], "Authorization header is required");
    }
}

#[tokio::test]
async fn unreachable_tenant_database_is_a_server_error() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let token = token(&client, &server, "acme").await;

    let res = client
        .get(server.url("/users"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"]["code"], "internal_error");
    assert_eq!(body["error"]["message"], "internal server error");
}

#[tokio::test]
async fn token_is_issued_without_touching_the_database() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();
    token(&client, &server, "globex").await;

    let res = client
        .post(server.url("/generate-token"))
        .json(&json!({ "database": "initech" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}
