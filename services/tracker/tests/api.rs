//! End-to-end checks of the HTTP surface against a server on an ephemeral port.

use production_tracker_core::ports::DisabledRemote;
use production_tracker_core::{clock::SystemClock, TrackerService};
use reqwest::header::{COOKIE, SET_COOKIE};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use tracker_lib::adapters::FileStore;
use tracker_lib::config::Config;
use tracker_lib::web::{self, state::AppState};

struct TestServer {
    base: String,
    client: reqwest::Client,
    /// The `session=...` pair from the last login.
    cookie: Mutex<Option<String>>,
    _dir: TempDir,
}

impl TestServer {
    async fn start() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            bind_address: "127.0.0.1:0".parse().unwrap(),
            data_dir: PathBuf::from(dir.path()),
            log_level: tracing::Level::INFO,
            sheets_api_url: None,
            sheets_url_prefix: "https://script.google.com".to_string(),
            remote_timeout: Duration::from_secs(5),
            sync_interval: None,
            await_delete_mirror: true,
            await_write_mirror: false,
            seed_demo_data: false,
            cors_origin: "http://localhost:3000".to_string(),
            secure_cookies: false,
        };
        let store = FileStore::open(&config.data_dir).await.unwrap();
        let service = Arc::new(TrackerService::new(
            Arc::new(store),
            Arc::new(DisabledRemote),
            Arc::new(SystemClock),
            config.service_config(),
        ));
        service.init().await.unwrap();

        let app = web::router(Arc::new(AppState {
            service,
            config: Arc::new(config),
            shutdown: CancellationToken::new(),
        }));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base: format!("http://{addr}"),
            client: reqwest::Client::new(),
            cookie: Mutex::new(None),
            _dir: dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.client.request(method, self.url(path));
        match self.cookie.lock().unwrap().as_deref() {
            Some(cookie) => builder.header(COOKIE, cookie),
            None => builder,
        }
    }

    fn get(&self, path: &str) -> RequestBuilder {
        self.request(Method::GET, path)
    }

    fn post(&self, path: &str) -> RequestBuilder {
        self.request(Method::POST, path)
    }

    fn put(&self, path: &str) -> RequestBuilder {
        self.request(Method::PUT, path)
    }

    fn delete(&self, path: &str) -> RequestBuilder {
        self.request(Method::DELETE, path)
    }

    async fn login(&self, username: &str) -> Value {
        let response = self
            .post("/auth/login")
            .json(&json!({"username": username, "password": "password123"}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let cookie = response
            .headers()
            .get(SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap()
            .split(';')
            .next()
            .unwrap()
            .to_string();
        assert!(cookie.starts_with("session="));
        *self.cookie.lock().unwrap() = Some(cookie);
        response.json().await.unwrap()
    }
}

#[tokio::test]
async fn protected_routes_need_a_session() {
    let server = TestServer::start().await;

    let response = server.get("/production").send().await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = server.get("/auth/session").send().await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_hides_password_and_rejects_bad_credentials() {
    let server = TestServer::start().await;

    let user = server.login("Admin").await;
    assert_eq!(user["id"], "u1");
    assert!(user.get("password").is_none());

    let response = server
        .post("/auth/login")
        .json(&json!({"username": "admin", "password": "nope"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn plan_actual_and_delete_flow() {
    let server = TestServer::start().await;
    server.login("planner").await;

    let response = server
        .post("/production/plans")
        .json(&json!({
            "date": "2030-03-04",
            "category": "Healthcare",
            "process": "Mixing",
            "productName": "pain relief gel",
            "planQuantity": 600,
            "unit": "KG"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let plan: Value = response.json().await.unwrap();
    assert_eq!(plan["productName"], "PAIN RELIEF GEL");
    let id = plan["id"].as_str().unwrap().to_string();

    server.login("operator").await;
    let response = server
        .post(&format!("/production/{id}/actual"))
        .json(&json!({"actualQuantity": 540, "manpower": 4, "batchNo": "b-1"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let updated: Value = response.json().await.unwrap();
    assert_eq!(updated["actualQuantity"], 540.0);
    assert_eq!(updated["batchNo"], "B-1");

    // Operators may not delete.
    let response = server.delete(&format!("/production/{id}")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    server.login("manager").await;
    let response = server.delete(&format!("/production/{id}")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let outcome: Value = response.json().await.unwrap();
    assert_eq!(outcome["deleted"]["id"], id.as_str());
    assert_eq!(outcome["mirror"], "disabled");

    let response = server.delete(&format!("/production/{id}")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let logs: Vec<Value> = server
        .get("/logs")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let actions: Vec<&str> = logs.iter().filter_map(|l| l["action"].as_str()).collect();
    assert_eq!(actions, vec!["DELETE_RECORD", "RECORD_ACTUAL", "CREATE_PLAN"]);
}

#[tokio::test]
async fn off_day_rules_over_http() {
    let server = TestServer::start().await;
    server.login("admin").await;

    let response = server
        .post("/off-days")
        .json(&json!({"date": "2025-12-25"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = server
        .post("/production/plans")
        .json(&json!({
            "date": "2026-01-01",
            "category": "Toothpaste",
            "process": "Filling",
            "productName": "Minty Fresh",
            "planQuantity": 100
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(response.text().await.unwrap().contains("New Year"));
}

#[tokio::test]
async fn users_are_admin_only_and_keep_an_admin() {
    let server = TestServer::start().await;

    server.login("manager").await;
    let response = server.get("/users").send().await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    server.login("admin").await;
    let users: Vec<Value> = server
        .get("/users")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(users.len(), 5);
    assert!(users.iter().all(|u| u.get("password").is_none()));

    let response = server.delete("/users/u1").send().await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn sync_without_remote_reports_skipped() {
    let server = TestServer::start().await;
    server.login("admin").await;

    let report: Value = server
        .post("/sync")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(report["production"]["status"], "skipped");

    let response = server
        .put("/remote")
        .json(&json!({"url": "PASTE_YOUR_URL_HERE"}))
        .send()
        .await
        .unwrap();
    let status: Value = response.json().await.unwrap();
    assert_eq!(status["enabled"], false);
}

#[tokio::test]
async fn analytics_reject_malformed_months() {
    let server = TestServer::start().await;
    server.login("admin").await;

    let response = server
        .get("/analytics/monthly?category=Healthcare&month=2025-13")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let summary: Value = server
        .get("/analytics/monthly?category=Healthcare&month=2025-06")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(summary["plan"], 0.0);
    assert_eq!(summary["byProcess"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn other_clients_do_not_inherit_the_session() {
    let server = TestServer::start().await;
    server.login("admin").await;
    let stranger = reqwest::Client::new();

    for path in ["/users", "/remote", "/auth/session"] {
        let response = stranger.get(server.url(path)).send().await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{path}");
    }
    let response = stranger
        .get(server.url("/users"))
        .header(COOKIE, "session=not-the-issued-id")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let response = stranger.post(server.url("/sync")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let response = stranger.post(server.url("/auth/logout")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = server.get("/users").send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = server.post("/auth/logout").send().await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let response = server.get("/production").send().await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn a_new_login_revokes_the_previous_cookie() {
    let server = TestServer::start().await;
    server.login("manager").await;
    let old_cookie = server.cookie.lock().unwrap().clone().unwrap();

    server.login("admin").await;
    let response = server
        .client
        .get(server.url("/production"))
        .header(COOKIE, old_cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn daily_view_lists_off_days_without_entries() {
    let server = TestServer::start().await;
    server.login("admin").await;

    let groups: Vec<Value> = server
        .get("/analytics/daily?category=Healthcare&month=2025-12")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0]["date"], "2025-12-25");
    assert_eq!(groups[0]["isOffDay"], true);

    let processes: Vec<Value> = server
        .get("/analytics/processes?process=Mixing")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(processes.len(), 5);
}
