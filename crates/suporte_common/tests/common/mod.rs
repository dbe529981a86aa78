//! In-process fake helpdesk for integration tests.
//!
//! Serves the REST endpoints the bridge consumes on an ephemeral port and
//! records every call so tests can assert on the session lifecycle.

#![allow(dead_code)]

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::Router;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use suporte_common::config::{BackendConfig, SheetsConfig};
use suporte_common::sheets::SheetsLogger;
use suporte_common::{Classifier, MatchPolicy, ServiceDesk, Taxonomy, TicketingClient};

pub const SESSION_TOKEN: &str = "sess-0123456789";
pub const APP_TOKEN: &str = "app-token-test";
pub const USER_TOKEN: &str = "user-token-test";

/// How the fake backend answers
#[derive(Debug, Clone)]
pub struct MockBehavior {
    pub fail_auth: bool,
    pub omit_session_token: bool,
    pub ticket_status: u16,
    /// `None` answers `{"id": next_ticket_id, ...}`
    pub ticket_body: Option<String>,
    pub next_ticket_id: u64,
    pub ticket_delay: Option<Duration>,
    pub sheets_status: u16,
    /// Complete names left out of the plain category listing
    pub unlisted_categories: Vec<String>,
}

impl Default for MockBehavior {
    fn default() -> Self {
        Self {
            fail_auth: false,
            omit_session_token: false,
            ticket_status: 201,
            ticket_body: None,
            next_ticket_id: 1001,
            ticket_delay: None,
            sheets_status: 200,
            unlisted_categories: Vec::new(),
        }
    }
}

#[derive(Default)]
pub struct MockState {
    pub behavior: Mutex<MockBehavior>,
    pub init_calls: AtomicUsize,
    pub kill_calls: AtomicUsize,
    pub ticket_calls: AtomicUsize,
    pub init_headers: Mutex<Vec<HeaderMap>>,
    pub init_bodies: Mutex<Vec<String>>,
    pub ticket_bodies: Mutex<Vec<Value>>,
    pub ticket_headers: Mutex<Vec<HeaderMap>>,
    pub kill_tokens: Mutex<Vec<String>>,
    pub knowbase_queries: Mutex<Vec<HashMap<String, String>>>,
    pub followups: Mutex<Vec<Value>>,
    pub categories: Mutex<Vec<Value>>,
    pub sheet_rows: Mutex<Vec<Value>>,
}

pub struct MockBackend {
    pub addr: SocketAddr,
    pub state: Arc<MockState>,
}

impl MockBackend {
    pub async fn start() -> Self {
        Self::with_behavior(MockBehavior::default()).await
    }

    pub async fn with_behavior(behavior: MockBehavior) -> Self {
        let state = Arc::new(MockState {
            behavior: Mutex::new(behavior),
            ..Default::default()
        });

        let app = Router::new()
            .route("/apirest.php/initSession", post(init_session))
            .route("/apirest.php/killSession", get(kill_session))
            .route("/apirest.php/Ticket", post(create_ticket))
            .route("/apirest.php/KnowbaseItem", get(search_knowbase))
            .route("/apirest.php/ITILFollowup", post(add_followup))
            .route(
                "/apirest.php/ITILCategory",
                get(list_categories).post(create_category),
            )
            .route("/v4/spreadsheets/:id/values/:range", post(append_row))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}/apirest.php", self.addr)
    }

    pub fn backend_config(&self) -> BackendConfig {
        BackendConfig {
            base_url: self.base_url(),
            app_token: APP_TOKEN.to_string(),
            user_token: Some(USER_TOKEN.to_string()),
            timeout_secs: 5,
            ..Default::default()
        }
    }

    pub fn sheets_config(&self) -> SheetsConfig {
        SheetsConfig {
            enabled: true,
            spreadsheet_id: Some("sheet-test".to_string()),
            access_token: Some("ya29.test".to_string()),
            api_base: format!("http://{}", self.addr),
            ..Default::default()
        }
    }

    pub fn client(&self) -> TicketingClient {
        TicketingClient::new(&self.backend_config()).unwrap()
    }

    pub fn desk(&self, with_sheets: bool) -> ServiceDesk {
        let logger = if with_sheets {
            SheetsLogger::from_config(&self.sheets_config()).unwrap()
        } else {
            None
        };
        ServiceDesk::new(
            Classifier::new(Taxonomy::builtin(), MatchPolicy::All),
            self.client(),
            logger,
        )
    }

    pub fn set_behavior(&self, update: impl FnOnce(&mut MockBehavior)) {
        update(&mut self.state.behavior.lock().unwrap());
    }

    pub fn seed_category(&self, id: u64, completename: &str) {
        let name = completename.rsplit(" > ").next().unwrap_or(completename);
        self.state.categories.lock().unwrap().push(json!({
            "id": id,
            "name": name,
            "completename": completename,
            "itilcategories_id": 0,
            "level": completename.matches(" > ").count() + 1,
        }));
    }

    pub fn init_calls(&self) -> usize {
        self.state.init_calls.load(Ordering::SeqCst)
    }

    pub fn kill_calls(&self) -> usize {
        self.state.kill_calls.load(Ordering::SeqCst)
    }

    pub fn ticket_calls(&self) -> usize {
        self.state.ticket_calls.load(Ordering::SeqCst)
    }

    pub fn last_ticket(&self) -> Value {
        self.state
            .ticket_bodies
            .lock()
            .unwrap()
            .last()
            .cloned()
            .unwrap_or(Value::Null)
    }

    /// Wait for a background close (spawned from a guard drop)
    pub async fn wait_for_kill(&self, expected: usize) {
        for _ in 0..50 {
            if self.kill_calls() >= expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }
}

fn header(headers: &HeaderMap, name: &str) -> String {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

fn has_session(headers: &HeaderMap) -> bool {
    header(headers, "Session-Token") == SESSION_TOKEN && header(headers, "App-Token") == APP_TOKEN
}

async fn init_session(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, String) {
    state.init_calls.fetch_add(1, Ordering::SeqCst);
    state.init_headers.lock().unwrap().push(headers);
    state.init_bodies.lock().unwrap().push(body);

    let behavior = state.behavior.lock().unwrap().clone();
    if behavior.fail_auth {
        return (
            StatusCode::UNAUTHORIZED,
            json!(["ERROR_GLPI_LOGIN_USER_TOKEN", "parameter user_token seems invalid"])
                .to_string(),
        );
    }
    if behavior.omit_session_token {
        return (StatusCode::OK, "{}".to_string());
    }
    (
        StatusCode::OK,
        json!({ "session_token": SESSION_TOKEN }).to_string(),
    )
}

async fn kill_session(State(state): State<Arc<MockState>>, headers: HeaderMap) -> StatusCode {
    state.kill_calls.fetch_add(1, Ordering::SeqCst);
    state
        .kill_tokens
        .lock()
        .unwrap()
        .push(header(&headers, "Session-Token"));
    StatusCode::OK
}

async fn create_ticket(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, String) {
    state.ticket_calls.fetch_add(1, Ordering::SeqCst);
    let behavior = state.behavior.lock().unwrap().clone();

    if let Some(delay) = behavior.ticket_delay {
        tokio::time::sleep(delay).await;
    }
    if !has_session(&headers) {
        return (
            StatusCode::UNAUTHORIZED,
            json!(["ERROR_SESSION_TOKEN_INVALID", "session_token seems invalid"]).to_string(),
        );
    }

    state
        .ticket_bodies
        .lock()
        .unwrap()
        .push(serde_json::from_str(&body).unwrap_or(Value::Null));
    state.ticket_headers.lock().unwrap().push(headers);

    let status = StatusCode::from_u16(behavior.ticket_status).unwrap();
    let body = behavior.ticket_body.unwrap_or_else(|| {
        json!({
            "id": behavior.next_ticket_id,
            "message": format!("Item successfully added: {}", behavior.next_ticket_id),
        })
        .to_string()
    });
    (status, body)
}

async fn search_knowbase(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> (StatusCode, String) {
    if !has_session(&headers) {
        return (StatusCode::UNAUTHORIZED, "[]".to_string());
    }
    state.knowbase_queries.lock().unwrap().push(params);
    (
        StatusCode::OK,
        json!([
            {"id": 11, "name": "Como configurar a VPN", "answer": "<p>Passo a passo</p>"},
            {"id": 12, "name": "VPN sem conexão"}
        ])
        .to_string(),
    )
}

async fn add_followup(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, String) {
    if !has_session(&headers) {
        return (StatusCode::UNAUTHORIZED, "[]".to_string());
    }
    state
        .followups
        .lock()
        .unwrap()
        .push(serde_json::from_str(&body).unwrap_or(Value::Null));
    (
        StatusCode::CREATED,
        json!({"id": 900, "message": "Item successfully added"}).to_string(),
    )
}

async fn list_categories(
    State(state): State<Arc<MockState>>,
    Query(params): Query<HashMap<String, String>>,
) -> (StatusCode, String) {
    let categories = state.categories.lock().unwrap().clone();
    let categories: Vec<Value> = match params.get("searchText[completename]") {
        // substring search, like the real backend
        Some(needle) => categories
            .into_iter()
            .filter(|c| {
                c["completename"]
                    .as_str()
                    .is_some_and(|name| name.contains(needle.as_str()))
            })
            .collect(),
        None => {
            let hidden = state.behavior.lock().unwrap().unlisted_categories.clone();
            categories
                .into_iter()
                .filter(|c| !hidden.iter().any(|h| c["completename"] == h.as_str()))
                .collect()
        }
    };
    (StatusCode::OK, Value::Array(categories).to_string())
}

async fn create_category(State(state): State<Arc<MockState>>, body: String) -> (StatusCode, String) {
    let body: Value = serde_json::from_str(&body).unwrap_or(Value::Null);
    let input = &body["input"];
    let completename = input["completename"].as_str().unwrap_or_default().to_string();

    let mut categories = state.categories.lock().unwrap();
    if categories.iter().any(|c| c["completename"] == completename.as_str()) {
        return (
            StatusCode::BAD_REQUEST,
            json!(["ERROR_GLPI_ADD", "Category already exists"]).to_string(),
        );
    }

    let id = categories.len() as u64 + 1;
    categories.push(json!({
        "id": id,
        "name": input["name"],
        "completename": completename,
        "itilcategories_id": input.get("itilcategories_id").cloned().unwrap_or(json!(0)),
        "level": input["level"],
    }));
    (StatusCode::CREATED, json!({ "id": id }).to_string())
}

async fn append_row(
    State(state): State<Arc<MockState>>,
    Path((_id, _range)): Path<(String, String)>,
    body: String,
) -> (StatusCode, String) {
    let status = state.behavior.lock().unwrap().sheets_status;
    if status >= 300 {
        return (
            StatusCode::from_u16(status).unwrap(),
            json!({"error": {"code": status, "message": "The caller does not have permission"}})
                .to_string(),
        );
    }
    state
        .sheet_rows
        .lock()
        .unwrap()
        .push(serde_json::from_str(&body).unwrap_or(Value::Null));
    (StatusCode::OK, json!({"updates": {"updatedRows": 1}}).to_string())
}
