//! Daemon routes exercised through the router with `oneshot`.

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::routing::{get, post};
use axum::Router;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use suporte_common::config::BackendConfig;
use suporte_common::{Classifier, MatchPolicy, ServiceDesk, Taxonomy, TicketingClient};
use suported::server::{router, AppState};
use tower::ServiceExt;

const ASSISTANT_KEY: &str = "vapi-test-key";
const BODY_LIMIT: usize = 64 * 1024;

// ============================================================================
// Fake helpdesk
// ============================================================================

#[derive(Default)]
struct Helpdesk {
    kills: AtomicUsize,
    tickets: Mutex<Vec<Value>>,
}

async fn start_helpdesk() -> (String, Arc<Helpdesk>) {
    let state = Arc::new(Helpdesk::default());

    let kill_state = state.clone();
    let ticket_state = state.clone();
    let app = Router::new()
        .route(
            "/apirest.php/initSession",
            post(|| async { axum::Json(json!({"session_token": "sess-routes-test"})) }),
        )
        .route(
            "/apirest.php/killSession",
            get(move || async move {
                kill_state.kills.fetch_add(1, Ordering::SeqCst);
                StatusCode::OK
            }),
        )
        .route(
            "/apirest.php/Ticket",
            post(move |axum::Json(body): axum::Json<Value>| async move {
                ticket_state.tickets.lock().unwrap().push(body);
                (
                    StatusCode::CREATED,
                    axum::Json(json!({"id": 555, "message": "Item successfully added: 555"})),
                )
            }),
        )
        .route(
            "/apirest.php/KnowbaseItem",
            get(|| async { axum::Json(json!([{"id": 3, "name": "Reset de senha"}])) }),
        )
        .route(
            "/apirest.php/ITILFollowup",
            post(|| async { (StatusCode::CREATED, axum::Json(json!({"id": 77}))) }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}/apirest.php", addr), state)
}

fn app_for(base_url: &str) -> Router {
    let backend = BackendConfig {
        base_url: base_url.to_string(),
        app_token: "app".to_string(),
        user_token: Some("token".to_string()),
        timeout_secs: 5,
        ..Default::default()
    };
    let desk = ServiceDesk::new(
        Classifier::new(Taxonomy::builtin(), MatchPolicy::All),
        TicketingClient::new(&backend).unwrap(),
        None,
    );
    router(
        AppState::new(desk, Some(ASSISTANT_KEY.to_string())),
        BODY_LIMIT,
    )
}

/// Router whose backend is never reached
fn offline_app() -> Router {
    app_for("http://127.0.0.1:9/apirest.php")
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn read_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn test_health_routes() {
    for uri in ["/health", "/v1/health"] {
        let response = offline_app()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["version"], suporte_common::VERSION);
    }
}

// ============================================================================
// Validation
// ============================================================================

#[tokio::test]
async fn test_missing_texto_is_400() {
    let response = offline_app()
        .oneshot(post_json("/v1/tickets/from-text", json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json(response).await;
    assert_eq!(body["stage"], "validation");
    assert!(body["error"].as_str().unwrap().contains("texto"));
}

#[tokio::test]
async fn test_malformed_json_is_400() {
    let request = Request::builder()
        .method("POST")
        .uri("/v1/tickets/from-text")
        .header("content-type", "application/json")
        .body(Body::from("{\"texto\": "))
        .unwrap();
    let response = offline_app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(read_json(response).await["stage"], "validation");
}

#[tokio::test]
async fn test_structured_ticket_requires_fields() {
    let response = offline_app()
        .oneshot(post_json(
            "/v1/tickets",
            json!({"title": "Mouse", "description": ""}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_followup_bad_ticket_id() {
    let response = offline_app()
        .oneshot(post_json("/v1/tickets/abc/followups", json!({"content": "x"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unreachable_backend_is_502() {
    let response = offline_app()
        .oneshot(post_json(
            "/v1/tickets/from-text",
            json!({"texto": "A VPN não conecta"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = read_json(response).await;
    assert_eq!(body["stage"], "backend_request");
    assert!(body.get("status_code").is_none());
}

// ============================================================================
// Assistant webhook authorization
// ============================================================================

#[tokio::test]
async fn test_webhook_requires_bearer_key() {
    let body = json!({"name": "Ana", "issue_description": "Wi-Fi caiu"});

    let missing = offline_app()
        .oneshot(post_json("/v1/assistant/webhook", body.clone()))
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::FORBIDDEN);

    let mut request = post_json("/v1/assistant/webhook", body);
    request
        .headers_mut()
        .insert("authorization", "Bearer wrong".parse().unwrap());
    let wrong = offline_app().oneshot(request).await.unwrap();
    assert_eq!(wrong.status(), StatusCode::FORBIDDEN);
}

// ============================================================================
// Backend round trips
// ============================================================================

#[tokio::test]
async fn test_from_text_echoes_backend_json() {
    let (base_url, helpdesk) = start_helpdesk().await;

    let response = app_for(&base_url)
        .oneshot(post_json(
            "/v1/tickets/from-text",
            json!({"texto": "não consigo acessar a internet"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["id"], 555);
    assert_eq!(body["message"], "Item successfully added: 555");
    assert!(body.get("logging_warning").is_none());

    let tickets = helpdesk.tickets.lock().unwrap().clone();
    assert_eq!(tickets[0]["input"]["itilcategories_id"], 32);
    assert_eq!(helpdesk.kills.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_structured_ticket_response() {
    let (base_url, _helpdesk) = start_helpdesk().await;

    let response = app_for(&base_url)
        .oneshot(post_json(
            "/v1/tickets",
            json!({
                "title": "Teclado",
                "description": "Teclas travadas",
                "requester_email": "ana@example.com"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["message"], "Chamado criado com sucesso!");
    assert_eq!(body["ticket_id"], 555);
}

#[tokio::test]
async fn test_webhook_creates_ticket() {
    let (base_url, helpdesk) = start_helpdesk().await;

    let mut request = post_json(
        "/v1/assistant/webhook",
        json!({
            "name": "Ana",
            "issue_description": "Wi-Fi caiu",
            "contact_email": "ana@example.com"
        }),
    );
    request.headers_mut().insert(
        "authorization",
        format!("Bearer {}", ASSISTANT_KEY).parse().unwrap(),
    );

    let response = app_for(&base_url).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["status"], "success");
    assert_eq!(body["ticket_id"], 555);
    assert_eq!(body["collected_data"]["name"], "Ana");

    let tickets = helpdesk.tickets.lock().unwrap().clone();
    assert_eq!(tickets[0]["input"]["name"], "Problema Técnico - Ana");
}

#[tokio::test]
async fn test_knowbase_and_followup() {
    let (base_url, helpdesk) = start_helpdesk().await;
    let app = app_for(&base_url);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/v1/knowbase/search?q=senha")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let articles = read_json(response).await;
    assert_eq!(articles[0]["name"], "Reset de senha");

    let response = app
        .oneshot(post_json(
            "/v1/tickets/555/followups",
            json!({"content": "Senha redefinida"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(read_json(response).await["id"], 77);

    assert_eq!(helpdesk.kills.load(Ordering::SeqCst), 2);
}

// ============================================================================
// Legacy paths
// ============================================================================

#[tokio::test]
async fn test_chamado_accepts_query_texto() {
    let (base_url, helpdesk) = start_helpdesk().await;

    let request = Request::builder()
        .method("POST")
        .uri("/chamado?texto=A%20VPN%20n%C3%A3o%20conecta")
        .body(Body::empty())
        .unwrap();
    let response = app_for(&base_url).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json(response).await["id"], 555);
    let tickets = helpdesk.tickets.lock().unwrap().clone();
    assert_eq!(tickets[0]["input"]["itilcategories_id"], 33);
}

#[tokio::test]
async fn test_chamado_accepts_json_texto() {
    let (base_url, helpdesk) = start_helpdesk().await;

    let response = app_for(&base_url)
        .oneshot(post_json("/chamado", json!({"texto": "Impressora sem toner"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let tickets = helpdesk.tickets.lock().unwrap().clone();
    assert_eq!(tickets[0]["input"]["itilcategories_id"], 22);
}

#[tokio::test]
async fn test_chamado_without_texto_is_400() {
    let request = Request::builder()
        .method("POST")
        .uri("/chamado")
        .body(Body::empty())
        .unwrap();
    let response = offline_app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_ticket_legacy_path() {
    let (base_url, _helpdesk) = start_helpdesk().await;

    for uri in ["/create-ticket/", "/create-ticket"] {
        let response = app_for(&base_url)
            .oneshot(post_json(
                uri,
                json!({
                    "title": "Teclado",
                    "description": "Teclas travadas",
                    "requester_email": "ana@example.com"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{}", uri);
        let body = read_json(response).await;
        assert_eq!(body["message"], "Chamado criado com sucesso!");
        assert_eq!(body["ticket_id"], 555);
    }
}

#[tokio::test]
async fn test_armazenar_infos_is_the_webhook() {
    let (base_url, _helpdesk) = start_helpdesk().await;
    let body = json!({"name": "Ana", "issue_description": "Wi-Fi caiu"});

    let unauthorized = app_for(&base_url)
        .oneshot(post_json("/armazenar-infos", body.clone()))
        .await
        .unwrap();
    assert_eq!(unauthorized.status(), StatusCode::FORBIDDEN);

    let mut request = post_json("/armazenar-infos", body);
    request.headers_mut().insert(
        "authorization",
        format!("Bearer {}", ASSISTANT_KEY).parse().unwrap(),
    );
    let response = app_for(&base_url).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json(response).await["status"], "success");
}
