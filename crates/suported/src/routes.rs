//! API routes for suported
//!
//! Every failure answers with the structured error object
//! `{"error", "stage", "status_code", "text"}`.

use crate::server::AppState;
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use suporte_common::ticket::{AssistantReport, KnowbaseArticle, TicketRequest};
use suporte_common::{BridgeError, ErrorPayload};
use tracing::{info, warn};

type AppStateArc = Arc<AppState>;

/// Message returned for structured tickets
pub const TICKET_CREATED_MESSAGE: &str = "Chamado criado com sucesso!";

// ============================================================================
// Errors
// ============================================================================

/// Error response: HTTP status plus the structured payload
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    payload: ErrorPayload,
}

impl ApiError {
    fn forbidden() -> Self {
        Self {
            status: StatusCode::FORBIDDEN,
            payload: ErrorPayload {
                error: "Unauthorized".to_string(),
                stage: "authorization".to_string(),
                status_code: None,
                text: String::new(),
            },
        }
    }

    fn invalid(reason: String) -> Self {
        BridgeError::Validation(reason).into()
    }
}

impl From<BridgeError> for ApiError {
    fn from(err: BridgeError) -> Self {
        let status =
            StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if !err.is_validation() {
            warn!("  Request failed at {}: {}", err.stage(), err);
        }
        Self {
            status,
            payload: err.to_payload(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::invalid(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::invalid(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::invalid(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.payload)).into_response()
    }
}

// ============================================================================
// Ticket Routes
// ============================================================================

pub fn ticket_routes() -> Router<AppStateArc> {
    Router::new()
        .route("/v1/tickets/from-text", post(create_from_text))
        .route("/v1/tickets", post(create_ticket))
        .route("/v1/tickets/:id/followups", post(add_followup))
        // Paths used by front-ends deployed before the /v1 prefix
        .route("/chamado", post(create_chamado))
        .route("/create-ticket", post(create_ticket))
        .route("/create-ticket/", post(create_ticket))
}

#[derive(Debug, Deserialize)]
pub struct FromTextRequest {
    #[serde(default)]
    pub texto: Option<String>,
}

async fn create_from_text(
    State(state): State<AppStateArc>,
    payload: Result<Json<FromTextRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(req) = payload?;
    open_from_text(&state, req.texto.unwrap_or_default()).await
}

/// Legacy form: `texto` as a query parameter, or in a JSON body
async fn create_chamado(
    State(state): State<AppStateArc>,
    query: Result<Query<FromTextRequest>, QueryRejection>,
    body: Option<Json<FromTextRequest>>,
) -> Result<Json<Value>, ApiError> {
    let Query(query) = query?;
    let texto = query
        .texto
        .or_else(|| body.and_then(|Json(req)| req.texto))
        .unwrap_or_default();
    open_from_text(&state, texto).await
}

async fn open_from_text(state: &AppState, texto: String) -> Result<Json<Value>, ApiError> {
    let outcome = state.desk.create_from_text(&texto).await?;
    if let Some(category) = &outcome.category {
        info!(
            "  Ticket {} opened in {} [{}]",
            outcome.ticket_id(),
            category.display_path,
            category.id
        );
    }
    Ok(Json(outcome.to_response_json()))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TicketCreatedResponse {
    pub message: String,
    pub ticket_id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logging_warning: Option<ErrorPayload>,
}

async fn create_ticket(
    State(state): State<AppStateArc>,
    payload: Result<Json<TicketRequest>, JsonRejection>,
) -> Result<Json<TicketCreatedResponse>, ApiError> {
    let Json(req) = payload?;
    let outcome = state.desk.create_ticket(req).await?;
    info!("  Ticket {} opened", outcome.ticket_id());

    Ok(Json(TicketCreatedResponse {
        message: TICKET_CREATED_MESSAGE.to_string(),
        ticket_id: outcome.ticket_id(),
        logging_warning: outcome.logging_warning.as_ref().map(BridgeError::to_payload),
    }))
}

#[derive(Debug, Deserialize)]
pub struct FollowupRequest {
    #[serde(default)]
    pub content: Option<String>,
}

async fn add_followup(
    State(state): State<AppStateArc>,
    id: Result<Path<u64>, PathRejection>,
    payload: Result<Json<FollowupRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let Path(ticket_id) = id?;
    let Json(req) = payload?;

    let created = state
        .desk
        .add_followup(ticket_id, req.content.as_deref().unwrap_or_default())
        .await?;
    Ok((StatusCode::CREATED, Json(created.raw)))
}

// ============================================================================
// Assistant Routes
// ============================================================================

pub fn assistant_routes() -> Router<AppStateArc> {
    Router::new()
        .route("/v1/assistant/webhook", post(assistant_webhook))
        .route("/armazenar-infos", post(assistant_webhook))
}

fn bearer_matches(headers: &HeaderMap, key: &str) -> bool {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|token| token == key)
        .unwrap_or(false)
}

async fn assistant_webhook(
    State(state): State<AppStateArc>,
    headers: HeaderMap,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let authorized = state
        .assistant_key
        .as_deref()
        .map(|key| bearer_matches(&headers, key))
        .unwrap_or(false);
    if !authorized {
        warn!("  Rejected assistant webhook call: bad or missing bearer key");
        return Err(ApiError::forbidden());
    }

    let Json(data) = payload?;
    let report: AssistantReport = serde_json::from_value(data.clone())
        .map_err(|e| ApiError::invalid(format!("invalid assistant payload: {}", e)))?;

    let outcome = state.desk.create_from_assistant(&report).await?;
    info!("  Assistant ticket {} opened", outcome.ticket_id());

    let mut body = json!({
        "status": "success",
        "ticket_id": outcome.ticket_id(),
        "collected_data": data,
    });
    if let Some(warning) = &outcome.logging_warning {
        body["logging_warning"] = json!(warning.to_payload());
    }
    Ok(Json(body))
}

// ============================================================================
// Knowledge Base Routes
// ============================================================================

pub fn knowbase_routes() -> Router<AppStateArc> {
    Router::new().route("/v1/knowbase/search", get(search_knowbase))
}

#[derive(Debug, Deserialize)]
pub struct KnowbaseParams {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
}

async fn search_knowbase(
    State(state): State<AppStateArc>,
    params: Result<Query<KnowbaseParams>, QueryRejection>,
) -> Result<Json<Vec<KnowbaseArticle>>, ApiError> {
    let Query(params) = params?;
    let articles = state
        .desk
        .search_knowbase(params.q.as_deref().unwrap_or_default(), params.limit)
        .await?;
    Ok(Json(articles))
}

// ============================================================================
// Health Routes
// ============================================================================

pub fn health_routes() -> Router<AppStateArc> {
    Router::new()
        .route("/health", get(health_check))
        .route("/v1/health", get(health_check))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: suporte_common::VERSION.to_string(),
    })
}
