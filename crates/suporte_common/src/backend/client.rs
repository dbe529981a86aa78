//! Session-scoped REST client for the ticketing backend.

use super::credentials::CredentialProvider;
use super::session::{PhaseTrace, Session, SessionPhase};
use crate::config::{BackendConfig, ConfigError};
use crate::error::{BackendOperation, BridgeError};
use crate::ticket::{
    BackendCategory, CategoryDraft, CreatedItem, FollowupDraft, KnowbaseArticle, KnowbaseQuery,
    TicketDraft,
};
use reqwest::header::CONTENT_TYPE;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info, warn};

const APP_TOKEN_HEADER: &str = "App-Token";
const SESSION_TOKEN_HEADER: &str = "Session-Token";

/// Category listing range; the helpdesk pages results by range
const CATEGORY_RANGE: &str = "0-999";

/// Result of a category creation attempt
#[derive(Debug, Clone, PartialEq)]
pub enum CategoryCreation {
    Created(CreatedItem),
    /// Backend refused with "already exists"
    AlreadyExists { text: String },
}

/// Client for the ticketing backend. Cheap to clone.
#[derive(Clone)]
pub struct TicketingClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http: reqwest::Client,
    base_url: String,
    app_token: String,
    credentials: CredentialProvider,
}

impl std::fmt::Debug for TicketingClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TicketingClient")
            .field("base_url", &self.inner.base_url)
            .field("credentials", &self.inner.credentials)
            .finish()
    }
}

impl TicketingClient {
    /// Build a client from validated backend settings
    pub fn new(config: &BackendConfig) -> Result<Self, ConfigError> {
        let credentials = config.credentials()?;
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(Self {
            inner: Arc::new(ClientInner {
                http,
                base_url: config.base_url.trim_end_matches('/').to_string(),
                app_token: config.app_token.clone(),
                credentials,
            }),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    pub fn credentials(&self) -> &CredentialProvider {
        &self.inner.credentials
    }

    fn request(&self, method: Method, operation: BackendOperation) -> reqwest::RequestBuilder {
        let url = format!("{}/{}", self.inner.base_url, operation.endpoint());
        self.inner
            .http
            .request(method, url)
            .header(APP_TOKEN_HEADER, &self.inner.app_token)
            .header(CONTENT_TYPE, "application/json")
    }

    fn authed(
        &self,
        method: Method,
        operation: BackendOperation,
        session: &Session,
    ) -> reqwest::RequestBuilder {
        self.request(method, operation)
            .header(SESSION_TOKEN_HEADER, session.token())
    }

    /// Authenticate and obtain a session token
    pub async fn open_session(&self) -> Result<Session, BridgeError> {
        let operation = BackendOperation::InitSession;
        debug!(
            "Opening backend session ({})",
            self.inner.credentials.method_name()
        );

        let request = self
            .inner
            .credentials
            .authorize(self.request(Method::POST, operation));
        let (status, text) = send(operation, request).await?;

        if !(200..300).contains(&status) {
            return Err(BridgeError::Authentication {
                status: Some(status),
                reason: format!("backend rejected credentials (HTTP {})", status),
                text,
            });
        }

        let token = serde_json::from_str::<Value>(&text)
            .ok()
            .and_then(|body| {
                body.get("session_token")
                    .and_then(Value::as_str)
                    .map(str::to_string)
            })
            .filter(|token| !token.is_empty());

        match token {
            Some(token) => Ok(Session::new(token)),
            None => Err(BridgeError::Authentication {
                status: Some(status),
                reason: "response carries no session_token".to_string(),
                text,
            }),
        }
    }

    /// Terminate a session. Best-effort: failures are logged only.
    pub async fn close_session(&self, session: &Session) {
        let operation = BackendOperation::KillSession;
        let request = self.authed(Method::GET, operation, session);
        match send(operation, request).await {
            Ok((status, _)) if (200..300).contains(&status) => {
                debug!("Closed backend session {:?}", session);
            }
            Ok((status, text)) => {
                warn!(
                    "killSession returned HTTP {} for {:?}: {}",
                    status, session, text
                );
            }
            Err(e) => warn!("Failed to close backend session {:?}: {}", session, e),
        }
    }

    /// Create a ticket; the backend answers with the new id
    pub async fn create_ticket(
        &self,
        session: &Session,
        draft: &TicketDraft,
    ) -> Result<CreatedItem, BridgeError> {
        let operation = BackendOperation::CreateTicket;
        let request = self
            .authed(Method::POST, operation, session)
            .json(&draft.to_payload());
        let (status, text) = send_checked(operation, request).await?;
        let created = CreatedItem::parse(operation, status, &text)?;
        info!("Created ticket {} '{}'", created.id, draft.title);
        Ok(created)
    }

    pub async fn search_knowbase(
        &self,
        session: &Session,
        query: &KnowbaseQuery,
    ) -> Result<Vec<KnowbaseArticle>, BridgeError> {
        let operation = BackendOperation::SearchKnowbase;
        let request = self
            .authed(Method::GET, operation, session)
            .query(&query.to_query());
        let (status, text) = send_checked(operation, request).await?;
        let articles: Vec<KnowbaseArticle> = decode(operation, status, &text)?;
        debug!("Knowledge base search '{}': {} hits", query.text, articles.len());
        Ok(articles)
    }

    pub async fn add_followup(
        &self,
        session: &Session,
        followup: &FollowupDraft,
    ) -> Result<CreatedItem, BridgeError> {
        let operation = BackendOperation::AddFollowup;
        let request = self
            .authed(Method::POST, operation, session)
            .json(&followup.to_payload());
        let (status, text) = send_checked(operation, request).await?;
        let created = CreatedItem::parse(operation, status, &text)?;
        info!(
            "Added follow-up {} to ticket {}",
            created.id, followup.ticket_id
        );
        Ok(created)
    }

    pub async fn list_categories(
        &self,
        session: &Session,
    ) -> Result<Vec<BackendCategory>, BridgeError> {
        let operation = BackendOperation::ListCategories;
        let request = self
            .authed(Method::GET, operation, session)
            .query(&[("range", CATEGORY_RANGE)]);
        let (status, text) = send_checked(operation, request).await?;
        decode(operation, status, &text)
    }

    /// Look up one category by complete name. The backend search is a
    /// substring match, so only an exact complete name counts.
    pub async fn find_category(
        &self,
        session: &Session,
        completename: &str,
    ) -> Result<Option<BackendCategory>, BridgeError> {
        let operation = BackendOperation::ListCategories;
        let request = self.authed(Method::GET, operation, session).query(&[
            ("searchText[completename]", completename),
            ("range", CATEGORY_RANGE),
        ]);
        let (status, text) = send_checked(operation, request).await?;
        let found: Vec<BackendCategory> = decode(operation, status, &text)?;
        Ok(found.into_iter().find(|c| c.completename == completename))
    }

    pub async fn create_category(
        &self,
        session: &Session,
        draft: &CategoryDraft,
    ) -> Result<CategoryCreation, BridgeError> {
        let operation = BackendOperation::CreateCategory;
        let request = self
            .authed(Method::POST, operation, session)
            .json(&draft.to_payload());
        let (status, text) = send(operation, request).await?;

        if status == 400 && text.to_lowercase().contains("already exists") {
            debug!("Category '{}' already exists", draft.completename);
            return Ok(CategoryCreation::AlreadyExists { text });
        }
        if !(200..300).contains(&status) {
            return Err(BridgeError::BackendRequest {
                operation,
                status: Some(status),
                text,
            });
        }

        let created = CreatedItem::parse(operation, status, &text)?;
        info!("Created category {} '{}'", created.id, draft.completename);
        Ok(CategoryCreation::Created(created))
    }

    /// Run `op` inside a fresh session; the session is closed on every exit path
    pub async fn with_session<T, F, Fut>(&self, op: F) -> Result<T, BridgeError>
    where
        F: FnOnce(Session) -> Fut,
        Fut: Future<Output = Result<T, BridgeError>>,
    {
        self.with_session_traced(op).await.0
    }

    /// Like `with_session`, also returning the phases visited
    pub async fn with_session_traced<T, F, Fut>(
        &self,
        op: F,
    ) -> (Result<T, BridgeError>, PhaseTrace)
    where
        F: FnOnce(Session) -> Fut,
        Fut: Future<Output = Result<T, BridgeError>>,
    {
        let mut trace = PhaseTrace::new();
        trace.advance(SessionPhase::Authenticating);

        let session = match self.open_session().await {
            Ok(session) => session,
            Err(e) => {
                trace.advance(SessionPhase::Error);
                debug!("Session trace: {}", trace);
                return (Err(e), trace);
            }
        };
        trace.advance(SessionPhase::Authenticated);

        // Closes the session if `op` panics or this future is dropped
        let guard = SessionGuard::new(self.clone(), session.clone());

        trace.advance(SessionPhase::Operating);
        let result = op(session).await;
        if result.is_err() {
            trace.advance(SessionPhase::Error);
        }

        trace.advance(SessionPhase::Closing);
        guard.close().await;
        trace.advance(if result.is_ok() {
            SessionPhase::Done
        } else {
            SessionPhase::Error
        });

        debug!("Session trace: {}", trace);
        (result, trace)
    }
}

/// Owns an open session until it is closed
struct SessionGuard {
    client: TicketingClient,
    session: Session,
    closed: bool,
}

impl SessionGuard {
    fn new(client: TicketingClient, session: Session) -> Self {
        Self {
            client,
            session,
            closed: false,
        }
    }

    async fn close(mut self) {
        self.closed = true;
        self.client.close_session(&self.session).await;
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let client = self.client.clone();
                let session = self.session.clone();
                handle.spawn(async move {
                    client.close_session(&session).await;
                });
            }
            Err(_) => warn!("No runtime to close abandoned session {:?}", self.session),
        }
    }
}

/// Send a request and read the body. Transport failures and timeouts
/// become `BackendRequest` without a status.
async fn send(
    operation: BackendOperation,
    request: reqwest::RequestBuilder,
) -> Result<(u16, String), BridgeError> {
    let response = request.send().await.map_err(|e| BridgeError::BackendRequest {
        operation,
        status: None,
        text: transport_text(&e),
    })?;

    let status = response.status().as_u16();
    let text = response
        .text()
        .await
        .map_err(|e| BridgeError::BackendRequest {
            operation,
            status: Some(status),
            text: transport_text(&e),
        })?;

    debug!("{} -> HTTP {}", operation, status);
    Ok((status, text))
}

/// `send`, failing on any non-2xx status
async fn send_checked(
    operation: BackendOperation,
    request: reqwest::RequestBuilder,
) -> Result<(u16, String), BridgeError> {
    let (status, text) = send(operation, request).await?;
    if !(200..300).contains(&status) {
        return Err(BridgeError::BackendRequest {
            operation,
            status: Some(status),
            text,
        });
    }
    Ok((status, text))
}

fn decode<T: DeserializeOwned>(
    operation: BackendOperation,
    status: u16,
    text: &str,
) -> Result<T, BridgeError> {
    serde_json::from_str(text).map_err(|e| BridgeError::ResponseDecode {
        operation,
        status,
        reason: e.to_string(),
        text: text.to_string(),
    })
}

fn transport_text(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        format!("request timed out: {}", e)
    } else {
        e.to_string()
    }
}
