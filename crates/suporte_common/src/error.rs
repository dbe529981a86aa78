//! Error taxonomy for the ticketing bridge.
//!
//! Every failure of a composite operation is one of these kinds. Each kind
//! keeps the raw backend status and text so callers can debug without
//! reproducing the request.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Backend call that produced a response or failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendOperation {
    InitSession,
    CreateTicket,
    SearchKnowbase,
    AddFollowup,
    ListCategories,
    CreateCategory,
    KillSession,
}

impl BackendOperation {
    /// Backend endpoint name, as it appears in the REST path
    pub fn endpoint(&self) -> &'static str {
        match self {
            BackendOperation::InitSession => "initSession",
            BackendOperation::CreateTicket => "Ticket",
            BackendOperation::SearchKnowbase => "KnowbaseItem",
            BackendOperation::AddFollowup => "ITILFollowup",
            BackendOperation::ListCategories | BackendOperation::CreateCategory => "ITILCategory",
            BackendOperation::KillSession => "killSession",
        }
    }
}

impl fmt::Display for BackendOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            BackendOperation::InitSession => "init session",
            BackendOperation::CreateTicket => "create ticket",
            BackendOperation::SearchKnowbase => "search knowledge base",
            BackendOperation::AddFollowup => "add follow-up",
            BackendOperation::ListCategories => "list categories",
            BackendOperation::CreateCategory => "create category",
            BackendOperation::KillSession => "kill session",
        };
        f.write_str(label)
    }
}

#[derive(Error, Debug)]
pub enum BridgeError {
    /// Backend rejected the credentials or did not issue a session token
    #[error("Authentication failed: {reason}")]
    Authentication {
        status: Option<u16>,
        reason: String,
        text: String,
    },

    /// Non-success status or transport failure (including timeouts)
    #[error("Backend request '{operation}' failed: {text}")]
    BackendRequest {
        operation: BackendOperation,
        status: Option<u16>,
        text: String,
    },

    /// Success status but the body is not the expected structure
    #[error("Could not decode '{operation}' response (HTTP {status}): {reason}")]
    ResponseDecode {
        operation: BackendOperation,
        status: u16,
        reason: String,
        text: String,
    },

    #[error("Invalid request: {0}")]
    Validation(String),

    /// The ticket exists; only the secondary spreadsheet log failed
    #[error("Ticket {ticket_id} was created but could not be logged: {reason}")]
    DownstreamLogging { ticket_id: u64, reason: String },
}

impl BridgeError {
    /// Step of the composite operation that failed
    pub fn stage(&self) -> &'static str {
        match self {
            BridgeError::Authentication { .. } => "authentication",
            BridgeError::BackendRequest { .. } => "backend_request",
            BridgeError::ResponseDecode { .. } => "response_decode",
            BridgeError::Validation(_) => "validation",
            BridgeError::DownstreamLogging { .. } => "downstream_logging",
        }
    }

    /// Raw backend status, when a response was received
    pub fn backend_status(&self) -> Option<u16> {
        match self {
            BridgeError::Authentication { status, .. } => *status,
            BridgeError::BackendRequest { status, .. } => *status,
            BridgeError::ResponseDecode { status, .. } => Some(*status),
            BridgeError::Validation(_) | BridgeError::DownstreamLogging { .. } => None,
        }
    }

    /// Raw backend text, empty when no response was received
    pub fn backend_text(&self) -> &str {
        match self {
            BridgeError::Authentication { text, .. }
            | BridgeError::BackendRequest { text, .. }
            | BridgeError::ResponseDecode { text, .. } => text,
            BridgeError::Validation(_) | BridgeError::DownstreamLogging { .. } => "",
        }
    }

    /// HTTP status the bridge answers with for this failure
    pub fn http_status(&self) -> u16 {
        match self {
            BridgeError::Validation(_) => 400,
            BridgeError::Authentication { .. }
            | BridgeError::BackendRequest { .. }
            | BridgeError::ResponseDecode { .. } => 502,
            BridgeError::DownstreamLogging { .. } => 500,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, BridgeError::Validation(_))
    }

    /// Structured payload returned to the caller
    pub fn to_payload(&self) -> ErrorPayload {
        ErrorPayload {
            error: self.to_string(),
            stage: self.stage().to_string(),
            status_code: self.backend_status(),
            text: self.backend_text().to_string(),
        }
    }
}

/// Error object returned to the front-end
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub error: String,
    pub stage: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(default)]
    pub text: String,
}
