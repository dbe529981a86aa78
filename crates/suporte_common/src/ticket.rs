//! Ticket, follow-up, knowledge-base and category payloads.
//!
//! Wire shapes follow the helpdesk REST API: writes are wrapped in
//! `{"input": {...}}`, created items answer with `{"id": ...}`.

use crate::error::{BackendOperation, BridgeError};
use crate::taxonomy::CategoryEntry;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Ticket type: incident
pub const TICKET_TYPE_INCIDENT: u8 = 1;

/// Ticket status: new
pub const TICKET_STATUS_NEW: u8 = 1;

/// Priority used for voice-assistant reports
pub const ASSISTANT_PRIORITY: u8 = 3;

/// Prefix of the content of classified tickets
pub const REPORTED_PREFIX: &str = "Usuário relatou: ";

/// Input for ticket creation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketDraft {
    pub title: String,
    pub content: String,
    pub category_id: Option<u32>,
    pub ticket_type: u8,
    pub status: u8,
    pub priority: Option<u8>,
    pub entities_id: Option<u32>,
    pub requester: Option<String>,
}

#[derive(Serialize)]
struct RequesterRef<'a> {
    name: &'a str,
}

#[derive(Serialize)]
struct TicketInput<'a> {
    name: &'a str,
    content: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    itilcategories_id: Option<u32>,
    #[serde(rename = "type")]
    ticket_type: u8,
    status: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    priority: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    entities_id: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    requester: Option<Vec<RequesterRef<'a>>>,
}

impl TicketDraft {
    /// Incident/new ticket with no category
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            category_id: None,
            ticket_type: TICKET_TYPE_INCIDENT,
            status: TICKET_STATUS_NEW,
            priority: None,
            entities_id: None,
            requester: None,
        }
    }

    /// Ticket titled after the category, embedding the reported text
    pub fn from_classification(text: &str, category: &CategoryEntry) -> Self {
        Self::new(
            category.display_path.clone(),
            format!("{}{}", REPORTED_PREFIX, text.trim()),
        )
        .with_category(category.id)
    }

    pub fn with_category(mut self, category_id: u32) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_entity(mut self, entities_id: u32) -> Self {
        self.entities_id = Some(entities_id);
        self
    }

    pub fn with_requester(mut self, requester: impl Into<String>) -> Self {
        self.requester = Some(requester.into());
        self
    }

    /// `{"input": {...}}` body for `POST /Ticket`
    pub fn to_payload(&self) -> Value {
        let input = TicketInput {
            name: &self.title,
            content: &self.content,
            itilcategories_id: self.category_id,
            ticket_type: self.ticket_type,
            status: self.status,
            priority: self.priority,
            entities_id: self.entities_id,
            requester: self
                .requester
                .as_deref()
                .map(|name| vec![RequesterRef { name }]),
        };
        serde_json::json!({ "input": input })
    }
}

/// Item created by the backend, with the raw response kept for echoing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreatedItem {
    pub id: u64,
    pub raw: Value,
}

impl CreatedItem {
    /// Parse a creation response; the body must be JSON carrying an `id`
    pub fn parse(operation: BackendOperation, status: u16, text: &str) -> Result<Self, BridgeError> {
        let raw: Value = serde_json::from_str(text).map_err(|e| BridgeError::ResponseDecode {
            operation,
            status,
            reason: e.to_string(),
            text: text.to_string(),
        })?;

        // Some deployments answer a single-item POST with a one-element array
        let id_holder = match &raw {
            Value::Array(items) if items.len() == 1 => &items[0],
            other => other,
        };

        let id = id_holder
            .get("id")
            .and_then(json_id)
            .ok_or_else(|| BridgeError::ResponseDecode {
                operation,
                status,
                reason: "response has no 'id' field".to_string(),
                text: text.to_string(),
            })?;

        Ok(Self { id, raw })
    }
}

/// Accept ids sent as numbers or numeric strings
fn json_id(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

/// Structured, non-classified ticket request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TicketRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub requester_email: Option<String>,
}

impl TicketRequest {
    pub fn into_draft(self) -> Result<TicketDraft, BridgeError> {
        let title = required(self.title, "title")?;
        let description = required(self.description, "description")?;
        let email = required(self.requester_email, "requester_email")?;
        if !email.contains('@') {
            return Err(BridgeError::Validation(format!(
                "requester_email '{}' is not an e-mail address",
                email
            )));
        }
        Ok(TicketDraft::new(title, description).with_requester(email))
    }
}

/// Problem report collected by the voice assistant
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssistantReport {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub issue_description: Option<String>,
    #[serde(default)]
    pub contact_email: Option<String>,
}

impl AssistantReport {
    pub fn to_draft(&self) -> Result<TicketDraft, BridgeError> {
        let name = required(self.name.clone(), "name")?;
        let issue = required(self.issue_description.clone(), "issue_description")?;

        let mut content = format!("Problema relatado por {}\nProblema: {}\n", name, issue);
        if let Some(email) = self
            .contact_email
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
        {
            content.push_str(&format!("E-mail de contato: {}", email));
        }

        Ok(TicketDraft::new(format!("Problema Técnico - {}", name), content)
            .with_priority(ASSISTANT_PRIORITY)
            .with_entity(0))
    }
}

fn required(value: Option<String>, field: &str) -> Result<String, BridgeError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| BridgeError::Validation(format!("'{}' is required", field)))
}

/// Follow-up added to an existing ticket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowupDraft {
    pub ticket_id: u64,
    pub content: String,
}

impl FollowupDraft {
    pub fn new(ticket_id: u64, content: &str) -> Result<Self, BridgeError> {
        if ticket_id == 0 {
            return Err(BridgeError::Validation("ticket id must be positive".to_string()));
        }
        let content = required(Some(content.to_string()), "content")?;
        Ok(Self { ticket_id, content })
    }

    pub fn to_payload(&self) -> Value {
        serde_json::json!({
            "input": {
                "itemtype": "Ticket",
                "items_id": self.ticket_id,
                "content": self.content,
            }
        })
    }
}

/// Knowledge-base search request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnowbaseQuery {
    pub text: String,
    pub limit: usize,
}

/// Default number of knowledge-base articles returned
pub const DEFAULT_KNOWBASE_LIMIT: usize = 10;

impl KnowbaseQuery {
    pub fn new(text: &str) -> Result<Self, BridgeError> {
        let text = required(Some(text.to_string()), "q")?;
        Ok(Self {
            text,
            limit: DEFAULT_KNOWBASE_LIMIT,
        })
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit.clamp(1, 100);
        self
    }

    /// Query string: name search plus a result range
    pub fn to_query(&self) -> Vec<(String, String)> {
        vec![
            ("searchText[name]".to_string(), self.text.clone()),
            ("range".to_string(), format!("0-{}", self.limit - 1)),
        ]
    }
}

/// Knowledge-base article as returned by the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowbaseArticle {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub answer: Option<String>,
}

/// Ticket category as stored in the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendCategory {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub completename: String,
    /// Parent id, 0 for top-level categories
    #[serde(default)]
    pub itilcategories_id: u64,
    #[serde(default)]
    pub level: u32,
}

/// Category to create in the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryDraft {
    pub name: String,
    pub completename: String,
    pub comment: String,
    pub level: u32,
    pub parent_id: Option<u64>,
}

impl CategoryDraft {
    pub fn to_payload(&self) -> Value {
        let mut input = serde_json::json!({
            "name": self.name,
            "completename": self.completename,
            "comment": self.comment,
            "level": self.level,
            "is_active": 1,
        });
        if let Some(parent) = self.parent_id {
            input["itilcategories_id"] = Value::from(parent);
        }
        serde_json::json!({ "input": input })
    }
}
