//! Composite service-desk operations.
//!
//! Each operation validates its input, runs exactly one backend call inside
//! a fresh session and, for ticket creation, appends the ticket to the
//! spreadsheet log. A logging failure never fails the operation; it comes
//! back as `TicketOutcome::logging_warning`.

use crate::backend::{PhaseTrace, TicketingClient};
use crate::classifier::Classifier;
use crate::config::{ConfigError, SuporteConfig};
use crate::error::BridgeError;
use crate::sheets::SheetsLogger;
use crate::taxonomy::CategoryEntry;
use crate::ticket::{
    AssistantReport, CreatedItem, FollowupDraft, KnowbaseArticle, KnowbaseQuery, TicketDraft,
    TicketRequest,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

/// A created ticket and what happened around it
#[derive(Debug)]
pub struct TicketOutcome {
    pub ticket: CreatedItem,
    /// Set for classified tickets
    pub category: Option<CategoryEntry>,
    /// The ticket exists but the spreadsheet log failed
    pub logging_warning: Option<BridgeError>,
    pub trace: PhaseTrace,
}

impl TicketOutcome {
    pub fn ticket_id(&self) -> u64 {
        self.ticket.id
    }

    /// Backend response echoed to the caller, with any logging warning attached
    pub fn to_response_json(&self) -> Value {
        let Some(warning) = &self.logging_warning else {
            return self.ticket.raw.clone();
        };
        let warning = serde_json::to_value(warning.to_payload()).unwrap_or(Value::Null);

        match self.ticket.raw.clone() {
            Value::Object(mut map) => {
                map.insert("logging_warning".to_string(), warning);
                Value::Object(map)
            }
            other => serde_json::json!({ "ticket": other, "logging_warning": warning }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServiceDesk {
    classifier: Arc<Classifier>,
    client: TicketingClient,
    logger: Option<SheetsLogger>,
}

impl ServiceDesk {
    pub fn new(classifier: Classifier, client: TicketingClient, logger: Option<SheetsLogger>) -> Self {
        Self {
            classifier: Arc::new(classifier),
            client,
            logger,
        }
    }

    pub fn from_config(config: &SuporteConfig) -> Result<Self, ConfigError> {
        let classifier = Classifier::from_config(&config.classifier)?;
        let client = TicketingClient::new(&config.backend)?;
        let logger = SheetsLogger::from_config(&config.sheets)?;
        info!(
            "Service desk ready: {} categories, {:?} matching, backend {}",
            classifier.taxonomy().len(),
            classifier.policy(),
            client.base_url()
        );
        Ok(Self::new(classifier, client, logger))
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub fn client(&self) -> &TicketingClient {
        &self.client
    }

    pub fn classify(&self, text: &str) -> &CategoryEntry {
        self.classifier.classify(text)
    }

    /// Classify free text and open a ticket in the chosen category
    pub async fn create_from_text(&self, text: &str) -> Result<TicketOutcome, BridgeError> {
        if text.trim().is_empty() {
            return Err(BridgeError::Validation("'texto' is required".to_string()));
        }

        let category = self.classify(text).clone();
        let draft = TicketDraft::from_classification(text, &category);
        let mut outcome = self.create(draft).await?;
        outcome.category = Some(category);
        Ok(outcome)
    }

    /// Open an unclassified ticket for a known requester
    pub async fn create_ticket(&self, request: TicketRequest) -> Result<TicketOutcome, BridgeError> {
        let draft = request.into_draft()?;
        self.create(draft).await
    }

    /// Open a ticket from a voice-assistant report
    pub async fn create_from_assistant(
        &self,
        report: &AssistantReport,
    ) -> Result<TicketOutcome, BridgeError> {
        let draft = report.to_draft()?;
        self.create(draft).await
    }

    pub async fn search_knowbase(
        &self,
        text: &str,
        limit: Option<usize>,
    ) -> Result<Vec<KnowbaseArticle>, BridgeError> {
        let mut query = KnowbaseQuery::new(text)?;
        if let Some(limit) = limit {
            query = query.with_limit(limit);
        }
        let client = &self.client;
        let query = &query;
        client
            .with_session(|session| async move { client.search_knowbase(&session, query).await })
            .await
    }

    pub async fn add_followup(
        &self,
        ticket_id: u64,
        content: &str,
    ) -> Result<CreatedItem, BridgeError> {
        let followup = FollowupDraft::new(ticket_id, content)?;
        let client = &self.client;
        let followup = &followup;
        client
            .with_session(|session| async move { client.add_followup(&session, followup).await })
            .await
    }

    async fn create(&self, draft: TicketDraft) -> Result<TicketOutcome, BridgeError> {
        let client = &self.client;
        let payload = &draft;
        let (result, trace) = client
            .with_session_traced(|session| async move {
                client.create_ticket(&session, payload).await
            })
            .await;
        let ticket = result?;

        let mut logging_warning = None;
        if let Some(logger) = &self.logger {
            if let Err(e) = logger
                .log_ticket(ticket.id, &draft.title, &draft.content, None)
                .await
            {
                warn!("{}", e);
                logging_warning = Some(e);
            }
        }

        Ok(TicketOutcome {
            ticket,
            category: None,
            logging_warning,
            trace,
        })
    }
}
