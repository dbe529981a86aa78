//! Spreadsheet logger: one appended row per created ticket.
//!
//! Uses the Sheets v4 `values:append` endpoint with a bearer token obtained
//! outside the bridge. Failures never undo the ticket; they surface as
//! `BridgeError::DownstreamLogging`.

use crate::config::{ConfigError, SheetsConfig};
use crate::error::BridgeError;
use chrono::Local;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info};

/// Row timestamp format
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Clone)]
pub struct SheetsLogger {
    http: reqwest::Client,
    append_url: String,
    access_token: String,
}

impl std::fmt::Debug for SheetsLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SheetsLogger")
            .field("append_url", &self.append_url)
            .finish()
    }
}

impl SheetsLogger {
    /// Logger for the configured sheet, `None` when logging is disabled
    pub fn from_config(config: &SheetsConfig) -> Result<Option<Self>, ConfigError> {
        if !config.enabled {
            return Ok(None);
        }

        let spreadsheet_id = config
            .spreadsheet_id
            .as_deref()
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing("sheets.spreadsheet_id (GOOGLE_SHEET_ID)"))?;
        let access_token = config
            .access_token
            .as_deref()
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing(
                "sheets.access_token (GOOGLE_SHEETS_ACCESS_TOKEN)",
            ))?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        let append_url = format!(
            "{}/v4/spreadsheets/{}/values/{}:append",
            config.api_base.trim_end_matches('/'),
            spreadsheet_id,
            config.range
        );
        info!("Ticket log enabled for spreadsheet {}", spreadsheet_id);

        Ok(Some(Self {
            http,
            append_url,
            access_token: access_token.to_string(),
        }))
    }

    /// Append `(id, title, description, timestamp)`; the timestamp defaults to now
    pub async fn log_ticket(
        &self,
        ticket_id: u64,
        title: &str,
        description: &str,
        timestamp: Option<&str>,
    ) -> Result<(), BridgeError> {
        let timestamp = timestamp
            .map(str::to_string)
            .unwrap_or_else(|| Local::now().format(TIMESTAMP_FORMAT).to_string());
        let body = row_payload(ticket_id, title, description, &timestamp);

        let failed = |reason: String| BridgeError::DownstreamLogging { ticket_id, reason };

        let response = self
            .http
            .post(&self.append_url)
            .query(&[
                ("valueInputOption", "USER_ENTERED"),
                ("insertDataOption", "INSERT_ROWS"),
            ])
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| failed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(failed(format!("HTTP {}: {}", status.as_u16(), text)));
        }

        debug!("Logged ticket {} to spreadsheet", ticket_id);
        Ok(())
    }
}

fn row_payload(ticket_id: u64, title: &str, description: &str, timestamp: &str) -> serde_json::Value {
    json!({
        "values": [[ticket_id.to_string(), title, description, timestamp]]
    })
}
