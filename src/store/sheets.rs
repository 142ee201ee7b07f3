//! HTTP client for the remote spreadsheet store
//!
//! Talks to a Google-Sheets-shaped values/batchUpdate API addressed by a
//! fixed spreadsheet id. The bearer token is supplied out-of-band (see
//! `config::resolve_api_token`); this client never acquires tokens itself.

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::debug;
use serde_json::{Value, json};
use std::time::Duration;

use super::{SpreadsheetStore, StoreError};
use crate::config::StoreConfig;

pub struct SheetsClient {
    http: reqwest::Client,
    base_url: String,
    spreadsheet_id: String,
    token: String,
}

impl SheetsClient {
    /// Build the client. Constructed once per process and passed down;
    /// reqwest pools connections internally.
    pub fn new(config: &StoreConfig, token: String) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("ra-cli/0.1")
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            spreadsheet_id: config.spreadsheet_id.clone(),
            token,
        })
    }

    fn values_url(&self, range: &str) -> String {
        format!(
            "{}/v4/spreadsheets/{}/values/{}",
            self.base_url,
            self.spreadsheet_id,
            urlencoding::encode(range)
        )
    }

    async fn get_values(&self, range: &str) -> Result<Vec<Vec<String>>, StoreError> {
        let url = self.values_url(range);
        debug!("GET {}", url);
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(transport_error)?;
        let body = read_json(response).await?;
        let rows = body
            .get("values")
            .and_then(Value::as_array)
            .map(|rows| {
                rows.iter()
                    .map(|row| {
                        row.as_array()
                            .map(|cells| cells.iter().map(cell_to_string).collect())
                            .unwrap_or_default()
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(rows)
    }
}

#[async_trait]
impl SpreadsheetStore for SheetsClient {
    async fn add_sheet(&self, title: &str) -> Result<(), StoreError> {
        let url = format!(
            "{}/v4/spreadsheets/{}:batchUpdate",
            self.base_url, self.spreadsheet_id
        );
        debug!("POST {} (addSheet '{}')", url, title);
        let body = json!({
            "requests": [{ "addSheet": { "properties": { "title": title } } }]
        });
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        match read_json(response).await {
            Ok(_) => Ok(()),
            // The API rejects a taken title with a 400 naming the sheet.
            Err(StoreError::Request { status: 400, message })
                if message.to_lowercase().contains("already exists") =>
            {
                Err(StoreError::SheetExists(title.to_string()))
            }
            Err(e) => Err(e),
        }
    }

    async fn read_header(&self, sheet: &str) -> Result<Option<Vec<String>>, StoreError> {
        let rows = self.get_values(&format!("{}!1:1", sheet)).await?;
        Ok(rows.into_iter().next().filter(|row| !row.is_empty()))
    }

    async fn row_count(&self, sheet: &str) -> Result<usize, StoreError> {
        let rows = self.get_values(sheet).await?;
        Ok(rows.len())
    }

    async fn write_rows(
        &self,
        sheet: &str,
        start_row: usize,
        rows: &[Vec<String>],
    ) -> Result<(), StoreError> {
        if rows.is_empty() {
            return Ok(());
        }
        let width = rows.iter().map(Vec::len).max().unwrap_or(1);
        let range = format!(
            "{}!A{}:{}{}",
            sheet,
            start_row,
            column_letter(width),
            start_row + rows.len() - 1
        );
        let url = format!("{}?valueInputOption=RAW", self.values_url(&range));
        debug!("PUT {} ({} rows)", url, rows.len());
        let body = json!({
            "range": range,
            "majorDimension": "ROWS",
            "values": rows,
        });
        let response = self
            .http
            .put(&url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;
        read_json(response).await.map(|_| ())
    }
}

fn transport_error(e: reqwest::Error) -> StoreError {
    StoreError::Connection(e.to_string())
}

/// Check the response status and parse the JSON body, mapping credential
/// rejections to [`StoreError::Connection`].
async fn read_json(response: reqwest::Response) -> Result<Value, StoreError> {
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| StoreError::Connection(e.to_string()))?;

    if status.is_success() {
        return serde_json::from_str(&text).map_err(|e| StoreError::Request {
            status: status.as_u16(),
            message: format!("invalid JSON response: {}", e),
        });
    }

    let message = serde_json::from_str::<Value>(&text)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or(text);

    match status.as_u16() {
        401 | 403 => Err(StoreError::Connection(format!(
            "credentials rejected (HTTP {}): {}",
            status.as_u16(),
            message
        ))),
        code => Err(StoreError::Request { status: code, message }),
    }
}

fn cell_to_string(cell: &Value) -> String {
    match cell {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// 1-based column index to A1 letter ("A".."Z", "AA"..).
fn column_letter(index: usize) -> String {
    let mut n = index;
    let mut letters = String::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.insert(0, (b'A' + rem as u8) as char);
        n = (n - 1) / 26;
    }
    letters
}
