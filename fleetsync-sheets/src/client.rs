//! Google Sheets v4 values client.
//!
//! An upsert overwrites the block starting at `A1` with the new rows, then
//! clears everything below it so rows from a previous, longer upload do not
//! linger. Both steps address fixed ranges, so repeating an upsert is a no-op.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use fleetsync_core::{Credentials, FIELD_COUNT};

use crate::error::UploadError;
use crate::publisher::SheetSink;

pub const SHEETS_ENDPOINT: &str = "https://sheets.googleapis.com";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ValueRange<'a> {
    range: &'a str,
    major_dimension: &'static str,
    values: &'a [Vec<String>],
}

#[derive(Debug, Serialize)]
struct BatchClear {
    ranges: Vec<String>,
}

/// Last column letter of the fixed schema (`F` for six columns).
fn last_column() -> char {
    (b'A' + FIELD_COUNT as u8 - 1) as char
}

/// Range covering exactly `row_count` rows of the schema, from `A1`.
fn data_range(row_count: usize) -> String {
    format!("A1:{}{}", last_column(), row_count.max(1))
}

/// Open-ended range for every row after the first `row_count`.
fn stale_range(row_count: usize) -> String {
    format!("A{}:{}", row_count + 1, last_column())
}

/// Blocking Sheets client. Call from `spawn_blocking` in async contexts.
pub struct SheetsClient {
    agent: ureq::Agent,
    endpoint: String,
    credentials: Arc<Credentials>,
}

impl SheetsClient {
    pub fn new(credentials: Arc<Credentials>) -> Self {
        Self::with_endpoint(SHEETS_ENDPOINT, credentials)
    }

    pub fn with_endpoint(endpoint: impl Into<String>, credentials: Arc<Credentials>) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(REQUEST_TIMEOUT).build();
        Self {
            agent,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            credentials,
        }
    }

    fn authorize(&self, request: ureq::Request) -> Result<ureq::Request, UploadError> {
        Ok(match self.credentials.authorization()? {
            Some(header) => request.set("Authorization", &header),
            None => request,
        })
    }

    fn update(&self, spreadsheet_id: &str, rows: &[Vec<String>]) -> Result<(), UploadError> {
        let range = data_range(rows.len());
        let url = format!(
            "{}/v4/spreadsheets/{spreadsheet_id}/values/{range}",
            self.endpoint
        );
        let request = self
            .authorize(self.agent.put(&url))?
            .query("valueInputOption", "RAW");
        request
            .send_json(ValueRange {
                range: &range,
                major_dimension: "ROWS",
                values: rows,
            })
            .map_err(|e| UploadError::from_ureq(&url, e))?;
        Ok(())
    }

    fn clear_below(&self, spreadsheet_id: &str, row_count: usize) -> Result<(), UploadError> {
        let url = format!(
            "{}/v4/spreadsheets/{spreadsheet_id}/values:batchClear",
            self.endpoint
        );
        self.authorize(self.agent.post(&url))?
            .send_json(BatchClear {
                ranges: vec![stale_range(row_count)],
            })
            .map_err(|e| UploadError::from_ureq(&url, e))?;
        Ok(())
    }
}

impl SheetSink for SheetsClient {
    fn upsert(&self, spreadsheet_id: &str, rows: &[Vec<String>]) -> Result<(), UploadError> {
        self.update(spreadsheet_id, rows)?;
        self.clear_below(spreadsheet_id, rows.len())?;
        tracing::debug!(spreadsheet_id, rows = rows.len(), "sheet values replaced");
        Ok(())
    }
}
