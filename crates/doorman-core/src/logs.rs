//! Gateway request log search.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ConsoleError, Result};
use crate::session::ConsoleClient;

/// One gateway log line.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LogEntry {
    pub timestamp: String,
    pub level: String,
    pub message: String,
    pub source: String,
    pub user: Option<String>,
    pub api: Option<String>,
    pub endpoint: Option<String>,
    pub request_id: Option<String>,
    pub group: Option<String>,
    pub role: Option<String>,
    pub status_code: Option<u16>,
    pub method: Option<String>,
    pub ip_address: Option<String>,
    pub response_time: Option<f64>,
    pub request_size: Option<u64>,
    pub response_size: Option<u64>,
    pub protocol: Option<String>,
    pub user_agent: Option<String>,
}

/// Log search filters. Empty filters are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogFilter {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub user: Option<String>,
    pub api: Option<String>,
    pub endpoint: Option<String>,
    pub request_id: Option<String>,
    pub group: Option<String>,
    pub role: Option<String>,
    pub status_code: Option<String>,
    pub method: Option<String>,
    pub ip_address: Option<String>,
    pub min_response_time: Option<String>,
    pub max_response_time: Option<String>,
    pub protocol: Option<String>,
}

impl LogFilter {
    /// Query parameters for the non-empty filters, in a fixed order.
    #[must_use]
    pub fn query(&self) -> Vec<(&'static str, String)> {
        [
            ("start_date", &self.start_date),
            ("end_date", &self.end_date),
            ("start_time", &self.start_time),
            ("end_time", &self.end_time),
            ("user", &self.user),
            ("api", &self.api),
            ("endpoint", &self.endpoint),
            ("request_id", &self.request_id),
            ("group", &self.group),
            ("role", &self.role),
            ("status_code", &self.status_code),
            ("method", &self.method),
            ("ip_address", &self.ip_address),
            ("min_response_time", &self.min_response_time),
            ("max_response_time", &self.max_response_time),
            ("protocol", &self.protocol),
        ]
        .into_iter()
        .filter_map(|(key, value)| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(|v| (key, v.to_owned()))
        })
        .collect()
    }
}

/// Fetch log lines matching `filter`.
///
/// # Errors
///
/// Returns any transport, API or decode error.
pub async fn search(client: &ConsoleClient, filter: &LogFilter) -> Result<Vec<LogEntry>> {
    let body: Value = client
        .request("GET", "/platform/logs", &filter.query(), None)
        .await?;
    let items = match body {
        Value::Object(mut map) => map.remove("logs").unwrap_or(Value::Null),
        other => other,
    };
    if items.is_null() {
        return Ok(Vec::new());
    }
    serde_json::from_value(items).map_err(|e| ConsoleError::Decode(format!("logs: {e}")))
}
