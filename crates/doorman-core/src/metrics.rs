//! Gateway monitoring metrics.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ConsoleError, Result};
use crate::session::ConsoleClient;

/// Time window for the metrics series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MetricsRange {
    Hour,
    #[default]
    Day,
    Week,
    Month,
}

impl MetricsRange {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hour => "1h",
            Self::Day => "24h",
            Self::Week => "7d",
            Self::Month => "30d",
        }
    }
}

impl fmt::Display for MetricsRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricsRange {
    type Err = ConsoleError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "1h" => Ok(Self::Hour),
            "24h" => Ok(Self::Day),
            "7d" => Ok(Self::Week),
            "30d" => Ok(Self::Month),
            other => Err(ConsoleError::Validation(format!(
                "unknown range '{other}' (expected 1h, 24h, 7d or 30d)"
            ))),
        }
    }
}

/// A single sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub timestamp: String,
    pub value: f64,
}

/// Metric series for one window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Metrics {
    pub total_requests: Vec<Sample>,
    pub error_rate: Vec<Sample>,
    pub avg_response_time: Vec<Sample>,
    pub active_users: Vec<Sample>,
    pub bandwidth_usage: Vec<Sample>,
    pub cpu_usage: Vec<Sample>,
    pub memory_usage: Vec<Sample>,
    pub status_codes: BTreeMap<String, u64>,
}

impl Metrics {
    /// Named series, in display order.
    #[must_use]
    pub fn series(&self) -> [(&'static str, &[Sample]); 7] {
        [
            ("Total requests", self.total_requests.as_slice()),
            ("Error rate", self.error_rate.as_slice()),
            ("Avg response time", self.avg_response_time.as_slice()),
            ("Active users", self.active_users.as_slice()),
            ("Bandwidth usage", self.bandwidth_usage.as_slice()),
            ("CPU usage", self.cpu_usage.as_slice()),
            ("Memory usage", self.memory_usage.as_slice()),
        ]
    }
}

/// Fetch metrics for `range`.
///
/// # Errors
///
/// Returns any transport, API or decode error.
pub async fn fetch(client: &ConsoleClient, range: MetricsRange) -> Result<Metrics> {
    let query = [("range", range.as_str().to_owned())];
    client.request("GET", "/platform/metrics", &query, None).await
}
