//! Gateway dashboard summary.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::session::ConsoleClient;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveUser {
    pub name: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopularApi {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub requests: u64,
    #[serde(default)]
    pub subscribers: u64,
}

/// Headline numbers shown on the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Dashboard {
    pub total_requests: u64,
    pub active_users: u64,
    pub new_apis: u64,
    pub monthly_usage: u64,
    pub active_users_list: Vec<ActiveUser>,
    pub popular_apis: Vec<PopularApi>,
}

/// Fetch the dashboard summary.
///
/// # Errors
///
/// Returns any transport, API or decode error.
pub async fn fetch(client: &ConsoleClient) -> Result<Dashboard> {
    client.request("GET", "/platform/dashboard", &[], None).await
}
