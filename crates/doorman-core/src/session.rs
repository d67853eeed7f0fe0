//! Authenticated access to the management API.
//!
//! [`ConsoleClient`] owns the HTTP client and the credential. The credential
//! is held once and attached to every request as the `access_token_cookie`
//! cookie; when it is older than the configured refresh interval it is
//! exchanged for a fresh one before the next call.
//!
//! [`Session`] ties a client to the two client-side stores: it restores the
//! credential at startup, persists it after login or refresh, and wipes both
//! stores on logout.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::cache::SelectionCache;
use crate::config::ConsoleConfig;
use crate::error::{ConsoleError, Result};
use crate::store::KeyValueStore;

/// Cookie the management API reads the token from.
pub const CREDENTIAL_COOKIE: &str = "access_token_cookie";

/// Local-store key holding the serialized [`Credential`].
pub const CREDENTIAL_KEY: &str = "credential";

/// An access token and when it was issued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub access_token: String,
    pub issued_at: DateTime<Utc>,
}

impl Credential {
    #[must_use]
    pub fn issued_now(access_token: String) -> Self {
        Self {
            access_token,
            issued_at: Utc::now(),
        }
    }

    /// Whether the credential is due for a refresh at `now`.
    #[must_use]
    pub fn is_stale(&self, interval: Duration, now: DateTime<Utc>) -> bool {
        chrono::Duration::from_std(interval)
            .map(|interval| now - self.issued_at >= interval)
            .unwrap_or(false)
    }
}

#[derive(Deserialize)]
struct LoginResponse {
    access_token: Option<String>,
}

#[derive(Deserialize)]
struct RefreshResponse {
    refresh_token: Option<String>,
}

#[derive(Deserialize)]
struct StatusResponse {
    status: Option<String>,
}

/// HTTP client for the management API.
#[derive(Debug)]
pub struct ConsoleClient {
    http: reqwest::Client,
    base_url: String,
    refresh_interval: Duration,
    credential: RwLock<Option<Credential>>,
}

impl ConsoleClient {
    /// Build a client from the console configuration. No credential is held
    /// until [`ConsoleClient::login`] or [`ConsoleClient::with_credential`].
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::Network`] if the HTTP client cannot be built.
    pub fn new(config: &ConsoleConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .user_agent(concat!("doorman-console/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(ConsoleError::Network)?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            refresh_interval: config.refresh_interval,
            credential: RwLock::new(None),
        })
    }

    /// Start with an already-issued credential.
    #[must_use]
    pub fn with_credential(self, credential: Option<Credential>) -> Self {
        Self {
            credential: RwLock::new(credential),
            ..self
        }
    }

    /// Management API origin.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The credential currently held, if any.
    pub async fn credential(&self) -> Option<Credential> {
        self.credential.read().await.clone()
    }

    /// Drop the held credential without telling the server.
    pub async fn clear_credential(&self) {
        *self.credential.write().await = None;
    }

    /// Exchange email and password for a credential.
    ///
    /// # Errors
    ///
    /// Returns the API's error message on rejection, or
    /// [`ConsoleError::Decode`] if no token came back.
    pub async fn login(&self, email: &str, password: &str) -> Result<Credential> {
        let body = serde_json::json!({ "email": email, "password": password });
        let resp: LoginResponse = self
            .send("POST", "/platform/authorization", &[], Some(&body), None)
            .await?;
        let token = resp.access_token.filter(|t| !t.is_empty()).ok_or_else(|| {
            ConsoleError::Decode("login succeeded but no access token was returned".to_owned())
        })?;

        let credential = Credential::issued_now(token);
        *self.credential.write().await = Some(credential.clone());
        info!(email, "logged in");
        Ok(credential)
    }

    /// Exchange the held credential for a fresh one.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::NotAuthenticated`] when no credential is held,
    /// or the API's error when the refresh is rejected.
    pub async fn refresh(&self) -> Result<Credential> {
        let current = self
            .credential
            .read()
            .await
            .clone()
            .ok_or(ConsoleError::NotAuthenticated)?;
        let resp: RefreshResponse = self
            .send(
                "POST",
                "/platform/authorization/refresh",
                &[],
                None,
                Some(&current.access_token),
            )
            .await?;
        let token = resp.refresh_token.filter(|t| !t.is_empty()).ok_or_else(|| {
            ConsoleError::Decode("refresh succeeded but no token was returned".to_owned())
        })?;

        let credential = Credential::issued_now(token);
        *self.credential.write().await = Some(credential.clone());
        debug!("credential refreshed");
        Ok(credential)
    }

    /// Ask the server whether the held credential is valid.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::Unauthorized`] when it is not.
    pub async fn status(&self) -> Result<String> {
        let resp: StatusResponse = self
            .request("GET", "/platform/authorization/status", &[], None)
            .await?;
        Ok(resp.status.unwrap_or_else(|| "authorized".to_owned()))
    }

    /// Invalidate the held credential server-side and drop it locally.
    ///
    /// # Errors
    ///
    /// Returns the API's error if the server rejects the call. The local
    /// credential is dropped either way.
    pub async fn invalidate(&self) -> Result<()> {
        let result = self
            .request::<Value>("POST", "/platform/authorization/invalidate", &[], None)
            .await;
        self.clear_credential().await;
        result.map(|_| ())
    }

    /// Send an authenticated request, refreshing the credential first when
    /// it is due.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::NotAuthenticated`] without sending anything
    /// when no credential is held.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: &str,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<T> {
        let token = self.fresh_token().await?;
        self.send(method, path, query, body, Some(&token)).await
    }

    async fn fresh_token(&self) -> Result<String> {
        let current = self
            .credential
            .read()
            .await
            .clone()
            .ok_or(ConsoleError::NotAuthenticated)?;
        if !current.is_stale(self.refresh_interval, Utc::now()) {
            return Ok(current.access_token);
        }
        match self.refresh().await {
            Ok(fresh) => Ok(fresh.access_token),
            Err(e) => {
                warn!(error = %e, "credential refresh failed, using the current one");
                Ok(current.access_token)
            }
        }
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: &str,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
        token: Option<&str>,
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let mut req = match method {
            "POST" => self.http.post(&url),
            "PUT" => self.http.put(&url),
            "DELETE" => self.http.delete(&url),
            _ => self.http.get(&url),
        };
        req = req
            .header("Accept", "application/json")
            .header("Content-Type", "application/json");
        if let Some(token) = token {
            req = req.header("Cookie", format!("{CREDENTIAL_COOKIE}={token}"));
        }
        if !query.is_empty() {
            req = req.query(query);
        }
        if let Some(body) = body {
            req = req.json(body);
        }

        let resp = req.send().await?;
        let status = resp.status();
        debug!(method, path, status = status.as_u16(), "management api call");
        let text = resp.text().await?;

        if status.is_success() {
            let raw = if text.trim().is_empty() { "null" } else { text.as_str() };
            return serde_json::from_str(raw)
                .map_err(|e| ConsoleError::Decode(format!("{method} {path}: {e}")));
        }

        let message = error_message(&text)
            .unwrap_or_else(|| format!("request failed with status {}", status.as_u16()));
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ConsoleError::Unauthorized(message));
        }
        Err(ConsoleError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

/// The human message in an error body: `error_message`, then `detail`,
/// then `error`.
fn error_message(body: &str) -> Option<String> {
    let json: Value = serde_json::from_str(body).ok()?;
    ["error_message", "detail", "error"]
        .iter()
        .find_map(|key| json.get(key).and_then(Value::as_str))
        .filter(|m| !m.is_empty())
        .map(str::to_owned)
}

/// A logged-in console: the client plus its client-side stores.
pub struct Session {
    client: ConsoleClient,
    local: Arc<dyn KeyValueStore>,
    session: Arc<dyn KeyValueStore>,
    cache: SelectionCache,
}

impl Session {
    /// Build a session, restoring any credential saved in the local store.
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot be built or the local store
    /// cannot be read.
    pub async fn open(
        config: &ConsoleConfig,
        local: Arc<dyn KeyValueStore>,
        session: Arc<dyn KeyValueStore>,
    ) -> Result<Self> {
        let stored = match local.get(CREDENTIAL_KEY).await? {
            Some(raw) => match serde_json::from_str::<Credential>(&raw) {
                Ok(credential) => Some(credential),
                Err(e) => {
                    warn!(error = %e, "ignoring malformed stored credential");
                    None
                }
            },
            None => None,
        };
        let client = ConsoleClient::new(config)?.with_credential(stored);
        Ok(Self {
            client,
            local,
            cache: SelectionCache::new(Arc::clone(&session)),
            session,
        })
    }

    #[must_use]
    pub fn client(&self) -> &ConsoleClient {
        &self.client
    }

    #[must_use]
    pub fn cache(&self) -> &SelectionCache {
        &self.cache
    }

    /// The persistent local store (credential, preferences).
    #[must_use]
    pub fn local_store(&self) -> &Arc<dyn KeyValueStore> {
        &self.local
    }

    /// Log in and persist the credential.
    ///
    /// # Errors
    ///
    /// See [`ConsoleClient::login`].
    pub async fn login(&self, email: &str, password: &str) -> Result<Credential> {
        let credential = self.client.login(email, password).await?;
        self.save_credential(&credential).await?;
        Ok(credential)
    }

    /// Write the held credential back to the local store if it changed,
    /// e.g. after a scheduled refresh.
    ///
    /// # Errors
    ///
    /// Returns an error if the local store write fails.
    pub async fn persist(&self) -> Result<()> {
        let Some(current) = self.client.credential().await else {
            return Ok(());
        };
        let stored = self.local.get(CREDENTIAL_KEY).await?;
        let unchanged = stored
            .and_then(|raw| serde_json::from_str::<Credential>(&raw).ok())
            .is_some_and(|s| s == current);
        if unchanged {
            return Ok(());
        }
        self.save_credential(&current).await
    }

    /// Invalidate the credential (best effort) and clear both stores.
    ///
    /// # Errors
    ///
    /// Returns an error only if a store cannot be cleared; a failed
    /// server-side invalidation is logged and otherwise ignored.
    pub async fn logout(&self) -> Result<()> {
        if self.client.credential().await.is_some() {
            if let Err(e) = self.client.invalidate().await {
                warn!(error = %e, "server-side invalidation failed");
            }
        }
        self.client.clear_credential().await;
        self.local.clear().await?;
        self.session.clear().await?;
        info!("logged out, client-side state cleared");
        Ok(())
    }

    async fn save_credential(&self, credential: &Credential) -> Result<()> {
        let raw = serde_json::to_string(credential)?;
        self.local.put(CREDENTIAL_KEY, &raw).await
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("client", &self.client)
            .finish_non_exhaustive()
    }
}
