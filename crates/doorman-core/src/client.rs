//! Typed CRUD over one resource family.
//!
//! [`ResourceApi`] is the seam the views are written against;
//! [`ResourceClient`] implements it on top of a [`ConsoleClient`].

use std::marker::PhantomData;

use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

use crate::entity::Entity;
use crate::error::{ConsoleError, Result};
use crate::models::User;
use crate::password;
use crate::session::ConsoleClient;

/// CRUD operations on one resource family.
#[async_trait]
pub trait ResourceApi<E: Entity>: Send + Sync {
    /// Fetch one page of records.
    ///
    /// # Errors
    ///
    /// Returns any transport, API or decode error.
    async fn list(&self, page: u32, page_size: u32) -> Result<Vec<E>>;

    /// Fetch a single record by its human identifier.
    ///
    /// # Errors
    ///
    /// Returns any transport, API or decode error.
    async fn get(&self, key: &str) -> Result<E>;

    /// Create a record from a draft body.
    ///
    /// # Errors
    ///
    /// Returns any transport or API error.
    async fn create(&self, body: &Value) -> Result<()>;

    /// Replace the fields in `body` on the record identified by `key`.
    ///
    /// # Errors
    ///
    /// Returns any transport or API error.
    async fn update(&self, key: &str, body: &Value) -> Result<()>;

    /// Delete the record identified by `key`.
    ///
    /// # Errors
    ///
    /// Returns any transport or API error.
    async fn delete(&self, key: &str) -> Result<()>;
}

/// [`ResourceApi`] backed by the management API.
#[derive(Debug)]
pub struct ResourceClient<'a, E> {
    console: &'a ConsoleClient,
    _entity: PhantomData<fn() -> E>,
}

impl<'a, E: Entity> ResourceClient<'a, E> {
    #[must_use]
    pub fn new(console: &'a ConsoleClient) -> Self {
        Self {
            console,
            _entity: PhantomData,
        }
    }

    fn collection_path() -> String {
        format!("/platform/{}", E::KIND.family())
    }
}

#[async_trait]
impl<E: Entity> ResourceApi<E> for ResourceClient<'_, E> {
    async fn list(&self, page: u32, page_size: u32) -> Result<Vec<E>> {
        let path = format!("{}/all", Self::collection_path());
        let query = [("page", page.to_string()), ("page_size", page_size.to_string())];
        let body: Value = self.console.request("GET", &path, &query, None).await?;
        unwrap_list(body, E::KIND.plural())
    }

    async fn get(&self, key: &str) -> Result<E> {
        let path = E::KIND.record_path(key)?;
        self.console.request("GET", &path, &[], None).await
    }

    async fn create(&self, body: &Value) -> Result<()> {
        self.console
            .request::<Value>("POST", &Self::collection_path(), &[], Some(body))
            .await?;
        info!(kind = E::KIND.family(), "created");
        Ok(())
    }

    async fn update(&self, key: &str, body: &Value) -> Result<()> {
        let path = E::KIND.record_path(key)?;
        self.console
            .request::<Value>("PUT", &path, &[], Some(body))
            .await?;
        info!(kind = E::KIND.family(), key, "updated");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let path = E::KIND.record_path(key)?;
        self.console
            .request::<Value>("DELETE", &path, &[], None)
            .await?;
        info!(kind = E::KIND.family(), key, "deleted");
        Ok(())
    }
}

impl ResourceClient<'_, User> {
    /// Change a user's password. The current password has to be supplied;
    /// the new one must pass the strength check and fit the endpoint's
    /// length limit. Nothing is sent otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::Validation`] or [`ConsoleError::WeakPassword`]
    /// before any request, or any transport or API error.
    pub async fn update_password(
        &self,
        username: &str,
        current_password: &str,
        new_password: &str,
    ) -> Result<()> {
        password::check_change(current_password, new_password)?;
        let path = format!("{}/update-password", User::KIND.record_path(username)?);
        let body = serde_json::json!({
            "old_password": current_password,
            "new_password": new_password,
        });
        self.console
            .request::<Value>("PUT", &path, &[], Some(&body))
            .await?;
        info!(username, "password updated");
        Ok(())
    }
}

/// Accept either `{"<plural>": [...]}` or a bare array.
fn unwrap_list<E: Entity>(body: Value, wrapper: &str) -> Result<Vec<E>> {
    let items = match body {
        Value::Array(items) => Value::Array(items),
        Value::Object(mut map) => map.remove(wrapper).ok_or_else(|| {
            ConsoleError::Decode(format!("list response has no '{wrapper}' field"))
        })?,
        Value::Null => Value::Array(Vec::new()),
        other => {
            return Err(ConsoleError::Decode(format!(
                "expected a list of {wrapper}, got {other}"
            )));
        }
    };
    if items.is_null() {
        return Ok(Vec::new());
    }
    serde_json::from_value(items).map_err(|e| ConsoleError::Decode(format!("{wrapper}: {e}")))
}
