//! In-memory [`ResourceApi`] used by the view unit tests.

#![allow(clippy::unwrap_used)]

use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::client::ResourceApi;
use crate::entity::Entity;
use crate::error::{ConsoleError, Result};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    List { page: u32, page_size: u32 },
    Get(String),
    Create(Value),
    Update(String, Value),
    Delete(String),
}

#[derive(Debug)]
pub(crate) struct FakeApi<E> {
    records: Mutex<Vec<E>>,
    calls: Mutex<Vec<Call>>,
    failure: Mutex<Option<String>>,
}

impl<E: Entity> FakeApi<E> {
    pub(crate) fn with(records: Vec<E>) -> Self {
        Self {
            records: Mutex::new(records),
            calls: Mutex::new(Vec::new()),
            failure: Mutex::new(None),
        }
    }

    /// Make every later call fail with a 500 carrying `message`.
    pub(crate) fn fail_with(&self, message: &str) {
        *self.failure.lock().unwrap() = Some(message.to_owned());
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) -> Result<()> {
        self.calls.lock().unwrap().push(call);
        match self.failure.lock().unwrap().clone() {
            Some(message) => Err(ConsoleError::Api { status: 500, message }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl<E: Entity> ResourceApi<E> for FakeApi<E> {
    async fn list(&self, page: u32, page_size: u32) -> Result<Vec<E>> {
        self.record(Call::List { page, page_size })?;
        Ok(self.records.lock().unwrap().clone())
    }

    async fn get(&self, key: &str) -> Result<E> {
        self.record(Call::Get(key.to_owned()))?;
        self.records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.identifier() == key)
            .cloned()
            .ok_or_else(|| ConsoleError::Api {
                status: 404,
                message: format!("{key} not found"),
            })
    }

    async fn create(&self, body: &Value) -> Result<()> {
        self.record(Call::Create(body.clone()))
    }

    async fn update(&self, key: &str, body: &Value) -> Result<()> {
        self.record(Call::Update(key.to_owned(), body.clone()))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.record(Call::Delete(key.to_owned()))
    }
}
