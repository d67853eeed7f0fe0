//! Create view.
//!
//! Starts from a blank draft seeded only with the entity's defaults. Local
//! validation (required fields, lengths, password strength) runs before any
//! request; a successful submit routes back to the family's list.

use std::marker::PhantomData;

use crate::client::ResourceApi;
use crate::draft::Draft;
use crate::entity::Entity;
use crate::error::Result;
use crate::route::Route;

/// Create form for one resource family.
#[derive(Debug, Clone)]
pub struct CreateView<E: Entity> {
    draft: Draft,
    error: Option<String>,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> Default for CreateView<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Entity> CreateView<E> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            draft: Draft::blank(E::KIND, E::SCHEMA, E::create_defaults()),
            error: None,
            _entity: PhantomData,
        }
    }

    #[must_use]
    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut Draft {
        &mut self.draft
    }

    /// Message of the last failed validation or submit.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Run every local check.
    ///
    /// # Errors
    ///
    /// Returns the first failing check.
    pub fn validate(&self) -> Result<()> {
        self.draft.validate()?;
        E::validate_create(&self.draft)
    }

    /// Validate, then create the record.
    ///
    /// # Errors
    ///
    /// Returns a local validation error without sending anything, or the
    /// API error. Either way the message is kept on the view.
    pub async fn submit(&mut self, api: &dyn ResourceApi<E>) -> Result<Route> {
        if let Err(e) = self.validate() {
            self.error = Some(e.to_string());
            return Err(e);
        }
        if let Err(e) = api.create(&self.draft.to_body()).await {
            self.error = Some(e.to_string());
            return Err(e);
        }
        self.error = None;
        Ok(Route::List(E::KIND))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::entity::EntityKind;
    use crate::error::ConsoleError;
    use crate::models::{Api, Group, Routing, User};
    use crate::testing::{Call, FakeApi};

    #[tokio::test]
    async fn api_create_sends_fields_plus_defaults() {
        let fake = FakeApi::<Api>::with(Vec::new());
        let mut view = CreateView::<Api>::new();
        let d = view.draft_mut();
        d.set("api_name", "orders").unwrap();
        d.set("api_version", "v1").unwrap();
        d.set("api_description", "order service").unwrap();

        let route = view.submit(&fake).await.unwrap();
        assert_eq!(route, Route::List(EntityKind::Api));
        assert_eq!(
            fake.calls(),
            vec![Call::Create(json!({
                "api_name": "orders",
                "api_version": "v1",
                "api_description": "order service",
                "api_type": "REST",
                "api_allowed_retry_count": 0,
                "api_tokens_enabled": false,
            }))]
        );
    }

    #[tokio::test]
    async fn missing_required_fields_short_circuit() {
        let fake = FakeApi::<Api>::with(Vec::new());
        let mut view = CreateView::<Api>::new();
        view.draft_mut().set("api_name", "orders").unwrap();
        let err = view.submit(&fake).await.unwrap_err();
        assert!(err.is_local());
        assert!(err.to_string().contains("api_version"));
        assert!(view.error().is_some());
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn length_bounds_are_enforced() {
        let mut view = CreateView::<Api>::new();
        let d = view.draft_mut();
        d.set("api_name", "a-name-well-beyond-twenty-five").unwrap();
        d.set("api_version", "v1").unwrap();
        d.set("api_description", "x").unwrap();
        assert!(matches!(view.validate(), Err(ConsoleError::Validation(_))));
    }

    #[tokio::test]
    async fn routing_needs_a_server() {
        let mut view = CreateView::<Routing>::new();
        view.draft_mut().set("routing_name", "edge").unwrap();
        assert!(view.validate().unwrap_err().to_string().contains("routing_servers"));
        view.draft_mut().push("routing_servers", "http://10.0.0.1:8080").unwrap();
        view.validate().unwrap();
        assert_eq!(view.draft().get("server_index"), Some(&json!(0)));
    }

    #[tokio::test]
    async fn group_rejects_duplicate_api_access() {
        let mut view = CreateView::<Group>::new();
        view.draft_mut().push("api_access", "orders/v1").unwrap();
        assert!(view.draft_mut().push("api_access", "orders/v1").is_err());
    }

    #[tokio::test]
    async fn user_weak_password_blocks_submit() {
        let fake = FakeApi::<User>::with(Vec::new());
        let mut view = CreateView::<User>::new();
        let d = view.draft_mut();
        d.set("username", "ada").unwrap();
        d.set("email", "ada@example.com").unwrap();
        d.set("role", "admin").unwrap();
        d.set("password", "sixteencharslong1").unwrap();

        let err = view.submit(&fake).await.unwrap_err();
        match err {
            ConsoleError::WeakPassword { score, verdict } => {
                assert_eq!(score, 3);
                assert_eq!(verdict, "Medium - Add more complexity");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(fake.calls().is_empty());

        view.draft_mut().set("password", "Sixteen-chars!Aa1").unwrap();
        view.submit(&fake).await.unwrap();
        let calls = fake.calls();
        let Call::Create(body) = &calls[0] else {
            panic!("expected a create call");
        };
        assert_eq!(body["active"], json!(true));
        assert_eq!(body["ui_access"], json!(false));
        assert_eq!(body["password"], json!("Sixteen-chars!Aa1"));
    }
}
