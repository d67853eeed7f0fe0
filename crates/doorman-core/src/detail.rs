//! Detail / edit view.
//!
//! ```text
//! Viewing --edit--> Editing --save--> Saving --ok--> Viewing
//!                      |                 `--err--> Editing (error kept)
//!                      `--begin_delete--> ConfirmingDelete --confirm--> (list)
//! ```
//!
//! The view opens from the selection cache when it holds the requested
//! record and fetches it otherwise. Saving sends the draft and, on success,
//! shallow-merges it over the displayed record.

use serde_json::Value;
use tracing::warn;

use crate::cache::SelectionCache;
use crate::client::ResourceApi;
use crate::draft::{self, Draft};
use crate::entity::Entity;
use crate::error::{ConsoleError, Result};
use crate::route::Route;

/// Where a detail view is in its edit cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailState {
    Viewing,
    Editing,
    Saving,
    ConfirmingDelete,
}

impl DetailState {
    const fn describe(self) -> &'static str {
        match self {
            Self::Viewing => "viewing",
            Self::Editing => "editing",
            Self::Saving => "saving",
            Self::ConfirmingDelete => "confirming a delete",
        }
    }
}

/// Detail view of a single record.
#[derive(Debug, Clone)]
pub struct DetailView<E: Entity> {
    record: E,
    state: DetailState,
    draft: Option<Draft>,
    confirmation: String,
    error: Option<String>,
}

impl<E: Entity> DetailView<E> {
    /// Open the record identified by `key`.
    ///
    /// Uses the cached selection when its identifier matches; otherwise
    /// fetches the record and caches it.
    ///
    /// # Errors
    ///
    /// Returns the fetch error when the cache misses and the fetch fails.
    pub async fn open(key: &str, api: &dyn ResourceApi<E>, cache: &SelectionCache) -> Result<Self> {
        if let Some(record) = cache.recall_matching::<E>(key).await {
            return Ok(Self::showing(record));
        }
        let record = api.get(key).await?;
        if let Err(e) = cache.remember(&record).await {
            warn!(error = %e, "could not cache fetched record");
        }
        Ok(Self::showing(record))
    }

    /// A view showing `record`.
    #[must_use]
    pub fn showing(record: E) -> Self {
        Self {
            record,
            state: DetailState::Viewing,
            draft: None,
            confirmation: String::new(),
            error: None,
        }
    }

    #[must_use]
    pub fn record(&self) -> &E {
        &self.record
    }

    #[must_use]
    pub fn state(&self) -> DetailState {
        self.state
    }

    /// Message of the last failed save or delete.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// The draft being edited, if any.
    #[must_use]
    pub fn draft(&self) -> Option<&Draft> {
        self.draft.as_ref()
    }

    /// Mutable access to the draft while editing.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::InvalidState`] outside of editing.
    pub fn draft_mut(&mut self) -> Result<&mut Draft> {
        self.expect_state(DetailState::Editing, "edit fields")?;
        self.draft.as_mut().ok_or(ConsoleError::InvalidState {
            action: "edit fields",
            state: "viewing",
        })
    }

    fn expect_state(&self, wanted: DetailState, action: &'static str) -> Result<()> {
        if self.state == wanted {
            Ok(())
        } else {
            Err(ConsoleError::InvalidState {
                action,
                state: self.state.describe(),
            })
        }
    }

    /// Start editing with a draft of the record's editable fields.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::InvalidState`] unless viewing.
    pub fn edit(&mut self) -> Result<()> {
        self.expect_state(DetailState::Viewing, "start editing")?;
        self.draft = Some(Draft::from_record(E::KIND, E::SCHEMA, &self.record)?);
        self.error = None;
        self.state = DetailState::Editing;
        Ok(())
    }

    /// Discard the draft and any pending delete, back to viewing.
    pub fn cancel(&mut self) {
        self.draft = None;
        self.confirmation.clear();
        self.error = None;
        self.state = DetailState::Viewing;
    }

    /// Send the draft. On success the draft is merged over the record,
    /// the merged record is cached and the view returns to viewing. On
    /// failure the view stays in editing with the error kept.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::InvalidState`] unless editing, or the API
    /// error.
    pub async fn save(&mut self, api: &dyn ResourceApi<E>, cache: &SelectionCache) -> Result<()> {
        self.expect_state(DetailState::Editing, "save")?;
        let Some(draft) = self.draft.as_ref() else {
            return Err(ConsoleError::InvalidState {
                action: "save",
                state: "viewing",
            });
        };
        let body = draft.to_body();
        let key = self.record.identifier();

        self.state = DetailState::Saving;
        if let Err(e) = api.update(&key, &body).await {
            self.state = DetailState::Editing;
            self.error = Some(e.to_string());
            return Err(e);
        }

        let merged = match merged_record(&self.record, &body) {
            Ok(merged) => merged,
            Err(e) => {
                self.state = DetailState::Editing;
                self.error = Some(e.to_string());
                return Err(e);
            }
        };
        if let Err(e) = cache.remember(&merged).await {
            warn!(error = %e, "could not cache saved record");
        }
        self.record = merged;
        self.draft = None;
        self.error = None;
        self.state = DetailState::Viewing;
        Ok(())
    }

    /// Ask for delete confirmation.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::InvalidState`] unless editing.
    pub fn begin_delete(&mut self) -> Result<()> {
        self.expect_state(DetailState::Editing, "delete")?;
        self.confirmation.clear();
        self.state = DetailState::ConfirmingDelete;
        Ok(())
    }

    /// Record what the operator typed into the confirmation field.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::InvalidState`] unless confirming a delete.
    pub fn type_confirmation(&mut self, typed: &str) -> Result<()> {
        self.expect_state(DetailState::ConfirmingDelete, "confirm a delete")?;
        typed.clone_into(&mut self.confirmation);
        Ok(())
    }

    /// Whether the typed confirmation equals the primary name exactly.
    #[must_use]
    pub fn can_delete(&self) -> bool {
        self.state == DetailState::ConfirmingDelete && self.confirmation == self.record.primary_name()
    }

    /// Delete the record if the confirmation matches.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::ConfirmationMismatch`] without sending
    /// anything when the confirmation does not match. On an API error the
    /// view goes back to editing with the error kept.
    pub async fn confirm_delete(&mut self, api: &dyn ResourceApi<E>, cache: &SelectionCache) -> Result<Route> {
        self.expect_state(DetailState::ConfirmingDelete, "confirm a delete")?;
        if !self.can_delete() {
            return Err(ConsoleError::ConfirmationMismatch {
                expected: self.record.primary_name().to_owned(),
            });
        }
        if let Err(e) = api.delete(&self.record.identifier()).await {
            self.state = DetailState::Editing;
            self.error = Some(e.to_string());
            return Err(e);
        }
        if let Err(e) = cache.forget::<E>().await {
            warn!(error = %e, "could not clear cached selection");
        }
        Ok(Route::List(E::KIND))
    }
}

fn merged_record<E: Entity>(record: &E, body: &Value) -> Result<E> {
    let Value::Object(mut base) = serde_json::to_value(record)? else {
        return Err(ConsoleError::Decode(format!("{} record is not an object", E::KIND.label())));
    };
    if let Value::Object(changes) = body {
        draft::merge(&mut base, changes);
    }
    Ok(serde_json::from_value(Value::Object(base))?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::models::{Group, Role};
    use crate::store::MemoryStore;
    use crate::testing::{Call, FakeApi};

    fn ops() -> Group {
        Group {
            group_name: "ops".into(),
            group_description: "Operations".into(),
            api_access: vec!["orders/v1".into(), "users/v1".into(), "audit/v3".into()],
        }
    }

    fn cache() -> SelectionCache {
        SelectionCache::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn open_uses_matching_cached_selection() {
        let fake = FakeApi::with(vec![ops()]);
        let cache = cache();
        cache.remember(&ops()).await.unwrap();
        let view = DetailView::open("ops", &fake, &cache).await.unwrap();
        assert_eq!(view.record(), &ops());
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn open_fetches_when_cache_is_stale_or_empty() {
        let fake = FakeApi::with(vec![ops()]);
        let cache = cache();
        cache
            .remember(&Group {
                group_name: "billing".into(),
                ..Group::default()
            })
            .await
            .unwrap();

        let view = DetailView::open("ops", &fake, &cache).await.unwrap();
        assert_eq!(view.record(), &ops());
        assert_eq!(fake.calls(), vec![Call::Get("ops".into())]);
        assert_eq!(cache.recall::<Group>().await, Some(ops()));
    }

    #[tokio::test]
    async fn open_propagates_fetch_errors() {
        let fake = FakeApi::<Group>::with(Vec::new());
        let err = DetailView::open("ghost", &fake, &cache()).await.unwrap_err();
        assert!(matches!(err, ConsoleError::Api { status: 404, .. }));
    }

    #[tokio::test]
    async fn save_sends_draft_and_merges() {
        let fake = FakeApi::with(vec![ops()]);
        let cache = cache();
        let mut view = DetailView::showing(ops());
        view.edit().unwrap();
        {
            let draft = view.draft_mut().unwrap();
            draft.push("api_access", "billing/v2").unwrap();
            draft.remove("api_access", 0).unwrap();
        }
        view.save(&fake, &cache).await.unwrap();

        let expected = json!({
            "group_name": "ops",
            "group_description": "Operations",
            "api_access": ["users/v1", "audit/v3", "billing/v2"],
        });
        assert_eq!(fake.calls(), vec![Call::Update("ops".into(), expected)]);
        assert_eq!(view.state(), DetailState::Viewing);
        assert_eq!(
            view.record().api_access,
            vec!["users/v1".to_owned(), "audit/v3".into(), "billing/v2".into()]
        );
        assert_eq!(cache.recall::<Group>().await.unwrap(), view.record().clone());
    }

    #[tokio::test]
    async fn failed_save_stays_editing_with_error() {
        let fake = FakeApi::with(vec![ops()]);
        fake.fail_with("Group update failed");
        let mut view = DetailView::showing(ops());
        view.edit().unwrap();
        view.draft_mut().unwrap().set("group_description", "changed").unwrap();
        assert!(view.save(&fake, &cache()).await.is_err());
        assert_eq!(view.state(), DetailState::Editing);
        assert_eq!(view.error(), Some("Group update failed"));
        assert_eq!(view.record(), &ops());
        assert_eq!(view.draft().unwrap().text("group_description"), Some("changed"));
    }

    #[tokio::test]
    async fn cancel_discards_draft() {
        let mut view = DetailView::showing(ops());
        view.edit().unwrap();
        view.draft_mut().unwrap().set("group_description", "x").unwrap();
        view.cancel();
        assert_eq!(view.state(), DetailState::Viewing);
        assert!(view.draft().is_none());
        assert!(view.draft_mut().is_err());
    }

    #[tokio::test]
    async fn delete_requires_exact_primary_name() {
        let fake = FakeApi::with(vec![ops()]);
        let cache = cache();
        let mut view = DetailView::showing(ops());
        assert!(view.begin_delete().is_err());
        view.edit().unwrap();
        view.begin_delete().unwrap();

        for typed in ["OPS", "Ops", "ops ", " ops", ""] {
            view.type_confirmation(typed).unwrap();
            assert!(!view.can_delete(), "{typed:?}");
            let err = view.confirm_delete(&fake, &cache).await.unwrap_err();
            assert!(matches!(err, ConsoleError::ConfirmationMismatch { .. }));
        }
        assert!(fake.calls().is_empty());

        cache.remember(&ops()).await.unwrap();
        view.type_confirmation("ops").unwrap();
        assert!(view.can_delete());
        let route = view.confirm_delete(&fake, &cache).await.unwrap();
        assert_eq!(route, Route::List(crate::entity::EntityKind::Group));
        assert_eq!(fake.calls(), vec![Call::Delete("ops".into())]);
        assert_eq!(cache.recall::<Group>().await, None);
    }

    #[tokio::test]
    async fn failed_delete_returns_to_editing() {
        let role = Role {
            role_name: "auditor".into(),
            ..Role::default()
        };
        let fake = FakeApi::with(vec![role.clone()]);
        fake.fail_with("Role is in use");
        let mut view = DetailView::showing(role);
        view.edit().unwrap();
        view.begin_delete().unwrap();
        view.type_confirmation("auditor").unwrap();
        assert!(view.confirm_delete(&fake, &cache()).await.is_err());
        assert_eq!(view.state(), DetailState::Editing);
        assert_eq!(view.error(), Some("Role is in use"));
    }
}
